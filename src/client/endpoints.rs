// self
use crate::{
	_prelude::*,
	client::PlatformClient,
	context::CallContext,
	error::ResultExt,
	model::Endpoints,
};

impl PlatformClient {
	/// Returns the control-plane URLs, discovering them on first use.
	///
	/// Discovery runs at most once per client unless [`invalidate_endpoints`] is called;
	/// failed discoveries are retried by the next caller.
	///
	/// [`invalidate_endpoints`]: Self::invalidate_endpoints
	pub async fn get_endpoints(&self, ctx: &CallContext) -> Result<Endpoints> {
		ctx.run(self.0.endpoints.get()).await.context("Failed to discover platform endpoints.")
	}

	/// Drops the cached endpoints so the next access rediscovers them.
	pub fn invalidate_endpoints(&self) {
		self.0.endpoints.invalidate();
	}
}
