// self
use crate::{
	_prelude::*,
	client::PlatformClient,
	context::CallContext,
	error::ResultExt,
	model::{Role, RoleQuery, Roles, SpaceGuid, UserId},
	obs::{self, Operation},
};

impl PlatformClient {
	/// Lists role assignments matching `query`, across every page.
	pub async fn get_roles(&self, ctx: &CallContext, query: &RoleQuery) -> Result<Roles> {
		obs::observe(Operation::GetRoles, "get_roles", async {
			let mut url = self.0.retriever.api_url("/v3/roles")?;

			url.query_pairs_mut().append_pair("per_page", &self.per_page().to_string());
			query.append_to(&mut url);

			self.0.retriever.get_all_pages::<Role>(ctx, url).await.map(Roles::from)
		})
		.await
	}

	/// Lists the space-developer roles `user` holds in `space`.
	pub async fn get_space_developer_roles(
		&self,
		ctx: &CallContext,
		space: &SpaceGuid,
		user: &UserId,
	) -> Result<Roles> {
		self.get_roles(ctx, &RoleQuery::space_developer(space.clone(), user.clone()))
			.await
			.with_context(|| format!("Failed to get space developer roles of {user} in {space}."))
	}
}
