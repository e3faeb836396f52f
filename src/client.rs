//! Platform API client: typed resource operations, identity checks, and fan-out.
//!
//! [`PlatformClient`] is cheap to clone; every clone shares the token state, the endpoint cache,
//! the plan cache, and the pooled transport stack `Retrying(Draining(base))`.

mod app;
mod endpoints;
mod identity;
mod roles;
mod service;

pub use service::*;

// crates.io
use reqwest::header::HeaderValue;
// self
use crate::{
	_prelude::*,
	config::ClientConfig,
	context::CallContext,
	error::ConfigError,
	http::{DrainingTransport, HttpTransport, ReqwestTransport},
	lazy::Lazy,
	model::{Endpoints, Root},
	obs::{self, Operation},
	retriever::Retriever,
	retry::{RetryPolicy, RetryingTransport},
	token::{Clock, StaleToken, SystemClock, TokenManager, Tokens},
};

/// Resilient client for the platform's REST control plane.
#[derive(Clone)]
pub struct PlatformClient(Arc<PlatformClientInner>);
struct PlatformClientInner {
	config: ClientConfig,
	/// Authenticated retriever for API resources.
	retriever: Retriever,
	endpoints: Lazy<Endpoints>,
	tokens: TokenManager,
	plans: ServicePlanCache,
}
impl PlatformClient {
	/// Builds a client over a pooled reqwest transport.
	pub fn new(config: ClientConfig) -> Result<Self> {
		Self::builder(config).build()
	}

	/// Starts a builder for clients with a custom transport or clock.
	pub fn builder(config: ClientConfig) -> PlatformClientBuilder {
		PlatformClientBuilder { config, transport: None, clock: None }
	}

	/// Active configuration.
	pub fn config(&self) -> &ClientConfig {
		&self.0.config
	}

	/// Authenticated retriever shared by every operation.
	pub fn retriever(&self) -> &Retriever {
		&self.0.retriever
	}

	/// Token manager shared by every clone.
	pub fn token_manager(&self) -> &TokenManager {
		&self.0.tokens
	}

	/// Discovers endpoints and performs the initial grant.
	pub async fn login(&self, ctx: &CallContext) -> Result<()> {
		self.0.tokens.login(ctx).await
	}

	/// Returns a fresh token, refreshing it when due; see [`TokenManager::get_tokens`].
	pub async fn get_tokens(&self, ctx: &CallContext) -> Result<Tokens, StaleToken> {
		self.0.tokens.get_tokens(ctx).await
	}

	/// Re-issues the grant unconditionally.
	pub async fn refresh_auth_token(&self, ctx: &CallContext) -> Result<Tokens> {
		self.0.tokens.refresh_auth_token(ctx).await
	}

	/// Forces a refresh on the next token access.
	pub async fn invalidate_token(&self) {
		self.0.tokens.invalidate_token().await
	}

	/// Whether the current token is due for refresh.
	pub async fn is_token_expired(&self) -> bool {
		self.0.tokens.is_token_expired().await
	}

	fn per_page(&self) -> u32 {
		self.0.config.effective_per_page()
	}
}
impl Debug for PlatformClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PlatformClient")
			.field("api", &self.0.config.api.as_str())
			.field("tokens", &self.0.tokens)
			.finish_non_exhaustive()
	}
}

/// Builder for [`PlatformClient`] values.
pub struct PlatformClientBuilder {
	config: ClientConfig,
	transport: Option<Arc<dyn HttpTransport>>,
	clock: Option<Arc<dyn Clock>>,
}
impl PlatformClientBuilder {
	/// Replaces the base transport; retrying and draining are still layered on top.
	pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
		self.transport = Some(transport);

		self
	}

	/// Replaces the clock used for token expiry.
	pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = Some(clock);

		self
	}

	/// Validates the configuration and assembles the shared state.
	pub fn build(self) -> Result<PlatformClient> {
		let Self { config, transport, clock } = self;

		config.validate()?;

		let user_agent = HeaderValue::from_str(&config.effective_user_agent())
			.map_err(|_| ConfigError::InvalidHeader { name: "user-agent" })?;
		let base: Arc<dyn HttpTransport> = match transport {
			Some(transport) => transport,
			None => Arc::new(ReqwestTransport::from_config(&config)?),
		};
		let stack: Arc<dyn HttpTransport> = Arc::new(RetryingTransport::new(
			DrainingTransport::new(base),
			RetryPolicy::from_config(&config),
		));
		let plain = Retriever::new(stack.clone(), config.api.clone(), user_agent.clone());
		let endpoints = discovery(plain.clone());
		let tokens = TokenManager::new(
			endpoints.clone(),
			stack,
			config.client_id.clone(),
			config.secret.clone(),
			user_agent,
			clock.unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>),
		);
		let retriever = plain.authenticated(tokens.clone());
		let plans = ServicePlanCache::new(retriever.clone());

		Ok(PlatformClient(Arc::new(PlatformClientInner {
			config,
			retriever,
			endpoints,
			tokens,
			plans,
		})))
	}
}

fn discovery(retriever: Retriever) -> Lazy<Endpoints> {
	Lazy::new(move || {
		let retriever = retriever.clone();

		async move {
			obs::observe(Operation::Endpoints, "discover", async {
				let url = retriever.api_url("/")?;
				let root: Root = retriever.get(&CallContext::background(), url).await?;

				Ok(root.links)
			})
			.await
		}
	})
}
