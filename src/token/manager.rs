//! Concurrency-safe client-credentials token lifecycle.

// crates.io
use reqwest::header::HeaderValue;
// self
use crate::{
	_prelude::*,
	context::CallContext,
	http::HttpTransport,
	lazy::Lazy,
	model::Endpoints,
	oauth::ClientCredentialsGrant,
	token::{Clock, TokenInfo, TokenSecret, Tokens},
};

/// Refresh failure that still hands back the previous token.
#[derive(Debug, ThisError)]
#[error("Token refresh failed; the previous token may be stale.")]
pub struct StaleToken {
	/// Token held before the failed refresh; `None` if no grant ever succeeded.
	pub stale: Option<Tokens>,
	/// Refresh failure.
	#[source]
	pub source: Error,
}
impl From<StaleToken> for Error {
	fn from(e: StaleToken) -> Self {
		e.source
	}
}

/// Obtains and refreshes a client-credentials token for every clone of a client.
///
/// A single async read/write lock guards [`TokenInfo`]. Readers escalate to the write lock only
/// when the token is due, and re-check under it so concurrent escalations issue one grant.
#[derive(Clone)]
pub struct TokenManager(Arc<TokenManagerInner>);
struct TokenManagerInner {
	state: AsyncRwLock<TokenInfo>,
	endpoints: Lazy<Endpoints>,
	transport: Arc<dyn HttpTransport>,
	client_id: String,
	secret: TokenSecret,
	user_agent: HeaderValue,
	clock: Arc<dyn Clock>,
}
impl TokenManager {
	/// Creates a manager that discovers the token endpoint through `endpoints`.
	pub fn new(
		endpoints: Lazy<Endpoints>,
		transport: Arc<dyn HttpTransport>,
		client_id: impl Into<String>,
		secret: TokenSecret,
		user_agent: HeaderValue,
		clock: Arc<dyn Clock>,
	) -> Self {
		Self(Arc::new(TokenManagerInner {
			state: AsyncRwLock::new(TokenInfo::default()),
			endpoints,
			transport,
			client_id: client_id.into(),
			secret,
			user_agent,
			clock,
		}))
	}

	/// Discovers endpoints (once) and performs the initial grant.
	pub async fn login(&self, ctx: &CallContext) -> Result<()> {
		self.refresh_auth_token(ctx).await.map(|_| ())
	}

	/// Returns a token that is not yet due for refresh, refreshing it first when needed.
	///
	/// When the refresh fails the previous token, possibly stale, travels with the error.
	pub async fn get_tokens(&self, ctx: &CallContext) -> Result<Tokens, StaleToken> {
		{
			let state = self.0.state.read().await;

			if !state.is_expired(self.0.clock.now()) {
				return Ok(state.tokens.clone());
			}
		}

		let mut state = self.0.state.write().await;

		if !state.is_expired(self.0.clock.now()) {
			return Ok(state.tokens.clone());
		}

		tracing::debug!("access token due for refresh");

		match self.grant_into(&mut state, ctx).await {
			Ok(tokens) => Ok(tokens),
			Err(source) => Err(StaleToken {
				stale: (!state.tokens.access_token.is_empty()).then(|| state.tokens.clone()),
				source,
			}),
		}
	}

	/// Re-issues the grant regardless of the current token's age.
	pub async fn refresh_auth_token(&self, ctx: &CallContext) -> Result<Tokens> {
		let mut state = self.0.state.write().await;

		self.grant_into(&mut state, ctx).await
	}

	/// Clears the grant time so the next [`get_tokens`](Self::get_tokens) refreshes.
	pub async fn invalidate_token(&self) {
		self.0.state.write().await.grant_time = None;
	}

	/// Whether the current token is due for refresh.
	pub async fn is_token_expired(&self) -> bool {
		self.0.state.read().await.is_expired(self.0.clock.now())
	}

	/// Snapshot of the current token state.
	pub async fn token_info(&self) -> TokenInfo {
		self.0.state.read().await.clone()
	}

	/// Client identifier used for grants.
	pub fn client_id(&self) -> &str {
		&self.0.client_id
	}

	async fn grant_into(&self, state: &mut TokenInfo, ctx: &CallContext) -> Result<Tokens> {
		let endpoints = ctx.run(self.0.endpoints.get()).await?;
		let grant = ClientCredentialsGrant::new(
			endpoints.token_url()?,
			&self.0.client_id,
			&self.0.secret,
			self.0.transport.clone(),
			self.0.user_agent.clone(),
		);
		let tokens = ctx.run(grant.exchange()).await?;

		state.tokens = tokens.clone();
		state.grant_time = Some(self.0.clock.now());

		Ok(tokens)
	}
}
impl Debug for TokenManager {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenManager")
			.field("client_id", &self.0.client_id)
			.field("secret", &self.0.secret)
			.finish_non_exhaustive()
	}
}
