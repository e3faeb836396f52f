//! Client configuration and its validating builder.

// std
use std::time::Duration as StdDuration;
// self
use crate::{_prelude::*, error::ConfigError, token::TokenSecret};

/// Page size requested when the configuration leaves `per_page` at zero.
pub const DEFAULT_PER_PAGE: u32 = 100;
/// Retry wait cap used when the configuration leaves `max_retry_wait` at zero.
pub const DEFAULT_MAX_RETRY_WAIT: StdDuration = StdDuration::from_secs(30);
/// Whole-request timeout used when none is configured.
pub const DEFAULT_REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(30);

/// Connection, credential, and retry settings for [`crate::client::PlatformClient`].
///
/// Durations are expressed in milliseconds when deserialized.
#[derive(Clone, Debug, Deserialize)]
pub struct ClientConfig {
	/// Platform API base URL; the root document is served at its `/`.
	pub api: Url,
	/// OAuth client identifier used for the client-credentials grant.
	pub client_id: String,
	/// OAuth client secret.
	pub secret: TokenSecret,
	/// Accept invalid TLS certificates from the platform.
	#[serde(default)]
	pub skip_ssl_validation: bool,
	/// Retries after the first attempt; zero disables retrying.
	#[serde(default)]
	pub max_retries: u32,
	/// Upper bound for a single backoff wait; zero selects [`DEFAULT_MAX_RETRY_WAIT`].
	#[serde(default, with = "duration_ms")]
	pub max_retry_wait: StdDuration,
	/// Page size for list endpoints; zero selects [`DEFAULT_PER_PAGE`].
	#[serde(default)]
	pub per_page: u32,
	/// Idle pooled connection lifetime; zero keeps the transport default.
	#[serde(default, with = "duration_ms")]
	pub idle_connection_timeout: StdDuration,
	/// Idle pooled connections kept per host; `None` keeps the transport default.
	#[serde(default)]
	pub max_idle_conns_per_host: Option<usize>,
	/// Whole-request timeout for a single attempt.
	#[serde(default = "default_request_timeout", with = "duration_ms")]
	pub request_timeout: StdDuration,
	/// `User-Agent` header override.
	#[serde(default)]
	pub user_agent: Option<String>,
}
impl ClientConfig {
	/// Creates a builder with every optional field at its default.
	pub fn builder() -> ClientConfigBuilder {
		ClientConfigBuilder::default()
	}

	/// Page size sent to list endpoints.
	pub fn effective_per_page(&self) -> u32 {
		if self.per_page == 0 { DEFAULT_PER_PAGE } else { self.per_page }
	}

	/// Backoff wait cap.
	pub fn effective_max_retry_wait(&self) -> StdDuration {
		if self.max_retry_wait.is_zero() { DEFAULT_MAX_RETRY_WAIT } else { self.max_retry_wait }
	}

	/// `User-Agent` header value for outbound requests.
	pub fn effective_user_agent(&self) -> String {
		self.user_agent.clone().unwrap_or_else(default_user_agent)
	}

	/// Checks fields that deserialization alone cannot enforce.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if !matches!(self.api.scheme(), "http" | "https") || self.api.cannot_be_a_base() {
			return Err(ConfigError::UnsupportedScheme { field: "api" });
		}
		if self.client_id.trim().is_empty() {
			return Err(ConfigError::MissingField { field: "client_id" });
		}

		Ok(())
	}
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
	api: Option<Url>,
	client_id: Option<String>,
	secret: Option<TokenSecret>,
	skip_ssl_validation: bool,
	max_retries: u32,
	max_retry_wait: StdDuration,
	per_page: u32,
	idle_connection_timeout: StdDuration,
	max_idle_conns_per_host: Option<usize>,
	request_timeout: Option<StdDuration>,
	user_agent: Option<String>,
}
impl ClientConfigBuilder {
	/// Sets the platform API base URL.
	pub fn api(mut self, api: Url) -> Self {
		self.api = Some(api);

		self
	}

	/// Sets the OAuth client identifier.
	pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
		self.client_id = Some(client_id.into());

		self
	}

	/// Sets the OAuth client secret.
	pub fn secret(mut self, secret: impl Into<String>) -> Self {
		self.secret = Some(TokenSecret::new(secret));

		self
	}

	/// Accepts invalid platform TLS certificates.
	pub fn skip_ssl_validation(mut self, skip: bool) -> Self {
		self.skip_ssl_validation = skip;

		self
	}

	/// Sets the retry count after the first attempt.
	pub fn max_retries(mut self, max_retries: u32) -> Self {
		self.max_retries = max_retries;

		self
	}

	/// Caps a single backoff wait.
	pub fn max_retry_wait(mut self, wait: StdDuration) -> Self {
		self.max_retry_wait = wait;

		self
	}

	/// Sets the list page size.
	pub fn per_page(mut self, per_page: u32) -> Self {
		self.per_page = per_page;

		self
	}

	/// Sets the idle pooled connection lifetime.
	pub fn idle_connection_timeout(mut self, timeout: StdDuration) -> Self {
		self.idle_connection_timeout = timeout;

		self
	}

	/// Sets the idle pooled connections kept per host.
	pub fn max_idle_conns_per_host(mut self, max: usize) -> Self {
		self.max_idle_conns_per_host = Some(max);

		self
	}

	/// Sets the whole-request timeout for a single attempt.
	pub fn request_timeout(mut self, timeout: StdDuration) -> Self {
		self.request_timeout = Some(timeout);

		self
	}

	/// Overrides the `User-Agent` header.
	pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
		self.user_agent = Some(user_agent.into());

		self
	}

	/// Validates the inputs and produces a [`ClientConfig`].
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		let config = ClientConfig {
			api: self.api.ok_or(ConfigError::MissingField { field: "api" })?,
			client_id: self.client_id.ok_or(ConfigError::MissingField { field: "client_id" })?,
			secret: self.secret.unwrap_or_else(|| TokenSecret::new("")),
			skip_ssl_validation: self.skip_ssl_validation,
			max_retries: self.max_retries,
			max_retry_wait: self.max_retry_wait,
			per_page: self.per_page,
			idle_connection_timeout: self.idle_connection_timeout,
			max_idle_conns_per_host: self.max_idle_conns_per_host,
			request_timeout: self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
			user_agent: self.user_agent,
		};

		config.validate()?;

		Ok(config)
	}
}

fn default_request_timeout() -> StdDuration {
	DEFAULT_REQUEST_TIMEOUT
}

fn default_user_agent() -> String {
	concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).into()
}

mod duration_ms {
	// std
	use std::time::Duration as StdDuration;
	// crates.io
	use serde::{Deserialize, Deserializer};

	pub fn deserialize<'de, D>(deserializer: D) -> Result<StdDuration, D::Error>
	where
		D: Deserializer<'de>,
	{
		u64::deserialize(deserializer).map(StdDuration::from_millis)
	}
}
