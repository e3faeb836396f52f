// self
use crate::{_prelude::*, error::ConfigError};

/// Link object carrying an `href`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Href {
	/// Raw link target; not every advertised link is an absolute URL.
	pub href: String,
}
impl Href {
	/// Parses the link as an absolute URL.
	pub fn url(&self, name: &'static str) -> Result<Url, ConfigError> {
		Url::parse(&self.href).map_err(|source| ConfigError::InvalidUrl { field: name, source })
	}

	/// Appends `path` to the link, keeping any path prefix it already has.
	pub fn join_path(&self, name: &'static str, path: &str) -> Result<Url, ConfigError> {
		let joined =
			format!("{}/{}", self.href.trim_end_matches('/'), path.trim_start_matches('/'));

		Url::parse(&joined).map_err(|source| ConfigError::InvalidUrl { field: name, source })
	}
}

/// Control-plane URLs advertised by the platform root document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
	/// V3 API.
	#[serde(default)]
	pub cloud_controller_v3: Option<Href>,
	/// Network policy API v0.
	#[serde(default)]
	pub network_policy_v0: Option<Href>,
	/// Network policy API v1.
	#[serde(default)]
	pub network_policy_v1: Option<Href>,
	/// Login server.
	#[serde(default)]
	pub login: Option<Href>,
	/// Identity provider issuing tokens.
	#[serde(default)]
	pub uaa: Option<Href>,
	/// Routing API.
	#[serde(default)]
	pub routing: Option<Href>,
	/// Loggregator.
	#[serde(default)]
	pub logging: Option<Href>,
	/// Log cache.
	#[serde(default)]
	pub log_cache: Option<Href>,
	/// Log stream.
	#[serde(default)]
	pub log_stream: Option<Href>,
	/// SSH proxy.
	#[serde(default)]
	pub app_ssh: Option<Href>,
}
impl Endpoints {
	/// Identity provider link, required for token grants and identity lookups.
	pub fn uaa(&self) -> Result<&Href> {
		self.uaa.as_ref().ok_or(Error::MissingEndpoint { name: "uaa" })
	}

	/// `<uaa>/oauth/token`.
	pub fn token_url(&self) -> Result<Url> {
		Ok(self.uaa()?.join_path("uaa", "oauth/token")?)
	}

	/// `<uaa>/introspect`.
	pub fn introspect_url(&self) -> Result<Url> {
		Ok(self.uaa()?.join_path("uaa", "introspect")?)
	}

	/// `<uaa>/userinfo`.
	pub fn userinfo_url(&self) -> Result<Url> {
		Ok(self.uaa()?.join_path("uaa", "userinfo")?)
	}
}

/// Platform root document.
#[derive(Clone, Debug, Deserialize)]
pub struct Root {
	/// Advertised links.
	pub links: Endpoints,
}
