// self
use crate::{_prelude::*, model::UserId};

/// Scope granted to platform administrators.
pub const ADMIN_SCOPE: &str = "cloud_controller.admin";

/// Token introspection answer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntrospectionResponse {
	/// Whether the token is currently valid.
	#[serde(default)]
	pub active: bool,
	/// Client the token was issued to.
	#[serde(default)]
	pub client_id: Option<String>,
	/// Email of the token owner, for user tokens.
	#[serde(default)]
	pub email: Option<String>,
	/// Granted scopes.
	#[serde(default)]
	pub scope: Vec<String>,
}
impl IntrospectionResponse {
	/// Whether the token grants `scope`.
	pub fn has_scope(&self, scope: &str) -> bool {
		self.scope.iter().any(|s| s == scope)
	}

	/// Whether the token is active and grants [`ADMIN_SCOPE`].
	pub fn is_admin(&self) -> bool {
		self.active && self.has_scope(ADMIN_SCOPE)
	}
}

/// Identity answer of the `/userinfo` endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
	/// User identifier.
	pub user_id: UserId,
	/// Login name.
	#[serde(default)]
	pub user_name: Option<String>,
	/// Email address.
	#[serde(default)]
	pub email: Option<String>,
}
