// std
use std::ops::Deref;
// self
use crate::{
	_prelude::*,
	model::{SpaceGuid, UserId},
};

/// Role kinds understood by the client; unknown kinds decode as [`RoleType::Other`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleType {
	/// May push and manage apps in a space.
	SpaceDeveloper,
	/// Manages space membership.
	SpaceManager,
	/// Read-only access to a space.
	SpaceAuditor,
	/// Manages an organization.
	OrganizationManager,
	/// Member of an organization.
	OrganizationUser,
	/// Any other platform role.
	#[serde(other)]
	Other,
}
impl RoleType {
	/// Wire label used by the `types` query filter.
	pub const fn as_str(self) -> &'static str {
		match self {
			RoleType::SpaceDeveloper => "space_developer",
			RoleType::SpaceManager => "space_manager",
			RoleType::SpaceAuditor => "space_auditor",
			RoleType::OrganizationManager => "organization_manager",
			RoleType::OrganizationUser => "organization_user",
			RoleType::Other => "other",
		}
	}
}
impl Display for RoleType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Role assignment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
	/// Role GUID.
	pub guid: String,
	/// Role kind.
	#[serde(rename = "type")]
	pub kind: RoleType,
}

/// Ordered role list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roles(pub Vec<Role>);
impl Roles {
	/// Whether any role has the given kind.
	pub fn has_role(&self, kind: RoleType) -> bool {
		self.0.iter().any(|role| role.kind == kind)
	}
}
impl Deref for Roles {
	type Target = [Role];

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl From<Vec<Role>> for Roles {
	fn from(value: Vec<Role>) -> Self {
		Self(value)
	}
}

/// Filters for listing role assignments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleQuery {
	/// Role kinds to include.
	pub types: Vec<RoleType>,
	/// Spaces to include.
	pub space_guids: Vec<SpaceGuid>,
	/// Users to include.
	pub user_guids: Vec<UserId>,
}
impl RoleQuery {
	/// Query for the space-developer role of `user` in `space`.
	pub fn space_developer(space: SpaceGuid, user: UserId) -> Self {
		Self {
			types: vec![RoleType::SpaceDeveloper],
			space_guids: vec![space],
			user_guids: vec![user],
		}
	}

	/// Appends the filters as query parameters; empty filters are omitted.
	pub fn append_to(&self, url: &mut Url) {
		let mut pairs = url.query_pairs_mut();

		for (key, values) in [
			("types", self.types.iter().map(|t| t.as_str()).collect::<Vec<_>>()),
			("space_guids", self.space_guids.iter().map(|s| s.as_ref()).collect()),
			("user_guids", self.user_guids.iter().map(|u| u.as_ref()).collect()),
		] {
			if !values.is_empty() {
				pairs.append_pair(key, &values.join(","));
			}
		}
	}
}
