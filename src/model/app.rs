// self
use crate::{
	_prelude::*,
	model::{AppGuid, Processes, SpaceGuid},
};

/// Label that opts an application out of autoscaling.
pub const DISABLE_AUTOSCALING_LABEL: &str = "app-autoscaler.cloudfoundry.org/disable-autoscaling";

/// Platform application snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct App {
	/// Application GUID.
	pub guid: AppGuid,
	/// Application name.
	#[serde(default)]
	pub name: String,
	/// Desired state such as `STARTED` or `STOPPED`.
	#[serde(default)]
	pub state: String,
	/// Creation timestamp.
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub created_at: Option<OffsetDateTime>,
	/// Last update timestamp.
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub updated_at: Option<OffsetDateTime>,
	/// Owning space.
	pub relationships: AppRelationships,
	/// Labels and annotations.
	#[serde(default)]
	pub metadata: Metadata,
}
impl App {
	/// GUID of the space that owns the application.
	pub fn space_guid(&self) -> &SpaceGuid {
		&self.relationships.space.data.guid
	}

	/// Raw value of the disable-autoscaling label, if set.
	pub fn disable_autoscaling_label(&self) -> Option<&str> {
		self.metadata.labels.get(DISABLE_AUTOSCALING_LABEL)?.as_deref()
	}

	/// Whether the application opted out of autoscaling.
	pub fn autoscaling_disabled(&self) -> bool {
		self.disable_autoscaling_label().is_some_and(|v| v.eq_ignore_ascii_case("true"))
	}
}

/// Relationship block of an [`App`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppRelationships {
	/// Owning space link.
	pub space: SpaceRelationship,
}

/// To-one link to a space.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceRelationship {
	/// Linked space.
	pub data: SpaceRef,
}

/// Reference to a space by GUID.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceRef {
	/// Space GUID.
	pub guid: SpaceGuid,
}

/// Resource labels and annotations; `null` values mark removed keys.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
	/// Selector labels.
	#[serde(default)]
	pub labels: BTreeMap<String, Option<String>>,
	/// Free-form annotations.
	#[serde(default)]
	pub annotations: BTreeMap<String, Option<String>>,
}

/// Joined answer of [`PlatformClient::get_app_and_processes`].
///
/// [`PlatformClient::get_app_and_processes`]: crate::client::PlatformClient::get_app_and_processes
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppAndProcesses {
	/// Application snapshot.
	pub app: App,
	/// Processes of the application, filtered to the `web` type.
	pub processes: Processes,
}
