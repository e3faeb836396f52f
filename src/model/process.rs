// std
use std::ops::Deref;
// self
use crate::_prelude::*;

/// Process type that receives routed traffic and is the scaling target.
pub const WEB_PROCESS_TYPE: &str = "web";

/// Process snapshot of an application.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Process {
	/// Process GUID.
	pub guid: String,
	/// Process type such as `web` or `worker`.
	#[serde(rename = "type")]
	pub kind: String,
	/// Desired instance count.
	pub instances: u32,
	/// Memory limit per instance.
	#[serde(default)]
	pub memory_in_mb: u64,
	/// Disk limit per instance.
	#[serde(default)]
	pub disk_in_mb: u64,
	/// Creation timestamp.
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub created_at: Option<OffsetDateTime>,
	/// Last update timestamp.
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub updated_at: Option<OffsetDateTime>,
}

/// Ordered process list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Processes(pub Vec<Process>);
impl Processes {
	/// Sum of desired instances across every process.
	pub fn total_instances(&self) -> u64 {
		self.0.iter().map(|p| u64::from(p.instances)).sum()
	}
}
impl Deref for Processes {
	type Target = [Process];

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl From<Vec<Process>> for Processes {
	fn from(value: Vec<Process>) -> Self {
		Self(value)
	}
}
impl IntoIterator for Processes {
	type IntoIter = std::vec::IntoIter<Process>;
	type Item = Process;

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}

/// Body of the scale action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ScaleRequest {
	/// New desired instance count.
	pub instances: u32,
}
