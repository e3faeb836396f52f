// self
use crate::{
	_prelude::*,
	model::{ServiceInstanceGuid, ServicePlanGuid},
};

/// Service instance snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInstance {
	/// Service instance GUID.
	pub guid: ServiceInstanceGuid,
	/// Instance name.
	#[serde(default)]
	pub name: String,
	/// `managed` or `user-provided`.
	#[serde(default, rename = "type")]
	pub kind: String,
	/// Plan link.
	pub relationships: ServiceInstanceRelationships,
}
impl ServiceInstance {
	/// GUID of the plan the instance was created from.
	pub fn plan_guid(&self) -> &ServicePlanGuid {
		&self.relationships.service_plan.data.guid
	}
}

/// Relationship block of a [`ServiceInstance`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInstanceRelationships {
	/// Plan link.
	pub service_plan: ServicePlanRelationship,
}

/// To-one link to a service plan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePlanRelationship {
	/// Linked plan.
	pub data: ServicePlanRef,
}

/// Reference to a service plan by GUID.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePlanRef {
	/// Plan GUID.
	pub guid: ServicePlanGuid,
}

/// Service plan snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePlan {
	/// Plan GUID.
	pub guid: ServicePlanGuid,
	/// Plan name.
	#[serde(default)]
	pub name: String,
	/// Identity of the plan in the broker catalog.
	pub broker_catalog: BrokerCatalog,
}

/// Broker catalog coordinates of a plan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerCatalog {
	/// Catalog plan id.
	pub id: String,
}
