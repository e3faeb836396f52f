//! Observability helpers for client operations.
//!
//! # Feature Flags
//!
//! - Spans named `control_plane_client.operation` carry the `operation` and `stage` (call site)
//!   fields and are always emitted through `tracing`.
//! - Enable `metrics` to increment the `control_plane_client_operation_total` counter for every
//!   attempt/success/failure, labeled by `operation` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Client operations observed by spans and metrics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
	/// Root document discovery.
	Endpoints,
	/// Client-credentials grant.
	TokenGrant,
	/// Single application lookup.
	GetApp,
	/// Process listing for an application.
	GetAppProcesses,
	/// Concurrent application plus process lookup.
	GetAppAndProcesses,
	/// Web process scale action.
	ScaleApp,
	/// Role assignment listing.
	GetRoles,
	/// Service instance lookup.
	GetServiceInstance,
	/// Service plan lookup.
	GetServicePlan,
	/// Token introspection.
	Introspect,
	/// Caller identity lookup.
	UserInfo,
}
impl Operation {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Operation::Endpoints => "endpoints",
			Operation::TokenGrant => "token_grant",
			Operation::GetApp => "get_app",
			Operation::GetAppProcesses => "get_app_processes",
			Operation::GetAppAndProcesses => "get_app_and_processes",
			Operation::ScaleApp => "scale_app",
			Operation::GetRoles => "get_roles",
			Operation::GetServiceInstance => "get_service_instance",
			Operation::GetServicePlan => "get_service_plan",
			Operation::Introspect => "introspect",
			Operation::UserInfo => "userinfo",
		}
	}
}
impl Display for Operation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationOutcome {
	/// Entry to a client operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OperationOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationOutcome::Attempt => "attempt",
			OperationOutcome::Success => "success",
			OperationOutcome::Failure => "failure",
		}
	}
}
impl Display for OperationOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Runs `fut` inside an operation span and records attempt plus outcome.
pub async fn observe<F, T>(operation: Operation, stage: &'static str, fut: F) -> Result<T>
where
	F: Future<Output = Result<T>>,
{
	let span = OperationSpan::new(operation, stage);

	record_operation_outcome(operation, OperationOutcome::Attempt);

	let result = span.instrument(fut).await;

	match &result {
		Ok(_) => record_operation_outcome(operation, OperationOutcome::Success),
		Err(_) => record_operation_outcome(operation, OperationOutcome::Failure),
	}

	result
}
