// self
use crate::{_prelude::*, obs::Operation};

/// Future instrumented with an operation span.
pub type InstrumentedOperation<F> = tracing::instrument::Instrumented<F>;

/// A span builder used by client operations.
#[derive(Clone, Debug)]
pub struct OperationSpan {
	span: tracing::Span,
}
impl OperationSpan {
	/// Creates a new span tagged with the provided operation + stage.
	pub fn new(operation: Operation, stage: &'static str) -> Self {
		Self {
			span: tracing::info_span!(
				"control_plane_client.operation",
				operation = operation.as_str(),
				stage
			),
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOperation<Fut>
	where
		Fut: Future,
	{
		use tracing::Instrument;

		fut.instrument(self.span.clone())
	}
}
