//! Per-call cancellation context.

// std
use std::time::Duration as StdDuration;
// crates.io
use tokio::time::Instant;
// self
use crate::_prelude::*;

/// Carries an optional deadline through every client operation.
///
/// [`CallContext::background`] never expires. Dropping an operation's future is also a
/// cancellation; the deadline exists for callers that want a bound without owning the future.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CallContext {
	deadline: Option<Instant>,
}
impl CallContext {
	/// Context without a deadline.
	pub const fn background() -> Self {
		Self { deadline: None }
	}

	/// Context expiring at `deadline`.
	pub fn with_deadline(deadline: Instant) -> Self {
		Self { deadline: Some(deadline) }
	}

	/// Context expiring `timeout` from now.
	pub fn with_timeout(timeout: StdDuration) -> Self {
		Self::with_deadline(Instant::now() + timeout)
	}

	/// Returns the deadline, if any.
	pub fn deadline(&self) -> Option<Instant> {
		self.deadline
	}

	/// Time left before the deadline; `None` when unbounded.
	pub fn remaining(&self) -> Option<StdDuration> {
		self.deadline.map(|d| d.saturating_duration_since(Instant::now()))
	}

	/// Whether the deadline has passed.
	pub fn is_expired(&self) -> bool {
		self.deadline.is_some_and(|d| Instant::now() >= d)
	}

	/// Fails fast with [`Error::DeadlineExceeded`] once the deadline has passed.
	pub fn check(&self) -> Result<()> {
		if self.is_expired() { Err(Error::DeadlineExceeded) } else { Ok(()) }
	}

	/// Drives `fut` to completion unless the deadline passes first.
	pub async fn run<F, T>(&self, fut: F) -> Result<T>
	where
		F: Future<Output = Result<T>>,
	{
		match self.deadline {
			Some(deadline) => tokio::time::timeout_at(deadline, fut)
				.await
				.map_err(|_| Error::DeadlineExceeded)?,
			None => fut.await,
		}
	}
}
