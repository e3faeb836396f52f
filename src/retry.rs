//! Bounded exponential backoff for transient transport and status failures.

// std
use std::time::Duration as StdDuration;
// crates.io
use rand::{Rng, rng};
use reqwest::{Request, StatusCode};
// self
use crate::{
	_prelude::*,
	config::ClientConfig,
	http::{HttpTransport, TransportFuture, TransportResponse},
};

/// First backoff step before exponential growth.
pub const BASE_WAIT: StdDuration = StdDuration::from_secs(1);

/// Attempt budget and wait bounds for [`RetryingTransport`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
	/// Retries after the first attempt.
	pub max_retries: u32,
	/// First backoff step.
	pub base_wait: StdDuration,
	/// Cap for any single wait, including server `Retry-After` hints.
	pub max_wait: StdDuration,
}
impl RetryPolicy {
	/// Builds a policy; the base step never exceeds `max_wait`.
	pub fn new(max_retries: u32, max_wait: StdDuration) -> Self {
		Self { max_retries, base_wait: BASE_WAIT.min(max_wait), max_wait }
	}

	/// Reads the retry settings of `config`.
	pub fn from_config(config: &ClientConfig) -> Self {
		Self::new(config.max_retries, config.effective_max_retry_wait())
	}

	/// Un-jittered wait before retry number `retry` (0-based), capped at `max_wait`.
	pub fn backoff(&self, retry: u32) -> StdDuration {
		let factor = 2_u32.saturating_pow(retry.min(31));

		self.base_wait.saturating_mul(factor).min(self.max_wait)
	}

	/// Full-jitter wait: uniform in `[0, backoff(retry)]`.
	pub fn jittered(&self, retry: u32) -> StdDuration {
		self.jittered_with_rng(retry, &mut rng())
	}

	/// Like [`jittered`](Self::jittered) with a caller-supplied RNG.
	pub fn jittered_with_rng<R>(&self, retry: u32, rng: &mut R) -> StdDuration
	where
		R: Rng,
	{
		let millis = u64::try_from(self.backoff(retry).as_millis()).unwrap_or(u64::MAX);

		StdDuration::from_millis(rng.random_range(0..=millis))
	}

	/// Whether a response with `status` is worth another attempt.
	pub fn is_retryable_status(status: StatusCode) -> bool {
		status == StatusCode::TOO_MANY_REQUESTS
			|| (status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED)
	}

	fn wait_for(&self, retry: u32, response: Option<&TransportResponse>) -> StdDuration {
		let hinted = response
			.filter(|r| {
				matches!(r.status, StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE)
			})
			.and_then(TransportResponse::retry_after);

		match hinted {
			Some(hint) => hint.min(self.max_wait),
			None => self.jittered(retry),
		}
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self::new(0, crate::config::DEFAULT_MAX_RETRY_WAIT)
	}
}

/// Re-issues requests that fail in transport or answer 429/5xx (except 501).
///
/// Discarded responses are closed before sleeping so a draining inner transport can return the
/// connection to the pool. When the budget is exhausted the last outcome is returned verbatim.
/// Requests whose body cannot be cloned get a single attempt.
#[derive(Clone, Debug)]
pub struct RetryingTransport<T> {
	inner: T,
	policy: RetryPolicy,
}
impl<T> RetryingTransport<T> {
	/// Decorates `inner` with `policy`.
	pub fn new(inner: T, policy: RetryPolicy) -> Self {
		Self { inner, policy }
	}

	/// Active retry policy.
	pub fn policy(&self) -> &RetryPolicy {
		&self.policy
	}
}
impl<T> HttpTransport for RetryingTransport<T>
where
	T: HttpTransport,
{
	fn round_trip(&self, request: Request) -> TransportFuture<'_> {
		Box::pin(async move {
			let mut request = request;
			let mut retry = 0;

			loop {
				let spare =
					if retry < self.policy.max_retries { request.try_clone() } else { None };
				let method = request.method().clone();
				let url = request.url().to_owned();
				let outcome = self.inner.round_trip(request).await;
				let retryable = match &outcome {
					Ok(response) => RetryPolicy::is_retryable_status(response.status),
					Err(_) => true,
				};
				let Some(next) = spare.filter(|_| retryable) else {
					if retryable && retry > 0 {
						tracing::warn!(
							%method,
							%url,
							attempts = retry + 1,
							"giving up after retries"
						);
					}

					return outcome;
				};
				let wait = self.policy.wait_for(retry, outcome.as_ref().ok());

				match outcome {
					Ok(response) => {
						tracing::debug!(
							%method,
							%url,
							status = response.status.as_u16(),
							retry = retry + 1,
							wait_ms = wait.as_millis() as u64,
							"retrying after retryable status"
						);

						if let Err(e) = response.close().await {
							tracing::debug!(error = %e, "failed to release discarded response");
						}
					},
					Err(e) => tracing::debug!(
						%method,
						%url,
						error = %e,
						retry = retry + 1,
						wait_ms = wait.as_millis() as u64,
						"retrying after transport error"
					),
				}

				tokio::time::sleep(wait).await;

				request = next;
				retry += 1;
			}
		})
	}
}
