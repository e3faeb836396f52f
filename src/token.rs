//! Access token state and its expiry rule.
//!
//! [`TokenManager`] owns the shared [`TokenInfo`]; everything else here is plain data plus the
//! [`Clock`] seam that lets tests move time without sleeping.

mod manager;
mod secret;

pub use manager::*;
pub use secret::*;

// self
use crate::_prelude::*;

/// Tokens are refreshed this long before the provider-declared expiry.
pub const REFRESH_MARGIN: Duration = Duration::minutes(10);

/// Source of the current time for expiry checks.
pub trait Clock
where
	Self: 'static + Send + Sync,
{
	/// Returns the current instant.
	fn now(&self) -> OffsetDateTime;
}

/// Wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}
}

/// Manually advanced clock for tests and simulations.
#[derive(Debug)]
pub struct ManualClock(Mutex<OffsetDateTime>);
impl ManualClock {
	/// Starts the clock at `now`.
	pub fn new(now: OffsetDateTime) -> Self {
		Self(Mutex::new(now))
	}

	/// Moves the clock to `now`.
	pub fn set(&self, now: OffsetDateTime) {
		*self.0.lock() = now;
	}

	/// Moves the clock forward by `by`.
	pub fn advance(&self, by: Duration) {
		*self.0.lock() += by;
	}
}
impl Default for ManualClock {
	fn default() -> Self {
		Self::new(time::macros::datetime!(2025-01-01 00:00 UTC))
	}
}
impl Clock for ManualClock {
	fn now(&self) -> OffsetDateTime {
		*self.0.lock()
	}
}

/// Access token plus its declared lifetime.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tokens {
	/// Bearer access token.
	pub access_token: TokenSecret,
	/// Lifetime in seconds declared by the identity provider.
	pub expires_in: i64,
}

/// Current token and when it was granted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenInfo {
	/// Last granted token; empty before the first grant.
	pub tokens: Tokens,
	/// Grant instant; `None` before the first grant or after invalidation.
	pub grant_time: Option<OffsetDateTime>,
}
impl TokenInfo {
	/// Whether the token must be refreshed at `now`.
	///
	/// True once `now - grant_time > expires_in - REFRESH_MARGIN`, and always true without a
	/// grant time.
	pub fn is_expired(&self, now: OffsetDateTime) -> bool {
		match self.grant_time {
			Some(granted) =>
				now - granted > Duration::seconds(self.tokens.expires_in) - REFRESH_MARGIN,
			None => true,
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn granted_at(clock: &ManualClock) -> TokenInfo {
		TokenInfo {
			tokens: Tokens { access_token: TokenSecret::new("t"), expires_in: 12000 },
			grant_time: Some(clock.now()),
		}
	}

	#[test]
	fn refresh_window_opens_ten_minutes_early() {
		let clock = ManualClock::default();
		let info = granted_at(&clock);

		clock.advance(Duration::seconds(11000));

		assert!(!info.is_expired(clock.now()));

		clock.advance(Duration::seconds(400));

		assert!(!info.is_expired(clock.now()), "Boundary itself is still fresh.");

		clock.advance(Duration::seconds(590));

		assert!(info.is_expired(clock.now()));
	}

	#[test]
	fn missing_grant_time_is_expired() {
		let clock = ManualClock::default();
		let mut info = granted_at(&clock);

		info.grant_time = None;

		assert!(info.is_expired(clock.now()));
		assert!(TokenInfo::default().is_expired(clock.now()));
	}

	#[test]
	fn short_lived_tokens_are_always_due() {
		let clock = ManualClock::default();
		let mut info = granted_at(&clock);

		info.tokens.expires_in = 300;

		assert!(info.is_expired(clock.now()));
	}
}
