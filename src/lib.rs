//! Resilient control-plane client for autoscaling services: client-credentials tokens that refresh
//! ahead of expiry, retrying and paginated resource retrieval, concurrent fan-out, and forwarded
//! client certificate authentication for inbound service calls.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod lazy;
pub mod model;
pub mod oauth;
pub mod obs;
pub mod retriever;
pub mod retry;
pub mod token;
pub mod xfcc;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the `test` crate
	//! feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		client::PlatformClient,
		config::ClientConfig,
		token::{Clock, ManualClock},
	};

	/// Client identifier used by test configurations.
	pub const TEST_CLIENT_ID: &str = "autoscaler-client";
	/// Client secret used by test configurations.
	pub const TEST_CLIENT_SECRET: &str = "autoscaler-secret";

	/// Builds a configuration pointing at `api` with fast retries suitable for tests.
	pub fn test_config(api: &str, max_retries: u32) -> ClientConfig {
		ClientConfig::builder()
			.api(Url::parse(api).expect("Failed to parse test API URL."))
			.client_id(TEST_CLIENT_ID)
			.secret(TEST_CLIENT_SECRET)
			.max_retries(max_retries)
			.max_retry_wait(std::time::Duration::from_millis(5))
			.per_page(2)
			.build()
			.expect("Failed to build test client configuration.")
	}

	/// Constructs a reqwest-backed [`PlatformClient`] driven by a manual clock.
	pub fn build_test_client(api: &str, max_retries: u32) -> (PlatformClient, Arc<ManualClock>) {
		let clock = Arc::new(ManualClock::default());
		let shared: Arc<dyn Clock> = clock.clone();
		let client = PlatformClient::builder(test_config(api, max_retries))
			.clock(shared)
			.build()
			.expect("Failed to build test platform client.");

		(client, clock)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::{Mutex as AsyncMutex, RwLock as AsyncRwLock};
	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use {httpmock as _, rcgen as _, tower as _, tracing_subscriber as _};
