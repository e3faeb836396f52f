//! Typed snapshots of platform resources.
//!
//! Resources are fetched per call and never cached by the client, except for the discovered
//! [`Endpoints`] and the plan translations held by
//! [`ServicePlanCache`](crate::client::ServicePlanCache).

mod app;
mod endpoints;
mod id;
mod identity;
mod process;
mod role;
mod service;

pub use app::*;
pub use endpoints::*;
pub use id::*;
pub use identity::*;
pub use process::*;
pub use role::*;
pub use service::*;
