//! statdash client - talks to the dashboard backend over HTTP
//!
//! The [`DashboardApi`] trait is the seam between the UI state machines and
//! the network. [`HttpDashboardClient`] is the real implementation;
//! [`mock::MockDashboardApi`] serves scripted replies for tests.

pub mod api;
pub mod error;
pub mod http;
pub mod mock;

pub use api::*;
pub use error::*;
pub use http::*;
