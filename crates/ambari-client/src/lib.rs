//! Ambari REST client: wire types, the `AmbariApi` contract and its
//! `reqwest` implementation.
//!
//! Reconcilers depend only on [`AmbariApi`], so tests can swap the HTTP
//! client for a mock (enable the `mock` feature to get `MockAmbariApi`).

pub mod api;
pub mod client;
pub mod types;

pub use api::AmbariApi;
#[cfg(any(test, feature = "mock"))]
pub use api::MockAmbariApi;
pub use client::AmbariClient;
pub use types::*;
