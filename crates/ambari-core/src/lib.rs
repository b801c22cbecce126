//! Ambari Core: error taxonomy and provider configuration.

pub mod config;
pub mod error;

pub use config::{ConfigOverrides, ProviderConfig};
pub use error::{Error, Result};
