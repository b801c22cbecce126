//! Reconciliation engine for Ambari clusters and privileges.
//!
//! The host hands a declared [`ResourceData`] to the [`Provider`], which
//! dispatches by resource kind to a [`Reconciler`]. Reconcilers translate
//! the declared state into REST calls through [`ambari_client::AmbariApi`]
//! and overwrite the state with the server's view after every write.

pub mod cluster;
pub mod privilege;
pub mod provider;
pub mod reconciler;
pub mod resolver;
pub mod schema;
pub mod state;

pub use cluster::{ClusterReconciler, CLUSTER_KIND};
pub use privilege::{PrivilegeReconciler, PRIVILEGE_KIND};
pub use provider::{schemas, Provider};
pub use reconciler::Reconciler;
pub use resolver::{resolve_privilege, Resolution};
pub use schema::{FieldSchema, FieldType, ResourceSchema};
pub use state::{Lifecycle, Observed, Operation, ResourceData};
