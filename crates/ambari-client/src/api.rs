//! The typed CRUD contract the reconcilers are written against.

use ambari_core::Result;
use async_trait::async_trait;

#[cfg(any(test, feature = "mock"))]
use mockall::automock;

use crate::types::{Cluster, Privilege, PrivilegeFilter};

/// Operations consumed from the Ambari management API.
///
/// `get_*` report a missing entity as `Ok(None)`. Mutations keyed by an
/// existing entity report a missing one as `Error::NotFound`, so callers can
/// decide whether absence is fatal.
#[cfg_attr(any(test, feature = "mock"), automock)]
#[async_trait]
pub trait AmbariApi: Send + Sync {
    /// `POST /clusters`. Returns the created cluster when the server echoes it.
    async fn create_cluster(&self, cluster: &Cluster) -> Result<Option<Cluster>>;

    /// `GET /clusters/{name}`
    async fn get_cluster(&self, name: &str) -> Result<Option<Cluster>>;

    /// `PUT /clusters/{old_name}`, used to rename a cluster.
    async fn update_cluster(&self, old_name: &str, cluster: &Cluster) -> Result<Option<Cluster>>;

    /// `DELETE /clusters/{name}`
    async fn delete_cluster(&self, name: &str) -> Result<()>;

    /// `POST /clusters/{cluster}/privileges`. The response carries no id.
    async fn create_privilege(&self, cluster: &str, privilege: &Privilege) -> Result<()>;

    /// `GET /clusters/{cluster}/privileges?...` with equality predicates.
    async fn list_privileges(
        &self,
        cluster: &str,
        filter: &PrivilegeFilter,
    ) -> Result<Vec<Privilege>>;

    /// `GET /clusters/{cluster}/privileges/{id}`
    async fn get_privilege(&self, cluster: &str, id: i64) -> Result<Option<Privilege>>;

    /// `PUT /clusters/{cluster}/privileges/{id}`
    async fn update_privilege(&self, cluster: &str, id: i64, privilege: &Privilege)
        -> Result<()>;

    /// `DELETE /clusters/{cluster}/privileges/{id}`
    async fn delete_privilege(&self, cluster: &str, id: i64) -> Result<()>;
}
