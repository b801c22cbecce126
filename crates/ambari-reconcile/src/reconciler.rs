use ambari_client::AmbariApi;
use ambari_core::{Error, Result};
use async_trait::async_trait;

use crate::schema::ResourceSchema;
use crate::state::{Observed, ResourceData};

/// The four-operation contract plus import, implemented once per resource
/// kind. Every operation runs a single attempt per remote call and reports
/// failures immediately.
#[async_trait]
pub trait Reconciler: Send + Sync {
    fn kind(&self) -> &'static str;

    fn schema(&self) -> &ResourceSchema;

    /// Create the remote entity, set the identity, then read it back.
    async fn create(&self, api: &dyn AmbariApi, data: &mut ResourceData) -> Result<()>;

    /// Refresh from the server. A missing entity clears the identity and is
    /// not an error.
    async fn read(&self, api: &dyn AmbariApi, data: &mut ResourceData) -> Result<Observed>;

    /// Push the declared mutable fields, then read back.
    async fn update(&self, api: &dyn AmbariApi, data: &mut ResourceData) -> Result<()>;

    /// Delete the remote entity. Already-absent entities count as deleted.
    async fn delete(&self, api: &dyn AmbariApi, data: &mut ResourceData) -> Result<()>;

    /// Adopt an existing remote entity; fails if it does not exist.
    async fn import(
        &self,
        api: &dyn AmbariApi,
        data: &mut ResourceData,
        import_id: &str,
    ) -> Result<()>;
}

/// Read after a write. The entity was just written, so finding it missing
/// is an error rather than drift.
pub(crate) async fn read_back<R>(
    reconciler: &R,
    api: &dyn AmbariApi,
    data: &mut ResourceData,
) -> Result<()>
where
    R: Reconciler + ?Sized,
{
    let id = data.id().unwrap_or_default().to_string();
    match reconciler.read(api, data).await? {
        Observed::Present => Ok(()),
        Observed::Missing => Err(Error::NotFound(format!(
            "{} {} disappeared right after it was written",
            reconciler.kind(),
            id
        ))),
    }
}

/// Read for import: absence is fatal. The read runs on `staged`, which
/// replaces `data` only once the entity has been found, so a failed import
/// leaves `data` untouched.
pub(crate) async fn read_existing<R>(
    reconciler: &R,
    api: &dyn AmbariApi,
    mut staged: ResourceData,
    data: &mut ResourceData,
    import_id: &str,
) -> Result<()>
where
    R: Reconciler + ?Sized,
{
    match reconciler.read(api, &mut staged).await? {
        Observed::Present => {
            *data = staged;
            Ok(())
        }
        Observed::Missing => Err(Error::NotFound(format!(
            "{} {} does not exist",
            reconciler.kind(),
            import_id
        ))),
    }
}
