//! Provider façade: kind registry and lifecycle-guarded dispatch.

use std::collections::BTreeMap;
use std::sync::Arc;

use ambari_client::{AmbariApi, AmbariClient};
use ambari_core::{Error, ProviderConfig, Result};
use tracing::{debug, info, info_span, warn, Instrument, Span};

use crate::cluster::ClusterReconciler;
use crate::privilege::PrivilegeReconciler;
use crate::reconciler::Reconciler;
use crate::schema::ResourceSchema;
use crate::state::{Lifecycle, Observed, Operation, ResourceData};

fn registry() -> BTreeMap<&'static str, Box<dyn Reconciler>> {
    let mut reconcilers: BTreeMap<&'static str, Box<dyn Reconciler>> = BTreeMap::new();
    for reconciler in [
        Box::new(ClusterReconciler::new()) as Box<dyn Reconciler>,
        Box::new(PrivilegeReconciler::new()),
    ] {
        reconcilers.insert(reconciler.kind(), reconciler);
    }
    reconcilers
}

/// Schemas of every registered kind, available without a client.
pub fn schemas() -> Vec<ResourceSchema> {
    registry()
        .into_values()
        .map(|r| r.schema().clone())
        .collect()
}

/// Entry point for the host. Holds one shared client and one reconciler per
/// resource kind.
pub struct Provider {
    api: Arc<dyn AmbariApi>,
    reconcilers: BTreeMap<&'static str, Box<dyn Reconciler>>,
}

impl Provider {
    pub fn new(api: Arc<dyn AmbariApi>) -> Self {
        let reconcilers = registry();
        info!("Provider: {} resource kinds registered", reconcilers.len());

        Self { api, reconcilers }
    }

    /// Build the `reqwest` client from resolved configuration.
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let client = AmbariClient::new(config)?;
        info!("Ambari API: {}", config.api_url);
        Ok(Self::new(Arc::new(client)))
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.reconcilers.keys().copied().collect()
    }

    pub fn schema(&self, kind: &str) -> Result<&ResourceSchema> {
        Ok(self.reconciler(kind)?.schema())
    }

    fn reconciler(&self, kind: &str) -> Result<&dyn Reconciler> {
        self.reconcilers
            .get(kind)
            .map(|r| r.as_ref())
            .ok_or_else(|| Error::UnknownResourceKind(kind.to_string()))
    }

    /// Resolve the reconciler and check that `operation` may start from the
    /// resource's current lifecycle state. Returns the in-flight state.
    fn begin(
        &self,
        kind: &str,
        operation: Operation,
        data: &ResourceData,
    ) -> Result<(&dyn Reconciler, Lifecycle)> {
        let reconciler = self.reconciler(kind)?;
        let in_flight = operation.begin(data.lifecycle())?;
        info!("{} {} ({:?})", operation, kind, in_flight);
        Ok((reconciler, in_flight))
    }

    pub async fn create(&self, kind: &str, data: &mut ResourceData) -> Result<()> {
        let (reconciler, in_flight) = self.begin(kind, Operation::Create, data)?;
        reconciler.schema().validate(data)?;
        let result = reconciler
            .create(self.api.as_ref(), data)
            .instrument(span(kind, Operation::Create, in_flight))
            .await;
        settle(kind, Operation::Create, in_flight, data, result)
    }

    pub async fn read(&self, kind: &str, data: &mut ResourceData) -> Result<Observed> {
        let (reconciler, in_flight) = self.begin(kind, Operation::Read, data)?;
        reconciler
            .read(self.api.as_ref(), data)
            .instrument(span(kind, Operation::Read, in_flight))
            .await
    }

    pub async fn update(&self, kind: &str, data: &mut ResourceData) -> Result<()> {
        let (reconciler, in_flight) = self.begin(kind, Operation::Update, data)?;
        reconciler.schema().validate(data)?;
        let result = reconciler
            .update(self.api.as_ref(), data)
            .instrument(span(kind, Operation::Update, in_flight))
            .await;
        settle(kind, Operation::Update, in_flight, data, result)
    }

    pub async fn delete(&self, kind: &str, data: &mut ResourceData) -> Result<()> {
        let (reconciler, in_flight) = self.begin(kind, Operation::Delete, data)?;
        let result = reconciler
            .delete(self.api.as_ref(), data)
            .instrument(span(kind, Operation::Delete, in_flight))
            .await;
        settle(kind, Operation::Delete, in_flight, data, result)
    }

    pub async fn import(&self, kind: &str, data: &mut ResourceData, import_id: &str) -> Result<()> {
        let (reconciler, in_flight) = self.begin(kind, Operation::Import, data)?;
        let result = reconciler
            .import(self.api.as_ref(), data, import_id)
            .instrument(span(kind, Operation::Import, in_flight))
            .await;
        settle(kind, Operation::Import, in_flight, data, result)
    }
}

/// Every log line emitted by a reconciler carries the in-flight state.
fn span(kind: &str, operation: Operation, in_flight: Lifecycle) -> Span {
    info_span!("reconcile", kind, %operation, state = ?in_flight)
}

/// Check where the operation left the resource against where it should be.
fn settle<T>(
    kind: &str,
    operation: Operation,
    in_flight: Lifecycle,
    data: &ResourceData,
    result: Result<T>,
) -> Result<T> {
    if let Some(expected) = operation.settles_to(result.is_ok()) {
        let settled = data.lifecycle();
        if settled == expected {
            debug!("{} {}: {:?} -> {:?}", operation, kind, in_flight, settled);
        } else {
            warn!(
                "{} {} left the resource {:?}, expected {:?}",
                operation, kind, settled, expected
            );
        }
    }
    result
}
