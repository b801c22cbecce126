//! Cluster reconciler.
//!
//! Ambari addresses clusters by name, so the cluster name is the identity;
//! a change of name is a rename request against the old name.

use std::collections::BTreeMap;

use ambari_client::{AmbariApi, Cluster, ClusterInfo};
use ambari_core::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::reconciler::{read_back, read_existing, Reconciler};
use crate::schema::{FieldSchema, FieldType, ResourceSchema};
use crate::state::{Observed, Operation, ResourceData};

pub const CLUSTER_KIND: &str = "ambari_cluster";

/// Server view of a cluster, mapped to declared-state attributes.
#[derive(Debug, Clone, PartialEq)]
struct ClusterSnapshot {
    cluster_id: Option<i64>,
    cluster_name: String,
    version: Option<String>,
}

impl From<ClusterInfo> for ClusterSnapshot {
    fn from(info: ClusterInfo) -> Self {
        Self {
            cluster_id: info.cluster_id,
            cluster_name: info.cluster_name,
            version: info.version,
        }
    }
}

impl ClusterSnapshot {
    fn into_attributes(self) -> BTreeMap<String, Value> {
        let mut attributes = BTreeMap::new();
        if let Some(id) = self.cluster_id {
            attributes.insert("cluster_id".to_string(), Value::from(id.to_string()));
        }
        attributes.insert("cluster_name".to_string(), Value::from(self.cluster_name));
        if let Some(version) = self.version {
            attributes.insert("version".to_string(), Value::from(version));
        }
        attributes
    }
}

pub struct ClusterReconciler {
    schema: ResourceSchema,
}

impl Default for ClusterReconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl ClusterReconciler {
    pub fn new() -> Self {
        Self {
            schema: ResourceSchema {
                kind: CLUSTER_KIND,
                fields: vec![
                    FieldSchema::computed(
                        "cluster_id",
                        FieldType::String,
                        "Identifier assigned by Ambari",
                    ),
                    FieldSchema::required("cluster_name", "Cluster name, used as the identity")
                        .path_segment(),
                    FieldSchema::required("version", "Stack version, e.g. HDP-2.6").force_new(),
                ],
            },
        }
    }
}

#[async_trait]
impl Reconciler for ClusterReconciler {
    fn kind(&self) -> &'static str {
        CLUSTER_KIND
    }

    fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    async fn create(&self, api: &dyn AmbariApi, data: &mut ResourceData) -> Result<()> {
        let name = data.require_str("cluster_name")?.to_string();
        let version = data.require_str("version")?.to_string();
        info!("Creating cluster {}", name);

        let request = Cluster::new(&name, version);
        debug!("Cluster to create: {:?}", request);

        let created = api.create_cluster(&request).await?;
        debug!("Cluster after create: {:?}", created);

        // The server's spelling of the name wins
        let id = created.map(|c| c.cluster.cluster_name).unwrap_or(name);
        info!("Cluster ID: {}", id);
        data.set_id(id);

        read_back(self, api, data).await
    }

    async fn read(&self, api: &dyn AmbariApi, data: &mut ResourceData) -> Result<Observed> {
        let Some(name) = data.id().map(str::to_string) else {
            return Ok(Observed::Missing);
        };
        info!("Refreshing cluster {}", name);

        match api.get_cluster(&name).await? {
            None => {
                warn!("Cluster {} not found, clearing it from state", name);
                data.clear_id();
                Ok(Observed::Missing)
            }
            Some(cluster) => {
                debug!("Cluster after read: {:?}", cluster);
                let snapshot = ClusterSnapshot::from(cluster.cluster);
                data.set_id(snapshot.cluster_name.clone());
                data.replace_attributes(snapshot.into_attributes());
                Ok(Observed::Present)
            }
        }
    }

    async fn update(&self, api: &dyn AmbariApi, data: &mut ResourceData) -> Result<()> {
        let old_name = data.require_id(Operation::Update)?.to_string();
        let new_name = data.require_str("cluster_name")?.to_string();

        if old_name == new_name {
            debug!("Cluster {} keeps its name, nothing to rename", old_name);
        } else {
            info!("Renaming cluster {} to {}", old_name, new_name);
            let updated = api
                .update_cluster(&old_name, &Cluster::rename_to(&new_name))
                .await?;
            debug!("Cluster after update: {:?}", updated);

            let id = updated.map(|c| c.cluster.cluster_name).unwrap_or(new_name);
            info!("New cluster ID: {}", id);
            data.set_id(id);
        }

        read_back(self, api, data).await
    }

    async fn delete(&self, api: &dyn AmbariApi, data: &mut ResourceData) -> Result<()> {
        let name = data.require_id(Operation::Delete)?.to_string();
        info!("Deleting cluster {}", name);

        match api.delete_cluster(&name).await {
            Ok(()) => {}
            Err(Error::NotFound(_)) => warn!("Cluster {} already absent", name),
            Err(e) => return Err(e),
        }

        data.clear_id();
        Ok(())
    }

    async fn import(
        &self,
        api: &dyn AmbariApi,
        data: &mut ResourceData,
        import_id: &str,
    ) -> Result<()> {
        if import_id.is_empty() {
            return Err(Error::Validation("cluster import id must be a cluster name".into()));
        }
        info!("Importing cluster {}", import_id);
        let mut staged = data.clone();
        staged.set_id(import_id);
        read_existing(self, api, staged, data, import_id).await
    }
}
