//! Privilege reconciler.
//!
//! Creation returns no identifier: the new record is located through the
//! identity resolver and addressed by `privilege_id` from then on. The id
//! never changes on update.

use std::collections::BTreeMap;

use ambari_client::{
    AmbariApi, PermissionName, PrincipalType, Privilege, PrivilegeFilter, PrivilegeInfo,
};
use ambari_core::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::reconciler::{read_back, read_existing, Reconciler};
use crate::resolver::resolve_privilege;
use crate::schema::{FieldSchema, FieldType, ResourceSchema};
use crate::state::{Observed, Operation, ResourceData};

pub const PRIVILEGE_KIND: &str = "ambari_privilege";

/// Declared natural key, parsed and validated.
#[derive(Debug, Clone, PartialEq)]
struct DeclaredPrivilege {
    cluster_name: String,
    filter: PrivilegeFilter,
}

impl DeclaredPrivilege {
    fn from_data(data: &ResourceData) -> Result<Self> {
        Ok(Self {
            cluster_name: data.require_str("cluster_name")?.to_string(),
            filter: PrivilegeFilter {
                permission_name: data.require_str("permission_name")?.parse::<PermissionName>()?,
                principal_name: data.require_str("principal_name")?.to_string(),
                principal_type: data.require_str("principal_type")?.parse::<PrincipalType>()?,
            },
        })
    }

    fn body(&self) -> Privilege {
        Privilege::new(
            self.filter.permission_name,
            self.filter.principal_name.clone(),
            self.filter.principal_type,
        )
    }
}

/// Server view of a privilege, mapped to declared-state attributes.
#[derive(Debug, Clone, PartialEq)]
struct PrivilegeSnapshot {
    privilege_id: i64,
    cluster_name: String,
    info: PrivilegeInfo,
}

impl PrivilegeSnapshot {
    fn into_attributes(self) -> BTreeMap<String, Value> {
        let mut attributes = BTreeMap::new();
        attributes.insert("privilege_id".to_string(), Value::from(self.privilege_id));
        attributes.insert(
            "cluster_name".to_string(),
            Value::from(self.info.cluster_name.unwrap_or(self.cluster_name)),
        );
        attributes.insert(
            "permission_label".to_string(),
            Value::from(self.info.permission_label.unwrap_or_default()),
        );
        attributes.insert(
            "permission_name".to_string(),
            Value::from(self.info.permission_name),
        );
        attributes.insert(
            "principal_name".to_string(),
            Value::from(self.info.principal_name),
        );
        attributes.insert(
            "principal_type".to_string(),
            Value::from(self.info.principal_type),
        );
        attributes
    }
}

fn parse_privilege_id(raw: &str) -> Result<i64> {
    raw.parse::<i64>()
        .map_err(|_| Error::Validation(format!("privilege id `{}` is not an integer", raw)))
}

pub struct PrivilegeReconciler {
    schema: ResourceSchema,
}

impl Default for PrivilegeReconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl PrivilegeReconciler {
    pub fn new() -> Self {
        Self {
            schema: ResourceSchema {
                kind: PRIVILEGE_KIND,
                fields: vec![
                    FieldSchema::computed(
                        "privilege_id",
                        FieldType::Int,
                        "Identifier assigned by Ambari",
                    ),
                    FieldSchema::required("cluster_name", "Cluster the privilege applies to")
                        .force_new()
                        .path_segment(),
                    FieldSchema::computed(
                        "permission_label",
                        FieldType::String,
                        "Display label of the permission",
                    ),
                    FieldSchema::required("permission_name", "Permission granted")
                        .one_of(PermissionName::all().iter().map(|p| p.as_str())),
                    FieldSchema::required("principal_name", "User or group name"),
                    FieldSchema::required("principal_type", "Kind of principal")
                        .one_of(PrincipalType::all().iter().map(|p| p.as_str())),
                ],
            },
        }
    }
}

#[async_trait]
impl Reconciler for PrivilegeReconciler {
    fn kind(&self) -> &'static str {
        PRIVILEGE_KIND
    }

    fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    async fn create(&self, api: &dyn AmbariApi, data: &mut ResourceData) -> Result<()> {
        let declared = DeclaredPrivilege::from_data(data)?;
        let cluster = declared.cluster_name.as_str();
        info!(
            "Creating privilege {} for {} {} on cluster {}",
            declared.filter.permission_name,
            declared.filter.principal_type,
            declared.filter.principal_name,
            cluster
        );

        let body = declared.body();
        debug!("Privilege to create: {:?}", body);
        match api.create_privilege(cluster, &body).await {
            Ok(()) => {}
            // Left behind by an earlier create whose resolution failed
            Err(Error::Http { status: 409, body: message }) => {
                warn!(
                    "Privilege already exists on cluster {}, adopting it: {}",
                    cluster, message
                );
            }
            Err(e) => return Err(e),
        }

        // The create response carries no id; look the record up by natural key
        let id = resolve_privilege(api, cluster, &declared.filter)
            .await?
            .into_privilege_id(cluster, &declared.filter)?;
        info!("Privilege ID: {}", id);
        data.set_id(id.to_string());

        read_back(self, api, data).await
    }

    async fn read(&self, api: &dyn AmbariApi, data: &mut ResourceData) -> Result<Observed> {
        let Some(raw_id) = data.id() else {
            return Ok(Observed::Missing);
        };
        let id = parse_privilege_id(raw_id)?;
        let cluster = data.require_str("cluster_name")?.to_string();
        info!("Refreshing privilege {} on cluster {}", id, cluster);

        match api.get_privilege(&cluster, id).await? {
            None => {
                warn!("Privilege {} not found on cluster {}, clearing it from state", id, cluster);
                data.clear_id();
                Ok(Observed::Missing)
            }
            Some(privilege) => {
                debug!("Privilege after read: {:?}", privilege);
                let snapshot = PrivilegeSnapshot {
                    privilege_id: id,
                    cluster_name: cluster,
                    info: privilege.info,
                };
                data.replace_attributes(snapshot.into_attributes());
                Ok(Observed::Present)
            }
        }
    }

    async fn update(&self, api: &dyn AmbariApi, data: &mut ResourceData) -> Result<()> {
        let id = parse_privilege_id(data.require_id(Operation::Update)?)?;
        let declared = DeclaredPrivilege::from_data(data)?;
        info!(
            "Updating privilege {} on cluster {}",
            id, declared.cluster_name
        );

        let body = declared.body();
        debug!("Privilege to update: {:?}", body);
        api.update_privilege(&declared.cluster_name, id, &body)
            .await?;

        read_back(self, api, data).await
    }

    async fn delete(&self, api: &dyn AmbariApi, data: &mut ResourceData) -> Result<()> {
        let id = parse_privilege_id(data.require_id(Operation::Delete)?)?;
        let cluster = data.require_str("cluster_name")?.to_string();
        info!("Deleting privilege {} on cluster {}", id, cluster);

        match api.delete_privilege(&cluster, id).await {
            Ok(()) => {}
            Err(Error::NotFound(_)) => {
                warn!("Privilege {} on cluster {} already absent", id, cluster)
            }
            Err(e) => return Err(e),
        }

        data.clear_id();
        Ok(())
    }

    /// Accepts `<cluster_name>/<privilege_id>`, or a bare id when
    /// `cluster_name` is already declared.
    async fn import(
        &self,
        api: &dyn AmbariApi,
        data: &mut ResourceData,
        import_id: &str,
    ) -> Result<()> {
        let (cluster, raw_id) = match import_id.rsplit_once('/') {
            Some((cluster, raw_id)) if !cluster.is_empty() => {
                (cluster.to_string(), raw_id)
            }
            _ => {
                let cluster = data.require_str("cluster_name").map_err(|_| {
                    Error::Validation(format!(
                        "privilege import id `{}` must be <cluster_name>/<privilege_id>",
                        import_id
                    ))
                })?;
                (cluster.to_string(), import_id)
            }
        };
        let id = parse_privilege_id(raw_id)?;
        info!("Importing privilege {} on cluster {}", id, cluster);

        let mut staged = data.clone();
        staged.set("cluster_name", cluster);
        staged.set_id(id.to_string());
        read_existing(self, api, staged, data, import_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ambari_client::MockAmbariApi;
    use mockall::predicate::eq;
    use mockall::Sequence;

    fn remote(id: i64, permission: &str, name: &str, kind: &str) -> Privilege {
        Privilege {
            info: PrivilegeInfo {
                privilege_id: Some(id),
                cluster_name: Some("c1".into()),
                permission_label: Some("Cluster User".into()),
                permission_name: permission.into(),
                principal_name: name.into(),
                principal_type: kind.into(),
            },
        }
    }

    fn declared() -> ResourceData {
        ResourceData::new()
            .with("cluster_name", "c1")
            .with("permission_name", "CLUSTER.USER")
            .with("principal_name", "alice")
            .with("principal_type", "USER")
    }

    fn alice_filter() -> PrivilegeFilter {
        PrivilegeFilter {
            permission_name: PermissionName::ClusterUser,
            principal_name: "alice".into(),
            principal_type: PrincipalType::User,
        }
    }

    #[tokio::test]
    async fn test_create_resolves_id_then_reads() {
        let mut api = MockAmbariApi::new();
        let mut seq = Sequence::new();
        api.expect_create_privilege()
            .withf(|cluster, body| {
                cluster == "c1"
                    && body
                        == &Privilege::new(PermissionName::ClusterUser, "alice", PrincipalType::User)
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        api.expect_list_privileges()
            .with(eq("c1"), eq(alice_filter()))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(vec![remote(42, "CLUSTER.USER", "alice", "USER")]));
        api.expect_get_privilege()
            .with(eq("c1"), eq(42))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(Some(remote(42, "CLUSTER.USER", "alice", "USER"))));

        let mut data = declared();
        PrivilegeReconciler::new()
            .create(&api, &mut data)
            .await
            .unwrap();

        assert_eq!(data.id(), Some("42"));
        assert_eq!(data.get("privilege_id"), Some(&Value::from(42)));
        assert_eq!(data.get_str("permission_label"), Some("Cluster User"));
        assert_eq!(data.get_str("principal_name"), Some("alice"));
    }

    #[tokio::test]
    async fn test_create_without_match_reports_missing_id() {
        let mut api = MockAmbariApi::new();
        api.expect_create_privilege().returning(|_, _| Ok(()));
        api.expect_list_privileges().returning(|_, _| Ok(vec![]));
        api.expect_get_privilege().times(0);

        let mut data = declared();
        let err = PrivilegeReconciler::new()
            .create(&api, &mut data)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::PrivilegeIdNotFound { .. }));
        assert!(!data.is_present());
    }

    #[tokio::test]
    async fn test_create_with_duplicate_natural_key_fails() {
        let mut api = MockAmbariApi::new();
        api.expect_create_privilege().returning(|_, _| Ok(()));
        api.expect_list_privileges().returning(|_, _| {
            Ok(vec![
                remote(3, "CLUSTER.USER", "alice", "USER"),
                remote(8, "CLUSTER.USER", "alice", "USER"),
            ])
        });
        api.expect_get_privilege().times(0);

        let mut data = declared();
        let err = PrivilegeReconciler::new()
            .create(&api, &mut data)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::AmbiguousPrivilege { count: 2, .. }));
        assert!(!data.is_present());
    }

    #[tokio::test]
    async fn test_create_conflict_adopts_existing_record() {
        let mut api = MockAmbariApi::new();
        api.expect_create_privilege().times(1).returning(|_, _| {
            Err(Error::Http {
                status: 409,
                body: "Privilege already exists".into(),
            })
        });
        api.expect_list_privileges()
            .with(eq("c1"), eq(alice_filter()))
            .times(1)
            .returning(|_, _| Ok(vec![remote(17, "CLUSTER.USER", "alice", "USER")]));
        api.expect_get_privilege()
            .with(eq("c1"), eq(17))
            .returning(|_, _| Ok(Some(remote(17, "CLUSTER.USER", "alice", "USER"))));

        let mut data = declared();
        PrivilegeReconciler::new()
            .create(&api, &mut data)
            .await
            .unwrap();
        assert_eq!(data.id(), Some("17"));
    }

    #[tokio::test]
    async fn test_create_conflict_without_match_still_fails() {
        let mut api = MockAmbariApi::new();
        api.expect_create_privilege().returning(|_, _| {
            Err(Error::Http {
                status: 409,
                body: "Privilege already exists".into(),
            })
        });
        api.expect_list_privileges().returning(|_, _| Ok(vec![]));

        let mut data = declared();
        let err = PrivilegeReconciler::new()
            .create(&api, &mut data)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PrivilegeIdNotFound { .. }));
        assert!(!data.is_present());
    }

    #[tokio::test]
    async fn test_create_other_http_error_skips_resolution() {
        let mut api = MockAmbariApi::new();
        api.expect_create_privilege().returning(|_, _| {
            Err(Error::Http {
                status: 500,
                body: "boom".into(),
            })
        });
        api.expect_list_privileges().times(0);

        let mut data = declared();
        let err = PrivilegeReconciler::new()
            .create(&api, &mut data)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Http { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_permission_before_any_call() {
        let api = MockAmbariApi::new();
        let mut data = declared().with("permission_name", "AMBARI.ADMINISTRATOR");

        let err = PrivilegeReconciler::new()
            .create(&api, &mut data)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_read_missing_clears_identity() {
        let mut api = MockAmbariApi::new();
        api.expect_get_privilege().returning(|_, _| Ok(None));

        let mut data = declared();
        data.set_id("42");
        let observed = PrivilegeReconciler::new()
            .read(&api, &mut data)
            .await
            .unwrap();
        assert_eq!(observed, Observed::Missing);
        assert!(!data.is_present());
    }

    #[tokio::test]
    async fn test_read_overwrites_drift() {
        let mut api = MockAmbariApi::new();
        api.expect_get_privilege()
            .returning(|_, _| Ok(Some(remote(42, "CLUSTER.OPERATOR", "alice", "USER"))));

        let mut data = declared();
        data.set_id("42");
        PrivilegeReconciler::new()
            .read(&api, &mut data)
            .await
            .unwrap();
        assert_eq!(data.get_str("permission_name"), Some("CLUSTER.OPERATOR"));
    }

    #[tokio::test]
    async fn test_read_rejects_non_numeric_id() {
        let api = MockAmbariApi::new();
        let mut data = declared();
        data.set_id("forty-two");
        let err = PrivilegeReconciler::new()
            .read(&api, &mut data)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_keeps_privilege_id() {
        let mut api = MockAmbariApi::new();
        api.expect_update_privilege()
            .withf(|cluster, id, body| {
                cluster == "c1" && *id == 42 && body.info.permission_name == "CLUSTER.OPERATOR"
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        api.expect_get_privilege()
            .with(eq("c1"), eq(42))
            .returning(|_, _| Ok(Some(remote(42, "CLUSTER.OPERATOR", "alice", "USER"))));

        let mut data = declared().with("permission_name", "CLUSTER.OPERATOR");
        data.set_id("42");
        PrivilegeReconciler::new()
            .update(&api, &mut data)
            .await
            .unwrap();

        assert_eq!(data.id(), Some("42"));
        assert_eq!(data.get_str("permission_name"), Some("CLUSTER.OPERATOR"));
    }

    #[tokio::test]
    async fn test_update_missing_is_error() {
        let mut api = MockAmbariApi::new();
        api.expect_update_privilege()
            .returning(|_, _, _| Err(Error::NotFound("privilege 42 on cluster c1".into())));

        let mut data = declared();
        data.set_id("42");
        let err = PrivilegeReconciler::new()
            .update(&api, &mut data)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_absent_is_noop() {
        let mut api = MockAmbariApi::new();
        api.expect_delete_privilege()
            .with(eq("c1"), eq(42))
            .returning(|_, _| Err(Error::NotFound("privilege 42 on cluster c1".into())));

        let mut data = declared();
        data.set_id("42");
        PrivilegeReconciler::new()
            .delete(&api, &mut data)
            .await
            .unwrap();
        assert!(!data.is_present());
    }

    #[tokio::test]
    async fn test_import_with_cluster_prefix() {
        let mut api = MockAmbariApi::new();
        api.expect_get_privilege()
            .with(eq("c1"), eq(42))
            .returning(|_, _| Ok(Some(remote(42, "CLUSTER.USER", "alice", "USER"))));

        let mut data = ResourceData::new();
        PrivilegeReconciler::new()
            .import(&api, &mut data, "c1/42")
            .await
            .unwrap();

        assert_eq!(data.id(), Some("42"));
        assert_eq!(data.get_str("cluster_name"), Some("c1"));
        assert_eq!(data.get_str("principal_type"), Some("USER"));
    }

    #[tokio::test]
    async fn test_import_bare_id_needs_cluster() {
        let api = MockAmbariApi::new();
        let mut data = ResourceData::new();
        let err = PrivilegeReconciler::new()
            .import(&api, &mut data, "42")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_import_missing_fails() {
        let mut api = MockAmbariApi::new();
        api.expect_get_privilege().returning(|_, _| Ok(None));

        let mut data = ResourceData::new().with("cluster_name", "c1");
        let err = PrivilegeReconciler::new()
            .import(&api, &mut data, "42")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_import_failed_read_leaves_state_untouched() {
        let mut api = MockAmbariApi::new();
        api.expect_get_privilege()
            .with(eq("c1"), eq(42))
            .returning(|_, _| {
                Err(Error::Http {
                    status: 503,
                    body: "Service Unavailable".into(),
                })
            });

        let mut data = ResourceData::new();
        let err = PrivilegeReconciler::new()
            .import(&api, &mut data, "c1/42")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Http { status: 503, .. }));
        assert!(!data.is_present());
        assert_eq!(data.get_str("cluster_name"), None);
    }
}
