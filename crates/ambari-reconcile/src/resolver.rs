//! Identity resolution for privileges.
//!
//! Creating a privilege returns no identifier, so the new record is located
//! by its natural key (cluster, permission, principal name, principal type)
//! with a filtered list query.

use ambari_client::{AmbariApi, Privilege, PrivilegeFilter};
use ambari_core::{Error, Result};
use tracing::debug;

/// Result of looking a privilege up by natural key.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Found(Privilege),
    NotFound,
    /// More than one record matched; the natural key is not unique remotely.
    Ambiguous(usize),
}

impl Resolution {
    /// Pick the record matching `filter` out of `records`. The server-side
    /// filter is re-applied locally so the outcome only depends on the
    /// records that actually match.
    pub fn select(records: Vec<Privilege>, filter: &PrivilegeFilter) -> Self {
        let mut matching: Vec<Privilege> = records
            .into_iter()
            .filter(|p| filter.matches(&p.info))
            .collect();

        match matching.len() {
            0 => Resolution::NotFound,
            1 => Resolution::Found(matching.remove(0)),
            n => Resolution::Ambiguous(n),
        }
    }

    /// The server-assigned id, failing loudly on zero or several matches.
    pub fn into_privilege_id(self, cluster: &str, filter: &PrivilegeFilter) -> Result<i64> {
        match self {
            Resolution::Found(Privilege {
                info:
                    ambari_client::PrivilegeInfo {
                        privilege_id: Some(id),
                        ..
                    },
            }) => Ok(id),
            Resolution::Found(_) | Resolution::NotFound => Err(Error::PrivilegeIdNotFound {
                cluster_name: cluster.to_string(),
                permission_name: filter.permission_name.to_string(),
                principal_name: filter.principal_name.clone(),
                principal_type: filter.principal_type.to_string(),
            }),
            Resolution::Ambiguous(count) => Err(Error::AmbiguousPrivilege {
                count,
                cluster_name: cluster.to_string(),
                permission_name: filter.permission_name.to_string(),
                principal_name: filter.principal_name.clone(),
                principal_type: filter.principal_type.to_string(),
            }),
        }
    }
}

/// Query `cluster`'s privileges by natural key.
pub async fn resolve_privilege(
    api: &dyn AmbariApi,
    cluster: &str,
    filter: &PrivilegeFilter,
) -> Result<Resolution> {
    let records = api.list_privileges(cluster, filter).await?;
    debug!(
        "{} privileges returned for {:?} on cluster {}",
        records.len(),
        filter,
        cluster
    );
    Ok(Resolution::select(records, filter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ambari_client::{MockAmbariApi, PermissionName, PrincipalType};
    use mockall::predicate::eq;

    fn filter() -> PrivilegeFilter {
        PrivilegeFilter {
            permission_name: PermissionName::ClusterUser,
            principal_name: "alice".into(),
            principal_type: PrincipalType::User,
        }
    }

    fn record(id: i64, permission: PermissionName, name: &str, kind: PrincipalType) -> Privilege {
        let mut privilege = Privilege::new(permission, name, kind);
        privilege.info.privilege_id = Some(id);
        privilege.info.permission_label = Some("Cluster User".into());
        privilege
    }

    #[test]
    fn test_select_exactly_one() {
        let records = vec![
            record(1, PermissionName::ClusterUser, "bob", PrincipalType::User),
            record(2, PermissionName::ClusterUser, "alice", PrincipalType::User),
            record(3, PermissionName::ClusterUser, "alice", PrincipalType::Group),
        ];
        let resolution = Resolution::select(records, &filter());
        assert_eq!(
            resolution,
            Resolution::Found(record(2, PermissionName::ClusterUser, "alice", PrincipalType::User))
        );
        assert_eq!(resolution.into_privilege_id("c1", &filter()).unwrap(), 2);
    }

    #[test]
    fn test_select_none() {
        let records = vec![record(
            1,
            PermissionName::ClusterOperator,
            "alice",
            PrincipalType::User,
        )];
        let resolution = Resolution::select(records, &filter());
        assert_eq!(resolution, Resolution::NotFound);

        let err = resolution.into_privilege_id("c1", &filter()).unwrap_err();
        assert!(matches!(err, Error::PrivilegeIdNotFound { .. }));
        assert!(err.to_string().starts_with("Privilege ID not found"));
    }

    #[test]
    fn test_select_ambiguous_fails_loudly() {
        let records = vec![
            record(4, PermissionName::ClusterUser, "alice", PrincipalType::User),
            record(9, PermissionName::ClusterUser, "alice", PrincipalType::User),
        ];
        let resolution = Resolution::select(records, &filter());
        assert_eq!(resolution, Resolution::Ambiguous(2));

        let err = resolution.into_privilege_id("c1", &filter()).unwrap_err();
        assert!(matches!(err, Error::AmbiguousPrivilege { count: 2, .. }));
    }

    #[test]
    fn test_match_without_id_is_not_found() {
        let privilege = Privilege::new(PermissionName::ClusterUser, "alice", PrincipalType::User);
        let resolution = Resolution::select(vec![privilege], &filter());
        assert!(matches!(
            resolution.into_privilege_id("c1", &filter()),
            Err(Error::PrivilegeIdNotFound { .. })
        ));
    }

    #[test]
    fn test_select_ignores_record_order() {
        let a = record(1, PermissionName::ClusterUser, "alice", PrincipalType::User);
        let b = record(5, PermissionName::ServiceOperator, "alice", PrincipalType::User);
        assert_eq!(
            Resolution::select(vec![a.clone(), b.clone()], &filter()),
            Resolution::select(vec![b, a], &filter())
        );
    }

    #[tokio::test]
    async fn test_resolve_queries_cluster_with_filter() {
        let mut api = MockAmbariApi::new();
        api.expect_list_privileges()
            .with(eq("c1"), eq(filter()))
            .times(1)
            .returning(|_, _| {
                Ok(vec![record(
                    12,
                    PermissionName::ClusterUser,
                    "alice",
                    PrincipalType::User,
                )])
            });

        let resolution = resolve_privilege(&api, "c1", &filter()).await.unwrap();
        assert!(matches!(resolution, Resolution::Found(_)));
    }

    #[tokio::test]
    async fn test_resolve_propagates_transport_error() {
        let mut api = MockAmbariApi::new();
        api.expect_list_privileges()
            .returning(|_, _| Err(Error::Transport("connection refused".into())));

        let err = resolve_privilege(&api, "c1", &filter()).await.unwrap_err();
        assert!(matches!(err, Error::Transport(_)));
    }
}
