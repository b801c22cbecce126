//! Ambari wire types: cluster and privilege envelopes.

use std::fmt;
use std::str::FromStr;

use ambari_core::Error;
use serde::{Deserialize, Serialize};

/// Cluster envelope: `{"Cluster": {...}}`.
///
/// Ambari itself answers with a `Clusters` key, accepted as an alias.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    #[serde(rename = "Cluster", alias = "Clusters")]
    pub cluster: ClusterInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<i64>,
    pub cluster_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Cluster {
    /// Body for a create request.
    pub fn new(cluster_name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            cluster: ClusterInfo {
                cluster_id: None,
                cluster_name: cluster_name.into(),
                version: Some(version.into()),
            },
        }
    }

    /// Body for a rename request: only the target name is sent.
    pub fn rename_to(cluster_name: impl Into<String>) -> Self {
        Self {
            cluster: ClusterInfo {
                cluster_id: None,
                cluster_name: cluster_name.into(),
                version: None,
            },
        }
    }
}

/// Privilege envelope: `{"PrivilegeInfo": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Privilege {
    #[serde(rename = "PrivilegeInfo")]
    pub info: PrivilegeInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrivilegeInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privilege_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission_label: Option<String>,
    pub permission_name: String,
    pub principal_name: String,
    pub principal_type: String,
}

impl Privilege {
    /// Body for create and update requests: the three mutable fields only.
    pub fn new(
        permission_name: PermissionName,
        principal_name: impl Into<String>,
        principal_type: PrincipalType,
    ) -> Self {
        Self {
            info: PrivilegeInfo {
                privilege_id: None,
                cluster_name: None,
                permission_label: None,
                permission_name: permission_name.to_string(),
                principal_name: principal_name.into(),
                principal_type: principal_type.to_string(),
            },
        }
    }
}

/// List response: Ambari wraps items in a collection envelope, but a bare
/// array is accepted too.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PrivilegeList {
    Collection {
        #[serde(default)]
        items: Vec<Privilege>,
    },
    Bare(Vec<Privilege>),
}

impl PrivilegeList {
    pub fn into_items(self) -> Vec<Privilege> {
        match self {
            PrivilegeList::Collection { items } => items,
            PrivilegeList::Bare(items) => items,
        }
    }
}

/// Permissions a cluster privilege may grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionName {
    ClusterAdministrator,
    ClusterOperator,
    ServiceAdministrator,
    ServiceOperator,
    ClusterUser,
}

impl PermissionName {
    pub fn all() -> &'static [PermissionName] {
        &[
            PermissionName::ClusterAdministrator,
            PermissionName::ClusterOperator,
            PermissionName::ServiceAdministrator,
            PermissionName::ServiceOperator,
            PermissionName::ClusterUser,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionName::ClusterAdministrator => "CLUSTER.ADMINISTRATOR",
            PermissionName::ClusterOperator => "CLUSTER.OPERATOR",
            PermissionName::ServiceAdministrator => "SERVICE.ADMINISTRATOR",
            PermissionName::ServiceOperator => "SERVICE.OPERATOR",
            PermissionName::ClusterUser => "CLUSTER.USER",
        }
    }
}

impl fmt::Display for PermissionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PermissionName::all()
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| {
                Error::Validation(format!(
                    "permission_name `{}` must be one of {}",
                    s,
                    PermissionName::all()
                        .iter()
                        .map(|p| p.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }
}

/// Kind of principal a privilege is granted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrincipalType {
    Group,
    User,
}

impl PrincipalType {
    pub fn all() -> &'static [PrincipalType] {
        &[PrincipalType::Group, PrincipalType::User]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PrincipalType::Group => "GROUP",
            PrincipalType::User => "USER",
        }
    }
}

impl fmt::Display for PrincipalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrincipalType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GROUP" => Ok(PrincipalType::Group),
            "USER" => Ok(PrincipalType::User),
            other => Err(Error::Validation(format!(
                "principal_type `{}` must be one of GROUP, USER",
                other
            ))),
        }
    }
}

/// Equality predicates used to find a privilege by its natural key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivilegeFilter {
    pub permission_name: PermissionName,
    pub principal_name: String,
    pub principal_type: PrincipalType,
}

impl PrivilegeFilter {
    /// Query-string predicates, plus a field selector so list items carry
    /// their full payload.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("PrivilegeInfo/permission_name", self.permission_name.to_string()),
            ("PrivilegeInfo/principal_name", self.principal_name.clone()),
            ("PrivilegeInfo/principal_type", self.principal_type.to_string()),
            ("fields", "PrivilegeInfo/*".to_string()),
        ]
    }

    pub fn matches(&self, info: &PrivilegeInfo) -> bool {
        info.permission_name == self.permission_name.as_str()
            && info.principal_name == self.principal_name
            && info.principal_type == self.principal_type.as_str()
    }
}
