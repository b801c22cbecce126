//! Declared resource state and its lifecycle.

use std::collections::BTreeMap;
use std::fmt;

use ambari_core::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Local copy of one declared resource: a host-visible identity plus a flat
/// attribute map. `id == None` means the resource is absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceData {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    attributes: BTreeMap<String, Value>,
}

impl ResourceData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style attribute setter.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    pub fn clear_id(&mut self) {
        self.id = None;
    }

    /// The identity, or an error naming the operation that needed it.
    pub fn require_id(&self, operation: Operation) -> Result<&str> {
        self.id().ok_or_else(|| {
            Error::InvalidTransition(format!("{} requires a resource identity", operation))
        })
    }

    pub fn is_present(&self) -> bool {
        self.id.is_some()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        if self.is_present() {
            Lifecycle::Present
        } else {
            Lifecycle::Absent
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    /// A non-empty string attribute, or a validation error.
    pub fn require_str(&self, key: &str) -> Result<&str> {
        self.get_str(key)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::Validation(format!("{} is required", key)))
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.attributes.insert(key.to_string(), value.into());
    }

    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    /// Swap in a server snapshot wholesale; nothing from the previous
    /// attributes survives.
    pub fn replace_attributes(&mut self, attributes: BTreeMap<String, Value>) {
        self.attributes = attributes;
    }
}

/// Outcome of a read against the remote API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observed {
    Present,
    /// The remote entity is gone; the local identity has been cleared.
    Missing,
}

/// Per-instance lifecycle. `Creating`, `Updating` and `Deleting` only exist
/// while an operation is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Absent,
    Creating,
    Present,
    Updating,
    Deleting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    Import,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Read => write!(f, "read"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
            Operation::Import => write!(f, "import"),
        }
    }
}

impl Operation {
    /// Check that `self` may start from `current` and return the state the
    /// resource is in while the operation runs.
    ///
    /// Absent resources can only be created or imported; reading an absent
    /// resource is allowed and reports it missing.
    pub fn begin(self, current: Lifecycle) -> Result<Lifecycle> {
        match (self, current) {
            (Operation::Create, Lifecycle::Absent) => Ok(Lifecycle::Creating),
            (Operation::Import, Lifecycle::Absent) => Ok(Lifecycle::Absent),
            (Operation::Read, Lifecycle::Absent | Lifecycle::Present) => Ok(current),
            (Operation::Update, Lifecycle::Present) => Ok(Lifecycle::Updating),
            (Operation::Delete, Lifecycle::Present) => Ok(Lifecycle::Deleting),
            (op, state) => Err(Error::InvalidTransition(format!(
                "cannot {} a resource in state {:?}",
                op, state
            ))),
        }
    }

    /// The state a resource must be in once the operation has finished.
    /// Failures leave the resource where it started. Reads have no fixed
    /// outcome since drift can remove the resource.
    pub fn settles_to(self, succeeded: bool) -> Option<Lifecycle> {
        match (self, succeeded) {
            (Operation::Read, _) => None,
            (Operation::Create | Operation::Import, true) => Some(Lifecycle::Present),
            (Operation::Create | Operation::Import, false) => Some(Lifecycle::Absent),
            (Operation::Update, _) => Some(Lifecycle::Present),
            (Operation::Delete, true) => Some(Lifecycle::Absent),
            (Operation::Delete, false) => Some(Lifecycle::Present),
        }
    }
}
