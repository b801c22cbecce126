//! Field schemas published to the host and used to validate declared state
//! before any remote call.

use ambari_core::{Error, Result};
use serde::Serialize;
use serde_json::Value;

use crate::state::ResourceData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Int,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldSchema {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
    /// Set by the server; never sent in a request.
    pub computed: bool,
    /// Changing the field requires replacing the resource.
    pub force_new: bool,
    /// Used as a URL path segment, so `.` and `..` are rejected.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub path_segment: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allowed: Vec<&'static str>,
    pub description: &'static str,
}

impl FieldSchema {
    pub fn required(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            field_type: FieldType::String,
            required: true,
            computed: false,
            force_new: false,
            path_segment: false,
            allowed: Vec::new(),
            description,
        }
    }

    pub fn computed(name: &'static str, field_type: FieldType, description: &'static str) -> Self {
        Self {
            name,
            field_type,
            required: false,
            computed: true,
            force_new: false,
            path_segment: false,
            allowed: Vec::new(),
            description,
        }
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn path_segment(mut self) -> Self {
        self.path_segment = true;
        self
    }

    pub fn one_of(mut self, allowed: impl IntoIterator<Item = &'static str>) -> Self {
        self.allowed = allowed.into_iter().collect();
        self
    }

    fn check(&self, value: &Value) -> Result<()> {
        match (self.field_type, value) {
            (FieldType::String, Value::String(s)) => {
                if self.path_segment && matches!(s.as_str(), "." | "..") {
                    return Err(Error::Validation(format!(
                        "{} `{}` is not a usable name",
                        self.name, s
                    )));
                }
                if !self.allowed.is_empty() && !self.allowed.contains(&s.as_str()) {
                    return Err(Error::Validation(format!(
                        "{} `{}` must be one of {}",
                        self.name,
                        s,
                        self.allowed.join(", ")
                    )));
                }
                Ok(())
            }
            (FieldType::Int, Value::Number(n)) if n.is_i64() => Ok(()),
            (_, Value::Null) if self.computed => Ok(()),
            (expected, other) => Err(Error::Validation(format!(
                "{} must be of type {:?}, got {}",
                self.name, expected, other
            ))),
        }
    }
}

/// Schema of one resource kind.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceSchema {
    pub kind: &'static str,
    pub fields: Vec<FieldSchema>,
}

impl ResourceSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Reject unknown attributes, missing required ones, wrong types and
    /// values outside enumerated sets.
    pub fn validate(&self, data: &ResourceData) -> Result<()> {
        for (key, value) in data.attributes() {
            let field = self.field(key).ok_or_else(|| {
                Error::Validation(format!("{} has no attribute `{}`", self.kind, key))
            })?;
            field.check(value)?;
        }

        for field in self.fields.iter().filter(|f| f.required) {
            data.require_str(field.name)?;
        }
        Ok(())
    }
}
