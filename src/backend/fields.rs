//! Typed access to request fields.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::error::BackendError;

/// Declared type of a request field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// A single string.
    String,
    /// A comma-separated string, or a list of strings.
    CommaStringSlice,
}

impl FieldType {
    /// Name shown in help output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::CommaStringSlice => "comma string slice",
        }
    }
}

/// Schema entry for one field.
#[derive(Debug, Clone)]
pub struct FieldSchema {
    /// Field type.
    pub field_type: FieldType,
    /// Human-readable description.
    pub description: &'static str,
}

impl FieldSchema {
    /// Create a schema entry.
    pub const fn new(field_type: FieldType, description: &'static str) -> Self {
        Self {
            field_type,
            description,
        }
    }
}

/// Request fields checked against a path's schema.
#[derive(Debug)]
pub struct FieldData<'a> {
    raw: Map<String, Value>,
    schema: &'a BTreeMap<&'static str, FieldSchema>,
}

impl<'a> FieldData<'a> {
    /// Build field data, rejecting fields the schema does not declare.
    pub fn new(
        raw: Map<String, Value>,
        schema: &'a BTreeMap<&'static str, FieldSchema>,
    ) -> Result<Self, BackendError> {
        if let Some(unknown) = raw.keys().find(|k| !schema.contains_key(k.as_str())) {
            return Err(BackendError::Validation(format!("unknown field {:?}", unknown)));
        }
        Ok(Self { raw, schema })
    }

    fn declared(&self, name: &str, expected: FieldType) -> Result<(), BackendError> {
        match self.schema.get(name) {
            Some(field) if field.field_type == expected => Ok(()),
            Some(field) => Err(BackendError::Validation(format!(
                "field {:?} is declared as {:?}, not {:?}",
                name, field.field_type, expected
            ))),
            None => Err(BackendError::Validation(format!("field {:?} is not declared", name))),
        }
    }

    /// A string field, `None` if absent.
    pub fn get_string(&self, name: &str) -> Result<Option<String>, BackendError> {
        self.declared(name, FieldType::String)?;
        match self.raw.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(Value::Bool(b)) => Ok(Some(b.to_string())),
            Some(other) => Err(BackendError::Validation(format!(
                "field {:?} must be a string, got {}",
                name, other
            ))),
        }
    }

    /// A required, non-empty string field.
    pub fn require_string(&self, name: &str) -> Result<String, BackendError> {
        match self.get_string(name)? {
            Some(s) if !s.is_empty() => Ok(s),
            _ => Err(BackendError::Validation(format!("missing required field {:?}", name))),
        }
    }

    /// A comma string slice field; absent yields an empty list.
    ///
    /// Strings are split on `,`. List items are taken as-is.
    pub fn get_comma_string_slice(&self, name: &str) -> Result<Vec<String>, BackendError> {
        self.declared(name, FieldType::CommaStringSlice)?;
        match self.raw.get(name) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::String(s)) if s.is_empty() => Ok(Vec::new()),
            Some(Value::String(s)) => Ok(s.split(',').map(str::to_string).collect()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    other => Err(BackendError::Validation(format!(
                        "field {:?} must contain only strings, got {}",
                        name, other
                    ))),
                })
                .collect(),
            Some(other) => Err(BackendError::Validation(format!(
                "field {:?} must be a string or list of strings, got {}",
                name, other
            ))),
        }
    }
}
