//! Path definitions: patterns, fields, operations and help text.

use std::collections::BTreeMap;

use regex_lite::Regex;
use serde_json::{Map, Value};

use super::error::BackendError;
use super::fields::{FieldSchema, FieldType};
use super::request::Operation;

/// Path prefix (relative to the mount point) for user endpoints.
pub const USER_PATH_PREFIX: &str = "users";

const USER_HELP_SYNOPSIS: &str = "Manage users allowed to authenticate.";

const USER_HELP_DESCRIPTION: &str = "\
This endpoint allows you to create, read, update, and delete configuration
for users that are allowed to authenticate, and associate policies to
them.";

/// Handler bound to an operation on a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathHandler {
    /// List all users.
    ListUsers,
    /// Read one user.
    ReadUser,
    /// Create or replace one user.
    WriteUser,
    /// Delete one user.
    DeleteUser,
}

/// A routable path.
#[derive(Debug)]
pub struct PathDef {
    pattern: &'static str,
    regex: Regex,
    fields: BTreeMap<&'static str, FieldSchema>,
    operations: BTreeMap<Operation, PathHandler>,
    help_synopsis: &'static str,
    help_description: &'static str,
}

impl PathDef {
    /// Compile a path. The pattern is anchored at both ends.
    pub fn new(pattern: &'static str) -> Result<Self, BackendError> {
        let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(|source| {
            BackendError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            }
        })?;

        Ok(Self {
            pattern,
            regex,
            fields: BTreeMap::new(),
            operations: BTreeMap::new(),
            help_synopsis: "",
            help_description: "",
        })
    }

    /// Declare a field.
    pub fn field(mut self, name: &'static str, schema: FieldSchema) -> Self {
        self.fields.insert(name, schema);
        self
    }

    /// Bind a handler to an operation.
    pub fn operation(mut self, operation: Operation, handler: PathHandler) -> Self {
        self.operations.insert(operation, handler);
        self
    }

    /// Set help text.
    pub fn help(mut self, synopsis: &'static str, description: &'static str) -> Self {
        self.help_synopsis = synopsis;
        self.help_description = description;
        self
    }

    /// The pattern source.
    pub fn pattern(&self) -> &'static str {
        self.pattern
    }

    /// Declared fields.
    pub fn fields(&self) -> &BTreeMap<&'static str, FieldSchema> {
        &self.fields
    }

    /// Handler for an operation, if registered.
    pub fn handler(&self, operation: Operation) -> Option<PathHandler> {
        self.operations.get(&operation).copied()
    }

    /// Registered operations, in order.
    pub fn operations(&self) -> impl Iterator<Item = Operation> + '_ {
        self.operations.keys().copied()
    }

    /// Combined help text, followed by one block per declared field.
    pub fn help_text(&self) -> String {
        let mut text = format!("{}\n\n{}", self.help_synopsis, self.help_description);
        if !self.fields.is_empty() {
            text.push_str("\n\n## PARAMETERS\n");
            for (name, schema) in &self.fields {
                text.push_str(&format!(
                    "\n{} ({})\n    {}\n",
                    name,
                    schema.field_type.as_str(),
                    schema.description
                ));
            }
        }
        text
    }

    /// Match a path, returning named captures as field values.
    pub fn matches(&self, path: &str) -> Option<Map<String, Value>> {
        let caps = self.regex.captures(path)?;
        let mut captured = Map::new();
        for name in self.regex.capture_names().flatten() {
            if let Some(m) = caps.name(name) {
                captured.insert(name.to_string(), Value::String(m.as_str().to_string()));
            }
        }
        Some(captured)
    }
}

/// `users/`: list users.
pub fn users_list_path() -> Result<PathDef, BackendError> {
    Ok(PathDef::new("users/?$")?
        .operation(Operation::List, PathHandler::ListUsers)
        .help(USER_HELP_SYNOPSIS, USER_HELP_DESCRIPTION))
}

/// `users/<name>`: read, write and delete a single user.
pub fn users_path() -> Result<PathDef, BackendError> {
    Ok(PathDef::new("users/(?P<name>.+)")?
        .field(
            "name",
            FieldSchema::new(FieldType::String, "Name of the user."),
        )
        .field(
            "policies",
            FieldSchema::new(
                FieldType::CommaStringSlice,
                "Comma-separated list of policies associated to the user.",
            ),
        )
        .operation(Operation::Read, PathHandler::ReadUser)
        .operation(Operation::Update, PathHandler::WriteUser)
        .operation(Operation::Delete, PathHandler::DeleteUser)
        .help(USER_HELP_SYNOPSIS, USER_HELP_DESCRIPTION))
}
