//! Typed view over a decoded claim object.

use serde_json::{Map, Value};

use crate::error::{ClaimsError, Result};

/// The decoded payload of an identity token.
///
/// Only the accessors below look inside the raw object. Absent, null, or
/// wrongly-typed fields read as empty; non-string entries inside a list are
/// skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenClaims {
    raw: Map<String, Value>,
}

impl TokenClaims {
    /// Wraps a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`ClaimsError::NotAnObject`] for any other JSON value.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(raw) => Ok(Self { raw }),
            other => Err(ClaimsError::NotAnObject {
                found: json_kind(&other),
            }),
        }
    }

    /// Parses a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// `realm_access.roles`.
    pub fn realm_roles(&self) -> Vec<&str> {
        self.raw
            .get("realm_access")
            .and_then(|realm| realm.get("roles"))
            .map(string_list)
            .unwrap_or_default()
    }

    /// `resource_access.<client>.roles` for every client, in client-id order.
    pub fn client_role_lists(&self) -> Vec<Vec<&str>> {
        let Some(Value::Object(clients)) = self.raw.get("resource_access") else {
            return Vec::new();
        };

        clients
            .values()
            .filter_map(|client| client.get("roles"))
            .map(string_list)
            .collect()
    }

    /// `groups` followed by `realm_access.groups`.
    pub fn groups(&self) -> Vec<&str> {
        let top = self.raw.get("groups").map(string_list).unwrap_or_default();
        let realm = self
            .raw
            .get("realm_access")
            .and_then(|realm| realm.get("groups"))
            .map(string_list)
            .unwrap_or_default();

        top.into_iter().chain(realm).collect()
    }

    /// `sub`, falling back to `preferred_username`.
    pub fn subject(&self) -> Option<&str> {
        self.string_claim("sub")
            .or_else(|| self.string_claim("preferred_username"))
    }

    /// A top-level string claim. Blank strings read as absent.
    pub fn string_claim(&self, name: &str) -> Option<&str> {
        self.raw
            .get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// First entry of `attributes.<name>`, the shape identity providers use
    /// for multi-valued user attributes.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.raw
            .get("attributes")
            .and_then(|attrs| attrs.get(name))
            .and_then(|values| values.get(0))
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }
}

fn string_list(value: &Value) -> Vec<&str> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
