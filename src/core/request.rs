//! Request shapes accepted by the resolver and the results it hands back.

use crate::core::template::{ConfigTree, Template};
use crate::error::{ConfigError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// Flat mapping from parameter key to resolved value.
pub type FlatValues = HashMap<String, String>;

/// A configuration request.
///
/// ```text
/// String    resolver.get("host")                      {host: value}
/// List      resolver.get(["host", "username"])        {host: value, username: value}
/// Template  resolver.get(template)                    {db: {host: value}}
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigRequest {
    /// A single parameter key.
    Key(String),
    /// An ordered list of parameter keys.
    Keys(Vec<String>),
    /// A nested template whose leaves are parameter keys.
    Template(Template),
}

/// A request reduced to the keys to fetch plus the template to rebuild.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRequest {
    /// Keys to resolve, duplicates removed, in request order.
    pub keys: Vec<String>,
    /// The template to populate once values are known.
    pub template: Option<Template>,
}

impl ConfigRequest {
    /// Normalize the request into a working key list.
    ///
    /// The key list is always a fresh copy; the caller's data is never touched.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` when no keys remain after normalization.
    pub fn normalize(&self) -> Result<NormalizedRequest> {
        let (keys, template) = match self {
            Self::Key(key) => (vec![key.clone()], None),
            Self::Keys(keys) => (keys.clone(), None),
            Self::Template(template) => (template.keys(), Some(template.clone())),
        };

        if keys.is_empty() {
            return Err(ConfigError::InvalidRequest(
                "params must not be empty".to_string(),
            ));
        }

        Ok(NormalizedRequest {
            keys: dedup_in_order(keys),
            template,
        })
    }

    /// Borrow the template if this is a template request.
    pub fn as_template(&self) -> Option<&Template> {
        match self {
            Self::Template(template) => Some(template),
            _ => None,
        }
    }
}

fn dedup_in_order(keys: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::with_capacity(keys.len());
    keys.into_iter().filter(|k| seen.insert(k.clone())).collect()
}

impl From<&str> for ConfigRequest {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for ConfigRequest {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<&String> for ConfigRequest {
    fn from(key: &String) -> Self {
        Self::Key(key.clone())
    }
}

impl<S: AsRef<str>> From<Vec<S>> for ConfigRequest {
    fn from(keys: Vec<S>) -> Self {
        Self::Keys(keys.iter().map(|k| k.as_ref().to_string()).collect())
    }
}

impl<S: AsRef<str>> From<&Vec<S>> for ConfigRequest {
    fn from(keys: &Vec<S>) -> Self {
        Self::from(keys.as_slice())
    }
}

impl<S: AsRef<str>> From<&[S]> for ConfigRequest {
    fn from(keys: &[S]) -> Self {
        Self::Keys(keys.iter().map(|k| k.as_ref().to_string()).collect())
    }
}

impl<S: AsRef<str>, const N: usize> From<[S; N]> for ConfigRequest {
    fn from(keys: [S; N]) -> Self {
        Self::Keys(keys.iter().map(|k| k.as_ref().to_string()).collect())
    }
}

impl From<Template> for ConfigRequest {
    fn from(template: Template) -> Self {
        Self::Template(template)
    }
}

impl From<&Template> for ConfigRequest {
    fn from(template: &Template) -> Self {
        Self::Template(template.clone())
    }
}

impl TryFrom<JsonValue> for ConfigRequest {
    type Error = ConfigError;

    /// Strings become keys, arrays of strings become key lists, objects become templates.
    fn try_from(value: JsonValue) -> Result<Self> {
        match value {
            JsonValue::String(key) => Ok(Self::Key(key)),
            JsonValue::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    JsonValue::String(key) => Ok(key),
                    other => Err(ConfigError::InvalidRequest(format!(
                        "key list entries must be strings, got {other}"
                    ))),
                })
                .collect::<Result<Vec<_>>>()
                .map(Self::Keys),
            object @ JsonValue::Object(_) => Template::from_json(object).map(Self::Template),
            other => Err(ConfigError::InvalidRequest(format!(
                "unsupported request shape: {other}"
            ))),
        }
    }
}

/// The outcome of a resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    /// Flat key/value map, for key and key-list requests.
    Values(FlatValues),
    /// Populated template, for template requests.
    Tree(ConfigTree),
    /// Whole document served by the local development server.
    Document(JsonValue),
}

impl Resolved {
    /// Borrow the flat values, if this is a flat result.
    pub fn as_values(&self) -> Option<&FlatValues> {
        match self {
            Self::Values(values) => Some(values),
            _ => None,
        }
    }

    /// Borrow the populated tree, if this is a template result.
    pub fn as_tree(&self) -> Option<&ConfigTree> {
        match self {
            Self::Tree(tree) => Some(tree),
            _ => None,
        }
    }

    /// Consume the result and return the flat values, if any.
    pub fn into_values(self) -> Option<FlatValues> {
        match self {
            Self::Values(values) => Some(values),
            _ => None,
        }
    }

    /// Render the result as JSON.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Values(values) => values
                .iter()
                .map(|(k, v)| (k.clone(), JsonValue::String(v.clone())))
                .collect::<serde_json::Map<_, _>>()
                .into(),
            Self::Tree(tree) => tree.to_json(),
            Self::Document(document) => document.clone(),
        }
    }

    /// Deserialize the result into a typed configuration struct.
    ///
    /// # Errors
    ///
    /// Returns `DeserializationError` if the shape does not match `T`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use paramstore_config::core::Resolved;
    /// use serde::Deserialize;
    /// use std::collections::HashMap;
    ///
    /// #[derive(Deserialize)]
    /// struct Db {
    ///     host: String,
    /// }
    ///
    /// let resolved = Resolved::Values(HashMap::from([("host".to_string(), "db.local".to_string())]));
    /// let db: Db = resolved.deserialize().unwrap();
    /// assert_eq!(db.host, "db.local");
    /// ```
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.to_json())
            .map_err(|e| ConfigError::DeserializationError(e.to_string()))
    }
}
