//! Nested templates: key extraction and value population.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap};

/// A node in a [`Tree`]: either a leaf value or a nested tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Node<L> {
    /// A leaf value.
    Leaf(L),
    /// A nested mapping.
    Branch(Tree<L>),
}

/// An ordered, possibly nested mapping from names to leaves.
///
/// The same shape serves as the request template (leaves are parameter keys)
/// and as the populated result (leaves are resolved values).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Tree<L> {
    nodes: BTreeMap<String, Node<L>>,
}

/// A request template whose leaves are parameter keys.
pub type Template = Tree<String>;

/// A populated template whose leaves are resolved values.
pub type ConfigTree = Tree<String>;

impl<L> Tree<L> {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
        }
    }

    /// Add a leaf under `name`, replacing any existing node.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use paramstore_config::core::Template;
    ///
    /// let template = Template::new()
    ///     .with_leaf("host", "mysql/host".to_string())
    ///     .with_branch("replica", Template::new().with_leaf("host", "mysql/replica".to_string()));
    ///
    /// assert_eq!(template.leaves().count(), 2);
    /// ```
    pub fn with_leaf(mut self, name: impl Into<String>, leaf: L) -> Self {
        self.nodes.insert(name.into(), Node::Leaf(leaf));
        self
    }

    /// Add a nested tree under `name`, replacing any existing node.
    pub fn with_branch(mut self, name: impl Into<String>, branch: Tree<L>) -> Self {
        self.nodes.insert(name.into(), Node::Branch(branch));
        self
    }

    /// Look up a direct child node.
    pub fn get(&self, name: &str) -> Option<&Node<L>> {
        self.nodes.get(name)
    }

    /// Follow a path of names down the tree and return the leaf at the end.
    pub fn leaf_at(&self, path: &[&str]) -> Option<&L> {
        let (last, parents) = path.split_last()?;
        let mut tree = self;
        for name in parents {
            match tree.nodes.get(*name)? {
                Node::Branch(branch) => tree = branch,
                Node::Leaf(_) => return None,
            }
        }
        match tree.nodes.get(*last)? {
            Node::Leaf(leaf) => Some(leaf),
            Node::Branch(_) => None,
        }
    }

    /// Number of direct children.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no children.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate every leaf depth-first, in name order.
    pub fn leaves(&self) -> Leaves<'_, L> {
        Leaves {
            stack: vec![self.nodes.values()],
        }
    }

    /// Rebuild the tree with every leaf passed through `f`.
    ///
    /// Leaves for which `f` returns `None` are dropped. Branches are always
    /// rebuilt, even when every leaf beneath them is dropped.
    pub fn filter_map_leaves<M, F>(&self, f: &mut F) -> Tree<M>
    where
        F: FnMut(&L) -> Option<M>,
    {
        let mut nodes = BTreeMap::new();
        for (name, node) in &self.nodes {
            match node {
                Node::Leaf(leaf) => {
                    if let Some(mapped) = f(leaf) {
                        nodes.insert(name.clone(), Node::Leaf(mapped));
                    }
                }
                Node::Branch(branch) => {
                    nodes.insert(name.clone(), Node::Branch(branch.filter_map_leaves(f)));
                }
            }
        }
        Tree { nodes }
    }
}

impl<L> Default for Tree<L> {
    fn default() -> Self {
        Self::new()
    }
}

/// Depth-first iterator over the leaves of a [`Tree`].
pub struct Leaves<'a, L> {
    stack: Vec<std::collections::btree_map::Values<'a, String, Node<L>>>,
}

impl<'a, L> Iterator for Leaves<'a, L> {
    type Item = &'a L;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let iter = self.stack.last_mut()?;
            match iter.next() {
                Some(Node::Leaf(leaf)) => return Some(leaf),
                Some(Node::Branch(branch)) => self.stack.push(branch.nodes.values()),
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

impl Template {
    /// Build a template from a JSON object.
    ///
    /// String values become keys and objects become nested templates. Any other
    /// value (numbers, booleans, arrays, null) is dropped: it is never resolved
    /// and never appears in the output.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` if `value` is not a JSON object.
    pub fn from_json(value: JsonValue) -> Result<Self> {
        match value {
            JsonValue::Object(map) => Ok(Self::from_json_map(map)),
            other => Err(ConfigError::InvalidRequest(format!(
                "template must be an object, got {}",
                json_kind(&other)
            ))),
        }
    }

    fn from_json_map(map: serde_json::Map<String, JsonValue>) -> Self {
        let mut nodes = BTreeMap::new();
        for (name, value) in map {
            match value {
                JsonValue::String(key) => {
                    nodes.insert(name, Node::Leaf(key));
                }
                JsonValue::Object(inner) => {
                    nodes.insert(name, Node::Branch(Self::from_json_map(inner)));
                }
                _ => {}
            }
        }
        Tree { nodes }
    }

    /// Collect every key in the template, depth-first.
    pub fn keys(&self) -> Vec<String> {
        self.leaves().cloned().collect()
    }

    /// Replace every key with its value from `values`.
    ///
    /// Keys with no entry in `values` are left out of the result.
    pub fn populate(&self, values: &HashMap<String, String>) -> ConfigTree {
        self.filter_map_leaves(&mut |key| values.get(key).cloned())
    }
}

impl<L: Serialize> Tree<L> {
    /// Convert the tree into a JSON object.
    pub fn to_json(&self) -> JsonValue {
        serde_json::to_value(self).unwrap_or(JsonValue::Null)
    }
}

impl<'de> Deserialize<'de> for Tree<String> {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = JsonValue::deserialize(deserializer)?;
        Self::from_json(value).map_err(serde::de::Error::custom)
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn sample() -> Template {
        Template::from_json(json!({
            "mysql": {
                "host": "mysql/host",
                "credentials": { "user": "mysql/user", "password": "mysql/password" },
                "port": 3306
            },
            "redis": "redis/url",
            "debug": true
        }))
        .unwrap()
    }

    #[test]
    fn test_from_json_drops_scalars() {
        let template = sample();
        assert!(template.get("debug").is_none());
        assert!(template.leaf_at(&["mysql", "port"]).is_none());
        assert_eq!(template.leaf_at(&["mysql", "host"]).unwrap(), "mysql/host");
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        let err = Template::from_json(json!(["a", "b"])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRequest(_)));
    }

    #[test]
    fn test_keys_depth_first() {
        assert_eq!(
            sample().keys(),
            vec!["mysql/password", "mysql/user", "mysql/host", "redis/url"]
        );
    }

    #[test]
    fn test_populate() {
        let template = Template::from_json(json!({ "mysql": { "host": "path/to/ssm" } })).unwrap();
        let values = HashMap::from([("path/to/ssm".to_string(), "blah".to_string())]);

        let populated = template.populate(&values);
        assert_eq!(populated.to_json(), json!({ "mysql": { "host": "blah" } }));
    }

    #[test]
    fn test_populate_omits_ignored_leaves() {
        let values: HashMap<String, String> = sample()
            .keys()
            .into_iter()
            .map(|k| (k.clone(), k.to_uppercase()))
            .collect();

        let populated = sample().populate(&values);
        assert_eq!(
            populated.to_json(),
            json!({
                "mysql": {
                    "host": "MYSQL/HOST",
                    "credentials": { "user": "MYSQL/USER", "password": "MYSQL/PASSWORD" }
                },
                "redis": "REDIS/URL"
            })
        );
    }

    #[test]
    fn test_deserialize_template() {
        let template: Template =
            serde_json::from_str(r#"{"db": {"url": "db/url", "pool": 5}}"#).unwrap();
        assert_eq!(template.keys(), vec!["db/url"]);
    }

    fn arb_template() -> impl Strategy<Value = Template> {
        let leaf = "[a-z]{1,6}".prop_map(|key| JsonValue::String(key));
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop::collection::btree_map("[a-z]{1,4}", inner, 1..4)
                .prop_map(|map| JsonValue::Object(map.into_iter().collect()))
        })
        .prop_map(|value| match value {
            JsonValue::Object(_) => Template::from_json(value).unwrap(),
            leaf => Template::from_json(json!({ "root": leaf })).unwrap(),
        })
    }

    proptest! {
        #[test]
        fn prop_populate_preserves_shape(template in arb_template()) {
            let values: HashMap<String, String> = template
                .keys()
                .into_iter()
                .map(|k| (k.clone(), format!("value-of-{k}")))
                .collect();

            let populated = template.populate(&values);
            let expected = template.filter_map_leaves(&mut |key| Some(format!("value-of-{key}")));
            prop_assert_eq!(populated.leaves().count(), template.leaves().count());
            prop_assert_eq!(populated, expected);
        }
    }
}
