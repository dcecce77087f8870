//! Directive trees and `choice` envelope resolution.
//!
//! Every leaf in an experiment description is wrapped as `{ choice: <value> }`.
//! [`DirectiveNode`] is the only place that knows about that wrapper: callers
//! walk sections by name and ask for unwrapped leaf values, getting an
//! explicit error that names the full dotted path when something is absent.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::errors::{RfError, RfResult};

/// Reserved key marking a resolved leaf value.
pub const CHOICE_KEY: &str = "choice";

/// An owned directive tree, usually loaded from a YAML file.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveTree {
    root: Value,
    /// Dotted path of `root` within the document it was taken from.
    origin: String,
}

impl DirectiveTree {
    pub fn new(root: Value) -> Self {
        Self {
            root,
            origin: String::new(),
        }
    }

    pub fn root(&self) -> DirectiveNode<'_> {
        DirectiveNode {
            value: &self.root,
            path: self.origin.clone(),
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.root
    }

    // Convenience pass-throughs to the root node.

    pub fn section(&self, name: &str) -> RfResult<DirectiveNode<'_>> {
        self.root().section(name)
    }

    pub fn choice(&self, key: &str) -> RfResult<Value> {
        self.root().choice(key)
    }

    pub fn resolve(&self, dotted: &str) -> RfResult<Value> {
        self.root().resolve(dotted)
    }
}

impl From<Value> for DirectiveTree {
    fn from(root: Value) -> Self {
        Self::new(root)
    }
}

/// Borrowed cursor into a [`DirectiveTree`] that remembers where it is.
#[derive(Debug, Clone)]
pub struct DirectiveNode<'a> {
    value: &'a Value,
    path: String,
}

impl<'a> DirectiveNode<'a> {
    /// Dotted path of this node from the tree root (empty for the root).
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn as_value(&self) -> &'a Value {
        self.value
    }

    /// Named child mapping of this node.
    pub fn section(&self, name: &str) -> RfResult<DirectiveNode<'a>> {
        let path = self.child_path(name);
        match self.value.get(name) {
            Some(child) if child.is_object() => Ok(DirectiveNode { value: child, path }),
            _ => Err(RfError::MissingSection { section: path }),
        }
    }

    /// Unwrapped value of the envelope stored under `key`.
    pub fn choice(&self, key: &str) -> RfResult<Value> {
        let path = self.child_path(key);
        let leaf = self
            .value
            .get(key)
            .ok_or_else(|| RfError::MissingSection { section: path.clone() })?;
        unwrap_envelope(leaf, &path).cloned()
    }

    /// Unwrapped value under `key`, deserialized into `T`.
    pub fn choice_as<T: DeserializeOwned>(&self, key: &str) -> RfResult<T> {
        let value = self.choice(key)?;
        serde_json::from_value(value).map_err(|e| RfError::InvalidValue {
            path: self.child_path(key),
            message: e.to_string(),
        })
    }

    /// Walk a dotted path: every segment but the last is a section, the last
    /// is an envelope.
    pub fn resolve(&self, dotted: &str) -> RfResult<Value> {
        let mut segments: Vec<&str> = dotted.split('.').collect();
        let leaf = segments.pop().unwrap_or_default();

        let mut node = self.clone();
        for segment in segments {
            node = node.section(segment)?;
        }
        node.choice(leaf)
    }

    /// Plain (non-enveloped) string value under `key`.
    pub fn plain_str(&self, key: &str) -> RfResult<&'a str> {
        let path = self.child_path(key);
        match self.value.get(key) {
            Some(Value::String(s)) => Ok(s.as_str()),
            Some(other) => Err(RfError::InvalidValue {
                path,
                message: format!("expected a string, found {other}"),
            }),
            None => Err(RfError::MissingSection { section: path }),
        }
    }

    /// Keys of this node when it is a mapping, sorted.
    pub fn keys(&self) -> Vec<&'a str> {
        match self.value {
            Value::Object(map) => map.keys().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// Copy this subtree out into an owned tree that keeps its origin path.
    pub fn to_tree(&self) -> DirectiveTree {
        DirectiveTree {
            root: self.value.clone(),
            origin: self.path.clone(),
        }
    }

    fn child_path(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.path, key)
        }
    }
}

/// Strip the `choice` envelope off a leaf.
///
/// The envelope may later carry a search distribution; for now the literal
/// value is returned as-is.
pub fn unwrap_envelope<'v>(leaf: &'v Value, path: &str) -> RfResult<&'v Value> {
    leaf.as_object()
        .and_then(|map: &Map<String, Value>| map.get(CHOICE_KEY))
        .ok_or_else(|| RfError::MissingChoice {
            path: path.to_string(),
        })
}
