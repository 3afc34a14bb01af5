//! Attribute map handed to resource handlers.
//!
//! Attributes are kept as a JSON tree shaped like the resource schema: nested
//! blocks are lists of objects, so the peer AS number lives at
//! `spec.0.as_number`. Paths use the same dotted form for reads and writes,
//! with numeric segments indexing into lists.

use crate::error::ProviderError;
use serde_json::{Map, Value};

/// Identifier plus attributes of one resource instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceData {
    id: String,
    attributes: Value,
}

impl Default for ResourceData {
    fn default() -> Self {
        Self::new(Value::Object(Map::new()))
    }
}

impl ResourceData {
    /// Data for a resource that does not exist remotely yet
    pub fn new(attributes: Value) -> Self {
        Self {
            id: String::new(),
            attributes,
        }
    }

    /// Data for a known resource instance
    pub fn with_id(id: impl Into<String>, attributes: Value) -> Self {
        Self {
            id: id.into(),
            attributes,
        }
    }

    /// Identifier of the remote object, empty when absent
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Record that the remote object no longer exists
    pub fn clear_id(&mut self) {
        self.id.clear();
    }

    /// True once a read found the remote object missing
    pub fn is_gone(&self) -> bool {
        self.id.is_empty()
    }

    pub fn attributes(&self) -> &Value {
        &self.attributes
    }

    pub fn into_parts(self) -> (String, Value) {
        (self.id, self.attributes)
    }

    /// Raw value at `path`, if present and not null
    pub fn get(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(&self.attributes, |node, segment| match node {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            })
            .filter(|value| !value.is_null())
    }

    /// String at `path`, or the empty string
    pub fn get_string(&self, path: &str) -> String {
        match self.get(path) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        }
    }

    /// Non-empty string at `path`
    pub fn get_opt_string(&self, path: &str) -> Option<String> {
        Some(self.get_string(path)).filter(|s| !s.is_empty())
    }

    /// Bool at `path`, or false
    pub fn get_bool(&self, path: &str) -> bool {
        match self.get(path) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s == "true",
            _ => false,
        }
    }

    /// Integer at `path`; `None` when absent.
    ///
    /// Integers given as strings are accepted, anything else is an error.
    pub fn get_int(&self, path: &str) -> Result<Option<i64>, ProviderError> {
        match self.get(path) {
            None => Ok(None),
            Some(Value::Number(n)) => n.as_i64().map(Some).ok_or_else(|| {
                ProviderError::InvalidAttribute {
                    path: path.to_string(),
                    reason: format!("{} is not an integer", n),
                }
            }),
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(Value::String(s)) => s.parse().map(Some).map_err(|_| ProviderError::InvalidAttribute {
                path: path.to_string(),
                reason: format!("'{}' is not an integer", s),
            }),
            Some(other) => Err(ProviderError::InvalidAttribute {
                path: path.to_string(),
                reason: format!("expected an integer, got {}", other),
            }),
        }
    }

    /// Set the value at `path`, creating intermediate blocks and list slots.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> Result<(), ProviderError> {
        let mut node = &mut self.attributes;

        for segment in path.split('.') {
            if segment.is_empty() {
                return Err(ProviderError::InvalidPath(path.to_string()));
            }

            node = match segment.parse::<usize>() {
                Ok(index) => {
                    if node.is_null() {
                        *node = Value::Array(Vec::new());
                    }
                    let items = node
                        .as_array_mut()
                        .ok_or_else(|| ProviderError::InvalidPath(path.to_string()))?;
                    if items.len() <= index {
                        items.resize(index + 1, Value::Object(Map::new()));
                    }
                    &mut items[index]
                }
                Err(_) => {
                    if node.is_null() {
                        *node = Value::Object(Map::new());
                    }
                    node.as_object_mut()
                        .ok_or_else(|| ProviderError::InvalidPath(path.to_string()))?
                        .entry(segment)
                        .or_insert(Value::Null)
                }
            };
        }

        *node = value.into();
        Ok(())
    }

    /// Set `path` to the string, or remove it when `None`
    pub fn set_opt_string(&mut self, path: &str, value: Option<&str>) -> Result<(), ProviderError> {
        match value {
            Some(v) => self.set(path, v),
            None => self.remove(path),
        }
    }

    /// Remove the value at `path`; missing paths are not an error
    pub fn remove(&mut self, path: &str) -> Result<(), ProviderError> {
        let (parent, leaf) = match path.rsplit_once('.') {
            Some((parent, leaf)) => (Some(parent), leaf),
            None => (None, path),
        };

        let container = match parent {
            Some(parent_path) => match self.get_mut(parent_path) {
                Some(container) => container,
                None => return Ok(()),
            },
            None => &mut self.attributes,
        };

        match container {
            Value::Object(map) => {
                map.remove(leaf);
                Ok(())
            }
            Value::Array(items) => {
                let index = leaf
                    .parse::<usize>()
                    .map_err(|_| ProviderError::InvalidPath(path.to_string()))?;
                if index < items.len() {
                    items.remove(index);
                }
                Ok(())
            }
            _ => Err(ProviderError::InvalidPath(path.to_string())),
        }
    }

    fn get_mut(&mut self, path: &str) -> Option<&mut Value> {
        path.split('.').try_fold(&mut self.attributes, |node, segment| match node {
            Value::Object(map) => map.get_mut(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get_mut(i)),
            _ => None,
        })
    }
}
