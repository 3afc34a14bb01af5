//! Resource schema layer.
//!
//! A [`Resource`] couples the attribute schema of one resource type with the
//! handler that performs its remote operations. The schema is used to
//! normalize and validate configuration before a handler sees it, and to diff
//! prior state against new configuration when planning.

use crate::error::ProviderError;
use crate::resource_data::ResourceData;
use calico_client::{CalicoClientTrait, CalicoError};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Per-attribute validation hook; the error string is shown to the user.
pub type ValidateFn = fn(&Value) -> Result<(), String>;

/// Attribute schemas of a block, keyed by attribute name
pub type SchemaMap = BTreeMap<&'static str, Schema>;

/// Type of an attribute value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Int,
    Bool,
    /// List of nested blocks
    List,
}

/// Schema of a single attribute.
#[derive(Debug, Clone)]
pub struct Schema {
    pub value_type: ValueType,
    pub required: bool,
    pub force_new: bool,
    /// Value the server stores when the attribute is unset
    pub default: Option<Value>,
    pub max_items: Option<usize>,
    /// Attributes of the nested block, for [`ValueType::List`]
    pub elem: Option<SchemaMap>,
    pub validate: Option<ValidateFn>,
}

impl Schema {
    fn of(value_type: ValueType) -> Self {
        Self {
            value_type,
            required: false,
            force_new: false,
            default: None,
            max_items: None,
            elem: None,
            validate: None,
        }
    }

    pub fn string() -> Self {
        Self::of(ValueType::String)
    }

    pub fn int() -> Self {
        Self::of(ValueType::Int)
    }

    pub fn bool() -> Self {
        Self::of(ValueType::Bool)
    }

    /// A list of nested blocks with the given attributes
    pub fn block(elem: SchemaMap) -> Self {
        Self {
            elem: Some(elem),
            ..Self::of(ValueType::List)
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Changing this attribute destroys and recreates the remote object
    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn max_items(mut self, max: usize) -> Self {
        self.max_items = Some(max);
        self
    }

    pub fn validate(mut self, f: ValidateFn) -> Self {
        self.validate = Some(f);
        self
    }

    /// Value an unset attribute compares equal to
    fn zero(&self) -> Value {
        if let Some(default) = &self.default {
            return default.clone();
        }
        match self.value_type {
            ValueType::String => Value::String(String::new()),
            ValueType::Int => Value::from(0),
            ValueType::Bool => Value::Bool(false),
            ValueType::List => Value::Array(Vec::new()),
        }
    }

    /// Scalar in canonical form for comparison
    fn canonical(&self, value: Option<&Value>) -> Value {
        match (self.value_type, value) {
            (_, None | Some(Value::Null)) => self.zero(),
            (ValueType::Int, Some(Value::String(s))) => s
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::String(s.clone())),
            (ValueType::Bool, Some(Value::String(s))) if s == "true" || s == "false" => {
                Value::Bool(s == "true")
            }
            (_, Some(v)) => v.clone(),
        }
    }
}

/// How existing remote objects are adopted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Importer {
    /// The import id is the object name; a read fills in everything else
    Passthrough,
}

/// Remote operations of one resource type.
///
/// Handlers receive the attribute map and the client handle; they hold no
/// state of their own.
#[async_trait::async_trait]
pub trait ResourceHandler: Send + Sync {
    async fn create(&self, d: &mut ResourceData, client: &dyn CalicoClientTrait) -> Result<(), ProviderError>;
    async fn read(&self, d: &mut ResourceData, client: &dyn CalicoClientTrait) -> Result<(), ProviderError>;
    async fn update(&self, d: &mut ResourceData, client: &dyn CalicoClientTrait) -> Result<(), ProviderError>;
    async fn delete(&self, d: &mut ResourceData, client: &dyn CalicoClientTrait) -> Result<(), ProviderError>;
}

/// One attribute that differs between prior state and configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeChange {
    pub path: String,
    pub old: Value,
    pub new: Value,
    pub force_new: bool,
}

/// Attribute-level difference between two configurations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceDiff {
    pub changes: Vec<AttributeChange>,
}

impl ResourceDiff {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// True when any changed attribute forces a new object
    pub fn requires_replace(&self) -> bool {
        self.changes.iter().any(|c| c.force_new)
    }
}

/// Definition of a resource type: schema, handler and importer.
#[derive(Clone)]
pub struct Resource {
    pub type_name: &'static str,
    pub schema: SchemaMap,
    pub importer: Option<Importer>,
    handler: Arc<dyn ResourceHandler>,
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("type_name", &self.type_name)
            .field("schema", &self.schema)
            .field("importer", &self.importer)
            .finish_non_exhaustive()
    }
}

impl Resource {
    pub fn new(type_name: &'static str, schema: SchemaMap, handler: Arc<dyn ResourceHandler>) -> Self {
        Self {
            type_name,
            schema,
            importer: None,
            handler,
        }
    }

    pub fn with_importer(mut self, importer: Importer) -> Self {
        self.importer = Some(importer);
        self
    }

    pub async fn create(&self, d: &mut ResourceData, client: &dyn CalicoClientTrait) -> Result<(), ProviderError> {
        self.handler.create(d, client).await
    }

    pub async fn read(&self, d: &mut ResourceData, client: &dyn CalicoClientTrait) -> Result<(), ProviderError> {
        self.handler.read(d, client).await
    }

    pub async fn update(&self, d: &mut ResourceData, client: &dyn CalicoClientTrait) -> Result<(), ProviderError> {
        self.handler.update(d, client).await
    }

    pub async fn delete(&self, d: &mut ResourceData, client: &dyn CalicoClientTrait) -> Result<(), ProviderError> {
        self.handler.delete(d, client).await
    }

    /// Adopt an existing remote object by id.
    pub async fn import(&self, id: &str, client: &dyn CalicoClientTrait) -> Result<ResourceData, ProviderError> {
        match self.importer {
            Some(Importer::Passthrough) => {
                let mut d = ResourceData::with_id(id, Value::Object(Map::new()));
                self.read(&mut d, client).await?;
                if d.is_gone() {
                    return Err(CalicoError::ResourceDoesNotExist {
                        kind: self.type_name.to_string(),
                        name: id.to_string(),
                    }
                    .into());
                }
                Ok(d)
            }
            None => Err(ProviderError::ImportNotSupported(self.type_name.to_string())),
        }
    }

    /// Bring user configuration into schema shape.
    ///
    /// A single nested block written as a map becomes a one-element list, and
    /// integers or bools written as strings are converted.
    pub fn normalize(&self, config: Value) -> Value {
        normalize_block(&self.schema, config)
    }

    /// Check configuration against the schema, reporting every problem found.
    pub fn validate(&self, config: &Value) -> Result<(), ProviderError> {
        let mut problems = Vec::new();
        validate_block(&self.schema, "", config, &mut problems);

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ProviderError::InvalidConfig {
                resource: self.type_name.to_string(),
                problems,
            })
        }
    }

    /// Attribute changes from `prior` to `proposed`; unset and zero compare equal.
    pub fn diff(&self, prior: &Value, proposed: &Value) -> ResourceDiff {
        let mut diff = ResourceDiff::default();
        diff_block(&self.schema, "", Some(prior), Some(proposed), false, &mut diff.changes);
        diff
    }
}

fn normalize_block(schema: &SchemaMap, config: Value) -> Value {
    let Value::Object(map) = config else {
        return config;
    };

    let normalized = map
        .into_iter()
        .map(|(key, value)| {
            let value = match schema.get(key.as_str()) {
                Some(attr) => normalize_value(attr, value),
                None => value,
            };
            (key, value)
        })
        .collect();

    Value::Object(normalized)
}

fn normalize_value(attr: &Schema, value: Value) -> Value {
    match (attr.value_type, value) {
        (ValueType::List, Value::Object(map)) => normalize_value(attr, Value::Array(vec![Value::Object(map)])),
        (ValueType::List, Value::Array(items)) => match &attr.elem {
            Some(elem) => Value::Array(items.into_iter().map(|item| normalize_block(elem, item)).collect()),
            None => Value::Array(items),
        },
        (ValueType::Int, Value::String(s)) => match s.parse::<i64>() {
            Ok(n) => Value::from(n),
            Err(_) => Value::String(s),
        },
        (ValueType::Bool, Value::String(s)) if s == "true" || s == "false" => Value::Bool(s == "true"),
        (ValueType::String, Value::Number(n)) => Value::String(n.to_string()),
        (ValueType::String, Value::Bool(b)) => Value::String(b.to_string()),
        (_, other) => other,
    }
}

fn validate_block(schema: &SchemaMap, prefix: &str, config: &Value, problems: &mut Vec<String>) {
    let empty = Map::new();
    let map = match config {
        Value::Object(map) => map,
        Value::Null => &empty,
        _ => {
            problems.push(format!("{}: expected a block", prefix.trim_end_matches('.')));
            return;
        }
    };

    for key in map.keys() {
        if !schema.contains_key(key.as_str()) {
            problems.push(format!("{}{}: unsupported attribute", prefix, key));
        }
    }

    for (name, attr) in schema {
        let path = format!("{}{}", prefix, name);
        let value = map.get(*name).filter(|v| !v.is_null());

        let Some(value) = value else {
            if attr.required {
                problems.push(format!("{}: required attribute is missing", path));
            }
            continue;
        };

        let type_ok = match attr.value_type {
            ValueType::String => value.is_string(),
            ValueType::Int => value.is_i64(),
            ValueType::Bool => value.is_boolean(),
            ValueType::List => value.is_array(),
        };
        if !type_ok {
            problems.push(format!("{}: expected {:?}, got {}", path, attr.value_type, value));
            continue;
        }

        if let Value::Array(items) = value {
            if attr.required && items.is_empty() {
                problems.push(format!("{}: required block is missing", path));
            }
            if let Some(max) = attr.max_items {
                if items.len() > max {
                    problems.push(format!("{}: at most {} block(s) allowed, got {}", path, max, items.len()));
                }
            }
            if let Some(elem) = &attr.elem {
                for (index, item) in items.iter().enumerate() {
                    validate_block(elem, &format!("{}.{}.", path, index), item, problems);
                }
            }
        }

        if let Some(check) = attr.validate {
            if let Err(reason) = check(value) {
                problems.push(format!("{}: {}", path, reason));
            }
        }
    }
}

fn diff_block(
    schema: &SchemaMap,
    prefix: &str,
    prior: Option<&Value>,
    proposed: Option<&Value>,
    inherited_force_new: bool,
    changes: &mut Vec<AttributeChange>,
) {
    for (name, attr) in schema {
        let path = format!("{}{}", prefix, name);
        let old = prior.and_then(|v| v.get(*name));
        let new = proposed.and_then(|v| v.get(*name));
        let force_new = inherited_force_new || attr.force_new;

        match (&attr.elem, attr.value_type) {
            (Some(elem), ValueType::List) => {
                let old_items = old.and_then(Value::as_array).map(Vec::as_slice).unwrap_or_default();
                let new_items = new.and_then(Value::as_array).map(Vec::as_slice).unwrap_or_default();
                for index in 0..old_items.len().max(new_items.len()) {
                    diff_block(
                        elem,
                        &format!("{}.{}.", path, index),
                        old_items.get(index),
                        new_items.get(index),
                        force_new,
                        changes,
                    );
                }
            }
            _ => {
                let old = attr.canonical(old);
                let new = attr.canonical(new);
                if old != new {
                    changes.push(AttributeChange { path, old, new, force_new });
                }
            }
        }
    }
}
