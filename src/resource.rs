//! Resource family descriptors
//!
//! A descriptor names a REST collection, its field shape, and the ids and
//! filter values the scenario probes it with.

use crate::config::{Config, ResourceOverride};
use crate::contract::shape::{FieldSpec, PrimitiveKind, Shape};
use anyhow::{bail, Result};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Equality filter known to match at least one item
#[derive(Debug, Clone, Serialize)]
pub struct FilterProbe {
    pub field: String,
    pub value: Value,
}

impl FilterProbe {
    /// Query-string form of the value (strings unquoted)
    pub fn query_value(&self) -> String {
        match &self.value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceDescriptor {
    pub name: String,
    pub collection_path: String,
    pub id_field: String,
    pub shape: Shape,
    /// Whether the backend rejects malformed payloads for this resource
    pub supports_input_validation: bool,
    pub existing_id: u64,
    pub missing_id: u64,
    pub filter: FilterProbe,
    /// Exact values the existing item must carry
    pub existing_expectations: Map<String, Value>,
}

impl ResourceDescriptor {
    pub fn comments() -> Self {
        Self {
            name: "comments".to_string(),
            collection_path: "/comments".to_string(),
            id_field: "id".to_string(),
            shape: Shape::new(vec![
                FieldSpec::required("postId", PrimitiveKind::Number),
                FieldSpec::required("id", PrimitiveKind::Number),
                FieldSpec::required("name", PrimitiveKind::String),
                FieldSpec::required("email", PrimitiveKind::String),
                FieldSpec::required("body", PrimitiveKind::String),
            ]),
            supports_input_validation: false,
            existing_id: 1,
            missing_id: 999999,
            filter: FilterProbe {
                field: "email".to_string(),
                value: json!("Eliseo@gardner.biz"),
            },
            existing_expectations: object(json!({ "postId": 1 })),
        }
    }

    pub fn todos() -> Self {
        Self {
            name: "todos".to_string(),
            collection_path: "/todos".to_string(),
            id_field: "id".to_string(),
            shape: Shape::new(vec![
                FieldSpec::required("userId", PrimitiveKind::Number),
                FieldSpec::required("id", PrimitiveKind::Number),
                FieldSpec::required("title", PrimitiveKind::String),
                FieldSpec::required("completed", PrimitiveKind::Boolean),
            ]),
            supports_input_validation: false,
            existing_id: 1,
            missing_id: 999999,
            filter: FilterProbe {
                field: "userId".to_string(),
                value: json!(1),
            },
            existing_expectations: Map::new(),
        }
    }

    /// Built-in resource families, in run order
    pub fn builtin() -> Vec<Self> {
        vec![Self::comments(), Self::todos()]
    }

    /// Apply configured overrides, rejecting filters on unknown fields.
    ///
    /// Moving `existing_id` drops the built-in expectations, which only
    /// describe the default item.
    pub fn apply(&mut self, over: &ResourceOverride) -> Result<()> {
        if let Some(id) = over.existing_id {
            if id != self.existing_id {
                self.existing_expectations.clear();
            }
            self.existing_id = id;
        }
        if let Some(id) = over.missing_id {
            self.missing_id = id;
        }
        if let Some(flag) = over.supports_input_validation {
            self.supports_input_validation = flag;
        }
        if let Some(ref filter) = over.filter {
            let value = self.typed_value("Filter", &filter.field, &filter.value)?;
            if value.is_f64() {
                bail!(
                    "Filter value for {}.{} must be a whole number",
                    self.name,
                    filter.field
                );
            }
            self.filter = FilterProbe {
                field: filter.field.clone(),
                value,
            };
        }
        if let Some(ref expectations) = over.expectations {
            let mut checked = Map::new();
            for (field, value) in expectations {
                checked.insert(field.clone(), self.typed_value("Expected", field, value)?);
            }
            self.existing_expectations = checked;
        }
        if self.existing_id == self.missing_id {
            bail!(
                "{}: existing_id and missing_id must differ (both {})",
                self.name,
                self.existing_id
            );
        }
        Ok(())
    }

    /// Convert a configured value, checking it against the field's kind
    fn typed_value(&self, what: &str, field: &str, value: &toml::Value) -> Result<Value> {
        let Some(spec) = self.shape.field(field) else {
            bail!("{} field '{}' is not part of the {} shape", what, field, self.name);
        };
        let value = toml_to_json(value);
        if !spec.kind.matches(&value) {
            bail!(
                "{} value for {}.{} must be a {}",
                what,
                self.name,
                field,
                spec.kind
            );
        }
        Ok(value)
    }
}

/// Built-in descriptors with configured overrides applied, narrowed to
/// `names` when any are given
pub fn configured(config: &Config, names: &[String]) -> Result<Vec<ResourceDescriptor>> {
    let mut all = ResourceDescriptor::builtin();

    for (name, over) in &config.resources {
        let Some(descriptor) = all.iter_mut().find(|d| &d.name == name) else {
            bail!("Config has settings for unknown resource '{}'", name);
        };
        descriptor.apply(over)?;
    }

    select(all, names)
}

/// Select descriptors by name; an empty selection means all of them
pub fn select(all: Vec<ResourceDescriptor>, names: &[String]) -> Result<Vec<ResourceDescriptor>> {
    if names.is_empty() {
        return Ok(all);
    }

    for name in names {
        if !all.iter().any(|d| &d.name == name) {
            let known: Vec<&str> = all.iter().map(|d| d.name.as_str()).collect();
            bail!("Unknown resource '{}'. Known: {}", name, known.join(", "));
        }
    }

    Ok(all.into_iter().filter(|d| names.contains(&d.name)).collect())
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn toml_to_json(value: &toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s.clone()),
        toml::Value::Integer(i) => json!(i),
        // Whole floats compare equal to the integers a backend returns
        toml::Value::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => json!(*f as i64),
        toml::Value::Float(f) => json!(f),
        toml::Value::Boolean(b) => Value::Bool(*b),
        toml::Value::Datetime(d) => Value::String(d.to_string()),
        toml::Value::Array(items) => Value::Array(items.iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .iter()
                .map(|(k, v)| (k.clone(), toml_to_json(v)))
                .collect(),
        ),
    }
}
