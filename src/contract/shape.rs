//! Data-driven shape checks for JSON resource bodies

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Primitive JSON kinds a resource field can be declared as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Number,
    String,
    Boolean,
}

impl PrimitiveKind {
    /// Check whether a JSON value is of this kind
    pub fn matches(self, value: &Value) -> bool {
        match self {
            PrimitiveKind::Number => value.is_number(),
            PrimitiveKind::String => value.is_string(),
            PrimitiveKind::Boolean => value.is_boolean(),
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrimitiveKind::Number => "number",
            PrimitiveKind::String => "string",
            PrimitiveKind::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

/// One declared field of a resource shape
#[derive(Debug, Clone, Serialize)]
pub struct FieldSpec {
    pub name: String,
    pub kind: PrimitiveKind,
    pub required: bool,
}

impl FieldSpec {
    pub fn required(name: &str, kind: PrimitiveKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required: true,
        }
    }

    #[allow(dead_code)] // Neither built-in resource declares optional fields
    pub fn optional(name: &str, kind: PrimitiveKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            required: false,
        }
    }
}

/// Ordered field schema of a resource
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Shape {
    fields: Vec<FieldSpec>,
}

impl Shape {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A field that is missing or of the wrong primitive kind
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShapeViolation {
    pub field: String,
    pub expected: PrimitiveKind,
    /// `None` when the field is absent
    pub actual: Option<Value>,
}

impl fmt::Display for ShapeViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.actual {
            Some(actual) => write!(
                f,
                "field '{}' expected {}, got {}",
                self.field, self.expected, actual
            ),
            None => write!(f, "field '{}' expected {}, but it is missing", self.field, self.expected),
        }
    }
}

/// Validate a JSON object against a shape.
///
/// Optional fields are only checked when present. A body that is not an
/// object reports every required field as missing.
pub fn validate(value: &Value, shape: &Shape) -> Vec<ShapeViolation> {
    let object = value.as_object();

    shape
        .fields()
        .iter()
        .filter_map(|spec| match object.and_then(|o| o.get(&spec.name)) {
            Some(actual) if spec.kind.matches(actual) => None,
            Some(actual) => Some(ShapeViolation {
                field: spec.name.clone(),
                expected: spec.kind,
                actual: Some(actual.clone()),
            }),
            None if spec.required => Some(ShapeViolation {
                field: spec.name.clone(),
                expected: spec.kind,
                actual: None,
            }),
            None => None,
        })
        .collect()
}
