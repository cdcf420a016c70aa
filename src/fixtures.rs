//! Payload fixtures per resource family
//!
//! Fixtures are checked against the resource shape when registered and are
//! never mutated afterwards. A scenario that needs different values builds a
//! new fixture.

use crate::contract::shape::{self, PrimitiveKind};
use crate::resource::ResourceDescriptor;
use clap::ValueEnum;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum FixtureKind {
    ValidCreate,
    ValidUpdate,
    InvalidCreate,
    InvalidUpdate,
}

impl FixtureKind {
    pub const ALL: [FixtureKind; 4] = [
        FixtureKind::ValidCreate,
        FixtureKind::ValidUpdate,
        FixtureKind::InvalidCreate,
        FixtureKind::InvalidUpdate,
    ];

    fn is_valid(self) -> bool {
        matches!(self, FixtureKind::ValidCreate | FixtureKind::ValidUpdate)
    }
}

impl fmt::Display for FixtureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FixtureKind::ValidCreate => "valid-create",
            FixtureKind::ValidUpdate => "valid-update",
            FixtureKind::InvalidCreate => "invalid-create",
            FixtureKind::InvalidUpdate => "invalid-update",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum FixtureError {
    #[error("No {kind} fixture registered for '{resource}'")]
    NotFound { resource: String, kind: FixtureKind },

    #[error("Invalid {kind} fixture for '{resource}': {reason}")]
    Invalid {
        resource: String,
        kind: FixtureKind,
        reason: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct PayloadFixture {
    pub kind: FixtureKind,
    pub resource: String,
    pub fields: Map<String, Value>,
}

impl PayloadFixture {
    pub fn new(resource: &str, kind: FixtureKind, fields: Value) -> Self {
        let fields = match fields {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            kind,
            resource: resource.to_string(),
            fields,
        }
    }

    /// JSON body to send
    pub fn payload(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

/// Immutable registry of fixtures keyed by resource and kind
#[derive(Debug, Default)]
pub struct FixtureCatalog {
    entries: BTreeMap<(String, FixtureKind), PayloadFixture>,
}

impl FixtureCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the built-in comments and todos payloads
    pub fn builtin() -> Result<Self, FixtureError> {
        let comments = ResourceDescriptor::comments();
        let todos = ResourceDescriptor::todos();
        let mut catalog = Self::new();

        catalog.register(
            &comments,
            PayloadFixture::new(
                "comments",
                FixtureKind::ValidCreate,
                json!({
                    "postId": 100,
                    "name": "Test Name",
                    "email": "test@example.com",
                    "body": "This is a test comment."
                }),
            ),
        )?;
        // Carries the target id; the todos update fixture does not
        catalog.register(
            &comments,
            PayloadFixture::new(
                "comments",
                FixtureKind::ValidUpdate,
                json!({
                    "postId": 999,
                    "id": 1,
                    "name": "Updated Name",
                    "email": "updated@example.com",
                    "body": "Updated comment body."
                }),
            ),
        )?;
        catalog.register(
            &comments,
            PayloadFixture::new("comments", FixtureKind::InvalidCreate, json!({ "postId": 1 })),
        )?;
        catalog.register(
            &comments,
            PayloadFixture::new(
                "comments",
                FixtureKind::InvalidUpdate,
                json!({
                    "postId": "invalid",
                    "id": 1,
                    "name": "",
                    "email": "not-an-email",
                    "body": ""
                }),
            ),
        )?;

        catalog.register(
            &todos,
            PayloadFixture::new(
                "todos",
                FixtureKind::ValidCreate,
                json!({ "userId": 1, "title": "New Todo Title", "completed": false }),
            ),
        )?;
        catalog.register(
            &todos,
            PayloadFixture::new(
                "todos",
                FixtureKind::ValidUpdate,
                json!({ "userId": 1, "title": "Updated Todo Title", "completed": true }),
            ),
        )?;
        catalog.register(
            &todos,
            PayloadFixture::new("todos", FixtureKind::InvalidCreate, json!({})),
        )?;
        catalog.register(
            &todos,
            PayloadFixture::new(
                "todos",
                FixtureKind::InvalidUpdate,
                json!({ "userId": "invalid", "title": "", "completed": "no" }),
            ),
        )?;

        catalog.validate_pairing(&comments)?;
        catalog.validate_pairing(&todos)?;
        Ok(catalog)
    }

    /// Register a fixture after checking it against the resource shape
    pub fn register(
        &mut self,
        descriptor: &ResourceDescriptor,
        fixture: PayloadFixture,
    ) -> Result<(), FixtureError> {
        let invalid = |reason: String| FixtureError::Invalid {
            resource: fixture.resource.clone(),
            kind: fixture.kind,
            reason,
        };

        if fixture.resource != descriptor.name {
            return Err(invalid(format!(
                "fixture belongs to '{}', not '{}'",
                fixture.resource, descriptor.name
            )));
        }

        let problems = constraint_breaches(descriptor, &fixture);
        if fixture.kind.is_valid() {
            if let Some(first) = problems.first() {
                return Err(invalid(first.clone()));
            }
            if fixture.kind == FixtureKind::ValidUpdate && fixture.fields.is_empty() {
                return Err(invalid("update fixture has no fields".to_string()));
            }
        } else if problems.is_empty() {
            return Err(invalid(
                "invalid fixture does not violate any shape constraint".to_string(),
            ));
        }

        self.entries
            .insert((fixture.resource.clone(), fixture.kind), fixture);
        Ok(())
    }

    pub fn get(&self, resource: &str, kind: FixtureKind) -> Result<&PayloadFixture, FixtureError> {
        self.entries
            .get(&(resource.to_string(), kind))
            .ok_or_else(|| FixtureError::NotFound {
                resource: resource.to_string(),
                kind,
            })
    }

    /// All fixtures registered for one resource, in kind order
    pub fn for_resource<'a>(&'a self, resource: &str) -> impl Iterator<Item = &'a PayloadFixture> + 'a {
        let resource = resource.to_string();
        FixtureKind::ALL
            .into_iter()
            .filter_map(move |kind| self.entries.get(&(resource.clone(), kind)))
    }

    /// The update fixture must overlap the create fixture on at least one
    /// field and change at least one value
    pub fn validate_pairing(&self, descriptor: &ResourceDescriptor) -> Result<(), FixtureError> {
        let create = self.get(&descriptor.name, FixtureKind::ValidCreate)?;
        let update = self.get(&descriptor.name, FixtureKind::ValidUpdate)?;

        let shared: Vec<&String> = update
            .fields
            .keys()
            .filter(|k| create.fields.contains_key(*k))
            .collect();

        let changed = shared.iter().any(|k| create.fields[*k] != update.fields[*k]);

        if shared.is_empty() || !changed {
            return Err(FixtureError::Invalid {
                resource: descriptor.name.clone(),
                kind: FixtureKind::ValidUpdate,
                reason: "update fixture must change at least one field of the create fixture"
                    .to_string(),
            });
        }
        Ok(())
    }
}

/// Shape constraints a payload breaks. The id field is server-assigned, so
/// creates need not supply it.
fn constraint_breaches(descriptor: &ResourceDescriptor, fixture: &PayloadFixture) -> Vec<String> {
    let mut problems = Vec::new();

    for key in fixture.fields.keys() {
        if descriptor.shape.field(key).is_none() {
            problems.push(format!("unknown field '{}'", key));
        }
    }

    let body = Value::Object(fixture.fields.clone());
    let is_create = matches!(
        fixture.kind,
        FixtureKind::ValidCreate | FixtureKind::InvalidCreate
    );

    for violation in shape::validate(&body, &descriptor.shape) {
        let missing = violation.actual.is_none();
        if missing && violation.field == descriptor.id_field {
            continue;
        }
        // Updates may carry a subset of fields
        if missing && !is_create {
            continue;
        }
        problems.push(violation.to_string());
    }

    for spec in descriptor.shape.fields() {
        if spec.required && spec.kind == PrimitiveKind::String {
            if let Some(Value::String(s)) = fixture.fields.get(&spec.name) {
                if s.is_empty() {
                    problems.push(format!("required string '{}' is empty", spec.name));
                }
            }
        }
    }

    problems
}
