//! CRUD scenario runner
//!
//! Runs the canonical list / filter / get / get-missing / create / update /
//! delete sequence against one resource. Steps never feed each other:
//! Update and Delete target the conventional existing id, not whatever
//! Create returned, since the backend does not persist writes.

pub mod report;

use crate::client::{ApiResponse, ClientError, Mutation, ResourceClient};
use crate::config::Config;
use crate::contract::{self, ContractViolation, VerificationOutcome};
use crate::fixtures::{FixtureCatalog, FixtureError, FixtureKind, PayloadFixture};
use crate::resource::ResourceDescriptor;
use report::{ScenarioResult, Step, StepReport, StepStatus};
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;

const EXCERPT_LIMIT: usize = 600;
const MAX_MISMATCHES: usize = 5;

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Keep evaluating later steps after a failure
    pub continue_on_failure: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            continue_on_failure: true,
        }
    }
}

/// Why a step stopped early
#[derive(Error, Debug)]
enum StepError {
    #[error(transparent)]
    Contract(#[from] ContractViolation),

    #[error("{request} body is not valid JSON: {source}")]
    Json {
        request: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<ClientError> for StepError {
    fn from(err: ClientError) -> Self {
        StepError::Contract(err.into())
    }
}

/// Fixtures a scenario needs, resolved before any request is made
struct ScenarioFixtures<'a> {
    create: &'a PayloadFixture,
    update: &'a PayloadFixture,
    invalid: Option<(&'a PayloadFixture, &'a PayloadFixture)>,
}

impl<'a> ScenarioFixtures<'a> {
    fn resolve(
        catalog: &'a FixtureCatalog,
        descriptor: &ResourceDescriptor,
    ) -> Result<Self, FixtureError> {
        let name = descriptor.name.as_str();
        let invalid = if descriptor.supports_input_validation {
            Some((
                catalog.get(name, FixtureKind::InvalidCreate)?,
                catalog.get(name, FixtureKind::InvalidUpdate)?,
            ))
        } else {
            None
        };

        Ok(Self {
            create: catalog.get(name, FixtureKind::ValidCreate)?,
            update: catalog.get(name, FixtureKind::ValidUpdate)?,
            invalid,
        })
    }
}

/// Evidence gathered while a step runs
#[derive(Default)]
struct Recorder {
    requests: Vec<String>,
    http_status: Option<u16>,
    elapsed: Duration,
    failures: Vec<String>,
    outcomes: Vec<VerificationOutcome>,
    body_excerpt: Option<String>,
}

impl Recorder {
    fn observe(&mut self, response: &ApiResponse) {
        self.requests.push(response.request_line());
        self.http_status = Some(response.status);
        self.elapsed += response.elapsed;
        self.body_excerpt = Some(excerpt(&response.body));
    }

    fn fail(&mut self, message: String) {
        self.failures.push(message);
    }

    fn verified(&mut self, outcome: VerificationOutcome) {
        self.outcomes.push(outcome);
    }

    fn finish(mut self, step: Step, outcome: Result<(), StepError>) -> StepReport {
        if let Err(err) = outcome {
            self.failures.push(err.to_string());
        }

        let status = if self.failures.is_empty() && self.outcomes.iter().all(|o| o.passed()) {
            StepStatus::Passed
        } else {
            StepStatus::Failed
        };

        StepReport {
            step,
            status,
            requests: self.requests,
            http_status: self.http_status,
            elapsed_ms: self.elapsed.as_millis() as u64,
            failures: self.failures,
            shape_violations: self
                .outcomes
                .into_iter()
                .flat_map(|o| o.shape_violations)
                .collect(),
            body_excerpt: self.body_excerpt,
            note: None,
        }
    }
}

struct Context<'a> {
    client: &'a ResourceClient,
    descriptor: &'a ResourceDescriptor,
    fixtures: ScenarioFixtures<'a>,
}

/// Run every step against one resource.
///
/// `observer` sees each step as soon as it is finalized.
pub fn run(
    client: &ResourceClient,
    descriptor: &ResourceDescriptor,
    catalog: &FixtureCatalog,
    options: RunOptions,
    observer: &mut dyn FnMut(&StepReport),
) -> ScenarioResult {
    let fixtures = match ScenarioFixtures::resolve(catalog, descriptor) {
        Ok(fixtures) => fixtures,
        Err(err) => return ScenarioResult::aborted(&descriptor.name, err.to_string()),
    };

    let ctx = Context {
        client,
        descriptor,
        fixtures,
    };

    let mut steps = Vec::with_capacity(Step::ALL.len());
    let mut halted = false;

    for step in Step::ALL {
        let report = if halted {
            StepReport::skipped(step)
        } else {
            run_step(&ctx, step)
        };

        if report.status == StepStatus::Failed && !options.continue_on_failure {
            halted = true;
        }

        observer(&report);
        steps.push(report);
    }

    ScenarioResult::finished(&descriptor.name, steps)
}

/// Acquire a client for `config` and run the scenario inside its lifetime
pub fn run_resource(
    config: &Config,
    descriptor: &ResourceDescriptor,
    catalog: &FixtureCatalog,
    observer: &mut dyn FnMut(&StepReport),
) -> ScenarioResult {
    let options = RunOptions {
        continue_on_failure: config.continue_on_failure,
    };

    ResourceClient::scoped(&config.base_url, config.timeout, |client| {
        run(client, descriptor, catalog, options, observer)
    })
    .unwrap_or_else(|err| ScenarioResult::aborted(&descriptor.name, err.to_string()))
}

fn run_step(ctx: &Context<'_>, step: Step) -> StepReport {
    if step == Step::ValidateRejection && ctx.fixtures.invalid.is_none() {
        return StepReport::pending(
            step,
            "backend accepts any payload shape; enable supports_input_validation to check rejections",
        );
    }

    let mut rec = Recorder::default();
    let outcome = match step {
        Step::ListAll => list_all(ctx, &mut rec),
        Step::FilterByField => filter_by_field(ctx, &mut rec),
        Step::GetExisting => get_existing(ctx, &mut rec),
        Step::GetMissing => get_missing(ctx, &mut rec),
        Step::Create => create(ctx, &mut rec),
        Step::Update => update(ctx, &mut rec),
        Step::Delete => delete(ctx, &mut rec),
        Step::ValidateRejection => validate_rejection(ctx, &mut rec),
    };
    rec.finish(step, outcome)
}

fn list_all(ctx: &Context<'_>, rec: &mut Recorder) -> Result<(), StepError> {
    let d = ctx.descriptor;
    let response = ctx.client.list(&d.collection_path, &[])?;
    rec.observe(&response);
    let outcome = contract::verify(&response, 200)?;

    let body = parse(&response)?;
    let Some(items) = body.as_array() else {
        rec.fail(format!("expected a JSON array, got {}", kind_of(&body)));
        return Ok(());
    };

    match items.first() {
        Some(first) => rec.verified(outcome.with_shape(first, &d.shape)),
        None => rec.fail("expected at least one item, got an empty array".to_string()),
    }
    Ok(())
}

fn filter_by_field(ctx: &Context<'_>, rec: &mut Recorder) -> Result<(), StepError> {
    let d = ctx.descriptor;
    let filter = &d.filter;
    let query_value = filter.query_value();

    let response = ctx
        .client
        .list(&d.collection_path, &[(filter.field.as_str(), query_value.as_str())])?;
    rec.observe(&response);
    rec.verified(contract::verify(&response, 200)?);

    let body = parse(&response)?;
    let Some(items) = body.as_array() else {
        rec.fail(format!("expected a JSON array, got {}", kind_of(&body)));
        return Ok(());
    };

    if items.is_empty() {
        rec.fail(format!(
            "expected at least one item with {} = {}",
            filter.field, filter.value
        ));
    }

    let mismatches: Vec<String> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.get(&filter.field) != Some(&filter.value))
        .map(|(i, item)| {
            format!(
                "item {} has {} = {}, expected {}",
                i,
                filter.field,
                item.get(&filter.field).unwrap_or(&Value::Null),
                filter.value
            )
        })
        .collect();

    let total = mismatches.len();
    for message in mismatches.into_iter().take(MAX_MISMATCHES) {
        rec.fail(message);
    }
    if total > MAX_MISMATCHES {
        rec.fail(format!("... and {} more items not matching the filter", total - MAX_MISMATCHES));
    }
    Ok(())
}

fn get_existing(ctx: &Context<'_>, rec: &mut Recorder) -> Result<(), StepError> {
    let d = ctx.descriptor;
    let response = ctx.client.get(&d.collection_path, &d.existing_id.to_string())?;
    rec.observe(&response);
    let outcome = contract::verify(&response, 200)?;

    let body = parse(&response)?;
    let expected_id = Value::from(d.existing_id);
    match body.get(&d.id_field) {
        Some(id) if *id == expected_id => {}
        other => rec.fail(format!(
            "expected {} = {}, got {}",
            d.id_field,
            expected_id,
            other.unwrap_or(&Value::Null)
        )),
    }

    for (field, expected) in &d.existing_expectations {
        let actual = body.get(field).unwrap_or(&Value::Null);
        if actual != expected {
            rec.fail(format!("expected {} = {}, got {}", field, expected, actual));
        }
    }

    rec.verified(outcome.with_shape(&body, &d.shape));
    Ok(())
}

fn get_missing(ctx: &Context<'_>, rec: &mut Recorder) -> Result<(), StepError> {
    let d = ctx.descriptor;
    let id = d.missing_id.to_string();

    let first = ctx.client.get(&d.collection_path, &id)?;
    rec.observe(&first);
    let second = ctx.client.get(&d.collection_path, &id)?;
    rec.observe(&second);

    if first.status != 404 {
        rec.fail(format!(
            "{} returned status {}, expected 404",
            first.request_line(),
            first.status
        ));
    }
    if first.status / 100 != second.status / 100 {
        rec.fail(format!(
            "repeated {} changed status class: {} then {}",
            first.request_line(),
            first.status,
            second.status
        ));
    }
    Ok(())
}

fn create(ctx: &Context<'_>, rec: &mut Recorder) -> Result<(), StepError> {
    let d = ctx.descriptor;
    let fixture = ctx.fixtures.create;

    let response = ctx.client.create(&d.collection_path, &fixture.payload())?;
    rec.observe(&response);
    rec.verified(contract::verify(&response, 201)?);

    let body = parse(&response)?;
    expect_fields_echoed(rec, &body, &fixture.fields);

    match body.get(&d.id_field) {
        None | Some(Value::Null) => rec.fail(format!(
            "expected a server-assigned {} in the created resource",
            d.id_field
        )),
        Some(_) => {}
    }
    Ok(())
}

fn update(ctx: &Context<'_>, rec: &mut Recorder) -> Result<(), StepError> {
    let d = ctx.descriptor;
    let fields = update_fields(d, ctx.fixtures.update);

    let response = ctx.client.mutate(
        &d.collection_path,
        &d.existing_id.to_string(),
        &Value::Object(fields.clone()),
        Mutation::Update,
    )?;
    rec.observe(&response);
    let outcome = contract::verify(&response, 200)?;

    let body = parse(&response)?;
    expect_fields_echoed(rec, &body, &fields);
    rec.verified(outcome.with_shape(&body, &d.shape));
    Ok(())
}

fn delete(ctx: &Context<'_>, rec: &mut Recorder) -> Result<(), StepError> {
    let d = ctx.descriptor;
    let response = ctx.client.mutate(
        &d.collection_path,
        &d.existing_id.to_string(),
        &Value::Null,
        Mutation::Delete,
    )?;
    rec.observe(&response);

    // Empty or `{}` bodies are both fine; only the status matters
    contract::verify_status(&response, 200)?;
    Ok(())
}

fn validate_rejection(ctx: &Context<'_>, rec: &mut Recorder) -> Result<(), StepError> {
    let d = ctx.descriptor;
    let Some((invalid_create, invalid_update)) = ctx.fixtures.invalid else {
        return Ok(());
    };

    let created = ctx
        .client
        .create(&d.collection_path, &invalid_create.payload())?;
    rec.observe(&created);
    expect_rejected(rec, &created);

    let updated = ctx.client.mutate(
        &d.collection_path,
        &d.existing_id.to_string(),
        &invalid_update.payload(),
        Mutation::Update,
    )?;
    rec.observe(&updated);
    expect_rejected(rec, &updated);
    Ok(())
}

/// Update payload for the targeted item; an id carried by the fixture
/// follows `existing_id`
fn update_fields(d: &ResourceDescriptor, fixture: &PayloadFixture) -> Map<String, Value> {
    let mut fields = fixture.fields.clone();
    if let Some(id) = fields.get_mut(&d.id_field) {
        *id = Value::from(d.existing_id);
    }
    fields
}

fn expect_fields_echoed(rec: &mut Recorder, body: &Value, fields: &Map<String, Value>) {
    for (field, expected) in fields {
        let actual = body.get(field).unwrap_or(&Value::Null);
        if actual != expected {
            rec.fail(format!(
                "field '{}' expected {}, got {}",
                field, expected, actual
            ));
        }
    }
}

fn expect_rejected(rec: &mut Recorder, response: &ApiResponse) {
    if !(400..500).contains(&response.status) {
        rec.fail(format!(
            "{} returned status {}, expected a 4xx rejection",
            response.request_line(),
            response.status
        ));
        return;
    }

    let message = response
        .json()
        .ok()
        .and_then(|body| body.get("message").and_then(Value::as_str).map(str::to_string));

    match message {
        Some(m) if m.to_lowercase().contains("validation") => {}
        Some(m) => rec.fail(format!(
            "{} rejection message '{}' does not mention validation",
            response.request_line(),
            m
        )),
        None => rec.fail(format!(
            "{} rejection has no JSON 'message' field",
            response.request_line()
        )),
    }
}

fn parse(response: &ApiResponse) -> Result<Value, StepError> {
    response.json().map_err(|source| StepError::Json {
        request: response.request_line(),
        source,
    })
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Short, printable view of a body: the first two items of an array, or
/// the body itself truncated
fn excerpt(body: &str) -> String {
    if body.trim().is_empty() {
        return "[empty]".to_string();
    }

    let text = match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(items)) => {
            let head: Vec<Value> = items.into_iter().take(2).collect();
            serde_json::to_string_pretty(&head).unwrap_or_else(|_| body.to_string())
        }
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| body.to_string()),
        Err(_) => body.to_string(),
    };

    if text.chars().count() > EXCERPT_LIMIT {
        let cut: String = text.chars().take(EXCERPT_LIMIT).collect();
        format!("{}...", cut)
    } else {
        text
    }
}
