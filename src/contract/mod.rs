//! Response contract checks
//!
//! Status and content type are judged from response metadata alone, before
//! any body parsing, so a wrong status is never masked by a confusing
//! parse or shape failure.

pub mod shape;

use crate::client::{ApiResponse, ClientError};
use serde::Serialize;
use serde_json::Value;
use shape::{Shape, ShapeViolation};
use thiserror::Error;

pub const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContractViolation {
    #[error("{request} returned non-success status {status}")]
    NotSuccess { request: String, status: u16 },

    #[error("{request} returned status {actual}, expected {expected}")]
    StatusMismatch {
        request: String,
        expected: u16,
        actual: u16,
    },

    #[error("{request} returned content-type {actual:?}, expected it to contain 'application/json'")]
    ContentType {
        request: String,
        actual: Option<String>,
    },

    #[error("transport failure: {0}")]
    Transport(String),
}

impl From<ClientError> for ContractViolation {
    fn from(err: ClientError) -> Self {
        ContractViolation::Transport(err.to_string())
    }
}

/// Per-response verification summary
#[derive(Debug, Clone, Default, Serialize)]
pub struct VerificationOutcome {
    pub status_match: bool,
    pub content_type_match: bool,
    pub shape_violations: Vec<ShapeViolation>,
}

impl VerificationOutcome {
    /// Check a parsed body (or one element of it) against `shape`
    pub fn with_shape(mut self, body: &Value, shape: &Shape) -> Self {
        self.shape_violations = shape::validate(body, shape);
        self
    }

    pub fn passed(&self) -> bool {
        self.status_match && self.content_type_match && self.shape_violations.is_empty()
    }
}

/// Check that a response is 2xx, has exactly `expected_status`, and
/// carries a JSON content type
pub fn verify(
    response: &ApiResponse,
    expected_status: u16,
) -> Result<VerificationOutcome, ContractViolation> {
    verify_status(response, expected_status)?;

    let content_type_match = response
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.contains(JSON_CONTENT_TYPE));

    if !content_type_match {
        return Err(ContractViolation::ContentType {
            request: response.request_line(),
            actual: response.content_type.clone(),
        });
    }

    Ok(VerificationOutcome {
        status_match: true,
        content_type_match,
        shape_violations: Vec::new(),
    })
}

/// Status-only form of [`verify`], for responses whose body may be empty
pub fn verify_status(response: &ApiResponse, expected_status: u16) -> Result<(), ContractViolation> {
    if (200..300).contains(&expected_status) && !response.ok() {
        return Err(ContractViolation::NotSuccess {
            request: response.request_line(),
            status: response.status,
        });
    }

    if response.status != expected_status {
        return Err(ContractViolation::StatusMismatch {
            request: response.request_line(),
            expected: expected_status,
            actual: response.status,
        });
    }

    Ok(())
}
