//! Test harness for crudcheck integration tests
//!
//! Provides a fake resource backend, isolated workspaces, binary execution,
//! and custom assertions for testing end-to-end CLI behavior.

#![allow(dead_code)]

mod backend;

pub use assertions::CrudcheckAssertions;
pub use backend::{Behavior, FakeApi};
pub use runner::{crudcheck, crudcheck_in_dir, crudcheck_with_env, RunResult};
pub use workspace::Workspace;
