//! Shared helpers

pub mod ui;
