//! Fixtures command - print registered payload fixtures
//!
//! crudcheck fixtures <resource> [--kind KIND]

use crate::fixtures::{FixtureCatalog, FixtureKind, PayloadFixture};
use anyhow::{bail, Result};

pub fn run(resource: &str, kind: Option<FixtureKind>) -> Result<()> {
    let catalog = FixtureCatalog::builtin()?;
    let selected = select(&catalog, resource, kind)?;
    println!("{}", serde_json::to_string_pretty(&selected)?);
    Ok(())
}

fn select<'a>(
    catalog: &'a FixtureCatalog,
    resource: &str,
    kind: Option<FixtureKind>,
) -> Result<Vec<&'a PayloadFixture>> {
    if let Some(kind) = kind {
        return Ok(vec![catalog.get(resource, kind)?]);
    }

    let all: Vec<&PayloadFixture> = catalog.for_resource(resource).collect();
    if all.is_empty() {
        bail!("No fixtures registered for '{}'", resource);
    }
    Ok(all)
}
