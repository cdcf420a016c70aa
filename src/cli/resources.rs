//! Resources command - show configured resource families
//!
//! crudcheck resources [--json]

use crate::config::{CliOverrides, Config};
use crate::resource::{self, ResourceDescriptor};
use crate::util::ui;
use anyhow::Result;

pub fn run(json: bool) -> Result<()> {
    let config = Config::load(&CliOverrides::default())?;
    let descriptors = resource::configured(&config, &[])?;

    if json {
        println!("{}", serde_json::to_string_pretty(&descriptors)?);
        return Ok(());
    }

    ui::info(&format!("Backend: {}", config.base_url));
    for descriptor in &descriptors {
        println!();
        print_descriptor(descriptor);
    }

    Ok(())
}

fn print_descriptor(d: &ResourceDescriptor) {
    println!("{} ({})", d.name, d.collection_path);

    let fields: Vec<String> = d
        .shape
        .fields()
        .iter()
        .map(|f| {
            let marker = if f.required { "" } else { "?" };
            format!("{}{}: {}", f.name, marker, f.kind)
        })
        .collect();
    ui::dim(&format!("Shape: {}", fields.join(", ")));
    ui::dim(&format!(
        "Existing id: {}, missing id: {}",
        d.existing_id, d.missing_id
    ));
    ui::dim(&format!("Filter: {} = {}", d.filter.field, d.filter.value));

    if d.supports_input_validation {
        ui::success("Input validation checks enabled");
    } else {
        ui::warn("Input validation checks pending (backend accepts any payload)");
    }
}
