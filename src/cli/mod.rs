use crate::fixtures::FixtureKind;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "crudcheck")]
#[command(about = "Contract checks for CRUD-style REST resource APIs")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the CRUD contract scenario against each resource
    Run {
        /// Backend base URL (overrides CRUDCHECK_BASE_URL and config files)
        #[arg(long)]
        base_url: Option<String>,

        /// Only run these resources (repeatable)
        #[arg(short, long = "resource", value_name = "NAME")]
        resources: Vec<String>,

        /// Output the report as JSON
        #[arg(long)]
        json: bool,

        /// Stop a scenario at its first failing step
        #[arg(long)]
        fail_fast: bool,

        /// Run resource scenarios concurrently
        #[arg(long)]
        parallel: bool,

        /// Per-request timeout in seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        /// Show requests and response bodies for every step
        #[arg(long, short)]
        verbose: bool,
    },

    /// List configured resource families
    Resources {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the payload fixtures of a resource as JSON
    Fixtures {
        /// Resource name (comments, todos)
        resource: String,

        /// Only print fixtures of this kind
        #[arg(long, value_enum)]
        kind: Option<FixtureKind>,
    },
}

pub mod fixtures;
pub mod resources;
pub mod run;
