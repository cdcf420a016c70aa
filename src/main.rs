mod cli;
mod client;
mod config;
mod contract;
mod fixtures;
mod paths;
mod resource;
mod scenario;
mod util;


use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            util::ui::fatal(&format!("{:#}", e));
            std::process::exit(1);
        }
    }
}

/// Dispatch the command; `Ok(false)` means contract checks failed
fn run() -> Result<bool> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run {
            base_url,
            resources,
            json,
            fail_fast,
            parallel,
            timeout,
            verbose,
        }) => cli::run::run(cli::run::RunArgs {
            base_url,
            resources,
            json,
            fail_fast,
            parallel,
            timeout,
            verbose,
        }),
        Some(Commands::Resources { json }) => cli::resources::run(json).map(|_| true),
        Some(Commands::Fixtures { resource, kind }) => {
            cli::fixtures::run(&resource, kind).map(|_| true)
        }
        None => {
            // No command provided, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
            Ok(true)
        }
    }
}
