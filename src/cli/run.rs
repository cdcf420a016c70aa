//! Run command - execute contract scenarios and report results
//!
//! crudcheck run [--base-url URL] [-r NAME]... [--json] [--fail-fast] [--parallel]

use crate::config::{CliOverrides, Config};
use crate::fixtures::FixtureCatalog;
use crate::resource::{self, ResourceDescriptor};
use crate::scenario::report::{RunReport, ScenarioResult, Step, StepReport, StepStatus};
use crate::scenario;
use crate::util::ui;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::thread;

pub struct RunArgs {
    pub base_url: Option<String>,
    pub resources: Vec<String>,
    pub json: bool,
    pub fail_fast: bool,
    pub parallel: bool,
    pub timeout: Option<u64>,
    pub verbose: bool,
}

/// Run the scenarios; returns whether every scenario passed
pub fn run(args: RunArgs) -> Result<bool> {
    let config = Config::load(&CliOverrides {
        base_url: args.base_url,
        timeout_secs: args.timeout,
        fail_fast: args.fail_fast,
    })?;

    let descriptors = resource::configured(&config, &args.resources)?;
    let catalog = FixtureCatalog::builtin().context("Built-in fixtures are inconsistent")?;

    let progress = if args.json {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new((descriptors.len() * Step::ALL.len()) as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .context("Invalid progress bar template")?
                .progress_chars("#>-"),
        );
        pb
    };

    let results = if args.parallel {
        run_parallel(&config, &descriptors, &catalog, &progress)
    } else {
        descriptors
            .iter()
            .map(|d| {
                scenario::run_resource(&config, d, &catalog, &mut |step| {
                    tick(&progress, &d.name, step)
                })
            })
            .collect()
    };
    progress.finish_and_clear();

    let report = RunReport::new(&config.base_url, results);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, args.verbose);
    }

    Ok(report.passed)
}

/// One scoped thread per resource, each with its own client
fn run_parallel(
    config: &Config,
    descriptors: &[ResourceDescriptor],
    catalog: &FixtureCatalog,
    progress: &ProgressBar,
) -> Vec<ScenarioResult> {
    thread::scope(|scope| {
        let handles: Vec<_> = descriptors
            .iter()
            .map(|d| {
                let pb = progress.clone();
                let handle = scope.spawn(move || {
                    scenario::run_resource(config, d, catalog, &mut |step| tick(&pb, &d.name, step))
                });
                (d, handle)
            })
            .collect();

        handles
            .into_iter()
            .map(|(d, handle)| {
                handle.join().unwrap_or_else(|_| {
                    ScenarioResult::aborted(&d.name, "scenario thread panicked".to_string())
                })
            })
            .collect()
    })
}

fn tick(progress: &ProgressBar, resource: &str, step: &StepReport) {
    progress.set_message(format!("{}: {}", resource, step.step));
    progress.inc(1);
}

/// Print the run report in human-readable format
fn print_report(report: &RunReport, verbose: bool) {
    println!();
    println!("crudcheck v{} against {}", report.crudcheck_version, report.base_url);
    println!("{}", "═".repeat(50));

    for result in &report.resources {
        println!();
        println!("{}", result.resource);

        if let Some(ref reason) = result.aborted {
            ui::error(&format!("Scenario aborted: {}", reason));
            continue;
        }

        for step in &result.steps {
            match step.status {
                StepStatus::Passed => ui::success(&step_line(step)),
                StepStatus::Failed => {
                    ui::error(&step_line(step));
                    for failure in &step.failures {
                        println!("      {}", failure);
                    }
                    for violation in &step.shape_violations {
                        println!("      {}", violation);
                    }
                }
                StepStatus::Pending => {
                    ui::warn(&format!("{} (pending)", step.step));
                    if let Some(ref note) = step.note {
                        println!("      {}", note);
                    }
                }
                StepStatus::Skipped => ui::dim(&format!("- {} (skipped)", step.step)),
            }

            if verbose {
                if let Some(ref body) = step.body_excerpt {
                    for line in body.lines() {
                        println!("        {}", line);
                    }
                }
            }
        }
    }

    let total = |status: StepStatus| -> usize { report.resources.iter().map(|r| r.count(status)).sum() };

    println!();
    let summary = format!(
        "{} passed, {} failed, {} pending, {} skipped",
        total(StepStatus::Passed),
        total(StepStatus::Failed),
        total(StepStatus::Pending),
        total(StepStatus::Skipped)
    );
    if report.passed {
        ui::success(&summary);
    } else {
        ui::error(&summary);
    }
}

fn step_line(step: &StepReport) -> String {
    let mut line = step.step.to_string();
    if !step.requests.is_empty() {
        line.push_str(&format!(" ({}", step.requests.join(", ")));
        if let Some(status) = step.http_status {
            line.push_str(&format!(" -> {}", status));
        }
        line.push_str(&format!(", {} ms)", step.elapsed_ms));
    }
    line
}
