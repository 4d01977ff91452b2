use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use tracing::{debug, info};

use libeggrun::memory::HostMemory;
use libeggrun::policy::{select, PolicyInputs, Rule, RunConfiguration, RunPlan};
use libeggrun::probe::ToolProbe;
use libeggrun::version::ToolVersion;

use crate::args::{Cli, ToolArgs};
use crate::extension_traits::{CommandExt, PathExt};

/// The `--dry-run` rendering of a plan.
#[derive(Serialize)]
struct PlanReport<'a> {
    emapper_version: &'a ToolVersion,
    emapper_probe_error: Option<String>,
    diamond_version: &'a ToolVersion,
    diamond_probe_error: Option<String>,
    memory_gb: Option<f64>,
    rules: &'a [Rule],
    command: Vec<String>,
    directories: Vec<String>,
}

impl<'a> PlanReport<'a> {
    fn new(inputs: &'a PolicyInputs, plan: &'a RunPlan) -> Self {
        let lossy = |p: &Path| p.to_string_lossy().to_string();

        Self {
            emapper_version: &inputs.emapper,
            emapper_probe_error: inputs.emapper.probe_error().map(|e| e.to_string()),
            diamond_version: &inputs.diamond,
            diamond_probe_error: inputs.diamond.probe_error().map(|e| e.to_string()),
            memory_gb: inputs.memory.gb(),
            rules: plan.rules(),
            command: std::iter::once(plan.program())
                .chain(plan.args().iter().map(Path::new))
                .map(lossy)
                .collect(),
            directories: plan.directories().iter().map(|d| lossy(d.as_path())).collect(),
        }
    }
}

/// Probe both tools and sample host memory.
pub fn probe_inputs(tool_args: &ToolArgs) -> PolicyInputs {
    let emapper = ToolProbe::emapper(&tool_args.emapper).version();
    let diamond = ToolProbe::diamond(&tool_args.diamond).version();
    let memory = HostMemory::query();

    info!("emapper.py: {emapper}, diamond: {diamond}, memory: {memory}");

    PolicyInputs {
        emapper,
        diamond,
        memory,
    }
}

pub fn create_plan_directories(plan: &RunPlan) -> Result<()> {
    plan.directories()
        .iter()
        .try_for_each(|dir| dir.create_dir())
}

pub fn invoke(plan: &RunPlan) -> Result<()> {
    println!("{} {}", "Running command:".bold(), plan.command_line());

    plan.command()
        .run_passthrough()
        .context("emapper.py failed")
}

/// Remove the scratch directory; the temp directory is left in place.
pub fn cleanup(config: &RunConfiguration) -> Result<()> {
    if config.scratch_dir().remove_dir_tree()? {
        debug!("removed scratch directory: {}", config.scratch_dir().display());
    }
    Ok(())
}

pub fn dry_run(config: &RunConfiguration, tool_args: &ToolArgs) -> Result<()> {
    let inputs = probe_inputs(tool_args);
    let plan = select(config, &inputs);

    println!("{} {}", "Would run command:".bold(), plan.command_line());
    println!(
        "{}",
        serde_json::to_string_pretty(&PlanReport::new(&inputs, &plan))?
    );
    Ok(())
}

pub fn run(cli: &Cli) -> Result<()> {
    let config = cli.run_args.run_configuration(&cli.tool_args)?;

    if cli.run_args.dry_run {
        return dry_run(&config, &cli.tool_args);
    }

    config.outdir().create_dir()?;

    let inputs = probe_inputs(&cli.tool_args);
    let plan = select(&config, &inputs);
    info!(
        "applying rules: [{}]",
        plan.rules()
            .iter()
            .map(|r| r.as_ref())
            .collect::<Vec<_>>()
            .join(", ")
    );

    create_plan_directories(&plan)?;
    invoke(&plan)?;
    cleanup(&config)?;

    info!("done");
    Ok(())
}
