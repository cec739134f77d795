//! Implementation of the `rapidkit add` command.

use std::sync::Arc;

use tracing::{info, instrument};

use rapidkit_adapters::LocalFilesystem;
use rapidkit_core::prelude::AddModuleRequest;

use crate::{
    cli::{AddArgs, GlobalArgs},
    commands::{build_creator, open_catalog, prompt::interactive_prompt, to_values},
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

/// Generate one module into an existing project directory.
#[instrument(skip_all, fields(module = %args.module, variant = %args.variant))]
pub fn execute(
    args: AddArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    if !args.project.is_dir() {
        return Err(CliError::InvalidInput {
            message: format!(
                "project directory '{}' does not exist",
                args.project.display()
            ),
            source: None,
        });
    }

    let request = AddModuleRequest {
        project_dir: args.project.clone(),
        module_name: args.module.clone(),
        variant: args.variant.clone(),
        variables: to_values(&args.vars),
        force: args.force,
        interactive: args.interactive,
        kit_name: args.kit.clone().or_else(|| config.defaults.kit.clone()),
    };

    let catalog = open_catalog(&global, &config)?;
    let creator = build_creator(&catalog, Arc::new(LocalFilesystem::new()))?;
    let prompt = interactive_prompt(args.interactive)?;

    info!(project = %request.project_dir.display(), "Add module started");
    let report = creator.add_module(&request, prompt.as_deref())?;

    if output.is_json() {
        output.json(&report)?;
        return Ok(());
    }

    for warning in &report.warnings {
        output.warning(warning)?;
    }
    output.success(&format!(
        "Module '{}' ({}) added: {} files written, {} kept",
        request.module_name,
        request.variant,
        report.files.len(),
        report.skipped.len()
    ))?;
    if output.is_verbose() {
        for file in &report.files {
            output.print(&format!("  + {}", file.display()))?;
        }
        for file in &report.skipped {
            output.print(&format!("  = {}", file.display()))?;
        }
    }
    if !report.skipped.is_empty() && !args.force {
        output.info("Existing files were kept; pass --force to overwrite them")?;
    }

    Ok(())
}
