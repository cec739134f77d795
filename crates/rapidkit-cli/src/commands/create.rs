//! Implementation of the `rapidkit create` command.
//!
//! Responsibility: translate CLI arguments into a `CreateRequest`, wire the
//! adapters, call the core creator, and display the report. No business
//! logic lives here.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument};

use rapidkit_adapters::{LocalFilesystem, MemoryFilesystem};
use rapidkit_core::prelude::{
    ApplicationError, CreateRequest, Filesystem, ProjectReport, RapidkitError,
};

use crate::{
    cli::{CreateArgs, GlobalArgs},
    commands::{build_creator, open_catalog, prompt::interactive_prompt, to_values},
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

/// JSON shape of a finished run.
#[derive(Debug, Serialize)]
struct CreateSummary<'a> {
    #[serde(flatten)]
    report: &'a ProjectReport,
    dry_run: bool,
    generated_at: DateTime<Utc>,
}

/// Execute the `rapidkit create` command.
///
/// 1. Validate the project name and pick the kit
/// 2. Collect variables: config defaults, then `--var`
/// 3. Wire adapters (in-memory filesystem for `--dry-run`)
/// 4. Run the creator and print the aggregated report
#[instrument(skip_all, fields(project = %args.name))]
pub fn execute(
    args: CreateArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    validate_project_name(&args.name)?;

    let kit_name = args
        .kit
        .clone()
        .or_else(|| config.defaults.kit.clone())
        .ok_or_else(|| CliError::InvalidInput {
            message: "no kit given; pass --kit or set defaults.kit in the config file".into(),
            source: None,
        })?;
    let output_dir = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&args.name));

    let request = CreateRequest {
        kit_name,
        project_name: args.name.clone(),
        output_dir,
        variables: collect_variables(&config, &args.vars),
        force: args.force,
        interactive: args.interactive,
        debug: args.debug,
    };

    if args.dry_run && !args.force {
        ensure_output_free(&request.output_dir)?;
    }

    let catalog = open_catalog(&global, &config)?;
    let memory = MemoryFilesystem::new();
    let filesystem: Arc<dyn Filesystem> = if args.dry_run {
        Arc::new(memory.clone())
    } else {
        Arc::new(LocalFilesystem::new())
    };
    let creator = build_creator(&catalog, filesystem)?;
    let prompt = interactive_prompt(args.interactive)?;

    if !output.is_json() {
        output.header(&format!(
            "Creating '{}' from kit '{}'...",
            request.project_name, request.kit_name
        ))?;
    }
    info!(kit = %request.kit_name, output = %request.output_dir.display(), "Create started");

    let spinner = if args.interactive {
        None
    } else {
        output.spinner("Rendering modules")
    };
    let result = creator.create_project(&request, prompt.as_deref());
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let report = result?;

    if output.is_json() {
        output.json(&CreateSummary {
            report: &report,
            dry_run: args.dry_run,
            generated_at: Utc::now(),
        })?;
        return Ok(());
    }

    for warning in &report.warnings {
        output.warning(warning)?;
    }

    if args.dry_run {
        output.info(&format!(
            "Dry run: {} files would be written to {}",
            report.files.len(),
            report.output_dir.display()
        ))?;
        for file in memory.list_files() {
            output.print(&format!("  {}", relative(&file, &report.output_dir)))?;
        }
        return Ok(());
    }

    output.success(&format!(
        "Project '{}' created ({} files)",
        report.project_name,
        report.files.len()
    ))?;
    if output.is_verbose() {
        for file in &report.files {
            output.print(&format!("  {}", relative(file, &report.output_dir)))?;
        }
    }
    output.print("")?;
    output.print("Next steps:")?;
    output.print(&format!("  cd {}", report.output_dir.display()))?;

    Ok(())
}

/// Config defaults first; `--var` wins.
fn collect_variables(config: &AppConfig, vars: &[(String, String)]) -> BTreeMap<String, Value> {
    let mut values = BTreeMap::new();
    if let Some(author) = &config.defaults.author {
        values.insert("author".to_string(), Value::from(author.as_str()));
    }
    if let Some(license) = &config.defaults.license {
        values.insert("license".to_string(), Value::from(license.as_str()));
    }
    values.extend(to_values(vars));
    values
}

/// A dry run reports the same conflict a real run would hit.
fn ensure_output_free(dir: &Path) -> CliResult<()> {
    let fs = LocalFilesystem::new();
    if fs.exists(dir) && !fs.is_dir_empty(dir)? {
        return Err(CliError::Core(RapidkitError::from(
            ApplicationError::OutputExists {
                path: dir.to_path_buf(),
            },
        )));
    }
    Ok(())
}

fn relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn validate_project_name(name: &str) -> CliResult<()> {
    let invalid = |reason: &str| CliError::InvalidProjectName {
        name: name.into(),
        reason: reason.into(),
    };
    if name.trim().is_empty() {
        return Err(invalid("name cannot be empty"));
    }
    if name.starts_with('.') {
        return Err(invalid("name cannot start with '.'"));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(invalid("name cannot contain path separators (use --output)"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_names() {
        assert!(validate_project_name("order-service").is_ok());
        assert!(validate_project_name("Order Service").is_ok());
        assert!(validate_project_name("").is_err());
        assert!(validate_project_name(".hidden").is_err());
        assert!(validate_project_name("a/b").is_err());
    }

    #[test]
    fn vars_override_config_defaults() {
        let mut config = AppConfig::default();
        config.defaults.author = Some("Platform Team".into());

        let values = collect_variables(&config, &[("license".into(), "Apache-2.0".into())]);
        assert_eq!(values["author"], Value::from("Platform Team"));
        assert_eq!(values["license"], Value::from("Apache-2.0"));
    }

    #[test]
    fn dry_run_refuses_non_empty_output() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ensure_output_free(&dir.path().join("new")).is_ok());

        std::fs::write(dir.path().join("keep.txt"), "x").unwrap();
        let err = ensure_output_free(dir.path()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
