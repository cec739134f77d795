//! Implementation of the `rapidkit info` command.

use serde_json::{Value, json};

use rapidkit_core::{
    domain::variables::display_value,
    prelude::{Kit, KitRegistry},
};

use crate::{
    cli::{GlobalArgs, InfoArgs, ListFormat},
    commands::open_catalog,
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

pub fn execute(
    args: InfoArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let catalog = open_catalog(&global, &config)?;
    let registry = KitRegistry::load(catalog.as_ref())?;
    let kit = registry.get_kit(&args.kit)?;

    match args.format {
        ListFormat::Json => output.json(&kit_document(&kit))?,
        ListFormat::List => {
            for module in &kit.modules {
                println!("{}:{}", module.module_name, module.variant);
            }
        }
        ListFormat::Table => {
            output.header(&format!("{} {}", kit.name, kit.version))?;
            if !kit.description.is_empty() {
                output.print(&format!("  {}", kit.description))?;
            }
            output.print(&format!("  ecosystem: {}", kit.ecosystem))?;
            output.print(&format!("  profile:   {}", kit.profile_chain.join(" -> ")))?;

            output.print("")?;
            output.header("Variables:")?;
            for (name, def) in kit.variables.iter() {
                let default = def
                    .default
                    .as_ref()
                    .map(display_value)
                    .unwrap_or_else(|| "-".into());
                let marker = if def.needs_value() { " (required)" } else { "" };
                output.print(&format!(
                    "  {name:<24} {:<7} {default}{marker}",
                    def.kind().as_str()
                ))?;
            }

            output.print("")?;
            output.header("Modules:")?;
            for module in &kit.modules {
                output.print(&format!("  {:<32} {}", module.module_name, module.variant))?;
            }
        }
    }

    Ok(())
}

fn kit_document(kit: &Kit) -> Value {
    json!({
        "name": kit.name,
        "version": kit.version,
        "description": kit.description,
        "ecosystem": kit.ecosystem,
        "profile_chain": kit.profile_chain,
        "variables": kit.variables,
        "modules": kit.modules,
    })
}
