//! Implementation of the `rapidkit list` command.

use serde_json::json;

use rapidkit_core::prelude::{KitRegistry, ModuleSource};

use crate::{
    cli::{GlobalArgs, ListArgs, ListFormat},
    commands::open_catalog,
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

pub fn execute(
    args: ListArgs,
    global: GlobalArgs,
    config: AppConfig,
    output: OutputManager,
) -> CliResult<()> {
    let catalog = open_catalog(&global, &config)?;
    let registry = KitRegistry::load(catalog.as_ref())?;
    let kits = registry.list_kits_names();
    let modules = if args.modules {
        catalog.list_modules()?
    } else {
        Vec::new()
    };

    match args.format {
        ListFormat::Table => {
            output.header("Available kits:")?;
            for name in &kits {
                let kit = registry.get_kit(name)?;
                output.print(&format!(
                    "  {:<28} {:<8} {:<7} {}",
                    kit.name,
                    kit.version,
                    kit.ecosystem.to_string(),
                    kit.description
                ))?;
            }
            if args.modules {
                output.print("")?;
                output.header("Available modules:")?;
                for module in &modules {
                    output.print(&format!("  {module}"))?;
                }
            }
        }
        ListFormat::List => {
            for name in kits.iter().chain(modules.iter()) {
                println!("{name}");
            }
        }
        ListFormat::Json => {
            let mut doc = json!({ "kits": kits });
            if args.modules {
                doc["modules"] = json!(modules);
            }
            output.json(&doc)?;
        }
    }

    Ok(())
}
