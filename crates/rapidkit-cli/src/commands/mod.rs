//! Command handlers and the wiring they share.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use rapidkit_adapters::{FsCatalog, TeraRenderer};
use rapidkit_core::prelude::{Filesystem, KitRegistry, ProjectCreator};
use serde_json::Value;
use tracing::debug;

use crate::{
    cli::GlobalArgs,
    config::AppConfig,
    error::{CliError, CliResult},
};

pub mod add;
pub mod completions;
pub mod config;
pub mod create;
pub mod info;
pub mod list;
pub mod prompt;

/// Catalog used when neither `--catalog` nor `catalog.path` is set.
pub const DEFAULT_CATALOG_DIR: &str = "catalog";

/// Resolve the catalog root: flag (or `RAPIDKIT_CATALOG`), then config,
/// then `./catalog`.
pub fn catalog_root(global: &GlobalArgs, config: &AppConfig) -> PathBuf {
    global
        .catalog
        .clone()
        .or_else(|| config.catalog.path.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG_DIR))
}

pub fn open_catalog(global: &GlobalArgs, config: &AppConfig) -> CliResult<Arc<FsCatalog>> {
    let root = catalog_root(global, config);
    if !root.is_dir() {
        return Err(CliError::CatalogNotFound { path: root });
    }
    debug!(catalog = %root.display(), "Using catalog");
    Ok(Arc::new(FsCatalog::new(root)))
}

/// Wire the creator with the Tera renderer and the process environment.
pub fn build_creator(
    catalog: &Arc<FsCatalog>,
    filesystem: Arc<dyn Filesystem>,
) -> CliResult<ProjectCreator> {
    let kits = KitRegistry::load(catalog.as_ref())?;
    Ok(
        ProjectCreator::new(kits, catalog.clone(), Arc::new(TeraRenderer::new()), filesystem)
            .with_env(env_snapshot()),
    )
}

/// Snapshot of the environment after `.env` loading.
pub fn env_snapshot() -> BTreeMap<String, String> {
    std::env::vars().collect()
}

/// `--var` pairs as string values; typed variables are coerced by the core.
pub fn to_values(vars: &[(String, String)]) -> BTreeMap<String, Value> {
    vars.iter()
        .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
        .collect()
}
