//! Kits: named bundles of a profile chain, a variable schema and module refs.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

use crate::domain::error::DomainError;
use crate::domain::value_objects::Ecosystem;
use crate::domain::variables::VariableSchema;

/// A module selected by a kit, with the framework variant to materialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleRef {
    #[serde(rename = "name", alias = "module", alias = "module_name")]
    pub module_name: String,

    pub variant: String,

    /// Per-kit overrides of module variable values.
    #[serde(default, alias = "config_overrides", skip_serializing_if = "BTreeMap::is_empty")]
    pub config: BTreeMap<String, Value>,
}

impl ModuleRef {
    pub fn new(module_name: impl Into<String>, variant: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            variant: variant.into(),
            config: BTreeMap::new(),
        }
    }
}

/// A `kit.yaml` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KitManifest {
    pub name: String,

    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub ecosystem: Ecosystem,

    /// Parent profile; adds an edge to the profile configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherits: Option<String>,

    #[serde(default)]
    pub variables: VariableSchema,

    #[serde(default)]
    pub modules: Vec<ModuleRef>,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

impl KitManifest {
    /// Structural checks that do not need the rest of the catalog.
    pub fn validate(&self) -> Result<(), DomainError> {
        let invalid = |reason: String| DomainError::InvalidKitManifest {
            kit: self.name.clone(),
            reason,
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name must not be empty".into()));
        }

        semver::Version::parse(&self.version).map_err(|e| DomainError::InvalidVersion {
            version: self.version.clone(),
            reason: e.to_string(),
        })?;

        let mut seen = HashSet::new();
        for module in &self.modules {
            if module.module_name.trim().is_empty() {
                return Err(invalid("module reference without a name".into()));
            }
            if module.variant.trim().is_empty() {
                return Err(invalid(format!(
                    "module '{}' does not select a variant",
                    module.module_name
                )));
            }
            if !seen.insert(module.module_name.as_str()) {
                return Err(invalid(format!(
                    "module '{}' is listed twice",
                    module.module_name
                )));
            }
        }

        self.variables.validate_defaults()
    }
}

/// A resolved kit: manifest layered over its ancestors.
#[derive(Debug, Clone, PartialEq)]
pub struct Kit {
    pub name: String,
    pub version: String,
    pub description: String,
    pub ecosystem: Ecosystem,
    /// Root first, ends with `name`.
    pub profile_chain: Vec<String>,
    /// Shared defaults merged with every kit in the chain.
    pub variables: VariableSchema,
    pub modules: Vec<ModuleRef>,
}

/// Layer the kit manifests found along a chain, root first.
///
/// Later manifests override variable fields and replace same-named module
/// refs in place; new module refs append in declared order.
pub fn layer_kits<'a>(
    chain: impl IntoIterator<Item = &'a KitManifest>,
) -> (VariableSchema, Vec<ModuleRef>) {
    let mut variables = VariableSchema::new();
    let mut modules: Vec<ModuleRef> = Vec::new();

    for manifest in chain {
        variables = manifest.variables.merged_over(&variables);
        for module in &manifest.modules {
            match modules
                .iter_mut()
                .find(|m| m.module_name == module.module_name)
            {
                Some(existing) => *existing = module.clone(),
                None => modules.push(module.clone()),
            }
        }
    }

    (variables, modules)
}
