//! Module manifests (`module.yaml`).
//!
//! A module declares a framework-agnostic vendor layer, one file set per
//! framework variant, its per-framework dependencies, and optionally a
//! snippets file. Everything here is data plus structural validation; the
//! generator in the application layer does the rendering.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::error::DomainError;
use crate::domain::paths::{RelativePath, join_contained};
use crate::domain::value_objects::{ModuleAccess, ModuleStatus};
use crate::domain::variables::VariableSchema;

/// Dependency key whose entries apply to every variant.
pub const COMMON_DEPENDENCIES: &str = "common";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleManifest {
    pub name: String,

    pub version: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub status: ModuleStatus,

    #[serde(default)]
    pub access: ModuleAccess,

    #[serde(default)]
    pub capabilities: Vec<String>,

    #[serde(default)]
    pub variables: VariableSchema,

    /// Framework (variant) name to package requirements.
    #[serde(default)]
    pub dependencies: IndexMap<String, Vec<DependencySpec>>,

    #[serde(default)]
    pub generation: Generation,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<Value>,
}

/// One package requirement as written in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySpec {
    pub name: String,

    #[serde(alias = "version", default = "any_version")]
    pub version_spec: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extras: Vec<String>,
}

fn any_version() -> String {
    "*".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    #[serde(default)]
    pub vendor: VendorSpec,

    #[serde(default)]
    pub variants: IndexMap<String, VariantSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippets: Option<SnippetsRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VendorSpec {
    /// Project-relative directory vendor files land under.
    #[serde(default)]
    pub root: String,

    #[serde(default)]
    pub files: Vec<VendorFile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorFile {
    pub template: String,
    pub relative: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariantSpec {
    #[serde(default)]
    pub files: Vec<VariantFile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantFile {
    pub template: String,
    pub output: String,
}

/// Pointer to the module's snippet definitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnippetsRef {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,

    /// Path of the snippets file, relative to the module directory.
    #[serde(default = "default_snippets_config")]
    pub config: String,
}

fn enabled_by_default() -> bool {
    true
}

fn default_snippets_config() -> String {
    "snippets.yaml".to_string()
}

impl ModuleManifest {
    pub fn variant(&self, name: &str) -> Option<&VariantSpec> {
        self.generation.variants.get(name)
    }

    pub fn variant_names(&self) -> impl Iterator<Item = &str> {
        self.generation.variants.keys().map(String::as_str)
    }

    /// `<name>@<version>`
    pub fn vendor_module(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }

    /// Snippets config path, when snippets are declared and enabled.
    pub fn snippets_config(&self) -> Option<&str> {
        self.generation
            .snippets
            .as_ref()
            .filter(|s| s.enabled)
            .map(|s| s.config.as_str())
    }

    /// Requirements for a variant: common entries first, then the
    /// variant's own. A variant entry replaces a common one of the same name.
    pub fn dependencies_for(&self, variant: &str) -> Vec<DependencySpec> {
        let mut deps: Vec<DependencySpec> = self
            .dependencies
            .get(COMMON_DEPENDENCIES)
            .cloned()
            .unwrap_or_default();

        for dep in self.dependencies.get(variant).into_iter().flatten() {
            match deps.iter_mut().find(|d| d.name == dep.name) {
                Some(existing) => *existing = dep.clone(),
                None => deps.push(dep.clone()),
            }
        }
        deps
    }

    /// Semver version plus containment of every declared path.
    ///
    /// Paths containing template expressions are only checked after
    /// rendering, by the generator.
    pub fn validate(&self) -> Result<(), DomainError> {
        let invalid = |reason: String| DomainError::InvalidModuleManifest {
            module: self.name.clone(),
            reason,
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name must not be empty".into()));
        }

        semver::Version::parse(&self.version).map_err(|e| DomainError::InvalidVersion {
            version: self.version.clone(),
            reason: e.to_string(),
        })?;

        let vendor = &self.generation.vendor;
        if !vendor.root.trim().is_empty() && !is_templated(&vendor.root) {
            RelativePath::try_new(&vendor.root)?;
        }
        for file in &vendor.files {
            RelativePath::try_new(&file.template)?;
            if !is_templated(&vendor.root) && !is_templated(&file.relative) {
                join_contained(&vendor.root, &file.relative)?;
            }
        }

        for (variant, spec) in &self.generation.variants {
            for file in &spec.files {
                if file.template.trim().is_empty() || file.output.trim().is_empty() {
                    return Err(invalid(format!(
                        "variant '{variant}' has a file without template or output"
                    )));
                }
                RelativePath::try_new(&file.template)?;
                if !is_templated(&file.output) {
                    RelativePath::try_new(&file.output)?;
                }
            }
        }

        if let Some(config) = self.snippets_config() {
            RelativePath::try_new(config)?;
        }

        self.variables.validate_defaults()
    }
}

/// Whether a manifest path still carries template syntax.
pub fn is_templated(raw: &str) -> bool {
    raw.contains("{{") || raw.contains("{%")
}
