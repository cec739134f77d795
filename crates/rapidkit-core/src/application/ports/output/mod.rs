//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the application needs from external systems.
//! The `rapidkit-adapters` crate provides implementations.

use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::domain::{
    KitManifest, ModuleManifest, ProfileConfig, RenderContext, Snippet, VariableDef,
    VariableSchema,
};
use crate::error::RapidkitResult;

/// Port for filesystem operations.
///
/// Implemented by:
/// - `rapidkit_adapters::filesystem::LocalFilesystem` (production)
/// - `rapidkit_adapters::filesystem::MemoryFilesystem` (dry runs, tests)
///
/// Paths handed to this port are already resolved under the output root;
/// containment is checked before they get here.
pub trait Filesystem: Send + Sync {
    /// Create a directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> RapidkitResult<()>;

    /// Write content to a file, replacing it whole (temp file + rename
    /// where the backend supports it).
    fn write_file(&self, path: &Path, content: &str) -> RapidkitResult<()>;

    /// Read a whole file.
    fn read_to_string(&self, path: &Path) -> RapidkitResult<String>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Whether a directory has no entries. Missing directories count as empty.
    fn is_dir_empty(&self, path: &Path) -> RapidkitResult<bool>;

    /// Remove a directory and all contents.
    fn remove_dir_all(&self, path: &Path) -> RapidkitResult<()>;
}

/// Port for template rendering.
///
/// Rendering is a pure function of template text and context; the only I/O
/// allowed is reading the named template file. Undefined variables are
/// errors, never empty substitutions.
#[cfg_attr(test, mockall::automock)]
pub trait TemplateRenderer: Send + Sync {
    /// Render the template file at `template_path`.
    fn render_file(&self, template_path: &Path, context: &RenderContext) -> RapidkitResult<String>;

    /// Render an inline template (paths, short strings).
    fn render_str(&self, name: &str, source: &str, context: &RenderContext)
    -> RapidkitResult<String>;
}

/// Port for kit discovery.
pub trait KitSource: Send + Sync {
    /// Every loadable kit manifest. Invalid kits are skipped by the source.
    fn kit_manifests(&self) -> RapidkitResult<Vec<KitManifest>>;

    /// Catalog-provided shared defaults, if any.
    fn shared_variables(&self) -> RapidkitResult<Option<VariableSchema>>;

    /// Profile inheritance configuration; empty when none is shipped.
    fn profile_config(&self) -> RapidkitResult<ProfileConfig>;
}

/// Port for module manifests, templates and snippets.
pub trait ModuleSource: Send + Sync {
    fn load_manifest(&self, module: &str) -> RapidkitResult<ModuleManifest>;

    /// Directory template paths of `module` are relative to.
    fn templates_root(&self, module: &str) -> RapidkitResult<PathBuf>;

    /// Snippets declared in `config` (relative to the module directory).
    fn load_snippets(&self, module: &str, config: &str) -> RapidkitResult<Vec<Snippet>>;

    /// Every module in the catalog, sorted.
    fn list_modules(&self) -> RapidkitResult<Vec<String>>;
}

/// Port for filling in variables interactively.
pub trait VariablePrompt {
    fn prompt(&self, name: &str, definition: &VariableDef) -> RapidkitResult<Value>;
}

impl<F> VariablePrompt for F
where
    F: Fn(&str, &VariableDef) -> RapidkitResult<Value>,
{
    fn prompt(&self, name: &str, definition: &VariableDef) -> RapidkitResult<Value> {
        self(name, definition)
    }
}
