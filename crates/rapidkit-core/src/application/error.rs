//! Application layer errors.
//!
//! These errors represent failures in orchestration, not business logic.
//! Business logic errors are `DomainError` from `crate::domain`.

use std::path::PathBuf;
use thiserror::Error;

use crate::error::{ErrorCategory, RapidkitError};

/// Errors that occur during application orchestration.
#[derive(Debug, Error, Clone)]
pub enum ApplicationError {
    #[error("Kit not found: {name}")]
    KitNotFound { name: String, suggestions: Vec<String> },

    #[error("Module not found: {name}")]
    ModuleNotFound { name: String },

    #[error("Module '{module}' has no variant '{variant}' (available: {})", .available.join(", "))]
    UnknownVariant {
        module: String,
        variant: String,
        available: Vec<String>,
    },

    #[error("Missing required variables: {}", .names.join(", "))]
    VariableMissing { names: Vec<String> },

    /// Template rendering failed (undefined variable, syntax).
    #[error("Template '{template}' failed to render: {reason}")]
    Template { template: String, reason: String },

    #[error("Output directory {} exists and is not empty", .path.display())]
    OutputExists { path: PathBuf },

    #[error("Filesystem error at {}: {reason}", .path.display())]
    Filesystem { path: PathBuf, reason: String },

    /// The catalog (kits, modules, shared variables) could not be read.
    #[error("Catalog error: {reason}")]
    Catalog { reason: String },

    /// A module failed; carries which module and, when known, which file.
    #[error("Module '{module}' failed{}: {source}", describe_file(.file))]
    Generator {
        module: String,
        file: Option<PathBuf>,
        source: Box<RapidkitError>,
    },
}

fn describe_file(file: &Option<PathBuf>) -> String {
    file.as_ref()
        .map(|f| format!(" at {}", f.display()))
        .unwrap_or_default()
}

impl ApplicationError {
    /// Wrap `source` with module/file context, without double wrapping.
    pub fn generator(
        module: impl Into<String>,
        file: Option<PathBuf>,
        source: RapidkitError,
    ) -> RapidkitError {
        match source {
            already @ RapidkitError::Application(ApplicationError::Generator { .. }) => already,
            unknown @ RapidkitError::Application(ApplicationError::UnknownVariant { .. }) => {
                unknown
            }
            other => ApplicationError::Generator {
                module: module.into(),
                file,
                source: Box::new(other),
            }
            .into(),
        }
    }

    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::KitNotFound { suggestions, .. } => {
                let mut out: Vec<String> = suggestions
                    .iter()
                    .map(|s| format!("Did you mean '{s}'?"))
                    .collect();
                out.push("Run `rapidkit list` to see available kits".into());
                out
            }
            Self::ModuleNotFound { .. } => {
                vec!["Run `rapidkit list --modules` to see available modules".into()]
            }
            Self::UnknownVariant { available, .. } => vec![format!(
                "Pick one of: {}",
                available.join(", ")
            )],
            Self::VariableMissing { names } => names
                .iter()
                .map(|n| format!("Pass --var {n}=<value>, or use --interactive"))
                .collect(),
            Self::Template { template, .. } => vec![
                format!("Check the template {template}"),
                "Every variable a template uses must be defined by the kit or module".into(),
            ],
            Self::OutputExists { path } => vec![
                format!("Directory already exists: {}", path.display()),
                "Use --force to overwrite (destructive)".into(),
                "Choose a different output directory".into(),
            ],
            Self::Filesystem { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Check that you have write permissions".into(),
            ],
            Self::Catalog { .. } => vec![
                "Check the catalog path (--catalog or catalog.path in the config file)".into(),
            ],
            Self::Generator { source, .. } => source.suggestions(),
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::KitNotFound { .. } | Self::ModuleNotFound { .. } => ErrorCategory::NotFound,
            Self::UnknownVariant { .. } | Self::VariableMissing { .. } => {
                ErrorCategory::Configuration
            }
            Self::Catalog { .. } => ErrorCategory::Configuration,
            Self::OutputExists { .. } => ErrorCategory::Validation,
            Self::Template { .. } | Self::Filesystem { .. } => ErrorCategory::Internal,
            Self::Generator { source, .. } => source.category(),
        }
    }
}
