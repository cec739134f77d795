// ============================================================================
// domain/error.rs - DOMAIN ERRORS
// ============================================================================

use thiserror::Error;

/// Root domain error type.
///
/// All errors are:
/// - Cloneable (reports carry them around)
/// - Categorizable (for CLI display)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Manifest Errors
    // ========================================================================
    #[error("Invalid module manifest '{module}': {reason}")]
    InvalidModuleManifest { module: String, reason: String },

    #[error("Invalid kit manifest '{kit}': {reason}")]
    InvalidKitManifest { kit: String, reason: String },

    #[error("Invalid version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },

    // ========================================================================
    // Variable Errors
    // ========================================================================
    #[error("Variable '{name}' is invalid: {reason}")]
    InvalidVariable { name: String, reason: String },

    // ========================================================================
    // Path Errors
    // ========================================================================
    #[error("Absolute paths not allowed: {path}")]
    AbsolutePathNotAllowed { path: String },

    #[error("Path escapes the output root: {path}")]
    PathEscapesRoot { path: String },

    // ========================================================================
    // Snippet / Manifest Structure Errors
    // ========================================================================
    #[error("Anchor '{anchor}' appears {count} times in {target}")]
    DuplicateAnchor {
        anchor: String,
        target: String,
        count: usize,
    },

    #[error("Target {target} is structurally damaged: {reason}")]
    DamagedTarget { target: String, reason: String },
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidModuleManifest { module, .. } => vec![
                format!("Check modules/{module}/module.yaml"),
                "Every variant's files need both `template` and `output`".into(),
            ],
            Self::InvalidKitManifest { kit, .. } => vec![
                format!("Check the kit.yaml for '{kit}'"),
                "Kit names must be unique and non-empty".into(),
            ],
            Self::InvalidVersion { .. } => {
                vec!["Versions must follow semantic versioning, e.g. 1.2.3".into()]
            }
            Self::InvalidVariable { name, .. } => vec![
                format!("Check the value given for '{name}'"),
                "Use `rapidkit info <kit>` to list variable types and choices".into(),
            ],
            Self::AbsolutePathNotAllowed { .. } | Self::PathEscapesRoot { .. } => vec![
                "Generated paths must be relative to the project root".into(),
                "Remove leading '/' and '..' segments from the manifest".into(),
            ],
            Self::DuplicateAnchor { anchor, target, .. } => vec![
                format!("Keep a single '{anchor}' line in {target}"),
            ],
            Self::DamagedTarget { target, .. } => vec![
                format!("Repair {target} by hand, then re-run"),
            ],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidModuleManifest { .. }
            | Self::InvalidKitManifest { .. }
            | Self::InvalidVersion { .. } => ErrorCategory::Manifest,
            Self::InvalidVariable { .. } => ErrorCategory::Validation,
            Self::AbsolutePathNotAllowed { .. } | Self::PathEscapesRoot { .. } => {
                ErrorCategory::Validation
            }
            Self::DuplicateAnchor { .. } | Self::DamagedTarget { .. } => ErrorCategory::Internal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Manifest,
    Internal,
}
