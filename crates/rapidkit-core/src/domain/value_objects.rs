//! Domain value objects: Ecosystem, VariableType, ModuleStatus, ModuleAccess.
//!
//! # Design
//!
//! These are pure value types with equality-by-value and no identity. This
//! file defines the types, their string representations, and their
//! `FromStr` parsers. Behaviour that needs more than a string lives with the
//! entity that owns it.

use crate::domain::error::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ── Ecosystem ────────────────────────────────────────────────────────────────

/// The package ecosystem a kit targets.
///
/// Decides which dependency manifest module dependencies are synchronized
/// into: `pyproject.toml` (+ `requirements.txt`) or `package.json`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    #[default]
    Python,
    Node,
}

impl Ecosystem {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Node => "node",
        }
    }

    /// The structured dependency manifest for this ecosystem.
    pub const fn manifest_file(&self) -> &'static str {
        match self {
            Self::Python => "pyproject.toml",
            Self::Node => "package.json",
        }
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Ecosystem {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "python" | "py" | "poetry" => Ok(Self::Python),
            "node" | "nodejs" | "typescript" | "ts" => Ok(Self::Node),
            other => Err(DomainError::InvalidKitManifest {
                kit: String::new(),
                reason: format!("unknown ecosystem: {other}"),
            }),
        }
    }
}

// ── VariableType ─────────────────────────────────────────────────────────────

/// Declared type of a schema variable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    #[default]
    String,
    Int,
    Bool,
    Choice,
}

impl VariableType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Bool => "bool",
            Self::Choice => "choice",
        }
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VariableType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "string" | "str" => Ok(Self::String),
            "int" | "integer" => Ok(Self::Int),
            "bool" | "boolean" => Ok(Self::Bool),
            "choice" | "enum" => Ok(Self::Choice),
            other => Err(DomainError::InvalidVariable {
                name: String::new(),
                reason: format!("unknown variable type: {other}"),
            }),
        }
    }
}

// ── ModuleStatus ─────────────────────────────────────────────────────────────

/// Lifecycle status of a module. Unknown statuses are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ModuleStatus {
    Active,
    Stable,
    Beta,
    Experimental,
    Deprecated,
    Other(String),
}

impl ModuleStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "active",
            Self::Stable => "stable",
            Self::Beta => "beta",
            Self::Experimental => "experimental",
            Self::Deprecated => "deprecated",
            Self::Other(s) => s,
        }
    }
}

impl Default for ModuleStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl From<String> for ModuleStatus {
    fn from(s: String) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "active" => Self::Active,
            "stable" => Self::Stable,
            "beta" => Self::Beta,
            "experimental" => Self::Experimental,
            "deprecated" => Self::Deprecated,
            _ => Self::Other(s),
        }
    }
}

impl From<ModuleStatus> for String {
    fn from(s: ModuleStatus) -> Self {
        s.as_str().to_string()
    }
}

impl fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── ModuleAccess ─────────────────────────────────────────────────────────────

/// Distribution tier of a module. Unknown tiers are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ModuleAccess {
    Free,
    Pro,
    Other(String),
}

impl ModuleAccess {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Free => "free",
            Self::Pro => "pro",
            Self::Other(s) => s,
        }
    }
}

impl Default for ModuleAccess {
    fn default() -> Self {
        Self::Free
    }
}

impl From<String> for ModuleAccess {
    fn from(s: String) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "free" => Self::Free,
            "pro" | "premium" => Self::Pro,
            _ => Self::Other(s),
        }
    }
}

impl From<ModuleAccess> for String {
    fn from(a: ModuleAccess) -> Self {
        a.as_str().to_string()
    }
}

impl fmt::Display for ModuleAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ecosystem_parses_aliases() {
        assert_eq!(Ecosystem::from_str("Python").unwrap(), Ecosystem::Python);
        assert_eq!(Ecosystem::from_str("nodejs").unwrap(), Ecosystem::Node);
        assert!(Ecosystem::from_str("cobol").is_err());
    }

    #[test]
    fn ecosystem_manifest_files() {
        assert_eq!(Ecosystem::Python.manifest_file(), "pyproject.toml");
        assert_eq!(Ecosystem::Node.manifest_file(), "package.json");
    }

    #[test]
    fn variable_type_parses() {
        assert_eq!(VariableType::from_str("boolean").unwrap(), VariableType::Bool);
        assert_eq!(VariableType::from_str("INT").unwrap(), VariableType::Int);
        assert!(VariableType::from_str("float").is_err());
    }

    #[test]
    fn unknown_status_is_preserved() {
        let status = ModuleStatus::from("incubating".to_string());
        assert_eq!(status, ModuleStatus::Other("incubating".into()));
        assert_eq!(status.to_string(), "incubating");
        assert_eq!(ModuleStatus::from("STABLE".to_string()), ModuleStatus::Stable);
    }

    #[test]
    fn access_round_trips_through_string() {
        assert_eq!(String::from(ModuleAccess::Free), "free");
        assert_eq!(ModuleAccess::from("premium".to_string()), ModuleAccess::Pro);
    }
}
