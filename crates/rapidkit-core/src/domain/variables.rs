//! Variable schemas and the shared-default merge.
//!
//! A [`VariableDef`] keeps every field optional so that a kit can override a
//! single field of a shared entry (say, only the `default`) without
//! restating the rest. [`merge_variables`] superimposes those overrides.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::domain::error::DomainError;
use crate::domain::value_objects::VariableType;

/// One schema entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableDef {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub var_type: Option<VariableType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_var: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
}

impl VariableDef {
    pub fn string() -> Self {
        Self {
            var_type: Some(VariableType::String),
            ..Self::default()
        }
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Field-by-field overlay: every field set on `other` wins.
    pub fn overlay(&self, other: &VariableDef) -> VariableDef {
        VariableDef {
            var_type: other.var_type.or(self.var_type),
            default: other.default.clone().or_else(|| self.default.clone()),
            choices: other.choices.clone().or_else(|| self.choices.clone()),
            description: other
                .description
                .clone()
                .or_else(|| self.description.clone()),
            env_var: other.env_var.clone().or_else(|| self.env_var.clone()),
            required: other.required.or(self.required),
        }
    }

    /// Effective type: declared, else inferred from choices or default.
    pub fn kind(&self) -> VariableType {
        if let Some(t) = self.var_type {
            return t;
        }
        if self.choices.is_some() {
            return VariableType::Choice;
        }
        match &self.default {
            Some(Value::Bool(_)) => VariableType::Bool,
            Some(Value::Number(n)) if n.is_i64() || n.is_u64() => VariableType::Int,
            _ => VariableType::String,
        }
    }

    /// A variable needs a caller-supplied value when it has no default,
    /// unless it is explicitly marked optional.
    pub fn needs_value(&self) -> bool {
        let has_default = matches!(&self.default, Some(v) if !v.is_null());
        !has_default && self.required != Some(false)
    }

    /// Check a value against the declared type and choices.
    pub fn validate_value(&self, name: &str, value: &Value) -> Result<(), DomainError> {
        let invalid = |reason: String| DomainError::InvalidVariable {
            name: name.to_string(),
            reason,
        };

        match self.kind() {
            VariableType::String if !value.is_string() => {
                return Err(invalid(format!("expected a string, got {value}")));
            }
            VariableType::Int if !(value.is_i64() || value.is_u64()) => {
                return Err(invalid(format!("expected an integer, got {value}")));
            }
            VariableType::Bool if !value.is_boolean() => {
                return Err(invalid(format!("expected true or false, got {value}")));
            }
            _ => {}
        }

        if let Some(choices) = &self.choices {
            if !choices.contains(value) {
                let allowed: Vec<String> = choices.iter().map(display_value).collect();
                return Err(invalid(format!(
                    "{} is not one of: {}",
                    display_value(value),
                    allowed.join(", ")
                )));
            }
        }

        Ok(())
    }

    /// Coerce a raw string (CLI `--var`, prompt answer, environment) into
    /// this variable's type.
    pub fn coerce(&self, raw: &str) -> Value {
        let declared = self.var_type.or_else(|| match self.kind() {
            VariableType::String => None,
            other => Some(other),
        });
        coerce_env_value(raw, declared)
    }
}

/// Ordered mapping of variable name to definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableSchema(IndexMap<String, VariableDef>);

impl VariableSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, def: VariableDef) {
        self.0.insert(name.into(), def);
    }

    pub fn with(mut self, name: impl Into<String>, def: VariableDef) -> Self {
        self.insert(name, def);
        self
    }

    pub fn get(&self, name: &str) -> Option<&VariableDef> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &VariableDef)> {
        self.0.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Superimpose `self` over `base`: base order first, new names after.
    pub fn merged_over(&self, base: &VariableSchema) -> VariableSchema {
        let mut merged = base.0.clone();
        for (name, def) in &self.0 {
            let entry = match merged.get(name) {
                Some(existing) => existing.overlay(def),
                None => def.clone(),
            };
            merged.insert(name.clone(), entry);
        }
        VariableSchema(merged)
    }

    /// Non-null defaults, keyed by name.
    pub fn defaults(&self) -> BTreeMap<String, Value> {
        self.0
            .iter()
            .filter_map(|(name, def)| match &def.default {
                Some(v) if !v.is_null() => Some((name.clone(), v.clone())),
                _ => None,
            })
            .collect()
    }

    /// Names that still lack a value once `provided` is applied.
    pub fn missing(&self, provided: &BTreeMap<String, Value>) -> Vec<String> {
        self.0
            .iter()
            .filter(|(name, def)| def.needs_value() && !provided.contains_key(*name))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Coerce string values bound to int or bool declarations; other
    /// values pass through.
    pub fn coerce_values(&self, values: &BTreeMap<String, Value>) -> BTreeMap<String, Value> {
        values
            .iter()
            .map(|(name, value)| {
                let coerced = match (self.get(name), value) {
                    (Some(def), Value::String(raw))
                        if matches!(def.kind(), VariableType::Int | VariableType::Bool) =>
                    {
                        def.coerce(raw)
                    }
                    _ => value.clone(),
                };
                (name.clone(), coerced)
            })
            .collect()
    }

    /// Every declared default must satisfy its own type and choices.
    pub fn validate_defaults(&self) -> Result<(), DomainError> {
        for (name, def) in &self.0 {
            match &def.default {
                Some(default) if !default.is_null() => def.validate_value(name, default)?,
                _ => {}
            }
        }
        Ok(())
    }
}

impl FromIterator<(String, VariableDef)> for VariableSchema {
    fn from_iter<I: IntoIterator<Item = (String, VariableDef)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Built-in shared defaults, used when a catalog ships none of its own.
pub fn shared_defaults() -> VariableSchema {
    VariableSchema::new()
        .with(
            "project_name",
            VariableDef {
                required: Some(true),
                ..VariableDef::string()
            }
            .with_description("Name of the generated project"),
        )
        .with(
            "author",
            VariableDef::string()
                .with_default("RapidKit User")
                .with_description("Project author"),
        )
        .with(
            "description",
            VariableDef::string()
                .with_default("")
                .with_description("Short project description"),
        )
        .with(
            "license",
            VariableDef {
                var_type: Some(VariableType::Choice),
                choices: Some(
                    ["MIT", "Apache-2.0", "BSD-3-Clause", "GPL-3.0", "Proprietary"]
                        .into_iter()
                        .map(Value::from)
                        .collect(),
                ),
                ..VariableDef::default()
            }
            .with_default("MIT")
            .with_description("Project license"),
        )
        .with(
            "include_logging",
            VariableDef {
                var_type: Some(VariableType::Bool),
                ..VariableDef::default()
            }
            .with_default(true)
            .with_description("Wire structured logging into the project"),
        )
}

/// Union of `shared` and `kit_vars`; kit entries override field by field.
pub fn merge_variables(shared: &VariableSchema, kit_vars: &VariableSchema) -> VariableSchema {
    kit_vars.merged_over(shared)
}

/// Typed coercion shared by environment overrides and string inputs.
///
/// - `Bool`: `"true"`/`"1"` (any case) is true, anything else false
/// - `Int`: decimal digits (optionally signed) parse, anything else stays a string
/// - no declared type: the shape of the value decides
pub fn coerce_env_value(raw: &str, declared: Option<VariableType>) -> Value {
    let trimmed = raw.trim();
    match declared {
        Some(VariableType::Bool) => {
            Value::Bool(matches!(trimmed.to_ascii_lowercase().as_str(), "true" | "1"))
        }
        Some(VariableType::Int) => parse_decimal(trimmed)
            .map(Value::from)
            .unwrap_or_else(|| Value::String(raw.to_string())),
        Some(VariableType::String) | Some(VariableType::Choice) => Value::String(raw.to_string()),
        None => match trimmed.to_ascii_lowercase().as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => parse_decimal(trimmed)
                .map(Value::from)
                .unwrap_or_else(|| Value::String(raw.to_string())),
        },
    }
}

fn parse_decimal(s: &str) -> Option<i64> {
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Human rendering of a JSON value without quotes around strings.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
