//! Dependency manifests: poetry `pyproject.toml`, flat `requirements.txt`
//! and node `package.json`.
//!
//! Every manifest is partitioned the same way: a user-owned *base* and a
//! tool-owned *injected* part. Tool updates only ever add to the injected
//! part; base entries win every conflict.

use serde_json::{Map, Value};

use crate::domain::error::DomainError;
use crate::domain::module::DependencySpec;
use crate::domain::snippet::{self, SnippetSyntax};

pub const POETRY_DEPENDENCIES_HEADER: &str = "[tool.poetry.dependencies]";
pub const DEPENDENCIES_ANCHOR: &str = "# <<<inject:module-dependencies>>>";
pub(crate) const DEPENDENCIES_MARKER: &str = "<<<inject:module-dependencies>>>";

/// One requirement as read from (or destined for) a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub name: String,
    /// Poetry-style spec: `^1.2.3`, `~1.2`, `1.2.3`, `>=1,<2`, `*`.
    pub spec: String,
    pub extras: Vec<String>,
}

impl Requirement {
    pub fn new(name: impl Into<String>, spec: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            spec: spec.into(),
            extras: Vec::new(),
        }
    }

    /// The interpreter constraint, never a package.
    pub fn is_python(&self) -> bool {
        self.name.eq_ignore_ascii_case("python")
    }

    /// `name = "spec"` or `name = { version = "spec", extras = [...] }`.
    pub fn to_poetry_line(&self) -> String {
        let spec = toml_string(&self.spec);
        if self.extras.is_empty() {
            format!("{} = {spec}", self.name)
        } else {
            let extras: Vec<String> = self.extras.iter().map(|e| toml_string(e)).collect();
            format!(
                "{} = {{ version = {spec}, extras = [{}] }}",
                self.name,
                extras.join(", ")
            )
        }
    }

    /// `requirements.txt` form; `None` for the python constraint.
    pub fn to_requirement_line(&self) -> Option<String> {
        if self.is_python() {
            return None;
        }
        let extras = if self.extras.is_empty() {
            String::new()
        } else {
            format!("[{}]", self.extras.join(","))
        };
        Some(format!(
            "{}{extras}{}",
            self.name,
            to_requirement_spec(&self.spec)
        ))
    }
}

impl From<&DependencySpec> for Requirement {
    fn from(dep: &DependencySpec) -> Self {
        Self {
            name: dep.name.clone(),
            spec: dep.version_spec.clone(),
            extras: dep.extras.clone(),
        }
    }
}

fn toml_string(s: &str) -> String {
    toml::Value::String(s.to_string()).to_string()
}

/// The `[tool.poetry.dependencies]` table, split at the anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependenciesSection {
    pub header: String,
    pub base: Vec<Requirement>,
    pub injected: Vec<Requirement>,
}

/// Parse the poetry dependencies table.
///
/// Entries after the anchor belong to the injected block until the next
/// blank line; anything else in the section is base. Returns `None` when
/// the section is absent.
pub fn parse_dependencies_section(text: &str) -> Option<DependenciesSection> {
    let mut lines = text.lines();
    let header = lines
        .by_ref()
        .find(|l| l.trim() == POETRY_DEPENDENCIES_HEADER)?
        .trim()
        .to_string();

    let mut section = DependenciesSection {
        header,
        base: Vec::new(),
        injected: Vec::new(),
    };
    let mut in_injected = false;

    for line in lines {
        let t = line.trim();
        if t.starts_with('[') {
            break;
        }
        if t.contains(DEPENDENCIES_MARKER) {
            in_injected = true;
            continue;
        }
        if t.is_empty() {
            in_injected = false;
            continue;
        }
        if t.starts_with('#') {
            continue;
        }
        if let Some(req) = parse_requirement_line(t) {
            if in_injected {
                section.injected.push(req);
            } else {
                section.base.push(req);
            }
        }
    }

    Some(section)
}

/// Parse one `name = <spec | inline table>` line.
pub fn parse_requirement_line(line: &str) -> Option<Requirement> {
    let table: toml::Table = toml::from_str(line).ok()?;
    let (name, value) = table.into_iter().next()?;

    let (spec, extras) = match value {
        toml::Value::String(s) => (s, Vec::new()),
        toml::Value::Table(t) => {
            let spec = t
                .get("version")
                .and_then(toml::Value::as_str)
                .unwrap_or("*")
                .to_string();
            let extras = t
                .get("extras")
                .and_then(toml::Value::as_array)
                .map(|a| {
                    a.iter()
                        .filter_map(toml::Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            (spec, extras)
        }
        other => (other.to_string(), Vec::new()),
    };

    Some(Requirement { name, spec, extras })
}

fn numeric_parts(version: &str) -> Option<Vec<u64>> {
    version
        .split('.')
        .map(|p| p.trim().parse::<u64>().ok())
        .collect()
}

/// Translate a caret spec into an explicit range.
///
/// `^X.Y.Z` (X>0) → `>=X.Y.Z,<{X+1}.0`; `^0.Y.Z` (Y>0) → `>=0.Y.Z,<0.{Y+1}.0`;
/// `^0.0.Z` → `>=0.0.Z,<0.0.{Z+1}`. Anything else passes through, as does
/// a component too large to bump.
pub fn caret_to_range(spec: &str) -> String {
    let trimmed = spec.trim();
    let Some(version) = trimmed.strip_prefix('^') else {
        return spec.to_string();
    };
    let version = version.trim();
    let Some(parts) = numeric_parts(version) else {
        return spec.to_string();
    };

    let upper = match parts.as_slice() {
        [x, ..] if *x > 0 => x.checked_add(1).map(|x| format!("{x}.0")),
        [0] => Some("1.0".to_string()),
        [0, y, ..] if *y > 0 => y.checked_add(1).map(|y| format!("0.{y}.0")),
        [0, 0] => Some("0.1.0".to_string()),
        [0, 0, z, ..] => z.checked_add(1).map(|z| format!("0.0.{z}")),
        _ => None,
    };

    match upper {
        Some(upper) => format!(">={version},<{upper}"),
        None => spec.to_string(),
    }
}

/// Translate a poetry tilde spec: `~X.Y.Z` → `>=X.Y.Z,<X.{Y+1}.0`.
/// `~=` (PEP 440) passes through.
pub fn tilde_to_range(spec: &str) -> String {
    let trimmed = spec.trim();
    if trimmed.starts_with("~=") {
        return spec.to_string();
    }
    let Some(version) = trimmed.strip_prefix('~') else {
        return spec.to_string();
    };
    let version = version.trim();
    let Some(parts) = numeric_parts(version) else {
        return spec.to_string();
    };

    let upper = match parts.as_slice() {
        [x] => x.checked_add(1).map(|x| format!("{x}.0")),
        [x, y, ..] => y.checked_add(1).map(|y| format!("{x}.{y}.0")),
        [] => None,
    };

    match upper {
        Some(upper) => format!(">={version},<{upper}"),
        None => spec.to_string(),
    }
}

/// Poetry spec → PEP 508 version clause.
pub fn to_requirement_spec(spec: &str) -> String {
    let s = spec.trim();
    if s.is_empty() || s == "*" {
        return String::new();
    }
    if s.starts_with('^') {
        return caret_to_range(s);
    }
    if s.starts_with('~') && !s.starts_with("~=") {
        return tilde_to_range(s);
    }
    if s.starts_with(|c: char| c.is_ascii_digit()) {
        return format!("=={s}");
    }
    s.to_string()
}

/// Requirement lines for both blocks; the python constraint is dropped.
pub fn format_requirements_lines(
    base: &[Requirement],
    injected: &[Requirement],
) -> (Vec<String>, Vec<String>) {
    let lines = |reqs: &[Requirement]| {
        reqs.iter()
            .filter_map(Requirement::to_requirement_line)
            .collect::<Vec<_>>()
    };
    (lines(base), lines(injected))
}

/// Full `requirements.txt` content: base, anchor, injected.
pub fn render_requirements(section: &DependenciesSection) -> String {
    let (base, injected) = format_requirements_lines(&section.base, &section.injected);
    let mut out: Vec<&str> = base.iter().map(String::as_str).collect();
    out.push(DEPENDENCIES_ANCHOR);
    out.extend(injected.iter().map(String::as_str));
    let mut content = out.join("\n");
    content.push('\n');
    content
}

/// Make sure the dependencies table and its anchor exist.
///
/// A missing table is appended; a missing anchor goes after the table's
/// last entry.
pub fn ensure_dependencies_anchor(text: &str) -> String {
    snippet::ensure_table_anchor(
        text,
        POETRY_DEPENDENCIES_HEADER,
        DEPENDENCIES_MARKER,
        DEPENDENCIES_ANCHOR,
    )
}

/// Merge a poetry dependency snippet into a pyproject document.
///
/// Base keys keep their spec, new keys land under the anchor, and the
/// section header plus anchor are present in the result. The `python`
/// entry is never injected.
pub fn update_poetry_dependencies(existing: &str, snippet: &str) -> Result<String, DomainError> {
    let prepared = ensure_dependencies_anchor(existing);
    let filtered: Vec<&str> = snippet
        .lines()
        .filter(|l| {
            SnippetSyntax::Toml
                .record_key(l)
                .is_none_or(|k| !k.eq_ignore_ascii_case("python"))
        })
        .collect();

    snippet::inject(
        &prepared,
        &filtered.join("\n"),
        DEPENDENCIES_ANCHOR,
        SnippetSyntax::Toml,
        None,
        "pyproject.toml",
    )
}

/// Poetry snippet text for a list of requirements.
pub fn poetry_snippet(requirements: &[Requirement]) -> String {
    requirements
        .iter()
        .filter(|r| !r.is_python())
        .map(Requirement::to_poetry_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Merge requirements into a `package.json` document.
///
/// Base entries are user-declared dependencies; the tool records the names
/// it added under `rapidkit.injected.dependencies`. Key order is kept.
pub fn update_package_json(
    existing: Option<&str>,
    requirements: &[Requirement],
) -> Result<String, DomainError> {
    let damaged = |reason: String| DomainError::DamagedTarget {
        target: "package.json".to_string(),
        reason,
    };

    let mut root: Value = match existing {
        Some(text) if !text.trim().is_empty() => {
            serde_json::from_str(text).map_err(|e| damaged(e.to_string()))?
        }
        _ => Value::Object(Map::new()),
    };
    let doc = root
        .as_object_mut()
        .ok_or_else(|| damaged("top level is not an object".into()))?;

    let mut injected: Vec<String> = doc
        .get("rapidkit")
        .and_then(|r| r.pointer("/injected/dependencies"))
        .and_then(Value::as_array)
        .map(|a| a.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default();

    let deps = doc
        .entry("dependencies")
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| damaged("`dependencies` is not an object".into()))?;

    for req in requirements.iter().filter(|r| !r.is_python()) {
        // present already: user-owned, or injected by an earlier run
        if deps.contains_key(&req.name) {
            continue;
        }
        deps.insert(req.name.clone(), Value::String(req.spec.clone()));
        if !injected.contains(&req.name) {
            injected.push(req.name.clone());
        }
    }

    if !injected.is_empty() {
        let meta = doc
            .entry("rapidkit")
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()
            .ok_or_else(|| damaged("`rapidkit` is not an object".into()))?;
        let slot = meta
            .entry("injected")
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()
            .ok_or_else(|| damaged("`rapidkit.injected` is not an object".into()))?;
        slot.insert(
            "dependencies".to_string(),
            Value::Array(injected.into_iter().map(Value::String).collect()),
        );
    }

    let mut content =
        serde_json::to_string_pretty(&root).map_err(|e| damaged(e.to_string()))?;
    content.push('\n');
    Ok(content)
}
