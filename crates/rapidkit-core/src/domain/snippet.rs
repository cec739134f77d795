//! Anchor-based snippet injection.
//!
//! A target file is treated as two regions separated by a single-line
//! anchor:
//!
//! ```text
//! <base>        user-owned, never rewritten
//! <anchor>      e.g. `# <<<inject:settings-fields>>>`
//! <injected>    tool-owned records, up to a blank line or section end
//! <tail>        user-owned, kept verbatim
//! ```
//!
//! Both the injected block and the incoming snippet are parsed into keyed
//! records, merged, and re-emitted. Applying the same snippet twice is a
//! fixed point.

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

use crate::domain::dependencies::{DEPENDENCIES_MARKER, POETRY_DEPENDENCIES_HEADER};
use crate::domain::error::DomainError;

/// One snippet definition from a module's snippets file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    #[serde(alias = "name")]
    pub id: String,

    /// Template path, relative to the module's templates root.
    pub template: String,

    pub anchor: String,

    /// Project-relative file the snippet is injected into.
    pub target: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SnippetSchema>,

    /// Variants this snippet applies to; empty means all.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Snippet {
    pub fn applies_to(&self, variant: &str) -> bool {
        self.variants.is_empty() || self.variants.iter().any(|v| v == variant)
    }

    pub fn syntax(&self) -> SnippetSyntax {
        SnippetSyntax::detect(&self.target)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnippetSchema {
    #[serde(default)]
    pub properties: IndexMap<String, Value>,

    #[serde(default)]
    pub required: Vec<String>,
}

impl SnippetSchema {
    fn declares(&self, key: &str) -> bool {
        self.properties.is_empty() || self.properties.contains_key(key)
    }
}

/// A module's `snippets.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnippetFile {
    #[serde(default)]
    pub snippets: Vec<Snippet>,
}

/// Record syntax of an injection target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnippetSyntax {
    /// `KEY=VALUE` lines (`.env`, `.env.example`, ...)
    Env,
    /// `key = value` pairs inside a TOML section
    Toml,
    /// `KEY: type = Field(...)` statements in a settings class
    Settings,
    /// Any other text; each line is its own key
    Plain,
}

impl SnippetSyntax {
    pub fn detect(target: &str) -> Self {
        let file_name = target.rsplit(['/', '\\']).next().unwrap_or(target);
        if file_name.starts_with(".env") {
            Self::Env
        } else if file_name.ends_with(".toml") {
            Self::Toml
        } else if file_name.ends_with(".py") {
            Self::Settings
        } else {
            Self::Plain
        }
    }

    /// Key of a record line; `None` for lines that carry no key.
    pub fn record_key(&self, line: &str) -> Option<String> {
        let t = line.trim();
        if t.is_empty() {
            return None;
        }
        if *self == Self::Plain {
            return Some(t.to_string());
        }
        if t.starts_with('#') {
            return None;
        }

        match self {
            Self::Env => {
                let t = t.strip_prefix("export ").unwrap_or(t);
                t.split_once('=')
                    .map(|(k, _)| k.trim())
                    .filter(|k| !k.is_empty())
                    .map(str::to_string)
            }
            Self::Toml => {
                if t.starts_with('[') {
                    return None;
                }
                t.split_once('=')
                    .map(|(k, _)| k.trim().trim_matches(|c| c == '"' || c == '\''))
                    .filter(|k| !k.is_empty())
                    .map(str::to_string)
            }
            Self::Settings => t
                .split_once(':')
                .map(|(k, _)| k.trim())
                .filter(|k| is_identifier(k))
                .map(str::to_string),
            Self::Plain => None,
        }
    }

    fn ends_block(&self, line: &str) -> bool {
        let t = line.trim();
        t.is_empty() || (*self == Self::Toml && is_toml_header(t))
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_toml_header(trimmed: &str) -> bool {
    trimmed.starts_with('[')
}

/// A parsed line: its key (if any) and the verbatim text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetRecord {
    pub key: Option<String>,
    pub line: String,
}

/// Parse non-blank lines into records.
pub fn parse_records(syntax: SnippetSyntax, text: &str) -> Vec<SnippetRecord> {
    text.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| SnippetRecord {
            key: syntax.record_key(l),
            line: l.to_string(),
        })
        .collect()
}

/// Strip the indentation common to every non-blank line.
fn dedent(text: &str) -> String {
    let common = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    text.lines()
        .map(|l| l.get(common..).unwrap_or_else(|| l.trim_start()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Merge existing injected records with a new snippet.
///
/// Existing records are kept, in order, when their key is declared by the
/// schema (all of them without one) or is re-declared by the snippet. New
/// records follow in declared order, skipping keys already kept and keys
/// owned by the base block. Keyless snippet lines (comments) are dropped.
pub fn merge_snippets(
    existing_injected: &[SnippetRecord],
    new_snippet: &[SnippetRecord],
    base_keys: &HashSet<String>,
    indent: &str,
    schema: Option<&SnippetSchema>,
) -> Vec<String> {
    let new_keys: HashSet<&str> = new_snippet
        .iter()
        .filter_map(|r| r.key.as_deref())
        .collect();

    let mut present: HashSet<String> = HashSet::new();
    let mut merged = Vec::new();

    for record in existing_injected {
        let keep = match record.key.as_deref() {
            None => true,
            Some(key) => {
                !base_keys.contains(key)
                    && (schema.is_none_or(|s| s.declares(key)) || new_keys.contains(key))
            }
        };
        if keep {
            if let Some(key) = &record.key {
                present.insert(key.clone());
            }
            merged.push(record.line.clone());
        }
    }

    for record in new_snippet {
        let Some(key) = &record.key else { continue };
        if base_keys.contains(key) || !present.insert(key.clone()) {
            continue;
        }
        merged.push(format!("{indent}{}", record.line.trim_end()));
    }

    merged
}

/// Outcome of [`validate_snippet_schema`]. Warnings never fail a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnippetValidation {
    pub valid: bool,
    pub warnings: Vec<String>,
}

const SETTINGS_FIELD: &str = r"^\s*[A-Za-z_][A-Za-z0-9_]*\s*:.*\bField\((?P<args>.*)\)";

/// Check a rendered snippet against its syntax and schema.
///
/// Env snippets always pass. Settings lines must read `KEY: ... Field(...)`
/// with arguments; TOML lines must be `key = value` pairs. Keys outside
/// `schema.properties` and missing `schema.required` keys only warn.
pub fn validate_snippet_schema(
    snippet: &str,
    syntax: SnippetSyntax,
    schema: Option<&SnippetSchema>,
) -> SnippetValidation {
    let mut report = SnippetValidation {
        valid: true,
        warnings: Vec::new(),
    };
    if syntax == SnippetSyntax::Env {
        return report;
    }

    let records = parse_records(syntax, snippet);

    match syntax {
        SnippetSyntax::Settings => match Regex::new(SETTINGS_FIELD) {
            Ok(pattern) => {
                for record in records.iter().filter(|r| !r.line.trim().starts_with('#')) {
                    let ok = pattern
                        .captures(&record.line)
                        .and_then(|c| c.name("args"))
                        .is_some_and(|args| !args.as_str().trim().is_empty());
                    if !ok {
                        report.valid = false;
                        report
                            .warnings
                            .push(format!("not a `KEY: Field(...)` statement: {}", record.line.trim()));
                    }
                }
            }
            Err(e) => {
                report.valid = false;
                report.warnings.push(format!("settings pattern failed to compile: {e}"));
            }
        },
        SnippetSyntax::Toml => {
            for record in records.iter().filter(|r| !r.line.trim().starts_with('#')) {
                let line = record.line.trim();
                let value_ok = line
                    .split_once('=')
                    .is_some_and(|(k, v)| !k.trim().is_empty() && !v.trim().is_empty());
                if !value_ok || toml::from_str::<toml::Table>(line).is_err() {
                    report.valid = false;
                    report.warnings.push(format!("not a `key = value` pair: {line}"));
                }
            }
        }
        SnippetSyntax::Env | SnippetSyntax::Plain => {}
    }

    if let Some(schema) = schema {
        let keys: HashSet<&str> = records.iter().filter_map(|r| r.key.as_deref()).collect();
        if !schema.properties.is_empty() && syntax != SnippetSyntax::Plain {
            for key in &keys {
                if !schema.properties.contains_key(*key) {
                    report
                        .warnings
                        .push(format!("key '{key}' is not declared in the snippet schema"));
                }
            }
        }
        for required in &schema.required {
            if !keys.contains(required.as_str()) {
                report
                    .warnings
                    .push(format!("required key '{required}' is missing from the snippet"));
            }
        }
    }

    report
}

struct Regions<'a> {
    head: Vec<&'a str>,
    anchor: Option<&'a str>,
    injected: Vec<&'a str>,
    tail: Vec<&'a str>,
}

fn split_regions<'a>(
    content: &'a str,
    anchor: &str,
    syntax: SnippetSyntax,
    target: &str,
) -> Result<Regions<'a>, DomainError> {
    let marker = anchor.trim();
    let lines: Vec<&str> = content.lines().collect();
    let hits: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| l.contains(marker))
        .map(|(i, _)| i)
        .collect();

    match hits.as_slice() {
        [] => Ok(Regions {
            head: lines,
            anchor: None,
            injected: Vec::new(),
            tail: Vec::new(),
        }),
        [at] => {
            let at = *at;
            let body = &lines[at + 1..];
            let end = body
                .iter()
                .position(|l| syntax.ends_block(l))
                .unwrap_or(body.len());
            Ok(Regions {
                head: lines[..at].to_vec(),
                anchor: Some(lines[at]),
                injected: body[..end].to_vec(),
                tail: body[end..].to_vec(),
            })
        }
        many => Err(DomainError::DuplicateAnchor {
            anchor: marker.to_string(),
            target: target.to_string(),
            count: many.len(),
        }),
    }
}

/// Keys owned by the user around the anchor.
///
/// For TOML only the anchor's host section counts, so same-named keys in
/// other tables never collide.
fn base_keys(regions: &Regions<'_>, syntax: SnippetSyntax) -> HashSet<String> {
    let (head, tail): (&[&str], &[&str]) = if syntax == SnippetSyntax::Toml {
        let section_start = regions
            .head
            .iter()
            .rposition(|l| is_toml_header(l.trim()))
            .map_or(0, |i| i + 1);
        let section_end = regions
            .tail
            .iter()
            .position(|l| is_toml_header(l.trim()))
            .unwrap_or(regions.tail.len());
        (
            &regions.head[section_start..],
            &regions.tail[..section_end],
        )
    } else {
        (regions.head.as_slice(), regions.tail.as_slice())
    };

    head.iter()
        .chain(tail.iter())
        .filter_map(|l| syntax.record_key(l))
        .collect()
}

/// Make sure `header`'s table exists and carries a line containing `marker`.
///
/// A missing table is appended with `anchor_line` as its only line. A
/// missing anchor goes after the table's last non-blank line.
pub fn ensure_table_anchor(text: &str, header: &str, marker: &str, anchor_line: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();

    let Some(header_at) = lines.iter().position(|l| l.trim() == header) else {
        let mut out = text.trim_end_matches('\n').to_string();
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str(header);
        out.push('\n');
        out.push_str(anchor_line);
        out.push('\n');
        return out;
    };

    let section_end = lines[header_at + 1..]
        .iter()
        .position(|l| is_toml_header(l.trim()))
        .map_or(lines.len(), |i| header_at + 1 + i);

    if lines[header_at..section_end].iter().any(|l| l.contains(marker)) {
        return text.to_string();
    }

    let insert_at = lines[header_at..section_end]
        .iter()
        .rposition(|l| !l.trim().is_empty())
        .map_or(header_at + 1, |i| header_at + i + 1);

    let mut out: Vec<&str> = lines;
    out.insert(insert_at, anchor_line);
    let mut content = out.join("\n");
    content.push('\n');
    content
}

/// Insert a missing anchor where its records belong.
///
/// - TOML: the module-dependencies anchor goes into the poetry dependencies
///   table (created when absent); any other anchor goes into the root table,
///   ahead of the first header.
/// - Settings: the anchor closes the body of the last top-level class,
///   indented like that body.
/// - Env and plain text: the anchor is appended after a blank line.
fn place_anchor(
    existing: &str,
    anchor: &str,
    syntax: SnippetSyntax,
    target: &str,
) -> Result<String, DomainError> {
    let marker = anchor.trim();
    let lines: Vec<&str> = existing.lines().collect();

    let (insert_at, line) = match syntax {
        SnippetSyntax::Toml if marker.contains(DEPENDENCIES_MARKER) => {
            return Ok(ensure_table_anchor(existing, POETRY_DEPENDENCIES_HEADER, marker, marker));
        }
        SnippetSyntax::Toml => {
            let root_end = lines
                .iter()
                .position(|l| is_toml_header(l.trim()))
                .unwrap_or(lines.len());
            let insert_at = lines[..root_end]
                .iter()
                .rposition(|l| !l.trim().is_empty())
                .map_or(0, |i| i + 1);
            (insert_at, marker.to_string())
        }
        SnippetSyntax::Settings => {
            let class_at = lines
                .iter()
                .rposition(|l| l.starts_with("class "))
                .ok_or_else(|| DomainError::DamagedTarget {
                    target: target.to_string(),
                    reason: format!("no class body to host anchor `{marker}`"),
                })?;
            let body_end = lines[class_at + 1..]
                .iter()
                .position(|l| !l.trim().is_empty() && !l.starts_with([' ', '\t']))
                .map_or(lines.len(), |i| class_at + 1 + i);
            let body = &lines[class_at + 1..body_end];
            let indent = body
                .iter()
                .find(|l| !l.trim().is_empty())
                .map_or("    ", |l| &l[..l.len() - l.trim_start().len()]);
            let insert_at = body
                .iter()
                .rposition(|l| !l.trim().is_empty())
                .map_or(class_at + 1, |i| class_at + 1 + i + 1);
            (insert_at, format!("{indent}{marker}"))
        }
        SnippetSyntax::Env | SnippetSyntax::Plain => {
            let mut out = existing.trim_end_matches('\n').to_string();
            if !out.is_empty() {
                out.push_str("\n\n");
            }
            out.push_str(marker);
            out.push('\n');
            return Ok(out);
        }
    };

    let mut out: Vec<&str> = lines[..insert_at].to_vec();
    out.push(&line);
    // The injected block must end before the user's next statement.
    if lines.get(insert_at).is_some_and(|l| !l.trim().is_empty()) {
        out.push("");
    }
    out.extend_from_slice(&lines[insert_at..]);
    let mut content = out.join("\n");
    content.push('\n');
    Ok(content)
}

/// Inject `snippet` under `anchor` in `existing` and return the new content.
///
/// A missing anchor is placed first, where the target syntax expects its
/// records. TOML results are re-parsed; a result that does not parse is
/// reported as structural damage rather than written.
///
/// # Errors
/// - [`DomainError::DuplicateAnchor`] when the anchor occurs more than once
/// - [`DomainError::DamagedTarget`] when a TOML target does not parse, or a
///   settings target without the anchor has no class to host it
pub fn inject(
    existing: &str,
    snippet: &str,
    anchor: &str,
    syntax: SnippetSyntax,
    schema: Option<&SnippetSchema>,
    target: &str,
) -> Result<String, DomainError> {
    let regions = split_regions(existing, anchor, syntax, target)?;
    if regions.anchor.is_none() {
        let anchored = place_anchor(existing, anchor, syntax, target)?;
        let regions = split_regions(&anchored, anchor, syntax, target)?;
        return merge_at_anchor(regions, snippet, anchor, syntax, schema, target);
    }
    merge_at_anchor(regions, snippet, anchor, syntax, schema, target)
}

fn merge_at_anchor(
    regions: Regions<'_>,
    snippet: &str,
    anchor: &str,
    syntax: SnippetSyntax,
    schema: Option<&SnippetSchema>,
    target: &str,
) -> Result<String, DomainError> {
    let keys = base_keys(&regions, syntax);

    let mut head: Vec<&str> = regions.head.clone();
    let anchor_line = match regions.anchor {
        Some(line) => line,
        None => {
            if head.last().is_some_and(|l| !l.trim().is_empty()) {
                head.push("");
            }
            anchor.trim()
        }
    };
    let indent = &anchor_line[..anchor_line.len() - anchor_line.trim_start().len()];

    let existing_records = parse_records(syntax, &regions.injected.join("\n"));
    let new_records = parse_records(syntax, &dedent(snippet));
    let merged = merge_snippets(&existing_records, &new_records, &keys, indent, schema);

    let mut out: Vec<&str> = head;
    out.push(anchor_line);
    out.extend(merged.iter().map(String::as_str));
    out.extend(regions.tail.iter().copied());

    let mut content = out.join("\n");
    content.push('\n');

    if syntax == SnippetSyntax::Toml {
        toml::from_str::<toml::Table>(&content).map_err(|e| DomainError::DamagedTarget {
            target: target.to_string(),
            reason: e.message().to_string(),
        })?;
    }

    Ok(content)
}
