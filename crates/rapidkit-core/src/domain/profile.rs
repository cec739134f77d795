//! Profile inheritance.
//!
//! Profile configuration arrives in two shapes, a list of
//! `"child: inherits parent"` strings or a mapping of
//! `{name: {inherits: parent}}`. Both normalize into a [`ProfileConfig`]
//! of `(name, parent?)` edges before any resolution happens.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// Raw profile configuration as written in YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProfileSpec {
    List(Vec<ProfileLine>),
    Map(IndexMap<String, Option<ProfileEntry>>),
}

/// One list item. Unquoted `- dev: inherits base` reaches us as a one-key
/// map, quoted it arrives as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProfileLine {
    Text(String),
    Pair(IndexMap<String, Option<String>>),
}

impl From<&str> for ProfileLine {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Value side of the mapping form. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileEntry {
    #[serde(default)]
    pub inherits: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A `profiles.yaml` document: `{ profiles: <list | map> }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileDocument {
    pub profiles: ProfileSpec,
}

/// Normalized inheritance edges, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileConfig {
    edges: IndexMap<String, Option<String>>,
}

impl ProfileConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize either config shape.
    pub fn from_spec(spec: &ProfileSpec) -> Self {
        let mut config = Self::new();
        match spec {
            ProfileSpec::List(lines) => {
                for line in lines {
                    match line {
                        ProfileLine::Text(text) => {
                            if let Some((name, parent)) = parse_profile_line(text) {
                                config.edges.insert(name, parent);
                            }
                        }
                        ProfileLine::Pair(pairs) => {
                            for (name, rest) in pairs {
                                let parent = parse_parent(rest.as_deref().unwrap_or(""));
                                config.edges.insert(name.trim().to_string(), parent);
                            }
                        }
                    }
                }
            }
            ProfileSpec::Map(map) => {
                for (name, entry) in map {
                    let parent = entry
                        .as_ref()
                        .and_then(|e| e.inherits.as_deref())
                        .map(str::trim)
                        .filter(|p| !p.is_empty())
                        .map(str::to_string);
                    config.edges.insert(name.trim().to_string(), parent);
                }
            }
        }
        config
    }

    /// Declare or replace the parent of `name`.
    pub fn set_edge(&mut self, name: impl Into<String>, parent: Option<String>) {
        self.edges.insert(name.into(), parent);
    }

    pub fn with_edge(mut self, name: impl Into<String>, parent: Option<&str>) -> Self {
        self.set_edge(name, parent.map(str::to_string));
        self
    }

    pub fn parent_of(&self, name: &str) -> Option<&str> {
        self.edges.get(name).and_then(|p| p.as_deref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.edges.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.edges.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

impl From<ProfileSpec> for ProfileConfig {
    fn from(spec: ProfileSpec) -> Self {
        Self::from_spec(&spec)
    }
}

/// Parse `"child: inherits parent"` or a bare `"name"`.
fn parse_profile_line(line: &str) -> Option<(String, Option<String>)> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    match line.split_once(':') {
        Some((name, rest)) => Some((name.trim().to_string(), parse_parent(rest))),
        None => Some((line.to_string(), None)),
    }
}

fn parse_parent(rest: &str) -> Option<String> {
    let rest = rest.trim();
    let parent = rest.strip_prefix("inherits").unwrap_or(rest).trim();
    (!parent.is_empty()).then(|| parent.to_string())
}

/// Walk parents from `profile_name` upward and return the chain root first.
///
/// A cycle breaks at the first re-encountered node. A parent with no entry of
/// its own is dropped: the chain stops at the last known node.
pub fn resolve_profile_chain(profile_name: &str, config: &ProfileConfig) -> Vec<String> {
    let mut chain = VecDeque::new();
    let mut seen = HashSet::new();
    let mut current = Some(profile_name);

    while let Some(name) = current {
        if !seen.insert(name) {
            break;
        }
        if name != profile_name && !config.contains(name) {
            break;
        }
        chain.push_front(name.to_string());
        current = config.parent_of(name);
    }

    chain.into()
}
