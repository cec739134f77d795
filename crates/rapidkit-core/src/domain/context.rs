use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Variables available to templates during rendering.
///
/// Keys are sorted so that a context serializes (and logs) identically
/// across runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RenderContext {
    values: BTreeMap<String, Value>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Overlay every entry of `layer`; later layers win.
    pub fn extend<I, K>(&mut self, layer: I)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        for (k, v) in layer {
            self.values.insert(k.into(), v);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn as_map(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Add the `<key>_snake`, `<key>_kebab` and `<key>_pascal` variants of a
    /// string entry.
    pub fn derive_cases(&mut self, key: &str) {
        if let Some(raw) = self.get_str(key).map(str::to_string) {
            self.insert(format!("{key}_snake"), to_snake_case(&raw));
            self.insert(format!("{key}_kebab"), to_kebab_case(&raw));
            self.insert(format!("{key}_pascal"), to_pascal_case(&raw));
        }
    }
}

impl From<BTreeMap<String, Value>> for RenderContext {
    fn from(values: BTreeMap<String, Value>) -> Self {
        Self { values }
    }
}

// ============================================================================
// Case conversion
// ============================================================================

/// `"My Awesome-App"` → `"my_awesome_app"`
pub fn to_snake_case(s: &str) -> String {
    split_words(s).join("_")
}

/// `"MyAwesomeApp"` → `"my-awesome-app"`
pub fn to_kebab_case(s: &str) -> String {
    split_words(s).join("-")
}

/// `"my-app"` → `"MyApp"`, `"HTTPRequest"` → `"HttpRequest"`
pub fn to_pascal_case(s: &str) -> String {
    split_words(s)
        .into_iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => {
                    let mut out = String::new();
                    out.extend(first.to_uppercase());
                    out.push_str(chars.as_str());
                    out
                }
                None => String::new(),
            }
        })
        .collect()
}

/// Split on `_`, `-`, `/`, `.`, whitespace, camelCase transitions and
/// acronym boundaries (`HTTPServer` → `http`, `server`).
fn split_words(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if matches!(c, '_' | '-' | '/' | '.') || c.is_whitespace() {
            if !current.is_empty() {
                words.push(current.to_lowercase());
                current.clear();
            }
            continue;
        }

        if let Some(&next) = chars.peek() {
            if c.is_lowercase() && next.is_uppercase() {
                current.push(c);
                words.push(current.to_lowercase());
                current.clear();
                continue;
            }

            if c.is_uppercase()
                && next.is_uppercase()
                && chars.clone().nth(1).is_some_and(char::is_lowercase)
            {
                current.push(c);
                words.push(current.to_lowercase());
                current.clear();
                continue;
            }
        }

        current.push(c);
    }

    if !current.is_empty() {
        words.push(current.to_lowercase());
    }

    words
}
