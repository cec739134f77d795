//! In-crate test doubles for the ports.

use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::application::{
    ApplicationError,
    ports::{Filesystem, KitSource, ModuleSource, TemplateRenderer},
};
use crate::domain::{
    KitManifest, ModuleManifest, ProfileConfig, RenderContext, Snippet, VariableSchema,
    variables::display_value,
};
use crate::error::RapidkitResult;

#[derive(Default)]
pub struct MemFs {
    files: RwLock<BTreeMap<PathBuf, String>>,
    dirs: RwLock<BTreeSet<PathBuf>>,
}

impl MemFs {
    pub fn read(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files.read().unwrap().get(path.as_ref()).cloned()
    }

    pub fn file_paths(&self) -> Vec<PathBuf> {
        self.files.read().unwrap().keys().cloned().collect()
    }

    pub fn seed(&self, path: impl AsRef<Path>, content: &str) {
        self.files
            .write()
            .unwrap()
            .insert(path.as_ref().to_path_buf(), content.to_string());
    }
}

impl Filesystem for MemFs {
    fn create_dir_all(&self, path: &Path) -> RapidkitResult<()> {
        let mut dirs = self.dirs.write().unwrap();
        for ancestor in path.ancestors() {
            dirs.insert(ancestor.to_path_buf());
        }
        Ok(())
    }

    fn write_file(&self, path: &Path, content: &str) -> RapidkitResult<()> {
        self.files
            .write()
            .unwrap()
            .insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn read_to_string(&self, path: &Path) -> RapidkitResult<String> {
        self.read(path).ok_or_else(|| {
            ApplicationError::Filesystem {
                path: path.to_path_buf(),
                reason: "not found".into(),
            }
            .into()
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.read().unwrap().keys().any(|p| p.starts_with(path))
            || self.dirs.read().unwrap().contains(path)
    }

    fn is_dir_empty(&self, path: &Path) -> RapidkitResult<bool> {
        let files = self.files.read().unwrap();
        let dirs = self.dirs.read().unwrap();
        Ok(!files.keys().any(|p| p.starts_with(path) && p != path)
            && !dirs.iter().any(|p| p.starts_with(path) && p != path))
    }

    fn remove_dir_all(&self, path: &Path) -> RapidkitResult<()> {
        self.files.write().unwrap().retain(|p, _| !p.starts_with(path));
        self.dirs.write().unwrap().retain(|p| !p.starts_with(path));
        Ok(())
    }
}

/// `{{ name }}` substitution; unknown names are errors.
#[derive(Default)]
pub struct StubRenderer {
    templates: BTreeMap<PathBuf, String>,
}

impl StubRenderer {
    pub fn with(mut self, path: impl Into<PathBuf>, source: &str) -> Self {
        self.templates.insert(path.into(), source.to_string());
        self
    }

    fn substitute(name: &str, source: &str, context: &RenderContext) -> RapidkitResult<String> {
        let pattern = Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").unwrap();
        let mut missing = None;
        let out = pattern.replace_all(source, |caps: &regex::Captures<'_>| {
            match context.get(&caps[1]) {
                Some(v) => display_value(v),
                None => {
                    missing.get_or_insert_with(|| caps[1].to_string());
                    String::new()
                }
            }
        });
        match missing {
            Some(var) => Err(ApplicationError::Template {
                template: name.to_string(),
                reason: format!("Variable `{var}` not found in context"),
            }
            .into()),
            None => Ok(out.into_owned()),
        }
    }
}

impl TemplateRenderer for StubRenderer {
    fn render_file(&self, template_path: &Path, context: &RenderContext) -> RapidkitResult<String> {
        let source = self.templates.get(template_path).ok_or_else(|| ApplicationError::Template {
            template: template_path.display().to_string(),
            reason: "template file not found".into(),
        })?;
        Self::substitute(&template_path.display().to_string(), source, context)
    }

    fn render_str(&self, name: &str, source: &str, context: &RenderContext) -> RapidkitResult<String> {
        Self::substitute(name, source, context)
    }
}

pub const CATALOG_MODULES: &str = "/catalog/modules";

#[derive(Default)]
pub struct StubCatalog {
    pub kits: Vec<KitManifest>,
    pub shared: Option<VariableSchema>,
    pub profiles: ProfileConfig,
    pub modules: BTreeMap<String, ModuleManifest>,
    pub snippets: BTreeMap<String, Vec<Snippet>>,
}

impl StubCatalog {
    pub fn templates_dir(module: &str) -> PathBuf {
        Path::new(CATALOG_MODULES).join(module).join("templates")
    }
}

impl KitSource for StubCatalog {
    fn kit_manifests(&self) -> RapidkitResult<Vec<KitManifest>> {
        Ok(self.kits.clone())
    }

    fn shared_variables(&self) -> RapidkitResult<Option<VariableSchema>> {
        Ok(self.shared.clone())
    }

    fn profile_config(&self) -> RapidkitResult<ProfileConfig> {
        Ok(self.profiles.clone())
    }
}

impl ModuleSource for StubCatalog {
    fn load_manifest(&self, module: &str) -> RapidkitResult<ModuleManifest> {
        self.modules.get(module).cloned().ok_or_else(|| {
            ApplicationError::ModuleNotFound {
                name: module.to_string(),
            }
            .into()
        })
    }

    fn templates_root(&self, module: &str) -> RapidkitResult<PathBuf> {
        Ok(Self::templates_dir(module))
    }

    fn load_snippets(&self, module: &str, _config: &str) -> RapidkitResult<Vec<Snippet>> {
        Ok(self.snippets.get(module).cloned().unwrap_or_default())
    }

    fn list_modules(&self) -> RapidkitResult<Vec<String>> {
        Ok(self.modules.keys().cloned().collect())
    }
}
