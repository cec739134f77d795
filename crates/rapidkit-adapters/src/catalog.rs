//! On-disk catalog: kits, shared variables, profiles and modules.
//!
//! ```text
//! <root>/kits/profiles.yaml
//! <root>/kits/<kit path>/kit.yaml
//! <root>/shared/variables.yaml
//! <root>/modules/<module path>/module.yaml
//! <root>/modules/<module path>/templates/...
//! ```

use std::path::{Path, PathBuf};

use rapidkit_core::{
    application::{
        ApplicationError,
        ports::{KitSource, ModuleSource},
    },
    domain::{
        KitManifest, ModuleManifest, ProfileConfig, ProfileDocument, RelativePath, Snippet,
        SnippetFile, VariableSchema,
    },
    error::{RapidkitError, RapidkitResult},
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

const KIT_FILES: &[&str] = &["kit.yaml", "kit.yml"];
const MODULE_FILES: &[&str] = &["module.yaml", "module.yml"];
const PROFILES_FILE: &str = "profiles.yaml";
const SHARED_VARIABLES_FILE: &str = "shared/variables.yaml";
const TEMPLATES_DIR: &str = "templates";

/// `shared/variables.yaml` is either `{variables: {...}}` or the map itself.
#[derive(Deserialize)]
#[serde(untagged)]
enum SharedVariablesDoc {
    Wrapped { variables: VariableSchema },
    Direct(VariableSchema),
}

/// Catalog rooted at a directory on disk.
#[derive(Debug, Clone)]
pub struct FsCatalog {
    root: PathBuf,
}

impl FsCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn kits_dir(&self) -> PathBuf {
        self.root.join("kits")
    }

    fn modules_dir(&self) -> PathBuf {
        self.root.join("modules")
    }

    /// Every `(manifest, directory)` under `modules/`, sorted by path.
    fn module_entries(&self) -> Vec<(ModuleManifest, PathBuf)> {
        manifest_files(&self.modules_dir(), MODULE_FILES)
            .into_iter()
            .filter_map(|file| match read_yaml::<ModuleManifest>(&file) {
                Ok(manifest) => {
                    let dir = file.parent().map(Path::to_path_buf).unwrap_or_default();
                    Some((manifest, dir))
                }
                Err(e) => {
                    warn!(path = %file.display(), error = %e, "Skipping unreadable module manifest");
                    None
                }
            })
            .collect()
    }

    /// Directory of `module`: `modules/<module>` when it holds a manifest,
    /// otherwise the directory whose manifest is named `module`.
    fn module_dir(&self, module: &str) -> RapidkitResult<PathBuf> {
        let direct = RelativePath::try_new(module)?.under(&self.modules_dir());
        if find_manifest(&direct, MODULE_FILES).is_some() {
            return Ok(direct);
        }

        self.module_entries()
            .into_iter()
            .find(|(manifest, _)| manifest.name == module)
            .map(|(_, dir)| dir)
            .ok_or_else(|| {
                ApplicationError::ModuleNotFound {
                    name: module.to_string(),
                }
                .into()
            })
    }
}

impl KitSource for FsCatalog {
    #[instrument(skip(self), fields(root = %self.root.display()))]
    fn kit_manifests(&self) -> RapidkitResult<Vec<KitManifest>> {
        if !self.root.is_dir() {
            return Err(ApplicationError::Catalog {
                reason: format!("catalog root {} is not a directory", self.root.display()),
            }
            .into());
        }

        let mut kits = Vec::new();
        for file in manifest_files(&self.kits_dir(), KIT_FILES) {
            match read_yaml::<KitManifest>(&file) {
                Ok(kit) => {
                    debug!(kit = %kit.name, path = %file.display(), "Kit discovered");
                    kits.push(kit);
                }
                Err(e) => warn!(path = %file.display(), error = %e, "Skipping invalid kit"),
            }
        }
        Ok(kits)
    }

    fn shared_variables(&self) -> RapidkitResult<Option<VariableSchema>> {
        let path = self.root.join(SHARED_VARIABLES_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        let schema = match read_yaml::<SharedVariablesDoc>(&path)? {
            SharedVariablesDoc::Wrapped { variables } => variables,
            SharedVariablesDoc::Direct(variables) => variables,
        };
        Ok(Some(schema))
    }

    fn profile_config(&self) -> RapidkitResult<ProfileConfig> {
        let path = self.kits_dir().join(PROFILES_FILE);
        if !path.is_file() {
            return Ok(ProfileConfig::new());
        }
        let doc: ProfileDocument = read_yaml(&path)?;
        Ok(ProfileConfig::from_spec(&doc.profiles))
    }
}

impl ModuleSource for FsCatalog {
    fn load_manifest(&self, module: &str) -> RapidkitResult<ModuleManifest> {
        let dir = self.module_dir(module)?;
        let file = find_manifest(&dir, MODULE_FILES).ok_or_else(|| {
            RapidkitError::from(ApplicationError::ModuleNotFound {
                name: module.to_string(),
            })
        })?;
        read_yaml(&file)
    }

    fn templates_root(&self, module: &str) -> RapidkitResult<PathBuf> {
        Ok(self.module_dir(module)?.join(TEMPLATES_DIR))
    }

    fn load_snippets(&self, module: &str, config: &str) -> RapidkitResult<Vec<Snippet>> {
        let path = RelativePath::try_new(config)?.under(&self.module_dir(module)?);
        let file: SnippetFile = read_yaml(&path)?;
        Ok(file.snippets)
    }

    fn list_modules(&self) -> RapidkitResult<Vec<String>> {
        let mut names: Vec<String> = self
            .module_entries()
            .into_iter()
            .map(|(manifest, _)| manifest.name)
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }
}

/// Manifest files named one of `names` anywhere under `dir`, sorted.
fn manifest_files(dir: &Path, names: &[&str]) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable catalog entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| names.contains(&name))
        })
        .map(|entry| entry.into_path())
        .collect()
}

fn find_manifest(dir: &Path, names: &[&str]) -> Option<PathBuf> {
    names.iter().map(|n| dir.join(n)).find(|p| p.is_file())
}

fn read_yaml<T: DeserializeOwned>(path: &Path) -> RapidkitResult<T> {
    let text = std::fs::read_to_string(path).map_err(|e| catalog_error(path, &e))?;
    serde_yaml::from_str(&text).map_err(|e| catalog_error(path, &e))
}

fn catalog_error(path: &Path, e: &dyn std::fmt::Display) -> RapidkitError {
    ApplicationError::Catalog {
        reason: format!("{}: {e}", path.display()),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn catalog() -> (tempfile::TempDir, FsCatalog) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(
            root,
            "kits/fastapi/standard/kit.yaml",
            "name: fastapi.standard\nversion: 1.0.0\nmodules:\n  - name: logging\n    variant: fastapi\n",
        );
        write(root, "kits/broken/kit.yaml", "name: [unterminated\n");
        write(
            root,
            "kits/profiles.yaml",
            "profiles:\n  - \"fastapi/base\"\n  - \"fastapi.standard: inherits fastapi/base\"\n",
        );
        write(
            root,
            "modules/free/essentials/logging/module.yaml",
            "name: logging\nversion: 1.2.0\ngeneration:\n  snippets:\n    config: snippets.yaml\n",
        );
        write(
            root,
            "modules/free/essentials/logging/snippets.yaml",
            "snippets:\n  - id: env\n    template: snippets/env.tmpl\n    anchor: \"# <<<inject:env>>>\"\n    target: .env\n",
        );
        let catalog = FsCatalog::new(root);
        (dir, catalog)
    }

    #[test]
    fn invalid_kits_are_skipped() {
        let (_dir, catalog) = catalog();
        let kits = catalog.kit_manifests().unwrap();
        let names: Vec<_> = kits.iter().map(|k| k.name.as_str()).collect();
        assert_eq!(names, vec!["fastapi.standard"]);
    }

    #[test]
    fn missing_root_is_a_catalog_error() {
        let err = FsCatalog::new("/definitely/not/a/catalog")
            .kit_manifests()
            .unwrap_err();
        assert!(matches!(
            err,
            RapidkitError::Application(ApplicationError::Catalog { .. })
        ));
    }

    #[test]
    fn profiles_are_optional() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FsCatalog::new(dir.path()).profile_config().unwrap().is_empty());

        let (_dir, catalog) = catalog();
        let config = catalog.profile_config().unwrap();
        assert_eq!(config.parent_of("fastapi.standard"), Some("fastapi/base"));
    }

    #[test]
    fn shared_variables_accept_both_shapes() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = FsCatalog::new(dir.path());
        assert!(catalog.shared_variables().unwrap().is_none());

        write(
            dir.path(),
            "shared/variables.yaml",
            "variables:\n  author:\n    type: string\n    default: Team\n",
        );
        let wrapped = catalog.shared_variables().unwrap().unwrap();
        assert!(wrapped.contains("author"));

        write(
            dir.path(),
            "shared/variables.yaml",
            "license:\n  type: choice\n  choices: [MIT]\n  default: MIT\n",
        );
        let direct = catalog.shared_variables().unwrap().unwrap();
        assert!(direct.contains("license"));
    }

    #[test]
    fn modules_resolve_by_path_or_name() {
        let (dir, catalog) = catalog();
        let module_dir = dir.path().join("modules/free/essentials/logging");

        assert_eq!(catalog.load_manifest("logging").unwrap().version, "1.2.0");
        assert_eq!(
            catalog.load_manifest("free/essentials/logging").unwrap().name,
            "logging"
        );
        assert_eq!(
            catalog.templates_root("logging").unwrap(),
            module_dir.join("templates")
        );
        assert_eq!(catalog.list_modules().unwrap(), vec!["logging"]);
    }

    #[test]
    fn unknown_module_is_not_found() {
        let (_dir, catalog) = catalog();
        let err = catalog.load_manifest("auth").unwrap_err();
        assert!(matches!(
            err,
            RapidkitError::Application(ApplicationError::ModuleNotFound { .. })
        ));
    }

    #[test]
    fn module_names_cannot_escape_the_catalog() {
        let (_dir, catalog) = catalog();
        assert!(catalog.load_manifest("../kits").is_err());
    }

    #[test]
    fn snippets_are_loaded_relative_to_module() {
        let (_dir, catalog) = catalog();
        let snippets = catalog.load_snippets("logging", "snippets.yaml").unwrap();
        assert_eq!(snippets.len(), 1);
        assert_eq!(snippets[0].target, ".env");
    }
}
