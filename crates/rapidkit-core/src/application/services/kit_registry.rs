//! Kit Registry - kit discovery, profile chains and merged variables.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::RwLock;
use strsim::levenshtein;
use tracing::{debug, instrument, warn};

use crate::{
    application::{ApplicationError, ports::KitSource},
    domain::{
        DomainValidator as validator, Kit, KitManifest, ProfileConfig, VariableSchema,
        kit::layer_kits, merge_variables, resolve_profile_chain, shared_defaults,
    },
    error::RapidkitResult,
};

/// Maximum edit distance, as a percentage of the requested name's length,
/// for a kit name to be offered as a suggestion.
const SIMILARITY_THRESHOLD_PERCENT: usize = 50;

/// Loaded kits plus the profile graph they participate in.
pub struct KitRegistry {
    manifests: BTreeMap<String, KitManifest>,
    shared: VariableSchema,
    profiles: ProfileConfig,
    chains: RwLock<HashMap<String, Vec<String>>>,
}

impl KitRegistry {
    /// Load every kit from `source`. Invalid or duplicate kits are skipped
    /// with a warning so one bad manifest never hides the rest.
    #[instrument(skip_all)]
    pub fn load(source: &dyn KitSource) -> RapidkitResult<Self> {
        let mut profiles = source.profile_config()?;
        let shared = source.shared_variables()?.unwrap_or_else(shared_defaults);
        shared.validate_defaults()?;

        let mut manifests = BTreeMap::new();
        for manifest in source.kit_manifests()? {
            if let Err(e) = validator::validate_kit_manifest(&manifest) {
                warn!(kit = %manifest.name, error = %e, "Skipping invalid kit");
                continue;
            }
            if manifests.contains_key(&manifest.name) {
                warn!(kit = %manifest.name, "Skipping duplicate kit");
                continue;
            }
            if let Some(parent) = &manifest.inherits {
                profiles.set_edge(manifest.name.clone(), Some(parent.clone()));
            } else if !profiles.contains(&manifest.name) {
                // Every kit is a known profile node.
                profiles.set_edge(manifest.name.clone(), None);
            }
            manifests.insert(manifest.name.clone(), manifest);
        }

        debug!(kits = manifests.len(), "Kit registry loaded");

        Ok(Self {
            manifests,
            shared,
            profiles,
            chains: RwLock::new(HashMap::new()),
        })
    }

    /// Kit names, sorted.
    pub fn list_kits_names(&self) -> BTreeSet<String> {
        self.manifests.keys().cloned().collect()
    }

    pub fn shared_variables(&self) -> &VariableSchema {
        &self.shared
    }

    /// Shared defaults with `kit_vars` superimposed field by field.
    pub fn merge_variables(&self, kit_vars: &VariableSchema) -> VariableSchema {
        merge_variables(&self.shared, kit_vars)
    }

    /// Root-first inheritance chain for `name`, cached per name.
    pub fn profile_chain(&self, name: &str) -> Vec<String> {
        if let Ok(cache) = self.chains.read() {
            if let Some(chain) = cache.get(name) {
                return chain.clone();
            }
        }

        let chain = resolve_profile_chain(name, &self.profiles);
        if let Ok(mut cache) = self.chains.write() {
            cache.insert(name.to_string(), chain.clone());
        }
        chain
    }

    /// Resolve a kit: its chain, layered ancestors and merged variables.
    pub fn get_kit(&self, name: &str) -> RapidkitResult<Kit> {
        let manifest = self.manifests.get(name).ok_or_else(|| ApplicationError::KitNotFound {
            name: name.to_string(),
            suggestions: self.suggest(name),
        })?;

        let profile_chain = self.profile_chain(name);
        let (kit_vars, modules) =
            layer_kits(profile_chain.iter().filter_map(|p| self.manifests.get(p)));

        let kit = Kit {
            name: manifest.name.clone(),
            version: manifest.version.clone(),
            description: manifest.description.clone(),
            ecosystem: manifest.ecosystem,
            profile_chain,
            variables: self.merge_variables(&kit_vars),
            modules,
        };
        validator::validate_kit(&kit)?;

        debug!(kit = %kit.name, chain = ?kit.profile_chain, "Kit resolved");
        Ok(kit)
    }

    fn suggest(&self, name: &str) -> Vec<String> {
        let limit = name.len() * SIMILARITY_THRESHOLD_PERCENT / 100;
        let mut scored: Vec<(usize, &String)> = self
            .manifests
            .keys()
            .map(|k| (levenshtein(name, k), k))
            .filter(|(d, _)| *d <= limit.max(1))
            .collect();
        scored.sort();
        scored.into_iter().take(3).map(|(_, k)| k.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::testing::StubCatalog;
    use crate::domain::{ModuleRef, VariableDef, profile::ProfileSpec};
    use crate::error::RapidkitError;
    use serde_json::json;

    fn kit(name: &str, inherits: Option<&str>) -> KitManifest {
        KitManifest {
            name: name.into(),
            version: "1.0.0".into(),
            description: String::new(),
            ecosystem: Default::default(),
            inherits: inherits.map(str::to_string),
            variables: VariableSchema::new(),
            modules: Vec::new(),
        }
    }

    fn catalog() -> StubCatalog {
        let mut base = kit("base", None);
        base.modules.push(ModuleRef::new("settings", "core"));
        base.variables
            .insert("license", VariableDef::default().with_default("Apache-2.0"));

        let mut dev = kit("dev", None);
        dev.modules.push(ModuleRef::new("logging", "fastapi"));

        let mut prod = kit("prod", None);
        prod.variables
            .insert("workers", VariableDef::default().with_default(4));

        let spec: ProfileSpec = serde_yaml::from_str(
            "- base\n- \"dev: inherits base\"\n- \"prod: inherits dev\"\n",
        )
        .unwrap();

        StubCatalog {
            kits: vec![prod, base, dev],
            profiles: spec.into(),
            ..StubCatalog::default()
        }
    }

    #[test]
    fn names_are_sorted() {
        let registry = KitRegistry::load(&catalog()).unwrap();
        let names: Vec<_> = registry.list_kits_names().into_iter().collect();
        assert_eq!(names, vec!["base", "dev", "prod"]);
    }

    #[test]
    fn kit_layers_its_ancestors() {
        let registry = KitRegistry::load(&catalog()).unwrap();
        let kit = registry.get_kit("prod").unwrap();

        assert_eq!(kit.profile_chain, vec!["base", "dev", "prod"]);
        let modules: Vec<_> = kit.modules.iter().map(|m| m.module_name.as_str()).collect();
        assert_eq!(modules, vec!["settings", "logging"]);
        assert_eq!(
            kit.variables.get("license").unwrap().default,
            Some(json!("Apache-2.0"))
        );
        assert_eq!(kit.variables.get("workers").unwrap().default, Some(json!(4)));
        assert!(kit.variables.contains("project_name"));
    }

    #[test]
    fn unknown_kit_suggests_close_names() {
        let registry = KitRegistry::load(&catalog()).unwrap();
        let err = registry.get_kit("prd").unwrap_err();
        match err {
            RapidkitError::Application(ApplicationError::KitNotFound { name, suggestions }) => {
                assert_eq!(name, "prd");
                assert_eq!(suggestions.first().map(String::as_str), Some("prod"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn kit_inherits_field_adds_edge() {
        let source = StubCatalog {
            kits: vec![kit("fastapi/standard", None), kit("fastapi/ddd", Some("fastapi/standard"))],
            ..StubCatalog::default()
        };
        let registry = KitRegistry::load(&source).unwrap();
        assert_eq!(
            registry.get_kit("fastapi/ddd").unwrap().profile_chain,
            vec!["fastapi/standard", "fastapi/ddd"]
        );
    }

    #[test]
    fn missing_parent_kit_is_left_out_of_chain() {
        let source = StubCatalog {
            kits: vec![kit("api", Some("ghost")), kit("svc", Some("api"))],
            ..StubCatalog::default()
        };
        let registry = KitRegistry::load(&source).unwrap();
        assert_eq!(registry.get_kit("svc").unwrap().profile_chain, vec!["api", "svc"]);
    }

    #[test]
    fn invalid_kits_are_skipped() {
        let mut bad = kit("broken", None);
        bad.version = "not-semver".into();
        let source = StubCatalog {
            kits: vec![bad, kit("ok", None)],
            ..StubCatalog::default()
        };
        let registry = KitRegistry::load(&source).unwrap();
        assert_eq!(registry.list_kits_names().len(), 1);
    }

    #[test]
    fn chain_is_cached() {
        let registry = KitRegistry::load(&catalog()).unwrap();
        let first = registry.profile_chain("prod");
        assert_eq!(registry.chains.read().unwrap().len(), 1);
        assert_eq!(registry.profile_chain("prod"), first);
    }
}
