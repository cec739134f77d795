//! Full pipeline runs against an on-disk catalog.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rapidkit_adapters::{FsCatalog, LocalFilesystem, MemoryFilesystem, TeraRenderer};
use rapidkit_core::prelude::*;
use serde_json::Value;
use tempfile::TempDir;
use walkdir::WalkDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Every file under `root`, relative, with `/` separators.
fn tree(root: &Path) -> BTreeSet<String> {
    WalkDir::new(root)
        .into_iter()
        .map(Result::unwrap)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            e.path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect()
}

fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap()
}

fn creator(catalog: &Arc<FsCatalog>, filesystem: Arc<dyn Filesystem>) -> ProjectCreator {
    let kits = KitRegistry::load(catalog.as_ref()).unwrap();
    ProjectCreator::new(kits, catalog.clone(), Arc::new(TeraRenderer::new()), filesystem)
}

fn request(kit: &str, output: PathBuf) -> CreateRequest {
    CreateRequest {
        kit_name: kit.into(),
        project_name: "Order Service".into(),
        output_dir: output,
        ..CreateRequest::default()
    }
}

/// Minimal catalog: profiles base -> dev -> prod and one module.
fn minimal_catalog() -> (TempDir, Arc<FsCatalog>) {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        "kits/profiles.yaml",
        "profiles:\n  - base\n  - \"dev: inherits base\"\n  - \"prod: inherits dev\"\n",
    );
    write(
        root,
        "kits/prod/kit.yaml",
        "name: prod\nversion: 1.0.0\nmodules:\n  - name: svc\n    variant: fastapi\n",
    );
    write(
        root,
        "modules/svc/module.yaml",
        r#"name: svc
version: 0.1.0
generation:
  vendor:
    files:
      - template: x.tmpl
        relative: vendor/x.py
  variants:
    fastapi:
      files:
        - template: y.tmpl
          output: app/y.py
"#,
    );
    write(root, "modules/svc/templates/x.tmpl", "# {{ vendor_module }} for {{ project_name }}\n");
    write(root, "modules/svc/templates/y.tmpl", "from vendor.x import *  # {{ variant }}\n");
    let catalog = Arc::new(FsCatalog::new(root));
    (dir, catalog)
}

/// A fastapi kit with a settings module and a logging module that injects
/// snippets and declares a dependency.
fn fastapi_catalog() -> (TempDir, Arc<FsCatalog>) {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(
        root,
        "kits/profiles.yaml",
        "profiles:\n  fastapi/ddd:\n    inherits: fastapi/standard\n  fastapi/standard:\n",
    );
    write(
        root,
        "kits/fastapi/standard/kit.yaml",
        r#"name: fastapi/standard
version: 1.0.0
ecosystem: python
modules:
  - name: settings
    variant: fastapi
  - name: logging
    variant: fastapi
    config:
      level: DEBUG
"#,
    );
    write(
        root,
        "kits/fastapi/ddd/kit.yaml",
        "name: fastapi/ddd\nversion: 1.0.0\nmodules:\n  - name: settings\n    variant: fastapi\n",
    );

    write(
        root,
        "modules/settings/module.yaml",
        r#"name: settings
version: 1.0.0
generation:
  variants:
    fastapi:
      files:
        - template: pyproject.toml.j2
          output: pyproject.toml
        - template: requirements.txt.j2
          output: requirements.txt
        - template: settings.py.j2
          output: src/settings.py
"#,
    );
    write(
        root,
        "modules/settings/templates/pyproject.toml.j2",
        r#"[tool.poetry]
name = "{{ project_name_kebab }}"
version = "0.1.0"
authors = ["{{ author }}"]
license = "{{ license }}"

[tool.poetry.dependencies]
python = "^3.11"
fastapi = "0.110.0"
"#,
    );
    write(root, "modules/settings/templates/requirements.txt.j2", "fastapi==0.110.0\n");
    write(
        root,
        "modules/settings/templates/settings.py.j2",
        r#"from pydantic import Field
from pydantic_settings import BaseSettings


class Settings(BaseSettings):
    APP_NAME: str = Field(default="{{ project_name }}")
    # <<<inject:settings-fields>>>
"#,
    );

    write(
        root,
        "modules/free/essentials/logging/module.yaml",
        r#"name: logging
version: 1.2.0
variables:
  level:
    type: string
    default: INFO
    env_var: LOG_LEVEL
dependencies:
  fastapi:
    - name: structlog
      version: "^24.1.0"
generation:
  vendor:
    root: ".rapidkit/vendor/{{ module_name }}"
    files:
      - template: vendor/logger.py.j2
        relative: logger.py
  variants:
    fastapi:
      files:
        - template: fastapi/setup.py.j2
          output: "src/{{ project_name_snake }}/logging_setup.py"
  snippets:
    config: snippets.yaml
"#,
    );
    write(
        root,
        "modules/free/essentials/logging/snippets.yaml",
        r##"snippets:
  - id: settings-level
    template: snippets/settings.py.j2
    anchor: "# <<<inject:settings-fields>>>"
    target: src/settings.py
  - id: env-level
    template: snippets/env.j2
    anchor: "# <<<inject:env>>>"
    target: .env.example
"##,
    );
    let templates = "modules/free/essentials/logging/templates";
    write(
        root,
        &format!("{templates}/vendor/logger.py.j2"),
        "\"\"\"{{ vendor_module }} logging core.\"\"\"\nLEVEL = \"{{ level }}\"\n",
    );
    write(
        root,
        &format!("{templates}/fastapi/setup.py.j2"),
        "from {{ project_name_snake }}.settings import Settings\n",
    );
    write(
        root,
        &format!("{templates}/snippets/settings.py.j2"),
        "LOG_LEVEL: str = Field(default=\"{{ level }}\")\n",
    );
    write(root, &format!("{templates}/snippets/env.j2"), "LOG_LEVEL={{ level }}\n");

    let catalog = Arc::new(FsCatalog::new(root));
    (dir, catalog)
}

#[test]
fn chain_kit_writes_vendor_and_variant_files_only() {
    let (_catalog_dir, catalog) = minimal_catalog();
    let out = tempfile::tempdir().unwrap();
    let output = out.path().join("svc");
    let creator = creator(&catalog, Arc::new(LocalFilesystem::new()));

    let kit = creator.kits().get_kit("prod").unwrap();
    assert_eq!(kit.profile_chain, vec!["base", "dev", "prod"]);

    let report = creator
        .create_project(&request("prod", output.clone()), None)
        .unwrap();

    assert_eq!(
        tree(&output),
        BTreeSet::from(["app/y.py".to_string(), "vendor/x.py".to_string()])
    );
    assert_eq!(
        report.files,
        vec![output.join("vendor/x.py"), output.join("app/y.py")]
    );
    assert_eq!(read(&output, "vendor/x.py"), "# svc@0.1.0 for Order Service\n");
    assert_eq!(read(&output, "app/y.py"), "from vendor.x import *  # fastapi\n");
}

#[test]
fn full_kit_renders_injects_and_syncs() {
    let (_catalog_dir, catalog) = fastapi_catalog();
    let out = tempfile::tempdir().unwrap();
    let output = out.path().join("order-service");

    let report = creator(&catalog, Arc::new(LocalFilesystem::new()))
        .create_project(&request("fastapi/standard", output.clone()), None)
        .unwrap();

    assert_eq!(
        tree(&output),
        BTreeSet::from(
            [
                ".env.example",
                ".rapidkit/vendor/logging/logger.py",
                "pyproject.toml",
                "requirements.txt",
                "src/order_service/logging_setup.py",
                "src/settings.py",
            ]
            .map(String::from)
        )
    );
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);

    assert_eq!(
        read(&output, ".rapidkit/vendor/logging/logger.py"),
        "\"\"\"logging@1.2.0 logging core.\"\"\"\nLEVEL = \"DEBUG\"\n"
    );
    assert_eq!(
        read(&output, ".env.example"),
        "# <<<inject:env>>>\nLOG_LEVEL=DEBUG\n"
    );

    let settings = read(&output, "src/settings.py");
    assert!(settings.contains("APP_NAME: str = Field(default=\"Order Service\")"));
    assert!(settings.contains("    LOG_LEVEL: str = Field(default=\"DEBUG\")"));

    let pyproject = read(&output, "pyproject.toml");
    assert!(pyproject.contains("name = \"order-service\""));
    assert!(pyproject.contains("license = \"MIT\""));
    assert!(pyproject.contains("fastapi = \"0.110.0\""));
    assert_eq!(pyproject.matches("<<<inject:module-dependencies>>>").count(), 1);
    assert!(pyproject.contains("structlog = \"^24.1.0\""));
    toml::from_str::<toml::Table>(&pyproject).unwrap();

    let requirements = read(&output, "requirements.txt");
    assert!(requirements.contains("fastapi==0.110.0"));
    assert!(requirements.contains("structlog>=24.1.0,<25.0"));
    assert!(!requirements.contains("python"));
}

#[test]
fn forced_reruns_are_byte_identical() {
    let (_catalog_dir, catalog) = fastapi_catalog();
    let out = tempfile::tempdir().unwrap();
    let output = out.path().join("svc");
    let creator = creator(&catalog, Arc::new(LocalFilesystem::new()));
    let mut req = request("fastapi/standard", output.clone());
    req.force = true;

    creator.create_project(&req, None).unwrap();
    let first: BTreeMap<String, String> = tree(&output)
        .into_iter()
        .map(|rel| {
            let content = read(&output, &rel);
            (rel, content)
        })
        .collect();

    creator.create_project(&req, None).unwrap();
    let second: BTreeMap<String, String> = tree(&output)
        .into_iter()
        .map(|rel| {
            let content = read(&output, &rel);
            (rel, content)
        })
        .collect();

    assert_eq!(first, second);
}

#[test]
fn missing_variant_writes_nothing() {
    let (catalog_dir, _) = minimal_catalog();
    write(
        catalog_dir.path(),
        "kits/prod/kit.yaml",
        "name: prod\nversion: 1.0.0\nmodules:\n  - name: svc\n    variant: django\n",
    );
    let catalog = Arc::new(FsCatalog::new(catalog_dir.path()));
    let out = tempfile::tempdir().unwrap();
    let output = out.path().join("svc");

    let err = creator(&catalog, Arc::new(LocalFilesystem::new()))
        .create_project(&request("prod", output.clone()), None)
        .unwrap_err();

    match err {
        RapidkitError::Application(ApplicationError::UnknownVariant {
            module,
            variant,
            available,
        }) => {
            assert_eq!(module, "svc");
            assert_eq!(variant, "django");
            assert_eq!(available, vec!["fastapi"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!output.exists());
}

#[test]
fn mapping_profiles_layer_ancestor_kits() {
    let (_catalog_dir, catalog) = fastapi_catalog();
    let registry = KitRegistry::load(catalog.as_ref()).unwrap();

    assert_eq!(
        registry.profile_chain("fastapi/ddd"),
        vec!["fastapi/standard", "fastapi/ddd"]
    );

    let kit = registry.get_kit("fastapi/ddd").unwrap();
    let modules: Vec<_> = kit.modules.iter().map(|m| m.module_name.as_str()).collect();
    assert_eq!(modules, vec!["settings", "logging"]);
}

#[test]
fn environment_and_user_values_follow_precedence() {
    let (_catalog_dir, catalog) = fastapi_catalog();
    let out = tempfile::tempdir().unwrap();

    let env = |pairs: &[(&str, &str)]| -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    };
    let level = |output: &Path| read(output, ".env.example");

    let a = out.path().join("a");
    creator(&catalog, Arc::new(LocalFilesystem::new()))
        .with_env(env(&[("LOG_LEVEL", "ERROR")]))
        .create_project(&request("fastapi/standard", a.clone()), None)
        .unwrap();
    assert!(level(&a).contains("LOG_LEVEL=ERROR"));

    let b = out.path().join("b");
    creator(&catalog, Arc::new(LocalFilesystem::new()))
        .with_env(env(&[("LOG_LEVEL", "ERROR"), ("RAPIDKIT_LOGGING_LEVEL", "WARNING")]))
        .create_project(&request("fastapi/standard", b.clone()), None)
        .unwrap();
    assert!(level(&b).contains("LOG_LEVEL=WARNING"));

    let c = out.path().join("c");
    let mut req = request("fastapi/standard", c.clone());
    req.variables.insert("level".into(), Value::from("CRITICAL"));
    creator(&catalog, Arc::new(LocalFilesystem::new()))
        .with_env(env(&[("RAPIDKIT_LOGGING_LEVEL", "WARNING")]))
        .create_project(&req, None)
        .unwrap();
    assert!(level(&c).contains("LOG_LEVEL=CRITICAL"));
}

#[test]
fn dry_run_touches_only_memory() {
    let (_catalog_dir, catalog) = fastapi_catalog();
    let out = tempfile::tempdir().unwrap();
    let output = out.path().join("svc");
    let memory = MemoryFilesystem::new();

    let report = creator(&catalog, Arc::new(memory.clone()))
        .create_project(&request("fastapi/standard", output.clone()), None)
        .unwrap();

    assert!(!output.exists());
    assert_eq!(report.files.len(), 6);
    assert!(
        memory
            .read_file(&output.join("pyproject.toml"))
            .unwrap()
            .contains("structlog")
    );
}

#[test]
fn undefined_template_variable_names_module_and_file() {
    let (catalog_dir, catalog) = minimal_catalog();
    write(catalog_dir.path(), "modules/svc/templates/y.tmpl", "{{ nope }}\n");
    let out = tempfile::tempdir().unwrap();
    let output = out.path().join("svc");

    let err = creator(&catalog, Arc::new(LocalFilesystem::new()))
        .create_project(&request("prod", output), None)
        .unwrap_err();

    match err {
        RapidkitError::Application(ApplicationError::Generator { module, file, source }) => {
            assert_eq!(module, "svc");
            assert_eq!(file, Some(PathBuf::from("app/y.py")));
            assert!(source.to_string().contains("nope"), "{source}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn add_module_extends_existing_project() {
    let (_catalog_dir, catalog) = fastapi_catalog();
    let out = tempfile::tempdir().unwrap();
    let project = out.path().join("svc");
    let creator = creator(&catalog, Arc::new(LocalFilesystem::new()));

    creator
        .create_project(&request("fastapi/ddd", project.clone()), None)
        .unwrap();
    fs::write(project.join("src/settings.py"), "# mine\n# <<<inject:settings-fields>>>\n").unwrap();

    let report = creator
        .add_module(
            &AddModuleRequest {
                project_dir: project.clone(),
                module_name: "settings".into(),
                variant: "fastapi".into(),
                ..AddModuleRequest::default()
            },
            None,
        )
        .unwrap();

    assert!(report.skipped.contains(&project.join("src/settings.py")));
    assert_eq!(
        read(&project, "src/settings.py"),
        "# mine\n# <<<inject:settings-fields>>>\n"
    );
}
