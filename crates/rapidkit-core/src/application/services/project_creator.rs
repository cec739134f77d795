//! Project Creator - the top-level orchestrator.
//!
//! A run moves through these phases:
//!
//! ```text
//! Plan -> PrepareOutput -> RenderModules -> InjectSnippets -> SyncManifests -> Done
//!   \__________________________ any error ____________________________/-> Failed
//! ```
//!
//! Plan resolves the kit, the variables and every module (manifest, variant,
//! context) before the output directory is touched, so configuration errors
//! never leave files behind. On `Failed` with `force`, the output directory
//! is removed if it was prepared; without `force` partial files stay for
//! inspection.

use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    application::{
        ApplicationError,
        ports::{Filesystem, ModuleSource, TemplateRenderer, VariablePrompt},
        services::{
            DependencySynchronizer, GenerationInputs, KitRegistry, ModuleGenerator,
            PreparedModule, SnippetInjector, StructureBuilder,
        },
    },
    domain::{
        DomainValidator as validator, Ecosystem, ModuleRef, Requirement, VariableSchema,
    },
    error::{RapidkitError, RapidkitResult},
};

/// Lifecycle of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Plan,
    PrepareOutput,
    RenderModules,
    InjectSnippets,
    SyncManifests,
    Done,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Plan => "plan",
            Self::PrepareOutput => "prepare_output",
            Self::RenderModules => "render_modules",
            Self::InjectSnippets => "inject_snippets",
            Self::SyncManifests => "sync_manifests",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreateRequest {
    pub kit_name: String,
    pub project_name: String,
    pub output_dir: PathBuf,
    pub variables: BTreeMap<String, Value>,
    /// Clean an existing output directory first, and remove it on failure.
    pub force: bool,
    /// Ask for missing variables instead of failing.
    pub interactive: bool,
    /// Log every module's render context.
    pub debug: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AddModuleRequest {
    pub project_dir: PathBuf,
    pub module_name: String,
    pub variant: String,
    pub variables: BTreeMap<String, Value>,
    /// Overwrite existing variant files.
    pub force: bool,
    pub interactive: bool,
    /// Take variables and ecosystem from this kit; shared defaults otherwise.
    pub kit_name: Option<String>,
}

/// Aggregated result of a run, reported once at `Done`.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectReport {
    pub run_id: Uuid,
    pub kit: Option<String>,
    pub project_name: String,
    pub output_dir: PathBuf,
    /// Every path written, in write order, without duplicates.
    pub files: Vec<PathBuf>,
    /// Existing files left untouched.
    pub skipped: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

impl ProjectReport {
    fn new(kit: Option<String>, project_name: &str, output_dir: &Path) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            kit,
            project_name: project_name.to_string(),
            output_dir: output_dir.to_path_buf(),
            files: Vec::new(),
            skipped: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn add_file(&mut self, path: PathBuf) {
        if !self.files.contains(&path) {
            self.files.push(path);
        }
    }
}

/// One module of the plan, with the generator that prepared it.
struct PlannedModule {
    generator: ModuleGenerator,
    prepared: PreparedModule,
}

/// Inputs shared by every module of a run.
struct RunSettings<'a> {
    project_name: &'a str,
    kit_schema: &'a VariableSchema,
    interactive: bool,
    debug: bool,
}

pub struct ProjectCreator {
    kits: KitRegistry,
    modules: Arc<dyn ModuleSource>,
    renderer: Arc<dyn TemplateRenderer>,
    filesystem: Arc<dyn Filesystem>,
    env: BTreeMap<String, String>,
}

impl ProjectCreator {
    pub fn new(
        kits: KitRegistry,
        modules: Arc<dyn ModuleSource>,
        renderer: Arc<dyn TemplateRenderer>,
        filesystem: Arc<dyn Filesystem>,
    ) -> Self {
        Self {
            kits,
            modules,
            renderer,
            filesystem,
            env: BTreeMap::new(),
        }
    }

    /// Environment snapshot used for variable overrides.
    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }

    pub fn kits(&self) -> &KitRegistry {
        &self.kits
    }

    /// Create a project from a kit.
    ///
    /// # Errors
    /// `KitNotFound`, `UnknownVariant`, `VariableMissing`, `InvalidVariable`,
    /// `OutputExists`, template and filesystem errors. Module failures are
    /// annotated with the module (and file, when known).
    #[instrument(
        skip_all,
        fields(
            kit = %request.kit_name,
            project = %request.project_name,
            output = %request.output_dir.display()
        )
    )]
    pub fn create_project(
        &self,
        request: &CreateRequest,
        prompt: Option<&dyn VariablePrompt>,
    ) -> RapidkitResult<ProjectReport> {
        let builder = StructureBuilder::new(self.filesystem.clone(), &request.output_dir);
        let mut report = ProjectReport::new(
            Some(request.kit_name.clone()),
            &request.project_name,
            &request.output_dir,
        );
        let mut phase = Phase::Plan;
        info!(run_id = %report.run_id, phase = %phase, "Creating project");

        match self.run_create(request, prompt, &builder, &mut phase, &mut report) {
            Ok(()) => {
                transition(&mut phase, Phase::Done);
                info!(files = report.files.len(), warnings = report.warnings.len(), "Project created");
                Ok(report)
            }
            Err(e) => {
                let failed_at = phase;
                transition(&mut phase, Phase::Failed);
                warn!(failed_at = %failed_at, error = %e, "Project creation failed");

                if request.force && failed_at != Phase::Plan {
                    if let Err(cleanup) = builder.clean_output() {
                        warn!(error = %cleanup, "Failed to remove output after error");
                    }
                } else if failed_at != Phase::Plan {
                    info!("Partial output left in place for inspection");
                }
                Err(e)
            }
        }
    }

    fn run_create(
        &self,
        request: &CreateRequest,
        prompt: Option<&dyn VariablePrompt>,
        builder: &StructureBuilder,
        phase: &mut Phase,
        report: &mut ProjectReport,
    ) -> RapidkitResult<()> {
        // Plan
        let kit = self.kits.get_kit(&request.kit_name)?;
        let mut values = request.variables.clone();
        values.insert("project_name".into(), Value::from(request.project_name.as_str()));
        self.resolve_kit_values(&kit.variables, &mut values, request.interactive, prompt)?;

        let settings = RunSettings {
            project_name: &request.project_name,
            kit_schema: &kit.variables,
            interactive: request.interactive,
            debug: request.debug,
        };
        let mut plan = Vec::with_capacity(kit.modules.len());
        for module in &kit.modules {
            plan.push(self.plan_module(module, &settings, &mut values, prompt)?);
        }
        debug!(modules = plan.len(), chain = ?kit.profile_chain, "Plan ready");

        transition(phase, Phase::PrepareOutput);
        if self.filesystem.exists(builder.root()) {
            if request.force {
                builder.clean_output()?;
            } else if !self.filesystem.is_dir_empty(builder.root())? {
                return Err(ApplicationError::OutputExists {
                    path: builder.root().to_path_buf(),
                }
                .into());
            }
        }
        builder.ensure_root()?;

        self.materialize(&plan, builder, kit.ecosystem, true, phase, report)
    }

    /// Generate one module into an existing project.
    #[instrument(
        skip_all,
        fields(
            module = %request.module_name,
            variant = %request.variant,
            project = %request.project_dir.display()
        )
    )]
    pub fn add_module(
        &self,
        request: &AddModuleRequest,
        prompt: Option<&dyn VariablePrompt>,
    ) -> RapidkitResult<ProjectReport> {
        if !self.filesystem.exists(&request.project_dir) {
            return Err(ApplicationError::Filesystem {
                path: request.project_dir.clone(),
                reason: "project directory does not exist".into(),
            }
            .into());
        }
        let builder = StructureBuilder::new(self.filesystem.clone(), &request.project_dir);

        let (kit_schema, ecosystem) = match &request.kit_name {
            Some(name) => {
                let kit = self.kits.get_kit(name)?;
                (kit.variables, kit.ecosystem)
            }
            None => (self.kits.shared_variables().clone(), detect_ecosystem(&builder)),
        };

        let project_name = request
            .variables
            .get("project_name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| {
                request
                    .project_dir
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "project".to_string());

        let mut report = ProjectReport::new(
            request.kit_name.clone(),
            &project_name,
            &request.project_dir,
        );
        let mut phase = Phase::Plan;
        info!(run_id = %report.run_id, phase = %phase, "Adding module");

        let mut values = request.variables.clone();
        values.insert("project_name".into(), Value::from(project_name.as_str()));
        let settings = RunSettings {
            project_name: &project_name,
            kit_schema: &kit_schema,
            interactive: request.interactive,
            debug: false,
        };
        let module = ModuleRef::new(request.module_name.clone(), request.variant.clone());

        let result = self
            .plan_module(&module, &settings, &mut values, prompt)
            .and_then(|planned| {
                self.materialize(
                    &[planned],
                    &builder,
                    ecosystem,
                    request.force,
                    &mut phase,
                    &mut report,
                )
            });

        match result {
            Ok(()) => {
                transition(&mut phase, Phase::Done);
                Ok(report)
            }
            Err(e) => {
                transition(&mut phase, Phase::Failed);
                Err(e)
            }
        }
    }

    /// Render, inject and sync an already planned set of modules.
    fn materialize(
        &self,
        plan: &[PlannedModule],
        builder: &StructureBuilder,
        ecosystem: Ecosystem,
        overwrite_variants: bool,
        phase: &mut Phase,
        report: &mut ProjectReport,
    ) -> RapidkitResult<()> {
        transition(phase, Phase::RenderModules);
        for planned in plan {
            let outcome = planned
                .generator
                .render(&planned.prepared, builder, overwrite_variants)?;
            for path in outcome.written {
                report.add_file(path);
            }
            for path in outcome.skipped {
                report
                    .warnings
                    .push(format!("kept existing file {}", path.display()));
                report.skipped.push(path);
            }
        }

        transition(phase, Phase::InjectSnippets);
        let injector = SnippetInjector::new(self.modules.clone());
        for planned in plan {
            let PreparedModule {
                manifest,
                variant,
                context,
            } = &planned.prepared;
            let module = planned.generator.module_name();
            let renderer = planned
                .generator
                .create_renderer()
                .map_err(|e| ApplicationError::generator(module, None, e))?;
            let snippets = injector
                .apply_module_snippets(builder, manifest, variant, &renderer, context)
                .map_err(|e| ApplicationError::generator(module, None, e))?;
            for path in snippets.injected {
                report.add_file(path);
            }
            report.warnings.extend(snippets.warnings);
        }

        transition(phase, Phase::SyncManifests);
        let requirements = collect_requirements(plan);
        let changed = DependencySynchronizer::new().sync_module_dependencies(
            builder,
            ecosystem,
            &requirements,
        )?;
        for path in changed {
            report.add_file(path);
        }

        Ok(())
    }

    /// Fill in kit-level values: coerce, prompt or fail on missing, validate.
    fn resolve_kit_values(
        &self,
        schema: &VariableSchema,
        values: &mut BTreeMap<String, Value>,
        interactive: bool,
        prompt: Option<&dyn VariablePrompt>,
    ) -> RapidkitResult<()> {
        *values = schema.coerce_values(values);

        let missing: Vec<String> = schema
            .missing(values)
            .into_iter()
            .filter(|name| !self.env_provides(schema, name))
            .collect();
        if !missing.is_empty() {
            self.fill_missing(schema, &missing, values, interactive, prompt)?;
        }

        validator::validate_values(schema, values)?;
        Ok(())
    }

    /// Prepare one module, prompting once for its missing variables when
    /// running interactively.
    fn plan_module(
        &self,
        module: &ModuleRef,
        settings: &RunSettings<'_>,
        values: &mut BTreeMap<String, Value>,
        prompt: Option<&dyn VariablePrompt>,
    ) -> RapidkitResult<PlannedModule> {
        let generator = self.generator_for(module, settings, values);
        let prepared = match generator.prepare(&module.variant) {
            Err(RapidkitError::Application(ApplicationError::VariableMissing { names }))
                if settings.interactive && prompt.is_some() =>
            {
                let manifest = generator.load_module_config()?;
                let declared = generator.declared_variables(&manifest);
                self.fill_missing(&declared, &names, values, true, prompt)?;
                let generator = self.generator_for(module, settings, values);
                let prepared = generator.prepare(&module.variant)?;
                return Ok(self.planned(generator, prepared, settings));
            }
            other => other?,
        };
        Ok(self.planned(generator, prepared, settings))
    }

    fn planned(
        &self,
        generator: ModuleGenerator,
        prepared: PreparedModule,
        settings: &RunSettings<'_>,
    ) -> PlannedModule {
        if settings.debug {
            let context = serde_json::to_string(&prepared.context).unwrap_or_default();
            info!(module = %prepared.manifest.name, %context, "Render context");
        }
        PlannedModule {
            generator,
            prepared,
        }
    }

    fn generator_for(
        &self,
        module: &ModuleRef,
        settings: &RunSettings<'_>,
        values: &BTreeMap<String, Value>,
    ) -> ModuleGenerator {
        ModuleGenerator::new(
            module.module_name.clone(),
            self.modules.clone(),
            self.renderer.clone(),
            GenerationInputs {
                project_name: settings.project_name.to_string(),
                kit_schema: settings.kit_schema.clone(),
                config_overrides: module.config.clone(),
                user_values: values.clone(),
                env: self.env.clone(),
            },
        )
    }

    fn fill_missing(
        &self,
        schema: &VariableSchema,
        missing: &[String],
        values: &mut BTreeMap<String, Value>,
        interactive: bool,
        prompt: Option<&dyn VariablePrompt>,
    ) -> RapidkitResult<()> {
        let prompt = match prompt {
            Some(p) if interactive => p,
            _ => {
                return Err(ApplicationError::VariableMissing {
                    names: missing.to_vec(),
                }
                .into());
            }
        };

        for name in missing {
            let definition = schema.get(name).cloned().unwrap_or_default();
            let answer = prompt.prompt(name, &definition)?;
            let value = match &answer {
                Value::String(raw) => definition.coerce(raw),
                _ => answer,
            };
            definition.validate_value(name, &value)?;
            values.insert(name.clone(), value);
        }
        Ok(())
    }

    fn env_provides(&self, schema: &VariableSchema, name: &str) -> bool {
        schema
            .get(name)
            .and_then(|d| d.env_var.as_ref())
            .is_some_and(|var| self.env.contains_key(var))
    }
}

fn transition(phase: &mut Phase, next: Phase) {
    debug!(from = %phase, to = %next, "Phase transition");
    *phase = next;
    if next != Phase::Failed {
        info!(phase = %next, "Entering phase");
    }
}

/// Requirements of every module, deduplicated by name; the first module to
/// declare a package wins.
fn collect_requirements(plan: &[PlannedModule]) -> Vec<Requirement> {
    let mut seen = HashSet::new();
    plan.iter()
        .flat_map(|p| p.prepared.manifest.dependencies_for(&p.prepared.variant))
        .filter(|dep| seen.insert(dep.name.to_ascii_lowercase()))
        .map(|dep| Requirement::from(&dep))
        .collect()
}

fn detect_ecosystem(builder: &StructureBuilder) -> Ecosystem {
    if builder.exists("package.json") && !builder.exists("pyproject.toml") {
        Ecosystem::Node
    } else {
        Ecosystem::Python
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::testing::{MemFs, StubCatalog, StubRenderer};
    use crate::domain::{
        DependencySpec, DomainError, KitManifest, ModuleManifest, Snippet, VariableDef,
        profile::ProfileSpec,
    };
    use serde_json::json;
    use std::cell::RefCell;

    const LOGGING: &str = r#"
name: logging
version: 1.0.0
variables:
  log_level:
    type: choice
    choices: [DEBUG, INFO]
    default: INFO
dependencies:
  common:
    - name: structlog
      version: "^24.1.0"
generation:
  vendor:
    root: vendor
    files:
      - template: x.tmpl
        relative: x.py
  variants:
    fastapi:
      files:
        - template: y.tmpl
          output: app/y.py
  snippets:
    config: snippets.yaml
"#;

    fn kit(name: &str, modules: Vec<ModuleRef>) -> KitManifest {
        KitManifest {
            name: name.into(),
            version: "1.0.0".into(),
            description: String::new(),
            ecosystem: Ecosystem::Python,
            inherits: None,
            variables: VariableSchema::new(),
            modules,
        }
    }

    fn catalog() -> StubCatalog {
        let manifest: ModuleManifest = serde_yaml::from_str(LOGGING).unwrap();
        let profiles: ProfileSpec =
            serde_yaml::from_str("[base, \"dev: inherits base\", \"prod: inherits dev\"]").unwrap();

        let mut catalog = StubCatalog {
            kits: vec![
                kit("base", Vec::new()),
                kit("dev", Vec::new()),
                kit("prod", vec![ModuleRef::new("logging", "fastapi")]),
            ],
            profiles: profiles.into(),
            ..StubCatalog::default()
        };
        catalog.modules.insert("logging".into(), manifest);
        catalog.snippets.insert(
            "logging".into(),
            vec![Snippet {
                id: "env".into(),
                template: "env.tmpl".into(),
                anchor: "# <<<inject:env>>>".into(),
                target: ".env.example".into(),
                schema: None,
                variants: Vec::new(),
                description: None,
            }],
        );
        catalog
    }

    fn renderer() -> StubRenderer {
        let root = StubCatalog::templates_dir("logging");
        StubRenderer::default()
            .with(root.join("x.tmpl"), "# vendor {{ vendor_module }}\n")
            .with(root.join("y.tmpl"), "# {{ project_name }} {{ log_level }}\n")
            .with(root.join("env.tmpl"), "LOG_LEVEL={{ log_level }}\n")
    }

    fn creator_with(catalog: StubCatalog, fs: Arc<MemFs>) -> ProjectCreator {
        let catalog = Arc::new(catalog);
        let kits = KitRegistry::load(catalog.as_ref()).unwrap();
        ProjectCreator::new(kits, catalog, Arc::new(renderer()), fs)
    }

    fn request() -> CreateRequest {
        CreateRequest {
            kit_name: "prod".into(),
            project_name: "demo".into(),
            output_dir: PathBuf::from("/out"),
            ..CreateRequest::default()
        }
    }

    #[test]
    fn creates_vendor_variant_snippet_and_manifest() {
        let fs = Arc::new(MemFs::default());
        let creator = creator_with(catalog(), fs.clone());

        let report = creator.create_project(&request(), None).unwrap();

        assert_eq!(
            report.files,
            vec![
                PathBuf::from("/out/vendor/x.py"),
                PathBuf::from("/out/app/y.py"),
                PathBuf::from("/out/.env.example"),
                PathBuf::from("/out/pyproject.toml"),
            ]
        );
        assert_eq!(fs.read("/out/vendor/x.py").as_deref(), Some("# vendor logging@1.0.0\n"));
        assert_eq!(fs.read("/out/app/y.py").as_deref(), Some("# demo INFO\n"));
        assert!(fs.read("/out/pyproject.toml").unwrap().contains("structlog = \"^24.1.0\""));
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn user_values_reach_templates() {
        let fs = Arc::new(MemFs::default());
        let creator = creator_with(catalog(), fs.clone());
        let mut request = request();
        request.variables.insert("log_level".into(), json!("DEBUG"));

        creator.create_project(&request, None).unwrap();
        assert_eq!(fs.read("/out/app/y.py").as_deref(), Some("# demo DEBUG\n"));
        assert_eq!(fs.read("/out/.env.example").as_deref(), Some("# <<<inject:env>>>\nLOG_LEVEL=DEBUG\n"));
    }

    #[test]
    fn unknown_kit_is_not_found() {
        let fs = Arc::new(MemFs::default());
        let creator = creator_with(catalog(), fs.clone());
        let mut request = request();
        request.kit_name = "nope".into();

        let err = creator.create_project(&request, None).unwrap_err();
        assert!(matches!(
            err,
            RapidkitError::Application(ApplicationError::KitNotFound { .. })
        ));
        assert!(fs.file_paths().is_empty());
    }

    #[test]
    fn non_empty_output_without_force_is_refused() {
        let fs = Arc::new(MemFs::default());
        fs.seed("/out/keep.txt", "mine");
        let creator = creator_with(catalog(), fs.clone());

        let err = creator.create_project(&request(), None).unwrap_err();
        assert!(matches!(
            err,
            RapidkitError::Application(ApplicationError::OutputExists { .. })
        ));
        assert_eq!(fs.file_paths(), vec![PathBuf::from("/out/keep.txt")]);
    }

    #[test]
    fn force_cleans_and_is_deterministic() {
        let fs = Arc::new(MemFs::default());
        fs.seed("/out/stale.txt", "old");
        let creator = creator_with(catalog(), fs.clone());
        let mut request = request();
        request.force = true;

        creator.create_project(&request, None).unwrap();
        let first: Vec<_> = fs.file_paths().into_iter().map(|p| (fs.read(&p), p)).collect();
        creator.create_project(&request, None).unwrap();
        let second: Vec<_> = fs.file_paths().into_iter().map(|p| (fs.read(&p), p)).collect();

        assert_eq!(first, second);
        assert!(fs.read("/out/stale.txt").is_none());
    }

    #[test]
    fn unknown_variant_writes_nothing() {
        let mut catalog = catalog();
        catalog.kits[2].modules = vec![ModuleRef::new("logging", "django")];
        let fs = Arc::new(MemFs::default());
        let creator = creator_with(catalog, fs.clone());

        let err = creator.create_project(&request(), None).unwrap_err();
        assert!(matches!(
            err,
            RapidkitError::Application(ApplicationError::UnknownVariant { .. })
        ));
        assert!(fs.file_paths().is_empty());
    }

    #[test]
    fn missing_variable_without_prompt_fails_in_plan() {
        let mut catalog = catalog();
        catalog.kits[2]
            .variables
            .insert("api_key", VariableDef { required: Some(true), ..VariableDef::string() });
        let fs = Arc::new(MemFs::default());
        let creator = creator_with(catalog, fs.clone());

        let err = creator.create_project(&request(), None).unwrap_err();
        match err {
            RapidkitError::Application(ApplicationError::VariableMissing { names }) => {
                assert_eq!(names, vec!["api_key"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(fs.file_paths().is_empty());
    }

    #[test]
    fn interactive_prompt_fills_missing_values() {
        let mut catalog = catalog();
        catalog.kits[2]
            .variables
            .insert("workers", VariableDef { var_type: Some(crate::domain::VariableType::Int), ..VariableDef::default() });
        let fs = Arc::new(MemFs::default());
        let creator = creator_with(catalog, fs.clone());

        let asked = RefCell::new(Vec::new());
        let prompt = |name: &str, _: &VariableDef| -> RapidkitResult<Value> {
            asked.borrow_mut().push(name.to_string());
            Ok(json!("4"))
        };
        let mut request = request();
        request.interactive = true;

        creator.create_project(&request, Some(&prompt)).unwrap();
        assert_eq!(*asked.borrow(), vec!["workers"]);
    }

    #[test]
    fn env_override_applies_to_module() {
        let fs = Arc::new(MemFs::default());
        let mut env = BTreeMap::new();
        env.insert("RAPIDKIT_LOGGING_LOG_LEVEL".to_string(), "DEBUG".to_string());
        let creator = creator_with(catalog(), fs.clone()).with_env(env);

        creator.create_project(&request(), None).unwrap();
        assert_eq!(fs.read("/out/app/y.py").as_deref(), Some("# demo DEBUG\n"));
    }

    #[test]
    fn invalid_user_value_is_rejected() {
        let fs = Arc::new(MemFs::default());
        let creator = creator_with(catalog(), fs.clone());
        let mut request = request();
        request.variables.insert("license".into(), json!("WTFPL"));

        let err = creator.create_project(&request, None).unwrap_err();
        assert!(matches!(
            err,
            RapidkitError::Domain(DomainError::InvalidVariable { .. })
        ));
    }

    #[test]
    fn failure_with_force_removes_output() {
        let mut catalog = catalog();
        // second module renders a template the renderer does not know
        let mut broken: ModuleManifest = serde_yaml::from_str(LOGGING).unwrap();
        broken.name = "broken".into();
        broken.generation.vendor.files.clear();
        broken.generation.snippets = None;
        catalog.modules.insert("broken".into(), broken);
        catalog.kits[2].modules.push(ModuleRef::new("broken", "fastapi"));

        let fs = Arc::new(MemFs::default());
        let creator = creator_with(catalog, fs.clone());
        let mut request = request();
        request.force = true;

        let err = creator.create_project(&request, None).unwrap_err();
        assert!(matches!(
            err,
            RapidkitError::Application(ApplicationError::Generator { ref module, .. }) if module == "broken"
        ));
        assert!(fs.file_paths().is_empty());
    }

    #[test]
    fn failure_without_force_keeps_partial_output() {
        let mut catalog = catalog();
        let mut broken: ModuleManifest = serde_yaml::from_str(LOGGING).unwrap();
        broken.name = "broken".into();
        broken.generation.vendor.files.clear();
        catalog.modules.insert("broken".into(), broken);
        catalog.kits[2].modules.push(ModuleRef::new("broken", "fastapi"));

        let fs = Arc::new(MemFs::default());
        let creator = creator_with(catalog, fs.clone());

        assert!(creator.create_project(&request(), None).is_err());
        assert!(fs.read("/out/app/y.py").is_some());
    }

    #[test]
    fn dependencies_deduplicate_first_wins() {
        let mut catalog = catalog();
        let mut second: ModuleManifest = serde_yaml::from_str(LOGGING).unwrap();
        second.name = "tracing".into();
        second.generation.vendor.files.clear();
        second.generation.variants.get_mut("fastapi").unwrap().files.clear();
        second.generation.snippets = None;
        second.dependencies.insert(
            "common".into(),
            vec![
                DependencySpec {
                    name: "structlog".into(),
                    version_spec: "^99.0.0".into(),
                    extras: Vec::new(),
                },
                DependencySpec {
                    name: "opentelemetry-api".into(),
                    version_spec: "^1.25.0".into(),
                    extras: Vec::new(),
                },
            ],
        );
        catalog.modules.insert("tracing".into(), second);
        catalog.kits[2].modules.push(ModuleRef::new("tracing", "fastapi"));

        let fs = Arc::new(MemFs::default());
        let creator = creator_with(catalog, fs.clone());
        creator.create_project(&request(), None).unwrap();

        let pyproject = fs.read("/out/pyproject.toml").unwrap();
        assert!(pyproject.contains("structlog = \"^24.1.0\""));
        assert!(pyproject.contains("opentelemetry-api = \"^1.25.0\""));
        assert!(!pyproject.contains("^99.0.0"));
    }

    #[test]
    fn add_module_keeps_user_files_without_force() {
        let fs = Arc::new(MemFs::default());
        fs.seed("/proj/app/y.py", "user edit\n");
        fs.seed("/proj/pyproject.toml", "[tool.poetry]\nname = \"proj\"\n");
        let creator = creator_with(catalog(), fs.clone());

        let request = AddModuleRequest {
            project_dir: PathBuf::from("/proj"),
            module_name: "logging".into(),
            variant: "fastapi".into(),
            ..AddModuleRequest::default()
        };
        let report = creator.add_module(&request, None).unwrap();

        assert_eq!(report.project_name, "proj");
        assert_eq!(report.skipped, vec![PathBuf::from("/proj/app/y.py")]);
        assert_eq!(fs.read("/proj/app/y.py").as_deref(), Some("user edit\n"));
        assert!(fs.read("/proj/vendor/x.py").is_some());
        assert!(fs.read("/proj/pyproject.toml").unwrap().contains("structlog"));
    }

    #[test]
    fn add_module_to_missing_project_fails() {
        let fs = Arc::new(MemFs::default());
        let creator = creator_with(catalog(), fs);
        let request = AddModuleRequest {
            project_dir: PathBuf::from("/nowhere"),
            module_name: "logging".into(),
            variant: "fastapi".into(),
            ..AddModuleRequest::default()
        };
        assert!(matches!(
            creator.add_module(&request, None),
            Err(RapidkitError::Application(ApplicationError::Filesystem { .. }))
        ));
    }
}
