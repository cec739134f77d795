//! Module Generator - renders one module's vendor and variant files.
//!
//! Context layering, low to high:
//!
//! 1. kit variables (shared defaults merged with the kit chain)
//! 2. module variable defaults
//! 3. kit `config` overrides for this module
//! 4. environment (`env_var`, then `RAPIDKIT_<MODULE>_<VAR>`)
//! 5. user-supplied values
//!
//! Canonical keys (`module_name`, `vendor_module`, ...) are set after the
//! variable layers and cannot be shadowed by them.

use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::{
    application::{
        ApplicationError,
        ports::{ModuleSource, TemplateRenderer},
        services::{ScopedRenderer, StructureBuilder, WriteOutcome},
    },
    domain::{
        DomainValidator as validator, ModuleManifest, RenderContext, VariableSchema,
        join_contained, to_pascal_case, to_snake_case,
    },
    error::{RapidkitError, RapidkitResult},
};

/// Everything a module needs from the surrounding run.
#[derive(Debug, Clone, Default)]
pub struct GenerationInputs {
    pub project_name: String,
    /// Shared defaults merged with the kit chain.
    pub kit_schema: VariableSchema,
    /// `config` block of the kit's reference to this module.
    pub config_overrides: BTreeMap<String, Value>,
    /// Values supplied on the command line or by prompting.
    pub user_values: BTreeMap<String, Value>,
    /// Environment snapshot; never read from the process directly.
    pub env: BTreeMap<String, String>,
}

/// A module whose manifest, variant and context have been resolved.
#[derive(Debug, Clone)]
pub struct PreparedModule {
    pub manifest: ModuleManifest,
    pub variant: String,
    pub context: RenderContext,
}

/// Files touched while rendering one module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleOutcome {
    pub written: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
}

impl ModuleOutcome {
    fn record(&mut self, outcomes: Vec<WriteOutcome>) {
        for outcome in outcomes {
            match outcome {
                WriteOutcome::Written(p) => self.written.push(p),
                WriteOutcome::Skipped(p) => self.skipped.push(p),
            }
        }
    }
}

pub struct ModuleGenerator {
    module_name: String,
    modules: Arc<dyn ModuleSource>,
    renderer: Arc<dyn TemplateRenderer>,
    inputs: GenerationInputs,
}

impl ModuleGenerator {
    pub fn new(
        module_name: impl Into<String>,
        modules: Arc<dyn ModuleSource>,
        renderer: Arc<dyn TemplateRenderer>,
        inputs: GenerationInputs,
    ) -> Self {
        Self {
            module_name: module_name.into(),
            modules,
            renderer,
            inputs,
        }
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    /// Load and validate the module's manifest.
    pub fn load_module_config(&self) -> RapidkitResult<ModuleManifest> {
        let manifest = self.modules.load_manifest(&self.module_name)?;
        validator::validate_module_manifest(&manifest)?;
        Ok(manifest)
    }

    /// Module variables layered over the kit's.
    pub fn declared_variables(&self, manifest: &ModuleManifest) -> VariableSchema {
        manifest.variables.merged_over(&self.inputs.kit_schema)
    }

    /// Variable layers up to user values, then the canonical keys.
    pub fn build_base_context(
        &self,
        manifest: &ModuleManifest,
        variant: &str,
    ) -> RapidkitResult<RenderContext> {
        let declared = self.declared_variables(manifest);
        let user = declared.coerce_values(&self.inputs.user_values);
        validator::validate_values(&declared, &self.inputs.config_overrides)?;
        validator::validate_values(&declared, &user)?;

        let mut ctx = RenderContext::new();
        ctx.extend(self.inputs.kit_schema.defaults());
        ctx.extend(manifest.variables.defaults());
        ctx.extend(self.inputs.config_overrides.clone());
        ctx.extend(user);

        ctx.insert("project_name", self.inputs.project_name.as_str());
        ctx.derive_cases("project_name");
        ctx.insert("module_name", manifest.name.as_str());
        ctx.insert("module_slug", to_snake_case(&manifest.name));
        ctx.insert("module_class_name", to_pascal_case(&manifest.name));
        ctx.insert("module_version", manifest.version.as_str());
        ctx.insert("vendor_root", manifest.generation.vendor.root.as_str());
        ctx.insert("vendor_module", manifest.vendor_module());
        ctx.insert("variant", variant);

        let outputs: Vec<Value> = manifest
            .variant(variant)
            .map(|v| v.files.iter().map(|f| Value::from(f.output.as_str())).collect())
            .unwrap_or_default();
        ctx.insert("output_paths", Value::Array(outputs));

        Ok(ctx)
    }

    /// Apply environment overrides to a copy of `ctx`, then re-assert user
    /// values so they keep the highest precedence.
    pub fn apply_base_context_overrides(
        &self,
        manifest: &ModuleManifest,
        ctx: &RenderContext,
    ) -> RapidkitResult<RenderContext> {
        let declared = self.declared_variables(manifest);
        let module_key = env_segment(&manifest.name);
        let mut out = ctx.clone();

        for (name, def) in declared.iter() {
            let scoped = format!("RAPIDKIT_{module_key}_{}", env_segment(name));
            let raw = self.inputs.env.get(&scoped).or_else(|| {
                def.env_var
                    .as_ref()
                    .and_then(|var| self.inputs.env.get(var))
            });

            if let Some(raw) = raw {
                let value = def.coerce(raw);
                def.validate_value(name, &value)?;
                debug!(module = %manifest.name, variable = %name, "Environment override");
                out.insert(name.clone(), value);
            }
        }

        out.extend(declared.coerce_values(&self.inputs.user_values));
        Ok(out)
    }

    /// Renderer bound to this module's templates.
    pub fn create_renderer(&self) -> RapidkitResult<ScopedRenderer> {
        let root = self.modules.templates_root(&self.module_name)?;
        Ok(ScopedRenderer::new(self.renderer.clone(), root))
    }

    /// Render every vendor file under the (rendered) vendor root. Vendor
    /// files are tool-owned and always overwritten.
    pub fn generate_vendor_files(
        &self,
        manifest: &ModuleManifest,
        builder: &StructureBuilder,
        renderer: &ScopedRenderer,
        ctx: &RenderContext,
    ) -> RapidkitResult<Vec<WriteOutcome>> {
        let vendor = &manifest.generation.vendor;
        let root = renderer.render_path(&vendor.root, ctx)?;
        let mut outcomes = Vec::with_capacity(vendor.files.len());

        for file in &vendor.files {
            let relative = renderer.render_path(&file.relative, ctx)?;
            let target = join_contained(&root, &relative)?;
            let content = renderer
                .render(&file.template, ctx)
                .map_err(|e| self.annotate(Some(target.as_path().to_path_buf()), e))?;
            outcomes.push(builder.write_file(target.as_path(), &content, true)?);
        }

        Ok(outcomes)
    }

    /// Render the files of one variant at their declared outputs.
    ///
    /// # Errors
    /// [`ApplicationError::UnknownVariant`] when the module has no such variant.
    pub fn generate_variant_files(
        &self,
        manifest: &ModuleManifest,
        variant: &str,
        builder: &StructureBuilder,
        renderer: &ScopedRenderer,
        ctx: &RenderContext,
        overwrite: bool,
    ) -> RapidkitResult<Vec<WriteOutcome>> {
        let spec = manifest.variant(variant).ok_or_else(|| unknown_variant(manifest, variant))?;
        let mut outcomes = Vec::with_capacity(spec.files.len());

        for file in &spec.files {
            let output = renderer.render_path(&file.output, ctx)?;
            let content = renderer
                .render(&file.template, ctx)
                .map_err(|e| self.annotate(Some(PathBuf::from(&output)), e))?;
            outcomes.push(builder.write_file(&output, &content, overwrite)?);
        }

        Ok(outcomes)
    }

    /// Everything short of writing: manifest, variant check, context and
    /// required variables.
    pub fn prepare(&self, variant: &str) -> RapidkitResult<PreparedModule> {
        let manifest = self.load_module_config().map_err(|e| self.annotate(None, e))?;
        if manifest.variant(variant).is_none() {
            return Err(unknown_variant(&manifest, variant));
        }

        let base = self
            .build_base_context(&manifest, variant)
            .map_err(|e| self.annotate(None, e))?;
        let context = self
            .apply_base_context_overrides(&manifest, &base)
            .map_err(|e| self.annotate(None, e))?;

        let missing = self.declared_variables(&manifest).missing(context.as_map());
        if !missing.is_empty() {
            return Err(ApplicationError::VariableMissing { names: missing }.into());
        }

        Ok(PreparedModule {
            manifest,
            variant: variant.to_string(),
            context,
        })
    }

    /// Write vendor files, then variant files, of a prepared module.
    pub fn render(
        &self,
        prepared: &PreparedModule,
        builder: &StructureBuilder,
        overwrite_variants: bool,
    ) -> RapidkitResult<ModuleOutcome> {
        let PreparedModule {
            manifest,
            variant,
            context,
        } = prepared;
        let renderer = self.create_renderer().map_err(|e| self.annotate(None, e))?;
        let mut outcome = ModuleOutcome::default();

        let vendor = self
            .generate_vendor_files(manifest, builder, &renderer, context)
            .map_err(|e| self.annotate(None, e))?;
        outcome.record(vendor);

        let variant_files = self
            .generate_variant_files(
                manifest,
                variant,
                builder,
                &renderer,
                context,
                overwrite_variants,
            )
            .map_err(|e| self.annotate(None, e))?;
        outcome.record(variant_files);

        debug!(
            written = outcome.written.len(),
            skipped = outcome.skipped.len(),
            "Module generated"
        );
        Ok(outcome)
    }

    /// [`prepare`](Self::prepare) then [`render`](Self::render). Nothing is
    /// written when the variant is unknown or variables are missing.
    #[instrument(skip_all, fields(module = %self.module_name, variant = %variant))]
    pub fn generate(
        &self,
        variant: &str,
        builder: &StructureBuilder,
        overwrite_variants: bool,
    ) -> RapidkitResult<(PreparedModule, ModuleOutcome)> {
        let prepared = self.prepare(variant)?;
        let outcome = self.render(&prepared, builder, overwrite_variants)?;
        Ok((prepared, outcome))
    }

    fn annotate(&self, file: Option<PathBuf>, source: RapidkitError) -> RapidkitError {
        ApplicationError::generator(self.module_name.clone(), file, source)
    }
}

fn unknown_variant(manifest: &ModuleManifest, variant: &str) -> RapidkitError {
    ApplicationError::UnknownVariant {
        module: manifest.name.clone(),
        variant: variant.to_string(),
        available: manifest.variant_names().map(str::to_string).collect(),
    }
    .into()
}

/// `free/essentials-logging` → `FREE_ESSENTIALS_LOGGING`
pub fn env_segment(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}
