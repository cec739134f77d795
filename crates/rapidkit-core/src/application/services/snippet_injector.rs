//! Snippet Injector - merges rendered snippets into project files.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::{
    application::{
        ports::ModuleSource,
        services::{ScopedRenderer, StructureBuilder},
    },
    domain::{
        ModuleManifest, RenderContext, Snippet, SnippetSchema, SnippetSyntax,
        snippet::inject, validate_snippet_schema,
    },
    error::RapidkitResult,
};

/// What happened to one snippet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectionOutcome {
    /// Target content changed and was written.
    Injected(PathBuf),
    /// The snippet was already present.
    Unchanged(PathBuf),
    /// Validation failed; the target was not touched.
    Skipped { snippet: String },
}

/// Snippet results for one module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnippetReport {
    pub injected: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

pub struct SnippetInjector {
    modules: Arc<dyn ModuleSource>,
}

impl SnippetInjector {
    pub fn new(modules: Arc<dyn ModuleSource>) -> Self {
        Self { modules }
    }

    /// New content of `target` with `snippet_text` merged under `anchor`.
    /// A missing target is treated as empty. Nothing is written.
    pub fn inject(
        &self,
        builder: &StructureBuilder,
        target: &str,
        snippet_text: &str,
        anchor: &str,
        schema: Option<&SnippetSchema>,
    ) -> RapidkitResult<String> {
        let existing = builder.read_file(target)?.unwrap_or_default();
        let syntax = SnippetSyntax::detect(target);
        Ok(inject(&existing, snippet_text, anchor, syntax, schema, target)?)
    }

    /// Validate, inject and write one rendered snippet.
    ///
    /// Validation problems are pushed onto `warnings`; an invalid snippet is
    /// skipped. Structural damage to the target is an error.
    pub fn apply(
        &self,
        builder: &StructureBuilder,
        snippet: &Snippet,
        text: &str,
        warnings: &mut Vec<String>,
    ) -> RapidkitResult<InjectionOutcome> {
        let validation = validate_snippet_schema(text, snippet.syntax(), snippet.schema.as_ref());
        for message in &validation.warnings {
            warn!(snippet = %snippet.id, target = %snippet.target, "{message}");
            warnings.push(format!("{} ({}): {message}", snippet.id, snippet.target));
        }
        if !validation.valid {
            return Ok(InjectionOutcome::Skipped {
                snippet: snippet.id.clone(),
            });
        }

        let before = builder.read_file(&snippet.target)?;
        let content = self.inject(
            builder,
            &snippet.target,
            text,
            &snippet.anchor,
            snippet.schema.as_ref(),
        )?;

        if before.as_deref() == Some(content.as_str()) {
            debug!(snippet = %snippet.id, "Snippet already present");
            return Ok(InjectionOutcome::Unchanged(builder.resolve(&snippet.target)?));
        }

        let outcome = builder.write_file(&snippet.target, &content, true)?;
        debug!(snippet = %snippet.id, target = %snippet.target, "Snippet injected");
        Ok(InjectionOutcome::Injected(outcome.path().to_path_buf()))
    }

    /// Render and inject every snippet of `manifest` that applies to
    /// `variant`, in declared order.
    #[instrument(skip_all, fields(module = %manifest.name, variant = %variant))]
    pub fn apply_module_snippets(
        &self,
        builder: &StructureBuilder,
        manifest: &ModuleManifest,
        variant: &str,
        renderer: &ScopedRenderer,
        context: &RenderContext,
    ) -> RapidkitResult<SnippetReport> {
        let mut report = SnippetReport::default();
        let Some(config) = manifest.snippets_config() else {
            return Ok(report);
        };

        let snippets = self.modules.load_snippets(&manifest.name, config)?;
        for snippet in snippets.iter().filter(|s| s.applies_to(variant)) {
            let text = renderer.render(&snippet.template, context)?;
            if let InjectionOutcome::Injected(path) =
                self.apply(builder, snippet, &text, &mut report.warnings)?
            {
                if !report.injected.contains(&path) {
                    report.injected.push(path);
                }
            }
        }

        Ok(report)
    }
}
