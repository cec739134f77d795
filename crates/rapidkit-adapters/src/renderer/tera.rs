//! Tera-backed template renderer.
//!
//! Every render builds a fresh engine, so templates never see each other
//! and rendering stays a pure function of (template text, context).
//! Autoescaping is off: the outputs are source files, not HTML.

use std::collections::HashMap;
use std::path::Path;

use rapidkit_core::{
    application::{ApplicationError, ports::TemplateRenderer},
    domain::{RenderContext, to_kebab_case, to_pascal_case, to_snake_case},
    error::RapidkitResult,
};
use serde_json::Value;
use tera::{Context, Tera};
use tracing::{instrument, trace};

#[derive(Debug, Default, Clone, Copy)]
pub struct TeraRenderer;

impl TeraRenderer {
    pub fn new() -> Self {
        Self
    }

    fn engine() -> Tera {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.register_filter("snake_case", case_filter(to_snake_case));
        tera.register_filter("kebab_case", case_filter(to_kebab_case));
        tera.register_filter("pascal_case", case_filter(to_pascal_case));
        tera
    }

    fn render_source(
        &self,
        name: &str,
        source: &str,
        context: &RenderContext,
    ) -> RapidkitResult<String> {
        let ctx = Context::from_serialize(context.as_map()).map_err(|e| {
            ApplicationError::Template {
                template: name.to_string(),
                reason: format_tera_error(&e),
            }
        })?;

        let rendered = Self::engine()
            .render_str(source, &ctx)
            .map_err(|e| ApplicationError::Template {
                template: name.to_string(),
                reason: format_tera_error(&e),
            })?;
        trace!(template = %name, bytes = rendered.len(), "Rendered");
        Ok(rendered)
    }
}

impl TemplateRenderer for TeraRenderer {
    #[instrument(skip(self, context), fields(template = %template_path.display()))]
    fn render_file(&self, template_path: &Path, context: &RenderContext) -> RapidkitResult<String> {
        let source = std::fs::read_to_string(template_path).map_err(|e| {
            ApplicationError::Template {
                template: template_path.display().to_string(),
                reason: format!("cannot read template: {e}"),
            }
        })?;
        self.render_source(&template_path.display().to_string(), &source, context)
    }

    fn render_str(
        &self,
        name: &str,
        source: &str,
        context: &RenderContext,
    ) -> RapidkitResult<String> {
        self.render_source(name, source, context)
    }
}

fn case_filter(
    convert: fn(&str) -> String,
) -> impl Fn(&Value, &HashMap<String, Value>) -> tera::Result<Value> + Sync + Send {
    move |value, _| match value {
        Value::String(s) => Ok(Value::String(convert(s))),
        other => Err(tera::Error::msg(format!(
            "case filters expect a string, got {other}"
        ))),
    }
}

/// Flatten a Tera error chain into one readable message.
fn format_tera_error(error: &tera::Error) -> String {
    use std::error::Error;

    let mut messages = Vec::new();
    let mut current: Option<&dyn Error> = Some(error);
    while let Some(err) = current {
        let cleaned = err
            .to_string()
            .replace("while rendering '__tera_one_off'", "")
            .replace("Failed to render '__tera_one_off'", "")
            .replace("Failed to parse '__tera_one_off'", "syntax error")
            .replace("'__tera_one_off'", "template")
            .trim()
            .to_string();
        if !cleaned.is_empty() && !messages.contains(&cleaned) {
            messages.push(cleaned);
        }
        current = err.source();
    }

    if messages.is_empty() {
        "template rendering failed".to_string()
    } else {
        messages.join(": ")
    }
}
