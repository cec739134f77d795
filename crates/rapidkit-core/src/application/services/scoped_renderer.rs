use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{
    application::ports::TemplateRenderer,
    domain::{RelativePath, RenderContext, module::is_templated},
    error::RapidkitResult,
};

/// A [`TemplateRenderer`] bound to one module's templates root.
///
/// Template names are checked for containment before the renderer sees
/// them, so a manifest cannot read templates outside its own module.
#[derive(Clone)]
pub struct ScopedRenderer {
    inner: Arc<dyn TemplateRenderer>,
    templates_root: PathBuf,
}

impl ScopedRenderer {
    pub fn new(inner: Arc<dyn TemplateRenderer>, templates_root: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            templates_root: templates_root.into(),
        }
    }

    pub fn templates_root(&self) -> &Path {
        &self.templates_root
    }

    /// Render a template by its path relative to the templates root.
    pub fn render(&self, template: &str, context: &RenderContext) -> RapidkitResult<String> {
        let path = RelativePath::try_new(template)?.under(&self.templates_root);
        self.inner.render_file(&path, context)
    }

    /// Render a manifest path that may carry template expressions.
    pub fn render_path(&self, raw: &str, context: &RenderContext) -> RapidkitResult<String> {
        if is_templated(raw) {
            self.inner.render_str(raw, raw, context)
        } else {
            Ok(raw.to_string())
        }
    }
}
