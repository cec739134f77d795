//! Dependency Synchronizer - keeps project dependency manifests in step
//! with the modules that were generated.

use std::path::PathBuf;
use tracing::{debug, instrument};

use crate::{
    application::services::StructureBuilder,
    domain::{
        Ecosystem, Requirement,
        dependencies::{
            parse_dependencies_section, poetry_snippet, render_requirements,
            update_package_json, update_poetry_dependencies,
        },
    },
    error::RapidkitResult,
};

pub const PYPROJECT_FILE: &str = "pyproject.toml";
pub const REQUIREMENTS_FILE: &str = "requirements.txt";
pub const PACKAGE_JSON_FILE: &str = "package.json";

#[derive(Debug, Default, Clone, Copy)]
pub struct DependencySynchronizer;

impl DependencySynchronizer {
    pub fn new() -> Self {
        Self
    }

    /// Merge a poetry dependency snippet into `py_file`, creating the file,
    /// table and anchor as needed. Returns the path when content changed.
    pub fn filter_and_update_poetry_dependencies_snippet(
        &self,
        builder: &StructureBuilder,
        py_file: &str,
        snippet: &str,
    ) -> RapidkitResult<Option<PathBuf>> {
        let existing = builder.read_file(py_file)?;
        let updated = update_poetry_dependencies(existing.as_deref().unwrap_or(""), snippet)?;
        write_if_changed(builder, py_file, existing.as_deref(), &updated)
    }

    /// Regenerate `req_file` from the poetry table of `py_file`. Does
    /// nothing when the table is absent.
    pub fn sync_requirements_full_from_pyproject(
        &self,
        builder: &StructureBuilder,
        req_file: &str,
        py_file: &str,
    ) -> RapidkitResult<Option<PathBuf>> {
        let Some(pyproject) = builder.read_file(py_file)? else {
            return Ok(None);
        };
        let Some(section) = parse_dependencies_section(&pyproject) else {
            debug!(file = %py_file, "No poetry dependencies table");
            return Ok(None);
        };

        let existing = builder.read_file(req_file)?;
        let rendered = render_requirements(&section);
        write_if_changed(builder, req_file, existing.as_deref(), &rendered)
    }

    /// Add `requirements` to a `package.json`, never replacing user entries.
    pub fn update_package_json(
        &self,
        builder: &StructureBuilder,
        file: &str,
        requirements: &[Requirement],
    ) -> RapidkitResult<Option<PathBuf>> {
        let existing = builder.read_file(file)?;
        let updated = update_package_json(existing.as_deref(), requirements)?;
        write_if_changed(builder, file, existing.as_deref(), &updated)
    }

    /// Sync `requirements` into the manifests of `ecosystem`.
    ///
    /// Python: `pyproject.toml` is created on demand and `requirements.txt`
    /// is regenerated when the project has one. Node: `package.json`.
    #[instrument(skip_all, fields(ecosystem = %ecosystem, count = requirements.len()))]
    pub fn sync_module_dependencies(
        &self,
        builder: &StructureBuilder,
        ecosystem: Ecosystem,
        requirements: &[Requirement],
    ) -> RapidkitResult<Vec<PathBuf>> {
        if requirements.is_empty() {
            return Ok(Vec::new());
        }

        let mut changed = Vec::new();
        match ecosystem {
            Ecosystem::Python => {
                let snippet = poetry_snippet(requirements);
                changed.extend(self.filter_and_update_poetry_dependencies_snippet(
                    builder,
                    PYPROJECT_FILE,
                    &snippet,
                )?);
                if builder.exists(REQUIREMENTS_FILE) {
                    changed.extend(self.sync_requirements_full_from_pyproject(
                        builder,
                        REQUIREMENTS_FILE,
                        PYPROJECT_FILE,
                    )?);
                }
            }
            Ecosystem::Node => {
                changed.extend(self.update_package_json(builder, PACKAGE_JSON_FILE, requirements)?);
            }
        }
        Ok(changed)
    }
}

fn write_if_changed(
    builder: &StructureBuilder,
    rel: &str,
    before: Option<&str>,
    after: &str,
) -> RapidkitResult<Option<PathBuf>> {
    if before == Some(after) {
        return Ok(None);
    }
    let outcome = builder.write_file(rel, after, true)?;
    debug!(file = %rel, "Dependency manifest updated");
    Ok(Some(outcome.path().to_path_buf()))
}
