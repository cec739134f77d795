//! Core domain layer for RapidKit.
//!
//! Pure logic only: manifests, variable schemas, profile resolution,
//! render contexts, snippet merging and dependency manifest rewriting.
//! All I/O (filesystem, templates, catalog) happens behind the ports
//! defined in the application layer.
//!
//! - **No I/O**: every function takes text or values and returns new ones
//! - **Cloneable data**: manifests and contexts are plain `Clone + PartialEq`
//! - **Checked paths**: anything that becomes a path goes through [`RelativePath`]

pub mod context;
pub mod dependencies;
pub mod error;
pub mod kit;
pub mod module;
pub mod paths;
pub mod profile;
pub mod snippet;
pub mod value_objects;
pub mod variables;

mod validation;

pub use context::{RenderContext, to_kebab_case, to_pascal_case, to_snake_case};
pub use dependencies::{
    DEPENDENCIES_ANCHOR, DependenciesSection, POETRY_DEPENDENCIES_HEADER, Requirement,
    caret_to_range, format_requirements_lines, parse_dependencies_section,
};
pub use error::{DomainError, ErrorCategory};
pub use kit::{Kit, KitManifest, ModuleRef};
pub use module::{DependencySpec, ModuleManifest, VariantFile, VendorFile};
pub use paths::{RelativePath, join_contained};
pub use profile::{ProfileConfig, ProfileDocument, ProfileSpec, resolve_profile_chain};
pub use snippet::{
    Snippet, SnippetFile, SnippetSchema, SnippetSyntax, SnippetValidation, merge_snippets,
    validate_snippet_schema,
};
pub use validation::DomainValidator;
pub use value_objects::{Ecosystem, ModuleAccess, ModuleStatus, VariableType};
pub use variables::{
    VariableDef, VariableSchema, coerce_env_value, merge_variables, shared_defaults,
};
