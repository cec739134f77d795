//! Application layer for RapidKit.
//!
//! This layer contains:
//! - **Services**: Use case orchestration (ProjectCreator, ModuleGenerator, ...)
//! - **Ports**: Interface definitions (traits) for external dependencies
//! - **Errors**: Application-specific error types
//!
//! The application layer coordinates the domain layer but contains no
//! business logic itself. All business rules live in `crate::domain`.

pub mod error;
pub mod ports;
pub mod services;

pub use services::{
    AddModuleRequest, CreateRequest, DependencySynchronizer, KitRegistry, ModuleGenerator,
    ProjectCreator, ProjectReport, SnippetInjector, StructureBuilder,
};

// Re-export port traits (for adapter implementation)
pub use ports::{Filesystem, KitSource, ModuleSource, TemplateRenderer, VariablePrompt};

pub use error::ApplicationError;
