//! Application services - orchestrate use cases.
//!
//! Services coordinate the domain layer and ports to accomplish the
//! high-level use cases: resolve a kit, generate a module, inject snippets,
//! keep dependency manifests in step, and create a whole project.

pub mod dependency_sync;
pub mod kit_registry;
pub mod module_generator;
pub mod project_creator;
pub mod scoped_renderer;
pub mod snippet_injector;
pub mod structure_builder;

#[cfg(test)]
pub(crate) mod testing;

pub use dependency_sync::DependencySynchronizer;
pub use kit_registry::KitRegistry;
pub use module_generator::{GenerationInputs, ModuleGenerator, ModuleOutcome, PreparedModule};
pub use project_creator::{AddModuleRequest, CreateRequest, Phase, ProjectCreator, ProjectReport};
pub use scoped_renderer::ScopedRenderer;
pub use snippet_injector::{InjectionOutcome, SnippetInjector, SnippetReport};
pub use structure_builder::{StructureBuilder, WriteOutcome};
