//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `rapidkit-adapters` implement
//! these; the CLI implements [`VariablePrompt`].
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by application, implemented by infrastructure
//!   - `Filesystem`: File operations
//!   - `TemplateRenderer`: Template rendering
//!   - `KitSource` / `ModuleSource`: Catalog access
//!   - `VariablePrompt`: Interactive variable input

pub mod output;

pub use output::{Filesystem, KitSource, ModuleSource, TemplateRenderer, VariablePrompt};

#[cfg(test)]
pub use output::MockTemplateRenderer;
