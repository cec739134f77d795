//! Infrastructure adapters for RapidKit.
//!
//! This crate implements the ports defined in `rapidkit_core::application::ports`:
//! the local and in-memory filesystems, the Tera template renderer and the
//! on-disk catalog of kits and modules. All I/O lives here.

pub mod catalog;
pub mod filesystem;
pub mod renderer;

// Re-export commonly used adapters
pub use catalog::FsCatalog;
pub use filesystem::{LocalFilesystem, MemoryFilesystem};
pub use renderer::TeraRenderer;
