//! RapidKit Core - Hexagonal Architecture Implementation
//!
//! This crate provides the domain and application layers for RapidKit,
//! which composes runnable service projects from reusable modules and kit
//! profiles.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           rapidkit-cli (CLI)            │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │  ProjectCreator, KitRegistry,           │
//! │  ModuleGenerator, SnippetInjector, ...  │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      Application Ports (Traits)         │
//! │  Filesystem, TemplateRenderer,          │
//! │  KitSource, ModuleSource                │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │    rapidkit-adapters (Infrastructure)   │
//! │  LocalFilesystem, TeraRenderer,         │
//! │  FsCatalog                              │
//! └─────────────────────────────────────────┘
//! ```
//!
//! The domain layer (variables, profiles, manifests, snippets, dependency
//! manifests) is pure: text and values in, text and values out.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rapidkit_core::prelude::*;
//!
//! let kits = KitRegistry::load(catalog.as_ref())?;
//! let creator = ProjectCreator::new(kits, catalog, renderer, filesystem);
//! let report = creator.create_project(
//!     &CreateRequest {
//!         kit_name: "fastapi/standard".into(),
//!         project_name: "orders".into(),
//!         output_dir: "./orders".into(),
//!         ..Default::default()
//!     },
//!     None,
//! )?;
//! ```

pub mod domain;

pub mod application;

pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        AddModuleRequest, ApplicationError, CreateRequest, KitRegistry, ProjectCreator,
        ProjectReport,
        ports::{Filesystem, KitSource, ModuleSource, TemplateRenderer, VariablePrompt},
    };
    pub use crate::domain::{
        Ecosystem, Kit, KitManifest, ModuleManifest, ModuleRef, ProfileConfig, RenderContext,
        Snippet, VariableDef, VariableSchema, VariableType,
    };
    pub use crate::error::{ErrorCategory, RapidkitError, RapidkitResult};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
