//! # ModKit
//!
//! Small module system for the server: modules declare capabilities
//! (core, db, rest, rest host, stateful) in a [`ModuleRegistry`], and
//! [`runtime::run`] drives them through the phases
//! init → db → rest → start → wait → stop.
//!
//! ```rust,ignore
//! let registry = ModuleRegistry::builder()
//!     .register(ModuleEntry::new("api_ingress", ingress.clone()).with_rest_host(ingress))
//!     .register(ModuleEntry::new("campus_connect", campus.clone()).with_rest(campus))
//!     .build()?;
//! ```

pub use anyhow::Result;
pub use async_trait::async_trait;

pub mod api;
pub mod context;
pub mod contracts;
pub mod registry;
pub mod runtime;

pub use api::problem::{
    bad_request, conflict, forbidden, internal_error, not_found, unauthorized, Problem,
    ProblemResponse, ValidationError,
};
pub use api::{OpenApiRegistry, OperationBuilder};
pub use context::{ConfigProvider, ModuleCtx, ModuleCtxBuilder};
pub use contracts::*;
pub use registry::{ModuleEntry, ModuleRegistry, RegistryBuilder, RegistryError};
pub use runtime::{run, RunOptions, ShutdownOptions};
