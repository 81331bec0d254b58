//! # polysite-render
//!
//! Executes a [`polysite_core::WebsiteModel`] two ways: as an axum router
//! that renders pages per request, or as a static export written to disk.

pub mod export;
pub mod request;

pub use export::{
    copy_tree, export_site, resolve_destination, ExportError, ExportSummary, FileRenderer,
};
pub use request::{router, router_with_context, ContextHook, RequestRenderer, RouteError};
