//! Dynamic serving: one axum route per page and pass-through entry.

use axum::{
    extract::Request,
    http::{request::Parts, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use polysite_core::{
    scanner::{entry_kind, EntryKind},
    tera::Context,
    PageEntry, SiteRenderer, TemplateData, WebsiteModel,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tower_http::{
    catch_panic::CatchPanicLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

/// Builds the template context for one request from the page's own data.
///
/// The returned context should start from [`TemplateData::to_context`] so
/// that skeletons keep working in static export.
pub type ContextHook = Arc<dyn Fn(&Parts, &TemplateData) -> Context + Send + Sync>;

#[derive(Error, Debug)]
pub enum RouteError {
    #[error("Cannot route {0:?}: empty path segment")]
    InvalidPath(String),

    #[error("Failed to inspect pass-through {path:?}: {source}")]
    Inspect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Renderer that registers request handlers instead of producing output.
#[derive(Default)]
pub struct RequestRenderer {
    router: Router,
    hook: Option<ContextHook>,
}

impl RequestRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context_hook(hook: ContextHook) -> Self {
        Self {
            router: Router::new(),
            hook: Some(hook),
        }
    }

    /// Finish the router, isolating handler panics and tracing requests.
    pub fn into_router(self) -> Router {
        self.router
            .layer(CatchPanicLayer::new())
            .layer(TraceLayer::new_for_http())
    }
}

impl SiteRenderer for RequestRenderer {
    type Error = RouteError;

    fn passthrough(&mut self, name: &str, source: &Path) -> Result<(), RouteError> {
        let route = route_path(name)?;
        let kind = entry_kind(source).map_err(|source_err| RouteError::Inspect {
            path: source.to_path_buf(),
            source: source_err,
        })?;

        let router = std::mem::take(&mut self.router);
        self.router = match kind {
            EntryKind::Dir => router.nest_service(&route, ServeDir::new(source)),
            EntryKind::File => router.route_service(&route, ServeFile::new(source)),
            EntryKind::Other => {
                tracing::warn!("Not serving {:?}: not a file or directory", source);
                router
            }
        };
        Ok(())
    }

    fn page(&mut self, route: &str, entry: &Arc<PageEntry>) -> Result<(), RouteError> {
        let route = route_path(route)?;
        let entry = Arc::clone(entry);
        let hook = self.hook.clone();

        let handler = move |request: Request| {
            let entry = Arc::clone(&entry);
            let hook = hook.clone();
            async move { render_page(&entry, hook.as_deref(), request) }
        };

        self.router = std::mem::take(&mut self.router).route(&route, get(handler));
        Ok(())
    }
}

fn render_page(
    entry: &PageEntry,
    hook: Option<&(dyn Fn(&Parts, &TemplateData) -> Context + Send + Sync)>,
    request: Request,
) -> Response {
    let (parts, _body) = request.into_parts();
    let context = match hook {
        Some(hook) => hook(&parts, &entry.data),
        None => entry.data.to_context(),
    };

    match entry.render_with(&context) {
        Ok(html) => Html(html).into_response(),
        Err(err) => {
            tracing::error!("{}", error_chain(&err));
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

/// Join an error with its sources; tera keeps the useful detail there.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

/// Absolute route for a model-relative path.
///
/// axum matches the request path as sent, so each segment is registered in
/// its percent-encoded form. This also keeps braces, `:` and `*` in names
/// from being read as route parameters.
fn route_path(path: &str) -> Result<String, RouteError> {
    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(RouteError::InvalidPath(path.to_string()));
    }
    let encoded: Vec<_> = segments
        .iter()
        .map(|segment| urlencoding::encode(segment))
        .collect();
    Ok(format!("/{}", encoded.join("/")))
}

/// Router serving every page and pass-through entry of `model`.
pub fn router(model: &WebsiteModel) -> Result<Router, RouteError> {
    let mut renderer = RequestRenderer::new();
    model.render_with(&mut renderer)?;
    Ok(renderer.into_router())
}

/// Like [`router`], with per-request template data.
pub fn router_with_context(model: &WebsiteModel, hook: ContextHook) -> Result<Router, RouteError> {
    let mut renderer = RequestRenderer::with_context_hook(hook);
    model.render_with(&mut renderer)?;
    Ok(renderer.into_router())
}
