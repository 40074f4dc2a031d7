//! HTTP Server
//!
//! Serves the hello page and the administrative routes around the shared
//! counter: `/` redirects, `/hello` counts and renders, `/reset` zeroes the
//! counter, `/kill` ends the process.

use crate::application::{CounterError, CounterService};
use crate::domain::entities::{InstanceInfo, Page};
use crate::infrastructure::{PageRenderer, RenderError, ShutdownController, Terminator};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Exit status used by `/kill`.
pub const KILL_EXIT_CODE: i32 = 1;

/// Health response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub instance_index: String,
    pub store: String,
}

/// Request failures surfaced as `500 Internal Server Error`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Counter(#[from] CounterError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!("request failed: {}", self);
        (StatusCode::INTERNAL_SERVER_ERROR, format!("{}\n", self)).into_response()
    }
}

/// HTTP server state.
#[derive(Clone)]
pub struct HttpState {
    pub counter: Arc<CounterService>,
    pub renderer: Arc<PageRenderer>,
    pub instance: Arc<InstanceInfo>,
    pub terminator: Arc<dyn Terminator>,
}

impl HttpState {
    pub fn new(
        counter: Arc<CounterService>,
        renderer: PageRenderer,
        instance: InstanceInfo,
        terminator: Arc<dyn Terminator>,
    ) -> Self {
        Self {
            counter,
            renderer: Arc::new(renderer),
            instance: Arc::new(instance),
            terminator,
        }
    }
}

/// HTTP server for the hello page.
pub struct HttpServer {
    listen_addr: String,
    state: HttpState,
}

impl HttpServer {
    pub fn new(listen_addr: String, state: HttpState) -> Self {
        Self { listen_addr, state }
    }

    /// Build the router with all routes and tracing.
    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Bind the listen address and serve until shutdown.
    ///
    /// A bind failure is returned to the caller and is fatal at startup.
    #[cfg_attr(coverage_nightly, coverage(off))]
    pub async fn run(&self, shutdown: ShutdownController) -> anyhow::Result<()> {
        let listener = TcpListener::bind(&self.listen_addr)
            .await
            .map_err(|e| anyhow::anyhow!("failed to listen on {}: {}", self.listen_addr, e))?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until shutdown.
    pub async fn serve(
        &self,
        listener: TcpListener,
        shutdown: ShutdownController,
    ) -> anyhow::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(
            "listening on {} (store {})",
            addr,
            self.state.counter.connection().as_str()
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await?;

        tracing::info!("server on {} stopped", addr);
        Ok(())
    }
}

fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/", any(root_handler))
        .route("/hello", any(hello_handler))
        .route("/reset", any(reset_handler))
        .route("/kill", any(kill_handler))
        .route("/health", get(health_handler))
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn redirect_to_hello() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, "/hello")]).into_response()
}

// Handler functions

async fn root_handler() -> Response {
    redirect_to_hello()
}

async fn not_found_handler() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "404 page not found\n")
}

async fn hello_handler(State(state): State<HttpState>) -> Result<Html<String>, AppError> {
    let page_count = state.counter.current_incremented_value().await?;
    let page = Page::new(state.instance.as_ref().clone(), page_count);

    tracing::info!(
        "hello request for instance {} (page count {})",
        page.instance.index,
        page_count
    );

    Ok(Html(state.renderer.render(&page)?))
}

async fn reset_handler(State(state): State<HttpState>) -> Result<Response, AppError> {
    // Without a store there is nothing to reset and no page to go back to
    if state.counter.is_degraded() {
        return Ok(StatusCode::OK.into_response());
    }

    state.counter.reset().await?;
    Ok(redirect_to_hello())
}

async fn kill_handler(State(state): State<HttpState>) -> impl IntoResponse {
    tracing::warn!("About to kill this instance (index {})", state.instance.index);
    state.terminator.terminate(KILL_EXIT_CODE);
    StatusCode::OK
}

async fn health_handler(State(state): State<HttpState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        instance_index: state.instance.index.clone(),
        store: state.counter.connection().as_str().to_string(),
    })
}
