//! HTTP front end for the in-memory todo store.
//!
//! # Design
//! The router is a thin adapter: handlers validate input, call the
//! [`TodoStore`] passed in by the caller, and map `None`/`false` results to
//! 404. The store is injected rather than created here, so every test gets
//! its own isolated instance.
//!
//! CORS is wide open (`*`). Any `OPTIONS` request is answered as a
//! preflight, and ordinary responses also carry the allowed methods and
//! headers. Every request is logged at INFO through `TraceLayer`.

use std::future::Future;
use std::sync::Arc;

use axum::http::header::{ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS};
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use todo_core::TodoStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;
use tracing::Level;

pub mod config;
pub mod error;
pub mod handlers;
pub mod validation;

pub use config::{ConfigError, LogFormat, ServerConfig};
pub use error::{ApiError, ServerError};
pub use handlers::{CreateTodo, Health};

const ALLOWED_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::OPTIONS,
];

pub fn app(store: Arc<TodoStore>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(ALLOWED_METHODS)
        .allow_headers(Any);

    // CorsLayer only sends these on preflight responses.
    let allow_methods = SetResponseHeaderLayer::if_not_present(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
    );
    let allow_headers =
        SetResponseHeaderLayer::if_not_present(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("*"));

    let trace = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        );

    Router::new()
        .route("/health", get(handlers::health))
        .route("/todos", get(handlers::list_todos).post(handlers::create_todo))
        .route(
            "/todos/{id}",
            get(handlers::get_todo)
                .put(handlers::update_todo)
                .delete(handlers::delete_todo),
        )
        .layer(cors)
        .layer(allow_methods)
        .layer(allow_headers)
        .layer(trace)
        .with_state(store)
}

/// Serve on an already bound listener until `shutdown` resolves.
///
/// Taking a listener instead of an address lets tests bind port 0.
pub async fn run<F>(listener: TcpListener, store: Arc<TodoStore>, shutdown: F) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app(store))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ServerError::Serve)
}
