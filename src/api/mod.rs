//! Web layer - HTTP handlers and routing
//!
//! Server-rendered HTML pages driven by htmx:
//! - Login/logout (public)
//! - Expense list and forms (session required)
//! - Statistics (session required)
//! - Embedded static assets

pub mod auth;
pub mod error;
pub mod expenses;
pub mod forms;
pub mod middleware;
pub mod static_files;
pub mod statistics;


use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware as axum_middleware,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use tera::Context as TeraContext;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

use crate::models::User;
use crate::views::ViewEngine;

pub use error::WebError;
pub use middleware::{AppState, AuthenticatedUser};

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .merge(expenses::router())
        .merge(statistics::router())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    Router::new()
        .merge(auth::router())
        .merge(protected)
        .route("/sw.js", get(static_files::serve_service_worker))
        .route("/static/{*path}", get(static_files::serve_static))
        .fallback(not_found)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Context every page template and the layout expect
pub fn page_context(title: &str, section: &str, user: Option<&User>) -> TeraContext {
    let mut ctx = TeraContext::new();
    ctx.insert("title", title);
    ctx.insert("section", section);
    ctx.insert("username", &user.map(|u| u.username.as_str()));
    ctx.insert("htmx_src", &static_files::local_htmx());
    ctx
}

async fn not_found(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let mut ctx = page_context("Not found", "", None);
    ctx.insert("error_title", "Not found");
    ctx.insert("error_message", "This page does not exist.");

    let html = match state
        .views
        .render_page("error.html", &ctx, middleware::is_htmx(&headers))
    {
        Ok(html) => html,
        Err(e) => {
            tracing::warn!("Failed to render error page: {}", e);
            ViewEngine::simple_error_page("Not found", "This page does not exist.")
        }
    };

    (StatusCode::NOT_FOUND, Html(html)).into_response()
}
