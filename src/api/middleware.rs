//! HTTP middleware and shared request state
//!
//! Contains:
//! - `AppState`, the services shared by every handler
//! - Session cookie parsing and formatting
//! - `require_auth`, which validates the session and renews it when less
//!   than half of its lifetime remains

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::api::error::WebError;
use crate::config::{Config, SessionConfig};
use crate::db::repositories::{SqlxExpenseRepository, SqlxSessionRepository, SqlxUserRepository};
use crate::models::{CategoryCatalog, User};
use crate::services::{ExpenseService, StatisticsService, UserService};
use crate::views::ViewEngine;

/// Header htmx sets on every request it issues
pub const HX_REQUEST: &str = "hx-request";
/// Client-side redirect understood by htmx
pub const HX_REDIRECT: &str = "hx-redirect";
/// Client-side navigation without a full reload
pub const HX_LOCATION: &str = "hx-location";

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub expense_service: Arc<ExpenseService>,
    pub statistics_service: Arc<StatisticsService>,
    pub catalog: Arc<CategoryCatalog>,
    pub views: Arc<ViewEngine>,
    pub session_config: Arc<SessionConfig>,
}

impl AppState {
    /// Wire repositories and services over one pool
    pub fn new(pool: SqlitePool, config: &Config, views: ViewEngine) -> Self {
        let catalog = Arc::new(CategoryCatalog::new(config.categories.clone()));
        let expense_repo = SqlxExpenseRepository::boxed(pool.clone());

        let user_service = UserService::with_session_lifetime(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool),
            config.session.lifetime(),
        );
        let expense_service =
            ExpenseService::with_page_size(expense_repo.clone(), config.expenses.page_size);
        let statistics_service = StatisticsService::new(expense_repo, catalog.clone());

        Self {
            user_service: Arc::new(user_service),
            expense_service: Arc::new(expense_service),
            statistics_service: Arc::new(statistics_service),
            catalog,
            views: Arc::new(views),
            session_config: Arc::new(config.session.clone()),
        }
    }
}

/// Authenticated user extracted from request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| StatusCode::UNAUTHORIZED.into_response())
    }
}

/// True when the request was issued by htmx
pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers
        .get(HX_REQUEST)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

/// Extract the session token from the Cookie header
pub fn extract_session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|cookie| cookie.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// `Set-Cookie` value issuing a session for its full lifetime
pub fn session_cookie(config: &SessionConfig, token: &str) -> String {
    cookie(config, token, config.lifetime().num_seconds())
}

/// `Set-Cookie` value removing the session cookie
pub fn clear_session_cookie(config: &SessionConfig) -> String {
    cookie(config, "", 0)
}

fn cookie(config: &SessionConfig, value: &str, max_age: i64) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        config.cookie_name, value, max_age
    );
    if config.secure_cookie {
        cookie.push_str("; Secure");
    }
    cookie
}

/// 302 to `location`
pub fn found(location: &'static str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

/// Authentication middleware
///
/// Every failure looks the same to the client: the cookie is cleared and the
/// browser is sent to `/login` (htmx requests get a 401 with `HX-Redirect`).
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, WebError> {
    let htmx = is_htmx(request.headers());
    let Some(token) = extract_session_token(request.headers(), &state.session_config.cookie_name)
    else {
        return Ok(login_required(&state.session_config, htmx));
    };

    let Some(info) = state.user_service.validate_session_with_info(&token).await? else {
        tracing::debug!("Rejected invalid or expired session");
        return Ok(login_required(&state.session_config, htmx));
    };

    let renewed = match state.user_service.renew_if_needed(&token, &info).await {
        Ok(renewed) => renewed,
        Err(e) => {
            tracing::warn!("Failed to renew session for user {}: {}", info.user.id, e);
            None
        }
    };

    request.extensions_mut().insert(AuthenticatedUser(info.user));
    let mut response = next.run(request).await;

    if let Some(expires_at) = renewed {
        tracing::debug!("Session renewed until {}", expires_at);
        if let Ok(value) = HeaderValue::from_str(&session_cookie(&state.session_config, &token)) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }

    Ok(response)
}

fn login_required(config: &SessionConfig, htmx: bool) -> Response {
    let mut response = if htmx {
        (StatusCode::UNAUTHORIZED, [(HX_REDIRECT, "/login")]).into_response()
    } else {
        found("/login")
    };

    if let Ok(value) = HeaderValue::from_str(&clear_session_cookie(config)) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    response
}
