//! Login and logout pages

use anyhow::Context;
use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Form, Router,
};

use crate::api::error::WebError;
use crate::api::forms::LoginForm;
use crate::api::middleware::{
    clear_session_cookie, extract_session_token, found, is_htmx, session_cookie, AppState,
};
use crate::api::page_context;
use crate::services::{LoginInput, UserServiceError};

/// Message shown for every failed credential check
const LOGIN_FAILED: &str = "Invalid username or password";

/// Public routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout))
}

/// GET /
async fn index() -> Response {
    found("/expenses")
}

/// GET /login
///
/// Already signed-in visitors go straight to their expenses.
async fn login_page(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    if let Some(token) = extract_session_token(&headers, &state.session_config.cookie_name) {
        if state.user_service.validate_session(&token).await?.is_some() {
            return Ok(found("/expenses"));
        }
    }

    render_login(&state, &headers, StatusCode::OK, None, "")
}

/// POST /login
async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Result<Response, WebError> {
    let username = form.username.trim().to_string();
    let input = LoginInput::new(form.username, form.password);

    match state.user_service.login(input).await {
        Ok(session) => {
            let cookie = session_cookie(&state.session_config, &session.token);
            let mut response = found("/expenses");
            response.headers_mut().insert(
                header::SET_COOKIE,
                HeaderValue::from_str(&cookie).context("Session cookie is not a valid header")?,
            );
            Ok(response)
        }
        Err(UserServiceError::ValidationError(msg)) => {
            render_login(&state, &headers, StatusCode::BAD_REQUEST, Some(&msg), &username)
        }
        Err(UserServiceError::AuthenticationError(_)) => {
            render_login(&state, &headers, StatusCode::UNAUTHORIZED, Some(LOGIN_FAILED), &username)
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /logout
async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = extract_session_token(&headers, &state.session_config.cookie_name) {
        if let Err(e) = state.user_service.logout(&token).await {
            tracing::warn!("Failed to delete session on logout: {}", e);
        }
    }

    let mut response = found("/login");
    if let Ok(value) = HeaderValue::from_str(&clear_session_cookie(&state.session_config)) {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }
    response
}

fn render_login(
    state: &AppState,
    headers: &HeaderMap,
    status: StatusCode,
    error: Option<&str>,
    username: &str,
) -> Result<Response, WebError> {
    let mut ctx = page_context("Sign in", "login", None);
    ctx.insert("error", &error);
    ctx.insert("form_username", username);

    let html = state
        .views
        .render_page("login.html", &ctx, is_htmx(headers))?;
    Ok((status, Html(html)).into_response())
}
