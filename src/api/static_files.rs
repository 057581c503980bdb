//! Embedded static assets under `/static`

use axum::{
    body::Body,
    extract::Path,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use rust_embed::RustEmbed;

/// Stylesheets and scripts shipped inside the binary
#[derive(RustEmbed)]
#[folder = "static/"]
#[include = "*"]
struct StaticAssets;

/// Vendored htmx build; until it is present the layout loads the CDN copy
const HTMX_ASSET: &str = "htmx.min.js";

/// Service worker, served from the site root so its scope covers every page
const SERVICE_WORKER: &str = "sw.js";

/// Local URL of htmx when it is embedded
pub fn local_htmx() -> Option<&'static str> {
    StaticAssets::get(HTMX_ASSET).map(|_| "/static/htmx.min.js")
}

/// GET /sw.js
pub async fn serve_service_worker() -> Response {
    match StaticAssets::get(SERVICE_WORKER) {
        Some(content) => {
            let mut response = build_response(SERVICE_WORKER, &content.data);
            response
                .headers_mut()
                .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
            response
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// GET /static/{*path}
pub async fn serve_static(Path(path): Path<String>) -> Response {
    let path = path.trim_start_matches('/');
    match StaticAssets::get(path) {
        Some(content) => build_response(path, &content.data),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

fn build_response(path: &str, data: &[u8]) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, get_content_type(path))
        .header(header::CACHE_CONTROL, "public, max-age=3600")
        .body(Body::from(data.to_vec()))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

/// Get content type from file extension
fn get_content_type(path: &str) -> &'static str {
    match path.rsplit('.').next().unwrap_or("") {
        "css" => "text/css; charset=utf-8",
        "js" => "application/javascript",
        "json" | "webmanifest" => "application/json",
        "png" => "image/png",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "woff2" => "font/woff2",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_content_type() {
        assert_eq!(get_content_type("app.css"), "text/css; charset=utf-8");
        assert_eq!(get_content_type("icons/logo.svg"), "image/svg+xml");
        assert_eq!(get_content_type("README"), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_serve_known_asset() {
        let response = serve_static(Path("app.css".to_string())).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/css; charset=utf-8"
        );
    }

    #[tokio::test]
    async fn test_serve_service_worker() {
        let response = serve_service_worker().await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/javascript");
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-cache");
    }

    #[tokio::test]
    async fn test_serve_manifest() {
        let response = serve_static(Path("manifest.json".to_string())).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_local_htmx_follows_embedded_assets() {
        assert_eq!(local_htmx().is_some(), StaticAssets::get(HTMX_ASSET).is_some());
    }

    #[tokio::test]
    async fn test_serve_unknown_asset() {
        let response = serve_static(Path("missing.js".to_string())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
