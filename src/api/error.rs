//! HTTP error responses
//!
//! Service errors are folded into [`WebError`], which renders a small HTML
//! page with the matching status code. Internal errors are logged and shown
//! without detail.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::services::{ExpenseServiceError, StatisticsServiceError, UserServiceError};
use crate::views::ViewEngine;

/// Error returned by page handlers
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl WebError {
    pub fn status(&self) -> StatusCode {
        match self {
            WebError::BadRequest(_) => StatusCode::BAD_REQUEST,
            WebError::NotFound(_) => StatusCode::NOT_FOUND,
            WebError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (title, message) = match &self {
            WebError::BadRequest(msg) => ("Bad request", msg.clone()),
            WebError::NotFound(msg) => ("Not found", msg.clone()),
            WebError::Internal(e) => {
                tracing::error!("Request failed: {:#}", e);
                ("Something went wrong", "The request could not be completed.".to_string())
            }
        };

        (status, Html(ViewEngine::simple_error_page(title, &message))).into_response()
    }
}

impl From<UserServiceError> for WebError {
    fn from(e: UserServiceError) -> Self {
        match e {
            UserServiceError::AuthenticationError(msg)
            | UserServiceError::ValidationError(msg)
            | UserServiceError::UserExists(msg) => WebError::BadRequest(msg),
            UserServiceError::InternalError(e) => WebError::Internal(e),
        }
    }
}

impl From<ExpenseServiceError> for WebError {
    fn from(e: ExpenseServiceError) -> Self {
        match e {
            ExpenseServiceError::ValidationError(msg) => WebError::BadRequest(msg),
            ExpenseServiceError::NotFound(id) => {
                WebError::NotFound(format!("Expense {} does not exist", id))
            }
            ExpenseServiceError::InternalError(e) => WebError::Internal(e),
        }
    }
}

impl From<StatisticsServiceError> for WebError {
    fn from(e: StatisticsServiceError) -> Self {
        match e {
            err @ StatisticsServiceError::InvalidPeriod { .. } => {
                WebError::BadRequest(err.to_string())
            }
            StatisticsServiceError::InternalError(e) => WebError::Internal(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            WebError::BadRequest("x".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            WebError::NotFound("x".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            WebError::Internal(anyhow::anyhow!("db down"))
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_service_error_mapping() {
        let err: WebError = ExpenseServiceError::NotFound(7).into();
        assert!(matches!(err, WebError::NotFound(ref m) if m.contains('7')));

        let err: WebError = ExpenseServiceError::ValidationError("bad".into()).into();
        assert!(matches!(err, WebError::BadRequest(_)));

        let err: WebError = UserServiceError::ValidationError("empty".into()).into();
        assert!(matches!(err, WebError::BadRequest(_)));

        let err: WebError = StatisticsServiceError::InvalidPeriod { year: 2025, month: 13 }.into();
        assert!(matches!(err, WebError::BadRequest(ref m) if m.contains("13")));

        let err: WebError = UserServiceError::InternalError(anyhow::anyhow!("boom")).into();
        assert!(matches!(err, WebError::Internal(_)));
    }
}
