//! View engine error types

use thiserror::Error;

/// Template loading and rendering errors
#[derive(Debug, Error)]
pub enum ViewError {
    /// Template rendering error, with the full cause chain
    #[error("Template error: {0}")]
    TemplateError(String),

    /// An embedded template is not valid UTF-8
    #[error("Template '{0}' is not valid UTF-8")]
    InvalidEncoding(String),
}
