//! Errors returned by API handlers and how they map to HTTP responses.
use actix_web::{error, http::StatusCode, HttpRequest, HttpResponse};
use derive_more::Display;
use serde_json::json;

/// A user-facing API error. Rendered as `{"error": "<message>"}`.
#[derive(Debug, Display)]
pub enum ApiError {
    /// Invalid input or unmet precondition.
    #[display(fmt = "{}", _0)]
    Validation(String),
    /// Missing or unknown credentials.
    #[display(fmt = "Authentication credentials were not provided or are invalid.")]
    Unauthorized,
    /// The actor may not perform the action.
    #[display(fmt = "You do not have permission to perform this action.")]
    Forbidden,
    /// Unknown resource, or one hidden from the actor.
    #[display(fmt = "Not found.")]
    NotFound,
    /// Page number beyond the last page.
    #[display(fmt = "Invalid page.")]
    InvalidPage,
    /// A server-side collaborator is not configured.
    #[display(fmt = "{}", _0)]
    ServiceUnavailable(String),
    /// A collaborator failed; the message is passed through.
    #[display(fmt = "{}", _0)]
    Upstream(String),
    /// Anything else. Details are logged, not returned.
    #[display(fmt = "Internal server error")]
    Internal,
}

impl std::error::Error for ApiError {}

impl error::ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match *self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound | Self::InvalidPage => StatusCode::NOT_FOUND,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Upstream(_) | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!("{err:?}");
        Self::Internal
    }
}

/// Render malformed JSON bodies in the API's error envelope.
pub fn json_error_handler(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::Validation(format!("Invalid request body: {err}")).into()
}

/// Render malformed query strings in the API's error envelope.
pub fn query_error_handler(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::Validation(format!("Invalid query parameters: {err}")).into()
}

/// Render malformed path segments, such as a non-numeric id, as not found.
pub fn path_error_handler(_err: error::PathError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::NotFound.into()
}
