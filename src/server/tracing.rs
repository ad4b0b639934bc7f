//! Request spans for the HTTP API.
//!
//! Every request gets a root span carrying its timing and, once the `Actor`
//! extractor has resolved the caller, the id of the authenticated user.
use std::time::Instant;

use actix_web::{
    dev::{ServiceRequest, ServiceResponse},
    http::Method,
    HttpMessage, HttpRequest,
};
use tracing_actix_web::{DefaultRootSpanBuilder, RootSpan, RootSpanBuilder};

/// Milliseconds after which an ordinary request is logged as slow.
const SLOW_REQUEST_MS: u128 = 1000;

/// Milliseconds after which a request doing inline work is logged as slow.
/// Uploads run extraction and `gemini_read` waits on the model.
const SLOW_WORK_REQUEST_MS: u128 = 30 * 1000;

/// `DefaultRootSpanBuilder` plus request timing and the calling user.
pub struct EduVoiceRootSpanBuilder;

/// When the request entered the middleware.
struct RequestStart(Instant);

/// Slow-request threshold for a request with `method` on `path`.
fn slow_threshold_ms(method: &Method, path: &str) -> u128 {
    let path = path.trim_end_matches('/');
    let uploads = *method == Method::POST && path == "/api/documents";
    if uploads || path.ends_with("/gemini_read") {
        SLOW_WORK_REQUEST_MS
    } else {
        SLOW_REQUEST_MS
    }
}

/// Record the authenticated user on the root span of `req`, when there is one.
pub fn record_user(req: &HttpRequest, user_id: i64) {
    if let Some(span) = req.extensions().get::<RootSpan>() {
        span.record("user_id", user_id);
    }
}

impl RootSpanBuilder for EduVoiceRootSpanBuilder {
    fn on_request_start(request: &ServiceRequest) -> tracing::Span {
        request.extensions_mut().insert(RequestStart(Instant::now()));
        tracing_actix_web::root_span!(
            request,
            user_id = tracing::field::Empty,
            duration_ms = tracing::field::Empty,
        )
    }

    fn on_request_end<B: actix_web::body::MessageBody>(
        span: tracing::Span,
        outcome: &Result<ServiceResponse<B>, actix_web::Error>,
    ) {
        if let Ok(response) = outcome {
            let request = response.request();
            if let Some(start) = request.extensions().get::<RequestStart>() {
                let millis = start.0.elapsed().as_millis();
                span.record("duration_ms", millis);
                if millis > slow_threshold_ms(request.method(), request.path()) {
                    tracing::warn!(
                        parent: &span,
                        duration_ms = millis,
                        method = %request.method(),
                        path = %request.path(),
                        "Slow HTTP request"
                    );
                }
            }
        }
        DefaultRootSpanBuilder::on_request_end(span, outcome);
    }
}
