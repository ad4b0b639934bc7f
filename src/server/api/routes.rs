//! A central place to register App routes.
#![allow(
    clippy::literal_string_with_formatting_args,
    reason = "Actix Web resource path uses `{param}` syntax which is not formatting but route pattern matching"
)]
use actix_service::ServiceFactory;
use actix_web::{
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    web, App, Error, Scope,
};

use super::state::{App as AppState, Global as _};
use super::{courses, documents};
use crate::server::errors::{json_error_handler, path_error_handler, query_error_handler};

/// Headroom for the JSON envelope around a base64 encoded upload.
const JSON_ENVELOPE_BYTES: u64 = 64 * 1024;

/// Central place to register all the App routing.
///
/// Static routes are registered before the `{id}` routes they would
/// otherwise be shadowed by.
#[tracing::instrument(skip(app, state))]
pub fn register_app<
    U: MessageBody,
    V: ServiceFactory<
        ServiceRequest,
        Response = ServiceResponse<U>,
        Config = (),
        InitError = (),
        Error = Error,
    >,
>(
    app: App<V>,
    state: &AppState,
) -> App<V> {
    let json_limit = json_limit(state.config().max_upload_bytes);
    app.app_data(web::Data::new(state.clone()))
        .app_data(
            web::JsonConfig::default()
                .limit(json_limit)
                .error_handler(json_error_handler),
        )
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .service(
            web::scope("/api")
                .service(course_routes())
                .service(document_routes()),
        )
}

/// Largest JSON body accepted: a base64 encoded upload of `max_upload_bytes`
/// plus the surrounding fields.
fn json_limit(max_upload_bytes: u64) -> usize {
    let encoded = max_upload_bytes.saturating_mul(4).div_ceil(3);
    usize::try_from(encoded.saturating_add(JSON_ENVELOPE_BYTES)).unwrap_or(usize::MAX)
}

/// Routes under `/api/courses`.
fn course_routes() -> Scope {
    web::scope("/courses")
        .service(
            web::resource("")
                .route(web::get().to(courses::list))
                .route(web::post().to(courses::create)),
        )
        .service(
            web::resource("/{id}")
                .route(web::get().to(courses::retrieve))
                .route(web::put().to(courses::update))
                .route(web::patch().to(courses::partial_update))
                .route(web::delete().to(courses::destroy)),
        )
        .service(web::resource("/{id}/enroll").route(web::post().to(courses::enroll)))
        .service(web::resource("/{id}/unenroll").route(web::post().to(courses::unenroll)))
}

/// Routes under `/api/documents`.
fn document_routes() -> Scope {
    web::scope("/documents")
        .service(
            web::resource("")
                .route(web::get().to(documents::list))
                .route(web::post().to(documents::create)),
        )
        .service(web::resource("/my_documents").route(web::get().to(documents::my_documents)))
        .service(
            web::resource("/{id}")
                .route(web::get().to(documents::retrieve))
                .route(web::put().to(documents::update))
                .route(web::patch().to(documents::partial_update))
                .route(web::delete().to(documents::destroy)),
        )
        .service(web::resource("/{id}/convert").route(web::post().to(documents::convert)))
        .service(web::resource("/{id}/gemini_read").route(web::post().to(documents::gemini_read)))
}
