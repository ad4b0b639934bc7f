//! Serve the EduVoice API.
#![allow(
    clippy::exit,
    clippy::unused_async,
    clippy::module_name_repetitions
)]
use std::{io, process};

use actix_http::body::MessageBody;
use actix_service::ServiceFactory;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::middleware::{NormalizePath, TrailingSlash};
use actix_web::{App, Error, HttpServer};
use tracing_actix_web::TracingLogger;

use crate::config::Config;
use crate::db;
use crate::server::api::routes;
use crate::server::api::state::App as AppState;
use crate::server::tracing::EduVoiceRootSpanBuilder;

/// Connect to the database, wire the collaborators and serve the API.
#[actix_web::main]
pub async fn serve(config: Config) -> io::Result<()> {
    let bind = config.bind.clone();
    let port = config.port;
    tracing::info!("Running EduVoice API on http://{bind}:{port}.");

    let db = match db::init::connect(&config.database_url).await {
        Ok(db) => db,
        Err(err) => {
            tracing::error!(
                "error: could not connect to database. Confirm that DATABASE_URL env var or `database_url` is set correctly."
            );
            tracing::error!("Error: {:?}", err);
            process::exit(1);
        }
    };

    let state = AppState::new(db, config).unwrap_or_else(|err| {
        tracing::error!("Unable to initialize application state.");
        tracing::error!("Error: {:?}", err);
        process::exit(1);
    });

    HttpServer::new(move || init_app(&state))
        .bind((bind.as_str(), port))?
        .run()
        .await
}

/// Initialize the application and all routing at start-up time.
///
/// # Arguments
/// * `state` - The application state
pub fn init_app(
    state: &AppState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Response = ServiceResponse<impl MessageBody>,
        Config = (),
        InitError = (),
        Error = Error,
    >,
> {
    routes::register_app(App::new(), state)
        .wrap(NormalizePath::new(TrailingSlash::Trim))
        .wrap(TracingLogger::<EduVoiceRootSpanBuilder>::new())
}
