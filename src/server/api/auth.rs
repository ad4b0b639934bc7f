//! Resolving the calling user from the `Authorization` header.
use std::future::Future;
use std::pin::Pin;

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};

use super::state::{App as AppState, Global as _};
use crate::db::models::user::{self, User};
use crate::server::errors::ApiError;
use crate::server::tracing::record_user;

/// The authenticated user making a request.
///
/// Extracted from `Authorization: Token <token>` or `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct Actor(pub User);

impl Actor {
    /// The underlying user.
    #[must_use]
    pub const fn user(&self) -> &User {
        &self.0
    }
}

/// Token from an `Authorization` header value.
fn parse_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    ((scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer"))
        && !token.is_empty())
    .then_some(token)
}

impl FromRequest for Actor {
    type Error = ApiError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_token)
            .map(str::to_owned);
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let req = req.clone();
        Box::pin(async move {
            let Some(state) = state else {
                tracing::error!("Application state is not registered");
                return Err(ApiError::Internal);
            };
            let token = token.ok_or(ApiError::Unauthorized)?;
            let found = user::Manager::find_by_token(state.db(), &token)
                .await?
                .ok_or(ApiError::Unauthorized)?;
            record_user(&req, found.id);
            Ok(Self(found))
        })
    }
}
