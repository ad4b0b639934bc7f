//! This module contains the API endpoints for the server.
pub mod auth;
pub mod courses;
pub mod documents;
pub mod pagination;
pub mod routes;
pub mod state;
