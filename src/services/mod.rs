//! Collaborators the HTTP layer delegates to.
//!
//! Each collaborator is a trait so the server can be wired with the production
//! implementation and tests with in-memory doubles.

pub mod extract;
pub mod gemini;
pub mod lifecycle;
pub mod queue;
