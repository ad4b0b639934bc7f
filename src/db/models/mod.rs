//! This module contains all the sqlx structs for the database tables.

/// sqlx structs for conversion_job table.
pub mod conversion_job;
/// sqlx structs for course and course_student tables.
pub mod course;
/// sqlx structs for document table.
pub mod document;
/// Processing status of a document.
pub mod status;
/// sqlx structs for user table.
pub mod user;
