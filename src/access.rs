//! Role-based visibility of courses and documents.
//!
//! Each function here maps an actor to a scope. A scope is a plain value that
//! the database layer renders as a SQL predicate (see [`crate::db::filters`]).

use crate::db::models::course::Course;
use crate::db::models::document::Document;
use crate::db::models::user::{Role, User};

/// Courses an actor may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseScope {
    /// Courses owned by the given user.
    CreatedBy(i64),
    /// Active courses, plus any course the given user is enrolled in.
    EnrolledOrActive(i64),
}

/// Documents an actor may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentScope {
    /// Every document.
    All,
    /// Public documents, plus the given user's uploads.
    UploadedOrPublic(i64),
    /// Public documents, documents of courses the given user is enrolled in,
    /// and the given user's uploads.
    Learner(i64),
}

/// Visibility of courses for `actor`.
#[must_use]
pub const fn course_scope(actor: &User) -> CourseScope {
    match actor.role {
        Role::Admin | Role::Teacher => CourseScope::CreatedBy(actor.id),
        Role::Student => CourseScope::EnrolledOrActive(actor.id),
    }
}

/// Visibility of documents for `actor`.
#[must_use]
pub const fn document_scope(actor: &User) -> DocumentScope {
    match actor.role {
        Role::Admin => DocumentScope::All,
        Role::Teacher => DocumentScope::UploadedOrPublic(actor.id),
        Role::Student => DocumentScope::Learner(actor.id),
    }
}

/// Only the owner may change or delete a course, admins included.
#[must_use]
pub fn can_modify_course(actor: &User, course: &Course) -> bool {
    course.created_by == actor.id
}

/// Uploaders, teachers and admins may change or delete a document.
#[must_use]
pub fn can_modify_document(actor: &User, document: &Document) -> bool {
    matches!(actor.role, Role::Admin | Role::Teacher) || document.uploaded_by == actor.id
}
