use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::access::CourseScope;
use crate::db::filters::OrderField;

pub mod manager;

/// Columns a course listing may be ordered by, keyed by their public name.
pub const ORDERING_FIELDS: &[(&str, &str)] = &[("name", "c.name"), ("created_at", "c.created_at")];

/// Columns covered by free-text search.
pub const SEARCH_COLUMNS: &[&str] = &["c.name", "c.code", "c.description"];

/// Trait for managing courses.
#[async_trait]
pub trait Manager {
    /// Find all courses in `scope` matching `query`.
    async fn find_visible(&self, scope: &CourseScope, query: &CourseQuery)
        -> anyhow::Result<Vec<Course>>;
    /// Find one course by id, provided it falls within `scope`.
    async fn find_visible_by_id(&self, scope: &CourseScope, id: i64)
        -> anyhow::Result<Option<Course>>;
    /// Whether a course with this id exists at all.
    async fn exists(&self, id: i64) -> anyhow::Result<bool>;
    /// Whether `code` is used by a course other than `except`.
    async fn code_taken(&self, code: &str, except: Option<i64>) -> anyhow::Result<bool>;
    /// Enrolled student ids for each of the given courses.
    async fn students_of(&self, course_ids: &[i64]) -> anyhow::Result<HashMap<i64, Vec<i64>>>;
    /// Create a new course.
    async fn create(&self, course: &NewCourse) -> anyhow::Result<Course>;
    /// Apply the given changes to a course.
    async fn update(&self, id: i64, changes: &CourseChanges) -> anyhow::Result<Course>;
    /// Delete a course. Its documents are kept and detached.
    async fn delete(&self, id: i64) -> anyhow::Result<()>;
    /// Add a user to the enrollment set. No-op when already enrolled.
    async fn enroll(&self, course_id: i64, user_id: i64) -> anyhow::Result<()>;
    /// Remove a user from the enrollment set. No-op when not enrolled.
    async fn unenroll(&self, course_id: i64, user_id: i64) -> anyhow::Result<()>;
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
/// Model for courses.
pub struct Course {
    /// Unique course identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Unique course code, e.g. `CS101`.
    pub code: String,
    /// Free-form description.
    pub description: String,
    /// Whether the course is open to every student.
    pub is_active: bool,
    /// Owner of the course.
    pub created_by: i64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

/// A new course, owned by `created_by`.
#[derive(Debug, Clone)]
pub struct NewCourse {
    /// Display name.
    pub name: String,
    /// Unique course code.
    pub code: String,
    /// Free-form description.
    pub description: String,
    /// Whether the course is open to every student.
    pub is_active: bool,
    /// Owner of the course.
    pub created_by: i64,
}

/// Partial update of a course. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct CourseChanges {
    /// New name.
    pub name: Option<String>,
    /// New code.
    pub code: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New active flag.
    pub is_active: Option<bool>,
}

/// Search and ordering applied on top of a visibility scope.
#[derive(Debug, Clone, Default)]
pub struct CourseQuery {
    /// Every term must match one of [`SEARCH_COLUMNS`].
    pub search: Vec<String>,
    /// Sort keys, already validated against [`ORDERING_FIELDS`].
    pub ordering: Vec<OrderField>,
}
