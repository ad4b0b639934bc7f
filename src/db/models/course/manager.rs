//! Manager for the course model.
use std::collections::HashMap;

use super::{Course, CourseChanges, CourseQuery, NewCourse, SEARCH_COLUMNS};
use crate::access::CourseScope;
use crate::db::filters::{push_course_scope, push_order_by, push_search};
use crate::db::DatabaseConnection;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};

#[async_trait]
impl super::Manager for DatabaseConnection {
    /// Find all courses in `scope` matching `query`.
    ///
    /// # Errors
    /// Errors if can't establish a connection to the database.
    async fn find_visible(
        &self,
        scope: &CourseScope,
        query: &CourseQuery,
    ) -> anyhow::Result<Vec<Course>> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT c.* FROM course c WHERE ");
        push_course_scope(&mut builder, scope);
        push_search(&mut builder, SEARCH_COLUMNS, &query.search);
        push_order_by(&mut builder, &query.ordering, "c.id");
        let rows = builder
            .build_query_as::<Course>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Find one course by id, provided it falls within `scope`.
    ///
    /// # Errors
    /// Errors if can't establish a connection to the database.
    async fn find_visible_by_id(
        &self,
        scope: &CourseScope,
        id: i64,
    ) -> anyhow::Result<Option<Course>> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT c.* FROM course c WHERE c.id = ");
        builder.push_bind(id).push(" AND ");
        push_course_scope(&mut builder, scope);
        let row = builder
            .build_query_as::<Course>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Whether a course with this id exists at all.
    ///
    /// # Errors
    /// Errors if can't establish a connection to the database.
    async fn exists(&self, id: i64) -> anyhow::Result<bool> {
        let row = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM course WHERE id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0 > 0)
    }

    /// Whether `code` is used by a course other than `except`.
    ///
    /// # Errors
    /// Errors if can't establish a connection to the database.
    async fn code_taken(&self, code: &str, except: Option<i64>) -> anyhow::Result<bool> {
        let statement = "
            SELECT COUNT(*)
            FROM course
            WHERE code = $1 AND id != $2
        ";
        let row = sqlx::query_as::<_, (i64,)>(statement)
            .bind(code)
            .bind(except.unwrap_or(-1))
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0 > 0)
    }

    /// Enrolled student ids for each of the given courses.
    ///
    /// # Errors
    /// Errors if can't establish a connection to the database.
    async fn students_of(&self, course_ids: &[i64]) -> anyhow::Result<HashMap<i64, Vec<i64>>> {
        let mut students: HashMap<i64, Vec<i64>> = HashMap::new();
        if course_ids.is_empty() {
            return Ok(students);
        }
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT course_id, user_id FROM course_student WHERE course_id IN (");
        let mut separated = builder.separated(", ");
        for id in course_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY user_id");
        let rows = builder
            .build_query_as::<(i64, i64)>()
            .fetch_all(&self.pool)
            .await?;
        for (course_id, user_id) in rows {
            students.entry(course_id).or_default().push(user_id);
        }
        Ok(students)
    }

    /// Insert a new course into the database.
    ///
    /// # Errors
    /// Errors if the course cannot be inserted into the database.
    async fn create(&self, course: &NewCourse) -> anyhow::Result<Course> {
        let statement = "
            INSERT INTO course ( name, code, description, is_active, created_by, created_at, updated_at )
            VALUES ( $1, $2, $3, $4, $5, $6, $6 )
        ";
        let id = sqlx::query(statement)
            .bind(&course.name)
            .bind(&course.code)
            .bind(&course.description)
            .bind(course.is_active)
            .bind(course.created_by)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?
            .last_insert_rowid();
        find_by_id(self, id).await
    }

    /// Apply the given changes to a course.
    ///
    /// # Errors
    /// Errors if the course does not exist or cannot be updated.
    async fn update(&self, id: i64, changes: &CourseChanges) -> anyhow::Result<Course> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE course SET updated_at = ");
        builder.push_bind(Utc::now());
        if let Some(name) = &changes.name {
            builder.push(", name = ").push_bind(name.clone());
        }
        if let Some(code) = &changes.code {
            builder.push(", code = ").push_bind(code.clone());
        }
        if let Some(description) = &changes.description {
            builder.push(", description = ").push_bind(description.clone());
        }
        if let Some(is_active) = changes.is_active {
            builder.push(", is_active = ").push_bind(is_active);
        }
        builder.push(" WHERE id = ").push_bind(id);
        builder.build().execute(&self.pool).await?;
        find_by_id(self, id).await
    }

    /// Delete a course.
    ///
    /// # Errors
    /// Errors if can't establish a connection to the database.
    async fn delete(&self, id: i64) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM course WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Add a user to the enrollment set.
    ///
    /// # Errors
    /// Errors if can't establish a connection to the database.
    async fn enroll(&self, course_id: i64, user_id: i64) -> anyhow::Result<()> {
        let statement = "
            INSERT OR IGNORE INTO course_student ( course_id, user_id )
            VALUES ( $1, $2 )
        ";
        sqlx::query(statement)
            .bind(course_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Remove a user from the enrollment set.
    ///
    /// # Errors
    /// Errors if can't establish a connection to the database.
    async fn unenroll(&self, course_id: i64, user_id: i64) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM course_student WHERE course_id = $1 AND user_id = $2")
            .bind(course_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Unscoped lookup used after writes.
async fn find_by_id(conn: &DatabaseConnection, id: i64) -> anyhow::Result<Course> {
    let row = sqlx::query_as::<_, Course>("SELECT * FROM course WHERE id = $1")
        .bind(id)
        .fetch_optional(&conn.pool)
        .await?;
    row.ok_or_else(|| anyhow::anyhow!("course {id} does not exist"))
}
