//! Manager for the document model.
use super::{Document, DocumentChanges, DocumentQuery, NewDocument, SEARCH_COLUMNS};
use crate::access::DocumentScope;
use crate::db::filters::{push_document_scope, push_order_by, push_search};
use crate::db::models::status::Status;
use crate::db::DatabaseConnection;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};

/// Appends the scope predicate and every filter of `query` to a `WHERE` clause.
fn push_conditions(builder: &mut QueryBuilder<'_, Sqlite>, scope: &DocumentScope, query: &DocumentQuery) {
    push_document_scope(builder, scope);
    if let Some(file_type) = query.file_type {
        builder.push(" AND d.file_type = ").push_bind(file_type);
    }
    if let Some(status) = query.status {
        builder.push(" AND d.status = ").push_bind(status);
    }
    if let Some(course_id) = query.course_id {
        builder.push(" AND d.course_id = ").push_bind(course_id);
    }
    if let Some(subject) = &query.subject {
        builder.push(" AND d.subject = ").push_bind(subject.clone());
    }
    if let Some(uploaded_by) = query.uploaded_by {
        builder.push(" AND d.uploaded_by = ").push_bind(uploaded_by);
    }
    push_search(builder, SEARCH_COLUMNS, &query.search);
}

#[async_trait]
impl super::Manager for DatabaseConnection {
    /// One page of the documents in `scope` matching `query`, plus the total count.
    ///
    /// # Errors
    /// Errors if can't establish a connection to the database.
    async fn find_visible(
        &self,
        scope: &DocumentScope,
        query: &DocumentQuery,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<(i64, Vec<Document>)> {
        let mut count_builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM document d WHERE ");
        push_conditions(&mut count_builder, scope, query);
        let (count,) = count_builder
            .build_query_as::<(i64,)>()
            .fetch_one(&self.pool)
            .await?;

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT d.* FROM document d WHERE ");
        push_conditions(&mut builder, scope, query);
        push_order_by(&mut builder, &query.ordering, "d.id");
        builder
            .push(" LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let rows = builder
            .build_query_as::<Document>()
            .fetch_all(&self.pool)
            .await?;
        Ok((count, rows))
    }

    /// Find one document by id, provided it falls within `scope`.
    ///
    /// # Errors
    /// Errors if can't establish a connection to the database.
    async fn find_visible_by_id(
        &self,
        scope: &DocumentScope,
        id: i64,
    ) -> anyhow::Result<Option<Document>> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT d.* FROM document d WHERE d.id = ");
        builder.push_bind(id).push(" AND ");
        push_document_scope(&mut builder, scope);
        let row = builder
            .build_query_as::<Document>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Find one document by id regardless of visibility.
    ///
    /// # Errors
    /// Errors if can't establish a connection to the database.
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Document>> {
        let row = sqlx::query_as::<_, Document>("SELECT * FROM document WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Insert a freshly uploaded document.
    ///
    /// # Errors
    /// Errors if the document cannot be inserted into the database.
    async fn create(&self, document: &NewDocument) -> anyhow::Result<Document> {
        let statement = "
            INSERT INTO document (
                title, description, file, file_type, subject, status,
                is_public, course_id, uploaded_by, upload_date, file_size, updated_at
            )
            VALUES ( $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $10 )
        ";
        let id = sqlx::query(statement)
            .bind(&document.title)
            .bind(&document.description)
            .bind(&document.file)
            .bind(document.file_type)
            .bind(&document.subject)
            .bind(Status::Pending)
            .bind(document.is_public)
            .bind(document.course_id)
            .bind(document.uploaded_by)
            .bind(Utc::now())
            .bind(document.file_size)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();
        fetch_existing(self, id).await
    }

    /// Apply metadata changes to a document.
    ///
    /// # Errors
    /// Errors if the document does not exist or cannot be updated.
    async fn update(&self, id: i64, changes: &DocumentChanges) -> anyhow::Result<Document> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("UPDATE document SET updated_at = ");
        builder.push_bind(Utc::now());
        if let Some(title) = &changes.title {
            builder.push(", title = ").push_bind(title.clone());
        }
        if let Some(description) = &changes.description {
            builder.push(", description = ").push_bind(description.clone());
        }
        if let Some(subject) = &changes.subject {
            builder.push(", subject = ").push_bind(subject.clone());
        }
        if let Some(course_id) = changes.course_id {
            builder.push(", course_id = ").push_bind(course_id);
        }
        if let Some(is_public) = changes.is_public {
            builder.push(", is_public = ").push_bind(is_public);
        }
        builder.push(" WHERE id = ").push_bind(id);
        builder.build().execute(&self.pool).await?;
        fetch_existing(self, id).await
    }

    /// Overwrite the status, and the extracted text when given.
    ///
    /// # Errors
    /// Errors if can't establish a connection to the database.
    async fn set_status(
        &self,
        id: i64,
        status: Status,
        extracted_text: Option<&str>,
    ) -> anyhow::Result<()> {
        let statement = "
            UPDATE document
            SET status = $1, extracted_text = COALESCE($2, extracted_text), updated_at = $3
            WHERE id = $4
        ";
        sqlx::query(statement)
            .bind(status)
            .bind(extracted_text)
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Delete a document.
    ///
    /// # Errors
    /// Errors if can't establish a connection to the database.
    async fn delete(&self, id: i64) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM document WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Unscoped lookup used after writes.
async fn fetch_existing(conn: &DatabaseConnection, id: i64) -> anyhow::Result<Document> {
    let row = sqlx::query_as::<_, Document>("SELECT * FROM document WHERE id = $1")
        .bind(id)
        .fetch_optional(&conn.pool)
        .await?;
    row.ok_or_else(|| anyhow::anyhow!("document {id} does not exist"))
}
