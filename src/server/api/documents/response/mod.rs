use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::models::document::{Document, FileType};
use crate::db::models::status::Status;

/// List representation of a document, without its extracted text.
#[derive(Debug, Serialize)]
pub struct DocumentSummary {
    /// Unique document identifier.
    pub id: i64,
    /// Display title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Stored file, relative to the media root.
    pub file: String,
    /// Format of the stored file.
    pub file_type: FileType,
    /// Subject the document covers.
    pub subject: String,
    /// Processing status.
    pub status: Status,
    /// Whether every user may see the document.
    pub is_public: bool,
    /// Course the document belongs to.
    pub course: Option<i64>,
    /// Uploader.
    pub uploaded_by: i64,
    /// Upload time.
    pub upload_date: DateTime<Utc>,
    /// Size of the stored file in bytes.
    pub file_size: i64,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl From<Document> for DocumentSummary {
    fn from(document: Document) -> Self {
        Self {
            id: document.id,
            title: document.title,
            description: document.description,
            file: document.file,
            file_type: document.file_type,
            subject: document.subject,
            status: document.status,
            is_public: document.is_public,
            course: document.course_id,
            uploaded_by: document.uploaded_by,
            upload_date: document.upload_date,
            file_size: document.file_size,
            updated_at: document.updated_at,
        }
    }
}

/// Answer of `gemini_read`.
#[derive(Debug, Serialize)]
pub struct ReadResponse {
    /// Document that was read.
    pub document_id: i64,
    /// Its title.
    pub document_title: String,
    /// Mode the model ran in.
    pub mode: crate::services::gemini::ReadMode,
    /// Generated text.
    pub content: String,
    /// Always `success`.
    pub status: &'static str,
}
