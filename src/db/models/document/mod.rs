use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::access::DocumentScope;
use crate::db::filters::OrderField;
use crate::db::models::status::Status;

pub mod manager;

/// Columns a document listing may be ordered by, keyed by their public name.
pub const ORDERING_FIELDS: &[(&str, &str)] = &[
    ("title", "d.title"),
    ("upload_date", "d.upload_date"),
    ("file_size", "d.file_size"),
];

/// Columns covered by free-text search.
pub const SEARCH_COLUMNS: &[&str] = &["d.title", "d.description", "d.subject", "d.extracted_text"];

/// Trait for managing documents.
#[async_trait]
pub trait Manager {
    /// One page of the documents in `scope` matching `query`, plus the total count.
    async fn find_visible(
        &self,
        scope: &DocumentScope,
        query: &DocumentQuery,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<(i64, Vec<Document>)>;
    /// Find one document by id, provided it falls within `scope`.
    async fn find_visible_by_id(
        &self,
        scope: &DocumentScope,
        id: i64,
    ) -> anyhow::Result<Option<Document>>;
    /// Find one document by id regardless of visibility.
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Document>>;
    /// Insert a freshly uploaded document in the `PENDING` state.
    async fn create(&self, document: &NewDocument) -> anyhow::Result<Document>;
    /// Apply metadata changes to a document.
    async fn update(&self, id: i64, changes: &DocumentChanges) -> anyhow::Result<Document>;
    /// Overwrite the status, and the extracted text when given.
    async fn set_status(
        &self,
        id: i64,
        status: Status,
        extracted_text: Option<&str>,
    ) -> anyhow::Result<()>;
    /// Delete a document.
    async fn delete(&self, id: i64) -> anyhow::Result<()>;
}

/// Supported upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Deserialize, Serialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// Portable Document Format.
    Pdf,
    /// Plain text.
    Txt,
    /// Markdown, extracted as plain text.
    Md,
    /// HTML page.
    Html,
}

impl FileType {
    /// Detect the file type from a file name's extension.
    #[must_use]
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let (_, extension) = file_name.rsplit_once('.')?;
        match extension.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" | "text" => Some(Self::Txt),
            "md" | "markdown" => Some(Self::Md),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
/// Model for documents.
pub struct Document {
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
    /// Plain text of the file, once extraction succeeded.
    pub extracted_text: Option<String>,
    /// Processing status.
    pub status: Status,
    /// Whether every user may see the document.
    pub is_public: bool,
    /// Course the document belongs to.
    #[serde(rename = "course")]
    pub course_id: Option<i64>,
    /// Uploader and owner of the document.
    pub uploaded_by: i64,
    /// Upload time.
    pub upload_date: DateTime<Utc>,
    /// Size of the stored file in bytes.
    pub file_size: i64,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Whether extraction left usable text behind.
    #[must_use]
    pub fn has_text(&self) -> bool {
        self.extracted_text
            .as_deref()
            .is_some_and(|text| !text.trim().is_empty())
    }
}

/// A freshly stored upload.
#[derive(Debug, Clone)]
pub struct NewDocument {
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
    /// Whether every user may see the document.
    pub is_public: bool,
    /// Course the document belongs to.
    pub course_id: Option<i64>,
    /// Uploader.
    pub uploaded_by: i64,
    /// Size of the stored file in bytes.
    pub file_size: i64,
}

/// Partial metadata update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct DocumentChanges {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New subject.
    pub subject: Option<String>,
    /// New course, `Some(None)` detaches the document.
    pub course_id: Option<Option<i64>>,
    /// New public flag.
    pub is_public: Option<bool>,
}

/// Filters, search and ordering applied on top of a visibility scope.
#[derive(Debug, Clone, Default)]
pub struct DocumentQuery {
    /// Exact file type.
    pub file_type: Option<FileType>,
    /// Exact status.
    pub status: Option<Status>,
    /// Exact course.
    pub course_id: Option<i64>,
    /// Exact subject.
    pub subject: Option<String>,
    /// Exact uploader.
    pub uploaded_by: Option<i64>,
    /// Every term must match one of [`SEARCH_COLUMNS`].
    pub search: Vec<String>,
    /// Sort keys, already validated against [`ORDERING_FIELDS`].
    pub ordering: Vec<OrderField>,
}
