use serde::{Deserialize, Deserializer};

use crate::db::models::document::FileType;
use crate::db::models::status::Status;

/// Query parameters of the document listing.
#[derive(Debug, Deserialize)]
pub struct DocumentListQuery {
    /// Exact file type.
    pub file_type: Option<FileType>,
    /// Exact processing status.
    pub status: Option<Status>,
    /// Exact course id.
    pub course: Option<i64>,
    /// Exact subject.
    pub subject: Option<String>,
    /// Free-text search over title, description, subject and text.
    pub search: Option<String>,
    /// Comma separated sort keys, `-` for descending.
    pub ordering: Option<String>,
    /// 1-based page number.
    pub page: Option<u64>,
}

/// Query parameters of `my_documents`.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    /// 1-based page number.
    pub page: Option<u64>,
}

/// A document upload. The file travels base64 encoded.
#[derive(Debug, Deserialize)]
pub struct DocumentUpload {
    /// Display title.
    pub title: Option<String>,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Subject the document covers.
    #[serde(default)]
    pub subject: String,
    /// Course to attach the document to.
    pub course: Option<i64>,
    /// Whether every user may see the document.
    #[serde(default)]
    pub is_public: bool,
    /// Original file name. Its extension decides the file type.
    pub file_name: String,
    /// Base64 encoded file content.
    pub file_content: String,
}

/// Metadata changes of a document.
#[derive(Debug, Default, Deserialize)]
pub struct DocumentMetadata {
    /// Display title.
    pub title: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
    /// Subject the document covers.
    pub subject: Option<String>,
    /// Course to attach to, `null` detaches.
    #[serde(default, deserialize_with = "double_option")]
    pub course: Option<Option<i64>>,
    /// Whether every user may see the document.
    pub is_public: Option<bool>,
}

/// Body of `gemini_read`.
#[derive(Debug, Default, Deserialize)]
pub struct ReadRequest {
    /// `summary`, `explain`, `key_points` or `quiz`.
    pub mode: Option<String>,
    /// Language code of the answer.
    pub language: Option<String>,
}

/// Tell a missing field (`None`) apart from an explicit `null` (`Some(None)`).
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
