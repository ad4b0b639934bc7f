//! Create-time processing of uploaded documents.
//!
//! An upload is stored as `PENDING`, moved to `PROCESSING`, and settles on
//! `READY` or `ERROR` before the upload request returns. Extraction problems
//! are recorded on the document and never fail the upload.
use std::path::Path;
use std::sync::Arc;

use actix_web::web;

use crate::db::models::document::{self, Document};
use crate::db::models::status::Status;
use crate::db::models::user;
use crate::db::DatabaseConnection;
use crate::services::extract::TextExtractor;
use crate::services::queue::{ConversionOptions, JobQueue};

/// Everything the lifecycle hook needs from the running server.
pub struct Pipeline<'a> {
    /// Database holding the document.
    pub db: &'a DatabaseConnection,
    /// Extractor run on the stored file.
    pub extractor: Arc<dyn TextExtractor>,
    /// Queue receiving the automatic conversion.
    pub queue: &'a dyn JobQueue,
    /// Directory the document's `file` is relative to.
    pub media_root: &'a Path,
    /// Queue a conversion once the document is ready.
    pub auto_convert: bool,
}

/// Final status, and text to store, for an extraction outcome.
#[must_use]
pub fn settle(document_id: i64, outcome: anyhow::Result<String>) -> (Status, Option<String>) {
    match outcome {
        Ok(text) if !text.trim().is_empty() => (Status::Ready, Some(text)),
        Ok(_) => {
            tracing::warn!(document_id, "Extraction produced no text");
            (Status::Error, None)
        }
        Err(err) => {
            tracing::error!(document_id, "Error processing document: {err:#}");
            (Status::Error, None)
        }
    }
}

impl Pipeline<'_> {
    /// Run extraction for a freshly stored document and persist the outcome.
    ///
    /// # Errors
    /// Errors only if the database cannot be written; extraction failures end
    /// in `Status::Error`. A failed write of the outcome falls back to
    /// `Status::Error` so the row does not stay `PROCESSING`.
    #[tracing::instrument(name = "Processing upload", skip(self, document), fields(document_id = document.id))]
    pub async fn process(&self, document: Document) -> anyhow::Result<Document> {
        let processing = document.status.transition_to(Status::Processing)?;
        document::Manager::set_status(self.db, document.id, processing, None).await?;

        let extractor = Arc::clone(&self.extractor);
        let path = self.media_root.join(&document.file);
        let file_type = document.file_type;
        let outcome = match web::block(move || extractor.extract(&path, file_type)).await {
            Ok(result) => result,
            Err(err) => Err(anyhow::anyhow!("extractor aborted: {err}")),
        };

        let (next, text) = settle(document.id, outcome);
        let settled = processing.transition_to(next)?;
        let stored =
            document::Manager::set_status(self.db, document.id, settled, text.as_deref()).await;
        let status = match stored {
            Ok(()) => settled,
            Err(err) => {
                tracing::error!(
                    document_id = document.id,
                    "Unable to store extraction outcome: {err:#}"
                );
                document::Manager::set_status(self.db, document.id, Status::Error, None)
                    .await
                    .map_err(|_| err)?;
                Status::Error
            }
        };

        if status == Status::Ready && self.auto_convert {
            self.queue_conversion(&document).await;
        }
        document::Manager::find_by_id(self.db, document.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("document {} vanished during processing", document.id))
    }

    /// Queue a conversion with the uploader's preferences. Failures are logged.
    async fn queue_conversion(&self, document: &Document) {
        let uploader = match user::Manager::find_by_id(self.db, document.uploaded_by).await {
            Ok(Some(uploader)) => uploader,
            Ok(None) => {
                tracing::warn!(document_id = document.id, "Uploader no longer exists");
                return;
            }
            Err(err) => {
                tracing::warn!(document_id = document.id, "Unable to load uploader: {err}");
                return;
            }
        };
        let job = ConversionOptions::default().resolve(&uploader, document.id);
        if let Err(err) = self.queue.enqueue(job).await {
            tracing::warn!(document_id = document.id, "Unable to queue conversion: {err}");
        }
    }
}
