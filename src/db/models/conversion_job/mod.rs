use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub mod manager;

/// Trait for managing queued conversion jobs.
#[async_trait]
pub trait Manager {
    /// Queue a job and return its id.
    async fn create(&self, job: &NewConversionJob) -> anyhow::Result<i64>;
    /// All jobs queued for a document, oldest first.
    async fn find_by_document(&self, document_id: i64) -> anyhow::Result<Vec<ConversionJob>>;
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
/// Model for a text-to-speech job handed to the audio worker.
pub struct ConversionJob {
    /// Job identifier returned to the caller.
    pub id: i64,
    /// Document to convert.
    pub document_id: i64,
    /// User who requested the conversion.
    pub user_id: i64,
    /// Voice to synthesize with.
    pub voice_type: String,
    /// Speech rate multiplier.
    pub speech_rate: f64,
    /// Language of the synthesized speech.
    pub language: String,
    /// Synthesize with `ElevenLabs`.
    pub use_elevenlabs: bool,
    /// Synthesize with Gemini.
    pub use_gemini: bool,
    /// Worker-owned status, `queued` on insert.
    pub status: String,
    /// Enqueue time.
    pub created_at: DateTime<Utc>,
}

/// Parameters of a conversion job.
#[derive(Debug, Clone, PartialEq)]
pub struct NewConversionJob {
    /// Document to convert.
    pub document_id: i64,
    /// User who requested the conversion.
    pub user_id: i64,
    /// Voice to synthesize with.
    pub voice_type: String,
    /// Speech rate multiplier.
    pub speech_rate: f64,
    /// Language of the synthesized speech.
    pub language: String,
    /// Synthesize with `ElevenLabs`.
    pub use_elevenlabs: bool,
    /// Synthesize with Gemini.
    pub use_gemini: bool,
}
