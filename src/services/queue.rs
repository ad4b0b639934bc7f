//! Hand-off of text-to-speech conversions to the audio worker.
use async_trait::async_trait;
use serde::Deserialize;

use crate::db::models::conversion_job::{self, NewConversionJob};
use crate::db::models::user::User;
use crate::db::DatabaseConnection;

/// Text-to-speech backend a conversion should run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// Google Translate TTS.
    #[default]
    Gtts,
    /// `ElevenLabs` voices.
    Elevenlabs,
    /// Gemini speech generation.
    Gemini,
}

impl Engine {
    /// The `(use_elevenlabs, use_gemini)` flags understood by the worker.
    #[must_use]
    pub const fn flags(self) -> (bool, bool) {
        match self {
            Self::Gtts => (false, false),
            Self::Elevenlabs => (true, false),
            Self::Gemini => (false, true),
        }
    }
}

/// Per-request overrides of a user's stored voice preferences.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConversionOptions {
    /// Voice to synthesize with.
    pub voice_type: Option<String>,
    /// Speech rate multiplier.
    pub speech_rate: Option<f64>,
    /// Language of the synthesized speech.
    pub language: Option<String>,
    /// Backend to synthesize with.
    pub engine: Option<Engine>,
}

impl ConversionOptions {
    /// Fill the gaps from `user`'s preferences and build the job for `document_id`.
    #[must_use]
    pub fn resolve(self, user: &User, document_id: i64) -> NewConversionJob {
        let (use_elevenlabs, use_gemini) = self.engine.unwrap_or_default().flags();
        NewConversionJob {
            document_id,
            user_id: user.id,
            voice_type: self
                .voice_type
                .unwrap_or_else(|| user.preferred_voice_type.clone()),
            speech_rate: self.speech_rate.unwrap_or(user.preferred_speech_rate),
            language: self
                .language
                .unwrap_or_else(|| user.preferred_language.clone()),
            use_elevenlabs,
            use_gemini,
        }
    }
}

/// Asynchronous work queue consumed by the audio worker.
///
/// Enqueueing is fire-and-forget: ordering, retries and completion belong to
/// the consumer.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Queue `job` and return its identifier.
    ///
    /// # Errors
    /// Errors if the job could not be queued.
    async fn enqueue(&self, job: NewConversionJob) -> anyhow::Result<String>;
}

/// Queue backed by the `conversion_job` table.
#[derive(Debug, Clone)]
pub struct DbJobQueue {
    /// Database holding the queue table.
    pub db: DatabaseConnection,
}

#[async_trait]
impl JobQueue for DbJobQueue {
    #[tracing::instrument(name = "Queueing audio conversion", skip(self))]
    async fn enqueue(&self, job: NewConversionJob) -> anyhow::Result<String> {
        let id = conversion_job::Manager::create(&self.db, &job).await?;
        tracing::info!(job_id = id, document_id = job.document_id, "Queued audio conversion");
        Ok(id.to_string())
    }
}
