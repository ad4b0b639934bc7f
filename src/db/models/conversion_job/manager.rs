//! Manager for the conversion job model.
use super::{ConversionJob, NewConversionJob};
use crate::db::DatabaseConnection;
use async_trait::async_trait;
use chrono::Utc;

#[async_trait]
impl super::Manager for DatabaseConnection {
    /// Queue a job.
    ///
    /// # Errors
    /// Errors if the job cannot be inserted into the database.
    async fn create(&self, job: &NewConversionJob) -> anyhow::Result<i64> {
        let statement = "
            INSERT INTO conversion_job (
                document_id, user_id, voice_type, speech_rate, language,
                use_elevenlabs, use_gemini, status, created_at
            )
            VALUES ( $1, $2, $3, $4, $5, $6, $7, 'queued', $8 )
        ";
        let id = sqlx::query(statement)
            .bind(job.document_id)
            .bind(job.user_id)
            .bind(&job.voice_type)
            .bind(job.speech_rate)
            .bind(&job.language)
            .bind(job.use_elevenlabs)
            .bind(job.use_gemini)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?
            .last_insert_rowid();
        Ok(id)
    }

    /// All jobs queued for a document, oldest first.
    ///
    /// # Errors
    /// Errors if can't establish a connection to the database.
    async fn find_by_document(&self, document_id: i64) -> anyhow::Result<Vec<ConversionJob>> {
        let statement = "
            SELECT *
            FROM conversion_job
            WHERE document_id = $1
            ORDER BY id
        ";
        let rows = sqlx::query_as::<_, ConversionJob>(statement)
            .bind(document_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
