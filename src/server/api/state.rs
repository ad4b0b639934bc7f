//! Centralized state management for the Actix web server
use std::{fmt, sync::Arc};

use crate::{
    config::Config,
    db,
    services::{
        extract::{FileExtractor, TextExtractor},
        gemini::{GeminiClient, Generator},
        lifecycle::Pipeline,
        queue::{DbJobQueue, JobQueue},
    },
};

/// Global, read-only state
pub trait Global {
    /// Database connection
    fn db(&self) -> &db::DatabaseConnection;
    /// Server configuration
    fn config(&self) -> &Config;
    /// Queue receiving conversion jobs
    fn queue(&self) -> &dyn JobQueue;
    /// Generative AI client, absent when no API key is configured
    fn generator(&self) -> Option<&dyn Generator>;
    /// Upload processing wired to this state
    fn pipeline(&self) -> Pipeline<'_>;
}

/// Application state
#[derive(Clone)]
pub struct App {
    /// Database connection
    pub db: db::DatabaseConnection,
    /// Server configuration
    pub config: Arc<Config>,
    /// Text extraction collaborator
    pub extractor: Arc<dyn TextExtractor>,
    /// Audio job queue collaborator
    pub queue: Arc<dyn JobQueue>,
    /// Generative AI collaborator
    pub generator: Option<Arc<dyn Generator>>,
}

impl App {
    /// Wire the production collaborators.
    ///
    /// # Errors
    /// Will error if the media directory cannot be created or the Gemini
    /// client cannot be built.
    pub fn new(db: db::DatabaseConnection, config: Config) -> anyhow::Result<Self> {
        std::fs::create_dir_all(config.documents_dir())?;
        let generator = GeminiClient::from_config(&config.gemini)?
            .map(|client| Arc::new(client) as Arc<dyn Generator>);
        if generator.is_none() {
            tracing::warn!("No Gemini API key configured, AI reading is disabled");
        }
        Ok(Self {
            queue: Arc::new(DbJobQueue { db: db.clone() }),
            db,
            config: Arc::new(config),
            extractor: Arc::new(FileExtractor),
            generator,
        })
    }
}

impl Global for App {
    fn db(&self) -> &db::DatabaseConnection {
        &self.db
    }

    fn config(&self) -> &Config {
        &self.config
    }

    fn queue(&self) -> &dyn JobQueue {
        self.queue.as_ref()
    }

    fn generator(&self) -> Option<&dyn Generator> {
        self.generator.as_deref()
    }

    fn pipeline(&self) -> Pipeline<'_> {
        Pipeline {
            db: &self.db,
            extractor: Arc::clone(&self.extractor),
            queue: self.queue.as_ref(),
            media_root: &self.config.media_root,
            auto_convert: self.config.auto_convert,
        }
    }
}

impl fmt::Debug for App {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(
            formatter,
            "EduVoice app serving media from {} (AI reading {})",
            self.config.media_root.display(),
            if self.generator.is_some() { "enabled" } else { "disabled" }
        )
    }
}
