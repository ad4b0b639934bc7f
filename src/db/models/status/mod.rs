//! Processing status of an uploaded document.
use serde::{Deserialize, Serialize};

/// Enum representation for the processing status of a document.
///
/// Documents move `Pending -> Processing -> Ready | Error`. Anything else is
/// rejected by [`Status::transition_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Deserialize, Serialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    /// Stored, extraction not started.
    Pending,
    /// Extraction in progress.
    Processing,
    /// Text extracted, ready for conversion and reading.
    Ready,
    /// Extraction failed or produced no text.
    Error,
}

impl Status {
    /// Convert a `Status` enum to its stored representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Ready => "READY",
            Self::Error => "ERROR",
        }
    }

    /// Whether `next` is a legal successor of this status.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Processing, Self::Ready | Self::Error)
        )
    }

    /// Move to `next`.
    /// # Errors
    /// Returns an error if `next` is not a legal successor.
    pub fn transition_to(self, next: Self) -> anyhow::Result<Self> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(anyhow::anyhow!(
                "illegal document status transition {} -> {}",
                self.as_str(),
                next.as_str()
            ))
        }
    }
}
