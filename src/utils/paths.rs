//! Utility functions for naming and writing stored uploads
use std::fs::OpenOptions;
use std::io::{self, Write as _};
use std::path::Path;

use chrono::{DateTime, Utc};

/// Directory, relative to the media root, holding uploaded documents.
pub const DOCUMENTS_DIR: &str = "documents";

/// Reduce a client supplied file name to a safe single path component.
///
/// Keeps ASCII alphanumerics, `.`, `-` and `_`; everything else becomes `_`.
/// Leading dots are dropped so the result is never hidden or a parent reference.
#[must_use]
pub fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name);
    let cleaned: String = base
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '_') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "upload".to_owned()
    } else {
        trimmed.to_owned()
    }
}

/// Path, relative to the media root, an upload received at `now` is stored at.
#[must_use]
pub fn stored_file_name(file_name: &str, now: DateTime<Utc>) -> String {
    format!(
        "{DOCUMENTS_DIR}/{}_{}",
        now.format("%Y%m%d%H%M%S%6f"),
        sanitize_file_name(file_name)
    )
}

/// Write `bytes` to a file that must not exist yet.
///
/// # Errors
/// Fails with `io::ErrorKind::AlreadyExists` instead of overwriting an existing file.
pub fn write_new_file(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
