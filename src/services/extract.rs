//! Turning stored uploads into plain text.
use std::fs;
use std::path::Path;

use scraper::{Html, Selector};

use crate::db::models::document::FileType;

/// Elements whose text is kept when extracting HTML.
const HTML_CONTENT_SELECTOR: &str = "h1, h2, h3, h4, h5, h6, p, li, blockquote, pre, td, th";

/// Extracts plain text from a stored file.
///
/// Implementations are called from a blocking thread and may take their time.
pub trait TextExtractor: Send + Sync {
    /// Read the file at `path` and return its text.
    ///
    /// # Errors
    /// Errors if the file cannot be read or parsed.
    fn extract(&self, path: &Path, file_type: FileType) -> anyhow::Result<String>;
}

/// Extractor reading files from local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileExtractor;

impl TextExtractor for FileExtractor {
    fn extract(&self, path: &Path, file_type: FileType) -> anyhow::Result<String> {
        let data = fs::read(path)?;
        match file_type {
            FileType::Pdf => extract_pdf(&data),
            FileType::Html => extract_html(&data),
            FileType::Txt | FileType::Md => Ok(String::from_utf8(data)?),
        }
    }
}

/// Text of every page, as laid out by `pdf-extract`.
fn extract_pdf(data: &[u8]) -> anyhow::Result<String> {
    pdf_extract::extract_text_from_mem(data)
        .map_err(|err| anyhow::anyhow!("unable to parse PDF: {err}"))
}

/// Text of content-bearing elements, one per line. Falls back to the whole
/// `<body>` for pages without such elements.
fn extract_html(data: &[u8]) -> anyhow::Result<String> {
    let document = Html::parse_document(&String::from_utf8_lossy(data));
    let content = Selector::parse(HTML_CONTENT_SELECTOR)
        .map_err(|err| anyhow::anyhow!("invalid selector: {err:?}"))?;
    let mut lines: Vec<String> = document
        .select(&content)
        .map(|element| element.text().collect::<String>().trim().to_owned())
        .filter(|line| !line.is_empty())
        .collect();
    if lines.is_empty() {
        let body =
            Selector::parse("body").map_err(|err| anyhow::anyhow!("invalid selector: {err:?}"))?;
        lines = document
            .select(&body)
            .map(|element| element.text().collect::<Vec<_>>().join(" ").trim().to_owned())
            .collect();
    }
    Ok(lines.join("\n"))
}
