//! Shared SQL fragments for listing endpoints: visibility scopes, free-text
//! search and ordering.
use sqlx::{QueryBuilder, Sqlite};

use crate::access::{CourseScope, DocumentScope};

/// One validated sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderField {
    /// Qualified column name, taken from a whitelist.
    pub column: &'static str,
    /// Sort descending.
    pub descending: bool,
}

/// Split a search string into terms. Terms are separated by whitespace or commas.
#[must_use]
pub fn search_terms(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(|ch: char| ch.is_whitespace() || ch == ',')
        .filter(|term| !term.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Parse a comma separated ordering such as `-upload_date,title`.
///
/// Names missing from `allowed` are ignored. Falls back to `default` when no
/// valid key remains.
#[must_use]
pub fn parse_ordering(
    raw: Option<&str>,
    allowed: &[(&str, &'static str)],
    default: OrderField,
) -> Vec<OrderField> {
    let fields: Vec<OrderField> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter_map(|key| {
            let (name, descending) = key
                .strip_prefix('-')
                .map_or((key, false), |name| (name, true));
            allowed
                .iter()
                .find(|(public, _)| *public == name)
                .map(|&(_, column)| OrderField { column, descending })
        })
        .collect();
    if fields.is_empty() {
        vec![default]
    } else {
        fields
    }
}

/// Escape `LIKE` wildcards so a term matches literally.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

/// Append `AND (col LIKE term OR ...)` for every term.
pub fn push_search(builder: &mut QueryBuilder<'_, Sqlite>, columns: &[&str], terms: &[String]) {
    for term in terms {
        let pattern = like_pattern(term);
        builder.push(" AND (");
        for (index, column) in columns.iter().enumerate() {
            if index > 0 {
                builder.push(" OR ");
            }
            builder
                .push(*column)
                .push(" LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\'");
        }
        builder.push(")");
    }
}

/// Append `ORDER BY`, with `tiebreak` descending as the last key.
pub fn push_order_by(builder: &mut QueryBuilder<'_, Sqlite>, fields: &[OrderField], tiebreak: &str) {
    builder.push(" ORDER BY ");
    for field in fields {
        builder
            .push(field.column)
            .push(if field.descending { " DESC, " } else { " ASC, " });
    }
    builder.push(tiebreak).push(" DESC");
}

/// Course visibility as a predicate over `course c`.
pub fn push_course_scope(builder: &mut QueryBuilder<'_, Sqlite>, scope: &CourseScope) {
    match *scope {
        CourseScope::CreatedBy(user_id) => {
            builder.push("c.created_by = ").push_bind(user_id);
        }
        CourseScope::EnrolledOrActive(user_id) => {
            builder
                .push("(c.is_active = 1 OR c.id IN (SELECT course_id FROM course_student WHERE user_id = ")
                .push_bind(user_id)
                .push("))");
        }
    }
}

/// Document visibility as a predicate over `document d`.
pub fn push_document_scope(builder: &mut QueryBuilder<'_, Sqlite>, scope: &DocumentScope) {
    match *scope {
        DocumentScope::All => {
            builder.push("1 = 1");
        }
        DocumentScope::UploadedOrPublic(user_id) => {
            builder
                .push("(d.is_public = 1 OR d.uploaded_by = ")
                .push_bind(user_id)
                .push(")");
        }
        DocumentScope::Learner(user_id) => {
            builder
                .push("(d.is_public = 1 OR d.uploaded_by = ")
                .push_bind(user_id)
                .push(" OR d.course_id IN (SELECT course_id FROM course_student WHERE user_id = ")
                .push_bind(user_id)
                .push("))");
        }
    }
}
