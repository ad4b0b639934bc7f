use serde::Deserialize;

/// Query parameters of the course listing.
#[derive(Debug, Deserialize)]
pub struct CourseListQuery {
    /// Free-text search over name, code and description.
    pub search: Option<String>,
    /// Comma separated sort keys, `-` for descending.
    pub ordering: Option<String>,
}

/// Body of course create and update requests.
#[derive(Debug, Default, Deserialize)]
pub struct CourseBody {
    /// Display name.
    pub name: Option<String>,
    /// Unique course code.
    pub code: Option<String>,
    /// Free-form description.
    pub description: Option<String>,
    /// Whether the course is open to every student.
    pub is_active: Option<bool>,
}
