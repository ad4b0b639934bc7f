//! Handlers for courses and enrollment.
#![allow(
    clippy::unused_async,
    reason = "Unused asyncs are the norm in Actix route definition files"
)]
use actix_web::{web, HttpResponse};
use serde::Serialize;
use serde_json::json;

use super::auth::Actor;
use super::state::{App as AppState, Global as _};
use crate::access::{self, CourseScope};
use crate::db::filters::{parse_ordering, search_terms, OrderField};
use crate::db::models::course::{self, Course, CourseChanges, CourseQuery, NewCourse};
use crate::db::models::user::Role;
use crate::server::errors::ApiError;

/// Module that maps the HTTP web request body to structs.
pub mod request;

/// Default ordering of course listings.
const DEFAULT_ORDERING: OrderField = OrderField {
    column: "c.created_at",
    descending: true,
};

/// A course as returned by the API, with its enrollment set.
#[derive(Debug, Serialize)]
pub struct CourseResponse {
    /// The stored course.
    #[serde(flatten)]
    pub course: Course,
    /// Enrolled student ids.
    pub students: Vec<i64>,
    /// Number of enrolled students.
    pub student_count: usize,
}

impl CourseResponse {
    fn new(course: Course, students: Vec<i64>) -> Self {
        Self {
            student_count: students.len(),
            course,
            students,
        }
    }
}

/// A required text field, trimmed and non-blank.
fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| ApiError::Validation(format!("'{field}' is required and may not be blank.")))
}

/// Course `id` if visible to `actor`, otherwise 404.
async fn visible_course(data: &AppState, scope: &CourseScope, id: i64) -> Result<Course, ApiError> {
    course::Manager::find_visible_by_id(data.db(), scope, id)
        .await?
        .ok_or(ApiError::NotFound)
}

/// Wrap one course with its students.
async fn with_students(data: &AppState, course: Course) -> Result<CourseResponse, ApiError> {
    let mut students = course::Manager::students_of(data.db(), &[course.id]).await?;
    let enrolled = students.remove(&course.id).unwrap_or_default();
    Ok(CourseResponse::new(course, enrolled))
}

/// List the courses visible to the caller.
#[tracing::instrument(name = "Listing courses", skip(data, actor))]
pub async fn list(
    data: web::Data<AppState>,
    actor: Actor,
    query: web::Query<request::CourseListQuery>,
) -> Result<HttpResponse, ApiError> {
    let scope = access::course_scope(actor.user());
    let query = query.into_inner();
    let course_query = CourseQuery {
        search: search_terms(query.search.as_deref()),
        ordering: parse_ordering(query.ordering.as_deref(), course::ORDERING_FIELDS, DEFAULT_ORDERING),
    };
    let courses = course::Manager::find_visible(data.db(), &scope, &course_query).await?;
    let ids: Vec<i64> = courses.iter().map(|course| course.id).collect();
    let mut students = course::Manager::students_of(data.db(), &ids).await?;
    let body: Vec<CourseResponse> = courses
        .into_iter()
        .map(|course| {
            let enrolled = students.remove(&course.id).unwrap_or_default();
            CourseResponse::new(course, enrolled)
        })
        .collect();
    Ok(HttpResponse::Ok().json(body))
}

/// Create a course owned by the caller. Teachers and admins only.
#[tracing::instrument(name = "Creating course", skip(data, actor, body))]
pub async fn create(
    data: web::Data<AppState>,
    actor: Actor,
    body: web::Json<request::CourseBody>,
) -> Result<HttpResponse, ApiError> {
    let user = actor.user();
    if user.role == Role::Student {
        return Err(ApiError::Forbidden);
    }
    let body = body.into_inner();
    let name = required(body.name, "name")?;
    let code = required(body.code, "code")?;
    if course::Manager::code_taken(data.db(), &code, None).await? {
        return Err(ApiError::Validation(format!("course with code '{code}' already exists.")));
    }
    let new_course = NewCourse {
        name,
        code,
        description: body.description.unwrap_or_default(),
        is_active: body.is_active.unwrap_or(true),
        created_by: user.id,
    };
    let created = course::Manager::create(data.db(), &new_course).await?;
    tracing::info!(course_id = created.id, "Course created");
    Ok(HttpResponse::Created().json(CourseResponse::new(created, Vec::new())))
}

/// Retrieve one visible course.
#[tracing::instrument(name = "Retrieving course", skip(data, actor))]
pub async fn retrieve(
    data: web::Data<AppState>,
    actor: Actor,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let scope = access::course_scope(actor.user());
    let found = visible_course(&data, &scope, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(with_students(&data, found).await?))
}

/// Shared body of `PUT` (`partial = false`) and `PATCH`.
async fn apply_update(
    data: &AppState,
    actor: &Actor,
    id: i64,
    body: request::CourseBody,
    partial: bool,
) -> Result<HttpResponse, ApiError> {
    let user = actor.user();
    let existing = visible_course(data, &access::course_scope(user), id).await?;
    if !access::can_modify_course(user, &existing) {
        return Err(ApiError::Forbidden);
    }
    let (name, code) = if partial {
        (
            body.name.map(|name| required(Some(name), "name")).transpose()?,
            body.code.map(|code| required(Some(code), "code")).transpose()?,
        )
    } else {
        (
            Some(required(body.name, "name")?),
            Some(required(body.code, "code")?),
        )
    };
    if let Some(code) = &code {
        if course::Manager::code_taken(data.db(), code, Some(id)).await? {
            return Err(ApiError::Validation(format!("course with code '{code}' already exists.")));
        }
    }
    let changes = CourseChanges {
        name,
        code,
        description: body.description,
        is_active: body.is_active,
    };
    let updated = course::Manager::update(data.db(), id, &changes).await?;
    Ok(HttpResponse::Ok().json(with_students(data, updated).await?))
}

/// Replace a course's fields. Owner only.
#[tracing::instrument(name = "Updating course", skip(data, actor, body))]
pub async fn update(
    data: web::Data<AppState>,
    actor: Actor,
    path: web::Path<i64>,
    body: web::Json<request::CourseBody>,
) -> Result<HttpResponse, ApiError> {
    apply_update(&data, &actor, path.into_inner(), body.into_inner(), false).await
}

/// Change some of a course's fields. Owner only.
#[tracing::instrument(name = "Patching course", skip(data, actor, body))]
pub async fn partial_update(
    data: web::Data<AppState>,
    actor: Actor,
    path: web::Path<i64>,
    body: web::Json<request::CourseBody>,
) -> Result<HttpResponse, ApiError> {
    apply_update(&data, &actor, path.into_inner(), body.into_inner(), true).await
}

/// Delete a course. Owner only.
#[tracing::instrument(name = "Deleting course", skip(data, actor))]
pub async fn destroy(
    data: web::Data<AppState>,
    actor: Actor,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let user = actor.user();
    let existing = visible_course(&data, &access::course_scope(user), path.into_inner()).await?;
    if !access::can_modify_course(user, &existing) {
        return Err(ApiError::Forbidden);
    }
    course::Manager::delete(data.db(), existing.id).await?;
    tracing::info!(course_id = existing.id, "Course deleted");
    Ok(HttpResponse::NoContent().finish())
}

/// Enroll the caller in a course. Students only.
#[tracing::instrument(name = "Enrolling in course", skip(data, actor))]
pub async fn enroll(
    data: web::Data<AppState>,
    actor: Actor,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let user = actor.user();
    if !user.role.is_student() {
        return Err(ApiError::Validation(
            "Only students can enroll in courses.".to_owned(),
        ));
    }
    let found = visible_course(&data, &access::course_scope(user), path.into_inner()).await?;
    course::Manager::enroll(data.db(), found.id, user.id).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Successfully enrolled in course." })))
}

/// Remove the caller from a course. Succeeds whether or not they were enrolled.
#[tracing::instrument(name = "Unenrolling from course", skip(data, actor))]
pub async fn unenroll(
    data: web::Data<AppState>,
    actor: Actor,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    // A course the caller has already left may be outside their scope.
    if !course::Manager::exists(data.db(), id).await? {
        return Err(ApiError::NotFound);
    }
    course::Manager::unenroll(data.db(), id, actor.user().id).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Successfully unenrolled from course." })))
}
