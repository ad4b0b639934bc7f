//! Handlers for documents and the actions run on them.
#![allow(
    clippy::unused_async,
    reason = "Unused asyncs are the norm in Actix route definition files"
)]
use std::path::PathBuf;

use actix_web::{web, HttpRequest, HttpResponse};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::json;

use super::auth::Actor;
use super::pagination::{paginate, PageWindow};
use super::state::{App as AppState, Global as _};
use crate::access::{self, DocumentScope};
use crate::db::filters::{parse_ordering, search_terms, OrderField};
use crate::db::models::course;
use crate::db::models::document::{
    self, Document, DocumentChanges, DocumentQuery, FileType, NewDocument,
};
use crate::server::errors::ApiError;
use crate::services::gemini::{build_prompt, ReadMode};
use crate::services::queue::ConversionOptions;
use crate::utils::paths::{stored_file_name, write_new_file};

/// Module that maps the HTTP web request body to structs.
pub mod request;
/// Module that maps documents to HTTP response bodies.
pub mod response;

use response::{DocumentSummary, ReadResponse};

/// Default ordering of document listings.
const DEFAULT_ORDERING: OrderField = OrderField {
    column: "d.upload_date",
    descending: true,
};

/// Precondition shared by `convert` and `gemini_read`.
const NO_TEXT_MESSAGE: &str = "Document text has not been extracted yet.";

/// Document `id` if visible in `scope`, otherwise 404.
async fn visible_document(
    data: &AppState,
    scope: &DocumentScope,
    id: i64,
) -> Result<Document, ApiError> {
    document::Manager::find_visible_by_id(data.db(), scope, id)
        .await?
        .ok_or(ApiError::NotFound)
}

/// Reject course ids that do not exist.
async fn check_course(data: &AppState, course_id: Option<i64>) -> Result<(), ApiError> {
    match course_id {
        Some(id) if !course::Manager::exists(data.db(), id).await? => Err(ApiError::Validation(
            format!("Invalid course '{id}': object does not exist."),
        )),
        _ => Ok(()),
    }
}

/// Remove a stored upload. Failures are logged.
async fn discard_file(path: PathBuf) {
    let shown = path.display().to_string();
    match web::block(move || std::fs::remove_file(path)).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => tracing::warn!(file = %shown, "Unable to remove file: {err}"),
        Err(err) => tracing::warn!(file = %shown, "File removal aborted: {err}"),
    }
}

/// Parse an optional JSON body; an empty body yields the defaults.
fn parse_optional_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|err| ApiError::Validation(format!("Invalid request body: {err}")))
}

/// One page of `query` within `scope`, wrapped in the pagination envelope.
async fn page_of(
    req: &HttpRequest,
    data: &AppState,
    scope: &DocumentScope,
    query: &DocumentQuery,
    page: Option<u64>,
) -> Result<HttpResponse, ApiError> {
    let window = PageWindow::new(page, data.config().page_size)?;
    let (count, documents) =
        document::Manager::find_visible(data.db(), scope, query, window.limit, window.offset)
            .await?;
    let results: Vec<DocumentSummary> = documents.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(paginate(req, window, count, results)?))
}

/// List the documents visible to the caller.
#[tracing::instrument(name = "Listing documents", skip(req, data, actor))]
pub async fn list(
    req: HttpRequest,
    data: web::Data<AppState>,
    actor: Actor,
    query: web::Query<request::DocumentListQuery>,
) -> Result<HttpResponse, ApiError> {
    let scope = access::document_scope(actor.user());
    let query = query.into_inner();
    let document_query = DocumentQuery {
        file_type: query.file_type,
        status: query.status,
        course_id: query.course,
        subject: query.subject,
        uploaded_by: None,
        search: search_terms(query.search.as_deref()),
        ordering: parse_ordering(
            query.ordering.as_deref(),
            document::ORDERING_FIELDS,
            DEFAULT_ORDERING,
        ),
    };
    page_of(&req, &data, &scope, &document_query, query.page).await
}

/// List the caller's own uploads.
#[tracing::instrument(name = "Listing own documents", skip(req, data, actor))]
pub async fn my_documents(
    req: HttpRequest,
    data: web::Data<AppState>,
    actor: Actor,
    query: web::Query<request::PageQuery>,
) -> Result<HttpResponse, ApiError> {
    let user = actor.user();
    let scope = access::document_scope(user);
    let document_query = DocumentQuery {
        uploaded_by: Some(user.id),
        ordering: vec![DEFAULT_ORDERING],
        ..DocumentQuery::default()
    };
    page_of(&req, &data, &scope, &document_query, query.page).await
}

/// Store an upload, extract its text and return it.
#[tracing::instrument(name = "Uploading document", skip(data, actor, body))]
pub async fn create(
    data: web::Data<AppState>,
    actor: Actor,
    body: web::Json<request::DocumentUpload>,
) -> Result<HttpResponse, ApiError> {
    let user = actor.user();
    let upload = body.into_inner();
    let title = upload
        .title
        .map(|title| title.trim().to_owned())
        .filter(|title| !title.is_empty())
        .ok_or_else(|| ApiError::Validation("'title' is required and may not be blank.".into()))?;
    let file_type = FileType::from_file_name(&upload.file_name).ok_or_else(|| {
        ApiError::Validation(format!(
            "Unsupported file type for '{}'. Upload a pdf, txt, md or html file.",
            upload.file_name
        ))
    })?;
    let bytes = STANDARD
        .decode(upload.file_content.trim())
        .map_err(|err| ApiError::Validation(format!("'file_content' is not valid base64: {err}")))?;
    if bytes.is_empty() {
        return Err(ApiError::Validation("The submitted file is empty.".into()));
    }
    let max_upload = data.config().max_upload_bytes;
    if u64::try_from(bytes.len()).map_or(true, |len| len > max_upload) {
        return Err(ApiError::Validation(format!(
            "The submitted file is larger than {max_upload} bytes."
        )));
    }
    check_course(&data, upload.course).await?;

    let file = stored_file_name(&upload.file_name, Utc::now());
    let file_size = i64::try_from(bytes.len()).map_err(|err| anyhow::anyhow!(err))?;
    let target = data.config().media_root.join(&file);
    let written = target.clone();
    web::block(move || write_new_file(&written, &bytes))
        .await
        .map_err(|err| anyhow::anyhow!("file write aborted: {err}"))?
        .map_err(anyhow::Error::from)?;

    let new_document = NewDocument {
        title,
        description: upload.description,
        file,
        file_type,
        subject: upload.subject,
        is_public: upload.is_public,
        course_id: upload.course,
        uploaded_by: user.id,
        file_size,
    };
    let stored = match document::Manager::create(data.db(), &new_document).await {
        Ok(stored) => stored,
        Err(err) => {
            discard_file(target).await;
            return Err(err.into());
        }
    };
    tracing::info!(document_id = stored.id, "Document stored");
    let processed = data.pipeline().process(stored).await?;
    Ok(HttpResponse::Created().json(processed))
}

/// Retrieve one visible document, including its extracted text.
#[tracing::instrument(name = "Retrieving document", skip(data, actor))]
pub async fn retrieve(
    data: web::Data<AppState>,
    actor: Actor,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let scope = access::document_scope(actor.user());
    let found = visible_document(&data, &scope, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(found))
}

/// Shared body of `PUT` (`partial = false`) and `PATCH`.
async fn apply_update(
    data: &AppState,
    actor: &Actor,
    id: i64,
    body: request::DocumentMetadata,
    partial: bool,
) -> Result<HttpResponse, ApiError> {
    let user = actor.user();
    let existing = visible_document(data, &access::document_scope(user), id).await?;
    if !access::can_modify_document(user, &existing) {
        return Err(ApiError::Forbidden);
    }
    let title = match body.title.map(|title| title.trim().to_owned()) {
        Some(title) if title.is_empty() => {
            return Err(ApiError::Validation("'title' may not be blank.".into()))
        }
        None if !partial => {
            return Err(ApiError::Validation("'title' is required.".into()))
        }
        title => title,
    };
    check_course(data, body.course.flatten()).await?;
    let changes = DocumentChanges {
        title,
        description: body.description,
        subject: body.subject,
        course_id: body.course,
        is_public: body.is_public,
    };
    let updated = document::Manager::update(data.db(), id, &changes).await?;
    Ok(HttpResponse::Ok().json(updated))
}

/// Replace a document's metadata. Uploader, teachers and admins only.
#[tracing::instrument(name = "Updating document", skip(data, actor, body))]
pub async fn update(
    data: web::Data<AppState>,
    actor: Actor,
    path: web::Path<i64>,
    body: web::Json<request::DocumentMetadata>,
) -> Result<HttpResponse, ApiError> {
    apply_update(&data, &actor, path.into_inner(), body.into_inner(), false).await
}

/// Change some of a document's metadata. Uploader, teachers and admins only.
#[tracing::instrument(name = "Patching document", skip(data, actor, body))]
pub async fn partial_update(
    data: web::Data<AppState>,
    actor: Actor,
    path: web::Path<i64>,
    body: web::Json<request::DocumentMetadata>,
) -> Result<HttpResponse, ApiError> {
    apply_update(&data, &actor, path.into_inner(), body.into_inner(), true).await
}

/// Delete a document and, best-effort, its stored file.
#[tracing::instrument(name = "Deleting document", skip(data, actor))]
pub async fn destroy(
    data: web::Data<AppState>,
    actor: Actor,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let user = actor.user();
    let existing = visible_document(&data, &access::document_scope(user), path.into_inner()).await?;
    if !access::can_modify_document(user, &existing) {
        return Err(ApiError::Forbidden);
    }
    document::Manager::delete(data.db(), existing.id).await?;
    discard_file(data.config().media_root.join(&existing.file)).await;
    tracing::info!(document_id = existing.id, "Document deleted");
    Ok(HttpResponse::NoContent().finish())
}

/// Queue a text-to-speech conversion of a document.
#[tracing::instrument(name = "Converting document", skip(data, actor, body))]
pub async fn convert(
    data: web::Data<AppState>,
    actor: Actor,
    path: web::Path<i64>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let user = actor.user();
    let found = visible_document(&data, &access::document_scope(user), path.into_inner()).await?;
    if !found.has_text() {
        return Err(ApiError::Validation(NO_TEXT_MESSAGE.into()));
    }
    let options: ConversionOptions = parse_optional_body(&body)?;
    let job = options.resolve(user, found.id);
    let task_id = data.queue().enqueue(job).await.map_err(|err| {
        tracing::error!(document_id = found.id, "Unable to queue conversion: {err:#}");
        ApiError::Upstream(format!("Failed to start audio conversion: {err}"))
    })?;
    Ok(HttpResponse::Accepted().json(json!({
        "message": "Audio conversion started.",
        "task_id": task_id,
    })))
}

/// Have the generative model summarize, explain, list or quiz a document.
#[tracing::instrument(name = "Reading document with Gemini", skip(data, actor, body))]
pub async fn gemini_read(
    data: web::Data<AppState>,
    actor: Actor,
    path: web::Path<i64>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let scope = access::document_scope(actor.user());
    let found = visible_document(&data, &scope, path.into_inner()).await?;
    let request: request::ReadRequest = parse_optional_body(&body)?;
    let text = match found.extracted_text.as_deref() {
        Some(text) if !text.trim().is_empty() => text,
        _ => return Err(ApiError::Validation(NO_TEXT_MESSAGE.into())),
    };
    let generator = data.generator().ok_or_else(|| {
        ApiError::ServiceUnavailable("Gemini is not configured on the server.".into())
    })?;

    let mode = ReadMode::parse(request.mode.as_deref());
    let language = request.language.as_deref().unwrap_or("en");
    let prompt = build_prompt(mode, text, language);
    let content = match generator.generate(&prompt).await {
        Ok(content) if !content.trim().is_empty() => content,
        Ok(_) => {
            return Err(ApiError::Upstream(
                "Failed to read document with Gemini: the model returned no text".into(),
            ))
        }
        Err(err) => {
            tracing::error!(document_id = found.id, "Gemini read failed: {err:#}");
            return Err(ApiError::Upstream(format!(
                "Failed to read document with Gemini: {err}"
            )));
        }
    };
    Ok(HttpResponse::Ok().json(ReadResponse {
        document_id: found.id,
        document_title: found.title,
        mode,
        content,
        status: "success",
    }))
}
