#![allow(dead_code)]
use std::path::Path;
use std::sync::{Arc, Mutex};

use actix_http::body::MessageBody;
use actix_http::Request;
use actix_service::Service;
use actix_web::{dev::ServiceResponse, test, Error};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};
use tempfile::TempDir;

use eduvoice::config::Config;
use eduvoice::db;
use eduvoice::db::models::conversion_job::NewConversionJob;
use eduvoice::db::models::document::FileType;
use eduvoice::db::models::user::{self, NewUser, Role, User};
use eduvoice::server::api::state::App as AppState;
use eduvoice::server::app::init_app;
use eduvoice::services::extract::{FileExtractor, TextExtractor};
use eduvoice::services::gemini::Generator;
use eduvoice::services::queue::JobQueue;

/// Documents per page in test listings, kept small to exercise pagination.
pub const PAGE_SIZE: u64 = 2;

/// Returns the same text for every file.
pub struct StaticExtractor(pub String);

impl TextExtractor for StaticExtractor {
    fn extract(&self, _path: &Path, _file_type: FileType) -> anyhow::Result<String> {
        Ok(self.0.clone())
    }
}

/// Fails on every file.
pub struct FailingExtractor;

impl TextExtractor for FailingExtractor {
    fn extract(&self, _path: &Path, _file_type: FileType) -> anyhow::Result<String> {
        Err(anyhow::anyhow!("corrupt file"))
    }
}

/// Panics on every file.
pub struct PanickingExtractor;

impl TextExtractor for PanickingExtractor {
    fn extract(&self, _path: &Path, _file_type: FileType) -> anyhow::Result<String> {
        panic!("extractor blew up")
    }
}

/// Records every job and hands out sequential ids.
#[derive(Default)]
pub struct RecordingQueue {
    pub jobs: Mutex<Vec<NewConversionJob>>,
}

impl RecordingQueue {
    pub fn jobs(&self) -> Vec<NewConversionJob> {
        self.jobs.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobQueue for RecordingQueue {
    async fn enqueue(&self, job: NewConversionJob) -> anyhow::Result<String> {
        let mut jobs = self.jobs.lock().unwrap();
        jobs.push(job);
        Ok(format!("job-{}", jobs.len()))
    }
}

/// Records prompts and answers with a canned reply.
pub struct RecordingGenerator {
    pub prompts: Mutex<Vec<String>>,
    pub reply: Result<String, String>,
}

impl RecordingGenerator {
    pub fn replying(reply: Result<&str, &str>) -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            reply: reply.map(str::to_owned).map_err(str::to_owned),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for RecordingGenerator {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_owned());
        self.reply.clone().map_err(|err| anyhow::anyhow!(err))
    }
}

/// A running app on a temporary database and media root.
pub struct TestEnv {
    /// Keeps the temporary directory alive.
    pub dir: TempDir,
    pub state: AppState,
    pub queue: Arc<RecordingQueue>,
}

pub struct Builder {
    extractor: Arc<dyn TextExtractor>,
    generator: Option<Arc<dyn Generator>>,
    auto_convert: bool,
    max_upload_bytes: u64,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            extractor: Arc::new(FileExtractor),
            generator: None,
            auto_convert: false,
            max_upload_bytes: Config::default().max_upload_bytes,
        }
    }
}

impl Builder {
    pub fn extractor(mut self, extractor: impl TextExtractor + 'static) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    pub fn generator(mut self, generator: Arc<RecordingGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn auto_convert(mut self, auto_convert: bool) -> Self {
        self.auto_convert = auto_convert;
        self
    }

    pub fn max_upload_bytes(mut self, max_upload_bytes: u64) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    pub async fn build(self) -> TestEnv {
        let dir = tempfile::tempdir().unwrap();
        let database_url = format!(
            "sqlite://{}?mode=rwc",
            dir.path().join("eduvoice.sqlite3").display()
        );
        let conn = db::init::connect(&database_url).await.unwrap();
        let config = Config {
            database_url,
            media_root: dir.path().join("media"),
            page_size: PAGE_SIZE,
            auto_convert: self.auto_convert,
            max_upload_bytes: self.max_upload_bytes,
            ..Config::default()
        };
        std::fs::create_dir_all(config.documents_dir()).unwrap();
        let queue = Arc::new(RecordingQueue::default());
        let state = AppState {
            db: conn,
            config: Arc::new(config),
            extractor: self.extractor,
            queue: Arc::clone(&queue) as Arc<dyn JobQueue>,
            generator: self.generator,
        };
        TestEnv { dir, state, queue }
    }
}

pub fn builder() -> Builder {
    Builder::default()
}

/// Default environment: real extractor, no generator, no auto conversion.
pub async fn setup() -> TestEnv {
    builder().build().await
}

impl TestEnv {
    pub async fn app(
        &self,
    ) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error> {
        test::init_service(init_app(&self.state)).await
    }

    /// Create a user whose token is `<username>-token`.
    pub async fn user(&self, username: &str, role: Role) -> User {
        let new_user = NewUser {
            username: username.to_owned(),
            role,
            token: token_of(username),
        };
        user::Manager::create(&self.state.db, &new_user).await.unwrap()
    }
}

pub fn token_of(username: &str) -> String {
    format!("{username}-token")
}

pub fn auth(user: &User) -> (&'static str, String) {
    ("Authorization", format!("Token {}", user.token))
}

/// JSON body of an upload of `content` as `file_name`.
pub fn upload_body(title: &str, file_name: &str, content: &[u8], extra: Value) -> Value {
    let mut body = json!({
        "title": title,
        "file_name": file_name,
        "file_content": STANDARD.encode(content),
    });
    if let (Some(body), Value::Object(extra)) = (body.as_object_mut(), extra) {
        body.extend(extra);
    }
    body
}

/// Call `app` and return the status with the parsed JSON body, `Null` when empty.
pub async fn send<S, B>(app: &S, req: Request) -> (actix_web::http::StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let bytes = test::read_body(resp).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

/// Create a course through the API and return its id.
pub async fn create_course<S, B>(app: &S, owner: &User, code: &str, is_active: bool) -> i64
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/courses")
        .insert_header(auth(owner))
        .set_json(json!({"name": format!("Course {code}"), "code": code, "is_active": is_active}))
        .to_request();
    let (status, body) = send(app, req).await;
    assert_eq!(status, actix_web::http::StatusCode::CREATED, "{body}");
    body["id"].as_i64().unwrap()
}

/// Upload a document through the API and return its detail representation.
pub async fn upload<S, B>(app: &S, uploader: &User, body: Value) -> Value
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/documents/")
        .insert_header(auth(uploader))
        .set_json(body)
        .to_request();
    let (status, body) = send(app, req).await;
    assert_eq!(status, actix_web::http::StatusCode::CREATED, "{body}");
    body
}
