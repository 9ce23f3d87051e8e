//! In-process stand-in for the certificate backend, served by axum on an
//! ephemeral port. Behaves like the real `/api/v1` surface for the shapes the
//! client reads, with switches to force the failure paths.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::task::JoinHandle;

const CREATED_AT: &str = "2025-03-14T09:26:53.589793";

struct StoredRecord {
    filename: Option<String>,
    bytes: Vec<u8>,
    verified: bool,
    verification_hidden: bool,
}

#[derive(Default)]
struct StubState {
    next_id: i64,
    records: BTreeMap<i64, StoredRecord>,
    uploaded: Vec<String>,
    fail_lists: bool,
    reverify_error: Option<String>,
    reverify_calls: usize,
}

type Shared = Arc<Mutex<StubState>>;

pub struct StubBackend {
    base_url: String,
    state: Shared,
    server: JoinHandle<()>,
}

impl StubBackend {
    pub async fn spawn() -> Self {
        let state: Shared = Arc::new(Mutex::new(StubState::default()));
        let app = Router::new()
            .route("/api/v1/health", get(health))
            .route("/api/v1/certificates", get(list))
            .route("/api/v1/certificates/my-certificates", get(list_mine))
            .route("/api/v1/certificates/upload", post(upload))
            .route("/api/v1/certificates/:id", get(get_record))
            .route("/api/v1/certificates/:id/download", get(download))
            .route("/api/v1/certificates/:id/export", get(export))
            .route("/api/v1/certificates/:id/reverify", post(reverify))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}/api/v1"),
            state,
            server,
        }
    }

    pub fn base_url(&self) -> String {
        self.base_url.clone()
    }

    pub fn uploaded_names(&self) -> Vec<String> {
        self.state.lock().unwrap().uploaded.clone()
    }

    pub fn fail_lists(&self) {
        self.state.lock().unwrap().fail_lists = true;
    }

    /// Makes every following reverify answer `{"success": false, "error": message}`.
    pub fn reject_reverify(&self, message: &str) {
        self.state.lock().unwrap().reverify_error = Some(message.to_string());
    }

    pub fn reverify_count(&self) -> usize {
        self.state.lock().unwrap().reverify_calls
    }

    /// A record whose download carries no filename hint.
    pub fn insert_anonymous_file(&self, bytes: Vec<u8>) -> i64 {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        state.records.insert(
            id,
            StoredRecord {
                filename: None,
                bytes,
                verified: false,
                verification_hidden: false,
            },
        );
        id
    }

    /// Makes `GET /certificates/:id` answer with an empty verification object.
    pub fn hide_verification(&self, id: i64) {
        if let Some(record) = self.state.lock().unwrap().records.get_mut(&id) {
            record.verification_hidden = true;
        }
    }
}

impl Drop for StubBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn tabular_json() -> Value {
    json!({
        "student_name": "Asha Rao Enrollment No: 231B225",
        "enrollment_number": "231B225",
        "degree": "B.Tech",
        "branch": "Computer Science",
        "university_name": "Jaypee University of Engineering and Technology",
        "graduation_date": "-",
        "date_of_birth": "-",
        "grade": "A",
        "certificate_type": "Grade Card",
        "semester": "5",
        "academic_year": "2024-25",
        "sgpa": "8.6",
        "cgpa": "8.1",
        "total_credits": "24",
        "earned_credits": "24",
        "subjects": [
            {"subject_code": "CS301", "subject_name": "Compiler Design", "grade": "A", "credits": "4"},
            {"subject_code": "CS302", "subject_name": "Operating Systems", "grade": "B+", "credits": "4"}
        ]
    })
}

fn verification_json(verified: bool) -> Value {
    if verified {
        json!({
            "student_verified": true,
            "confidence_score": 0.95,
            "message": "Certificate verified against university database",
            "matched_student": {"name": "Asha Rao", "reg_no": "231B225"},
            "verification_attempted": true
        })
    } else {
        json!({
            "student_verified": false,
            "confidence_score": 0.0,
            "message": "Certificate not found in university database",
            "matched_student": null,
            "verification_attempted": true
        })
    }
}

fn simple_status(verified: bool) -> &'static str {
    if verified {
        "verified"
    } else {
        "not_verified"
    }
}

fn record_json(id: i64, record: &StoredRecord) -> Value {
    let verification = if record.verification_hidden {
        json!({})
    } else {
        verification_json(record.verified)
    };
    json!({
        "id": id,
        "status": "processed",
        "created_at": CREATED_AT,
        "original_filename": record.filename,
        "summary": "Semester 5 grade card for Asha Rao",
        "tabular_data": tabular_json(),
        "verification": verification,
        "simple_status": simple_status(record.verified),
        "field_count": 15
    })
}

fn page(state: &StubState, params: &HashMap<String, String>) -> Vec<(i64, Value)> {
    let limit = params
        .get("limit")
        .and_then(|l| l.parse::<usize>().ok())
        .unwrap_or(20)
        .min(100);
    let offset = params
        .get("offset")
        .and_then(|o| o.parse::<usize>().ok())
        .unwrap_or(0);
    state
        .records
        .iter()
        .rev()
        .skip(offset)
        .take(limit)
        .map(|(id, record)| (*id, record_json(*id, record)))
        .collect()
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "University Certificate Verifier API",
        "version": "1.0.0",
        "ai_status": "configured"
    }))
}

async fn list(State(state): State<Shared>, Query(params): Query<HashMap<String, String>>) -> Response {
    let state = state.lock().unwrap();
    if state.fail_lists {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    let certificates: Vec<Value> = page(&state, &params)
        .into_iter()
        .map(|(id, full)| {
            json!({
                "id": id,
                "status": full["status"],
                "created_at": full["created_at"],
                "tabular_data": full["tabular_data"]
            })
        })
        .collect();
    Json(json!({ "certificates": certificates, "count": certificates.len() })).into_response()
}

async fn list_mine(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let state = state.lock().unwrap();
    if state.fail_lists {
        return StatusCode::BAD_GATEWAY.into_response();
    }
    let certificates: Vec<Value> = page(&state, &params)
        .into_iter()
        .map(|(id, full)| {
            json!({
                "id": id,
                "status": full["status"],
                "created_at": full["created_at"],
                "original_filename": full["original_filename"],
                "summary": full["summary"]
            })
        })
        .collect();
    Json(json!({ "certificates": certificates })).into_response()
}

async fn upload(State(state): State<Shared>, mut multipart: Multipart) -> Response {
    let mut file = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().map(str::to_string).unwrap_or_default();
        let bytes = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        file = Some((name, bytes));
    }
    let Some((name, bytes)) = file else {
        return error(StatusCode::BAD_REQUEST, "No file provided");
    };
    if name.is_empty() {
        return error(StatusCode::BAD_REQUEST, "No file selected");
    }

    let mut state = state.lock().unwrap();
    state.next_id += 1;
    let id = state.next_id;
    state.uploaded.push(name.clone());
    state.records.insert(
        id,
        StoredRecord {
            filename: Some(name),
            bytes,
            verified: false,
            verification_hidden: false,
        },
    );

    (
        StatusCode::CREATED,
        Json(json!({
            "id": id,
            "file_type": "image",
            "summary": "Semester 5 grade card for Asha Rao",
            "tabular_data": tabular_json(),
            "verification": verification_json(false),
            "simple_status": simple_status(false),
            "confidence_score": 0.0
        })),
    )
        .into_response()
}

async fn get_record(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let state = state.lock().unwrap();
    match state.records.get(&id) {
        Some(record) => Json(record_json(id, record)).into_response(),
        None => error(StatusCode::NOT_FOUND, "Certificate not found"),
    }
}

async fn download(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let state = state.lock().unwrap();
    let Some(record) = state.records.get(&id) else {
        return error(StatusCode::NOT_FOUND, "Certificate not found");
    };
    let mut builder = axum::http::Response::builder()
        .header(header::CONTENT_TYPE, "application/octet-stream");
    if let Some(name) = &record.filename {
        builder = builder.header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{name}\""),
        );
    }
    builder.body(Body::from(record.bytes.clone())).unwrap()
}

async fn export(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let state = state.lock().unwrap();
    let Some(record) = state.records.get(&id) else {
        return error(StatusCode::NOT_FOUND, "Certificate not found");
    };
    let full = record_json(id, record);
    let mut fields = tabular_json();
    if let Some(map) = fields.as_object_mut() {
        map.remove("subjects");
        map.retain(|_, v| *v != "-");
    }
    Json(json!({
        "certificate_id": id,
        "created_at": full["created_at"],
        "status": full["status"],
        "summary": full["summary"],
        "extracted_fields": fields,
        "verification": full["verification"]
    }))
    .into_response()
}

async fn reverify(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut state = state.lock().unwrap();
    if !state.records.contains_key(&id) {
        return error(StatusCode::NOT_FOUND, "Certificate not found");
    }
    state.reverify_calls += 1;
    if let Some(message) = state.reverify_error.clone() {
        return Json(json!({ "success": false, "error": message })).into_response();
    }
    if let Some(record) = state.records.get_mut(&id) {
        record.verified = true;
    }
    Json(json!({
        "success": true,
        "message": "Certificate re-verified successfully",
        "verification": verification_json(true)
    }))
    .into_response()
}
