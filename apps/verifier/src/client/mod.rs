//! Record Client: the single point of entry for all certificate backend calls.
//!
//! ARCHITECTURAL RULE: No other module may talk to the backend directly.
//! Every response is validated into the strict record model here, and every
//! failure leaves as a `ClientError` whose display text is the user-facing message.
//!
//! No retries: a failed call surfaces once and the caller decides what to do.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, multipart, Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::errors::{self, ClientError, Operation};
use crate::models::certificate::{verification_from_value, RecordListWire, RecordWire};
use crate::models::CertificateRecord;

pub mod files;

pub use files::{DownloadedFile, ExportDocument, UploadFile};

const UNKNOWN_REVERIFY_ERROR: &str = "Unknown error";

/// Optional paging for the list endpoints. The backend caps `limit` at 100.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ListQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

/// Result of an accepted re-verification, with the record re-fetched afterwards.
#[derive(Debug, Clone)]
pub struct Reverified {
    pub message: Option<String>,
    pub record: CertificateRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: Option<String>,
    pub version: Option<String>,
    pub ai_status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReverifyWire {
    #[serde(default)]
    success: bool,
    error: Option<String>,
    message: Option<String>,
    verification: Option<Value>,
}

/// The record operations the screens depend on. `RecordClient` is the HTTP
/// implementation; tests swap in an in-memory one.
#[async_trait]
pub trait CertificateApi: Send + Sync {
    async fn upload(&self, file: &UploadFile) -> Result<CertificateRecord, ClientError>;
    async fn list(&self) -> Result<Vec<CertificateRecord>, ClientError>;
    async fn list_mine(&self) -> Result<Vec<CertificateRecord>, ClientError>;
    async fn get(&self, id: i64) -> Result<CertificateRecord, ClientError>;
    async fn download(&self, id: i64) -> Result<DownloadedFile, ClientError>;
    async fn export(&self, id: i64) -> Result<ExportDocument, ClientError>;
    async fn reverify(&self, id: i64) -> Result<Reverified, ClientError>;
}

#[derive(Clone)]
pub struct RecordClient {
    client: Client,
    base_url: String,
}

impl RecordClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        Self::new(config.api_url.clone(), config.timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends a request and turns transport failures and non-2xx answers into
    /// `ClientError`s carrying the body's `error` text or the operation fallback.
    async fn send(&self, op: Operation, request: RequestBuilder) -> Result<Response, ClientError> {
        let response = request.send().await.map_err(|e| network_error(op, e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!("{op:?} returned {status}: {body}");
        Err(errors::from_status(op, status.as_u16(), &body))
    }

    async fn read_json<T: DeserializeOwned>(
        op: Operation,
        response: Response,
    ) -> Result<T, ClientError> {
        let body = response.text().await.map_err(|e| network_error(op, e))?;
        serde_json::from_str(&body).map_err(|e| {
            warn!("{op:?} returned an unexpected body: {e}");
            ClientError::Decode {
                message: op.fallback_message().to_string(),
                detail: e.to_string(),
            }
        })
    }

    async fn fetch_list(
        &self,
        op: Operation,
        path: &str,
        query: ListQuery,
    ) -> Result<Vec<CertificateRecord>, ClientError> {
        debug!("{op:?} {path} {query:?}");
        let response = self
            .send(op, self.client.get(self.url(path)).query(&query))
            .await?;
        let list: RecordListWire = Self::read_json(op, response).await?;
        Ok(list
            .certificates
            .into_iter()
            .map(CertificateRecord::from)
            .collect())
    }

    pub async fn list_page(&self, query: ListQuery) -> Result<Vec<CertificateRecord>, ClientError> {
        self.fetch_list(Operation::List, "/certificates", query).await
    }

    pub async fn list_mine_page(
        &self,
        query: ListQuery,
    ) -> Result<Vec<CertificateRecord>, ClientError> {
        self.fetch_list(Operation::ListMine, "/certificates/my-certificates", query)
            .await
    }

    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        let op = Operation::Health;
        let response = self.send(op, self.client.get(self.url("/health"))).await?;
        Self::read_json(op, response).await
    }
}

#[async_trait]
impl CertificateApi for RecordClient {
    async fn upload(&self, file: &UploadFile) -> Result<CertificateRecord, ClientError> {
        let op = Operation::Upload;
        file.validate()?;

        let part = multipart::Part::bytes(file.bytes.to_vec())
            .file_name(file.filename.clone())
            .mime_str(file.mime_type())
            .map_err(|e| ClientError::Validation(format!("Unusable file type: {e}")))?;
        let form = multipart::Form::new().part("file", part);

        info!("Uploading {} ({} bytes)", file.filename, file.bytes.len());
        let response = self
            .send(
                op,
                self.client
                    .post(self.url("/certificates/upload"))
                    .multipart(form),
            )
            .await?;
        let record: RecordWire = Self::read_json(op, response).await?;
        let record = CertificateRecord::from(record);
        info!(
            "Upload created record {} with status {}",
            record.id,
            record.status.as_str()
        );
        Ok(record)
    }

    async fn list(&self) -> Result<Vec<CertificateRecord>, ClientError> {
        self.list_page(ListQuery::default()).await
    }

    async fn list_mine(&self) -> Result<Vec<CertificateRecord>, ClientError> {
        self.list_mine_page(ListQuery::default()).await
    }

    async fn get(&self, id: i64) -> Result<CertificateRecord, ClientError> {
        let op = Operation::Get;
        let response = self
            .send(op, self.client.get(self.url(&format!("/certificates/{id}"))))
            .await?;
        let record: RecordWire = Self::read_json(op, response).await?;
        Ok(record.into())
    }

    async fn download(&self, id: i64) -> Result<DownloadedFile, ClientError> {
        let op = Operation::Download;
        let response = self
            .send(
                op,
                self.client
                    .get(self.url(&format!("/certificates/{id}/download"))),
            )
            .await?;

        let header_text = |name: header::HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let disposition = header_text(header::CONTENT_DISPOSITION);
        let content_type = header_text(header::CONTENT_TYPE);

        let bytes = response.bytes().await.map_err(|e| network_error(op, e))?;
        let file = DownloadedFile::from_response_parts(
            id,
            disposition.as_deref(),
            content_type.as_deref(),
            bytes,
        );
        debug!("Downloaded {} ({} bytes)", file.filename, file.bytes.len());
        Ok(file)
    }

    async fn export(&self, id: i64) -> Result<ExportDocument, ClientError> {
        let op = Operation::Export;
        let response = self
            .send(
                op,
                self.client
                    .get(self.url(&format!("/certificates/{id}/export"))),
            )
            .await?;
        let document: Value = Self::read_json(op, response).await?;
        Ok(ExportDocument { id, document })
    }

    /// Asks the backend to re-match the record against live university data,
    /// then re-fetches it. A `success: false` answer is a `ReverifyRejected`
    /// carrying the backend's error text unchanged.
    async fn reverify(&self, id: i64) -> Result<Reverified, ClientError> {
        let op = Operation::Reverify;
        let response = self
            .send(
                op,
                self.client
                    .post(self.url(&format!("/certificates/{id}/reverify"))),
            )
            .await?;
        let outcome: ReverifyWire = Self::read_json(op, response).await?;

        if !outcome.success {
            let message = outcome
                .error
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_REVERIFY_ERROR.to_string());
            warn!("Re-verification of record {id} rejected: {message}");
            return Err(ClientError::ReverifyRejected(message));
        }

        info!("Record {id} re-verified, refreshing");
        let mut record = self.get(id).await?;
        if record.verification.is_none() {
            // record not rewritten yet; fall back to the reverify answer
            record.verification = outcome.verification.as_ref().and_then(verification_from_value);
        }
        Ok(Reverified {
            message: outcome.message,
            record,
        })
    }
}

fn network_error(op: Operation, source: reqwest::Error) -> ClientError {
    warn!("{op:?} request failed: {source}");
    ClientError::Network {
        message: op.fallback_message().to_string(),
        source,
    }
}
