use std::path::{Path, PathBuf};

use bytes::Bytes;
use percent_encoding::percent_decode_str;
use serde::Serialize;
use serde_json::Value;

use crate::errors::ClientError;
use crate::models::certificate::scalar_text;
use crate::normalize::{normalize_field, prettify_label};
use crate::projector::FieldRow;

/// Extensions the backend accepts for certificate scans.
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "pdf", "tiff", "bmp", "webp"];

const NO_FILE_SELECTED: &str = "No file selected";

/// A document picked for upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    pub bytes: Bytes,
}

impl UploadFile {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(filename, bytes))
    }

    pub fn extension(&self) -> Option<String> {
        let (_, ext) = self.filename.rsplit_once('.')?;
        (!ext.is_empty()).then(|| ext.to_ascii_lowercase())
    }

    /// Rejects what the backend would reject before any bytes leave the machine.
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.filename.trim().is_empty() || self.bytes.is_empty() {
            return Err(ClientError::Validation(NO_FILE_SELECTED.to_string()));
        }
        match self.extension() {
            Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
            _ => Err(ClientError::Validation(
                "Invalid file type. Allowed: PDF, JPG, JPEG, PNG, TIFF, BMP, WEBP".to_string(),
            )),
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self.extension().as_deref() {
            Some("pdf") => "application/pdf",
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("tiff") => "image/tiff",
            Some("bmp") => "image/bmp",
            Some("webp") => "image/webp",
            Some("png") => "image/png",
            _ => "application/octet-stream",
        }
    }
}

/// Original certificate file as served by the backend.
#[derive(Debug, Clone)]
pub struct DownloadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl DownloadedFile {
    pub(crate) fn from_response_parts(
        id: i64,
        disposition: Option<&str>,
        content_type: Option<&str>,
        bytes: Bytes,
    ) -> Self {
        let filename = disposition
            .and_then(filename_from_disposition)
            .unwrap_or_else(|| format!("certificate_{id}.{}", extension_for(content_type)));
        Self {
            filename,
            content_type: content_type.map(str::to_string),
            bytes,
        }
    }

    /// Writes the file into `dir` under a name that cannot escape it.
    pub async fn save_into(&self, dir: &Path) -> std::io::Result<PathBuf> {
        let path = dir.join(safe_filename(&self.filename));
        tokio::fs::write(&path, &self.bytes).await?;
        Ok(path)
    }
}

/// JSON export of a record for offline use.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportDocument {
    pub id: i64,
    pub document: Value,
}

impl ExportDocument {
    pub fn suggested_filename(&self) -> String {
        format!("certificate_{}_data.json", self.id)
    }

    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.document).unwrap_or_else(|_| self.document.to_string())
    }

    /// Extracted fields as labelled rows, sorted by wire key.
    pub fn fields(&self) -> Vec<FieldRow> {
        let Some(fields) = self.document.get("extracted_fields").and_then(Value::as_object) else {
            return Vec::new();
        };
        fields
            .iter()
            .map(|(key, value)| FieldRow {
                label: prettify_label(key),
                value: normalize_field(key, scalar_text(value).as_deref()),
            })
            .collect()
    }

    pub async fn save_into(&self, dir: &Path) -> std::io::Result<PathBuf> {
        let path = dir.join(self.suggested_filename());
        tokio::fs::write(&path, self.to_pretty_json()).await?;
        Ok(path)
    }
}

/// Filename hint from a `Content-Disposition` header. `filename*` (RFC 5987)
/// wins over plain `filename`.
pub(crate) fn filename_from_disposition(header: &str) -> Option<String> {
    let mut plain = None;
    for param in header.split(';').map(str::trim) {
        let Some((name, value)) = param.split_once('=') else {
            continue;
        };
        let value = value.trim();
        match name.trim().to_ascii_lowercase().as_str() {
            "filename*" => {
                let encoded = value.splitn(3, '\'').nth(2).unwrap_or(value);
                if let Some(decoded) = percent_decode(encoded.trim_matches('"')) {
                    if !decoded.trim().is_empty() {
                        return Some(decoded);
                    }
                }
            }
            "filename" => {
                let unquoted = value.trim_matches('"').trim();
                if !unquoted.is_empty() {
                    plain = Some(unquoted.to_string());
                }
            }
            _ => {}
        }
    }
    plain
}

fn percent_decode(input: &str) -> Option<String> {
    percent_decode_str(input)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}

fn extension_for(content_type: Option<&str>) -> &'static str {
    let mime = content_type
        .and_then(|c| c.split(';').next())
        .map(|m| m.trim().to_ascii_lowercase());
    match mime.as_deref() {
        Some("application/pdf") => "pdf",
        Some("image/jpeg") | Some("image/jpg") => "jpg",
        Some("image/tiff") => "tiff",
        Some("image/bmp") => "bmp",
        Some("image/webp") => "webp",
        _ => "png",
    }
}

fn safe_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim().trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "certificate_download".to_string()
    } else {
        cleaned
    }
}
