use std::sync::Arc;

use tracing::{info, warn};

use crate::client::{CertificateApi, DownloadedFile, ExportDocument};
use crate::models::CertificateRecord;
use crate::projector::{project, RecordView};
use crate::views::{Notice, ViewState};

const REVERIFIED: &str = "Certificate re-verified successfully";

/// Detail screen for one record: load, refresh, re-verify, download, export.
pub struct RecordDetail {
    api: Arc<dyn CertificateApi>,
    id: i64,
    record: Option<CertificateRecord>,
    state: ViewState<RecordView>,
    notice: Option<Notice>,
}

impl RecordDetail {
    pub fn new(api: Arc<dyn CertificateApi>, id: i64) -> Self {
        Self {
            api,
            id,
            record: None,
            state: ViewState::Loading,
            notice: None,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn state(&self) -> &ViewState<RecordView> {
        &self.state
    }

    pub fn view(&self) -> Option<&RecordView> {
        self.state.ready()
    }

    pub fn record(&self) -> Option<&CertificateRecord> {
        self.record.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    fn show(&mut self, record: CertificateRecord) {
        self.state = ViewState::Ready(project(&record));
        self.record = Some(record);
    }

    pub async fn load(&mut self) {
        self.state = ViewState::Loading;
        self.notice = None;
        match self.api.get(self.id).await {
            Ok(record) => self.show(record),
            Err(e) => self.state = ViewState::Failed(e.user_message()),
        }
    }

    /// Re-fetches the record. A failure keeps the current view and raises a notice.
    pub async fn refresh(&mut self) {
        match self.api.get(self.id).await {
            Ok(fresh) => {
                if let Some(current) = &self.record {
                    if !current.status.can_advance_to(fresh.status) {
                        warn!(
                            "Record {} went from {} to {}",
                            self.id,
                            current.status.as_str(),
                            fresh.status.as_str()
                        );
                    }
                }
                self.notice = None;
                self.show(fresh);
            }
            Err(e) if self.record.is_some() => self.notice = Some(Notice::Error(e.user_message())),
            Err(e) => self.state = ViewState::Failed(e.user_message()),
        }
    }

    /// Re-runs the university match. Only the verification panel may change;
    /// on any failure the displayed record stays exactly as it was.
    pub async fn reverify(&mut self) {
        match self.api.reverify(self.id).await {
            Ok(outcome) => {
                let record = match &self.record {
                    Some(current) => current.with_refreshed_verification(&outcome.record),
                    None => outcome.record,
                };
                info!("Record {} verification refreshed", self.id);
                self.show(record);
                self.notice = Some(Notice::Info(
                    outcome.message.unwrap_or_else(|| REVERIFIED.to_string()),
                ));
            }
            Err(e) => self.notice = Some(Notice::Error(e.user_message())),
        }
    }

    pub async fn download(&mut self) -> Option<DownloadedFile> {
        match self.api.download(self.id).await {
            Ok(file) => Some(file),
            Err(e) => {
                self.notice = Some(Notice::Error(e.user_message()));
                None
            }
        }
    }

    pub async fn export(&mut self) -> Option<ExportDocument> {
        match self.api.export(self.id).await {
            Ok(document) => Some(document),
            Err(e) => {
                self.notice = Some(Notice::Error(e.user_message()));
                None
            }
        }
    }
}
