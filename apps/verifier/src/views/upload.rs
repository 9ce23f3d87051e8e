use std::sync::Arc;

use crate::client::{CertificateApi, UploadFile};
use crate::errors::ClientError;
use crate::models::CertificateRecord;
use crate::projector::{project, RecordView};
use crate::views::ViewState;

/// Upload screen: submit one file, render the freshly created record.
pub struct UploadForm {
    api: Arc<dyn CertificateApi>,
    state: ViewState<RecordView>,
    record: Option<CertificateRecord>,
}

impl UploadForm {
    pub fn new(api: Arc<dyn CertificateApi>) -> Self {
        Self {
            api,
            state: ViewState::Idle,
            record: None,
        }
    }

    pub fn state(&self) -> &ViewState<RecordView> {
        &self.state
    }

    pub fn record(&self) -> Option<&CertificateRecord> {
        self.record.as_ref()
    }

    /// `None` is the "submit pressed with nothing picked" case.
    pub async fn submit(&mut self, file: Option<UploadFile>) {
        self.record = None;
        let Some(file) = file else {
            self.state = ViewState::Failed(
                ClientError::Validation("No file selected".to_string()).user_message(),
            );
            return;
        };

        self.state = ViewState::Loading;
        match self.api.upload(&file).await {
            Ok(record) => {
                self.state = ViewState::Ready(project(&record));
                self.record = Some(record);
            }
            Err(e) => self.state = ViewState::Failed(e.user_message()),
        }
    }
}
