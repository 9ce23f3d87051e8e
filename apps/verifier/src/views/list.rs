use std::sync::Arc;

use crate::client::CertificateApi;
use crate::projector::{project_row, RecordRow};
use crate::views::ViewState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    /// Every record the backend holds.
    All,
    /// Records uploaded by the caller.
    Mine,
}

impl ListScope {
    pub fn empty_message(self) -> &'static str {
        match self {
            ListScope::All => "No records found",
            ListScope::Mine => "No certificates found",
        }
    }
}

/// Listing screen. Rows keep the order the backend sent; nothing here relies on it.
pub struct RecordList {
    api: Arc<dyn CertificateApi>,
    scope: ListScope,
    state: ViewState<Vec<RecordRow>>,
}

impl RecordList {
    pub fn new(api: Arc<dyn CertificateApi>, scope: ListScope) -> Self {
        Self {
            api,
            scope,
            state: ViewState::Loading,
        }
    }

    pub fn scope(&self) -> ListScope {
        self.scope
    }

    pub fn state(&self) -> &ViewState<Vec<RecordRow>> {
        &self.state
    }

    pub async fn load(&mut self) {
        self.state = ViewState::Loading;
        let result = match self.scope {
            ListScope::All => self.api.list().await,
            ListScope::Mine => self.api.list_mine().await,
        };
        self.state = match result {
            Ok(records) => ViewState::Ready(records.iter().map(project_row).collect()),
            Err(e) => ViewState::Failed(e.user_message()),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::client::{RecordClient, UploadFile};
    use crate::testing::StubBackend;

    fn api(stub: &StubBackend) -> Arc<dyn CertificateApi> {
        Arc::new(RecordClient::new(stub.base_url(), Duration::from_secs(5)).unwrap())
    }

    #[tokio::test]
    async fn test_empty_listing() {
        let stub = StubBackend::spawn().await;
        let mut list = RecordList::new(api(&stub), ListScope::All);
        list.load().await;
        assert!(list.state().ready().unwrap().is_empty());
        assert_eq!(list.scope().empty_message(), "No records found");
    }

    #[tokio::test]
    async fn test_mine_rows_carry_filename_and_summary() {
        let stub = StubBackend::spawn().await;
        let api = api(&stub);
        api.upload(&UploadFile::new("sem5.pdf", b"pdf".to_vec()))
            .await
            .unwrap();

        let mut list = RecordList::new(api, ListScope::Mine);
        list.load().await;
        let rows = list.state().ready().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].filename, "sem5.pdf");
        assert_eq!(rows[0].status_label, "PROCESSED");
        assert_eq!(rows[0].summary, "Semester 5 grade card for Asha Rao");
        assert_eq!(rows[0].created, "2025-03-14 09:26:53 UTC");
    }

    #[tokio::test]
    async fn test_all_rows_fall_back_to_generated_filename() {
        let stub = StubBackend::spawn().await;
        let api = api(&stub);
        let record = api
            .upload(&UploadFile::new("sem5.pdf", b"pdf".to_vec()))
            .await
            .unwrap();

        let mut list = RecordList::new(api, ListScope::All);
        list.load().await;
        let rows = list.state().ready().unwrap();
        assert_eq!(rows[0].filename, format!("certificate_{}.png", record.id));
        assert_eq!(rows[0].summary, "No summary available");
        assert_eq!(rows[0].student_name, "Asha Rao (Enrollment No: 231B225)");
        assert_eq!(rows[0].degree, "B.Tech");
        assert_eq!(rows[0].branch, "Computer Science");
        assert_eq!(
            rows[0].university,
            "Jaypee University of Engineering and Technology"
        );
        assert_eq!(rows[0].enrollment_number, "231B225");
        assert_eq!(rows[0].sgpa, "8.6");
        assert_eq!(rows[0].cgpa, "8.1");
        assert_eq!(rows[0].semester, "5");
        assert_eq!(rows[0].academic_year, "2024-25");
    }

    #[tokio::test]
    async fn test_failure_is_explicit() {
        let stub = StubBackend::spawn().await;
        stub.fail_lists();
        let mut list = RecordList::new(api(&stub), ListScope::Mine);
        list.load().await;
        assert_eq!(list.state().error(), Some("Failed to load certificates"));
    }
}
