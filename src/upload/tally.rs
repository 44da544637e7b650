use crate::transport::{TransportError, UploadReceipt};
use serde::Serialize;

/// Outcome classes counted per batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UploadStatus {
    Success,
    /// Reserved: the transport does not report a distinct not-found outcome today
    NotFound,
    ServerError,
}

impl UploadStatus {
    pub const ALL: [UploadStatus; 3] = [
        UploadStatus::Success,
        UploadStatus::NotFound,
        UploadStatus::ServerError,
    ];

    pub fn classify(result: &Result<UploadReceipt, TransportError>) -> Self {
        match result {
            Ok(_) => UploadStatus::Success,
            Err(_) => UploadStatus::ServerError,
        }
    }

    pub fn http_code(&self) -> u16 {
        match self {
            UploadStatus::Success => 200,
            UploadStatus::NotFound => 404,
            UploadStatus::ServerError => 500,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            UploadStatus::Success => "successfully uploaded and transcribed",
            UploadStatus::NotFound => "failed to upload",
            UploadStatus::ServerError => "encountered server errors, please try again",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct UploadTally {
    pub success: usize,
    pub not_found: usize,
    pub server_error: usize,
}

impl UploadTally {
    pub fn record(&mut self, status: UploadStatus) {
        *self.slot(status) += 1;
    }

    pub fn count(&self, status: UploadStatus) -> usize {
        match status {
            UploadStatus::Success => self.success,
            UploadStatus::NotFound => self.not_found,
            UploadStatus::ServerError => self.server_error,
        }
    }

    pub fn total(&self) -> usize {
        self.success + self.not_found + self.server_error
    }

    pub fn failures(&self) -> usize {
        self.total() - self.success
    }

    /// One line per non-empty class, in success / not-found / server-error order
    pub fn messages(&self) -> Vec<String> {
        UploadStatus::ALL
            .iter()
            .filter(|status| self.count(**status) > 0)
            .map(|status| format!("{} audio file(s) {}.", self.count(*status), status.message()))
            .collect()
    }

    fn slot(&mut self, status: UploadStatus) -> &mut usize {
        match status {
            UploadStatus::Success => &mut self.success,
            UploadStatus::NotFound => &mut self.not_found,
            UploadStatus::ServerError => &mut self.server_error,
        }
    }
}

impl FromIterator<UploadStatus> for UploadTally {
    fn from_iter<I: IntoIterator<Item = UploadStatus>>(iter: I) -> Self {
        let mut tally = UploadTally::default();
        for status in iter {
            tally.record(status);
        }
        tally
    }
}
