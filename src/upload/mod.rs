// src/upload/mod.rs
// Upload Coordinator - concurrent batch upload with per-outcome tally

mod tally;

pub use tally::{UploadStatus, UploadTally};

use crate::events::{EventBus, WorkspaceEvent};
use crate::inflight::{self, InFlight};
use crate::lock::lock;
use crate::transport::{AudioFile, RecordTransport, TransportError, UploadReceipt};
use chrono::Utc;
use futures_util::future::join_all;
use serde::Serialize;
use std::sync::atomic::AtomicUsize;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("No files selected")]
    NoFilesSelected,
}

/// Settlement of one file within a batch
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub file_name: String,
    pub status: UploadStatus,
    pub transcript: Option<String>,
    pub error: Option<String>,
}

impl FileOutcome {
    fn settle(file: &AudioFile, result: Result<UploadReceipt, TransportError>) -> Self {
        let status = UploadStatus::classify(&result);
        match result {
            Ok(receipt) => Self {
                file_name: file.file_name.clone(),
                status,
                transcript: receipt.transcript,
                error: None,
            },
            Err(e) => Self {
                file_name: file.file_name.clone(),
                status,
                transcript: None,
                error: Some(e.describe("Upload")),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub batch_id: String,
    pub tally: UploadTally,
    pub outcomes: Vec<FileOutcome>,
    pub completed_at: String,
}

impl BatchReport {
    pub fn messages(&self) -> Vec<String> {
        self.tally.messages()
    }
}

pub struct UploadCoordinator {
    transport: Arc<dyn RecordTransport>,
    bus: EventBus,
    selection: Mutex<Vec<AudioFile>>,
    last_report: Mutex<Option<BatchReport>>,
    in_flight: AtomicUsize,
}

impl UploadCoordinator {
    pub fn new(transport: Arc<dyn RecordTransport>, bus: EventBus) -> Self {
        Self {
            transport,
            bus,
            selection: Mutex::new(Vec::new()),
            last_report: Mutex::new(None),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Replace the pending selection. Any previous batch report is discarded.
    pub fn select_files(&self, files: Vec<AudioFile>) {
        *lock(&self.selection) = files;
        *lock(&self.last_report) = None;
    }

    pub fn selected_count(&self) -> usize {
        lock(&self.selection).len()
    }

    pub fn is_uploading(&self) -> bool {
        inflight::is_busy(&self.in_flight)
    }

    /// Upload is only offered with a selection and nothing in flight
    pub fn can_upload(&self) -> bool {
        self.selected_count() > 0 && !self.is_uploading()
    }

    pub fn last_report(&self) -> Option<BatchReport> {
        lock(&self.last_report).clone()
    }

    pub fn status_messages(&self) -> Vec<String> {
        self.last_report()
            .map(|report| report.messages())
            .unwrap_or_default()
    }

    /// Upload the current selection as one batch. The selection is consumed.
    pub async fn upload_selected(&self) -> Result<BatchReport, UploadError> {
        let files = std::mem::take(&mut *lock(&self.selection));

        self.upload_batch(files).await
    }

    /// Submit every file concurrently and wait for all of them to settle.
    ///
    /// Per-file failures are folded into the tally and never abort siblings.
    /// Exactly one [`WorkspaceEvent::RecordInserted`] is emitted, after the
    /// last upload settles, whatever the individual outcomes were.
    pub async fn upload_batch(&self, files: Vec<AudioFile>) -> Result<BatchReport, UploadError> {
        if files.is_empty() {
            return Err(UploadError::NoFilesSelected);
        }

        let _busy = InFlight::enter(&self.in_flight);
        *lock(&self.last_report) = None;

        let batch_id = Uuid::new_v4().to_string();
        tracing::info!("Upload batch {} started: {} file(s)", batch_id, files.len());

        let uploads = files.iter().map(|file| async move {
            let result = self.transport.upload(file).await;
            if let Err(e) = &result {
                tracing::warn!("Upload of {} failed: {}", file.file_name, e);
            }
            FileOutcome::settle(file, result)
        });
        let outcomes = join_all(uploads).await;

        let tally: UploadTally = outcomes.iter().map(|o| o.status).collect();
        let report = BatchReport {
            batch_id,
            tally,
            outcomes,
            completed_at: Utc::now().to_rfc3339(),
        };

        tracing::info!(
            "Upload batch {} settled: success={}, not_found={}, server_error={}",
            report.batch_id,
            tally.success,
            tally.not_found,
            tally.server_error
        );

        *lock(&self.last_report) = Some(report.clone());
        self.bus.emit(WorkspaceEvent::RecordInserted);

        Ok(report)
    }
}
