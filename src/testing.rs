//! Scripted in-memory transport for controller tests.

use crate::transport::{AudioFile, Record, RecordSet, RecordTransport, TransportError, UploadReceipt};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Barrier;

pub(crate) fn record(id: i64, file_name: &str, transcription: &str) -> Record {
    Record {
        id: id.into(),
        file_name: file_name.to_string(),
        transcription: transcription.to_string(),
        created_at: "2024-11-14 18:05:41".to_string(),
        duration: "00:30".into(),
        channel: 1.into(),
        sample_rate: 48000.into(),
        audio_format: Some("mp3".to_string()),
    }
}

pub(crate) fn record_set(records: Vec<Record>) -> RecordSet {
    RecordSet {
        record: records.len() as u64,
        data: records,
    }
}

pub(crate) fn server_error(message: &str) -> TransportError {
    TransportError::Status {
        status: 500,
        message: message.to_string(),
    }
}

pub(crate) fn audio(name: &str) -> AudioFile {
    AudioFile::from_bytes(name, vec![0u8; 8])
}

#[derive(Default)]
pub(crate) struct ScriptedTransport {
    listings: Mutex<VecDeque<Result<RecordSet, TransportError>>>,
    default_listing: Mutex<Option<Result<RecordSet, TransportError>>>,
    searches: Mutex<HashMap<String, (Duration, Result<RecordSet, TransportError>)>>,
    upload_failures: HashMap<String, TransportError>,
    upload_delays: HashMap<String, Duration>,
    upload_barrier: Option<Arc<Barrier>>,
    keywords: Mutex<Vec<String>>,
    list_calls: AtomicUsize,
    upload_calls: AtomicUsize,
    settled_uploads: Arc<AtomicUsize>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Every upload waits until `parties` uploads are in flight at once
    pub(crate) fn with_upload_barrier(mut self, parties: usize) -> Self {
        self.upload_barrier = Some(Arc::new(Barrier::new(parties)));
        self
    }

    pub(crate) fn failing_upload(mut self, file_name: &str, error: TransportError) -> Self {
        self.upload_failures.insert(file_name.to_string(), error);
        self
    }

    pub(crate) fn slow_upload(mut self, file_name: &str, delay: Duration) -> Self {
        self.upload_delays.insert(file_name.to_string(), delay);
        self
    }

    /// Queue a one-shot listing response, consumed before the default one
    pub(crate) fn push_listing(&self, result: Result<RecordSet, TransportError>) {
        self.listings.lock().unwrap().push_back(result);
    }

    pub(crate) fn set_listing(&self, result: Result<RecordSet, TransportError>) {
        *self.default_listing.lock().unwrap() = Some(result);
    }

    pub(crate) fn set_search(&self, keyword: &str, result: Result<RecordSet, TransportError>) {
        self.set_slow_search(keyword, Duration::ZERO, result);
    }

    pub(crate) fn set_slow_search(
        &self,
        keyword: &str,
        delay: Duration,
        result: Result<RecordSet, TransportError>,
    ) {
        self.searches
            .lock()
            .unwrap()
            .insert(keyword.to_string(), (delay, result));
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn settled_uploads(&self) -> Arc<AtomicUsize> {
        self.settled_uploads.clone()
    }

    pub(crate) fn keywords(&self) -> Vec<String> {
        self.keywords.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordTransport for ScriptedTransport {
    async fn list_records(&self) -> Result<RecordSet, TransportError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        if let Some(result) = self.listings.lock().unwrap().pop_front() {
            return result;
        }
        self.default_listing
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(RecordSet::default()))
    }

    async fn search(&self, keyword: &str) -> Result<RecordSet, TransportError> {
        self.keywords.lock().unwrap().push(keyword.to_string());
        let scripted = self.searches.lock().unwrap().get(keyword).cloned();

        match scripted {
            Some((delay, result)) => {
                tokio::time::sleep(delay).await;
                result
            }
            None => Ok(RecordSet::default()),
        }
    }

    async fn upload(&self, file: &AudioFile) -> Result<UploadReceipt, TransportError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(barrier) = &self.upload_barrier {
            barrier.wait().await;
        }
        if let Some(delay) = self.upload_delays.get(&file.file_name) {
            tokio::time::sleep(*delay).await;
        }

        let result = match self.upload_failures.get(&file.file_name) {
            Some(error) => Err(error.clone()),
            None => Ok(UploadReceipt {
                transcript: Some(format!("transcript of {}", file.file_name)),
                ..UploadReceipt::default()
            }),
        };
        self.settled_uploads.fetch_add(1, Ordering::SeqCst);
        result
    }
}
