// src/transport/mod.rs
// Transport Module - request/response wrappers around the records service

mod http;
mod types;

pub use http::HttpTransport;
pub use types::{AudioFile, AudioInfo, Record, RecordSet, TransportError, UploadReceipt};

use async_trait::async_trait;

/// Unified records service trait
#[async_trait]
pub trait RecordTransport: Send + Sync {
    /// Fetch every stored record
    async fn list_records(&self) -> Result<RecordSet, TransportError>;

    /// Fetch records whose file name or transcription matches `keyword`
    async fn search(&self, keyword: &str) -> Result<RecordSet, TransportError>;

    /// Submit one audio file for transcription
    async fn upload(&self, file: &AudioFile) -> Result<UploadReceipt, TransportError>;
}
