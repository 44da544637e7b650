// src/transport/types.rs
// Wire types and transport error definitions

use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use thiserror::Error;

/// One stored transcription as returned by the records service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: serde_json::Value,
    #[serde(default)]
    pub file_name: String,
    /// Transcribed text, empty when the service stored nothing
    #[serde(default, deserialize_with = "null_as_empty")]
    pub transcription: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub duration: serde_json::Value,
    #[serde(default)]
    pub channel: serde_json::Value,
    #[serde(default)]
    pub sample_rate: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_format: Option<String>,
}

impl Record {
    /// Key used to collapse duplicate search hits
    pub fn dedup_key(&self) -> &str {
        self.transcription.trim()
    }
}

/// Envelope shared by the listing and search endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordSet {
    #[serde(default)]
    pub record: u64,
    #[serde(default)]
    pub data: Vec<Record>,
}

impl RecordSet {
    pub fn is_empty(&self) -> bool {
        self.record == 0 || self.data.is_empty()
    }
}

/// Metadata the transcribe endpoint extracted from an uploaded file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioInfo {
    pub file_name: Option<String>,
    pub audio_format: Option<String>,
    pub channel: Option<u32>,
    pub sample_rate: Option<u32>,
    pub duration: Option<f64>,
}

/// Success body of the transcribe endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadReceipt {
    pub metadata: AudioInfo,
    pub transcript: Option<String>,
}

/// Audio payload for a single upload
#[derive(Debug, Clone)]
pub struct AudioFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl AudioFile {
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime_type = mime_for_name(&file_name).to_string();
        Self {
            file_name,
            bytes,
            mime_type,
        }
    }

    /// Read a file from disk, inferring its MIME type from the extension
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, TransportError> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| TransportError::InvalidFile(format!("{} has no file name", path.display())))?;

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| TransportError::InvalidFile(format!("{}: {}", path.display(), e)))?;

        Ok(Self::from_bytes(file_name, bytes))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

fn mime_for_name(file_name: &str) -> &'static str {
    let extension = Path::new(file_name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());

    match extension.as_deref() {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("m4a") => "audio/mp4",
        Some("ogg") | Some("oga") => "audio/ogg",
        Some("flac") => "audio/flac",
        Some("webm") => "audio/webm",
        Some("aac") => "audio/aac",
        _ => "application/octet-stream",
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Transport error types
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Request failed with status: {status}, message: {message}")]
    Status { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response body: {0}")]
    Decode(String),

    #[error("Invalid audio file: {0}")]
    InvalidFile(String),
}

impl TransportError {
    /// HTTP status carried by the failure, if the service answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// User-facing text naming the operation that failed, e.g.
    /// "Search failed with status: 500, message: ..."
    pub fn describe(&self, operation: &str) -> String {
        match self {
            TransportError::Status { status, message } => {
                format!("{} failed with status: {}, message: {}", operation, status, message)
            }
            other => format!("{} failed: {}", operation, other),
        }
    }
}
