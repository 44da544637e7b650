// src/transport/http.rs
// HTTP transport against the records/transcription service

use super::{AudioFile, RecordSet, RecordTransport, TransportError, UploadReceipt};
use crate::config::ClientConfig;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{multipart, Client, Request, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

const LIST_PATH: &str = "/data/transcriptions";
const SEARCH_PATH: &str = "/data/search";
const TRANSCRIBE_PATH: &str = "/stt/transcribe";
const AUDIO_FIELD: &str = "audio";

pub struct HttpTransport {
    base_url: String,
    client: Client,
}

impl HttpTransport {
    /// Build a transport from config. Requests carry no overall timeout, only a connect timeout.
    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        tracing::info!("HTTP transport initialized: {}", config.api_endpoint);

        Ok(Self::with_client(config.api_endpoint.clone(), client))
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, client }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn list_request(&self) -> Result<Request, TransportError> {
        self.client
            .get(self.url(LIST_PATH))
            .build()
            .map_err(map_request_error)
    }

    fn search_request(&self, keyword: &str) -> Result<Request, TransportError> {
        self.client
            .get(self.url(SEARCH_PATH))
            .query(&[("keyword", keyword)])
            .build()
            .map_err(map_request_error)
    }

    fn upload_request(&self, file: &AudioFile) -> Result<Request, TransportError> {
        let part = multipart::Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.mime_type)
            .map_err(|e| TransportError::InvalidFile(e.to_string()))?;

        let form = multipart::Form::new().part(AUDIO_FIELD, part);

        self.client
            .post(self.url(TRANSCRIBE_PATH))
            .header(ACCEPT, "application/json")
            .multipart(form)
            .build()
            .map_err(map_request_error)
    }

    async fn execute<T: DeserializeOwned>(&self, request: Request) -> Result<T, TransportError> {
        let response = self
            .client
            .execute(request)
            .await
            .map_err(map_request_error)?;

        read_json(response).await
    }
}

#[async_trait]
impl RecordTransport for HttpTransport {
    async fn list_records(&self) -> Result<RecordSet, TransportError> {
        let request = self.list_request()?;
        self.execute(request).await.map_err(|e| {
            tracing::error!("Failed to retrieve list of records: {}", e);
            e
        })
    }

    async fn search(&self, keyword: &str) -> Result<RecordSet, TransportError> {
        let request = self.search_request(keyword)?;
        self.execute(request).await.map_err(|e| {
            tracing::error!("Search error: {}", e);
            e
        })
    }

    async fn upload(&self, file: &AudioFile) -> Result<UploadReceipt, TransportError> {
        tracing::debug!(
            "Uploading {} ({} bytes, {})",
            file.file_name,
            file.len(),
            file.mime_type
        );

        let request = self.upload_request(file)?;
        self.execute(request).await.map_err(|e| {
            tracing::error!("Upload error for {}: {}", file.file_name, e);
            e
        })
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, TransportError> {
    let status = response.status();

    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(TransportError::Status {
            status: status.as_u16(),
            message,
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| TransportError::Decode(e.to_string()))
}

fn map_request_error(e: reqwest::Error) -> TransportError {
    if let Some(status) = e.status() {
        TransportError::Status {
            status: status.as_u16(),
            message: e.to_string(),
        }
    } else if e.is_decode() {
        TransportError::Decode(e.to_string())
    } else {
        TransportError::Network(e.to_string())
    }
}
