mod browser;
mod cli;
mod config;
mod events;
mod inflight;
mod lock;
mod pagination;
mod search;
#[cfg(test)]
mod testing;
mod transport;
mod upload;

pub use browser::{BrowserHandle, BrowserView, RecordBrowser, EMPTY_RECORDS_MESSAGE};
pub use cli::run;
pub use config::{ClientConfig, ConfigError};
pub use events::{EventBus, Subscription, SubscriptionId, WorkspaceEvent};
pub use pagination::{clamp_page, total_pages, Page, PageWindow, MAX_VISIBLE_PAGES};
pub use search::{unique_by_transcription, SearchEngine, SearchError, SearchView, EMPTY_RESULTS_MESSAGE};
pub use transport::{
    AudioFile, AudioInfo, HttpTransport, Record, RecordSet, RecordTransport, TransportError,
    UploadReceipt,
};
pub use upload::{BatchReport, FileOutcome, UploadCoordinator, UploadError, UploadStatus, UploadTally};

use std::num::NonZeroUsize;
use std::sync::Arc;

/// Application context: one transport, one bus, and the three controllers wired to them.
///
/// The upload coordinator and the record browser never reference each other;
/// they only share the bus.
pub struct Workspace {
    config: ClientConfig,
    bus: EventBus,
    uploads: UploadCoordinator,
    search: SearchEngine,
    browser: Arc<RecordBrowser>,
}

impl Workspace {
    pub fn new(config: ClientConfig, transport: Arc<dyn RecordTransport>) -> Self {
        let bus = EventBus::new();
        let records_per_page = page_size(config.records_per_page);
        let results_per_page = page_size(config.results_per_page);

        Self {
            uploads: UploadCoordinator::new(transport.clone(), bus.clone()),
            search: SearchEngine::new(transport.clone(), results_per_page),
            browser: Arc::new(RecordBrowser::new(transport, bus.clone(), records_per_page)),
            bus,
            config,
        }
    }

    /// Workspace talking HTTP to `config.api_endpoint`
    pub fn connect(config: ClientConfig) -> Result<Self, TransportError> {
        let transport = HttpTransport::from_config(&config)?;
        Ok(Self::new(config, Arc::new(transport)))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn uploads(&self) -> &UploadCoordinator {
        &self.uploads
    }

    pub fn search(&self) -> &SearchEngine {
        &self.search
    }

    pub fn browser(&self) -> &Arc<RecordBrowser> {
        &self.browser
    }
}

fn page_size(size: usize) -> NonZeroUsize {
    NonZeroUsize::new(size).unwrap_or(NonZeroUsize::MIN)
}
