// src/browser/mod.rs
// Record Browser - authoritative record list kept fresh by bus notifications

use crate::events::{EventBus, SubscriptionId};
use crate::lock::lock;
use crate::pagination::{self, Page};
use crate::transport::{Record, RecordTransport};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub const EMPTY_RECORDS_MESSAGE: &str = "No records found";

#[derive(Debug, Clone, PartialEq)]
pub enum BrowserView {
    /// No listing has succeeded yet
    NotLoaded,
    Empty,
    Records(Page<Record>),
}

impl BrowserView {
    pub fn message(&self) -> Option<&'static str> {
        match self {
            BrowserView::NotLoaded | BrowserView::Empty => Some(EMPTY_RECORDS_MESSAGE),
            BrowserView::Records(_) => None,
        }
    }
}

struct BrowserState {
    records: Option<Vec<Record>>,
    current_page: usize,
}

pub struct RecordBrowser {
    transport: Arc<dyn RecordTransport>,
    bus: EventBus,
    page_size: NonZeroUsize,
    state: Mutex<BrowserState>,
    refreshes: watch::Sender<u64>,
}

impl RecordBrowser {
    pub fn new(transport: Arc<dyn RecordTransport>, bus: EventBus, page_size: NonZeroUsize) -> Self {
        let (refreshes, _) = watch::channel(0);
        Self {
            transport,
            bus,
            page_size,
            state: Mutex::new(BrowserState {
                records: None,
                current_page: 1,
            }),
            refreshes,
        }
    }

    /// Fetch the full list and replace the stored one wholesale.
    ///
    /// A failed fetch is logged and leaves the last good list in place.
    /// Returns whether the list was replaced.
    pub async fn refresh(&self) -> bool {
        let replaced = match self.transport.list_records().await {
            Ok(set) => {
                let count = set.data.len();
                let mut state = lock(&self.state);
                state.records = Some(set.data);
                let total_pages = pagination::total_pages(count, self.page_size.get());
                let clamped = pagination::clamp_page(state.current_page, total_pages);
                if clamped != state.current_page {
                    tracing::debug!(
                        "Record list shrank to {} page(s), cursor {} -> {}",
                        total_pages,
                        state.current_page,
                        clamped
                    );
                    state.current_page = clamped;
                }
                drop(state);
                tracing::info!("Record list refreshed: {} record(s)", count);
                true
            }
            Err(e) => {
                tracing::error!("Error fetching records: {}", e);
                false
            }
        };

        self.refreshes.send_modify(|n| *n += 1);
        replaced
    }

    /// Load the list and start following insert notifications.
    ///
    /// The subscription is registered before the first fetch so an insert
    /// that lands during the initial load still triggers a refresh.
    pub async fn activate(self: &Arc<Self>) -> BrowserHandle {
        let mut subscription = self.bus.subscribe();
        let subscription_id = subscription.id();

        self.refresh().await;

        let browser = Arc::clone(self);
        let task = tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                tracing::debug!("Record browser refreshing on {}", event.as_str());
                browser.refresh().await;
            }
        });

        BrowserHandle {
            bus: self.bus.clone(),
            subscription_id,
            task: Some(task),
        }
    }

    /// Completed refresh attempts, successful or not
    pub fn refresh_count(&self) -> u64 {
        *self.refreshes.borrow()
    }

    pub fn watch_refreshes(&self) -> watch::Receiver<u64> {
        self.refreshes.subscribe()
    }

    pub fn is_loaded(&self) -> bool {
        lock(&self.state).records.is_some()
    }

    pub fn records(&self) -> Vec<Record> {
        lock(&self.state).records.clone().unwrap_or_default()
    }

    pub fn current_page(&self) -> usize {
        lock(&self.state).current_page
    }

    pub fn view(&self) -> BrowserView {
        let state = lock(&self.state);

        match state.records.as_deref() {
            None => BrowserView::NotLoaded,
            Some([]) => BrowserView::Empty,
            Some(records) => {
                BrowserView::Records(Page::of(records, self.page_size, state.current_page))
            }
        }
    }

    pub fn go_to_page(&self, page: usize) -> usize {
        let mut state = lock(&self.state);
        let total = state.records.as_ref().map(|r| r.len()).unwrap_or(0);
        let total_pages = pagination::total_pages(total, self.page_size.get());
        state.current_page = pagination::clamp_page(page, total_pages);
        state.current_page
    }

    pub fn next_page(&self) -> usize {
        self.go_to_page(self.current_page().saturating_add(1))
    }

    pub fn previous_page(&self) -> usize {
        self.go_to_page(self.current_page().saturating_sub(1))
    }
}

/// Live activation of a [`RecordBrowser`]. Dropping it deactivates.
pub struct BrowserHandle {
    bus: EventBus,
    subscription_id: SubscriptionId,
    task: Option<JoinHandle<()>>,
}

impl BrowserHandle {
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn deactivate(mut self) {
        self.release();
    }

    fn release(&mut self) {
        self.bus.unsubscribe(self.subscription_id);
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!("Record browser deactivated");
        }
    }
}

impl Drop for BrowserHandle {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::WorkspaceEvent;
    use crate::testing::{record, record_set, server_error, ScriptedTransport};
    use std::time::Duration;

    fn browser(transport: &Arc<ScriptedTransport>, bus: &EventBus, page_size: usize) -> Arc<RecordBrowser> {
        Arc::new(RecordBrowser::new(
            transport.clone(),
            bus.clone(),
            NonZeroUsize::new(page_size).unwrap(),
        ))
    }

    async fn wait_for_refresh(rx: &mut watch::Receiver<u64>, at_least: u64) {
        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|n| *n >= at_least))
            .await
            .expect("refresh did not happen")
            .unwrap();
    }

    #[tokio::test]
    async fn test_two_records_fit_one_page() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.set_listing(Ok(record_set(vec![
            record(1, "sample.mp3", "first"),
            record(2, "sample2.mp3", "second"),
        ])));
        let bus = EventBus::new();
        let browser = browser(&transport, &bus, 3);

        let _handle = browser.activate().await;

        let BrowserView::Records(page) = browser.view() else {
            panic!("expected records");
        };
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.window.total_pages, 1);
        assert!(!page.window.show_controls());
    }

    #[tokio::test]
    async fn test_insert_notification_triggers_refetch() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_listing(Ok(record_set(vec![record(1, "a.mp3", "a")])));
        transport.set_listing(Ok(record_set(vec![
            record(1, "a.mp3", "a"),
            record(2, "b.mp3", "b"),
        ])));
        let bus = EventBus::new();
        let browser = browser(&transport, &bus, 3);
        let mut refreshes = browser.watch_refreshes();

        let handle = browser.activate().await;
        assert!(handle.is_active());
        assert_eq!(browser.records().len(), 1);

        bus.emit(WorkspaceEvent::RecordInserted);
        wait_for_refresh(&mut refreshes, 2).await;

        assert_eq!(transport.list_calls(), 2);
        assert_eq!(browser.records().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_last_good_list() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_listing(Ok(record_set(vec![record(1, "a.mp3", "a")])));
        transport.set_listing(Err(server_error("database locked")));
        let bus = EventBus::new();
        let browser = browser(&transport, &bus, 3);

        assert!(browser.refresh().await);
        assert!(!browser.refresh().await);

        assert_eq!(browser.records().len(), 1);
        assert_eq!(browser.refresh_count(), 2);
    }

    #[tokio::test]
    async fn test_initial_failure_is_not_loaded() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.set_listing(Err(server_error("down")));
        let bus = EventBus::new();
        let browser = browser(&transport, &bus, 3);

        let _handle = browser.activate().await;

        assert!(!browser.is_loaded());
        assert_eq!(browser.view(), BrowserView::NotLoaded);
        assert_eq!(browser.view().message(), Some("No records found"));
    }

    #[tokio::test]
    async fn test_empty_listing_is_loaded_but_empty() {
        let transport = Arc::new(ScriptedTransport::new());
        let bus = EventBus::new();
        let browser = browser(&transport, &bus, 3);

        browser.refresh().await;

        assert!(browser.is_loaded());
        assert_eq!(browser.view(), BrowserView::Empty);
    }

    #[tokio::test]
    async fn test_deactivate_releases_listener() {
        let transport = Arc::new(ScriptedTransport::new());
        let bus = EventBus::new();
        let browser = browser(&transport, &bus, 3);

        let handle = browser.activate().await;
        assert_eq!(bus.listener_count(), 1);

        handle.deactivate();
        assert_eq!(bus.listener_count(), 0);

        bus.emit(WorkspaceEvent::RecordInserted);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(transport.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_reactivation_does_not_leak_listeners() {
        let transport = Arc::new(ScriptedTransport::new());
        let bus = EventBus::new();
        let browser = browser(&transport, &bus, 3);

        for _ in 0..3 {
            let handle = browser.activate().await;
            assert_eq!(bus.listener_count(), 1);
            drop(handle);
        }
        assert_eq!(bus.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_cursor_clamps_when_list_shrinks() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_listing(Ok(record_set(
            (1..=7).map(|i| record(i, "f.mp3", &i.to_string())).collect(),
        )));
        transport.set_listing(Ok(record_set(vec![record(1, "f.mp3", "1")])));
        let bus = EventBus::new();
        let browser = browser(&transport, &bus, 3);

        browser.refresh().await;
        assert_eq!(browser.go_to_page(3), 3);

        browser.refresh().await;
        assert_eq!(browser.current_page(), 1);
    }

    #[tokio::test]
    async fn test_cursor_kept_across_refresh_that_still_fits() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.set_listing(Ok(record_set(
            (1..=7).map(|i| record(i, "f.mp3", &i.to_string())).collect(),
        )));
        let bus = EventBus::new();
        let browser = browser(&transport, &bus, 3);

        browser.refresh().await;
        browser.next_page();
        browser.refresh().await;

        assert_eq!(browser.current_page(), 2);
        assert_eq!(browser.previous_page(), 1);
        assert_eq!(browser.previous_page(), 1);
    }

    #[tokio::test]
    async fn test_refresh_recovers_from_poisoned_state() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.set_listing(Ok(record_set(vec![record(1, "a.mp3", "a")])));
        let bus = EventBus::new();
        let browser = browser(&transport, &bus, 3);

        let poisoner = browser.clone();
        let _ = std::thread::spawn(move || {
            let _state = poisoner.state.lock().unwrap();
            panic!("reader panicked");
        })
        .join();
        assert!(browser.state.is_poisoned());

        assert!(browser.refresh().await);
        assert!(browser.is_loaded());
        assert_eq!(browser.records().len(), 1);
    }
}
