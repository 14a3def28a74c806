//! Debounced preview requests.
//!
//! Every filter change goes through [`PreviewScheduler::schedule`]. The
//! scheduler aborts whatever task was pending, stamps the change with a new
//! sequence number and, if the filter is previewable, waits out the
//! debounce delay before asking the backend for a count.
//!
//! Aborting the previous task is what normally stops an old request. The
//! sequence number is checked again before publishing, so a response that
//! completes after a newer change (a task past its last await point when
//! aborted, or a change recorded by [`PreviewScheduler::cancel`]) is still
//! discarded.
//!
//! Failures are logged and otherwise ignored: the last good result stays
//! published.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use segment_core::SegmentFilter;

use crate::api::SegmentApi;
use crate::config::PreviewSettings;
use crate::model::PreviewResult;

/// A published preview and the change that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewSnapshot {
    pub seq: u64,
    pub result: PreviewResult,
}

/// What [`PreviewScheduler::schedule`] did with a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheduled {
    /// A request will be sent after the debounce delay.
    Pending { seq: u64 },
    /// The filter is empty or has incomplete conditions; nothing was sent.
    Skipped { seq: u64 },
}

pub struct PreviewScheduler {
    api: Arc<dyn SegmentApi>,
    settings: PreviewSettings,
    latest: Arc<AtomicU64>,
    pending: Option<JoinHandle<()>>,
    published: Arc<watch::Sender<Option<PreviewSnapshot>>>,
}

impl PreviewScheduler {
    pub fn new(api: Arc<dyn SegmentApi>, settings: PreviewSettings) -> Self {
        let (tx, _rx) = watch::channel(None);
        PreviewScheduler {
            api,
            settings,
            latest: Arc::new(AtomicU64::new(0)),
            pending: None,
            published: Arc::new(tx),
        }
    }

    pub fn settings(&self) -> PreviewSettings {
        self.settings
    }

    /// Receiver that observes every published preview.
    pub fn subscribe(&self) -> watch::Receiver<Option<PreviewSnapshot>> {
        self.published.subscribe()
    }

    /// The most recently published preview, if any.
    pub fn latest(&self) -> Option<PreviewSnapshot> {
        self.published.borrow().clone()
    }

    /// Sequence number of the most recent change.
    pub fn current_seq(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    /// Record a filter change. Must be called from within a tokio runtime.
    pub fn schedule(&mut self, filter: &SegmentFilter) -> Scheduled {
        self.cancel_pending();
        let seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;

        if !filter.is_previewable() {
            debug!(seq, "filter incomplete, preview skipped");
            return Scheduled::Skipped { seq };
        }

        let api = Arc::clone(&self.api);
        let latest = Arc::clone(&self.latest);
        let published = Arc::clone(&self.published);
        let payload = filter.payload();
        let PreviewSettings { debounce, limit } = self.settings;

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if latest.load(Ordering::SeqCst) != seq {
                return;
            }

            debug!(seq, conditions = payload.conditions.len(), "requesting preview");
            match api.preview(&payload, limit).await {
                Ok(result) if latest.load(Ordering::SeqCst) == seq => {
                    debug!(seq, total = result.total_count, "preview updated");
                    published.send_replace(Some(PreviewSnapshot { seq, result }));
                }
                Ok(_) => debug!(seq, "stale preview response discarded"),
                Err(error) => warn!(seq, %error, "preview request failed"),
            }
        }));

        Scheduled::Pending { seq }
    }

    /// Drop any pending or in-flight request without publishing it.
    pub fn cancel(&mut self) {
        self.cancel_pending();
        self.latest.fetch_add(1, Ordering::SeqCst);
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Drop for PreviewScheduler {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::testing::FakeApi;
    use segment_core::{Condition, ConditionValue, Logic, Operator};

    fn complete(n: i64) -> SegmentFilter {
        SegmentFilter {
            logic: Logic::And,
            conditions: vec![Condition::new("balance", Operator::Gt, ConditionValue::number(n))],
        }
    }

    fn incomplete() -> SegmentFilter {
        SegmentFilter {
            logic: Logic::And,
            conditions: vec![Condition {
                key: "balance".into(),
                ..Condition::default()
            }],
        }
    }

    fn scheduler(api: &Arc<FakeApi>) -> PreviewScheduler {
        PreviewScheduler::new(api.clone(), PreviewSettings::default())
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_debounce() {
        let api = Arc::new(FakeApi::new());
        let mut s = scheduler(&api);

        assert_eq!(s.schedule(&complete(100)), Scheduled::Pending { seq: 1 });

        tokio::time::sleep(Duration::from_millis(499)).await;
        assert!(api.preview_calls().is_empty());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(api.preview_calls(), vec![(complete(100), 5)]);
        assert_eq!(s.latest().map(|p| p.seq), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_changes_collapse_into_one_request() {
        let api = Arc::new(FakeApi::new());
        let mut s = scheduler(&api);

        for n in 0..5 {
            s.schedule(&complete(n));
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(api.preview_calls(), vec![(complete(4), 5)]);
        assert_eq!(s.latest().map(|p| p.seq), Some(5));
    }

    #[tokio::test(start_paused = true)]
    async fn incomplete_or_empty_filters_never_call_backend() {
        let api = Arc::new(FakeApi::new());
        let mut s = scheduler(&api);

        assert_eq!(s.schedule(&SegmentFilter::new()), Scheduled::Skipped { seq: 1 });
        assert_eq!(s.schedule(&incomplete()), Scheduled::Skipped { seq: 2 });
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(api.preview_calls().is_empty());
        assert_eq!(s.latest(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn incomplete_edit_cancels_pending_request() {
        let api = Arc::new(FakeApi::new());
        let mut s = scheduler(&api);

        s.schedule(&complete(1));
        tokio::time::sleep(Duration::from_millis(200)).await;
        s.schedule(&incomplete());
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(api.preview_calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn new_change_aborts_in_flight_request() {
        let api = Arc::new(FakeApi::new());
        api.delay_previews(Duration::from_secs(3));
        let mut s = scheduler(&api);

        s.schedule(&complete(1));
        // Debounce elapsed, first request now in flight.
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(api.preview_calls().len(), 1);

        api.delay_previews(Duration::from_millis(10));
        s.schedule(&complete(2));
        tokio::time::sleep(Duration::from_secs(5)).await;

        let latest = s.latest().expect("second preview published");
        assert_eq!(latest.seq, 2);
        assert_eq!(api.preview_calls().last(), Some(&(complete(2), 5)));
    }

    #[tokio::test(start_paused = true)]
    async fn response_for_superseded_seq_is_discarded() {
        let api = Arc::new(FakeApi::new());
        api.delay_previews(Duration::from_secs(3));
        let mut s = scheduler(&api);

        s.schedule(&complete(1));
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(api.preview_calls().len(), 1);

        // Newer change recorded while the task keeps running.
        s.latest.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert!(s.pending.as_ref().is_some_and(JoinHandle::is_finished));
        assert_eq!(s.latest(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn failure_keeps_previous_result() {
        let api = Arc::new(FakeApi::new());
        let mut s = scheduler(&api);

        s.schedule(&complete(1));
        tokio::time::sleep(Duration::from_millis(600)).await;
        let first = s.latest().expect("first preview");

        api.fail_previews(true);
        s.schedule(&complete(2));
        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(api.preview_calls().len(), 2);
        assert_eq!(s.latest(), Some(first));
    }

    #[tokio::test(start_paused = true)]
    async fn payload_logic_is_normalised() {
        let api = Arc::new(FakeApi::new());
        let mut s = scheduler(&api);

        let mut filter = complete(1);
        filter.logic = Logic::Or;
        s.schedule(&filter);
        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(api.preview_calls()[0].0.logic, Logic::And);
    }

    #[tokio::test(start_paused = true)]
    async fn subscribers_see_updates() {
        let api = Arc::new(FakeApi::new());
        let mut s = scheduler(&api);
        let mut rx = s.subscribe();

        s.schedule(&complete(1));
        rx.changed().await.expect("sender alive");
        assert_eq!(rx.borrow().as_ref().map(|p| p.seq), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_discards_pending_request() {
        let api = Arc::new(FakeApi::new());
        let mut s = scheduler(&api);

        s.schedule(&complete(1));
        s.cancel();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(api.preview_calls().is_empty());
        assert_eq!(s.current_seq(), 2);
    }
}
