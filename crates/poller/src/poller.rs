use std::time::Duration;

use octorelay_common::error::RelayError;
use octorelay_engine::{NotifiedSet, StateStore, dedup};
use octorelay_notifier::Notifier;
use octorelay_source::NotificationSource;

use crate::shutdown::ShutdownSignal;

/// Lifecycle of the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopping,
}

/// What happened during one fetch → filter → deliver → persist cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Unread items returned by the source.
    pub fetched: usize,
    /// Items not yet in the notified set.
    pub new: usize,
    pub delivered: usize,
    /// Deliveries that failed and will be retried next cycle.
    pub failed: usize,
}

/// Poll loop that relays new unread notifications and remembers what it sent.
pub struct NotificationPoller<S, N> {
    source: S,
    notifier: N,
    store: StateStore,
    notified: NotifiedSet,
    destination: String,
    poll_interval: Duration,
}

impl<S, N> NotificationPoller<S, N>
where
    S: NotificationSource,
    N: Notifier,
{
    /// `notified` is the set previously returned by `store.load()`.
    pub fn new(
        source: S,
        notifier: N,
        store: StateStore,
        notified: NotifiedSet,
        destination: impl Into<String>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            source,
            notifier,
            store,
            notified,
            destination: destination.into(),
            poll_interval,
        }
    }

    pub fn notified(&self) -> &NotifiedSet {
        &self.notified
    }

    /// Run cycles until `shutdown` is raised. Returns only on shutdown or a fatal error.
    ///
    /// The interval is measured from the end of one cycle to the start of the
    /// next. A cycle that has started always runs to completion.
    pub async fn run(&mut self, mut shutdown: ShutdownSignal) -> Result<(), RelayError> {
        tracing::info!(
            destination = %self.destination,
            poll_interval_secs = self.poll_interval.as_secs_f64(),
            state_file = %self.store.path().display(),
            known_ids = self.notified.len(),
            "Notification poller started"
        );

        let mut state = LoopState::Running;

        while state == LoopState::Running {
            let stop_requested = *shutdown.borrow();
            if stop_requested {
                state = LoopState::Stopping;
                continue;
            }

            let report = self.run_cycle().await?;
            if report.new > 0 {
                tracing::info!(
                    fetched = report.fetched,
                    new = report.new,
                    delivered = report.delivered,
                    failed = report.failed,
                    "Cycle complete"
                );
            } else {
                tracing::debug!(fetched = report.fetched, "Cycle complete, nothing new");
            }

            if self.pause(&mut shutdown).await {
                state = LoopState::Stopping;
            }
        }

        tracing::info!(known_ids = self.notified.len(), "Notification poller stopped");
        Ok(())
    }

    /// Execute a single cycle. Fetch and delivery failures are logged and
    /// absorbed. Storage failures and unclassified notifier errors are
    /// returned, after the ids delivered so far have been saved.
    pub async fn run_cycle(&mut self) -> Result<CycleReport, RelayError> {
        let items = self.source.fetch_unread().await;
        let fresh = dedup::select_new(&items, &self.notified);

        let mut report = CycleReport {
            fetched: items.len(),
            new: fresh.len(),
            ..CycleReport::default()
        };

        let mut fatal = None;

        for item in fresh {
            let text = dedup::format_message(item);
            tracing::info!(
                id = %item.id,
                reason = item.reason.as_deref().unwrap_or("unknown"),
                text = %text,
                "New notification"
            );

            match self.notifier.send(&self.destination, &text).await {
                Ok(()) => {
                    dedup::record(item, &mut self.notified);
                    report.delivered += 1;
                }
                Err(e) if e.is_transient() => {
                    tracing::warn!(
                        id = %item.id,
                        error = %e,
                        "Delivery failed, will retry next cycle"
                    );
                    report.failed += 1;
                }
                Err(e) => {
                    tracing::error!(
                        id = %item.id,
                        error = %e,
                        "Delivery failed with an unexpected error, aborting cycle"
                    );
                    report.failed += 1;
                    fatal = Some(e);
                    break;
                }
            }
        }

        self.store.save(&self.notified).await?;

        match fatal {
            Some(e) => Err(e),
            None => Ok(report),
        }
    }

    /// Sleep for the poll interval. Returns `true` if shutdown was requested meanwhile.
    async fn pause(&self, shutdown: &mut ShutdownSignal) -> bool {
        let deadline = tokio::time::Instant::now() + self.poll_interval;

        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => return false,
            requested = async { shutdown.wait_for(|stop| *stop).await.is_ok() } => {
                if requested {
                    return true;
                }
            }
        }

        // Sender dropped: no stop can arrive any more, finish the interval.
        tokio::time::sleep_until(deadline).await;
        false
    }
}
