//! Termination signals turned into a flag the poll loop can observe.

use std::future::Future;

use tokio::sync::watch;

/// Receiving half handed to [`NotificationPoller::run`](crate::poller::NotificationPoller::run).
pub type ShutdownSignal = watch::Receiver<bool>;

/// Create a shutdown flag. Sending `true` asks the loop to stop.
pub fn channel() -> (watch::Sender<bool>, ShutdownSignal) {
    watch::channel(false)
}

/// Spawn a task that flips the flag on SIGTERM or Ctrl+C.
pub fn listen_for_signals(trigger: watch::Sender<bool>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let signal = wait_for_signal().await;
        tracing::info!(signal, "Received shutdown signal, stopping after the current cycle...");
        // Nobody listening means the loop already exited.
        let _ = trigger.send(true);
    })
}

/// Resolve when `listener` reports a signal. If the listener itself fails,
/// log it and never resolve, so a broken source cannot fake a shutdown.
async fn signal_or_never<F>(listener: F, source: &'static str)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = listener.await {
        tracing::warn!(error = %e, source, "Signal listener failed, ignoring this source");
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    let ctrl_c = signal_or_never(tokio::signal::ctrl_c(), "SIGINT");

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = ctrl_c => "SIGINT",
        },
        Err(e) => {
            tracing::warn!(error = %e, "Could not install SIGTERM handler, only Ctrl+C will stop the relay");
            ctrl_c.await;
            "SIGINT"
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    signal_or_never(tokio::signal::ctrl_c(), "ctrl-c").await;
    "ctrl-c"
}
