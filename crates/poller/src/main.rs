use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use octorelay_common::config::{AppConfig, DEFAULT_LOG_LEVEL, LogFormat};
use octorelay_engine::StateStore;
use octorelay_notifier::TelegramNotifier;
use octorelay_poller::poller::NotificationPoller;
use octorelay_poller::shutdown;
use octorelay_source::GitHubClient;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load configuration first so LOG_LEVEL applies, but report failures through tracing
    let config = AppConfig::from_env();
    match &config {
        Ok(c) => init_tracing(c.log_level, c.log_format),
        Err(_) => init_tracing(DEFAULT_LOG_LEVEL, LogFormat::Text),
    }

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration, refusing to start");
            return Err(e.into());
        }
    };

    tracing::info!("Starting GitHub Telegram relay");

    if let Err(e) = run(config).await {
        tracing::error!(error = %format_args!("{e:#}"), "Unhandled error in main loop");
        return Err(e);
    }

    tracing::info!("GitHub Telegram relay finished successfully");
    Ok(())
}

async fn run(config: AppConfig) -> anyhow::Result<()> {
    // One HTTP client for the whole process, dropped with the poller on every exit path
    let http = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()?;

    // Listen before touching the state file so an early SIGTERM is still a clean stop
    let (trigger, signal) = shutdown::channel();
    let listener = shutdown::listen_for_signals(trigger);

    let store = StateStore::open(&config.notifications_file).await?;
    let notified = store.load().await?;

    let source = GitHubClient::new(http.clone(), &config.gh_api_url, config.gh_token);
    let notifier = TelegramNotifier::new(http, &config.telegram_api_url, config.telegram_token);

    let mut poller = NotificationPoller::new(
        source,
        notifier,
        store,
        notified,
        config.telegram_chat_id,
        config.poll_interval,
    );

    let result = poller.run(signal).await;
    listener.abort();

    result?;
    Ok(())
}

fn init_tracing(level: LevelFilter, format: LogFormat) {
    let filter = env_filter(level, &std::env::var("RUST_LOG").unwrap_or_default());

    match format {
        LogFormat::Json => tracing_subscriber::fmt().with_env_filter(filter).json().init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

/// `level` is the default; RUST_LOG-style `directives` refine or override it.
fn env_filter(level: LevelFilter, directives: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(level.into())
        .parse_lossy(directives)
}
