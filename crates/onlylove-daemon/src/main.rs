mod http;

use onlylove_proto::cache::{CacheStore, FileCacheStore, MemoryCacheStore};
use onlylove_proto::config::Config;
use onlylove_proto::contact::ContactRelay;
use onlylove_proto::episodes::{EpisodeFeed, CACHE_KEY_TIMESTAMP};
use onlylove_proto::live::LiveStatusPoller;
use onlylove_proto::state::StateManager;
use onlylove_proto::youtube::{VideoPlatform, YouTubeClient};
use std::sync::Arc;
use tracing::{info, warn};

fn cache_store(config: &Config) -> Arc<dyn CacheStore> {
    let store = FileCacheStore::new(config.cache.file.clone());
    // Probe once so an unusable cache dir degrades to memory instead of
    // failing every load.
    match store.get(CACHE_KEY_TIMESTAMP) {
        Ok(_) => {
            info!("Episode cache: {:?}", store.path());
            Arc::new(store)
        }
        Err(e) => {
            warn!("Episode cache unavailable ({}), using in-memory cache", e);
            Arc::new(MemoryCacheStore::new())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = onlylove_proto::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join("daemon.log");

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override; keep HTTP client internals quiet by default.
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        "info,onlylove_daemon=debug,onlylove_proto=debug,hyper=warn,hyper_util=warn,reqwest=warn"
            .to_string()
    });
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    // Print log path to stderr so the operator can tail it immediately.
    eprintln!("onlylove log: {}", log_path.display());
    info!("onlylove-daemon starting…");

    let config = Config::load()?;
    info!("Config loaded from: {:?}", Config::config_path());

    let youtube = YouTubeClient::from_config(&config.youtube)?;
    let platform: Arc<dyn VideoPlatform> = Arc::new(youtube);
    let state_manager = Arc::new(StateManager::new());

    let feed = Arc::new(EpisodeFeed::from_config(
        &config.youtube,
        platform.clone(),
        cache_store(&config),
    ));
    let contact = Arc::new(ContactRelay::new(
        config.contact.relay_url().map(str::to_string),
        config.youtube.request_timeout(),
    )?);
    if !contact.is_configured() {
        warn!("No contact relay configured; contact form submissions will be refused");
    }

    // Live poller lives for the whole process; the handle is the teardown.
    let poller = LiveStatusPoller::spawn(&config, platform, state_manager.clone());

    if config.http.enabled {
        let _http_handle = http::start_server(
            config.http.bind_address.clone(),
            config.http.port,
            http::HttpState {
                state_manager: state_manager.clone(),
                feed,
                contact,
                channel_id: config.youtube.channel_id().map(str::to_string),
            },
        );
    } else {
        warn!("HTTP API disabled in config; only the live poller will run");
    }

    info!("Daemon initialised, waiting for shutdown signal");
    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");

    if let Some(poller) = poller {
        poller.stop().await;
    }
    Ok(())
}
