use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod state;

use classroom_search::cache::MemoryCache;
use classroom_search::config;
use classroom_search::search::{ResultCache, SearchService, SearchSettings};
use state::AppState;

/// Periodically drop expired cache entries until shutdown / 定时清理过期缓存
fn spawn_cache_purge(cache: Arc<MemoryCache>, interval: std::time::Duration, shutdown: CancellationToken) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let removed = cache.purge_expired();
                    if removed > 0 {
                        tracing::debug!("Purged {} expired search cache entries", removed);
                    }
                }
            }
        }
    });
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received, cancelling in-flight searches");
    shutdown.cancel();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "classroom_search=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration / 加载配置
    let config_path = config::get_config_path();
    let app_config = config::load_config(&config_path).map_err(anyhow::Error::msg)?;
    tracing::info!("Server will listen on {}:{}", app_config.server.host, app_config.server.port);

    let shutdown = CancellationToken::new();

    // Search cache / 搜索缓存
    let cache_store = Arc::new(MemoryCache::new(app_config.cache.max_entries));
    spawn_cache_purge(cache_store.clone(), app_config.cache.purge_interval(), shutdown.clone());

    // Education data provider (may be absent) / 课堂数据源
    let provider = match classroom_search::providers::build_provider(&app_config.classroom) {
        Ok(provider) => provider,
        Err(e) => {
            tracing::error!("Failed to initialize classroom provider: {}", e);
            None
        }
    };

    let search = SearchService::new(
        provider,
        ResultCache::new(cache_store.clone()),
        SearchSettings::from(&app_config.search),
        shutdown.child_token(),
    );

    let state = Arc::new(AppState {
        search: Arc::new(search),
        cache_store,
    });

    let app = api::router(state);

    let bind_addr = app_config.get_bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server running at http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    shutdown.cancel();
    tracing::info!("Server stopped");
    Ok(())
}
