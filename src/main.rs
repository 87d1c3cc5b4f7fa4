//! wavecache - 波形采样缓存服务
//!
//! 组合根：加载配置、启动 cache actor、启动 HTTP 服务，退出前写出快照。

use std::sync::Arc;
use std::time::Duration;

use wavecache::application::WaveformCachePort;
use wavecache::config::{load_config, print_config};
use wavecache::infrastructure::adapters::SymphoniaDecoder;
use wavecache::infrastructure::http::{AppState, HttpServer, ServerConfig};
use wavecache::infrastructure::persistence::JsonSnapshotStore;
use wavecache::infrastructure::worker::WaveformCacheHandle;

/// 等待 actor 退出的上限
const ACTOR_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    let log_filter = format!(
        "{},wavecache={},tower_http=debug",
        config.log.level, config.log.level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter)),
        )
        .init();

    tracing::info!("wavecache {}", env!("CARGO_PKG_VERSION"));
    print_config(&config);

    // 启动 cache actor（快照在 actor 内加载）
    let decoder = Arc::new(SymphoniaDecoder::new());
    let snapshot_store = Arc::new(JsonSnapshotStore::new(&config.cache.dir));
    let (cache, actor) =
        WaveformCacheHandle::spawn(config.cache_settings(), decoder, snapshot_store);

    // 创建 HTTP 服务器
    let server_config = ServerConfig::new(&config.server.host, config.server.port);
    let state = AppState::new(Arc::new(cache.clone()), config.request_limits());
    let server = HttpServer::new(server_config, state);

    // 启动服务器（带优雅关闭）
    let served = server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("Received shutdown signal");
        })
        .await;

    // 无论服务器如何退出，都先写出待处理的快照
    cache.flush().await;
    drop(cache);
    if tokio::time::timeout(ACTOR_SHUTDOWN_GRACE, actor).await.is_err() {
        tracing::warn!("Waveform cache actor did not stop in time");
    }

    served?;
    tracing::info!("Server shutdown complete");

    Ok(())
}
