//! 主应用程序入口
//!
//! 加载配置，启动出站队列刷新任务和 Axum Web 服务，Ctrl+C 时优雅停机。

use std::sync::Arc;

use application::{CollabState, MessageFlusher};
use config::AppConfig;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load()?;
    match AppConfig::config_file_path() {
        Some(path) => tracing::info!(path = %path.display(), "Loaded configuration file"),
        None => tracing::info!("No configuration file found, using defaults and environment"),
    }

    let collab = Arc::new(CollabState::new(&config.room));

    // 出站队列刷新任务
    let shutdown = CancellationToken::new();
    let flusher = MessageFlusher::new(collab.clone(), config.message_queue.clone())
        .spawn(shutdown.clone());

    // 启动 Web 服务器
    let app = router(AppState::new(collab));
    let bind_addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!(address = %bind_addr, "协作编辑服务器启动");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown.cancel();
    flusher.await?;
    tracing::info!("服务器已停止");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("接收到 Ctrl+C 信号，开始优雅停机...");
}
