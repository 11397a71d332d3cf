//! 主应用程序入口
//!
//! 加载配置、装配存储后端，启动 Axum Web API 服务。

use anyhow::Context;
use config::{AppConfig, StorageBackend};
use infrastructure::Infrastructure;
use tokio::net::TcpListener;
use tracing::info;
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
    config.validate().context("invalid configuration")?;

    if config.storage.backend == StorageBackend::Postgres {
        info!(
            "连接数据库: {}",
            config.database.url.split('@').next_back().unwrap_or("unknown")
        );
    }

    let infrastructure = Infrastructure::connect(&config)
        .await
        .context("failed to initialise storage")?;
    let state = AppState::from_infrastructure(&infrastructure, &config);
    let app = router(state);

    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("roster server listening on http://{addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
