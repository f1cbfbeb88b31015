//! 主应用程序入口
//!
//! 加载配置，装配服务并启动 Axum Web API 与 WebSocket 服务。

use anyhow::Context;
use axum::http::HeaderValue;
use config::{AppConfig, ServerConfig};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志，RUST_LOG 未设置时默认 info
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::load().context("加载配置失败")?;
    if config.uses_development_secret() {
        tracing::warn!("正在使用开发环境 JWT 密钥，生产环境请设置 APP_JWT__SECRET");
    }
    tracing::info!(
        duplicate_policy = ?config.realtime.duplicate_policy,
        evict_superseded = config.realtime.evict_superseded,
        "实时连接策略"
    );

    let state = AppState::from_config(&config);
    let app = router(state)
        .layer(cors_layer(&config.server)?)
        .layer(TraceLayer::new_for_http());

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("无法绑定地址 {address}"))?;

    tracing::info!("聊天服务器启动在 http://{}", address);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("服务器已关闭");
    Ok(())
}

fn cors_layer(server: &ServerConfig) -> anyhow::Result<CorsLayer> {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    let allow_any = server.cors_origins.is_empty()
        || server.cors_origins.iter().any(|origin| origin == "*");
    if allow_any {
        return Ok(layer.allow_origin(Any));
    }

    let origins = server
        .cors_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("无效的 CORS 来源: {origin}"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(layer.allow_origin(AllowOrigin::list(origins)))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "监听退出信号失败");
        return;
    }
    tracing::info!("收到退出信号，开始关闭");
}
