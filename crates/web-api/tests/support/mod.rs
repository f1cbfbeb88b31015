#![allow(dead_code)]

use std::{net::SocketAddr, time::Duration};

use config::AppConfig;
use futures_util::StreamExt;
use reqwest::Client;
use serde_json::{json, Value};
use tokio::{net::TcpListener, net::TcpStream, sync::oneshot, time::timeout};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use web_api::{router, AppState};

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub async fn spawn() -> Self {
        Self::spawn_with(test_config()).await
    }

    pub async fn spawn_with(config: AppConfig) -> Self {
        let state = AppState::from_config(&config);
        let app = router(state);
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, app.into_make_service())
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        Self {
            addr,
            client: Client::new(),
            shutdown: Some(shutdown_tx),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// 注册用户，返回 (用户 id, token)
    pub async fn signup(&self, name: &str, email: &str) -> (String, String) {
        let response = self
            .client
            .post(self.url("/api/auth/signup"))
            .json(&json!({
                "full_name": name,
                "email": email,
                "password": "secret123",
            }))
            .send()
            .await
            .expect("signup request");
        assert_eq!(response.status(), 201);

        let body: Value = response.json().await.expect("signup json");
        (
            body["user"]["id"].as_str().expect("user id").to_owned(),
            body["token"].as_str().expect("token").to_owned(),
        )
    }

    pub async fn connect_ws(&self, token: &str) -> WsClient {
        let url = format!("ws://{}/ws?token={}", self.addr, token);
        let (stream, _) = connect_async(url).await.expect("ws connect");
        stream
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.security.bcrypt_cost = Some(4);
    config
}

/// 读取下一条文本帧并解析为 JSON
pub async fn next_event(ws: &mut WsClient) -> Value {
    loop {
        let message = timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for event")
            .expect("stream ended")
            .expect("ws error");
        if message.is_text() {
            return serde_json::from_str(message.to_text().expect("text")).expect("event json");
        }
    }
}

/// 跳过在线状态广播，直到收到指定名称的事件
pub async fn next_event_named(ws: &mut WsClient, name: &str) -> Value {
    loop {
        let event = next_event(ws).await;
        if event["event"] == name {
            return event;
        }
    }
}

/// 等待一个满足条件的在线列表
pub async fn wait_for_presence(ws: &mut WsClient, expected: &[&str]) -> Vec<String> {
    loop {
        let event = next_event_named(ws, "presence-update").await;
        let mut online: Vec<String> = event["payload"]
            .as_array()
            .expect("presence payload")
            .iter()
            .map(|id| id.as_str().expect("id").to_owned())
            .collect();
        online.sort();
        let mut wanted: Vec<String> = expected.iter().map(|id| id.to_string()).collect();
        wanted.sort();
        if online == wanted {
            return online;
        }
    }
}
