//! Shared harness: runs the real router on an ephemeral port.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{Value, json};

use spark_gateway::api;
use spark_gateway::app_state::AppState;
use spark_gateway::config::EnginePolicy;
use spark_gateway::domain::EventBus;
use spark_gateway::moderation::AllowAllModerator;
use spark_gateway::suggestion::InterestTips;

/// A running gateway.
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        let Ok(resp) = self.client.get(self.url(path)).send().await else {
            panic!("GET {path} failed");
        };
        read(resp).await
    }

    pub async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let Ok(resp) = self.client.post(self.url(path)).json(&body).send().await else {
            panic!("POST {path} failed");
        };
        read(resp).await
    }

    /// Registers a user and returns its id as a string.
    pub async fn register(&self, name: &str, age: u8, sex: &str) -> String {
        let (status, body) = self
            .post(
                "/api/v1/users",
                json!({
                    "profile": {
                        "name": name,
                        "age": age,
                        "sex": sex,
                        "interests": ["hiking", "jazz"],
                    }
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register {name}: {body}");
        let Some(id) = body["user_id"].as_str() else {
            panic!("register response without user_id: {body}");
        };
        id.to_string()
    }
}

async fn read(resp: reqwest::Response) -> (StatusCode, Value) {
    let status = resp.status();
    let body = resp.json::<Value>().await.unwrap_or(Value::Null);
    (status, body)
}

/// Starts a gateway with the given swipe cooldown and default patterns.
pub async fn spawn_server(swipe_cooldown: Duration) -> TestServer {
    let policy = EnginePolicy {
        swipe_cooldown,
        moderation_timeout: Duration::from_millis(500),
        ..EnginePolicy::default()
    };
    let Ok(state) = AppState::new(
        policy,
        EventBus::new(1024),
        Arc::new(AllowAllModerator),
        Arc::new(InterestTips),
    ) else {
        panic!("default patterns must compile");
    };
    let app = api::build_app(state, Duration::from_secs(10));

    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    tokio::spawn(async move { axum::serve(listener, app).await });

    TestServer {
        addr,
        client: reqwest::Client::new(),
    }
}
