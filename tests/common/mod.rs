#![allow(dead_code)]

use api_health_checker::{db, server::config::ServerConfig, web};
use axum::{ServiceExt, extract::Request};
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

pub const PASSWORD: &str = "correct-horse";

pub struct TestApp {
    pub base: String,
    pub db: DatabaseConnection,
    pub config: Arc<ServerConfig>,
    pub client: reqwest::Client,
    _server: JoinHandle<()>,
}

pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::with_secret("test-secret", "sqlite::memory:").unwrap();
    config.bcrypt_cost = 4;
    config.scheduler_enabled = false;
    config.api_debug = true;
    config
}

/// In-memory sqlite lives as long as its single connection.
pub async fn test_db() -> DatabaseConnection {
    db::connect_and_migrate("sqlite::memory:", 1)
        .await
        .expect("migrate memory sqlite")
}

pub async fn start_server() -> TestApp {
    let db = test_db().await;
    let config = Arc::new(test_config());
    let app = web::create_axum_router(db.clone(), config.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(
            listener,
            ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
        )
        .await
        .unwrap();
    });

    TestApp {
        base: format!("http://{addr}"),
        db,
        config,
        client: reqwest::Client::new(),
        _server: handle,
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Registers a user and returns the token pair.
    pub async fn register(&self, email: &str) -> Value {
        let res = self
            .client
            .post(self.url("/auth/register"))
            .json(&json!({ "email": email, "password": PASSWORD }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 201, "register {email}");
        res.json().await.unwrap()
    }

    pub async fn access_token(&self, email: &str) -> String {
        let tokens = self.register(email).await;
        tokens["access_token"].as_str().unwrap().to_string()
    }

    pub async fn create_monitor(&self, token: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url("/api/monitors"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }
}
