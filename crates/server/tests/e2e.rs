use std::sync::Arc;

use serde_json::{json, Value};

use configs::AppConfig;
use server::{routes::{self, RouterOptions}, startup::build_application};
use service::{auth::service::hash_password, storage::MemoryObjectStorage};

/// Serve the app on an ephemeral port and return its base URL.
async fn spawn_server() -> anyhow::Result<String> {
    let db = models::db::connect_in_memory().await?;
    let mut cfg = AppConfig::default();
    cfg.auth.jwt_secret = "e2e-secret-0123456789".into();
    cfg.auth.admin_password_hash = hash_password("e2e-password")?;
    let app = build_application(&cfg, db, Arc::new(MemoryObjectStorage::new()));
    let router = routes::build_router(
        app.state,
        RouterOptions {
            cors: tower_http::cors::CorsLayer::very_permissive(),
            media_dir: None,
            max_upload_bytes: cfg.media.max_upload_bytes,
        },
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(format!("http://{addr}"))
}

#[tokio::test]
async fn e2e_login_then_publish_service() -> anyhow::Result<()> {
    let base = spawn_server().await?;
    let client = reqwest::Client::new();

    let health: Value = client.get(format!("{base}/health")).send().await?.json().await?;
    assert_eq!(health["status"], "ok");

    let resp = client.post(format!("{base}/admin/content/services")).json(&json!({})).send().await?;
    assert_eq!(resp.status().as_u16(), 401);

    let login: Value = client
        .post(format!("{base}/auth/login"))
        .json(&json!({"password": "e2e-password"}))
        .send()
        .await?
        .json()
        .await?;
    let token = login["token"].as_str().unwrap_or_default().to_string();
    assert!(!token.is_empty());

    let resp = client
        .post(format!("{base}/admin/content/services"))
        .bearer_auth(&token)
        .json(&json!({"title": "Pressure washing", "slug": "pressure-washing", "summary": "Driveways and decks", "priceFrom": 99.0}))
        .send()
        .await?;
    assert_eq!(resp.status().as_u16(), 201);

    let list: Value = client.get(format!("{base}/api/services")).send().await?.json().await?;
    assert_eq!(list["total"], 1);
    assert_eq!(list["items"][0]["data"]["slug"], "pressure-washing");
    assert_eq!(list["items"][0]["data"]["published"], true);
    Ok(())
}
