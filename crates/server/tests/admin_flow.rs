use std::{io::Cursor, sync::Arc};

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use configs::AppConfig;
use server::{routes::{self, RouterOptions}, startup::build_application};
use service::{auth::service::hash_password, storage::MemoryObjectStorage};

const PASSWORD: &str = "S3curePass!";

struct TestApp {
    router: Router,
    storage: Arc<MemoryObjectStorage>,
}

async fn build_app() -> anyhow::Result<TestApp> {
    let db = models::db::connect_in_memory().await?;
    let mut cfg = AppConfig::default();
    cfg.auth.jwt_secret = "integration-test-secret".into();
    cfg.auth.admin_password_hash = hash_password(PASSWORD)?;
    let storage = Arc::new(MemoryObjectStorage::new());
    let app = build_application(&cfg, db, storage.clone());
    let router = routes::build_router(
        app.state,
        RouterOptions {
            cors: tower_http::cors::CorsLayer::very_permissive(),
            media_dir: None,
            max_upload_bytes: cfg.media.max_upload_bytes,
        },
    );
    Ok(TestApp { router, storage })
}

async fn send(app: &Router, req: Request<Body>) -> anyhow::Result<(StatusCode, Value)> {
    let resp = app.clone().oneshot(req).await?;
    let status = resp.status();
    let bytes = resp.into_body().collect().await?.to_bytes();
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
    Ok((status, body))
}

fn json_req(method: &str, uri: &str, token: Option<&str>, body: Value) -> anyhow::Result<Request<Body>> {
    let mut b = Request::builder().method(method).uri(uri).header(header::CONTENT_TYPE, "application/json");
    if let Some(t) = token {
        b = b.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    Ok(b.body(Body::from(serde_json::to_vec(&body)?))?)
}

fn get(uri: &str) -> anyhow::Result<Request<Body>> {
    Ok(Request::builder().uri(uri).body(Body::empty())?)
}

async fn login(app: &Router) -> anyhow::Result<String> {
    let (status, body) = send(app, json_req("POST", "/auth/login", None, json!({"password": PASSWORD}))?).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(body["token"].as_str().unwrap_or_default().to_string())
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 30, 30]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).expect("png");
    buf.into_inner()
}

#[tokio::test]
async fn health_is_public() -> anyhow::Result<()> {
    let app = build_app().await?;
    let (status, body) = send(&app.router, get("/health")?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
    Ok(())
}

#[tokio::test]
async fn admin_routes_require_a_valid_token() -> anyhow::Result<()> {
    let app = build_app().await?;
    let body = json!({"question": "Q", "answer": "A"});

    let (status, err) = send(&app.router, json_req("POST", "/admin/content/faqs", None, body.clone())?).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(err, json!({"error": "unauthorized"}));

    let (status, _) = send(&app.router, json_req("POST", "/admin/content/faqs", Some("not-a-jwt"), body)?).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app.router, json_req("POST", "/auth/login", None, json!({"password": "wrong-password"}))?).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn login_sets_cookie_that_authorizes() -> anyhow::Result<()> {
    let app = build_app().await?;
    let resp = app.router.clone().oneshot(json_req("POST", "/auth/login", None, json!({"password": PASSWORD}))?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let set_cookie = resp.headers().get(header::SET_COOKIE).and_then(|v| v.to_str().ok()).unwrap_or_default().to_string();
    assert!(set_cookie.starts_with("auth_token=") && set_cookie.contains("HttpOnly"));
    let pair = set_cookie.split(';').next().unwrap_or_default().to_string();

    let req = Request::builder()
        .method("POST")
        .uri("/admin/content/settings")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, pair)
        .body(Body::from(serde_json::to_vec(&json!({"key": "site.phone", "value": "555"}))?))?;
    let (status, _) = send(&app.router, req).await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, map) = send(&app.router, get("/api/settings/map")?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(map, json!({"site.phone": "555"}));
    Ok(())
}

#[tokio::test]
async fn faq_crud_and_reorder_over_http() -> anyhow::Result<()> {
    let app = build_app().await?;
    let token = login(&app.router).await?;
    let t = Some(token.as_str());

    let (status, q1) = send(&app.router, json_req("POST", "/admin/content/faqs", t, json!({"question": "Q1", "answer": "A1", "order": 0}))?).await?;
    assert_eq!(status, StatusCode::CREATED);
    let (_, q2) = send(&app.router, json_req("POST", "/admin/content/faqs", t, json!({"question": "Q2", "answer": "A2"}))?).await?;
    assert_eq!(q2["order"], 1);

    let id1 = q1["id"].as_str().unwrap_or_default().to_string();
    let id2 = q2["id"].as_str().unwrap_or_default().to_string();
    let (status, fetched) = send(&app.router, get(&format!("/api/faqs/{id1}"))?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["data"]["question"], "Q1");

    let batch = json!({"items": [{"id": id1, "order": 1}, {"id": id2, "order": 0}]});
    let (status, _) = send(&app.router, json_req("POST", "/admin/content/faqs/reorder", t, batch)?).await?;
    assert_eq!(status, StatusCode::OK);

    let (_, list) = send(&app.router, get("/api/faqs")?).await?;
    let order: Vec<&str> = list["items"].as_array().map(|a| a.iter().filter_map(|e| e["data"]["question"].as_str()).collect()).unwrap_or_default();
    assert_eq!(order, vec!["Q2", "Q1"]);

    let (status, patched) = send(&app.router, json_req("PATCH", &format!("/admin/content/faqs/{id1}"), t, json!({"answer": "A1b"}))?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["data"]["question"], "Q1");
    assert_eq!(patched["data"]["answer"], "A1b");

    let del = Request::builder()
        .method("DELETE")
        .uri(format!("/admin/content/faqs/{id1}"))
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())?;
    let (status, outcome) = send(&app.router, del).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["deleted"], 1);

    let (status, _) = send(&app.router, get(&format!("/api/faqs/{id1}"))?).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn errors_use_the_error_body() -> anyhow::Result<()> {
    let app = build_app().await?;
    let token = login(&app.router).await?;
    let t = Some(token.as_str());

    let (status, body) = send(
        &app.router,
        json_req("POST", "/admin/content/testimonials", t, json!({"author": "Ann", "quote": "Great", "rating": 5, "satisfaction": 150}))?,
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "satisfaction must be between 0 and 100"}));

    let (status, _) = send(&app.router, get("/api/blog-posts")?).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app.router, get("/api/faqs/not-an-id")?).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let svc = json!({"title": "Windows", "slug": "windows", "summary": "Streak free"});
    send(&app.router, json_req("POST", "/admin/content/services", t, svc.clone())?).await?;
    let (status, _) = send(&app.router, json_req("POST", "/admin/content/services", t, svc)?).await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let bad_batch = json!({"items": [{"id": "nope", "order": 0}]});
    let (status, _) = send(&app.router, json_req("POST", "/admin/content/faqs/reorder", t, bad_batch)?).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn upload_attach_and_release_media() -> anyhow::Result<()> {
    let app = build_app().await?;
    let token = login(&app.router).await?;
    let t = Some(token.as_str());

    let upload = Request::builder()
        .method("POST")
        .uri("/admin/media")
        .header(header::CONTENT_TYPE, "image/png")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(png(64, 32)))?;
    let (status, asset) = send(&app.router, upload).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(asset["status"], "staging");
    let asset_id = asset["id"].as_str().unwrap_or_default().to_string();
    let key = asset["storageKey"].as_str().unwrap_or_default().to_string();
    assert!(app.storage.contains(&key));

    let rejected = Request::builder()
        .method("POST")
        .uri("/admin/media")
        .header(header::CONTENT_TYPE, "text/plain")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from("hello"))?;
    let (status, _) = send(&app.router, rejected).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, confirmed) = send(&app.router, json_req("POST", "/admin/media/confirm", t, json!({"ids": [asset_id]}))?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(confirmed["confirmed"], 1);
    let (_, again) = send(&app.router, json_req("POST", "/admin/media/confirm", t, json!({"ids": [asset_id]}))?).await?;
    assert_eq!(again["confirmed"], 0);

    let (_, album) = send(&app.router, json_req("POST", "/admin/content/gallery-albums", t, json!({"title": "Jobs", "slug": "jobs"}))?).await?;
    let image = json!({"alt": "Porch", "parentId": album["id"], "mediaAssetId": asset_id});
    let (status, _) = send(&app.router, json_req("POST", "/admin/content/gallery-images", t, image)?).await?;
    assert_eq!(status, StatusCode::CREATED);

    let delete_asset = |tok: &str| {
        Request::builder()
            .method("DELETE")
            .uri(format!("/admin/media/{asset_id}"))
            .header(header::AUTHORIZATION, format!("Bearer {tok}"))
            .body(Body::empty())
    };
    let (status, _) = send(&app.router, delete_asset(&token)?).await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let album_id = album["id"].as_str().unwrap_or_default().to_string();
    let del_album = Request::builder()
        .method("DELETE")
        .uri(format!("/admin/content/gallery-albums/{album_id}"))
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())?;
    let (status, outcome) = send(&app.router, del_album).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome, json!({"deleted": 2, "releasedMedia": 1}));
    assert!(!app.storage.contains(&key));
    Ok(())
}

#[tokio::test]
async fn menu_tree_and_openapi_are_public() -> anyhow::Result<()> {
    let app = build_app().await?;
    let token = login(&app.router).await?;
    let t = Some(token.as_str());

    let (_, root) = send(&app.router, json_req("POST", "/admin/content/menu-items", t, json!({"label": "Services", "path": "/services"}))?).await?;
    send(&app.router, json_req("POST", "/admin/content/menu-items", t, json!({"label": "Gutters", "path": "/services/gutters", "parentId": root["id"]}))?).await?;

    let (status, tree) = send(&app.router, get("/api/menu-items/tree")?).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tree[0]["data"]["label"], "Services");
    assert_eq!(tree[0]["children"][0]["data"]["label"], "Gutters");

    let (status, doc) = send(&app.router, get("/api-docs/openapi.json")?).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"].get("/admin/content/{kind}/reorder").is_some());
    Ok(())
}
