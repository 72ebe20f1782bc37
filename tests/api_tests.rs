use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use realty_blog_sync::api::routes::create_router;
use realty_blog_sync::cache::ContentCache;
use realty_blog_sync::config::{Config, LogFormat, SourceConfig, DEFAULT_API_URL, DEFAULT_BLOG_URL};
use realty_blog_sync::error::FetchError;
use realty_blog_sync::fallback::sample_posts;
use realty_blog_sync::{AppState, BlogPost, PostSource};

#[derive(Default)]
struct SampleSource {
    calls: AtomicUsize,
}

#[async_trait]
impl PostSource for SampleSource {
    async fn load_posts(&self) -> Result<Vec<BlogPost>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(sample_posts())
    }
}

fn app(admin_token: Option<&str>) -> (Router, Arc<SampleSource>) {
    let source = Arc::new(SampleSource::default());
    let config = Config {
        server_addr: "127.0.0.1:0".parse().unwrap(),
        source: SourceConfig::new(DEFAULT_BLOG_URL, DEFAULT_API_URL).unwrap(),
        cache_ttl: chrono::Duration::hours(6),
        admin_token: admin_token.map(str::to_string),
        log_format: LogFormat::Compact,
    };
    let cache = ContentCache::new(source.clone(), config.cache_ttl);
    let state = AppState {
        config: Arc::new(config),
        cache: Arc::new(cache),
    };
    (create_router(state), source)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn lists_posts_through_the_cache() {
    let (app, source) = app(None);

    let (status, body) = send(&app, get("/api/posts")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["status"], "success");
    assert_eq!(body["data"]["count"], 5);
    assert_eq!(
        body["data"]["posts"][0]["slug"],
        "las-vegas-real-estate-market-update-january-2025"
    );
    assert!(body["data"]["posts"][0]["originalUrl"].is_string());

    send(&app, get("/api/posts")).await;
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn single_post_lookup() {
    let (app, _) = app(None);

    let (status, body) = send(&app, get("/api/posts/selling-your-home-in-henderson")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Selling Your Home in Henderson: What to Expect");

    let (status, body) = send(&app, get("/api/posts/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["data"].is_null());
    assert_eq!(body["meta"]["status_code"], 404);
}

#[tokio::test]
async fn admin_routes_manage_the_cache() {
    let (app, source) = app(None);

    let refresh = Request::builder()
        .method(Method::POST)
        .uri("/api/cache/refresh")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, refresh).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["success"], true);
    assert_eq!(body["data"]["postsFound"], 5);
    assert_eq!(body["data"]["newPosts"], 5);
    assert!(body["data"]["lastSync"].is_string());

    let (_, body) = send(&app, get("/api/cache/status")).await;
    assert_eq!(body["data"]["hasCache"], true);
    assert_eq!(body["data"]["postCount"], 5);

    let clear = Request::builder()
        .method(Method::DELETE)
        .uri("/api/cache")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, clear).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, get("/api/cache/status")).await;
    assert_eq!(body["data"]["hasCache"], false);
    assert!(body["data"]["lastSync"].is_null());
    assert_eq!(body["data"]["postCount"], 0);
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn admin_token_is_enforced() {
    let (app, source) = app(Some("s3cret"));

    let (status, body) = send(&app, get("/api/cache/status")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["meta"]["status"], "error");

    let wrong = Request::builder()
        .method(Method::POST)
        .uri("/api/cache/refresh")
        .header(header::AUTHORIZATION, "Bearer nope")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, wrong).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(source.calls.load(Ordering::SeqCst), 0);

    let right = Request::builder()
        .method(Method::POST)
        .uri("/api/cache/refresh")
        .header(header::AUTHORIZATION, "Bearer s3cret")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, right).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["success"], true);

    // Public routes stay open.
    let (status, _) = send(&app, get("/api/posts")).await;
    assert_eq!(status, StatusCode::OK);
}
