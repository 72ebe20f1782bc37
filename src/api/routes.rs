use axum::{
    routing::{delete, get, post},
    Router,
    extract::{Path, State},
    http::{header, HeaderMap},
    response::IntoResponse,
};
use tower_http::cors::{CorsLayer, Any};
use chrono::Utc;
use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::api::models::{ClearResponse, PostsResponse};
use crate::api::response;
use crate::AppState;

pub fn create_router(app_state: AppState) -> Router {
    Router::new()
        .route("/api/posts", get(list_posts_handler))
        .route("/api/posts/:slug", get(post_handler))
        .route("/api/cache", delete(clear_cache_handler))
        .route("/api/cache/status", get(cache_status_handler))
        .route("/api/cache/refresh", post(refresh_cache_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(app_state)
}

async fn list_posts_handler(State(state): State<AppState>) -> impl IntoResponse {
    let posts = state.cache.get_posts_with_cache().await;
    response::success(PostsResponse {
        count: posts.len(),
        posts: posts.to_vec(),
        served_at: Utc::now(),
    })
}

async fn post_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> impl IntoResponse {
    match state.cache.find_post(&slug).await {
        Some(post) => response::success(post),
        None => response::from_error(AppError::NotFound(format!("No post with slug '{}'", slug))),
    }
}

async fn cache_status_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Err(err) = authorize(&state, &headers) {
        return response::from_error(err);
    }
    response::success(state.cache.get_cache_status().await)
}

async fn refresh_cache_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Err(err) = authorize(&state, &headers) {
        return response::from_error(err);
    }

    let start_time = std::time::Instant::now();
    let status = state.cache.refresh_cache().await;
    info!(
        success = status.success,
        posts_found = status.posts_found,
        elapsed = ?start_time.elapsed(),
        "manual cache refresh finished"
    );
    response::success(status)
}

async fn clear_cache_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Err(err) = authorize(&state, &headers) {
        return response::from_error(err);
    }
    state.cache.clear_cache().await;
    response::success(ClearResponse { cleared: true })
}

/// Admin routes are open unless an admin token is configured.
fn authorize(state: &AppState, headers: &HeaderMap) -> Result<()> {
    let Some(expected) = state.config.admin_token.as_deref() else {
        return Ok(());
    };

    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim);

    if provided == Some(expected) {
        Ok(())
    } else {
        warn!("rejected admin request with missing or invalid token");
        Err(AppError::Unauthorized)
    }
}
