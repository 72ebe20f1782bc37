use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use realty_blog_sync::{
    config::Config,
    api::routes::create_router,
    cache::ContentCache,
    fetcher::BlogFetcher,
    telemetry,
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;
    telemetry::init(config.log_format)?;

    let server_addr = config.server_addr;
    info!(blog = %config.source.blog_url, api = %config.source.api_base_url, "starting blog sync service");

    let fetcher = BlogFetcher::new(config.source.clone())?;
    let cache = Arc::new(ContentCache::new(Arc::new(fetcher), config.cache_ttl));

    // Warm the cache without holding up the listener
    let warm_cache = cache.clone();
    tokio::spawn(async move {
        let posts = warm_cache.get_posts_with_cache().await;
        info!(count = posts.len(), "post cache warmed");
    });

    let app_state = AppState {
        config: Arc::new(config),
        cache,
    };

    let app = create_router(app_state);
    let listener = TcpListener::bind(server_addr).await?;

    info!(%server_addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
