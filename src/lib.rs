pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod fallback;
pub mod fetcher;
pub mod models;
pub mod scraper;
pub mod telemetry;
pub mod wordpress;

use std::sync::Arc;
use config::Config;
use cache::ContentCache;

pub use fetcher::{BlogFetcher, PostSource};
pub use models::{BlogPost, CacheStatus, SyncStatus};

/// Application state that will be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub cache: Arc<ContentCache>,
}
