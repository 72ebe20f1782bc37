use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::DEFAULT_CACHE_TTL_HOURS;
use crate::fetcher::PostSource;
use crate::models::{BlogPost, CacheStatus, SyncStatus};

pub type PostBatch = Arc<Vec<BlogPost>>;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Default)]
struct CacheState {
    posts: PostBatch,
    last_sync: Option<DateTime<Utc>>,
}

/// In-memory post cache with a fixed TTL and at most one fetch in flight.
///
/// The stored batch is swapped as a whole, so readers see either the old
/// batch or the new one.
pub struct ContentCache {
    source: Arc<dyn PostSource>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    state: RwLock<CacheState>,
    sync_in_progress: AtomicBool,
}

/// Clears the in-flight flag when dropped.
struct SyncGuard<'a>(&'a AtomicBool);

impl<'a> SyncGuard<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SyncGuard(flag))
    }
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ContentCache {
    pub fn new(source: Arc<dyn PostSource>, ttl: Duration) -> Self {
        ContentCache {
            source,
            ttl,
            clock: Arc::new(SystemClock),
            state: RwLock::new(CacheState::default()),
            sync_in_progress: AtomicBool::new(false),
        }
    }

    pub fn with_default_ttl(source: Arc<dyn PostSource>) -> Self {
        Self::new(source, Duration::hours(DEFAULT_CACHE_TTL_HOURS))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_expired(&self, last_sync: Option<DateTime<Utc>>) -> bool {
        match last_sync {
            Some(at) => self.clock.now() - at >= self.ttl,
            None => true,
        }
    }

    async fn fresh_posts(&self) -> Option<PostBatch> {
        let state = self.state.read().await;
        if state.posts.is_empty() || self.is_expired(state.last_sync) {
            None
        } else {
            Some(state.posts.clone())
        }
    }

    async fn snapshot(&self) -> PostBatch {
        self.state.read().await.posts.clone()
    }

    async fn store(&self, posts: Vec<BlogPost>) -> (PostBatch, usize, DateTime<Utc>) {
        let batch = Arc::new(posts);
        let now = self.clock.now();
        let mut state = self.state.write().await;
        let previous = state.posts.len();
        state.posts = batch.clone();
        state.last_sync = Some(now);
        (batch, previous, now)
    }

    /// Stored batch if still fresh, otherwise empty. Never fetches.
    pub async fn get_cached_posts(&self) -> PostBatch {
        self.fresh_posts().await.unwrap_or_default()
    }

    /// Primary read path.
    ///
    /// Serves the cached batch while fresh. On a miss, fetches and stores a
    /// new batch unless another caller is already doing so, in which case
    /// the current (possibly stale or empty) batch is returned. A failing
    /// source leaves the stored batch in place and it is returned instead.
    pub async fn get_posts_with_cache(&self) -> PostBatch {
        if let Some(posts) = self.fresh_posts().await {
            debug!(count = posts.len(), "serving posts from cache");
            return posts;
        }

        let Some(_guard) = SyncGuard::try_acquire(&self.sync_in_progress) else {
            debug!("sync already in progress, serving current snapshot");
            return self.snapshot().await;
        };

        // Another caller may have finished a sync between the check and the guard.
        if let Some(posts) = self.fresh_posts().await {
            return posts;
        }

        match self.source.load_posts().await {
            Ok(posts) => {
                let (batch, _, _) = self.store(posts).await;
                info!(count = batch.len(), "post cache populated");
                batch
            }
            Err(err) => {
                warn!(error = %err, "post sync failed, serving stale cache");
                self.snapshot().await
            }
        }
    }

    /// Cache-backed lookup of a single post.
    pub async fn find_post(&self, slug: &str) -> Option<BlogPost> {
        self.get_posts_with_cache()
            .await
            .iter()
            .find(|post| post.slug == slug)
            .cloned()
    }

    /// Fetches regardless of freshness and replaces the stored batch.
    ///
    /// Failures are reported in the returned status and leave the cache
    /// untouched.
    pub async fn refresh_cache(&self) -> SyncStatus {
        // Hold the flag if it is free so readers do not start their own sync.
        let _guard = SyncGuard::try_acquire(&self.sync_in_progress);

        match self.source.load_posts().await {
            Ok(posts) => {
                let (batch, previous, now) = self.store(posts).await;
                let new_posts = batch.len().saturating_sub(previous);
                info!(count = batch.len(), new_posts, "post cache refreshed");
                SyncStatus {
                    success: true,
                    posts_found: batch.len(),
                    new_posts,
                    last_sync: Some(now),
                    error: None,
                }
            }
            Err(err) => {
                warn!(error = %err, "forced refresh failed");
                SyncStatus {
                    success: false,
                    posts_found: 0,
                    new_posts: 0,
                    last_sync: self.state.read().await.last_sync,
                    error: Some(err.to_string()),
                }
            }
        }
    }

    pub async fn get_cache_status(&self) -> CacheStatus {
        let state = self.state.read().await;
        CacheStatus {
            has_cache: !state.posts.is_empty(),
            last_sync: state.last_sync,
            is_expired: self.is_expired(state.last_sync),
            post_count: state.posts.len(),
            sync_in_progress: self.sync_in_progress.load(Ordering::Acquire),
        }
    }

    pub async fn clear_cache(&self) {
        let mut state = self.state.write().await;
        *state = CacheState::default();
        info!("post cache cleared");
    }
}
