use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// A normalized blog post, whichever strategy produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: String,
    pub title: String,
    pub slug: String,
    /// Raw HTML body. Empty for scraped posts.
    pub content: String,
    pub excerpt: String,
    pub date: DateTime<Utc>,
    pub author: String,
    pub image: Option<String>,
    pub image_alt: Option<String>,
    pub original_url: String,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    /// Minutes, at 200 words per minute.
    pub reading_time: Option<u32>,
}

/// Outcome of a forced refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub success: bool,
    pub posts_found: usize,
    /// Count delta against the previous batch, floored at zero. Not an
    /// identity diff: a 1:1 replacement reports zero.
    pub new_posts: usize,
    pub last_sync: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Read-only view of the cache for the admin status route.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatus {
    pub has_cache: bool,
    pub last_sync: Option<DateTime<Utc>>,
    pub is_expired: bool,
    pub post_count: usize,
    pub sync_in_progress: bool,
}
