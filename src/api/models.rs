use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::models::BlogPost;

/// Body of `GET /api/posts`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostsResponse {
    pub posts: Vec<BlogPost>,
    pub count: usize,
    pub served_at: DateTime<Utc>,
}

/// Body of `DELETE /api/cache`.
#[derive(Serialize, Deserialize)]
pub struct ClearResponse {
    pub cleared: bool,
}
