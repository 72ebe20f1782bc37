use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tracing::{info, warn};

use crate::config::SourceConfig;
use crate::error::{FetchError, Result};
use crate::fallback::sample_posts;
use crate::models::BlogPost;
use crate::{scraper, wordpress};

/// Anything that can produce a post batch. The cache only sees this seam.
#[async_trait]
pub trait PostSource: Send + Sync {
    async fn load_posts(&self) -> std::result::Result<Vec<BlogPost>, FetchError>;
}

/// Mirrors the external blog: REST API first, then the blog index HTML,
/// then the built-in sample posts.
pub struct BlogFetcher {
    client: Client,
    source: SourceConfig,
}

impl BlogFetcher {
    pub fn new(source: SourceConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(source.request_timeout)
            .connect_timeout(Duration::from_secs(5))
            .pool_max_idle_per_host(10)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(BlogFetcher { client, source })
    }

    /// Best-effort batch. Never empty and never an error.
    pub async fn fetch_posts(&self) -> Vec<BlogPost> {
        match self.fetch_from_api().await {
            Ok(posts) => {
                info!(count = posts.len(), "loaded posts from REST API");
                return posts;
            }
            Err(err) => warn!(error = %err, "REST API unavailable, falling back to scraping"),
        }

        match self.scrape_blog_index().await {
            Ok(posts) => {
                info!(count = posts.len(), "scraped posts from blog index");
                return posts;
            }
            Err(err) => warn!(error = %err, "scraping failed, serving sample posts"),
        }

        sample_posts()
    }

    /// Runs a full batch fetch and picks the post with `slug`.
    pub async fn fetch_post(&self, slug: &str) -> Option<BlogPost> {
        self.fetch_posts()
            .await
            .into_iter()
            .find(|post| post.slug == slug)
    }

    async fn fetch_from_api(&self) -> std::result::Result<Vec<BlogPost>, FetchError> {
        wordpress::fetch_posts(&self.client, &self.source.api_base_url, self.source.max_posts).await
    }

    async fn scrape_blog_index(&self) -> std::result::Result<Vec<BlogPost>, FetchError> {
        let html = self.fetch_html().await?;
        scraper::parse_blog_index(
            &html,
            &self.source.blog_url,
            &self.source.blog_path(),
            self.source.max_posts,
        )
    }

    async fn fetch_html(&self) -> std::result::Result<String, FetchError> {
        let response = self
            .client
            .get(self.source.blog_url.clone())
            .send()
            .await?
            .error_for_status()?;
        let html = response.text().await?;
        Ok(html)
    }
}

#[async_trait]
impl PostSource for BlogFetcher {
    async fn load_posts(&self) -> std::result::Result<Vec<BlogPost>, FetchError> {
        Ok(self.fetch_posts().await)
    }
}
