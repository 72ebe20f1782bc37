use std::collections::HashSet;

use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::FetchError;
use crate::models::BlogPost;
use crate::scraper::{extract_slug, html_to_text, DEFAULT_AUTHOR};

const WORDS_PER_MINUTE: usize = 200;

#[derive(Debug, Deserialize)]
pub struct WpPost {
    pub id: u64,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub date_gmt: Option<String>,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub title: Rendered,
    #[serde(default)]
    pub content: Rendered,
    #[serde(default)]
    pub excerpt: Rendered,
    #[serde(rename = "_embedded", default)]
    pub embedded: Embedded,
}

#[derive(Debug, Default, Deserialize)]
pub struct Rendered {
    #[serde(default)]
    pub rendered: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct Embedded {
    #[serde(default)]
    pub author: Vec<WpAuthor>,
    #[serde(rename = "wp:featuredmedia", default)]
    pub featured_media: Vec<WpMedia>,
    /// Taxonomy groups, categories first then tags.
    #[serde(rename = "wp:term", default)]
    pub terms: Vec<Vec<WpTerm>>,
}

#[derive(Debug, Deserialize)]
pub struct WpAuthor {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WpMedia {
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub alt_text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WpTerm {
    pub name: String,
}

/// Fetches the newest `per_page` posts with embedded media, author and terms.
pub async fn fetch_posts(
    client: &Client,
    api_base_url: &Url,
    per_page: usize,
) -> Result<Vec<BlogPost>, FetchError> {
    let endpoint = posts_endpoint(api_base_url)?;
    debug!(%endpoint, per_page, "requesting posts from REST API");

    let response = client
        .get(endpoint)
        .query(&[
            ("_embed", "1".to_string()),
            ("per_page", per_page.to_string()),
            ("orderby", "date".to_string()),
            ("order", "desc".to_string()),
        ])
        .send()
        .await?
        .error_for_status()?;

    let records: Vec<WpPost> = response
        .json()
        .await
        .map_err(|e| FetchError::Decode(e.to_string()))?;

    let posts = collect_posts(records, per_page);
    if posts.is_empty() {
        return Err(FetchError::Empty);
    }
    Ok(posts)
}

/// Maps records in order, keeping the first post per slug, at most `limit`.
pub fn collect_posts(records: Vec<WpPost>, limit: usize) -> Vec<BlogPost> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter_map(map_post)
        .filter(|post| seen.insert(post.slug.clone()))
        .take(limit)
        .collect()
}

fn posts_endpoint(api_base_url: &Url) -> Result<Url, FetchError> {
    let base = api_base_url.as_str().trim_end_matches('/');
    Ok(Url::parse(&format!("{}/posts", base))?)
}

/// Maps a provider record, dropping it when it has no title or slug.
pub fn map_post(record: WpPost) -> Option<BlogPost> {
    let title = html_to_text(&record.title.rendered);
    if title.is_empty() {
        return None;
    }

    let slug = if record.slug.trim().is_empty() {
        if record.link.is_empty() {
            return None;
        }
        extract_slug(&record.link)
    } else {
        record.slug.trim().to_string()
    };

    let date = record
        .date_gmt
        .as_deref()
        .and_then(parse_wp_date)
        .or_else(|| parse_wp_date(&record.date))
        .unwrap_or_else(Utc::now);

    let embedded = record.embedded;
    let author = embedded
        .author
        .first()
        .and_then(|author| author.name.clone())
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_AUTHOR.to_string());

    let media = embedded.featured_media.first();
    let image = media.and_then(|m| m.source_url.clone()).filter(|src| !src.is_empty());
    let image_alt = image.as_ref().map(|_| {
        media
            .and_then(|m| m.alt_text.clone())
            .filter(|alt| !alt.trim().is_empty())
            .unwrap_or_else(|| title.clone())
    });

    let mut groups = embedded.terms.into_iter();
    let categories = term_names(groups.next());
    let tags = term_names(groups.next());

    Some(BlogPost {
        id: record.id.to_string(),
        reading_time: reading_time(&record.content.rendered),
        excerpt: html_to_text(&record.excerpt.rendered),
        content: record.content.rendered,
        title,
        slug,
        date,
        author,
        image,
        image_alt,
        original_url: record.link,
        categories,
        tags,
    })
}

fn term_names(group: Option<Vec<WpTerm>>) -> Vec<String> {
    group
        .unwrap_or_default()
        .into_iter()
        .map(|term| html_to_text(&term.name))
        .collect()
}

/// Minutes to read an HTML body, rounded up. `None` for an empty body.
pub fn reading_time(html: &str) -> Option<u32> {
    let words = html_to_text(html).split_whitespace().count();
    if words == 0 {
        return None;
    }
    Some(words.div_ceil(WORDS_PER_MINUTE) as u32)
}

fn parse_wp_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}
