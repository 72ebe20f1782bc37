use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use crate::error::FetchError;
use crate::models::BlogPost;

pub const DEFAULT_AUTHOR: &str = "Real Estate Team";
pub const DEFAULT_IMAGE_PATH: &str = "/images/blog-placeholder.jpg";
pub const SLUG_PLACEHOLDER: &str = "untitled";
const MAX_EXCERPT_CHARS: usize = 200;

// Candidate post-card selectors, most specific first. The first one that
// matches anything wins.
static POST_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "article.post",
        ".blog-post",
        ".post-item",
        ".entry",
        "article",
        ".post",
        ".card",
    ]
    .iter()
    .map(|css| Selector::parse(css).expect("Failed to parse post selector"))
    .collect()
});

static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("h1, h2, h3, h4, .title, .entry-title").expect("Failed to parse title selector")
});

static LINK_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("a[href]").expect("Failed to parse link selector")
});

static DATE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".date, time, .published, .post-date, .entry-date").expect("Failed to parse date selector")
});

static EXCERPT_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".excerpt, .entry-summary, .summary, p").expect("Failed to parse excerpt selector")
});

static IMAGE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("img").expect("Failed to parse image selector")
});

const IMAGE_ATTRS: [&str; 4] = ["src", "data-src", "data-lazy-src", "data-original"];

/// Parses the blog index page into posts.
///
/// Tries each post-card selector in order and keeps the first one that
/// matches at least one element. When none match, every anchor pointing
/// under `blog_path` becomes a minimal post. Cards without a title or link
/// are skipped. Fails with [`FetchError::Empty`] when nothing usable is left.
pub fn parse_blog_index(
    html: &str,
    base_url: &Url,
    blog_path: &str,
    limit: usize,
) -> Result<Vec<BlogPost>, FetchError> {
    let document = Html::parse_document(html);

    let cards = POST_SELECTORS.iter().find_map(|selector| {
        let matched: Vec<ElementRef> = document.select(selector).collect();
        (!matched.is_empty()).then_some(matched)
    });

    let mut seen = HashSet::new();
    let posts: Vec<BlogPost> = match cards {
        Some(cards) => {
            debug!(cards = cards.len(), "matched post cards");
            cards
                .into_iter()
                .enumerate()
                .filter_map(|(index, card)| parse_card(card, index, base_url))
                .filter(|post| seen.insert(post.slug.clone()))
                .take(limit)
                .collect()
        }
        None => {
            debug!("no post cards matched, collecting blog links");
            collect_blog_links(&document, base_url, blog_path)
                .into_iter()
                .filter(|post| seen.insert(post.slug.clone()))
                .take(limit)
                .collect()
        }
    };

    if posts.is_empty() {
        return Err(FetchError::Empty);
    }
    Ok(posts)
}

fn parse_card(card: ElementRef, index: usize, base_url: &Url) -> Option<BlogPost> {
    let title = card
        .select(&TITLE_SELECTOR)
        .map(element_text)
        .find(|text| !text.is_empty())
        .or_else(|| card.select(&LINK_SELECTOR).map(element_text).find(|text| !text.is_empty()))?;

    let href = card.select(&LINK_SELECTOR).next()?.value().attr("href")?;
    let original_url = base_url.join(href.trim()).ok()?;
    let slug = extract_slug(original_url.as_str());

    let date = card
        .select(&DATE_SELECTOR)
        .next()
        .and_then(|el| {
            el.value()
                .attr("datetime")
                .and_then(parse_date)
                .or_else(|| parse_date(&element_text(el)))
        })
        .unwrap_or_else(Utc::now);

    let excerpt = card
        .select(&EXCERPT_SELECTOR)
        .map(element_text)
        .find(|text| !text.is_empty() && *text != title)
        .map(|text| truncate_excerpt(&text))
        .unwrap_or_default();

    let (image, image_alt) = find_image(card, base_url);

    Some(BlogPost {
        id: format!("scraped-{}", index + 1),
        image_alt: Some(image_alt.unwrap_or_else(|| title.clone())),
        title,
        slug,
        content: String::new(),
        excerpt,
        date,
        author: DEFAULT_AUTHOR.to_string(),
        image: Some(image),
        original_url: original_url.to_string(),
        categories: Vec::new(),
        tags: Vec::new(),
        reading_time: None,
    })
}

// Card image first, then anything in the enclosing container, then the
// placeholder.
fn find_image(card: ElementRef, base_url: &Url) -> (String, Option<String>) {
    let in_card = card.select(&IMAGE_SELECTOR).find_map(image_source);
    let found = in_card.or_else(|| {
        card.parent()
            .and_then(ElementRef::wrap)
            .and_then(|parent| parent.select(&IMAGE_SELECTOR).find_map(image_source))
    });

    match found {
        Some((src, alt)) => {
            let resolved = base_url
                .join(&src)
                .map(|url| url.to_string())
                .unwrap_or(src);
            (resolved, alt)
        }
        None => (default_image(base_url), None),
    }
}

fn image_source(img: ElementRef) -> Option<(String, Option<String>)> {
    let element = img.value();
    let src = IMAGE_ATTRS
        .iter()
        .filter_map(|attr| element.attr(attr))
        .map(str::trim)
        .find(|value| !value.is_empty() && !value.starts_with("data:"))?;
    let alt = element
        .attr("alt")
        .map(str::trim)
        .filter(|alt| !alt.is_empty())
        .map(str::to_string);
    Some((src.to_string(), alt))
}

fn default_image(base_url: &Url) -> String {
    base_url
        .join(DEFAULT_IMAGE_PATH)
        .map(|url| url.to_string())
        .unwrap_or_else(|_| DEFAULT_IMAGE_PATH.to_string())
}

fn collect_blog_links(document: &Html, base_url: &Url, blog_path: &str) -> Vec<BlogPost> {
    let index = base_url.as_str().trim_end_matches('/');

    document
        .select(&LINK_SELECTOR)
        .enumerate()
        .filter_map(|(position, anchor)| {
            let href = anchor.value().attr("href")?;
            if !href.contains(blog_path) {
                return None;
            }
            let title = element_text(anchor);
            if title.is_empty() {
                return None;
            }
            let url = base_url.join(href.trim()).ok()?;
            if url.as_str().trim_end_matches('/') == index {
                return None;
            }

            Some(BlogPost {
                id: format!("link-{}", position + 1),
                image_alt: Some(title.clone()),
                excerpt: title.clone(),
                title,
                slug: extract_slug(url.as_str()),
                content: String::new(),
                date: Utc::now(),
                author: DEFAULT_AUTHOR.to_string(),
                image: Some(default_image(base_url)),
                original_url: url.to_string(),
                categories: Vec::new(),
                tags: Vec::new(),
                reading_time: None,
            })
        })
        .collect()
}

/// Last non-empty path segment of an absolute or relative URL, or
/// [`SLUG_PLACEHOLDER`] when the path has none.
pub fn extract_slug(url: &str) -> String {
    static RELATIVE_BASE: Lazy<Url> = Lazy::new(|| {
        Url::parse("http://localhost/").expect("Failed to parse relative base")
    });

    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => RELATIVE_BASE
            .join(url)
            .map(|parsed| parsed.path().to_string())
            .unwrap_or_default(),
    };

    path.split('/')
        .filter(|segment| !segment.is_empty())
        .last()
        .map(str::to_string)
        .unwrap_or_else(|| SLUG_PLACEHOLDER.to_string())
}

/// Plain text of an HTML fragment: tags dropped, entities decoded,
/// whitespace collapsed.
pub fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text: String = fragment.root_element().text().collect();
    collapse_whitespace(&text)
}

fn element_text(element: ElementRef) -> String {
    let text: String = element.text().collect();
    collapse_whitespace(&text)
}

fn collapse_whitespace(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !result.is_empty() {
            result.push(' ');
        }
        result.push_str(word);
    }
    result
}

fn truncate_excerpt(text: &str) -> String {
    match text.char_indices().nth(MAX_EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", text[..cut].trim_end()),
        None => text.to_string(),
    }
}

fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    ["%Y-%m-%d", "%B %d, %Y", "%b %d, %Y", "%d %B %Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn base() -> Url {
        Url::parse("https://realty.test/blog").unwrap()
    }

    #[test]
    fn slug_is_last_path_segment() {
        assert_eq!(extract_slug("https://example.com/blog/my-post/"), "my-post");
        assert_eq!(extract_slug("/blog/relative-post"), "relative-post");
        assert_eq!(extract_slug("https://example.com/blog/a-post?ref=nav"), "a-post");
    }

    #[test]
    fn slug_defaults_without_path_segments() {
        assert_eq!(extract_slug("https://example.com"), SLUG_PLACEHOLDER);
        assert_eq!(extract_slug("https://example.com/"), SLUG_PLACEHOLDER);
        assert_eq!(extract_slug(""), SLUG_PLACEHOLDER);
    }

    #[test]
    fn html_to_text_strips_tags_and_decodes_entities() {
        let text = html_to_text("<p>Buying in <strong>Summerlin</strong> &amp; Henderson [&hellip;]</p>\n");
        assert_eq!(text, "Buying in Summerlin & Henderson […]");
    }

    #[test]
    fn first_matching_selector_wins() {
        let html = r#"
            <html><body>
              <article class="post">
                <h2>Staging Tips</h2>
                <a href="/blog/staging-tips/">Read more</a>
                <time datetime="2025-02-03T10:00:00Z">Feb 3</time>
                <p>Make buyers feel at home.</p>
                <img data-src="/uploads/staging.jpg" alt="Living room">
              </article>
              <div class="card"><h3>Ignored</h3><a href="/blog/ignored">x</a></div>
            </body></html>"#;

        let posts = parse_blog_index(html, &base(), "/blog", 10).unwrap();
        assert_eq!(posts.len(), 1);
        let post = &posts[0];
        assert_eq!(post.title, "Staging Tips");
        assert_eq!(post.slug, "staging-tips");
        assert_eq!(post.original_url, "https://realty.test/blog/staging-tips/");
        assert_eq!(post.excerpt, "Make buyers feel at home.");
        assert_eq!(post.image.as_deref(), Some("https://realty.test/uploads/staging.jpg"));
        assert_eq!(post.image_alt.as_deref(), Some("Living room"));
        assert_eq!(post.date.month(), 2);
        assert!(post.content.is_empty());
    }

    #[test]
    fn cards_without_links_are_dropped() {
        let html = r#"
            <div class="blog-post"><h2>No link here</h2></div>
            <div class="blog-post"><a href="https://realty.test/blog/kept">Kept Post</a>
              <span class="date">January 5, 2025</span></div>"#;

        let posts = parse_blog_index(html, &base(), "/blog", 10).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "Kept Post");
        assert_eq!(posts[0].date.day(), 5);
    }

    #[test]
    fn image_falls_back_to_parent_then_placeholder() {
        let html = r#"
            <div class="wrap"><img src="hero.jpg">
              <div class="post-item"><h3>With Parent Image</h3><a href="/blog/one">one</a></div>
            </div>
            <section>
              <div class="post-item"><h3>No Image</h3><a href="/blog/two">two</a></div>
            </section>"#;

        let posts = parse_blog_index(html, &base(), "/blog", 10).unwrap();
        assert_eq!(posts[0].image.as_deref(), Some("https://realty.test/hero.jpg"));
        assert_eq!(
            posts[1].image.as_deref(),
            Some("https://realty.test/images/blog-placeholder.jpg")
        );
    }

    #[test]
    fn blog_links_used_when_no_cards_match() {
        let html = r#"
            <nav><a href="/blog">Blog</a><a href="/contact">Contact</a></nav>
            <ul>
              <li><a href="/blog/henderson-guide">Henderson Guide</a></li>
              <li><a href="/blog/henderson-guide">Henderson Guide</a></li>
              <li><a href="/blog/first-time-buyers"></a></li>
              <li><a href="/blog/open-house-checklist/">Open House Checklist</a></li>
            </ul>"#;

        let posts = parse_blog_index(html, &base(), "/blog", 10).unwrap();
        let slugs: Vec<&str> = posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["henderson-guide", "open-house-checklist"]);
        assert_eq!(posts[0].title, "Henderson Guide");
        assert_eq!(posts[0].excerpt, "Henderson Guide");
    }

    #[test]
    fn results_are_capped() {
        let cards: String = (0..8)
            .map(|i| format!(r#"<article><h2>Post {i}</h2><a href="/blog/post-{i}">go</a></article>"#))
            .collect();
        let posts = parse_blog_index(&cards, &base(), "/blog", 3).unwrap();
        assert_eq!(posts.len(), 3);
    }

    #[test]
    fn empty_page_is_an_error() {
        let result = parse_blog_index("<html><body><p>Nothing</p></body></html>", &base(), "/blog", 10);
        assert!(matches!(result, Err(FetchError::Empty)));
    }

    #[test]
    fn long_excerpts_are_truncated() {
        let long = "word ".repeat(100);
        let excerpt = truncate_excerpt(long.trim());
        assert!(excerpt.ends_with("..."));
        assert!(excerpt.chars().count() <= MAX_EXCERPT_CHARS + 3);
    }

    #[test]
    fn dates_in_common_formats_parse() {
        assert!(parse_date("2025-01-15").is_some());
        assert!(parse_date("March 3, 2025").is_some());
        assert!(parse_date("Mar 3, 2025").is_some());
        assert!(parse_date("2025-01-15T08:30:00-08:00").is_some());
        assert!(parse_date("yesterday").is_none());
    }
}
