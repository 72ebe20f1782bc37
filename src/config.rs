use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;
use url::Url;
use crate::error::{AppError, Result};

pub const DEFAULT_BLOG_URL: &str = "https://www.example.com/blog";
pub const DEFAULT_API_URL: &str = "https://www.example.com/wp-json/wp/v2";
pub const DEFAULT_MAX_POSTS: usize = 20;
pub const DEFAULT_CACHE_TTL_HOURS: i64 = 6;

/// Where blog content comes from and how much of it to take.
#[derive(Clone, Debug)]
pub struct SourceConfig {
    /// Blog index page, also the base for resolving relative links.
    pub blog_url: Url,
    /// WordPress REST base, e.g. `https://host/wp-json/wp/v2`.
    pub api_base_url: Url,
    /// Page size for the API and batch cap for scraping.
    pub max_posts: usize,
    pub request_timeout: Duration,
}

impl SourceConfig {
    pub fn new(blog_url: &str, api_base_url: &str) -> Result<Self> {
        Ok(SourceConfig {
            blog_url: Url::parse(blog_url)?,
            api_base_url: Url::parse(api_base_url)?,
            max_posts: DEFAULT_MAX_POSTS,
            request_timeout: Duration::from_secs(10),
        })
    }

    /// Path segment that identifies post links on the blog, e.g. `/blog`.
    pub fn blog_path(&self) -> String {
        let path = self.blog_url.path().trim_end_matches('/');
        if path.is_empty() {
            "/blog".to_string()
        } else {
            path.to_string()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(AppError::ConfigError(format!("Unknown log format: {}", other))),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub server_addr: SocketAddr,
    pub source: SourceConfig,
    pub cache_ttl: chrono::Duration,
    pub admin_token: Option<String>,
    pub log_format: LogFormat,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
        let port = port.parse::<u16>().map_err(|e| AppError::ConfigError(format!("Invalid port: {}", e)))?;
        let ip = IpAddr::from_str(&host).map_err(|e| AppError::ConfigError(format!("Invalid host address: {}", e)))?;

        let server_addr = SocketAddr::new(ip, port);

        let blog_url = env::var("BLOG_URL").unwrap_or_else(|_| DEFAULT_BLOG_URL.to_string());
        let api_url = env::var("BLOG_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let mut source = SourceConfig::new(&blog_url, &api_url)?;
        source.max_posts = parse_var("BLOG_MAX_POSTS", DEFAULT_MAX_POSTS)?;
        if source.max_posts == 0 {
            return Err(AppError::ConfigError("BLOG_MAX_POSTS must be at least 1".to_string()));
        }
        source.request_timeout = Duration::from_secs(parse_var("BLOG_REQUEST_TIMEOUT_SECS", 10u64)?);

        let ttl_hours = parse_var("CACHE_TTL_HOURS", DEFAULT_CACHE_TTL_HOURS)?;
        let cache_ttl = chrono::Duration::try_hours(ttl_hours)
            .filter(|ttl| *ttl > chrono::Duration::zero())
            .ok_or_else(|| AppError::ConfigError(format!("Invalid CACHE_TTL_HOURS: {}", ttl_hours)))?;

        let admin_token = env::var("ADMIN_TOKEN").ok().filter(|token| !token.trim().is_empty());
        let log_format = match env::var("LOG_FORMAT") {
            Ok(value) => value.parse()?,
            Err(_) => LogFormat::Compact,
        };

        Ok(Config {
            server_addr,
            source,
            cache_ttl,
            admin_token,
            log_format,
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| AppError::ConfigError(format!("Invalid {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blog_path_comes_from_blog_url() {
        let source = SourceConfig::new("https://realty.test/blog/", DEFAULT_API_URL).unwrap();
        assert_eq!(source.blog_path(), "/blog");

        let root = SourceConfig::new("https://realty.test/", DEFAULT_API_URL).unwrap();
        assert_eq!(root.blog_path(), "/blog");
    }

    #[test]
    fn log_format_parses_case_insensitively() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!("pretty".parse::<LogFormat>().is_err());
    }
}
