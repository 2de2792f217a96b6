use crate::url::ScopePolicy;
use serde::Deserialize;

/// Main configuration structure for Scope-Crawl
///
/// Every section and key is optional in the TOML file; missing values fall
/// back to the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Maximum number of fetches holding a connection at once
    pub max_concurrent_fetches: u32,

    /// Whole-request timeout (seconds)
    pub request_timeout_secs: u64,

    /// Connection establishment timeout (seconds)
    pub connect_timeout_secs: u64,

    /// How discovered links are compared against the seed
    pub scope_policy: ScopePolicy,

    /// Join relative hrefs onto the page address before recording them
    pub resolve_relative_links: bool,

    /// Largest page body read before the fetch is abandoned (bytes)
    pub max_body_bytes: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 8,
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            scope_policy: ScopePolicy::Prefix,
            resolve_relative_links: true,
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct UserAgentConfig {
    /// Name of the crawler
    pub crawler_name: String,

    /// Version of the crawler
    pub crawler_version: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: env!("CARGO_PKG_NAME").to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    pub fn header_value(&self) -> String {
        format!("{}/{}", self.crawler_name, self.crawler_version)
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Where the finished registry is written
    pub output_path: String,

    /// Where the registry is checkpointed on interrupt
    pub checkpoint_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
            checkpoint_path: DEFAULT_CHECKPOINT_PATH.to_string(),
        }
    }
}

/// Default name of the finished-crawl file
pub const DEFAULT_OUTPUT_PATH: &str = "output.json";

/// Default name of the in-progress checkpoint file
pub const DEFAULT_CHECKPOINT_PATH: &str = "working.json";
