use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure for Doc-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub project: ProjectConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub links: LinkConfig,
}

/// Identity of the crawled documentation project
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    /// Project tag written into every page record's `source` field
    pub name: String,

    /// Crawl scope: only URLs below this prefix are followed
    #[serde(rename = "base-url")]
    pub base_url: String,
}

/// Ledger file locations
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Append-only page record stream
    #[serde(rename = "records-path")]
    pub records_path: String,

    /// Unreachable URL snapshot, rewritten at the end of each run
    #[serde(rename = "unreachable-path")]
    pub unreachable_path: String,

    /// Append-only stream of collected off-site links
    #[serde(rename = "external-links-path")]
    pub external_links_path: String,

    /// Append-only stream of URLs whose pages had no usable content
    ///
    /// Defaults to `<records stem>_unextractable.jsonl` next to the records.
    #[serde(rename = "unextractable-path", default)]
    pub unextractable_path: Option<String>,

    /// Optional log file, written in addition to stderr
    #[serde(rename = "log-path", default)]
    pub log_path: Option<String>,
}

impl OutputConfig {
    /// The unextractable stream location, configured or derived
    pub fn resolved_unextractable_path(&self) -> PathBuf {
        if let Some(path) = &self.unextractable_path {
            return PathBuf::from(path);
        }

        let records = Path::new(&self.records_path);
        let stem = records
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "records".to_string());
        records.with_file_name(format!("{}_unextractable.jsonl", stem))
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Fetch attempts per URL before it is given up
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Whole-request timeout (seconds)
    #[serde(rename = "fetch-timeout-secs", default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Cooldown before a transiently failed URL is queued again (milliseconds)
    #[serde(rename = "retry-delay-ms", default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Cleaned content shorter than this many characters is discarded
    #[serde(rename = "min-content-length", default = "default_min_content_length")]
    pub min_content_length: usize,

    /// Number of concurrent fetch workers
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Retry URLs that a previous run gave up on
    #[serde(rename = "retry-unreachable", default)]
    pub retry_unreachable: bool,

    /// Emit a status line every this many processed pages
    #[serde(rename = "progress-interval", default = "default_progress_interval")]
    pub progress_interval: u64,
}

/// Static request identity applied to every fetch
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_accept")]
    pub accept: String,

    #[serde(rename = "accept-language", default = "default_accept_language")]
    pub accept_language: String,

    /// Product token matched against robots.txt user-agent groups
    #[serde(rename = "robots-agent", default = "default_robots_agent")]
    pub robots_agent: String,
}

/// Link classification tables
#[derive(Debug, Clone, Deserialize)]
pub struct LinkConfig {
    /// Extensions never followed nor collected
    #[serde(rename = "ignored-extensions", default = "default_ignored_extensions")]
    pub ignored_extensions: Vec<String>,

    /// Off-site hosts whose links are worth collecting
    #[serde(rename = "external-hosts", default = "default_external_hosts")]
    pub external_hosts: Vec<String>,

    /// Extensions that make an off-site link worth collecting
    #[serde(rename = "external-extensions", default = "default_external_extensions")]
    pub external_extensions: Vec<String>,

    /// Extensionless files whose name contains this keyword are collected too
    #[serde(rename = "pseudo-extension-keyword", default = "default_pseudo_keyword")]
    pub pseudo_extension_keyword: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            retry_delay_ms: default_retry_delay_ms(),
            min_content_length: default_min_content_length(),
            workers: default_workers(),
            retry_unreachable: false,
            progress_interval: default_progress_interval(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            accept: default_accept(),
            accept_language: default_accept_language(),
            robots_agent: default_robots_agent(),
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            ignored_extensions: default_ignored_extensions(),
            external_hosts: default_external_hosts(),
            external_extensions: default_external_extensions(),
            pseudo_extension_keyword: default_pseudo_keyword(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_retry_delay_ms() -> u64 {
    5000
}

fn default_min_content_length() -> usize {
    100
}

fn default_workers() -> usize {
    1
}

fn default_progress_interval() -> u64 {
    10
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/100.0.4896.88 Safari/537.36"
        .to_string()
}

fn default_accept() -> String {
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8".to_string()
}

fn default_accept_language() -> String {
    "en-US,en;q=0.5".to_string()
}

fn default_robots_agent() -> String {
    "doc-harvest".to_string()
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_ignored_extensions() -> Vec<String> {
    to_strings(&[
        ".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", // images
        ".pdf", ".zip", ".tar", ".gz", ".rar", // documents / archives
        ".css", ".js", // stylesheets / scripts
        ".ico", // favicons
    ])
}

fn default_external_hosts() -> Vec<String> {
    to_strings(&["github.com", "raw.githubusercontent.com", "gitlab.com"])
}

fn default_external_extensions() -> Vec<String> {
    to_strings(&[
        ".c", ".h", ".cpp", ".hpp", ".py", ".rs", ".s", ".ld", ".dts", ".dtsi", ".overlay",
        ".yaml", ".yml", ".cmake", ".txt", ".conf", ".md", ".rst",
    ])
}

fn default_pseudo_keyword() -> String {
    "kconfig".to_string()
}
