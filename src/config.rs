use std::path::{Path, PathBuf};
use std::time::Duration;

/// Hard ceiling on titles per query imposed by the MediaWiki API
pub const MAX_BATCH_SIZE: usize = 50;

/// Namespace id of regular articles
pub const ARTICLE_NAMESPACE: i32 = 0;

/// Page id reported for titles that have no page
pub const MISSING_PAGE_ID: i64 = -1;

/// Normalization plus redirect hops followed when matching a batch input to its page
pub const REDIRECT_MAX_DEPTH: usize = 5;

pub const DEFAULT_API_ENDPOINT: &str = "https://en.wikipedia.org/w/api.php";

/// Resolution calls in flight at once
pub const DEFAULT_CONCURRENCY: usize = 4;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// First retry delay; doubles on every further attempt
pub const RETRY_BASE_DELAY_MS: u64 = 500;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const USER_AGENT: &str = concat!(
    "seedgraph/",
    env!("CARGO_PKG_VERSION"),
    " (https://github.com/real-limoges/seedgraph)"
);

pub const EDGES_FILE: &str = "edges.tsv";
pub const DEGREES_FILE: &str = "degrees.tsv";
pub const CACHE_DIR: &str = "outlinks";

/// Extension of per-title outlink cache files
pub const CACHE_EXTENSION: &str = "links";

/// Cache file names keep at most this many bytes of the encoded title
pub const CACHE_NAME_PREFIX_MAX: usize = 100;

/// Hex digits of the title hash appended to every cache file name
pub const CACHE_NAME_HASH_LEN: usize = 16;

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub api_endpoint: String,
    pub output_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub batch_size: usize,
    pub concurrency: usize,
    pub max_attempts: u32,
    pub timeout: Duration,
    pub refresh_cache: bool,
}

impl CrawlConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        let output_dir = output_dir.into();
        let cache_dir = output_dir.join(CACHE_DIR);
        Self {
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            output_dir,
            cache_dir,
            batch_size: MAX_BATCH_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            refresh_cache: false,
        }
    }

    pub fn edges_path(&self) -> PathBuf {
        edges_path(&self.output_dir)
    }

    pub fn degrees_path(&self) -> PathBuf {
        degrees_path(&self.output_dir)
    }

    /// Configured batch size clamped to `1..=MAX_BATCH_SIZE`.
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.clamp(1, MAX_BATCH_SIZE)
    }

    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.max(1)
    }
}

pub fn edges_path(output_dir: &Path) -> PathBuf {
    output_dir.join(EDGES_FILE)
}

pub fn degrees_path(output_dir: &Path) -> PathBuf {
    output_dir.join(DEGREES_FILE)
}
