use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics collected while crawling, shared by concurrent expansions
#[derive(Default)]
pub struct CrawlStats {
    pub titles_expanded: AtomicU64,
    pub cache_hits: AtomicU64,
    pub cache_misses: AtomicU64,
    pub api_batches: AtomicU64,
    pub missing_titles: AtomicU64,
    pub duplicate_titles: AtomicU64,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_expanded(&self) {
        self.titles_expanded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_cache_hits(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_cache_misses(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_api_batches(&self) {
        self.api_batches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_missing(&self, count: u64) {
        self.missing_titles.fetch_add(count, Ordering::Relaxed);
    }

    pub fn add_duplicates(&self, count: u64) {
        self.duplicate_titles.fetch_add(count, Ordering::Relaxed);
    }

    pub fn expanded(&self) -> u64 {
        self.titles_expanded.load(Ordering::Relaxed)
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> u64 {
        self.cache_misses.load(Ordering::Relaxed)
    }

    pub fn api_batches(&self) -> u64 {
        self.api_batches.load(Ordering::Relaxed)
    }

    pub fn missing(&self) -> u64 {
        self.missing_titles.load(Ordering::Relaxed)
    }

    pub fn duplicates(&self) -> u64 {
        self.duplicate_titles.load(Ordering::Relaxed)
    }
}
