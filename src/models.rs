use crate::title::Title;
use std::fmt;

/// Directed link between two distinct titles.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    pub source: Title,
    pub target: Title,
}

impl Edge {
    /// `None` for self-links, which are never part of the graph.
    pub fn new(source: &Title, target: &Title) -> Option<Self> {
        if source == target {
            return None;
        }
        Some(Self {
            source: source.clone(),
            target: target.clone(),
        })
    }
}

/// Outlinks of one title, as loaded from the cache or freshly resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    pub title: Title,
    pub outlinks: Vec<Title>,
    /// true when resolved in this run rather than read from the cache
    pub fresh: bool,
}

impl Expansion {
    pub fn empty(title: &Title) -> Self {
        Self {
            title: title.clone(),
            outlinks: Vec::new(),
            fresh: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlPhase {
    Init,
    Level0Expand,
    Level1Collect,
    Level1Expand,
    Finalize,
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CrawlPhase::Init => "init",
            CrawlPhase::Level0Expand => "level0-expand",
            CrawlPhase::Level1Collect => "level1-collect",
            CrawlPhase::Level1Expand => "level1-expand",
            CrawlPhase::Finalize => "finalize",
        };
        f.write_str(name)
    }
}

/// Outcome of a completed crawl.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    pub seeds: usize,
    pub frontier: usize,
    pub nodes: usize,
    pub level0_edges: u64,
    pub level1_edges: u64,
    pub discarded_edges: u64,
}

impl CrawlReport {
    pub fn edges(&self) -> u64 {
        self.level0_edges + self.level1_edges
    }
}
