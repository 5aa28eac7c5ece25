//! Two-level crawl around the seed set.
//!
//! Level 0 expands every seed and keeps all of its links. Level 1 expands every title the
//! seeds link to and keeps only the links that land back on a seed or on another level-1
//! title, which bounds the graph to the seeds' immediate neighborhood.

use crate::api::{ApiError, WikiApi};
use crate::cache::OutlinkCache;
use crate::config::CrawlConfig;
use crate::degree::DegreeTable;
use crate::models::{CrawlPhase, CrawlReport, Edge, Expansion};
use crate::output::EdgeWriter;
use crate::resolver::BatchResolver;
use crate::retry::RetryPolicy;
use crate::seeds::SeedSet;
use crate::stats::CrawlStats;
use crate::title::Title;
use crate::wikitext::extract_links;
use anyhow::{bail, Context, Result};
use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// State of one run: seeds, frontier, degree table and the edge sink.
pub struct CrawlSession {
    seeds: SeedSet,
    frontier: BTreeSet<Title>,
    degrees: DegreeTable,
    edges: EdgeWriter,
    degrees_path: PathBuf,
    level0_edges: u64,
    level1_edges: u64,
    discarded: u64,
}

impl CrawlSession {
    /// Init: takes the seed set and opens the edge stream.
    pub fn create(seeds: SeedSet, edges_path: &Path, degrees_path: &Path) -> Result<Self> {
        info!(phase = %CrawlPhase::Init, seeds = seeds.len(), "Crawl phase");
        Ok(Self {
            seeds,
            frontier: BTreeSet::new(),
            degrees: DegreeTable::new(),
            edges: EdgeWriter::create(edges_path)?,
            degrees_path: degrees_path.to_path_buf(),
            level0_edges: 0,
            level1_edges: 0,
            discarded: 0,
        })
    }

    pub fn seeds(&self) -> &SeedSet {
        &self.seeds
    }

    pub fn frontier(&self) -> &BTreeSet<Title> {
        &self.frontier
    }

    pub fn degrees(&self) -> &DegreeTable {
        &self.degrees
    }

    fn emit(&mut self, source: &Title, target: &Title) -> Result<bool> {
        let Some(edge) = Edge::new(source, target) else {
            return Ok(false);
        };
        self.edges.write(&edge)?;
        self.degrees.record_edge(source, target, &self.seeds);
        Ok(true)
    }

    /// Level 0: every link of a seed becomes an edge.
    fn absorb_seed(&mut self, expansion: Expansion) -> Result<()> {
        for target in &expansion.outlinks {
            if self.emit(&expansion.title, target)? {
                self.level0_edges += 1;
            }
            if !self.seeds.contains(target) {
                self.frontier.insert(target.clone());
            }
        }
        if expansion.fresh {
            self.degrees
                .set_expanded(&expansion.title, expansion.outlinks.len());
        }
        Ok(())
    }

    /// Level 1: keep only links that close back into seeds or the frontier.
    fn absorb_candidate(&mut self, expansion: Expansion) -> Result<()> {
        for target in &expansion.outlinks {
            if !self.seeds.contains(target) && !self.frontier.contains(target) {
                self.discarded += 1;
                continue;
            }
            if self.emit(&expansion.title, target)? {
                self.level1_edges += 1;
            }
        }
        self.degrees
            .set_expanded(&expansion.title, expansion.outlinks.len());
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.edges.flush()
    }

    /// Finalize: closes the edge stream and exports the degree table.
    pub fn finish(mut self) -> Result<CrawlReport> {
        info!(
            phase = %CrawlPhase::Finalize,
            edges = self.edges.written(),
            nodes = self.degrees.len(),
            "Crawl phase"
        );
        self.edges.flush()?;
        self.degrees.write_tsv(&self.degrees_path)?;

        Ok(CrawlReport {
            seeds: self.seeds.len(),
            frontier: self.frontier.len(),
            nodes: self.degrees.len(),
            level0_edges: self.level0_edges,
            level1_edges: self.level1_edges,
            discarded_edges: self.discarded,
        })
    }
}

/// Drives the crawl: cache-or-resolve expansion of titles plus the level state machine.
pub struct NetworkBuilder<A> {
    api: A,
    cache: OutlinkCache,
    stats: CrawlStats,
    retry: RetryPolicy,
    batch_size: usize,
    concurrency: usize,
    in_flight: DashMap<Title, Arc<Mutex<()>>>,
}

impl<A: WikiApi> NetworkBuilder<A> {
    pub fn new(api: A, cache: OutlinkCache, config: &CrawlConfig) -> Self {
        Self {
            api,
            cache,
            stats: CrawlStats::new(),
            retry: RetryPolicy::new(config.max_attempts),
            batch_size: config.effective_batch_size(),
            concurrency: config.effective_concurrency(),
            in_flight: DashMap::new(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn stats(&self) -> &CrawlStats {
        &self.stats
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    fn resolver(&self) -> BatchResolver<'_, A> {
        BatchResolver::new(&self.api, &self.stats)
            .with_batch_size(self.batch_size)
            .with_concurrency(self.concurrency)
            .with_retry(self.retry)
    }

    /// Outlinks of `title`, from the cache when a record exists, otherwise resolved and stored.
    ///
    /// Blank titles have no outlinks and never reach the service or the cache. Only one
    /// resolution per title runs at a time; a concurrent caller waits and reads the cache.
    pub async fn outlinks(&self, title: &Title) -> Result<Expansion, ApiError> {
        if title.is_blank() {
            return Ok(Expansion::empty(title));
        }

        let lock = Arc::clone(&self.in_flight.entry(title.clone()).or_default());
        let _guard = lock.lock().await;
        let result = self.load_or_resolve(title).await;
        // waiters keep their clone of the lock; later callers find the record on disk
        self.in_flight
            .remove_if(title, |_, entry| Arc::ptr_eq(entry, &lock));
        result
    }

    async fn load_or_resolve(&self, title: &Title) -> Result<Expansion, ApiError> {
        if let Some(outlinks) = self.cache.try_load(title) {
            self.stats.inc_cache_hits();
            return Ok(Expansion {
                title: title.clone(),
                outlinks,
                fresh: false,
            });
        }
        self.stats.inc_cache_misses();

        let body = self
            .retry
            .run("fetch_wikitext", || self.api.fetch_wikitext(title.as_str()))
            .await?;

        let outlinks = match body {
            Some(body) => {
                let candidates: Vec<&str> = extract_links(&body).collect();
                self.resolver().resolve(&candidates).await?.into_titles()
            }
            None => {
                warn!(title = %title, "Title resolves to a missing page");
                self.stats.add_missing(1);
                Vec::new()
            }
        };

        if let Err(e) = self.cache.store(title, &outlinks) {
            warn!(title = %title, error = %e, "Failed to save outlink cache record");
        }
        self.stats.inc_expanded();

        Ok(Expansion {
            title: title.clone(),
            outlinks,
            fresh: true,
        })
    }

    /// Expands `titles` with bounded concurrency, handing results to `absorb` in input order.
    async fn expand_level<F>(
        &self,
        phase: CrawlPhase,
        titles: &[Title],
        cancel: &CancellationToken,
        mut absorb: F,
    ) -> Result<()>
    where
        F: FnMut(Expansion) -> Result<()>,
    {
        info!(phase = %phase, titles = titles.len(), "Crawl phase");
        let pb = make_progress_bar(titles.len() as u64, &phase.to_string());

        let mut expansions = stream::iter(titles)
            .map(|title| self.outlinks(title))
            .buffered(self.concurrency);

        let mut position = 0usize;
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    pb.abandon();
                    bail!("Crawl cancelled during {}", phase);
                }
                next = expansions.next() => next,
            };
            let Some(result) = next else {
                break;
            };

            position += 1;
            let expansion = result.with_context(|| {
                format!("Failed to expand title {} during {}", titles[position - 1], phase)
            })?;
            info!(
                title = %expansion.title,
                position = position,
                total = titles.len(),
                outlinks = expansion.outlinks.len(),
                cached = !expansion.fresh,
                "Expanded title"
            );
            pb.set_message(expansion.title.to_string());
            pb.inc(1);

            absorb(expansion)?;
        }

        pb.finish_and_clear();
        Ok(())
    }

    /// Runs all crawl phases on `session` and finalizes it.
    ///
    /// On failure or cancellation the edges written so far are flushed and the error is
    /// returned; nothing already written is rolled back.
    pub async fn run(
        &self,
        mut session: CrawlSession,
        cancel: &CancellationToken,
    ) -> Result<CrawlReport> {
        if let Err(e) = self.crawl(&mut session, cancel).await {
            if let Err(flush_err) = session.flush() {
                warn!(error = %flush_err, "Failed to flush edge file after error");
            }
            return Err(e);
        }
        session.finish()
    }

    async fn crawl(&self, session: &mut CrawlSession, cancel: &CancellationToken) -> Result<()> {
        let seeds: Vec<Title> = session.seeds().iter().cloned().collect();
        self.expand_level(CrawlPhase::Level0Expand, &seeds, cancel, |expansion| {
            session.absorb_seed(expansion)
        })
        .await?;

        info!(
            phase = %CrawlPhase::Level1Collect,
            frontier = session.frontier().len(),
            "Crawl phase"
        );
        let frontier: Vec<Title> = session.frontier().iter().cloned().collect();
        debug!(frontier = ?frontier, "Level 1 frontier");

        self.expand_level(CrawlPhase::Level1Expand, &frontier, cancel, |expansion| {
            session.absorb_candidate(expansion)
        })
        .await?;

        Ok(())
    }
}

fn make_progress_bar(total: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{prefix:>14} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("=> "),
    );
    pb.set_prefix(label.to_string());
    pb
}
