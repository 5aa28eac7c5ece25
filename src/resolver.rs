use crate::api::{ApiError, PageQuery, WikiApi};
use crate::config::{ARTICLE_NAMESPACE, MAX_BATCH_SIZE, MISSING_PAGE_ID, REDIRECT_MAX_DEPTH};
use crate::retry::RetryPolicy;
use crate::stats::CrawlStats;
use crate::title::{normalize, Title};
use futures::stream::{self, StreamExt};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, warn};

/// Splits `items` into consecutive batches of at most `size`, preserving order.
pub fn batches<T>(items: &[T], size: usize) -> impl Iterator<Item = &[T]> {
    items.chunks(size.max(1))
}

/// Canonical article titles reached from a set of raw titles.
#[derive(Debug, Default)]
pub struct Resolution {
    /// from -> to, batch-scoped, never persisted
    pub redirects: FxHashMap<Title, Title>,
    pages: Vec<(Title, i64)>,
    index: FxHashMap<Title, usize>,
    pub duplicates: usize,
    pub missing: usize,
}

impl Resolution {
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn page_id(&self, title: &str) -> Option<i64> {
        self.index.get(title).map(|&i| self.pages[i].1)
    }

    pub fn contains(&self, title: &str) -> bool {
        self.index.contains_key(title)
    }

    /// Resolved titles in first-seen order.
    pub fn titles(&self) -> impl Iterator<Item = &Title> {
        self.pages.iter().map(|(title, _)| title)
    }

    pub fn into_titles(self) -> Vec<Title> {
        self.pages.into_iter().map(|(title, _)| title).collect()
    }

    /// Folds one batch answer in, input by input.
    ///
    /// The service lists each page once per query, so inputs are mapped through the batch's
    /// normalization and redirect entries to their canonical title. An input whose canonical
    /// title was already reached, in this batch or an earlier one, is a duplicate.
    fn absorb(&mut self, inputs: &[String], query: PageQuery, namespace: i32) {
        let mut hops: FxHashMap<Title, Title> = FxHashMap::default();
        for (from, to) in query.redirects {
            let (from, to) = (normalize(&from), normalize(&to));
            self.redirects.insert(from.clone(), to.clone());
            hops.insert(from, to);
        }

        let pages: FxHashMap<Title, (i64, i32)> = query
            .pages
            .into_iter()
            .map(|page| (normalize(&page.title), (page.page_id, page.namespace)))
            .collect();

        for input in inputs {
            let title = follow(&hops, normalize(input));
            let Some(&(page_id, page_namespace)) = pages.get(&title) else {
                debug!(input = %input, title = %title, "Link target not in response");
                self.missing += 1;
                continue;
            };
            if page_id == MISSING_PAGE_ID || page_namespace != namespace {
                self.missing += 1;
                continue;
            }

            match self.index.get(&title) {
                Some(&i) => {
                    self.pages[i].1 = page_id;
                    self.duplicates += 1;
                }
                None => {
                    self.index.insert(title.clone(), self.pages.len());
                    self.pages.push((title, page_id));
                }
            }
        }
    }
}

/// Follows normalization and redirect hops from `title`, stopping after
/// [`REDIRECT_MAX_DEPTH`] hops so a cycle cannot loop.
fn follow(hops: &FxHashMap<Title, Title>, mut title: Title) -> Title {
    for _ in 0..REDIRECT_MAX_DEPTH {
        match hops.get(&title) {
            Some(next) if *next != title => title = next.clone(),
            _ => break,
        }
    }
    title
}

/// Resolves raw link targets to canonical article titles in bounded batches.
pub struct BatchResolver<'a, A> {
    api: &'a A,
    stats: &'a CrawlStats,
    batch_size: usize,
    concurrency: usize,
    retry: RetryPolicy,
    namespace: i32,
}

impl<'a, A: WikiApi> BatchResolver<'a, A> {
    pub fn new(api: &'a A, stats: &'a CrawlStats) -> Self {
        Self {
            api,
            stats,
            batch_size: MAX_BATCH_SIZE,
            concurrency: 1,
            retry: RetryPolicy::default(),
            namespace: ARTICLE_NAMESPACE,
        }
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.clamp(1, MAX_BATCH_SIZE);
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Resolves `titles`, following redirects and keeping only existing article pages.
    ///
    /// Batches may be in flight concurrently but are absorbed in input order. A batch that
    /// still fails after retries fails the whole call.
    pub async fn resolve<S: AsRef<str>>(&self, titles: &[S]) -> Result<Resolution, ApiError> {
        let mut seen = FxHashSet::default();
        let inputs: Vec<String> = titles
            .iter()
            .map(|t| t.as_ref().trim())
            .filter(|t| !t.is_empty() && seen.insert(normalize(t)))
            .map(str::to_string)
            .collect();

        let mut resolution = Resolution::default();
        if inputs.is_empty() {
            return Ok(resolution);
        }

        let mut responses = stream::iter(batches(&inputs, self.batch_size))
            .map(|batch| async move { (batch, self.query_batch(batch).await) })
            .buffered(self.concurrency);

        while let Some((batch, result)) = responses.next().await {
            resolution.absorb(batch, result?, self.namespace);
        }

        if resolution.missing > 0 {
            warn!(
                requested = inputs.len(),
                missing = resolution.missing,
                "Link targets did not resolve to articles"
            );
        }
        self.stats.add_missing(resolution.missing as u64);
        self.stats.add_duplicates(resolution.duplicates as u64);

        debug!(
            requested = inputs.len(),
            resolved = resolution.len(),
            duplicates = resolution.duplicates,
            missing = resolution.missing,
            "Resolved link batch"
        );

        Ok(resolution)
    }

    async fn query_batch(&self, batch: &[String]) -> Result<PageQuery, ApiError> {
        self.stats.inc_api_batches();
        self.retry
            .run("query_pages", || self.api.query_pages(batch))
            .await
    }
}
