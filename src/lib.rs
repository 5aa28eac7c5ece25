//! Seedgraph: one-hop Wikipedia link graphs around a set of seed articles
//!
//! Given a list of seed titles, this crate builds the "ego network" of the seeds:
//!
//! 1. **Level 0** -- Fetch each seed's wikitext, extract its wikilinks, resolve them to
//!    canonical article titles (following redirects, dropping other namespaces) and record
//!    every seed -> target edge
//! 2. **Level 1** -- Expand every non-seed title reached in level 0 the same way, keeping only
//!    edges whose target is a seed or another level-1 title
//! 3. **Finalize** -- Close the edge stream and export per-node degree statistics
//!
//! # Architecture
//!
//! - **Batched resolution** -- Link targets are resolved 50 at a time against the MediaWiki
//!   API, with bounded concurrency and retry with exponential backoff
//! - **Durable memoization** -- Every resolved outlink list is stored as one file per title
//!   and reused by later runs without contacting the API
//! - **Single aggregation point** -- Expansions run concurrently but are absorbed in sorted
//!   title order, so edge output and degree counts are exact and reproducible
//! - **Per-title locking** -- At most one resolution of any title is in flight
//! - **Cancellation** -- A run-scoped token stops outstanding requests and flushes whole edges
//!
//! # Key Modules
//!
//! - [`title`] -- Title normalization
//! - [`wikitext`] -- Wikilink extraction from raw article text
//! - [`api`] -- Link-resolution service trait and MediaWiki client
//! - [`resolver`] -- Batched redirect and namespace resolution
//! - [`cache`] -- Per-title outlink cache files
//! - [`network`] -- Crawl session and the two-level state machine
//! - [`degree`] -- Per-node degree statistics
//! - [`seeds`] -- Seed list parsing
//! - [`output`] -- Edge stream and TSV readers
//! - [`verify`] -- Replays the edge stream against the degree table
//! - [`retry`] -- Bounded retry policy
//! - [`stats`] -- Atomic counters for run metrics
//! - [`models`] -- Edges, expansions, crawl phases and reports
//! - [`config`] -- Constants and run configuration
//!
//! # Example Usage
//!
//! ```bash
//! # Crawl the neighborhood of the seeds in topics.txt
//! seedgraph crawl --seeds topics.txt -o output/
//!
//! # Check that degrees.tsv agrees with edges.tsv
//! seedgraph verify -o output/
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod degree;
pub mod models;
pub mod network;
pub mod output;
pub mod resolver;
pub mod retry;
pub mod seeds;
pub mod stats;
pub mod title;
pub mod verify;
pub mod wikitext;
