use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use seedgraph::api::MediaWikiClient;
use seedgraph::cache::OutlinkCache;
use seedgraph::config::{self, CrawlConfig};
use seedgraph::network::{CrawlSession, NetworkBuilder};
use seedgraph::seeds::SeedSet;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "seedgraph")]
#[command(about = "Build one-hop Wikipedia link graphs around seed articles")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl seeds and their first-hop neighborhood into edges.tsv and degrees.tsv
    Crawl(CrawlArgs),
    /// Check that degrees.tsv agrees with edges.tsv
    Verify(VerifyArgs),
}

#[derive(Args)]
struct CrawlArgs {
    /// Seed list, one title per line (# comments allowed)
    #[arg(short, long)]
    seeds: PathBuf,

    /// Output directory for edges.tsv and degrees.tsv
    #[arg(short, long)]
    output: PathBuf,

    /// Outlink cache directory (defaults to <output>/outlinks)
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// MediaWiki Action API endpoint
    #[arg(long, default_value = config::DEFAULT_API_ENDPOINT)]
    api_endpoint: String,

    /// Resolution calls in flight at once
    #[arg(long, default_value_t = config::DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Titles per resolution query (at most 50)
    #[arg(long, default_value_t = config::MAX_BATCH_SIZE)]
    batch_size: usize,

    /// Attempts per API call before the run fails
    #[arg(long, default_value_t = config::DEFAULT_MAX_ATTEMPTS)]
    max_attempts: u32,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = config::DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Ignore existing outlink cache records and rewrite them
    #[arg(long)]
    refresh_cache: bool,

    /// Clear the output directory before starting
    #[arg(long)]
    clean: bool,

    /// Expand only the first N seeds (in sorted order)
    #[arg(long)]
    limit: Option<usize>,
}

#[derive(Args)]
struct VerifyArgs {
    /// Output directory of a previous crawl
    #[arg(short, long)]
    output: PathBuf,
}

impl CrawlArgs {
    fn to_config(&self) -> CrawlConfig {
        let mut config = CrawlConfig::new(&self.output);
        if let Some(dir) = &self.cache_dir {
            config.cache_dir = dir.clone();
        }
        config.api_endpoint = self.api_endpoint.clone();
        config.concurrency = self.concurrency;
        config.batch_size = self.batch_size;
        config.max_attempts = self.max_attempts;
        config.timeout = Duration::from_secs(self.timeout_secs);
        config.refresh_cache = self.refresh_cache;
        config
    }
}

fn run_crawl(args: CrawlArgs) -> Result<()> {
    if args.batch_size > config::MAX_BATCH_SIZE {
        warn!(
            requested = args.batch_size,
            max = config::MAX_BATCH_SIZE,
            "Batch size above API limit, clamping"
        );
    }
    let config = args.to_config();

    if args.clean && config.output_dir.exists() {
        info!("Cleaning output directory: {:?}", config.output_dir);
        fs::remove_dir_all(&config.output_dir).with_context(|| {
            format!("Failed to clean output directory: {:?}", config.output_dir)
        })?;
    }
    fs::create_dir_all(&config.output_dir).with_context(|| {
        format!("Failed to create output directory: {:?}", config.output_dir)
    })?;

    let mut seeds = SeedSet::load(&args.seeds)?;
    if let Some(limit) = args.limit {
        seeds.truncate(limit);
    }
    if seeds.is_empty() {
        bail!("Seed list {:?} contains no titles", args.seeds);
    }

    let client = MediaWikiClient::new(&config.api_endpoint, config.timeout)?;
    let cache = OutlinkCache::open(&config.cache_dir, config.refresh_cache)?;
    let builder = NetworkBuilder::new(client, cache, &config);
    let session = CrawlSession::create(seeds, &config.edges_path(), &config.degrees_path())?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .thread_name("seedgraph-worker")
        .enable_io()
        .enable_time()
        .build()?;

    let start = Instant::now();
    let report = rt.block_on(async {
        let cancel = CancellationToken::new();
        let on_signal = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, stopping crawl");
                on_signal.cancel();
            }
        });
        builder.run(session, &cancel).await
    })?;
    let duration = start.elapsed();

    let stats = builder.stats();
    println!();
    println!("=== Summary ===");
    println!("Crawl time:         {:.2}s", duration.as_secs_f64());
    println!();
    println!("Seeds:              {}", report.seeds);
    println!("Frontier:           {}", report.frontier);
    println!("Nodes:              {}", report.nodes);
    println!("Level 0 edges:      {}", report.level0_edges);
    println!("Level 1 edges:      {}", report.level1_edges);
    println!("Discarded links:    {}", report.discarded_edges);
    println!("Titles resolved:    {}", stats.expanded());
    println!("Cache hits:         {}", stats.cache_hits());
    println!("Cache misses:       {}", stats.cache_misses());
    println!("API batches:        {}", stats.api_batches());
    println!("Missing titles:     {}", stats.missing());
    println!("Duplicate targets:  {}", stats.duplicates());
    println!();
    println!("Edges:   {}", config.edges_path().display());
    println!("Degrees: {}", config.degrees_path().display());

    Ok(())
}

fn run_verify(args: VerifyArgs) -> Result<()> {
    let report = seedgraph::verify::verify_output(&args.output)?;

    println!("Edges checked:      {}", report.edges);
    println!("Degree rows:        {}", report.rows);
    for mismatch in &report.mismatches {
        println!("  {}", mismatch);
    }

    if !report.is_consistent() {
        bail!("{} inconsistencies found", report.mismatches.len());
    }
    println!("Degree table is consistent with the edge stream.");
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    let result = match cli.command {
        Commands::Crawl(args) => run_crawl(args),
        Commands::Verify(args) => run_verify(args),
    };

    match result {
        Ok(()) => {
            info!("Completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
