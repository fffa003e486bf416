//! Crawl orchestration with per-host politeness
//!
//! This module wires the frontier, the politeness governor and the HTML parser
//! into one crawl session:
//!
//! ```text
//! ┌────────────┐  dequeue   ┌────────────┐   fetch    ┌────────────┐
//! │  Frontier  │───────────▶│  Governor  │───────────▶│   Parser   │
//! └────────────┘            └────────────┘            └────────────┘
//!       ▲                                                   │
//!       │            links \ visited                        │ record
//!       └───────────────────────────────────────────────────┤
//!                                                           ▼
//!                                                     ┌────────────┐
//!                                                     │    Sink    │
//!                                                     └────────────┘
//! ```
//!
//! A session runs `workers` loops concurrently inside the calling task. With a
//! single worker one URL is fully processed before the next is dequeued.
//!
//! # Example
//!
//! ```no_run
//! use pathcrawl::config::Config;
//! use pathcrawl::crawler::url::load_seeds;
//! use pathcrawl::crawler::Crawler;
//! use pathcrawl::models::OutputRecord;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let crawler = Crawler::new(Config::default())?;
//! let seeds = load_seeds("https://example.com/\n")?;
//!
//! let mut records: Vec<OutputRecord> = Vec::new();
//! let report = crawler.run(seeds, &mut records).await?;
//!
//! println!("Fetched {} pages", report.stats.pages_fetched);
//! # Ok(())
//! # }
//! ```

pub mod fetcher;
pub mod politeness;
pub mod robots;
pub mod url;

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

use crate::config::Config;
use crate::error::{CrawlErrorTrait, Error, ErrorCategory, Result};
use crate::frontier::Frontier;
use crate::models::{CrawlCounters, CrawlStats, OutputRecord};
use crate::parser::{is_html, PageParser};
use crate::storage::RecordSink;
use crate::utils::error::{ConfigError, FetchError, FrontierError};
use fetcher::{HttpTransport, ReqwestTransport};
use politeness::PolitenessGovernor;
use self::url::CanonicalUrl;

/// Upper bound on how long an idle worker sleeps before re-checking the frontier
const IDLE_WAIT: Duration = Duration::from_millis(50);

/// Stops a running crawl from admitting new URLs
///
/// In-flight fetches finish and are recorded normally.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Outcome of a finished crawl session
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Final counters
    pub stats: CrawlStats,

    /// Successfully fetched URLs in completion order
    pub visited: Vec<CanonicalUrl>,

    /// URLs still pending when the session ended
    pub frontier_remaining: usize,
}

/// Main crawler structure
pub struct Crawler<T: HttpTransport = ReqwestTransport> {
    /// Configuration
    config: Config,

    /// Per-host robots, throttle and quota state
    governor: PolitenessGovernor<T>,

    /// HTML link and metadata extraction
    parser: PageParser,

    /// Admission switch for new dequeues
    shutdown: ShutdownHandle,
}

/// Session bookkeeping guarded as one unit
#[derive(Debug, Default)]
struct Ledger {
    /// Successfully fetched URLs
    visited: HashSet<CanonicalUrl>,

    /// `visited` in completion order
    order: Vec<CanonicalUrl>,

    /// Every URL handed to the governor; failed URLs are never re-attempted
    claimed: HashSet<CanonicalUrl>,

    /// Fetches currently in progress
    in_flight: usize,
}

/// State shared by the workers of one session
struct Session<'s, S> {
    frontier: Mutex<Frontier>,
    ledger: Mutex<Ledger>,
    sink: Mutex<&'s mut S>,
    counters: CrawlCounters,
    wake: Notify,
}

enum Step {
    Fetch(CanonicalUrl),
    Wait,
    Done,
}

fn validate(config: &Config) -> Result<()> {
    config
        .validate()
        .map_err(|e| Error::config(format!("{e:#}")))
}

impl Crawler<ReqwestTransport> {
    /// Create a crawler with the `reqwest` transport
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` before any client is built if `config`
    /// fails validation.
    pub fn new(config: Config) -> Result<Self> {
        validate(&config)?;
        let transport = ReqwestTransport::new(&config.crawler.user_agent, &config.politeness)?;
        Self::with_transport(config, Arc::new(transport))
    }
}

impl<T: HttpTransport> Crawler<T> {
    /// Create a crawler over an arbitrary transport
    pub fn with_transport(config: Config, transport: Arc<T>) -> Result<Self> {
        validate(&config)?;

        let governor = PolitenessGovernor::new(
            transport,
            config.crawler.user_agent.clone(),
            &config.politeness,
        );

        Ok(Self {
            governor,
            parser: PageParser::new()?,
            shutdown: ShutdownHandle::default(),
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn governor(&self) -> &PolitenessGovernor<T> {
        &self.governor
    }

    /// Handle that stops admission of new URLs
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Crawl from `seeds` until the frontier is exhausted or the page budget is spent
    ///
    /// The first seed starts the frontier (and fixes the field strategy's wind);
    /// the rest are enqueued behind it. Per-URL failures never end the session.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NoSeeds` for an empty seed list and an error if the
    /// sink fails to write.
    pub async fn run<S: RecordSink>(
        &self,
        seeds: Vec<CanonicalUrl>,
        sink: &mut S,
    ) -> Result<CrawlReport> {
        let strategy = self.config.crawler.strategy;
        let mut seeds = seeds.into_iter();
        let first = seeds.next().ok_or(ConfigError::NoSeeds)?;

        let mut frontier = match self.config.crawler.rng_seed {
            Some(rng_seed) => Frontier::with_seed(strategy, first, rng_seed),
            None => Frontier::new(strategy, first),
        };
        frontier.enqueue(seeds);

        tracing::info!(
            strategy = %strategy,
            seeds = frontier.len(),
            max_pages = self.config.crawler.max_pages,
            workers = self.config.crawler.workers,
            "Starting crawl session"
        );

        let session = Session {
            frontier: Mutex::new(frontier),
            ledger: Mutex::new(Ledger::default()),
            sink: Mutex::new(sink),
            counters: CrawlCounters::default(),
            wake: Notify::new(),
        };
        let started = Instant::now();

        let workers = (0..self.config.crawler.workers).map(|id| self.worker(id, &session));
        futures::future::try_join_all(workers).await?;

        let Session {
            frontier,
            ledger,
            sink,
            counters,
            ..
        } = session;
        sink.into_inner().flush()?;

        let stats = counters.snapshot(started.elapsed());
        let frontier_remaining = frontier.into_inner().len();
        let ledger = ledger.into_inner();

        tracing::info!(
            pages_fetched = stats.pages_fetched,
            records_written = stats.records_written,
            dropped = stats.total_dropped(),
            frontier_remaining,
            "Crawl session finished"
        );

        Ok(CrawlReport {
            stats,
            visited: ledger.order,
            frontier_remaining,
        })
    }

    async fn worker<S: RecordSink>(&self, id: usize, session: &Session<'_, S>) -> Result<()> {
        loop {
            if self.shutdown.is_shutdown() {
                tracing::info!(worker = id, "Shutdown requested, stopping admission");
                break;
            }

            match self.next_step(session).await {
                Step::Fetch(url) => self.process(session, url).await?,
                Step::Wait => {
                    let _ = tokio::time::timeout(IDLE_WAIT, session.wake.notified()).await;
                }
                Step::Done => {
                    session.wake.notify_waiters();
                    break;
                }
            }
        }

        Ok(())
    }

    /// Dequeue and claim the next unvisited URL
    async fn next_step<S>(&self, session: &Session<'_, S>) -> Step {
        let mut frontier = session.frontier.lock().await;
        let mut ledger = session.ledger.lock().await;

        let idle = if ledger.in_flight == 0 {
            Step::Done
        } else {
            Step::Wait
        };

        loop {
            if ledger.visited.len() + ledger.in_flight >= self.config.crawler.max_pages {
                return idle;
            }

            match frontier.dequeue() {
                Err(FrontierError::Empty) => return idle,
                Ok(url) => {
                    if ledger.claimed.contains(&url) {
                        CrawlCounters::incr(&session.counters.duplicates_skipped);
                        continue;
                    }
                    ledger.claimed.insert(url.clone());
                    ledger.in_flight += 1;
                    return Step::Fetch(url);
                }
            }
        }
    }

    /// Fetch one claimed URL and fold the result back into the session
    async fn process<S: RecordSink>(
        &self,
        session: &Session<'_, S>,
        url: CanonicalUrl,
    ) -> Result<()> {
        let page = match self.governor.attempt_fetch(&url).await {
            Ok(page) => page,
            Err(e) => {
                self.record_drop(session, &url, &e);
                session.ledger.lock().await.in_flight -= 1;
                session.wake.notify_waiters();
                return Ok(());
            }
        };

        CrawlCounters::incr(&session.counters.pages_fetched);
        session
            .counters
            .bytes_fetched
            .fetch_add(page.bytes, Ordering::Relaxed);

        let summary = is_html(&page.content_type).then(|| self.parser.parse(&page.body, &url));

        if let Some(summary) = &summary {
            let record = OutputRecord::new(&url, summary);
            session.sink.lock().await.write_record(&record)?;
            CrawlCounters::incr(&session.counters.records_written);
        }

        {
            let mut frontier = session.frontier.lock().await;
            let mut ledger = session.ledger.lock().await;
            ledger.in_flight -= 1;
            ledger.visited.insert(url.clone());
            ledger.order.push(url.clone());

            if let Some(summary) = summary {
                let mut links: Vec<CanonicalUrl> = summary
                    .links
                    .into_iter()
                    .filter(|link| !ledger.visited.contains(link))
                    .collect();
                links.sort_unstable();

                tracing::debug!(
                    url = %url,
                    bytes = page.bytes,
                    links = links.len(),
                    pending = frontier.len(),
                    "Fetched page"
                );

                frontier.enqueue(links);
                frontier.absorb(url);
            } else {
                tracing::debug!(
                    url = %url,
                    content_type = %page.content_type,
                    "Fetched non-HTML page"
                );
            }
        }

        session.wake.notify_waiters();
        Ok(())
    }

    fn record_drop<S>(&self, session: &Session<'_, S>, url: &CanonicalUrl, err: &FetchError) {
        let counters = &session.counters;
        match err {
            FetchError::RobotsDisallowed(_) => CrawlCounters::incr(&counters.robots_denied),
            FetchError::QuotaExceeded { .. } => CrawlCounters::incr(&counters.quota_denied),
            _ => CrawlCounters::incr(&counters.fetch_errors),
        }

        match err.category() {
            ErrorCategory::Politeness => {
                tracing::debug!(url = %url, error = %err, "Dropping URL");
            }
            category => {
                tracing::warn!(
                    url = %url,
                    category = category.as_str(),
                    error = %err,
                    "Dropping URL"
                );
            }
        }
    }
}
