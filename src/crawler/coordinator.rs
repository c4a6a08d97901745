//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Reconstructing frontier state from the run ledger
//! - Loading the robots.txt policy and seeding the base URL
//! - Running the worker pool over the frontier
//! - Retry and give-up handling for failed fetches
//! - Checking redirect targets against scope and robots.txt
//! - Handling cancellation and writing the unreachable snapshot

use crate::config::Config;
use crate::crawler::cleaner::Cleaner;
use crate::crawler::extractor::ContentBlock;
use crate::crawler::fetcher::{build_http_client, fetch_url, is_html_content_type, FetchResult};
use crate::crawler::frontier::{FailureDecision, Frontier};
use crate::crawler::links::{LinkClass, LinkClassifier};
use crate::crawler::parser::PageParser;
use crate::ledger::{
    spawn_writer, ExternalLinkRecord, JsonlLedger, Ledger, LedgerHandle, LedgerPaths, PageRecord,
    PriorState, UnextractableRecord, UnreachableRecord,
};
use crate::robots::PolicyGate;
use crate::state::PageState;
use crate::url::{is_in_scope, CrawlTarget};
use crate::{HarvestError, Result};
use reqwest::Client;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::task::{JoinHandle, JoinSet};
use url::Url;

/// How long an idle worker waits before looking at the frontier again
const IDLE_POLL: Duration = Duration::from_millis(50);

/// Totals reported at the end of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlSummary {
    /// URLs taken from the frontier this run (retries count again)
    pub processed: u64,
    /// Page records written this run
    pub new_records: u64,
    /// Page records in the ledger, this and earlier runs
    pub total_records: usize,
    pub unreachable: usize,
    pub external_links: usize,
    pub unextractable: u64,
    pub elapsed: Duration,
    /// The run stopped early
    pub cancelled: bool,
}

#[derive(Debug, Default)]
struct RunStats {
    processed: AtomicU64,
    new_records: AtomicU64,
    unextractable: AtomicU64,
}

/// Everything a worker needs, shared behind one `Arc`
struct CrawlContext {
    config: Config,
    base: CrawlTarget,
    client: Client,
    policy: PolicyGate,
    parser: PageParser,
    cleaner: Cleaner,
    links: LinkClassifier,
    ledger: LedgerHandle,
    frontier: Mutex<Frontier>,
    unreachable: Mutex<HashMap<CrawlTarget, UnreachableRecord>>,
    external_links: Mutex<HashSet<String>>,
    unextractable: Mutex<HashSet<CrawlTarget>>,
    stats: RunStats,
    cancel: Arc<AtomicBool>,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    context: Arc<CrawlContext>,
    writer: JoinHandle<JsonlLedger>,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// Opens the ledger, reconstructs prior state, loads the robots.txt
    /// policy and seeds the base URL. With `fresh` every page is visited
    /// again and earlier unreachable URLs are retried; existing records are
    /// still known, so none is written twice.
    ///
    /// # Errors
    ///
    /// Fails on an invalid base URL, an unusable ledger location, an HTTP
    /// client that cannot be built, or a base URL the policy disallows.
    pub async fn new(config: Config, fresh: bool) -> Result<Self> {
        let base = CrawlTarget::parse(&config.project.base_url)?;

        let ledger = JsonlLedger::open(LedgerPaths::from(&config.output))?;
        let prior = match ledger.load_prior_state() {
            Ok(state) => state,
            Err(e) => {
                tracing::error!(
                    "Failed to reconstruct prior state: {}. Starting from a clean state",
                    e
                );
                PriorState::default()
            }
        };

        if prior.is_empty() {
            tracing::info!("No previous crawl state found, starting new crawl");
        } else {
            tracing::info!(
                "Resuming: {} recorded, {} unreachable, {} external links",
                prior.recorded.len(),
                prior.unreachable.len(),
                prior.external_links.len()
            );
        }

        let mut frontier = Frontier::new(config.crawler.max_retries);
        let unreachable = if fresh {
            tracing::info!(
                "Fresh run requested; revisiting every page ({} existing records are kept)",
                prior.recorded.len()
            );
            for target in &prior.recorded {
                frontier.remember_recorded(target);
            }
            HashMap::new()
        } else {
            for target in &prior.recorded {
                frontier.mark_recorded(target);
            }
            for target in &prior.unextractable {
                frontier.mark_visited(target);
            }
            if config.crawler.retry_unreachable {
                tracing::info!(
                    "{} previously unreachable URLs may be retried",
                    prior.unreachable.len()
                );
            } else {
                for target in prior.unreachable.keys() {
                    frontier.mark_visited(target);
                }
            }
            prior.unreachable
        };

        let client = build_http_client(&config.http, &config.crawler)?;
        let policy = PolicyGate::load(&client, base.as_url()).await;

        if !policy.allows(&config.http.robots_agent, base.as_str()) {
            return Err(HarvestError::RobotsDenied {
                url: base.to_string(),
            });
        }
        frontier.seed(&base);

        let parser = PageParser::new()?;
        let cleaner = Cleaner::new(config.crawler.min_content_length)?;
        let links = LinkClassifier::new(&config.links);
        let (ledger, writer) = spawn_writer(ledger);

        let context = CrawlContext {
            config,
            base,
            client,
            policy,
            parser,
            cleaner,
            links,
            ledger,
            frontier: Mutex::new(frontier),
            unreachable: Mutex::new(unreachable),
            external_links: Mutex::new(prior.external_links),
            unextractable: Mutex::new(prior.unextractable),
            stats: RunStats::default(),
            cancel: Arc::new(AtomicBool::new(false)),
        };

        Ok(Self {
            context: Arc::new(context),
            writer,
        })
    }

    /// Flag that stops the run between dequeues once set
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.context.cancel)
    }

    /// Runs the main crawl loop
    ///
    /// Workers pull URLs until the frontier is exhausted or the run is
    /// cancelled; the unreachable snapshot is written in both cases.
    pub async fn run(self) -> Result<CrawlSummary> {
        let started = Instant::now();
        let context = self.context;
        let workers = context.config.crawler.workers.max(1);

        tracing::info!(
            "Starting crawl of {} with {} worker(s)",
            context.base,
            workers
        );

        let mut pool = JoinSet::new();
        for id in 0..workers {
            pool.spawn(worker(Arc::clone(&context), id));
        }
        while let Some(joined) = pool.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Worker task failed: {}", e);
            }
        }

        let cancelled = context.cancel.load(Ordering::SeqCst);
        if cancelled {
            tracing::warn!("Crawl interrupted; saving state");
        } else {
            tracing::info!("Frontier is empty, crawl complete");
        }

        let mut snapshot: Vec<UnreachableRecord> =
            context.lock_unreachable().values().cloned().collect();
        snapshot.sort_by(|a, b| a.url.cmp(&b.url));
        let unreachable = snapshot.len();
        context.ledger.write_unreachable_snapshot(snapshot).await?;

        let summary = CrawlSummary {
            processed: context.stats.processed.load(Ordering::SeqCst),
            new_records: context.stats.new_records.load(Ordering::SeqCst),
            total_records: context.lock_frontier().recorded_count(),
            unreachable,
            external_links: context.lock_external_links().len(),
            unextractable: context.stats.unextractable.load(Ordering::SeqCst),
            elapsed: started.elapsed(),
            cancelled,
        };

        // last handle gone: the writer drains and exits
        drop(context);
        if let Err(e) = self.writer.await {
            tracing::error!("Ledger writer failed: {}", e);
        }

        Ok(summary)
    }
}

enum Next {
    Url(CrawlTarget),
    Wait,
    Done,
}

async fn worker(context: Arc<CrawlContext>, id: usize) {
    loop {
        if context.cancel.load(Ordering::SeqCst) {
            tracing::debug!("Worker {} stopping: run cancelled", id);
            break;
        }

        let next = {
            let mut frontier = context.lock_frontier();
            match frontier.dequeue() {
                Some(target) => Next::Url(target),
                None if frontier.is_exhausted() => Next::Done,
                None => Next::Wait,
            }
        };

        match next {
            Next::Done => break,
            Next::Wait => tokio::time::sleep(IDLE_POLL).await,
            Next::Url(target) => {
                let state = context.process_url(&target).await;
                {
                    let mut frontier = context.lock_frontier();
                    if state.is_terminal() {
                        frontier.complete(&target);
                    } else {
                        frontier.retry(&target);
                    }
                }
                context.finish_page(&target, state);
            }
        }
    }
}

impl CrawlContext {
    fn lock_frontier(&self) -> MutexGuard<'_, Frontier> {
        self.frontier.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_unreachable(&self) -> MutexGuard<'_, HashMap<CrawlTarget, UnreachableRecord>> {
        self.unreachable.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_external_links(&self) -> MutexGuard<'_, HashSet<String>> {
        self.external_links
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_unextractable(&self) -> MutexGuard<'_, HashSet<CrawlTarget>> {
        self.unextractable
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Processes a single URL
    ///
    /// This method:
    /// 1. Fetches the page
    /// 2. Records it, unless an earlier run already did
    /// 3. Classifies its links and queues the in-scope ones
    ///
    /// Returns the state the URL ends this attempt in.
    async fn process_url(&self, target: &CrawlTarget) -> PageState {
        tracing::debug!("Processing URL: {}", target);

        match fetch_url(&self.client, target).await {
            FetchResult::Success { content_type, body } => {
                self.handle_page(target, &content_type, &body).await
            }
            FetchResult::Redirect { location } => self.handle_redirect(target, location),
            FetchResult::Transient { cause } => self.handle_transient(target, cause).await,
            FetchResult::Fatal { cause } => {
                tracing::error!("Giving up on {}: {}", target, cause);
                self.give_up(target, cause);
                PageState::GaveUp
            }
        }
    }

    async fn handle_page(
        &self,
        target: &CrawlTarget,
        content_type: &str,
        body: &str,
    ) -> PageState {
        if !is_html_content_type(content_type) {
            tracing::warn!("Skipping {}: unsupported content type {}", target, content_type);
            self.give_up(target, format!("Unsupported content type: {}", content_type));
            return PageState::GaveUp;
        }

        let page = self.parser.parse(body);

        let already_recorded = self.lock_frontier().is_recorded(target);
        let state = if already_recorded {
            tracing::debug!("{} already recorded; following links only", target);
            self.lock_frontier().mark_visited(target);
            PageState::Recorded
        } else {
            self.record_page(target, page.extraction.into_block()).await
        };

        self.follow_links(target, target.as_url(), &page.hrefs).await;
        state
    }

    /// A redirect target is a new candidate URL
    ///
    /// It has to pass the same scope and robots.txt checks as a discovered
    /// link before it may enter the frontier.
    fn handle_redirect(&self, target: &CrawlTarget, location: Url) -> PageState {
        let next = match CrawlTarget::from_url(location) {
            Ok(next) => next,
            Err(e) => {
                tracing::warn!("Giving up on {}: invalid redirect target ({})", target, e);
                self.give_up(target, format!("Redirect to invalid URL: {}", e));
                return PageState::GaveUp;
            }
        };

        if !is_in_scope(next.as_url(), self.base.as_url()) {
            tracing::warn!("{} redirects out of scope to {}", target, next);
            self.give_up(target, format!("Redirected out of scope: {}", next));
            return PageState::GaveUp;
        }

        if !self.policy.allows(&self.config.http.robots_agent, next.as_str()) {
            tracing::warn!("{} redirects to {}, disallowed by robots.txt", target, next);
            self.give_up(target, format!("Redirect target disallowed by robots.txt: {}", next));
            return PageState::GaveUp;
        }

        let mut frontier = self.lock_frontier();
        frontier.mark_visited(target);
        if frontier.enqueue(&next) {
            tracing::debug!("{} redirects to {}; queued", target, next);
        } else {
            tracing::debug!("{} redirects to {}, already known", target, next);
        }
        PageState::Redirected
    }

    async fn handle_transient(&self, target: &CrawlTarget, cause: String) -> PageState {
        let decision = self.lock_frontier().record_failure(target);
        let max_retries = self.config.crawler.max_retries;

        match decision {
            FailureDecision::Retry { attempt } => {
                let delay = self.config.crawler.retry_delay_ms;
                tracing::warn!(
                    "Attempt {}/{} for {} failed: {}. Retrying in {} ms",
                    attempt,
                    max_retries,
                    target,
                    cause,
                    delay
                );
                // still in flight while cooling down; the worker re-queues it
                tokio::time::sleep(Duration::from_millis(delay)).await;
                PageState::Retrying
            }
            FailureDecision::GiveUp { attempts } => {
                tracing::error!(
                    "Giving up on {} after {} attempts: {}",
                    target,
                    attempts,
                    cause
                );
                self.give_up(target, cause);
                PageState::GaveUp
            }
        }
    }

    async fn record_page(
        &self,
        target: &CrawlTarget,
        block: Option<ContentBlock>,
    ) -> PageState {
        let block = match block {
            Some(block) => block,
            None => {
                tracing::warn!("No main content found on {}; no record written", target);
                return self.mark_unextractable(target, "No main content found").await;
            }
        };

        let content = match self.cleaner.clean(&block.text, target.as_url()) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", target, e);
                return self.mark_unextractable(target, e.to_string()).await;
            }
        };

        let record = PageRecord::new(target, block.title, content, &self.config.project.name);
        match self.ledger.append_page_record(record).await {
            Ok(()) => {
                self.lock_frontier().mark_recorded(target);
                self.lock_unreachable().remove(target);
                self.stats.new_records.fetch_add(1, Ordering::SeqCst);
                tracing::info!("Recorded {}", target);
                PageState::Recorded
            }
            Err(e) => {
                // not unreachable either, so a later run fetches it again
                tracing::error!("Failed to write record for {}: {}", target, e);
                self.lock_frontier().mark_visited(target);
                PageState::GaveUp
            }
        }
    }

    async fn follow_links(&self, source: &CrawlTarget, current: &Url, hrefs: &[String]) {
        let agent = &self.config.http.robots_agent;

        for href in hrefs {
            match self.links.classify(href, current, self.base.as_url()) {
                LinkClass::InScope(link) => {
                    if self.lock_frontier().contains(&link) {
                        continue;
                    }
                    if !self.policy.allows(agent, link.as_str()) {
                        tracing::debug!("Disallowed by robots.txt: {}", link);
                        continue;
                    }
                    if self.lock_frontier().enqueue(&link) {
                        tracing::trace!("Queued {}", link);
                    }
                }
                LinkClass::ExternalOfInterest { url, extension } => {
                    let first_sighting = self.lock_external_links().insert(url.clone());
                    if !first_sighting {
                        continue;
                    }

                    let record = ExternalLinkRecord::new(&url, source, &extension);
                    match self.ledger.append_external_link(record).await {
                        Ok(()) => tracing::debug!("Collected external link {} ({})", url, extension),
                        Err(e) => {
                            tracing::error!("Failed to write external link {}: {}", url, e);
                            self.lock_external_links().remove(&url);
                        }
                    }
                }
                LinkClass::Ignored(reason) => {
                    tracing::trace!("Ignoring link '{}' on {}: {}", href, source, reason);
                }
            }
        }
    }

    /// Consumes `target` without a record and remembers it for later runs
    async fn mark_unextractable(
        &self,
        target: &CrawlTarget,
        reason: impl Into<String>,
    ) -> PageState {
        self.lock_frontier().mark_visited(target);

        let first_sighting = self.lock_unextractable().insert(target.clone());
        if first_sighting {
            let record = UnextractableRecord::new(target, reason);
            if let Err(e) = self.ledger.append_unextractable(record).await {
                tracing::error!("Failed to write unextractable entry for {}: {}", target, e);
                self.lock_unextractable().remove(target);
            }
        }
        PageState::Unextractable
    }

    fn give_up(&self, target: &CrawlTarget, reason: String) {
        self.lock_frontier().mark_visited(target);
        self.lock_unreachable()
            .insert(target.clone(), UnreachableRecord::new(target, reason));
    }

    fn finish_page(&self, target: &CrawlTarget, state: PageState) {
        tracing::trace!("{} -> {}", target, state);
        if state == PageState::Unextractable {
            self.stats.unextractable.fetch_add(1, Ordering::SeqCst);
        }

        let processed = self.stats.processed.fetch_add(1, Ordering::SeqCst) + 1;
        let interval = self.config.crawler.progress_interval.max(1);
        if processed % interval == 0 {
            let (queued, total) = {
                let frontier = self.lock_frontier();
                (frontier.len(), frontier.recorded_count())
            };
            tracing::info!(
                "Progress: {} processed, {} in queue, {} new records ({} total)",
                processed,
                queued,
                self.stats.new_records.load(Ordering::SeqCst),
                total
            );
        }
    }
}

/// Runs a complete crawl with Ctrl-C wired to cancellation
///
/// # Example
///
/// ```no_run
/// use doc_harvest::config::load_config;
/// use doc_harvest::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("harvest.toml"))?;
/// let summary = run_crawl(config, false).await?;
/// println!("{} new records", summary.new_records);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config, fresh: bool) -> Result<CrawlSummary> {
    let coordinator = Coordinator::new(config, fresh).await?;

    let cancel = coordinator.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received; finishing in-flight pages");
            cancel.store(true, Ordering::SeqCst);
        }
    });

    coordinator.run().await
}
