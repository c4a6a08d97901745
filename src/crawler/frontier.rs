//! URL frontier
//!
//! FIFO queue of URLs still to process together with the membership sets that
//! keep the crawl from repeating itself. The frontier is shared by all workers
//! behind one mutex; none of its methods block or await.

use crate::url::CrawlTarget;
use std::collections::{HashMap, HashSet, VecDeque};

/// What to do with a URL whose fetch failed transiently
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureDecision {
    /// Attempts remain; put the URL back in the queue
    Retry { attempt: u32 },
    /// The attempt budget is spent
    GiveUp { attempts: u32 },
}

/// Pending and processed URLs of a crawl
#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<CrawlTarget>,
    queued: HashSet<CrawlTarget>,
    visited: HashSet<CrawlTarget>,
    recorded: HashSet<CrawlTarget>,
    attempts: HashMap<CrawlTarget, u32>,
    in_flight: HashSet<CrawlTarget>,
    max_retries: u32,
}

impl Frontier {
    pub fn new(max_retries: u32) -> Self {
        Self {
            queue: VecDeque::new(),
            queued: HashSet::new(),
            visited: HashSet::new(),
            recorded: HashSet::new(),
            attempts: HashMap::new(),
            in_flight: HashSet::new(),
            max_retries,
        }
    }

    /// Adds `target` at the back of the queue unless it is already known
    pub fn enqueue(&mut self, target: &CrawlTarget) -> bool {
        if self.contains(target) {
            return false;
        }

        self.push(target);
        true
    }

    /// Ends a failed attempt and puts the URL back at the end of the queue
    ///
    /// Leaving the in-flight set and re-entering the queue happen in one step,
    /// so no other worker ever sees the URL as unknown in between.
    pub fn retry(&mut self, target: &CrawlTarget) -> bool {
        self.in_flight.remove(target);
        if self.visited.contains(target) || self.queued.contains(target) {
            return false;
        }

        self.push(target);
        true
    }

    fn push(&mut self, target: &CrawlTarget) {
        self.queued.insert(target.clone());
        self.queue.push_back(target.clone());
    }

    /// Queues `target` even if an earlier run visited it
    ///
    /// Only used for the base URL, which is where link discovery restarts.
    pub fn seed(&mut self, target: &CrawlTarget) -> bool {
        self.visited.remove(target);
        self.enqueue(target)
    }

    /// Takes the oldest queued URL and counts it as in flight
    pub fn dequeue(&mut self) -> Option<CrawlTarget> {
        let target = self.queue.pop_front()?;
        self.queued.remove(&target);
        self.in_flight.insert(target.clone());
        Some(target)
    }

    /// Ends the in-flight period started by [`Frontier::dequeue`]
    pub fn complete(&mut self, target: &CrawlTarget) {
        self.in_flight.remove(target);
    }

    pub fn mark_visited(&mut self, target: &CrawlTarget) {
        self.visited.insert(target.clone());
    }

    /// True if `target` is visited, queued or held by a worker
    pub fn contains(&self, target: &CrawlTarget) -> bool {
        self.visited.contains(target)
            || self.queued.contains(target)
            || self.in_flight.contains(target)
    }

    /// Notes that `target` has a page record; it is also visited from now on
    pub fn mark_recorded(&mut self, target: &CrawlTarget) {
        self.visited.insert(target.clone());
        self.recorded.insert(target.clone());
    }

    /// Notes an earlier page record without marking the URL visited
    ///
    /// The page is fetched again for its links but never recorded twice.
    pub fn remember_recorded(&mut self, target: &CrawlTarget) {
        self.recorded.insert(target.clone());
    }

    pub fn is_recorded(&self, target: &CrawlTarget) -> bool {
        self.recorded.contains(target)
    }

    /// Counts a failed attempt and decides whether another one is allowed
    pub fn record_failure(&mut self, target: &CrawlTarget) -> FailureDecision {
        let count = self.attempts.entry(target.clone()).or_insert(0);
        *count += 1;

        if *count < self.max_retries {
            FailureDecision::Retry { attempt: *count }
        } else {
            FailureDecision::GiveUp { attempts: *count }
        }
    }

    /// True when no work is queued and no worker holds a URL
    pub fn is_exhausted(&self) -> bool {
        self.queue.is_empty() && self.in_flight.is_empty()
    }

    /// Number of queued URLs
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn recorded_count(&self) -> usize {
        self.recorded.len()
    }
}
