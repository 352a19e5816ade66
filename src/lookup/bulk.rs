//! Deduplicated, concurrent bulk resolution
//!
//! A batch is tallied first, so every distinct address is resolved exactly
//! once no matter how often it was submitted. Resolutions run as
//! independent tasks behind a semaphore sized to the worker count; the
//! engine waits for all of them before returning and collects the
//! successful records in completion order.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::lookup::models::{FrequencyEntry, LocationRecord};
use crate::lookup::resolver::Resolver;

/// Number of entries in the frequency ranking
pub const TOP_N: usize = 5;

/// Split raw user input into address tokens on any run of whitespace.
///
/// Order and duplicates are preserved; nothing is validated.
pub fn split_addresses(input: &str) -> Vec<String> {
    input.split_whitespace().map(str::to_string).collect()
}

/// Occurrence counts over a token sequence, in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    entries: Vec<FrequencyEntry>,
}

impl FrequencyTable {
    pub fn tally<S: AsRef<str>>(tokens: &[S]) -> Self {
        let mut index: HashMap<&str, usize> = HashMap::with_capacity(tokens.len());
        let mut entries: Vec<FrequencyEntry> = Vec::new();

        for token in tokens {
            let token = token.as_ref();
            match index.get(token) {
                Some(&slot) => entries[slot].count += 1,
                None => {
                    index.insert(token, entries.len());
                    entries.push(FrequencyEntry::new(token, 1));
                }
            }
        }

        Self { entries }
    }

    /// Distinct tokens, first-seen order
    pub fn distinct(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.address.as_str())
    }

    /// Number of distinct tokens
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of tokens tallied, duplicates included
    pub fn total(&self) -> usize {
        self.entries.iter().map(|e| e.count).sum()
    }

    /// The `n` most frequent tokens by descending count.
    ///
    /// Equal counts keep first-seen order.
    pub fn top(&self, n: usize) -> Vec<FrequencyEntry> {
        let mut ranked = self.entries.clone();
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked.truncate(n);
        ranked
    }
}

/// Result of one bulk lookup
#[derive(Debug, Clone, Default)]
pub struct BulkOutcome {
    /// Successful resolutions in completion order
    pub results: Vec<LocationRecord>,
    /// Most frequent submitted addresses, at most [`TOP_N`]
    pub top5: Vec<FrequencyEntry>,
}

/// Bulk lookup engine
#[derive(Clone)]
pub struct BulkLookup {
    resolver: Arc<dyn Resolver>,
    workers: usize,
}

impl BulkLookup {
    pub fn new(resolver: Arc<dyn Resolver>, workers: usize) -> Self {
        Self {
            resolver,
            workers: workers.clamp(1, Semaphore::MAX_PERMITS),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Resolve every distinct address in `addresses` and rank them by frequency.
    ///
    /// Never fails: addresses that cannot be resolved are simply absent
    /// from `results`. An empty input yields an empty outcome.
    pub async fn run<S: AsRef<str>>(&self, addresses: &[S]) -> BulkOutcome {
        let table = FrequencyTable::tally(addresses);
        if table.is_empty() {
            return BulkOutcome::default();
        }

        let top5 = table.top(TOP_N);
        let permits = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();

        for address in table.distinct() {
            let resolver = Arc::clone(&self.resolver);
            let permits = Arc::clone(&permits);
            let address = address.to_string();

            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await.ok()?;
                resolver.resolve(&address).await
            });
        }

        debug!(
            distinct = table.len(),
            workers = self.workers,
            provider = self.resolver.name(),
            "dispatched geolocation lookups"
        );

        let mut results = Vec::with_capacity(table.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(record)) => results.push(record),
                Ok(None) => {}
                Err(err) => warn!(error = %err, "geolocation task aborted"),
            }
        }

        info!(
            submitted = table.total(),
            distinct = table.len(),
            resolved = results.len(),
            "bulk lookup finished"
        );

        BulkOutcome { results, top5 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Resolves every address except those listed as failing, recording calls
    struct StubResolver {
        failing: HashSet<String>,
        calls: Mutex<Vec<String>>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl StubResolver {
        fn new(failing: &[&str]) -> Self {
            Self {
                failing: failing.iter().map(|s| s.to_string()).collect(),
                calls: Mutex::new(Vec::new()),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Resolver for StubResolver {
        async fn resolve(&self, address: &str) -> Option<LocationRecord> {
            self.calls.lock().unwrap().push(address.to_string());
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.failing.contains(address) {
                return None;
            }
            Some(LocationRecord::from_payload(
                address,
                &json!({ "status": "success", "lat": 1.0, "lon": 2.0 }),
            ))
        }

        fn name(&self) -> &'static str {
            "stub"
        }
    }

    #[test]
    fn test_split_addresses() {
        assert_eq!(
            split_addresses("  1.1.1.1\t8.8.8.8\n\n1.1.1.1 "),
            vec!["1.1.1.1", "8.8.8.8", "1.1.1.1"]
        );
        assert!(split_addresses("   \n").is_empty());
    }

    #[test]
    fn test_tally_counts_and_order() {
        let table = FrequencyTable::tally(&["b", "a", "b", "c", "a", "b"]);
        assert_eq!(table.distinct().collect::<Vec<_>>(), vec!["b", "a", "c"]);
        assert_eq!(table.total(), 6);
        assert_eq!(table.len(), 3);
        assert_eq!(
            table.top(5),
            vec![
                FrequencyEntry::new("b", 3),
                FrequencyEntry::new("a", 2),
                FrequencyEntry::new("c", 1),
            ]
        );
    }

    #[test]
    fn test_top_breaks_ties_by_first_occurrence() {
        let tokens = ["z", "y", "x", "w", "v", "u", "t", "x"];
        let top = FrequencyTable::tally(&tokens).top(TOP_N);
        let order: Vec<_> = top.iter().map(|e| e.address.as_str()).collect();
        assert_eq!(order, vec!["x", "z", "y", "w", "v"]);
        assert_eq!(top[0].count, 2);
    }

    #[test]
    fn test_tally_total_matches_input_length() {
        let tokens = split_addresses("1.1.1.1 2.2.2.2 1.1.1.1 3.3.3.3 2.2.2.2 1.1.1.1 x");
        let table = FrequencyTable::tally(&tokens);
        assert_eq!(table.total(), tokens.len());
    }

    #[tokio::test]
    async fn test_empty_input() {
        let engine = BulkLookup::new(Arc::new(StubResolver::new(&[])), 4);
        let outcome = engine.run::<&str>(&[]).await;
        assert!(outcome.results.is_empty());
        assert!(outcome.top5.is_empty());
    }

    #[tokio::test]
    async fn test_duplicates_resolved_once() {
        let resolver = Arc::new(StubResolver::new(&[]));
        let engine = BulkLookup::new(resolver.clone(), 4);

        let outcome = engine.run(&["1.1.1.1", "1.1.1.1", "8.8.8.8"]).await;

        let mut resolved: Vec<_> = outcome.results.iter().map(|r| r.address.as_str()).collect();
        resolved.sort();
        assert_eq!(resolved, vec!["1.1.1.1", "8.8.8.8"]);
        assert_eq!(
            outcome.top5,
            vec![FrequencyEntry::new("1.1.1.1", 2), FrequencyEntry::new("8.8.8.8", 1)]
        );
        assert_eq!(resolver.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failures_do_not_affect_siblings() {
        let engine = BulkLookup::new(Arc::new(StubResolver::new(&["10.0.0.1"])), 2);

        let outcome = engine.run(&["1.1.1.1", "10.0.0.1", "8.8.8.8", "9.9.9.9"]).await;

        let resolved: HashSet<_> = outcome.results.iter().map(|r| r.address.clone()).collect();
        assert_eq!(resolved.len(), 3);
        assert!(!resolved.contains("10.0.0.1"));
        assert_eq!(outcome.top5.len(), 4);
    }

    #[tokio::test]
    async fn test_worker_bound_is_respected() {
        let resolver = Arc::new(StubResolver::new(&[]));
        let engine = BulkLookup::new(resolver.clone(), 3);
        let addresses: Vec<String> = (0..20).map(|i| format!("10.0.0.{i}")).collect();

        let outcome = engine.run(&addresses).await;

        assert_eq!(outcome.results.len(), 20);
        assert!(resolver.peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(outcome.top5.len(), TOP_N);
    }

    #[test]
    fn test_zero_workers_clamped() {
        let engine = BulkLookup::new(Arc::new(StubResolver::new(&[])), 0);
        assert_eq!(engine.workers(), 1);
    }

    #[tokio::test]
    async fn test_oversized_worker_count_is_capped() {
        let engine = BulkLookup::new(Arc::new(StubResolver::new(&[])), usize::MAX);
        assert_eq!(engine.workers(), Semaphore::MAX_PERMITS);

        let outcome = engine.run(&["1.1.1.1", "8.8.8.8"]).await;
        assert_eq!(outcome.results.len(), 2);
    }

    /// Sleeps a per-address number of milliseconds before resolving
    struct DelayedResolver {
        delays: HashMap<&'static str, u64>,
    }

    #[async_trait]
    impl Resolver for DelayedResolver {
        async fn resolve(&self, address: &str) -> Option<LocationRecord> {
            let delay = self.delays.get(address).copied().unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Some(LocationRecord::from_payload(address, &json!({ "status": "success" })))
        }

        fn name(&self) -> &'static str {
            "delayed"
        }
    }

    #[tokio::test]
    async fn test_results_arrive_in_completion_order() {
        let resolver = DelayedResolver {
            delays: HashMap::from([("slow", 300), ("medium", 150), ("fast", 5)]),
        };
        let engine = BulkLookup::new(Arc::new(resolver), 4);

        let outcome = engine.run(&["slow", "medium", "fast"]).await;

        let order: Vec<_> = outcome.results.iter().map(|r| r.address.as_str()).collect();
        assert_eq!(order, vec!["fast", "medium", "slow"]);
        assert_eq!(outcome.top5[0].address, "slow");
    }
}
