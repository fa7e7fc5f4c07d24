// src/crawl/registry.rs
// =============================================================================
// The visited registry: URL -> CheckOutcome, shared by every fetch in flight.
//
// This is the one piece of shared mutable state in a crawl, and the single
// source of truth for "has this URL been seen?". The rules:
// - A URL enters the registry at most once. The first claim wins.
// - Claiming is check-and-insert under one lock. There is no way to ask
//   "is it there?" and then insert later, which is exactly the gap that lets
//   two workers fetch the same URL.
// - A claimed slot holds a placeholder until its fetch finishes and `store`
//   fills it in.
// - Entries are never removed. The map only grows until the crawl ends.
//
// Rust concepts:
// - Mutex<HashMap>: every method takes the lock for one map operation and
//   releases it before returning, so no guard ever lives across an .await
// - Entry API: `entry(url).or_insert(..)` style insertion in a single lookup
// =============================================================================

use crate::checker::{CheckOutcome, Referrer};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
pub struct Registry {
    entries: Mutex<HashMap<String, CheckOutcome>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic elsewhere cannot leave the map half-updated: each critical
    // section is a single insert or field write. So a poisoned lock is
    // still safe to use.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, CheckOutcome>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pre-populates ignored URLs. They count as visited and are never fetched.
    pub fn seed_ignored<I>(&self, urls: I)
    where
        I: IntoIterator<Item = String>,
    {
        let mut entries = self.lock();
        for url in urls {
            entries.entry(url).or_insert_with(CheckOutcome::ignored);
        }
    }

    /// Reserves `url` for fetching. Returns true only for the caller that
    /// inserted it; everyone else gets false and must skip the URL.
    pub fn claim_if_absent(&self, url: &str, referrer: &Referrer) -> bool {
        match self.lock().entry(url.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(CheckOutcome::new(referrer.clone()));
                true
            }
        }
    }

    /// Records the outcome of a fetch, replacing the claim placeholder.
    pub fn store(&self, url: &str, outcome: CheckOutcome) {
        self.lock().insert(url.to_string(), outcome);
    }

    /// Marks a page as expanded so it is never expanded again.
    pub fn mark_recursed(&self, url: &str) {
        if let Some(outcome) = self.lock().get_mut(url) {
            outcome.recursed = true;
            outcome.body = None;
        }
    }

    /// Hands out a page's body for expansion, at most once.
    ///
    /// Returns None for unknown URLs, ignored entries, pages already
    /// expanded, and fetches that produced no body.
    pub fn take_body_for_recursion(&self, url: &str) -> Option<String> {
        let mut entries = self.lock();
        let outcome = entries.get_mut(url)?;
        if outcome.recursed || outcome.is_ignored() {
            return None;
        }
        outcome.body.take()
    }

    /// A copy of the outcome stored for `url`
    #[cfg(test)]
    pub fn get(&self, url: &str) -> Option<CheckOutcome> {
        self.lock().get(url).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Consumes the registry, sorted by URL for stable reporting.
    pub fn into_entries(self) -> Vec<(String, CheckOutcome)> {
        let map = self.entries.into_inner().unwrap_or_else(PoisonError::into_inner);
        let mut entries: Vec<_> = map.into_iter().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}
