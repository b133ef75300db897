//! Per-process memo of fallback location lookups.
//!
//! # Lifecycle
//! - `new`: built once at startup around a [`MetadataResolver`]
//! - `get_or_resolve`: first lookup for a distribution starts the resolver,
//!   every later or concurrent lookup awaits that same result
//! - `clear`: drops every entry; the next lookup resolves again
//!
//! Entries never expire. Each lookup runs on its own tokio task, so it keeps
//! going (and its result stays cached) after every waiter has given up.

use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use crate::metadata::{MetadataResolver, ResolutionError, ResolutionResult};
use crate::observability::metrics;

type SharedResolution = Shared<BoxFuture<'static, ResolutionResult<Option<String>>>>;

/// What to do with lookups that ended in an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Keep failed lookups cached like any other result. When `false`, the
    /// first caller to observe a failure evicts it so the next lookup retries.
    pub retain_failures: bool,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            retain_failures: true,
        }
    }
}

/// State of a cached lookup, as reported to the admin API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryState {
    Pending,
    Resolved,
    Absent,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheEntrySummary {
    pub distribution_id: String,
    pub state: EntryState,
}

/// Memo table from distribution id to its (possibly still running) lookup.
#[derive(Clone)]
pub struct ResolutionCache {
    resolver: Arc<dyn MetadataResolver>,
    entries: Arc<DashMap<String, SharedResolution>>,
    policy: CachePolicy,
}

impl ResolutionCache {
    pub fn new(resolver: Arc<dyn MetadataResolver>, policy: CachePolicy) -> Self {
        Self {
            resolver,
            entries: Arc::new(DashMap::new()),
            policy,
        }
    }

    /// Fallback location for `distribution_id`, resolving it on first use.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn get_or_resolve(
        &self,
        account_id: &str,
        distribution_id: &str,
    ) -> ResolutionResult<Option<String>> {
        let entry = self.entry(account_id, distribution_id);
        let result = entry.clone().await;

        if result.is_err() && !self.policy.retain_failures {
            let evicted = self
                .entries
                .remove_if(distribution_id, |_, current| current.ptr_eq(&entry))
                .is_some();
            if evicted {
                tracing::debug!(distribution_id, "Evicted failed lookup");
                metrics::record_cache_entries(self.entries.len());
            }
        }

        result
    }

    /// Drop every cached lookup. Lookups still running are not cancelled.
    pub fn clear(&self) {
        let dropped = self.entries.len();
        self.entries.clear();
        metrics::record_cache_entries(0);
        tracing::info!(dropped, "Resolution cache cleared");
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Current state of every entry, sorted by distribution id.
    pub fn snapshot(&self) -> Vec<CacheEntrySummary> {
        let mut summaries: Vec<_> = self
            .entries
            .iter()
            .map(|entry| CacheEntrySummary {
                distribution_id: entry.key().clone(),
                state: match entry.value().peek() {
                    None => EntryState::Pending,
                    Some(Ok(Some(_))) => EntryState::Resolved,
                    Some(Ok(None)) => EntryState::Absent,
                    Some(Err(_)) => EntryState::Failed,
                },
            })
            .collect();
        summaries.sort_by(|a, b| a.distribution_id.cmp(&b.distribution_id));
        summaries
    }

    /// Existing entry for `distribution_id`, or a freshly started lookup.
    ///
    /// The miss check and the insert happen under one shard lock, so
    /// concurrent callers can never both start a lookup for the same key.
    fn entry(&self, account_id: &str, distribution_id: &str) -> SharedResolution {
        let mut started = false;
        let entry = self
            .entries
            .entry(distribution_id.to_string())
            .or_insert_with(|| {
                started = true;
                self.start_lookup(account_id, distribution_id)
            })
            .value()
            .clone();

        if started {
            tracing::info!(distribution_id, "Cache miss, resolving fallback location");
            metrics::record_cache_entries(self.entries.len());
        } else {
            tracing::debug!(distribution_id, "Cache hit");
        }
        entry
    }

    fn start_lookup(&self, account_id: &str, distribution_id: &str) -> SharedResolution {
        let lookup = self.resolver.resolve(account_id, distribution_id);
        let distribution = distribution_id.to_string();

        let task = tokio::spawn(async move {
            let started = Instant::now();
            let result = lookup.await;
            metrics::record_resolution(started, result.is_ok());
            match &result {
                Ok(Some(location)) => {
                    tracing::debug!(distribution_id = %distribution, location = %location, "Lookup finished")
                }
                Ok(None) => tracing::debug!(distribution_id = %distribution, "Lookup finished without location"),
                Err(e) => tracing::warn!(distribution_id = %distribution, error = %e, "Lookup failed"),
            }
            result
        });

        let shared = async move {
            task.await
                .unwrap_or_else(|e| Err(ResolutionError::Aborted(e.to_string())))
        }
        .boxed()
        .shared();

        // Drive the shared result to completion even if nobody is waiting, so
        // later snapshots see the settled state.
        tokio::spawn(shared.clone());
        shared
    }
}

impl std::fmt::Debug for ResolutionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionCache")
            .field("entries", &self.entries.len())
            .field("policy", &self.policy)
            .finish()
    }
}
