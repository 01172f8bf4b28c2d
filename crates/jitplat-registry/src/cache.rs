//! Process-wide backend client cache.
//!
//! Backend clients are expensive to build and must be shared: every caller
//! asking for structurally equal [`BackendClientOptions`] receives the same
//! [`BackendClient`]. Construction happens while the key's map entry is held,
//! so concurrent callers with equal options race to exactly one build.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use jitplat_core::{BackendClient, BackendClientOptions};
use tracing::{debug, info};

use crate::error::Result;

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub created: usize,
    pub entries: usize,
}

/// Get-or-create cache of backend clients keyed by their options.
#[derive(Debug, Default)]
pub struct BackendClientCache {
    clients: DashMap<BackendClientOptions, Arc<BackendClient>>,
    hits: AtomicUsize,
    created: AtomicUsize,
}

impl BackendClientCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the client for `options`, constructing it on first use.
    ///
    /// Construction failures are returned and not cached; a later call with
    /// the same options tries again.
    pub fn get_or_create(&self, options: &BackendClientOptions) -> Result<Arc<BackendClient>> {
        if let Some(client) = self.clients.get(options) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(client.value()));
        }

        match self.clients.entry(options.clone()) {
            Entry::Occupied(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok(Arc::clone(entry.get()))
            }
            Entry::Vacant(entry) => {
                let client = Arc::new(BackendClient::create(options.clone())?);
                self.created.fetch_add(1, Ordering::Relaxed);
                info!(
                    client = %client.id(),
                    platform = %options.platform.name,
                    threads = options.intra_op_parallelism_threads,
                    devices = ?client.devices(),
                    "created backend client"
                );
                entry.insert(Arc::clone(&client));
                Ok(client)
            }
        }
    }

    /// Whether a client exists for `options`.
    pub fn contains(&self, options: &BackendClientOptions) -> bool {
        self.clients.contains_key(options)
    }

    /// Number of cached clients.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Drop every cached client. Clients still held elsewhere stay alive
    /// until their last reference goes away.
    pub fn clear(&self) {
        debug!(entries = self.clients.len(), "clearing backend client cache");
        self.clients.clear();
    }

    /// Return cache usage statistics.
    pub fn statistics(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            created: self.created.load(Ordering::Relaxed),
            entries: self.clients.len(),
        }
    }
}
