//! Bounded TTL cache wrapper around a [`ContentGenerator`].
//!
//! Keys on the full request JSON, so any change to the unit, its context,
//! or the selection produces a fresh generation. Insertion order drives
//! eviction: when full, the oldest entry goes first. Expired entries are
//! dropped on read.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use lexi_core::content::StagePayload;
use lexi_settings::CacheSettings;

use crate::errors::Result;
use crate::generator::{ContentGenerator, StageRequest};

struct CacheEntry {
    payload: StagePayload,
    inserted_at: Instant,
}

struct CacheState {
    entries: HashMap<String, CacheEntry>,
    order: VecDeque<String>,
}

/// Caching wrapper. Hits skip the inner generator entirely.
pub struct CachedGenerator<G> {
    inner: G,
    max_entries: usize,
    ttl: Duration,
    state: Mutex<CacheState>,
}

impl<G> CachedGenerator<G> {
    /// Wrap `inner` with the given cache settings.
    pub fn new(inner: G, settings: &CacheSettings) -> Self {
        Self {
            inner,
            max_entries: settings.max_entries.max(1),
            ttl: Duration::from_secs(settings.ttl_secs),
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    fn key(request: &StageRequest) -> Result<String> {
        Ok(serde_json::to_string(request)?)
    }

    fn lookup(&self, key: &str) -> Option<StagePayload> {
        let mut state = self.state.lock();
        match state.entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                Some(entry.payload.clone())
            }
            Some(_) => {
                let _ = state.entries.remove(key);
                state.order.retain(|k| k != key);
                None
            }
            None => None,
        }
    }

    fn insert(&self, key: String, payload: StagePayload) {
        let mut state = self.state.lock();
        while state.entries.len() >= self.max_entries {
            let Some(oldest) = state.order.pop_front() else {
                break;
            };
            let _ = state.entries.remove(&oldest);
        }
        state.order.push_back(key.clone());
        let _ = state.entries.insert(
            key,
            CacheEntry {
                payload,
                inserted_at: Instant::now(),
            },
        );
    }
}

#[async_trait]
impl<G: ContentGenerator> ContentGenerator for CachedGenerator<G> {
    async fn generate(&self, request: &StageRequest) -> Result<StagePayload> {
        let key = Self::key(request)?;
        if let Some(payload) = self.lookup(&key) {
            debug!(stage = %request.stage, "generator cache hit");
            return Ok(payload);
        }
        let payload = self.inner.generate(request).await?;
        self.insert(key, payload.clone());
        Ok(payload)
    }
}
