//! Per-movie asset cache backing the rail cards.
//!
//! Entries are `Option<MovieAssets>`. A stored `None` means "fetched, no
//! assets", which differs from "not fetched yet". Presence of a settled entry
//! is the check, never the value. Concurrent lookups of the same id share one
//! in-flight fetch.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;
use tracing::debug;

use crate::catalog::ApiError;
use crate::models::MovieAssets;
use crate::query::{lock, QueryState};
use crate::repository::MovieRepository;

type Slot = Arc<OnceCell<Option<MovieAssets>>>;

#[derive(Debug, Default)]
pub struct AssetsCache {
    slots: Mutex<HashMap<i64, Slot>>,
}

impl AssetsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// True only once a fetch for `id` has settled successfully.
    pub fn contains(&self, id: i64) -> bool {
        lock(&self.slots)
            .get(&id)
            .is_some_and(|slot| slot.initialized())
    }

    /// The settled value for `id`. `Some(None)` is a cached "no assets".
    pub fn get(&self, id: i64) -> Option<Option<MovieAssets>> {
        lock(&self.slots).get(&id).and_then(|slot| slot.get().cloned())
    }

    pub fn len(&self) -> usize {
        lock(&self.slots)
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        lock(&self.slots).clear();
    }

    /// Returns the cached value for `id` or runs `fetch`, joining a fetch that
    /// is already in flight for the same id. Failures are not cached.
    pub async fn get_or_fetch<F, Fut>(&self, id: i64, fetch: F) -> Result<Option<MovieAssets>, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<MovieAssets>, ApiError>>,
    {
        let slot = lock(&self.slots).entry(id).or_default().clone();
        let value = slot
            .get_or_try_init(|| async {
                debug!(id, "fetching movie assets");
                fetch().await
            })
            .await?;
        Ok(value.clone())
    }

    pub async fn load(
        &self,
        id: i64,
        repository: &dyn MovieRepository,
    ) -> Result<Option<MovieAssets>, ApiError> {
        self.get_or_fetch(id, || repository.get_movie_assets(id)).await
    }
}

/// Revocable "still interested" flag held by a consumer.
#[derive(Debug, Clone)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn revoke(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

/// Asset state of one mounted card.
///
/// Results that resolve after [`CardAssets::unmount`] are dropped instead of
/// being applied. The fetch itself still completes and fills the shared cache.
#[derive(Debug)]
pub struct CardAssets {
    id: i64,
    liveness: Liveness,
    state: Mutex<QueryState<Option<MovieAssets>>>,
}

impl CardAssets {
    pub fn mount(id: i64) -> Self {
        Self {
            id,
            liveness: Liveness::new(),
            state: Mutex::new(QueryState::Idle),
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn state(&self) -> QueryState<Option<MovieAssets>> {
        lock(&self.state).clone()
    }

    pub fn is_mounted(&self) -> bool {
        self.liveness.is_alive()
    }

    pub fn unmount(&self) {
        self.liveness.revoke();
    }

    /// Loads through `cache`. Returns whether the result was applied.
    pub async fn load_with<F, Fut>(&self, cache: &AssetsCache, fetch: F) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<MovieAssets>, ApiError>>,
    {
        if !self.apply(QueryState::Pending) {
            return false;
        }
        let result = cache.get_or_fetch(self.id, fetch).await;
        let applied = self.apply(QueryState::from(result));
        if !applied {
            debug!(id = self.id, "card unmounted before assets resolved");
        }
        applied
    }

    pub async fn load(&self, cache: &AssetsCache, repository: &dyn MovieRepository) -> bool {
        let id = self.id;
        self.load_with(cache, || repository.get_movie_assets(id)).await
    }

    fn apply(&self, next: QueryState<Option<MovieAssets>>) -> bool {
        if !self.liveness.is_alive() {
            return false;
        }
        *lock(&self.state) = next;
        true
    }
}

impl Drop for CardAssets {
    fn drop(&mut self) {
        self.liveness.revoke();
    }
}
