//! Keyed query cache with staleness and latest-request-wins semantics.
//!
//! Each query type binds one use case to a cache key. A fetch takes a
//! generation number when it starts. Its result is stored only if no newer
//! fetch for the same key started in the meantime. Settled entries are swept
//! once they outlive their retention window, or when the cache is over capacity.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::catalog::ApiError;
use crate::models::{FeaturedRails, MovieDetail, MovieSummary};
use crate::use_cases::{GetFeaturedRailsUseCase, GetMovieDetailUseCase, SearchMoviesUseCase, UseCases};

pub const FEATURED_RAILS_KEY: &str = "featured-rails";
pub const DETAIL_STALE_TIME: Duration = Duration::from_secs(120);
/// Settled entries are kept at least this long, even when already stale.
pub const MIN_RETAIN_TIME: Duration = Duration::from_secs(300);
pub const MAX_QUERY_ENTRIES: usize = 1_000;

#[derive(Debug, Clone)]
pub enum QueryState<T> {
    /// Nothing fetched yet, or the query is disabled.
    Idle,
    Pending,
    Error(Arc<ApiError>),
    Success(T),
}

impl<T> QueryState<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, QueryState::Pending)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            QueryState::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            QueryState::Error(err) => Some(err),
            _ => None,
        }
    }
}

impl<T> From<Result<T, ApiError>> for QueryState<T> {
    fn from(result: Result<T, ApiError>) -> Self {
        match result {
            Ok(data) => QueryState::Success(data),
            Err(err) => QueryState::Error(Arc::new(err)),
        }
    }
}

#[derive(Debug)]
struct Entry<T> {
    state: QueryState<T>,
    fetched_at: Option<Instant>,
    settled_at: Option<Instant>,
    generation: u64,
    in_flight: bool,
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug)]
pub struct QueryCache<K, T> {
    entries: Mutex<HashMap<K, Entry<T>>>,
    stale_time: Duration,
    retain_for: Duration,
    max_entries: usize,
    generations: AtomicU64,
}

impl<K, T> QueryCache<K, T>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    T: Clone,
{
    pub fn new(stale_time: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            stale_time,
            retain_for: stale_time.max(MIN_RETAIN_TIME),
            max_entries: MAX_QUERY_ENTRIES,
            generations: AtomicU64::new(0),
        }
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn stale_time(&self) -> Duration {
        self.stale_time
    }

    pub fn state(&self, key: &K) -> QueryState<T> {
        lock(&self.entries)
            .get(key)
            .map(|e| e.state.clone())
            .unwrap_or(QueryState::Idle)
    }

    /// True while a successful result is younger than the stale time.
    pub fn is_fresh(&self, key: &K) -> bool {
        lock(&self.entries).get(key).is_some_and(|e| {
            matches!(e.state, QueryState::Success(_))
                && e.fetched_at
                    .is_some_and(|at| at.elapsed() < self.stale_time)
        })
    }

    /// Always runs `fut`. Returns this fetch's own outcome; the cache keeps it
    /// only if no newer fetch for `key` started meanwhile.
    pub async fn fetch<Fut>(&self, key: K, fut: Fut) -> QueryState<T>
    where
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let generation = self.begin(&key);
        let state = QueryState::from(fut.await);
        self.settle(&key, generation, state.clone());
        state
    }

    /// Serves a fresh cached success, otherwise fetches.
    pub async fn get_or_fetch<F, Fut>(&self, key: K, make: F) -> QueryState<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        if self.is_fresh(&key) {
            return self.state(&key);
        }
        self.fetch(key, make()).await
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }

    pub fn invalidate(&self, key: &K) {
        lock(&self.entries).remove(key);
    }

    pub fn clear(&self) {
        lock(&self.entries).clear();
    }

    fn begin(&self, key: &K) -> u64 {
        let generation = self.generations.fetch_add(1, Ordering::Relaxed) + 1;
        let mut entries = lock(&self.entries);
        self.prune(&mut entries, key);
        let entry = entries.entry(key.clone()).or_insert(Entry {
            state: QueryState::Idle,
            fetched_at: None,
            settled_at: None,
            generation,
            in_flight: true,
        });
        entry.generation = generation;
        entry.in_flight = true;
        // A refetch keeps serving the previous data until it settles.
        if !matches!(entry.state, QueryState::Success(_)) {
            entry.state = QueryState::Pending;
        }
        generation
    }

    fn settle(&self, key: &K, generation: u64, state: QueryState<T>) {
        let mut entries = lock(&self.entries);
        match entries.get_mut(key) {
            Some(entry) if entry.generation == generation => {
                let now = Instant::now();
                if matches!(state, QueryState::Success(_)) {
                    entry.fetched_at = Some(now);
                }
                entry.settled_at = Some(now);
                entry.in_flight = false;
                entry.state = state;
            }
            _ => debug!(?key, generation, "discarding superseded query result"),
        }
    }

    /// Drops settled entries past the retention window. In-flight entries and
    /// `current` always survive; past `max_entries` nothing else does.
    fn prune(&self, entries: &mut HashMap<K, Entry<T>>, current: &K) {
        entries.retain(|k, e| {
            k == current
                || e.in_flight
                || e.settled_at
                    .is_some_and(|at| at.elapsed() <= self.retain_for)
        });
        if entries.len() > self.max_entries {
            let before = entries.len();
            entries.retain(|k, e| k == current || e.in_flight);
            debug!(before, after = entries.len(), "query cache over capacity");
        }
    }
}

/// Home screen rails under a single fixed key.
pub struct FeaturedRailsQuery {
    use_case: GetFeaturedRailsUseCase,
    cache: QueryCache<&'static str, Arc<FeaturedRails>>,
}

impl FeaturedRailsQuery {
    pub fn new(use_case: GetFeaturedRailsUseCase, stale_time: Duration) -> Self {
        Self {
            use_case,
            cache: QueryCache::new(stale_time),
        }
    }

    pub async fn get(&self) -> QueryState<Arc<FeaturedRails>> {
        self.cache
            .get_or_fetch(FEATURED_RAILS_KEY, || self.load())
            .await
    }

    pub async fn refetch(&self) -> QueryState<Arc<FeaturedRails>> {
        self.cache.fetch(FEATURED_RAILS_KEY, self.load()).await
    }

    pub fn state(&self) -> QueryState<Arc<FeaturedRails>> {
        self.cache.state(&FEATURED_RAILS_KEY)
    }

    pub fn is_fresh(&self) -> bool {
        self.cache.is_fresh(&FEATURED_RAILS_KEY)
    }

    pub fn invalidate(&self) {
        self.cache.invalidate(&FEATURED_RAILS_KEY);
    }

    async fn load(&self) -> Result<Arc<FeaturedRails>, ApiError> {
        self.use_case.execute().await.map(Arc::new)
    }
}

/// Search results cached per distinct query string. Empty queries never fetch.
pub struct SearchQuery {
    use_case: SearchMoviesUseCase,
    cache: QueryCache<String, Arc<Vec<MovieSummary>>>,
}

impl SearchQuery {
    pub fn new(use_case: SearchMoviesUseCase, stale_time: Duration) -> Self {
        Self {
            use_case,
            cache: QueryCache::new(stale_time),
        }
    }

    pub fn is_enabled(query: &str) -> bool {
        !query.trim().is_empty()
    }

    pub async fn get(&self, query: &str) -> QueryState<Arc<Vec<MovieSummary>>> {
        if !Self::is_enabled(query) {
            return QueryState::Idle;
        }
        self.cache
            .get_or_fetch(query.to_string(), || async {
                self.use_case.execute(query).await.map(Arc::new)
            })
            .await
    }

    pub fn state(&self, query: &str) -> QueryState<Arc<Vec<MovieSummary>>> {
        self.cache.state(&query.to_string())
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }
}

/// Detail route lookups; a cached `None` means the movie does not exist.
pub struct MovieDetailQuery {
    use_case: GetMovieDetailUseCase,
    cache: QueryCache<i64, Option<Arc<MovieDetail>>>,
}

impl MovieDetailQuery {
    pub fn new(use_case: GetMovieDetailUseCase, stale_time: Duration) -> Self {
        Self {
            use_case,
            cache: QueryCache::new(stale_time),
        }
    }

    pub async fn get(&self, id: i64) -> QueryState<Option<Arc<MovieDetail>>> {
        self.cache
            .get_or_fetch(id, || async {
                self.use_case.execute(id).await.map(|d| d.map(Arc::new))
            })
            .await
    }

    pub fn state(&self, id: i64) -> QueryState<Option<Arc<MovieDetail>>> {
        self.cache.state(&id)
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }
}

pub struct Queries {
    pub featured: FeaturedRailsQuery,
    pub search: SearchQuery,
    pub detail: MovieDetailQuery,
}

impl Queries {
    pub fn new(use_cases: &UseCases, featured_stale: Duration) -> Self {
        Self {
            featured: FeaturedRailsQuery::new(use_cases.get_featured_rails.clone(), featured_stale),
            search: SearchQuery::new(use_cases.search_movies.clone(), Duration::ZERO),
            detail: MovieDetailQuery::new(use_cases.get_movie_detail.clone(), DETAIL_STALE_TIME),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MovieAssets;
    use crate::repository::MovieRepository;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::oneshot;

    #[derive(Default)]
    struct CountingRepo {
        featured_calls: AtomicUsize,
        search_calls: AtomicUsize,
        detail_calls: AtomicUsize,
    }

    #[async_trait]
    impl MovieRepository for CountingRepo {
        async fn get_featured_rails(&self) -> Result<FeaturedRails, ApiError> {
            self.featured_calls.fetch_add(1, Ordering::SeqCst);
            Ok(FeaturedRails::default())
        }
        async fn search_movies(&self, query: &str) -> Result<Vec<MovieSummary>, ApiError> {
            self.search_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![MovieSummary {
                id: 1,
                title: query.to_string(),
                poster_path: None,
                backdrop_path: None,
                vote_average: 0.0,
            }])
        }
        async fn get_movie_by_id(&self, _id: i64) -> Result<Option<MovieDetail>, ApiError> {
            self.detail_calls.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }
        async fn get_movie_assets(&self, _id: i64) -> Result<Option<MovieAssets>, ApiError> {
            Ok(None)
        }
    }

    fn queries(repo: &Arc<CountingRepo>) -> Queries {
        let use_cases = UseCases::new(repo.clone());
        Queries::new(&use_cases, Duration::from_secs(60))
    }

    #[tokio::test(start_paused = true)]
    async fn featured_rails_stay_fresh_until_stale_time() {
        let repo = Arc::new(CountingRepo::default());
        let q = queries(&repo);

        assert!(matches!(q.featured.state(), QueryState::Idle));
        assert!(q.featured.get().await.data().is_some());
        assert!(q.featured.is_fresh());
        q.featured.get().await;
        assert_eq!(repo.featured_calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(!q.featured.is_fresh());
        q.featured.get().await;
        assert_eq!(repo.featured_calls.load(Ordering::SeqCst), 2);

        q.featured.refetch().await;
        assert_eq!(repo.featured_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn empty_search_is_disabled() {
        let repo = Arc::new(CountingRepo::default());
        let q = queries(&repo);
        assert!(matches!(q.search.get("").await, QueryState::Idle));
        assert!(matches!(q.search.get("   ").await, QueryState::Idle));
        assert_eq!(repo.search_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn search_results_are_keyed_per_query() {
        let repo = Arc::new(CountingRepo::default());
        let q = queries(&repo);
        q.search.get("alien").await;
        q.search.get("heat").await;
        assert_eq!(repo.search_calls.load(Ordering::SeqCst), 2);
        let alien = q.search.state("alien");
        assert_eq!(alien.data().map(|v| v[0].title.as_str()), Some("alien"));
        let heat = q.search.state("heat");
        assert_eq!(heat.data().map(|v| v[0].title.as_str()), Some("heat"));
    }

    #[tokio::test]
    async fn detail_caches_not_found() {
        let repo = Arc::new(CountingRepo::default());
        let q = queries(&repo);
        assert!(matches!(q.detail.get(404).await, QueryState::Success(None)));
        assert!(matches!(q.detail.get(404).await, QueryState::Success(None)));
        assert_eq!(repo.detail_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn older_fetch_finishing_last_does_not_clobber_newer_result() {
        let cache: QueryCache<&'static str, &'static str> = QueryCache::new(Duration::from_secs(60));
        let (old_tx, old_rx) = oneshot::channel::<&'static str>();
        let (new_tx, new_rx) = oneshot::channel::<&'static str>();

        let old = cache.fetch("k", async move { Ok(old_rx.await.unwrap()) });
        let new = cache.fetch("k", async move { Ok(new_rx.await.unwrap()) });
        let driver = async move {
            tokio::task::yield_now().await;
            new_tx.send("new").unwrap();
            tokio::task::yield_now().await;
            tokio::task::yield_now().await;
            old_tx.send("old").unwrap();
        };
        let (old_state, new_state, ()) = tokio::join!(old, new, driver);

        assert_eq!(old_state.data(), Some(&"old"));
        assert_eq!(new_state.data(), Some(&"new"));
        assert_eq!(cache.state(&"k").data(), Some(&"new"));
    }

    #[tokio::test]
    async fn errors_are_stored_and_superseded_by_later_success() {
        let cache: QueryCache<&'static str, u32> = QueryCache::new(Duration::from_secs(60));
        let failed = cache
            .fetch("k", async {
                Err(ApiError::Status {
                    path: "/movies/featured".to_string(),
                    status: 500,
                })
            })
            .await;
        assert_eq!(failed.error().and_then(|e| e.status()), Some(500));
        assert!(cache.state(&"k").error().is_some());
        assert!(!cache.is_fresh(&"k"));

        cache.fetch("k", async { Ok(7) }).await;
        assert_eq!(cache.state(&"k").data(), Some(&7));
    }

    #[tokio::test]
    async fn invalidated_key_ignores_in_flight_result() {
        let cache: QueryCache<&'static str, u32> = QueryCache::new(Duration::from_secs(60));
        let (tx, rx) = oneshot::channel::<u32>();
        let pending = cache.fetch("k", async move { Ok(rx.await.unwrap()) });
        let driver = async {
            tokio::task::yield_now().await;
            assert!(cache.state(&"k").is_pending());
            cache.invalidate(&"k");
            tx.send(1).unwrap();
        };
        tokio::join!(pending, driver);
        assert!(matches!(cache.state(&"k"), QueryState::Idle));
    }

    #[tokio::test]
    async fn distinct_keys_do_not_grow_caches_without_bound() {
        let repo = Arc::new(CountingRepo::default());
        let q = queries(&repo);
        for i in 0..10_000 {
            q.search.get(&format!("query {i}")).await;
            q.detail.get(i).await;
        }
        assert_eq!(repo.search_calls.load(Ordering::SeqCst), 10_000);
        assert!(q.search.cached_entries() <= MAX_QUERY_ENTRIES + 1);
        assert!(q.detail.cached_entries() <= MAX_QUERY_ENTRIES + 1);
        // The latest query is still readable after the sweep.
        let last = q.search.state("query 9999");
        assert_eq!(last.data().map(|v| v[0].title.as_str()), Some("query 9999"));
    }

    #[tokio::test(start_paused = true)]
    async fn settled_entries_expire_after_retention_window() {
        let repo = Arc::new(CountingRepo::default());
        let q = queries(&repo);
        q.detail.get(1).await;
        q.detail.get(2).await;
        assert_eq!(q.detail.cached_entries(), 2);

        tokio::time::advance(MIN_RETAIN_TIME + Duration::from_secs(1)).await;
        q.detail.get(3).await;
        assert_eq!(q.detail.cached_entries(), 1);
        assert!(matches!(q.detail.state(1), QueryState::Idle));
        assert!(matches!(q.detail.state(3), QueryState::Success(None)));
    }

    #[tokio::test]
    async fn pruning_keeps_in_flight_entries() {
        let cache: QueryCache<u32, u32> =
            QueryCache::new(Duration::ZERO).with_max_entries(2);
        let (tx, rx) = oneshot::channel::<u32>();
        let slow = cache.fetch(0, async move { Ok(rx.await.unwrap()) });
        let driver = async {
            tokio::task::yield_now().await;
            for key in 1..10 {
                cache.fetch(key, async move { Ok(key) }).await;
            }
            assert!(cache.len() <= 3);
            assert!(cache.state(&0).is_pending());
            tx.send(42).unwrap();
        };
        tokio::join!(slow, driver);
        assert_eq!(cache.state(&0).data(), Some(&42));
        assert_eq!(cache.state(&9).data(), Some(&9));
    }
}
