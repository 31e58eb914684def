//! # Evaluation Caching
//!
//! Wrappers that memoise an evaluator's legality verdicts and solutions.
//! They are useful for expensive evaluators and for searches that revisit
//! the same realities, e.g. on small discrete spaces.
//!
//! - [`CachedEvaluator`] shares one mutex-protected map across all threads.
//! - [`ThreadLocalCachedEvaluator`] keeps a separate map per thread and never
//!   contends on a lock, at the price of duplicate work across threads.
//!
//! Failed evaluations are never cached, so a transient failure is retried the
//! next time the same reality comes along.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use thread_local::ThreadLocal;

use super::{EvaluationFailure, Evaluator};

/// A reality that can be used as a cache key.
///
/// Realities that would evaluate identically should produce equal keys.
pub trait CacheKey {
    /// The type of the cache key.
    type Key: Eq + Hash + Clone + Debug + Send + Sync;

    fn cache_key(&self) -> Self::Key;
}

impl CacheKey for Vec<f64> {
    type Key = Vec<u64>;

    fn cache_key(&self) -> Self::Key {
        self.iter().map(|v| v.to_bits()).collect()
    }
}

#[derive(Debug, Clone, Default)]
struct Entry {
    legal: Option<bool>,
    solution: Option<Vec<f64>>,
}

/// An evaluator wrapper with a cache shared by all threads.
#[derive(Debug, Clone)]
pub struct CachedEvaluator<R, E>
where
    R: CacheKey,
{
    evaluator: E,
    cache: Arc<Mutex<HashMap<R::Key, Entry>>>,
    hits: Arc<AtomicUsize>,
}

impl<R, E> CachedEvaluator<R, E>
where
    R: CacheKey,
    E: Evaluator<R>,
{
    pub fn new(evaluator: E) -> Self {
        Self {
            evaluator,
            cache: Arc::new(Mutex::new(HashMap::new())),
            hits: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Returns a reference to the wrapped evaluator.
    pub fn inner(&self) -> &E {
        &self.evaluator
    }

    /// Number of realities with at least one cached result.
    pub fn cache_size(&self) -> usize {
        self.lock().len()
    }

    /// Number of lookups answered from the cache.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn clear_cache(&self) {
        self.lock().clear();
    }

    // A poisoned map only means another thread panicked mid-insert; the map itself is intact.
    fn lock(&self) -> MutexGuard<'_, HashMap<R::Key, Entry>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<R, E> Evaluator<R> for CachedEvaluator<R, E>
where
    R: CacheKey,
    E: Evaluator<R>,
{
    fn legality(&self, reality: &R) -> bool {
        let key = reality.cache_key();
        if let Some(legal) = self.lock().get(&key).and_then(|e| e.legal) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return legal;
        }

        let legal = self.evaluator.legality(reality);
        self.lock().entry(key).or_default().legal = Some(legal);
        legal
    }

    fn evaluate(&self, reality: &R) -> Result<Vec<f64>, EvaluationFailure> {
        let key = reality.cache_key();
        if let Some(solution) = self.lock().get(&key).and_then(|e| e.solution.clone()) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(solution);
        }

        // the lock is not held while the evaluator runs
        let solution = self.evaluator.evaluate(reality)?;
        self.lock().entry(key).or_default().solution = Some(solution.clone());
        Ok(solution)
    }

    fn solution_keys(&self) -> Vec<String> {
        self.evaluator.solution_keys()
    }
}

/// An evaluator wrapper with one cache per thread.
#[derive(Debug)]
pub struct ThreadLocalCachedEvaluator<R, E>
where
    R: CacheKey,
{
    evaluator: E,
    cache: ThreadLocal<RefCell<HashMap<R::Key, Entry>>>,
}

impl<R, E> ThreadLocalCachedEvaluator<R, E>
where
    R: CacheKey,
    E: Evaluator<R>,
{
    pub fn new(evaluator: E) -> Self {
        Self {
            evaluator,
            cache: ThreadLocal::new(),
        }
    }

    /// Returns a reference to the wrapped evaluator.
    pub fn inner(&self) -> &E {
        &self.evaluator
    }

    /// Number of cached realities for the current thread.
    pub fn cache_size(&self) -> usize {
        self.cache
            .get()
            .and_then(|cell| cell.try_borrow().ok())
            .map_or(0, |cache| cache.len())
    }

    fn local(&self) -> &RefCell<HashMap<R::Key, Entry>> {
        self.cache.get_or(|| RefCell::new(HashMap::new()))
    }
}

impl<R, E> Evaluator<R> for ThreadLocalCachedEvaluator<R, E>
where
    R: CacheKey,
    E: Evaluator<R>,
{
    fn legality(&self, reality: &R) -> bool {
        let key = reality.cache_key();
        if let Some(legal) = self.local().borrow().get(&key).and_then(|e| e.legal) {
            return legal;
        }

        let legal = self.evaluator.legality(reality);
        self.local().borrow_mut().entry(key).or_default().legal = Some(legal);
        legal
    }

    fn evaluate(&self, reality: &R) -> Result<Vec<f64>, EvaluationFailure> {
        let key = reality.cache_key();
        let cached = self
            .local()
            .borrow()
            .get(&key)
            .and_then(|e| e.solution.clone());
        if let Some(solution) = cached {
            return Ok(solution);
        }

        let solution = self.evaluator.evaluate(reality)?;
        self.local().borrow_mut().entry(key).or_default().solution = Some(solution.clone());
        Ok(solution)
    }

    fn solution_keys(&self) -> Vec<String> {
        self.evaluator.solution_keys()
    }
}
