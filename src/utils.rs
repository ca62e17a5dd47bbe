//! Shared parallelism configuration.
//!
//! Provides the [`Parallelism`] flag the parallel traversals consult. When
//! `Parallel`, they may use `rayon` iterators on the current thread pool;
//! when `Sequential`, they run a plain scan. The actual pool is set up by
//! the caller, typically through [`run_with_threads`] - the traversals never
//! manage thread pools themselves.

use rayon::iter::{ParallelBridge, ParallelIterator};

/// Whether parallel execution is allowed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parallelism {
    Sequential,
    Parallel,
}

impl Parallelism {
    /// Create from thread count semantics.
    ///
    /// - 0 = auto (parallel if the rayon pool has multiple threads)
    /// - 1 = sequential
    /// - >1 = parallel
    #[inline]
    pub fn from_threads(n_threads: usize) -> Self {
        if n_threads == 1 || (n_threads == 0 && rayon::current_num_threads() == 1) {
            Parallelism::Sequential
        } else {
            Parallelism::Parallel
        }
    }

    /// Returns `true` if parallel execution is allowed.
    #[inline]
    pub fn is_parallel(self) -> bool {
        matches!(self, Parallelism::Parallel)
    }

    /// Run `f` over every item, bridging onto the rayon pool in parallel
    /// mode. Accepts any `Send` iterator, which is what the traversal
    /// kernels' `chunks_mut` adapters are.
    #[inline]
    pub fn maybe_par_bridge_for_each<T, I, F>(self, iter: I, f: F)
    where
        T: Send,
        I: Iterator<Item = T> + Send,
        F: Fn(T) + Sync + Send,
    {
        if self.is_parallel() {
            iter.par_bridge().for_each(f);
        } else {
            iter.for_each(f);
        }
    }

    /// Fallible [`maybe_par_bridge_for_each`](Self::maybe_par_bridge_for_each):
    /// stops at the first error and returns it.
    #[inline]
    pub fn maybe_par_bridge_try_for_each<T, I, F, E>(self, mut iter: I, f: F) -> Result<(), E>
    where
        T: Send,
        I: Iterator<Item = T> + Send,
        F: Fn(T) -> Result<(), E> + Sync + Send,
        E: Send,
    {
        if self.is_parallel() {
            iter.par_bridge().try_for_each(f)
        } else {
            iter.try_for_each(f)
        }
    }
}

// =============================================================================
// Thread Pool Setup
// =============================================================================

/// Run a closure with the appropriate thread pool.
///
/// Thread count semantics:
/// - `0` = auto (use all available cores)
/// - `1` = sequential (no thread pool)
/// - `n > 1` = use exactly `n` threads
///
/// # Example
///
/// ```ignore
/// use canopy::run_with_threads;
///
/// let result = run_with_threads(4, |_| expensive_accumulation());
/// ```
#[inline]
pub fn run_with_threads<T: Send>(n_threads: usize, f: impl FnOnce(Parallelism) -> T + Send) -> T {
    let parallelism = Parallelism::from_threads(n_threads);

    match parallelism {
        Parallelism::Sequential => f(Parallelism::Sequential),
        Parallelism::Parallel => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n_threads)
                .build()
                .expect("Failed to create thread pool");
            pool.install(|| f(Parallelism::Parallel))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_threads_semantics() {
        assert_eq!(Parallelism::from_threads(1), Parallelism::Sequential);
        assert_eq!(Parallelism::from_threads(4), Parallelism::Parallel);
    }

    #[test]
    fn sequential_bridge_preserves_errors() {
        let result: Result<(), &str> = Parallelism::Sequential
            .maybe_par_bridge_try_for_each([1, 2, 3].into_iter(), |x| {
                if x == 2 {
                    Err("two")
                } else {
                    Ok(())
                }
            });
        assert_eq!(result, Err("two"));
    }

    #[test]
    fn parallel_bridge_visits_every_item() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let visited = AtomicUsize::new(0);
        Parallelism::Parallel.maybe_par_bridge_for_each(0..100, |_| {
            visited.fetch_add(1, Ordering::Relaxed);
        });
        assert_eq!(visited.load(Ordering::Relaxed), 100);
    }
}
