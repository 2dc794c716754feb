//! Bounded concurrency for per-chunk operations.
//!
//! Shard operations fan their per-chunk work out through [`concurrent_map`], which caps the
//! number of in-flight futures while preserving the order of results.
//! Back-pressure falls out of the bound: a new future is only started when a slot frees up.

use std::future::Future;

use futures::{StreamExt, TryStreamExt};

use crate::config::global_config;

/// Apply an async fallible `map_fn` over `values` with at most `concurrent_limit` futures
/// in flight at once.
///
/// The output order matches the input order regardless of completion order.
/// A `concurrent_limit` of zero leaves the concurrency unconstrained.
///
/// # Errors
/// Returns the first error produced by `map_fn`.
pub async fn concurrent_map<I, T, E, F, Fut>(
    values: I,
    concurrent_limit: usize,
    map_fn: F,
) -> Result<Vec<T>, E>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let concurrent_limit = if concurrent_limit == 0 {
        usize::MAX
    } else {
        concurrent_limit
    };
    futures::stream::iter(values)
        .map(map_fn)
        .buffered(concurrent_limit)
        .try_collect()
        .await
}

/// Calculate the concurrent limit for per-chunk operations given a concurrency target and the
/// number of chunks.
///
/// At least [`chunk_concurrent_minimum`](crate::config::Config::chunk_concurrent_minimum) chunks
/// are processed concurrently (when there are that many), even if inner codecs would consume the
/// entire target.
#[must_use]
pub fn calc_chunk_concurrent_limit(concurrent_target: usize, num_chunks: usize) -> usize {
    if concurrent_target == 0 {
        return 0;
    }
    let minimum = std::cmp::min(global_config().chunk_concurrent_minimum(), num_chunks);
    std::cmp::max(std::cmp::min(concurrent_target, num_chunks), minimum)
}

#[cfg(test)]
mod limit_tests {
    use super::calc_chunk_concurrent_limit;

    #[test]
    fn chunk_concurrent_limits() {
        assert_eq!(calc_chunk_concurrent_limit(0, 100), 0);
        assert_eq!(calc_chunk_concurrent_limit(8, 100), 8);
        assert_eq!(calc_chunk_concurrent_limit(1, 100), 4);
        assert_eq!(calc_chunk_concurrent_limit(16, 2), 2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn concurrent_map_preserves_order() {
        let out: Result<Vec<u64>, std::convert::Infallible> =
            concurrent_map(0u64..100, 4, |i| async move { Ok(i * 2) }).await;
        assert_eq!(out.unwrap(), (0u64..100).map(|i| i * 2).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn concurrent_map_unconstrained() {
        let out: Result<Vec<u64>, std::convert::Infallible> =
            concurrent_map(0u64..10, 0, |i| async move { Ok(i) }).await;
        assert_eq!(out.unwrap().len(), 10);
    }

    #[tokio::test]
    async fn concurrent_map_propagates_errors() {
        let out: Result<Vec<u64>, String> = concurrent_map(0u64..10, 2, |i| async move {
            if i == 7 {
                Err("seven".to_string())
            } else {
                Ok(i)
            }
        })
        .await;
        assert_eq!(out.unwrap_err(), "seven");
    }
}
