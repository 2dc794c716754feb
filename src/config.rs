//! Global configuration options.

use std::sync::{OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[cfg(doc)]
use crate::array::codec::CodecOptions;

/// Global configuration options for the shardpack crate.
///
/// Retrieve the global [`Config`] with [`global_config`] and modify it with [`global_config_mut`].
///
/// ## Codec Concurrent Target
/// > default: [`std::thread::available_parallelism`]`()`
///
/// [`CodecOptions::concurrent_target()`] defaults to [`Config::codec_concurrent_target()`].
///
/// The default number of concurrent operations to target when encoding or decoding a shard.
/// Limiting concurrent operations bounds memory usage.
/// Concurrency is unconstrained if the concurrent target is set to zero.
///
/// ## Chunk Concurrent Minimum
/// > default: `4`
///
/// The preferred minimum number of inner chunks processed concurrently within one shard
/// operation, regardless of how much of the concurrent target inner codecs consume.
///
/// ## Validate Checksums
/// > default: [`true`]
///
/// [`CodecOptions::validate_checksums()`] defaults to [`Config::validate_checksums()`].
///
/// If enabled, checksum codecs (e.g. `crc32c`) validate that decoded data matches stored
/// checksums, otherwise validation is skipped.
#[derive(Debug)]
pub struct Config {
    validate_checksums: bool,
    codec_concurrent_target: usize,
    chunk_concurrent_minimum: usize,
}

#[allow(clippy::derivable_impls)]
impl Default for Config {
    fn default() -> Self {
        Self {
            validate_checksums: true,
            codec_concurrent_target: std::thread::available_parallelism()
                .map_or(1, std::num::NonZeroUsize::get),
            chunk_concurrent_minimum: 4,
        }
    }
}

impl Config {
    /// Get the [validate checksums](#validate-checksums) configuration.
    #[must_use]
    pub fn validate_checksums(&self) -> bool {
        self.validate_checksums
    }

    /// Set the [validate checksums](#validate-checksums) configuration.
    pub fn set_validate_checksums(&mut self, validate_checksums: bool) {
        self.validate_checksums = validate_checksums;
    }

    /// Get the [codec concurrent target](#codec-concurrent-target) configuration.
    #[must_use]
    pub fn codec_concurrent_target(&self) -> usize {
        self.codec_concurrent_target
    }

    /// Set the [codec concurrent target](#codec-concurrent-target) configuration.
    pub fn set_codec_concurrent_target(&mut self, concurrent_target: usize) {
        self.codec_concurrent_target = concurrent_target;
    }

    /// Get the [chunk concurrent minimum](#chunk-concurrent-minimum) configuration.
    #[must_use]
    pub fn chunk_concurrent_minimum(&self) -> usize {
        self.chunk_concurrent_minimum
    }

    /// Set the [chunk concurrent minimum](#chunk-concurrent-minimum) configuration.
    pub fn set_chunk_concurrent_minimum(&mut self, concurrent_minimum: usize) {
        self.chunk_concurrent_minimum = concurrent_minimum;
    }
}

static CONFIG: OnceLock<RwLock<Config>> = OnceLock::new();

/// Returns a reference to the global shardpack configuration.
///
/// # Panics
/// This function panics if the underlying lock has been poisoned and might panic if the global
/// config is already held by the current thread.
pub fn global_config() -> RwLockReadGuard<'static, Config> {
    CONFIG
        .get_or_init(|| RwLock::new(Config::default()))
        .read()
        .unwrap()
}

/// Returns a mutable reference to the global shardpack configuration.
///
/// # Panics
/// This function panics if the underlying lock has been poisoned and might panic if the global
/// config is already held by the current thread.
pub fn global_config_mut() -> RwLockWriteGuard<'static, Config> {
    CONFIG
        .get_or_init(|| RwLock::new(Config::default()))
        .write()
        .unwrap()
}
