//! A sharded-object storage codec for multidimensional chunked data.
//!
//! Sharding packs a rectangular block of logically independent, equally-shaped
//! *inner chunks* into a single store object (a *shard*) with an embedded
//! fixed-shape index of byte offsets and lengths.
//! Inner chunks can be individually compressed and individually retrieved with
//! ranged reads, so very large arrays can be stored as a modest number of
//! objects without giving up fine-grained access.
//!
//! The codec is identified as `sharding_indexed` and is wire compatible with the
//! sharding-indexed binary format: an optionally compressed payload of
//! concatenated inner chunks and a `u64` (offset, length) pair per inner chunk,
//! little-endian, with empty chunks marked by `(u64::MAX, u64::MAX)`.
//! The index is written through its own codec pipeline (default:
//! little-endian bytes with a trailing CRC32C) and is placed at the start or
//! end of the shard.
//!
//! ## Highlights
//!  - [`ShardingCodec`](crate::array::codec::ShardingCodec): whole-shard
//!    encode/decode with bounded concurrency.
//!  - [`ShardingPartialDecoder`](crate::array::codec::ShardingPartialDecoder):
//!    reads only the index and the requested inner chunks from a store.
//!  - [`ShardingPartialEncoder`](crate::array::codec::ShardingPartialEncoder):
//!    read-modify-write of a subset of a shard; surviving inner chunks are
//!    repacked in Morton order so the layout is reproducible and overwritten
//!    space is reclaimed.
//!  - [`storage`](crate::storage): the asynchronous store interface consumed by
//!    the partial codecs, with an in-memory reference store.
//!
//! ## Features
//!  - `gzip` (default): gzip `bytes->bytes` codec.
//!  - `zstd` (default): zstd `bytes->bytes` codec.
//!
//! ## Licence
//! shardpack is licensed under either of
//!  - the Apache License, Version 2.0 or <http://www.apache.org/licenses/LICENSE-2.0> or
//!  - the MIT license or <http://opensource.org/licenses/MIT>, at your option.

#![warn(unused_variables)]
#![warn(dead_code)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![deny(clippy::missing_panics_doc)]

pub mod array;
pub mod array_subset;
pub mod byte_range;
pub mod config;
pub mod metadata;
pub mod storage;

/// The shardpack crate version.
#[must_use]
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
