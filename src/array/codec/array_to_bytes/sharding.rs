//! The `sharding` array to bytes codec.
//!
//! Sharding logically splits chunks (shards) into sub-chunks (inner chunks) that can be
//! individually compressed and accessed.
//! This allows to colocate multiple chunks within one storage object, bundling them in shards.
//!
//! A shard is the concatenation of the encoded inner chunks and an index of `(offset, length)`
//! `u64` pairs, one pair per inner chunk, with `(u64::MAX, u64::MAX)` marking an empty inner
//! chunk.
//! The index is itself encoded through a configurable codec pipeline and resides either at the
//! start or the end of the shard.
//!
//! See [`ShardingCodecConfigurationV1`] for example `JSON` metadata.
//! The [`ShardingCodecBuilder`] can help with creating a [`ShardingCodec`].

mod morton;
mod shard_proxy;
mod sharding_codec;
mod sharding_codec_builder;
mod sharding_configuration;
mod sharding_index;
mod sharding_partial_decoder;
mod sharding_partial_encoder;

pub use morton::morton_order_iter;
pub use sharding_codec::ShardingCodec;
pub use sharding_codec_builder::ShardingCodecBuilder;
pub use sharding_configuration::{
    ShardingCodecConfiguration, ShardingCodecConfigurationV1, ShardingIndexLocation,
};
pub use sharding_index::ShardIndex;
pub use sharding_partial_decoder::ShardingPartialDecoder;
pub use sharding_partial_encoder::ShardingPartialEncoder;

pub(crate) use shard_proxy::{ShardBuilder, ShardProxy};

use std::num::NonZeroU64;

use thiserror::Error;

use crate::array::{
    codec::{ArrayToBytesCodecTraits, CodecChain, CodecError},
    BytesRepresentation, ChunkRepresentation, ChunkShape, DataType, FillValue,
};

/// The identifier for the `sharding_indexed` codec.
pub const IDENTIFIER: &str = "sharding_indexed";

/// A shard is malformed and cannot be decoded safely.
///
/// Raised when a decoded shard index violates the shard invariants: entries must reference
/// distinct, non-overlapping byte ranges within the shard payload.
#[derive(Clone, Debug, Error)]
pub enum CorruptShardError {
    /// The encoded shard is smaller than the expected size of its index.
    #[error("the encoded shard is smaller than the expected size of its index")]
    Truncated,
    /// Two inner chunks share a byte offset.
    #[error("the shard index contains duplicate offset {_0}")]
    DuplicateOffset(u64),
    /// Two inner chunk byte ranges overlap.
    #[error("the shard index entries at offsets {_0} and {_1} reference overlapping byte ranges")]
    OverlappingEntries(u64, u64),
    /// An inner chunk byte range extends beyond the shard payload.
    #[error("the shard index entry (offset {_0}, length {_1}) extends beyond the shard payload")]
    EntryOutOfBounds(u64, u64),
    /// An inner chunk byte range overlaps the shard index at the start of the shard.
    #[error("the shard index entry (offset {_0}, length {_1}) overlaps the leading shard index")]
    EntryOverlapsIndex(u64, u64),
    /// The index does not have the expected number of elements.
    #[error("the shard index has {_0} elements, expected {_1}")]
    UnexpectedIndexSize(usize, usize),
}

fn calculate_chunks_per_shard(
    shard_shape: &[NonZeroU64],
    chunk_shape: &[NonZeroU64],
) -> Result<ChunkShape, CodecError> {
    if shard_shape.len() != chunk_shape.len() {
        return Err(CodecError::Other(format!(
            "invalid inner chunk shape {chunk_shape:?}, it must have the dimensionality of the shard shape {shard_shape:?}"
        )));
    }
    Ok(std::iter::zip(shard_shape, chunk_shape)
        .map(|(s, c)| {
            let s = s.get();
            let c = c.get();
            if num::Integer::is_multiple_of(&s, &c) {
                Ok(unsafe { NonZeroU64::new_unchecked(s / c) })
            } else {
                Err(CodecError::Other(format!(
                    "invalid inner chunk shape {chunk_shape:?}, it must evenly divide {shard_shape:?}"
                )))
            }
        })
        .collect::<Result<Vec<_>, _>>()?
        .into())
}

fn sharding_index_decoded_representation(chunks_per_shard: &[NonZeroU64]) -> ChunkRepresentation {
    let mut index_shape = Vec::with_capacity(chunks_per_shard.len() + 1);
    index_shape.extend(chunks_per_shard);
    index_shape.push(unsafe { NonZeroU64::new_unchecked(2) });
    ChunkRepresentation::new(index_shape, DataType::UInt64, FillValue::from(u64::MAX)).unwrap()
}

fn compute_index_encoded_size(
    index_codecs: &CodecChain,
    index_array_representation: &ChunkRepresentation,
) -> Result<u64, CodecError> {
    let bytes_representation = index_codecs.compute_encoded_size(index_array_representation)?;
    match bytes_representation {
        BytesRepresentation::FixedSize(size) => Ok(size),
        _ => Err(CodecError::Other(
            "the shard index cannot include a variable size output codec".to_string(),
        )),
    }
}
