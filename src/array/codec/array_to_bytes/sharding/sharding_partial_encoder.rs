use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::{
    array::{
        codec::{ArrayToBytesCodecTraits, CodecChain, CodecError, CodecOptions},
        concurrency::{calc_chunk_concurrent_limit, concurrent_map},
        ArrayIndices, ChunkRepresentation, ChunkShape,
    },
    array_subset::ArraySubset,
    storage::{
        AsyncReadableStorageTraits, AsyncReadableWritableStorage, AsyncWritableStorageTraits,
        StoreKey,
    },
};

use super::{calculate_chunks_per_shard, ShardBuilder, ShardProxy, ShardingIndexLocation};

/// Partial encoder for the sharding codec: updates an array subset of a shard stored at a
/// [`StoreKey`] without re-encoding the untouched inner chunks.
///
/// The shard is rewritten wholesale on every update: surviving inner chunks are merged with the
/// updated ones in Morton order of the sub-chunk grid, so the payload layout is deterministic,
/// the space of overwritten chunks is reclaimed, and spatially close chunks stay close within
/// the shard.
pub struct ShardingPartialEncoder {
    storage: AsyncReadableWritableStorage,
    key: StoreKey,
    shard_representation: ChunkRepresentation,
    chunk_representation: ChunkRepresentation,
    chunks_per_shard: ChunkShape,
    inner_codecs: Arc<CodecChain>,
    index_codecs: Arc<CodecChain>,
    index_location: ShardingIndexLocation,
}

impl ShardingPartialEncoder {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        storage: AsyncReadableWritableStorage,
        key: StoreKey,
        shard_representation: ChunkRepresentation,
        chunk_shape: ChunkShape,
        inner_codecs: Arc<CodecChain>,
        index_codecs: Arc<CodecChain>,
        index_location: ShardingIndexLocation,
    ) -> Result<Self, CodecError> {
        let chunks_per_shard =
            calculate_chunks_per_shard(shard_representation.shape(), &chunk_shape)?;
        let chunk_representation = unsafe {
            ChunkRepresentation::new_unchecked(
                chunk_shape.into(),
                shard_representation.data_type().clone(),
                shard_representation.fill_value().clone(),
            )
        };
        Ok(Self {
            storage,
            key,
            shard_representation,
            chunk_representation,
            chunks_per_shard,
            inner_codecs,
            index_codecs,
            index_location,
        })
    }

    /// Write `subset_bytes` into the `array_subset` of the shard.
    ///
    /// Inner chunks partially covered by the subset are read from the existing shard (or start
    /// from the fill value if absent), updated, and re-encoded.
    /// Inner chunks that become entirely the fill value are dropped from the shard.
    /// The shard object is deleted if every inner chunk ends up empty, and is only rewritten
    /// after the new shard bytes are fully assembled.
    ///
    /// # Errors
    /// Returns [`CodecError`] if the subset is out of bounds, `subset_bytes` does not match the
    /// subset size, the existing shard is corrupt, or an inner codec or the store fails.
    ///
    /// # Panics
    /// Panics if a byte offset exceeds [`usize::MAX`].
    pub async fn partial_encode(
        &self,
        array_subset: &ArraySubset,
        subset_bytes: Vec<u8>,
        options: &CodecOptions,
    ) -> Result<(), CodecError> {
        let shard_shape = self.shard_representation.shape_u64();
        let element_size = self.shard_representation.element_size();
        if !array_subset.inbounds(&shard_shape) {
            return Err(crate::array_subset::IncompatibleArraySubsetAndShapeError::new(
                array_subset.clone(),
                shard_shape,
            )
            .into());
        }
        if subset_bytes.len() as u64 != array_subset.num_elements() * element_size as u64 {
            return Err(CodecError::UnexpectedChunkDecodedSize(
                subset_bytes.len(),
                array_subset.num_elements() * element_size as u64,
            ));
        }

        // Load the existing shard, or start from an empty one
        let old_shard = match self.storage.get(&self.key).await? {
            Some(shard_bytes) if !shard_bytes.is_empty() => {
                ShardProxy::from_bytes(
                    shard_bytes.to_vec(),
                    &self.chunks_per_shard,
                    &self.index_codecs,
                    self.index_location,
                    options,
                )
                .await?
            }
            _ => ShardProxy::create_empty(&self.chunks_per_shard),
        };

        // Update and re-encode every inner chunk the subset touches
        let chunks = array_subset
            .iter_chunks(self.chunk_representation.shape())?
            .collect::<Vec<_>>();
        let concurrent_limit = calc_chunk_concurrent_limit(options.concurrent_target(), chunks.len());
        let fill_value = self.shard_representation.fill_value();

        let encoded_chunks: Vec<(ArrayIndices, Option<Vec<u8>>)> = concurrent_map(
            chunks,
            concurrent_limit,
            |(chunk_indices, chunk_subset): (ArrayIndices, ArraySubset)| {
                let old_shard = &old_shard;
                let subset_bytes = &subset_bytes;
                async move {
                    let chunk_shape_u64 = self.chunk_representation.shape_u64();
                    let overlap = array_subset.overlap(&chunk_subset)?;
                    let overlap_bytes = overlap.relative_to(array_subset.start())?.extract_bytes(
                        subset_bytes,
                        array_subset.shape(),
                        element_size,
                    )?;

                    let chunk_bytes = if overlap == chunk_subset {
                        // The subset spans the whole inner chunk; take the new bytes directly
                        overlap_bytes
                    } else {
                        // Read-modify-write: decode the existing inner chunk into a writable
                        // buffer, or start from the fill value if absent
                        let mut chunk_bytes = match old_shard.get(&chunk_indices) {
                            Some(chunk_encoded) => {
                                self.inner_codecs
                                    .decode(
                                        chunk_encoded.to_vec(),
                                        &self.chunk_representation,
                                        options,
                                    )
                                    .await?
                            }
                            None => fill_value
                                .as_ne_bytes()
                                .repeat(self.chunk_representation.num_elements_usize()),
                        };
                        overlap.relative_to(chunk_subset.start())?.store_bytes(
                            &overlap_bytes,
                            &mut chunk_bytes,
                            &chunk_shape_u64,
                            element_size,
                        )?;
                        chunk_bytes
                    };

                    if fill_value.equals_all(&chunk_bytes) {
                        Ok((chunk_indices, None))
                    } else {
                        let chunk_encoded = self
                            .inner_codecs
                            .encode(chunk_bytes, &self.chunk_representation, options)
                            .await?;
                        Ok::<_, CodecError>((chunk_indices, chunk_encoded))
                    }
                }
            },
        )
        .await?;

        // Inner chunks that became entirely the fill value are tombstoned and not carried over
        let mut new_entries = HashMap::new();
        let mut tombstones = HashSet::new();
        for (chunk_indices, chunk_bytes) in encoded_chunks {
            match chunk_bytes {
                Some(chunk_bytes) => {
                    new_entries.insert(chunk_indices, chunk_bytes);
                }
                None => {
                    tombstones.insert(chunk_indices);
                }
            }
        }

        let shard_builder = ShardBuilder::merge_with_morton_order(
            &self.chunks_per_shard,
            &tombstones,
            &new_entries,
            &old_shard,
        );

        if shard_builder.index().is_all_empty() {
            self.storage.erase(&self.key).await?;
        } else {
            let shard = shard_builder
                .finalize(self.index_location, &self.index_codecs, options)
                .await?;
            self.storage.set(&self.key, shard.into()).await?;
        }
        Ok(())
    }

    /// Erase the shard object.
    ///
    /// # Errors
    /// Returns [`CodecError`] if the store fails.
    pub async fn erase(&self) -> Result<(), CodecError> {
        Ok(self.storage.erase(&self.key).await?)
    }
}
