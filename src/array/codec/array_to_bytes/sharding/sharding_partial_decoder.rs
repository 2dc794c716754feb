use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::{
    array::{
        codec::{ArrayToBytesCodecTraits, CodecChain, CodecError, CodecOptions},
        concurrency::{calc_chunk_concurrent_limit, concurrent_map},
        ArrayIndices, ChunkRepresentation, ChunkShape, UnsafeCellSlice,
    },
    array_subset::ArraySubset,
    byte_range::ByteRange,
    storage::{AsyncReadableStorage, AsyncReadableStorageTraits, StoreKey},
};

use super::{
    calculate_chunks_per_shard, compute_index_encoded_size, sharding_index_decoded_representation,
    ShardIndex, ShardProxy, ShardingIndexLocation,
};

/// Partial decoder for the sharding codec: reads the requested array subsets of a shard stored
/// at a [`StoreKey`] without reading the entire shard.
///
/// When the requested subsets cover the whole shard the object is read in full; otherwise only
/// the index region and the byte ranges of the requested inner chunks are fetched.
pub struct ShardingPartialDecoder {
    storage: AsyncReadableStorage,
    key: StoreKey,
    shard_representation: ChunkRepresentation,
    chunk_representation: ChunkRepresentation,
    chunks_per_shard: ChunkShape,
    inner_codecs: Arc<CodecChain>,
    index_codecs: Arc<CodecChain>,
    index_location: ShardingIndexLocation,
}

impl ShardingPartialDecoder {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        storage: AsyncReadableStorage,
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

    /// Partially decode the shard, returning one byte buffer per requested array subset.
    ///
    /// Returns [`Ok(None)`] if the shard object is absent from the store (or has zero bytes);
    /// the caller interprets this as an entirely empty shard and renders the fill value.
    /// Inner chunks that are present but empty are rendered as the fill value.
    ///
    /// # Errors
    /// Returns [`CodecError`] if a subset is out of bounds of the shard shape, the shard is
    /// corrupt, or an inner codec or the store fails.
    ///
    /// # Panics
    /// Panics if a byte offset exceeds [`usize::MAX`].
    pub async fn partial_decode(
        &self,
        array_subsets: &[ArraySubset],
        options: &CodecOptions,
    ) -> Result<Option<Vec<Vec<u8>>>, CodecError> {
        let shard_shape = self.shard_representation.shape_u64();
        for array_subset in array_subsets {
            if !array_subset.inbounds(&shard_shape) {
                return Err(crate::array_subset::IncompatibleArraySubsetAndShapeError::new(
                    array_subset.clone(),
                    shard_shape.clone(),
                )
                .into());
            }
        }

        // Decompose the requested subsets into the inner chunks they touch
        let indexed_chunks = array_subsets
            .iter()
            .map(|array_subset| {
                Ok(array_subset
                    .iter_chunks(self.chunk_representation.shape())?
                    .collect::<Vec<_>>())
            })
            .collect::<Result<Vec<_>, CodecError>>()?;
        let all_chunk_indices = indexed_chunks
            .iter()
            .flatten()
            .map(|(chunk_indices, _)| chunk_indices.clone())
            .collect::<HashSet<_>>();

        // Fetch the bytes of every requested inner chunk
        let Some(shard_dict) = self.load_shard_dict(&all_chunk_indices, options).await? else {
            return Ok(None);
        };

        // Decode the inner chunks and scatter them into the output subsets
        let element_size = self.shard_representation.element_size() as u64;
        let fill_value = self.shard_representation.fill_value();

        let mut out = Vec::with_capacity(array_subsets.len());
        for (array_subset, chunks) in std::iter::zip(array_subsets, indexed_chunks) {
            let mut out_array_subset = fill_value
                .as_ne_bytes()
                .repeat(array_subset.num_elements_usize());
            let out_array_subset_slice = UnsafeCellSlice::new(out_array_subset.as_mut_slice());

            let concurrent_limit =
                calc_chunk_concurrent_limit(options.concurrent_target(), chunks.len());
            concurrent_map(
                chunks,
                concurrent_limit,
                |(chunk_indices, chunk_subset): (ArrayIndices, ArraySubset)| {
                    let shard_dict = &shard_dict;
                    async move {
                        // Empty inner chunks are left at the fill value
                        let Some(chunk_bytes) = shard_dict.get(&chunk_indices) else {
                            return Ok(());
                        };
                        let decoded_chunk = self
                            .inner_codecs
                            .decode(chunk_bytes.clone(), &self.chunk_representation, options)
                            .await?;

                        // Extract the overlap of the chunk with the requested subset and
                        // scatter it; overlaps of distinct inner chunks are disjoint
                        let overlap = array_subset.overlap(&chunk_subset)?;
                        let chunk_overlap_bytes = overlap
                            .relative_to(chunk_subset.start())?
                            .extract_bytes(
                                &decoded_chunk,
                                &self.chunk_representation.shape_u64(),
                                self.shard_representation.element_size(),
                            )?;
                        let overlap_in_subset = overlap.relative_to(array_subset.start())?;

                        let out_slice = unsafe { out_array_subset_slice.get() };
                        let mut data_idx = 0;
                        for (index, num_elements) in overlap_in_subset
                            .iter_contiguous_linearised_indices(array_subset.shape())?
                        {
                            let output_offset = usize::try_from(index * element_size).unwrap();
                            let length = usize::try_from(num_elements * element_size).unwrap();
                            out_slice[output_offset..output_offset + length].copy_from_slice(
                                &chunk_overlap_bytes[data_idx..data_idx + length],
                            );
                            data_idx += length;
                        }
                        Ok::<_, CodecError>(())
                    }
                },
            )
            .await?;
            out.push(out_array_subset);
        }
        Ok(Some(out))
    }

    /// Fetch the encoded bytes of the requested inner chunks.
    ///
    /// Reads the full shard when every inner chunk is requested, otherwise range-reads the index
    /// and then only the byte ranges of the requested inner chunks.
    /// Returns [`None`] if the shard object is absent.
    async fn load_shard_dict(
        &self,
        all_chunk_indices: &HashSet<ArrayIndices>,
        options: &CodecOptions,
    ) -> Result<Option<HashMap<ArrayIndices, Vec<u8>>>, CodecError> {
        let mut shard_dict = HashMap::new();
        if self.is_total_shard(all_chunk_indices) {
            let Some(shard_proxy) = self.load_full_shard(options).await? else {
                return Ok(None);
            };
            for chunk_indices in all_chunk_indices {
                if let Some(chunk_bytes) = shard_proxy.get(chunk_indices) {
                    shard_dict.insert(chunk_indices.clone(), chunk_bytes.to_vec());
                }
            }
        } else {
            let Some(shard_index) = self.load_shard_index(options).await? else {
                return Ok(None);
            };
            let chunks_with_slices = all_chunk_indices
                .iter()
                .filter_map(|chunk_indices| {
                    shard_index
                        .get(chunk_indices)
                        .map(|(start, end)| (chunk_indices.clone(), start, end))
                })
                .collect::<Vec<_>>();
            let concurrent_limit =
                calc_chunk_concurrent_limit(options.concurrent_target(), chunks_with_slices.len());
            let chunk_bytes = concurrent_map(
                chunks_with_slices,
                concurrent_limit,
                |(chunk_indices, start, end): (ArrayIndices, u64, u64)| async move {
                    let bytes = self
                        .storage
                        .get_partial_values_key(
                            &self.key,
                            &[ByteRange::FromStart(start, Some(end - start))],
                        )
                        .await?
                        .map(|mut bytes| bytes.remove(0));
                    Ok::<_, CodecError>((chunk_indices, bytes))
                },
            )
            .await?;
            for (chunk_indices, bytes) in chunk_bytes {
                if let Some(bytes) = bytes {
                    shard_dict.insert(chunk_indices, bytes.to_vec());
                }
            }
        }
        Ok(Some(shard_dict))
    }

    fn is_total_shard(&self, all_chunk_indices: &HashSet<ArrayIndices>) -> bool {
        let num_chunks = usize::try_from(self.chunks_per_shard.num_elements()).unwrap();
        all_chunk_indices.len() == num_chunks
    }

    /// Read and parse the entire shard object. Returns [`None`] if absent or zero bytes.
    async fn load_full_shard(&self, options: &CodecOptions) -> Result<Option<ShardProxy>, CodecError> {
        let Some(shard_bytes) = self.storage.get(&self.key).await? else {
            return Ok(None);
        };
        if shard_bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(
            ShardProxy::from_bytes(
                shard_bytes.to_vec(),
                &self.chunks_per_shard,
                &self.index_codecs,
                self.index_location,
                options,
            )
            .await?,
        ))
    }

    /// Range-read and decode the shard index. Returns [`None`] if the shard object is absent or
    /// zero bytes.
    async fn load_shard_index(
        &self,
        options: &CodecOptions,
    ) -> Result<Option<ShardIndex>, CodecError> {
        let index_decoded_representation =
            sharding_index_decoded_representation(&self.chunks_per_shard);
        let index_encoded_size =
            compute_index_encoded_size(&self.index_codecs, &index_decoded_representation)?;

        let Some(shard_size) = self.storage.size_key(&self.key).await? else {
            return Ok(None);
        };
        if shard_size == 0 {
            return Ok(None);
        }
        if shard_size < index_encoded_size {
            return Err(super::CorruptShardError::Truncated.into());
        }

        let index_byte_range = match self.index_location {
            ShardingIndexLocation::Start => ByteRange::FromStart(0, Some(index_encoded_size)),
            ShardingIndexLocation::End => ByteRange::Suffix(index_encoded_size),
        };
        let encoded_index = self
            .storage
            .get_partial_values_key(&self.key, &[index_byte_range])
            .await?
            .map(|mut bytes| bytes.remove(0));
        let Some(encoded_index) = encoded_index else {
            return Ok(None);
        };

        let shard_index = ShardIndex::decode(
            encoded_index.to_vec(),
            &self.chunks_per_shard,
            &self.index_codecs,
            options,
        )
        .await?;
        shard_index.validate(index_encoded_size, Some(shard_size), self.index_location)?;
        Ok(Some(shard_index))
    }
}
