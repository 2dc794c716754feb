use std::num::NonZeroU64;
use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    array::{
        codec::{
            ArrayToBytesCodecTraits, CodecChain, CodecError, CodecOptions, CodecTraits,
            ConfigurationError,
        },
        concurrency::{calc_chunk_concurrent_limit, concurrent_map},
        ArrayIndices, BytesRepresentation, ChunkRepresentation, ChunkShape, UnsafeCellSlice,
    },
    array_subset::ArraySubset,
    metadata::Metadata,
    storage::{AsyncReadableStorage, AsyncReadableWritableStorage, StoreKey},
};

use super::{
    calculate_chunks_per_shard, compute_index_encoded_size, sharding_index_decoded_representation,
    ShardBuilder, ShardProxy, ShardingCodecConfiguration, ShardingCodecConfigurationV1,
    ShardingIndexLocation, ShardingPartialDecoder, ShardingPartialEncoder, IDENTIFIER,
};

/// A `sharding_indexed` codec implementation.
///
/// Subdivides a chunk (shard) into inner chunks of identical shape, encodes each through the
/// inner codec pipeline, and concatenates them with an index locating each inner chunk.
/// Inner chunks that are entirely the fill value are not stored.
#[derive(Clone, Debug)]
pub struct ShardingCodec {
    /// The shape of the inner chunks in a shard along each dimension of the outer array.
    chunk_shape: ChunkShape,
    /// The codecs used to encode and decode inner chunks.
    inner_codecs: Arc<CodecChain>,
    /// The codecs used to encode and decode the shard index.
    index_codecs: Arc<CodecChain>,
    /// The location of the shard index within the shard.
    index_location: ShardingIndexLocation,
}

impl ShardingCodec {
    /// Create a new `sharding` codec.
    ///
    /// # Errors
    /// Returns [`ConfigurationError`] if the index codec pipeline does not have a fixed encoded
    /// size for fixed size input; a variable sized index would corrupt the offsets written on
    /// the second encode pass when the index leads the shard.
    pub fn new(
        chunk_shape: ChunkShape,
        inner_codecs: CodecChain,
        index_codecs: CodecChain,
        index_location: ShardingIndexLocation,
    ) -> Result<Self, ConfigurationError> {
        let index_probe =
            sharding_index_decoded_representation(&vec![NonZeroU64::MIN; chunk_shape.len()]);
        match index_codecs.compute_encoded_size(&index_probe) {
            Ok(BytesRepresentation::FixedSize(_)) => {}
            Ok(_) => {
                return Err(ConfigurationError::Other(
                    "the shard index codecs must have a fixed encoded size".to_string(),
                ))
            }
            Err(err) => return Err(ConfigurationError::Other(err.to_string())),
        }
        Ok(Self {
            chunk_shape,
            inner_codecs: Arc::new(inner_codecs),
            index_codecs: Arc::new(index_codecs),
            index_location,
        })
    }

    /// Create a new `sharding` codec from configuration.
    ///
    /// # Errors
    /// Returns [`ConfigurationError`] if a codec is unknown or the configuration is invalid.
    pub fn new_with_configuration(
        configuration: &ShardingCodecConfiguration,
    ) -> Result<Self, ConfigurationError> {
        let ShardingCodecConfiguration::V1(configuration) = configuration;
        let inner_codecs = CodecChain::from_metadata(&configuration.codecs)?;
        let index_codecs = CodecChain::from_metadata(&configuration.index_codecs)?;
        Self::new(
            configuration.chunk_shape.clone(),
            inner_codecs,
            index_codecs,
            configuration.index_location,
        )
    }

    /// Return the inner chunk shape.
    #[must_use]
    pub fn chunk_shape(&self) -> &ChunkShape {
        &self.chunk_shape
    }

    /// Return the location of the shard index within the shard.
    #[must_use]
    pub fn index_location(&self) -> ShardingIndexLocation {
        self.index_location
    }

    /// Create a partial decoder reading a shard at `key` in `storage`.
    ///
    /// # Errors
    /// Returns [`CodecError`] if `decoded_representation` is incompatible with the inner chunk
    /// shape.
    pub fn partial_decoder(
        &self,
        storage: AsyncReadableStorage,
        key: StoreKey,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<ShardingPartialDecoder, CodecError> {
        ShardingPartialDecoder::new(
            storage,
            key,
            decoded_representation.clone(),
            self.chunk_shape.clone(),
            self.inner_codecs.clone(),
            self.index_codecs.clone(),
            self.index_location,
        )
    }

    /// Create a partial encoder writing a shard at `key` in `storage`.
    ///
    /// # Errors
    /// Returns [`CodecError`] if `decoded_representation` is incompatible with the inner chunk
    /// shape.
    pub fn partial_encoder(
        &self,
        storage: AsyncReadableWritableStorage,
        key: StoreKey,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<ShardingPartialEncoder, CodecError> {
        ShardingPartialEncoder::new(
            storage,
            key,
            decoded_representation.clone(),
            self.chunk_shape.clone(),
            self.inner_codecs.clone(),
            self.index_codecs.clone(),
            self.index_location,
        )
    }

    fn chunk_representation(
        &self,
        shard_representation: &ChunkRepresentation,
    ) -> ChunkRepresentation {
        unsafe {
            ChunkRepresentation::new_unchecked(
                self.chunk_shape.to_vec(),
                shard_representation.data_type().clone(),
                shard_representation.fill_value().clone(),
            )
        }
    }
}

impl CodecTraits for ShardingCodec {
    fn create_metadata(&self) -> Option<Metadata> {
        let configuration = ShardingCodecConfigurationV1 {
            chunk_shape: self.chunk_shape.clone(),
            codecs: self.inner_codecs.create_metadatas(),
            index_codecs: self.index_codecs.create_metadatas(),
            index_location: self.index_location,
        };
        Some(Metadata::new_with_serializable_configuration(IDENTIFIER, &configuration).unwrap())
    }
}

#[async_trait]
impl ArrayToBytesCodecTraits for ShardingCodec {
    async fn encode(
        &self,
        decoded_value: Vec<u8>,
        shard_representation: &ChunkRepresentation,
        options: &CodecOptions,
    ) -> Result<Option<Vec<u8>>, CodecError> {
        if decoded_value.len() as u64 != shard_representation.size() {
            return Err(CodecError::UnexpectedChunkDecodedSize(
                decoded_value.len(),
                shard_representation.size(),
            ));
        }

        let chunk_representation = self.chunk_representation(shard_representation);
        let chunks_per_shard =
            calculate_chunks_per_shard(shard_representation.shape(), chunk_representation.shape())?;

        let shard_shape = shard_representation.shape_u64();
        let element_size = shard_representation.element_size();
        let fill_value = shard_representation.fill_value();

        // Iterate over the inner chunks in the order produced by the indexer (row-major); the
        // shard layout is then independent of the completion order of the encode tasks.
        let chunks = ArraySubset::new_with_shape(shard_shape.clone())
            .iter_chunks(&self.chunk_shape)?
            .collect::<Vec<_>>();
        let concurrent_limit = calc_chunk_concurrent_limit(options.concurrent_target(), chunks.len());

        let encoded_chunks: Vec<(ArrayIndices, Option<Vec<u8>>)> = concurrent_map(
            chunks,
            concurrent_limit,
            |(chunk_indices, chunk_subset): (ArrayIndices, ArraySubset)| {
                let decoded_value = &decoded_value;
                let chunk_representation = &chunk_representation;
                let shard_shape = &shard_shape;
                async move {
                    let bytes = unsafe {
                        chunk_subset.extract_bytes_unchecked(decoded_value, shard_shape, element_size)
                    };
                    if fill_value.equals_all(&bytes) {
                        Ok((chunk_indices, None))
                    } else {
                        let chunk_encoded = self
                            .inner_codecs
                            .encode(bytes, chunk_representation, options)
                            .await?;
                        Ok::<_, CodecError>((chunk_indices, chunk_encoded))
                    }
                }
            },
        )
        .await?;

        let mut shard_builder = ShardBuilder::create_empty(&chunks_per_shard);
        for (chunk_indices, chunk_bytes) in encoded_chunks {
            if let Some(chunk_bytes) = chunk_bytes {
                shard_builder.append(&chunk_indices, &chunk_bytes);
            }
        }

        if shard_builder.index().is_all_empty() {
            // An all-empty shard is not stored
            return Ok(None);
        }
        let shard = shard_builder
            .finalize(self.index_location, &self.index_codecs, options)
            .await?;
        Ok(Some(shard))
    }

    async fn decode(
        &self,
        encoded_value: Vec<u8>,
        shard_representation: &ChunkRepresentation,
        options: &CodecOptions,
    ) -> Result<Vec<u8>, CodecError> {
        let chunk_representation = self.chunk_representation(shard_representation);
        let chunks_per_shard =
            calculate_chunks_per_shard(shard_representation.shape(), chunk_representation.shape())?;

        let mut shard = shard_representation
            .fill_value()
            .as_ne_bytes()
            .repeat(shard_representation.num_elements_usize());

        // Zero bytes read as an entirely empty shard, the same as an absent store object
        if encoded_value.is_empty() {
            return Ok(shard);
        }

        let shard_proxy = ShardProxy::from_bytes(
            encoded_value,
            &chunks_per_shard,
            &self.index_codecs,
            self.index_location,
            options,
        )
        .await?;
        if shard_proxy.index().is_all_empty() {
            return Ok(shard);
        }

        let shard_shape = shard_representation.shape_u64();
        let element_size = shard_representation.element_size() as u64;
        let shard_slice = UnsafeCellSlice::new(shard.as_mut_slice());

        let chunks = ArraySubset::new_with_shape(shard_shape.clone())
            .iter_chunks(&self.chunk_shape)?
            .collect::<Vec<_>>();
        let concurrent_limit = calc_chunk_concurrent_limit(options.concurrent_target(), chunks.len());

        concurrent_map(
            chunks,
            concurrent_limit,
            |(chunk_indices, chunk_subset): (ArrayIndices, ArraySubset)| {
                let shard_proxy = &shard_proxy;
                let chunk_representation = &chunk_representation;
                let shard_shape = &shard_shape;
                async move {
                    // Empty inner chunks are left at the fill value
                    if let Some(encoded_chunk) = shard_proxy.get(&chunk_indices) {
                        let decoded_chunk = self
                            .inner_codecs
                            .decode(encoded_chunk.to_vec(), chunk_representation, options)
                            .await?;

                        // Copy to the chunk subset of the shard; subsets of distinct inner
                        // chunks are disjoint
                        let shard_slice = unsafe { shard_slice.get() };
                        let mut data_idx = 0;
                        for (index, num_elements) in unsafe {
                            chunk_subset.iter_contiguous_linearised_indices_unchecked(shard_shape)
                        } {
                            let shard_offset = usize::try_from(index * element_size).unwrap();
                            let length = usize::try_from(num_elements * element_size).unwrap();
                            shard_slice[shard_offset..shard_offset + length]
                                .copy_from_slice(&decoded_chunk[data_idx..data_idx + length]);
                            data_idx += length;
                        }
                    }
                    Ok::<_, CodecError>(())
                }
            },
        )
        .await?;

        Ok(shard)
    }

    fn compute_encoded_size(
        &self,
        shard_representation: &ChunkRepresentation,
    ) -> Result<BytesRepresentation, CodecError> {
        let chunk_representation = self.chunk_representation(shard_representation);
        let chunks_per_shard =
            calculate_chunks_per_shard(shard_representation.shape(), chunk_representation.shape())?;
        let index_decoded_representation =
            sharding_index_decoded_representation(chunks_per_shard.as_slice());
        let index_encoded_size =
            compute_index_encoded_size(&self.index_codecs, &index_decoded_representation)?;

        // Empty inner chunks are elided, so the encoded size is at most the size of a full shard
        Ok(
            match self.inner_codecs.compute_encoded_size(&chunk_representation)? {
                BytesRepresentation::FixedSize(size) | BytesRepresentation::BoundedSize(size) => {
                    BytesRepresentation::BoundedSize(
                        index_encoded_size + size * chunks_per_shard.num_elements(),
                    )
                }
                BytesRepresentation::UnboundedSize => BytesRepresentation::UnboundedSize,
            },
        )
    }

    fn evolve(
        &self,
        shard_representation: &ChunkRepresentation,
    ) -> Result<Option<Arc<dyn ArrayToBytesCodecTraits>>, CodecError> {
        let chunk_representation = self.chunk_representation(shard_representation);
        if let Some(array_to_bytes) = self
            .inner_codecs
            .array_to_bytes_codec()
            .evolve(&chunk_representation)?
        {
            let inner_codecs = CodecChain::new(
                array_to_bytes,
                self.inner_codecs.bytes_to_bytes_codecs().to_vec(),
            );
            Ok(Some(Arc::new(Self {
                chunk_shape: self.chunk_shape.clone(),
                inner_codecs: Arc::new(inner_codecs),
                index_codecs: self.index_codecs.clone(),
                index_location: self.index_location,
            })))
        } else {
            Ok(None)
        }
    }
}
