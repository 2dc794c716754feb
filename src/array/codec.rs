//! Codecs for encoding and decoding chunks.
//!
//! A chunk is encoded by a sequence of codecs, each of which specifies a bidirectional transform.
//! A codec can map an array to bytes or bytes to bytes.
//! A [`CodecChain`] represents a codec sequence consisting of one `array->bytes` codec and any
//! number of `bytes->bytes` codecs; a codec chain is itself an `array->bytes` codec.
//!
//! The [`ShardingCodec`] is an `array->bytes` codec that subdivides a chunk into inner chunks,
//! each encoded through its own inner [`CodecChain`].

pub mod array_to_bytes;
pub mod bytes_to_bytes;

mod options;

pub use options::{CodecOptions, CodecOptionsBuilder};

pub use array_to_bytes::{
    bytes::{BytesCodec, BytesCodecConfiguration, BytesCodecConfigurationV1, Endianness},
    codec_chain::CodecChain,
    sharding::{
        CorruptShardError, ShardIndex, ShardingCodec, ShardingCodecBuilder,
        ShardingCodecConfiguration, ShardingCodecConfigurationV1, ShardingIndexLocation,
        ShardingPartialDecoder, ShardingPartialEncoder,
    },
};

pub use bytes_to_bytes::crc32c::{
    Crc32cCodec, Crc32cCodecConfiguration, Crc32cCodecConfigurationV1,
};
#[cfg(feature = "gzip")]
pub use bytes_to_bytes::gzip::{GzipCodec, GzipCodecConfiguration, GzipCodecConfigurationV1};
#[cfg(feature = "zstd")]
pub use bytes_to_bytes::zstd::{ZstdCodec, ZstdCodecConfiguration, ZstdCodecConfigurationV1};

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::{
    array_subset::{IncompatibleArraySubsetAndShapeError, IncompatibleDimensionalityError},
    byte_range::InvalidByteRangeError,
    metadata::{ConfigurationInvalidError, Metadata},
    storage::StorageError,
};

use super::{BytesRepresentation, ChunkRepresentation};

/// A generic `array->bytes` or `bytes->bytes` codec.
#[derive(Debug, Clone)]
pub enum Codec {
    /// An `array->bytes` codec.
    ArrayToBytes(Arc<dyn ArrayToBytesCodecTraits>),
    /// A `bytes->bytes` codec.
    BytesToBytes(Arc<dyn BytesToBytesCodecTraits>),
}

impl Codec {
    /// Create a codec from metadata.
    ///
    /// # Errors
    /// Returns [`ConfigurationError`] if the metadata is invalid or not associated with a known
    /// codec.
    pub fn from_metadata(metadata: &Metadata) -> Result<Self, ConfigurationError> {
        match metadata.name() {
            array_to_bytes::bytes::IDENTIFIER => {
                let configuration: BytesCodecConfiguration = if metadata
                    .configuration_is_none_or_empty()
                {
                    BytesCodecConfiguration::V1(BytesCodecConfigurationV1 { endian: None })
                } else {
                    metadata.to_configuration()?
                };
                Ok(Self::ArrayToBytes(Arc::new(
                    BytesCodec::new_with_configuration(&configuration),
                )))
            }
            array_to_bytes::sharding::IDENTIFIER => {
                let configuration: ShardingCodecConfiguration = metadata.to_configuration()?;
                Ok(Self::ArrayToBytes(Arc::new(
                    ShardingCodec::new_with_configuration(&configuration)?,
                )))
            }
            bytes_to_bytes::crc32c::IDENTIFIER => {
                if metadata.configuration_is_none_or_empty() {
                    Ok(Self::BytesToBytes(Arc::new(Crc32cCodec::new())))
                } else {
                    Err(ConfigurationInvalidError::new(
                        metadata.name(),
                        metadata.configuration().cloned(),
                    )
                    .into())
                }
            }
            #[cfg(feature = "gzip")]
            bytes_to_bytes::gzip::IDENTIFIER => {
                let configuration: GzipCodecConfiguration = metadata.to_configuration()?;
                let codec = GzipCodec::new_with_configuration(&configuration)
                    .map_err(|err| ConfigurationError::Other(err.to_string()))?;
                Ok(Self::BytesToBytes(Arc::new(codec)))
            }
            #[cfg(feature = "zstd")]
            bytes_to_bytes::zstd::IDENTIFIER => {
                let configuration: ZstdCodecConfiguration = metadata.to_configuration()?;
                Ok(Self::BytesToBytes(Arc::new(
                    ZstdCodec::new_with_configuration(&configuration),
                )))
            }
            _ => Err(ConfigurationError::UnsupportedCodec(
                metadata.name().to_string(),
            )),
        }
    }
}

/// Codec traits.
pub trait CodecTraits: Send + Sync {
    /// Create metadata.
    ///
    /// A hidden codec (e.g. a cache) will return [`None`], since it will not have any associated
    /// metadata.
    fn create_metadata(&self) -> Option<Metadata>;
}

/// Traits for `array->bytes` codecs.
#[async_trait]
pub trait ArrayToBytesCodecTraits: CodecTraits + core::fmt::Debug {
    /// Encode a chunk.
    ///
    /// Returns [`None`] if the codec elides chunks that are entirely the fill value.
    ///
    /// # Errors
    /// Returns [`CodecError`] if a codec fails or `decoded_value` is incompatible with
    /// `decoded_representation`.
    async fn encode(
        &self,
        decoded_value: Vec<u8>,
        decoded_representation: &ChunkRepresentation,
        options: &CodecOptions,
    ) -> Result<Option<Vec<u8>>, CodecError>;

    /// Decode a chunk.
    ///
    /// # Errors
    /// Returns [`CodecError`] if a codec fails.
    async fn decode(
        &self,
        encoded_value: Vec<u8>,
        decoded_representation: &ChunkRepresentation,
        options: &CodecOptions,
    ) -> Result<Vec<u8>, CodecError>;

    /// Returns the size of the encoded representation given the size of the decoded
    /// representation.
    ///
    /// # Errors
    /// Returns [`CodecError`] if the decoded representation is not supported by this codec.
    fn compute_encoded_size(
        &self,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<BytesRepresentation, CodecError>;

    /// Evolve the codec to fit `decoded_representation`, e.g. adapt the byte order to the data
    /// type.
    ///
    /// Returns [`None`] if the codec is unchanged.
    ///
    /// # Errors
    /// Returns [`CodecError`] if the codec cannot apply to `decoded_representation`.
    fn evolve(
        &self,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<Option<Arc<dyn ArrayToBytesCodecTraits>>, CodecError> {
        let _ = decoded_representation;
        Ok(None)
    }
}

/// Traits for `bytes->bytes` codecs.
#[async_trait]
pub trait BytesToBytesCodecTraits: CodecTraits + core::fmt::Debug {
    /// Encode bytes.
    ///
    /// # Errors
    /// Returns [`CodecError`] if a codec fails.
    async fn encode(
        &self,
        decoded_value: Vec<u8>,
        options: &CodecOptions,
    ) -> Result<Vec<u8>, CodecError>;

    /// Decode bytes.
    ///
    /// # Errors
    /// Returns [`CodecError`] if a codec fails.
    async fn decode(
        &self,
        encoded_value: Vec<u8>,
        decoded_representation: &BytesRepresentation,
        options: &CodecOptions,
    ) -> Result<Vec<u8>, CodecError>;

    /// Returns the size of the encoded representation given the size of the decoded
    /// representation.
    fn compute_encoded_size(
        &self,
        decoded_representation: &BytesRepresentation,
    ) -> BytesRepresentation;
}

/// A codec error.
#[derive(Debug, Error)]
pub enum CodecError {
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// An invalid byte range was requested.
    #[error(transparent)]
    InvalidByteRangeError(#[from] InvalidByteRangeError),
    /// An invalid array subset was requested.
    #[error(transparent)]
    InvalidArraySubsetError(#[from] IncompatibleArraySubsetAndShapeError),
    /// An incompatible dimensionality.
    #[error(transparent)]
    IncompatibleDimensionalityError(#[from] IncompatibleDimensionalityError),
    /// The decoded size of a chunk did not match what was expected.
    #[error("the size of a decoded chunk is {_0}, expected {_1}")]
    UnexpectedChunkDecodedSize(usize, u64),
    /// An embedded checksum does not match the decoded value.
    #[error("the checksum is invalid")]
    InvalidChecksum,
    /// A shard is malformed and cannot be decoded safely.
    #[error(transparent)]
    CorruptShard(#[from] CorruptShardError),
    /// A store error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// Other.
    #[error("{_0}")]
    Other(String),
}

impl From<&str> for CodecError {
    fn from(err: &str) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<String> for CodecError {
    fn from(err: String) -> Self {
        Self::Other(err)
    }
}

/// An invalid codec configuration error.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// A codec name is not known.
    #[error("codec {_0} is not supported")]
    UnsupportedCodec(String),
    /// A codec configuration is invalid.
    #[error(transparent)]
    InvalidConfiguration(#[from] ConfigurationInvalidError),
    /// A codec chain has no `array->bytes` codec.
    #[error("a codec chain must have exactly one array to bytes codec, got none")]
    MissingArrayToBytesCodec,
    /// A codec chain has more than one `array->bytes` codec.
    #[error("a codec chain must have exactly one array to bytes codec, got multiple")]
    MultipleArrayToBytesCodecs,
    /// Other.
    #[error("{_0}")]
    Other(String),
}
