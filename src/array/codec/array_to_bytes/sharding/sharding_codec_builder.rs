use std::sync::Arc;

use crate::array::{
    codec::{
        ArrayToBytesCodecTraits, BytesCodec, BytesToBytesCodecTraits, CodecChain,
        ConfigurationError, Crc32cCodec,
    },
    ChunkShape,
};

use super::{ShardingCodec, ShardingIndexLocation};

/// A [`ShardingCodec`] builder.
///
/// By default, the inner chunks are encoded with the `bytes` codec with little endian encoding,
/// and the index is encoded with the `bytes` codec with little endian encoding followed by the
/// `crc32c` checksum codec.
///
/// Use the methods in the builder to change the configuration away from these defaults, and then
/// build the `sharding` codec with [`build`](ShardingCodecBuilder::build).
#[derive(Debug)]
pub struct ShardingCodecBuilder {
    inner_chunk_shape: ChunkShape,
    index_array_to_bytes_codec: Arc<dyn ArrayToBytesCodecTraits>,
    index_bytes_to_bytes_codecs: Vec<Arc<dyn BytesToBytesCodecTraits>>,
    array_to_bytes_codec: Arc<dyn ArrayToBytesCodecTraits>,
    bytes_to_bytes_codecs: Vec<Arc<dyn BytesToBytesCodecTraits>>,
    index_location: ShardingIndexLocation,
}

impl ShardingCodecBuilder {
    /// Create a new `sharding` codec builder.
    #[must_use]
    pub fn new(inner_chunk_shape: ChunkShape) -> Self {
        Self {
            inner_chunk_shape,
            index_array_to_bytes_codec: Arc::new(BytesCodec::little()),
            index_bytes_to_bytes_codecs: vec![Arc::new(Crc32cCodec::new())],
            array_to_bytes_codec: Arc::new(BytesCodec::little()),
            bytes_to_bytes_codecs: Vec::default(),
            index_location: ShardingIndexLocation::default(),
        }
    }

    /// Set the index array to bytes codec.
    ///
    /// If left unmodified, the index will be encoded with the `bytes` codec with little endian
    /// encoding.
    pub fn index_array_to_bytes_codec(
        &mut self,
        index_array_to_bytes_codec: Arc<dyn ArrayToBytesCodecTraits>,
    ) -> &mut Self {
        self.index_array_to_bytes_codec = index_array_to_bytes_codec;
        self
    }

    /// Set the index bytes to bytes codecs.
    ///
    /// If left unmodified, the index will be encoded with the `crc32c` checksum codec.
    pub fn index_bytes_to_bytes_codecs(
        &mut self,
        index_bytes_to_bytes_codecs: Vec<Arc<dyn BytesToBytesCodecTraits>>,
    ) -> &mut Self {
        self.index_bytes_to_bytes_codecs = index_bytes_to_bytes_codecs;
        self
    }

    /// Set the inner chunk array to bytes codec.
    ///
    /// If left unmodified, the inner chunks will be encoded with the `bytes` codec with little
    /// endian encoding.
    pub fn array_to_bytes_codec(
        &mut self,
        array_to_bytes_codec: Arc<dyn ArrayToBytesCodecTraits>,
    ) -> &mut Self {
        self.array_to_bytes_codec = array_to_bytes_codec;
        self
    }

    /// Set the inner chunk bytes to bytes codecs.
    ///
    /// If left unmodified, no bytes to bytes codecs will be applied for the inner chunks.
    pub fn bytes_to_bytes_codecs(
        &mut self,
        bytes_to_bytes_codecs: Vec<Arc<dyn BytesToBytesCodecTraits>>,
    ) -> &mut Self {
        self.bytes_to_bytes_codecs = bytes_to_bytes_codecs;
        self
    }

    /// Set the index location.
    ///
    /// If left unmodified, defaults to the end of the shard.
    pub fn index_location(&mut self, index_location: ShardingIndexLocation) -> &mut Self {
        self.index_location = index_location;
        self
    }

    /// Build into a [`ShardingCodec`].
    ///
    /// # Errors
    /// Returns [`ConfigurationError`] if the index codecs do not have a fixed encoded size.
    pub fn build(&self) -> Result<ShardingCodec, ConfigurationError> {
        let inner_codecs = CodecChain::new(
            self.array_to_bytes_codec.clone(),
            self.bytes_to_bytes_codecs.clone(),
        );
        let index_codecs = CodecChain::new(
            self.index_array_to_bytes_codec.clone(),
            self.index_bytes_to_bytes_codecs.clone(),
        );
        ShardingCodec::new(
            self.inner_chunk_shape.clone(),
            inner_codecs,
            index_codecs,
            self.index_location,
        )
    }
}
