use async_trait::async_trait;

use crate::{
    array::{
        codec::{BytesToBytesCodecTraits, CodecError, CodecOptions, CodecTraits},
        BytesRepresentation,
    },
    metadata::Metadata,
};

use super::{
    zstd_configuration::ZstdCodecConfigurationV1, ZstdCodecConfiguration, ZstdCompressionLevel,
    IDENTIFIER,
};

/// A `zstd` codec implementation.
#[derive(Clone, Debug)]
pub struct ZstdCodec {
    compression_level: ZstdCompressionLevel,
    checksum: bool,
}

impl ZstdCodec {
    /// Create a new `zstd` codec.
    #[must_use]
    pub const fn new(compression_level: ZstdCompressionLevel, checksum: bool) -> Self {
        Self {
            compression_level,
            checksum,
        }
    }

    /// Create a new `zstd` codec from configuration.
    #[must_use]
    pub const fn new_with_configuration(configuration: &ZstdCodecConfiguration) -> Self {
        let ZstdCodecConfiguration::V1(configuration) = configuration;
        Self {
            compression_level: configuration.level,
            checksum: configuration.checksum,
        }
    }
}

impl CodecTraits for ZstdCodec {
    fn create_metadata(&self) -> Option<Metadata> {
        let configuration = ZstdCodecConfigurationV1 {
            level: self.compression_level,
            checksum: self.checksum,
        };
        Some(Metadata::new_with_serializable_configuration(IDENTIFIER, &configuration).unwrap())
    }
}

#[async_trait]
impl BytesToBytesCodecTraits for ZstdCodec {
    async fn encode(
        &self,
        decoded_value: Vec<u8>,
        _options: &CodecOptions,
    ) -> Result<Vec<u8>, CodecError> {
        let mut result = Vec::<u8>::new();
        let mut encoder = zstd::Encoder::new(&mut result, self.compression_level.as_i32())?;
        encoder.include_checksum(self.checksum)?;
        std::io::copy(&mut std::io::Cursor::new(decoded_value), &mut encoder)?;
        encoder.finish()?;
        Ok(result)
    }

    async fn decode(
        &self,
        encoded_value: Vec<u8>,
        _decoded_representation: &BytesRepresentation,
        _options: &CodecOptions,
    ) -> Result<Vec<u8>, CodecError> {
        zstd::decode_all(std::io::Cursor::new(encoded_value)).map_err(CodecError::from)
    }

    fn compute_encoded_size(
        &self,
        decoded_representation: &BytesRepresentation,
    ) -> BytesRepresentation {
        decoded_representation
            .size()
            .map_or(BytesRepresentation::UnboundedSize, |size| {
                // https://github.com/facebook/zstd/blob/dev/doc/zstd_compression_format.md
                const HEADER_TRAILER_OVERHEAD: u64 = 4 + 14 + 4;
                const MIN_WINDOW_SIZE: u64 = 1000;
                const BLOCK_OVERHEAD: u64 = 3;
                let blocks_overhead = BLOCK_OVERHEAD * size.div_ceil(MIN_WINDOW_SIZE);
                BytesRepresentation::BoundedSize(size + HEADER_TRAILER_OVERHEAD + blocks_overhead)
            })
    }
}
