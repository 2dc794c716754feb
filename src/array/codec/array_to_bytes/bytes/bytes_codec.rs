use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    array::{
        codec::{ArrayToBytesCodecTraits, CodecError, CodecOptions, CodecTraits},
        BytesRepresentation, ChunkRepresentation,
    },
    metadata::Metadata,
};

use super::{
    bytes_configuration::BytesCodecConfigurationV1, reverse_endianness, BytesCodecConfiguration,
    Endianness, IDENTIFIER, NATIVE_ENDIAN,
};

/// A `bytes` codec implementation.
#[derive(Debug, Clone)]
pub struct BytesCodec {
    endian: Option<Endianness>,
}

impl Default for BytesCodec {
    fn default() -> Self {
        Self::new(Some(NATIVE_ENDIAN))
    }
}

impl BytesCodec {
    /// Create a new `bytes` codec.
    ///
    /// `endian` is optional because an 8-bit type has no endianness.
    #[must_use]
    pub const fn new(endian: Option<Endianness>) -> Self {
        Self { endian }
    }

    /// Create a new `bytes` codec for little endian data.
    #[must_use]
    pub const fn little() -> Self {
        Self::new(Some(Endianness::Little))
    }

    /// Create a new `bytes` codec for big endian data.
    #[must_use]
    pub const fn big() -> Self {
        Self::new(Some(Endianness::Big))
    }

    /// Create a new `bytes` codec from configuration.
    #[must_use]
    pub const fn new_with_configuration(configuration: &BytesCodecConfiguration) -> Self {
        let BytesCodecConfiguration::V1(configuration) = configuration;
        Self::new(configuration.endian)
    }

    fn do_encode_or_decode(
        &self,
        mut value: Vec<u8>,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<Vec<u8>, CodecError> {
        if value.len() as u64 != decoded_representation.size() {
            return Err(CodecError::UnexpectedChunkDecodedSize(
                value.len(),
                decoded_representation.size(),
            ));
        } else if decoded_representation.element_size() > 1 && self.endian.is_none() {
            return Err(CodecError::Other(format!(
                "tried to encode an array with element size {} with endianness None",
                decoded_representation.element_size()
            )));
        }

        if let Some(endian) = &self.endian {
            if !endian.is_native() {
                reverse_endianness(&mut value, decoded_representation.data_type());
            }
        }
        Ok(value)
    }
}

impl CodecTraits for BytesCodec {
    fn create_metadata(&self) -> Option<Metadata> {
        let configuration = BytesCodecConfigurationV1 {
            endian: self.endian,
        };
        Some(Metadata::new_with_serializable_configuration(IDENTIFIER, &configuration).unwrap())
    }
}

#[async_trait]
impl ArrayToBytesCodecTraits for BytesCodec {
    async fn encode(
        &self,
        decoded_value: Vec<u8>,
        decoded_representation: &ChunkRepresentation,
        _options: &CodecOptions,
    ) -> Result<Option<Vec<u8>>, CodecError> {
        self.do_encode_or_decode(decoded_value, decoded_representation)
            .map(Some)
    }

    async fn decode(
        &self,
        encoded_value: Vec<u8>,
        decoded_representation: &ChunkRepresentation,
        _options: &CodecOptions,
    ) -> Result<Vec<u8>, CodecError> {
        self.do_encode_or_decode(encoded_value, decoded_representation)
    }

    fn compute_encoded_size(
        &self,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<BytesRepresentation, CodecError> {
        Ok(BytesRepresentation::FixedSize(
            decoded_representation.size(),
        ))
    }

    fn evolve(
        &self,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<Option<Arc<dyn ArrayToBytesCodecTraits>>, CodecError> {
        if decoded_representation.element_size() == 1 {
            if self.endian.is_some() {
                Ok(Some(Arc::new(Self::new(None))))
            } else {
                Ok(None)
            }
        } else if self.endian.is_none() {
            Err(CodecError::Other(
                "the endian configuration must be specified for multi-byte data types".to_string(),
            ))
        } else {
            Ok(None)
        }
    }
}
