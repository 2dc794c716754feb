//! An `array->bytes` codec formed by joining an `array->bytes` codec with a `bytes->bytes`
//! codec sequence.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    array::{
        codec::{
            ArrayToBytesCodecTraits, BytesToBytesCodecTraits, Codec, CodecError, CodecOptions,
            CodecTraits, ConfigurationError,
        },
        BytesRepresentation, ChunkRepresentation,
    },
    metadata::Metadata,
};

/// A codec chain is a sequence of one `array->bytes` codec and any number of `bytes->bytes`
/// codecs.
///
/// A codec chain is itself an `array->bytes` codec.
#[derive(Debug, Clone)]
pub struct CodecChain {
    array_to_bytes: Arc<dyn ArrayToBytesCodecTraits>,
    bytes_to_bytes: Vec<Arc<dyn BytesToBytesCodecTraits>>,
}

impl CodecChain {
    /// Create a new codec chain.
    #[must_use]
    pub fn new(
        array_to_bytes: Arc<dyn ArrayToBytesCodecTraits>,
        bytes_to_bytes: Vec<Arc<dyn BytesToBytesCodecTraits>>,
    ) -> Self {
        Self {
            array_to_bytes,
            bytes_to_bytes,
        }
    }

    /// Create a new codec chain from a list of metadata.
    ///
    /// # Errors
    /// Returns a [`ConfigurationError`] if:
    ///  - a codec could not be created,
    ///  - no array to bytes codec is supplied, or
    ///  - more than one array to bytes codec is supplied.
    pub fn from_metadata(metadatas: &[Metadata]) -> Result<Self, ConfigurationError> {
        let mut array_to_bytes: Option<Arc<dyn ArrayToBytesCodecTraits>> = None;
        let mut bytes_to_bytes: Vec<Arc<dyn BytesToBytesCodecTraits>> = vec![];
        for metadata in metadatas {
            match Codec::from_metadata(metadata)? {
                Codec::ArrayToBytes(codec) => {
                    if array_to_bytes.is_none() {
                        array_to_bytes = Some(codec);
                    } else {
                        return Err(ConfigurationError::MultipleArrayToBytesCodecs);
                    }
                }
                Codec::BytesToBytes(codec) => {
                    bytes_to_bytes.push(codec);
                }
            }
        }

        array_to_bytes.map_or(
            Err(ConfigurationError::MissingArrayToBytesCodec),
            |array_to_bytes| Ok(Self::new(array_to_bytes, bytes_to_bytes)),
        )
    }

    /// Create codec chain metadata.
    #[must_use]
    pub fn create_metadatas(&self) -> Vec<Metadata> {
        let mut metadatas = Vec::with_capacity(1 + self.bytes_to_bytes.len());
        if let Some(metadata) = self.array_to_bytes.create_metadata() {
            metadatas.push(metadata);
        }
        for codec in &self.bytes_to_bytes {
            if let Some(metadata) = codec.create_metadata() {
                metadatas.push(metadata);
            }
        }
        metadatas
    }

    /// Get the array to bytes codec.
    #[must_use]
    pub fn array_to_bytes_codec(&self) -> &Arc<dyn ArrayToBytesCodecTraits> {
        &self.array_to_bytes
    }

    /// Get the bytes to bytes codecs.
    #[must_use]
    pub fn bytes_to_bytes_codecs(&self) -> &[Arc<dyn BytesToBytesCodecTraits>] {
        &self.bytes_to_bytes
    }

    fn get_bytes_representations(
        &self,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<Vec<BytesRepresentation>, CodecError> {
        let mut bytes_representations = Vec::with_capacity(self.bytes_to_bytes.len() + 1);
        bytes_representations.push(
            self.array_to_bytes
                .compute_encoded_size(decoded_representation)?,
        );
        for codec in &self.bytes_to_bytes {
            bytes_representations
                .push(codec.compute_encoded_size(bytes_representations.last().unwrap()));
        }
        Ok(bytes_representations)
    }
}

impl CodecTraits for CodecChain {
    fn create_metadata(&self) -> Option<Metadata> {
        // A codec chain does not have standard metadata; its constituents do.
        None
    }
}

#[async_trait]
impl ArrayToBytesCodecTraits for CodecChain {
    async fn encode(
        &self,
        decoded_value: Vec<u8>,
        decoded_representation: &ChunkRepresentation,
        options: &CodecOptions,
    ) -> Result<Option<Vec<u8>>, CodecError> {
        if decoded_value.len() as u64 != decoded_representation.size() {
            return Err(CodecError::UnexpectedChunkDecodedSize(
                decoded_value.len(),
                decoded_representation.size(),
            ));
        }

        // array->bytes
        let value = self
            .array_to_bytes
            .encode(decoded_value, decoded_representation, options)
            .await?;
        let Some(mut value) = value else {
            return Ok(None);
        };

        // bytes->bytes
        for codec in &self.bytes_to_bytes {
            value = codec.encode(value, options).await?;
        }

        Ok(Some(value))
    }

    async fn decode(
        &self,
        mut encoded_value: Vec<u8>,
        decoded_representation: &ChunkRepresentation,
        options: &CodecOptions,
    ) -> Result<Vec<u8>, CodecError> {
        let bytes_representations = self.get_bytes_representations(decoded_representation)?;

        // bytes->bytes
        for (codec, bytes_representation) in std::iter::zip(
            self.bytes_to_bytes.iter().rev(),
            bytes_representations.iter().rev().skip(1),
        ) {
            encoded_value = codec
                .decode(encoded_value, bytes_representation, options)
                .await?;
        }

        // bytes->array
        let decoded_value = self
            .array_to_bytes
            .decode(encoded_value, decoded_representation, options)
            .await?;

        if decoded_value.len() as u64 != decoded_representation.size() {
            return Err(CodecError::UnexpectedChunkDecodedSize(
                decoded_value.len(),
                decoded_representation.size(),
            ));
        }

        Ok(decoded_value)
    }

    fn compute_encoded_size(
        &self,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<BytesRepresentation, CodecError> {
        let mut bytes_representation = self
            .array_to_bytes
            .compute_encoded_size(decoded_representation)?;
        for codec in &self.bytes_to_bytes {
            bytes_representation = codec.compute_encoded_size(&bytes_representation);
        }
        Ok(bytes_representation)
    }

    fn evolve(
        &self,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<Option<Arc<dyn ArrayToBytesCodecTraits>>, CodecError> {
        if let Some(array_to_bytes) = self.array_to_bytes.evolve(decoded_representation)? {
            Ok(Some(Arc::new(Self::new(
                array_to_bytes,
                self.bytes_to_bytes.clone(),
            ))))
        } else {
            Ok(None)
        }
    }
}

impl CodecChain {
    /// Evolve the chain to fit `decoded_representation`, returning a concrete chain.
    ///
    /// # Errors
    /// Returns [`CodecError`] if a constituent codec cannot apply to `decoded_representation`.
    pub fn evolved_for(
        &self,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<CodecChain, CodecError> {
        if let Some(array_to_bytes) = self.array_to_bytes.evolve(decoded_representation)? {
            Ok(Self::new(array_to_bytes, self.bytes_to_bytes.clone()))
        } else {
            Ok(self.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::array::{
        codec::{BytesCodec, Crc32cCodec},
        DataType, FillValue,
    };

    use super::*;

    const JSON_BYTES: &str = r#"{
    "name": "bytes",
    "configuration": {
        "endian": "big"
    }
}"#;

    const JSON_CRC32C: &str = r#"{
    "name": "crc32c"
}"#;

    #[cfg(feature = "gzip")]
    const JSON_GZIP: &str = r#"{
    "name": "gzip",
    "configuration": {
        "level": 1
    }
}"#;

    fn chunk_representation() -> ChunkRepresentation {
        ChunkRepresentation::new(
            crate::array::ChunkShape::try_from(vec![2u64, 3, 4])
                .unwrap()
                .into(),
            DataType::UInt16,
            FillValue::from(0u16),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn codec_chain_round_trip() {
        let chunk_representation = chunk_representation();
        let elements: Vec<u16> = (0..chunk_representation.num_elements() as u16).collect();
        let bytes = crate::array::transmute_to_bytes_vec(elements);

        let codec_configurations: Vec<Metadata> = vec![
            serde_json::from_str(JSON_BYTES).unwrap(),
            #[cfg(feature = "gzip")]
            serde_json::from_str(JSON_GZIP).unwrap(),
            serde_json::from_str(JSON_CRC32C).unwrap(),
        ];
        let codec = CodecChain::from_metadata(&codec_configurations).unwrap();

        let encoded = codec
            .encode(
                bytes.clone(),
                &chunk_representation,
                &CodecOptions::default(),
            )
            .await
            .unwrap()
            .unwrap();
        let decoded = codec
            .decode(
                encoded.clone(),
                &chunk_representation,
                &CodecOptions::default(),
            )
            .await
            .unwrap();
        assert_ne!(encoded, decoded);
        assert_eq!(bytes, decoded);
    }

    #[tokio::test]
    async fn codec_chain_fixed_size() {
        let chunk_representation = chunk_representation();
        let codec = CodecChain::new(
            Arc::new(BytesCodec::little()),
            vec![Arc::new(Crc32cCodec::new())],
        );
        assert_eq!(
            codec.compute_encoded_size(&chunk_representation).unwrap(),
            BytesRepresentation::FixedSize(chunk_representation.size() + 4)
        );
    }

    #[test]
    fn codec_chain_missing_array_to_bytes() {
        let codec_configurations: Vec<Metadata> =
            vec![serde_json::from_str(JSON_CRC32C).unwrap()];
        assert!(CodecChain::from_metadata(&codec_configurations).is_err());
    }

    #[test]
    fn codec_chain_multiple_array_to_bytes() {
        let codec_configurations: Vec<Metadata> = vec![
            serde_json::from_str(JSON_BYTES).unwrap(),
            serde_json::from_str(JSON_BYTES).unwrap(),
        ];
        assert!(CodecChain::from_metadata(&codec_configurations).is_err());
    }
}
