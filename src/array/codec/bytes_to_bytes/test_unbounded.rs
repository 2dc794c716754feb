//! A test codec with an unbounded encoded size.
//!
//! A pass-through codec used to exercise codec chains whose encoded size cannot be computed
//! ahead of time.

use async_trait::async_trait;

use crate::{
    array::{
        codec::{BytesToBytesCodecTraits, CodecError, CodecOptions, CodecTraits},
        BytesRepresentation,
    },
    metadata::Metadata,
};

/// A test codec that passes bytes through but reports an unbounded encoded size.
#[derive(Clone, Debug, Default)]
pub struct TestUnboundedCodec;

impl TestUnboundedCodec {
    /// Create a new test unbounded codec.
    #[must_use]
    pub const fn new() -> Self {
        Self {}
    }
}

impl CodecTraits for TestUnboundedCodec {
    fn create_metadata(&self) -> Option<Metadata> {
        None
    }
}

#[async_trait]
impl BytesToBytesCodecTraits for TestUnboundedCodec {
    async fn encode(
        &self,
        decoded_value: Vec<u8>,
        _options: &CodecOptions,
    ) -> Result<Vec<u8>, CodecError> {
        Ok(decoded_value)
    }

    async fn decode(
        &self,
        encoded_value: Vec<u8>,
        _decoded_representation: &BytesRepresentation,
        _options: &CodecOptions,
    ) -> Result<Vec<u8>, CodecError> {
        Ok(encoded_value)
    }

    fn compute_encoded_size(
        &self,
        _decoded_representation: &BytesRepresentation,
    ) -> BytesRepresentation {
        BytesRepresentation::UnboundedSize
    }
}
