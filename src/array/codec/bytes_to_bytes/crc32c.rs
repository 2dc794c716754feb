//! The `crc32c` checksum `bytes->bytes` codec.
//!
//! Appends a CRC32C checksum of the input bytestream.

mod crc32c_codec;
mod crc32c_configuration;

pub use crc32c_codec::Crc32cCodec;
pub use crc32c_configuration::{Crc32cCodecConfiguration, Crc32cCodecConfigurationV1};

/// The identifier for the `crc32c` codec.
pub const IDENTIFIER: &str = "crc32c";

const CHECKSUM_SIZE: usize = core::mem::size_of::<u32>();

#[cfg(test)]
mod tests {
    use crate::array::{
        codec::{BytesToBytesCodecTraits, CodecOptions},
        BytesRepresentation,
    };

    use super::*;

    const JSON1: &str = r"{}";

    #[tokio::test]
    async fn codec_crc32c() {
        let elements: Vec<u8> = (0..6).collect();
        let bytes = elements;
        let bytes_representation = BytesRepresentation::FixedSize(bytes.len() as u64);

        let codec_configuration: Crc32cCodecConfiguration = serde_json::from_str(JSON1).unwrap();
        let codec = Crc32cCodec::new_with_configuration(&codec_configuration);

        let encoded = codec
            .encode(bytes.clone(), &CodecOptions::default())
            .await
            .unwrap();
        let decoded = codec
            .decode(
                encoded.clone(),
                &bytes_representation,
                &CodecOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(bytes, decoded);

        // Check that the checksum is correct
        let checksum: &[u8; 4] = &encoded[encoded.len() - CHECKSUM_SIZE..encoded.len()]
            .try_into()
            .unwrap();
        assert_eq!(checksum, &[20, 133, 9, 65]);
    }

    #[tokio::test]
    async fn codec_crc32c_invalid_checksum() {
        let elements: Vec<u8> = (0..6).collect();
        let bytes_representation = BytesRepresentation::FixedSize(elements.len() as u64);

        let codec = Crc32cCodec::new();
        let mut encoded = codec
            .encode(elements, &CodecOptions::default())
            .await
            .unwrap();
        *encoded.last_mut().unwrap() ^= 0xFF;
        assert!(codec
            .decode(
                encoded.clone(),
                &bytes_representation,
                &CodecOptions::default()
            )
            .await
            .is_err());

        // Validation can be opted out of
        let options = CodecOptions::builder().validate_checksums(false).build();
        assert!(codec
            .decode(encoded, &bytes_representation, &options)
            .await
            .is_ok());
    }
}
