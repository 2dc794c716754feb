//! The `zstd` bytes to bytes codec.
//!
//! Applies [zstd](https://datatracker.ietf.org/doc/html/rfc8878) compression.

mod zstd_codec;
mod zstd_configuration;

pub use zstd_codec::ZstdCodec;
pub use zstd_configuration::{
    ZstdCodecConfiguration, ZstdCodecConfigurationV1, ZstdCompressionLevel,
};

/// The identifier for the `zstd` codec.
pub const IDENTIFIER: &str = "zstd";

#[cfg(test)]
mod tests {
    use crate::array::{
        codec::{BytesToBytesCodecTraits, CodecOptions},
        BytesRepresentation,
    };

    use super::*;

    const JSON_VALID: &str = r#"{
        "level": 1,
        "checksum": false
    }"#;

    #[test]
    fn codec_zstd_configuration_valid() {
        assert!(serde_json::from_str::<ZstdCodecConfiguration>(JSON_VALID).is_ok());
    }

    #[tokio::test]
    async fn codec_zstd_round_trip() {
        let elements: Vec<u8> = (0..64).map(|i| i % 5).collect();
        let bytes_representation = BytesRepresentation::FixedSize(elements.len() as u64);

        let configuration: ZstdCodecConfiguration = serde_json::from_str(JSON_VALID).unwrap();
        let codec = ZstdCodec::new_with_configuration(&configuration);

        let encoded = codec
            .encode(elements.clone(), &CodecOptions::default())
            .await
            .unwrap();
        let decoded = codec
            .decode(encoded, &bytes_representation, &CodecOptions::default())
            .await
            .unwrap();
        assert_eq!(elements, decoded);
    }
}
