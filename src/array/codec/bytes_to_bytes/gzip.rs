//! The `gzip` bytes to bytes codec.
//!
//! Applies [gzip](https://datatracker.ietf.org/doc/html/rfc1952) compression.

mod gzip_codec;
mod gzip_configuration;

pub use gzip_codec::GzipCodec;
pub use gzip_configuration::{
    GzipCodecConfiguration, GzipCodecConfigurationV1, GzipCompressionLevel,
    GzipCompressionLevelError,
};

/// The identifier for the `gzip` codec.
pub const IDENTIFIER: &str = "gzip";

#[cfg(test)]
mod tests {
    use crate::array::{
        codec::{BytesToBytesCodecTraits, CodecOptions},
        BytesRepresentation,
    };

    use super::*;

    const JSON_VALID: &str = r#"{
        "level": 1
    }"#;

    #[test]
    fn codec_gzip_configuration_valid() {
        assert!(serde_json::from_str::<GzipCodecConfiguration>(JSON_VALID).is_ok());
    }

    #[test]
    fn codec_gzip_configuration_invalid() {
        assert!(serde_json::from_str::<GzipCodecConfiguration>(r#"{"level": -1}"#).is_err());
        assert!(serde_json::from_str::<GzipCodecConfiguration>(r#"{"level": 10}"#).is_err());
    }

    #[tokio::test]
    async fn codec_gzip_round_trip() {
        let elements: Vec<u8> = (0..32).map(|i| i % 7).collect();
        let bytes_representation = BytesRepresentation::FixedSize(elements.len() as u64);

        let configuration: GzipCodecConfiguration = serde_json::from_str(JSON_VALID).unwrap();
        let codec = GzipCodec::new_with_configuration(&configuration).unwrap();

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
