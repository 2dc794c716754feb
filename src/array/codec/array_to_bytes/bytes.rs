//! The `bytes` array to bytes codec.
//!
//! Encodes arrays of fixed-size data types as little endian or big endian in lexicographical
//! order.

mod bytes_codec;
mod bytes_configuration;

pub use bytes_codec::BytesCodec;
pub use bytes_configuration::{BytesCodecConfiguration, BytesCodecConfigurationV1};

use derive_more::Display;

use crate::array::DataType;

/// The identifier for the `bytes` codec.
pub const IDENTIFIER: &str = "bytes";

/// The endianness of each element in an array, either `big` or `little`.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Display)]
pub enum Endianness {
    /// Little endian.
    Little,
    /// Big endian.
    Big,
}

impl Endianness {
    /// Return true if the endianness matches the endianness of the CPU.
    #[must_use]
    pub fn is_native(self) -> bool {
        self == NATIVE_ENDIAN
    }
}

impl serde::Serialize for Endianness {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Little => s.serialize_str("little"),
            Self::Big => s.serialize_str("big"),
        }
    }
}

impl<'de> serde::Deserialize<'de> for Endianness {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(d)?;
        if let serde_json::Value::String(string) = value {
            if string == "little" {
                return Ok(Self::Little);
            } else if string == "big" {
                return Ok(Self::Big);
            }
        }
        Err(serde::de::Error::custom(
            "endian: A string equal to either \"big\" or \"little\"",
        ))
    }
}

/// The endianness of the CPU.
pub const NATIVE_ENDIAN: Endianness = if cfg!(target_endian = "big") {
    Endianness::Big
} else {
    Endianness::Little
};

fn reverse_endianness(v: &mut [u8], data_type: &DataType) {
    match data_type {
        DataType::Bool | DataType::Int8 | DataType::UInt8 | DataType::RawBits(_) => {}
        DataType::Int16 | DataType::UInt16 | DataType::Float16 | DataType::BFloat16 => {
            let swap = |chunk: &mut [u8]| {
                let bytes = u16::from_ne_bytes(chunk.try_into().unwrap());
                chunk.copy_from_slice(bytes.swap_bytes().to_ne_bytes().as_slice());
            };
            v.chunks_exact_mut(2).for_each(swap);
        }
        DataType::Int32 | DataType::UInt32 | DataType::Float32 | DataType::Complex64 => {
            let swap = |chunk: &mut [u8]| {
                let bytes = u32::from_ne_bytes(chunk.try_into().unwrap());
                chunk.copy_from_slice(bytes.swap_bytes().to_ne_bytes().as_slice());
            };
            v.chunks_exact_mut(4).for_each(swap);
        }
        DataType::Int64 | DataType::UInt64 | DataType::Float64 | DataType::Complex128 => {
            let swap = |chunk: &mut [u8]| {
                let bytes = u64::from_ne_bytes(chunk.try_into().unwrap());
                chunk.copy_from_slice(bytes.swap_bytes().to_ne_bytes().as_slice());
            };
            v.chunks_exact_mut(8).for_each(swap);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU64;

    use crate::array::{
        codec::{ArrayToBytesCodecTraits, CodecOptions, CodecTraits},
        ChunkRepresentation, DataType, FillValue,
    };

    use super::*;

    #[test]
    fn codec_bytes_configuration_big() {
        let codec_configuration: BytesCodecConfiguration =
            serde_json::from_str(r#"{"endian":"big"}"#).unwrap();
        let codec = BytesCodec::new_with_configuration(&codec_configuration);
        let metadata = codec.create_metadata().unwrap();
        assert_eq!(
            serde_json::to_string(&metadata).unwrap(),
            r#"{"name":"bytes","configuration":{"endian":"big"}}"#
        );
    }

    #[test]
    fn codec_bytes_configuration_none() {
        let codec_configuration: BytesCodecConfiguration = serde_json::from_str(r"{}").unwrap();
        let codec = BytesCodec::new_with_configuration(&codec_configuration);
        let metadata = codec.create_metadata().unwrap();
        assert_eq!(
            serde_json::to_string(&metadata).unwrap(),
            r#"{"name":"bytes"}"#
        );
    }

    async fn codec_bytes_round_trip_impl(
        endianness: Option<Endianness>,
        data_type: DataType,
        fill_value: FillValue,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let chunk_shape = vec![NonZeroU64::new(10).unwrap(), NonZeroU64::new(10).unwrap()];
        let chunk_representation =
            ChunkRepresentation::new(chunk_shape, data_type, fill_value).unwrap();
        let bytes: Vec<u8> = (0..chunk_representation.size()).map(|s| s as u8).collect();

        let codec = BytesCodec::new(endianness);

        let encoded = codec
            .encode(
                bytes.clone(),
                &chunk_representation,
                &CodecOptions::default(),
            )
            .await?
            .unwrap();
        let decoded = codec
            .decode(encoded, &chunk_representation, &CodecOptions::default())
            .await
            .unwrap();
        assert_eq!(bytes, decoded);
        Ok(())
    }

    #[tokio::test]
    async fn codec_bytes_round_trip_f32() {
        codec_bytes_round_trip_impl(
            Some(Endianness::Big),
            DataType::Float32,
            FillValue::from(0.0f32),
        )
        .await
        .unwrap();
        codec_bytes_round_trip_impl(
            Some(Endianness::Little),
            DataType::Float32,
            FillValue::from(0.0f32),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn codec_bytes_round_trip_u16() {
        codec_bytes_round_trip_impl(
            Some(Endianness::Big),
            DataType::UInt16,
            FillValue::from(0u16),
        )
        .await
        .unwrap();
        codec_bytes_round_trip_impl(
            Some(Endianness::Little),
            DataType::UInt16,
            FillValue::from(0u16),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn codec_bytes_round_trip_u8() {
        codec_bytes_round_trip_impl(Some(Endianness::Big), DataType::UInt8, FillValue::from(0u8))
            .await
            .unwrap();
        codec_bytes_round_trip_impl(None, DataType::UInt8, FillValue::from(0u8))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn codec_bytes_round_trip_i32_endianness_none() {
        assert!(
            codec_bytes_round_trip_impl(None, DataType::Int32, FillValue::from(0i32))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn codec_bytes_round_trip_complex64() {
        codec_bytes_round_trip_impl(
            Some(Endianness::Big),
            DataType::Complex64,
            FillValue::from(num::complex::Complex32::new(0.0, 0.0)),
        )
        .await
        .unwrap();
    }
}
