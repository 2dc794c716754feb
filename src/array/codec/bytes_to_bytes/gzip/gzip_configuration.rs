use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A wrapper to handle various versions of `gzip` codec configuration parameters.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display, From)]
#[serde(untagged)]
pub enum GzipCodecConfiguration {
    /// Version 1.0.
    V1(GzipCodecConfigurationV1),
}

/// `gzip` codec configuration parameters.
///
/// ### Example configuration
/// ```json
/// {
///     "level": 1
/// }
/// ```
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display)]
#[serde(deny_unknown_fields)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct GzipCodecConfigurationV1 {
    /// The compression level.
    pub level: GzipCompressionLevel,
}

impl GzipCodecConfigurationV1 {
    /// Create a new `gzip` codec configuration given a [`GzipCompressionLevel`].
    #[must_use]
    pub const fn new(level: GzipCompressionLevel) -> Self {
        Self { level }
    }
}

/// A gzip compression level. An integer from 0 to 9.
#[derive(Serialize, Copy, Clone, Eq, PartialEq, Debug, Display)]
pub struct GzipCompressionLevel(u32);

/// An invalid gzip compression level error.
#[derive(Copy, Clone, Debug, Error)]
#[error("invalid gzip compression level {_0}, must be an integer from 0 to 9")]
pub struct GzipCompressionLevelError(i64);

impl<'de> serde::Deserialize<'de> for GzipCompressionLevel {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let level = i64::deserialize(d)?;
        if (0..=9).contains(&level) {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let level = level as u32;
            Ok(Self(level))
        } else {
            Err(serde::de::Error::custom(GzipCompressionLevelError(level)))
        }
    }
}

impl TryFrom<u32> for GzipCompressionLevel {
    type Error = GzipCompressionLevelError;
    fn try_from(level: u32) -> Result<Self, Self::Error> {
        if level <= 9 {
            Ok(Self(level))
        } else {
            Err(GzipCompressionLevelError(i64::from(level)))
        }
    }
}

impl GzipCompressionLevel {
    /// Return the compression level as a [`u32`].
    #[must_use]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}
