use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

use crate::{array::ChunkShape, metadata::Metadata};

/// A wrapper to handle various versions of `sharding` codec configuration parameters.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display, From)]
#[serde(untagged)]
pub enum ShardingCodecConfiguration {
    /// Version 1.0.
    V1(ShardingCodecConfigurationV1),
}

/// `sharding` codec configuration parameters.
///
/// ### Example sharding codec configuration
/// ```json
/// {
///     "chunk_shape": [32, 32, 32],
///     "codecs": [
///         {
///             "name": "bytes",
///             "configuration": {
///                 "endian": "little"
///             }
///         },
///         {
///             "name": "gzip",
///             "configuration": {
///                 "level": 1
///             }
///         }
///     ],
///     "index_codecs": [
///         {
///             "name": "bytes",
///             "configuration": {
///                 "endian": "little"
///             }
///         },
///         { "name": "crc32c" }
///     ],
///     "index_location": "end"
/// }
/// ```
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display)]
#[serde(deny_unknown_fields)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct ShardingCodecConfigurationV1 {
    /// The shape of the inner chunks in a shard along each dimension of the outer array.
    pub chunk_shape: ChunkShape,
    /// A list of codecs to be used for encoding and decoding inner chunks.
    pub codecs: Vec<Metadata>,
    /// A list of codecs to be used for encoding and decoding the shard index.
    pub index_codecs: Vec<Metadata>,
    /// Specifies whether the shard index is located at the beginning or end of the shard.
    #[serde(default)]
    pub index_location: ShardingIndexLocation,
}

/// The sharding index location.
#[derive(Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Debug, Display)]
#[serde(rename_all = "lowercase")]
pub enum ShardingIndexLocation {
    /// The index is at the start of the shard, before the inner chunks.
    Start,
    /// The index is at the end of the shard, after the inner chunks.
    End,
}

impl Default for ShardingIndexLocation {
    fn default() -> Self {
        Self::End
    }
}
