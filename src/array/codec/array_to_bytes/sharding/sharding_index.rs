use std::num::NonZeroU64;

use itertools::Itertools;

use crate::array::{
    chunk_shape_to_array_shape,
    codec::{ArrayToBytesCodecTraits, CodecChain, CodecError, CodecOptions},
    ravel_indices, transmute_to_bytes_vec, ArrayShape,
};

use super::{sharding_index_decoded_representation, CorruptShardError, ShardingIndexLocation};

/// The sentinel value marking an empty inner chunk, for both the offset and the length.
const MAX_UINT_64: u64 = u64::MAX;

/// The shard index: a dense table mapping inner chunk indices to the byte range of the encoded
/// inner chunk within the shard.
///
/// Logically the index is an array of shape `chunks_per_shard + (2,)` with `u64` elements in
/// row-major order; entry `(c0, .., cn, 0)` is the byte offset of inner chunk `(c0, .., cn)` and
/// entry `(c0, .., cn, 1)` is its byte length.
/// An inner chunk with both fields equal to [`u64::MAX`] is empty and reads as the fill value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ShardIndex {
    chunks_per_shard: ArrayShape,
    offsets_and_lengths: Vec<u64>,
}

impl ShardIndex {
    /// Create an index for `chunks_per_shard` with every inner chunk marked empty.
    ///
    /// # Panics
    /// Panics if the number of inner chunks exceeds [`usize::MAX`].
    #[must_use]
    pub fn create_empty(chunks_per_shard: &[NonZeroU64]) -> Self {
        let chunks_per_shard = chunk_shape_to_array_shape(chunks_per_shard);
        let num_chunks = usize::try_from(chunks_per_shard.iter().product::<u64>()).unwrap();
        Self {
            chunks_per_shard,
            offsets_and_lengths: vec![MAX_UINT_64; num_chunks * 2],
        }
    }

    /// Return the number of inner chunks per shard along each dimension.
    #[must_use]
    pub fn chunks_per_shard(&self) -> &[u64] {
        &self.chunks_per_shard
    }

    fn entry(&self, chunk_indices: &[u64]) -> usize {
        debug_assert_eq!(chunk_indices.len(), self.chunks_per_shard.len());
        usize::try_from(ravel_indices(chunk_indices, &self.chunks_per_shard) * 2).unwrap()
    }

    /// Return the byte range `(start, end)` of the inner chunk at `chunk_indices`, or [`None`]
    /// if it is empty.
    #[must_use]
    pub fn get(&self, chunk_indices: &[u64]) -> Option<(u64, u64)> {
        let entry = self.entry(chunk_indices);
        let offset = self.offsets_and_lengths[entry];
        let length = self.offsets_and_lengths[entry + 1];
        if offset == MAX_UINT_64 && length == MAX_UINT_64 {
            None
        } else {
            Some((offset, offset + length))
        }
    }

    /// Set the inner chunk at `chunk_indices` to the `(offset, length)` byte range, or mark it
    /// empty on [`None`].
    pub fn set(&mut self, chunk_indices: &[u64], offset_and_length: Option<(u64, u64)>) {
        let entry = self.entry(chunk_indices);
        let (offset, length) = offset_and_length.unwrap_or((MAX_UINT_64, MAX_UINT_64));
        self.offsets_and_lengths[entry] = offset;
        self.offsets_and_lengths[entry + 1] = length;
    }

    /// Returns true if every inner chunk is empty.
    #[must_use]
    pub fn is_all_empty(&self) -> bool {
        self.offsets_and_lengths.iter().all(|x| *x == MAX_UINT_64)
    }

    /// Returns true if every non-empty inner chunk has length `chunk_byte_length`, starts at a
    /// multiple of it, and all offsets are unique.
    #[must_use]
    pub fn is_dense(&self, chunk_byte_length: u64) -> bool {
        let sorted_offsets_and_lengths = self
            .offsets_and_lengths
            .iter()
            .tuples()
            .filter(|(&offset, _)| offset != MAX_UINT_64)
            .sorted_by_key(|(&offset, _)| offset)
            .collect::<Vec<_>>();

        if !sorted_offsets_and_lengths
            .iter()
            .map(|(&offset, _)| offset)
            .all_unique()
        {
            return false;
        }

        sorted_offsets_and_lengths
            .iter()
            .all(|(&offset, &length)| offset % chunk_byte_length == 0 && length == chunk_byte_length)
    }

    /// Add `delta` to the offset of every non-empty inner chunk.
    ///
    /// Used to make offsets absolute when the index is placed at the start of the shard.
    pub(crate) fn inflate_offsets(&mut self, delta: u64) {
        for (offset, _length) in self.offsets_and_lengths.iter_mut().tuples() {
            if *offset != MAX_UINT_64 {
                *offset += delta;
            }
        }
    }

    /// Encode the index with the index codec pipeline.
    ///
    /// # Errors
    /// Returns [`CodecError`] if the index codec pipeline fails.
    pub async fn encode(
        &self,
        index_codecs: &CodecChain,
        options: &CodecOptions,
    ) -> Result<Vec<u8>, CodecError> {
        let chunks_per_shard = self
            .chunks_per_shard
            .iter()
            .map(|&c| unsafe { NonZeroU64::new_unchecked(c) })
            .collect::<Vec<_>>();
        let index_decoded_representation = sharding_index_decoded_representation(&chunks_per_shard);
        index_codecs
            .encode(
                transmute_to_bytes_vec(self.offsets_and_lengths.clone()),
                &index_decoded_representation,
                options,
            )
            .await?
            .ok_or_else(|| CodecError::Other("the shard index encoded to nothing".to_string()))
    }

    /// Decode an index encoded with the index codec pipeline.
    ///
    /// # Errors
    /// Returns [`CodecError`] if the index codec pipeline fails or the decoded index does not
    /// have the expected number of elements.
    #[allow(clippy::missing_panics_doc)]
    pub async fn decode(
        encoded_index: Vec<u8>,
        chunks_per_shard: &[NonZeroU64],
        index_codecs: &CodecChain,
        options: &CodecOptions,
    ) -> Result<Self, CodecError> {
        let index_decoded_representation = sharding_index_decoded_representation(chunks_per_shard);
        let decoded_index = index_codecs
            .decode(encoded_index, &index_decoded_representation, options)
            .await?;
        let offsets_and_lengths: Vec<u64> = decoded_index
            .chunks_exact(core::mem::size_of::<u64>())
            .map(|v| u64::from_ne_bytes(v.try_into().unwrap() /* safe */))
            .collect();
        let expected = index_decoded_representation.num_elements_usize();
        if offsets_and_lengths.len() == expected {
            Ok(Self {
                chunks_per_shard: chunk_shape_to_array_shape(chunks_per_shard),
                offsets_and_lengths,
            })
        } else {
            Err(CorruptShardError::UnexpectedIndexSize(offsets_and_lengths.len(), expected).into())
        }
    }

    /// Validate the index entries against the shard invariants.
    ///
    /// All non-empty entries must reference distinct, non-overlapping byte ranges.
    /// When the index leads the shard, entries must not overlap the index region.
    /// When `shard_size` is known, entries must not extend beyond the shard.
    ///
    /// # Errors
    /// Returns [`CorruptShardError`] on the first violated invariant.
    pub fn validate(
        &self,
        index_size: u64,
        shard_size: Option<u64>,
        index_location: ShardingIndexLocation,
    ) -> Result<(), CorruptShardError> {
        let payload_end = shard_size.map(|shard_size| match index_location {
            ShardingIndexLocation::Start => shard_size,
            ShardingIndexLocation::End => shard_size.saturating_sub(index_size),
        });

        let sorted_entries = self
            .offsets_and_lengths
            .iter()
            .tuples()
            .filter(|(&offset, _)| offset != MAX_UINT_64)
            .map(|(&offset, &length)| (offset, length))
            .sorted_unstable()
            .collect::<Vec<_>>();

        for (&(offset, length), &(offset_next, _)) in sorted_entries.iter().tuple_windows() {
            if offset == offset_next {
                return Err(CorruptShardError::DuplicateOffset(offset));
            }
            if offset + length > offset_next {
                return Err(CorruptShardError::OverlappingEntries(offset, offset_next));
            }
        }

        for &(offset, length) in &sorted_entries {
            if index_location == ShardingIndexLocation::Start && offset < index_size {
                return Err(CorruptShardError::EntryOverlapsIndex(offset, length));
            }
            if let Some(payload_end) = payload_end {
                if offset + length > payload_end {
                    return Err(CorruptShardError::EntryOutOfBounds(offset, length));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::array::{
        codec::{BytesCodec, Crc32cCodec},
        ChunkShape,
    };

    use super::*;

    fn chunks_per_shard() -> ChunkShape {
        vec![2u64, 2].try_into().unwrap()
    }

    fn index_codecs() -> CodecChain {
        CodecChain::new(
            Arc::new(BytesCodec::little()),
            vec![Arc::new(Crc32cCodec::new())],
        )
    }

    #[test]
    fn shard_index_get_set() {
        let mut index = ShardIndex::create_empty(&chunks_per_shard());
        assert!(index.is_all_empty());
        assert_eq!(index.get(&[0, 0]), None);

        index.set(&[0, 1], Some((0, 10)));
        assert!(!index.is_all_empty());
        assert_eq!(index.get(&[0, 1]), Some((0, 10)));

        index.set(&[0, 1], None);
        assert!(index.is_all_empty());
    }

    #[test]
    fn shard_index_is_dense() {
        let mut index = ShardIndex::create_empty(&chunks_per_shard());
        index.set(&[0, 0], Some((0, 4)));
        index.set(&[1, 0], Some((4, 4)));
        assert!(index.is_dense(4));
        assert!(!index.is_dense(8));

        index.set(&[1, 1], Some((6, 4)));
        assert!(!index.is_dense(4));
    }

    #[test]
    fn shard_index_validate_overlap() {
        let mut index = ShardIndex::create_empty(&chunks_per_shard());
        index.set(&[0, 0], Some((0, 8)));
        index.set(&[0, 1], Some((4, 8)));
        assert!(matches!(
            index.validate(68, None, ShardingIndexLocation::End),
            Err(CorruptShardError::OverlappingEntries(0, 4))
        ));
    }

    #[test]
    fn shard_index_validate_duplicate() {
        let mut index = ShardIndex::create_empty(&chunks_per_shard());
        index.set(&[0, 0], Some((0, 0)));
        index.set(&[0, 1], Some((0, 4)));
        assert!(matches!(
            index.validate(68, None, ShardingIndexLocation::End),
            Err(CorruptShardError::DuplicateOffset(0))
        ));
    }

    #[test]
    fn shard_index_validate_bounds() {
        let mut index = ShardIndex::create_empty(&chunks_per_shard());
        index.set(&[0, 0], Some((0, 8)));
        assert!(index
            .validate(68, Some(8 + 68), ShardingIndexLocation::End)
            .is_ok());
        assert!(matches!(
            index.validate(68, Some(4 + 68), ShardingIndexLocation::End),
            Err(CorruptShardError::EntryOutOfBounds(0, 8))
        ));
    }

    #[test]
    fn shard_index_validate_index_overlap() {
        let mut index = ShardIndex::create_empty(&chunks_per_shard());
        index.set(&[0, 0], Some((0, 8)));
        assert!(matches!(
            index.validate(68, None, ShardingIndexLocation::Start),
            Err(CorruptShardError::EntryOverlapsIndex(0, 8))
        ));

        index.set(&[0, 0], Some((68, 8)));
        assert!(index.validate(68, None, ShardingIndexLocation::Start).is_ok());
    }

    #[tokio::test]
    async fn shard_index_encode_decode_round_trip() {
        let mut index = ShardIndex::create_empty(&chunks_per_shard());
        index.set(&[0, 0], Some((0, 4)));
        index.set(&[1, 1], Some((4, 12)));

        let index_codecs = index_codecs();
        let encoded = index
            .encode(&index_codecs, &CodecOptions::default())
            .await
            .unwrap();
        // 4 entries of 16 bytes and a 4 byte checksum
        assert_eq!(encoded.len(), 4 * 16 + 4);

        let decoded = ShardIndex::decode(
            encoded,
            &chunks_per_shard(),
            &index_codecs,
            &CodecOptions::default(),
        )
        .await
        .unwrap();
        assert_eq!(index, decoded);
    }
}
