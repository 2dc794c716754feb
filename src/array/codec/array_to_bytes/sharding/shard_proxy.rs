use std::collections::{HashMap, HashSet};
use std::num::NonZeroU64;

use crate::array::{
    codec::{CodecChain, CodecError, CodecOptions},
    ArrayIndices,
};

use super::{
    compute_index_encoded_size, morton_order_iter, sharding_index_decoded_representation,
    CorruptShardError, ShardIndex, ShardingIndexLocation,
};

/// An immutable view over the bytes of a shard with a parsed [`ShardIndex`].
///
/// Inner chunk lookups borrow slices from the shard buffer.
pub(crate) struct ShardProxy {
    buf: Vec<u8>,
    index: ShardIndex,
}

impl ShardProxy {
    /// Parse a shard from `buf`, reading the index from the head or tail per `index_location`.
    ///
    /// The decoded index is validated; entries must reference distinct, non-overlapping, in
    /// bounds byte ranges.
    pub(crate) async fn from_bytes(
        buf: Vec<u8>,
        chunks_per_shard: &[NonZeroU64],
        index_codecs: &CodecChain,
        index_location: ShardingIndexLocation,
        options: &CodecOptions,
    ) -> Result<Self, CodecError> {
        let index_decoded_representation = sharding_index_decoded_representation(chunks_per_shard);
        let index_encoded_size =
            usize::try_from(compute_index_encoded_size(index_codecs, &index_decoded_representation)?)
                .unwrap();
        if buf.len() < index_encoded_size {
            return Err(CorruptShardError::Truncated.into());
        }

        let encoded_index = match index_location {
            ShardingIndexLocation::Start => buf[..index_encoded_size].to_vec(),
            ShardingIndexLocation::End => buf[buf.len() - index_encoded_size..].to_vec(),
        };
        let index =
            ShardIndex::decode(encoded_index, chunks_per_shard, index_codecs, options).await?;
        index.validate(
            index_encoded_size as u64,
            Some(buf.len() as u64),
            index_location,
        )?;

        Ok(Self { buf, index })
    }

    /// Create an empty proxy: no bytes and an all-empty index.
    pub(crate) fn create_empty(chunks_per_shard: &[NonZeroU64]) -> Self {
        Self {
            buf: Vec::new(),
            index: ShardIndex::create_empty(chunks_per_shard),
        }
    }

    /// Return the encoded bytes of the inner chunk at `chunk_indices`, or [`None`] if it is
    /// empty.
    pub(crate) fn get(&self, chunk_indices: &[u64]) -> Option<&[u8]> {
        let (start, end) = self.index.get(chunk_indices)?;
        Some(&self.buf[usize::try_from(start).unwrap()..usize::try_from(end).unwrap()])
    }

    /// Return the shard index.
    pub(crate) fn index(&self) -> &ShardIndex {
        &self.index
    }
}

/// An in-progress shard: a growable payload buffer and a mutable [`ShardIndex`].
pub(crate) struct ShardBuilder {
    buf: Vec<u8>,
    index: ShardIndex,
}

impl ShardBuilder {
    /// Create an empty builder.
    pub(crate) fn create_empty(chunks_per_shard: &[NonZeroU64]) -> Self {
        Self {
            buf: Vec::new(),
            index: ShardIndex::create_empty(chunks_per_shard),
        }
    }

    /// Append the encoded bytes of the inner chunk at `chunk_indices` to the payload.
    pub(crate) fn append(&mut self, chunk_indices: &[u64], value: &[u8]) {
        self.index.set(
            chunk_indices,
            Some((self.buf.len() as u64, value.len() as u64)),
        );
        self.buf.extend_from_slice(value);
    }

    /// Build a shard by laying out the surviving inner chunks in Morton order.
    ///
    /// For each inner chunk coordinate in Morton order of the sub-chunk grid: tombstoned chunks
    /// are skipped, then `new_entries` takes precedence over the `old` shard.
    /// The resulting payload layout is independent of the write history, reclaims the space of
    /// overwritten chunks, and keeps spatially close chunks close on disk.
    pub(crate) fn merge_with_morton_order(
        chunks_per_shard: &[NonZeroU64],
        tombstones: &HashSet<ArrayIndices>,
        new_entries: &HashMap<ArrayIndices, Vec<u8>>,
        old: &ShardProxy,
    ) -> Self {
        let mut builder = Self::create_empty(chunks_per_shard);
        let chunks_per_shard_u64 = crate::array::chunk_shape_to_array_shape(chunks_per_shard);
        for chunk_indices in morton_order_iter(&chunks_per_shard_u64) {
            if tombstones.contains(&chunk_indices) {
                continue;
            }
            if let Some(value) = new_entries.get(&chunk_indices) {
                builder.append(&chunk_indices, value);
            } else if let Some(value) = old.get(&chunk_indices) {
                builder.append(&chunk_indices, value);
            }
        }
        builder
    }

    /// Return the shard index.
    pub(crate) fn index(&self) -> &ShardIndex {
        &self.index
    }

    /// Finalize the shard: encode the index and emit the shard bytes with the index at
    /// `index_location`.
    ///
    /// When the index leads the shard, the index is encoded once to learn its size, the offsets
    /// are made absolute, and the index is encoded again.
    /// The index codec pipeline is fixed-size on fixed-size input, so both passes have the same
    /// length.
    pub(crate) async fn finalize(
        mut self,
        index_location: ShardingIndexLocation,
        index_codecs: &CodecChain,
        options: &CodecOptions,
    ) -> Result<Vec<u8>, CodecError> {
        let index_bytes = self.index.encode(index_codecs, options).await?;
        match index_location {
            ShardingIndexLocation::Start => {
                self.index.inflate_offsets(index_bytes.len() as u64);
                let index_bytes = self.index.encode(index_codecs, options).await?;
                let mut out = index_bytes;
                out.extend_from_slice(&self.buf);
                Ok(out)
            }
            ShardingIndexLocation::End => {
                let mut out = self.buf;
                out.extend_from_slice(&index_bytes);
                Ok(out)
            }
        }
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

    #[tokio::test]
    async fn shard_builder_finalize_end() {
        let mut builder = ShardBuilder::create_empty(&chunks_per_shard());
        builder.append(&[0, 0], &[1, 2, 3]);
        builder.append(&[1, 1], &[4, 5]);
        assert_eq!(builder.index().get(&[0, 0]), Some((0, 3)));
        assert_eq!(builder.index().get(&[1, 1]), Some((3, 5)));

        let shard = builder
            .finalize(
                ShardingIndexLocation::End,
                &index_codecs(),
                &CodecOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(shard.len(), 5 + 4 * 16 + 4);
        assert_eq!(&shard[..5], &[1, 2, 3, 4, 5]);

        let proxy = ShardProxy::from_bytes(
            shard,
            &chunks_per_shard(),
            &index_codecs(),
            ShardingIndexLocation::End,
            &CodecOptions::default(),
        )
        .await
        .unwrap();
        assert_eq!(proxy.get(&[0, 0]), Some([1, 2, 3].as_slice()));
        assert_eq!(proxy.get(&[0, 1]), None);
        assert_eq!(proxy.get(&[1, 1]), Some([4, 5].as_slice()));
    }

    #[tokio::test]
    async fn shard_builder_finalize_start() {
        let mut builder = ShardBuilder::create_empty(&chunks_per_shard());
        builder.append(&[0, 0], &[1, 2, 3]);

        let shard = builder
            .finalize(
                ShardingIndexLocation::Start,
                &index_codecs(),
                &CodecOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(shard.len(), 4 * 16 + 4 + 3);

        let proxy = ShardProxy::from_bytes(
            shard,
            &chunks_per_shard(),
            &index_codecs(),
            ShardingIndexLocation::Start,
            &CodecOptions::default(),
        )
        .await
        .unwrap();
        assert_eq!(proxy.index().get(&[0, 0]), Some((68, 71)));
        assert_eq!(proxy.get(&[0, 0]), Some([1, 2, 3].as_slice()));
    }

    #[tokio::test]
    async fn shard_builder_morton_merge() {
        let mut old_builder = ShardBuilder::create_empty(&chunks_per_shard());
        old_builder.append(&[0, 0], &[1]);
        old_builder.append(&[0, 1], &[2]);
        old_builder.append(&[1, 0], &[3]);
        let old_bytes = old_builder
            .finalize(
                ShardingIndexLocation::End,
                &index_codecs(),
                &CodecOptions::default(),
            )
            .await
            .unwrap();
        let old = ShardProxy::from_bytes(
            old_bytes,
            &chunks_per_shard(),
            &index_codecs(),
            ShardingIndexLocation::End,
            &CodecOptions::default(),
        )
        .await
        .unwrap();

        let tombstones = HashSet::from([vec![0, 1]]);
        let new_entries = HashMap::from([(vec![1, 1], vec![4, 4])]);
        let merged = ShardBuilder::merge_with_morton_order(
            &chunks_per_shard(),
            &tombstones,
            &new_entries,
            &old,
        );

        // Morton order of a 2x2 grid: (0,0), (1,0), (0,1), (1,1); (0,1) is tombstoned
        assert_eq!(merged.index().get(&[0, 0]), Some((0, 1)));
        assert_eq!(merged.index().get(&[0, 1]), None);
        assert_eq!(merged.index().get(&[1, 0]), Some((1, 2)));
        assert_eq!(merged.index().get(&[1, 1]), Some((2, 4)));
        assert_eq!(&merged.buf, &[1, 3, 4, 4]);
    }
}
