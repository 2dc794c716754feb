//! End-to-end tests of the sharding codec against an in-memory store.

use std::sync::Arc;

use shardpack::{
    array::{
        codec::{
            ArrayToBytesCodecTraits, BytesCodec, CodecChain, CodecOptions, Crc32cCodec,
            ShardIndex, ShardingCodec, ShardingCodecBuilder, ShardingIndexLocation,
        },
        ChunkRepresentation, ChunkShape, DataType, FillValue,
    },
    array_subset::ArraySubset,
    storage::{store::MemoryStore, AsyncReadableStorageTraits, AsyncWritableStorageTraits, StoreKey},
};

fn shard_representation(shard_shape: Vec<u64>) -> ChunkRepresentation {
    ChunkRepresentation::new(
        ChunkShape::try_from(shard_shape).unwrap().into(),
        DataType::UInt8,
        FillValue::from(0u8),
    )
    .unwrap()
}

fn sharding_codec(index_location: ShardingIndexLocation) -> ShardingCodec {
    ShardingCodecBuilder::new(vec![2u64, 2].try_into().unwrap())
        .index_location(index_location)
        .build()
        .unwrap()
}

fn index_codecs() -> CodecChain {
    CodecChain::new(
        Arc::new(BytesCodec::little()),
        vec![Arc::new(Crc32cCodec::new())],
    )
}

fn store_and_key() -> (Arc<MemoryStore>, StoreKey) {
    let store = Arc::new(MemoryStore::new());
    let key = StoreKey::new("array/c/0/0").unwrap();
    (store, key)
}

/// The default index codec pipeline encodes 16 bytes per inner chunk plus a 4 byte checksum.
fn index_encoded_size(num_chunks: usize) -> usize {
    num_chunks * 16 + 4
}

async fn load_index(
    store: &MemoryStore,
    key: &StoreKey,
    chunks_per_shard: &ChunkShape,
    index_location: ShardingIndexLocation,
) -> ShardIndex {
    let shard = store.get(key).await.unwrap().unwrap();
    let num_chunks = usize::try_from(chunks_per_shard.num_elements()).unwrap();
    let index_size = index_encoded_size(num_chunks);
    let encoded_index = match index_location {
        ShardingIndexLocation::Start => shard[..index_size].to_vec(),
        ShardingIndexLocation::End => shard[shard.len() - index_size..].to_vec(),
    };
    ShardIndex::decode(
        encoded_index,
        chunks_per_shard,
        &index_codecs(),
        &CodecOptions::default(),
    )
    .await
    .unwrap()
}

/// Writing one aligned inner chunk into an absent shard stores exactly one non-empty entry.
#[tokio::test]
async fn partial_encode_single_inner_chunk() {
    let shard_representation = shard_representation(vec![4, 4]);
    let codec = sharding_codec(ShardingIndexLocation::End);
    let (store, key) = store_and_key();

    let encoder = codec
        .partial_encoder(store.clone(), key.clone(), &shard_representation)
        .unwrap();
    encoder
        .partial_encode(
            &ArraySubset::new_with_ranges(&[0..2, 0..2]),
            vec![1; 4],
            &CodecOptions::default(),
        )
        .await
        .unwrap();

    let chunks_per_shard: ChunkShape = vec![2u64, 2].try_into().unwrap();
    let index = load_index(&store, &key, &chunks_per_shard, ShardingIndexLocation::End).await;
    assert_eq!(index.get(&[0, 0]), Some((0, 4)));
    assert_eq!(index.get(&[0, 1]), None);
    assert_eq!(index.get(&[1, 0]), None);
    assert_eq!(index.get(&[1, 1]), None);

    // Read back the written chunk and an untouched chunk
    let decoder = codec
        .partial_decoder(store.clone(), key, &shard_representation)
        .unwrap();
    let decoded = decoder
        .partial_decode(
            &[
                ArraySubset::new_with_ranges(&[0..2, 0..2]),
                ArraySubset::new_with_ranges(&[2..4, 2..4]),
            ],
            &CodecOptions::default(),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(decoded[0], vec![1; 4]);
    assert_eq!(decoded[1], vec![0; 4]);
}

/// After a partial write, the non-empty entries sorted by offset are in Morton order of their
/// coordinates, and overwritten chunks are reclaimed.
#[tokio::test]
async fn partial_encode_morton_layout() {
    let shard_representation = shard_representation(vec![8, 8]);
    let codec = sharding_codec(ShardingIndexLocation::End);
    let (store, key) = store_and_key();

    let encoder = codec
        .partial_encoder(store.clone(), key.clone(), &shard_representation)
        .unwrap();

    // Populate inner chunks (0,0), (0,1), (1,0) and (1,1)
    encoder
        .partial_encode(
            &ArraySubset::new_with_ranges(&[0..4, 0..4]),
            vec![1; 16],
            &CodecOptions::default(),
        )
        .await
        .unwrap();

    // Overwrite inner chunk (0,1) with the fill value
    encoder
        .partial_encode(
            &ArraySubset::new_with_ranges(&[0..2, 2..4]),
            vec![0; 4],
            &CodecOptions::default(),
        )
        .await
        .unwrap();

    let chunks_per_shard: ChunkShape = vec![4u64, 4].try_into().unwrap();
    let index = load_index(&store, &key, &chunks_per_shard, ShardingIndexLocation::End).await;

    assert_eq!(index.get(&[0, 1]), None);
    let entry_0_0 = index.get(&[0, 0]).unwrap();
    let entry_1_0 = index.get(&[1, 0]).unwrap();
    let entry_1_1 = index.get(&[1, 1]).unwrap();

    // Morton order of the surviving coordinates: (0,0), (1,0), (1,1)
    assert_eq!(entry_0_0.0, 0);
    assert!(entry_0_0.1 <= entry_1_0.0);
    assert!(entry_1_0.1 <= entry_1_1.0);

    // The shard holds exactly the three surviving chunks and the index
    let shard = store.get(&key).await.unwrap().unwrap();
    assert_eq!(shard.len(), 3 * 4 + index_encoded_size(16));
}

/// Applying the same partial write twice yields byte-identical store objects.
#[tokio::test]
async fn partial_encode_idempotent() {
    let shard_representation = shard_representation(vec![4, 4]);
    let codec = sharding_codec(ShardingIndexLocation::End);
    let (store, key) = store_and_key();

    let encoder = codec
        .partial_encoder(store.clone(), key.clone(), &shard_representation)
        .unwrap();
    let subset = ArraySubset::new_with_ranges(&[1..3, 1..3]);
    let values = vec![7u8, 8, 9, 10];

    encoder
        .partial_encode(&subset, values.clone(), &CodecOptions::default())
        .await
        .unwrap();
    let first = store.get(&key).await.unwrap().unwrap();

    encoder
        .partial_encode(&subset, values, &CodecOptions::default())
        .await
        .unwrap();
    let second = store.get(&key).await.unwrap().unwrap();

    assert_eq!(first, second);
}

/// A partial write of an unaligned subset merges with the existing inner chunks.
#[tokio::test]
async fn partial_encode_read_modify_write() {
    let shard_representation = shard_representation(vec![4, 4]);
    let codec = sharding_codec(ShardingIndexLocation::End);
    let (store, key) = store_and_key();

    // Start from a full shard of ones
    let full_shard = vec![1u8; 16];
    let encoded = codec
        .encode(
            full_shard,
            &shard_representation,
            &CodecOptions::default(),
        )
        .await
        .unwrap()
        .unwrap();
    store.set(&key, encoded.into()).await.unwrap();

    // Overwrite the centre 2x2 region, straddling all four inner chunks
    let encoder = codec
        .partial_encoder(store.clone(), key.clone(), &shard_representation)
        .unwrap();
    encoder
        .partial_encode(
            &ArraySubset::new_with_ranges(&[1..3, 1..3]),
            vec![9; 4],
            &CodecOptions::default(),
        )
        .await
        .unwrap();

    // The whole shard decodes to ones with a 9 in the centre
    let decoder = codec
        .partial_decoder(store.clone(), key, &shard_representation)
        .unwrap();
    let decoded = decoder
        .partial_decode(
            &[ArraySubset::new_with_ranges(&[0..4, 0..4])],
            &CodecOptions::default(),
        )
        .await
        .unwrap()
        .unwrap()
        .remove(0);
    #[rustfmt::skip]
    assert_eq!(decoded, vec![
        1, 1, 1, 1,
        1, 9, 9, 1,
        1, 9, 9, 1,
        1, 1, 1, 1,
    ]);
}

/// Writing the fill value everywhere deletes the shard object.
#[tokio::test]
async fn partial_encode_deletes_empty_shard() {
    let shard_representation = shard_representation(vec![4, 4]);
    let codec = sharding_codec(ShardingIndexLocation::End);
    let (store, key) = store_and_key();

    let encoder = codec
        .partial_encoder(store.clone(), key.clone(), &shard_representation)
        .unwrap();
    encoder
        .partial_encode(
            &ArraySubset::new_with_ranges(&[0..4, 0..4]),
            vec![5; 16],
            &CodecOptions::default(),
        )
        .await
        .unwrap();
    assert!(store.exists(&key).await.unwrap());

    encoder
        .partial_encode(
            &ArraySubset::new_with_ranges(&[0..4, 0..4]),
            vec![0; 16],
            &CodecOptions::default(),
        )
        .await
        .unwrap();
    assert!(!store.exists(&key).await.unwrap());
}

/// A missing shard reads as `None`; the caller renders the fill value.
#[tokio::test]
async fn partial_decode_missing_shard() {
    let shard_representation = shard_representation(vec![4, 4]);
    let codec = sharding_codec(ShardingIndexLocation::End);
    let (store, key) = store_and_key();

    let decoder = codec
        .partial_decoder(store.clone(), key, &shard_representation)
        .unwrap();
    let decoded = decoder
        .partial_decode(
            &[ArraySubset::new_with_ranges(&[1..3, 0..1])],
            &CodecOptions::default(),
        )
        .await
        .unwrap();
    assert!(decoded.is_none());
}

/// Partial reads of an encoded shard match the corresponding subsets of the source array.
#[tokio::test]
async fn partial_decode_round_trip() {
    for index_location in [ShardingIndexLocation::Start, ShardingIndexLocation::End] {
        let shard_representation = shard_representation(vec![4, 4]);
        let codec = sharding_codec(index_location);
        let (store, key) = store_and_key();

        let elements: Vec<u8> = (0..16).collect();
        let encoded = codec
            .encode(
                elements.clone(),
                &shard_representation,
                &CodecOptions::default(),
            )
            .await
            .unwrap()
            .unwrap();
        store.set(&key, encoded.into()).await.unwrap();

        let decoder = codec
            .partial_decoder(store.clone(), key, &shard_representation)
            .unwrap();

        // An unaligned column straddling two inner chunks
        let decoded = decoder
            .partial_decode(
                &[ArraySubset::new_with_ranges(&[1..3, 0..1])],
                &CodecOptions::default(),
            )
            .await
            .unwrap()
            .unwrap()
            .remove(0);
        assert_eq!(decoded, vec![4, 8]);

        // The entire shard (total request reads the full object)
        let decoded = decoder
            .partial_decode(
                &[ArraySubset::new_with_ranges(&[0..4, 0..4])],
                &CodecOptions::default(),
            )
            .await
            .unwrap()
            .unwrap()
            .remove(0);
        assert_eq!(decoded, elements);
    }
}

/// With the index at the start, the head of the object parses as a valid index and all offsets
/// land after it.
#[tokio::test]
async fn partial_encode_index_at_start() {
    let shard_representation = shard_representation(vec![4, 4]);
    let codec = sharding_codec(ShardingIndexLocation::Start);
    let (store, key) = store_and_key();

    let encoder = codec
        .partial_encoder(store.clone(), key.clone(), &shard_representation)
        .unwrap();
    encoder
        .partial_encode(
            &ArraySubset::new_with_ranges(&[0..2, 0..2]),
            vec![1; 4],
            &CodecOptions::default(),
        )
        .await
        .unwrap();

    let chunks_per_shard: ChunkShape = vec![2u64, 2].try_into().unwrap();
    let index = load_index(&store, &key, &chunks_per_shard, ShardingIndexLocation::Start).await;
    let index_size = index_encoded_size(4) as u64;
    let (start, end) = index.get(&[0, 0]).unwrap();
    assert!(start >= index_size);
    assert_eq!(end - start, 4);

    let decoder = codec
        .partial_decoder(store.clone(), key, &shard_representation)
        .unwrap();
    let decoded = decoder
        .partial_decode(
            &[ArraySubset::new_with_ranges(&[0..2, 0..2])],
            &CodecOptions::default(),
        )
        .await
        .unwrap()
        .unwrap()
        .remove(0);
    assert_eq!(decoded, vec![1; 4]);
}

/// Erasing through the partial encoder removes the shard object.
#[tokio::test]
async fn partial_encoder_erase() {
    let shard_representation = shard_representation(vec![4, 4]);
    let codec = sharding_codec(ShardingIndexLocation::End);
    let (store, key) = store_and_key();

    let encoder = codec
        .partial_encoder(store.clone(), key.clone(), &shard_representation)
        .unwrap();
    encoder
        .partial_encode(
            &ArraySubset::new_with_ranges(&[0..2, 0..2]),
            vec![1; 4],
            &CodecOptions::default(),
        )
        .await
        .unwrap();
    assert!(store.exists(&key).await.unwrap());

    encoder.erase().await.unwrap();
    assert!(!store.exists(&key).await.unwrap());
}
