//! An asynchronous in-memory store.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::BytesMut;

use crate::byte_range::{ByteRange, InvalidByteRangeError};
use crate::storage::{
    AsyncReadableStorageTraits, AsyncWritableStorageTraits, Bytes, MaybeBytes, StorageError,
    StoreKey,
};

/// An asynchronous in-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data_map: Mutex<BTreeMap<StoreKey, BytesMut>>,
}

impl MemoryStore {
    /// Create a new memory store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data_map: Mutex::default(),
        }
    }
}

#[async_trait]
impl AsyncReadableStorageTraits for MemoryStore {
    async fn get(&self, key: &StoreKey) -> Result<MaybeBytes, StorageError> {
        let data_map = self.data_map.lock().unwrap();
        Ok(data_map.get(key).map(|data| data.clone().freeze()))
    }

    async fn get_partial_values_key(
        &self,
        key: &StoreKey,
        byte_ranges: &[ByteRange],
    ) -> Result<Option<Vec<Bytes>>, StorageError> {
        let data_map = self.data_map.lock().unwrap();
        let Some(data) = data_map.get(key) else {
            return Ok(None);
        };
        let data = data.clone().freeze();
        let mut out = Vec::with_capacity(byte_ranges.len());
        let size = data.len() as u64;
        for byte_range in byte_ranges {
            let valid = match byte_range {
                ByteRange::FromStart(offset, length) => {
                    *offset <= size && offset + length.unwrap_or(0) <= size
                }
                ByteRange::Suffix(length) => *length <= size,
            };
            if !valid {
                return Err(InvalidByteRangeError::new(*byte_range, size).into());
            }
            out.push(data.slice(byte_range.to_range_usize(size)));
        }
        Ok(Some(out))
    }

    async fn size_key(&self, key: &StoreKey) -> Result<Option<u64>, StorageError> {
        let data_map = self.data_map.lock().unwrap();
        Ok(data_map.get(key).map(|entry| entry.len() as u64))
    }
}

#[async_trait]
impl AsyncWritableStorageTraits for MemoryStore {
    async fn set(&self, key: &StoreKey, value: Bytes) -> Result<(), StorageError> {
        let mut data_map = self.data_map.lock().unwrap();
        data_map.insert(key.clone(), BytesMut::from(value.as_ref()));
        Ok(())
    }

    async fn erase(&self, key: &StoreKey) -> Result<(), StorageError> {
        let mut data_map = self.data_map.lock().unwrap();
        data_map.remove(key);
        Ok(())
    }
}
