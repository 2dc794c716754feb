//! The array data model consumed by the codecs.
//!
//! A chunk of data is described by a [`ChunkRepresentation`]: a non-zero shape, a fixed-size
//! [`DataType`], and a [`FillValue`] marking uninitialised elements.
//! Chunk contents are passed around as flat byte buffers in row-major (C) order; this module
//! provides the index arithmetic and transmute helpers for working with them.

pub mod chunk_shape;
pub mod codec;
pub mod concurrency;
pub mod data_type;
mod fill_value;
mod representation;
mod unsafe_cell_slice;

pub use chunk_shape::{chunk_shape_to_array_shape, ChunkShape};
pub use data_type::DataType;
pub use fill_value::FillValue;
pub use representation::{BytesRepresentation, ChunkRepresentation, IncompatibleFillValueError};

pub(crate) use unsafe_cell_slice::UnsafeCellSlice;

use thiserror::Error;

/// The shape of an array.
pub type ArrayShape = Vec<u64>;

/// The indices of an array element or chunk.
pub type ArrayIndices = Vec<u64>;

/// A dimension was zero where a non-zero dimension is required.
#[derive(Copy, Clone, Debug, Error)]
#[error("value must be non-zero")]
pub struct NonZeroError;

/// Transmute from `Vec<T>` to `Vec<u8>`.
#[must_use]
pub fn transmute_to_bytes_vec<T: bytemuck::NoUninit>(from: Vec<T>) -> Vec<u8> {
    bytemuck::allocation::try_cast_vec(from)
        .unwrap_or_else(|(_err, from)| bytemuck::must_cast_slice(&from).to_vec())
}

/// Transmute from `&[T]` to `&[u8]`.
#[must_use]
pub fn transmute_to_bytes<T: bytemuck::NoUninit>(from: &[T]) -> &[u8] {
    bytemuck::must_cast_slice(from)
}

/// Unravel a linearised index to ND indices.
#[must_use]
pub fn unravel_index(mut index: u64, shape: &[u64]) -> ArrayIndices {
    let mut indices = vec![0; shape.len()];
    for (indices_i, &dim) in std::iter::zip(indices.iter_mut().rev(), shape.iter().rev()) {
        *indices_i = index % dim;
        index /= dim;
    }
    indices
}

/// Ravel ND indices to a linearised index.
#[must_use]
pub fn ravel_indices(indices: &[u64], shape: &[u64]) -> u64 {
    let mut index: u64 = 0;
    let mut count = 1;
    for (i, s) in std::iter::zip(indices, shape).rev() {
        index += i * count;
        count *= s;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ravel_unravel() {
        let shape = [4, 3, 2];
        assert_eq!(ravel_indices(&[0, 0, 0], &shape), 0);
        assert_eq!(ravel_indices(&[1, 0, 0], &shape), 6);
        assert_eq!(ravel_indices(&[1, 2, 1], &shape), 11);
        for index in 0..24 {
            assert_eq!(ravel_indices(&unravel_index(index, &shape), &shape), index);
        }
    }

    #[test]
    fn transmute_u16() {
        let elements: Vec<u16> = vec![1, 2];
        let bytes = transmute_to_bytes_vec(elements);
        assert_eq!(bytes.len(), 4);
    }
}
