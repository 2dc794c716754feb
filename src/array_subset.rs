//! Array subsets.
//!
//! An [`ArraySubset`] is a rectangular region of an array: a start coordinate and a shape.
//! It produces iterators over element indices, contiguous element runs, and overlapping chunks,
//! which drive all byte extraction and scattering in the codecs.

mod iterators;

pub use iterators::{
    ChunksIterator, ContiguousIndicesIterator, ContiguousLinearisedIndicesIterator,
    IndicesIterator,
};

use std::num::NonZeroU64;

use derive_more::Display;
use itertools::izip;
use thiserror::Error;

use crate::array::{ArrayIndices, ArrayShape};

/// An array subset.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Display, Default)]
#[display("start {start:?} shape {shape:?}")]
pub struct ArraySubset {
    /// The start of the array subset.
    start: ArrayIndices,
    /// The shape of the array subset.
    shape: ArrayShape,
}

impl ArraySubset {
    /// Create a new array subset with `shape` starting at the origin.
    #[must_use]
    pub fn new_with_shape(shape: ArrayShape) -> Self {
        Self {
            start: vec![0; shape.len()],
            shape,
        }
    }

    /// Create a new array subset.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the length of `start` and `shape` do not
    /// match.
    pub fn new_with_start_shape(
        start: ArrayIndices,
        shape: ArrayShape,
    ) -> Result<Self, IncompatibleDimensionalityError> {
        if start.len() == shape.len() {
            Ok(Self { start, shape })
        } else {
            Err(IncompatibleDimensionalityError::new(
                start.len(),
                shape.len(),
            ))
        }
    }

    /// Create a new array subset.
    ///
    /// # Safety
    /// The length of `start` and `shape` must match.
    #[doc(hidden)]
    #[must_use]
    pub unsafe fn new_with_start_shape_unchecked(start: ArrayIndices, shape: ArrayShape) -> Self {
        debug_assert_eq!(start.len(), shape.len());
        Self { start, shape }
    }

    /// Create a new array subset from a list of ranges.
    #[must_use]
    pub fn new_with_ranges(ranges: &[std::ops::Range<u64>]) -> Self {
        Self {
            start: ranges.iter().map(|range| range.start).collect(),
            shape: ranges
                .iter()
                .map(|range| range.end.saturating_sub(range.start))
                .collect(),
        }
    }

    /// Return the start of the array subset.
    #[must_use]
    pub fn start(&self) -> &[u64] {
        &self.start
    }

    /// Return the shape of the array subset.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// Return the dimensionality of the array subset.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.start.len()
    }

    /// Return the end (exclusive) of the array subset.
    #[must_use]
    pub fn end_exc(&self) -> ArrayIndices {
        std::iter::zip(&self.start, &self.shape)
            .map(|(start, size)| start + size)
            .collect()
    }

    /// Return the number of elements of the array subset.
    ///
    /// Equal to the product of the components of its shape.
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        self.shape.iter().product()
    }

    /// Return the number of elements of the array subset as a `usize`.
    ///
    /// # Panics
    /// Panics if [`num_elements()`](Self::num_elements) is greater than [`usize::MAX`].
    #[must_use]
    pub fn num_elements_usize(&self) -> usize {
        usize::try_from(self.num_elements()).unwrap()
    }

    /// Return true if the subset is within the bounds of `array_shape`.
    #[must_use]
    pub fn inbounds(&self, array_shape: &[u64]) -> bool {
        self.dimensionality() == array_shape.len()
            && std::iter::zip(self.end_exc(), array_shape).all(|(end, shape)| end <= *shape)
    }

    /// Return the overlapping subset (absolute coordinates) between this subset and
    /// `subset_other`.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the dimensionality of `subset_other` does
    /// not match.
    pub fn overlap(
        &self,
        subset_other: &ArraySubset,
    ) -> Result<ArraySubset, IncompatibleDimensionalityError> {
        if subset_other.dimensionality() != self.dimensionality() {
            return Err(IncompatibleDimensionalityError::new(
                subset_other.dimensionality(),
                self.dimensionality(),
            ));
        }
        let mut starts = Vec::with_capacity(self.dimensionality());
        let mut shapes = Vec::with_capacity(self.dimensionality());
        for (start, size, other_start, other_size) in izip!(
            &self.start,
            &self.shape,
            subset_other.start(),
            subset_other.shape(),
        ) {
            let overlap_start = std::cmp::max(*start, *other_start);
            let overlap_end = std::cmp::min(start + size, other_start + other_size);
            starts.push(overlap_start);
            shapes.push(overlap_end.saturating_sub(overlap_start));
        }
        Ok(Self {
            start: starts,
            shape: shapes,
        })
    }

    /// Return this subset relative to `start`.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the length of `start` does not match the
    /// dimensionality.
    pub fn relative_to(&self, start: &[u64]) -> Result<ArraySubset, IncompatibleDimensionalityError> {
        if start.len() != self.dimensionality() {
            return Err(IncompatibleDimensionalityError::new(
                start.len(),
                self.dimensionality(),
            ));
        }
        Ok(Self {
            start: std::iter::zip(&self.start, start)
                .map(|(subset_start, start)| subset_start - start)
                .collect(),
            shape: self.shape.clone(),
        })
    }

    /// Return the bytes in this array subset from an array with shape `array_shape`.
    ///
    /// # Errors
    /// Returns [`IncompatibleArraySubsetAndShapeError`] if the length of `array_shape` does not
    /// match the array subset dimensionality or the array subset is outside of the bounds of
    /// `array_shape`.
    pub fn extract_bytes(
        &self,
        bytes: &[u8],
        array_shape: &[u64],
        element_size: usize,
    ) -> Result<Vec<u8>, IncompatibleArraySubsetAndShapeError> {
        if self.inbounds(array_shape)
            && bytes.len() as u64 == array_shape.iter().product::<u64>() * element_size as u64
        {
            Ok(unsafe { self.extract_bytes_unchecked(bytes, array_shape, element_size) })
        } else {
            Err(IncompatibleArraySubsetAndShapeError(
                self.clone(),
                array_shape.to_vec(),
            ))
        }
    }

    /// Return the bytes in this array subset from an array with shape `array_shape`.
    ///
    /// # Safety
    /// The length of `array_shape` must match the array subset dimensionality and the array
    /// subset must be within the bounds of `array_shape`.
    ///
    /// # Panics
    /// Panics if attempting to reference a byte beyond `usize::MAX`.
    #[doc(hidden)]
    #[must_use]
    pub unsafe fn extract_bytes_unchecked(
        &self,
        bytes: &[u8],
        array_shape: &[u64],
        element_size: usize,
    ) -> Vec<u8> {
        let element_size_u64 = element_size as u64;
        debug_assert_eq!(
            bytes.len() as u64,
            array_shape.iter().product::<u64>() * element_size_u64
        );
        let mut bytes_subset = Vec::with_capacity(self.num_elements_usize() * element_size);
        for (array_index, contiguous_elements) in
            self.iter_contiguous_linearised_indices_unchecked(array_shape)
        {
            let byte_index = usize::try_from(array_index * element_size_u64).unwrap();
            let byte_length = usize::try_from(contiguous_elements * element_size_u64).unwrap();
            debug_assert!(byte_index + byte_length <= bytes.len());
            bytes_subset.extend_from_slice(&bytes[byte_index..byte_index + byte_length]);
        }
        bytes_subset
    }

    /// Store `subset_bytes` into this array subset of an array with shape `array_shape`.
    ///
    /// # Errors
    /// Returns [`IncompatibleArraySubsetAndShapeError`] if the subset is out of bounds of
    /// `array_shape` or the byte lengths do not match the subset and array sizes.
    ///
    /// # Panics
    /// Panics if attempting to reference a byte beyond [`usize::MAX`].
    pub fn store_bytes(
        &self,
        subset_bytes: &[u8],
        bytes: &mut [u8],
        array_shape: &[u64],
        element_size: usize,
    ) -> Result<(), IncompatibleArraySubsetAndShapeError> {
        if self.inbounds(array_shape)
            && bytes.len() as u64 == array_shape.iter().product::<u64>() * element_size as u64
            && subset_bytes.len() as u64 == self.num_elements() * element_size as u64
        {
            let element_size_u64 = element_size as u64;
            let mut subset_offset = 0;
            for (array_index, contiguous_elements) in
                unsafe { self.iter_contiguous_linearised_indices_unchecked(array_shape) }
            {
                let byte_index = usize::try_from(array_index * element_size_u64).unwrap();
                let byte_length = usize::try_from(contiguous_elements * element_size_u64).unwrap();
                bytes[byte_index..byte_index + byte_length]
                    .copy_from_slice(&subset_bytes[subset_offset..subset_offset + byte_length]);
                subset_offset += byte_length;
            }
            Ok(())
        } else {
            Err(IncompatibleArraySubsetAndShapeError(
                self.clone(),
                array_shape.to_vec(),
            ))
        }
    }

    /// Returns an iterator over the indices of elements within the subset.
    #[must_use]
    pub fn iter_indices(&self) -> IndicesIterator {
        IndicesIterator::new(self.clone())
    }

    /// Returns an iterator over the indices of contiguous elements within the subset.
    ///
    /// # Errors
    /// Returns [`IncompatibleArraySubsetAndShapeError`] if `array_shape` does not encapsulate
    /// this subset.
    pub fn iter_contiguous_indices(
        &self,
        array_shape: &[u64],
    ) -> Result<ContiguousIndicesIterator, IncompatibleArraySubsetAndShapeError> {
        if self.inbounds(array_shape) {
            Ok(unsafe { self.iter_contiguous_indices_unchecked(array_shape) })
        } else {
            Err(IncompatibleArraySubsetAndShapeError(
                self.clone(),
                array_shape.to_vec(),
            ))
        }
    }

    /// Returns an iterator over the indices of contiguous elements within the subset.
    ///
    /// # Safety
    /// `array_shape` must encapsulate this subset.
    #[doc(hidden)]
    #[must_use]
    pub unsafe fn iter_contiguous_indices_unchecked(
        &self,
        array_shape: &[u64],
    ) -> ContiguousIndicesIterator {
        ContiguousIndicesIterator::new_unchecked(self, array_shape)
    }

    /// Returns an iterator over the linearised indices of contiguous elements within the subset.
    ///
    /// # Errors
    /// Returns [`IncompatibleArraySubsetAndShapeError`] if `array_shape` does not encapsulate
    /// this subset.
    pub fn iter_contiguous_linearised_indices<'a>(
        &self,
        array_shape: &'a [u64],
    ) -> Result<ContiguousLinearisedIndicesIterator<'a>, IncompatibleArraySubsetAndShapeError>
    {
        Ok(ContiguousLinearisedIndicesIterator::new(
            self.iter_contiguous_indices(array_shape)?,
            array_shape,
        ))
    }

    /// Returns an iterator over the linearised indices of contiguous elements within the subset.
    ///
    /// # Safety
    /// `array_shape` must encapsulate this subset.
    #[doc(hidden)]
    #[must_use]
    pub unsafe fn iter_contiguous_linearised_indices_unchecked<'a>(
        &self,
        array_shape: &'a [u64],
    ) -> ContiguousLinearisedIndicesIterator<'a> {
        ContiguousLinearisedIndicesIterator::new(
            unsafe { self.iter_contiguous_indices_unchecked(array_shape) },
            array_shape,
        )
    }

    /// Returns an iterator over chunks with shape `chunk_shape` overlapping the array subset.
    ///
    /// All chunks have the same shape and are aligned to the chunk grid, so the first and last
    /// chunks may extend beyond the subset.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if `chunk_shape` does not match the array
    /// subset dimensionality.
    pub fn iter_chunks(
        &self,
        chunk_shape: &[NonZeroU64],
    ) -> Result<ChunksIterator, IncompatibleDimensionalityError> {
        if chunk_shape.len() == self.dimensionality() {
            Ok(unsafe { self.iter_chunks_unchecked(chunk_shape) })
        } else {
            Err(IncompatibleDimensionalityError::new(
                chunk_shape.len(),
                self.dimensionality(),
            ))
        }
    }

    /// Returns an iterator over chunks with shape `chunk_shape` overlapping the array subset.
    ///
    /// # Safety
    /// The length of `chunk_shape` must match the array subset dimensionality.
    #[doc(hidden)]
    #[must_use]
    pub unsafe fn iter_chunks_unchecked(&self, chunk_shape: &[NonZeroU64]) -> ChunksIterator {
        ChunksIterator::new_unchecked(self, chunk_shape)
    }
}

/// An incompatible dimensionality error.
#[derive(Copy, Clone, Debug, Error)]
#[error("incompatible dimensionality {_0}, expected {_1}")]
pub struct IncompatibleDimensionalityError(usize, usize);

impl IncompatibleDimensionalityError {
    /// Create a new incompatible dimensionality error.
    #[must_use]
    pub const fn new(got: usize, expected: usize) -> Self {
        Self(got, expected)
    }
}

/// An incompatible array subset and array shape error.
#[derive(Clone, Debug, Error)]
#[error("array subset {_0} is incompatible with array of shape {_1:?}")]
pub struct IncompatibleArraySubsetAndShapeError(ArraySubset, ArrayShape);

impl IncompatibleArraySubsetAndShapeError {
    /// Create a new incompatible array subset and shape error.
    #[must_use]
    pub fn new(subset: ArraySubset, shape: ArrayShape) -> Self {
        Self(subset, shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_subset_basics() {
        let subset = ArraySubset::new_with_ranges(&[1..3, 2..6]);
        assert_eq!(subset.start(), &[1, 2]);
        assert_eq!(subset.shape(), &[2, 4]);
        assert_eq!(subset.end_exc(), vec![3, 6]);
        assert_eq!(subset.num_elements(), 8);
        assert!(subset.inbounds(&[4, 6]));
        assert!(!subset.inbounds(&[4, 5]));
    }

    #[test]
    fn array_subset_overlap() {
        let subset = ArraySubset::new_with_ranges(&[0..4, 0..4]);
        let chunk = ArraySubset::new_with_ranges(&[2..4, 2..4]);
        assert_eq!(
            subset.overlap(&chunk).unwrap(),
            ArraySubset::new_with_ranges(&[2..4, 2..4])
        );
        let chunk = ArraySubset::new_with_ranges(&[2..6, 2..6]);
        assert_eq!(
            subset.overlap(&chunk).unwrap(),
            ArraySubset::new_with_ranges(&[2..4, 2..4])
        );
        let disjoint = ArraySubset::new_with_ranges(&[4..6, 4..6]);
        assert_eq!(subset.overlap(&disjoint).unwrap().num_elements(), 0);
    }

    #[test]
    fn array_subset_relative_to() {
        let subset = ArraySubset::new_with_ranges(&[2..4, 2..6]);
        assert_eq!(
            subset.relative_to(&[2, 2]).unwrap(),
            ArraySubset::new_with_ranges(&[0..2, 0..4])
        );
        assert!(subset.relative_to(&[0]).is_err());
    }

    #[test]
    fn array_subset_extract_bytes() {
        //  0  1  2  3
        //  4  5  6  7
        //  8  9 10 11
        let bytes: Vec<u8> = (0..12).collect();
        let subset = ArraySubset::new_with_ranges(&[1..3, 1..3]);
        let extracted = subset.extract_bytes(&bytes, &[3, 4], 1).unwrap();
        assert_eq!(extracted, vec![5, 6, 9, 10]);
        assert!(subset.extract_bytes(&bytes, &[3, 3], 1).is_err());
    }

    #[test]
    fn array_subset_store_bytes() {
        let mut bytes: Vec<u8> = vec![0; 12];
        let subset = ArraySubset::new_with_ranges(&[1..3, 1..3]);
        subset
            .store_bytes(&[5, 6, 9, 10], &mut bytes, &[3, 4], 1)
            .unwrap();
        assert_eq!(bytes, vec![0, 0, 0, 0, 0, 5, 6, 0, 0, 9, 10, 0]);
    }
}
