use std::{iter::FusedIterator, num::NonZeroU64};

use crate::{
    array::{chunk_shape_to_array_shape, ArrayIndices},
    array_subset::ArraySubset,
};

use super::IndicesIterator;

/// Iterates over the regular sized chunks overlapping an array subset.
///
/// Iterates over the last dimension fastest (i.e. C-contiguous order).
/// All chunks have the same size and are aligned to the chunk grid, so chunks may extend over the
/// bounds of the array subset.
///
/// The iterator item is an ([`ArrayIndices`], [`ArraySubset`]) tuple corresponding to the chunk
/// indices and the absolute chunk subset.
pub struct ChunksIterator {
    inner: IndicesIterator,
    chunk_shape: Vec<u64>,
}

impl ChunksIterator {
    /// Create a new chunks iterator.
    ///
    /// # Safety
    /// The dimensionality of `chunk_shape` must match the dimensionality of `subset`.
    #[must_use]
    pub(crate) unsafe fn new_unchecked(subset: &ArraySubset, chunk_shape: &[NonZeroU64]) -> Self {
        debug_assert_eq!(subset.dimensionality(), chunk_shape.len());
        let chunk_shape = chunk_shape_to_array_shape(chunk_shape);
        let chunk_subset = if subset.num_elements() == 0 {
            unsafe {
                ArraySubset::new_with_start_shape_unchecked(
                    vec![0; subset.dimensionality()],
                    vec![0; subset.dimensionality()],
                )
            }
        } else {
            let chunk_start: ArrayIndices = std::iter::zip(subset.start(), &chunk_shape)
                .map(|(i, c)| i / c)
                .collect();
            let chunk_end_exc: ArrayIndices = std::iter::zip(subset.end_exc(), &chunk_shape)
                .map(|(e, c)| e.div_ceil(*c))
                .collect();
            let shape = std::iter::zip(&chunk_start, &chunk_end_exc)
                .map(|(start, end)| end - start)
                .collect();
            unsafe { ArraySubset::new_with_start_shape_unchecked(chunk_start, shape) }
        };
        Self {
            inner: IndicesIterator::new(chunk_subset),
            chunk_shape,
        }
    }

    fn chunk_indices_with_subset(&self, chunk_indices: ArrayIndices) -> (ArrayIndices, ArraySubset) {
        let start = std::iter::zip(&chunk_indices, &self.chunk_shape)
            .map(|(i, c)| i * c)
            .collect();
        let chunk_subset = unsafe {
            ArraySubset::new_with_start_shape_unchecked(start, self.chunk_shape.clone())
        };
        (chunk_indices, chunk_subset)
    }
}

impl Iterator for ChunksIterator {
    type Item = (ArrayIndices, ArraySubset);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|chunk_indices| self.chunk_indices_with_subset(chunk_indices))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for ChunksIterator {}

impl FusedIterator for ChunksIterator {}
