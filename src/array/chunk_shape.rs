//! The shape of a chunk.

use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};

use super::{ArrayShape, NonZeroError};

/// The shape of a chunk. All dimensions must be non-zero.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug)]
pub struct ChunkShape(Vec<NonZeroU64>);

impl From<ChunkShape> for Vec<NonZeroU64> {
    fn from(val: ChunkShape) -> Self {
        val.0
    }
}

impl std::ops::Deref for ChunkShape {
    type Target = Vec<NonZeroU64>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<NonZeroU64>> for ChunkShape {
    fn from(value: Vec<NonZeroU64>) -> Self {
        ChunkShape(value)
    }
}

impl From<&[NonZeroU64]> for ChunkShape {
    fn from(value: &[NonZeroU64]) -> Self {
        ChunkShape(value.to_vec())
    }
}

impl TryFrom<Vec<u64>> for ChunkShape {
    type Error = NonZeroError;
    fn try_from(value: Vec<u64>) -> Result<Self, Self::Error> {
        value.as_slice().try_into()
    }
}

impl TryFrom<&[u64]> for ChunkShape {
    type Error = NonZeroError;
    fn try_from(value: &[u64]) -> Result<Self, Self::Error> {
        Ok(ChunkShape(
            value
                .iter()
                .map(|&i| NonZeroU64::new(i).ok_or(NonZeroError))
                .collect::<Result<_, _>>()?,
        ))
    }
}

impl ChunkShape {
    /// Convert to an [`ArrayShape`].
    #[must_use]
    pub fn to_array_shape(&self) -> ArrayShape {
        chunk_shape_to_array_shape(&self.0)
    }

    /// Return the number of elements.
    ///
    /// Equal to the product of the dimensions.
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        self.0.iter().map(|i| i.get()).product()
    }
}

/// Convert a chunk shape to an [`ArrayShape`].
#[must_use]
pub fn chunk_shape_to_array_shape(chunk_shape: &[NonZeroU64]) -> ArrayShape {
    chunk_shape.iter().map(|i| i.get()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_shape_try_from() {
        let shape: ChunkShape = vec![2u64, 3].try_into().unwrap();
        assert_eq!(shape.to_array_shape(), vec![2, 3]);
        assert_eq!(shape.num_elements(), 6);
        assert!(ChunkShape::try_from(vec![2u64, 0]).is_err());
    }
}
