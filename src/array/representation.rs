//! Array and byte representations.

use std::num::NonZeroU64;

use derive_more::Display;
use thiserror::Error;

use super::{chunk_shape_to_array_shape, ArrayShape, DataType, FillValue};

/// The shape, data type, and fill value of a chunk.
///
/// All dimensions are non-zero and elements are laid out in row-major (C) order.
#[derive(Clone, Debug, Display)]
#[display("{shape:?} {data_type} {fill_value}")]
pub struct ChunkRepresentation {
    /// The shape of the chunk.
    shape: Vec<NonZeroU64>,
    /// The data type of the chunk.
    data_type: DataType,
    /// The fill value of the chunk.
    fill_value: FillValue,
}

/// The data type and fill value are incompatible.
#[derive(Clone, Debug, Error)]
#[error("data type {_0} is incompatible with fill value of size {_1} bytes")]
pub struct IncompatibleFillValueError(DataType, usize);

impl ChunkRepresentation {
    /// Create a new chunk representation.
    ///
    /// # Errors
    /// Returns [`IncompatibleFillValueError`] if the size of `fill_value` does not match the size
    /// of an element of `data_type`.
    pub fn new(
        shape: Vec<NonZeroU64>,
        data_type: DataType,
        fill_value: FillValue,
    ) -> Result<Self, IncompatibleFillValueError> {
        if data_type.size() == fill_value.size() {
            Ok(Self {
                shape,
                data_type,
                fill_value,
            })
        } else {
            Err(IncompatibleFillValueError(data_type, fill_value.size()))
        }
    }

    /// Create a new chunk representation.
    ///
    /// # Safety
    /// `data_type` and `fill_value` must be compatible.
    #[must_use]
    pub unsafe fn new_unchecked(
        shape: Vec<NonZeroU64>,
        data_type: DataType,
        fill_value: FillValue,
    ) -> Self {
        debug_assert_eq!(data_type.size(), fill_value.size());
        Self {
            shape,
            data_type,
            fill_value,
        }
    }

    /// Return the shape.
    #[must_use]
    pub fn shape(&self) -> &[NonZeroU64] {
        &self.shape
    }

    /// Return the shape as an [`ArrayShape`] ([`Vec<u64>`]).
    #[must_use]
    pub fn shape_u64(&self) -> ArrayShape {
        chunk_shape_to_array_shape(&self.shape)
    }

    /// Return the dimensionality.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.shape.len()
    }

    /// Return the data type.
    #[must_use]
    pub const fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Return the fill value.
    #[must_use]
    pub const fn fill_value(&self) -> &FillValue {
        &self.fill_value
    }

    /// Return the number of elements.
    ///
    /// Equal to the product of the shape.
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        self.shape.iter().map(|i| i.get()).product()
    }

    /// Return the number of elements as a `usize`.
    ///
    /// # Panics
    /// Panics if [`num_elements()`](Self::num_elements) is greater than [`usize::MAX`].
    #[must_use]
    pub fn num_elements_usize(&self) -> usize {
        usize::try_from(self.num_elements()).unwrap()
    }

    /// Return the element size in bytes.
    #[must_use]
    pub fn element_size(&self) -> usize {
        self.data_type.size()
    }

    /// Return the total size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.num_elements() * self.element_size() as u64
    }
}

/// The representation of encoded bytes.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BytesRepresentation {
    /// A fixed size.
    FixedSize(u64),
    /// A bounded size (the size is at most the bound).
    BoundedSize(u64),
    /// An unbounded size.
    UnboundedSize,
}

impl BytesRepresentation {
    /// Return the fixed or bounded size, or [`None`] if the size is unbounded.
    #[must_use]
    pub const fn size(&self) -> Option<u64> {
        match self {
            Self::FixedSize(size) | Self::BoundedSize(size) => Some(*size),
            Self::UnboundedSize => None,
        }
    }
}
