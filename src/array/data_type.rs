//! Data types.
//!
//! All data types have a fixed size in bytes known ahead of time.

use derive_more::Display;

/// A data type.
#[derive(Clone, Eq, PartialEq, Debug, Display)]
#[non_exhaustive]
pub enum DataType {
    /// `bool` Boolean.
    #[display("bool")]
    Bool,
    /// `int8` Integer in `[-2^7, 2^7-1]`.
    #[display("int8")]
    Int8,
    /// `int16` Integer in `[-2^15, 2^15-1]`.
    #[display("int16")]
    Int16,
    /// `int32` Integer in `[-2^31, 2^31-1]`.
    #[display("int32")]
    Int32,
    /// `int64` Integer in `[-2^63, 2^63-1]`.
    #[display("int64")]
    Int64,
    /// `uint8` Integer in `[0, 2^8-1]`.
    #[display("uint8")]
    UInt8,
    /// `uint16` Integer in `[0, 2^16-1]`.
    #[display("uint16")]
    UInt16,
    /// `uint32` Integer in `[0, 2^32-1]`.
    #[display("uint32")]
    UInt32,
    /// `uint64` Integer in `[0, 2^64-1]`.
    #[display("uint64")]
    UInt64,
    /// `float16` IEEE 754 half-precision floating point.
    #[display("float16")]
    Float16,
    /// `float32` IEEE 754 single-precision floating point.
    #[display("float32")]
    Float32,
    /// `float64` IEEE 754 double-precision floating point.
    #[display("float64")]
    Float64,
    /// `bfloat16` brain floating point.
    #[display("bfloat16")]
    BFloat16,
    /// `complex64` real and complex components are each `float32`.
    #[display("complex64")]
    Complex64,
    /// `complex128` real and complex components are each `float64`.
    #[display("complex128")]
    Complex128,
    /// `r*` raw bits, variant field is the size in bytes.
    #[display("r{}", _0 * 8)]
    RawBits(usize),
}

impl DataType {
    /// Returns the identifier.
    #[must_use]
    pub fn identifier(&self) -> String {
        self.to_string()
    }

    /// Returns the size in bytes of an element.
    #[must_use]
    pub const fn size(&self) -> usize {
        match self {
            Self::Bool | Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 | Self::Float16 | Self::BFloat16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 | Self::Complex64 => 8,
            Self::Complex128 => 16,
            Self::RawBits(size) => *size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_type_sizes() {
        assert_eq!(DataType::Bool.size(), 1);
        assert_eq!(DataType::UInt16.size(), 2);
        assert_eq!(DataType::Float64.size(), 8);
        assert_eq!(DataType::Complex128.size(), 16);
        assert_eq!(DataType::RawBits(3).size(), 3);
    }

    #[test]
    fn data_type_identifiers() {
        assert_eq!(DataType::UInt8.identifier(), "uint8");
        assert_eq!(DataType::BFloat16.identifier(), "bfloat16");
        assert_eq!(DataType::RawBits(2).identifier(), "r16");
    }
}
