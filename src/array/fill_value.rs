//! Fill values.
//!
//! A fill value provides an element value to use for uninitialised portions of an array.

/// The fill value of an array.
///
/// Stored as the byte representation of a single element.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct FillValue(Vec<u8>);

impl core::fmt::Display for FillValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl From<&[u8]> for FillValue {
    fn from(value: &[u8]) -> Self {
        Self(value.to_vec())
    }
}

impl From<Vec<u8>> for FillValue {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

impl From<bool> for FillValue {
    fn from(value: bool) -> Self {
        Self(vec![u8::from(value)])
    }
}

macro_rules! from_ne_bytes {
    ( $t:ty ) => {
        impl From<$t> for FillValue {
            fn from(value: $t) -> Self {
                Self(value.to_ne_bytes().to_vec())
            }
        }
    };
}

from_ne_bytes!(u8);
from_ne_bytes!(u16);
from_ne_bytes!(u32);
from_ne_bytes!(u64);
from_ne_bytes!(i8);
from_ne_bytes!(i16);
from_ne_bytes!(i32);
from_ne_bytes!(i64);
from_ne_bytes!(half::f16);
from_ne_bytes!(half::bf16);
from_ne_bytes!(f32);
from_ne_bytes!(f64);

impl From<num::complex::Complex32> for FillValue {
    fn from(value: num::complex::Complex32) -> Self {
        let mut bytes = Vec::with_capacity(std::mem::size_of::<num::complex::Complex32>());
        bytes.extend(value.re.to_ne_bytes());
        bytes.extend(value.im.to_ne_bytes());
        Self(bytes)
    }
}

impl From<num::complex::Complex64> for FillValue {
    fn from(value: num::complex::Complex64) -> Self {
        let mut bytes = Vec::with_capacity(std::mem::size_of::<num::complex::Complex64>());
        bytes.extend(value.re.to_ne_bytes());
        bytes.extend(value.im.to_ne_bytes());
        Self(bytes)
    }
}

impl FillValue {
    /// Create a new fill value composed of `bytes`.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Returns the size in bytes of the fill value.
    #[must_use]
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// Return the byte representation of the fill value.
    #[must_use]
    pub fn as_ne_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Check if the bytes are equal to a sequence of the fill value.
    #[allow(clippy::missing_panics_doc)]
    #[must_use]
    pub fn equals_all(&self, bytes: &[u8]) -> bool {
        match self.0.len() {
            1 => {
                let fill_value = self.0[0];
                let fill_value_128 = u128::from_ne_bytes([self.0[0]; 16]);
                let (prefix, aligned, suffix) = unsafe { bytes.align_to::<u128>() };
                prefix.iter().all(|x| x == &fill_value)
                    && suffix.iter().all(|x| x == &fill_value)
                    && aligned.iter().all(|x| x == &fill_value_128)
            }
            2 => {
                let fill_value_128 = u128::from_ne_bytes(self.0[..2].repeat(8).try_into().unwrap());
                let (prefix, aligned, suffix) = unsafe { bytes.align_to::<u128>() };
                prefix.chunks_exact(2).all(|x| x == self.0)
                    && suffix.chunks_exact(2).all(|x| x == self.0)
                    && aligned.iter().all(|x| x == &fill_value_128)
            }
            4 => {
                let fill_value_128 = u128::from_ne_bytes(self.0[..4].repeat(4).try_into().unwrap());
                let (prefix, aligned, suffix) = unsafe { bytes.align_to::<u128>() };
                prefix.chunks_exact(4).all(|x| x == self.0)
                    && suffix.chunks_exact(4).all(|x| x == self.0)
                    && aligned.iter().all(|x| x == &fill_value_128)
            }
            8 => {
                let fill_value_128 = u128::from_ne_bytes(self.0[..8].repeat(2).try_into().unwrap())
;
                let (prefix, aligned, suffix) = unsafe { bytes.align_to::<u128>() };
                prefix.chunks_exact(8).all(|x| x == self.0)
                    && suffix.chunks_exact(8).all(|x| x == self.0)
                    && aligned.iter().all(|x| x == &fill_value_128)
            }
            16 => {
                let fill_value_128 = u128::from_ne_bytes(self.0[..16].try_into().unwrap());
                let (prefix, aligned, suffix) = unsafe { bytes.align_to::<u128>() };
                prefix.chunks_exact(16).all(|x| x == self.0)
                    && suffix.chunks_exact(16).all(|x| x == self.0)
                    && aligned.iter().all(|x| x == &fill_value_128)
            }
            _ => bytes
                .chunks_exact(self.0.len())
                .all(|element| element == self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_value_equals_all() {
        assert!(FillValue::from(0u8).equals_all(&[0; 7]));
        assert!(!FillValue::from(0u8).equals_all(&[0, 0, 1, 0]));
        assert!(FillValue::from(0x0201u16).equals_all(&0x0201u16.to_ne_bytes().repeat(5)));
        assert!(!FillValue::from(0x0201u16).equals_all(&0x0102u16.to_ne_bytes().repeat(5)));
        assert!(FillValue::from(1.5f32).equals_all(&1.5f32.to_ne_bytes().repeat(3)));
        assert!(FillValue::from(42.0f64).equals_all(&42.0f64.to_ne_bytes().repeat(2)));
        assert!(FillValue::new(vec![1, 2, 3]).equals_all(&[1, 2, 3, 1, 2, 3]));
        assert!(!FillValue::new(vec![1, 2, 3]).equals_all(&[1, 2, 3, 1, 2, 4]));
    }

    #[test]
    fn fill_value_size() {
        assert_eq!(FillValue::from(false).size(), 1);
        assert_eq!(FillValue::from(u64::MAX).size(), 8);
        assert_eq!(
            FillValue::from(num::complex::Complex32::new(0.0, 0.0)).size(),
            8
        );
    }
}
