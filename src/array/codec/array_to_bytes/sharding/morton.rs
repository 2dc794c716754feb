//! Morton (Z-order) traversal of the sub-chunk grid.

use crate::array::ArrayIndices;

/// Decode a Morton code into indices by de-interleaving its bits.
///
/// Dimensions with fewer bits than the widest dimension stop contributing once their bits are
/// exhausted (compressed Morton coding), so non-square grids are still covered exactly.
fn decode_morton(z: u64, bits: &[u32], max_bits: u32) -> ArrayIndices {
    let mut out = vec![0u64; bits.len()];
    let mut input_bit = 0;
    for coord_bit in 0..max_bits {
        for (out_dim, &dim_bits) in std::iter::zip(out.iter_mut(), bits) {
            if coord_bit < dim_bits {
                let bit = z.checked_shr(input_bit).unwrap_or(0) & 1;
                *out_dim |= bit << coord_bit;
                input_bit += 1;
            }
        }
    }
    out
}

/// Iterate the indices of a grid of shape `grid_shape` in Morton (Z-order).
///
/// Every index of the grid is visited exactly once; indices decoded outside of the grid (for
/// non power-of-two extents) are skipped.
///
/// # Panics
/// Panics if the number of grid indices exceeds [`usize::MAX`].
pub fn morton_order_iter(grid_shape: &[u64]) -> impl Iterator<Item = ArrayIndices> {
    let grid_shape = grid_shape.to_vec();
    let bits: Vec<u32> = grid_shape
        .iter()
        .map(|&extent| u64::BITS - extent.saturating_sub(1).leading_zeros())
        .collect();
    let max_bits = bits.iter().max().copied().unwrap_or(0);
    let num_indices = usize::try_from(grid_shape.iter().product::<u64>()).unwrap();
    (0u64..)
        .map(move |z| decode_morton(z, &bits, max_bits))
        .filter(move |indices| {
            std::iter::zip(indices, &grid_shape).all(|(index, extent)| index < extent)
        })
        .take(num_indices)
}
