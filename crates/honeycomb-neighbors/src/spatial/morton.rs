// Copyright 2025 Honeycomb Contributors
// SPDX-License-Identifier: Apache-2.0

/*!
Morton encoding utilities for 2D spatial hashing.

Implements Z-order bit interleaving on 32-bit axis components.
*/

/// Spread the 32 bits of `value` into the even bit positions of a u64.
#[inline]
pub fn spread_bits(value: u32) -> u64 {
    let mut x = value as u64;
    x = (x | (x << 16)) & 0x0000_FFFF_0000_FFFF;
    x = (x | (x << 8)) & 0x00FF_00FF_00FF_00FF;
    x = (x | (x << 4)) & 0x0F0F_0F0F_0F0F_0F0F;
    x = (x | (x << 2)) & 0x3333_3333_3333_3333;
    x = (x | (x << 1)) & 0x5555_5555_5555_5555;
    x
}

/// Collect the even bit positions of `code` back into a u32.
#[inline]
pub fn compact_bits(code: u64) -> u32 {
    let mut x = code & 0x5555_5555_5555_5555;
    x = (x | (x >> 1)) & 0x3333_3333_3333_3333;
    x = (x | (x >> 2)) & 0x0F0F_0F0F_0F0F_0F0F;
    x = (x | (x >> 4)) & 0x00FF_00FF_00FF_00FF;
    x = (x | (x >> 8)) & 0x0000_FFFF_0000_FFFF;
    x = (x | (x >> 16)) & 0x0000_0000_FFFF_FFFF;
    x as u32
}

/// Morton encode two axis components into a single u64.
///
/// `low` occupies the even bit positions and `high` the odd ones:
/// `...h1l1h0l0`.
#[inline]
pub fn morton_encode_2d(low: u32, high: u32) -> u64 {
    spread_bits(low) | (spread_bits(high) << 1)
}

/// Morton decode a u64 back to its `(low, high)` components.
#[inline]
pub fn morton_decode_2d(code: u64) -> (u32, u32) {
    (compact_bits(code), compact_bits(code >> 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_morton_encode_decode() {
        let coords = [(0, 0), (1, 2), (100, 200), (65_535, 3), (u32::MAX, u32::MAX)];

        for (low, high) in coords {
            let encoded = morton_encode_2d(low, high);
            assert_eq!(
                morton_decode_2d(encoded),
                (low, high),
                "Round-trip failed for ({}, {})",
                low,
                high
            );
        }
    }

    #[test]
    fn test_bit_layout() {
        assert_eq!(morton_encode_2d(1, 0), 0b01);
        assert_eq!(morton_encode_2d(0, 1), 0b10);
        assert_eq!(morton_encode_2d(0b11, 0b10), 0b1101);
        assert_eq!(morton_encode_2d(u32::MAX, u32::MAX), u64::MAX);
    }

    #[test]
    fn test_spatial_locality() {
        let c1 = morton_encode_2d(10, 10);
        let c2 = morton_encode_2d(11, 10);
        let c3 = morton_encode_2d(1000, 1000);

        assert!(c1.abs_diff(c2) < c1.abs_diff(c3), "Spatial locality not preserved");
    }
}
