//! Utility functions for the FAST segment test

/// Check if a 16-bit circular mask holds at least `min_count` consecutive set bits.
///
/// Bit `i` corresponds to circle pixel `i`; runs may wrap from bit 15 to bit 0.
pub fn has_consecutive_bits(mask: u16, min_count: usize) -> bool {
    if min_count > 16 || min_count == 0 {
        return false;
    }
    if mask == u16::MAX {
        return true;
    }

    // AND the mask with its own rotations; any surviving bit starts a run of `min_count`
    let mut test_mask = mask;
    for i in 1..min_count {
        test_mask &= mask.rotate_right(i as u32);
        if test_mask == 0 {
            return false;
        }
    }

    test_mask != 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Pack a boolean circle into a bitmask (bit `i` = pixel `i`)
    fn pack_circle(pixels: &[bool; 16]) -> u16 {
        pixels
            .iter()
            .enumerate()
            .fold(0u16, |mask, (i, &set)| if set { mask | (1 << i) } else { mask })
    }

    /// Reference implementation walking the circle twice
    fn has_consecutive_pixels_fallback(pixels: &[bool; 16], min_count: usize) -> bool {
        if min_count > 16 || min_count == 0 {
            return false;
        }

        let mut current_consecutive = 0;
        for i in 0..(16 * 2) {
            if pixels[i % 16] {
                current_consecutive += 1;
                if current_consecutive >= min_count {
                    return true;
                }
            } else {
                current_consecutive = 0;
            }
        }

        false
    }

    #[test]
    fn test_consecutive_pixels_simple() {
        let mut pixels = [false; 16];
        for p in pixels.iter_mut().take(9) {
            *p = true;
        }
        let mask = pack_circle(&pixels);
        assert!(has_consecutive_bits(mask, 9));
        assert!(!has_consecutive_bits(mask, 10));
    }

    #[test]
    fn test_consecutive_pixels_wrap_around() {
        let mut pixels = [false; 16];
        for p in pixels.iter_mut().skip(12) {
            *p = true;
        }
        for p in pixels.iter_mut().take(5) {
            *p = true;
        }
        assert!(has_consecutive_bits(pack_circle(&pixels), 9));
    }

    #[test]
    fn test_non_consecutive_pixels() {
        let mut pixels = [false; 16];
        for i in (0..16).step_by(2) {
            pixels[i] = true;
        }
        assert!(!has_consecutive_bits(pack_circle(&pixels), 2));
    }

    #[test]
    fn test_degenerate_counts() {
        assert!(!has_consecutive_bits(u16::MAX, 0));
        assert!(!has_consecutive_bits(u16::MAX, 17));
        assert!(has_consecutive_bits(u16::MAX, 16));
    }

    proptest! {
        #[test]
        fn prop_bitmask_matches_fallback(bits in any::<u16>(), min_count in 1usize..=16) {
            let mut pixels = [false; 16];
            for (i, p) in pixels.iter_mut().enumerate() {
                *p = bits & (1 << i) != 0;
            }
            prop_assert_eq!(
                has_consecutive_bits(bits, min_count),
                has_consecutive_pixels_fallback(&pixels, min_count)
            );
        }
    }
}
