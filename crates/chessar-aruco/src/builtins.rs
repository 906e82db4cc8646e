//! Built-in dictionaries.
//!
//! Codes are generated deterministically from a fixed seed, filtered for
//! mixed bit density and canonicalized under rotation so every id decodes
//! unambiguously. The table is identical on every build, which makes rendered
//! markers stable across program runs and machines.

use crate::matcher::rotate_code_u64;
use crate::Dictionary;

const DICT_4X4_SEED: u64 = 0xA53A_9E37_5D1C;

/// The default 4x4 dictionary with 100 ids, matching the physical markers the
/// board layout was designed around.
pub fn dict_4x4_100() -> Dictionary {
    Dictionary {
        name: "CHESSAR_4X4_100",
        marker_size: 4,
        max_correction_bits: 0,
        codes: generate_codes(4, 100, DICT_4X4_SEED),
    }
}

/// Smaller 50-id variant of [`dict_4x4_100`] (same seed, shared prefix).
pub fn dict_4x4_50() -> Dictionary {
    Dictionary {
        name: "CHESSAR_4X4_50",
        marker_size: 4,
        max_correction_bits: 0,
        codes: generate_codes(4, 50, DICT_4X4_SEED),
    }
}

fn generate_codes(side: usize, count: usize, seed: u64) -> Vec<u64> {
    let bits = side * side;
    let mask = if bits == 64 { u64::MAX } else { (1u64 << bits) - 1 };

    let mut out = Vec::with_capacity(count);
    let mut state = seed;
    while out.len() < count {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        let code = state & mask;

        // Avoid trivial patterns.
        if code == 0 || code == mask {
            continue;
        }
        // Ensure mixed density.
        let ones = code.count_ones() as usize;
        if ones < bits / 4 || ones > bits * 3 / 4 {
            continue;
        }
        // Canonicalize rotation-equivalent payloads so no two ids are
        // rotations of one another.
        let canonical = (0..4)
            .map(|r| rotate_code_u64(code, side, r))
            .min()
            .unwrap_or(code);
        if out.contains(&canonical) {
            continue;
        }
        out.push(canonical);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_deterministic() {
        assert_eq!(dict_4x4_100().codes, dict_4x4_100().codes);
        assert_eq!(dict_4x4_100().codes[..50], dict_4x4_50().codes[..]);
    }

    #[test]
    fn no_id_is_a_rotation_of_another() {
        let dict = dict_4x4_100();
        for (i, &a) in dict.codes.iter().enumerate() {
            for r in 0..4u8 {
                let rotated = rotate_code_u64(a, dict.marker_size, r);
                for (j, &b) in dict.codes.iter().enumerate() {
                    if i != j {
                        assert_ne!(rotated, b, "ids {i} and {j} collide under rotation {r}");
                    }
                }
            }
        }
    }
}
