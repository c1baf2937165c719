//! Small shared utilities, grounded on `amtep-ck3-tiger/src/helpers.rs`:
//! the teacher collects dup-detection helpers and hash-map aliases here
//! rather than scattering them across modules.

pub type FnvHashMap<K, V> = std::collections::HashMap<K, V, fnv::FnvBuildHasher>;
pub type FnvHashSet<T> = std::collections::HashSet<T, fnv::FnvBuildHasher>;

/// Rounds a float to at most `digits` decimal places, used by the Lua
/// pretty-printer (spec §6: "floats are normalized to at most 3 decimals
/// when near-exact").
pub fn round_to(value: f64, digits: u32) -> f64 {
    let factor = 10f64.powi(digits as i32);
    (value * factor).round() / factor
}

/// True when `value` is within floating-point noise of its rounding to
/// `digits` decimals, i.e. it is safe to print the shorter form.
pub fn is_near_exact(value: f64, digits: u32) -> bool {
    (value - round_to(value, digits)).abs() < 1e-9
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_to_three_decimals() {
        assert_eq!(round_to(1.0 / 3.0, 3), 0.333);
    }

    #[test]
    fn near_exact_detects_clean_values() {
        assert!(is_near_exact(0.5, 3));
        assert!(!is_near_exact(1.0 / 3.0, 3));
    }
}
