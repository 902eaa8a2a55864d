//! Centralized modular arithmetic for core addresses.
//!
//! Every place this workspace folds a signed offset back into `[0, M)` —
//! assembler label resolution, operand-fetch pointer folding, opcode field
//! arithmetic — routes through [`reduce`] or [`fold`]. Keeping one reducer
//! avoids the sign-handling bugs that show up when `%` is applied directly to
//! a negative value (Rust's `%`, like Go's, keeps the sign of the dividend).

use crate::FieldValue;

/// Fold a signed value into `[0, m)`.
///
/// # Panics
///
/// Panics if `m` is zero.
#[must_use]
pub fn reduce(value: i64, m: FieldValue) -> FieldValue {
    assert!(m > 0, "cannot reduce modulo zero");
    let m = i64::from(m);
    let r = value.rem_euclid(m);
    // r is in [0, m) and m fits in a u32, so this cannot truncate.
    u32::try_from(r).unwrap_or(0)
}

/// Add a signed offset to a core address, wrapping modulo `m`.
#[must_use]
pub fn offset(base: FieldValue, delta: i64, m: FieldValue) -> FieldValue {
    reduce(i64::from(base) + delta, m)
}

/// Subtract `b` from `a` modulo `m`, per §4.7.3: `(a + (m - b)) mod m`.
#[must_use]
pub fn sub(a: FieldValue, b: FieldValue, m: FieldValue) -> FieldValue {
    reduce(i64::from(a) - i64::from(b), m)
}

/// Project an operand value into the read/write window of size `limit`
/// centered on the program counter, per §4.7.2:
///
/// `fold(x, L, M) = let r = x mod L in if r > L/2 then r + (M - L) else r`
///
/// When `legacy` is `true`, the comparison is `r < L/2` instead of `r > L/2`,
/// reproducing the divergent behavior observed in some historic simulators
/// (see `SimulatorConfig::legacy_fold` in `corewar-sim`). `limit` must be in
/// `1..=m`.
///
/// # Panics
///
/// Panics if `limit` is zero.
#[must_use]
pub fn fold(
    value: FieldValue,
    limit: FieldValue,
    m: FieldValue,
    legacy: bool,
) -> FieldValue {
    assert!(limit > 0, "cannot fold modulo zero");
    let r = value % limit;
    let half = limit / 2;
    let wraps = if legacy { r < half } else { r > half };
    if wraps {
        // r < limit <= m, so m - limit doesn't underflow and r + (m - limit)
        // stays within the FieldValue range since both operands are < m.
        r.wrapping_add(m - limit)
    } else {
        r
    }
}

#[cfg(test)]
mod tests {
    use coverage_helper::test;

    use super::*;

    #[test]
    fn reduce_wraps_negative_values() {
        assert_eq!(reduce(-1, 8000), 7999);
        assert_eq!(reduce(-8000, 8000), 0);
        assert_eq!(reduce(8000, 8000), 0);
        assert_eq!(reduce(0, 8000), 0);
    }

    #[test]
    fn offset_and_sub_match_spec_formula() {
        assert_eq!(offset(7999, 1, 8000), 0);
        assert_eq!(sub(3, 8, 8000), 7995);
    }

    #[test]
    fn fold_centers_window_on_pc() {
        // limit == m: fold is a no-op beyond plain modular reduction.
        assert_eq!(fold(4001, 8000, 8000, false), 4001);
        // small limit wraps values past the half-way point to the negative
        // side, centering the reachable window on PC.
        let folded = fold(799, 800, 8000, false);
        assert_eq!(folded, 799 + (8000 - 800));
    }

    #[test]
    fn legacy_fold_flips_the_comparison() {
        let modern = fold(500, 800, 8000, false);
        let legacy = fold(500, 800, 8000, true);
        assert_ne!(modern, legacy);
    }
}
