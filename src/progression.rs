//! Level progression derived from accumulated experience points.

use serde::Serialize;

/// XP needed to leave level 0.
pub const BASE_LEVEL_XP: u64 = 1000;

/// Where a given XP total sits on the level ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progression {
    /// Current level, starting at 0
    pub level: u64,
    /// XP earned inside the current level
    pub remainder: u64,
    /// XP the current level takes to complete
    pub required: u64,
}

impl Progression {
    /// Share of the current level already completed, in `[0, 1)`.
    pub fn fraction(&self) -> f64 {
        self.remainder as f64 / self.required as f64
    }
}

/// XP required to complete `level`.
pub fn level_threshold(level: u64) -> u64 {
    BASE_LEVEL_XP + BASE_LEVEL_XP * level
}

/// Computes the level reached with `xp` total experience points.
///
/// Each level costs 1000 XP more than the one before it, so the loop runs
/// once per level gained rather than once per point.
pub fn progression(xp: u64) -> Progression {
    let mut level = 0;
    let mut remaining = xp;
    let mut required = level_threshold(level);

    while remaining >= required {
        remaining -= required;
        level += 1;
        required = level_threshold(level);
    }

    Progression {
        level,
        remainder: remaining,
        required,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triple(xp: u64) -> (u64, u64, u64) {
        let p = progression(xp);
        (p.level, p.remainder, p.required)
    }

    #[test]
    fn known_level_boundaries() {
        assert_eq!(triple(0), (0, 0, 1000));
        assert_eq!(triple(999), (0, 999, 1000));
        assert_eq!(triple(1000), (1, 0, 2000));
        assert_eq!(triple(2999), (1, 1999, 2000));
        assert_eq!(triple(3000), (2, 0, 3000));
        assert_eq!(triple(6000), (3, 0, 4000));
    }

    #[test]
    fn level_never_decreases_as_xp_grows() {
        let mut last = 0;
        for xp in (0..50_000).step_by(7) {
            let level = progression(xp).level;
            assert!(level >= last, "level dropped at xp={xp}");
            last = level;
        }
    }

    #[test]
    fn remainder_stays_below_requirement() {
        for xp in [0, 1, 999, 1000, 1001, 12_345, 1_000_000] {
            let p = progression(xp);
            assert!(p.remainder < p.required);
            assert!(p.fraction() < 1.0);
        }
    }

    #[test]
    fn large_totals_terminate_quickly() {
        let p = progression(u32::MAX as u64 * 100);
        assert!(p.level > 0);
        assert_eq!(p.required, level_threshold(p.level));
    }
}
