use crate::models::progression::LevelProgress;

pub const DEFAULT_BASE_XP_PER_LEVEL: i64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Leveling {
    base_xp_per_level: i64,
}

impl Leveling {
    /// Non-positive steps are a misconfiguration and fall back to the default.
    pub fn new(base_xp_per_level: i64) -> Self {
        let base_xp_per_level = if base_xp_per_level > 0 {
            base_xp_per_level
        } else {
            tracing::warn!(
                configured = base_xp_per_level,
                fallback = DEFAULT_BASE_XP_PER_LEVEL,
                "invalid base xp per level"
            );
            DEFAULT_BASE_XP_PER_LEVEL
        };
        Self { base_xp_per_level }
    }

    pub fn base_xp_per_level(&self) -> i64 {
        self.base_xp_per_level
    }

    pub fn level_for(&self, xp: i64) -> i64 {
        (xp.max(0) / self.base_xp_per_level + 1).max(1)
    }

    pub fn progress(&self, xp: i64) -> LevelProgress {
        let xp = xp.max(0);
        let xp_into_level = xp % self.base_xp_per_level;
        LevelProgress {
            level: self.level_for(xp),
            xp_into_level,
            xp_to_next_level: self.base_xp_per_level - xp_into_level,
        }
    }

    pub fn levels_gained(&self, old_xp: i64, new_xp: i64) -> i64 {
        (self.level_for(new_xp) - self.level_for(old_xp)).max(0)
    }
}

impl Default for Leveling {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_XP_PER_LEVEL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_boundaries() {
        let leveling = Leveling::new(1000);
        assert_eq!(leveling.level_for(0), 1);
        assert_eq!(leveling.level_for(999), 1);
        assert_eq!(leveling.level_for(1000), 2);
        assert_eq!(leveling.level_for(1060), 2);
        assert_eq!(leveling.level_for(25_000), 26);
    }

    #[test]
    fn test_level_is_monotonic_and_at_least_one() {
        let leveling = Leveling::new(137);
        let mut previous = leveling.level_for(0);
        for xp in 0..20_000 {
            let level = leveling.level_for(xp);
            assert!(level >= 1);
            assert!(level >= previous);
            assert_eq!(level, leveling.level_for(xp));
            previous = level;
        }
    }

    #[test]
    fn test_misconfigured_step_falls_back() {
        assert_eq!(Leveling::new(0).base_xp_per_level(), DEFAULT_BASE_XP_PER_LEVEL);
        assert_eq!(Leveling::new(-5).base_xp_per_level(), DEFAULT_BASE_XP_PER_LEVEL);
        assert_eq!(Leveling::new(250).base_xp_per_level(), 250);
    }

    #[test]
    fn test_progress_and_levels_gained() {
        let leveling = Leveling::new(1000);
        let progress = leveling.progress(1060);
        assert_eq!(progress.level, 2);
        assert_eq!(progress.xp_into_level, 60);
        assert_eq!(progress.xp_to_next_level, 940);

        assert_eq!(leveling.levels_gained(950, 1060), 1);
        assert_eq!(leveling.levels_gained(100, 900), 0);
        assert_eq!(leveling.levels_gained(0, 3500), 3);
    }

    #[test]
    fn test_negative_xp_clamps_to_level_one() {
        let leveling = Leveling::default();
        assert_eq!(leveling.level_for(-1), 1);
        assert_eq!(leveling.progress(-50).xp_into_level, 0);
    }
}
