//! Battle formula constants - all tunable values in one place

// Variance applied to every damage roll, sampled from [MIN, MAX)
pub const DAMAGE_VARIANCE_MIN: f64 = 0.9;
pub const DAMAGE_VARIANCE_MAX: f64 = 1.1;

// Every damaging hit lands for at least this much
pub const MIN_DAMAGE: u32 = 1;

// Plain attack: strength × 2 − toughness
pub const ATTACK_STRENGTH_FACTOR: f64 = 2.0;

// Skills
pub const MAGICAL_SKILL_MAGIC_FACTOR: f64 = 1.5;
pub const PHYSICAL_SKILL_STRENGTH_FACTOR: f64 = 1.2;
pub const SKILL_DEFENSE_FACTOR: f64 = 0.5;
pub const HEALING_SKILL_MAGIC_FACTOR: f64 = 0.5;

// Escape: base + agility gap × factor + attempts × bonus. No upper clamp.
pub const FLEE_BASE_CHANCE: f64 = 0.3;
pub const FLEE_AGILITY_FACTOR: f64 = 0.02;
pub const FLEE_ATTEMPT_BONUS: f64 = 0.1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variance_range_brackets_one() {
        assert!(DAMAGE_VARIANCE_MIN < 1.0 && DAMAGE_VARIANCE_MAX > 1.0);
    }

    #[test]
    fn test_magic_outscales_strength_in_skills() {
        assert!(MAGICAL_SKILL_MAGIC_FACTOR > PHYSICAL_SKILL_STRENGTH_FACTOR);
    }

    #[test]
    fn test_flee_base_is_a_probability() {
        assert!(FLEE_BASE_CHANCE > 0.0 && FLEE_BASE_CHANCE < 1.0);
    }
}
