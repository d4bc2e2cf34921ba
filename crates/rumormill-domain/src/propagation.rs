//! Decay and propagation math
//!
//! Pure functions turning severity, elapsed time and relationship inputs into
//! decay amounts, mutation odds, reach and conviction thresholds. Every output
//! respects its documented range even for non-finite or extreme inputs.

use crate::spread::clamp_unit;
use crate::RumorSeverity;

/// Base believability lost per log-day of inactivity
pub const DEFAULT_BASE_DECAY: f64 = 0.05;

/// How quickly spread radius approaches its ceiling
pub const DEFAULT_SATURATION: f64 = 0.8;

/// Retellings after which the spread factor saturates at 2x
const SPREAD_SATURATION_COUNT: f64 = 50.0;

/// Maximum spread multiplier on mutation probability
const MAX_SPREAD_FACTOR: f64 = 2.0;

/// Believability shift per unit of relationship strength
const RELATIONSHIP_WEIGHT: f64 = 0.2;

/// Bounds for the conviction needed to pass a rumor on
const MIN_THRESHOLD: f64 = 0.1;
const MAX_THRESHOLD: f64 = 1.0;

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Believability lost after `days_inactive` days without reinforcement
///
/// `base_decay * decay_factor(severity) * log10(days + 1)`, clamped to [0, 1].
/// Zero or negative days never decay.
///
/// # Examples
///
/// ```
/// use rumormill_domain::propagation::{decay, DEFAULT_BASE_DECAY};
/// use rumormill_domain::RumorSeverity;
///
/// assert_eq!(decay(0.0, RumorSeverity::Trivial, DEFAULT_BASE_DECAY), 0.0);
/// assert!(decay(10.0, RumorSeverity::Minor, DEFAULT_BASE_DECAY)
///     > decay(10.0, RumorSeverity::Critical, DEFAULT_BASE_DECAY));
/// ```
pub fn decay(days_inactive: f64, severity: RumorSeverity, base_decay: f64) -> f64 {
    let days = finite_or_zero(days_inactive);
    if days <= 0.0 {
        return 0.0;
    }
    let amount = finite_or_zero(base_decay) * severity.decay_factor() * (days + 1.0).log10();
    clamp_unit(amount)
}

/// Chance that a retelling mutates the rumor
///
/// Trivial rumors drift more readily than critical ones, and every retelling
/// adds drift until the spread factor reaches 2x at 50 retellings.
pub fn mutation_probability(base_chance: f64, severity: RumorSeverity, spread_count: usize) -> f64 {
    let spread_factor = (1.0 + spread_count as f64 / SPREAD_SATURATION_COUNT).min(MAX_SPREAD_FACTOR);
    clamp_unit(finite_or_zero(base_chance) * severity.decay_factor() * spread_factor)
}

/// Number of entities a rumor can plausibly reach after `days_active` days
///
/// Grows from `initial_radius * reach_factor` towards twice that value. The
/// result is floored and never below 1.
pub fn spread_radius(
    initial_radius: f64,
    severity: RumorSeverity,
    days_active: f64,
    saturation: f64,
) -> u32 {
    let days = finite_or_zero(days_active).max(0.0);
    let growth = 1.0 + (1.0 - (-finite_or_zero(saturation) * days).exp());
    let radius = finite_or_zero(initial_radius) * severity.reach_factor() * growth;

    let floored = finite_or_zero(radius).floor();
    if floored < 1.0 {
        1
    } else if floored >= u32::MAX as f64 {
        u32::MAX
    } else {
        floored as u32
    }
}

/// Belief an entity needs before it passes the rumor on
///
/// Severe rumors demand more conviction; a strong relationship with the
/// listener (`relationship_strength` in [-1, 1]) lowers the bar. Clamped to
/// [0.1, 1.0].
pub fn believability_threshold(
    base_threshold: f64,
    severity: RumorSeverity,
    relationship_strength: f64,
) -> f64 {
    let threshold = finite_or_zero(base_threshold) * severity.conviction_factor()
        - RELATIONSHIP_WEIGHT * finite_or_zero(relationship_strength);
    threshold.clamp(MIN_THRESHOLD, MAX_THRESHOLD)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_decay_zero_days() {
        for severity in RumorSeverity::ALL {
            assert_eq!(decay(0.0, severity, DEFAULT_BASE_DECAY), 0.0);
            assert_eq!(decay(-3.0, severity, DEFAULT_BASE_DECAY), 0.0);
        }
    }

    #[test]
    fn test_decay_severity_ordering() {
        let minor = decay(10.0, RumorSeverity::Minor, DEFAULT_BASE_DECAY);
        let critical = decay(10.0, RumorSeverity::Critical, DEFAULT_BASE_DECAY);
        assert!(minor > critical);
        assert!(critical > 0.0);
    }

    #[test]
    fn test_decay_formula() {
        // 0.05 * 1.0 * log10(10)
        let d = decay(9.0, RumorSeverity::Moderate, DEFAULT_BASE_DECAY);
        assert!((d - 0.05).abs() < EPSILON);
    }

    #[test]
    fn test_decay_clamped() {
        assert_eq!(decay(1e12, RumorSeverity::Trivial, 10.0), 1.0);
        assert_eq!(decay(f64::NAN, RumorSeverity::Trivial, DEFAULT_BASE_DECAY), 0.0);
        assert_eq!(decay(f64::INFINITY, RumorSeverity::Trivial, DEFAULT_BASE_DECAY), 0.0);
    }

    #[test]
    fn test_mutation_probability_formula() {
        // 0.2 * 1.2 * (1 + 25/50)
        let p = mutation_probability(0.2, RumorSeverity::Minor, 25);
        assert!((p - 0.36).abs() < EPSILON);

        let saturated = mutation_probability(0.2, RumorSeverity::Moderate, 1_000_000);
        assert!((saturated - 0.4).abs() < EPSILON);
    }

    #[test]
    fn test_mutation_probability_clamped() {
        assert_eq!(mutation_probability(5.0, RumorSeverity::Trivial, 1_000_000), 1.0);
        assert_eq!(mutation_probability(-1.0, RumorSeverity::Trivial, 3), 0.0);
    }

    #[test]
    fn test_spread_radius() {
        // day zero: 10 * 1.0 * 1.0
        assert_eq!(spread_radius(10.0, RumorSeverity::Moderate, 0.0, DEFAULT_SATURATION), 10);
        // long after: approaches 2x
        assert_eq!(spread_radius(10.0, RumorSeverity::Critical, 100.0, DEFAULT_SATURATION), 30);
        assert_eq!(spread_radius(0.0, RumorSeverity::Trivial, 5.0, DEFAULT_SATURATION), 1);
        assert_eq!(spread_radius(f64::NAN, RumorSeverity::Major, 5.0, DEFAULT_SATURATION), 1);
    }

    #[test]
    fn test_believability_threshold() {
        let neutral = believability_threshold(0.5, RumorSeverity::Moderate, 0.0);
        assert!((neutral - 0.5).abs() < EPSILON);

        let friendly = believability_threshold(0.5, RumorSeverity::Moderate, 1.0);
        assert!((friendly - 0.3).abs() < EPSILON);

        assert_eq!(believability_threshold(0.5, RumorSeverity::Critical, -5.0), 1.0);
        assert_eq!(believability_threshold(0.0, RumorSeverity::Trivial, 5.0), 0.1);
    }
}
