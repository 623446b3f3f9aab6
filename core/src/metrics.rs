//! Derived metrics: BMI, activity energy, weight goal and daily target progress.
//!
//! Everything here is a pure function of its inputs. Missing inputs yield
//! `None` (or 0 kcal) rather than an error.

use std::fmt;

use serde::Serialize;

use crate::units::round_to;

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

// --- BMI ---

/// Body mass index rounded to one decimal, or `None` unless both inputs are
/// finite and positive.
#[must_use]
pub fn bmi(weight_kg: Option<f64>, height_cm: Option<f64>) -> Option<f64> {
    let weight = positive(weight_kg)?;
    let meters = positive(height_cm)? / 100.0;
    Some(round_to(weight / (meters * meters), 1))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            BmiCategory::Underweight => "Underweight",
            BmiCategory::Normal => "Normal",
            BmiCategory::Overweight => "Overweight",
            BmiCategory::Obese => "Obese",
        }
    }
}

impl fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lower bounds are inclusive: 25.0 is Overweight, 30.0 is Obese.
#[must_use]
pub fn bmi_category(bmi: f64) -> BmiCategory {
    if bmi < 18.5 {
        BmiCategory::Underweight
    } else if bmi < 25.0 {
        BmiCategory::Normal
    } else if bmi < 30.0 {
        BmiCategory::Overweight
    } else {
        BmiCategory::Obese
    }
}

// --- Activity energy ---

const KCAL_PER_KM_NO_WEIGHT: f64 = 55.0;
const KCAL_PER_STEP_NO_WEIGHT: f64 = 0.04;
const KCAL_PER_MINUTE_NO_WEIGHT: f64 = 2.5;
const KCAL_PER_KG_KM: f64 = 0.8;
const KM_PER_STEP: f64 = 0.000_75;
const MODERATE_WALK_MET: f64 = 3.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivitySignal {
    Distance,
    Minutes,
    Steps,
    None,
}

impl ActivitySignal {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ActivitySignal::Distance => "distance",
            ActivitySignal::Minutes => "minutes",
            ActivitySignal::Steps => "steps",
            ActivitySignal::None => "none",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActivityEstimate {
    pub kcal: u32,
    pub signal: ActivitySignal,
}

/// Activity inputs after missing and non-positive values were normalised to 0.
#[derive(Debug, Clone, Copy)]
struct ActivityInputs {
    weight: f64,
    distance: f64,
    minutes: f64,
    steps: f64,
}

struct Rule {
    signal: ActivitySignal,
    applies: fn(&ActivityInputs) -> bool,
    kcal: fn(&ActivityInputs) -> f64,
}

/// Evaluated top to bottom, first match wins.
const WEIGHT_UNKNOWN_RULES: &[Rule] = &[
    Rule {
        signal: ActivitySignal::Distance,
        applies: |a| a.distance > 0.0,
        kcal: |a| a.distance * KCAL_PER_KM_NO_WEIGHT,
    },
    Rule {
        signal: ActivitySignal::Steps,
        applies: |a| a.steps > 0.0,
        kcal: |a| a.steps * KCAL_PER_STEP_NO_WEIGHT,
    },
    Rule {
        signal: ActivitySignal::Minutes,
        applies: |a| a.minutes > 0.0,
        kcal: |a| a.minutes * KCAL_PER_MINUTE_NO_WEIGHT,
    },
];

const WEIGHT_KNOWN_RULES: &[Rule] = &[
    Rule {
        signal: ActivitySignal::Distance,
        applies: |a| a.distance > 0.0,
        kcal: |a| a.weight * KCAL_PER_KG_KM * a.distance,
    },
    Rule {
        signal: ActivitySignal::Minutes,
        applies: |a| a.minutes > 0.0,
        kcal: |a| (MODERATE_WALK_MET * 3.5 * a.weight / 200.0) * a.minutes,
    },
    Rule {
        signal: ActivitySignal::Steps,
        applies: |a| a.steps > 0.0,
        kcal: |a| a.weight * KCAL_PER_KG_KM * (a.steps * KM_PER_STEP),
    },
];

/// Estimate calories burned from whichever single activity signal is the
/// most reliable for the inputs present.
#[must_use]
#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
pub fn estimate_activity(
    weight_kg: Option<f64>,
    distance_km: Option<f64>,
    minutes: Option<f64>,
    steps: Option<f64>,
) -> ActivityEstimate {
    let inputs = ActivityInputs {
        weight: positive(weight_kg).unwrap_or(0.0),
        distance: positive(distance_km).unwrap_or(0.0),
        minutes: positive(minutes).unwrap_or(0.0),
        steps: positive(steps).unwrap_or(0.0),
    };
    let rules = if inputs.weight > 0.0 {
        WEIGHT_KNOWN_RULES
    } else {
        WEIGHT_UNKNOWN_RULES
    };
    rules
        .iter()
        .find(|rule| (rule.applies)(&inputs))
        .map_or(
            ActivityEstimate {
                kcal: 0,
                signal: ActivitySignal::None,
            },
            |rule| ActivityEstimate {
                kcal: (rule.kcal)(&inputs).round().clamp(0.0, f64::from(u32::MAX)) as u32,
                signal: rule.signal,
            },
        )
}

#[must_use]
pub fn estimate_activity_kcal(
    weight_kg: Option<f64>,
    distance_km: Option<f64>,
    minutes: Option<f64>,
    steps: Option<f64>,
) -> u32 {
    estimate_activity(weight_kg, distance_km, minutes, steps).kcal
}

// --- Weight goal ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalDirection {
    Lose,
    Gain,
    Reached,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    pub percent: u8,
    pub done_kg: f64,
    pub total_kg: f64,
    pub direction: GoalDirection,
}

/// Progress from start weight toward target weight. `None` means no goal is
/// set. A missing current weight counts as still being at the start.
#[must_use]
#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
pub fn goal_progress(
    start_kg: Option<f64>,
    target_kg: Option<f64>,
    current_kg: Option<f64>,
) -> Option<GoalProgress> {
    let start = positive(start_kg)?;
    let target = positive(target_kg)?;
    let current = positive(current_kg).unwrap_or(start);

    let (direction, total, done) = if target < start {
        (GoalDirection::Lose, start - target, (start - current).max(0.0))
    } else if target > start {
        (GoalDirection::Gain, target - start, (current - start).max(0.0))
    } else {
        return Some(GoalProgress {
            percent: 100,
            done_kg: 0.0,
            total_kg: 0.0,
            direction: GoalDirection::Reached,
        });
    };

    let percent = (done / total * 100.0).round().clamp(0.0, 100.0) as u8;
    Some(GoalProgress {
        percent,
        done_kg: round_to(done, 1),
        total_kg: round_to(total, 1),
        direction,
    })
}

// --- Daily targets ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TargetProgress {
    pub value: u32,
    pub target: u32,
    pub percent: u8,
}

/// Share of a daily target reached, capped at 100. `None` when no target is set.
#[must_use]
#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
pub fn target_progress(value: Option<u32>, target: Option<u32>) -> Option<TargetProgress> {
    let target = target.filter(|t| *t > 0)?;
    let value = value.unwrap_or(0);
    let percent = (f64::from(value) / f64::from(target) * 100.0)
        .round()
        .min(100.0) as u8;
    Some(TargetProgress {
        value,
        target,
        percent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bmi_missing_inputs() {
        assert_eq!(bmi(Some(0.0), Some(180.0)), None);
        assert_eq!(bmi(Some(80.0), Some(0.0)), None);
        assert_eq!(bmi(None, Some(180.0)), None);
        assert_eq!(bmi(Some(80.0), Some(-170.0)), None);
        assert_eq!(bmi(Some(f64::INFINITY), Some(180.0)), None);
    }

    #[test]
    fn test_bmi_value() {
        // 80 / 1.8^2 = 24.69
        assert_eq!(bmi(Some(80.0), Some(180.0)), Some(24.7));
        assert_eq!(bmi(Some(60.0), Some(165.0)), Some(22.0));
    }

    #[test]
    fn test_bmi_category_boundaries() {
        assert_eq!(bmi_category(18.4), BmiCategory::Underweight);
        assert_eq!(bmi_category(18.5), BmiCategory::Normal);
        assert_eq!(bmi_category(24.9), BmiCategory::Normal);
        assert_eq!(bmi_category(25.0), BmiCategory::Overweight);
        assert_eq!(bmi_category(29.9), BmiCategory::Overweight);
        assert_eq!(bmi_category(30.0), BmiCategory::Obese);
        assert_eq!(BmiCategory::Obese.to_string(), "Obese");
    }

    #[test]
    fn test_estimate_prefers_distance_when_weight_known() {
        let estimate = estimate_activity(Some(80.0), Some(5.0), Some(60.0), Some(10_000.0));
        // 80 * 0.8 * 5
        assert_eq!(estimate.kcal, 320);
        assert_eq!(estimate.signal, ActivitySignal::Distance);
    }

    #[test]
    fn test_estimate_minutes_over_steps_when_weight_known() {
        // (3.3 * 3.5 * 70 / 200) * 30 = 121.275
        assert_eq!(estimate_activity_kcal(Some(70.0), None, Some(30.0), None), 121);
        let estimate = estimate_activity(Some(70.0), None, Some(30.0), Some(8000.0));
        assert_eq!(estimate.signal, ActivitySignal::Minutes);
        assert_eq!(estimate.kcal, 121);
    }

    #[test]
    fn test_estimate_steps_with_weight() {
        // 80 * 0.8 * (10000 * 0.00075) = 480
        assert_eq!(estimate_activity_kcal(Some(80.0), None, None, Some(10_000.0)), 480);
    }

    #[test]
    fn test_estimate_without_weight() {
        assert_eq!(estimate_activity_kcal(None, None, None, Some(1000.0)), 40);
        assert_eq!(estimate_activity_kcal(Some(0.0), Some(2.0), None, Some(1000.0)), 110);
        assert_eq!(estimate_activity_kcal(None, None, Some(20.0), None), 50);

        let estimate = estimate_activity(None, None, Some(20.0), Some(1000.0));
        assert_eq!(estimate.signal, ActivitySignal::Steps);
        assert_eq!(estimate.kcal, 40);
    }

    #[test]
    fn test_estimate_no_activity_is_zero() {
        let estimate = estimate_activity(Some(80.0), None, None, None);
        assert_eq!(estimate.kcal, 0);
        assert_eq!(estimate.signal, ActivitySignal::None);
        assert_eq!(estimate_activity_kcal(None, None, None, None), 0);
        assert_eq!(estimate_activity_kcal(Some(80.0), Some(-3.0), Some(-5.0), None), 0);
    }

    #[test]
    fn test_goal_progress_loss() {
        let progress = goal_progress(Some(90.0), Some(80.0), Some(85.0)).unwrap();
        assert_eq!(progress.percent, 50);
        assert!((progress.done_kg - 5.0).abs() < 1e-9);
        assert!((progress.total_kg - 10.0).abs() < 1e-9);
        assert_eq!(progress.direction, GoalDirection::Lose);
    }

    #[test]
    fn test_goal_progress_no_goal() {
        assert_eq!(goal_progress(Some(90.0), None, Some(85.0)), None);
        assert_eq!(goal_progress(None, Some(80.0), Some(85.0)), None);
        assert_eq!(goal_progress(Some(90.0), Some(0.0), Some(85.0)), None);
    }

    #[test]
    fn test_goal_progress_current_falls_back_to_start() {
        let progress = goal_progress(Some(90.0), Some(80.0), None).unwrap();
        assert_eq!(progress.percent, 0);
        assert!(progress.done_kg.abs() < 1e-9);
    }

    #[test]
    fn test_goal_progress_clamps() {
        // Overshooting the target caps at 100
        assert_eq!(goal_progress(Some(90.0), Some(80.0), Some(78.0)).unwrap().percent, 100);
        // Moving away from the target stays at 0
        let progress = goal_progress(Some(90.0), Some(80.0), Some(92.0)).unwrap();
        assert_eq!(progress.percent, 0);
        assert!(progress.done_kg.abs() < 1e-9);
    }

    #[test]
    fn test_goal_progress_gain() {
        let progress = goal_progress(Some(60.0), Some(70.0), Some(64.0)).unwrap();
        assert_eq!(progress.direction, GoalDirection::Gain);
        assert_eq!(progress.percent, 40);
        assert!((progress.done_kg - 4.0).abs() < 1e-9);
        assert!((progress.total_kg - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_goal_progress_target_equals_start() {
        let progress = goal_progress(Some(80.0), Some(80.0), Some(81.0)).unwrap();
        assert_eq!(progress.percent, 100);
        assert_eq!(progress.direction, GoalDirection::Reached);
        assert!(progress.total_kg.abs() < 1e-9);
    }

    #[test]
    fn test_target_progress() {
        let progress = target_progress(Some(1500), Some(2000)).unwrap();
        assert_eq!(progress.percent, 75);
        assert_eq!(target_progress(Some(2600), Some(2000)).unwrap().percent, 100);
        assert_eq!(target_progress(None, Some(2000)).unwrap().percent, 0);
        assert_eq!(target_progress(Some(100), Some(0)), None);
        assert_eq!(target_progress(Some(100), None), None);
    }
}
