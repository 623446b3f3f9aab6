use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::units::{DistanceUnit, HeightUnit, MeasurementSystem, VolumeUnit, WeightUnit};

pub const DEFAULT_DAILY_CALORIES: u32 = 2000;
pub const DEFAULT_DAILY_WATER_ML: u32 = 2000;
pub const DEFAULT_DAILY_PROTEIN_G: u32 = 120;

/// Parse a numeric form value. Blank, non-numeric and non-finite input is
/// absent rather than an error. A decimal comma is accepted (`88,9`).
#[must_use]
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Parse a whole-number form value; fractional input is rounded.
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub fn parse_count(raw: &str) -> Option<u32> {
    parse_number(raw)
        .filter(|v| *v >= 0.0 && *v <= f64::from(u32::MAX))
        .map(|v| v.round() as u32)
}

/// Deserializers for records written by form inputs, where numbers may have
/// been stored as strings and cleared fields as `""`.
mod lenient {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    pub fn f64_opt<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<NumberOrText> = Option::deserialize(deserializer)?;
        Ok(match raw {
            Some(NumberOrText::Number(v)) if v.is_finite() => Some(v),
            Some(NumberOrText::Text(s)) => super::parse_number(&s),
            _ => None,
        })
    }

    pub fn u32_opt<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<NumberOrText> = Option::deserialize(deserializer)?;
        Ok(match raw {
            Some(NumberOrText::Number(v)) => super::parse_count(&v.to_string()),
            Some(NumberOrText::Text(s)) => super::parse_count(&s),
            None => None,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub name: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::u32_opt"
    )]
    pub age: Option<u32>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::f64_opt"
    )]
    pub height_cm: Option<f64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::f64_opt"
    )]
    pub start_weight_kg: Option<f64>,
}

impl Profile {
    /// The onboarding gate: a name plus a positive height and start weight.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty()
            && self.height_cm.is_some_and(|h| h > 0.0)
            && self.start_weight_kg.is_some_and(|w| w > 0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Goals {
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::f64_opt")]
    pub target_weight_kg: Option<f64>,
    #[serde(deserialize_with = "lenient::u32_opt")]
    pub daily_calories: Option<u32>,
    #[serde(deserialize_with = "lenient::u32_opt")]
    pub daily_water_ml: Option<u32>,
    #[serde(deserialize_with = "lenient::u32_opt")]
    pub daily_protein_g: Option<u32>,
}

impl Default for Goals {
    fn default() -> Self {
        Self {
            target_weight_kg: None,
            daily_calories: Some(DEFAULT_DAILY_CALORIES),
            daily_water_ml: Some(DEFAULT_DAILY_WATER_ML),
            daily_protein_g: Some(DEFAULT_DAILY_PROTEIN_G),
        }
    }
}

/// One calendar day of tracking. Every field is optional; an untouched
/// field stays absent rather than zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DailyRecord {
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::f64_opt")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::u32_opt")]
    pub calories: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::u32_opt")]
    pub water: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::u32_opt")]
    pub protein: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::u32_opt")]
    pub steps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::u32_opt")]
    pub minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient::f64_opt")]
    pub distance_km: Option<f64>,
}

impl DailyRecord {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Weight used for derived metrics: today's weigh-in, else the profile's
    /// start weight.
    #[must_use]
    pub fn effective_weight_kg(&self, profile: Option<&Profile>) -> Option<f64> {
        self.weight
            .filter(|w| *w > 0.0)
            .or_else(|| profile.and_then(|p| p.start_weight_kg))
    }

    #[must_use]
    pub fn intake(&self, intake: Intake) -> Option<u32> {
        match intake {
            Intake::Calories => self.calories,
            Intake::Water => self.water,
            Intake::Protein => self.protein,
        }
    }

    /// Add `delta` to an intake counter, clamping at zero. Returns the new total.
    #[allow(clippy::cast_sign_loss)]
    pub fn adjust_intake(&mut self, intake: Intake, delta: i64) -> u32 {
        let current = i64::from(self.intake(intake).unwrap_or(0));
        let next = current.saturating_add(delta).clamp(0, i64::from(u32::MAX)) as u32;
        let slot = match intake {
            Intake::Calories => &mut self.calories,
            Intake::Water => &mut self.water,
            Intake::Protein => &mut self.protein,
        };
        *slot = Some(next);
        next
    }
}

/// The three daily counters that have targets and quick-add buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intake {
    Calories,
    Water,
    Protein,
}

pub const INTAKES: &[Intake] = &[Intake::Calories, Intake::Water, Intake::Protein];

impl Intake {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Intake::Calories => "calories",
            Intake::Water => "water",
            Intake::Protein => "protein",
        }
    }

    #[must_use]
    pub fn unit(self) -> &'static str {
        match self {
            Intake::Calories => "kcal",
            Intake::Water => "ml",
            Intake::Protein => "g",
        }
    }

    /// Preset increments offered for one-tap logging.
    #[must_use]
    pub fn quick_increments(self) -> &'static [u32] {
        match self {
            Intake::Calories => &[100, 250, 500],
            Intake::Water => &[250, 500],
            Intake::Protein => &[10, 25, 50],
        }
    }

    /// Preset decrement, applied only while the counter is above zero.
    #[must_use]
    pub fn quick_decrement(self) -> u32 {
        match self {
            Intake::Calories => 100,
            Intake::Water => 250,
            Intake::Protein => 10,
        }
    }

    #[must_use]
    pub fn target(self, goals: &Goals) -> Option<u32> {
        match self {
            Intake::Calories => goals.daily_calories,
            Intake::Water => goals.daily_water_ml,
            Intake::Protein => goals.daily_protein_g,
        }
    }
}

pub fn parse_intake(raw: &str) -> Result<Intake> {
    match raw.trim().to_lowercase().as_str() {
        "calories" | "kcal" | "cal" => Ok(Intake::Calories),
        "water" => Ok(Intake::Water),
        "protein" => Ok(Intake::Protein),
        _ => bail!("Invalid intake '{raw}'. Must be one of: calories, water, protein"),
    }
}

/// Display/input units. Storage never changes with these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitPreference {
    pub system: MeasurementSystem,
    pub weight: WeightUnit,
    pub height: HeightUnit,
    pub volume: VolumeUnit,
    pub distance: DistanceUnit,
}

impl UnitPreference {
    #[must_use]
    pub fn for_system(system: MeasurementSystem) -> Self {
        match system {
            MeasurementSystem::Metric => Self {
                system,
                weight: WeightUnit::Kg,
                height: HeightUnit::Cm,
                volume: VolumeUnit::Ml,
                distance: DistanceUnit::Km,
            },
            MeasurementSystem::Imperial => Self {
                system,
                weight: WeightUnit::Lb,
                height: HeightUnit::FtIn,
                volume: VolumeUnit::FlOz,
                distance: DistanceUnit::Mi,
            },
            MeasurementSystem::Uk => Self {
                system,
                weight: WeightUnit::St,
                height: HeightUnit::FtIn,
                volume: VolumeUnit::Ml,
                distance: DistanceUnit::Mi,
            },
        }
    }
}

impl Default for UnitPreference {
    fn default() -> Self {
        Self::for_system(MeasurementSystem::Metric)
    }
}

pub fn validate_profile(profile: &Profile) -> Result<()> {
    if profile.name.trim().is_empty() {
        bail!("Name must not be empty");
    }
    match profile.height_cm {
        Some(h) if h > 0.0 => {}
        Some(_) => bail!("Height must be greater than 0"),
        None => bail!("Height is required"),
    }
    match profile.start_weight_kg {
        Some(w) if w > 0.0 => {}
        Some(_) => bail!("Start weight must be greater than 0"),
        None => bail!("Start weight is required"),
    }
    Ok(())
}

pub fn validate_goals(goals: &Goals) -> Result<()> {
    if goals.target_weight_kg.is_some_and(|w| w <= 0.0) {
        bail!("Target weight must be greater than 0");
    }
    Ok(())
}

/// Reject negative or non-finite measurements entered by the user.
pub fn validate_measurement(field: &str, value: f64) -> Result<f64> {
    if !value.is_finite() {
        bail!("{field} must be a number");
    }
    if value < 0.0 {
        bail!("{field} must not be negative");
    }
    Ok(value)
}
