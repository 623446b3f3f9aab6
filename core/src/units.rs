//! Conversions between canonical SI storage units and the units a user
//! chose for input and display.
//!
//! Storage is always kg, cm, ml and km. Every conversion rounds to the
//! precision of its target unit, so a value taken to display and back is
//! only approximately the original: a kg value passed through pounds comes
//! back within a few grams, not bit-identical.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const LB_PER_KG: f64 = 2.204_62;
pub const KG_PER_STONE: f64 = 6.350_29;
pub const CM_PER_INCH: f64 = 2.54;
pub const ML_PER_FL_OZ: f64 = 29.573_5;
pub const KM_PER_MILE: f64 = 1.609_34;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnitError {
    #[error("Unknown {kind} unit '{label}'. Use one of: {allowed}")]
    UnknownUnit {
        kind: &'static str,
        label: String,
        allowed: &'static str,
    },
    #[error("Invalid height '{0}'. Use e.g. 180 (cm) or 5'11 / 5ft 11in")]
    InvalidHeight(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementSystem {
    Metric,
    Imperial,
    Uk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    Kg,
    Lb,
    St,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeightUnit {
    #[serde(rename = "cm")]
    Cm,
    #[serde(rename = "ft/in")]
    FtIn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeUnit {
    Ml,
    FlOz,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    Km,
    Mi,
}

impl MeasurementSystem {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            MeasurementSystem::Metric => "metric",
            MeasurementSystem::Imperial => "imperial",
            MeasurementSystem::Uk => "uk",
        }
    }
}

impl WeightUnit {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            WeightUnit::Kg => "kg",
            WeightUnit::Lb => "lb",
            WeightUnit::St => "st",
        }
    }
}

impl HeightUnit {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            HeightUnit::Cm => "cm",
            HeightUnit::FtIn => "ft/in",
        }
    }
}

impl VolumeUnit {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            VolumeUnit::Ml => "ml",
            VolumeUnit::FlOz => "fl oz",
        }
    }
}

impl DistanceUnit {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            DistanceUnit::Km => "km",
            DistanceUnit::Mi => "mi",
        }
    }
}

macro_rules! impl_display_via_label {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        })*
    };
}

impl_display_via_label!(MeasurementSystem, WeightUnit, HeightUnit, VolumeUnit, DistanceUnit);

impl FromStr for MeasurementSystem {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "metric" => Ok(MeasurementSystem::Metric),
            "imperial" | "us" => Ok(MeasurementSystem::Imperial),
            "uk" => Ok(MeasurementSystem::Uk),
            _ => Err(UnitError::UnknownUnit {
                kind: "measurement system",
                label: s.to_string(),
                allowed: "metric, imperial, uk",
            }),
        }
    }
}

impl FromStr for WeightUnit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "kg" | "kgs" | "kilogram" | "kilograms" => Ok(WeightUnit::Kg),
            "lb" | "lbs" | "pound" | "pounds" => Ok(WeightUnit::Lb),
            "st" | "stone" | "stones" => Ok(WeightUnit::St),
            _ => Err(UnitError::UnknownUnit {
                kind: "weight",
                label: s.to_string(),
                allowed: "kg, lb, st",
            }),
        }
    }
}

impl FromStr for HeightUnit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cm" | "centimeter" | "centimeters" | "centimetre" | "centimetres" => {
                Ok(HeightUnit::Cm)
            }
            "ft" | "ftin" | "ft/in" | "feet" => Ok(HeightUnit::FtIn),
            _ => Err(UnitError::UnknownUnit {
                kind: "height",
                label: s.to_string(),
                allowed: "cm, ft/in",
            }),
        }
    }
}

impl FromStr for VolumeUnit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ml" | "milliliter" | "milliliters" | "millilitre" | "millilitres" => {
                Ok(VolumeUnit::Ml)
            }
            "floz" | "fl oz" | "fl_oz" | "oz" => Ok(VolumeUnit::FlOz),
            _ => Err(UnitError::UnknownUnit {
                kind: "volume",
                label: s.to_string(),
                allowed: "ml, floz",
            }),
        }
    }
}

impl FromStr for DistanceUnit {
    type Err = UnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "km" | "kilometer" | "kilometers" | "kilometre" | "kilometres" => {
                Ok(DistanceUnit::Km)
            }
            "mi" | "mile" | "miles" => Ok(DistanceUnit::Mi),
            _ => Err(UnitError::UnknownUnit {
                kind: "distance",
                label: s.to_string(),
                allowed: "km, mi",
            }),
        }
    }
}

/// Round half away from zero to a fixed number of decimal places.
#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

/// Zero, absent and non-finite canonical values have no display value,
/// so forms stay blank instead of showing a misleading 0.
fn displayable(canonical: Option<f64>) -> Option<f64> {
    canonical.filter(|v| v.is_finite() && *v != 0.0)
}

// --- Weight ---

#[must_use]
pub fn weight_to_display(kg: Option<f64>, unit: WeightUnit) -> Option<f64> {
    let kg = displayable(kg)?;
    let value = match unit {
        WeightUnit::Kg => kg,
        WeightUnit::Lb => kg * LB_PER_KG,
        WeightUnit::St => kg / KG_PER_STONE,
    };
    Some(round_to(value, 1))
}

#[must_use]
pub fn weight_to_canonical(value: f64, unit: WeightUnit) -> f64 {
    let kg = match unit {
        WeightUnit::Kg => value,
        WeightUnit::Lb => value / LB_PER_KG,
        WeightUnit::St => value * KG_PER_STONE,
    };
    round_to(kg, 2)
}

// --- Height ---

/// A height as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "unit", rename_all = "snake_case")]
pub enum HeightDisplay {
    Cm { cm: f64 },
    FeetInches { feet: i32, inches: i32 },
}

impl fmt::Display for HeightDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeightDisplay::Cm { cm } => write!(f, "{cm:.0} cm"),
            HeightDisplay::FeetInches { feet, inches } => write!(f, "{feet} ft {inches} in"),
        }
    }
}

/// Whole feet via floor, remaining inches via rounding. A remainder that
/// rounds up to 12 carries into the feet so inches always stay below 12.
#[must_use]
pub fn height_to_display(cm: Option<f64>, unit: HeightUnit) -> Option<HeightDisplay> {
    let cm = displayable(cm)?;
    Some(match unit {
        HeightUnit::Cm => HeightDisplay::Cm {
            cm: round_to(cm, 0),
        },
        HeightUnit::FtIn => {
            let total_inches = cm / CM_PER_INCH;
            let mut feet = (total_inches / 12.0).floor() as i32;
            let mut inches = (total_inches - f64::from(feet) * 12.0).round() as i32;
            if inches == 12 {
                feet += 1;
                inches = 0;
            }
            HeightDisplay::FeetInches { feet, inches }
        }
    })
}

#[must_use]
pub fn height_to_canonical(display: HeightDisplay) -> f64 {
    match display {
        HeightDisplay::Cm { cm } => round_to(cm, 1),
        HeightDisplay::FeetInches { feet, inches } => {
            feet_inches_to_cm(f64::from(feet), f64::from(inches))
        }
    }
}

#[must_use]
pub fn feet_inches_to_cm(feet: f64, inches: f64) -> f64 {
    let total_inches = feet * 12.0 + inches;
    round_to(total_inches * CM_PER_INCH, 1)
}

/// Parse a height typed in the user's height unit into centimeters.
///
/// Feet/inches accepts `5'11`, `5'11"`, `5ft 11in`, `5 11` and a bare `6`.
pub fn parse_height_input(input: &str, unit: HeightUnit) -> Result<f64, UnitError> {
    let invalid = || UnitError::InvalidHeight(input.to_string());
    let s = input.trim();
    match unit {
        HeightUnit::Cm => {
            let lower = s.to_lowercase();
            let cleaned = lower.trim_end_matches("cm").trim();
            crate::models::parse_number(cleaned).ok_or_else(invalid)
        }
        HeightUnit::FtIn => {
            let normalized = s
                .to_lowercase()
                .replace("inches", " ")
                .replace("inch", " ")
                .replace("in", " ")
                .replace('"', " ")
                .replace("feet", " ")
                .replace("ft", " ")
                .replace('\'', " ");
            let parts: Vec<&str> = normalized.split_whitespace().collect();
            let (feet, inches) = match parts.as_slice() {
                [feet] => (*feet, "0"),
                [feet, inches] => (*feet, *inches),
                _ => return Err(invalid()),
            };
            let feet = crate::models::parse_number(feet).ok_or_else(invalid)?;
            let inches = crate::models::parse_number(inches).ok_or_else(invalid)?;
            if !(0.0..12.0).contains(&inches) {
                return Err(invalid());
            }
            Ok(feet_inches_to_cm(feet, inches))
        }
    }
}

// --- Volume ---

#[must_use]
pub fn volume_to_display(ml: Option<f64>, unit: VolumeUnit) -> Option<f64> {
    let ml = displayable(ml)?;
    let value = match unit {
        VolumeUnit::Ml => ml,
        VolumeUnit::FlOz => ml / ML_PER_FL_OZ,
    };
    Some(value.round())
}

#[must_use]
pub fn volume_to_canonical(value: f64, unit: VolumeUnit) -> f64 {
    match unit {
        VolumeUnit::Ml => value.round(),
        VolumeUnit::FlOz => (value * ML_PER_FL_OZ).round(),
    }
}

// --- Distance ---

#[must_use]
pub fn distance_to_display(km: Option<f64>, unit: DistanceUnit) -> Option<f64> {
    let km = displayable(km)?;
    let value = match unit {
        DistanceUnit::Km => km,
        DistanceUnit::Mi => km / KM_PER_MILE,
    };
    Some(round_to(value, 2))
}

#[must_use]
pub fn distance_to_canonical(value: f64, unit: DistanceUnit) -> f64 {
    let km = match unit {
        DistanceUnit::Km => value,
        DistanceUnit::Mi => value * KM_PER_MILE,
    };
    round_to(km, 2)
}

/// Render an optional display value, blank when absent.
#[must_use]
pub fn format_display(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(String::new, |v| format!("{v:.decimals$}"))
}
