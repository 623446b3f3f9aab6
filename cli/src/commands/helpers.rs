use anyhow::{Context, Result, bail};

use leantrack_core::models::{UnitPreference, parse_number, validate_measurement};
use leantrack_core::units::{
    DistanceUnit, HeightUnit, VolumeUnit, WeightUnit, distance_to_canonical, distance_to_display,
    format_display, height_to_display, parse_height_input, volume_to_canonical, volume_to_display,
    weight_to_canonical, weight_to_display,
};

/// Parse a user-typed number, rejecting blanks, garbage and negatives.
pub(crate) fn parse_input(raw: &str, field: &str) -> Result<f64> {
    let value = parse_number(raw).with_context(|| format!("{field} '{raw}' is not a number"))?;
    validate_measurement(field, value)
}

#[allow(clippy::cast_sign_loss)]
pub(crate) fn parse_count_input(raw: &str, field: &str) -> Result<u32> {
    let value = parse_input(raw, field)?;
    if value > f64::from(u32::MAX) {
        bail!("{field} is too large");
    }
    Ok(value.round() as u32)
}

/// Weight in the user's unit to canonical kg. Must be positive.
pub(crate) fn parse_weight_input(raw: &str, unit: WeightUnit) -> Result<f64> {
    let value = parse_input(raw, "Weight")?;
    if value == 0.0 {
        bail!("Weight must be greater than 0");
    }
    Ok(weight_to_canonical(value, unit))
}

pub(crate) fn parse_height(raw: &str, unit: HeightUnit) -> Result<f64> {
    let cm = parse_height_input(raw, unit)?;
    if cm <= 0.0 {
        bail!("Height must be greater than 0");
    }
    Ok(cm)
}

#[allow(clippy::cast_sign_loss)]
pub(crate) fn parse_volume_input(raw: &str, unit: VolumeUnit) -> Result<u32> {
    let value = parse_input(raw, "Water")?;
    let ml = volume_to_canonical(value, unit);
    if ml > f64::from(u32::MAX) {
        bail!("Water amount is too large");
    }
    Ok(ml as u32)
}

pub(crate) fn parse_distance_input(raw: &str, unit: DistanceUnit) -> Result<f64> {
    let value = parse_input(raw, "Distance")?;
    Ok(distance_to_canonical(value, unit))
}

pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

fn with_unit(value: String, unit: &str) -> String {
    if value.is_empty() {
        "-".to_string()
    } else {
        format!("{value} {unit}")
    }
}

pub(crate) fn format_weight(kg: Option<f64>, units: &UnitPreference) -> String {
    let shown = weight_to_display(kg, units.weight).map(no_neg_zero);
    with_unit(format_display(shown, 1), units.weight.label())
}

/// A weight amount where zero is a real value, such as progress made so far.
pub(crate) fn format_weight_amount(kg: f64, units: &UnitPreference) -> String {
    if kg == 0.0 {
        return format!("0.0 {}", units.weight.label());
    }
    format_weight(Some(kg), units)
}

pub(crate) fn format_height(cm: Option<f64>, units: &UnitPreference) -> String {
    height_to_display(cm, units.height).map_or_else(|| "-".to_string(), |h| h.to_string())
}

pub(crate) fn format_volume(ml: Option<u32>, units: &UnitPreference) -> String {
    let shown = volume_to_display(ml.map(f64::from), units.volume);
    with_unit(format_display(shown, 0), units.volume.label())
}

pub(crate) fn format_distance(km: Option<f64>, units: &UnitPreference) -> String {
    let shown = distance_to_display(km, units.distance).map(no_neg_zero);
    with_unit(format_display(shown, 2), units.distance.label())
}

pub(crate) fn format_count(value: Option<u32>, unit: &str) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v} {unit}").trim_end().to_string())
}

const BAR_WIDTH: usize = 20;

/// Text progress bar, e.g. `[##########----------]  50%`.
pub(crate) fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) * BAR_WIDTH / 100;
    format!(
        "[{}{}] {percent:>3}%",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled)
    )
}
