use anyhow::{Context, Result, bail};
use std::process;

use leantrack_core::models::{Intake, parse_intake, parse_number};
use leantrack_core::service::RecordUpdate;
use leantrack_core::units::{VolumeUnit, volume_to_canonical};

use super::Service;
use super::helpers::{
    format_count, format_distance, format_volume, format_weight, parse_count_input,
    parse_distance_input, parse_volume_input, parse_weight_input,
};

/// Raw `log` flags, typed in the user's display units.
#[derive(Default)]
pub(crate) struct LogArgs {
    pub weight: Option<String>,
    pub calories: Option<String>,
    pub water: Option<String>,
    pub protein: Option<String>,
    pub steps: Option<String>,
    pub minutes: Option<String>,
    pub distance: Option<String>,
}

pub(crate) fn cmd_log(svc: &mut Service, args: &LogArgs, json: bool) -> Result<()> {
    let units = svc.units()?;
    let update = RecordUpdate {
        weight: args
            .weight
            .as_deref()
            .map(|w| parse_weight_input(w, units.weight))
            .transpose()?,
        calories: args
            .calories
            .as_deref()
            .map(|c| parse_count_input(c, "Calories"))
            .transpose()?,
        water: args
            .water
            .as_deref()
            .map(|w| parse_volume_input(w, units.volume))
            .transpose()?,
        protein: args
            .protein
            .as_deref()
            .map(|p| parse_count_input(p, "Protein"))
            .transpose()?,
        steps: args
            .steps
            .as_deref()
            .map(|s| parse_count_input(s, "Steps"))
            .transpose()?,
        minutes: args
            .minutes
            .as_deref()
            .map(|m| parse_count_input(m, "Minutes"))
            .transpose()?,
        distance_km: args
            .distance
            .as_deref()
            .map(|d| parse_distance_input(d, units.distance))
            .transpose()?,
    };
    if update.is_empty() {
        bail!(
            "Nothing to log. Pass --weight, --calories, --water, --protein, --steps, --minutes or --distance"
        );
    }

    let record = svc.log_today(&update)?;
    let date = svc.active_date()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!("Logged for {date}:");
        if update.weight.is_some() {
            println!("  Weight:   {}", format_weight(record.weight, &units));
        }
        if update.calories.is_some() {
            println!("  Calories: {}", format_count(record.calories, "kcal"));
        }
        if update.water.is_some() {
            println!("  Water:    {}", format_volume(record.water, &units));
        }
        if update.protein.is_some() {
            println!("  Protein:  {}", format_count(record.protein, "g"));
        }
        if update.steps.is_some() {
            println!("  Steps:    {}", format_count(record.steps, ""));
        }
        if update.minutes.is_some() {
            println!("  Minutes:  {}", format_count(record.minutes, "min"));
        }
        if update.distance_km.is_some() {
            println!("  Distance: {}", format_distance(record.distance_km, &units));
        }
    }

    Ok(())
}

/// Signed intake delta in storage units. Water follows the volume unit.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn parse_delta(raw: &str, intake: Intake, volume: VolumeUnit) -> Result<i64> {
    let value = parse_number(raw).with_context(|| format!("Amount '{raw}' is not a number"))?;
    let delta = match intake {
        Intake::Water => volume_to_canonical(value, volume),
        Intake::Calories | Intake::Protein => value.round(),
    };
    if delta == 0.0 {
        bail!("Amount must not be zero");
    }
    if delta.abs() > f64::from(u32::MAX) {
        bail!("Amount '{raw}' is too large");
    }
    Ok(delta as i64)
}

pub(crate) fn cmd_add(
    svc: &mut Service,
    intake: &str,
    amount: Option<&str>,
    json: bool,
) -> Result<()> {
    let intake = parse_intake(intake)?;
    let units = svc.units()?;

    let Some(amount) = amount else {
        let increments: Vec<String> = intake
            .quick_increments()
            .iter()
            .map(|v| format!("+{v}"))
            .collect();
        eprintln!(
            "Quick amounts for {} ({}): {} / -{}",
            intake.label(),
            intake.unit(),
            increments.join(" "),
            intake.quick_decrement()
        );
        process::exit(2);
    };

    let delta = parse_delta(amount, intake, units.volume)?;
    let total = svc.add_intake(intake, delta)?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "intake": intake, "delta": delta, "total": total })
        );
    } else {
        let shown = match intake {
            Intake::Water => format_volume(Some(total), &units),
            Intake::Calories | Intake::Protein => format_count(Some(total), intake.unit()),
        };
        println!("{}: {shown}", capitalize(intake.label()));
    }

    Ok(())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().collect::<String>() + chars.as_str()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_delta() {
        assert_eq!(parse_delta("250", Intake::Calories, VolumeUnit::Ml).unwrap(), 250);
        assert_eq!(parse_delta("-100", Intake::Calories, VolumeUnit::Ml).unwrap(), -100);
        assert_eq!(parse_delta("8", Intake::Water, VolumeUnit::FlOz).unwrap(), 237);
        assert_eq!(parse_delta("-250", Intake::Water, VolumeUnit::Ml).unwrap(), -250);
        assert!(parse_delta("0", Intake::Protein, VolumeUnit::Ml).is_err());
        assert!(parse_delta("lots", Intake::Protein, VolumeUnit::Ml).is_err());
    }

    #[test]
    fn test_parse_delta_rejects_huge_amounts() {
        assert!(parse_delta("1e19", Intake::Calories, VolumeUnit::Ml).is_err());
        assert!(parse_delta("-1e19", Intake::Water, VolumeUnit::Ml).is_err());
        assert_eq!(
            parse_delta("4294967295", Intake::Calories, VolumeUnit::Ml).unwrap(),
            i64::from(u32::MAX)
        );
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("water"), "Water");
        assert_eq!(capitalize(""), "");
    }
}
