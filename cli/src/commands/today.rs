use anyhow::Result;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use leantrack_core::metrics::{self, ActivitySignal, GoalDirection, bmi_category};
use leantrack_core::models::Intake;

use super::Service;
use super::helpers::{
    format_count, format_distance, format_volume, format_weight, format_weight_amount,
    parse_height, parse_weight_input, progress_bar,
};

pub(crate) fn cmd_today(svc: &mut Service, json: bool) -> Result<()> {
    let dash = svc.dashboard()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&dash)?);
        return Ok(());
    }

    let units = svc.units()?;
    let date = dash.date;
    println!("=== {date} ===\n");

    #[derive(Tabled)]
    struct IntakeRow {
        #[tabled(rename = "Intake")]
        intake: String,
        #[tabled(rename = "Today")]
        value: String,
        #[tabled(rename = "Target")]
        target: String,
        #[tabled(rename = "Progress")]
        progress: String,
    }

    let rows: Vec<IntakeRow> = dash
        .intakes
        .iter()
        .map(|status| {
            let show = |v: u32| match status.intake {
                Intake::Water => format_volume(Some(v), &units),
                Intake::Calories | Intake::Protein => format_count(Some(v), status.intake.unit()),
            };
            IntakeRow {
                intake: status.intake.label().to_string(),
                value: show(status.value),
                target: status
                    .progress
                    .map_or_else(|| "-".to_string(), |p| show(p.target)),
                progress: status
                    .progress
                    .map_or_else(|| "no target set".to_string(), |p| progress_bar(p.percent)),
            }
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..3)).with(Alignment::right()))
        .to_string();
    println!("{table}\n");

    let record = &dash.record;
    println!("  Weight:   {}", format_weight(dash.weight_kg, &units));
    if record.weight.is_none() && dash.weight_kg.is_some() {
        println!("            (start weight, nothing logged today)");
    }
    match (dash.bmi, dash.bmi_category) {
        (Some(bmi), Some(category)) => println!("  BMI:      {bmi:.1} ({category})"),
        _ => println!("  BMI:      -"),
    }
    println!(
        "  Activity: {} steps | {} | {}",
        format_count(record.steps, ""),
        format_count(record.minutes, "min"),
        format_distance(record.distance_km, &units)
    );
    let burned = dash.activity.kcal;
    match dash.activity.signal {
        ActivitySignal::None => println!("  Burned:   -"),
        signal => println!("  Burned:   ~{burned} kcal (from {})", signal.label()),
    }

    match dash.goal {
        Some(goal) if goal.direction == GoalDirection::Reached => {
            println!("  Goal:     target reached");
        }
        Some(goal) => println!(
            "  Goal:     {} {} of {} {}",
            progress_bar(goal.percent),
            format_weight_amount(goal.done_kg, &units),
            format_weight_amount(goal.total_kg, &units),
            match goal.direction {
                GoalDirection::Gain => "to gain",
                _ => "to lose",
            }
        ),
        None => println!("  Goal:     no goal set"),
    }

    Ok(())
}

/// BMI from the stored profile, or from `--weight`/`--height` given in the
/// user's units.
pub(crate) fn cmd_bmi(
    svc: &mut Service,
    weight: Option<&str>,
    height: Option<&str>,
    json: bool,
) -> Result<()> {
    let units = svc.units()?;
    let profile = svc.profile()?;
    let today = svc.today()?;

    let weight_kg = match weight {
        Some(w) => Some(parse_weight_input(w, units.weight)?),
        None => today.effective_weight_kg(profile.as_ref()),
    };
    let height_cm = match height {
        Some(h) => Some(parse_height(h, units.height)?),
        None => profile.as_ref().and_then(|p| p.height_cm),
    };

    let Some(bmi) = metrics::bmi(weight_kg, height_cm) else {
        if json {
            println!(
                "{}",
                serde_json::json!({ "error": "BMI needs a weight and a height" })
            );
        } else {
            eprintln!("BMI needs a weight and a height. Log a weight or pass --weight/--height");
        }
        process::exit(2);
    };
    let category = bmi_category(bmi);

    if json {
        println!(
            "{}",
            serde_json::json!({ "bmi": bmi, "category": category })
        );
    } else {
        println!("BMI {bmi:.1} ({category})");
    }

    Ok(())
}
