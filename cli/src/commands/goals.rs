use anyhow::{Result, bail};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use leantrack_core::models::{Goals, UnitPreference};

use super::Service;
use super::helpers::{
    format_count, format_volume, format_weight, parse_count_input, parse_volume_input,
    parse_weight_input,
};

pub(crate) struct GoalChanges {
    pub target_weight: Option<String>,
    pub clear_target: bool,
    pub calories: Option<String>,
    pub water: Option<String>,
    pub protein: Option<String>,
}

pub(crate) fn cmd_goals_show(svc: &Service, json: bool) -> Result<()> {
    let goals = svc.goals()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&goals)?);
    } else {
        print_goals(&goals, &svc.units()?);
    }

    Ok(())
}

pub(crate) fn cmd_goals_set(svc: &mut Service, changes: &GoalChanges, json: bool) -> Result<()> {
    if changes.target_weight.is_none()
        && !changes.clear_target
        && changes.calories.is_none()
        && changes.water.is_none()
        && changes.protein.is_none()
    {
        bail!("Nothing to change. Pass --target-weight, --calories, --water or --protein");
    }
    if changes.clear_target && changes.target_weight.is_some() {
        bail!("--clear-target cannot be combined with --target-weight");
    }

    let units = svc.units()?;
    let mut goals = svc.goals()?;

    if changes.clear_target {
        goals.target_weight_kg = None;
    }
    if let Some(w) = &changes.target_weight {
        goals.target_weight_kg = Some(parse_weight_input(w, units.weight)?);
    }
    if let Some(c) = &changes.calories {
        goals.daily_calories = Some(parse_count_input(c, "Calories")?);
    }
    if let Some(w) = &changes.water {
        goals.daily_water_ml = Some(parse_volume_input(w, units.volume)?);
    }
    if let Some(p) = &changes.protein {
        goals.daily_protein_g = Some(parse_count_input(p, "Protein")?);
    }

    svc.save_goals(&goals)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&goals)?);
    } else {
        println!("Goals updated");
        print_goals(&goals, &units);
    }

    Ok(())
}

fn print_goals(goals: &Goals, units: &UnitPreference) {
    #[derive(Tabled)]
    struct GoalRow {
        #[tabled(rename = "Goal")]
        goal: &'static str,
        #[tabled(rename = "Target")]
        target: String,
    }

    let unset = |value: String| {
        if value == "-" {
            "not set".to_string()
        } else {
            value
        }
    };

    let rows = vec![
        GoalRow {
            goal: "Target weight",
            target: unset(format_weight(goals.target_weight_kg, units)),
        },
        GoalRow {
            goal: "Daily calories",
            target: unset(format_count(
                goals.daily_calories.filter(|c| *c > 0),
                "kcal",
            )),
        },
        GoalRow {
            goal: "Daily water",
            target: unset(format_volume(goals.daily_water_ml, units)),
        },
        GoalRow {
            goal: "Daily protein",
            target: unset(format_count(goals.daily_protein_g.filter(|p| *p > 0), "g")),
        },
    ];

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}
