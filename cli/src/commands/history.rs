use anyhow::Result;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use super::Service;
use super::helpers::{format_count, format_volume, format_weight};

pub(crate) fn cmd_history(svc: &Service, days: Option<usize>, json: bool) -> Result<()> {
    let entries = svc.history(days)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        eprintln!("No days recorded yet. Use `leantrack log` or `leantrack add` to start.");
        process::exit(2);
    }

    #[derive(Tabled)]
    struct HistoryRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Weight")]
        weight: String,
        #[tabled(rename = "Calories")]
        calories: String,
        #[tabled(rename = "Water")]
        water: String,
        #[tabled(rename = "Protein")]
        protein: String,
        #[tabled(rename = "Steps")]
        steps: String,
        #[tabled(rename = "Burned")]
        burned: String,
    }

    let units = svc.units()?;
    let rows: Vec<HistoryRow> = entries
        .iter()
        .map(|e| HistoryRow {
            date: e.label.clone(),
            weight: format_weight(e.record.weight, &units),
            calories: format_count(e.record.calories, "kcal"),
            water: format_volume(e.record.water, &units),
            protein: format_count(e.record.protein, "g"),
            steps: format_count(e.record.steps, ""),
            burned: if e.activity.kcal == 0 {
                "-".to_string()
            } else {
                format!("~{} kcal", e.activity.kcal)
            },
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}
