use std::io::{Read, Write};

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;

use crate::day::{date_key, parse_date_key};
use crate::models::{DailyRecord, parse_number, validate_measurement};

pub const HEADER: [&str; 8] = [
    "date",
    "weight_kg",
    "calories",
    "water_ml",
    "protein_g",
    "steps",
    "minutes",
    "distance_km",
];

fn cell<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(String::new, |v| v.to_string())
}

/// Write day records as CSV, one row per date, in the order given.
/// Absent fields are empty cells.
pub fn write_history_csv<W: Write>(writer: W, records: &[(NaiveDate, DailyRecord)]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADER)?;
    for (date, record) in records {
        wtr.write_record([
            date_key(*date),
            cell(record.weight),
            cell(record.calories),
            cell(record.water),
            cell(record.protein),
            cell(record.steps),
            cell(record.minutes),
            cell(record.distance_km),
        ])
        .with_context(|| format!("Failed to write row for {date}"))?;
    }
    wtr.flush().context("Failed to flush CSV output")?;
    Ok(())
}

/// Parse a history CSV. Only `date` is required; missing columns and empty
/// cells leave the field absent. Rows with a blank date or no values are skipped.
pub fn parse_history_csv<R: Read>(reader: R) -> Result<Vec<(NaiveDate, DailyRecord)>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers().context("Failed to read CSV headers")?.clone();

    let col =
        |name: &str| -> Option<usize> { headers.iter().position(|h| h.eq_ignore_ascii_case(name)) };

    let idx_date = col("date").context("Missing required column: date")?;
    let idx_weight = col("weight_kg");
    let idx_calories = col("calories");
    let idx_water = col("water_ml");
    let idx_protein = col("protein_g");
    let idx_steps = col("steps");
    let idx_minutes = col("minutes");
    let idx_distance = col("distance_km");

    let mut rows = Vec::new();

    for (line_num, result) in rdr.records().enumerate() {
        let row_num = line_num + 2;
        let row = result.with_context(|| format!("Failed to parse CSV row {row_num}"))?;

        let date = row.get(idx_date).unwrap_or("");
        if date.is_empty() {
            continue;
        }
        let date = parse_date_key(date).with_context(|| format!("Row {row_num}"))?;

        let number = |idx: Option<usize>, field: &str| -> Result<Option<f64>> {
            let raw = idx.and_then(|i| row.get(i)).unwrap_or("");
            if raw.is_empty() {
                return Ok(None);
            }
            let Some(value) = parse_number(raw) else {
                bail!("Row {row_num}: {field} '{raw}' is not a number");
            };
            validate_measurement(field, value)
                .with_context(|| format!("Row {row_num}"))
                .map(Some)
        };
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        let count = |idx: Option<usize>, field: &str| -> Result<Option<u32>> {
            Ok(number(idx, field)?.map(|v| v.round().min(f64::from(u32::MAX)) as u32))
        };

        let record = DailyRecord {
            weight: number(idx_weight, "weight_kg")?,
            calories: count(idx_calories, "calories")?,
            water: count(idx_water, "water_ml")?,
            protein: count(idx_protein, "protein_g")?,
            steps: count(idx_steps, "steps")?,
            minutes: count(idx_minutes, "minutes")?,
            distance_km: number(idx_distance, "distance_km")?,
        };
        if record.is_empty() {
            continue;
        }
        rows.push((date, record));
    }

    Ok(rows)
}
