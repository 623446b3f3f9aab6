use anyhow::{Context, Result};
use std::fs::File;
use std::io;
use std::path::Path;

use leantrack_core::history_csv::{parse_history_csv, write_history_csv};

use super::Service;

/// Write every day record as CSV to `file`, or stdout when no file is given.
pub(crate) fn cmd_export(svc: &Service, file: Option<&Path>) -> Result<()> {
    let records = svc.all_records()?;

    match file {
        Some(path) => {
            let out = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_history_csv(out, &records)?;
            eprintln!("Exported {} days to {}", records.len(), path.display());
        }
        None => write_history_csv(io::stdout().lock(), &records)?,
    }

    Ok(())
}

pub(crate) fn cmd_import(svc: &mut Service, file: &Path, dry_run: bool, json: bool) -> Result<()> {
    let reader =
        File::open(file).with_context(|| format!("Failed to open {}", file.display()))?;
    let records = parse_history_csv(reader)?;

    let first = records.iter().map(|(d, _)| *d).min();
    let last = records.iter().map(|(d, _)| *d).max();
    let written = if dry_run {
        0
    } else {
        svc.import_records(&records)?
    };

    if json {
        println!(
            "{}",
            serde_json::json!({
                "rows": records.len(),
                "written": written,
                "first": first,
                "last": last,
                "dryRun": dry_run,
            })
        );
    } else if records.is_empty() {
        println!("No rows to import");
    } else {
        let span = match (first, last) {
            (Some(f), Some(l)) if f != l => format!("{f} to {l}"),
            (Some(f), _) => f.to_string(),
            _ => String::new(),
        };
        if dry_run {
            println!("Would import {} days ({span})", records.len());
        } else {
            println!("Imported {written} days ({span})");
        }
    }

    Ok(())
}
