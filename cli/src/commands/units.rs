use anyhow::{Result, bail};
use tabled::{Table, Tabled, settings::Style};

use leantrack_core::models::UnitPreference;
use leantrack_core::units::MeasurementSystem;

use super::Service;

pub(crate) struct UnitChanges {
    pub system: Option<String>,
    pub weight: Option<String>,
    pub height: Option<String>,
    pub volume: Option<String>,
    pub distance: Option<String>,
}

pub(crate) fn cmd_units_show(svc: &Service, json: bool) -> Result<()> {
    let units = svc.units()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&units)?);
    } else {
        print_units(&units);
    }

    Ok(())
}

/// Choosing a system applies its preset first; single-unit flags then
/// override individual selectors.
pub(crate) fn cmd_units_set(svc: &mut Service, changes: &UnitChanges, json: bool) -> Result<()> {
    if changes.system.is_none()
        && changes.weight.is_none()
        && changes.height.is_none()
        && changes.volume.is_none()
        && changes.distance.is_none()
    {
        bail!("Nothing to change. Pass a system (metric, imperial, uk) or a unit flag");
    }

    let mut units = match changes.system.as_deref() {
        Some(s) => UnitPreference::for_system(s.parse::<MeasurementSystem>()?),
        None => svc.units()?,
    };
    if let Some(w) = &changes.weight {
        units.weight = w.parse()?;
    }
    if let Some(h) = &changes.height {
        units.height = h.parse()?;
    }
    if let Some(v) = &changes.volume {
        units.volume = v.parse()?;
    }
    if let Some(d) = &changes.distance {
        units.distance = d.parse()?;
    }

    svc.save_units(&units)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&units)?);
    } else {
        println!("Units updated");
        print_units(&units);
    }

    Ok(())
}

fn print_units(units: &UnitPreference) {
    #[derive(Tabled)]
    struct UnitRow {
        #[tabled(rename = "Quantity")]
        quantity: &'static str,
        #[tabled(rename = "Unit")]
        unit: String,
    }

    let rows = vec![
        UnitRow {
            quantity: "System",
            unit: units.system.to_string(),
        },
        UnitRow {
            quantity: "Weight",
            unit: units.weight.to_string(),
        },
        UnitRow {
            quantity: "Height",
            unit: units.height.to_string(),
        },
        UnitRow {
            quantity: "Volume",
            unit: units.volume.to_string(),
        },
        UnitRow {
            quantity: "Distance",
            unit: units.distance.to_string(),
        },
    ];

    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{table}");
}
