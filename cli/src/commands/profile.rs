use anyhow::{Result, bail};
use tabled::{Table, Tabled, settings::Style};

use leantrack_core::models::{Profile, UnitPreference};
use leantrack_core::units::MeasurementSystem;

use super::Service;
use super::helpers::{format_height, format_weight, parse_height, parse_weight_input};

pub(crate) struct OnboardArgs {
    pub name: String,
    pub age: Option<u32>,
    pub height: String,
    pub weight: String,
    pub target: Option<String>,
    pub system: Option<String>,
}

pub(crate) fn cmd_onboard(svc: &mut Service, args: &OnboardArgs, json: bool) -> Result<()> {
    let units = match args.system.as_deref() {
        Some(s) => UnitPreference::for_system(s.parse::<MeasurementSystem>()?),
        None => svc.units()?,
    };

    let profile = Profile {
        name: args.name.trim().to_string(),
        age: args.age,
        height_cm: Some(parse_height(&args.height, units.height)?),
        start_weight_kg: Some(parse_weight_input(&args.weight, units.weight)?),
    };
    let target = args
        .target
        .as_deref()
        .map(|t| parse_weight_input(t, units.weight))
        .transpose()?;

    svc.complete_onboarding(&profile, target)?;
    if args.system.is_some() {
        svc.save_units(&units)?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        println!("Welcome, {}!", profile.name);
        print_profile(&profile, &units);
        if let Some(kg) = target {
            println!("Target weight: {}", format_weight(Some(kg), &units));
        }
    }

    Ok(())
}

pub(crate) fn cmd_profile_show(svc: &Service, json: bool) -> Result<()> {
    let profile = svc.require_profile()?;
    let units = svc.units()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        print_profile(&profile, &units);
    }

    Ok(())
}

pub(crate) fn cmd_profile_set(
    svc: &mut Service,
    name: Option<String>,
    age: Option<u32>,
    height: Option<String>,
    start_weight: Option<String>,
    json: bool,
) -> Result<()> {
    if name.is_none() && age.is_none() && height.is_none() && start_weight.is_none() {
        bail!("Nothing to change. Pass --name, --age, --height or --start-weight");
    }

    let units = svc.units()?;
    let mut profile = svc.profile()?.unwrap_or_default();
    if let Some(name) = name {
        profile.name = name.trim().to_string();
    }
    if age.is_some() {
        profile.age = age;
    }
    if let Some(h) = height {
        profile.height_cm = Some(parse_height(&h, units.height)?);
    }
    if let Some(w) = start_weight {
        profile.start_weight_kg = Some(parse_weight_input(&w, units.weight)?);
    }

    svc.save_profile(&profile)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        println!("Profile updated");
        print_profile(&profile, &units);
    }

    Ok(())
}

fn print_profile(profile: &Profile, units: &UnitPreference) {
    #[derive(Tabled)]
    struct FieldRow {
        #[tabled(rename = "Field")]
        field: &'static str,
        #[tabled(rename = "Value")]
        value: String,
    }

    let rows = vec![
        FieldRow {
            field: "Name",
            value: profile.name.clone(),
        },
        FieldRow {
            field: "Age",
            value: profile.age.map_or_else(|| "-".to_string(), |a| a.to_string()),
        },
        FieldRow {
            field: "Height",
            value: format_height(profile.height_cm, units),
        },
        FieldRow {
            field: "Start weight",
            value: format_weight(profile.start_weight_kg, units),
        },
    ];

    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{table}");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_service() -> (tempfile::TempDir, Service) {
        let dir = tempfile::tempdir().unwrap();
        let svc = Service::open(&dir.path().join("leantrack.db")).unwrap();
        (dir, svc)
    }

    fn onboard_args(height: &str) -> OnboardArgs {
        OnboardArgs {
            name: "Max".to_string(),
            age: Some(34),
            height: height.to_string(),
            weight: "198".to_string(),
            target: None,
            system: Some("imperial".to_string()),
        }
    }

    #[test]
    fn test_failed_onboarding_keeps_units() {
        let (_dir, mut svc) = temp_service();

        assert!(cmd_onboard(&mut svc, &onboard_args("tall"), true).is_err());
        assert_eq!(svc.units().unwrap(), UnitPreference::default());
        assert!(!svc.is_onboarded().unwrap());
    }

    #[test]
    fn test_onboarding_saves_chosen_units() {
        let (_dir, mut svc) = temp_service();

        cmd_onboard(&mut svc, &onboard_args("5'11"), true).unwrap();
        assert_eq!(
            svc.units().unwrap(),
            UnitPreference::for_system(MeasurementSystem::Imperial)
        );
        let profile = svc.require_profile().unwrap();
        assert!((profile.height_cm.unwrap() - 180.3).abs() < 0.1);
    }
}
