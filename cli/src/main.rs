mod commands;
mod config;
mod logging;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use crate::commands::{
    GoalChanges, LogArgs, OnboardArgs, Service, UnitChanges, cmd_add, cmd_bmi, cmd_export,
    cmd_goals_set, cmd_goals_show, cmd_history, cmd_import, cmd_log, cmd_onboard,
    cmd_profile_set, cmd_profile_show, cmd_today, cmd_units_set, cmd_units_show, cmd_watch,
};
use crate::config::Config;

#[derive(Parser)]
#[command(
    name = "leantrack",
    version,
    about = "A simple, local-first health tracker",
    long_about = "Track weight, calories, water, protein and activity day by day.\n\
                  Everything stays on this device."
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Set up your profile and starting point
    Onboard {
        /// Your name
        #[arg(long)]
        name: String,
        /// Age in years
        #[arg(long)]
        age: Option<u32>,
        /// Height in your height unit (e.g. "180" or "5'11")
        #[arg(long)]
        height: String,
        /// Current weight in your weight unit
        #[arg(long)]
        weight: String,
        /// Target weight in your weight unit
        #[arg(long)]
        target: Option<String>,
        /// Measurement system: metric, imperial, uk
        #[arg(long)]
        units: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show or edit your profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Show or edit target weight and daily targets
    Goals {
        #[command(subcommand)]
        command: GoalsCommands,
    },
    /// Show or change display units
    Units {
        #[command(subcommand)]
        command: UnitsCommands,
    },
    /// Set today's values (in your display units)
    Log {
        /// Body weight
        #[arg(long)]
        weight: Option<String>,
        /// Calories eaten (kcal)
        #[arg(long)]
        calories: Option<String>,
        /// Water drunk
        #[arg(long)]
        water: Option<String>,
        /// Protein eaten (g)
        #[arg(long)]
        protein: Option<String>,
        /// Steps walked
        #[arg(long)]
        steps: Option<String>,
        /// Active minutes
        #[arg(long)]
        minutes: Option<String>,
        /// Distance covered
        #[arg(long)]
        distance: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add to (or subtract from) today's calories, water or protein
    Add {
        /// calories, water or protein
        intake: String,
        /// Amount, e.g. 250 or -100. Omit to list the quick amounts.
        #[arg(allow_negative_numbers = true)]
        amount: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show today's dashboard
    Today {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show your BMI
    Bmi {
        /// Weight to use instead of today's
        #[arg(long)]
        weight: Option<String>,
        /// Height to use instead of the profile's
        #[arg(long)]
        height: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show recorded days, newest first
    History {
        /// Number of days to show (default: all)
        #[arg(short, long)]
        days: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export all days as CSV
    Export {
        /// Output file (default: stdout)
        file: Option<PathBuf>,
    },
    /// Import days from a CSV export
    Import {
        /// Path to the CSV file
        file: PathBuf,
        /// Preview import without making changes
        #[arg(long)]
        dry_run: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Stay open and follow the day rollover at local midnight
    Watch {
        /// Output events as JSON lines
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show your profile
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change profile fields
    Set {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        age: Option<u32>,
        /// Height in your height unit
        #[arg(long)]
        height: Option<String>,
        /// Start weight in your weight unit
        #[arg(long)]
        start_weight: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum GoalsCommands {
    /// Show goals
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change goals. A daily target of 0 means no target.
    Set {
        /// Target weight in your weight unit
        #[arg(long)]
        target_weight: Option<String>,
        /// Remove the target weight
        #[arg(long)]
        clear_target: bool,
        /// Daily calories (kcal)
        #[arg(long)]
        calories: Option<String>,
        /// Daily water in your volume unit
        #[arg(long)]
        water: Option<String>,
        /// Daily protein (g)
        #[arg(long)]
        protein: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum UnitsCommands {
    /// Show current units
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Pick a measurement system and/or override single units
    Set {
        /// metric, imperial or uk
        system: Option<String>,
        /// kg, lb or st
        #[arg(long)]
        weight: Option<String>,
        /// cm or ft/in
        #[arg(long)]
        height: Option<String>,
        /// ml or floz
        #[arg(long)]
        volume: Option<String>,
        /// km or mi
        #[arg(long)]
        distance: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

#[allow(clippy::too_many_lines)]
async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    tracing::debug!(db = %config.db_path.display(), "opening store");
    let mut svc = Service::open(&config.db_path)?;

    if !matches!(cli.command, Commands::Onboard { .. }) {
        greet(&mut svc)?;
    }

    match cli.command {
        Commands::Onboard {
            name,
            age,
            height,
            weight,
            target,
            units,
            json,
        } => cmd_onboard(
            &mut svc,
            &OnboardArgs {
                name,
                age,
                height,
                weight,
                target,
                system: units,
            },
            json,
        ),
        Commands::Profile { command } => match command {
            ProfileCommands::Show { json } => cmd_profile_show(&svc, json),
            ProfileCommands::Set {
                name,
                age,
                height,
                start_weight,
                json,
            } => cmd_profile_set(&mut svc, name, age, height, start_weight, json),
        },
        Commands::Goals { command } => match command {
            GoalsCommands::Show { json } => cmd_goals_show(&svc, json),
            GoalsCommands::Set {
                target_weight,
                clear_target,
                calories,
                water,
                protein,
                json,
            } => cmd_goals_set(
                &mut svc,
                &GoalChanges {
                    target_weight,
                    clear_target,
                    calories,
                    water,
                    protein,
                },
                json,
            ),
        },
        Commands::Units { command } => match command {
            UnitsCommands::Show { json } => cmd_units_show(&svc, json),
            UnitsCommands::Set {
                system,
                weight,
                height,
                volume,
                distance,
                json,
            } => cmd_units_set(
                &mut svc,
                &UnitChanges {
                    system,
                    weight,
                    height,
                    volume,
                    distance,
                },
                json,
            ),
        },
        Commands::Log {
            weight,
            calories,
            water,
            protein,
            steps,
            minutes,
            distance,
            json,
        } => cmd_log(
            &mut svc,
            &LogArgs {
                weight,
                calories,
                water,
                protein,
                steps,
                minutes,
                distance,
            },
            json,
        ),
        Commands::Add {
            intake,
            amount,
            json,
        } => cmd_add(&mut svc, &intake, amount.as_deref(), json),
        Commands::Today { json } => cmd_today(&mut svc, json),
        Commands::Bmi {
            weight,
            height,
            json,
        } => cmd_bmi(&mut svc, weight.as_deref(), height.as_deref(), json),
        Commands::History { days, json } => cmd_history(&svc, days, json),
        Commands::Export { file } => cmd_export(&svc, file.as_deref()),
        Commands::Import {
            file,
            dry_run,
            json,
        } => cmd_import(&mut svc, &file, dry_run, json),
        Commands::Watch { json } => cmd_watch(&mut svc, json).await,
    }
}

/// One-time greeting on the second launch after onboarding.
fn greet(svc: &mut Service) -> Result<()> {
    if let Some(greeting) = svc.take_greeting()? {
        let name = svc.profile()?.map(|p| p.name).unwrap_or_default();
        if name.is_empty() {
            eprintln!("{greeting}!");
        } else {
            eprintln!("{greeting}, {name}!");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_add_accepts_negative_amount() {
        let cli = Cli::try_parse_from(["leantrack", "add", "water", "-250"]).unwrap();
        match cli.command {
            Commands::Add { intake, amount, .. } => {
                assert_eq!(intake, "water");
                assert_eq!(amount.as_deref(), Some("-250"));
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn test_verbose_is_global() {
        let cli = Cli::try_parse_from(["leantrack", "today", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
