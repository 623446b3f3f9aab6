mod goals;
mod helpers;
mod history;
mod log;
mod profile;
mod today;
mod transfer;
mod units;
mod watch;

use leantrack_core::service::LeanTrackService;
use leantrack_core::store::SqliteStore;

/// The service as the CLI runs it: SQLite-backed, on the system clock.
pub(crate) type Service = LeanTrackService<SqliteStore>;

pub(crate) use goals::{GoalChanges, cmd_goals_set, cmd_goals_show};
pub(crate) use history::cmd_history;
pub(crate) use log::{LogArgs, cmd_add, cmd_log};
pub(crate) use profile::{OnboardArgs, cmd_onboard, cmd_profile_set, cmd_profile_show};
pub(crate) use today::{cmd_bmi, cmd_today};
pub(crate) use transfer::{cmd_export, cmd_import};
pub(crate) use units::{UnitChanges, cmd_units_set, cmd_units_show};
pub(crate) use watch::cmd_watch;
