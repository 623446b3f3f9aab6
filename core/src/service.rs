use std::path::Path;

use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::Serialize;

use crate::day::{
    self, Clock, DAY_KEY_PREFIX, DayTracker, SystemClock, date_from_storage_key, day_key,
};
use crate::metrics::{
    self, ActivityEstimate, BmiCategory, GoalProgress, TargetProgress, bmi_category,
};
use crate::models::{
    DailyRecord, Goals, INTAKES, Intake, Profile, UnitPreference, validate_goals,
    validate_measurement, validate_profile,
};
use crate::store::{
    GOALS_KEY, KeyValueStore, MemoryStore, PROFILE_KEY, SqliteStore, UNITS_KEY, WELCOMED_KEY,
    load_json, save_json,
};

/// Fields to overwrite on the active day. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordUpdate {
    pub weight: Option<f64>,
    pub calories: Option<u32>,
    pub water: Option<u32>,
    pub protein: Option<u32>,
    pub steps: Option<u32>,
    pub minutes: Option<u32>,
    pub distance_km: Option<f64>,
}

impl RecordUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn validate(&self) -> Result<()> {
        if let Some(w) = self.weight {
            validate_measurement("Weight", w)?;
        }
        if let Some(d) = self.distance_km {
            validate_measurement("Distance", d)?;
        }
        Ok(())
    }

    fn apply(&self, record: &mut DailyRecord) {
        if self.weight.is_some() {
            record.weight = self.weight;
        }
        if self.calories.is_some() {
            record.calories = self.calories;
        }
        if self.water.is_some() {
            record.water = self.water;
        }
        if self.protein.is_some() {
            record.protein = self.protein;
        }
        if self.steps.is_some() {
            record.steps = self.steps;
        }
        if self.minutes.is_some() {
            record.minutes = self.minutes;
        }
        if self.distance_km.is_some() {
            record.distance_km = self.distance_km;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub date: NaiveDate,
    pub label: String,
    pub record: DailyRecord,
    pub activity: ActivityEstimate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeStatus {
    pub intake: Intake,
    pub value: u32,
    /// `None` when no daily target is set.
    pub progress: Option<TargetProgress>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub date: NaiveDate,
    pub record: DailyRecord,
    pub weight_kg: Option<f64>,
    pub bmi: Option<f64>,
    pub bmi_category: Option<BmiCategory>,
    pub activity: ActivityEstimate,
    pub goal: Option<GoalProgress>,
    pub intakes: Vec<IntakeStatus>,
}

fn activity_for(record: &DailyRecord, profile: Option<&Profile>) -> ActivityEstimate {
    metrics::estimate_activity(
        record.effective_weight_kg(profile),
        record.distance_km,
        record.minutes.map(f64::from),
        record.steps.map(f64::from),
    )
}

pub struct LeanTrackService<S: KeyValueStore, C: Clock = SystemClock> {
    store: S,
    clock: C,
    tracker: DayTracker,
}

impl LeanTrackService<SqliteStore> {
    pub fn open(db_path: &Path) -> Result<Self> {
        Self::with_clock(SqliteStore::open(db_path)?, SystemClock)
    }
}

impl LeanTrackService<MemoryStore> {
    pub fn new_in_memory() -> Result<Self> {
        Self::with_clock(MemoryStore::new(), SystemClock)
    }
}

impl<S: KeyValueStore, C: Clock> LeanTrackService<S, C> {
    pub fn with_clock(store: S, clock: C) -> Result<Self> {
        let tracker = DayTracker::start(&store, &clock.now())?;
        Ok(Self {
            store,
            clock,
            tracker,
        })
    }

    // --- Profile & onboarding ---

    pub fn profile(&self) -> Result<Option<Profile>> {
        load_json(&self.store, PROFILE_KEY)
    }

    pub fn save_profile(&mut self, profile: &Profile) -> Result<()> {
        validate_profile(profile)?;
        save_json(&mut self.store, PROFILE_KEY, profile)
    }

    pub fn is_onboarded(&self) -> Result<bool> {
        Ok(self.profile()?.is_some_and(|p| p.is_complete()))
    }

    /// Fails with a hint when no complete profile exists yet.
    pub fn require_profile(&self) -> Result<Profile> {
        match self.profile()? {
            Some(p) if p.is_complete() => Ok(p),
            _ => bail!("No profile yet. Run `leantrack onboard` first"),
        }
    }

    /// Save the profile and optional target weight, and arm the one-time
    /// greeting.
    pub fn complete_onboarding(
        &mut self,
        profile: &Profile,
        target_weight_kg: Option<f64>,
    ) -> Result<()> {
        validate_profile(profile)?;
        let mut goals = self.goals()?;
        goals.target_weight_kg = target_weight_kg;
        validate_goals(&goals)?;

        save_json(&mut self.store, PROFILE_KEY, profile)?;
        save_json(&mut self.store, GOALS_KEY, &goals)?;
        self.store.set(WELCOMED_KEY, "0")?;
        tracing::info!(name = %profile.name, "onboarding complete");
        Ok(())
    }

    /// Advance the launch counter and return a greeting on the second launch
    /// after onboarding only.
    pub fn take_greeting(&mut self) -> Result<Option<&'static str>> {
        let launches = self
            .store
            .get(WELCOMED_KEY)?
            .and_then(|raw| raw.trim().parse::<u32>().ok());
        match launches {
            Some(0) => {
                self.store.set(WELCOMED_KEY, "1")?;
                Ok(None)
            }
            Some(1) => {
                self.store.set(WELCOMED_KEY, "2")?;
                Ok(Some(day::greeting_at(&self.clock.now())))
            }
            _ => Ok(None),
        }
    }

    // --- Goals & units ---

    pub fn goals(&self) -> Result<Goals> {
        Ok(load_json(&self.store, GOALS_KEY)?.unwrap_or_default())
    }

    pub fn save_goals(&mut self, goals: &Goals) -> Result<()> {
        validate_goals(goals)?;
        save_json(&mut self.store, GOALS_KEY, goals)
    }

    pub fn units(&self) -> Result<UnitPreference> {
        Ok(load_json(&self.store, UNITS_KEY)?.unwrap_or_default())
    }

    pub fn save_units(&mut self, units: &UnitPreference) -> Result<()> {
        save_json(&mut self.store, UNITS_KEY, units)
    }

    // --- Active day ---

    /// Roll the active day over if local midnight has passed.
    pub fn refresh(&mut self) -> Result<bool> {
        let now = self.clock.now();
        self.tracker.tick(&self.store, &now)
    }

    pub fn active_date(&mut self) -> Result<NaiveDate> {
        self.refresh()?;
        Ok(self.tracker.active_date())
    }

    pub fn today(&mut self) -> Result<DailyRecord> {
        self.refresh()?;
        Ok(self.tracker.record().clone())
    }

    /// Apply `change` to today's record and persist it.
    pub fn update_today<F, T>(&mut self, change: F) -> Result<T>
    where
        F: FnOnce(&mut DailyRecord) -> T,
    {
        self.refresh()?;
        self.tracker.reload(&self.store)?;
        self.tracker.update(&mut self.store, change)
    }

    pub fn log_today(&mut self, update: &RecordUpdate) -> Result<DailyRecord> {
        update.validate()?;
        self.update_today(|record| {
            update.apply(record);
            record.clone()
        })
    }

    /// Add `delta` (negative to remove) to one intake counter. Returns the new total.
    pub fn add_intake(&mut self, intake: Intake, delta: i64) -> Result<u32> {
        let total = self.update_today(|record| record.adjust_intake(intake, delta))?;
        tracing::debug!(intake = intake.label(), delta, total, "intake adjusted");
        Ok(total)
    }

    // --- History ---

    pub fn record_for(&self, date: NaiveDate) -> Result<Option<DailyRecord>> {
        load_json(&self.store, &day_key(date))
    }

    /// Every stored day record, oldest first. Unreadable records are skipped.
    pub fn all_records(&self) -> Result<Vec<(NaiveDate, DailyRecord)>> {
        let mut records = Vec::new();
        for key in self.store.keys_with_prefix(DAY_KEY_PREFIX)? {
            let Some(date) = date_from_storage_key(&key) else {
                tracing::warn!(key, "skipping day record with unparseable key");
                continue;
            };
            if let Some(record) = load_json::<DailyRecord>(&self.store, &key)? {
                records.push((date, record));
            }
        }
        Ok(records)
    }

    /// Day records newest first, each with its estimated activity burn.
    pub fn history(&self, limit: Option<usize>) -> Result<Vec<HistoryEntry>> {
        let profile = self.profile()?;
        let entries = self
            .all_records()?
            .into_iter()
            .rev()
            .take(limit.unwrap_or(usize::MAX))
            .map(|(date, record)| HistoryEntry {
                date,
                label: day::format_short_date(date),
                activity: activity_for(&record, profile.as_ref()),
                record,
            })
            .collect();
        Ok(entries)
    }

    /// Overwrite stored records with imported ones. Returns how many were written.
    pub fn import_records(&mut self, records: &[(NaiveDate, DailyRecord)]) -> Result<usize> {
        for (date, record) in records {
            save_json(&mut self.store, &day_key(*date), record)?;
        }
        self.tracker.reload(&self.store)?;
        tracing::info!(count = records.len(), "imported day records");
        Ok(records.len())
    }

    // --- Derived metrics ---

    pub fn dashboard(&mut self) -> Result<Dashboard> {
        let date = self.active_date()?;
        let record = self.tracker.record().clone();
        let profile = self.profile()?;
        let goals = self.goals()?;

        let weight_kg = record.effective_weight_kg(profile.as_ref());
        let height_cm = profile.as_ref().and_then(|p| p.height_cm);
        let bmi = metrics::bmi(weight_kg, height_cm);
        let goal = metrics::goal_progress(
            profile.as_ref().and_then(|p| p.start_weight_kg),
            goals.target_weight_kg,
            record.weight,
        );
        let intakes = INTAKES
            .iter()
            .map(|&intake| IntakeStatus {
                intake,
                value: record.intake(intake).unwrap_or(0),
                progress: metrics::target_progress(record.intake(intake), intake.target(&goals)),
            })
            .collect();

        Ok(Dashboard {
            date,
            weight_kg,
            bmi,
            bmi_category: bmi.map(bmi_category),
            activity: activity_for(&record, profile.as_ref()),
            goal,
            intakes,
            record,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::day::ManualClock;
    use crate::metrics::{ActivitySignal, GoalDirection};

    fn sample_profile() -> Profile {
        Profile {
            name: "Max".to_string(),
            age: Some(34),
            height_cm: Some(180.0),
            start_weight_kg: Some(90.0),
        }
    }

    fn service_at(rfc3339: &str) -> (LeanTrackService<MemoryStore, ManualClock>, ManualClock) {
        let clock = ManualClock::at(rfc3339);
        let svc = LeanTrackService::with_clock(MemoryStore::new(), clock.clone()).unwrap();
        (svc, clock)
    }

    #[test]
    fn test_new_in_memory_starts_empty() {
        let mut svc = LeanTrackService::new_in_memory().unwrap();
        assert!(!svc.is_onboarded().unwrap());
        assert_eq!(svc.goals().unwrap(), Goals::default());
        assert_eq!(svc.units().unwrap(), UnitPreference::default());
        assert!(svc.today().unwrap().is_empty());
    }

    #[test]
    fn test_onboarding_gate() {
        let (mut svc, _) = service_at("2024-06-15T09:00:00+02:00");
        assert!(!svc.is_onboarded().unwrap());
        assert!(svc.require_profile().is_err());

        let incomplete = Profile {
            height_cm: None,
            ..sample_profile()
        };
        assert!(svc.complete_onboarding(&incomplete, Some(80.0)).is_err());
        assert!(!svc.is_onboarded().unwrap());

        svc.complete_onboarding(&sample_profile(), Some(80.0)).unwrap();
        assert!(svc.is_onboarded().unwrap());
        assert_eq!(svc.goals().unwrap().target_weight_kg, Some(80.0));
        assert_eq!(svc.goals().unwrap().daily_calories, Some(2000));
    }

    #[test]
    fn test_greeting_shown_once_on_second_launch() {
        let (mut svc, _) = service_at("2024-06-15T09:00:00+02:00");
        assert_eq!(svc.take_greeting().unwrap(), None);

        svc.complete_onboarding(&sample_profile(), None).unwrap();
        assert_eq!(svc.take_greeting().unwrap(), None);
        assert_eq!(svc.take_greeting().unwrap(), Some("Good morning"));
        assert_eq!(svc.take_greeting().unwrap(), None);
    }

    #[test]
    fn test_goals_and_units_defaults() {
        let (mut svc, _) = service_at("2024-06-15T09:00:00+00:00");
        assert_eq!(svc.goals().unwrap(), Goals::default());
        assert_eq!(svc.units().unwrap(), UnitPreference::default());

        let units = UnitPreference::for_system(crate::units::MeasurementSystem::Uk);
        svc.save_units(&units).unwrap();
        assert_eq!(svc.units().unwrap(), units);

        let bad = Goals {
            target_weight_kg: Some(-5.0),
            ..Goals::default()
        };
        assert!(svc.save_goals(&bad).is_err());
    }

    #[test]
    fn test_add_intake_creates_record_lazily() {
        let (mut svc, _) = service_at("2024-06-15T09:00:00+00:00");
        let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert_eq!(svc.record_for(date).unwrap(), None);

        assert_eq!(svc.add_intake(Intake::Water, 500).unwrap(), 500);
        assert_eq!(svc.add_intake(Intake::Water, 250).unwrap(), 750);
        assert_eq!(svc.add_intake(Intake::Protein, -10).unwrap(), 0);

        let stored = svc.record_for(date).unwrap().unwrap();
        assert_eq!(stored.water, Some(750));
        assert_eq!(stored.protein, Some(0));
        assert_eq!(stored.calories, None);
    }

    #[test]
    fn test_log_today_rejects_negative() {
        let (mut svc, _) = service_at("2024-06-15T09:00:00+00:00");
        let update = RecordUpdate {
            weight: Some(-80.0),
            ..RecordUpdate::default()
        };
        assert!(svc.log_today(&update).is_err());
        assert!(svc.today().unwrap().is_empty());

        let update = RecordUpdate {
            weight: Some(88.5),
            steps: Some(6000),
            ..RecordUpdate::default()
        };
        let record = svc.log_today(&update).unwrap();
        assert_eq!(record.weight, Some(88.5));
        assert_eq!(record.steps, Some(6000));

        // Untouched fields survive a later partial update
        let update = RecordUpdate {
            minutes: Some(30),
            ..RecordUpdate::default()
        };
        let record = svc.log_today(&update).unwrap();
        assert_eq!(record.weight, Some(88.5));
        assert_eq!(record.minutes, Some(30));
    }

    #[test]
    fn test_writes_follow_rollover() {
        let (mut svc, clock) = service_at("2024-06-15T23:59:00+02:00");
        svc.add_intake(Intake::Calories, 500).unwrap();

        clock.set("2024-06-16T00:01:00+02:00");
        assert!(svc.today().unwrap().is_empty());
        svc.add_intake(Intake::Calories, 100).unwrap();

        let d1 = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 6, 16).unwrap();
        assert_eq!(svc.record_for(d1).unwrap().unwrap().calories, Some(500));
        assert_eq!(svc.record_for(d2).unwrap().unwrap().calories, Some(100));
        assert_eq!(svc.active_date().unwrap(), d2);
    }

    #[test]
    fn test_history_newest_first_with_burn() {
        let (mut svc, clock) = service_at("2024-06-14T10:00:00+00:00");
        svc.complete_onboarding(&sample_profile(), None).unwrap();
        svc.log_today(&RecordUpdate {
            weight: Some(80.0),
            distance_km: Some(5.0),
            ..RecordUpdate::default()
        })
        .unwrap();

        clock.set("2024-06-15T10:00:00+00:00");
        svc.log_today(&RecordUpdate {
            steps: Some(10_000),
            ..RecordUpdate::default()
        })
        .unwrap();

        let history = svc.history(None).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].date, NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());
        assert_eq!(history[0].label, "15 Jun 2024");
        // No weight logged that day: falls back to the 90 kg start weight
        // 90 * 0.8 * (10000 * 0.00075) = 540
        assert_eq!(history[0].activity.kcal, 540);
        assert_eq!(history[0].activity.signal, ActivitySignal::Steps);
        // 80 * 0.8 * 5 = 320
        assert_eq!(history[1].activity.kcal, 320);

        assert_eq!(svc.history(Some(1)).unwrap().len(), 1);
    }

    #[test]
    fn test_history_skips_malformed_records() {
        let mut store = MemoryStore::new();
        store.set("lt_day_2024-06-13", "{broken").unwrap();
        store.set("lt_day_2024-06-14", r#"{"calories":"1800"}"#).unwrap();
        store.set("lt_day_oops", "{}").unwrap();
        let svc =
            LeanTrackService::with_clock(store, ManualClock::at("2024-06-15T10:00:00+00:00"))
                .unwrap();

        let history = svc.history(None).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].record.calories, Some(1800));
    }

    #[test]
    fn test_dashboard() {
        let (mut svc, _) = service_at("2024-06-15T10:00:00+00:00");
        svc.complete_onboarding(&sample_profile(), Some(80.0)).unwrap();
        svc.log_today(&RecordUpdate {
            weight: Some(85.0),
            calories: Some(1500),
            minutes: Some(30),
            ..RecordUpdate::default()
        })
        .unwrap();

        let dash = svc.dashboard().unwrap();
        // 85 / 1.8^2 = 26.23
        assert_eq!(dash.bmi, Some(26.2));
        assert_eq!(dash.bmi_category, Some(BmiCategory::Overweight));
        let goal = dash.goal.unwrap();
        assert_eq!(goal.percent, 50);
        assert_eq!(goal.direction, GoalDirection::Lose);
        // (3.3 * 3.5 * 85 / 200) * 30 = 147.26
        assert_eq!(dash.activity.kcal, 147);

        let calories = &dash.intakes[0];
        assert_eq!(calories.intake, Intake::Calories);
        assert_eq!(calories.progress.unwrap().percent, 75);
        let water = &dash.intakes[1];
        assert_eq!(water.value, 0);
        assert_eq!(water.progress.unwrap().percent, 0);
    }

    #[test]
    fn test_dashboard_without_profile() {
        let (mut svc, _) = service_at("2024-06-15T10:00:00+00:00");
        let dash = svc.dashboard().unwrap();
        assert_eq!(dash.bmi, None);
        assert_eq!(dash.bmi_category, None);
        assert_eq!(dash.goal, None);
        assert_eq!(dash.activity.kcal, 0);
    }

    #[test]
    fn test_import_records_refreshes_active_day() {
        let (mut svc, _) = service_at("2024-06-15T10:00:00+00:00");
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let earlier = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let imported = vec![
            (
                earlier,
                DailyRecord {
                    weight: Some(91.0),
                    ..DailyRecord::default()
                },
            ),
            (
                today,
                DailyRecord {
                    water: Some(1000),
                    ..DailyRecord::default()
                },
            ),
        ];
        assert_eq!(svc.import_records(&imported).unwrap(), 2);
        assert_eq!(svc.today().unwrap().water, Some(1000));
        assert_eq!(svc.all_records().unwrap().len(), 2);
    }
}
