//! Local calendar-date keying for day records and the rollover tracker that
//! keeps writes on the current local day.

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, FixedOffset, Local, NaiveDate, TimeZone, Timelike};

use crate::models::DailyRecord;
use crate::store::{KeyValueStore, load_json, save_json};

pub const DAY_KEY_PREFIX: &str = "lt_day_";

pub trait Clock {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// The device clock in the device's local zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// The calendar date of `instant` as seen in its own zone. Never converts
/// through UTC, so 00:30 local is already the new day.
#[must_use]
pub fn local_date<Tz: TimeZone>(instant: &DateTime<Tz>) -> NaiveDate {
    instant.date_naive()
}

/// `YYYY-MM-DD` from the instant's local calendar fields.
#[must_use]
pub fn local_date_key<Tz: TimeZone>(instant: &DateTime<Tz>) -> String {
    date_key(local_date(instant))
}

#[must_use]
pub fn date_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

pub fn parse_date_key(key: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(key, "%Y-%m-%d")
        .with_context(|| format!("Invalid date key '{key}'. Use YYYY-MM-DD"))
}

/// Storage key of the record for `date`.
#[must_use]
pub fn day_key(date: NaiveDate) -> String {
    format!("{DAY_KEY_PREFIX}{}", date_key(date))
}

/// The date encoded in a day record's storage key, if it is one.
#[must_use]
pub fn date_from_storage_key(key: &str) -> Option<NaiveDate> {
    key.strip_prefix(DAY_KEY_PREFIX)
        .and_then(|rest| parse_date_key(rest).ok())
}

/// Short human form, e.g. `15 Jun 2024`.
#[must_use]
pub fn format_short_date(date: NaiveDate) -> String {
    date.format("%-d %b %Y").to_string()
}

/// The stored record for `date`, or an empty one when absent or unreadable.
pub fn load_record(store: &impl KeyValueStore, date: NaiveDate) -> Result<DailyRecord> {
    Ok(load_json(store, &day_key(date))?.unwrap_or_default())
}

/// Holds the active local day and its record.
///
/// The active date only ever moves by [`DayTracker::tick`] observing that
/// the clock crossed local midnight. All writes go to the active date.
#[derive(Debug, Clone, PartialEq)]
pub struct DayTracker {
    active_date: NaiveDate,
    record: DailyRecord,
}

impl DayTracker {
    pub fn start<Tz: TimeZone>(store: &impl KeyValueStore, now: &DateTime<Tz>) -> Result<Self> {
        let active_date = local_date(now);
        let record = load_record(store, active_date)?;
        Ok(Self {
            active_date,
            record,
        })
    }

    #[must_use]
    pub fn active_date(&self) -> NaiveDate {
        self.active_date
    }

    #[must_use]
    pub fn record(&self) -> &DailyRecord {
        &self.record
    }

    /// Swap to the current local date if it differs from the active one.
    /// Returns whether a rollover happened.
    pub fn tick<Tz: TimeZone>(
        &mut self,
        store: &impl KeyValueStore,
        now: &DateTime<Tz>,
    ) -> Result<bool> {
        let today = local_date(now);
        if today == self.active_date {
            return Ok(false);
        }
        let record = load_record(store, today)?;
        tracing::debug!(from = %self.active_date, to = %today, "day rolled over");
        self.active_date = today;
        self.record = record;
        Ok(true)
    }

    /// Re-read the active record, picking up writes made elsewhere.
    pub fn reload(&mut self, store: &impl KeyValueStore) -> Result<()> {
        self.record = load_record(store, self.active_date)?;
        Ok(())
    }

    /// Apply `change` to the active record and persist it immediately.
    pub fn update<S, F, T>(&mut self, store: &mut S, change: F) -> Result<T>
    where
        S: KeyValueStore,
        F: FnOnce(&mut DailyRecord) -> T,
    {
        let result = change(&mut self.record);
        save_json(store, &day_key(self.active_date), &self.record)?;
        Ok(result)
    }
}

/// Time-of-day greeting for a local hour (0..=23).
#[must_use]
pub fn greeting(hour: u32) -> &'static str {
    match hour {
        0..=10 => "Good morning",
        11..=16 => "Good afternoon",
        17..=21 => "Good evening",
        _ => "Good night",
    }
}

#[must_use]
pub fn greeting_at<Tz: TimeZone>(instant: &DateTime<Tz>) -> &'static str {
    greeting(instant.hour())
}

/// A settable clock shared between a test and the code under test.
#[cfg(test)]
#[derive(Debug, Clone)]
pub(crate) struct ManualClock(std::rc::Rc<std::cell::Cell<DateTime<FixedOffset>>>);

#[cfg(test)]
impl ManualClock {
    pub(crate) fn at(rfc3339: &str) -> Self {
        let instant = DateTime::parse_from_rfc3339(rfc3339).unwrap();
        Self(std::rc::Rc::new(std::cell::Cell::new(instant)))
    }

    pub(crate) fn set(&self, rfc3339: &str) {
        self.0.set(DateTime::parse_from_rfc3339(rfc3339).unwrap());
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{KeyValueStore, MemoryStore};

    fn at(rfc3339: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap()
    }

    #[test]
    fn test_local_date_key_uses_local_fields() {
        // 23:30 UTC is already the next day at UTC+2
        assert_eq!(local_date_key(&at("2024-06-16T01:30:00+02:00")), "2024-06-16");
        // ...and still the previous day at UTC-5
        assert_eq!(local_date_key(&at("2024-06-15T18:30:00-05:00")), "2024-06-15");
        assert_eq!(local_date_key(&at("2024-01-05T00:00:00+00:00")), "2024-01-05");
    }

    #[test]
    fn test_key_stable_across_utc_midnight() {
        // UTC+9: crossing 00:00 UTC happens at 09:00 local
        let before = at("2024-06-15T08:59:00+09:00");
        let after = at("2024-06-15T09:01:00+09:00");
        assert_eq!(local_date_key(&before), local_date_key(&after));
    }

    #[test]
    fn test_key_changes_across_local_midnight() {
        let before = at("2024-06-15T23:59:59-07:00");
        let after = at("2024-06-16T00:00:01-07:00");
        assert_eq!(local_date_key(&before), "2024-06-15");
        assert_eq!(local_date_key(&after), "2024-06-16");
    }

    #[test]
    fn test_key_same_for_whole_local_day() {
        for offset in ["+05:00", "-08:00"] {
            let early = at(&format!("2024-06-15T00:30:00{offset}"));
            let late = at(&format!("2024-06-15T23:30:00{offset}"));
            assert_eq!((late - early).num_hours(), 23);
            assert_eq!(local_date_key(&early), "2024-06-15", "{offset}");
            assert_eq!(local_date_key(&late), "2024-06-15", "{offset}");
        }
    }

    #[test]
    fn test_keys_and_parsing() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(date_key(date), "2024-03-07");
        assert_eq!(day_key(date), "lt_day_2024-03-07");
        assert_eq!(parse_date_key("2024-03-07").unwrap(), date);
        assert!(parse_date_key("07/03/2024").is_err());
        assert_eq!(date_from_storage_key("lt_day_2024-03-07"), Some(date));
        assert_eq!(date_from_storage_key("lt_profile"), None);
        assert_eq!(date_from_storage_key("lt_day_garbage"), None);
        assert_eq!(format_short_date(date), "7 Mar 2024");
    }

    #[test]
    fn test_rollover_keeps_previous_day() {
        let mut store = MemoryStore::new();
        let mut tracker = DayTracker::start(&store, &at("2024-06-15T23:58:00+01:00")).unwrap();
        tracker
            .update(&mut store, |r| r.adjust_intake(crate::models::Intake::Calories, 500))
            .unwrap();

        // Same day: no change
        assert!(!tracker.tick(&store, &at("2024-06-15T23:59:00+01:00")).unwrap());
        assert_eq!(tracker.record().calories, Some(500));

        assert!(tracker.tick(&store, &at("2024-06-16T00:00:30+01:00")).unwrap());
        assert_eq!(tracker.active_date(), NaiveDate::from_ymd_opt(2024, 6, 16).unwrap());
        assert!(tracker.record().is_empty());

        let previous = load_record(&store, NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()).unwrap();
        assert_eq!(previous.calories, Some(500));
        assert_eq!(store.get("lt_day_2024-06-16").unwrap(), None);
    }

    #[test]
    fn test_rollover_loads_existing_record() {
        let mut store = MemoryStore::new();
        store.set("lt_day_2024-06-16", r#"{"water":"750"}"#).unwrap();
        let mut tracker = DayTracker::start(&store, &at("2024-06-15T12:00:00+00:00")).unwrap();
        assert!(tracker.tick(&store, &at("2024-06-16T08:00:00+00:00")).unwrap());
        assert_eq!(tracker.record().water, Some(750));
    }

    #[test]
    fn test_malformed_record_starts_empty() {
        let mut store = MemoryStore::new();
        store.set("lt_day_2024-06-15", "[1,2").unwrap();
        let tracker = DayTracker::start(&store, &at("2024-06-15T12:00:00+00:00")).unwrap();
        assert!(tracker.record().is_empty());
    }

    #[test]
    fn test_reload_picks_up_external_writes() {
        let mut store = MemoryStore::new();
        let mut tracker = DayTracker::start(&store, &at("2024-06-15T12:00:00+00:00")).unwrap();
        store.set("lt_day_2024-06-15", r#"{"steps":4000}"#).unwrap();
        tracker.reload(&store).unwrap();
        assert_eq!(tracker.record().steps, Some(4000));
    }

    #[test]
    fn test_greeting_hours() {
        assert_eq!(greeting(6), "Good morning");
        assert_eq!(greeting(10), "Good morning");
        assert_eq!(greeting(11), "Good afternoon");
        assert_eq!(greeting(16), "Good afternoon");
        assert_eq!(greeting(17), "Good evening");
        assert_eq!(greeting(21), "Good evening");
        assert_eq!(greeting(22), "Good night");
        assert_eq!(greeting(2), "Good morning");
        assert_eq!(greeting_at(&at("2024-06-15T13:00:00+02:00")), "Good afternoon");
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::at("2024-06-15T10:00:00+00:00");
        let shared = clock.clone();
        shared.set("2024-06-16T10:00:00+00:00");
        assert_eq!(local_date_key(&clock.now()), "2024-06-16");
    }
}
