//! Kickoff timestamps and the tournament-local wall clock.
//!
//! The provider reports kickoffs as local wall-clock strings
//! (`DD-MM-YYYY HH:MM`) without an offset, so every comparison here is done
//! on naive local values.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;

use crate::models::match_data::Match;

pub const KICKOFF_FORMAT: &str = "%d-%m-%Y %H:%M";

/// Earliest and latest plausible kickoff hour (inclusive)
pub const EARLIEST_KICKOFF_HOUR: u32 = 10;
pub const LATEST_KICKOFF_HOUR: u32 = 23;
/// Real fixtures start on the quarter hour
pub const KICKOFF_MINUTE_STEP: u32 = 15;

pub fn parse_kickoff(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), KICKOFF_FORMAT).ok()
}

/// Midnight is what the provider writes before a fixture has a real slot
pub fn is_placeholder_time(kickoff: &NaiveDateTime) -> bool {
    kickoff.hour() == 0 && kickoff.minute() == 0
}

pub fn is_realistic_kickoff(kickoff: &NaiveDateTime) -> bool {
    (EARLIEST_KICKOFF_HOUR..=LATEST_KICKOFF_HOUR).contains(&kickoff.hour())
        && kickoff.minute() % KICKOFF_MINUTE_STEP == 0
}

pub fn local_now(tz: &Tz) -> NaiveDateTime {
    Utc::now().with_timezone(tz).naive_local()
}

pub fn local_date(tz: &Tz, at: DateTime<Utc>) -> NaiveDate {
    at.with_timezone(tz).date_naive()
}

pub fn kicks_off_on(fixture: &Match, date: NaiveDate) -> bool {
    parse_kickoff(&fixture.kickoff).is_some_and(|kickoff| kickoff.date() == date)
}

/// Whether `time` falls inside `[start_hour:00, end_hour:00]`. Windows where
/// the end hour is smaller than the start hour wrap past midnight, e.g.
/// 15 -> 1 covers 15:00 through 01:00.
pub fn in_sweep_window(time: NaiveTime, start_hour: u32, end_hour: u32) -> bool {
    let minutes = time.hour() * 60 + time.minute();
    let start = start_hour * 60;
    let end = end_hour * 60;

    if start <= end {
        minutes >= start && minutes <= end
    } else {
        minutes >= start || minutes <= end
    }
}
