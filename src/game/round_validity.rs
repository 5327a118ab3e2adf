//! Decides whether a round's fixtures look like real, scheduled data or like
//! the placeholder stubs the provider publishes for rounds it has not
//! populated yet.
//!
//! Placeholder rounds typically repeat one timestamp for every fixture, so the
//! spread of kickoff slots is the strongest signal that real data landed.

use chrono::{Datelike, NaiveDateTime, Weekday};
use serde::Serialize;
use std::collections::HashMap;

use crate::game::kickoff::{is_placeholder_time, is_realistic_kickoff, parse_kickoff};
use crate::models::match_data::{Match, TeamInfo};

/// Share of fixtures that must carry a real kickoff and real teams
pub const MIN_WELL_FORMED_SHARE: f64 = 0.75;
/// No single (weekday, time) slot may hold more than this share of fixtures
pub const MAX_SLOT_SHARE: f64 = 0.70;
pub const MIN_DISTINCT_SLOTS: usize = 2;

const PLACEHOLDER_TEAM_NAMES: [&str; 8] = ["tbd", "tba", "tbc", "n/a", "na", "?", "-", "unknown"];
const PLACEHOLDER_TEAM_PREFIXES: [&str; 6] = ["winner ", "loser ", "runner-up", "runner up", "group ", "match "];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundValidity {
    pub valid: bool,
    pub total: usize,
    pub well_formed: usize,
    pub distinct_slots: usize,
    pub largest_slot_share: f64,
}

pub fn is_valid_round(matches: &[Match]) -> bool {
    assess_round(matches).valid
}

pub fn assess_round(matches: &[Match]) -> RoundValidity {
    let total = matches.len();
    if total == 0 {
        return RoundValidity {
            valid: false,
            total,
            well_formed: 0,
            distinct_slots: 0,
            largest_slot_share: 0.0,
        };
    }

    let kickoffs: Vec<Option<NaiveDateTime>> = matches.iter().map(|m| parse_kickoff(&m.kickoff)).collect();

    let well_formed = matches
        .iter()
        .zip(&kickoffs)
        .filter(|(m, kickoff)| {
            kickoff.is_some_and(|k| !is_placeholder_time(&k) && is_realistic_kickoff(&k))
                && is_populated_team(&m.home)
                && is_populated_team(&m.away)
        })
        .count();

    let mut slots: HashMap<(Weekday, String), usize> = HashMap::new();
    for kickoff in kickoffs.iter().flatten() {
        let slot = (kickoff.weekday(), kickoff.format("%H:%M").to_string());
        *slots.entry(slot).or_insert(0) += 1;
    }
    let distinct_slots = slots.len();
    let largest_slot = slots.values().copied().max().unwrap_or(0);
    let largest_slot_share = largest_slot as f64 / total as f64;

    let valid = (well_formed as f64 / total as f64) >= MIN_WELL_FORMED_SHARE
        && distinct_slots >= MIN_DISTINCT_SLOTS
        && largest_slot_share <= MAX_SLOT_SHARE;

    RoundValidity {
        valid,
        total,
        well_formed,
        distinct_slots,
        largest_slot_share,
    }
}

/// Team metadata is populated when the id, name and short name are present
/// and the name is not a bracket placeholder such as "Winner Group A".
pub fn is_populated_team(team: &TeamInfo) -> bool {
    let name = team.name.trim().to_lowercase();
    let short_name_present = team
        .short_name
        .as_deref()
        .is_some_and(|s| !s.trim().is_empty());

    !team.id.trim().is_empty()
        && !name.is_empty()
        && short_name_present
        && !PLACEHOLDER_TEAM_NAMES.contains(&name.as_str())
        && !PLACEHOLDER_TEAM_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}
