use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::points::{MembershipPoints, RoundPoints};
use crate::models::ranking::RankingEntry;

/// Orders by total points descending, then by the earlier tiebreak time.
/// Entries without a tiebreak time go after those with one.
fn compare_entries(a: &RankingEntry, b: &RankingEntry) -> Ordering {
    b.total
        .cmp(&a.total)
        .then_with(|| match (a.tiebreak_at, b.tiebreak_at) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.user_id.cmp(&b.user_id))
}

fn assign_positions(mut entries: Vec<RankingEntry>) -> Vec<RankingEntry> {
    entries.sort_by(compare_entries);
    for (index, entry) in entries.iter_mut().enumerate() {
        entry.position = index + 1;
    }
    entries
}

/// Round ranking: per-round final plus live points, ties broken by the
/// user's earliest prediction submitted for that round.
pub fn rank_round(
    rows: &[RoundPoints],
    first_submissions: &HashMap<Uuid, DateTime<Utc>>,
) -> Vec<RankingEntry> {
    let entries = rows
        .iter()
        .map(|row| RankingEntry {
            position: 0,
            user_id: row.user_id,
            points: row.points,
            live_points: row.live_points,
            total: row.points + row.live_points,
            tiebreak_at: first_submissions.get(&row.user_id).copied(),
        })
        .collect();
    assign_positions(entries)
}

/// Tournament ranking: running final plus live points, ties broken by the
/// earliest join.
pub fn rank_tournament(rows: &[MembershipPoints]) -> Vec<RankingEntry> {
    let entries = rows
        .iter()
        .map(|row| RankingEntry {
            position: 0,
            user_id: row.user_id,
            points: row.points,
            live_points: row.live_points,
            total: row.points + row.live_points,
            tiebreak_at: Some(row.joined_at),
        })
        .collect();
    assign_positions(entries)
}
