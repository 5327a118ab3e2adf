use chrono::{DateTime, Duration, NaiveDate, Utc};
use uuid::Uuid;

use matchday_engine::game::kickoff::{local_now, KICKOFF_FORMAT};
use matchday_engine::models::match_data::{Match, MatchScorers, MatchStatus, Scores, TeamInfo};
use matchday_engine::models::prediction::{PredictedScorers, Prediction};

use super::utils::TIMEZONE;

const SLOT_TIMES: [(u32, u32); 4] = [(14, 0), (16, 15), (18, 30), (21, 0)];

/// Saturday the first round is played on
pub fn season_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 7).unwrap()
}

pub fn team(n: usize) -> TeamInfo {
    TeamInfo::new(format!("team-{}", n), format!("Club {}", n), format!("C{:02}", n))
}

pub fn match_id(round: u32, index: usize) -> String {
    format!("r{}-m{}", round, index)
}

/// A fixture of `round` with a realistic kickoff spread over the weekend
pub fn fixture(round: u32, index: usize, status: MatchStatus, scores: Option<Scores>) -> Match {
    let date = season_start() + Duration::days(7 * (i64::from(round) - 1) + (index % 2) as i64);
    let (hour, minute) = SLOT_TIMES[index % SLOT_TIMES.len()];
    let kickoff = date.and_hms_opt(hour, minute, 0).unwrap().format(KICKOFF_FORMAT).to_string();

    Match {
        id: match_id(round, index),
        round,
        home: team(index * 2),
        away: team(index * 2 + 1),
        scores,
        status,
        kickoff,
        scorers: MatchScorers::default(),
    }
}

pub fn round_of(round: u32, count: usize, status: MatchStatus) -> Vec<Match> {
    let scores = match status {
        MatchStatus::Scheduled => None,
        _ => Some([1, 0]),
    };
    (0..count).map(|i| fixture(round, i, status, scores)).collect()
}

pub fn finished_round(round: u32) -> Vec<Match> {
    round_of(round, 4, MatchStatus::Finished)
}

pub fn scheduled_round(round: u32) -> Vec<Match> {
    round_of(round, 4, MatchStatus::Scheduled)
}

/// Stub data the provider publishes for rounds it has not populated:
/// every fixture at the same midnight slot between unknown teams
pub fn placeholder_round(round: u32) -> Vec<Match> {
    (0..4)
        .map(|i| Match {
            id: match_id(round, i),
            round,
            home: TeamInfo {
                id: String::new(),
                name: "TBD".to_string(),
                short_name: None,
                logo: None,
            },
            away: TeamInfo {
                id: String::new(),
                name: "TBD".to_string(),
                short_name: None,
                logo: None,
            },
            scores: None,
            status: MatchStatus::Scheduled,
            kickoff: "01-08-2026 00:00".to_string(),
            scorers: MatchScorers::default(),
        })
        .collect()
}

/// Kickoff string for today (tournament-local) at the given time
pub fn today_at(hour: u32, minute: u32) -> String {
    local_now(&TIMEZONE)
        .date()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
        .format(KICKOFF_FORMAT)
        .to_string()
}

pub fn at(minutes: i64) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z").unwrap().with_timezone(&Utc) + Duration::minutes(minutes)
}

pub fn prediction(match_id: &str, user_id: Uuid, scores: Scores, created_at: DateTime<Utc>) -> Prediction {
    Prediction {
        id: Uuid::new_v4(),
        match_id: match_id.to_string(),
        user_id,
        scores,
        scorers: None,
        processed: false,
        live_points: 0,
        created_at,
    }
}

pub fn prediction_with_scorers(
    match_id: &str,
    user_id: Uuid,
    scores: Scores,
    home: Option<&str>,
    away: Option<&str>,
) -> Prediction {
    Prediction {
        scorers: Some(PredictedScorers {
            home: home.map(str::to_string),
            away: away.map(str::to_string),
        }),
        ..prediction(match_id, user_id, scores, at(0))
    }
}
