// src/models/match_data.rs
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scoreline as `[home, away]`
pub type Scores = [i32; 2];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Scheduled,
    Live,
    Finished,
}

impl MatchStatus {
    /// Provider wire codes: 1 = scheduled, 2 = live, 3 = finished
    pub fn from_provider_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(MatchStatus::Scheduled),
            2 => Some(MatchStatus::Live),
            3 => Some(MatchStatus::Finished),
            _ => None,
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStatus::Scheduled => write!(f, "scheduled"),
            MatchStatus::Live => write!(f, "live"),
            MatchStatus::Finished => write!(f, "finished"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TeamInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
}

impl TeamInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>, short_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            short_name: Some(short_name.into()),
            logo: None,
        }
    }
}

/// Goal scorers reported by the provider, per side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MatchScorers {
    #[serde(default)]
    pub home: Vec<String>,
    #[serde(default)]
    pub away: Vec<String>,
}

/// A fixture as reported by the match data provider. Never persisted, only
/// referenced by `id` from predictions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: String,
    pub round: u32,
    pub home: TeamInfo,
    pub away: TeamInfo,
    pub scores: Option<Scores>,
    pub status: MatchStatus,
    /// Local wall-clock kickoff, `DD-MM-YYYY HH:MM`
    pub kickoff: String,
    #[serde(default)]
    pub scorers: MatchScorers,
}

impl Match {
    pub fn is_live(&self) -> bool {
        self.status == MatchStatus::Live
    }

    pub fn is_finished(&self) -> bool {
        self.status == MatchStatus::Finished
    }
}

/// Match counts of a round grouped by status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RoundTally {
    pub total: usize,
    pub finished: usize,
    pub live: usize,
    pub scheduled: usize,
}

impl RoundTally {
    pub fn from_matches(matches: &[Match]) -> Self {
        matches.iter().fold(RoundTally::default(), |mut tally, m| {
            tally.total += 1;
            match m.status {
                MatchStatus::Finished => tally.finished += 1,
                MatchStatus::Live => tally.live += 1,
                MatchStatus::Scheduled => tally.scheduled += 1,
            }
            tally
        })
    }

    pub fn all_finished(&self) -> bool {
        self.total > 0 && self.finished == self.total
    }
}

// ---------------------------------------------------------------------------
// Provider wire format
// ---------------------------------------------------------------------------

/// Body returned by the provider for `GET <round url>`
#[derive(Debug, Deserialize)]
pub struct ProviderRoundPayload {
    #[serde(default)]
    pub matches: Vec<ProviderMatch>,
}

/// Identifiers arrive either as strings or as bare numbers
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ProviderId {
    Text(String),
    Number(i64),
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderId::Text(s) => write!(f, "{}", s),
            ProviderId::Number(n) => write!(f, "{}", n),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProviderTeam {
    pub id: Option<ProviderId>,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "shortName")]
    pub short_name: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
}

impl From<ProviderTeam> for TeamInfo {
    fn from(team: ProviderTeam) -> Self {
        TeamInfo {
            id: team.id.map(|id| id.to_string()).unwrap_or_default(),
            name: team.name.trim().to_string(),
            short_name: team.short_name.map(|s| s.trim().to_string()),
            logo: team.logo,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ProviderMatch {
    pub id: ProviderId,
    #[serde(default)]
    pub round: Option<u32>,
    #[serde(alias = "homeTeam")]
    pub home_team: ProviderTeam,
    #[serde(alias = "awayTeam")]
    pub away_team: ProviderTeam,
    #[serde(default)]
    pub scores: Option<Vec<i32>>,
    pub status: u8,
    #[serde(alias = "date")]
    pub kickoff: String,
    #[serde(default)]
    pub scorers: Option<MatchScorers>,
}

impl ProviderMatch {
    /// Converts the wire representation, falling back to the requested round
    /// when the payload omits it. Unknown status codes and malformed score
    /// vectors are rejected.
    pub fn into_match(self, requested_round: u32) -> Result<Match, String> {
        let status = MatchStatus::from_provider_code(self.status)
            .ok_or_else(|| format!("match {}: unknown status code {}", self.id, self.status))?;

        let scores = match self.scores {
            None => None,
            Some(values) if values.is_empty() => None,
            Some(values) if values.len() == 2 => Some([values[0], values[1]]),
            Some(values) => {
                return Err(format!(
                    "match {}: expected 2 score values, got {}",
                    self.id,
                    values.len()
                ))
            }
        };

        Ok(Match {
            id: self.id.to_string(),
            round: self.round.unwrap_or(requested_round),
            home: self.home_team.into(),
            away: self.away_team.into(),
            scores,
            status,
            kickoff: self.kickoff.trim().to_string(),
            scorers: self.scorers.unwrap_or_default(),
        })
    }
}
