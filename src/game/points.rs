use serde::{Deserialize, Serialize};

use crate::models::match_data::{MatchScorers, Scores};
use crate::models::prediction::Prediction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchOutcome {
    Home,
    Away,
    Draw,
}

impl MatchOutcome {
    pub fn from_scores(scores: &Scores) -> Self {
        if scores[0] > scores[1] {
            MatchOutcome::Home
        } else if scores[1] > scores[0] {
            MatchOutcome::Away
        } else {
            MatchOutcome::Draw
        }
    }
}

/// Scoring weights applied to every prediction. Exact score and outcome are
/// exclusive: an exact hit earns `exact_score_points` only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsConfiguration {
    pub exact_score_points: i32,
    pub outcome_points: i32,
    /// Per correctly predicted scorer, per side. Zero disables the bonus.
    #[serde(default)]
    pub scorer_points: i32,
}

impl Default for PointsConfiguration {
    fn default() -> Self {
        Self {
            exact_score_points: 3,
            outcome_points: 1,
            scorer_points: 5,
        }
    }
}

impl PointsConfiguration {
    /// Plain exact/outcome rules with no scorer bonus
    pub fn outcome_only() -> Self {
        Self {
            scorer_points: 0,
            ..Self::default()
        }
    }

    /// Points for the scoreline alone
    pub fn result_points(&self, predicted: &Scores, actual: &Scores) -> i32 {
        if predicted == actual {
            self.exact_score_points
        } else if MatchOutcome::from_scores(predicted) == MatchOutcome::from_scores(actual) {
            self.outcome_points
        } else {
            0
        }
    }

    /// Bonus for scorer picks found among the reported scorers of that side
    pub fn scorer_bonus(&self, prediction: &Prediction, scorers: &MatchScorers) -> i32 {
        if self.scorer_points == 0 {
            return 0;
        }
        let Some(picks) = &prediction.scorers else {
            return 0;
        };

        let mut bonus = 0;
        if picks.home.as_deref().is_some_and(|pick| contains_player(&scorers.home, pick)) {
            bonus += self.scorer_points;
        }
        if picks.away.as_deref().is_some_and(|pick| contains_player(&scorers.away, pick)) {
            bonus += self.scorer_points;
        }
        bonus
    }

    pub fn points_for(&self, prediction: &Prediction, actual: &Scores, scorers: &MatchScorers) -> i32 {
        self.result_points(&prediction.scores, actual) + self.scorer_bonus(prediction, scorers)
    }
}

fn contains_player(scorers: &[String], pick: &str) -> bool {
    let pick = pick.trim();
    !pick.is_empty() && scorers.iter().any(|name| name.trim().eq_ignore_ascii_case(pick))
}
