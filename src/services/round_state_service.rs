use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::game::round_validity::{assess_round, is_valid_round};
use crate::models::match_data::{Match, RoundTally};
use crate::services::error_reporter::ErrorReporter;
use crate::services::match_provider::MatchProvider;

pub const DEFAULT_MAX_ROUNDS: u32 = 16;
/// Past this round a fetch failure ends the walk: rounds that far in that
/// cannot be fetched are treated as nonexistent
pub const FETCH_ERROR_TOLERANCE_ROUND: u32 = 3;

/// Why the calculator settled on a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DetectionReason {
    /// At least one match of the round is live
    LiveMatches,
    /// Round 1 has not started yet
    FirstRoundPending,
    /// The round has pending matches and the previous one is closed
    PendingAfterClosedRound,
    /// The previous round still has unfinished matches
    PreviousRoundOpen,
    /// A later round failed validation; `invalid_round` is the one that failed
    InvalidRoundAhead { invalid_round: u32 },
    /// A later round could not be fetched
    FetchFailedAhead { failed_round: u32 },
    /// Mixed status combination that fits none of the rules
    Defensive,
    /// Every fetched round is finished
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoundDetection {
    pub round: u32,
    #[serde(flatten)]
    pub reason: DetectionReason,
}

impl RoundDetection {
    fn new(round: u32, reason: DetectionReason) -> Self {
        Self { round, reason }
    }
}

struct WalkedRound {
    round: u32,
    matches: Vec<Match>,
}

/// Infers the authoritative current round by walking rounds 1..=max in order
pub struct RoundStateService {
    provider: Arc<dyn MatchProvider>,
    reporter: Arc<dyn ErrorReporter>,
    max_rounds: u32,
}

impl RoundStateService {
    pub fn new(provider: Arc<dyn MatchProvider>, reporter: Arc<dyn ErrorReporter>, max_rounds: u32) -> Self {
        Self {
            provider,
            reporter,
            max_rounds: max_rounds.max(1),
        }
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    pub async fn calculate_current_round(&self) -> u32 {
        self.detect_current_round().await.round
    }

    /// Walks the rounds and reports the decision together with its reason.
    /// Never fails: fetch errors degrade to the last valid round.
    pub async fn detect_current_round(&self) -> RoundDetection {
        let mut last_valid_round = 1;
        let mut previous: Option<WalkedRound> = None;

        for round in 1..=self.max_rounds {
            let matches = match self.provider.fetch_round(round).await {
                Ok(matches) => matches,
                Err(e) if round > FETCH_ERROR_TOLERANCE_ROUND => {
                    warn!("⚠️ Round {} could not be fetched ({}), falling back to round {}", round, e, last_valid_round);
                    self.reporter.report_error(
                        "round_state.fetch",
                        json!({ "round": round, "fallback_round": last_valid_round }),
                        &e,
                    );
                    return RoundDetection::new(
                        last_valid_round,
                        DetectionReason::FetchFailedAhead { failed_round: round },
                    );
                }
                Err(e) => {
                    warn!("⚠️ Skipping round {} after fetch error: {}", round, e);
                    self.reporter.report_error("round_state.fetch", json!({ "round": round, "skipped": true }), &e);
                    previous = None;
                    continue;
                }
            };

            if matches.is_empty() {
                debug!("Round {} has no matches, skipping", round);
                previous = None;
                continue;
            }

            let validity = assess_round(&matches);
            if !validity.valid {
                info!(
                    "Round {} looks like placeholder data ({}/{} well formed, {} slots, largest slot {:.0}%), keeping round {}",
                    round,
                    validity.well_formed,
                    validity.total,
                    validity.distinct_slots,
                    validity.largest_slot_share * 100.0,
                    last_valid_round
                );
                return RoundDetection::new(
                    last_valid_round,
                    DetectionReason::InvalidRoundAhead { invalid_round: round },
                );
            }
            last_valid_round = round;

            let tally = RoundTally::from_matches(&matches);
            debug!(
                "Round {}: {} finished, {} live, {} scheduled",
                round, tally.finished, tally.live, tally.scheduled
            );

            if tally.live > 0 {
                return RoundDetection::new(round, DetectionReason::LiveMatches);
            }

            if tally.scheduled > 0 {
                if round == 1 {
                    return RoundDetection::new(round, DetectionReason::FirstRoundPending);
                }
                return self.resolve_against_previous(round, previous.take()).await;
            }

            if tally.all_finished() {
                previous = Some(WalkedRound { round, matches });
                continue;
            }

            return RoundDetection::new(round, DetectionReason::Defensive);
        }

        info!("All rounds up to {} are finished, staying on round {}", self.max_rounds, last_valid_round);
        RoundDetection::new(last_valid_round, DetectionReason::Exhausted)
    }

    /// The previous round stays current while it still has unfinished
    /// matches. A previous round the walk skipped is fetched once more; if it
    /// is still unavailable it counts as invalid.
    async fn resolve_against_previous(&self, round: u32, walked: Option<WalkedRound>) -> RoundDetection {
        let previous_round = round - 1;
        let previous_matches = match walked {
            Some(walked) if walked.round == previous_round => Some(walked.matches),
            _ => match self.provider.fetch_round(previous_round).await {
                Ok(matches) => Some(matches),
                Err(e) => {
                    warn!("⚠️ Round {} could not be fetched again: {}", previous_round, e);
                    self.reporter.report_error(
                        "round_state.previous_round",
                        json!({ "round": round, "previous_round": previous_round }),
                        &e,
                    );
                    None
                }
            },
        };

        let Some(previous_matches) = previous_matches else {
            return RoundDetection::new(round, DetectionReason::PendingAfterClosedRound);
        };

        if !is_valid_round(&previous_matches) || RoundTally::from_matches(&previous_matches).all_finished() {
            RoundDetection::new(round, DetectionReason::PendingAfterClosedRound)
        } else {
            RoundDetection::new(previous_round, DetectionReason::PreviousRoundOpen)
        }
    }
}
