//! Tiebreak metrics computed from a tournament's match history.

use crate::models::{GameMatch, MatchResult, PlayerId, TiebreakValues};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Selectable tiebreak metric.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tiebreaker {
    BuchholzCutOne,
    SonnebornBerger,
    /// Pairwise lookup only; see `direct_encounter`.
    DirectEncounter,
    NumberOfWins,
    CumulativeOpponentScore,
}

impl Tiebreaker {
    pub const ALL: [Tiebreaker; 5] = [
        Tiebreaker::BuchholzCutOne,
        Tiebreaker::SonnebornBerger,
        Tiebreaker::DirectEncounter,
        Tiebreaker::NumberOfWins,
        Tiebreaker::CumulativeOpponentScore,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Tiebreaker::BuchholzCutOne => "Buchholz Cut One",
            Tiebreaker::SonnebornBerger => "Sonneborn–Berger Score",
            Tiebreaker::DirectEncounter => "Direct Encounter",
            Tiebreaker::NumberOfWins => "Number of Wins",
            Tiebreaker::CumulativeOpponentScore => "Cumulative Opponent's Score",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Tiebreaker::BuchholzCutOne => {
                "Adds up the scores of all opponents, then drops the lowest-scoring one."
            }
            Tiebreaker::SonnebornBerger => {
                "Credits wins and draws by the score of the opponent they came against."
            }
            Tiebreaker::DirectEncounter => {
                "If tied players have met, the result of their game decides the order."
            }
            Tiebreaker::NumberOfWins => "More decisive wins ranks higher.",
            Tiebreaker::CumulativeOpponentScore => {
                "Sums the total scores of every opponent faced."
            }
        }
    }

    /// Per-player value used to order tied players (higher is better).
    /// `None` for the pairwise metric.
    pub fn value(self, values: &TiebreakValues) -> Option<f64> {
        match self {
            Tiebreaker::BuchholzCutOne => Some(values.buchholz_cut_one),
            Tiebreaker::SonnebornBerger => Some(values.sonneborn_berger),
            Tiebreaker::NumberOfWins => Some(f64::from(values.number_of_wins)),
            Tiebreaker::CumulativeOpponentScore => Some(values.cumulative_opponent_score),
            Tiebreaker::DirectEncounter => None,
        }
    }
}

/// Points per player id over every played match (win 1, draw 0.5, loss 0).
pub fn points_by_player(matches: &[GameMatch]) -> HashMap<PlayerId, f64> {
    let mut points = HashMap::new();
    for m in matches.iter().filter(|m| m.is_played()) {
        for id in [m.player1, m.player2] {
            let score = m.score_for(id).unwrap_or(0.0);
            *points.entry(id).or_insert(0.0) += score;
        }
    }
    points
}

/// Point totals of every opponent `player` has a played match against, one entry per match.
fn opponent_scores(player: PlayerId, matches: &[GameMatch], points: &HashMap<PlayerId, f64>) -> Vec<f64> {
    matches
        .iter()
        .filter(|m| m.is_played())
        .filter_map(|m| m.opponent_of(player))
        .map(|opp| points.get(&opp).copied().unwrap_or(0.0))
        .collect()
}

pub fn buchholz_cut_one(player: PlayerId, matches: &[GameMatch], points: &HashMap<PlayerId, f64>) -> f64 {
    let scores = opponent_scores(player, matches, points);
    let lowest = scores.iter().copied().reduce(f64::min).unwrap_or(0.0);
    scores.iter().sum::<f64>() - lowest
}

pub fn sonneborn_berger(player: PlayerId, matches: &[GameMatch], points: &HashMap<PlayerId, f64>) -> f64 {
    matches
        .iter()
        .filter_map(|m| {
            let opp = m.opponent_of(player)?;
            let opp_points = points.get(&opp).copied().unwrap_or(0.0);
            match m.result {
                MatchResult::Draw => Some(opp_points / 2.0),
                MatchResult::P1Win | MatchResult::P2Win if m.winner() == Some(player) => {
                    Some(opp_points)
                }
                _ => None,
            }
        })
        .sum()
}

pub fn number_of_wins(player: PlayerId, matches: &[GameMatch]) -> u32 {
    matches.iter().filter(|m| m.winner() == Some(player)).count() as u32
}

pub fn cumulative_opponent_score(
    player: PlayerId,
    matches: &[GameMatch],
    points: &HashMap<PlayerId, f64>,
) -> f64 {
    opponent_scores(player, matches, points).iter().sum()
}

/// 1.0 / 0.5 / 0.0 for `a`'s win / draw / loss against `b` in their first played
/// meeting; 0.0 if they never met.
pub fn direct_encounter(a: PlayerId, b: PlayerId, matches: &[GameMatch]) -> f64 {
    matches
        .iter()
        .filter(|m| m.is_played() && m.opponent_of(a) == Some(b))
        .find_map(|m| m.score_for(a))
        .unwrap_or(0.0)
}

/// All four ranking metrics for `player`.
pub fn tiebreak_values(
    player: PlayerId,
    matches: &[GameMatch],
    points: &HashMap<PlayerId, f64>,
) -> TiebreakValues {
    TiebreakValues {
        buchholz_cut_one: buchholz_cut_one(player, matches, points),
        sonneborn_berger: sonneborn_berger(player, matches, points),
        number_of_wins: number_of_wins(player, matches),
        cumulative_opponent_score: cumulative_opponent_score(player, matches, points),
    }
}
