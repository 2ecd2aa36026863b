//! Finalize-time snapshot of a player's placing.

use crate::models::player::PlayerId;
use crate::models::tournament::TournamentId;
use serde::{Deserialize, Serialize};

/// Tiebreak metrics for one player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TiebreakValues {
    pub buchholz_cut_one: f64,
    pub sonneborn_berger: f64,
    pub number_of_wins: u32,
    pub cumulative_opponent_score: f64,
}

/// One row of a tournament's frozen final standings. Written once by finalize.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub tournament_id: TournamentId,
    pub player_id: PlayerId,
    pub player_name: String,
    /// 1-based, contiguous.
    pub rank: u32,
    pub points: f64,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub tiebreaks: TiebreakValues,
}
