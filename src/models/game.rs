//! Match (game) record, its result, and the lock/unlock lifecycle.

use crate::models::player::PlayerId;
use crate::models::tournament::{TournamentError, TournamentId};
use serde::{Deserialize, Serialize};

/// Match id, unique within one tournament. Restarts at 1 when the schedule is regenerated.
pub type MatchId = u32;

/// Outcome of a single match.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchResult {
    #[default]
    Unplayed,
    P1Win,
    P2Win,
    Draw,
}

/// Lifecycle position of a match, derived from `result` and `locked`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchState {
    Unplayed,
    /// Result recorded, still editable.
    Played,
    Locked,
}

/// A pairing produced by a generator, before the store assigns it an id.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Pairing {
    pub round: u32,
    pub player1: PlayerId,
    pub player2: PlayerId,
}

impl Pairing {
    pub fn new(round: u32, player1: PlayerId, player2: PlayerId) -> Self {
        Self {
            round,
            player1,
            player2,
        }
    }

    /// Unordered key for the pair, smaller id first.
    pub fn key(&self) -> (PlayerId, PlayerId) {
        (self.player1.min(self.player2), self.player1.max(self.player2))
    }
}

/// A single match between two players in one round.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GameMatch {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    /// Round number, starting at 1.
    pub round: u32,
    pub player1: PlayerId,
    pub player2: PlayerId,
    pub result: MatchResult,
    /// Only ever true when `result` is not `Unplayed`.
    pub locked: bool,
}

impl GameMatch {
    pub fn new(id: MatchId, tournament_id: TournamentId, pairing: Pairing) -> Self {
        Self {
            id,
            tournament_id,
            round: pairing.round,
            player1: pairing.player1,
            player2: pairing.player2,
            result: MatchResult::Unplayed,
            locked: false,
        }
    }

    pub fn state(&self) -> MatchState {
        match (self.result, self.locked) {
            (MatchResult::Unplayed, _) => MatchState::Unplayed,
            (_, false) => MatchState::Played,
            (_, true) => MatchState::Locked,
        }
    }

    pub fn is_played(&self) -> bool {
        self.result != MatchResult::Unplayed
    }

    pub fn involves(&self, player: PlayerId) -> bool {
        self.player1 == player || self.player2 == player
    }

    /// The other player in this match, if `player` took part.
    pub fn opponent_of(&self, player: PlayerId) -> Option<PlayerId> {
        if self.player1 == player {
            Some(self.player2)
        } else if self.player2 == player {
            Some(self.player1)
        } else {
            None
        }
    }

    /// Points earned by `player` here: 1.0 win, 0.5 draw, 0.0 loss.
    /// `None` when unplayed or when the player was not in this match.
    pub fn score_for(&self, player: PlayerId) -> Option<f64> {
        if !self.involves(player) {
            return None;
        }
        match self.result {
            MatchResult::Unplayed => None,
            MatchResult::Draw => Some(0.5),
            MatchResult::P1Win if self.player1 == player => Some(1.0),
            MatchResult::P2Win if self.player2 == player => Some(1.0),
            MatchResult::P1Win | MatchResult::P2Win => Some(0.0),
        }
    }

    /// Winner's id; `None` for draws and unplayed matches.
    pub fn winner(&self) -> Option<PlayerId> {
        match self.result {
            MatchResult::P1Win => Some(self.player1),
            MatchResult::P2Win => Some(self.player2),
            MatchResult::Unplayed | MatchResult::Draw => None,
        }
    }

    /// Record a result. Allowed from `Unplayed` and `Played`; always leaves the match unlocked.
    pub fn submit_result(&mut self, result: MatchResult) -> Result<(), TournamentError> {
        if self.locked {
            return Err(TournamentError::MatchLocked(self.id));
        }
        self.result = result;
        self.locked = false;
        Ok(())
    }

    pub fn lock(&mut self) -> Result<(), TournamentError> {
        if !self.is_played() {
            return Err(TournamentError::ResultMissing(self.id));
        }
        self.locked = true;
        Ok(())
    }

    pub fn unlock(&mut self) -> Result<(), TournamentError> {
        if !self.locked {
            return Err(TournamentError::InvalidState {
                expected: "locked match",
                found: "unlocked match",
            });
        }
        self.locked = false;
        Ok(())
    }

    /// Back to `Unplayed`. Used by regeneration and tournament reset only.
    pub fn reset(&mut self) {
        self.result = MatchResult::Unplayed;
        self.locked = false;
    }
}
