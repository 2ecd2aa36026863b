//! Data structures for the tournament engine: players, matches, tournaments, final results.

mod game;
mod player;
mod result;
mod tournament;

pub use game::{GameMatch, MatchId, MatchResult, MatchState, Pairing};
pub use player::{normalize_name, Player, PlayerId};
pub use result::{RankedResult, TiebreakValues};
pub use tournament::{
    ErrorKind, PairingSystem, Tournament, TournamentError, TournamentId, TournamentStatus,
};
