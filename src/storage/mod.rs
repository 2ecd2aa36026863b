//! Persistence seam. The engine reads and writes plain records through `Storage`;
//! `MemoryStore` is the bundled adapter.

mod memory;
mod snapshot;

pub use memory::MemoryStore;

use crate::models::{
    GameMatch, MatchId, PairingSystem, Pairing, Player, PlayerId, RankedResult, Tournament,
    TournamentError, TournamentId,
};
use chrono::{DateTime, Utc};

/// Create/read/update/delete for every record the engine uses.
///
/// Implementations enforce referential integrity: matches reference existing
/// players and tournaments. `transaction` makes a sequence of calls all-or-nothing.
pub trait Storage {
    fn create_tournament(
        &mut self,
        name: &str,
        pairing_system: PairingSystem,
        created_at: DateTime<Utc>,
    ) -> Result<Tournament, TournamentError>;
    fn tournament(&self, id: TournamentId) -> Result<Tournament, TournamentError>;
    fn tournaments(&self) -> Result<Vec<Tournament>, TournamentError>;
    fn update_tournament(&mut self, tournament: &Tournament) -> Result<(), TournamentError>;
    /// Removes the tournament with its matches, memberships and results. Players are kept.
    fn delete_tournament(&mut self, id: TournamentId) -> Result<(), TournamentError>;

    fn create_player(&mut self, name: &str, seed: i32) -> Result<Player, TournamentError>;
    fn player(&self, id: PlayerId) -> Result<Player, TournamentError>;
    fn players(&self) -> Result<Vec<Player>, TournamentError>;
    fn update_player(&mut self, player: &Player) -> Result<(), TournamentError>;
    /// Fails with `PlayerInHistory` if any match references the player.
    fn delete_player(&mut self, id: PlayerId) -> Result<(), TournamentError>;

    fn join(&mut self, tournament: TournamentId, player: PlayerId) -> Result<(), TournamentError>;
    fn leave(&mut self, tournament: TournamentId, player: PlayerId)
        -> Result<(), TournamentError>;
    /// Players registered in the tournament, in id order.
    fn roster(&self, tournament: TournamentId) -> Result<Vec<Player>, TournamentError>;
    fn memberships(&self, player: PlayerId) -> Result<Vec<TournamentId>, TournamentError>;

    /// All matches of a tournament ordered by round, then id.
    fn matches(&self, tournament: TournamentId) -> Result<Vec<GameMatch>, TournamentError>;
    fn game_match(
        &self,
        tournament: TournamentId,
        id: MatchId,
    ) -> Result<GameMatch, TournamentError>;
    fn update_match(&mut self, game: &GameMatch) -> Result<(), TournamentError>;
    /// Allocates ids from the tournament's counter and inserts the matches together.
    fn insert_matches(
        &mut self,
        tournament: TournamentId,
        pairings: &[Pairing],
    ) -> Result<Vec<GameMatch>, TournamentError>;
    /// Deletes every match of the tournament, or only those of `round`.
    fn delete_matches(
        &mut self,
        tournament: TournamentId,
        round: Option<u32>,
    ) -> Result<(), TournamentError>;
    /// Next inserted match gets id 1 again.
    fn reset_match_ids(&mut self, tournament: TournamentId) -> Result<(), TournamentError>;

    /// Writes the final standings. A tournament's result set can only be written once.
    fn save_results(
        &mut self,
        tournament: TournamentId,
        results: &[RankedResult],
    ) -> Result<(), TournamentError>;
    fn results(&self, tournament: TournamentId) -> Result<Vec<RankedResult>, TournamentError>;

    /// Run `f`; if it fails, every change it made is undone.
    fn transaction<T, F>(&mut self, f: F) -> Result<T, TournamentError>
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> Result<T, TournamentError>;
}
