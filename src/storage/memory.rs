//! In-memory store with optional JSON snapshots on disk.

use super::snapshot::Snapshot;
use super::Storage;
use crate::models::{
    GameMatch, MatchId, PairingSystem, Pairing, Player, PlayerId, RankedResult, Tournament,
    TournamentError, TournamentId,
};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoryStore {
    pub(super) tournaments: BTreeMap<TournamentId, Tournament>,
    pub(super) players: BTreeMap<PlayerId, Player>,
    pub(super) memberships: BTreeSet<(TournamentId, PlayerId)>,
    pub(super) matches: BTreeMap<(TournamentId, MatchId), GameMatch>,
    pub(super) next_match_id: BTreeMap<TournamentId, MatchId>,
    pub(super) results: BTreeMap<TournamentId, Vec<RankedResult>>,
    pub(super) next_tournament_id: TournamentId,
    pub(super) next_player_id: PlayerId,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a snapshot written by `save_to`.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, TournamentError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| TournamentError::Persistence(format!("{}: {}", path.display(), e)))?;
        let snapshot: Snapshot = serde_json::from_str(&json)
            .map_err(|e| TournamentError::Persistence(format!("{}: {}", path.display(), e)))?;
        snapshot.into_store()
    }

    /// Write the whole store as JSON. Goes through a temp file so a failed write
    /// never leaves a truncated snapshot behind.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), TournamentError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(&Snapshot::from_store(self))
            .map_err(|e| TournamentError::Persistence(e.to_string()))?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, json)
            .and_then(|()| std::fs::rename(&tmp, path))
            .map_err(|e| TournamentError::Persistence(format!("{}: {}", path.display(), e)))
    }

    fn require_tournament(&self, id: TournamentId) -> Result<(), TournamentError> {
        if self.tournaments.contains_key(&id) {
            Ok(())
        } else {
            Err(TournamentError::TournamentNotFound(id))
        }
    }

    fn require_player(&self, id: PlayerId) -> Result<(), TournamentError> {
        if self.players.contains_key(&id) {
            Ok(())
        } else {
            Err(TournamentError::PlayerNotFound(id))
        }
    }
}

impl Storage for MemoryStore {
    fn create_tournament(
        &mut self,
        name: &str,
        pairing_system: PairingSystem,
        created_at: DateTime<Utc>,
    ) -> Result<Tournament, TournamentError> {
        self.next_tournament_id += 1;
        let tournament = Tournament::new(self.next_tournament_id, name, pairing_system, created_at);
        self.tournaments.insert(tournament.id, tournament.clone());
        Ok(tournament)
    }

    fn tournament(&self, id: TournamentId) -> Result<Tournament, TournamentError> {
        self.tournaments
            .get(&id)
            .cloned()
            .ok_or(TournamentError::TournamentNotFound(id))
    }

    fn tournaments(&self) -> Result<Vec<Tournament>, TournamentError> {
        Ok(self.tournaments.values().cloned().collect())
    }

    fn update_tournament(&mut self, tournament: &Tournament) -> Result<(), TournamentError> {
        let slot = self
            .tournaments
            .get_mut(&tournament.id)
            .ok_or(TournamentError::TournamentNotFound(tournament.id))?;
        *slot = tournament.clone();
        Ok(())
    }

    fn delete_tournament(&mut self, id: TournamentId) -> Result<(), TournamentError> {
        self.tournaments
            .remove(&id)
            .ok_or(TournamentError::TournamentNotFound(id))?;
        self.memberships.retain(|(t, _)| *t != id);
        self.matches.retain(|(t, _), _| *t != id);
        self.next_match_id.remove(&id);
        self.results.remove(&id);
        Ok(())
    }

    fn create_player(&mut self, name: &str, seed: i32) -> Result<Player, TournamentError> {
        self.next_player_id += 1;
        let player = Player::new(self.next_player_id, name, seed);
        self.players.insert(player.id, player.clone());
        Ok(player)
    }

    fn player(&self, id: PlayerId) -> Result<Player, TournamentError> {
        self.players
            .get(&id)
            .cloned()
            .ok_or(TournamentError::PlayerNotFound(id))
    }

    fn players(&self) -> Result<Vec<Player>, TournamentError> {
        Ok(self.players.values().cloned().collect())
    }

    fn update_player(&mut self, player: &Player) -> Result<(), TournamentError> {
        let slot = self
            .players
            .get_mut(&player.id)
            .ok_or(TournamentError::PlayerNotFound(player.id))?;
        *slot = player.clone();
        Ok(())
    }

    fn delete_player(&mut self, id: PlayerId) -> Result<(), TournamentError> {
        self.require_player(id)?;
        if self.matches.values().any(|m| m.involves(id))
            || self.results.values().flatten().any(|r| r.player_id == id)
        {
            return Err(TournamentError::PlayerInHistory(id));
        }
        self.memberships.retain(|(_, p)| *p != id);
        self.players.remove(&id);
        Ok(())
    }

    fn join(&mut self, tournament: TournamentId, player: PlayerId) -> Result<(), TournamentError> {
        self.require_tournament(tournament)?;
        self.require_player(player)?;
        self.memberships.insert((tournament, player));
        Ok(())
    }

    fn leave(&mut self, tournament: TournamentId, player: PlayerId) -> Result<(), TournamentError> {
        self.require_tournament(tournament)?;
        if !self.memberships.remove(&(tournament, player)) {
            return Err(TournamentError::PlayerNotFound(player));
        }
        Ok(())
    }

    fn roster(&self, tournament: TournamentId) -> Result<Vec<Player>, TournamentError> {
        self.require_tournament(tournament)?;
        self.memberships
            .range((tournament, PlayerId::MIN)..=(tournament, PlayerId::MAX))
            .map(|&(_, p)| self.player(p))
            .collect()
    }

    fn memberships(&self, player: PlayerId) -> Result<Vec<TournamentId>, TournamentError> {
        self.require_player(player)?;
        Ok(self
            .memberships
            .iter()
            .filter(|(_, p)| *p == player)
            .map(|&(t, _)| t)
            .collect())
    }

    fn matches(&self, tournament: TournamentId) -> Result<Vec<GameMatch>, TournamentError> {
        self.require_tournament(tournament)?;
        let mut list: Vec<GameMatch> = self
            .matches
            .range((tournament, MatchId::MIN)..=(tournament, MatchId::MAX))
            .map(|(_, m)| m.clone())
            .collect();
        list.sort_by_key(|m| (m.round, m.id));
        Ok(list)
    }

    fn game_match(
        &self,
        tournament: TournamentId,
        id: MatchId,
    ) -> Result<GameMatch, TournamentError> {
        self.require_tournament(tournament)?;
        self.matches
            .get(&(tournament, id))
            .cloned()
            .ok_or(TournamentError::MatchNotFound(id))
    }

    fn update_match(&mut self, game: &GameMatch) -> Result<(), TournamentError> {
        let slot = self
            .matches
            .get_mut(&(game.tournament_id, game.id))
            .ok_or(TournamentError::MatchNotFound(game.id))?;
        *slot = game.clone();
        Ok(())
    }

    fn insert_matches(
        &mut self,
        tournament: TournamentId,
        pairings: &[Pairing],
    ) -> Result<Vec<GameMatch>, TournamentError> {
        self.require_tournament(tournament)?;
        // Check everything before allocating so a bad row leaves the counter untouched.
        for p in pairings {
            if p.round == 0 {
                return Err(TournamentError::InvalidRound(p.round));
            }
            if p.player1 == p.player2 {
                return Err(TournamentError::SamePlayer(p.player1));
            }
            self.require_player(p.player1)?;
            self.require_player(p.player2)?;
        }
        let counter = self.next_match_id.entry(tournament).or_insert(0);
        let mut inserted = Vec::with_capacity(pairings.len());
        for &pairing in pairings {
            *counter += 1;
            let game = GameMatch::new(*counter, tournament, pairing);
            self.matches.insert((tournament, game.id), game.clone());
            inserted.push(game);
        }
        Ok(inserted)
    }

    fn delete_matches(
        &mut self,
        tournament: TournamentId,
        round: Option<u32>,
    ) -> Result<(), TournamentError> {
        self.require_tournament(tournament)?;
        self.matches
            .retain(|(t, _), m| *t != tournament || round.is_some_and(|r| m.round != r));
        Ok(())
    }

    fn reset_match_ids(&mut self, tournament: TournamentId) -> Result<(), TournamentError> {
        self.require_tournament(tournament)?;
        self.next_match_id.insert(tournament, 0);
        Ok(())
    }

    fn save_results(
        &mut self,
        tournament: TournamentId,
        results: &[RankedResult],
    ) -> Result<(), TournamentError> {
        self.require_tournament(tournament)?;
        if self.results.contains_key(&tournament) {
            return Err(TournamentError::Persistence(format!(
                "results for tournament {} are already stored",
                tournament
            )));
        }
        for r in results {
            self.require_player(r.player_id)?;
        }
        self.results.insert(tournament, results.to_vec());
        Ok(())
    }

    fn results(&self, tournament: TournamentId) -> Result<Vec<RankedResult>, TournamentError> {
        self.require_tournament(tournament)?;
        Ok(self.results.get(&tournament).cloned().unwrap_or_default())
    }

    fn transaction<T, F>(&mut self, f: F) -> Result<T, TournamentError>
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> Result<T, TournamentError>,
    {
        let before = self.clone();
        let outcome = f(self);
        if outcome.is_err() {
            *self = before;
        }
        outcome
    }
}
