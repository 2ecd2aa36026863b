//! On-disk row format. Status, pairing system and match result are stored as
//! strings here and nowhere else.

use super::memory::MemoryStore;
use crate::models::{
    GameMatch, MatchId, MatchResult, PairingSystem, Player, PlayerId, RankedResult, Tournament,
    TournamentError, TournamentId, TournamentStatus,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
struct TournamentRow {
    id: TournamentId,
    name: String,
    status: String,
    pairing_system: String,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize)]
struct MatchRow {
    id: MatchId,
    tournament_id: TournamentId,
    round: u32,
    p1: PlayerId,
    p2: PlayerId,
    /// "p1", "p2", "draw", or empty when unplayed.
    result: String,
    locked: bool,
}

#[derive(Serialize, Deserialize)]
pub(super) struct Snapshot {
    tournaments: Vec<TournamentRow>,
    players: Vec<Player>,
    memberships: Vec<(TournamentId, PlayerId)>,
    matches: Vec<MatchRow>,
    match_counters: Vec<(TournamentId, MatchId)>,
    results: Vec<RankedResult>,
    next_tournament_id: TournamentId,
    next_player_id: PlayerId,
}

fn corrupt(what: &str, value: &str) -> TournamentError {
    TournamentError::Persistence(format!("unknown {} '{}' in snapshot", what, value))
}

fn encode_status(status: TournamentStatus) -> String {
    status.label().to_string()
}

fn decode_status(s: &str) -> Result<TournamentStatus, TournamentError> {
    match s {
        "setup" => Ok(TournamentStatus::Setup),
        "active" => Ok(TournamentStatus::Active),
        "completed" => Ok(TournamentStatus::Completed),
        other => Err(corrupt("status", other)),
    }
}

fn encode_system(system: PairingSystem) -> String {
    match system {
        PairingSystem::RoundRobin => "round_robin",
        PairingSystem::Swiss => "swiss",
    }
    .to_string()
}

fn decode_system(s: &str) -> Result<PairingSystem, TournamentError> {
    match s {
        "round_robin" => Ok(PairingSystem::RoundRobin),
        "swiss" => Ok(PairingSystem::Swiss),
        other => Err(corrupt("pairing system", other)),
    }
}

fn encode_result(result: MatchResult) -> String {
    match result {
        MatchResult::Unplayed => "",
        MatchResult::P1Win => "p1",
        MatchResult::P2Win => "p2",
        MatchResult::Draw => "draw",
    }
    .to_string()
}

fn decode_result(s: &str) -> Result<MatchResult, TournamentError> {
    match s {
        "" => Ok(MatchResult::Unplayed),
        "p1" => Ok(MatchResult::P1Win),
        "p2" => Ok(MatchResult::P2Win),
        "draw" => Ok(MatchResult::Draw),
        other => Err(corrupt("match result", other)),
    }
}

impl Snapshot {
    pub(super) fn from_store(store: &MemoryStore) -> Self {
        Self {
            tournaments: store
                .tournaments
                .values()
                .map(|t| TournamentRow {
                    id: t.id,
                    name: t.name.clone(),
                    status: encode_status(t.status),
                    pairing_system: encode_system(t.pairing_system),
                    created_at: t.created_at,
                    started_at: t.started_at,
                    completed_at: t.completed_at,
                })
                .collect(),
            players: store.players.values().cloned().collect(),
            memberships: store.memberships.iter().copied().collect(),
            matches: store
                .matches
                .values()
                .map(|m| MatchRow {
                    id: m.id,
                    tournament_id: m.tournament_id,
                    round: m.round,
                    p1: m.player1,
                    p2: m.player2,
                    result: encode_result(m.result),
                    locked: m.locked,
                })
                .collect(),
            match_counters: store.next_match_id.iter().map(|(&t, &n)| (t, n)).collect(),
            results: store.results.values().flatten().cloned().collect(),
            next_tournament_id: store.next_tournament_id,
            next_player_id: store.next_player_id,
        }
    }

    pub(super) fn into_store(self) -> Result<MemoryStore, TournamentError> {
        let mut store = MemoryStore::new();
        for row in self.tournaments {
            store.tournaments.insert(
                row.id,
                Tournament {
                    id: row.id,
                    name: row.name,
                    status: decode_status(&row.status)?,
                    pairing_system: decode_system(&row.pairing_system)?,
                    created_at: row.created_at,
                    started_at: row.started_at,
                    completed_at: row.completed_at,
                },
            );
        }
        for p in self.players {
            store.players.insert(p.id, p);
        }
        store.memberships = self.memberships.into_iter().collect();
        for row in self.matches {
            let game = GameMatch {
                id: row.id,
                tournament_id: row.tournament_id,
                round: row.round,
                player1: row.p1,
                player2: row.p2,
                result: decode_result(&row.result)?,
                locked: row.locked,
            };
            if game.locked && !game.is_played() {
                return Err(TournamentError::Persistence(format!(
                    "match {} is locked without a result",
                    game.id
                )));
            }
            store.matches.insert((game.tournament_id, game.id), game);
        }
        store.next_match_id = self.match_counters.into_iter().collect();
        for r in self.results {
            store.results.entry(r.tournament_id).or_default().push(r);
        }
        store.next_tournament_id = self.next_tournament_id;
        store.next_player_id = self.next_player_id;
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Pairing;
    use crate::storage::Storage;

    #[test]
    fn result_codes_use_the_legacy_strings() {
        assert_eq!(encode_result(MatchResult::Unplayed), "");
        assert_eq!(encode_result(MatchResult::P1Win), "p1");
        assert_eq!(decode_result("draw"), Ok(MatchResult::Draw));
        assert!(matches!(decode_result("p3"), Err(TournamentError::Persistence(_))));
    }

    #[test]
    fn snapshot_restores_store() {
        let mut store = MemoryStore::new();
        let t = store
            .create_tournament("Spring", PairingSystem::Swiss, Utc::now())
            .unwrap();
        let a = store.create_player("Ann", 1).unwrap();
        let b = store.create_player("Bo", 2).unwrap();
        store.join(t.id, a.id).unwrap();
        store.join(t.id, b.id).unwrap();
        let mut game = store.insert_matches(t.id, &[Pairing::new(1, a.id, b.id)]).unwrap()[0].clone();
        game.submit_result(MatchResult::P2Win).unwrap();
        game.lock().unwrap();
        store.update_match(&game).unwrap();

        let json = serde_json::to_string(&Snapshot::from_store(&store)).unwrap();
        assert!(json.contains("\"result\":\"p2\""));
        let restored: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.into_store().unwrap(), store);
    }
}
