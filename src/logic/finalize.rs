//! Closing a tournament: freeze standings into stored results.

use crate::config::EngineConfig;
use crate::logic::standings::compute_standings;
use crate::models::{
    PairingSystem, RankedResult, TournamentError, TournamentId, TournamentStatus,
};
use crate::storage::Storage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who is asking to finalize. An admin may close a Swiss event before its round limit.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalizeMode {
    #[default]
    Standard,
    Admin,
}

/// Active -> Completed. Every match must have a result; Swiss tournaments must also
/// have reached their round limit unless `mode` is `Admin`.
pub fn finalize_tournament<S: Storage>(
    store: &mut S,
    config: &EngineConfig,
    tournament_id: TournamentId,
    mode: FinalizeMode,
    now: DateTime<Utc>,
) -> Result<Vec<RankedResult>, TournamentError> {
    store.transaction(|s| {
        let mut tournament = s.tournament(tournament_id)?;
        tournament.ensure_status(TournamentStatus::Active)?;
        let matches = s.matches(tournament_id)?;

        let count = matches.iter().filter(|m| !m.is_played()).count();
        if count > 0 {
            return Err(TournamentError::UnresolvedMatches { count });
        }
        if tournament.pairing_system == PairingSystem::Swiss && mode == FinalizeMode::Standard {
            let played = matches.iter().map(|m| m.round).max().unwrap_or(0);
            if played < config.swiss_rounds {
                return Err(TournamentError::SwissLimitNotReached {
                    limit: config.swiss_rounds,
                    played,
                });
            }
        }

        let players = s.roster(tournament_id)?;
        let results: Vec<RankedResult> = compute_standings(&players, &matches, &config.tiebreakers)
            .iter()
            .map(|row| row.to_result(tournament_id))
            .collect();
        s.save_results(tournament_id, &results)?;
        tournament.mark_completed(now)?;
        s.update_tournament(&tournament)?;
        log::info!(
            "Finalized tournament {} ({} players, {} matches)",
            tournament_id,
            results.len(),
            matches.len()
        );
        Ok(results)
    })
}

/// Stored final results in rank order. Empty until the tournament is finalized.
pub fn get_results<S: Storage>(
    store: &S,
    tournament_id: TournamentId,
) -> Result<Vec<RankedResult>, TournamentError> {
    let mut results = store.results(tournament_id)?;
    results.sort_by_key(|r| r.rank);
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::matches::{confirm_result, submit_result};
    use crate::logic::setup::{add_player, create_tournament, reset_tournament, start_tournament};
    use crate::logic::standings::get_standings;
    use crate::models::MatchResult;
    use crate::storage::MemoryStore;

    fn started(config: &EngineConfig, names: &[&str]) -> (MemoryStore, TournamentId) {
        let mut store = MemoryStore::new();
        let t = create_tournament(&mut store, config, "Finals night", Utc::now()).unwrap();
        for name in names {
            add_player(&mut store, t.id, name, 0).unwrap();
        }
        start_tournament(&mut store, config, t.id, Utc::now()).unwrap();
        (store, t.id)
    }

    fn play_all(store: &mut MemoryStore, tid: TournamentId) {
        for m in store.matches(tid).unwrap() {
            submit_result(store, tid, m.id, MatchResult::P1Win).unwrap();
        }
    }

    #[test]
    fn unplayed_match_blocks_finalize() {
        let config = EngineConfig::default();
        let (mut store, tid) = started(&config, &["Ann", "Bo", "Cy"]);
        submit_result(&mut store, tid, 1, MatchResult::Draw).unwrap();
        assert_eq!(
            finalize_tournament(&mut store, &config, tid, FinalizeMode::Standard, Utc::now()),
            Err(TournamentError::UnresolvedMatches { count: 2 })
        );
        assert_eq!(store.tournament(tid).unwrap().status, TournamentStatus::Active);
        assert!(get_results(&store, tid).unwrap().is_empty());
    }

    #[test]
    fn finalize_freezes_ranks() {
        let config = EngineConfig::default();
        let (mut store, tid) = started(&config, &["Ann", "Bo", "Cy", "Dee", "Eve"]);
        play_all(&mut store, tid);
        let results =
            finalize_tournament(&mut store, &config, tid, FinalizeMode::Standard, Utc::now())
                .unwrap();
        assert_eq!(results.len(), 5);
        assert_eq!(results.iter().map(|r| r.rank).collect::<Vec<_>>(), [1, 2, 3, 4, 5]);
        assert_eq!(results.iter().map(|r| r.points).sum::<f64>(), 10.0);

        let t = store.tournament(tid).unwrap();
        assert_eq!(t.status, TournamentStatus::Completed);
        assert!(t.completed_at.is_some());
        assert_eq!(get_results(&store, tid).unwrap(), results);

        let standings = get_standings(&store, &config, tid).unwrap();
        assert_eq!(standings[0].player_id, results[0].player_id);
    }

    #[test]
    fn completed_tournament_is_read_only() {
        let config = EngineConfig::default();
        let (mut store, tid) = started(&config, &["Ann", "Bo", "Cy"]);
        play_all(&mut store, tid);
        finalize_tournament(&mut store, &config, tid, FinalizeMode::Standard, Utc::now()).unwrap();

        let again = finalize_tournament(&mut store, &config, tid, FinalizeMode::Admin, Utc::now());
        assert!(matches!(again, Err(TournamentError::InvalidState { .. })));
        assert!(matches!(
            confirm_result(&mut store, tid, 1, MatchResult::Draw),
            Err(TournamentError::InvalidState { .. })
        ));
        assert!(matches!(
            reset_tournament(&mut store, &config, tid),
            Err(TournamentError::InvalidState { .. })
        ));
    }

    #[test]
    fn swiss_needs_round_limit_or_admin() {
        let config = EngineConfig {
            pairing_system: PairingSystem::Swiss,
            swiss_rounds: 3,
            ..EngineConfig::default()
        };
        let (mut store, tid) = started(&config, &["Ann", "Bo", "Cy", "Dee"]);
        play_all(&mut store, tid);
        assert_eq!(
            finalize_tournament(&mut store, &config, tid, FinalizeMode::Standard, Utc::now()),
            Err(TournamentError::SwissLimitNotReached { limit: 3, played: 1 })
        );
        let results =
            finalize_tournament(&mut store, &config, tid, FinalizeMode::Admin, Utc::now()).unwrap();
        assert_eq!(results.len(), 4);
    }
}
