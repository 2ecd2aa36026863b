//! Setup phase: tournament catalogue, roster management, start and reset.

use crate::config::EngineConfig;
use crate::logic::round_robin::{write_round_robin, MIN_PLAYERS};
use crate::logic::swiss::write_swiss_round;
use crate::models::{
    normalize_name, GameMatch, PairingSystem, Player, PlayerId, Tournament, TournamentError,
    TournamentId, TournamentStatus,
};
use crate::storage::Storage;
use chrono::{DateTime, Utc};

fn clean_name(name: &str) -> Result<&str, TournamentError> {
    normalize_name(name).ok_or(TournamentError::EmptyPlayerName)
}

/// New tournament in Setup, paired with the configured system.
pub fn create_tournament<S: Storage>(
    store: &mut S,
    config: &EngineConfig,
    name: &str,
    now: DateTime<Utc>,
) -> Result<Tournament, TournamentError> {
    let name = normalize_name(name).ok_or(TournamentError::EmptyTournamentName)?;
    let tournament = store.create_tournament(name, config.pairing_system, now)?;
    log::info!(
        "Created tournament {} '{}' ({:?})",
        tournament.id,
        tournament.name,
        tournament.pairing_system
    );
    Ok(tournament)
}

pub fn rename_tournament<S: Storage>(
    store: &mut S,
    tournament_id: TournamentId,
    name: &str,
) -> Result<Tournament, TournamentError> {
    let name = normalize_name(name).ok_or(TournamentError::EmptyTournamentName)?;
    let mut tournament = store.tournament(tournament_id)?;
    tournament.name = name.to_string();
    store.update_tournament(&tournament)?;
    Ok(tournament)
}

/// Remove a tournament with its matches, roster links and results.
pub fn delete_tournament<S: Storage>(
    store: &mut S,
    tournament_id: TournamentId,
) -> Result<(), TournamentError> {
    store.delete_tournament(tournament_id)?;
    log::info!("Deleted tournament {}", tournament_id);
    Ok(())
}

fn ensure_unique_name<S: Storage>(
    store: &S,
    tournament_id: TournamentId,
    name: &str,
    except: Option<PlayerId>,
) -> Result<(), TournamentError> {
    let folded = name.to_lowercase();
    let taken = store
        .roster(tournament_id)?
        .iter()
        .any(|p| Some(p.id) != except && p.name.to_lowercase() == folded);
    if taken {
        return Err(TournamentError::DuplicatePlayerName(name.to_string()));
    }
    Ok(())
}

/// Create a player and register them in a tournament that is still in Setup.
/// Names are trimmed and must be unique in the tournament, ignoring case.
pub fn add_player<S: Storage>(
    store: &mut S,
    tournament_id: TournamentId,
    name: &str,
    seed: i32,
) -> Result<Player, TournamentError> {
    let name = clean_name(name)?;
    store.transaction(|s| {
        s.tournament(tournament_id)?
            .ensure_status(TournamentStatus::Setup)?;
        ensure_unique_name(s, tournament_id, name, None)?;
        let player = s.create_player(name, seed)?;
        s.join(tournament_id, player.id)?;
        log::info!("Tournament {}: added player {} '{}'", tournament_id, player.id, player.name);
        Ok(player)
    })
}

/// Register an existing player in another Setup tournament.
pub fn join_player<S: Storage>(
    store: &mut S,
    tournament_id: TournamentId,
    player_id: PlayerId,
) -> Result<(), TournamentError> {
    store.transaction(|s| {
        s.tournament(tournament_id)?
            .ensure_status(TournamentStatus::Setup)?;
        let player = s.player(player_id)?;
        ensure_unique_name(s, tournament_id, &player.name, Some(player_id))?;
        s.join(tournament_id, player_id)
    })
}

/// Rename a player. The new name must stay unique in every tournament they belong to.
pub fn rename_player<S: Storage>(
    store: &mut S,
    player_id: PlayerId,
    name: &str,
) -> Result<Player, TournamentError> {
    let name = clean_name(name)?;
    store.transaction(|s| {
        let mut player = s.player(player_id)?;
        for tournament_id in s.memberships(player_id)? {
            ensure_unique_name(s, tournament_id, name, Some(player_id))?;
        }
        player.name = name.to_string();
        s.update_player(&player)?;
        Ok(player)
    })
}

/// Take a player off the roster. Only allowed before the tournament starts.
pub fn remove_player<S: Storage>(
    store: &mut S,
    tournament_id: TournamentId,
    player_id: PlayerId,
) -> Result<(), TournamentError> {
    store.transaction(|s| {
        s.tournament(tournament_id)?
            .ensure_status(TournamentStatus::Setup)?;
        s.leave(tournament_id, player_id)?;
        log::info!("Tournament {}: removed player {}", tournament_id, player_id);
        Ok(())
    })
}

/// Delete a player record. Players referenced by any match are kept.
pub fn delete_player<S: Storage>(store: &mut S, player_id: PlayerId) -> Result<(), TournamentError> {
    store.delete_player(player_id)
}

fn write_opening<S: Storage>(
    store: &mut S,
    config: &EngineConfig,
    tournament: &Tournament,
) -> Result<Vec<GameMatch>, TournamentError> {
    match tournament.pairing_system {
        PairingSystem::RoundRobin => write_round_robin(store, config, tournament.id),
        PairingSystem::Swiss => {
            store.delete_matches(tournament.id, None)?;
            store.reset_match_ids(tournament.id)?;
            write_swiss_round(store, config, tournament.id)
        }
    }
}

/// Setup -> Active. Writes the full round-robin cycle, or Swiss round 1.
pub fn start_tournament<S: Storage>(
    store: &mut S,
    config: &EngineConfig,
    tournament_id: TournamentId,
    now: DateTime<Utc>,
) -> Result<Vec<GameMatch>, TournamentError> {
    store.transaction(|s| {
        let mut tournament = s.tournament(tournament_id)?;
        tournament.ensure_status(TournamentStatus::Setup)?;
        let found = s.roster(tournament_id)?.len();
        if found < MIN_PLAYERS {
            return Err(TournamentError::InsufficientPlayers {
                required: MIN_PLAYERS,
                found,
            });
        }
        let matches = write_opening(s, config, &tournament)?;
        tournament.mark_started(now)?;
        s.update_tournament(&tournament)?;
        log::info!("Started tournament {} with {} players", tournament_id, found);
        Ok(matches)
    })
}

/// Throw away every match and result entry of an Active tournament and
/// regenerate the opening schedule. The tournament stays Active.
pub fn reset_tournament<S: Storage>(
    store: &mut S,
    config: &EngineConfig,
    tournament_id: TournamentId,
) -> Result<Vec<GameMatch>, TournamentError> {
    store.transaction(|s| {
        let tournament = s.tournament(tournament_id)?;
        tournament.ensure_status(TournamentStatus::Active)?;
        let matches = write_opening(s, config, &tournament)?;
        log::info!("Reset tournament {}", tournament_id);
        Ok(matches)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::matches::submit_result;
    use crate::models::MatchResult;
    use crate::storage::MemoryStore;

    fn setup(names: &[&str]) -> (MemoryStore, EngineConfig, TournamentId) {
        let mut store = MemoryStore::new();
        let config = EngineConfig::default();
        let t = create_tournament(&mut store, &config, "Spring open", Utc::now()).unwrap();
        for name in names {
            add_player(&mut store, t.id, name, 0).unwrap();
        }
        (store, config, t.id)
    }

    #[test]
    fn add_player_trims_and_rejects_duplicates() {
        let (mut store, _, tid) = setup(&["Ann"]);
        let bo = add_player(&mut store, tid, "  Bo ", 0).unwrap();
        assert_eq!(bo.name, "Bo");
        assert_eq!(
            add_player(&mut store, tid, "ann", 0),
            Err(TournamentError::DuplicatePlayerName("ann".into()))
        );
        assert_eq!(add_player(&mut store, tid, "   ", 0), Err(TournamentError::EmptyPlayerName));
        assert_eq!(store.roster(tid).unwrap().len(), 2);
        assert_eq!(store.players().unwrap().len(), 2);
    }

    #[test]
    fn start_requires_three_players() {
        let (mut store, config, tid) = setup(&["Ann", "Bo"]);
        assert_eq!(
            start_tournament(&mut store, &config, tid, Utc::now()),
            Err(TournamentError::InsufficientPlayers { required: 3, found: 2 })
        );
        assert_eq!(store.tournament(tid).unwrap().status, TournamentStatus::Setup);
        assert!(store.matches(tid).unwrap().is_empty());
    }

    #[test]
    fn start_writes_full_cycle_and_locks_roster() {
        let (mut store, config, tid) = setup(&["Ann", "Bo", "Cy", "Dee"]);
        let matches = start_tournament(&mut store, &config, tid, Utc::now()).unwrap();
        assert_eq!(matches.len(), 6);
        assert_eq!(matches.iter().map(|m| m.id).collect::<Vec<_>>(), [1, 2, 3, 4, 5, 6]);
        let t = store.tournament(tid).unwrap();
        assert_eq!(t.status, TournamentStatus::Active);
        assert!(t.started_at.is_some());

        assert!(matches!(
            add_player(&mut store, tid, "Eve", 0),
            Err(TournamentError::InvalidState { .. })
        ));
        assert!(matches!(
            remove_player(&mut store, tid, 1),
            Err(TournamentError::InvalidState { .. })
        ));
        assert!(matches!(
            start_tournament(&mut store, &config, tid, Utc::now()),
            Err(TournamentError::InvalidState { .. })
        ));
    }

    #[test]
    fn reset_regenerates_the_same_schedule() {
        let (mut store, config, tid) = setup(&["Ann", "Bo", "Cy", "Dee", "Eve"]);
        let first = start_tournament(&mut store, &config, tid, Utc::now()).unwrap();
        submit_result(&mut store, tid, 1, MatchResult::Draw).unwrap();

        let again = reset_tournament(&mut store, &config, tid).unwrap();
        assert_eq!(again, first);
        assert!(store.matches(tid).unwrap().iter().all(|m| !m.is_played()));
        assert_eq!(store.tournament(tid).unwrap().status, TournamentStatus::Active);
    }

    #[test]
    fn reset_needs_an_active_tournament() {
        let (mut store, config, tid) = setup(&["Ann", "Bo", "Cy"]);
        assert!(matches!(
            reset_tournament(&mut store, &config, tid),
            Err(TournamentError::InvalidState { .. })
        ));
    }

    #[test]
    fn rename_checks_every_membership() {
        let (mut store, config, first) = setup(&["Ann", "Bo"]);
        let second = create_tournament(&mut store, &config, "Autumn open", Utc::now()).unwrap();
        add_player(&mut store, second.id, "Cy", 0).unwrap();
        join_player(&mut store, second.id, 1).unwrap();

        // "Bo" is free in the second tournament but taken in the first.
        assert_eq!(
            rename_player(&mut store, 1, "BO"),
            Err(TournamentError::DuplicatePlayerName("BO".into()))
        );
        assert_eq!(
            rename_player(&mut store, 1, "Cy"),
            Err(TournamentError::DuplicatePlayerName("Cy".into()))
        );
        assert_eq!(rename_player(&mut store, 1, " Annie ").unwrap().name, "Annie");
        assert_eq!(store.memberships(1).unwrap(), vec![first, second.id]);
    }

    #[test]
    fn players_in_history_cannot_be_deleted() {
        let (mut store, config, tid) = setup(&["Ann", "Bo", "Cy"]);
        start_tournament(&mut store, &config, tid, Utc::now()).unwrap();
        assert_eq!(delete_player(&mut store, 1), Err(TournamentError::PlayerInHistory(1)));

        delete_tournament(&mut store, tid).unwrap();
        assert!(store.tournament(tid).is_err());
        delete_player(&mut store, 1).unwrap();
    }

    #[test]
    fn blank_tournament_names_are_rejected() {
        let mut store = MemoryStore::new();
        let config = EngineConfig::default();
        assert_eq!(
            create_tournament(&mut store, &config, " ", Utc::now()),
            Err(TournamentError::EmptyTournamentName)
        );
        let t = create_tournament(&mut store, &config, "Open", Utc::now()).unwrap();
        assert_eq!(
            rename_tournament(&mut store, t.id, "\t"),
            Err(TournamentError::EmptyTournamentName)
        );
        assert_eq!(TournamentError::EmptyTournamentName.kind(), crate::models::ErrorKind::Validation);
        assert_eq!(store.tournament(t.id).unwrap().name, "Open");
    }

    #[test]
    fn duplicate_check_folds_non_ascii_case() {
        let (mut store, _, tid) = setup(&["Émile"]);
        assert_eq!(
            add_player(&mut store, tid, "émile", 0),
            Err(TournamentError::DuplicatePlayerName("émile".into()))
        );
        let zoe = add_player(&mut store, tid, "Zoë", 0).unwrap();
        assert_eq!(
            rename_player(&mut store, zoe.id, "ÉMILE"),
            Err(TournamentError::DuplicatePlayerName("ÉMILE".into()))
        );
    }
}
