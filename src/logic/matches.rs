//! Result entry: submit, lock and unlock individual matches.

use crate::models::{
    GameMatch, MatchId, MatchResult, TournamentError, TournamentId, TournamentStatus,
};
use crate::storage::Storage;

/// Load a match of an Active tournament. Completed tournaments are read-only.
fn active_match<S: Storage>(
    store: &S,
    tournament_id: TournamentId,
    match_id: MatchId,
) -> Result<GameMatch, TournamentError> {
    store
        .tournament(tournament_id)?
        .ensure_status(TournamentStatus::Active)?;
    store.game_match(tournament_id, match_id)
}

/// Apply `change` to one match and store it, all-or-nothing.
fn update<S, F>(
    store: &mut S,
    tournament_id: TournamentId,
    match_id: MatchId,
    change: F,
) -> Result<GameMatch, TournamentError>
where
    S: Storage,
    F: FnOnce(&mut GameMatch) -> Result<(), TournamentError>,
{
    store.transaction(|s| {
        let mut game = active_match(s, tournament_id, match_id)?;
        change(&mut game)?;
        s.update_match(&game)?;
        Ok(game)
    })
}

/// Record (or correct) a result. Rejected while the match is locked.
pub fn submit_result<S: Storage>(
    store: &mut S,
    tournament_id: TournamentId,
    match_id: MatchId,
    result: MatchResult,
) -> Result<GameMatch, TournamentError> {
    let game = update(store, tournament_id, match_id, |m| m.submit_result(result))?;
    log::info!(
        "Tournament {}: match {} (round {}) result {:?}",
        tournament_id,
        match_id,
        game.round,
        result
    );
    Ok(game)
}

/// Freeze a match's result. The match must have one.
pub fn lock_match<S: Storage>(
    store: &mut S,
    tournament_id: TournamentId,
    match_id: MatchId,
) -> Result<GameMatch, TournamentError> {
    update(store, tournament_id, match_id, GameMatch::lock)
}

/// Make a locked result editable again; the result is kept.
pub fn unlock_match<S: Storage>(
    store: &mut S,
    tournament_id: TournamentId,
    match_id: MatchId,
) -> Result<GameMatch, TournamentError> {
    update(store, tournament_id, match_id, GameMatch::unlock)
}

/// Submit and lock in one step.
pub fn confirm_result<S: Storage>(
    store: &mut S,
    tournament_id: TournamentId,
    match_id: MatchId,
    result: MatchResult,
) -> Result<GameMatch, TournamentError> {
    update(store, tournament_id, match_id, |m| {
        m.submit_result(result)?;
        m.lock()
    })
}

/// Matches of one round, ordered by id.
pub fn round_matches<S: Storage>(
    store: &S,
    tournament_id: TournamentId,
    round: u32,
) -> Result<Vec<GameMatch>, TournamentError> {
    let matches: Vec<GameMatch> = store
        .matches(tournament_id)?
        .into_iter()
        .filter(|m| m.round == round)
        .collect();
    if matches.is_empty() {
        return Err(TournamentError::InvalidRound(round));
    }
    Ok(matches)
}

/// Round numbers that have matches, ascending.
pub fn rounds<S: Storage>(store: &S, tournament_id: TournamentId) -> Result<Vec<u32>, TournamentError> {
    let mut rounds: Vec<u32> = store.matches(tournament_id)?.iter().map(|m| m.round).collect();
    rounds.dedup();
    Ok(rounds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::logic::setup::{add_player, create_tournament, start_tournament};
    use crate::models::MatchState;
    use crate::storage::MemoryStore;
    use chrono::Utc;

    fn started() -> (MemoryStore, TournamentId) {
        let mut store = MemoryStore::new();
        let config = EngineConfig::default();
        let t = create_tournament(&mut store, &config, "League", Utc::now()).unwrap();
        for name in ["Ann", "Bo", "Cy", "Dee"] {
            add_player(&mut store, t.id, name, 0).unwrap();
        }
        start_tournament(&mut store, &config, t.id, Utc::now()).unwrap();
        (store, t.id)
    }

    #[test]
    fn submit_then_correct() {
        let (mut store, tid) = started();
        submit_result(&mut store, tid, 1, MatchResult::P1Win).unwrap();
        let m = submit_result(&mut store, tid, 1, MatchResult::Draw).unwrap();
        assert_eq!(m.result, MatchResult::Draw);
        assert_eq!(store.game_match(tid, 1).unwrap().state(), MatchState::Played);
    }

    #[test]
    fn locked_match_rejects_submission_until_unlocked() {
        let (mut store, tid) = started();
        confirm_result(&mut store, tid, 2, MatchResult::P2Win).unwrap();
        assert_eq!(
            submit_result(&mut store, tid, 2, MatchResult::P1Win),
            Err(TournamentError::MatchLocked(2))
        );
        assert_eq!(store.game_match(tid, 2).unwrap().result, MatchResult::P2Win);

        let m = unlock_match(&mut store, tid, 2).unwrap();
        assert_eq!(m.state(), MatchState::Played);
        submit_result(&mut store, tid, 2, MatchResult::P1Win).unwrap();
    }

    #[test]
    fn lock_needs_a_result() {
        let (mut store, tid) = started();
        assert_eq!(lock_match(&mut store, tid, 3), Err(TournamentError::ResultMissing(3)));
        assert_eq!(store.game_match(tid, 3).unwrap().state(), MatchState::Unplayed);
    }

    #[test]
    fn confirm_rolls_back_on_locked_match() {
        let (mut store, tid) = started();
        confirm_result(&mut store, tid, 1, MatchResult::P1Win).unwrap();
        assert_eq!(
            confirm_result(&mut store, tid, 1, MatchResult::Draw),
            Err(TournamentError::MatchLocked(1))
        );
        assert_eq!(store.game_match(tid, 1).unwrap().result, MatchResult::P1Win);
    }

    #[test]
    fn unknown_match() {
        let (mut store, tid) = started();
        assert_eq!(
            submit_result(&mut store, tid, 99, MatchResult::Draw),
            Err(TournamentError::MatchNotFound(99))
        );
    }

    #[test]
    fn setup_tournament_has_no_result_entry() {
        let mut store = MemoryStore::new();
        let t = create_tournament(&mut store, &EngineConfig::default(), "Empty", Utc::now()).unwrap();
        assert!(matches!(
            submit_result(&mut store, t.id, 1, MatchResult::Draw),
            Err(TournamentError::InvalidState { .. })
        ));
    }

    #[test]
    fn round_views() {
        let (store, tid) = started();
        assert_eq!(rounds(&store, tid).unwrap(), [1, 2, 3]);
        let second = round_matches(&store, tid, 2).unwrap();
        assert_eq!(second.len(), 2);
        assert!(second.iter().all(|m| m.round == 2));
        assert_eq!(round_matches(&store, tid, 4), Err(TournamentError::InvalidRound(4)));
    }
}
