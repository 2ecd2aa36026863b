//! Integration tests for Swiss tournaments: round generation, limits and rebuilds.

use chrono::Utc;
use std::collections::HashSet;
use tournament_pairing::{
    add_player, create_tournament, finalize_tournament, generate_swiss_round, rebuild_swiss_round,
    start_tournament, submit_result, EngineConfig, FinalizeMode, MatchResult, MemoryStore,
    PairingSystem, Storage, SwissMatcher, TournamentError, TournamentId,
};

fn swiss(rounds: u32, matcher: SwissMatcher) -> EngineConfig {
    EngineConfig {
        pairing_system: PairingSystem::Swiss,
        swiss_rounds: rounds,
        swiss_matcher: matcher,
        ..EngineConfig::default()
    }
}

fn started(config: &EngineConfig, n: usize) -> (MemoryStore, TournamentId) {
    let mut store = MemoryStore::new();
    let t = create_tournament(&mut store, config, "Swiss open", Utc::now()).unwrap();
    for i in 0..n {
        add_player(&mut store, t.id, &format!("P{i:02}"), 0).unwrap();
    }
    start_tournament(&mut store, config, t.id, Utc::now()).unwrap();
    (store, t.id)
}

/// Lower player id wins, so the field spreads out by score.
fn play_round(store: &mut MemoryStore, tid: TournamentId, round: u32) {
    for m in store.matches(tid).unwrap() {
        if m.round == round {
            let result = if m.player1 < m.player2 {
                MatchResult::P1Win
            } else {
                MatchResult::P2Win
            };
            submit_result(store, tid, m.id, result).unwrap();
        }
    }
}

#[test]
fn rounds_never_repeat_a_pairing() {
    for matcher in [SwissMatcher::Greedy, SwissMatcher::Backtracking] {
        let config = swiss(4, matcher);
        let (mut store, tid) = started(&config, 8);
        play_round(&mut store, tid, 1);
        for round in 2..=4 {
            let new = generate_swiss_round(&mut store, &config, tid).unwrap();
            assert!(new.iter().all(|m| m.round == round));
            play_round(&mut store, tid, round);
        }
        let matches = store.matches(tid).unwrap();
        let keys: HashSet<_> = matches
            .iter()
            .map(|m| (m.player1.min(m.player2), m.player1.max(m.player2)))
            .collect();
        assert_eq!(keys.len(), matches.len(), "{matcher:?} repeated a pairing");
    }
}

#[test]
fn next_round_waits_for_results() {
    let config = swiss(3, SwissMatcher::Greedy);
    let (mut store, tid) = started(&config, 6);
    assert_eq!(
        generate_swiss_round(&mut store, &config, tid),
        Err(TournamentError::PreviousRoundIncomplete { round: 1 })
    );
    play_round(&mut store, tid, 1);
    generate_swiss_round(&mut store, &config, tid).unwrap();
}

#[test]
fn round_limit_stops_generation() {
    let config = swiss(2, SwissMatcher::Greedy);
    let (mut store, tid) = started(&config, 4);
    play_round(&mut store, tid, 1);
    generate_swiss_round(&mut store, &config, tid).unwrap();
    play_round(&mut store, tid, 2);
    let before = store.matches(tid).unwrap();
    assert_eq!(
        generate_swiss_round(&mut store, &config, tid),
        Err(TournamentError::RoundLimitReached { limit: 2 })
    );
    assert_eq!(store.matches(tid).unwrap(), before);

    let results =
        finalize_tournament(&mut store, &config, tid, FinalizeMode::Standard, Utc::now()).unwrap();
    assert_eq!(results.len(), 4);
    assert_eq!(results[0].points, 2.0);
}

#[test]
fn odd_field_leaves_one_player_out() {
    let config = swiss(3, SwissMatcher::Greedy);
    let (store, tid) = started(&config, 5);
    let first = store.matches(tid).unwrap();
    assert_eq!(first.len(), 2);
    let seen: HashSet<_> = first.iter().flat_map(|m| [m.player1, m.player2]).collect();
    assert_eq!(seen.len(), 4);
}

#[test]
fn rebuild_replaces_an_unplayed_round() {
    let config = swiss(3, SwissMatcher::Greedy);
    let (mut store, tid) = started(&config, 6);
    play_round(&mut store, tid, 1);
    let second = generate_swiss_round(&mut store, &config, tid).unwrap();
    let rebuilt = rebuild_swiss_round(&mut store, &config, tid).unwrap();
    let pairs = |ms: &[tournament_pairing::GameMatch]| {
        ms.iter().map(|m| (m.player1, m.player2)).collect::<Vec<_>>()
    };
    assert_eq!(pairs(&second), pairs(&rebuilt));
    assert!(rebuilt.iter().all(|m| m.round == 2));
    assert_eq!(store.matches(tid).unwrap().len(), 6);

    submit_result(&mut store, tid, rebuilt[0].id, MatchResult::Draw).unwrap();
    assert_eq!(
        rebuild_swiss_round(&mut store, &config, tid),
        Err(TournamentError::RoundAlreadyStarted { round: 2 })
    );
}

#[test]
fn swiss_calls_rejected_for_round_robin() {
    let config = EngineConfig::default();
    let (mut store, tid) = started(&config, 4);
    assert!(matches!(
        generate_swiss_round(&mut store, &config, tid),
        Err(TournamentError::InvalidState { .. })
    ));
}

#[test]
fn unplayed_limit_round_still_reports_the_limit() {
    let config = swiss(2, SwissMatcher::Greedy);
    let (mut store, tid) = started(&config, 4);
    play_round(&mut store, tid, 1);
    generate_swiss_round(&mut store, &config, tid).unwrap();
    assert_eq!(
        generate_swiss_round(&mut store, &config, tid),
        Err(TournamentError::RoundLimitReached { limit: 2 })
    );
}
