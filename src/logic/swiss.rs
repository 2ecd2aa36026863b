//! Swiss pairing: rank by points, pair each top player with the nearest one they have not met.

use crate::config::{EngineConfig, SwissMatcher};
use crate::logic::round_robin::MIN_PLAYERS;
use crate::models::{
    GameMatch, Pairing, PairingSystem, Player, PlayerId, TournamentError, TournamentId,
    TournamentStatus,
};
use crate::storage::Storage;
use std::collections::HashSet;

/// Node limit for the backtracking search before it gives up and uses the greedy result.
const SEARCH_BUDGET: usize = 200_000;

/// A player's position going into the next Swiss round.
#[derive(Clone, Debug, PartialEq)]
pub struct SwissEntry {
    pub player_id: PlayerId,
    pub name: String,
    pub points: f64,
    /// Played matches so far.
    pub games: u32,
    /// Everyone this player has already been paired with.
    pub opponents: HashSet<PlayerId>,
}

/// Standings for pairing: points desc, then name asc. Every existing pairing counts
/// as a previous meeting, played or not.
pub fn swiss_standings(players: &[Player], matches: &[GameMatch]) -> Vec<SwissEntry> {
    let mut entries: Vec<SwissEntry> = players
        .iter()
        .map(|p| {
            let mut entry = SwissEntry {
                player_id: p.id,
                name: p.name.clone(),
                points: 0.0,
                games: 0,
                opponents: HashSet::new(),
            };
            for m in matches {
                if let Some(opp) = m.opponent_of(p.id) {
                    entry.opponents.insert(opp);
                }
                if let Some(score) = m.score_for(p.id) {
                    entry.points += score;
                    entry.games += 1;
                }
            }
            entry
        })
        .collect();
    entries.sort_by(|a, b| {
        b.points
            .total_cmp(&a.points)
            .then_with(|| a.name.cmp(&b.name))
            .then(a.player_id.cmp(&b.player_id))
    });
    entries
}

fn have_met(a: &SwissEntry, b: &SwissEntry) -> bool {
    a.opponents.contains(&b.player_id) || b.opponents.contains(&a.player_id)
}

/// Top-down greedy pass. No backtracking: a player constrained late in the list
/// can be left unpaired even when a complete pairing exists.
pub fn pair_greedy(entries: &[SwissEntry]) -> Vec<(PlayerId, PlayerId)> {
    let mut paired = vec![false; entries.len()];
    let mut pairs = Vec::new();
    for i in 0..entries.len() {
        if paired[i] {
            continue;
        }
        let partner = (i + 1..entries.len()).find(|&j| !paired[j] && !have_met(&entries[i], &entries[j]));
        if let Some(j) = partner {
            paired[i] = true;
            paired[j] = true;
            pairs.push((entries[i].player_id, entries[j].player_id));
        }
    }
    pairs
}

/// Depth-first search in greedy preference order for a pairing that leaves at most
/// one player (odd field) out. `None` if there is none within the search budget.
pub fn pair_backtracking(entries: &[SwissEntry]) -> Option<Vec<(PlayerId, PlayerId)>> {
    struct Search<'a> {
        entries: &'a [SwissEntry],
        paired: Vec<bool>,
        pairs: Vec<(usize, usize)>,
        budget: usize,
    }

    impl Search<'_> {
        fn run(&mut self, byes_left: usize) -> bool {
            if self.budget == 0 {
                return false;
            }
            self.budget -= 1;
            let Some(i) = self.paired.iter().position(|p| !p) else {
                return true;
            };
            self.paired[i] = true;
            for j in i + 1..self.entries.len() {
                if self.paired[j] || have_met(&self.entries[i], &self.entries[j]) {
                    continue;
                }
                self.paired[j] = true;
                self.pairs.push((i, j));
                if self.run(byes_left) {
                    return true;
                }
                self.pairs.pop();
                self.paired[j] = false;
            }
            if byes_left > 0 && self.run(byes_left - 1) {
                return true;
            }
            self.paired[i] = false;
            false
        }
    }

    let mut search = Search {
        entries,
        paired: vec![false; entries.len()],
        pairs: Vec::new(),
        budget: SEARCH_BUDGET,
    };
    search.run(entries.len() % 2).then(|| {
        search
            .pairs
            .iter()
            .map(|&(i, j)| (entries[i].player_id, entries[j].player_id))
            .collect()
    })
}

/// Highest round number present, 0 if none.
fn latest_round(matches: &[GameMatch]) -> u32 {
    matches.iter().map(|m| m.round).max().unwrap_or(0)
}

/// Pairings for the next Swiss round from the roster and the full match history.
///
/// Checks, in order: roster size, round limit (by games played and by rounds already
/// generated), and that the latest round is fully played.
/// The round number is one more than the most games anyone has played (never reusing
/// an existing round number).
pub fn next_swiss_round(
    players: &[Player],
    matches: &[GameMatch],
    config: &EngineConfig,
) -> Result<(u32, Vec<Pairing>), TournamentError> {
    if players.len() < MIN_PLAYERS {
        return Err(TournamentError::InsufficientPlayers {
            required: MIN_PLAYERS,
            found: players.len(),
        });
    }
    let entries = swiss_standings(players, matches);
    let most_games = entries.iter().map(|e| e.games).max().unwrap_or(0);
    let latest = latest_round(matches);
    if most_games >= config.swiss_rounds || latest >= config.swiss_rounds {
        return Err(TournamentError::RoundLimitReached {
            limit: config.swiss_rounds,
        });
    }
    if matches.iter().any(|m| m.round == latest && !m.is_played()) {
        return Err(TournamentError::PreviousRoundIncomplete { round: latest });
    }
    let round = (most_games + 1).max(latest + 1);
    let pairings = pair_entries(&entries, config.swiss_matcher, round)?;
    Ok((round, pairings))
}

fn pair_entries(
    entries: &[SwissEntry],
    matcher: SwissMatcher,
    round: u32,
) -> Result<Vec<Pairing>, TournamentError> {
    let pairs = match matcher {
        SwissMatcher::Greedy => pair_greedy(entries),
        SwissMatcher::Backtracking => pair_backtracking(entries).unwrap_or_else(|| {
            log::warn!("Round {}: no complete Swiss pairing found, using greedy pass", round);
            pair_greedy(entries)
        }),
    };
    if pairs.is_empty() {
        return Err(TournamentError::NoPairingsPossible { round });
    }
    let unpaired = entries.len() - pairs.len() * 2;
    if unpaired > 1 {
        log::warn!("Round {}: {} players left unpaired", round, unpaired);
    }
    Ok(pairs
        .into_iter()
        .map(|(a, b)| Pairing::new(round, a, b))
        .collect())
}

fn require_active_swiss<S: Storage>(
    store: &S,
    tournament_id: TournamentId,
) -> Result<(), TournamentError> {
    let tournament = store.tournament(tournament_id)?;
    tournament.ensure_status(TournamentStatus::Active)?;
    if tournament.pairing_system != PairingSystem::Swiss {
        return Err(TournamentError::InvalidState {
            expected: "swiss tournament",
            found: "round-robin tournament",
        });
    }
    Ok(())
}

/// Generate and store the next round. Only that round's matches are replaced.
/// Callers run this inside a store transaction.
pub(crate) fn write_swiss_round<S: Storage>(
    store: &mut S,
    config: &EngineConfig,
    tournament_id: TournamentId,
) -> Result<Vec<GameMatch>, TournamentError> {
    let players = store.roster(tournament_id)?;
    let matches = store.matches(tournament_id)?;
    let (round, pairings) = next_swiss_round(&players, &matches, config)?;
    store.delete_matches(tournament_id, Some(round))?;
    let inserted = store.insert_matches(tournament_id, &pairings)?;
    log::info!(
        "Tournament {}: Swiss round {} with {} matches",
        tournament_id,
        round,
        inserted.len()
    );
    for m in &inserted {
        log::debug!("Round {} match {}: {} vs {}", round, m.id, m.player1, m.player2);
    }
    Ok(inserted)
}

/// Add the next Swiss round to an active Swiss tournament.
pub fn generate_swiss_round<S: Storage>(
    store: &mut S,
    config: &EngineConfig,
    tournament_id: TournamentId,
) -> Result<Vec<GameMatch>, TournamentError> {
    store.transaction(|s| {
        require_active_swiss(s, tournament_id)?;
        write_swiss_round(s, config, tournament_id)
    })
}

/// Re-pair the most recent Swiss round from the standings before it.
/// Fails if any match of that round already has a result.
pub fn rebuild_swiss_round<S: Storage>(
    store: &mut S,
    config: &EngineConfig,
    tournament_id: TournamentId,
) -> Result<Vec<GameMatch>, TournamentError> {
    store.transaction(|s| {
        require_active_swiss(s, tournament_id)?;
        let matches = s.matches(tournament_id)?;
        let round = latest_round(&matches);
        if round == 0 {
            return Err(TournamentError::InvalidRound(round));
        }
        if matches.iter().any(|m| m.round == round && m.is_played()) {
            return Err(TournamentError::RoundAlreadyStarted { round });
        }
        s.delete_matches(tournament_id, Some(round))?;
        let inserted = write_swiss_round(s, config, tournament_id)?;
        if inserted.first().is_some_and(|m| m.round != round) {
            return Err(TournamentError::InvalidRound(round));
        }
        Ok(inserted)
    })
}
