//! Round-robin schedule by the circle method.

use crate::config::{EngineConfig, RosterOrder};
use crate::models::{GameMatch, Pairing, Player, PlayerId, TournamentError, TournamentId};
use crate::storage::Storage;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Smallest roster either generator accepts.
pub const MIN_PLAYERS: usize = 3;

/// Sort the roster into the order the generators consume it.
pub fn order_roster(players: &[Player], order: RosterOrder) -> Vec<Player> {
    let mut ordered = players.to_vec();
    match order {
        RosterOrder::Name => ordered.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id))),
        RosterOrder::Seed => ordered.sort_by(|a, b| {
            a.seed
                .cmp(&b.seed)
                .then_with(|| a.name.cmp(&b.name))
                .then(a.id.cmp(&b.id))
        }),
        RosterOrder::Shuffled { seed } => {
            ordered.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
            ordered.shuffle(&mut StdRng::seed_from_u64(seed));
        }
    }
    ordered
}

/// Every round of a full round-robin cycle.
///
/// The first player stays fixed and the rest rotate one place per round; each round
/// pairs slot `i` with slot `n - 1 - i`. An odd roster gets a bye slot, and pairs
/// against it are left out. Same input order, same schedule.
pub fn round_robin_schedule(roster: &[PlayerId]) -> Result<Vec<Vec<Pairing>>, TournamentError> {
    if roster.len() < MIN_PLAYERS {
        return Err(TournamentError::InsufficientPlayers {
            required: MIN_PLAYERS,
            found: roster.len(),
        });
    }
    let mut slots: Vec<Option<PlayerId>> = roster.iter().copied().map(Some).collect();
    if slots.len() % 2 == 1 {
        slots.push(None);
    }
    let n = slots.len();

    let mut rounds = Vec::with_capacity(n - 1);
    for r in 0..n - 1 {
        let round = r as u32 + 1;
        let pairs = (0..n / 2)
            .filter_map(|i| match (slots[i], slots[n - 1 - i]) {
                (Some(a), Some(b)) => Some(Pairing::new(round, a, b)),
                _ => None,
            })
            .collect();
        rounds.push(pairs);
        slots[1..].rotate_right(1);
    }
    Ok(rounds)
}

/// Replace the tournament's matches with a fresh round-robin cycle and restart match ids.
/// Callers run this inside a store transaction.
pub(crate) fn write_round_robin<S: Storage>(
    store: &mut S,
    config: &EngineConfig,
    tournament_id: TournamentId,
) -> Result<Vec<GameMatch>, TournamentError> {
    let roster = order_roster(&store.roster(tournament_id)?, config.roster_order);
    let ids: Vec<PlayerId> = roster.iter().map(|p| p.id).collect();
    let rounds = round_robin_schedule(&ids)?;

    store.delete_matches(tournament_id, None)?;
    store.reset_match_ids(tournament_id)?;
    let pairings: Vec<Pairing> = rounds.into_iter().flatten().collect();
    let inserted = store.insert_matches(tournament_id, &pairings)?;
    log::info!(
        "Tournament {}: round-robin schedule of {} rounds, {} matches for {} players",
        tournament_id,
        if ids.len() % 2 == 0 { ids.len() - 1 } else { ids.len() },
        inserted.len(),
        ids.len()
    );
    Ok(inserted)
}
