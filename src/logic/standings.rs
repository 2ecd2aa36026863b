//! Point tallies and ranking: points, then the tiebreaker chain, then name.

use crate::config::{EngineConfig, TiebreakerChain};
use crate::logic::tiebreak::{direct_encounter, points_by_player, tiebreak_values, Tiebreaker};
use crate::models::{
    GameMatch, Player, PlayerId, RankedResult, TiebreakValues, TournamentError, TournamentId,
    TournamentStatus,
};
use crate::storage::Storage;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// One line of the standings table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub rank: u32,
    pub player_id: PlayerId,
    pub name: String,
    pub points: f64,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub tiebreaks: TiebreakValues,
}

impl Standing {
    pub fn games(&self) -> u32 {
        self.wins + self.losses + self.draws
    }

    pub fn to_result(&self, tournament_id: TournamentId) -> RankedResult {
        RankedResult {
            tournament_id,
            player_id: self.player_id,
            player_name: self.name.clone(),
            rank: self.rank,
            points: self.points,
            wins: self.wins,
            losses: self.losses,
            draws: self.draws,
            tiebreaks: self.tiebreaks,
        }
    }
}

impl From<&RankedResult> for Standing {
    fn from(r: &RankedResult) -> Self {
        Self {
            rank: r.rank,
            player_id: r.player_id,
            name: r.player_name.clone(),
            points: r.points,
            wins: r.wins,
            losses: r.losses,
            draws: r.draws,
            tiebreaks: r.tiebreaks,
        }
    }
}

/// Unranked W/L/D and points per player, in roster order. Tiebreaks are filled in.
pub fn tally(players: &[Player], matches: &[GameMatch]) -> Vec<Standing> {
    let points = points_by_player(matches);
    players
        .iter()
        .map(|p| {
            let mut row = Standing {
                rank: 0,
                player_id: p.id,
                name: p.name.clone(),
                points: 0.0,
                wins: 0,
                losses: 0,
                draws: 0,
                tiebreaks: tiebreak_values(p.id, matches, &points),
            };
            for score in matches.iter().filter_map(|m| m.score_for(p.id)) {
                row.points += score;
                if score == 1.0 {
                    row.wins += 1;
                } else if score == 0.5 {
                    row.draws += 1;
                } else {
                    row.losses += 1;
                }
            }
            row
        })
        .collect()
}

/// Total order: points desc, each chain metric desc, name asc, id asc.
pub fn compare_standings(a: &Standing, b: &Standing, chain: &[Tiebreaker]) -> Ordering {
    b.points
        .total_cmp(&a.points)
        .then_with(|| {
            chain
                .iter()
                .filter_map(|t| Some((t.value(&a.tiebreaks)?, t.value(&b.tiebreaks)?)))
                .map(|(va, vb)| vb.total_cmp(&va))
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.player_id.cmp(&b.player_id))
}

/// Ranked standings with contiguous ranks 1..N.
pub fn compute_standings(
    players: &[Player],
    matches: &[GameMatch],
    chain: &TiebreakerChain,
) -> Vec<Standing> {
    let mut rows = tally(players, matches);
    rows.sort_by(|a, b| compare_standings(a, b, chain.metrics()));
    for (i, row) in rows.iter_mut().enumerate() {
        row.rank = i as u32 + 1;
    }
    rows
}

/// Whether two or more players share a point total, i.e. whether tiebreaks matter.
pub fn has_point_ties(standings: &[Standing]) -> bool {
    standings
        .iter()
        .enumerate()
        .any(|(i, a)| standings[i + 1..].iter().any(|b| a.points == b.points))
}

/// Current standings of a tournament. Completed tournaments report their frozen results.
pub fn get_standings<S: Storage>(
    store: &S,
    config: &EngineConfig,
    tournament_id: TournamentId,
) -> Result<Vec<Standing>, TournamentError> {
    let tournament = store.tournament(tournament_id)?;
    if tournament.status == TournamentStatus::Completed {
        let mut frozen: Vec<Standing> = store
            .results(tournament_id)?
            .iter()
            .map(Standing::from)
            .collect();
        frozen.sort_by_key(|s| s.rank);
        return Ok(frozen);
    }
    let players = store.roster(tournament_id)?;
    let matches = store.matches(tournament_id)?;
    Ok(compute_standings(&players, &matches, &config.tiebreakers))
}

/// Tiebreak metrics for every rostered player.
pub fn get_tiebreak_values<S: Storage>(
    store: &S,
    tournament_id: TournamentId,
) -> Result<BTreeMap<PlayerId, TiebreakValues>, TournamentError> {
    let players = store.roster(tournament_id)?;
    let matches = store.matches(tournament_id)?;
    let points = points_by_player(&matches);
    Ok(players
        .iter()
        .map(|p| (p.id, tiebreak_values(p.id, &matches, &points)))
        .collect())
}

/// Head-to-head score of `a` against `b` in this tournament.
pub fn get_direct_encounter<S: Storage>(
    store: &S,
    tournament_id: TournamentId,
    a: PlayerId,
    b: PlayerId,
) -> Result<f64, TournamentError> {
    store.player(a)?;
    store.player(b)?;
    let matches = store.matches(tournament_id)?;
    Ok(direct_encounter(a, b, &matches))
}
