//! Tournament pairing engine: round-robin and Swiss scheduling, result entry,
//! standings with tiebreaks, and finalized results over a pluggable store.

pub mod config;
pub mod export;
pub mod logic;
pub mod models;
pub mod storage;

pub use config::{EngineConfig, RosterOrder, SwissMatcher, TiebreakerChain};
pub use export::{export_csv, export_rows, write_csv, ExportRow};
pub use logic::{
    add_player, compute_standings, confirm_result, create_tournament, delete_player,
    delete_tournament, finalize_tournament, generate_swiss_round, get_direct_encounter,
    get_results, get_standings, get_tiebreak_values, has_point_ties, join_player, lock_match,
    rebuild_swiss_round, remove_player, rename_player, rename_tournament, reset_tournament,
    round_matches, rounds, start_tournament, submit_result, unlock_match, FinalizeMode, Standing,
    Tiebreaker,
};
pub use models::{
    ErrorKind, GameMatch, MatchId, MatchResult, MatchState, PairingSystem, Player, PlayerId,
    RankedResult, TiebreakValues, Tournament, TournamentError, TournamentId, TournamentStatus,
};
pub use storage::{MemoryStore, Storage};
