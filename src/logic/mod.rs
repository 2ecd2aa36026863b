//! Tournament business logic: scheduling, result entry, standings and finalize.

pub mod finalize;
pub mod matches;
pub mod round_robin;
pub mod setup;
pub mod standings;
pub mod swiss;
pub mod tiebreak;

pub use finalize::{finalize_tournament, get_results, FinalizeMode};
pub use matches::{confirm_result, lock_match, round_matches, rounds, submit_result, unlock_match};
pub use round_robin::{order_roster, round_robin_schedule, MIN_PLAYERS};
pub use setup::{
    add_player, create_tournament, delete_player, delete_tournament, join_player,
    remove_player, rename_player, rename_tournament, reset_tournament, start_tournament,
};
pub use standings::{
    compute_standings, get_direct_encounter, get_standings, get_tiebreak_values,
    has_point_ties, Standing,
};
pub use swiss::{generate_swiss_round, next_swiss_round, rebuild_swiss_round};
pub use tiebreak::Tiebreaker;
