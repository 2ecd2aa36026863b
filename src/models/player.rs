//! Player data structure.

use serde::{Deserialize, Serialize};

/// Surrogate key for a player, allocated by the storage collaborator.
pub type PlayerId = u32;

/// A registered player. Players can belong to several tournaments.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    /// Unique within every tournament the player has joined (case-insensitive).
    pub name: String,
    pub seed: i32,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>, seed: i32) -> Self {
        Self {
            id,
            name: name.into(),
            seed,
        }
    }
}

/// Trim a proposed player name; `None` if nothing is left.
pub fn normalize_name(name: &str) -> Option<&str> {
    let trimmed = name.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
