//! Tournament, TournamentStatus, and the engine's error type.

use crate::models::game::MatchId;
use crate::models::player::PlayerId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Broad class of a `TournamentError`, used by callers to pick a response.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Validation,
    State,
    NotFound,
    Persistence,
}

/// Errors that can occur during tournament operations.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TournamentError {
    /// Roster too small to pair or start.
    InsufficientPlayers { required: usize, found: usize },
    /// A player with this name is already in the tournament (case-insensitive).
    DuplicatePlayerName(String),
    EmptyPlayerName,
    EmptyTournamentName,
    /// Round numbers start at 1 and must exist.
    InvalidRound(u32),
    /// A match would pair a player with themselves.
    SamePlayer(PlayerId),
    InvalidConfig(String),
    /// The configured number of Swiss rounds has already been generated.
    RoundLimitReached { limit: u32 },
    /// The most recent round still has unplayed matches.
    PreviousRoundIncomplete { round: u32 },
    /// Results cannot change while a match is locked.
    MatchLocked(MatchId),
    /// Locking needs a recorded result.
    ResultMissing(MatchId),
    /// Tournament or match is not in a state that allows this action.
    InvalidState {
        expected: &'static str,
        found: &'static str,
    },
    /// Finalize requested while matches are still unplayed.
    UnresolvedMatches { count: usize },
    /// Swiss finalize without admin override before the round limit.
    SwissLimitNotReached { limit: u32, played: u32 },
    /// Player is referenced by a recorded match and cannot be removed.
    PlayerInHistory(PlayerId),
    /// Round already has results and cannot be rebuilt.
    RoundAlreadyStarted { round: u32 },
    /// Every remaining player has already met every possible opponent.
    NoPairingsPossible { round: u32 },
    TournamentNotFound(TournamentId),
    PlayerNotFound(PlayerId),
    MatchNotFound(MatchId),
    /// Storage failure, message passed through from the collaborator.
    Persistence(String),
}

impl TournamentError {
    pub fn kind(&self) -> ErrorKind {
        use TournamentError::*;
        match self {
            InsufficientPlayers { .. }
            | DuplicatePlayerName(_)
            | EmptyPlayerName
            | EmptyTournamentName
            | InvalidRound(_)
            | SamePlayer(_)
            | InvalidConfig(_) => ErrorKind::Validation,
            RoundLimitReached { .. }
            | PreviousRoundIncomplete { .. }
            | MatchLocked(_)
            | ResultMissing(_)
            | InvalidState { .. }
            | UnresolvedMatches { .. }
            | SwissLimitNotReached { .. }
            | PlayerInHistory(_)
            | RoundAlreadyStarted { .. }
            | NoPairingsPossible { .. } => ErrorKind::State,
            TournamentNotFound(_) | PlayerNotFound(_) | MatchNotFound(_) => ErrorKind::NotFound,
            Persistence(_) => ErrorKind::Persistence,
        }
    }
}

impl std::fmt::Display for TournamentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TournamentError::InsufficientPlayers { required, found } => {
                write!(f, "Need at least {} players (have {})", required, found)
            }
            TournamentError::DuplicatePlayerName(name) => {
                write!(f, "A player named '{}' already exists in this tournament", name)
            }
            TournamentError::EmptyPlayerName => write!(f, "Player name cannot be empty"),
            TournamentError::EmptyTournamentName => write!(f, "Tournament name cannot be empty"),
            TournamentError::InvalidRound(round) => write!(f, "Round {} does not exist", round),
            TournamentError::SamePlayer(id) => {
                write!(f, "Player {} cannot be paired against themselves", id)
            }
            TournamentError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            TournamentError::RoundLimitReached { limit } => {
                write!(f, "Maximum number of Swiss rounds ({}) reached", limit)
            }
            TournamentError::PreviousRoundIncomplete { round } => {
                write!(f, "Round {} still has unplayed matches", round)
            }
            TournamentError::MatchLocked(id) => write!(f, "Match {} is locked", id),
            TournamentError::ResultMissing(id) => write!(f, "Match {} has no result to lock", id),
            TournamentError::InvalidState { expected, found } => {
                write!(f, "Invalid state for this action: expected {}, found {}", expected, found)
            }
            TournamentError::UnresolvedMatches { count } => {
                write!(f, "{} match(es) still have no result", count)
            }
            TournamentError::SwissLimitNotReached { limit, played } => write!(
                f,
                "Only {} of {} Swiss rounds played; an admin finalize is required",
                played, limit
            ),
            TournamentError::PlayerInHistory(id) => {
                write!(f, "Player {} has recorded matches and cannot be removed", id)
            }
            TournamentError::RoundAlreadyStarted { round } => {
                write!(f, "Round {} already has results", round)
            }
            TournamentError::NoPairingsPossible { round } => {
                write!(f, "No new pairings are possible for round {}", round)
            }
            TournamentError::TournamentNotFound(id) => write!(f, "Tournament {} not found", id),
            TournamentError::PlayerNotFound(id) => write!(f, "Player {} not found", id),
            TournamentError::MatchNotFound(id) => write!(f, "Match {} not found", id),
            TournamentError::Persistence(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for TournamentError {}

/// Surrogate key for a tournament.
pub type TournamentId = u32;

/// Lifecycle phase. Only moves forward.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    /// Registering players; no matches yet.
    #[default]
    Setup,
    /// Pairings generated; results being entered.
    Active,
    /// Final standings frozen; reporting only.
    Completed,
}

impl TournamentStatus {
    pub fn label(self) -> &'static str {
        match self {
            TournamentStatus::Setup => "setup",
            TournamentStatus::Active => "active",
            TournamentStatus::Completed => "completed",
        }
    }
}

/// How rounds are paired.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairingSystem {
    #[default]
    RoundRobin,
    Swiss,
}

/// Tournament record. Roster and matches live in the store, keyed by `id`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub status: TournamentStatus,
    pub pairing_system: PairingSystem,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Tournament {
    /// Create a new tournament in Setup.
    pub fn new(
        id: TournamentId,
        name: impl Into<String>,
        pairing_system: PairingSystem,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            status: TournamentStatus::Setup,
            pairing_system,
            created_at,
            started_at: None,
            completed_at: None,
        }
    }

    /// Fail with `InvalidState` unless the tournament is in `status`.
    pub fn ensure_status(&self, status: TournamentStatus) -> Result<(), TournamentError> {
        if self.status != status {
            return Err(TournamentError::InvalidState {
                expected: status.label(),
                found: self.status.label(),
            });
        }
        Ok(())
    }

    /// Setup -> Active.
    pub fn mark_started(&mut self, at: DateTime<Utc>) -> Result<(), TournamentError> {
        self.ensure_status(TournamentStatus::Setup)?;
        self.status = TournamentStatus::Active;
        self.started_at = Some(at);
        Ok(())
    }

    /// Active -> Completed.
    pub fn mark_completed(&mut self, at: DateTime<Utc>) -> Result<(), TournamentError> {
        self.ensure_status(TournamentStatus::Active)?;
        self.status = TournamentStatus::Completed;
        self.completed_at = Some(at);
        Ok(())
    }
}
