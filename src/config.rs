//! Engine configuration, passed explicitly into every call that needs it.

use crate::logic::Tiebreaker;
use crate::models::{PairingSystem, TournamentError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default number of Swiss rounds.
pub const DEFAULT_SWISS_ROUNDS: u32 = 5;

/// Tiebreak metrics applied after points, in order.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TiebreakerChain {
    Single(Tiebreaker),
    Series(Vec<Tiebreaker>),
}

impl Default for TiebreakerChain {
    fn default() -> Self {
        TiebreakerChain::Single(Tiebreaker::BuchholzCutOne)
    }
}

impl TiebreakerChain {
    pub fn metrics(&self) -> &[Tiebreaker] {
        match self {
            TiebreakerChain::Single(t) => std::slice::from_ref(t),
            TiebreakerChain::Series(list) => list,
        }
    }
}

/// Swiss matching strategy.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwissMatcher {
    /// Top-down nearest unplayed opponent, no backtracking. Can leave players
    /// unpaired even when a full pairing exists.
    #[default]
    Greedy,
    /// Depth-first search for a complete pairing in the same preference order;
    /// falls back to the greedy result when none is found.
    Backtracking,
}

/// Order in which the roster is fed to the round-robin generator.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RosterOrder {
    #[default]
    Name,
    /// Seed ascending, then name.
    Seed,
    /// Name order shuffled with a fixed RNG seed; same seed gives the same order.
    Shuffled { seed: u64 },
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Pairing system given to newly created tournaments.
    pub pairing_system: PairingSystem,
    pub swiss_rounds: u32,
    pub tiebreakers: TiebreakerChain,
    pub swiss_matcher: SwissMatcher,
    pub roster_order: RosterOrder,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pairing_system: PairingSystem::RoundRobin,
            swiss_rounds: DEFAULT_SWISS_ROUNDS,
            tiebreakers: TiebreakerChain::default(),
            swiss_matcher: SwissMatcher::Greedy,
            roster_order: RosterOrder::Name,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), TournamentError> {
        if self.swiss_rounds == 0 {
            return Err(TournamentError::InvalidConfig(
                "swiss_rounds must be at least 1".into(),
            ));
        }
        let metrics = self.tiebreakers.metrics();
        if metrics.is_empty() {
            return Err(TournamentError::InvalidConfig(
                "tiebreaker series cannot be empty".into(),
            ));
        }
        // Head-to-head is pairwise and not transitive, so it cannot order a whole field.
        if metrics.contains(&Tiebreaker::DirectEncounter) {
            return Err(TournamentError::InvalidConfig(
                "direct encounter is a pairwise lookup and cannot be used in the ranking chain"
                    .into(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, TournamentError> {
        let config: EngineConfig = serde_json::from_str(json)
            .map_err(|e| TournamentError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, TournamentError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| TournamentError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.swiss_rounds, 5);
        assert_eq!(config.pairing_system, PairingSystem::RoundRobin);
        assert_eq!(config.tiebreakers.metrics(), &[Tiebreaker::BuchholzCutOne]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_partial_json() {
        let config = EngineConfig::from_json(
            r#"{
                "pairing_system": "swiss",
                "swiss_rounds": 7,
                "tiebreakers": {"series": ["sonneborn_berger", "number_of_wins"]},
                "roster_order": {"shuffled": {"seed": 42}}
            }"#,
        )
        .unwrap();
        assert_eq!(config.pairing_system, PairingSystem::Swiss);
        assert_eq!(config.swiss_rounds, 7);
        assert_eq!(
            config.tiebreakers.metrics(),
            &[Tiebreaker::SonnebornBerger, Tiebreaker::NumberOfWins]
        );
        assert_eq!(config.roster_order, RosterOrder::Shuffled { seed: 42 });
        assert_eq!(config.swiss_matcher, SwissMatcher::Greedy);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            EngineConfig::from_json(r#"{"swiss_rounds": 0}"#),
            Err(TournamentError::InvalidConfig(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{"tiebreakers": {"series": []}}"#),
            Err(TournamentError::InvalidConfig(_))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{"tiebreakers": {"single": "direct_encounter"}}"#),
            Err(TournamentError::InvalidConfig(_))
        ));
        assert!(matches!(
            EngineConfig::from_json("not json"),
            Err(TournamentError::InvalidConfig(_))
        ));
    }
}
