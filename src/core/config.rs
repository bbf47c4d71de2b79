//! Engine configuration with documented defaults
//!
//! Pacing values mirror the presentation delays of the battle screen. They
//! only order events on the virtual clock; nothing sleeps.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::Millis;

/// Errors raised while loading configuration or roster files
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    /// A combatant references a skill missing from the skill library
    #[error("Skill not found: {0}")]
    SkillNotFound(String),
    /// Two definitions share an id
    #[error("Duplicate id: {0}")]
    DuplicateId(String),
    /// Values that parse but make no sense together
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Delays between battle events, in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    // === ROUND FLOW ===
    /// From "Battle Start!" to the first turn order computation
    pub battle_start_ms: Millis,
    /// From turn order computation to the first actor's dispatch
    pub turn_order_ms: Millis,

    // === ENEMY TURNS ===
    /// Enemy "thinking" time after its turn is dispatched
    pub enemy_think_ms: Millis,
    /// From the enemy's turn announcement to its action resolving
    pub enemy_act_ms: Millis,

    // === SETTLE TIMES ===
    /// Hold after an attack before the turn advances
    pub attack_settle_ms: Millis,
    /// Hold after a skill before the turn advances
    pub skill_settle_ms: Millis,
    /// Hold after an item before the turn advances
    pub item_settle_ms: Millis,
    /// Hold after a failed escape before the turn advances
    pub flee_fail_settle_ms: Millis,
    /// Hold after a hero commits to fleeing while others have not
    pub flee_commit_settle_ms: Millis,
    /// From the last commitment to the party's escape roll
    pub party_flee_ms: Millis,

    /// Lag of follow-up messages ("X is defeated!") behind their action.
    /// Nested follow-ups stack this delay.
    pub follow_up_ms: Millis,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            battle_start_ms: 1000,
            turn_order_ms: 500,
            enemy_think_ms: 800,
            enemy_act_ms: 600,
            attack_settle_ms: 1200,
            skill_settle_ms: 1500,
            item_settle_ms: 1200,
            flee_fail_settle_ms: 1000,
            flee_commit_settle_ms: 800,
            party_flee_ms: 500,
            follow_up_ms: 300,
        }
    }
}

/// How enemies pick their actions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTactics {
    /// Probability of using an affordable skill instead of attacking
    ///
    /// At 0.0 enemies only ever attack, which is how the stock roster plays.
    pub skill_chance: f64,
}

impl Default for EnemyTactics {
    fn default() -> Self {
        Self { skill_chance: 0.0 }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// RNG seed; `None` seeds from OS entropy
    pub seed: Option<u64>,
    /// Number of messages in the "recent" view of the log
    pub message_window: usize,
    /// Presentation pacing
    pub pacing: PacingConfig,
    /// Enemy behavior
    pub tactics: EnemyTactics,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: None,
            message_window: 5,
            pacing: PacingConfig::default(),
            tactics: EnemyTactics::default(),
        }
    }
}

impl EngineConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config with a fixed seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Parse a config from TOML text; missing fields take their defaults
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.message_window == 0 {
            return Err(ConfigError::Invalid("message_window must be at least 1".into()));
        }

        if !(0.0..=1.0).contains(&self.tactics.skill_chance) {
            return Err(ConfigError::Invalid(format!(
                "tactics.skill_chance ({}) must be within 0.0..=1.0",
                self.tactics.skill_chance
            )));
        }

        Ok(())
    }
}

/// Load engine configuration from a TOML file
pub fn load_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config = EngineConfig::from_toml_str(&contents)?;
    tracing::debug!(path = %path.display(), "loaded engine config");
    Ok(config)
}
