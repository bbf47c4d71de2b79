pub mod config;
pub mod error;
pub mod types;

pub use config::{load_config, ConfigError, EngineConfig, EnemyTactics, PacingConfig};
pub use error::{BattleError, Result};
