//! Party Battle - turn-based party combat engine
//!
//! A hero party faces an enemy group. The [`battle::BattleController`] runs
//! the turn order, takes the player's commands, lets enemies act, and keeps a
//! narrated log until the party wins, falls or escapes.

pub mod battle;
pub mod core;
