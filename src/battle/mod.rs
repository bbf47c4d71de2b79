//! Battle system - turn-based party combat
//!
//! Heroes and enemies act once per round in agility order. Heroes wait for
//! the player; enemies decide through a [`BattleAi`]. Presentation delays run
//! on a virtual clock, so the same battle plays out identically whether it is
//! paced for a screen or fast-forwarded.

pub mod ai;
pub mod combatant;
pub mod constants;
pub mod execution;
pub mod log;
pub mod resolution;
pub mod roster;
pub mod scheduler;
pub mod state;
pub mod targeting;
pub mod turn_order;

// Re-exports for convenient access
pub use ai::{AiCommander, BattleAi, EnemyAction};
pub use combatant::{
    Combatant, CombatantStats, Item, ItemEffect, Rewards, Role, Side, Skill, SkillCategory,
    SkillKind, TargetScope,
};
pub use constants::*;
pub use execution::{BattleController, Continuation};
pub use log::{BattleMessage, MessageLog};
pub use resolution::{
    attack_damage, commit_flee, flee_chance, heal_amount, resolve_attack, resolve_flee,
    resolve_item, resolve_skill, roll_variance, skill_base_damage, skill_damage,
    FleeCommitment, FleeResult, FollowUp, Resolution, ResolutionStatus,
};
pub use roster::{load_roster, Roster};
pub use scheduler::Scheduler;
pub use state::{check_battle_end, BattleOutcome, BattlePhase, BattleState, CommandKind, Selection};
pub use targeting::{current_aim, is_legal_target, legal_targets, resolve_selection, Aim, TargetSelection};
pub use turn_order::{calculate_turn_order, TurnOrderEntry};
