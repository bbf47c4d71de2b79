//! Enemy decision-making
//!
//! The controller asks a [`BattleAi`] what an enemy does when its turn comes
//! up. Implementations are swappable; [`AiCommander`] is the stock one.

mod commander;

pub use commander::AiCommander;

use serde::{Deserialize, Serialize};

use crate::battle::combatant::{Combatant, Skill};
use crate::battle::state::BattleState;
use crate::core::types::CombatantId;

/// What an enemy decided to do with its turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EnemyAction {
    Attack { target: CombatantId },
    Skill { skill: Skill, targets: Vec<CombatantId> },
}

/// Trait for enemy AI implementations
pub trait BattleAi {
    /// Pick an action for `enemy`. `None` means there is nobody to act on.
    fn choose_action(&mut self, enemy: &Combatant, state: &BattleState) -> Option<EnemyAction>;
}
