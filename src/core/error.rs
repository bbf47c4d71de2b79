use thiserror::Error;

use crate::battle::BattlePhase;
use crate::core::types::{CombatantId, ItemId, SkillId};

/// Rejected engine input. Domain outcomes such as running out of MP are
/// reported through the battle log instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BattleError {
    #[error("{action} is not accepted during the {phase:?} phase")]
    WrongPhase {
        action: &'static str,
        phase: BattlePhase,
    },

    #[error("no hero is currently acting")]
    NoActiveHero,

    #[error("skill not available to the acting hero: {0}")]
    UnknownSkill(SkillId),

    #[error("item not in inventory: {0}")]
    UnknownItem(ItemId),

    #[error("illegal target for the current selection: {0}")]
    IllegalTarget(CombatantId),

    #[error("no target given")]
    EmptyTargetSelection,

    #[error("nothing selected to aim")]
    NothingSelected,

    #[error("{0} is not the acting hero")]
    NotCurrentActor(CombatantId),
}

pub type Result<T> = std::result::Result<T, BattleError>;
