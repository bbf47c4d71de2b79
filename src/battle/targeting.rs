//! Which combatants the acting hero may aim at
//!
//! The current phase and pending selection decide a target scope. Scopes are
//! relative to the acting hero: "enemies" are its opponents, "allies" its own
//! party. Area scopes are picked with a single target and expand to the whole
//! eligible side.

use serde::{Deserialize, Serialize};

use crate::battle::combatant::{Combatant, ItemEffect, TargetScope};
use crate::battle::state::{BattlePhase, BattleState};
use crate::core::error::{BattleError, Result};
use crate::core::types::CombatantId;

/// Target ids handed in by the player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetSelection {
    One(CombatantId),
    Many(Vec<CombatantId>),
}

impl TargetSelection {
    pub fn ids(&self) -> &[CombatantId] {
        match self {
            TargetSelection::One(id) => std::slice::from_ref(id),
            TargetSelection::Many(ids) => ids,
        }
    }
}

impl From<CombatantId> for TargetSelection {
    fn from(id: CombatantId) -> Self {
        TargetSelection::One(id)
    }
}

impl From<&str> for TargetSelection {
    fn from(id: &str) -> Self {
        TargetSelection::One(CombatantId::new(id))
    }
}

impl From<Vec<CombatantId>> for TargetSelection {
    fn from(ids: Vec<CombatantId>) -> Self {
        TargetSelection::Many(ids)
    }
}

/// What the pending selection is aimed with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aim {
    pub scope: TargetScope,
    /// Fallen combatants are eligible too (revive items)
    pub include_fallen: bool,
}

/// The aim implied by the current phase, if a target is being awaited
pub fn current_aim(state: &BattleState) -> Option<Aim> {
    match state.phase {
        BattlePhase::PlayerTarget => Some(Aim {
            scope: TargetScope::SingleEnemy,
            include_fallen: false,
        }),
        BattlePhase::PlayerSkill => state.selection.skill.as_ref().map(|skill| Aim {
            scope: skill.target,
            include_fallen: false,
        }),
        BattlePhase::PlayerItem => state
            .selection
            .item
            .as_ref()
            .and_then(|id| state.item(id))
            .map(|item| Aim {
                scope: item.target,
                include_fallen: item.effect == ItemEffect::Revive,
            }),
        _ => None,
    }
}

fn eligible<'a>(state: &'a BattleState, actor: &'a Combatant, aim: Aim) -> Vec<&'a Combatant> {
    let pool: Vec<&Combatant> = match aim.scope {
        TargetScope::User => vec![actor],
        scope if scope.hits_opponents() => state.side(actor.side().opponent()).iter().collect(),
        _ => state.side(actor.side()).iter().collect(),
    };
    pool.into_iter()
        .filter(|c| aim.include_fallen || c.is_alive())
        .collect()
}

/// Every id the acting hero could pick right now, in roster order
pub fn legal_targets(state: &BattleState) -> Vec<CombatantId> {
    let (Some(actor), Some(aim)) = (state.current_hero(), current_aim(state)) else {
        return Vec::new();
    };
    eligible(state, actor, aim)
        .into_iter()
        .map(|c| c.id.clone())
        .collect()
}

pub fn is_legal_target(state: &BattleState, id: &CombatantId) -> bool {
    legal_targets(state).contains(id)
}

/// Check a player's pick against the current aim and expand area scopes.
///
/// Single scopes take exactly one id. Area scopes take any non-empty set of
/// legal ids and resolve to every eligible combatant on that side.
pub fn resolve_selection(state: &BattleState, selection: &TargetSelection) -> Result<Vec<CombatantId>> {
    let actor = state.current_hero().ok_or(BattleError::NoActiveHero)?;
    let aim = current_aim(state).ok_or(BattleError::NothingSelected)?;

    let picked = selection.ids();
    let first = picked.first().ok_or(BattleError::EmptyTargetSelection)?;

    let legal: Vec<CombatantId> = eligible(state, actor, aim)
        .into_iter()
        .map(|c| c.id.clone())
        .collect();
    if let Some(bad) = picked.iter().find(|id| !legal.contains(id)) {
        return Err(BattleError::IllegalTarget(bad.clone()));
    }

    if aim.scope.is_area() {
        return Ok(legal);
    }
    if let Some(extra) = picked.get(1) {
        return Err(BattleError::IllegalTarget(extra.clone()));
    }
    Ok(vec![first.clone()])
}
