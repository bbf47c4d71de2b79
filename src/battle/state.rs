//! Battle state aggregate
//!
//! One [`BattleState`] exists per battle session. It is rebuilt from the
//! roster on every (re)start and owned by the
//! [`BattleController`](crate::battle::BattleController).

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::battle::combatant::{Combatant, Item, Rewards, Side, Skill};
use crate::battle::log::MessageLog;
use crate::battle::roster::Roster;
use crate::battle::turn_order::TurnOrderEntry;
use crate::core::types::{CombatantId, ItemId, Millis};

/// Battle phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattlePhase {
    #[default]
    Start, // Waiting for the battle to begin
    TurnOrder,     // Round queue just computed
    PlayerCommand, // Hero picks attack / skill / item / flee
    PlayerTarget,  // Aiming an attack
    PlayerSkill,   // Picking a skill, then its target
    PlayerItem,    // Picking an item, then its target
    Executing,     // Action playing out
    EnemyTurn,     // Enemy deciding
    Victory,
    Defeat,
    Fled,
}

impl BattlePhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, BattlePhase::Victory | BattlePhase::Defeat | BattlePhase::Fled)
    }

    /// Phases in which the engine is waiting on the player
    pub fn awaits_input(self) -> bool {
        matches!(
            self,
            BattlePhase::PlayerCommand
                | BattlePhase::PlayerTarget
                | BattlePhase::PlayerSkill
                | BattlePhase::PlayerItem
        )
    }
}

/// Battle outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleOutcome {
    Victory,
    Defeat,
    Escaped,
}

/// Top-level hero commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    Attack,
    Skill,
    Item,
    Flee,
}

/// Choices made so far on the acting hero's turn
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub command: Option<CommandKind>,
    pub skill: Option<Skill>,
    pub item: Option<ItemId>,
}

impl Selection {
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Complete battle state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleState {
    // Combatants and inventory
    pub heroes: Vec<Combatant>,
    pub enemies: Vec<Combatant>,
    pub items: Vec<Item>,

    // Flow
    pub phase: BattlePhase,
    pub turn_order: Vec<TurnOrderEntry>,
    pub current_turn_index: usize,
    pub round: u32,
    pub selection: Selection,

    // Escape
    pub flee_attempts: u32,
    pub flee_ready: AHashSet<CombatantId>,

    // Log
    pub messages: MessageLog,
    /// Virtual clock; stamps new messages
    pub clock: Millis,
}

impl BattleState {
    /// Fresh state deep-copied from the roster
    pub fn new(roster: &Roster, clock: Millis) -> Self {
        Self {
            heroes: roster.heroes.clone(),
            enemies: roster.enemies.clone(),
            items: roster.items.clone(),
            phase: BattlePhase::Start,
            turn_order: Vec::new(),
            current_turn_index: 0,
            round: 0,
            selection: Selection::default(),
            flee_attempts: 0,
            flee_ready: AHashSet::new(),
            messages: MessageLog::new(),
            clock,
        }
    }

    /// Is the battle finished?
    pub fn is_finished(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn outcome(&self) -> Option<BattleOutcome> {
        match self.phase {
            BattlePhase::Victory => Some(BattleOutcome::Victory),
            BattlePhase::Defeat => Some(BattleOutcome::Defeat),
            BattlePhase::Fled => Some(BattleOutcome::Escaped),
            _ => None,
        }
    }

    /// Log a battle message at the current clock
    pub fn log(&mut self, text: impl Into<String>) {
        self.messages.push(text, self.clock);
    }

    pub fn alive_heroes(&self) -> impl Iterator<Item = &Combatant> {
        self.heroes.iter().filter(|h| h.is_alive())
    }

    pub fn alive_enemies(&self) -> impl Iterator<Item = &Combatant> {
        self.enemies.iter().filter(|e| e.is_alive())
    }

    pub fn side(&self, side: Side) -> &[Combatant] {
        match side {
            Side::Hero => &self.heroes,
            Side::Enemy => &self.enemies,
        }
    }

    /// Get a combatant from either side
    pub fn combatant(&self, id: &CombatantId) -> Option<&Combatant> {
        self.heroes
            .iter()
            .chain(&self.enemies)
            .find(|c| &c.id == id)
    }

    /// Get a mutable combatant from either side
    pub fn combatant_mut(&mut self, id: &CombatantId) -> Option<&mut Combatant> {
        self.heroes
            .iter_mut()
            .chain(self.enemies.iter_mut())
            .find(|c| &c.id == id)
    }

    pub fn item(&self, id: &ItemId) -> Option<&Item> {
        self.items.iter().find(|i| &i.id == id)
    }

    pub fn item_mut(&mut self, id: &ItemId) -> Option<&mut Item> {
        self.items.iter_mut().find(|i| &i.id == id)
    }

    /// Items that can still be picked from the menu
    pub fn available_items(&self) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(|i| i.is_available())
    }

    pub fn current_entry(&self) -> Option<&TurnOrderEntry> {
        self.turn_order.get(self.current_turn_index)
    }

    /// Whoever holds the current slot in the round queue
    pub fn current_actor(&self) -> Option<&Combatant> {
        self.current_entry()
            .and_then(|entry| self.combatant(&entry.actor_id))
    }

    /// The acting hero, if the current slot belongs to a living hero
    pub fn current_hero(&self) -> Option<&Combatant> {
        self.current_actor()
            .filter(|c| c.side() == Side::Hero && c.is_alive())
    }

    pub fn clear_flee_ready(&mut self) {
        self.flee_ready.clear();
    }

    /// Whether every living hero has committed to fleeing
    pub fn party_ready_to_flee(&self) -> bool {
        self.alive_heroes().all(|h| self.flee_ready.contains(&h.id))
    }

    /// Experience and gold for the whole enemy group
    pub fn rewards(&self) -> Rewards {
        self.enemies
            .iter()
            .map(Combatant::rewards)
            .fold(Rewards::default(), |acc, r| acc + r)
    }
}

/// Decide whether the battle is over.
///
/// Victory is checked first, so it wins if both sides are somehow wiped out.
pub fn check_battle_end(state: &BattleState) -> Option<BattleOutcome> {
    if state.alive_enemies().next().is_none() {
        return Some(BattleOutcome::Victory);
    }
    if state.alive_heroes().next().is_none() {
        return Some(BattleOutcome::Defeat);
    }
    None
}
