//! Heroes, enemies, skills and items
//!
//! Heroes and enemies share one [`Combatant`] shape; what differs between them
//! lives in [`Role`]. HP and MP only change through the mutators here, which
//! clamp to `[0, max]` and keep `is_alive` equal to `hp > 0`.

use serde::{Deserialize, Serialize};

use crate::core::types::{CombatantId, ItemId, SkillId};

/// Attribute block shared by every combatant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CombatantStats {
    pub hp: u32,
    pub max_hp: u32,
    pub mp: u32,
    pub max_mp: u32,
    pub strength: u32,
    pub magic: u32,
    pub toughness: u32,
    pub magic_resistance: u32,
    pub agility: u32,
}

impl CombatantStats {
    /// Stats at full HP and MP
    #[allow(clippy::too_many_arguments)]
    pub fn full(
        max_hp: u32,
        max_mp: u32,
        strength: u32,
        magic: u32,
        toughness: u32,
        magic_resistance: u32,
        agility: u32,
    ) -> Self {
        Self {
            hp: max_hp,
            max_hp,
            mp: max_mp,
            max_mp,
            strength,
            magic,
            toughness,
            magic_resistance,
            agility,
        }
    }

    fn clamped(mut self) -> Self {
        self.hp = self.hp.min(self.max_hp);
        self.mp = self.mp.min(self.max_mp);
        self
    }
}

/// Which side of the battle a combatant fights on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Hero,
    Enemy,
}

impl Side {
    pub fn opponent(self) -> Self {
        match self {
            Side::Hero => Side::Enemy,
            Side::Enemy => Side::Hero,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillKind {
    Physical,
    Magical,
    Healing,
}

/// Who a skill or item may be aimed at, relative to its user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetScope {
    SingleEnemy,
    AllEnemies,
    SingleAlly,
    AllAllies,
    #[serde(rename = "self")]
    User,
}

impl TargetScope {
    /// Whether the scope points at the user's opponents
    pub fn hits_opponents(self) -> bool {
        matches!(self, TargetScope::SingleEnemy | TargetScope::AllEnemies)
    }

    /// Whether one pick stands for every eligible combatant
    pub fn is_area(self) -> bool {
        matches!(self, TargetScope::AllEnemies | TargetScope::AllAllies)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub id: SkillId,
    pub name: String,
    pub mp_cost: u32,
    pub power: u32,
    pub kind: SkillKind,
    pub target: TargetScope,
    #[serde(default)]
    pub description: String,
}

/// Named group of skills a hero draws from ("Black Magic", "Sword Tech")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillCategory {
    pub name: String,
    pub skills: Vec<Skill>,
}

impl SkillCategory {
    pub fn skill(&self, id: &SkillId) -> Option<&Skill> {
        self.skills.iter().find(|s| &s.id == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemEffect {
    HealHp,
    HealMp,
    Revive,
    CureStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub quantity: u32,
    pub effect: ItemEffect,
    pub power: u32,
    pub target: TargetScope,
    #[serde(default)]
    pub description: String,
}

impl Item {
    pub fn is_available(&self) -> bool {
        self.quantity > 0
    }
}

/// Spoils for defeating an enemy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rewards {
    pub exp: u32,
    pub gold: u32,
}

impl std::ops::Add for Rewards {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self {
            exp: self.exp.saturating_add(rhs.exp),
            gold: self.gold.saturating_add(rhs.gold),
        }
    }
}

/// Side-specific data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "side", rename_all = "snake_case")]
pub enum Role {
    Hero { skill_category: SkillCategory },
    Enemy { skills: Vec<Skill>, rewards: Rewards },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CombatantRecord")]
pub struct Combatant {
    pub id: CombatantId,
    pub name: String,
    pub color: String,
    pub role: Role,
    stats: CombatantStats,
    is_alive: bool,
}

/// Serialized form of a [`Combatant`]; `is_alive` is rederived on load
#[derive(Deserialize)]
struct CombatantRecord {
    id: CombatantId,
    name: String,
    #[serde(default)]
    color: String,
    role: Role,
    stats: CombatantStats,
}

impl From<CombatantRecord> for Combatant {
    fn from(record: CombatantRecord) -> Self {
        Self::with_role(record.id, record.name, record.stats, record.role).with_color(record.color)
    }
}

impl Combatant {
    pub fn hero(
        id: impl Into<CombatantId>,
        name: impl Into<String>,
        stats: CombatantStats,
        skill_category: SkillCategory,
    ) -> Self {
        Self::with_role(id.into(), name.into(), stats, Role::Hero { skill_category })
    }

    pub fn enemy(
        id: impl Into<CombatantId>,
        name: impl Into<String>,
        stats: CombatantStats,
        skills: Vec<Skill>,
        rewards: Rewards,
    ) -> Self {
        Self::with_role(id.into(), name.into(), stats, Role::Enemy { skills, rewards })
    }

    fn with_role(id: CombatantId, name: String, stats: CombatantStats, role: Role) -> Self {
        let stats = stats.clamped();
        Self {
            id,
            name,
            color: String::new(),
            role,
            is_alive: stats.hp > 0,
            stats,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn stats(&self) -> &CombatantStats {
        &self.stats
    }

    pub fn hp(&self) -> u32 {
        self.stats.hp
    }

    pub fn mp(&self) -> u32 {
        self.stats.mp
    }

    pub fn is_alive(&self) -> bool {
        self.is_alive
    }

    pub fn side(&self) -> Side {
        match self.role {
            Role::Hero { .. } => Side::Hero,
            Role::Enemy { .. } => Side::Enemy,
        }
    }

    /// Skills this combatant can use
    pub fn skills(&self) -> &[Skill] {
        match &self.role {
            Role::Hero { skill_category } => &skill_category.skills,
            Role::Enemy { skills, .. } => skills,
        }
    }

    pub fn skill_category(&self) -> Option<&SkillCategory> {
        match &self.role {
            Role::Hero { skill_category } => Some(skill_category),
            Role::Enemy { .. } => None,
        }
    }

    pub fn rewards(&self) -> Rewards {
        match &self.role {
            Role::Hero { .. } => Rewards::default(),
            Role::Enemy { rewards, .. } => *rewards,
        }
    }

    /// Subtract HP, flooring at zero. Returns true if this blow was fatal.
    pub fn take_damage(&mut self, amount: u32) -> bool {
        let was_alive = self.is_alive;
        self.stats.hp = self.stats.hp.saturating_sub(amount);
        self.sync_alive();
        was_alive && !self.is_alive
    }

    /// Restore HP up to the maximum. Returns the HP actually gained.
    pub fn restore_hp(&mut self, amount: u32) -> u32 {
        let before = self.stats.hp;
        self.stats.hp = self.stats.hp.saturating_add(amount).min(self.stats.max_hp);
        self.sync_alive();
        self.stats.hp - before
    }

    /// Restore MP up to the maximum. Returns the MP actually gained.
    pub fn restore_mp(&mut self, amount: u32) -> u32 {
        let before = self.stats.mp;
        self.stats.mp = self.stats.mp.saturating_add(amount).min(self.stats.max_mp);
        self.stats.mp - before
    }

    /// Deduct MP if there is enough of it
    pub fn spend_mp(&mut self, amount: u32) -> bool {
        if self.stats.mp < amount {
            return false;
        }
        self.stats.mp -= amount;
        true
    }

    /// Bring a fallen combatant back at `percent` of max HP.
    ///
    /// Living targets are left untouched. A revive that rounds down to zero HP
    /// leaves the target fallen.
    pub fn revive(&mut self, percent: u32) -> bool {
        if self.is_alive {
            return false;
        }
        let max_hp = u64::from(self.stats.max_hp);
        self.stats.hp = (max_hp * u64::from(percent) / 100).min(max_hp) as u32;
        self.sync_alive();
        self.is_alive
    }

    fn sync_alive(&mut self) {
        self.is_alive = self.stats.hp > 0;
    }
}
