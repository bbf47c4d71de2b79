//! Static battle definitions: party, enemy group and starting inventory
//!
//! A [`Roster`] is the canonical copy. Every battle starts from a deep clone of
//! it, so nothing that happens in a fight leaks back into the definitions.
//! Rosters load from TOML where combatants name their skills by id:
//!
//! ```toml
//! [[skills]]
//! id = "fire"
//! name = "Fire"
//! mp_cost = 4
//! power = 25
//! kind = "magical"
//! target = "single_enemy"
//!
//! [[heroes]]
//! id = "hero_2"
//! name = "Terra"
//! stats = { hp = 85, max_hp = 85, mp = 60, max_mp = 60, strength = 12, magic = 28, toughness = 10, magic_resistance = 22, agility = 18 }
//! skill_category = { name = "Black Magic", skills = ["fire"] }
//! ```

use std::fs;
use std::path::Path;

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::battle::combatant::{
    Combatant, CombatantStats, Item, ItemEffect, Rewards, Skill, SkillCategory, SkillKind,
    TargetScope,
};
use crate::core::config::ConfigError;
use crate::core::types::{ItemId, SkillId};

/// Resolved battle definitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    pub heroes: Vec<Combatant>,
    pub enemies: Vec<Combatant>,
    pub items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct RosterFile {
    #[serde(default)]
    skills: Vec<Skill>,
    #[serde(default)]
    heroes: Vec<HeroEntry>,
    #[serde(default)]
    enemies: Vec<EnemyEntry>,
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct HeroEntry {
    id: String,
    name: String,
    #[serde(default)]
    color: String,
    stats: CombatantStats,
    skill_category: CategoryEntry,
}

#[derive(Debug, Deserialize)]
struct CategoryEntry {
    name: String,
    #[serde(default)]
    skills: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EnemyEntry {
    id: String,
    name: String,
    #[serde(default)]
    color: String,
    stats: CombatantStats,
    #[serde(default)]
    skills: Vec<String>,
    #[serde(default)]
    rewards: Rewards,
}

impl Roster {
    pub fn new(heroes: Vec<Combatant>, enemies: Vec<Combatant>, items: Vec<Item>) -> Self {
        Self {
            heroes,
            enemies,
            items,
        }
    }

    /// Parse a roster from TOML text, resolving skill references
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let file: RosterFile = toml::from_str(contents)?;
        Self::from_file(file)
    }

    fn from_file(file: RosterFile) -> Result<Self, ConfigError> {
        let lookup = |id: &String| -> Result<Skill, ConfigError> {
            file.skills
                .iter()
                .find(|s| s.id.0 == *id)
                .cloned()
                .ok_or_else(|| ConfigError::SkillNotFound(id.clone()))
        };

        let mut heroes = Vec::with_capacity(file.heroes.len());
        for entry in &file.heroes {
            let skills = entry
                .skill_category
                .skills
                .iter()
                .map(lookup)
                .collect::<Result<Vec<_>, _>>()?;
            let category = SkillCategory {
                name: entry.skill_category.name.clone(),
                skills,
            };
            heroes.push(
                Combatant::hero(entry.id.as_str(), entry.name.clone(), entry.stats, category)
                    .with_color(entry.color.clone()),
            );
        }

        let mut enemies = Vec::with_capacity(file.enemies.len());
        for entry in &file.enemies {
            let skills = entry.skills.iter().map(lookup).collect::<Result<Vec<_>, _>>()?;
            enemies.push(
                Combatant::enemy(
                    entry.id.as_str(),
                    entry.name.clone(),
                    entry.stats,
                    skills,
                    entry.rewards,
                )
                .with_color(entry.color.clone()),
            );
        }

        let roster = Self::new(heroes, enemies, file.items);
        roster.validate()?;
        Ok(roster)
    }

    /// Ids must be unique across all combatants, and across items
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = AHashSet::new();
        for combatant in self.heroes.iter().chain(&self.enemies) {
            if !seen.insert(combatant.id.as_str()) {
                return Err(ConfigError::DuplicateId(combatant.id.to_string()));
            }
        }

        let mut seen_items = AHashSet::new();
        for item in &self.items {
            if !seen_items.insert(&item.id) {
                return Err(ConfigError::DuplicateId(item.id.to_string()));
            }
        }
        Ok(())
    }

    /// The stock encounter: Cloud, Terra and Rosa against two goblins and an orc
    pub fn builtin() -> Self {
        let skill = |id: &str, name: &str, mp_cost, power, kind, target, description: &str| Skill {
            id: SkillId::new(id),
            name: name.into(),
            mp_cost,
            power,
            kind,
            target,
            description: description.into(),
        };

        let sword_tech = SkillCategory {
            name: "Sword Tech".into(),
            skills: vec![
                skill("power_slash", "Power Slash", 6, 40, SkillKind::Physical, TargetScope::SingleEnemy, "A powerful sword strike"),
                skill("whirlwind", "Whirlwind", 12, 25, SkillKind::Physical, TargetScope::AllEnemies, "Attacks all enemies with spinning strike"),
            ],
        };
        let black_magic = SkillCategory {
            name: "Black Magic".into(),
            skills: vec![
                skill("fire", "Fire", 4, 25, SkillKind::Magical, TargetScope::SingleEnemy, "Deals fire damage to one enemy"),
                skill("blizzard", "Blizzard", 4, 25, SkillKind::Magical, TargetScope::SingleEnemy, "Deals ice damage to one enemy"),
                skill("thunder", "Thunder", 4, 25, SkillKind::Magical, TargetScope::SingleEnemy, "Deals lightning damage to one enemy"),
            ],
        };
        let white_magic = SkillCategory {
            name: "White Magic".into(),
            skills: vec![
                skill("cure", "Cure", 5, 30, SkillKind::Healing, TargetScope::SingleAlly, "Restores HP to one ally"),
                skill("cura", "Cura", 12, 60, SkillKind::Healing, TargetScope::SingleAlly, "Restores more HP to one ally"),
                skill("heal_all", "Heal All", 18, 40, SkillKind::Healing, TargetScope::AllAllies, "Restores HP to all allies"),
            ],
        };
        let goblin_punch = skill("goblin_punch", "Goblin Punch", 0, 15, SkillKind::Physical, TargetScope::SingleEnemy, "A wild punch");
        let heavy_swing = skill("heavy_swing", "Heavy Swing", 0, 25, SkillKind::Physical, TargetScope::SingleEnemy, "A heavy weapon swing");

        let heroes = vec![
            Combatant::hero("hero_1", "Cloud", CombatantStats::full(120, 30, 25, 15, 18, 12, 20), sword_tech)
                .with_color("#4a90d9"),
            Combatant::hero("hero_2", "Terra", CombatantStats::full(85, 60, 12, 28, 10, 22, 18), black_magic)
                .with_color("#9b59b6"),
            Combatant::hero("hero_3", "Rosa", CombatantStats::full(75, 55, 10, 25, 8, 20, 22), white_magic)
                .with_color("#f1c40f"),
        ];

        let goblin_rewards = Rewards { exp: 15, gold: 10 };
        let enemies = vec![
            Combatant::enemy("enemy_1", "Goblin", CombatantStats::full(45, 0, 12, 5, 8, 6, 15), vec![goblin_punch.clone()], goblin_rewards)
                .with_color("#27ae60"),
            Combatant::enemy("enemy_2", "Goblin", CombatantStats::full(45, 0, 12, 5, 8, 6, 14), vec![goblin_punch], goblin_rewards)
                .with_color("#27ae60"),
            Combatant::enemy("enemy_3", "Orc", CombatantStats::full(80, 0, 20, 8, 15, 10, 10), vec![heavy_swing], Rewards { exp: 30, gold: 25 })
                .with_color("#8b4513"),
        ];

        let item = |id: &str, name: &str, quantity, effect, power, description: &str| Item {
            id: ItemId::new(id),
            name: name.into(),
            quantity,
            effect,
            power,
            target: TargetScope::SingleAlly,
            description: description.into(),
        };
        let items = vec![
            item("potion", "Potion", 5, ItemEffect::HealHp, 50, "Restores 50 HP"),
            item("hi_potion", "Hi-Potion", 2, ItemEffect::HealHp, 150, "Restores 150 HP"),
            item("ether", "Ether", 3, ItemEffect::HealMp, 30, "Restores 30 MP"),
            item("phoenix_down", "Phoenix Down", 1, ItemEffect::Revive, 25, "Revives fallen ally with 25% HP"),
        ];

        Self::new(heroes, enemies, items)
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Load a roster from a TOML file
pub fn load_roster(path: &Path) -> Result<Roster, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let roster = Roster::from_toml_str(&contents)?;
    tracing::debug!(
        path = %path.display(),
        heroes = roster.heroes.len(),
        enemies = roster.enemies.len(),
        items = roster.items.len(),
        "loaded roster"
    );
    Ok(roster)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_roster_shape() {
        let roster = Roster::builtin();
        assert_eq!(roster.heroes.len(), 3);
        assert_eq!(roster.enemies.len(), 3);
        assert_eq!(roster.items.len(), 4);
        assert!(roster.validate().is_ok());

        let terra = &roster.heroes[1];
        assert_eq!(terra.name, "Terra");
        assert_eq!(terra.skill_category().unwrap().name, "Black Magic");
        assert_eq!(terra.stats().agility, 18);
    }

    #[test]
    fn test_load_default_roster_matches_builtin() {
        let roster = load_roster(Path::new("data/rosters/default.toml"))
            .expect("Should load default roster");
        assert_eq!(roster, Roster::builtin());
    }

    #[test]
    fn test_unknown_skill_reference_is_rejected() {
        let toml = r#"
            [[heroes]]
            id = "h"
            name = "H"
            stats = { hp = 1, max_hp = 1, mp = 0, max_mp = 0, strength = 1, magic = 1, toughness = 1, magic_resistance = 1, agility = 1 }
            skill_category = { name = "None", skills = ["meteor"] }
        "#;
        let err = Roster::from_toml_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::SkillNotFound(id) if id == "meteor"));
    }

    #[test]
    fn test_duplicate_combatant_ids_rejected() {
        let mut roster = Roster::builtin();
        roster.enemies[0].id = roster.heroes[0].id.clone();
        assert!(matches!(roster.validate(), Err(ConfigError::DuplicateId(_))));
    }

    #[test]
    fn test_clone_is_independent() {
        let canonical = Roster::builtin();
        let mut copy = canonical.clone();
        copy.heroes[0].take_damage(50);
        copy.items[0].quantity = 0;
        assert_eq!(canonical.heroes[0].hp(), 120);
        assert_eq!(canonical.items[0].quantity, 5);
    }
}
