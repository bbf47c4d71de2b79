//! AI Commander - stock enemy behaviour
//!
//! Picks a random living hero and hits it. With the configured skill chance it
//! uses one of its skills instead.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::battle::ai::{BattleAi, EnemyAction};
use crate::battle::combatant::{Combatant, Skill, TargetScope};
use crate::battle::state::BattleState;
use crate::core::config::EnemyTactics;
use crate::core::types::CombatantId;

/// AI Commander implementing BattleAi trait
pub struct AiCommander {
    tactics: EnemyTactics,
    rng: ChaCha8Rng,
}

impl AiCommander {
    /// Create a commander seeded from entropy
    pub fn new(tactics: EnemyTactics) -> Self {
        Self {
            tactics,
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    /// Create with specific RNG seed for deterministic behavior
    pub fn with_seed(tactics: EnemyTactics, seed: u64) -> Self {
        Self {
            tactics,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn tactics(&self) -> &EnemyTactics {
        &self.tactics
    }

    fn wants_skill(&mut self) -> bool {
        self.tactics.skill_chance > 0.0 && self.rng.gen::<f64>() < self.tactics.skill_chance
    }

    fn skill_targets(
        &mut self,
        enemy: &Combatant,
        skill: &Skill,
        state: &BattleState,
        hero: &CombatantId,
    ) -> Vec<CombatantId> {
        let allies: Vec<CombatantId> = state.alive_enemies().map(|e| e.id.clone()).collect();
        match skill.target {
            TargetScope::SingleEnemy => vec![hero.clone()],
            TargetScope::AllEnemies => state.alive_heroes().map(|h| h.id.clone()).collect(),
            TargetScope::SingleAlly => allies
                .choose(&mut self.rng)
                .cloned()
                .into_iter()
                .collect(),
            TargetScope::AllAllies => allies,
            TargetScope::User => vec![enemy.id.clone()],
        }
    }
}

impl BattleAi for AiCommander {
    fn choose_action(&mut self, enemy: &Combatant, state: &BattleState) -> Option<EnemyAction> {
        let heroes: Vec<&Combatant> = state.alive_heroes().collect();
        let target = heroes.choose(&mut self.rng)?.id.clone();

        if self.wants_skill() {
            let affordable: Vec<&Skill> = enemy
                .skills()
                .iter()
                .filter(|s| s.mp_cost <= enemy.mp())
                .collect();
            if let Some(skill) = affordable.choose(&mut self.rng).map(|s| (*s).clone()) {
                let targets = self.skill_targets(enemy, &skill, state, &target);
                tracing::debug!(enemy = %enemy.id, skill = %skill.id, "enemy uses skill");
                return Some(EnemyAction::Skill { skill, targets });
            }
        }

        Some(EnemyAction::Attack { target })
    }
}
