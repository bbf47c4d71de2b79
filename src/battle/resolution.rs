//! Action resolution: attacks, skills, items and escapes
//!
//! Formulas are pure functions of stats and a variance roll so they can be
//! checked without an RNG. The `resolve_*` functions apply them to a
//! [`BattleState`], write the immediate log lines and hand back any delayed
//! follow-up messages for the controller to schedule.
//!
//! Stale or mismatched ids make a resolution a silent no-op; nothing here
//! panics on bad input.

use rand::Rng;

use crate::battle::combatant::{
    Combatant, CombatantStats, ItemEffect, Side, Skill, SkillKind,
};
use crate::battle::constants::*;
use crate::battle::state::BattleState;
use crate::core::types::{CombatantId, ItemId};

/// A message to log some number of follow-up steps after the action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowUp {
    pub steps: u32,
    pub text: String,
}

impl FollowUp {
    fn new(steps: u32, text: String) -> Self {
        Self { steps, text }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStatus {
    /// The action happened
    Resolved,
    /// Actor or target could not be resolved; nothing changed
    Skipped,
    /// Caster could not pay for the skill; nothing changed
    NotEnoughMp,
    /// Item missing or used up; nothing changed
    NoItemsLeft,
}

/// Result of resolving a single action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub status: ResolutionStatus,
    pub follow_ups: Vec<FollowUp>,
}

impl Resolution {
    fn resolved(follow_ups: Vec<FollowUp>) -> Self {
        Self {
            status: ResolutionStatus::Resolved,
            follow_ups,
        }
    }

    fn without_effect(status: ResolutionStatus) -> Self {
        Self {
            status,
            follow_ups: Vec::new(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.status == ResolutionStatus::Resolved
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FleeResult {
    Escaped,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FleeCommitment {
    /// Some living heroes have not committed yet
    Waiting,
    /// Every living hero has committed; the party rolls
    PartyReady,
}

// ===== FORMULAS =====

/// Sample a damage variance from [0.9, 1.1)
pub fn roll_variance(rng: &mut impl Rng) -> f64 {
    rng.gen_range(DAMAGE_VARIANCE_MIN..DAMAGE_VARIANCE_MAX)
}

fn floor_damage(raw: f64) -> u32 {
    let floored = raw.floor();
    if floored < MIN_DAMAGE as f64 {
        MIN_DAMAGE
    } else {
        floored.min(u32::MAX as f64) as u32
    }
}

/// Plain attack: max(1, ⌊(strength × 2 − toughness) × variance⌋)
pub fn attack_damage(attacker: &CombatantStats, defender: &CombatantStats, variance: f64) -> u32 {
    let base = attacker.strength as f64 * ATTACK_STRENGTH_FACTOR;
    floor_damage((base - defender.toughness as f64) * variance)
}

/// Pre-defense skill damage
pub fn skill_base_damage(skill: &Skill, caster: &CombatantStats) -> f64 {
    match skill.kind {
        SkillKind::Magical => skill.power as f64 + caster.magic as f64 * MAGICAL_SKILL_MAGIC_FACTOR,
        _ => skill.power as f64 + caster.strength as f64 * PHYSICAL_SKILL_STRENGTH_FACTOR,
    }
}

/// Damaging skill against one target; magic is resisted by magic resistance,
/// everything else by toughness
pub fn skill_damage(
    skill: &Skill,
    caster: &CombatantStats,
    target: &CombatantStats,
    variance: f64,
) -> u32 {
    let defense = match skill.kind {
        SkillKind::Magical => target.magic_resistance,
        _ => target.toughness,
    };
    let base = skill_base_damage(skill, caster);
    floor_damage((base - defense as f64 * SKILL_DEFENSE_FACTOR) * variance)
}

/// Healing skill: ⌊power + magic × 0.5⌋
pub fn heal_amount(skill: &Skill, caster: &CombatantStats) -> u32 {
    (skill.power as f64 + caster.magic as f64 * HEALING_SKILL_MAGIC_FACTOR).floor() as u32
}

fn average_agility(group: &[Combatant]) -> f64 {
    if group.is_empty() {
        return 0.0;
    }
    let total: u64 = group.iter().map(|c| u64::from(c.stats().agility)).sum();
    total as f64 / group.len() as f64
}

/// Escape probability. Fallen combatants count toward the averages, and the
/// result is not clamped: enough failed attempts push it past 1.0.
pub fn flee_chance(heroes: &[Combatant], enemies: &[Combatant], attempts: u32) -> f64 {
    FLEE_BASE_CHANCE
        + (average_agility(heroes) - average_agility(enemies)) * FLEE_AGILITY_FACTOR
        + attempts as f64 * FLEE_ATTEMPT_BONUS
}

fn fall_message(target: &Combatant) -> String {
    match target.side() {
        Side::Hero => format!("{} has fallen!", target.name),
        Side::Enemy => format!("{} is defeated!", target.name),
    }
}

// ===== RESOLUTION =====

/// Resolve a basic attack from `actor_id` against `target_id`
pub fn resolve_attack(
    state: &mut BattleState,
    actor_id: &CombatantId,
    target_id: &CombatantId,
    rng: &mut impl Rng,
) -> Resolution {
    state.clear_flee_ready();

    let Some((attacker_name, attacker_side, attacker_stats)) = state
        .combatant(actor_id)
        .map(|a| (a.name.clone(), a.side(), *a.stats()))
    else {
        return Resolution::without_effect(ResolutionStatus::Skipped);
    };
    let Some(defender) = state
        .combatant(target_id)
        .filter(|d| d.side() == attacker_side.opponent())
    else {
        return Resolution::without_effect(ResolutionStatus::Skipped);
    };

    let damage = attack_damage(&attacker_stats, defender.stats(), roll_variance(rng));
    let message = format!("{} attacks {} for {} damage!", attacker_name, defender.name, damage);
    state.log(message);

    let mut follow_ups = Vec::new();
    if let Some(defender) = state.combatant_mut(target_id) {
        if defender.take_damage(damage) {
            follow_ups.push(FollowUp::new(1, fall_message(defender)));
        }
    }

    tracing::debug!(actor = %actor_id, target = %target_id, damage, "attack resolved");
    Resolution::resolved(follow_ups)
}

/// Resolve a skill cast by `actor_id` on `target_ids`.
///
/// The skill lands on every living combatant named in `target_ids`, whichever
/// side it is on; matching ids to the skill's scope is left to the caller.
/// Only heroes pay MP.
pub fn resolve_skill(
    state: &mut BattleState,
    actor_id: &CombatantId,
    skill: &Skill,
    target_ids: &[CombatantId],
    rng: &mut impl Rng,
) -> Resolution {
    state.clear_flee_ready();

    let Some(caster) = state.combatant(actor_id) else {
        return Resolution::without_effect(ResolutionStatus::Skipped);
    };
    if caster.mp() < skill.mp_cost {
        tracing::debug!(actor = %actor_id, skill = %skill.id, "not enough MP");
        state.log("Not enough MP!");
        return Resolution::without_effect(ResolutionStatus::NotEnoughMp);
    }

    let caster_name = caster.name.clone();
    let caster_side = caster.side();
    let caster_stats = *caster.stats();

    if caster_side == Side::Hero {
        if let Some(caster) = state.combatant_mut(actor_id) {
            caster.spend_mp(skill.mp_cost);
        }
    }

    state.log(format!("{} uses {}!", caster_name, skill.name));

    let mut follow_ups = Vec::new();
    let targets = state
        .heroes
        .iter_mut()
        .chain(state.enemies.iter_mut())
        .filter(|c| target_ids.contains(&c.id) && c.is_alive());
    if skill.kind == SkillKind::Healing {
        let amount = heal_amount(skill, &caster_stats);
        for target in targets {
            target.restore_hp(amount);
            follow_ups.push(FollowUp::new(
                1,
                format!("{} recovers {} HP!", target.name, amount),
            ));
        }
    } else {
        for target in targets {
            let damage = skill_damage(skill, &caster_stats, target.stats(), roll_variance(rng));
            let fell = target.take_damage(damage);
            follow_ups.push(FollowUp::new(
                1,
                format!("{} takes {} damage!", target.name, damage),
            ));
            if fell {
                follow_ups.push(FollowUp::new(2, fall_message(target)));
            }
        }
    }

    tracing::debug!(actor = %actor_id, skill = %skill.id, targets = target_ids.len(), "skill resolved");
    Resolution::resolved(follow_ups)
}

/// Use one of `item_id` on the heroes in `target_ids`.
///
/// One unit is consumed whenever at least one target resolves, even if the
/// effect does nothing (a revive on a living hero, a potion on a fallen one).
pub fn resolve_item(
    state: &mut BattleState,
    item_id: &ItemId,
    target_ids: &[CombatantId],
) -> Resolution {
    state.clear_flee_ready();

    let Some(item) = state.item(item_id).filter(|i| i.is_available()).cloned() else {
        state.log("No items left!");
        return Resolution::without_effect(ResolutionStatus::NoItemsLeft);
    };

    let target_names: Vec<String> = state
        .heroes
        .iter()
        .filter(|h| target_ids.contains(&h.id))
        .map(|h| h.name.clone())
        .collect();
    if target_names.is_empty() {
        return Resolution::without_effect(ResolutionStatus::Skipped);
    }

    let recipient = match target_names.as_slice() {
        [only] => only.clone(),
        _ => "the party".to_string(),
    };
    state.log(format!("Used {} on {}!", item.name, recipient));

    if let Some(stock) = state.item_mut(item_id) {
        stock.quantity = stock.quantity.saturating_sub(1);
    }

    let mut follow_ups = Vec::new();
    for hero in state.heroes.iter_mut().filter(|h| target_ids.contains(&h.id)) {
        match item.effect {
            ItemEffect::HealHp if hero.is_alive() => {
                hero.restore_hp(item.power);
                follow_ups.push(FollowUp::new(
                    1,
                    format!("{} recovers {} HP!", hero.name, item.power),
                ));
            }
            ItemEffect::HealMp if hero.is_alive() => {
                hero.restore_mp(item.power);
                follow_ups.push(FollowUp::new(
                    1,
                    format!("{} recovers {} MP!", hero.name, item.power),
                ));
            }
            ItemEffect::Revive => {
                if hero.revive(item.power) {
                    follow_ups.push(FollowUp::new(1, format!("{} is revived!", hero.name)));
                }
            }
            // No status ailments are modelled; the item is simply spent.
            ItemEffect::CureStatus => {}
            _ => {}
        }
    }

    tracing::debug!(item = %item_id, targets = target_ids.len(), "item used");
    Resolution::resolved(follow_ups)
}

/// Roll an escape for the party
pub fn resolve_flee(state: &mut BattleState, rng: &mut impl Rng) -> FleeResult {
    let chance = flee_chance(&state.heroes, &state.enemies, state.flee_attempts);
    let roll: f64 = rng.gen();
    state.clear_flee_ready();

    tracing::debug!(chance, roll, attempts = state.flee_attempts, "flee roll");
    if roll < chance {
        state.log("Escaped successfully!");
        FleeResult::Escaped
    } else {
        state.log("Couldn't escape!");
        state.flee_attempts += 1;
        FleeResult::Failed
    }
}

/// Mark `hero_id` as ready to flee. `None` if the hero is missing or fallen.
pub fn commit_flee(state: &mut BattleState, hero_id: &CombatantId) -> Option<FleeCommitment> {
    let hero = state
        .heroes
        .iter()
        .find(|h| &h.id == hero_id && h.is_alive())?;
    let message = format!("{} prepares to flee...", hero.name);

    state.flee_ready.insert(hero_id.clone());
    state.log(message);

    if state.party_ready_to_flee() {
        Some(FleeCommitment::PartyReady)
    } else {
        Some(FleeCommitment::Waiting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::roster::Roster;
    use crate::battle::combatant::TargetScope;
    use crate::core::types::SkillId;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn fresh() -> BattleState {
        BattleState::new(&Roster::builtin(), 0)
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    fn id(s: &str) -> CombatantId {
        CombatantId::new(s)
    }

    fn skill_of(state: &BattleState, hero: &str, skill: &str) -> Skill {
        state
            .combatant(&id(hero))
            .and_then(|h| h.skill_category())
            .and_then(|c| c.skill(&SkillId::new(skill)))
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_attack_damage_formula() {
        let cloud = CombatantStats::full(120, 30, 25, 15, 18, 12, 20);
        let goblin = CombatantStats::full(45, 0, 12, 5, 8, 6, 15);
        // (50 - 8) = 42
        assert_eq!(attack_damage(&cloud, &goblin, 1.0), 42);
        assert_eq!(attack_damage(&cloud, &goblin, 0.9), 37);
        assert_eq!(attack_damage(&cloud, &goblin, 1.0999), 46);
    }

    #[test]
    fn test_attack_damage_never_below_one() {
        let weak = CombatantStats::full(10, 0, 1, 0, 0, 0, 1);
        let wall = CombatantStats::full(10, 0, 0, 0, 250, 0, 1);
        assert_eq!(attack_damage(&weak, &wall, 1.09), 1);
        assert_eq!(attack_damage(&weak, &wall, 0.9), 1);
    }

    #[test]
    fn test_skill_damage_formulas() {
        let state = fresh();
        let fire = skill_of(&state, "hero_2", "fire");
        let terra = *state.heroes[1].stats();
        let orc = *state.enemies[2].stats();
        // 25 + 28 × 1.5 = 67; 67 − 10 × 0.5 = 62
        assert_eq!(skill_base_damage(&fire, &terra), 67.0);
        assert_eq!(skill_damage(&fire, &terra, &orc, 1.0), 62);

        let slash = skill_of(&state, "hero_1", "power_slash");
        let cloud = *state.heroes[0].stats();
        // 40 + 25 × 1.2 = 70; 70 − 15 × 0.5 = 62.5 → 62
        assert_eq!(skill_damage(&slash, &cloud, &orc, 1.0), 62);
    }

    #[test]
    fn test_heal_amount_formula() {
        let state = fresh();
        let cure = skill_of(&state, "hero_3", "cure");
        // 30 + 25 × 0.5 = 42.5 → 42
        assert_eq!(heal_amount(&cure, state.heroes[2].stats()), 42);
    }

    #[test]
    fn test_flee_chance_builtin_and_unclamped() {
        let state = fresh();
        // heroes avg 20, enemies avg 13 → 0.3 + 7 × 0.02 = 0.44
        let base = flee_chance(&state.heroes, &state.enemies, 0);
        assert!((base - 0.44).abs() < 1e-9);
        let later = flee_chance(&state.heroes, &state.enemies, 6);
        assert!(later > 1.0);
    }

    #[test]
    fn test_flee_chance_empty_sides() {
        assert!((flee_chance(&[], &[], 0) - FLEE_BASE_CHANCE).abs() < 1e-9);
    }

    #[test]
    fn test_resolve_attack_hits_opponent() {
        let mut state = fresh();
        let result = resolve_attack(&mut state, &id("hero_1"), &id("enemy_1"), &mut rng());
        assert!(result.is_resolved());
        let goblin = state.combatant(&id("enemy_1")).unwrap();
        assert!(goblin.hp() < 45);
        assert!(state.messages.all()[0].text.starts_with("Cloud attacks Goblin for "));
    }

    #[test]
    fn test_resolve_attack_reports_fall_as_follow_up() {
        let mut state = fresh();
        state.enemies[0].take_damage(44);
        let result = resolve_attack(&mut state, &id("hero_1"), &id("enemy_1"), &mut rng());
        assert_eq!(
            result.follow_ups,
            vec![FollowUp::new(1, "Goblin is defeated!".into())]
        );
        assert!(!state.enemies[0].is_alive());
    }

    #[test]
    fn test_resolve_attack_same_side_is_noop() {
        let mut state = fresh();
        let result = resolve_attack(&mut state, &id("hero_1"), &id("hero_2"), &mut rng());
        assert_eq!(result.status, ResolutionStatus::Skipped);
        assert_eq!(state.heroes[1].hp(), 85);
        assert!(state.messages.is_empty());
    }

    #[test]
    fn test_resolve_attack_stale_ids_are_noop() {
        let mut state = fresh();
        let result = resolve_attack(&mut state, &id("ghost"), &id("enemy_1"), &mut rng());
        assert_eq!(result.status, ResolutionStatus::Skipped);
        let result = resolve_attack(&mut state, &id("hero_1"), &id("ghost"), &mut rng());
        assert_eq!(result.status, ResolutionStatus::Skipped);
        assert!(state.messages.is_empty());
    }

    #[test]
    fn test_attack_clears_flee_readiness() {
        let mut state = fresh();
        state.flee_ready.insert(id("hero_1"));
        resolve_attack(&mut state, &id("enemy_1"), &id("hero_1"), &mut rng());
        assert!(state.flee_ready.is_empty());
    }

    #[test]
    fn test_skill_charges_hero_mp() {
        let mut state = fresh();
        let fire = skill_of(&state, "hero_2", "fire");
        let result = resolve_skill(&mut state, &id("hero_2"), &fire, &[id("enemy_3")], &mut rng());
        assert!(result.is_resolved());
        assert_eq!(state.heroes[1].mp(), 56);
        assert!(state.enemies[2].hp() < 80);
        assert_eq!(state.messages.all()[0].text, "Terra uses Fire!");
    }

    #[test]
    fn test_skill_without_mp_changes_nothing() {
        let mut state = fresh();
        let slash = skill_of(&state, "hero_1", "power_slash");
        state.heroes[0].spend_mp(26);
        let result = resolve_skill(&mut state, &id("hero_1"), &slash, &[id("enemy_1")], &mut rng());
        assert_eq!(result.status, ResolutionStatus::NotEnoughMp);
        assert_eq!(state.heroes[0].mp(), 4);
        assert_eq!(state.enemies[0].hp(), 45);
        assert!(state.messages.contains("Not enough MP!"));
    }

    #[test]
    fn test_area_skill_rolls_each_target() {
        let mut state = fresh();
        let whirlwind = skill_of(&state, "hero_1", "whirlwind");
        let targets = vec![id("enemy_1"), id("enemy_2"), id("enemy_3")];
        let result = resolve_skill(&mut state, &id("hero_1"), &whirlwind, &targets, &mut rng());
        assert_eq!(result.follow_ups.len(), 3);
        assert!(state.enemies.iter().all(|e| e.hp() < e.stats().max_hp));
    }

    #[test]
    fn test_skill_ignores_fallen_targets() {
        let mut state = fresh();
        state.enemies[1].take_damage(1000);
        let whirlwind = skill_of(&state, "hero_1", "whirlwind");
        let targets = vec![id("enemy_1"), id("enemy_2")];
        let result = resolve_skill(&mut state, &id("hero_1"), &whirlwind, &targets, &mut rng());
        assert_eq!(result.follow_ups.len(), 1);
    }

    #[test]
    fn test_skill_lethal_hit_queues_fall_after_damage() {
        let mut state = fresh();
        state.enemies[0].take_damage(44);
        let fire = skill_of(&state, "hero_2", "fire");
        let result = resolve_skill(&mut state, &id("hero_2"), &fire, &[id("enemy_1")], &mut rng());
        assert_eq!(result.follow_ups.len(), 2);
        assert_eq!(result.follow_ups[0].steps, 1);
        assert!(result.follow_ups[0].text.starts_with("Goblin takes "));
        assert_eq!(result.follow_ups[1], FollowUp::new(2, "Goblin is defeated!".into()));
    }

    #[test]
    fn test_healing_skill_clamps_and_skips_fallen() {
        let mut state = fresh();
        state.heroes[0].take_damage(20); // Cloud 100/120
        state.heroes[1].take_damage(1000); // Terra down
        let heal_all = skill_of(&state, "hero_3", "heal_all");
        let party = vec![id("hero_1"), id("hero_2"), id("hero_3")];
        resolve_skill(&mut state, &id("hero_3"), &heal_all, &party, &mut rng());

        assert_eq!(state.heroes[0].hp(), 120);
        assert_eq!(state.heroes[1].hp(), 0);
        assert!(!state.heroes[1].is_alive());
        assert_eq!(state.heroes[2].mp(), 37);
    }

    #[test]
    fn test_enemy_skill_costs_nothing() {
        let mut state = fresh();
        let punch = state.enemies[0].skills()[0].clone();
        let result = resolve_skill(&mut state, &id("enemy_1"), &punch, &[id("hero_3")], &mut rng());
        assert!(result.is_resolved());
        assert_eq!(state.enemies[0].mp(), 0);
        assert!(state.heroes[2].hp() < 75);
    }

    #[test]
    fn test_enemy_healing_reaches_enemy_side() {
        let mut state = fresh();
        state.enemies[2].take_damage(40);
        let mend = Skill {
            id: SkillId::new("mend"),
            name: "Mend".into(),
            mp_cost: 0,
            power: 10,
            kind: SkillKind::Healing,
            target: TargetScope::SingleAlly,
            description: String::new(),
        };
        resolve_skill(&mut state, &id("enemy_1"), &mend, &[id("enemy_3")], &mut rng());
        // 10 + 5 × 0.5 = 12
        assert_eq!(state.enemies[2].hp(), 52);
    }

    #[test]
    fn test_skill_lands_on_any_named_target() {
        let mut state = fresh();
        state.heroes[0].take_damage(50);
        let mend = Skill {
            id: SkillId::new("mend"),
            name: "Mend".into(),
            mp_cost: 0,
            power: 10,
            kind: SkillKind::Healing,
            target: TargetScope::SingleAlly,
            description: String::new(),
        };
        let result = resolve_skill(&mut state, &id("enemy_1"), &mend, &[id("hero_1")], &mut rng());
        assert_eq!(result.follow_ups, vec![FollowUp::new(1, "Cloud recovers 12 HP!".into())]);
        assert_eq!(state.heroes[0].hp(), 82);

        let fire = skill_of(&state, "hero_2", "fire");
        resolve_skill(&mut state, &id("hero_2"), &fire, &[id("hero_3")], &mut rng());
        assert!(state.heroes[2].hp() < 75);
    }

    #[test]
    fn test_potion_heals_without_overflow() {
        let mut state = fresh();
        state.heroes[0].take_damage(110); // 10/120
        resolve_item(&mut state, &ItemId::new("potion"), &[id("hero_1")]);
        assert_eq!(state.heroes[0].hp(), 60);

        state.heroes[0].restore_hp(50); // 110/120
        resolve_item(&mut state, &ItemId::new("potion"), &[id("hero_1")]);
        assert_eq!(state.heroes[0].hp(), 120);
        assert_eq!(state.item(&ItemId::new("potion")).unwrap().quantity, 3);
    }

    #[test]
    fn test_revive_on_living_hero_only_consumes() {
        let mut state = fresh();
        let before = state.heroes[0].clone();
        let result = resolve_item(&mut state, &ItemId::new("phoenix_down"), &[id("hero_1")]);

        assert!(result.is_resolved());
        assert!(result.follow_ups.is_empty());
        assert_eq!(state.heroes[0], before);
        assert_eq!(state.item(&ItemId::new("phoenix_down")).unwrap().quantity, 0);
        assert!(state.messages.contains("Used Phoenix Down on Cloud!"));
    }

    #[test]
    fn test_revive_restores_fallen_hero() {
        let mut state = fresh();
        state.heroes[1].take_damage(1000);
        let result = resolve_item(&mut state, &ItemId::new("phoenix_down"), &[id("hero_2")]);
        // ⌊85 × 25 / 100⌋ = 21
        assert_eq!(state.heroes[1].hp(), 21);
        assert!(state.heroes[1].is_alive());
        assert_eq!(result.follow_ups[0].text, "Terra is revived!");
    }

    #[test]
    fn test_potion_on_fallen_hero_is_wasted() {
        let mut state = fresh();
        state.heroes[1].take_damage(1000);
        resolve_item(&mut state, &ItemId::new("potion"), &[id("hero_2")]);
        assert_eq!(state.heroes[1].hp(), 0);
        assert!(!state.heroes[1].is_alive());
        assert_eq!(state.item(&ItemId::new("potion")).unwrap().quantity, 4);
    }

    #[test]
    fn test_ether_restores_mp() {
        let mut state = fresh();
        state.heroes[1].spend_mp(50);
        resolve_item(&mut state, &ItemId::new("ether"), &[id("hero_2")]);
        assert_eq!(state.heroes[1].mp(), 40);
    }

    #[test]
    fn test_empty_item_is_refused() {
        let mut state = fresh();
        resolve_item(&mut state, &ItemId::new("phoenix_down"), &[id("hero_1")]);
        let result = resolve_item(&mut state, &ItemId::new("phoenix_down"), &[id("hero_1")]);
        assert_eq!(result.status, ResolutionStatus::NoItemsLeft);
        assert_eq!(state.item(&ItemId::new("phoenix_down")).unwrap().quantity, 0);
        assert!(state.messages.contains("No items left!"));
    }

    #[test]
    fn test_item_with_stale_target_keeps_stock() {
        let mut state = fresh();
        let result = resolve_item(&mut state, &ItemId::new("potion"), &[id("ghost")]);
        assert_eq!(result.status, ResolutionStatus::Skipped);
        assert_eq!(state.item(&ItemId::new("potion")).unwrap().quantity, 5);
    }

    #[test]
    fn test_flee_failure_counts_attempts() {
        let mut state = fresh();
        // Enemies far faster than the party: chance < 0, the roll always fails
        for enemy in &mut state.enemies {
            *enemy = Combatant::enemy(
                enemy.id.clone(),
                enemy.name.clone(),
                CombatantStats::full(45, 0, 12, 5, 8, 6, 200),
                Vec::new(),
                enemy.rewards(),
            );
        }
        state.flee_ready.insert(id("hero_1"));
        assert_eq!(resolve_flee(&mut state, &mut rng()), FleeResult::Failed);
        assert_eq!(state.flee_attempts, 1);
        assert!(state.flee_ready.is_empty());
        assert!(state.messages.contains("Couldn't escape!"));
    }

    #[test]
    fn test_flee_succeeds_once_chance_exceeds_one() {
        let mut state = fresh();
        state.flee_attempts = 10;
        assert_eq!(resolve_flee(&mut state, &mut rng()), FleeResult::Escaped);
        assert!(state.messages.contains("Escaped successfully!"));
    }

    #[test]
    fn test_commit_flee_requires_whole_living_party() {
        let mut state = fresh();
        assert_eq!(commit_flee(&mut state, &id("hero_3")), Some(FleeCommitment::Waiting));
        assert_eq!(commit_flee(&mut state, &id("hero_1")), Some(FleeCommitment::Waiting));
        assert_eq!(commit_flee(&mut state, &id("hero_2")), Some(FleeCommitment::PartyReady));
        assert!(state.messages.contains("Rosa prepares to flee..."));
    }

    #[test]
    fn test_commit_flee_rejects_fallen_or_unknown() {
        let mut state = fresh();
        state.heroes[0].take_damage(1000);
        assert_eq!(commit_flee(&mut state, &id("hero_1")), None);
        assert_eq!(commit_flee(&mut state, &id("enemy_1")), None);
        assert!(state.flee_ready.is_empty());
    }
}
