//! Round ordering by agility

use serde::{Deserialize, Serialize};

use crate::battle::combatant::{Combatant, Side};
use crate::core::types::CombatantId;

/// One slot in a round's acting queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnOrderEntry {
    pub actor_id: CombatantId,
    pub side: Side,
    /// Agility when the round began
    pub agility: u32,
}

/// Build the acting queue for a new round.
///
/// Living heroes are listed before living enemies and the list is then stably
/// sorted by descending agility, so ties keep heroes ahead of enemies and
/// otherwise preserve roster order.
pub fn calculate_turn_order(heroes: &[Combatant], enemies: &[Combatant]) -> Vec<TurnOrderEntry> {
    let mut order: Vec<TurnOrderEntry> = heroes
        .iter()
        .chain(enemies)
        .filter(|c| c.is_alive())
        .map(|c| TurnOrderEntry {
            actor_id: c.id.clone(),
            side: c.side(),
            agility: c.stats().agility,
        })
        .collect();

    // sort_by is stable
    order.sort_by(|a, b| b.agility.cmp(&a.agility));
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::combatant::{CombatantStats, Rewards, SkillCategory};

    fn hero(id: &str, agility: u32) -> Combatant {
        let category = SkillCategory {
            name: "None".into(),
            skills: Vec::new(),
        };
        Combatant::hero(id, id, CombatantStats::full(50, 0, 10, 10, 10, 10, agility), category)
    }

    fn enemy(id: &str, agility: u32) -> Combatant {
        Combatant::enemy(
            id,
            id,
            CombatantStats::full(50, 0, 10, 10, 10, 10, agility),
            Vec::new(),
            Rewards::default(),
        )
    }

    fn ids(order: &[TurnOrderEntry]) -> Vec<&str> {
        order.iter().map(|e| e.actor_id.as_str()).collect()
    }

    #[test]
    fn test_descending_agility() {
        let heroes = vec![hero("cloud", 20), hero("terra", 18), hero("rosa", 22)];
        let enemies = vec![enemy("goblin1", 15), enemy("goblin2", 14), enemy("orc", 10)];

        let order = calculate_turn_order(&heroes, &enemies);
        assert_eq!(
            ids(&order),
            vec!["rosa", "cloud", "terra", "goblin1", "goblin2", "orc"]
        );
        assert_eq!(order[0].side, Side::Hero);
        assert_eq!(order[3].agility, 15);
    }

    #[test]
    fn test_ties_put_heroes_first() {
        let heroes = vec![hero("h1", 10), hero("h2", 10)];
        let enemies = vec![enemy("e1", 10), enemy("e2", 12)];

        let order = calculate_turn_order(&heroes, &enemies);
        assert_eq!(ids(&order), vec!["e2", "h1", "h2", "e1"]);
    }

    #[test]
    fn test_fallen_are_left_out() {
        let mut heroes = vec![hero("h1", 10), hero("h2", 30)];
        heroes[1].take_damage(999);
        let enemies = vec![enemy("e1", 5)];

        let order = calculate_turn_order(&heroes, &enemies);
        assert_eq!(ids(&order), vec!["h1", "e1"]);
    }

    #[test]
    fn test_empty_sides() {
        assert!(calculate_turn_order(&[], &[]).is_empty());
    }
}
