//! Battle phase controller
//!
//! Owns the [`BattleState`] and drives it through
//! start -> turn order -> hero command / enemy turn -> executing -> ... -> end.
//! Player input arrives through the `select_*` commands; everything that
//! happens "after a moment" is a [`Continuation`] on the virtual-clock
//! scheduler and fires from [`BattleController::advance`] or
//! [`BattleController::run_until_idle`].
//!
//! Input that arrives outside the phase expecting it is rejected without
//! touching the state.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::battle::ai::{AiCommander, BattleAi, EnemyAction};
use crate::battle::combatant::{Combatant, Rewards, Side};
use crate::battle::log::BattleMessage;
use crate::battle::resolution::{
    commit_flee, resolve_attack, resolve_flee, resolve_item, resolve_skill, FleeCommitment,
    FleeResult, FollowUp, Resolution, ResolutionStatus,
};
use crate::battle::roster::Roster;
use crate::battle::scheduler::Scheduler;
use crate::battle::state::{
    check_battle_end, BattleOutcome, BattlePhase, BattleState, CommandKind,
};
use crate::battle::targeting::{self, TargetSelection};
use crate::battle::turn_order::calculate_turn_order;
use crate::core::config::EngineConfig;
use crate::core::error::{BattleError, Result};
use crate::core::types::{CombatantId, ItemId, Millis, SkillId};

/// Deferred step of the battle flow
#[derive(Debug, Clone, PartialEq)]
pub enum Continuation {
    /// Build the next round's queue
    ComputeTurnOrder,
    /// Dispatch whoever holds the current slot
    NextTurn,
    /// The current enemy announces itself and decides
    EnemyTakeTurn,
    /// The enemy's decision lands
    EnemyAct { enemy: CombatantId, action: EnemyAction },
    /// Settle time is over; move to the next slot
    AdvanceTurn,
    /// Every living hero committed; roll the escape
    PartyFlee,
    /// Delayed narration
    Message(String),
}

pub struct BattleController {
    roster: Roster,
    config: EngineConfig,
    state: BattleState,
    scheduler: Scheduler<Continuation>,
    rng: ChaCha8Rng,
    enemy_ai: Box<dyn BattleAi>,
}

impl BattleController {
    /// Controller with the stock enemy AI. A configured seed makes the whole
    /// battle reproducible.
    pub fn new(roster: Roster, config: EngineConfig) -> Self {
        let enemy_ai: Box<dyn BattleAi> = match config.seed {
            Some(seed) => Box::new(AiCommander::with_seed(
                config.tactics.clone(),
                seed.wrapping_add(1),
            )),
            None => Box::new(AiCommander::new(config.tactics.clone())),
        };
        Self::with_ai(roster, config, enemy_ai)
    }

    /// Controller with a custom enemy AI
    pub fn with_ai(roster: Roster, config: EngineConfig, enemy_ai: Box<dyn BattleAi>) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            state: BattleState::new(&roster, 0),
            roster,
            config,
            scheduler: Scheduler::new(0),
            rng,
            enemy_ai,
        }
    }

    // ===== COMMANDS =====

    /// Begin the battle, or start over once it has ended.
    ///
    /// State is rebuilt from the roster and pending events are dropped. The
    /// clock keeps running and the RNG is not reseeded. A start that is still
    /// waiting on its turn order cannot be triggered again.
    pub fn start_or_restart_battle(&mut self) -> Result<()> {
        let phase = self.state.phase;
        let starting = phase == BattlePhase::Start && !self.scheduler.is_empty();
        if starting || (phase != BattlePhase::Start && !phase.is_terminal()) {
            return Err(self.reject("start", phase));
        }

        self.scheduler.clear();
        self.state = BattleState::new(&self.roster, self.scheduler.now());
        self.state.log("Battle Start!");
        tracing::info!(
            heroes = self.state.heroes.len(),
            enemies = self.state.enemies.len(),
            "battle started"
        );

        self.schedule(self.config.pacing.battle_start_ms, Continuation::ComputeTurnOrder);
        Ok(())
    }

    /// Pick attack, skill, item or flee for the acting hero.
    ///
    /// Flee rolls an escape on the spot. The others open their sub-state and
    /// drop any coordinated flee commitment.
    pub fn select_command(&mut self, kind: CommandKind) -> Result<()> {
        self.expect_phase("select_command", &[BattlePhase::PlayerCommand])?;
        let hero_id = self.acting_hero_id()?;

        self.state.selection.clear();
        self.state.selection.command = Some(kind);

        match kind {
            CommandKind::Attack => self.enter_phase(BattlePhase::PlayerTarget),
            CommandKind::Skill => self.enter_phase(BattlePhase::PlayerSkill),
            CommandKind::Item => self.enter_phase(BattlePhase::PlayerItem),
            CommandKind::Flee => {
                tracing::debug!(hero = %hero_id, "solo escape attempt");
                self.roll_escape();
                return Ok(());
            }
        }
        self.state.clear_flee_ready();
        Ok(())
    }

    /// Choose one of the acting hero's skills; the target comes next
    pub fn select_skill(&mut self, skill_id: &SkillId) -> Result<()> {
        self.expect_phase("select_skill", &[BattlePhase::PlayerSkill])?;
        let hero = self.state.current_hero().ok_or(BattleError::NoActiveHero)?;
        let skill = hero
            .skill_category()
            .and_then(|c| c.skill(skill_id))
            .cloned()
            .ok_or_else(|| BattleError::UnknownSkill(skill_id.clone()))?;

        tracing::debug!(hero = %hero.id, skill = %skill.id, "skill selected");
        self.state.selection.skill = Some(skill);
        Ok(())
    }

    /// Choose an inventory item; the target comes next.
    ///
    /// A used-up item is refused with a log message and leaves the selection
    /// as it was.
    pub fn select_item(&mut self, item_id: &ItemId) -> Result<()> {
        self.expect_phase("select_item", &[BattlePhase::PlayerItem])?;
        self.acting_hero_id()?;
        let item = self
            .state
            .item(item_id)
            .ok_or_else(|| BattleError::UnknownItem(item_id.clone()))?;

        if !item.is_available() {
            self.state.log("No items left!");
            return Ok(());
        }
        self.state.selection.item = Some(item_id.clone());
        Ok(())
    }

    /// Aim the pending attack, skill or item and carry it out
    pub fn select_target(&mut self, selection: impl Into<TargetSelection>) -> Result<()> {
        let phase = self.state.phase;
        self.expect_phase(
            "select_target",
            &[
                BattlePhase::PlayerTarget,
                BattlePhase::PlayerSkill,
                BattlePhase::PlayerItem,
            ],
        )?;
        let actor = self.acting_hero_id()?;
        let selection: TargetSelection = selection.into();
        let targets = targeting::resolve_selection(&self.state, &selection)
            .map_err(|err| {
                tracing::warn!(%err, "target rejected");
                err
            })?;

        let pacing = self.config.pacing.clone();
        match phase {
            BattlePhase::PlayerTarget => {
                let resolution = resolve_attack(&mut self.state, &actor, &targets[0], &mut self.rng);
                self.settle(resolution, pacing.attack_settle_ms);
            }
            BattlePhase::PlayerSkill => {
                let skill = self
                    .state
                    .selection
                    .skill
                    .clone()
                    .ok_or(BattleError::NothingSelected)?;
                let resolution = resolve_skill(&mut self.state, &actor, &skill, &targets, &mut self.rng);
                if resolution.status == ResolutionStatus::NotEnoughMp {
                    self.back_to_command();
                } else {
                    self.settle(resolution, pacing.skill_settle_ms);
                }
            }
            _ => {
                let item = self
                    .state
                    .selection
                    .item
                    .clone()
                    .ok_or(BattleError::NothingSelected)?;
                let resolution = resolve_item(&mut self.state, &item, &targets);
                if resolution.status == ResolutionStatus::NoItemsLeft {
                    self.back_to_command();
                } else {
                    self.settle(resolution, pacing.item_settle_ms);
                }
            }
        }
        Ok(())
    }

    /// Back out of a pending choice.
    ///
    /// Aiming an attack returns to the command menu. With a skill or item
    /// chosen, cancelling returns to that sub-menu; from the bare sub-menu it
    /// returns to the command menu.
    pub fn cancel_selection(&mut self) -> Result<()> {
        self.expect_phase(
            "cancel_selection",
            &[
                BattlePhase::PlayerTarget,
                BattlePhase::PlayerSkill,
                BattlePhase::PlayerItem,
            ],
        )?;

        match self.state.phase {
            BattlePhase::PlayerSkill if self.state.selection.skill.is_some() => {
                self.state.selection.skill = None;
            }
            BattlePhase::PlayerItem if self.state.selection.item.is_some() => {
                self.state.selection.item = None;
            }
            _ => self.back_to_command(),
        }
        Ok(())
    }

    /// The acting hero commits to a coordinated escape.
    ///
    /// The hero's turn ends. Once every living hero has committed in the same
    /// round, the party rolls a single escape.
    pub fn commit_flee(&mut self, hero_id: &CombatantId) -> Result<()> {
        self.expect_phase("commit_flee", &[BattlePhase::PlayerCommand])?;
        let acting = self.acting_hero_id()?;
        if &acting != hero_id {
            tracing::warn!(hero = %hero_id, acting = %acting, "flee commitment out of turn");
            return Err(BattleError::NotCurrentActor(hero_id.clone()));
        }

        self.state.selection.clear();
        self.state.selection.command = Some(CommandKind::Flee);
        let commitment = commit_flee(&mut self.state, hero_id)
            .ok_or_else(|| BattleError::NotCurrentActor(hero_id.clone()))?;
        self.enter_phase(BattlePhase::Executing);

        match commitment {
            FleeCommitment::Waiting => {
                self.schedule(self.config.pacing.flee_commit_settle_ms, Continuation::AdvanceTurn);
            }
            FleeCommitment::PartyReady => {
                tracing::debug!("whole party committed to flee");
                self.schedule(self.config.pacing.party_flee_ms, Continuation::PartyFlee);
            }
        }
        Ok(())
    }

    // ===== CLOCK =====

    /// Let `ms` of virtual time pass, firing everything due on the way
    pub fn advance(&mut self, ms: Millis) {
        let until = self.scheduler.now().saturating_add(ms);
        while let Some((_, event)) = self.scheduler.pop_due(until) {
            self.state.clock = self.scheduler.now();
            self.handle(event);
        }
        self.scheduler.advance_to(until);
        self.state.clock = self.scheduler.now();
    }

    /// Fast-forward until the battle waits on the player or has ended
    pub fn run_until_idle(&mut self) -> BattlePhase {
        while let Some((_, event)) = self.scheduler.pop_next() {
            self.state.clock = self.scheduler.now();
            self.handle(event);
        }
        self.state.phase
    }

    /// No continuation is pending
    pub fn is_idle(&self) -> bool {
        self.scheduler.is_empty()
    }

    pub fn next_due(&self) -> Option<Millis> {
        self.scheduler.next_due()
    }

    pub fn now(&self) -> Millis {
        self.scheduler.now()
    }

    // ===== QUERIES =====

    pub fn phase(&self) -> BattlePhase {
        self.state.phase
    }

    pub fn state(&self) -> &BattleState {
        &self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn outcome(&self) -> Option<BattleOutcome> {
        self.state.outcome()
    }

    /// The configured window of most recent messages
    pub fn recent_messages(&self) -> &[BattleMessage] {
        self.state.messages.last(self.config.message_window)
    }

    pub fn last_messages(&self, n: usize) -> &[BattleMessage] {
        self.state.messages.last(n)
    }

    pub fn current_actor(&self) -> Option<&Combatant> {
        self.state.current_actor()
    }

    pub fn alive_heroes(&self) -> impl Iterator<Item = &Combatant> {
        self.state.alive_heroes()
    }

    pub fn alive_enemies(&self) -> impl Iterator<Item = &Combatant> {
        self.state.alive_enemies()
    }

    pub fn legal_targets(&self) -> Vec<CombatantId> {
        targeting::legal_targets(&self.state)
    }

    pub fn is_legal_target(&self, id: &CombatantId) -> bool {
        targeting::is_legal_target(&self.state, id)
    }

    /// Spoils of a won battle
    pub fn rewards(&self) -> Option<Rewards> {
        (self.state.phase == BattlePhase::Victory).then(|| self.state.rewards())
    }

    // ===== FLOW =====

    fn handle(&mut self, event: Continuation) {
        match event {
            Continuation::ComputeTurnOrder => self.compute_turn_order(),
            Continuation::NextTurn => self.next_turn(),
            Continuation::EnemyTakeTurn => self.enemy_take_turn(),
            Continuation::EnemyAct { enemy, action } => self.enemy_act(&enemy, action),
            Continuation::AdvanceTurn => {
                self.state.current_turn_index += 1;
                self.next_turn();
            }
            Continuation::PartyFlee => {
                self.state.log("The party attempts to flee!");
                self.roll_escape();
            }
            Continuation::Message(text) => self.state.log(text),
        }
    }

    fn compute_turn_order(&mut self) {
        self.state.turn_order = calculate_turn_order(&self.state.heroes, &self.state.enemies);
        self.state.current_turn_index = 0;
        self.state.round += 1;
        self.state.clear_flee_ready();
        self.enter_phase(BattlePhase::TurnOrder);
        tracing::debug!(
            round = self.state.round,
            actors = self.state.turn_order.len(),
            "turn order computed"
        );
        self.schedule(self.config.pacing.turn_order_ms, Continuation::NextTurn);
    }

    fn next_turn(&mut self) {
        loop {
            if let Some(outcome) = check_battle_end(&self.state) {
                self.finish(outcome);
                return;
            }

            let Some(entry) = self.state.current_entry() else {
                self.compute_turn_order();
                return;
            };
            let actor = self
                .state
                .combatant(&entry.actor_id)
                .filter(|c| c.is_alive() && c.side() == entry.side)
                .map(|c| (c.name.clone(), c.side()));

            match actor {
                None => {
                    // Fell earlier this round
                    self.state.current_turn_index += 1;
                }
                Some((name, Side::Hero)) => {
                    self.state.log(format!("{}'s turn", name));
                    self.state.selection.clear();
                    self.enter_phase(BattlePhase::PlayerCommand);
                    return;
                }
                Some((_, Side::Enemy)) => {
                    self.enter_phase(BattlePhase::EnemyTurn);
                    self.schedule(self.config.pacing.enemy_think_ms, Continuation::EnemyTakeTurn);
                    return;
                }
            }
        }
    }

    fn enemy_take_turn(&mut self) {
        self.state.clear_flee_ready();

        let Some(enemy) = self
            .state
            .current_actor()
            .filter(|c| c.is_alive() && c.side() == Side::Enemy)
            .cloned()
        else {
            self.state.current_turn_index += 1;
            self.next_turn();
            return;
        };
        self.state.log(format!("{}'s turn", enemy.name));

        match self.enemy_ai.choose_action(&enemy, &self.state) {
            Some(action) => self.schedule(
                self.config.pacing.enemy_act_ms,
                Continuation::EnemyAct {
                    enemy: enemy.id,
                    action,
                },
            ),
            None => self.finish(BattleOutcome::Defeat),
        }
    }

    fn enemy_act(&mut self, enemy: &CombatantId, action: EnemyAction) {
        let pacing = self.config.pacing.clone();
        match action {
            EnemyAction::Attack { target } => {
                let resolution = resolve_attack(&mut self.state, enemy, &target, &mut self.rng);
                self.settle(resolution, pacing.attack_settle_ms);
            }
            EnemyAction::Skill { skill, targets } => {
                let resolution = resolve_skill(&mut self.state, enemy, &skill, &targets, &mut self.rng);
                self.settle(resolution, pacing.skill_settle_ms);
            }
        }
    }

    fn roll_escape(&mut self) {
        match resolve_flee(&mut self.state, &mut self.rng) {
            FleeResult::Escaped => self.finish(BattleOutcome::Escaped),
            FleeResult::Failed => {
                self.enter_phase(BattlePhase::Executing);
                self.schedule(self.config.pacing.flee_fail_settle_ms, Continuation::AdvanceTurn);
            }
        }
    }

    /// Queue follow-up narration, then advance after the settle time
    fn settle(&mut self, resolution: Resolution, settle_ms: Millis) {
        self.enter_phase(BattlePhase::Executing);
        for FollowUp { steps, text } in resolution.follow_ups {
            let delay = Millis::from(steps).saturating_mul(self.config.pacing.follow_up_ms);
            self.schedule(delay, Continuation::Message(text));
        }
        self.schedule(settle_ms, Continuation::AdvanceTurn);
    }

    fn finish(&mut self, outcome: BattleOutcome) {
        let phase = match outcome {
            BattleOutcome::Victory => {
                self.state.log("Victory!");
                BattlePhase::Victory
            }
            BattleOutcome::Defeat => {
                self.state.log("Defeated...");
                BattlePhase::Defeat
            }
            BattleOutcome::Escaped => BattlePhase::Fled,
        };
        self.enter_phase(phase);
        tracing::info!(?outcome, round = self.state.round, "battle ended");
    }

    fn back_to_command(&mut self) {
        self.state.selection.clear();
        self.enter_phase(BattlePhase::PlayerCommand);
    }

    fn enter_phase(&mut self, phase: BattlePhase) {
        if self.state.phase != phase {
            tracing::debug!(from = ?self.state.phase, to = ?phase, "phase change");
        }
        self.state.phase = phase;
    }

    fn schedule(&mut self, delay: Millis, event: Continuation) {
        self.scheduler.schedule(delay, event);
    }

    fn acting_hero_id(&self) -> Result<CombatantId> {
        self.state
            .current_hero()
            .map(|h| h.id.clone())
            .ok_or(BattleError::NoActiveHero)
    }

    fn expect_phase(&self, action: &'static str, allowed: &[BattlePhase]) -> Result<()> {
        if allowed.contains(&self.state.phase) {
            Ok(())
        } else {
            Err(self.reject(action, self.state.phase))
        }
    }

    fn reject(&self, action: &'static str, phase: BattlePhase) -> BattleError {
        tracing::warn!(action, ?phase, "input rejected");
        BattleError::WrongPhase { action, phase }
    }
}
