//! Match state machine
//!
//! `Setup → PreBubbleBlowing → BubbleBlowing → Fighting → PostFighting`,
//! then either `Finished` (return to lobby) or back to `Setup`.
//!
//! The match is the only writer of match and bubbleman state. Hosts call
//! [`Match::advance`] once per frame and forward physics callbacks through
//! [`Match::on_attack_overlap`] and [`Match::on_body_collision`]. Every visible
//! effect is queued as a [`StateChange`] and flushed through the [`Transport`]
//! at the end of the call that produced it.

use std::sync::mpsc::Receiver;

use super::blow_phase::BlowPhaseController;
use super::bubbleman::BubblemanState;
use super::combat::{self, AttackEvent, AttackResolution, PopOutcome};
use super::config::MatchConfig;
use super::debug_flags;
use super::events::StateChange;
use super::fight_phase::{self, FightPhaseController};
use super::ports::{InputSource, Physics, Presentation};
use super::timer::{sanitize_dt, StageTimer, StepTimer};
use super::transport::{Envelope, Transport};
use super::types::{
    AnnouncerCue, AttackKind, BlowSide, Contact, PlayerId, SoundEffect, Stage, TextAnchor,
    TopText, Vec3,
};
use crate::error::{MatchError, Result};

/// Where each bubbleman is placed at setup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnPoints {
    pub one: Vec3,
    pub two: Vec3,
}

impl Default for SpawnPoints {
    fn default() -> Self {
        Self { one: Vec3::new(-3.0, 0.0, 0.0), two: Vec3::new(3.0, 0.0, 0.0) }
    }
}

impl SpawnPoints {
    pub fn get(&self, player: PlayerId) -> Vec3 {
        match player {
            PlayerId::One => self.one,
            PlayerId::Two => self.two,
        }
    }
}

pub struct Match<P, Y, I> {
    config: MatchConfig,
    presentation: P,
    physics: Y,
    input: I,
    transport: Transport,
    spawns: SpawnPoints,

    stage: Stage,
    countdown: i32,
    countdown_timer: StepTimer,
    stage_timer: StageTimer,
    highlight_timer: StepTimer,
    highlight: BlowSide,
    /// Set on entering Fighting and after every pop; the banner-expiry
    /// check consumes it.
    fight_check_armed: bool,
    winner: Option<PlayerId>,
    terminated: bool,
    ticks: u64,

    fighters: [BubblemanState; 2],
    blow: [BlowPhaseController; 2],
    fight: [FightPhaseController; 2],

    outbox: Vec<StateChange>,
}

impl<P: Presentation, Y: Physics, I: InputSource> Match<P, Y, I> {
    pub fn new(config: MatchConfig, presentation: P, physics: Y, input: I) -> Result<Self> {
        config.validate()?;
        let spawns = SpawnPoints::default();
        let base = config.blow.base_size;
        let step = config.blow.blow_step;
        Ok(Self {
            countdown: config.stage.countdown_start,
            countdown_timer: StepTimer::new(config.stage.countdown_step_secs),
            stage_timer: StageTimer::new(config.stage.blow_duration_secs),
            highlight_timer: StepTimer::new(config.stage.highlight_period_secs),
            highlight: BlowSide::Left,
            fight_check_armed: false,
            winner: None,
            terminated: false,
            ticks: 0,
            fighters: [
                BubblemanState::new(PlayerId::One, spawns.one, base),
                BubblemanState::new(PlayerId::Two, spawns.two, base),
            ],
            blow: [
                BlowPhaseController::new(PlayerId::One, step),
                BlowPhaseController::new(PlayerId::Two, step),
            ],
            fight: [FightPhaseController::new(PlayerId::One), FightPhaseController::new(PlayerId::Two)],
            outbox: Vec::new(),
            stage: Stage::Setup,
            transport: Transport::Local,
            spawns,
            config,
            presentation,
            physics,
            input,
        })
    }

    pub fn with_spawn_points(mut self, spawns: SpawnPoints) -> Self {
        self.spawns = spawns;
        self
    }

    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    /// New broadcast subscription; `None` for a local match.
    pub fn subscribe(&mut self) -> Option<Receiver<Envelope>> {
        self.transport.hub_mut().map(|hub| hub.subscribe())
    }

    // ========================
    // Accessors
    // ========================

    pub fn current_stage(&self) -> Stage {
        self.stage
    }

    /// `[P1, P2]`
    pub fn scores(&self) -> [u32; 2] {
        [self.fighters[0].score(), self.fighters[1].score()]
    }

    pub fn bubbleman(&self, player: PlayerId) -> &BubblemanState {
        &self.fighters[player.index()]
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    pub fn countdown(&self) -> i32 {
        self.countdown
    }

    pub fn stage_timer_remaining(&self) -> f32 {
        self.stage_timer.remaining()
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Frames advanced with a positive delta.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn blow_controller(&self, player: PlayerId) -> &BlowPhaseController {
        &self.blow[player.index()]
    }

    pub fn fight_controller(&self, player: PlayerId) -> &FightPhaseController {
        &self.fight[player.index()]
    }

    pub fn presentation(&self) -> &P {
        &self.presentation
    }

    pub fn presentation_mut(&mut self) -> &mut P {
        &mut self.presentation
    }

    pub fn physics(&self) -> &Y {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut Y {
        &mut self.physics
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    // ========================
    // Tick
    // ========================

    pub fn advance(&mut self, dt: f32) {
        let dt = sanitize_dt(dt);
        if dt > 0.0 {
            self.ticks += 1;
        }

        if self.stage == Stage::Setup {
            self.run_setup();
        }

        match self.stage {
            Stage::PreBubbleBlowing => self.tick_countdown(dt),
            Stage::BubbleBlowing => self.tick_blowing(dt),
            Stage::Fighting => self.tick_fighting(dt),
            Stage::PostFighting => self.tick_post_fighting(dt),
            Stage::Setup | Stage::Finished => {}
        }

        if debug_flags::match_debug_enabled() {
            log::debug!(
                "[match] tick={} stage={:?} countdown={} timer={:.3} scores={:?} sizes=({:.3},{:.3})",
                self.ticks,
                self.stage,
                self.countdown,
                self.stage_timer.remaining(),
                self.scores(),
                self.fighters[0].size(),
                self.fighters[1].size()
            );
        }

        self.flush();
    }

    /// Loop back into `Setup` from `PostFighting` or `Finished`. Setup runs on
    /// the next [`advance`](Self::advance).
    pub fn restart(&mut self) -> Result<()> {
        self.try_transition(Stage::Setup)?;
        self.flush();
        Ok(())
    }

    fn run_setup(&mut self) {
        let cfg = self.config.clone();
        self.countdown = cfg.stage.countdown_start;
        self.countdown_timer = StepTimer::new(cfg.stage.countdown_step_secs);
        self.stage_timer.set(cfg.stage.blow_duration_secs);
        self.highlight_timer = StepTimer::new(cfg.stage.highlight_period_secs);
        self.highlight = BlowSide::Left;
        self.fight_check_armed = false;
        self.winner = None;
        self.terminated = false;

        for id in PlayerId::ALL {
            let spawn = self.spawns.get(id);
            self.fighters[id.index()] = BubblemanState::new(id, spawn, cfg.blow.base_size);
            self.blow[id.index()] = BlowPhaseController::new(id, cfg.blow.blow_step);
            self.fight[id.index()] = FightPhaseController::new(id);
            self.physics.spawn_body(id, spawn, cfg.blow.base_size);
            self.emit(StateChange::Grew { player: id, size: self.fighters[id.index()].size() });
        }

        self.emit(StateChange::ControlsVisible(false));
        self.emit(StateChange::Text { text: TopText::Empty, anchor: TextAnchor::Center });
        self.emit(StateChange::Score { one: 0, two: 0 });
        log::info!("match set up: win score {}", cfg.stage.win_score);
        self.transition(Stage::PreBubbleBlowing);
    }

    fn tick_countdown(&mut self, dt: f32) {
        self.countdown_timer.elapse(dt);
        while self.countdown_timer.take_step() {
            self.countdown -= 1;

            if self.countdown < 0 {
                self.countdown_timer.discard_backlog();
                self.enter_blowing();
                return;
            }

            if let Some(cue) = AnnouncerCue::for_countdown(self.countdown) {
                self.emit(StateChange::Cue(cue));
            }
            let text = if self.countdown == 0 {
                TopText::Blow
            } else {
                TopText::Countdown(self.countdown.min(u8::MAX as i32) as u8)
            };
            self.emit(StateChange::Text { text, anchor: TextAnchor::Center });
        }
    }

    fn enter_blowing(&mut self) {
        for ctl in &mut self.blow {
            ctl.enable();
        }
        self.stage_timer.set(self.config.stage.blow_duration_secs);
        self.highlight = BlowSide::Left;
        self.highlight_timer.reset();

        self.emit(StateChange::BlowControllersActive(true));
        self.emit(StateChange::ControlsVisible(true));
        self.emit(StateChange::Text { text: TopText::Empty, anchor: TextAnchor::TopBar });
        self.emit(StateChange::BlowHighlight(self.highlight));
        self.transition(Stage::BubbleBlowing);
    }

    fn tick_blowing(&mut self, dt: f32) {
        if self.stage_timer.tick(dt) {
            // this frame's input belongs to the blowing stage
            for id in PlayerId::ALL {
                self.input.sample(id, Stage::BubbleBlowing);
            }
            self.enter_fighting();
            return;
        }

        self.highlight_timer.elapse(dt);
        while self.highlight_timer.take_step() {
            self.highlight = self.highlight.flipped();
            self.emit(StateChange::BlowHighlight(self.highlight));
        }

        for id in PlayerId::ALL {
            let frame = self.input.sample(id, Stage::BubbleBlowing);
            if let Some(size) = self.blow[id.index()].update(&frame, &mut self.fighters[id.index()]) {
                self.emit(StateChange::Grew { player: id, size });
                self.emit(StateChange::Sfx { player: id, sfx: SoundEffect::Blow });
            }
        }
    }

    /// Blow release reported by an event-driven host instead of polled input.
    pub fn on_blow_key_released(&mut self, player: PlayerId, side: BlowSide) -> bool {
        if self.stage != Stage::BubbleBlowing {
            return false;
        }
        let grown = self.blow[player.index()].on_key_released(side, &mut self.fighters[player.index()]);
        if let Some(size) = grown {
            self.emit(StateChange::Grew { player, size });
            self.emit(StateChange::Sfx { player, sfx: SoundEffect::Blow });
        }
        self.flush();
        grown.is_some()
    }

    fn enter_fighting(&mut self) {
        for ctl in &mut self.blow {
            ctl.disable();
        }
        self.emit(StateChange::BlowControllersActive(false));
        self.emit(StateChange::ControlsVisible(false));
        self.emit(StateChange::Text { text: TopText::TimeUp, anchor: TextAnchor::TopBar });
        self.emit(StateChange::Text { text: TopText::Fight, anchor: TextAnchor::Center });

        let mut masses = [0.0; 2];
        for id in PlayerId::ALL {
            let i = id.index();
            masses[i] =
                self.fight[i].activate(&mut self.fighters[i], &self.config.fighter, &mut self.physics);
        }
        self.emit(StateChange::FightersActivated { masses });
        self.emit(StateChange::Cue(AnnouncerCue::Fight));

        self.stage_timer.set(self.config.stage.fight_banner_secs);
        self.fight_check_armed = true;
        self.transition(Stage::Fighting);
    }

    fn tick_fighting(&mut self, dt: f32) {
        self.stage_timer.tick(dt);
        if self.stage_timer.expired() && self.fight_check_armed {
            self.fight_check_armed = false;
            self.check_for_winner();
        }
        self.update_fighters(dt);
    }

    fn check_for_winner(&mut self) {
        let [one, two] = self.scores();
        self.emit(StateChange::Text { text: TopText::Scoreboard { one, two }, anchor: TextAnchor::ScoreBar });

        let win = self.config.stage.win_score;
        let winner = if one >= win {
            Some(PlayerId::One)
        } else if two >= win {
            Some(PlayerId::Two)
        } else {
            None
        };

        if let Some(winner) = winner {
            self.winner = Some(winner);
            self.stage_timer.set(self.config.stage.post_fight_secs);
            self.emit(StateChange::Text { text: TopText::Winner(winner), anchor: TextAnchor::Center });
            self.emit(StateChange::MatchWon { winner });
            log::info!("{} wins {}-{}", winner, one, two);
            self.transition(Stage::PostFighting);
        }
    }

    fn update_fighters(&mut self, dt: f32) {
        for id in PlayerId::ALL {
            let i = id.index();
            let frame = self.input.sample(id, self.stage);
            self.fight[i].update(
                dt,
                &frame,
                &mut self.fighters[i],
                &self.config.fighter,
                &mut self.physics,
                &mut self.outbox,
            );
        }
    }

    fn tick_post_fighting(&mut self, dt: f32) {
        self.update_fighters(dt);
        if !self.stage_timer.tick(dt) {
            return;
        }
        if self.config.stage.auto_restart {
            log::info!("post-fight over, restarting");
            self.transition(Stage::Setup);
        } else {
            self.terminated = true;
            self.emit(StateChange::MatchTerminated);
            log::info!("match terminated after {} ticks", self.ticks);
            self.transition(Stage::Finished);
        }
    }

    // ========================
    // Physics callbacks
    // ========================

    /// An attack collider of `attacker` overlaps the opponent's body.
    pub fn on_attack_overlap(&mut self, attacker: PlayerId, is_punch: bool) -> Option<AttackResolution> {
        if self.stage != Stage::Fighting {
            return None;
        }
        let target = attacker.opponent();
        let (a, t) = (attacker.index(), target.index());
        if !self.fight[a].is_enabled() || self.fighters[t].is_eliminated() {
            return None;
        }
        let kind = AttackKind::from_punch_flag(is_punch);
        if !self.fighters[a].claim_hit(kind) {
            return None;
        }

        let event = AttackEvent {
            attacker,
            target,
            kind,
            attacker_mass: self.fighters[a].mass(),
            target_mass: self.fighters[t].mass(),
            attacker_facing: self.fighters[a].facing,
        };
        // overlaps are reported after the physics step; probe from there
        if let Some(body) = self.physics.body_state(target) {
            self.fighters[t].position = body.position;
        }
        let against_wall =
            fight_phase::is_against_wall(&self.fighters[t], &self.config.fighter, &self.physics);
        let resolution = combat::resolve_attack(
            &event,
            &self.config.fighter,
            against_wall,
            self.fighters[t].is_respawn_invulnerable(),
        );

        match resolution {
            AttackResolution::WallPop { target } => {
                log::debug!("{} pinned {} against the wall", attacker, target);
                self.pop(target);
            }
            AttackResolution::Knockback { target, force, impulse, vulnerable_secs } => {
                self.fighters[t].make_pop_vulnerable(vulnerable_secs);
                self.physics.apply_impulse(target, impulse);
                self.emit(StateChange::Knockback { target, impulse });
                self.emit(StateChange::HitReaction { player: target });
                self.emit(StateChange::Sfx { player: attacker, sfx: SoundEffect::Bump });
                log::debug!("{} {:?} hits {} with force {:.2}", attacker, kind, target, force);
            }
        }

        self.flush();
        Some(resolution)
    }

    /// Body of `player` collided with something. Returns whether it popped.
    pub fn on_body_collision(&mut self, player: PlayerId, contact: Contact, impulse: f32) -> bool {
        if self.stage != Stage::Fighting {
            return false;
        }
        let i = player.index();
        if self.fighters[i].is_eliminated() {
            return false;
        }

        if contact == Contact::Player(player.opponent()) {
            self.emit(StateChange::Sfx { player, sfx: SoundEffect::Bump });
        }

        let impulse = if impulse.is_finite() { impulse.abs() } else { 0.0 };
        let fighter = &self.fighters[i];
        let threshold = fighter
            .profile()
            .map(|p| p.pop_threshold)
            .unwrap_or_else(|| combat::pop_threshold(fighter.size()));
        let popped = fighter.respawn_invulnerable() == 0.0
            && fighter.pop_vulnerable() > 0.0
            && impulse >= threshold;

        if popped {
            log::debug!("{} popped by impact {:.2} (threshold {:.2})", player, impulse, threshold);
            self.pop(player);
        }
        self.flush();
        popped
    }

    fn pop(&mut self, popped: PlayerId) {
        let p = popped.index();
        let scorer = popped.opponent();
        self.emit(StateChange::Sfx { player: popped, sfx: SoundEffect::Pop });

        let scorer_score = self.fighters[scorer.index()].award_point();
        let [one, two] = self.scores();
        self.emit(StateChange::Score { one, two });

        match combat::resolve_pop(popped, scorer_score, self.config.stage.win_score) {
            PopOutcome::Respawn { .. } => {
                let point = self.fighters[p].respawn(self.config.fighter.respawn_invulnerable_secs);
                self.physics.teleport(popped, point);
                self.physics.set_velocity(popped, Vec3::zeros());
                self.emit(StateChange::Respawned { player: popped, position: point });
            }
            PopOutcome::Eliminated { .. } => {
                self.fighters[p].eliminate();
                self.fight[p].disable();
                self.physics.remove_body(popped);
                self.emit(StateChange::Eliminated { player: popped });
            }
        }

        self.fight_check_armed = true;
        log::info!("{} popped, {} scores ({}-{})", popped, scorer, one, two);
    }

    // ========================
    // Plumbing
    // ========================

    fn emit(&mut self, change: StateChange) {
        self.outbox.push(change);
    }

    fn flush(&mut self) {
        for change in self.outbox.drain(..) {
            self.transport.deliver(&change, &mut self.presentation);
        }
    }

    fn try_transition(&mut self, next: Stage) -> Result<()> {
        if !self.stage.can_transition_to(next) {
            return Err(MatchError::InvalidStageTransition { from: self.stage, to: next });
        }
        self.transition(next);
        Ok(())
    }

    fn transition(&mut self, next: Stage) {
        if !self.stage.can_transition_to(next) {
            debug_assert!(false, "invalid stage transition {:?} -> {:?}", self.stage, next);
            log::error!("ignoring invalid stage transition {:?} -> {:?}", self.stage, next);
            return;
        }
        log::info!("stage {:?} -> {:?}", self.stage, next);
        self.stage = next;
        self.emit(StateChange::StageChanged(next));
    }
}
