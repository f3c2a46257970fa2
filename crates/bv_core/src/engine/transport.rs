//! Broadcast transport
//!
//! The authoritative match routes every [`StateChange`] through a
//! [`Transport`]. A local match only presents it. A networked match also
//! publishes an [`Envelope`] to every subscribed [`Projection`].
//!
//! ## Ordering
//! Envelopes carry a sequence number (gap-free, from 0) and a round number.
//! The round is bumped whenever a change starts a new life for a player
//! (respawn, match restart), so a projection can refuse anything that was
//! produced for a life it has already moved past.
//!
//! Remote players feed the authority through [`RemoteInput`]: commands are
//! queued on a channel and drained once per tick into an [`InputFrame`].

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use serde::{Deserialize, Serialize};

use super::events::{present, StateChange};
use super::ports::{InputFrame, InputSource, Presentation};
use super::types::{BlowSide, PlayerId, Stage, TopText, Vec3};
use crate::error::{MatchError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub seq: u64,
    pub round: u32,
    pub change: StateChange,
}

/// Fan-out of state changes to remote observers.
#[derive(Debug, Default)]
pub struct BroadcastHub {
    next_seq: u64,
    round: u32,
    subscribers: Vec<Sender<Envelope>>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Receiver<Envelope> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    /// Stamp and send a change. Subscribers whose receiver is gone are dropped.
    pub fn publish(&mut self, change: &StateChange) -> Envelope {
        if change.opens_round() {
            self.round += 1;
        }
        let envelope = Envelope { seq: self.next_seq, round: self.round, change: change.clone() };
        self.next_seq += 1;

        let before = self.subscribers.len();
        self.subscribers.retain(|tx| tx.send(envelope.clone()).is_ok());
        if self.subscribers.len() < before {
            log::debug!("dropped {} disconnected subscriber(s)", before - self.subscribers.len());
        }
        envelope
    }
}

#[derive(Debug, Default)]
pub enum Transport {
    /// Single machine: changes go to the local presentation only.
    #[default]
    Local,
    Networked(BroadcastHub),
}

impl Transport {
    pub fn networked() -> Self {
        Transport::Networked(BroadcastHub::new())
    }

    pub fn is_networked(&self) -> bool {
        matches!(self, Transport::Networked(_))
    }

    pub fn hub_mut(&mut self) -> Option<&mut BroadcastHub> {
        match self {
            Transport::Local => None,
            Transport::Networked(hub) => Some(hub),
        }
    }

    pub fn deliver(&mut self, change: &StateChange, presentation: &mut dyn Presentation) {
        present(change, presentation);
        if let Transport::Networked(hub) = self {
            hub.publish(change);
        }
    }
}

// ============================================
// Projection
// ============================================

/// Match state as reconstructed from broadcasts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedState {
    pub stage: Stage,
    pub scores: [u32; 2],
    pub sizes: [f32; 2],
    pub positions: [Option<Vec3>; 2],
    pub visible: [bool; 2],
    pub winner: Option<PlayerId>,
    pub terminated: bool,
    pub last_text: TopText,
    pub controls_visible: bool,
    pub blow_controllers_active: bool,
}

impl Default for ProjectedState {
    fn default() -> Self {
        Self {
            stage: Stage::Setup,
            scores: [0, 0],
            sizes: [1.0, 1.0],
            positions: [None, None],
            visible: [true, true],
            winner: None,
            terminated: false,
            last_text: TopText::Empty,
            controls_visible: false,
            blow_controllers_active: false,
        }
    }
}

impl ProjectedState {
    fn apply(&mut self, change: &StateChange) {
        match *change {
            StateChange::StageChanged(stage) => {
                self.stage = stage;
                if stage == Stage::Setup {
                    self.winner = None;
                    self.terminated = false;
                    self.visible = [true, true];
                }
            }
            StateChange::Text { text, .. } => self.last_text = text,
            StateChange::ControlsVisible(v) => self.controls_visible = v,
            StateChange::BlowControllersActive(v) => self.blow_controllers_active = v,
            StateChange::Grew { player, size } => self.sizes[player.index()] = size,
            StateChange::Moved { player, position, .. } => {
                self.positions[player.index()] = Some(position)
            }
            StateChange::Respawned { player, position } => {
                self.positions[player.index()] = Some(position);
                self.visible[player.index()] = true;
            }
            StateChange::Eliminated { player } => self.visible[player.index()] = false,
            StateChange::Score { one, two } => self.scores = [one, two],
            StateChange::MatchWon { winner } => self.winner = Some(winner),
            StateChange::MatchTerminated => self.terminated = true,
            StateChange::Cue(_)
            | StateChange::BlowHighlight(_)
            | StateChange::FightersActivated { .. }
            | StateChange::Sfx { .. }
            | StateChange::Footsteps { .. }
            | StateChange::Knockback { .. }
            | StateChange::HitReaction { .. } => {}
        }
    }
}

/// Read-only mirror of a networked match, as seen by one player.
pub struct Projection<P> {
    receiver: Receiver<Envelope>,
    presentation: P,
    state: ProjectedState,
    local_player: PlayerId,
    last_seq: Option<u64>,
    last_round: u32,
}

impl<P: Presentation> Projection<P> {
    pub fn new(receiver: Receiver<Envelope>, presentation: P, local_player: PlayerId) -> Self {
        Self {
            receiver,
            presentation,
            state: ProjectedState::default(),
            local_player,
            last_seq: None,
            last_round: 0,
        }
    }

    pub fn state(&self) -> &ProjectedState {
        &self.state
    }

    pub fn local_player(&self) -> PlayerId {
        self.local_player
    }

    pub fn presentation(&self) -> &P {
        &self.presentation
    }

    /// Top text worded for the local player.
    pub fn rendered_text(&self) -> String {
        self.state.last_text.render(Some(self.local_player))
    }

    pub fn apply(&mut self, envelope: &Envelope) -> Result<()> {
        let expected = self.last_seq.map_or(0, |s| s + 1);
        if envelope.seq != expected {
            return Err(MatchError::OutOfOrderBroadcast { expected, found: envelope.seq });
        }
        if envelope.round < self.last_round {
            return Err(MatchError::StaleRound { last: self.last_round, found: envelope.round });
        }

        self.last_seq = Some(envelope.seq);
        self.last_round = envelope.round;
        self.state.apply(&envelope.change);
        present(&envelope.change, &mut self.presentation);
        Ok(())
    }

    /// Apply everything queued. Rejected envelopes are logged and skipped.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        loop {
            match self.receiver.try_recv() {
                Ok(envelope) => match self.apply(&envelope) {
                    Ok(()) => applied += 1,
                    Err(err) => log::warn!("{} projection skipped envelope: {}", self.local_player, err),
                },
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    log::trace!("{} projection: authority gone", self.local_player);
                    break;
                }
            }
        }
        applied
    }
}

// ============================================
// Remote commands
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PlayerCommand {
    /// Hold the lateral axis at this value until the next `Move`.
    Move(f32),
    Jump,
    Attack,
    ReleaseBlow(BlowSide),
}

/// Client end of a remote player's command channel.
#[derive(Debug, Clone)]
pub struct CommandSender {
    player: PlayerId,
    tx: Sender<PlayerCommand>,
}

impl CommandSender {
    pub fn player(&self) -> PlayerId {
        self.player
    }

    /// False once the authority has gone away.
    pub fn send(&self, command: PlayerCommand) -> bool {
        self.tx.send(command).is_ok()
    }
}

/// Input on the authority: one player sampled locally, the other driven by
/// queued remote commands.
pub struct RemoteInput<L> {
    local: L,
    local_player: PlayerId,
    commands: Receiver<PlayerCommand>,
    held_axis: f32,
    /// Stage of the last remote sample; presses queued under another stage
    /// are dropped.
    last_stage: Option<Stage>,
}

impl<L: InputSource> RemoteInput<L> {
    pub fn channel(local: L, local_player: PlayerId) -> (Self, CommandSender) {
        let (tx, rx) = mpsc::channel();
        let input =
            Self { local, local_player, commands: rx, held_axis: 0.0, last_stage: None };
        (input, CommandSender { player: local_player.opponent(), tx })
    }

    pub fn local_mut(&mut self) -> &mut L {
        &mut self.local
    }

    fn drain_remote(&mut self, stage: Stage) -> InputFrame {
        let stale = self.last_stage.is_some_and(|last| last != stage);
        self.last_stage = Some(stage);

        let mut frame = InputFrame::idle();
        while let Ok(command) = self.commands.try_recv() {
            if stale && !matches!(command, PlayerCommand::Move(_)) {
                continue;
            }
            match command {
                PlayerCommand::Move(axis) => self.held_axis = axis,
                PlayerCommand::Jump => frame.jump_pressed = true,
                PlayerCommand::Attack => frame.attack_pressed = true,
                PlayerCommand::ReleaseBlow(BlowSide::Left) => frame.blow_left_released = true,
                PlayerCommand::ReleaseBlow(BlowSide::Right) => frame.blow_right_released = true,
            }
        }
        frame.move_axis = self.held_axis;
        frame
    }
}

impl<L: InputSource> InputSource for RemoteInput<L> {
    fn sample(&mut self, player: PlayerId, stage: Stage) -> InputFrame {
        if player == self.local_player {
            self.local.sample(player, stage)
        } else {
            self.drain_remote(stage)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::input::ScriptedInput;
    use crate::engine::ports::NullPresentation;
    use crate::engine::test_support::{PresentationCall, RecordingPresentation};
    use crate::engine::types::TextAnchor;

    #[test]
    fn test_hub_sequences_and_rounds() {
        let mut hub = BroadcastHub::new();
        let rx = hub.subscribe();
        hub.publish(&StateChange::Score { one: 1, two: 0 });
        hub.publish(&StateChange::Respawned { player: PlayerId::Two, position: Vec3::zeros() });
        hub.publish(&StateChange::Score { one: 1, two: 0 });

        let got: Vec<Envelope> = rx.try_iter().collect();
        assert_eq!(got.iter().map(|e| e.seq).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(got.iter().map(|e| e.round).collect::<Vec<_>>(), vec![0, 1, 1]);
    }

    #[test]
    fn test_hub_drops_disconnected_subscribers() {
        let mut hub = BroadcastHub::new();
        let keep = hub.subscribe();
        drop(hub.subscribe());
        hub.publish(&StateChange::MatchTerminated);
        assert_eq!(hub.subscriber_count(), 1);
        assert_eq!(keep.try_iter().count(), 1);
    }

    #[test]
    fn test_local_transport_presents_only() {
        let mut transport = Transport::Local;
        let mut rec = RecordingPresentation::default();
        transport.deliver(&StateChange::MatchTerminated, &mut rec);
        assert_eq!(rec.calls, vec![PresentationCall::ReturnToLobby]);
        assert!(transport.hub_mut().is_none());
    }

    #[test]
    fn test_projection_mirrors_and_presents() {
        let mut transport = Transport::networked();
        let rx = transport.hub_mut().map(|h| h.subscribe()).unwrap();
        let mut projection = Projection::new(rx, RecordingPresentation::default(), PlayerId::Two);

        let mut local = NullPresentation;
        for change in [
            StateChange::StageChanged(Stage::Fighting),
            StateChange::Score { one: 3, two: 1 },
            StateChange::Text { text: TopText::Winner(PlayerId::One), anchor: TextAnchor::Center },
            StateChange::Eliminated { player: PlayerId::Two },
        ] {
            transport.deliver(&change, &mut local);
        }

        assert_eq!(projection.pump(), 4);
        let state = projection.state();
        assert_eq!(state.stage, Stage::Fighting);
        assert_eq!(state.scores, [3, 1]);
        assert_eq!(state.visible, [true, false]);
        assert_eq!(projection.rendered_text(), "You Lose!");
        assert!(projection
            .presentation()
            .calls
            .contains(&PresentationCall::Visible(PlayerId::Two, false)));
    }

    #[test]
    fn test_projection_rejects_out_of_order() {
        let (_tx, rx) = mpsc::channel();
        let mut projection = Projection::new(rx, NullPresentation, PlayerId::One);
        let late = Envelope { seq: 2, round: 0, change: StateChange::MatchTerminated };
        assert_eq!(
            projection.apply(&late),
            Err(MatchError::OutOfOrderBroadcast { expected: 0, found: 2 })
        );
        assert!(!projection.state().terminated);
    }

    #[test]
    fn test_projection_rejects_stale_round() {
        let (_tx, rx) = mpsc::channel();
        let mut projection = Projection::new(rx, NullPresentation, PlayerId::One);
        let first = Envelope { seq: 0, round: 2, change: StateChange::Score { one: 1, two: 0 } };
        projection.apply(&first).unwrap();
        let stale = Envelope { seq: 1, round: 1, change: StateChange::Score { one: 0, two: 0 } };
        assert_eq!(projection.apply(&stale), Err(MatchError::StaleRound { last: 2, found: 1 }));
        assert_eq!(projection.state().scores, [1, 0]);
    }

    #[test]
    fn test_remote_input_merges_commands() {
        let mut local = ScriptedInput::new();
        local.push(PlayerId::One, InputFrame { jump_pressed: true, ..InputFrame::idle() });
        let (mut input, sender) = RemoteInput::channel(local, PlayerId::One);
        assert_eq!(sender.player(), PlayerId::Two);

        assert!(sender.send(PlayerCommand::Move(-1.0)));
        assert!(sender.send(PlayerCommand::Attack));
        assert!(sender.send(PlayerCommand::ReleaseBlow(BlowSide::Right)));

        let one = input.sample(PlayerId::One, Stage::Fighting);
        assert!(one.jump_pressed);

        let two = input.sample(PlayerId::Two, Stage::Fighting);
        assert_eq!(two.move_axis, -1.0);
        assert!(two.attack_pressed);
        assert!(two.blow_right_released);

        // the axis is held, presses are not
        let two = input.sample(PlayerId::Two, Stage::Fighting);
        assert_eq!(two.move_axis, -1.0);
        assert!(!two.attack_pressed);
    }

    #[test]
    fn test_remote_presses_do_not_cross_stages() {
        let (mut input, sender) = RemoteInput::channel(ScriptedInput::new(), PlayerId::One);
        input.sample(PlayerId::Two, Stage::BubbleBlowing);

        sender.send(PlayerCommand::ReleaseBlow(BlowSide::Left));
        sender.send(PlayerCommand::Attack);
        sender.send(PlayerCommand::Jump);
        sender.send(PlayerCommand::Move(1.0));

        let two = input.sample(PlayerId::Two, Stage::Fighting);
        assert!(!two.attack_pressed && !two.jump_pressed && !two.blow_left_released);
        assert_eq!(two.move_axis, 1.0);

        sender.send(PlayerCommand::Attack);
        assert!(input.sample(PlayerId::Two, Stage::Fighting).attack_pressed);
    }
}
