//! Whole-match scenarios driven through the public match surface.

use super::config::MatchConfig;
use super::input::ScriptedInput;
use super::match_machine::Match;
use super::ports::InputFrame;
use super::test_support::{
    advance_to_fighting, scripted_match, scripted_match_with, PresentationCall, RecordingPresentation,
    ScriptedMatch, ScriptedPhysics,
};
use super::transport::{PlayerCommand, Projection, RemoteInput, Transport};
use super::types::{AnnouncerCue, BlowSide, Contact, PlayerId, Stage, TopText};

fn attack_frame() -> InputFrame {
    InputFrame { attack_pressed: true, ..InputFrame::idle() }
}

/// `attacker` punches the opponent while it is pinned against a wall, then
/// enough time passes for the window and respawn invulnerability to run out.
fn wall_pop(m: &mut ScriptedMatch, attacker: PlayerId) {
    let target = attacker.opponent();
    m.physics_mut().against_wall[target.index()] = true;
    m.input_mut().push(attacker, attack_frame());
    m.advance(0.016);
    assert!(m.on_attack_overlap(attacker, true).is_some());
    m.advance(0.6);
}

#[derive(Debug, PartialEq)]
struct Snapshot {
    stage: Stage,
    countdown: i32,
    timer: f32,
    scores: [u32; 2],
    sizes: [f32; 2],
    calls: usize,
    ticks: u64,
}

fn snapshot(m: &ScriptedMatch) -> Snapshot {
    Snapshot {
        stage: m.current_stage(),
        countdown: m.countdown(),
        timer: m.stage_timer_remaining(),
        scores: m.scores(),
        sizes: [m.bubbleman(PlayerId::One).size(), m.bubbleman(PlayerId::Two).size()],
        calls: m.presentation().calls.len(),
        ticks: m.ticks(),
    }
}

#[test]
fn test_countdown_cues_independent_of_frame_size() {
    for dt in [0.016f32, 1.0, 4.9] {
        let mut m = scripted_match();
        let mut elapsed = 0.0f32;
        while elapsed < 5.0 {
            m.advance(dt);
            elapsed += dt;
        }

        assert_eq!(m.current_stage(), Stage::BubbleBlowing, "dt {}", dt);
        assert_eq!(
            m.presentation().cues(),
            vec![AnnouncerCue::Three, AnnouncerCue::Two, AnnouncerCue::One, AnnouncerCue::Blow],
            "dt {}",
            dt
        );
        let center_texts: Vec<TopText> = m
            .presentation()
            .texts()
            .into_iter()
            .filter(|t| matches!(t, TopText::Countdown(_) | TopText::Blow))
            .collect();
        assert_eq!(
            center_texts,
            vec![TopText::Countdown(3), TopText::Countdown(2), TopText::Countdown(1), TopText::Blow]
        );
    }
}

#[test]
fn test_blowing_grows_only_on_alternation() {
    let mut m = scripted_match();
    for _ in 0..6 {
        m.advance(1.0);
    }
    assert_eq!(m.current_stage(), Stage::BubbleBlowing);

    for i in 0..10 {
        let p1 = if i % 2 == 0 {
            InputFrame { blow_left_released: true, ..InputFrame::idle() }
        } else {
            InputFrame { blow_right_released: true, ..InputFrame::idle() }
        };
        m.input_mut().push(PlayerId::One, p1);
        m.input_mut().push(PlayerId::Two, InputFrame { blow_left_released: true, ..InputFrame::idle() });
        m.advance(0.016);
    }

    assert!((m.bubbleman(PlayerId::One).size() - 1.2).abs() < 1e-5);
    assert!((m.bubbleman(PlayerId::Two).size() - 1.02).abs() < 1e-6);
    let grown = PresentationCall::Scale(PlayerId::Two, m.bubbleman(PlayerId::Two).size());
    assert_eq!(m.presentation().count(&grown), 1);
}

#[test]
fn test_blow_highlight_alternates_every_half_second() {
    let mut m = scripted_match();
    for _ in 0..5 {
        m.advance(1.0);
    }
    m.advance(1.0);
    let highlights: Vec<&PresentationCall> = m
        .presentation()
        .calls
        .iter()
        .filter(|c| matches!(c, PresentationCall::Highlight(_)))
        .collect();
    assert_eq!(
        highlights,
        vec![
            &PresentationCall::Highlight(BlowSide::Left),
            &PresentationCall::Highlight(BlowSide::Right),
            &PresentationCall::Highlight(BlowSide::Left),
        ]
    );
}

#[test]
fn test_player_one_wins_and_match_terminates_once() {
    let mut m = scripted_match();
    advance_to_fighting(&mut m);

    for _ in 0..5 {
        wall_pop(&mut m, PlayerId::One);
    }

    assert_eq!(m.scores(), [5, 0]);
    assert_eq!(m.current_stage(), Stage::PostFighting);
    assert_eq!(m.winner(), Some(PlayerId::One));
    assert!(m.bubbleman(PlayerId::Two).is_eliminated());
    assert!(m.presentation().texts().contains(&TopText::Winner(PlayerId::One)));
    assert_eq!(TopText::Winner(PlayerId::One).to_string(), "Player One Wins!");

    for _ in 0..4 {
        m.advance(1.0);
    }
    assert!(!m.is_terminated());
    m.advance(1.0);
    assert!(m.is_terminated());
    assert_eq!(m.current_stage(), Stage::Finished);

    for _ in 0..10 {
        m.advance(1.0);
    }
    assert_eq!(m.presentation().count(&PresentationCall::ReturnToLobby), 1);
}

#[test]
fn test_win_is_detected_on_banner_edge_only() {
    let mut cfg = MatchConfig::default();
    cfg.stage.win_score = 1;
    let mut m = scripted_match_with(cfg);
    advance_to_fighting(&mut m);

    m.input_mut().push(PlayerId::Two, attack_frame());
    m.physics_mut().against_wall[0] = true;
    m.advance(0.016);
    assert!(m.on_attack_overlap(PlayerId::Two, true).is_some());
    assert_eq!(m.scores(), [0, 1]);

    m.advance(0.5);
    assert_eq!(m.current_stage(), Stage::Fighting);
    m.advance(0.5);
    assert_eq!(m.current_stage(), Stage::PostFighting);
    assert_eq!(m.winner(), Some(PlayerId::Two));
}

#[test]
fn test_scoreboard_refreshes_once_per_crossing() {
    let mut m = scripted_match();
    advance_to_fighting(&mut m);
    for _ in 0..50 {
        m.advance(0.1);
    }
    let boards = m
        .presentation()
        .texts()
        .into_iter()
        .filter(|t| matches!(t, TopText::Scoreboard { .. }))
        .count();
    assert_eq!(boards, 1);

    wall_pop(&mut m, PlayerId::Two);
    assert!(m.presentation().texts().contains(&TopText::Scoreboard { one: 0, two: 1 }));
}

#[test]
fn test_impact_pop_threshold_at_unit_scale() {
    let mut m = scripted_match();
    advance_to_fighting(&mut m);

    // P2 knocks P1 back, opening its vulnerability window
    m.input_mut().push(PlayerId::Two, attack_frame());
    m.advance(0.016);
    assert!(m.on_attack_overlap(PlayerId::Two, true).is_some());
    assert!(m.bubbleman(PlayerId::One).pop_vulnerable() > 0.0);

    assert!(!m.on_body_collision(PlayerId::One, Contact::Environment, 7.0));
    assert_eq!(m.scores(), [0, 0]);
    assert!(m.on_body_collision(PlayerId::One, Contact::Environment, 7.4));
    assert_eq!(m.scores(), [0, 1]);
}

#[test]
fn test_hard_impact_without_vulnerability_does_not_pop() {
    let mut m = scripted_match();
    advance_to_fighting(&mut m);
    assert!(!m.on_body_collision(PlayerId::One, Contact::Environment, 100.0));
    assert_eq!(m.scores(), [0, 0]);
}

#[test]
fn test_advance_zero_is_idempotent() {
    let mut m = scripted_match();
    m.advance(0.0);
    m.advance(2.5);
    let before = snapshot(&m);
    for _ in 0..3 {
        m.advance(0.0);
    }
    assert_eq!(snapshot(&m), before);

    m.advance(3.0);
    assert_eq!(m.current_stage(), Stage::BubbleBlowing);
    m.advance(1.3);
    let before = snapshot(&m);
    m.advance(0.0);
    assert_eq!(snapshot(&m), before);

    advance_to_fighting(&mut m);
    m.advance(1.0);
    let before = snapshot(&m);
    m.advance(0.0);
    m.advance(-1.0);
    m.advance(f32::NAN);
    assert_eq!(snapshot(&m), before);
}

#[test]
fn test_blow_input_does_not_leak_into_fighting() {
    let mut m = scripted_match();
    for _ in 0..5 {
        m.advance(1.0);
    }
    assert_eq!(m.current_stage(), Stage::BubbleBlowing);

    m.input_mut().push(PlayerId::One, InputFrame { blow_left_released: true, ..InputFrame::idle() });
    m.advance(5.0);
    assert_eq!(m.current_stage(), Stage::Fighting);
    m.advance(0.016);
    assert_eq!(m.bubbleman(PlayerId::One).size(), 1.0);

    assert!(!m.on_blow_key_released(PlayerId::One, BlowSide::Left));
    assert_eq!(m.bubbleman(PlayerId::One).size(), 1.0);
}

#[test]
fn test_presses_during_blowing_do_not_fire_in_fighting() {
    let (input, sender) = RemoteInput::channel(ScriptedInput::new(), PlayerId::One);
    let mut m = Match::new(
        MatchConfig::default(),
        RecordingPresentation::default(),
        ScriptedPhysics::default(),
        input,
    )
    .unwrap();
    m.advance(0.0);
    for _ in 0..5 {
        m.advance(1.0);
    }
    assert_eq!(m.current_stage(), Stage::BubbleBlowing);

    sender.send(PlayerCommand::Attack);
    sender.send(PlayerCommand::Jump);
    m.input_mut().local_mut().push(PlayerId::One, attack_frame());
    m.advance(5.0);
    assert_eq!(m.current_stage(), Stage::Fighting);

    m.advance(0.016);
    assert_eq!(m.bubbleman(PlayerId::One).active_attack(), None);
    assert_eq!(m.bubbleman(PlayerId::Two).active_attack(), None);
    assert!(m.physics().impulses.is_empty());

    // presses sent once fighting has started still land
    sender.send(PlayerCommand::Attack);
    m.advance(0.016);
    assert!(m.bubbleman(PlayerId::Two).active_attack().is_some());
}

#[test]
fn test_failed_raycasts_keep_the_match_running() {
    let mut m = scripted_match();
    advance_to_fighting(&mut m);
    m.physics_mut().fail_raycasts = true;
    m.input_mut().push(PlayerId::One, InputFrame { jump_pressed: true, ..InputFrame::idle() });
    m.advance(0.016);
    // failed ground probe reads as airborne: no jump
    assert!(m.physics().impulses.is_empty());
}

#[test]
fn test_networked_projection_mirrors_authority() {
    let mut m = scripted_match().with_transport(Transport::networked());
    let rx = m.subscribe().expect("networked match has a hub");
    let mut remote = Projection::new(rx, RecordingPresentation::default(), PlayerId::Two);

    advance_to_fighting(&mut m);
    remote.pump();
    assert_eq!(remote.state().stage, Stage::Fighting);

    for _ in 0..5 {
        wall_pop(&mut m, PlayerId::One);
    }
    for _ in 0..5 {
        m.advance(1.0);
    }
    remote.pump();

    let state = remote.state();
    assert_eq!(state.stage, Stage::Finished);
    assert_eq!(state.scores, m.scores());
    assert_eq!(state.winner, Some(PlayerId::One));
    assert!(state.terminated);
    assert_eq!(state.visible, [true, false]);
    assert_eq!(remote.rendered_text(), "You Lose!");
    assert_eq!(remote.presentation().count(&PresentationCall::ReturnToLobby), 1);
}

#[test]
fn test_restart_after_finish_resets_scores_and_sizes() {
    let mut cfg = MatchConfig::default();
    cfg.stage.win_score = 1;
    let mut m = scripted_match_with(cfg);
    advance_to_fighting(&mut m);
    wall_pop(&mut m, PlayerId::One);
    m.advance(1.0);
    assert_eq!(m.current_stage(), Stage::PostFighting);
    m.advance(5.0);
    assert!(m.is_terminated());

    m.restart().expect("restart from Finished");
    assert_eq!(m.current_stage(), Stage::Setup);
    m.advance(0.0);
    assert_eq!(m.current_stage(), Stage::PreBubbleBlowing);
    assert_eq!(m.scores(), [0, 0]);
    assert!(!m.is_terminated());
    assert_eq!(m.winner(), None);
}
