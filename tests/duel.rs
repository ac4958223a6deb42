//! End-to-end duels over an in-memory link
//!
//! Both sessions run their real tick loops under tokio's paused clock, so
//! logical time auto-advances and the tests stay deterministic. State is
//! observed through the watch-based view rather than by racing the event
//! stream.

use std::time::Duration;

use robot_duel::{
    BattlePhase, BattleSession, Config, MemoryLink, SessionHandle, Vec2,
};

fn spawn_pair() -> (SessionHandle, SessionHandle) {
    let config = Config::default();
    let (initiator_end, responder_end) = MemoryLink::pair();

    let (initiator_session, initiator) =
        BattleSession::new(initiator_end.link, initiator_end.inbound, &config);
    let (responder_session, responder) =
        BattleSession::new(responder_end.link, responder_end.inbound, &config);

    tokio::spawn(initiator_session.run());
    tokio::spawn(responder_session.run());

    (initiator, responder)
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(300)).await;
}

#[tokio::test(start_paused = true)]
async fn full_bout_to_match_over_and_reset() {
    let (initiator, responder) = spawn_pair();

    initiator.start().await;
    settle().await;
    assert_eq!(initiator.view().phase, BattlePhase::InProgress);
    assert_eq!(responder.view().phase, BattlePhase::InProgress);

    // The responder drops a bomb just behind the initiator's robot, then the
    // initiator backs into it. Its own proximity scan runs on its true
    // position, so it detonates and self-applies before any message races.
    responder
        .place_hazard(responder.view().remote.position + Vec2::new(0.0, 60.0))
        .await;
    settle().await;
    for _ in 0..30 {
        if initiator.view().local.hp == 90 {
            break;
        }
        initiator.steer(Vec2::new(0.0, -1.0)).await;
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    initiator.steer(Vec2::ZERO).await;
    settle().await;
    assert_eq!(initiator.view().local.hp, 90);
    assert!(initiator.view().hazards.is_empty());

    // The initiator is now facing away from its opponent. The responder
    // rams it from behind: every contact is a rear strike the initiator
    // self-applies with authority, and its spike never answers back.
    let mut terminal = false;
    for _ in 0..1200 {
        let view = responder.view();
        if view.phase.is_terminal() {
            terminal = true;
            break;
        }
        let gap = view.remote.position - view.local.position;
        // Hold just inside striking range rather than plowing through.
        let chase = if gap.length() > 60.0 {
            gap.normalized_or_zero()
        } else {
            Vec2::ZERO
        };
        responder.steer(chase).await;
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert!(terminal, "bout did not finish within the time limit");
    settle().await;

    // Ground down to zero; the two peers agree on the outcome.
    assert_eq!(initiator.view().phase, BattlePhase::Defeated);
    assert_eq!(initiator.view().local.hp, 0);
    assert_eq!(responder.view().phase, BattlePhase::Victorious);
    assert!(responder.view().local.hp > 0);
    assert_eq!(responder.view().remote.hp, 0);

    // Reset from one side restores both peers to a fresh match.
    responder.reset().await;
    settle().await;
    for handle in [&initiator, &responder] {
        let view = handle.view();
        assert_eq!(view.phase, BattlePhase::InProgress);
        assert_eq!(view.local.hp, 100);
        assert_eq!(view.remote.hp, 100);
        assert!(view.hazards.is_empty());
    }
}

#[tokio::test(start_paused = true)]
async fn peers_see_mirrored_motion() {
    let (initiator, responder) = spawn_pair();

    initiator.start().await;
    settle().await;

    // Drive the initiator's robot east for half a second, then stop and let
    // the responder's interpolation converge.
    initiator.steer(Vec2::new(1.0, 0.0)).await;
    tokio::time::sleep(Duration::from_millis(500)).await;
    initiator.steer(Vec2::ZERO).await;
    settle().await;

    let sent = initiator.view().local.position;
    assert!(sent.x > 280.0, "robot did not advance: {:?}", sent);
    assert_eq!(sent.y, 160.0);

    // Same robot in the responder's frame: x agrees, y is mirrored across
    // the arena midline.
    let seen = responder.view().remote.position;
    assert!((seen.x - sent.x).abs() < 25.0, "x diverged: {:?}", seen);
    assert!((seen.y - 640.0).abs() < 1.0, "y not mirrored: {:?}", seen);
}

#[tokio::test(start_paused = true)]
async fn responder_walking_into_a_bomb_takes_damage() {
    let (initiator, responder) = spawn_pair();

    initiator.start().await;
    settle().await;

    // Bomb placed by the initiator a short walk ahead of the responder's
    // robot. The responder's own proximity scan runs against its true
    // position, so it is the first detector and resolves the damage itself.
    initiator
        .place_hazard(initiator.view().remote.position + Vec2::new(0.0, -60.0))
        .await;
    settle().await;
    assert_eq!(responder.view().hazards.len(), 1);

    for _ in 0..30 {
        if responder.view().local.hp == 90 {
            break;
        }
        responder.steer(Vec2::new(0.0, 1.0)).await;
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    responder.steer(Vec2::ZERO).await;
    settle().await;

    // Resolved exactly once, removed everywhere, and both peers see the
    // responder's robot at 90.
    assert_eq!(responder.view().local.hp, 90);
    assert!(responder.view().hazards.is_empty());
    assert!(initiator.view().hazards.is_empty());
    assert_eq!(initiator.view().remote.hp, 90);
}

#[tokio::test(start_paused = true)]
async fn hazards_replicate_and_detonate_on_both_peers() {
    let (initiator, responder) = spawn_pair();

    initiator.start().await;
    settle().await;

    // Placed well away from both robots, the hazard just sits there.
    initiator.place_hazard(Vec2::new(350.0, 300.0)).await;
    settle().await;
    assert_eq!(initiator.view().hazards.len(), 1);
    assert_eq!(responder.view().hazards.len(), 1);

    // The responder's copy sits at the mirrored position.
    let (_, at) = responder.view().hazards[0];
    assert!((at.x - 350.0).abs() < 1e-3);
    assert!((at.y - 500.0).abs() < 1e-3);

    // Walk the initiator's robot into it.
    for _ in 0..100 {
        let view = initiator.view();
        if view.hazards.is_empty() {
            break;
        }
        let target = view.hazards[0].1;
        let dir = (target - view.local.position).normalized_or_zero();
        initiator.steer(dir).await;
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    initiator.steer(Vec2::ZERO).await;
    settle().await;

    // Detonated everywhere, and the walker paid for it.
    assert!(initiator.view().hazards.is_empty());
    assert!(responder.view().hazards.is_empty());
    assert_eq!(initiator.view().local.hp, 90);
    assert_eq!(responder.view().remote.hp, 90);
}
