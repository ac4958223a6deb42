//! Robot Duel demo - two simulated peers fight over an in-memory link
//!
//! Spawns both battle sessions, steers each robot toward its opponent with a
//! little random wobble, drops a hazard along the way and logs the bout until
//! one robot is destroyed.

use std::time::Duration;

use rand::Rng;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use robot_duel::{
    ActorSide, BattleEvent, BattlePhase, BattleSession, Config, MemoryLink, SessionHandle, Vec2,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    info!(
        arena_width = config.arena_width,
        arena_height = config.arena_height,
        "Starting Robot Duel demo"
    );

    let (initiator_end, responder_end) = MemoryLink::pair();

    let (initiator_session, initiator) =
        BattleSession::new(initiator_end.link, initiator_end.inbound, &config);
    let (responder_session, responder) =
        BattleSession::new(responder_end.link, responder_end.inbound, &config);

    tokio::spawn(initiator_session.run());
    tokio::spawn(responder_session.run());

    initiator.start().await;
    let mut events = initiator.subscribe();

    let mut driver = tokio::time::interval(Duration::from_millis(100));
    let mut hazard_dropped = false;

    loop {
        tokio::select! {
            _ = driver.tick() => {
                drive_toward_opponent(&initiator).await;
                drive_toward_opponent(&responder).await;

                // One tactical bomb drop once the robots close in.
                if !hazard_dropped {
                    let view = initiator.view();
                    if view.local.position.distance(view.remote.position) < 200.0 {
                        let at = view.local.position + Vec2::new(0.0, 40.0);
                        initiator.place_hazard(at).await;
                        hazard_dropped = true;
                        info!(x = at.x, y = at.y, "hazard placed");
                    }
                }
            }
            event = events.recv() => {
                match event {
                    Ok(BattleEvent::HitApplied { target, amount, hp }) => {
                        info!(?target, amount, hp, "hit applied");
                    }
                    Ok(BattleEvent::HazardDetonated { .. }) => {
                        info!("hazard detonated");
                    }
                    Ok(BattleEvent::MatchOver { winner }) => {
                        let outcome = match winner {
                            ActorSide::Local => "initiator wins",
                            ActorSide::Remote => "responder wins",
                        };
                        info!(outcome, "match over");
                        break;
                    }
                    Ok(_) => {}
                    Err(_) => break,
                }
            }
        }
    }

    let view = initiator.view();
    info!(
        phase = ?view.phase,
        local_hp = view.local.hp,
        remote_hp = view.remote.hp,
        "final state on the initiator"
    );
    assert!(view.phase == BattlePhase::Defeated || view.phase == BattlePhase::Victorious);

    Ok(())
}

/// Steer a robot at its opponent, with a small sideways wobble so the bout
/// does not degenerate into a perfectly straight joust.
async fn drive_toward_opponent(handle: &SessionHandle) {
    let view = handle.view();
    if view.phase != BattlePhase::InProgress {
        return;
    }
    let mut rng = rand::thread_rng();
    let jitter = Vec2::new(rng.gen_range(-0.3..0.3), rng.gen_range(-0.3..0.3));
    let direction = (view.remote.position - view.local.position).normalized_or_zero() + jitter;
    handle.steer(direction).await;
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}
