//! Battle state and the per-peer tick loop
//!
//! One `BattleSession` runs per peer. All simulation state is owned by the
//! session's tick task: inbound messages and local commands are queued and
//! drained at the start of each tick, so every mutation of actor state, the
//! cooldown clock and the hazard registry happens on a single logical thread
//! of control. Nothing here blocks the tick; sends are fire-and-forget and a
//! failed send is logged and swallowed.

use std::time::Duration;

use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::game::combat::{
    self, CollisionOutcome, CooldownClock, Knockback, STRIKE_DAMAGE,
};
use crate::game::coords::FrameMap;
use crate::game::hazard::{HazardRegistry, HAZARD_DAMAGE};
use crate::game::sync::{RemoteMotion, SendCadence};
use crate::game::{ActorSide, ActorState, BattleEvent, LocalCommand, MAX_HP};
use crate::net::link::LinkSession;
use crate::net::protocol::{
    decode, ActorSnapshot, HazardId, HazardPlacement, Message, Role,
};
use crate::util::time::{tick_delta, SEND_INTERVAL_SECS, TICK_DURATION_MICROS};
use crate::util::vec2::Vec2;

/// Robot movement speed in arena units per second.
const MOVE_SPEED: f32 = 210.0;

/// Match phase. `Defeated` and `Victorious` are terminal; only a reset
/// (local or received) leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattlePhase {
    /// Connected, waiting for a start
    Idle,
    /// Match running
    InProgress,
    /// Own robot destroyed
    Defeated,
    /// Opponent's robot destroyed
    Victorious,
}

impl BattlePhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, BattlePhase::Defeated | BattlePhase::Victorious)
    }
}

/// Read-only copy of both actors, phase and live hazards for presentation.
#[derive(Debug, Clone)]
pub struct BattleView {
    pub phase: BattlePhase,
    pub local: ActorState,
    pub remote: ActorState,
    pub hazards: Vec<(HazardId, Vec2)>,
}

/// All per-peer simulation state. Pure with respect to time and I/O: the
/// clock advances only through `tick`, and outbound messages accumulate in
/// an outbox for the session to flush.
pub struct BattleState {
    role: Role,
    frame: FrameMap,
    arena: Vec2,
    phase: BattlePhase,
    /// Simulation seconds since session start
    clock: f32,
    local: ActorState,
    /// Read cache of the opponent, updated only by snapshot application
    remote: ActorState,
    steer: Vec2,
    cooldown: CooldownClock,
    local_knockback: Option<Knockback>,
    remote_knockback: Option<Knockback>,
    remote_motion: RemoteMotion,
    cadence: SendCadence,
    hazards: HazardRegistry,
    outbox: Vec<Message>,
}

impl BattleState {
    pub fn new(role: Role, arena: Vec2) -> Self {
        let (local, remote) = spawn_actors(arena);
        Self {
            role,
            frame: FrameMap::new(role, arena.y),
            arena,
            phase: BattlePhase::Idle,
            clock: 0.0,
            local,
            remote,
            steer: Vec2::ZERO,
            cooldown: CooldownClock::default(),
            local_knockback: None,
            remote_knockback: None,
            remote_motion: RemoteMotion::new(),
            cadence: SendCadence::new(),
            hazards: HazardRegistry::new(),
            outbox: Vec::new(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn phase(&self) -> BattlePhase {
        self.phase
    }

    pub fn view(&self) -> BattleView {
        BattleView {
            phase: self.phase,
            local: self.local,
            remote: self.remote,
            hazards: self.hazards.iter().map(|(id, pos)| (*id, *pos)).collect(),
        }
    }

    /// Advance one simulation tick. Runs local kinematics, knockback decay,
    /// remote motion smoothing and hazard proximity. Collision arbitration
    /// is deliberately absent here: it runs on every applied snapshot, so
    /// detection latency is bounded by the send interval, not the tick.
    pub fn tick(&mut self) -> Vec<BattleEvent> {
        let dt = tick_delta();
        self.clock += dt;
        let mut events = Vec::new();

        if self.phase == BattlePhase::InProgress {
            self.integrate_local(dt);
            if let Some((position, heading)) = self.remote_motion.step(dt) {
                self.remote.position = position;
                self.remote.heading = heading;
            }
            self.step_knockbacks(dt);
            self.check_hazards(&mut events);
        }

        events
    }

    /// Queue the periodic snapshot when the cadence says one is due.
    pub fn snapshot_if_due(&mut self) {
        if self.cadence.should_send() {
            let snapshot = self.wire_snapshot();
            self.outbox.push(snapshot);
        }
    }

    /// The local actor's state, mapped into the canonical wire frame.
    pub fn wire_snapshot(&self) -> Message {
        Message::Snapshot(ActorSnapshot {
            position: self.frame.point_to_wire(self.local.position),
            velocity: self.frame.vector_to_wire(self.local.velocity),
            heading: self.frame.heading_to_wire(self.local.heading),
            hp: self.local.hp,
        })
    }

    /// Messages queued since the last flush.
    pub fn take_outbox(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.outbox)
    }

    /// Apply one local input-layer command.
    pub fn apply_command(&mut self, command: LocalCommand) -> Vec<BattleEvent> {
        let mut events = Vec::new();
        match command {
            LocalCommand::Steer(direction) => self.steer(direction),
            LocalCommand::PlaceHazard { position } => {
                self.place_hazard(position, &mut events)
            }
            LocalCommand::StartMatch => {
                if self.phase == BattlePhase::Idle {
                    self.phase = BattlePhase::InProgress;
                }
                self.outbox.push(Message::StartMatch);
            }
            LocalCommand::ResetMatch => {
                self.reset();
                self.outbox.push(Message::ResetMatch);
                events.push(BattleEvent::MatchReset);
            }
        }
        events
    }

    /// Apply one message received from the peer.
    pub fn apply_message(&mut self, msg: Message) -> Vec<BattleEvent> {
        let mut events = Vec::new();
        match msg {
            Message::Snapshot(snapshot) => self.apply_snapshot(snapshot, &mut events),
            Message::StartMatch => {
                if self.phase == BattlePhase::Idle {
                    self.phase = BattlePhase::InProgress;
                }
            }
            Message::ResetMatch => {
                self.reset();
                events.push(BattleEvent::MatchReset);
            }
            Message::MatchOver => {
                if !self.phase.is_terminal() {
                    self.phase = BattlePhase::Victorious;
                    events.push(BattleEvent::MatchOver {
                        winner: ActorSide::Local,
                    });
                }
            }
            Message::Hit { amount } => {
                if self.phase == BattlePhase::InProgress && self.cooldown.try_arm(self.clock) {
                    self.damage_local(amount, &mut events);
                }
            }
            Message::PlaceHazard(placement) => {
                let position = self.frame.point_from_wire(placement.position);
                self.hazards.register_remote(placement.id, position);
                events.push(BattleEvent::HazardPlaced {
                    id: placement.id,
                    at: position,
                });
            }
            Message::HazardDetonated { id } => {
                // Unknown or already-removed ids are a silent no-op; damage
                // for this detonation was resolved by whichever peer
                // detected it first.
                if let Some(at) = self.hazards.remove(id) {
                    events.push(BattleEvent::HazardDetonated { id, at });
                }
            }
        }
        events
    }

    /// Reinitialize actors, cooldown, knockbacks and hazards to the match
    /// start configuration.
    pub fn reset(&mut self) {
        let (local, remote) = spawn_actors(self.arena);
        self.local = local;
        self.remote = remote;
        self.steer = Vec2::ZERO;
        self.cooldown.clear();
        self.local_knockback = None;
        self.remote_knockback = None;
        self.remote_motion.clear();
        self.hazards.clear();
        self.phase = BattlePhase::InProgress;
    }

    fn steer(&mut self, direction: Vec2) {
        self.steer = direction.normalized_or_zero();
        // Zero input stops the robot but keeps it facing where it was.
        if self.steer != Vec2::ZERO {
            self.local.heading = self.steer.y.atan2(self.steer.x);
        }
        self.local.velocity = self.steer * MOVE_SPEED;
    }

    fn integrate_local(&mut self, dt: f32) {
        let next = self.local.position + self.steer * (MOVE_SPEED * dt);
        self.local.position = next.clamp_to(self.arena);
    }

    fn step_knockbacks(&mut self, dt: f32) {
        if let Some(kb) = self.local_knockback.as_mut() {
            match kb.step(dt) {
                Some(delta) => {
                    self.local.position = (self.local.position + delta).clamp_to(self.arena)
                }
                None => self.local_knockback = None,
            }
        }
        if let Some(kb) = self.remote_knockback.as_mut() {
            match kb.step(dt) {
                Some(delta) => {
                    self.remote.position = (self.remote.position + delta).clamp_to(self.arena);
                    // Keep the displacement when an interpolation is in
                    // flight; the next snapshot still reels the pose back in.
                    self.remote_motion.displace(delta);
                }
                None => self.remote_knockback = None,
            }
        }
    }

    fn apply_snapshot(&mut self, snapshot: ActorSnapshot, events: &mut Vec<BattleEvent>) {
        let position = self.frame.point_from_wire(snapshot.position);
        let heading = self.frame.heading_from_wire(snapshot.heading);
        self.remote.velocity = self.frame.vector_from_wire(snapshot.velocity);

        // hp is a discrete authoritative value owned by the sender: applied
        // immediately, clamped against malformed input.
        let hp = snapshot.hp.clamp(0, MAX_HP);
        if hp < self.remote.hp {
            events.push(BattleEvent::HitApplied {
                target: ActorSide::Remote,
                amount: (self.remote.hp - hp) as u32,
                hp,
            });
        }
        self.remote.hp = hp;

        // Pose transitions smoothly from wherever the previous interpolation
        // had reached, not by teleport.
        self.remote_motion.retarget(
            self.remote.position,
            self.remote.heading,
            position,
            heading,
            SEND_INTERVAL_SECS,
        );

        // One arbitration pass per applied snapshot: collision is checked on
        // every new piece of remote information.
        self.arbitrate(events);
    }

    /// Collision and damage arbitration against the cached remote state.
    ///
    /// Both peers run the identical detection on slightly different
    /// information. The initiator is the sole source of truth for every HP
    /// mutation: it dispatches `Hit` for remote damage and self-decrements
    /// for local damage. The responder only produces feedback and knockback;
    /// its own hp changes exclusively via received `Hit` messages.
    fn arbitrate(&mut self, events: &mut Vec<BattleEvent>) {
        if self.phase != BattlePhase::InProgress {
            return;
        }
        let outcome = combat::detect(&self.local, &self.remote);
        if outcome == CollisionOutcome::None {
            // A miss never touches the cooldown clock.
            return;
        }
        if !self.cooldown.try_arm(self.clock) {
            debug!(?outcome, "contact discarded within cooldown window");
            return;
        }
        debug!(role = ?self.role, ?outcome, "contact");

        let strikes_remote = matches!(
            outcome,
            CollisionOutcome::LocalHitsRemote | CollisionOutcome::MutualStrike
        );
        let strikes_local = matches!(
            outcome,
            CollisionOutcome::RemoteHitsLocal | CollisionOutcome::MutualStrike
        );

        if strikes_remote {
            if self.role.is_initiator() {
                self.outbox.push(Message::Hit {
                    amount: STRIKE_DAMAGE,
                });
            }
            self.remote_knockback =
                Some(Knockback::away_from(self.remote.position, self.local.position));
            events.push(BattleEvent::Struck {
                target: ActorSide::Remote,
                at: self.remote.position,
            });
        }
        if strikes_local {
            self.local_knockback =
                Some(Knockback::away_from(self.local.position, self.remote.position));
            events.push(BattleEvent::Struck {
                target: ActorSide::Local,
                at: self.local.position,
            });
            if self.role.is_initiator() {
                self.damage_local(STRIKE_DAMAGE, events);
            }
        }
    }

    /// Decrement own hp and handle the fatal transition. Callers are
    /// responsible for the cooldown gate.
    fn damage_local(&mut self, amount: u32, events: &mut Vec<BattleEvent>) {
        self.local.hp = combat::apply_damage(self.local.hp, amount);
        events.push(BattleEvent::HitApplied {
            target: ActorSide::Local,
            amount,
            hp: self.local.hp,
        });
        if self.local.hp == 0 {
            info!(role = ?self.role, "robot destroyed");
            self.phase = BattlePhase::Defeated;
            self.outbox.push(Message::MatchOver);
            self.cadence.force_next();
            events.push(BattleEvent::MatchOver {
                winner: ActorSide::Remote,
            });
        }
    }

    fn place_hazard(&mut self, position: Vec2, events: &mut Vec<BattleEvent>) {
        match self.hazards.place_local(position, self.role) {
            Ok(placement) => {
                self.outbox.push(Message::PlaceHazard(HazardPlacement {
                    id: placement.id,
                    position: self.frame.point_to_wire(position),
                    owner: placement.owner,
                }));
                events.push(BattleEvent::HazardPlaced {
                    id: placement.id,
                    at: position,
                });
            }
            Err(err) => debug!(error = %err, "hazard placement refused"),
        }
    }

    /// Proximity scan of both actors against the registry. The first peer
    /// to detect detonates unilaterally: a detonation on its own robot is
    /// self-applied regardless of role, a detonation on the cached remote
    /// follows the strike authority split.
    fn check_hazards(&mut self, events: &mut Vec<BattleEvent>) {
        let mut triggered: Vec<(HazardId, Vec2, ActorSide)> = Vec::new();
        for (id, at) in self.hazards.triggered_by(self.local.position) {
            triggered.push((id, at, ActorSide::Local));
        }
        for (id, at) in self.hazards.triggered_by(self.remote.position) {
            triggered.push((id, at, ActorSide::Remote));
        }

        for (id, at, side) in triggered {
            if self.hazards.remove(id).is_none() {
                continue; // both actors inside the same blast radius
            }
            self.outbox.push(Message::HazardDetonated { id });
            events.push(BattleEvent::HazardDetonated { id, at });

            match side {
                ActorSide::Local => {
                    // The detecting peer owns the triggering robot, so it
                    // resolves the damage itself whichever role it holds.
                    if self.cooldown.try_arm(self.clock) {
                        self.damage_local(HAZARD_DAMAGE, events);
                    }
                }
                ActorSide::Remote => {
                    if self.role.is_initiator() && self.cooldown.try_arm(self.clock) {
                        self.outbox.push(Message::Hit {
                            amount: HAZARD_DAMAGE,
                        });
                    }
                }
            }
        }
    }
}

/// Spawn poses: own robot bottom center facing up, opponent top center
/// facing down. Both peers see the same picture in their own frame.
fn spawn_actors(arena: Vec2) -> (ActorState, ActorState) {
    use std::f32::consts::FRAC_PI_2;
    let local = ActorState::spawn(Vec2::new(arena.x * 0.5, arena.y * 0.2), FRAC_PI_2);
    let remote = ActorState::spawn(Vec2::new(arena.x * 0.5, arena.y * 0.8), -FRAC_PI_2);
    (local, remote)
}

/// Handle given to the input/presentation layers. Commands are queued and
/// drained by the tick; events fan out over a broadcast channel; the view
/// is a watch of the latest state.
#[derive(Clone)]
pub struct SessionHandle {
    command_tx: mpsc::Sender<LocalCommand>,
    event_tx: broadcast::Sender<BattleEvent>,
    view_rx: watch::Receiver<BattleView>,
}

impl SessionHandle {
    pub async fn steer(&self, direction: Vec2) {
        let _ = self.command_tx.send(LocalCommand::Steer(direction)).await;
    }

    pub async fn place_hazard(&self, position: Vec2) {
        let _ = self
            .command_tx
            .send(LocalCommand::PlaceHazard { position })
            .await;
    }

    pub async fn start(&self) {
        let _ = self.command_tx.send(LocalCommand::StartMatch).await;
    }

    pub async fn reset(&self) {
        let _ = self.command_tx.send(LocalCommand::ResetMatch).await;
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BattleEvent> {
        self.event_tx.subscribe()
    }

    /// Latest published state for rendering.
    pub fn view(&self) -> BattleView {
        self.view_rx.borrow().clone()
    }
}

/// The per-peer simulation task: owns the battle state and the link.
pub struct BattleSession<L: LinkSession> {
    state: BattleState,
    link: L,
    inbound_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    command_rx: mpsc::Receiver<LocalCommand>,
    event_tx: broadcast::Sender<BattleEvent>,
    view_tx: watch::Sender<BattleView>,
}

impl<L: LinkSession> BattleSession<L> {
    pub fn new(
        link: L,
        inbound: mpsc::UnboundedReceiver<Vec<u8>>,
        config: &Config,
    ) -> (Self, SessionHandle) {
        let state = BattleState::new(
            link.role(),
            Vec2::new(config.arena_width, config.arena_height),
        );
        let (command_tx, command_rx) = mpsc::channel(64);
        let (event_tx, _) = broadcast::channel(256);
        let (view_tx, view_rx) = watch::channel(state.view());

        let handle = SessionHandle {
            command_tx,
            event_tx: event_tx.clone(),
            view_rx,
        };
        let session = Self {
            state,
            link,
            inbound_rx: inbound,
            command_rx,
            event_tx,
            view_tx,
        };
        (session, handle)
    }

    /// Run the fixed-rate simulation loop until both the link and the
    /// command handle are gone.
    pub async fn run(mut self) {
        info!(role = ?self.state.role(), "battle session running");

        let mut ticker = interval(Duration::from_micros(TICK_DURATION_MICROS));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            let mut events = Vec::new();
            let link_open = self.drain_inbound(&mut events);
            let commands_open = self.drain_commands(&mut events);

            events.extend(self.state.tick());
            self.state.snapshot_if_due();
            self.flush_outbox();

            for event in events {
                // A lagging subscriber loses events; it never blocks the tick.
                let _ = self.event_tx.send(event);
            }
            self.view_tx.send_replace(self.state.view());

            if !link_open && !commands_open {
                info!(role = ?self.state.role(), "link and handle closed, stopping session");
                break;
            }
        }
    }

    /// Drain queued inbound payloads in arrival order. Returns false once
    /// the link is closed.
    fn drain_inbound(&mut self, events: &mut Vec<BattleEvent>) -> bool {
        loop {
            match self.inbound_rx.try_recv() {
                Ok(bytes) => match decode(&bytes) {
                    Ok(msg) => events.extend(self.state.apply_message(msg)),
                    // Malformed input is dropped, never fatal.
                    Err(err) => warn!(error = %err, "dropping undecodable message"),
                },
                Err(TryRecvError::Empty) => return true,
                Err(TryRecvError::Disconnected) => return false,
            }
        }
    }

    /// Drain queued local commands. Returns false once the handle is gone.
    fn drain_commands(&mut self, events: &mut Vec<BattleEvent>) -> bool {
        loop {
            match self.command_rx.try_recv() {
                Ok(command) => events.extend(self.state.apply_command(command)),
                Err(TryRecvError::Empty) => return true,
                Err(TryRecvError::Disconnected) => return false,
            }
        }
    }

    fn flush_outbox(&mut self) {
        for msg in self.state.take_outbox() {
            if let Err(err) = self.link.send(&msg) {
                // Best-effort: the simulation keeps running on stale data.
                warn!(error = %err, "send failed");
            }
        }
    }
}
