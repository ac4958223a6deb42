//! Tick-rate configuration for the peer simulation

/// Fixed local simulation rate, independent of network cadence.
pub const SIMULATION_TPS: u32 = 30;
pub const TICK_DURATION_MICROS: u64 = 1_000_000 / SIMULATION_TPS as u64;

/// Seconds between outbound state snapshots.
pub const SEND_INTERVAL_SECS: f32 = 0.1;
/// Simulation ticks between outbound snapshots (100 ms at 30 TPS).
pub const SEND_INTERVAL_TICKS: u32 = 3;

/// Delta time for one simulation tick (in seconds).
pub fn tick_delta() -> f32 {
    1.0 / SIMULATION_TPS as f32
}
