//! Folio Portal - the logic behind a portfolio site's Portal mode
//!
//! Core modules:
//! - `sched`: Cancellable timers keyed by session
//! - `mode`: Professional/Portal mode orchestration with timed transitions
//! - `portal`: Mission catalog, proximity detection, portal flow and avatar movement
//! - `sim`: Deterministic Packet Router minigame simulation
//! - `app`: Composition root consumed by a rendering host
//! - `platform`: Browser binding
//! - `tuning`: Data-driven timing and balance

pub mod app;
pub mod error;
pub mod mode;
pub mod platform;
pub mod portal;
pub mod sched;
pub mod sim;
pub mod tuning;

pub use app::{Action, App, FrameInput, Snapshot};
pub use error::TuningError;
pub use mode::{Mode, ModeOrchestrator, TransitionState};
pub use sched::{Scheduler, SessionId};
pub use tuning::Tuning;

use glam::{Vec2, Vec3};

/// Reference constants. `Tuning::default()` is built from these.
pub mod consts {
    /// Frame step used by the headless driver (60 Hz)
    pub const FRAME_MS: u64 = 16;
    /// Longest frame a host may report; longer gaps (background tabs) count as this
    pub const MAX_FRAME_MS: f64 = 100.0;

    /// Mode transition: animation length, then a settle tick before going idle
    pub const MODE_TRANSITION_MS: u64 = 2000;
    pub const MODE_SETTLE_MS: u64 = 100;

    /// Portals closer than this (planar) are "near" and accept the interact key.
    /// Wider than the 4-unit radius where hosts light up the portal mesh.
    pub const PROXIMITY_THRESHOLD: f32 = 5.0;

    /// Intro comic panel durations and the pause after the last panel
    pub const INTRO_PANEL_MS: [u64; 5] = [2000, 2500, 3000, 2500, 2000];
    pub const INTRO_TAIL_MS: u64 = 800;

    /// Mission briefing countdown (3, 2, 1, go)
    pub const BRIEFING_COUNTDOWN_STEPS: u8 = 3;
    pub const BRIEFING_STEP_MS: u64 = 1000;

    /// Packet Router timers
    pub const SPAWN_PERIOD_MS: u64 = 1000;
    pub const MOTION_PERIOD_MS: u64 = 50;
    pub const COUNTDOWN_PERIOD_MS: u64 = 1000;
    pub const SESSION_SECONDS: u32 = 60;

    /// Packet spawn distribution
    pub const GOOD_PACKET_CHANCE: f64 = 0.7;
    pub const SPAWN_X_MIN: f32 = 10.0;
    pub const SPAWN_X_MAX: f32 = 90.0;
    pub const PACKET_SPEED_MIN: f32 = 0.8;
    pub const PACKET_SPEED_MAX: f32 = 2.3;
    /// Packets at or past this y have escaped
    pub const ESCAPE_Y: f32 = 95.0;

    /// Router catch region
    pub const CATCH_BAND_TOP: f32 = 78.0;
    pub const CATCH_BAND_BOTTOM: f32 = 88.0;
    pub const ROUTER_HALF_WIDTH: f32 = 12.0;
    pub const ROUTER_STEP: f32 = 5.0;
    pub const ROUTER_MIN_X: f32 = 10.0;
    pub const ROUTER_MAX_X: f32 = 90.0;
    pub const ROUTER_START_X: f32 = 50.0;

    /// Scoring
    pub const GOOD_PACKET_POINTS: u32 = 10;
    pub const BAD_PACKET_PENALTY: u32 = 5;
    pub const WIN_PACKETS: u32 = 20;
    pub const TIME_BONUS_PER_SECOND: u32 = 2;

    /// Avatar movement (world units)
    pub const MOVE_SPEED: f32 = 6.0;
    pub const JUMP_VELOCITY: f32 = 8.0;
    /// Jumping is only allowed while |vy| is below this
    pub const GROUNDED_VY: f32 = 0.5;
    pub const GRAVITY: f32 = 9.81;
}

/// Project a world position onto the ground plane (x, z)
#[inline]
pub fn ground_plane(pos: Vec3) -> Vec2 {
    Vec2::new(pos.x, pos.z)
}

/// Distance between two world positions, ignoring height
#[inline]
pub fn planar_distance(a: Vec3, b: Vec3) -> f32 {
    ground_plane(a).distance(ground_plane(b))
}
