//! Data-driven timing and balance
//!
//! Every number the state machines use lives here so a host can override it
//! with a JSON file. Missing fields fall back to the reference values in
//! [`crate::consts`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::TuningError;

/// Mode transition timing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeTuning {
    /// Length of the transition animation before the mode flips
    pub transition_ms: u64,
    /// Settle time after the flip before another transition is accepted
    pub settle_ms: u64,
}

impl Default for ModeTuning {
    fn default() -> Self {
        Self {
            transition_ms: MODE_TRANSITION_MS,
            settle_ms: MODE_SETTLE_MS,
        }
    }
}

/// Portal flow timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowTuning {
    pub proximity_threshold: f32,
    /// One entry per intro comic panel
    pub intro_panel_ms: Vec<u64>,
    pub intro_tail_ms: u64,
    pub countdown_steps: u8,
    pub countdown_step_ms: u64,
}

impl Default for FlowTuning {
    fn default() -> Self {
        Self {
            proximity_threshold: PROXIMITY_THRESHOLD,
            intro_panel_ms: INTRO_PANEL_MS.to_vec(),
            intro_tail_ms: INTRO_TAIL_MS,
            countdown_steps: BRIEFING_COUNTDOWN_STEPS,
            countdown_step_ms: BRIEFING_STEP_MS,
        }
    }
}

/// Packet Router balance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterTuning {
    pub spawn_period_ms: u64,
    pub motion_period_ms: u64,
    pub countdown_period_ms: u64,
    pub session_seconds: u32,

    pub good_chance: f64,
    pub spawn_x_min: f32,
    pub spawn_x_max: f32,
    pub speed_min: f32,
    pub speed_max: f32,
    pub escape_y: f32,

    pub catch_top: f32,
    pub catch_bottom: f32,
    pub router_half_width: f32,
    pub router_step: f32,
    pub router_min_x: f32,
    pub router_max_x: f32,
    pub router_start_x: f32,

    pub good_points: u32,
    pub bad_penalty: u32,
    pub win_packets: u32,
    pub time_bonus_per_second: u32,
}

impl Default for RouterTuning {
    fn default() -> Self {
        Self {
            spawn_period_ms: SPAWN_PERIOD_MS,
            motion_period_ms: MOTION_PERIOD_MS,
            countdown_period_ms: COUNTDOWN_PERIOD_MS,
            session_seconds: SESSION_SECONDS,

            good_chance: GOOD_PACKET_CHANCE,
            spawn_x_min: SPAWN_X_MIN,
            spawn_x_max: SPAWN_X_MAX,
            speed_min: PACKET_SPEED_MIN,
            speed_max: PACKET_SPEED_MAX,
            escape_y: ESCAPE_Y,

            catch_top: CATCH_BAND_TOP,
            catch_bottom: CATCH_BAND_BOTTOM,
            router_half_width: ROUTER_HALF_WIDTH,
            router_step: ROUTER_STEP,
            router_min_x: ROUTER_MIN_X,
            router_max_x: ROUTER_MAX_X,
            router_start_x: ROUTER_START_X,

            good_points: GOOD_PACKET_POINTS,
            bad_penalty: BAD_PACKET_PENALTY,
            win_packets: WIN_PACKETS,
            time_bonus_per_second: TIME_BONUS_PER_SECOND,
        }
    }
}

/// Avatar movement used when the host has no physics engine of its own
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementTuning {
    pub speed: f32,
    pub jump_velocity: f32,
    pub grounded_vy: f32,
    pub gravity: f32,
}

impl Default for MovementTuning {
    fn default() -> Self {
        Self {
            speed: MOVE_SPEED,
            jump_velocity: JUMP_VELOCITY,
            grounded_vy: GROUNDED_VY,
            gravity: GRAVITY,
        }
    }
}

/// All tuning data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub mode: ModeTuning,
    pub flow: FlowTuning,
    pub router: RouterTuning,
    pub movement: MovementTuning,
}

impl Tuning {
    /// Parse and validate tuning JSON
    pub fn from_json_str(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load tuning from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let tuning = Self::from_json_str(&json)?;
        log::info!("Loaded tuning from {}", path.as_ref().display());
        Ok(tuning)
    }

    /// Load tuning, falling back to defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path.as_ref()) {
            Ok(tuning) => tuning,
            Err(e) => {
                log::warn!(
                    "Using default tuning ({}: {})",
                    path.as_ref().display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Reject values the state machines cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        let r = &self.router;

        if self.flow.proximity_threshold <= 0.0 {
            return Err(TuningError::invalid("flow.proximity_threshold", "must be positive"));
        }
        if self.flow.intro_panel_ms.is_empty() {
            return Err(TuningError::invalid("flow.intro_panel_ms", "needs at least one panel"));
        }
        if self.flow.countdown_steps == 0 {
            return Err(TuningError::invalid("flow.countdown_steps", "must be at least 1"));
        }

        for (field, period) in [
            ("router.spawn_period_ms", r.spawn_period_ms),
            ("router.motion_period_ms", r.motion_period_ms),
            ("router.countdown_period_ms", r.countdown_period_ms),
            ("flow.countdown_step_ms", self.flow.countdown_step_ms),
        ] {
            if period == 0 {
                return Err(TuningError::invalid(field, "period must be non-zero"));
            }
        }

        if r.session_seconds == 0 {
            return Err(TuningError::invalid("router.session_seconds", "must be non-zero"));
        }
        if !(0.0..=1.0).contains(&r.good_chance) {
            return Err(TuningError::invalid(
                "router.good_chance",
                format!("{} is not a probability", r.good_chance),
            ));
        }

        for (field, lo, hi) in [
            ("router.spawn_x", r.spawn_x_min, r.spawn_x_max),
            ("router.speed", r.speed_min, r.speed_max),
            ("router.catch", r.catch_top, r.catch_bottom),
            ("router.router_x", r.router_min_x, r.router_max_x),
        ] {
            if lo >= hi {
                return Err(TuningError::invalid(field, format!("min {lo} must be below max {hi}")));
            }
        }

        if r.speed_min <= 0.0 {
            return Err(TuningError::invalid("router.speed_min", "packets must fall"));
        }
        if !(r.router_min_x..=r.router_max_x).contains(&r.router_start_x) {
            return Err(TuningError::invalid("router.router_start_x", "outside router bounds"));
        }

        Ok(())
    }
}
