//! Platform bindings
//!
//! The core is platform-free. The browser binding wraps `App` for a host page
//! that owns rendering, physics and raw input.

#[cfg(target_arch = "wasm32")]
pub mod web;

use crate::consts::MAX_FRAME_MS;

/// Turns fractional host frame times into whole scheduler milliseconds.
///
/// The fraction left over each frame is carried into the next one, so the
/// scheduler keeps pace with the wall clock at any refresh rate.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameClock {
    carry_ms: f64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whole milliseconds to advance for a frame of `dt_ms`
    pub fn step(&mut self, dt_ms: f64) -> u64 {
        let dt_ms = if dt_ms.is_finite() {
            dt_ms.clamp(0.0, MAX_FRAME_MS)
        } else {
            0.0
        };
        self.carry_ms += dt_ms;
        let whole = self.carry_ms.floor();
        self.carry_ms -= whole;
        whole as u64
    }
}
