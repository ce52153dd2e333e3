//! Browser binding
//!
//! A page drives one `WebPortal` from its `requestAnimationFrame` loop and
//! renders the returned snapshot JSON.

use glam::Vec3;
use wasm_bindgen::prelude::*;

use super::FrameClock;
use crate::app::{Action, App, FrameInput};
use crate::portal::Held;
use crate::tuning::Tuning;

#[wasm_bindgen]
pub struct WebPortal {
    app: App,
    clock: FrameClock,
}

/// Install the panic hook and logger, and resolve a zero seed from the clock
fn init(seed: u64) -> u64 {
    console_error_panic_hook::set_once();
    // A second instance finds the logger already installed
    let _ = console_log::init_with_level(log::Level::Info);

    let seed = if seed == 0 {
        js_sys::Date::now() as u64
    } else {
        seed
    };
    log::info!("Folio Portal starting (seed {})", seed);
    seed
}

#[wasm_bindgen]
impl WebPortal {
    /// Create with default tuning. A zero seed picks one from the clock.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> WebPortal {
        let seed = init(seed);
        WebPortal {
            app: App::new(seed, Tuning::default()),
            clock: FrameClock::new(),
        }
    }

    /// Create with tuning JSON; invalid tuning is rejected
    pub fn with_tuning(seed: u64, tuning_json: &str) -> Result<WebPortal, JsError> {
        let seed = init(seed);
        let tuning = Tuning::from_json_str(tuning_json)?;
        Ok(WebPortal {
            app: App::new(seed, tuning),
            clock: FrameClock::new(),
        })
    }

    /// Run one frame and return the snapshot JSON.
    ///
    /// `actions_json` is an array of action names such as
    /// `["toggle-mode", {"select-mission": "debug-code"}]`. Pass NaN for the
    /// position to let the built-in avatar walk with `held_json`.
    pub fn frame(
        &mut self,
        dt_ms: f64,
        player_x: f32,
        player_y: f32,
        player_z: f32,
        held_json: &str,
        actions_json: &str,
    ) -> Result<String, JsError> {
        let actions: Vec<Action> = if actions_json.is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(actions_json)?
        };
        let held: Held = if held_json.is_empty() {
            Held::default()
        } else {
            serde_json::from_str(held_json)?
        };
        let position = Vec3::new(player_x, player_y, player_z);
        let input = FrameInput {
            player_position: position.is_finite().then_some(position),
            held,
            actions,
        };

        let dt_ms = self.clock.step(dt_ms);
        for event in self.app.frame(&input, dt_ms) {
            log::debug!("{:?}", event);
        }
        self.snapshot()
    }

    pub fn snapshot(&self) -> Result<String, JsError> {
        Ok(serde_json::to_string(&self.app.snapshot())?)
    }
}
