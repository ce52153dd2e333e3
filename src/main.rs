//! Folio Portal entry point
//!
//! Native builds run a scripted headless session and log every state change.
//! In the browser the page drives `platform::web::WebPortal` instead.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use anyhow::{Result, bail};

    use folio_portal::app::AppEvent;
    use folio_portal::consts::FRAME_MS;
    use folio_portal::portal::{CATALOG, FlowStage, FlowState, Held};
    use folio_portal::sim::{RouterInput, autopilot};
    use folio_portal::{Action, App, FrameInput, Mode, Tuning};

    /// Stop steering once this close to the target on each axis
    const ARRIVE_EPSILON: f32 = 0.5;

    struct Driver {
        app: App,
    }

    impl Driver {
        fn step(&mut self, input: &FrameInput) {
            for event in self.app.frame(input, FRAME_MS) {
                log_event(&event);
            }
        }

        fn press(&mut self, action: Action) {
            self.step(&FrameInput {
                actions: vec![action],
                ..Default::default()
            });
        }

        /// Feed frames from `input` until `done` holds, failing after `limit_ms`
        fn run_until(
            &mut self,
            what: &str,
            limit_ms: u64,
            mut input: impl FnMut(&App) -> FrameInput,
            done: impl Fn(&App) -> bool,
        ) -> Result<()> {
            let mut elapsed = 0;
            while !done(&self.app) {
                if elapsed >= limit_ms {
                    bail!("{} did not happen within {} ms", what, limit_ms);
                }
                let frame = input(&self.app);
                self.step(&frame);
                elapsed += FRAME_MS;
            }
            log::info!("{} after {} ms (t = {} ms)", what, elapsed, self.app.now());
            Ok(())
        }
    }

    fn log_event(event: &AppEvent) {
        match event {
            AppEvent::ModeChanged(change) => {
                log::info!("Mode {} -> {}", change.from.as_str(), change.to.as_str())
            }
            AppEvent::NearPortal(Some(id)) => log::info!("Near portal {}", id.as_str()),
            AppEvent::NearPortal(None) => log::debug!("Left portal range"),
            AppEvent::StageChanged { from, to } => log::info!("Stage {:?} -> {:?}", from, to),
        }
    }

    fn idle(_: &App) -> FrameInput {
        FrameInput::default()
    }

    pub fn run(seed: u64, tuning: Tuning) -> Result<()> {
        let mut driver = Driver {
            app: App::new(seed, tuning),
        };

        driver.press(Action::ToggleMode);
        driver.run_until("Portal mode", 5_000, idle, |app| {
            app.mode() == Mode::Portal && !app.is_transitioning()
        })?;

        driver.press(Action::SkipIntro);

        let Some(target) = CATALOG.iter().find(|m| m.available) else {
            bail!("no available mission in the catalog");
        };
        log::info!("Walking to {} at {}", target.name, target.position);
        driver.run_until(
            "Reached portal",
            30_000,
            |app| {
                let delta = target.position - app.player();
                FrameInput {
                    held: Held {
                        forward: delta.z < -ARRIVE_EPSILON,
                        back: delta.z > ARRIVE_EPSILON,
                        left: delta.x < -ARRIVE_EPSILON,
                        right: delta.x > ARRIVE_EPSILON,
                        jump: false,
                    },
                    ..Default::default()
                }
            },
            |app| app.near_portal().is_some(),
        )?;

        driver.press(Action::Interact);
        if driver.app.stage() != Some(FlowStage::Briefing) {
            bail!("interact did not open a briefing");
        }
        driver.press(Action::AcceptMission);
        driver.run_until("Countdown finished", 10_000, idle, |app| {
            app.stage() == Some(FlowStage::Playing)
        })?;

        driver.press(Action::Start);
        driver.run_until(
            "Packet Router finished",
            120_000,
            |app| {
                let steer = app
                    .flow()
                    .and_then(|flow| flow.router())
                    .and_then(|game| autopilot(game.state(), game.tuning()));
                let actions = match steer {
                    Some(RouterInput::Left) => vec![Action::Left],
                    Some(RouterInput::Right) => vec![Action::Right],
                    _ => Vec::new(),
                };
                FrameInput {
                    actions,
                    ..Default::default()
                }
            },
            |app| app.stage() == Some(FlowStage::Results),
        )?;

        if let Some(FlowState::Results {
            mission,
            outcome,
            summary,
        }) = driver.app.flow().map(|flow| flow.state())
        {
            log::info!(
                "{}: {:?}, score {}, grade {}, victory {}",
                mission.as_str(),
                outcome,
                summary.score,
                summary.grade.as_str(),
                summary.is_victory
            );
        }

        driver.press(Action::BackToHub);
        driver.press(Action::ToggleMode);
        driver.run_until("Professional mode", 5_000, idle, |app| {
            app.mode() == Mode::Professional && !app.is_transitioning()
        })?;

        log::info!("Session complete");
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    use anyhow::Context;
    use folio_portal::Tuning;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Folio Portal (native) starting...");

    let tuning = match std::env::args()
        .nth(1)
        .or_else(|| std::env::var("FOLIO_TUNING").ok())
    {
        Some(path) => Tuning::load_or_default(&path),
        None => Tuning::default(),
    };
    let seed = match std::env::var("FOLIO_SEED") {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("FOLIO_SEED must be an unsigned integer, got {:?}", raw))?,
        Err(_) => 42,
    };

    headless::run(seed, tuning)
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The page drives platform::web::WebPortal; nothing runs here
}
