//! Professional/Portal mode orchestration
//!
//! The site starts in Professional mode. A transition plays an animation for
//! `transition_ms`, flips the mode, then waits `settle_ms` before accepting the
//! next request. Only one transition can be in flight.

use serde::{Deserialize, Serialize};

use crate::sched::{Scheduler, SessionId};
use crate::tuning::ModeTuning;

/// Presentation mode of the site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Résumé-style single page
    #[default]
    Professional,
    /// Explorable 3D world with missions
    Portal,
}

impl Mode {
    pub fn opposite(self) -> Self {
        match self {
            Mode::Professional => Mode::Portal,
            Mode::Portal => Mode::Professional,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Professional => "professional",
            Mode::Portal => "portal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransitionState {
    #[default]
    Idle,
    Transitioning,
}

/// Timers armed by the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeTimer {
    /// Animation finished, flip the mode
    Flip,
    /// Settle tick finished, go idle
    Settle,
}

/// Emitted when the mode actually flips
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeChange {
    pub from: Mode,
    pub to: Mode,
}

/// Owns the mode flag. Consumers read it; only the orchestrator writes it.
#[derive(Debug, Clone)]
pub struct ModeOrchestrator {
    mode: Mode,
    transition: TransitionState,
    /// Mode the in-flight transition lands on
    target: Mode,
    /// Scheduler session of the in-flight transition
    session: Option<SessionId>,
    tuning: ModeTuning,
}

impl ModeOrchestrator {
    pub fn new(tuning: ModeTuning) -> Self {
        Self {
            mode: Mode::Professional,
            transition: TransitionState::Idle,
            target: Mode::Professional,
            session: None,
            tuning,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_portal(&self) -> bool {
        self.mode == Mode::Portal
    }

    pub fn transition(&self) -> TransitionState {
        self.transition
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition == TransitionState::Transitioning
    }

    /// Start a transition to the other mode. Ignored while transitioning.
    pub fn toggle<E: From<ModeTimer>>(&mut self, sched: &mut Scheduler<E>) -> bool {
        self.begin(self.mode.opposite(), sched)
    }

    /// Start a transition to `target`. Ignored while transitioning or when
    /// already in `target`.
    pub fn set_mode<E: From<ModeTimer>>(&mut self, target: Mode, sched: &mut Scheduler<E>) -> bool {
        if !self.is_transitioning() && target == self.mode {
            log::debug!("Already in {} mode", target.as_str());
            return false;
        }
        self.begin(target, sched)
    }

    fn begin<E: From<ModeTimer>>(&mut self, target: Mode, sched: &mut Scheduler<E>) -> bool {
        if self.is_transitioning() {
            log::debug!("Mode change to {} rejected: transition in flight", target.as_str());
            return false;
        }

        let session = sched.open_session();
        sched.once(session, self.tuning.transition_ms, ModeTimer::Flip.into());

        self.session = Some(session);
        self.target = target;
        self.transition = TransitionState::Transitioning;
        log::info!("Transition {} -> {} started", self.mode.as_str(), target.as_str());
        true
    }

    /// Handle a fired orchestrator timer. Returns the flip when it happens.
    pub fn on_timer<E: From<ModeTimer>>(
        &mut self,
        session: SessionId,
        timer: ModeTimer,
        sched: &mut Scheduler<E>,
    ) -> Option<ModeChange> {
        if self.session != Some(session) {
            log::debug!("Dropping stale mode timer {:?}", timer);
            return None;
        }

        match timer {
            ModeTimer::Flip => {
                let change = ModeChange {
                    from: self.mode,
                    to: self.target,
                };
                self.mode = self.target;
                sched.once(session, self.tuning.settle_ms, ModeTimer::Settle.into());
                log::info!("Mode is now {}", self.mode.as_str());
                Some(change)
            }
            ModeTimer::Settle => {
                sched.close_session(session);
                self.session = None;
                self.transition = TransitionState::Idle;
                None
            }
        }
    }
}
