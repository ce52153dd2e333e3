//! Timer-driven Packet Router session
//!
//! A session owns three repeating timers under one scheduler session: spawn,
//! motion (move, collide, win check) and the one-second countdown. Ending the
//! game closes the scheduler session, so no timer fires afterwards, and the
//! outcome is handed out exactly once.

use serde::Serialize;

use super::state::{RouterState, Steer};
use crate::sched::{Scheduler, SessionId};
use crate::tuning::RouterTuning;

/// Timers armed by a Packet Router session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterTimer {
    Spawn,
    Motion,
    Countdown,
}

/// Discrete inputs for the minigame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterInput {
    Left,
    Right,
    /// Leave the ready screen and start the timers
    Start,
    /// Abort without reporting a score
    Quit,
}

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Outcome {
    /// Caught enough packets; score plus time bonus
    Won { final_score: u32 },
    /// Clock ran out; score as is
    TimedOut { final_score: u32 },
    /// Player quit; nothing reported
    Quit,
}

impl Outcome {
    pub fn final_score(&self) -> Option<u32> {
        match self {
            Outcome::Won { final_score } | Outcome::TimedOut { final_score } => Some(*final_score),
            Outcome::Quit => None,
        }
    }
}

/// One attempt at the Packet Router
#[derive(Debug, Clone)]
pub struct RouterGame {
    session: SessionId,
    state: RouterState,
    tuning: RouterTuning,
}

impl RouterGame {
    /// New session on the ready screen. No timers run until `Start`.
    pub fn new<E>(seed: u64, tuning: RouterTuning, sched: &mut Scheduler<E>) -> Self {
        let session = sched.open_session();
        log::debug!("Packet Router session {:?} created (seed {})", session, seed);
        Self {
            session,
            state: RouterState::new(seed, &tuning),
            tuning,
        }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn state(&self) -> &RouterState {
        &self.state
    }

    pub fn tuning(&self) -> &RouterTuning {
        &self.tuning
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut RouterState {
        &mut self.state
    }

    /// Apply a discrete input. Returns the outcome if this input ended the game.
    pub fn input<E: From<RouterTimer>>(
        &mut self,
        input: RouterInput,
        sched: &mut Scheduler<E>,
    ) -> Option<Outcome> {
        if self.state.ended {
            return None;
        }

        match input {
            RouterInput::Left => self.state.steer(Steer::Left, &self.tuning),
            RouterInput::Right => self.state.steer(Steer::Right, &self.tuning),
            RouterInput::Start => self.start(sched),
            RouterInput::Quit => return self.finish(Outcome::Quit, sched),
        }
        None
    }

    fn start<E: From<RouterTimer>>(&mut self, sched: &mut Scheduler<E>) {
        if self.state.started {
            return;
        }
        self.state.started = true;

        let t = &self.tuning;
        sched.every(self.session, t.spawn_period_ms, RouterTimer::Spawn.into());
        sched.every(self.session, t.motion_period_ms, RouterTimer::Motion.into());
        sched.every(self.session, t.countdown_period_ms, RouterTimer::Countdown.into());
        log::info!("Packet Router started ({}s on the clock)", self.state.time_left);
    }

    /// Handle a fired timer. Returns the outcome if the game ended on it.
    pub fn on_timer<E>(
        &mut self,
        session: SessionId,
        timer: RouterTimer,
        sched: &mut Scheduler<E>,
    ) -> Option<Outcome> {
        if session != self.session || !self.state.is_running() {
            log::debug!("Dropping {:?} for finished or foreign session", timer);
            return None;
        }

        match timer {
            RouterTimer::Spawn => {
                self.state.spawn_packet(&self.tuning);
                None
            }
            RouterTimer::Motion => {
                self.state.advance_packets(&self.tuning);
                let caught = self.state.collide(&self.tuning);
                if caught.good + caught.bad > 0 {
                    log::debug!(
                        "Caught {} good / {} bad, score {}",
                        caught.good,
                        caught.bad,
                        self.state.score
                    );
                }
                self.check_win(sched)
            }
            RouterTimer::Countdown => {
                self.state.time_left = self.state.time_left.saturating_sub(1);
                if self.state.time_left == 0 {
                    let final_score = self.state.score;
                    self.finish(Outcome::TimedOut { final_score }, sched)
                } else {
                    None
                }
            }
        }
    }

    fn check_win<E>(&mut self, sched: &mut Scheduler<E>) -> Option<Outcome> {
        if self.state.packets_caught < self.tuning.win_packets {
            return None;
        }
        let bonus = self.state.time_left * self.tuning.time_bonus_per_second;
        let final_score = self.state.score + bonus;
        self.finish(Outcome::Won { final_score }, sched)
    }

    /// Enter the terminal state. Only the first call yields an outcome.
    fn finish<E>(&mut self, outcome: Outcome, sched: &mut Scheduler<E>) -> Option<Outcome> {
        if self.state.ended {
            return None;
        }
        self.state.ended = true;
        sched.close_session(self.session);
        log::info!("Packet Router ended: {:?}", outcome);
        Some(outcome)
    }

    /// Tear down without an outcome (leaving the mission or the mode)
    pub fn teardown<E>(&mut self, sched: &mut Scheduler<E>) {
        self.state.ended = true;
        sched.close_session(self.session);
    }
}

/// Demo-mode control: steer toward the lowest good packet still above the
/// bottom of the catch band, staying put when already under it.
pub fn autopilot(state: &RouterState, tuning: &RouterTuning) -> Option<RouterInput> {
    use super::state::PacketKind;

    let target = state
        .packets
        .iter()
        .filter(|p| p.kind == PacketKind::Good && p.y <= tuning.catch_bottom)
        .max_by(|a, b| a.y.partial_cmp(&b.y).unwrap_or(std::cmp::Ordering::Equal))?;

    let dx = target.x - state.router_x;
    if dx.abs() <= tuning.router_step / 2.0 {
        None
    } else if dx < 0.0 {
        Some(RouterInput::Left)
    } else {
        Some(RouterInput::Right)
    }
}
