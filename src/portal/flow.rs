//! Portal flow: intro → exploring → briefing → playing → results
//!
//! Each stage runs its timers under its own scheduler session. Leaving a stage
//! closes that session (and the minigame's, when playing) before the next
//! stage arms anything.

use serde::Serialize;

use super::mission::{MissionGame, MissionId};
use crate::sched::{Scheduler, SessionId};
use crate::sim::{Outcome, ResultsSummary, RouterGame, RouterInput, RouterTimer};
use crate::tuning::{FlowTuning, RouterTuning};

/// Timers armed by the flow itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowTimer {
    /// Current intro panel finished
    IntroPanel,
    /// Pause after the last panel finished
    IntroTail,
    /// One briefing countdown step elapsed
    CountdownStep,
}

/// What is being played after a briefing
#[derive(Debug, Clone)]
pub enum MissionPlay {
    PacketRouter(RouterGame),
    /// Placeholder for missions without a game yet
    ComingSoon,
}

/// Flow state. Stages past exploring always carry the selected mission.
#[derive(Debug, Clone)]
pub enum FlowState {
    Intro {
        panel: usize,
    },
    Exploring,
    Briefing {
        mission: MissionId,
        /// `None` until the player accepts; then steps remaining
        countdown: Option<u8>,
    },
    Playing {
        mission: MissionId,
        play: MissionPlay,
    },
    Results {
        mission: MissionId,
        outcome: Outcome,
        summary: ResultsSummary,
    },
}

/// Stage tag for observers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlowStage {
    Intro,
    Exploring,
    Briefing,
    Playing,
    Results,
}

impl FlowState {
    pub fn stage(&self) -> FlowStage {
        match self {
            FlowState::Intro { .. } => FlowStage::Intro,
            FlowState::Exploring => FlowStage::Exploring,
            FlowState::Briefing { .. } => FlowStage::Briefing,
            FlowState::Playing { .. } => FlowStage::Playing,
            FlowState::Results { .. } => FlowStage::Results,
        }
    }

    pub fn mission(&self) -> Option<MissionId> {
        match self {
            FlowState::Intro { .. } | FlowState::Exploring => None,
            FlowState::Briefing { mission, .. }
            | FlowState::Playing { mission, .. }
            | FlowState::Results { mission, .. } => Some(*mission),
        }
    }
}

/// One Portal-mode session
#[derive(Debug, Clone)]
pub struct PortalFlow {
    state: FlowState,
    /// Timers of the current stage
    stage_session: SessionId,
    tuning: FlowTuning,
    router_tuning: RouterTuning,
    seed: u64,
    attempts: u64,
}

impl PortalFlow {
    /// Start a Portal session at the first intro panel
    pub fn new<E: From<FlowTimer>>(
        seed: u64,
        tuning: FlowTuning,
        router_tuning: RouterTuning,
        sched: &mut Scheduler<E>,
    ) -> Self {
        let stage_session = sched.open_session();
        if let Some(&first) = tuning.intro_panel_ms.first() {
            sched.once(stage_session, first, FlowTimer::IntroPanel.into());
        }
        log::info!("Portal session started");
        Self {
            state: FlowState::Intro { panel: 0 },
            stage_session,
            tuning,
            router_tuning,
            seed,
            attempts: 0,
        }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn stage(&self) -> FlowStage {
        self.state.stage()
    }

    pub fn selected_mission(&self) -> Option<MissionId> {
        self.state.mission()
    }

    /// Router game in progress, if any
    pub fn router(&self) -> Option<&RouterGame> {
        match &self.state {
            FlowState::Playing {
                play: MissionPlay::PacketRouter(game),
                ..
            } => Some(game),
            _ => None,
        }
    }

    /// Close the current stage's timers, and the game's when playing
    fn close_stage<E>(&mut self, sched: &mut Scheduler<E>) {
        sched.close_session(self.stage_session);
        if let FlowState::Playing {
            play: MissionPlay::PacketRouter(game),
            ..
        } = &mut self.state
        {
            game.teardown(sched);
        }
    }

    fn enter<E>(&mut self, next: FlowState, sched: &mut Scheduler<E>) {
        self.close_stage(sched);
        log::info!("Portal flow {:?} -> {:?}", self.state.stage(), next.stage());
        self.stage_session = sched.open_session();
        self.state = next;
    }

    fn next_game_seed(&mut self) -> u64 {
        self.attempts += 1;
        self.seed.wrapping_add(self.attempts.wrapping_mul(2654435761))
    }

    /// Skip the rest of the intro
    pub fn skip_intro<E>(&mut self, sched: &mut Scheduler<E>) -> bool {
        if self.stage() != FlowStage::Intro {
            return false;
        }
        self.enter(FlowState::Exploring, sched);
        true
    }

    /// Open the briefing for a mission. Locked missions are ignored.
    pub fn select_mission<E>(&mut self, id: MissionId, sched: &mut Scheduler<E>) -> bool {
        if self.stage() != FlowStage::Exploring {
            log::debug!("Mission select ignored outside exploring");
            return false;
        }
        if !id.mission().available {
            log::info!("Mission {} is locked", id.as_str());
            return false;
        }
        self.enter(
            FlowState::Briefing {
                mission: id,
                countdown: None,
            },
            sched,
        );
        true
    }

    /// Accept the briefing and start the countdown
    pub fn begin_countdown<E: From<FlowTimer>>(&mut self, sched: &mut Scheduler<E>) -> bool {
        let FlowState::Briefing { countdown, .. } = &mut self.state else {
            return false;
        };
        if countdown.is_some() {
            return false;
        }
        *countdown = Some(self.tuning.countdown_steps);
        sched.once(
            self.stage_session,
            self.tuning.countdown_step_ms,
            FlowTimer::CountdownStep.into(),
        );
        true
    }

    /// Leave a briefing or a game for the hub. Nothing from the attempt is kept.
    pub fn abort<E>(&mut self, sched: &mut Scheduler<E>) -> bool {
        match self.stage() {
            FlowStage::Briefing | FlowStage::Playing => {
                self.enter(FlowState::Exploring, sched);
                true
            }
            _ => false,
        }
    }

    /// Retry the mission shown on the results screen
    pub fn play_again<E>(&mut self, sched: &mut Scheduler<E>) -> bool {
        let FlowState::Results { mission, .. } = self.state else {
            return false;
        };
        self.enter(
            FlowState::Briefing {
                mission,
                countdown: None,
            },
            sched,
        );
        true
    }

    pub fn back_to_hub<E>(&mut self, sched: &mut Scheduler<E>) -> bool {
        if self.stage() != FlowStage::Results {
            return false;
        }
        self.enter(FlowState::Exploring, sched);
        true
    }

    /// Forward minigame input. Quitting returns to the hub.
    pub fn game_input<E: From<RouterTimer>>(&mut self, input: RouterInput, sched: &mut Scheduler<E>) {
        let outcome = match &mut self.state {
            FlowState::Playing {
                play: MissionPlay::PacketRouter(game),
                ..
            } => game.input(input, sched),
            FlowState::Playing {
                play: MissionPlay::ComingSoon,
                ..
            } if input == RouterInput::Quit => Some(Outcome::Quit),
            _ => None,
        };
        if let Some(outcome) = outcome {
            self.on_outcome(outcome, sched);
        }
    }

    fn on_outcome<E>(&mut self, outcome: Outcome, sched: &mut Scheduler<E>) {
        let Some(mission) = self.selected_mission() else {
            return;
        };
        match outcome.final_score() {
            Some(score) => self.enter(
                FlowState::Results {
                    mission,
                    outcome,
                    summary: ResultsSummary::new(score),
                },
                sched,
            ),
            None => {
                self.abort(sched);
            }
        }
    }

    /// Handle a flow timer
    pub fn on_timer<E: From<FlowTimer>>(
        &mut self,
        session: SessionId,
        timer: FlowTimer,
        sched: &mut Scheduler<E>,
    ) {
        if session != self.stage_session {
            log::debug!("Dropping stale flow timer {:?}", timer);
            return;
        }

        match timer {
            FlowTimer::IntroPanel => {
                let FlowState::Intro { panel } = &mut self.state else {
                    return;
                };
                *panel += 1;
                let (delay, next) = match self.tuning.intro_panel_ms.get(*panel) {
                    Some(&ms) => (ms, FlowTimer::IntroPanel),
                    None => (self.tuning.intro_tail_ms, FlowTimer::IntroTail),
                };
                sched.once(self.stage_session, delay, next.into());
            }
            FlowTimer::IntroTail => {
                if self.stage() == FlowStage::Intro {
                    self.enter(FlowState::Exploring, sched);
                }
            }
            FlowTimer::CountdownStep => {
                let FlowState::Briefing {
                    mission,
                    countdown: Some(left),
                } = &mut self.state
                else {
                    return;
                };
                *left = left.saturating_sub(1);
                if *left > 0 {
                    sched.once(
                        self.stage_session,
                        self.tuning.countdown_step_ms,
                        FlowTimer::CountdownStep.into(),
                    );
                } else {
                    let mission = *mission;
                    self.start_playing(mission, sched);
                }
            }
        }
    }

    fn start_playing<E>(&mut self, mission: MissionId, sched: &mut Scheduler<E>) {
        let play = match mission.mission().game {
            MissionGame::PacketRouter => {
                let seed = self.next_game_seed();
                MissionPlay::PacketRouter(RouterGame::new(seed, self.router_tuning, sched))
            }
            MissionGame::NotImplemented => MissionPlay::ComingSoon,
        };
        self.enter(FlowState::Playing { mission, play }, sched);
    }

    /// Handle a minigame timer
    pub fn on_router_timer<E>(&mut self, session: SessionId, timer: RouterTimer, sched: &mut Scheduler<E>) {
        let outcome = match &mut self.state {
            FlowState::Playing {
                play: MissionPlay::PacketRouter(game),
                ..
            } => game.on_timer(session, timer, sched),
            _ => None,
        };
        if let Some(outcome) = outcome {
            self.on_outcome(outcome, sched);
        }
    }

    /// Cancel everything this session armed (leaving Portal mode)
    pub fn teardown<E>(&mut self, sched: &mut Scheduler<E>) {
        self.close_stage(sched);
        log::info!("Portal session closed");
    }
}
