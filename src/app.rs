//! Composition root
//!
//! `App` owns the scheduler and every state machine. A host calls `frame` once
//! per rendered frame with the player position (or held movement keys when it
//! has no physics of its own) and the actions pressed since the last frame,
//! then reads a `Snapshot` to draw.
//!
//! Within a frame the order is fixed: player position, proximity, actions,
//! then due timers. Every step of the frame sees the same player position.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::mode::{Mode, ModeChange, ModeOrchestrator, ModeTimer, TransitionState};
use crate::portal::{
    Avatar, Briefing, CATALOG, FlowStage, FlowState, FlowTimer, Held, MissionId, MissionPlay,
    PortalFlow, ProximityDetector,
};
use crate::sched::{Fired, Scheduler};
use crate::sim::{Outcome, ResultsSummary, RouterInput, RouterState, RouterTimer};
use crate::tuning::Tuning;

/// Every timer the app can arm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Mode(ModeTimer),
    Flow(FlowTimer),
    Router(RouterTimer),
}

impl From<ModeTimer> for TimerEvent {
    fn from(t: ModeTimer) -> Self {
        TimerEvent::Mode(t)
    }
}

impl From<FlowTimer> for TimerEvent {
    fn from(t: FlowTimer) -> Self {
        TimerEvent::Flow(t)
    }
}

impl From<RouterTimer> for TimerEvent {
    fn from(t: RouterTimer) -> Self {
        TimerEvent::Router(t)
    }
}

/// Discrete, one-shot inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    ToggleMode,
    SetMode(Mode),
    SkipIntro,
    /// Open the briefing of the portal the player stands near
    Interact,
    /// Open a briefing directly (clicking a portal)
    SelectMission(MissionId),
    /// Accept the briefing and start the countdown
    AcceptMission,
    /// Leave the minigame ready screen
    Start,
    Left,
    Right,
    /// Abort the briefing or quit the minigame
    Escape,
    PlayAgain,
    BackToHub,
}

/// Everything the host reports for one frame
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameInput {
    /// Avatar position from the host's physics. When absent the built-in
    /// kinematic avatar is moved with `held`.
    pub player_position: Option<Vec3>,
    pub held: Held,
    pub actions: Vec<Action>,
}

/// Changes observed during a frame, in the order they happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    ModeChanged(ModeChange),
    NearPortal(Option<MissionId>),
    StageChanged {
        from: Option<FlowStage>,
        to: Option<FlowStage>,
    },
}

/// The whole site state
pub struct App {
    sched: Scheduler<TimerEvent>,
    mode: ModeOrchestrator,
    flow: Option<PortalFlow>,
    proximity: ProximityDetector,
    avatar: Avatar,
    tuning: Tuning,
    seed: u64,
    /// Portal sessions started so far, mixed into each session's seed
    visits: u64,
}

impl App {
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        log::info!("App created (seed {})", seed);
        Self {
            sched: Scheduler::new(),
            mode: ModeOrchestrator::new(tuning.mode),
            flow: None,
            proximity: ProximityDetector::new(tuning.flow.proximity_threshold),
            avatar: Avatar::default(),
            tuning,
            seed,
            visits: 0,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode.mode()
    }

    pub fn is_transitioning(&self) -> bool {
        self.mode.is_transitioning()
    }

    /// Portal flow, present only in Portal mode
    pub fn flow(&self) -> Option<&PortalFlow> {
        self.flow.as_ref()
    }

    pub fn stage(&self) -> Option<FlowStage> {
        self.flow.as_ref().map(PortalFlow::stage)
    }

    pub fn near_portal(&self) -> Option<MissionId> {
        self.proximity.current()
    }

    pub fn player(&self) -> Vec3 {
        self.avatar.pos
    }

    pub fn now(&self) -> u64 {
        self.sched.now()
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Run one frame of `dt_ms` milliseconds
    pub fn frame(&mut self, input: &FrameInput, dt_ms: u64) -> Vec<AppEvent> {
        let mut events = Vec::new();
        let stage_before = self.stage();

        self.update_player(input, dt_ms);
        self.update_proximity(&mut events);

        for &action in &input.actions {
            self.apply(action);
        }

        self.sched.advance(dt_ms);
        while let Some(fired) = self.sched.pop_due() {
            self.dispatch(fired, &mut events);
        }

        let stage_after = self.stage();
        if stage_after != stage_before {
            events.push(AppEvent::StageChanged {
                from: stage_before,
                to: stage_after,
            });
        }
        events
    }

    fn update_player(&mut self, input: &FrameInput, dt_ms: u64) {
        if let Some(pos) = input.player_position {
            self.avatar.pos = pos;
            return;
        }
        // The built-in avatar only walks while exploring
        if self.stage() == Some(FlowStage::Exploring) && !self.is_transitioning() {
            let dt = dt_ms as f32 / 1000.0;
            self.avatar.step(&input.held, dt, &self.tuning.movement);
        }
    }

    fn update_proximity(&mut self, events: &mut Vec<AppEvent>) {
        if self.stage() != Some(FlowStage::Exploring) {
            if self.proximity.current().is_some() {
                self.proximity.reset();
                events.push(AppEvent::NearPortal(None));
            }
            return;
        }
        if let Some(change) = self.proximity.update(self.avatar.pos, &CATALOG) {
            log::debug!("Near portal: {:?}", change.to);
            events.push(AppEvent::NearPortal(change.to));
        }
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::ToggleMode => {
                self.mode.toggle(&mut self.sched);
                return;
            }
            Action::SetMode(target) => {
                self.mode.set_mode(target, &mut self.sched);
                return;
            }
            _ => {}
        }

        if self.is_transitioning() {
            log::debug!("{:?} ignored during a mode transition", action);
            return;
        }
        let Some(flow) = self.flow.as_mut() else {
            log::debug!("{:?} ignored outside Portal mode", action);
            return;
        };
        let sched = &mut self.sched;

        match action {
            Action::SkipIntro => {
                flow.skip_intro(sched);
            }
            Action::Interact => match self.proximity.current() {
                Some(id) => {
                    flow.select_mission(id, sched);
                }
                None => log::debug!("Interact with no portal in range"),
            },
            Action::SelectMission(id) => {
                flow.select_mission(id, sched);
            }
            Action::AcceptMission => {
                flow.begin_countdown(sched);
            }
            Action::Start => flow.game_input(RouterInput::Start, sched),
            Action::Left => flow.game_input(RouterInput::Left, sched),
            Action::Right => flow.game_input(RouterInput::Right, sched),
            Action::Escape => match flow.stage() {
                FlowStage::Playing => flow.game_input(RouterInput::Quit, sched),
                _ => {
                    flow.abort(sched);
                }
            },
            Action::PlayAgain => {
                flow.play_again(sched);
            }
            Action::BackToHub => {
                flow.back_to_hub(sched);
            }
            Action::ToggleMode | Action::SetMode(_) => {}
        }
    }

    fn dispatch(&mut self, fired: Fired<TimerEvent>, events: &mut Vec<AppEvent>) {
        match fired.event {
            TimerEvent::Mode(timer) => {
                if let Some(change) = self.mode.on_timer(fired.session, timer, &mut self.sched) {
                    self.on_mode_change(change);
                    events.push(AppEvent::ModeChanged(change));
                }
            }
            TimerEvent::Flow(timer) => {
                if let Some(flow) = self.flow.as_mut() {
                    flow.on_timer(fired.session, timer, &mut self.sched);
                }
            }
            TimerEvent::Router(timer) => {
                if let Some(flow) = self.flow.as_mut() {
                    flow.on_router_timer(fired.session, timer, &mut self.sched);
                }
            }
        }
    }

    /// Entering Portal mode always starts a fresh session at the intro;
    /// leaving it cancels everything the session armed.
    fn on_mode_change(&mut self, change: ModeChange) {
        if let Some(mut old) = self.flow.take() {
            old.teardown(&mut self.sched);
        }
        self.proximity.reset();

        if change.to == Mode::Portal {
            self.visits += 1;
            let seed = self.seed.wrapping_add(self.visits.wrapping_mul(2654435761));
            self.avatar = Avatar::default();
            self.flow = Some(PortalFlow::new(
                seed,
                self.tuning.flow.clone(),
                self.tuning.router,
                &mut self.sched,
            ));
        }
    }

    /// Read-only view for the rendering surface
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            time_ms: self.sched.now(),
            mode: self.mode.mode(),
            transition: self.mode.transition(),
            portal: self.flow.as_ref().map(|flow| self.portal_view(flow)),
        }
    }

    fn portal_view<'a>(&'a self, flow: &'a PortalFlow) -> PortalView<'a> {
        let mut view = PortalView {
            stage: flow.stage(),
            player: self.avatar.pos,
            near_portal: self.proximity.current(),
            near_portal_locked: self
                .proximity
                .current()
                .is_some_and(|id| !id.mission().available),
            intro_panel: None,
            mission: flow.selected_mission(),
            briefing: flow
                .selected_mission()
                .and_then(|id| id.mission().briefing.as_ref()),
            countdown: None,
            router: None,
            coming_soon: false,
            results: None,
        };

        match flow.state() {
            FlowState::Intro { panel } => view.intro_panel = Some(*panel),
            FlowState::Exploring => {}
            FlowState::Briefing { countdown, .. } => view.countdown = *countdown,
            FlowState::Playing { play, .. } => match play {
                MissionPlay::PacketRouter(game) => view.router = Some(game.state()),
                MissionPlay::ComingSoon => view.coming_soon = true,
            },
            FlowState::Results {
                outcome, summary, ..
            } => {
                view.results = Some(ResultsView {
                    outcome: *outcome,
                    summary: *summary,
                    grade_color: summary.grade.color(),
                })
            }
        }
        view
    }
}

/// Frame state handed to the rendering surface
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot<'a> {
    pub time_ms: u64,
    pub mode: Mode,
    pub transition: TransitionState,
    /// Present only in Portal mode
    pub portal: Option<PortalView<'a>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PortalView<'a> {
    pub stage: FlowStage,
    pub player: Vec3,
    pub near_portal: Option<MissionId>,
    pub near_portal_locked: bool,
    pub intro_panel: Option<usize>,
    pub mission: Option<MissionId>,
    pub briefing: Option<&'a Briefing>,
    pub countdown: Option<u8>,
    pub router: Option<&'a RouterState>,
    pub coming_soon: bool,
    pub results: Option<ResultsView>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ResultsView {
    pub outcome: Outcome,
    pub summary: ResultsSummary,
    /// CSS color for the grade badge
    pub grade_color: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::FRAME_MS;

    fn actions(list: &[Action]) -> FrameInput {
        FrameInput {
            actions: list.to_vec(),
            ..Default::default()
        }
    }

    /// Run idle frames covering `ms`
    fn idle(app: &mut App, ms: u64) -> Vec<AppEvent> {
        let mut events = Vec::new();
        let mut left = ms;
        while left > 0 {
            let dt = left.min(FRAME_MS);
            events.extend(app.frame(&FrameInput::default(), dt));
            left -= dt;
        }
        events
    }

    fn in_portal() -> App {
        let mut app = App::new(7, Tuning::default());
        app.frame(&actions(&[Action::ToggleMode]), 0);
        idle(&mut app, 2100);
        app
    }

    #[test]
    fn test_starts_professional_without_flow() {
        let app = App::new(1, Tuning::default());
        assert_eq!(app.mode(), Mode::Professional);
        assert!(app.flow().is_none());
        assert!(app.snapshot().portal.is_none());
    }

    #[test]
    fn test_toggle_enters_portal_at_intro() {
        let mut app = App::new(1, Tuning::default());
        app.frame(&actions(&[Action::ToggleMode]), FRAME_MS);
        assert!(app.is_transitioning());
        assert!(app.flow().is_none());

        let events = idle(&mut app, 2000);
        assert!(events.contains(&AppEvent::ModeChanged(ModeChange {
            from: Mode::Professional,
            to: Mode::Portal,
        })));
        assert_eq!(app.stage(), Some(FlowStage::Intro));
    }

    #[test]
    fn test_flow_actions_ignored_while_transitioning() {
        let mut app = in_portal();
        app.frame(&actions(&[Action::ToggleMode, Action::SkipIntro]), FRAME_MS);
        assert_eq!(app.stage(), Some(FlowStage::Intro));
    }

    #[test]
    fn test_walk_to_portal_and_interact() {
        let mut app = in_portal();
        app.frame(&actions(&[Action::SkipIntro]), FRAME_MS);

        // Far away: interact does nothing
        app.frame(&actions(&[Action::Interact]), FRAME_MS);
        assert_eq!(app.stage(), Some(FlowStage::Exploring));

        let walk = FrameInput {
            held: Held {
                forward: true,
                left: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut near = None;
        for _ in 0..300 {
            for event in app.frame(&walk, FRAME_MS) {
                if let AppEvent::NearPortal(id) = event {
                    near = id;
                }
            }
            if near.is_some() {
                break;
            }
        }
        assert_eq!(near, Some(MissionId::DebugCode));

        app.frame(&actions(&[Action::Interact]), FRAME_MS);
        assert_eq!(app.stage(), Some(FlowStage::Briefing));
        let snapshot = app.snapshot();
        let portal = snapshot.portal.as_ref().unwrap();
        assert_eq!(portal.mission, Some(MissionId::DebugCode));
        assert!(portal.briefing.is_some());
    }

    #[test]
    fn test_interact_on_locked_portal_is_ignored() {
        let mut app = in_portal();
        app.frame(&actions(&[Action::SkipIntro]), FRAME_MS);
        let at_locked = FrameInput {
            player_position: Some(Vec3::new(-10.0, 0.0, 10.0)),
            actions: vec![Action::Interact],
            ..Default::default()
        };
        app.frame(&at_locked, FRAME_MS);
        assert_eq!(app.near_portal(), Some(MissionId::SystemDesign));
        assert_eq!(app.stage(), Some(FlowStage::Exploring));
        let snapshot = app.snapshot();
        assert!(snapshot.portal.unwrap().near_portal_locked);
    }

    #[test]
    fn test_leaving_portal_cancels_a_running_game() {
        let mut app = in_portal();
        app.frame(
            &actions(&[
                Action::SkipIntro,
                Action::SelectMission(MissionId::SpeedTyping),
                Action::AcceptMission,
            ]),
            FRAME_MS,
        );
        idle(&mut app, 3000);
        assert_eq!(app.stage(), Some(FlowStage::Playing));
        app.frame(&actions(&[Action::Start]), FRAME_MS);

        app.frame(&actions(&[Action::ToggleMode]), FRAME_MS);
        idle(&mut app, 2200);
        assert_eq!(app.mode(), Mode::Professional);
        assert!(app.flow().is_none());

        // Nothing is left to fire
        app.sched.advance(120_000);
        assert!(app.sched.pop_due().is_none());
    }

    #[test]
    fn test_reentering_portal_resets_to_intro() {
        let mut app = in_portal();
        app.frame(&actions(&[Action::SkipIntro]), FRAME_MS);
        app.frame(&actions(&[Action::SelectMission(MissionId::DebugCode)]), FRAME_MS);

        app.frame(&actions(&[Action::ToggleMode]), FRAME_MS);
        idle(&mut app, 2200);
        app.frame(&actions(&[Action::ToggleMode]), FRAME_MS);
        idle(&mut app, 2200);

        assert_eq!(app.mode(), Mode::Portal);
        assert_eq!(app.stage(), Some(FlowStage::Intro));
        assert_eq!(app.flow().and_then(PortalFlow::selected_mission), None);
    }

    #[test]
    fn test_stray_actions_are_ignored() {
        let mut app = in_portal();
        app.frame(&actions(&[Action::SkipIntro]), FRAME_MS);
        app.frame(
            &actions(&[
                Action::SelectMission(MissionId::TechQuiz),
                Action::Escape,
                Action::AcceptMission,
                Action::Start,
                Action::PlayAgain,
                Action::BackToHub,
            ]),
            FRAME_MS,
        );
        assert_eq!(app.stage(), Some(FlowStage::Exploring));
    }

    #[test]
    fn test_actions_parse_from_json() {
        let parsed: Vec<Action> = serde_json::from_str(
            r#"["toggle-mode", "skip-intro", {"select-mission": "debug-code"}, {"set-mode": "portal"}]"#,
        )
        .unwrap();
        assert_eq!(
            parsed,
            vec![
                Action::ToggleMode,
                Action::SkipIntro,
                Action::SelectMission(MissionId::DebugCode),
                Action::SetMode(Mode::Portal),
            ]
        );
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut app = in_portal();
        app.frame(&actions(&[Action::SkipIntro]), FRAME_MS);
        let json = serde_json::to_string(&app.snapshot()).unwrap();
        assert!(json.contains("\"mode\":\"portal\""));
        assert!(json.contains("\"stage\":\"exploring\""));
    }

    #[test]
    fn test_results_view_carries_grade_color() {
        let mut app = in_portal();
        app.frame(
            &actions(&[
                Action::SkipIntro,
                Action::SelectMission(MissionId::DebugCode),
                Action::AcceptMission,
            ]),
            FRAME_MS,
        );
        idle(&mut app, 3000);
        app.frame(&actions(&[Action::Start]), FRAME_MS);
        idle(&mut app, 61_000);
        assert_eq!(app.stage(), Some(FlowStage::Results));

        let snapshot = app.snapshot();
        let results = snapshot
            .portal
            .as_ref()
            .and_then(|portal| portal.results)
            .unwrap();
        assert_eq!(results.grade_color, results.summary.grade.color());

        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains(&format!("\"grade_color\":\"{}\"", results.grade_color)));
    }
}
