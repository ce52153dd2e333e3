//! Property-based invariant tests for the state machines.
//!
//! 1. Score never drops below zero and follows the catch rules.
//! 2. The router stays inside its bounds for any steering sequence.
//! 3. At most one mode transition is in flight; the mode only flips on a timer.
//! 4. Proximity returns the first catalog entry in range, deterministically.
//! 5. Once a session ends nothing changes and exactly one outcome is reported.
//! 6. Locked missions never leave exploring.

use folio_portal::mode::{ModeOrchestrator, ModeTimer};
use folio_portal::portal::{
    CATALOG, FlowStage, FlowTimer, Mission, MissionId, PortalFlow, nearest_portal,
};
use folio_portal::sim::{
    Outcome, Packet, PacketKind, RouterGame, RouterInput, RouterState, RouterTimer, Steer,
};
use folio_portal::tuning::{FlowTuning, ModeTuning, RouterTuning};
use folio_portal::{Mode, Scheduler};
use glam::Vec3;
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn catch_strategy() -> impl Strategy<Value = Vec<Vec<bool>>> {
    // Per tick, the kinds caught (true = good)
    prop::collection::vec(prop::collection::vec(any::<bool>(), 0..4), 0..60)
}

fn player_strategy() -> impl Strategy<Value = Vec3> {
    (-20.0f32..20.0, -5.0f32..10.0, -20.0f32..20.0).prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum T {
    Flow(FlowTimer),
    Router(RouterTimer),
}

impl From<FlowTimer> for T {
    fn from(t: FlowTimer) -> Self {
        T::Flow(t)
    }
}

impl From<RouterTimer> for T {
    fn from(t: RouterTimer) -> Self {
        T::Router(t)
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Score floor
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn score_never_negative(ticks in catch_strategy()) {
        let tuning = RouterTuning::default();
        let mut state = RouterState::new(1, &tuning);
        let mut model: i64 = 0;

        for kinds in ticks {
            state.packets = kinds
                .iter()
                .enumerate()
                .map(|(i, &good)| Packet {
                    id: i as u32,
                    x: state.router_x,
                    y: 80.0,
                    kind: if good { PacketKind::Good } else { PacketKind::Bad },
                    speed: 1.0,
                })
                .collect();
            // Catches within one tick apply in spawn order
            for &good in &kinds {
                model = if good { model + 10 } else { (model - 5).max(0) };
            }

            state.collide(&tuning);
            prop_assert!(state.packets.is_empty());
            prop_assert_eq!(i64::from(state.score), model);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Router bounds
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn router_stays_in_bounds(steps in prop::collection::vec(any::<bool>(), 0..200)) {
        let tuning = RouterTuning::default();
        let mut state = RouterState::new(1, &tuning);
        for right in steps {
            state.steer(if right { Steer::Right } else { Steer::Left }, &tuning);
            prop_assert!((10.0..=90.0).contains(&state.router_x), "router_x = {}", state.router_x);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Mode exclusivity
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn one_transition_in_flight(gaps in prop::collection::vec(0u64..3000, 1..40)) {
        let mut sched: Scheduler<ModeTimer> = Scheduler::new();
        let mut orch = ModeOrchestrator::new(ModeTuning::default());
        let mut accepted = 0;
        let mut flips = 0;

        for gap in gaps {
            let was_transitioning = orch.is_transitioning();
            let mode_before = orch.mode();
            if orch.toggle(&mut sched) {
                prop_assert!(!was_transitioning);
                accepted += 1;
            }
            // Requests never flip the mode themselves
            prop_assert_eq!(orch.mode(), mode_before);

            sched.advance(gap);
            while let Some(fired) = sched.pop_due() {
                if orch.on_timer(fired.session, fired.event, &mut sched).is_some() {
                    flips += 1;
                }
            }
            prop_assert!(flips <= accepted);
            prop_assert!(accepted - flips <= 1);
        }

        let expected = if flips % 2 == 0 { Mode::Professional } else { Mode::Portal };
        prop_assert_eq!(orch.mode(), expected);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Proximity first match
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn proximity_is_first_match(player in player_strategy()) {
        let expected = CATALOG
            .iter()
            .find(|m| {
                let dx = player.x - m.position.x;
                let dz = player.z - m.position.z;
                (dx * dx + dz * dz).sqrt() < 5.0
            })
            .map(|m| m.id);

        let first = nearest_portal(player, &CATALOG, 5.0);
        prop_assert_eq!(first, expected);
        prop_assert_eq!(nearest_portal(player, &CATALOG, 5.0), first);
    }

    #[test]
    fn overlapping_portals_pick_catalog_order(offset in 0.0f32..2.0, swap in any::<bool>()) {
        // Two portals 2 units apart; the player is in range of both
        let mut a = CATALOG[0];
        let mut b = CATALOG[1];
        a.position = Vec3::new(0.0, 2.0, 0.0);
        b.position = Vec3::new(2.0, 2.0, 0.0);
        let catalog = if swap { [b, a] } else { [a, b] };
        let player = Vec3::new(offset, 0.0, 0.0);

        let near = nearest_portal(player, &catalog, 5.0);
        prop_assert_eq!(near, Some(catalog[0].id));
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Terminal idempotence
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn nothing_changes_after_the_end(
        seed in any::<u64>(),
        quit_after in 0u64..70_000,
        inputs in prop::collection::vec(0u8..4, 0..50),
    ) {
        let mut sched: Scheduler<RouterTimer> = Scheduler::new();
        let mut game = RouterGame::new(seed, RouterTuning::default(), &mut sched);
        game.input(RouterInput::Start, &mut sched);

        let mut outcomes = Vec::new();
        sched.advance(quit_after);
        while let Some(fired) = sched.pop_due() {
            outcomes.extend(game.on_timer(fired.session, fired.event, &mut sched));
        }
        outcomes.extend(game.input(RouterInput::Quit, &mut sched));
        prop_assert_eq!(outcomes.len(), 1);
        prop_assert!(game.state().ended);

        let frozen = game.state().clone();
        for input in inputs {
            let input = match input {
                0 => RouterInput::Left,
                1 => RouterInput::Right,
                2 => RouterInput::Start,
                _ => RouterInput::Quit,
            };
            prop_assert!(game.input(input, &mut sched).is_none());
        }
        sched.advance(60_000);
        while let Some(fired) = sched.pop_due() {
            prop_assert!(game.on_timer(fired.session, fired.event, &mut sched).is_none());
        }
        let session = game.session();
        prop_assert!(game.on_timer(session, RouterTimer::Countdown, &mut sched).is_none());

        let after = game.state();
        prop_assert_eq!(after.score, frozen.score);
        prop_assert_eq!(after.packets_caught, frozen.packets_caught);
        prop_assert_eq!(after.time_left, frozen.time_left);
        prop_assert_eq!(after.router_x, frozen.router_x);
        prop_assert_eq!(&after.packets, &frozen.packets);
        if let Outcome::TimedOut { .. } = outcomes[0] {
            prop_assert_eq!(after.time_left, 0);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. Mission gating
// ═════════════════════════════════════════════════════════════════════════

fn locked_mission() -> impl Strategy<Value = MissionId> {
    prop::sample::select(
        CATALOG
            .iter()
            .filter(|m| !m.available)
            .map(|m| m.id)
            .collect::<Vec<_>>(),
    )
}

proptest! {
    #[test]
    fn locked_missions_rejected(ids in prop::collection::vec(locked_mission(), 1..10)) {
        let mut sched: Scheduler<T> = Scheduler::new();
        let mut flow = PortalFlow::new(1, FlowTuning::default(), RouterTuning::default(), &mut sched);
        flow.skip_intro(&mut sched);

        for id in ids {
            prop_assert!(!flow.select_mission(id, &mut sched));
            prop_assert_eq!(flow.stage(), FlowStage::Exploring);
            prop_assert_eq!(flow.selected_mission(), None);
        }
    }
}

#[test]
fn catalog_positions_are_distinct() {
    let positions: Vec<&Mission> = CATALOG.iter().collect();
    for (i, a) in positions.iter().enumerate() {
        for b in &positions[i + 1..] {
            assert_ne!(a.position, b.position);
        }
    }
}
