//! Packet Router state and per-step rules
//!
//! Coordinates are percentages of the play field: x runs 0-100 left to right,
//! y runs 0-100 top to bottom and packets fall by increasing y.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;

use crate::tuning::RouterTuning;

/// Packet types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PacketKind {
    /// Data packet, catch it
    Good,
    /// Malware, avoid it
    Bad,
}

/// A falling packet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Packet {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub kind: PacketKind,
    /// Fall distance per motion step
    pub speed: f32,
}

/// Router movement direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Steer {
    Left,
    Right,
}

/// What the router caught in one collision pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatchReport {
    pub good: u32,
    pub bad: u32,
}

/// State of one Packet Router attempt
#[derive(Debug, Clone, Serialize)]
pub struct RouterState {
    pub seed: u64,
    /// Center of the router paddle
    pub router_x: f32,
    /// Never negative
    pub score: u32,
    pub time_left: u32,
    /// Good packets caught, only ever grows
    pub packets_caught: u32,
    pub started: bool,
    /// Terminal; nothing changes once set
    pub ended: bool,
    /// Live packets, in spawn order
    pub packets: Vec<Packet>,
    #[serde(skip_serializing)]
    rng: Pcg32,
    next_id: u32,
}

impl RouterState {
    pub fn new(seed: u64, tuning: &RouterTuning) -> Self {
        Self {
            seed,
            router_x: tuning.router_start_x,
            score: 0,
            time_left: tuning.session_seconds,
            packets_caught: 0,
            started: false,
            ended: false,
            packets: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        }
    }

    /// True while timers and input may change the state
    pub fn is_running(&self) -> bool {
        self.started && !self.ended
    }

    fn next_packet_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Append one packet at the top of the field
    pub fn spawn_packet(&mut self, tuning: &RouterTuning) -> &Packet {
        let id = self.next_packet_id();
        let x = self.rng.random_range(tuning.spawn_x_min..=tuning.spawn_x_max);
        let kind = if self.rng.random_bool(tuning.good_chance) {
            PacketKind::Good
        } else {
            PacketKind::Bad
        };
        let speed = self.rng.random_range(tuning.speed_min..=tuning.speed_max);

        self.packets.push(Packet {
            id,
            x,
            y: 0.0,
            kind,
            speed,
        });
        &self.packets[self.packets.len() - 1]
    }

    /// Move every packet down by its speed and drop the ones that escaped.
    /// Returns how many escaped.
    pub fn advance_packets(&mut self, tuning: &RouterTuning) -> usize {
        for packet in &mut self.packets {
            packet.y += packet.speed;
        }
        let before = self.packets.len();
        self.packets.retain(|p| p.y < tuning.escape_y);
        before - self.packets.len()
    }

    /// Whether a packet sits inside the router's catch region
    pub fn in_catch_region(&self, packet: &Packet, tuning: &RouterTuning) -> bool {
        (tuning.catch_top..=tuning.catch_bottom).contains(&packet.y)
            && (packet.x - self.router_x).abs() <= tuning.router_half_width
    }

    /// Remove caught packets and apply their score effects
    pub fn collide(&mut self, tuning: &RouterTuning) -> CatchReport {
        let mut report = CatchReport::default();
        let mut remaining = Vec::with_capacity(self.packets.len());

        for packet in std::mem::take(&mut self.packets) {
            if !self.in_catch_region(&packet, tuning) {
                remaining.push(packet);
                continue;
            }
            match packet.kind {
                PacketKind::Good => {
                    self.score += tuning.good_points;
                    self.packets_caught += 1;
                    report.good += 1;
                }
                PacketKind::Bad => {
                    self.score = self.score.saturating_sub(tuning.bad_penalty);
                    report.bad += 1;
                }
            }
        }

        self.packets = remaining;
        report
    }

    /// Move the router one step, clamped to its bounds
    pub fn steer(&mut self, dir: Steer, tuning: &RouterTuning) {
        let delta = match dir {
            Steer::Left => -tuning.router_step,
            Steer::Right => tuning.router_step,
        };
        self.router_x = (self.router_x + delta).clamp(tuning.router_min_x, tuning.router_max_x);
    }
}
