//! Portal proximity detection
//!
//! Returns the first mission in catalog order whose portal is within the
//! threshold on the ground plane, not the closest one. Locked missions still
//! register so the host can show a locked prompt.

use glam::Vec3;

use super::mission::{Mission, MissionId};
use crate::planar_distance;

/// First mission (catalog order) strictly closer than `threshold`
pub fn nearest_portal(player: Vec3, catalog: &[Mission], threshold: f32) -> Option<MissionId> {
    catalog
        .iter()
        .find(|m| planar_distance(player, m.position) < threshold)
        .map(|m| m.id)
}

/// Change in the portal the player stands near
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProximityChange {
    pub from: Option<MissionId>,
    pub to: Option<MissionId>,
}

/// Tracks the current result so hosts only react to changes
#[derive(Debug, Clone)]
pub struct ProximityDetector {
    threshold: f32,
    current: Option<MissionId>,
}

impl ProximityDetector {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            current: None,
        }
    }

    pub fn current(&self) -> Option<MissionId> {
        self.current
    }

    /// Recompute for this frame's player position
    pub fn update(&mut self, player: Vec3, catalog: &[Mission]) -> Option<ProximityChange> {
        let near = nearest_portal(player, catalog, self.threshold);
        if near == self.current {
            return None;
        }
        let change = ProximityChange {
            from: self.current,
            to: near,
        };
        self.current = near;
        Some(change)
    }

    pub fn reset(&mut self) {
        self.current = None;
    }
}
