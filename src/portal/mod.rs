//! Portal mode: the explorable hub and its missions
//!
//! - `mission`: Static mission catalog
//! - `proximity`: Which portal the player stands near
//! - `flow`: Intro → exploring → briefing → playing → results
//! - `movement`: Held inputs to avatar velocity

pub mod flow;
pub mod mission;
pub mod movement;
pub mod proximity;

pub use flow::{FlowStage, FlowState, FlowTimer, MissionPlay, PortalFlow};
pub use mission::{Briefing, CATALOG, Mission, MissionGame, MissionId};
pub use movement::{Avatar, Held, desired_velocity, planar_velocity};
pub use proximity::{ProximityChange, ProximityDetector, nearest_portal};
