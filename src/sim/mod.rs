//! Deterministic Packet Router simulation
//!
//! All minigame logic lives here. It must stay pure and deterministic:
//! - Time only moves through scheduler timers
//! - Seeded RNG only
//! - Packets kept in spawn order
//! - No rendering or platform dependencies

pub mod results;
pub mod state;
pub mod tick;

pub use results::{Grade, ResultsSummary, VICTORY_SCORE};
pub use state::{CatchReport, Packet, PacketKind, RouterState, Steer};
pub use tick::{Outcome, RouterGame, RouterInput, RouterTimer, autopilot};
