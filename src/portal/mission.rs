//! Mission catalog
//!
//! Missions are fixed at build time. Catalog order matters: proximity picks
//! the first portal in range in this order.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Stable mission key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissionId {
    DebugCode,
    SpeedTyping,
    SystemDesign,
    TechQuiz,
}

impl MissionId {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissionId::DebugCode => "debug-code",
            MissionId::SpeedTyping => "speed-typing",
            MissionId::SystemDesign => "system-design",
            MissionId::TechQuiz => "tech-quiz",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "debug-code" => Some(MissionId::DebugCode),
            "speed-typing" => Some(MissionId::SpeedTyping),
            "system-design" => Some(MissionId::SystemDesign),
            "tech-quiz" => Some(MissionId::TechQuiz),
            _ => None,
        }
    }

    /// Catalog entry for this id
    pub fn mission(&self) -> &'static Mission {
        let index = match self {
            MissionId::DebugCode => 0,
            MissionId::SpeedTyping => 1,
            MissionId::SystemDesign => 2,
            MissionId::TechQuiz => 3,
        };
        &CATALOG[index]
    }
}

/// Which minigame a mission runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissionGame {
    PacketRouter,
    /// Placeholder shown as "coming soon"
    NotImplemented,
}

/// Display-only briefing text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Briefing {
    pub title: &'static str,
    pub objective: &'static str,
    pub reward: &'static str,
}

/// A positioned interactable leading to a minigame
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Mission {
    pub id: MissionId,
    pub name: &'static str,
    pub position: Vec3,
    /// Display hint only
    pub color: &'static str,
    pub available: bool,
    pub game: MissionGame,
    pub briefing: Option<Briefing>,
}

pub static CATALOG: [Mission; 4] = [
    Mission {
        id: MissionId::DebugCode,
        name: "Debug The Code",
        position: Vec3::new(-10.0, 2.0, -10.0),
        color: "#00FF88",
        available: true,
        game: MissionGame::PacketRouter,
        briefing: Some(Briefing {
            title: "Mission: Debug The Code",
            objective: "Find and fix all bugs in the code snippet",
            reward: "Debug Master Badge",
        }),
    },
    Mission {
        id: MissionId::SpeedTyping,
        name: "Speed Typing",
        position: Vec3::new(10.0, 2.0, -10.0),
        color: "#00D4FF",
        available: true,
        game: MissionGame::PacketRouter,
        briefing: Some(Briefing {
            title: "Mission: Speed Typing Challenge",
            objective: "Type code snippets as fast and accurately as possible",
            reward: "Speed Demon Badge",
        }),
    },
    Mission {
        id: MissionId::SystemDesign,
        name: "System Design",
        position: Vec3::new(-10.0, 2.0, 10.0),
        color: "#FF006E",
        available: false,
        game: MissionGame::NotImplemented,
        briefing: Some(Briefing {
            title: "Mission: System Design Builder",
            objective: "Design a scalable system architecture",
            reward: "Architect Badge",
        }),
    },
    Mission {
        id: MissionId::TechQuiz,
        name: "Tech Trivia",
        position: Vec3::new(10.0, 2.0, 10.0),
        color: "#FFD700",
        available: false,
        game: MissionGame::NotImplemented,
        briefing: None,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_round_trip_names() {
        for mission in &CATALOG {
            assert_eq!(MissionId::from_str(mission.id.as_str()), Some(mission.id));
            assert_eq!(mission.id.mission().id, mission.id);
        }
        assert_eq!(MissionId::from_str("bug-hunt"), None);
    }

    #[test]
    fn test_available_missions_have_games() {
        for mission in CATALOG.iter().filter(|m| m.available) {
            assert_eq!(mission.game, MissionGame::PacketRouter);
        }
        assert_eq!(CATALOG.iter().filter(|m| m.available).count(), 2);
    }
}
