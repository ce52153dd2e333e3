//! Results screen scoring
//!
//! Grade and victory are judged independently: 99 points is a B without a
//! victory, 100 points is a victory and still a B.

use serde::Serialize;

/// Score needed for a victory
pub const VICTORY_SCORE: u32 = 100;

/// Letter grade for a final score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Grade {
    S,
    A,
    B,
    C,
    D,
}

impl Grade {
    pub fn for_score(score: u32) -> Self {
        match score {
            150.. => Grade::S,
            120.. => Grade::A,
            90.. => Grade::B,
            60.. => Grade::C,
            _ => Grade::D,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::S => "S",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
        }
    }

    /// Display color hint
    pub fn color(&self) -> &'static str {
        match self {
            Grade::S => "#FFD700",
            Grade::A => "#00FF88",
            Grade::B => "#00D4FF",
            Grade::C => "#FF9500",
            Grade::D => "#FF006E",
        }
    }
}

/// Everything the results screen shows for a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResultsSummary {
    pub score: u32,
    pub grade: Grade,
    pub is_victory: bool,
    pub missions_completed: u32,
}

impl ResultsSummary {
    pub fn new(score: u32) -> Self {
        let is_victory = score >= VICTORY_SCORE;
        Self {
            score,
            grade: Grade::for_score(score),
            is_victory,
            missions_completed: u32::from(is_victory),
        }
    }
}
