use std::str::FromStr;

use pgnsight_core::Error;

/// Full strength for Stockfish's `Skill Level` option.
pub const MAX_SKILL_LEVEL: u8 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Extreme,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifficultySettings {
    pub depth: u32,
    pub movetime_ms: u64,
    pub skill_level: u8,
}

impl Difficulty {
    pub fn settings(&self) -> DifficultySettings {
        let (depth, movetime_ms, skill_level) = match self {
            Difficulty::Easy => (5, 1000, 5),
            Difficulty::Medium => (10, 2000, 10),
            Difficulty::Hard => (15, 3000, 15),
            Difficulty::Extreme => (20, 5000, MAX_SKILL_LEVEL),
        };
        DifficultySettings {
            depth,
            movetime_ms,
            skill_level,
        }
    }
}

impl FromStr for Difficulty {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            "extreme" => Ok(Difficulty::Extreme),
            other => Err(Error::Config(format!("unknown difficulty: {}", other))),
        }
    }
}
