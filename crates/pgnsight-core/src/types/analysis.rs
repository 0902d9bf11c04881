use super::Move;
use serde::{Deserialize, Serialize};

/// Magnitude a mate score is collapsed to when it has to share an axis with
/// centipawn scores.
pub const MATE_SENTINEL_CP: i32 = 900;

/// Monotonic identifier of one `go` cycle issued by the controller.
pub type SessionId = u64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Score {
    Centipawns(i32),
    /// Plies to mate; negative when the side to move is getting mated.
    Mate(i32),
}

impl Score {
    pub fn as_centipawns(&self) -> i32 {
        match *self {
            Score::Centipawns(cp) => cp,
            Score::Mate(n) if n > 0 => MATE_SENTINEL_CP,
            Score::Mate(_) => -MATE_SENTINEL_CP,
        }
    }

    pub fn negate(self) -> Self {
        match self {
            Score::Centipawns(cp) => Score::Centipawns(cp.saturating_neg()),
            Score::Mate(n) => Score::Mate(n.saturating_neg()),
        }
    }

    /// `+0.25`, `-1.50`, `M3`, `-M2`.
    pub fn display(&self) -> String {
        match *self {
            Score::Centipawns(cp) => format!("{:+.2}", cp as f64 / 100.0),
            Score::Mate(n) if n < 0 => format!("-M{}", -n),
            Score::Mate(n) => format!("M{}", n),
        }
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

/// One parsed `info` line that carried a principal variation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InfoRecord {
    /// 0-based; UCI `multipv 1` is index 0.
    pub multipv_index: usize,
    pub depth: u32,
    pub score: Option<Score>,
    /// Never empty.
    pub pv: Vec<String>,
}

impl InfoRecord {
    pub fn first_move(&self) -> &str {
        self.pv.first().map(String::as_str).unwrap_or_default()
    }

    /// 1-based line number as the engine reports it.
    pub fn line_number(&self) -> usize {
        self.multipv_index + 1
    }
}

/// A display-ready candidate line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisLine {
    pub line: usize,
    pub mv: String,
    pub score: Option<Score>,
    pub depth: u32,
    pub pv: Vec<String>,
}

impl From<&InfoRecord> for AnalysisLine {
    fn from(record: &InfoRecord) -> Self {
        Self {
            line: record.line_number(),
            mv: record.first_move().to_string(),
            score: record.score,
            depth: record.depth,
            pv: record.pv.clone(),
        }
    }
}

impl AnalysisLine {
    pub fn best_move(&self) -> Option<Move> {
        Move::from_uci(&self.mv)
    }
}

/// Everything the controller publishes to its subscribers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnalysisEvent {
    Ready,
    Lines {
        session: SessionId,
        depth: u32,
        lines: Vec<AnalysisLine>,
    },
    BestMove {
        session: SessionId,
        best_move: Option<Move>,
        ponder: Option<Move>,
    },
    Stopped {
        session: SessionId,
    },
    Unavailable {
        reason: String,
    },
}

impl AnalysisEvent {
    pub fn session(&self) -> Option<SessionId> {
        match self {
            AnalysisEvent::Lines { session, .. }
            | AnalysisEvent::BestMove { session, .. }
            | AnalysisEvent::Stopped { session } => Some(*session),
            AnalysisEvent::Ready | AnalysisEvent::Unavailable { .. } => None,
        }
    }
}
