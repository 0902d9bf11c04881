use super::Color;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MoveQuality {
    Brilliant,
    Great,
    Best,
    Excellent,
    Good,
    Inaccuracy,
    Mistake,
    Blunder,
}

/// Inclusive lower bounds, highest first. Anything below the last entry is a
/// blunder.
const THRESHOLDS: [(i32, MoveQuality); 7] = [
    (300, MoveQuality::Brilliant),
    (100, MoveQuality::Great),
    (50, MoveQuality::Best),
    (20, MoveQuality::Excellent),
    (-10, MoveQuality::Good),
    (-50, MoveQuality::Inaccuracy),
    (-100, MoveQuality::Mistake),
];

impl MoveQuality {
    pub fn from_change(change: i32) -> Self {
        THRESHOLDS
            .iter()
            .find(|(threshold, _)| change >= *threshold)
            .map(|(_, quality)| *quality)
            .unwrap_or(MoveQuality::Blunder)
    }

    pub fn label(&self) -> &'static str {
        match self {
            MoveQuality::Brilliant => "brilliant",
            MoveQuality::Great => "greatmove",
            MoveQuality::Best => "bestmove",
            MoveQuality::Excellent => "excellent",
            MoveQuality::Good => "good",
            MoveQuality::Inaccuracy => "inaccuracy",
            MoveQuality::Mistake => "mistake",
            MoveQuality::Blunder => "blunder",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            MoveQuality::Brilliant => "!!",
            MoveQuality::Great => "!",
            MoveQuality::Best => "✓",
            MoveQuality::Excellent => "⚡",
            MoveQuality::Good => "▽",
            MoveQuality::Inaccuracy => "?!",
            MoveQuality::Mistake => "?",
            MoveQuality::Blunder => "✕",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            MoveQuality::Brilliant => "#1BADA6",
            MoveQuality::Great => "#5C9ECC",
            MoveQuality::Best | MoveQuality::Excellent => "#96BC4B",
            MoveQuality::Good => "#96AF8B",
            MoveQuality::Inaccuracy => "#F0C15C",
            MoveQuality::Mistake => "#E58F2A",
            MoveQuality::Blunder => "#CA3431",
        }
    }
}

impl std::fmt::Display for MoveQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MoveQualityResult {
    pub quality: MoveQuality,
    /// Evaluation swing in centipawns from the mover's point of view.
    pub change: i32,
}

impl MoveQualityResult {
    pub fn label(&self) -> &'static str {
        self.quality.label()
    }

    pub fn icon(&self) -> &'static str {
        self.quality.icon()
    }

    pub fn color(&self) -> &'static str {
        self.quality.color()
    }
}

/// Grades the move that took the game from `prev` to `curr`.
///
/// Both evaluations are White-relative centipawns; `mover` is the side that
/// played the move. Returns `None` when either evaluation is missing.
pub fn classify(prev: Option<i32>, curr: Option<i32>, mover: Color) -> Option<MoveQualityResult> {
    let (prev, curr) = (prev?, curr?);
    let change = curr.saturating_sub(prev).saturating_mul(mover.perspective());
    Some(MoveQualityResult {
        quality: MoveQuality::from_change(change),
        change,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brilliant_lower_bound_is_inclusive() {
        let result = classify(Some(100), Some(400), Color::White).unwrap();
        assert_eq!(result.change, 300);
        assert_eq!(result.quality, MoveQuality::Brilliant);
    }

    #[test]
    fn test_just_below_brilliant_is_great() {
        let result = classify(Some(100), Some(399), Color::White).unwrap();
        assert_eq!(result.change, 299);
        assert_eq!(result.quality, MoveQuality::Great);
    }

    #[test]
    fn test_large_drop_is_blunder() {
        let result = classify(Some(100), Some(-200), Color::White).unwrap();
        assert_eq!(result.change, -300);
        assert_eq!(result.quality, MoveQuality::Blunder);

        let result = classify(Some(900), Some(-900), Color::White).unwrap();
        assert_eq!(result.quality, MoveQuality::Blunder);
    }

    #[test]
    fn test_missing_evaluation() {
        assert!(classify(None, Some(50), Color::White).is_none());
        assert!(classify(Some(50), None, Color::Black).is_none());
    }

    #[test]
    fn test_every_boundary() {
        let cases = [
            (300, MoveQuality::Brilliant),
            (100, MoveQuality::Great),
            (99, MoveQuality::Best),
            (50, MoveQuality::Best),
            (20, MoveQuality::Excellent),
            (19, MoveQuality::Good),
            (-10, MoveQuality::Good),
            (-11, MoveQuality::Inaccuracy),
            (-50, MoveQuality::Inaccuracy),
            (-100, MoveQuality::Mistake),
            (-101, MoveQuality::Blunder),
        ];
        for (change, expected) in cases {
            assert_eq!(MoveQuality::from_change(change), expected, "change {}", change);
        }
    }

    #[test]
    fn test_side_reversal_symmetry() {
        let pairs = [(0, 120), (35, -40), (-300, 600), (10, 10)];
        for (p, c) in pairs {
            let white = classify(Some(p), Some(c), Color::White).unwrap();
            let black = classify(Some(-p), Some(-c), Color::Black).unwrap();
            assert_eq!(white, black);

            let black_same = classify(Some(p), Some(c), Color::Black).unwrap();
            assert_eq!(black_same.change, -white.change);
        }
    }

    #[test]
    fn test_black_gaining_ground() {
        let result = classify(Some(20), Some(-100), Color::Black).unwrap();
        assert_eq!(result.change, 120);
        assert_eq!(result.quality, MoveQuality::Great);
        assert_eq!(result.icon(), "!");
        assert_eq!(result.label(), "greatmove");
    }
}
