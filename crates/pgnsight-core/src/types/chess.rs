use serde::{Deserialize, Serialize};

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChessPosition {
    pub fen: String,
}

impl ChessPosition {
    pub fn new(fen: impl Into<String>) -> Self {
        Self { fen: fen.into() }
    }

    pub fn starting() -> Self {
        Self::new(STARTING_FEN)
    }

    /// Shape check only: eight ranks of eight squares, a side to move and
    /// well-formed castling and en passant fields. Legality is the engine's
    /// business.
    pub fn validate(&self) -> bool {
        let mut fields = self.fen.split_whitespace();
        let (Some(board), Some(side), Some(castling), Some(en_passant)) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return false;
        };

        let ranks: Vec<&str> = board.split('/').collect();
        ranks.len() == 8
            && ranks.iter().all(|rank| rank_width(rank) == Some(8))
            && matches!(side, "w" | "b")
            && (castling == "-" || castling.chars().all(|c| "KQkq".contains(c)))
            && (en_passant == "-" || matches!(en_passant.as_bytes(), [b'a'..=b'h', b'3' | b'6']))
    }

    pub fn side_to_move(&self) -> Option<Color> {
        let field = self.fen.split_whitespace().nth(1)?;
        let mut chars = field.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Color::from_fen(c),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Move {
    pub from: String,
    pub to: String,
    pub promotion: Option<char>,
}

impl Move {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            promotion: None,
        }
    }

    pub fn with_promotion(mut self, piece: char) -> Self {
        self.promotion = Some(piece);
        self
    }

    pub fn to_uci(&self) -> String {
        match self.promotion {
            Some(p) => format!("{}{}{}", self.from, self.to, p),
            None => format!("{}{}", self.from, self.to),
        }
    }

    /// Parses long algebraic UCI notation (`e2e4`, `e7e8q`).
    /// `(none)` and anything that is not a square pair yields `None`.
    pub fn from_uci(uci: &str) -> Option<Self> {
        let bytes = uci.as_bytes();
        if !(4..=5).contains(&bytes.len()) {
            return None;
        }
        if !is_square(&bytes[0..2]) || !is_square(&bytes[2..4]) {
            return None;
        }

        let promotion = match bytes.get(4) {
            None => None,
            Some(b @ (b'q' | b'r' | b'b' | b'n')) => Some(*b as char),
            Some(_) => return None,
        };

        Some(Self {
            from: uci[0..2].to_string(),
            to: uci[2..4].to_string(),
            promotion,
        })
    }
}

fn rank_width(rank: &str) -> Option<u32> {
    rank.chars().try_fold(0, |width, c| match c {
        '1'..='8' => c.to_digit(10).map(|empty| width + empty),
        'p' | 'n' | 'b' | 'r' | 'q' | 'k' | 'P' | 'N' | 'B' | 'R' | 'Q' | 'K' => Some(width + 1),
        _ => None,
    })
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_uci())
    }
}

fn is_square(s: &[u8]) -> bool {
    matches!(s, [b'a'..=b'h', b'1'..=b'8'])
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn from_fen(c: char) -> Option<Self> {
        match c {
            'w' => Some(Color::White),
            'b' => Some(Color::Black),
            _ => None,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// +1 for White, -1 for Black.
    pub fn perspective(self) -> i32 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fen_shape() {
        let cases = [
            (STARTING_FEN, true),
            ("rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2", true),
            ("4k3/8/8/8/8/8/8/4K3 b - - 12 60", true),
            ("4k3/8/8/8/8/8/8/4K3 w - -", true),
            ("", false),
            ("4k3/8/8/8/8/8/8/4K3 w", false),
            ("4k3/8/8/8/8/8/4K3 w - - 0 1", false),
            ("4k3/8/8/8/8/8/8/4K4 w - - 0 1", false),
            ("4k3/8/8/8/8/8/8/4X3 w - - 0 1", false),
            ("4k3/8/8/8/8/8/8/4K3 white - - 0 1", false),
            ("4k3/8/8/8/8/8/8/4K3 w KX - 0 1", false),
            ("4k3/8/8/8/8/8/8/4K3 w - e4 0 1", false),
        ];
        for (fen, valid) in cases {
            assert_eq!(ChessPosition::new(fen).validate(), valid, "{:?}", fen);
        }
        assert_eq!(ChessPosition::starting().side_to_move(), Some(Color::White));
    }

    #[test]
    fn test_side_to_move_black() {
        let pos = ChessPosition::new("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1");
        assert_eq!(pos.side_to_move(), Some(Color::Black));
        assert_eq!(ChessPosition::new("garbage").side_to_move(), None);
    }

    #[test]
    fn test_uci_notation() {
        assert_eq!(Move::from_uci("g1f3"), Some(Move::new("g1", "f3")));
        let underpromotion = Move::from_uci("b2b1n").unwrap();
        assert_eq!(underpromotion, Move::new("b2", "b1").with_promotion('n'));
        assert_eq!(underpromotion.to_string(), "b2b1n");

        assert!(Move::from_uci("g1").is_none());
        assert!(Move::from_uci("g1f3qq").is_none());
        assert!(Move::from_uci("(none)").is_none());
        assert!(Move::from_uci("e7e8k").is_none());
        assert!(Move::from_uci("i2i4").is_none());
    }

    #[test]
    fn test_color_perspective() {
        assert_eq!(Color::from_fen('b'), Some(Color::Black));
        assert_eq!(Color::from_fen('-'), None);
        assert_eq!(Color::White.perspective(), 1);
        assert_eq!(Color::Black.perspective(), -1);
        assert_eq!(Color::White.opposite(), Color::Black);
    }
}
