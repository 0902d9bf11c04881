use std::sync::OnceLock;

use pgnsight_core::{InfoRecord, Move, Score};
use regex::Regex;

fn pv_move_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-h][1-8][a-h][1-8][qnrb]?$").expect("pv move pattern is valid")
    })
}

pub fn is_pv_move(token: &str) -> bool {
    pv_move_pattern().is_match(token)
}

/// Everything an `info` line can tell us. Fields the engine did not send, or
/// sent in a shape we could not read, stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UciInfo {
    pub depth: Option<u32>,
    pub seldepth: Option<u32>,
    pub multipv: Option<u32>,
    pub score: Option<Score>,
    pub nodes: Option<u64>,
    pub nps: Option<u64>,
    pub time: Option<u64>,
    pub pv: Vec<String>,
    pub currmove: Option<String>,
    pub hashfull: Option<u16>,
}

impl UciInfo {
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().peekable();
        if parts.next() != Some("info") {
            return None;
        }
        let mut info = Self::default();
        while let Some(token) = parts.next() {
            match token {
                "depth" => info.depth = parts.next().and_then(|s| s.parse().ok()),
                "seldepth" => info.seldepth = parts.next().and_then(|s| s.parse().ok()),
                "multipv" => info.multipv = parts.next().and_then(|s| s.parse().ok()),
                "score" => match parts.next() {
                    Some("cp") => {
                        info.score = parts
                            .next()
                            .and_then(|s| s.parse().ok())
                            .map(Score::Centipawns)
                    }
                    Some("mate") => {
                        info.score = parts.next().and_then(|s| s.parse().ok()).map(Score::Mate)
                    }
                    _ => {}
                },
                "nodes" => info.nodes = parts.next().and_then(|s| s.parse().ok()),
                "nps" => info.nps = parts.next().and_then(|s| s.parse().ok()),
                "time" => info.time = parts.next().and_then(|s| s.parse().ok()),
                "hashfull" => info.hashfull = parts.next().and_then(|s| s.parse().ok()),
                "currmove" => info.currmove = parts.next().map(|s| s.to_string()),
                "pv" => {
                    while let Some(mv) = parts.next_if(|s| is_pv_move(s)) {
                        info.pv.push(mv.to_string());
                    }
                }
                // free text until end of line
                "string" => break,
                _ => {}
            }
        }
        Some(info)
    }

    /// 0-based line index; single-line output has no `multipv` field.
    pub fn multipv_index(&self) -> usize {
        self.multipv
            .map(|n| n.saturating_sub(1) as usize)
            .unwrap_or(0)
    }

    /// Only lines with a principal variation carry something worth keeping.
    pub fn record(&self) -> Option<InfoRecord> {
        if self.pv.is_empty() {
            return None;
        }
        Some(InfoRecord {
            multipv_index: self.multipv_index(),
            depth: self.depth.unwrap_or(0),
            score: self.score,
            pv: self.pv.clone(),
        })
    }
}

/// Parses one engine line straight into a record, or `None` for lines that
/// carry no principal variation.
pub fn parse_info_line(line: &str) -> Option<InfoRecord> {
    UciInfo::parse(line)?.record()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestMove {
    /// `None` when the engine answered `(none)`.
    pub mv: Option<Move>,
    pub ponder: Option<Move>,
}

impl BestMove {
    pub fn parse(line: &str) -> Option<Self> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.first() != Some(&"bestmove") {
            return None;
        }
        let mv = parts.get(1).and_then(|s| Move::from_uci(s));
        let ponder = parts
            .iter()
            .position(|&s| s == "ponder")
            .and_then(|i| parts.get(i + 1))
            .and_then(|s| Move::from_uci(s));
        Some(Self { mv, ponder })
    }
}

/// Incoming line from the engine, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciMessage {
    Id { name: String, value: String },
    UciOk,
    ReadyOk,
    Info(UciInfo),
    BestMove(BestMove),
    /// Banners, debug output, anything else.
    Unknown(String),
}

impl UciMessage {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        match line.split_whitespace().next() {
            Some("uciok") => UciMessage::UciOk,
            Some("readyok") => UciMessage::ReadyOk,
            Some("id") => {
                let mut parts = line.splitn(3, char::is_whitespace).skip(1);
                match (parts.next(), parts.next()) {
                    (Some(name), Some(value)) => UciMessage::Id {
                        name: name.to_string(),
                        value: value.trim().to_string(),
                    },
                    _ => UciMessage::Unknown(line.to_string()),
                }
            }
            Some("info") => UciInfo::parse(line)
                .map(UciMessage::Info)
                .unwrap_or_else(|| UciMessage::Unknown(line.to_string())),
            Some("bestmove") => BestMove::parse(line)
                .map(UciMessage::BestMove)
                .unwrap_or_else(|| UciMessage::Unknown(line.to_string())),
            _ => UciMessage::Unknown(line.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uci_info_parse_depth() {
        let line = "info depth 20 seldepth 25 nodes 1000000 nps 500000";
        let info = UciInfo::parse(line).unwrap();
        assert_eq!(info.depth, Some(20));
        assert_eq!(info.seldepth, Some(25));
        assert_eq!(info.nodes, Some(1000000));
        assert_eq!(info.nps, Some(500000));
        assert!(info.record().is_none());
    }

    #[test]
    fn test_score_cp_and_mate() {
        let info = UciInfo::parse("info depth 10 score cp -150 nodes 50000").unwrap();
        assert_eq!(info.score, Some(Score::Centipawns(-150)));

        let info = UciInfo::parse("info depth 15 score mate -3 nodes 100000").unwrap();
        assert_eq!(info.score, Some(Score::Mate(-3)));
    }

    #[test]
    fn test_record_from_full_line() {
        let record = parse_info_line(
            "info depth 18 seldepth 24 multipv 2 score cp 31 nodes 812345 nps 1200000 time 677 pv d2d4 g8f6 c2c4",
        )
        .unwrap();
        assert_eq!(record.multipv_index, 1);
        assert_eq!(record.depth, 18);
        assert_eq!(record.score, Some(Score::Centipawns(31)));
        assert_eq!(record.pv, vec!["d2d4", "g8f6", "c2c4"]);
    }

    #[test]
    fn test_defaults_when_fields_missing() {
        let record = parse_info_line("info pv e2e4").unwrap();
        assert_eq!(record.multipv_index, 0);
        assert_eq!(record.depth, 0);
        assert_eq!(record.score, None);
    }

    #[test]
    fn test_non_numeric_fields_are_absent() {
        let record = parse_info_line("info depth x multipv y score cp abc pv e2e4").unwrap();
        assert_eq!(record.depth, 0);
        assert_eq!(record.multipv_index, 0);
        assert_eq!(record.score, None);
        assert_eq!(record.first_move(), "e2e4");
    }

    #[test]
    fn test_pv_stops_at_first_non_move() {
        let record = parse_info_line("info depth 9 pv e7e8q d7d8n bogus e2e4").unwrap();
        assert_eq!(record.pv, vec!["e7e8q", "d7d8n"]);
    }

    #[test]
    fn test_lines_without_pv_are_discarded() {
        assert!(parse_info_line("info depth 12 score cp 25 nodes 1000").is_none());
        assert!(parse_info_line("info string NNUE evaluation using nn-xyz.nnue pv e2e4").is_none());
        assert!(parse_info_line("info depth 3 pv").is_none());
        assert!(parse_info_line("bestmove e2e4").is_none());
        assert!(parse_info_line("Stockfish 16 by the Stockfish developers").is_none());
    }

    #[test]
    fn test_first_pv_move_matches_text_after_pv() {
        let lines = [
            ("info depth 1 multipv 1 score cp 20 pv g1f3", "g1f3"),
            ("info depth 30 score mate 2 pv h7h8q g8h8 a1a8", "h7h8q"),
            ("info multipv 3 depth 4 pv b7b8r", "b7b8r"),
        ];
        for (line, expected) in lines {
            let record = parse_info_line(line).unwrap();
            assert_eq!(record.first_move(), expected);
        }
    }

    #[test]
    fn test_bestmove_parse() {
        let bm = BestMove::parse("bestmove e2e4").unwrap();
        assert_eq!(bm.mv, Some(Move::new("e2", "e4")));
        assert_eq!(bm.ponder, None);

        let bm = BestMove::parse("bestmove e2e4 ponder e7e5").unwrap();
        assert_eq!(bm.ponder, Some(Move::new("e7", "e5")));
    }

    #[test]
    fn test_bestmove_none() {
        let bm = BestMove::parse("bestmove (none)").unwrap();
        assert_eq!(bm.mv, None);
        assert!(BestMove::parse("info depth 10").is_none());
        assert!(BestMove::parse("uciok").is_none());
    }

    #[test]
    fn test_message_classification() {
        assert_eq!(UciMessage::parse("uciok"), UciMessage::UciOk);
        assert_eq!(UciMessage::parse("readyok\n"), UciMessage::ReadyOk);
        assert_eq!(
            UciMessage::parse("id name Stockfish 16"),
            UciMessage::Id {
                name: "name".into(),
                value: "Stockfish 16".into()
            }
        );
        assert!(matches!(
            UciMessage::parse("bestmove a7a8q"),
            UciMessage::BestMove(_)
        ));
        assert!(matches!(
            UciMessage::parse("option name Hash type spin default 16"),
            UciMessage::Unknown(_)
        ));
    }
}
