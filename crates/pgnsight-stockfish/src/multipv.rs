use std::collections::BTreeMap;

use pgnsight_core::{AnalysisLine, InfoRecord};

/// Latest record per MultiPV line for the analysis in progress.
#[derive(Debug, Default, Clone)]
pub struct MultiPvBuffer {
    entries: BTreeMap<usize, InfoRecord>,
}

impl MultiPvBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The engine only ever deepens a line, so the newest record wins.
    pub fn update(&mut self, record: InfoRecord) {
        self.entries.insert(record.multipv_index, record);
    }

    pub fn max_depth(&self) -> u32 {
        self.entries.values().map(|r| r.depth).max().unwrap_or(0)
    }

    /// Records at or above `min_depth`, ordered by line index.
    pub fn snapshot(&self, min_depth: u32) -> Vec<&InfoRecord> {
        self.entries
            .values()
            .filter(|r| r.depth >= min_depth)
            .collect()
    }

    /// Only the lines that have caught up with the deepest one.
    pub fn current_lines(&self) -> Vec<AnalysisLine> {
        self.snapshot(self.max_depth())
            .into_iter()
            .map(AnalysisLine::from)
            .collect()
    }

    pub fn get(&self, multipv_index: usize) -> Option<&InfoRecord> {
        self.entries.get(&multipv_index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pgnsight_core::Score;

    fn record(index: usize, depth: u32, mv: &str) -> InfoRecord {
        InfoRecord {
            multipv_index: index,
            depth,
            score: Some(Score::Centipawns(0)),
            pv: vec![mv.to_string()],
        }
    }

    #[test]
    fn test_update_overwrites_same_line() {
        let mut buffer = MultiPvBuffer::new();
        buffer.update(record(0, 8, "e2e4"));
        buffer.update(record(0, 9, "d2d4"));
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.get(0).unwrap().first_move(), "d2d4");
    }

    #[test]
    fn test_snapshot_hides_shallow_lines() {
        let mut buffer = MultiPvBuffer::new();
        buffer.update(record(2, 20, "c2c4"));
        buffer.update(record(0, 20, "e2e4"));
        buffer.update(record(1, 8, "d2d4"));

        assert_eq!(buffer.max_depth(), 20);
        let deep = buffer.snapshot(buffer.max_depth());
        let moves: Vec<&str> = deep.iter().map(|r| r.first_move()).collect();
        assert_eq!(moves, vec!["e2e4", "c2c4"]);

        for min_depth in [0, 5, 8, 9, 20, 21] {
            assert!(buffer.snapshot(min_depth).iter().all(|r| r.depth >= min_depth));
        }
        assert_eq!(buffer.snapshot(0).len(), 3);
        assert!(buffer.snapshot(21).is_empty());
    }

    #[test]
    fn test_current_lines_are_numbered_from_one() {
        let mut buffer = MultiPvBuffer::new();
        buffer.update(record(0, 12, "e2e4"));
        buffer.update(record(1, 12, "d2d4"));
        let lines = buffer.current_lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].line, 1);
        assert_eq!(lines[1].line, 2);
    }

    #[test]
    fn test_clear() {
        let mut buffer = MultiPvBuffer::new();
        buffer.update(record(0, 12, "e2e4"));
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.max_depth(), 0);
        assert!(buffer.current_lines().is_empty());
    }
}
