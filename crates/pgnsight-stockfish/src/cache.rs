use std::collections::HashMap;

/// Ply before the first move.
pub const START_PLY: i32 = -1;

/// White-relative centipawn evaluation per visited ply of the loaded game.
#[derive(Debug, Default, Clone)]
pub struct EvaluationCache {
    entries: HashMap<i32, i32>,
}

impl EvaluationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, ply: i32) -> Option<i32> {
        self.entries.get(&ply).copied()
    }

    pub fn set(&mut self, ply: i32, centipawns: i32) {
        self.entries.insert(ply, centipawns);
    }

    pub fn contains(&self, ply: i32) -> bool {
        self.entries.contains_key(&ply)
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
