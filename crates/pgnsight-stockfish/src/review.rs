use std::sync::Arc;

use pgnsight_core::{
    classify, AnalysisLine, ChessPosition, Color, Error, MoveQualityResult, PositionEvaluator,
    Result,
};
use tracing::{debug, warn};

use crate::cache::{EvaluationCache, START_PLY};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepResult {
    pub ply: i32,
    pub mover: Option<Color>,
    pub quality: Option<MoveQualityResult>,
}

/// Walks through one loaded game, evaluating positions on the way and
/// grading each move played.
///
/// `positions[0]` is the position before the first move; ply `p` is the
/// position after move `p`, i.e. `positions[p + 1]`. Evaluations are stored
/// from White's point of view.
pub struct GameReview {
    evaluator: Arc<dyn PositionEvaluator>,
    positions: Vec<ChessPosition>,
    current_ply: i32,
    cache: EvaluationCache,
}

impl GameReview {
    pub fn new(evaluator: Arc<dyn PositionEvaluator>) -> Self {
        Self {
            evaluator,
            positions: vec![ChessPosition::starting()],
            current_ply: START_PLY,
            cache: EvaluationCache::new(),
        }
    }

    /// Replaces the game. Throws away every cached evaluation.
    pub fn load_game<S: Into<String>>(&mut self, fens: impl IntoIterator<Item = S>) -> Result<()> {
        let positions: Vec<ChessPosition> = fens.into_iter().map(ChessPosition::new).collect();
        if positions.is_empty() {
            return Err(Error::InvalidFen("game has no positions".into()));
        }
        if let Some(bad) = positions.iter().find(|p| !p.validate()) {
            return Err(Error::InvalidFen(bad.fen.clone()));
        }
        debug!(plies = positions.len() - 1, "game loaded");
        self.positions = positions;
        self.current_ply = START_PLY;
        self.cache.clear();
        Ok(())
    }

    pub fn current_ply(&self) -> i32 {
        self.current_ply
    }

    pub fn move_count(&self) -> usize {
        self.positions.len() - 1
    }

    pub fn cache(&self) -> &EvaluationCache {
        &self.cache
    }

    pub fn position_at(&self, ply: i32) -> Option<&ChessPosition> {
        let index = usize::try_from(ply.checked_add(1)?).ok()?;
        self.positions.get(index)
    }

    pub fn current_position(&self) -> Option<&ChessPosition> {
        self.position_at(self.current_ply)
    }

    /// The side that played move `ply`.
    pub fn mover_at(&self, ply: i32) -> Option<Color> {
        self.position_at(ply.checked_sub(1)?)?.side_to_move()
    }

    /// Cached evaluation of `ply`, asking the engine first if there is none.
    /// `None` when the engine cannot help.
    pub async fn evaluate_ply(&mut self, ply: i32) -> Option<i32> {
        if let Some(cp) = self.cache.get(ply) {
            return Some(cp);
        }
        if !self.evaluator.is_ready() {
            return None;
        }
        let position = self.position_at(ply)?.clone();
        match self.evaluator.quick_evaluate(&position.fen).await {
            Ok(cp) => {
                let white_cp = to_white(cp, &position);
                self.cache.set(ply, white_cp);
                Some(white_cp)
            }
            Err(e) => {
                warn!(ply, error = %e, "could not evaluate position");
                None
            }
        }
    }

    /// Plays the next move: evaluates before and after it and grades it.
    /// `None` at the end of the game.
    pub async fn step_forward(&mut self) -> Option<StepResult> {
        let next = self.current_ply + 1;
        self.position_at(next)?;
        self.evaluate_ply(self.current_ply).await;
        self.current_ply = next;
        self.evaluate_ply(next).await;
        let mover = self.mover_at(next);
        Some(StepResult {
            ply: next,
            mover,
            quality: mover.and_then(|side| self.classify_move(next, side)),
        })
    }

    /// Takes back the current move, evaluating the position being left if it
    /// never was. Returns `false` at the start of the game.
    pub async fn step_back(&mut self) -> bool {
        if self.current_ply <= START_PLY {
            return false;
        }
        self.evaluate_ply(self.current_ply).await;
        self.current_ply -= 1;
        true
    }

    pub fn goto_start(&mut self) {
        self.current_ply = START_PLY;
    }

    /// Jumps straight to `ply` without evaluating anything on the way.
    /// Returns `false`, leaving the position alone, when `ply` is outside
    /// `START_PLY..move_count`.
    pub fn goto(&mut self, ply: i32) -> bool {
        let in_range = usize::try_from(ply)
            .map(|index| index < self.move_count())
            .unwrap_or(ply == START_PLY);
        if in_range {
            self.current_ply = ply;
        }
        in_range
    }

    /// Jumps to the last move of the game.
    pub fn goto_end(&mut self) {
        self.current_ply = self.move_count() as i32 - 1;
    }

    /// Grades move `ply` from the cache alone; `None` if either side of it
    /// has not been evaluated yet.
    pub fn classify_move(&self, ply: i32, mover: Color) -> Option<MoveQualityResult> {
        classify(self.cache.get(ply - 1), self.cache.get(ply), mover)
    }

    /// Keeps the top line of a full analysis of the current position as its
    /// evaluation.
    pub fn record_lines(&mut self, lines: &[AnalysisLine]) {
        let Some(score) = lines.first().and_then(|line| line.score) else {
            return;
        };
        let Some(position) = self.current_position() else {
            return;
        };
        let white_cp = to_white(score.as_centipawns(), position);
        self.cache.set(self.current_ply, white_cp);
    }
}

fn to_white(cp: i32, position: &ChessPosition) -> i32 {
    match position.side_to_move() {
        Some(Color::Black) => cp.saturating_neg(),
        _ => cp,
    }
}
