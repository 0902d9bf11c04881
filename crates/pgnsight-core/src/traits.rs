use async_trait::async_trait;

use crate::error::Result;

/// Something that can put a single centipawn number on a position.
///
/// The returned score is relative to the side to move in `fen`, following
/// the UCI convention.
#[async_trait]
pub trait PositionEvaluator: Send + Sync {
    async fn quick_evaluate(&self, fen: &str) -> Result<i32>;
    fn is_ready(&self) -> bool;
}
