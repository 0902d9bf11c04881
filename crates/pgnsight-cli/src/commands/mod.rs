pub mod analyze;
pub mod eval;
pub mod play;
pub mod review;

/// Centipawns as a signed pawn figure, e.g. `+0.35`.
pub(crate) fn format_cp(cp: i32) -> String {
    pgnsight_core::Score::Centipawns(cp).display()
}
