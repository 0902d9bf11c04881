use clap::Args;
use pgnsight_core::{ChessPosition, Color, STARTING_FEN};
use pgnsight_stockfish::AnalysisController;

use super::format_cp;

#[derive(Args)]
pub struct EvalArgs {
    /// Position to evaluate
    #[arg(short, long, default_value = STARTING_FEN)]
    pub fen: String,
}

pub async fn execute(args: EvalArgs, controller: &AnalysisController) -> anyhow::Result<()> {
    let cp = controller.quick_evaluate(&args.fen).await?;
    let side = ChessPosition::new(args.fen.as_str())
        .side_to_move()
        .unwrap_or(Color::White);

    println!("Side to move ({:?}): {}", side, format_cp(cp));
    println!("White: {}", format_cp(white_relative(cp, side)));
    Ok(())
}

fn white_relative(cp: i32, side: Color) -> i32 {
    cp.saturating_mul(side.perspective())
}
