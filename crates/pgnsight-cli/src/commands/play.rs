use clap::Args;
use pgnsight_core::STARTING_FEN;
use pgnsight_stockfish::{AnalysisController, Difficulty};

#[derive(Args)]
pub struct PlayArgs {
    /// Position the engine should move in
    #[arg(short, long, default_value = STARTING_FEN)]
    pub fen: String,

    /// easy, medium, hard or extreme
    #[arg(short, long, default_value = "medium")]
    pub difficulty: Difficulty,
}

pub async fn execute(args: PlayArgs, controller: &AnalysisController) -> anyhow::Result<()> {
    let preset = args.difficulty.settings();
    println!(
        "Thinking (depth {}, {} ms, skill {})...",
        preset.depth, preset.movetime_ms, preset.skill_level
    );
    match controller.engine_move(&args.fen, args.difficulty).await? {
        Some(mv) => println!("Engine plays {}", mv),
        None => println!("Engine has no legal move"),
    }
    Ok(())
}
