use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use pgnsight_core::{Color, PositionEvaluator};
use pgnsight_stockfish::{AnalysisController, GameReview, StepResult};
use tabled::{Table, Tabled};

use super::format_cp;

#[derive(Args)]
pub struct ReviewArgs {
    /// File with one FEN per line, starting with the position before the
    /// first move
    pub file: PathBuf,
}

#[derive(Tabled)]
struct ReviewRow {
    #[tabled(rename = "Move")]
    number: String,
    #[tabled(rename = "Side")]
    side: String,
    #[tabled(rename = "Eval")]
    eval: String,
    #[tabled(rename = "Change")]
    change: String,
    #[tabled(rename = "Quality")]
    quality: String,
}

pub async fn execute(args: ReviewArgs, controller: Arc<AnalysisController>) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(&args.file)?;
    let fens = parse_positions(&content);

    let mut review = GameReview::new(controller as Arc<dyn PositionEvaluator>);
    review.load_game(fens)?;
    println!(
        "Reviewing {} moves from {}",
        review.move_count(),
        args.file.display()
    );

    let mut rows = Vec::with_capacity(review.move_count());
    while let Some(step) = review.step_forward().await {
        let eval = review.cache().get(step.ply);
        rows.push(row(&step, eval));
    }

    println!("{}", Table::new(rows));
    Ok(())
}

/// Non-empty lines of a position file; `#` starts a comment line.
pub fn parse_positions(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

fn row(step: &StepResult, eval: Option<i32>) -> ReviewRow {
    let full_move = step.ply / 2 + 1;
    let number = match step.mover {
        Some(Color::Black) => format!("{}...", full_move),
        _ => format!("{}.", full_move),
    };
    ReviewRow {
        number,
        side: step
            .mover
            .map(|side| format!("{:?}", side))
            .unwrap_or_else(|| "?".into()),
        eval: eval.map(format_cp).unwrap_or_else(|| "-".into()),
        change: step
            .quality
            .map(|q| format!("{:+}", q.change))
            .unwrap_or_else(|| "-".into()),
        quality: step
            .quality
            .map(|q| format!("{} {}", q.icon(), q.label()))
            .unwrap_or_default(),
    }
}
