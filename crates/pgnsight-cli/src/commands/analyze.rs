use clap::Args;
use pgnsight_core::{AnalysisLine, STARTING_FEN};
use pgnsight_stockfish::{AnalysisController, AnalysisUpdate};
use serde::Serialize;
use tabled::{Table, Tabled};

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Position to analyse
    #[arg(short, long, default_value = STARTING_FEN)]
    pub fen: String,

    /// Print every update as a JSON line
    #[arg(long)]
    pub json: bool,

    /// Print intermediate depths, not only the final lines
    #[arg(short = 'F', long)]
    pub follow: bool,
}

#[derive(Tabled)]
struct LineRow {
    #[tabled(rename = "#")]
    line: usize,
    #[tabled(rename = "Move")]
    mv: String,
    #[tabled(rename = "Eval")]
    eval: String,
    #[tabled(rename = "Depth")]
    depth: u32,
    #[tabled(rename = "Line")]
    pv: String,
}

impl From<&AnalysisLine> for LineRow {
    fn from(line: &AnalysisLine) -> Self {
        Self {
            line: line.line,
            mv: line.mv.clone(),
            eval: line
                .score
                .map(|score| score.display())
                .unwrap_or_else(|| "-".into()),
            depth: line.depth,
            pv: line.pv.join(" "),
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum JsonUpdate<'a> {
    Lines {
        depth: u32,
        lines: &'a [AnalysisLine],
    },
    Finished {
        best_move: Option<String>,
        ponder: Option<String>,
    },
    Stopped,
}

pub async fn execute(args: AnalyzeArgs, controller: &AnalysisController) -> anyhow::Result<()> {
    let mut stream = controller.request_analysis(&args.fen).await?;
    let mut latest: Vec<AnalysisLine> = Vec::new();

    loop {
        let next = tokio::select! {
            update = stream.next() => Some(update),
            _ = tokio::signal::ctrl_c() => None,
        };
        let update = match next {
            Some(update) => update,
            None => {
                controller.stop().await;
                stream.next().await
            }
        };
        let Some(update) = update else {
            anyhow::bail!("engine went away during analysis");
        };

        match update {
            AnalysisUpdate::Lines { depth, lines } => {
                if args.json {
                    let json = JsonUpdate::Lines {
                        depth,
                        lines: &lines,
                    };
                    println!("{}", serde_json::to_string(&json)?);
                } else if args.follow {
                    print_lines(depth, &lines);
                }
                latest = lines;
            }
            AnalysisUpdate::Finished { best_move, ponder } => {
                if args.json {
                    let json = JsonUpdate::Finished {
                        best_move: best_move.as_ref().map(|m| m.to_uci()),
                        ponder: ponder.as_ref().map(|m| m.to_uci()),
                    };
                    println!("{}", serde_json::to_string(&json)?);
                    return Ok(());
                }
                if !args.follow {
                    let depth = latest.iter().map(|l| l.depth).max().unwrap_or(0);
                    print_lines(depth, &latest);
                }
                match best_move {
                    Some(mv) => {
                        print!("Best move: {}", mv);
                        if let Some(ponder) = ponder {
                            print!(" (ponder {})", ponder);
                        }
                        println!();
                    }
                    None => println!("No legal moves in this position"),
                }
                return Ok(());
            }
            AnalysisUpdate::Stopped => {
                if args.json {
                    println!("{}", serde_json::to_string(&JsonUpdate::Stopped)?);
                } else {
                    println!("Analysis stopped");
                }
                return Ok(());
            }
        }
    }
}

fn print_lines(depth: u32, lines: &[AnalysisLine]) {
    if lines.is_empty() {
        println!("No lines reached the display depth");
        return;
    }
    let rows: Vec<LineRow> = lines.iter().map(LineRow::from).collect();
    println!("Depth {}", depth);
    println!("{}", Table::new(rows));
}
