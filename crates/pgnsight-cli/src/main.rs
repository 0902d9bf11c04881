use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use pgnsight_cli::commands::{analyze, eval, play, review};
use pgnsight_cli::Config;
use pgnsight_stockfish::AnalysisController;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pgnsight")]
#[command(author, version, about = "Stockfish-backed chess position analysis", long_about = None)]
struct Cli {
    /// Configuration file, overrides $PGNSIGHT_CONFIG
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the Stockfish binary
    #[arg(short, long, env = "STOCKFISH_PATH")]
    engine: Option<String>,

    /// Depth of full analyses
    #[arg(long)]
    depth: Option<u32>,

    /// Number of lines a full analysis reports
    #[arg(long)]
    multipv: Option<u8>,

    #[arg(long)]
    threads: Option<u32>,

    #[arg(long)]
    hash: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Multi-line analysis of one position
    Analyze(analyze::AnalyzeArgs),
    /// Quick single-score evaluation of one position
    Eval(eval::EvalArgs),
    /// Step through a game and grade every move
    Review(review::ReviewArgs),
    /// Ask the engine for a move at a given strength
    Play(play::PlayArgs),
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(engine) = cli.engine {
        config.engine.binary_path = engine;
    }
    if let Some(depth) = cli.depth {
        config.analysis.analysis_depth = depth;
    }
    if let Some(multipv) = cli.multipv {
        config.engine.multipv = multipv;
    }
    if let Some(threads) = cli.threads {
        config.engine.threads = threads;
    }
    if let Some(hash) = cli.hash {
        config.engine.hash_mb = hash;
    }

    info!(engine = %config.engine.binary_path, "starting engine");
    let controller = Arc::new(AnalysisController::spawn(
        &config.engine.binary_path,
        config.analysis_settings(),
    ));
    controller.wait_ready(config.ready_timeout()).await?;

    let result = match cli.command {
        Commands::Analyze(args) => analyze::execute(args, &controller).await,
        Commands::Eval(args) => eval::execute(args, &controller).await,
        Commands::Review(args) => review::execute(args, Arc::clone(&controller)).await,
        Commands::Play(args) => play::execute(args, &controller).await,
    };

    controller.shutdown().await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_analyze_flags() {
        let cli = Cli::try_parse_from(["pgnsight", "analyze", "-F", "--json"]).unwrap();
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert!(args.follow);
        assert!(args.json);

        let cli = Cli::try_parse_from(["pgnsight", "analyze", "--follow", "-f", "8/8/8/8/8/8/8/8 w - - 0 1"])
            .unwrap();
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert!(args.follow);
        assert_eq!(args.fen, "8/8/8/8/8/8/8/8 w - - 0 1");
    }

    #[test]
    fn test_global_overrides_and_play_difficulty() {
        let cli = Cli::try_parse_from([
            "pgnsight", "--depth", "14", "--multipv", "3", "play", "-d", "hard",
        ])
        .unwrap();
        assert_eq!(cli.depth, Some(14));
        assert_eq!(cli.multipv, Some(3));
        let Commands::Play(args) = cli.command else {
            panic!("expected play");
        };
        assert_eq!(args.difficulty, pgnsight_stockfish::Difficulty::Hard);
    }
}
