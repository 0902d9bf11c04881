use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use pgnsight_stockfish::{AnalysisController, AnalysisSettings, EngineChannel, LoopbackEngine};
use tokio::task::JoinHandle;

pub const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";
pub const AFTER_E5: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2";
pub const AFTER_NF3: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2";

/// A controller wired to a scripted engine that has already answered `uci`.
pub struct TestEngine {
    pub controller: Arc<AnalysisController>,
    pub engine: LoopbackEngine,
}

impl TestEngine {
    pub async fn ready() -> Self {
        Self::with_settings(AnalysisSettings::default()).await
    }

    pub async fn with_settings(settings: AnalysisSettings) -> Self {
        let (channel, events, mut engine) = EngineChannel::loopback();
        let controller = Arc::new(AnalysisController::new(channel, events, settings));
        assert_eq!(engine.next_command().await.as_deref(), Some("uci"));
        engine.emit_all(["id name Stockfish 16", "id author the Stockfish developers", "uciok"]);
        controller
            .wait_ready(Duration::from_secs(1))
            .await
            .expect("engine ready");
        engine.expect_command("ucinewgame").await.expect("ucinewgame");
        Self { controller, engine }
    }

    /// Hands the engine end to a task that answers every search with the
    /// score listed for its position (side-to-move relative, 0 if unlisted).
    pub fn answer_with_scores(self, scores: &[(&str, i32)]) -> (Arc<AnalysisController>, JoinHandle<()>) {
        let scores: HashMap<String, i32> = scores
            .iter()
            .map(|(fen, cp)| (fen.to_string(), *cp))
            .collect();
        let Self {
            controller,
            mut engine,
        } = self;
        let handle = tokio::spawn(async move {
            let mut fen = String::new();
            while let Some(cmd) = engine.next_command().await {
                if let Some(position) = cmd.strip_prefix("position fen ") {
                    fen = position.to_string();
                } else if cmd.starts_with("go ") {
                    let cp = scores.get(&fen).copied().unwrap_or(0);
                    engine.emit(&format!(
                        "info depth 12 seldepth 16 multipv 1 score cp {} nodes 50000 pv a2a3",
                        cp
                    ));
                    engine.emit("bestmove a2a3");
                }
            }
        });
        (controller, handle)
    }
}

/// `$STOCKFISH_PATH` when it points at an existing file.
pub fn stockfish_path() -> Option<String> {
    let path = std::env::var("STOCKFISH_PATH").ok()?;
    Path::new(&path).exists().then_some(path)
}
