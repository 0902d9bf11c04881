//! Runs against a real engine when `STOCKFISH_PATH` points at one.

use std::time::Duration;

use pgnsight_core::{Move, STARTING_FEN};
use pgnsight_stockfish::{AnalysisController, AnalysisSettings, AnalysisUpdate, Difficulty};
use serial_test::serial;

use crate::helpers::{stockfish_path, AFTER_E4};

async fn start() -> Option<AnalysisController> {
    let Some(path) = stockfish_path() else {
        eprintln!("STOCKFISH_PATH not set, skipping");
        return None;
    };
    let settings = AnalysisSettings::default()
        .with_multipv(3)
        .with_analysis_depth(12)
        .with_display_min_depth(8)
        .with_hash(16)
        .with_threads(1);
    let controller = AnalysisController::spawn(&path, settings);
    controller
        .wait_ready(Duration::from_secs(10))
        .await
        .expect("stockfish ready");
    Some(controller)
}

#[tokio::test]
#[serial]
async fn test_stockfish_analysis() {
    let Some(controller) = start().await else {
        return;
    };
    let mut stream = controller.request_analysis(STARTING_FEN).await.unwrap();
    let mut saw_lines = false;
    while let Some(update) = stream.next().await {
        match update {
            AnalysisUpdate::Lines { lines, depth } => {
                assert!(depth >= 8);
                assert!(lines.len() <= 3);
                saw_lines = true;
            }
            AnalysisUpdate::Finished { best_move, .. } => {
                assert!(best_move.is_some());
                break;
            }
            AnalysisUpdate::Stopped => panic!("analysis stopped unexpectedly"),
        }
    }
    assert!(saw_lines);
    controller.shutdown().await;
}

#[tokio::test]
#[serial]
async fn test_stockfish_quick_evaluation() {
    let Some(controller) = start().await else {
        return;
    };
    let cp = controller.quick_evaluate(AFTER_E4).await.unwrap();
    assert!(cp.abs() < 200, "unexpected evaluation {}", cp);
    controller.shutdown().await;
}

#[tokio::test]
#[serial]
async fn test_stockfish_checkmated_side_has_no_move() {
    let Some(controller) = start().await else {
        return;
    };
    // fool's mate
    let mated = "rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3";
    let mv: Option<Move> = controller
        .engine_move(mated, Difficulty::Easy)
        .await
        .unwrap();
    assert!(mv.is_none());
    controller.shutdown().await;
}
