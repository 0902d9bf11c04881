use std::sync::Arc;

use pgnsight_core::{Color, MoveQuality, PositionEvaluator, STARTING_FEN};
use pgnsight_stockfish::{
    AnalysisController, AnalysisSettings, EngineChannel, GameReview, START_PLY,
};

use crate::helpers::{TestEngine, AFTER_E4, AFTER_E5, AFTER_NF3};

const GAME: [&str; 4] = [STARTING_FEN, AFTER_E4, AFTER_E5, AFTER_NF3];

#[tokio::test]
async fn test_review_through_controller() {
    let (controller, driver) = TestEngine::ready().await.answer_with_scores(&[
        (STARTING_FEN, 25),
        (AFTER_E4, -30),
        (AFTER_E5, 35),
        (AFTER_NF3, -300),
    ]);
    let mut review = GameReview::new(controller.clone() as Arc<dyn PositionEvaluator>);
    review.load_game(GAME).unwrap();
    assert_eq!(review.move_count(), 3);

    let first = review.step_forward().await.unwrap();
    assert_eq!(first.mover, Some(Color::White));
    assert_eq!(first.quality.unwrap().quality, MoveQuality::Good);

    let second = review.step_forward().await.unwrap();
    assert_eq!(second.mover, Some(Color::Black));
    assert_eq!(second.quality.unwrap().change, -5);

    let third = review.step_forward().await.unwrap();
    let quality = third.quality.unwrap();
    assert_eq!(quality.change, 265);
    assert_eq!(quality.quality, MoveQuality::Great);

    assert!(review.step_forward().await.is_none());
    assert_eq!(review.cache().get(START_PLY), Some(25));
    assert_eq!(review.cache().get(0), Some(30));
    assert_eq!(review.cache().get(2), Some(300));

    review.goto_start();
    assert_eq!(review.current_position().unwrap().fen, STARTING_FEN);
    driver.abort();
}

#[tokio::test]
async fn test_review_without_engine_skips_grading() {
    let (channel, events, _engine) = EngineChannel::loopback();
    let controller = Arc::new(AnalysisController::new(
        channel,
        events,
        AnalysisSettings::default(),
    ));
    let mut review = GameReview::new(controller as Arc<dyn PositionEvaluator>);
    review.load_game(GAME).unwrap();

    let step = review.step_forward().await.unwrap();
    assert_eq!(step.ply, 0);
    assert!(step.quality.is_none());
    assert!(review.cache().is_empty());
}

#[tokio::test]
async fn test_review_after_engine_failure() {
    let TestEngine { controller, engine } = TestEngine::ready().await;
    let mut events = controller.subscribe();
    engine.fail("engine exited");
    while !matches!(
        events.recv().await,
        Ok(pgnsight_core::AnalysisEvent::Unavailable { .. })
    ) {}

    let mut review = GameReview::new(controller as Arc<dyn PositionEvaluator>);
    review.load_game(GAME).unwrap();
    let step = review.step_forward().await.unwrap();
    assert!(step.quality.is_none());
    assert!(review.cache().is_empty());
}
