mod cache;
mod channel;
mod controller;
mod multipv;
mod play;
mod review;
pub mod uci;

pub use cache::{EvaluationCache, START_PLY};
pub use channel::{ChannelEvent, EngineChannel, EventReceiver, LoopbackEngine};
pub use controller::{
    AnalysisController, AnalysisSettings, AnalysisStream, AnalysisUpdate, AnalyzeOutcome,
    SessionPhase,
};
pub use multipv::MultiPvBuffer;
pub use play::{Difficulty, DifficultySettings, MAX_SKILL_LEVEL};
pub use review::{GameReview, StepResult};
