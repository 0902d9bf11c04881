use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use pgnsight_core::{
    AnalysisEvent, AnalysisLine, ChessPosition, Error, InfoRecord, Move, PositionEvaluator,
    Result, Score, SessionId,
};
use tokio::sync::{broadcast, oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, instrument, trace, warn};

use crate::channel::{ChannelEvent, EngineChannel, EventReceiver};
use crate::multipv::MultiPvBuffer;
use crate::play::{Difficulty, MAX_SKILL_LEVEL};
use crate::uci::{BestMove, UciInfo, UciMessage};

#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    pub multipv: u8,
    pub analysis_depth: u32,
    /// Lines are only published once the deepest one reaches this depth.
    pub display_min_depth: u32,
    pub quick_eval_depth: u32,
    pub quick_eval_timeout: Duration,
    pub hash_mb: u32,
    pub threads: u32,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            multipv: 8,
            analysis_depth: 20,
            display_min_depth: 10,
            quick_eval_depth: 12,
            quick_eval_timeout: Duration::from_secs(3),
            hash_mb: 256,
            threads: 2,
        }
    }
}

impl AnalysisSettings {
    pub fn with_multipv(mut self, multipv: u8) -> Self {
        self.multipv = multipv.max(1);
        self
    }

    pub fn with_analysis_depth(mut self, depth: u32) -> Self {
        self.analysis_depth = depth;
        self
    }

    pub fn with_display_min_depth(mut self, depth: u32) -> Self {
        self.display_min_depth = depth;
        self
    }

    pub fn with_quick_eval_depth(mut self, depth: u32) -> Self {
        self.quick_eval_depth = depth;
        self
    }

    pub fn with_quick_eval_timeout(mut self, timeout: Duration) -> Self {
        self.quick_eval_timeout = timeout;
        self
    }

    pub fn with_hash(mut self, hash_mb: u32) -> Self {
        self.hash_mb = hash_mb.clamp(1, 2048);
        self
    }

    pub fn with_threads(mut self, threads: u32) -> Self {
        self.threads = threads.clamp(1, 16);
        self
    }
}

/// Where the full analysis stands. `Settled` holds after a `bestmove`
/// until the next analysis is requested and counts as inactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Requested,
    Streaming,
    Settled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzeOutcome {
    Started(SessionId),
    /// A full analysis was already running; it has been stopped instead.
    Stopped(SessionId),
    NotReady,
}

enum SearchKind {
    Full,
    Quick {
        reply: oneshot::Sender<i32>,
        last_score: Option<Score>,
    },
    Play {
        reply: oneshot::Sender<Option<Move>>,
    },
}

/// One `go` the engine still owes a `bestmove` for.
struct Search {
    session: SessionId,
    kind: SearchKind,
    /// Nobody wants the result any more; its lines are swallowed.
    stale: bool,
}

struct SessionState {
    unavailable: Option<String>,
    phase: SessionPhase,
    full_session: Option<SessionId>,
    next_session: SessionId,
    /// The engine answers every `go` with exactly one `bestmove`, in order.
    /// `info` lines belong to the front entry.
    outstanding: VecDeque<Search>,
    buffer: MultiPvBuffer,
    reduced_skill: bool,
}

impl SessionState {
    fn new() -> Self {
        Self {
            unavailable: None,
            phase: SessionPhase::Idle,
            full_session: None,
            next_session: 0,
            outstanding: VecDeque::new(),
            buffer: MultiPvBuffer::new(),
            reduced_skill: false,
        }
    }

    fn begin(&mut self, kind: SearchKind) -> SessionId {
        self.next_session += 1;
        let session = self.next_session;
        self.outstanding.push_back(Search {
            session,
            kind,
            stale: false,
        });
        session
    }

    fn active_full_session(&self) -> Option<SessionId> {
        match self.phase {
            SessionPhase::Requested | SessionPhase::Streaming => self.full_session,
            SessionPhase::Idle | SessionPhase::Settled => None,
        }
    }

    fn mark_stale(&mut self, session: SessionId) {
        if let Some(search) = self.outstanding.iter_mut().find(|s| s.session == session) {
            search.stale = true;
        }
    }
}

struct Shared {
    channel: EngineChannel,
    settings: AnalysisSettings,
    ready: AtomicBool,
    state: Mutex<SessionState>,
    events: broadcast::Sender<AnalysisEvent>,
    /// Quick evaluations and engine moves take turns through this.
    request_queue: Mutex<()>,
}

impl Shared {
    fn publish(&self, event: AnalysisEvent) {
        let _ = self.events.send(event);
    }

    fn ensure_available(&self, state: &SessionState) -> Result<()> {
        match &state.unavailable {
            Some(reason) => Err(Error::EngineUnavailable(reason.clone())),
            None => Ok(()),
        }
    }

    fn stop_full(&self, state: &mut SessionState, session: SessionId) {
        debug!(session, "stopping full analysis");
        self.channel.send("stop");
        state.mark_stale(session);
        state.phase = SessionPhase::Idle;
        state.full_session = None;
        self.publish(AnalysisEvent::Stopped { session });
    }

    fn restore_strength(&self, state: &mut SessionState) {
        if state.reduced_skill {
            self.channel.send(&format!(
                "setoption name Skill Level value {}",
                MAX_SKILL_LEVEL
            ));
            state.reduced_skill = false;
        }
    }

    async fn handle_event(&self, event: ChannelEvent) {
        match event {
            ChannelEvent::Line(line) => self.handle_line(&line).await,
            ChannelEvent::Unavailable(reason) => self.handle_unavailable(reason).await,
        }
    }

    async fn handle_line(&self, line: &str) {
        match UciMessage::parse(line) {
            UciMessage::UciOk => self.handle_uciok(),
            UciMessage::ReadyOk => trace!("engine ready"),
            UciMessage::Id { name, value } => debug!(%name, %value, "engine id"),
            UciMessage::Info(info) => {
                let mut state = self.state.lock().await;
                self.handle_info(&mut state, info);
            }
            UciMessage::BestMove(best) => {
                let mut state = self.state.lock().await;
                self.handle_bestmove(&mut state, best);
            }
            UciMessage::Unknown(text) => trace!(%text, "ignoring engine output"),
        }
    }

    fn handle_uciok(&self) {
        if self.ready.load(Ordering::SeqCst) {
            return;
        }
        let settings = &self.settings;
        self.channel
            .send(&format!("setoption name Hash value {}", settings.hash_mb));
        self.channel
            .send(&format!("setoption name Threads value {}", settings.threads));
        self.channel
            .send(&format!("setoption name MultiPV value {}", settings.multipv));
        self.channel.send("ucinewgame");
        self.ready.store(true, Ordering::SeqCst);
        info!("engine ready");
        self.publish(AnalysisEvent::Ready);
    }

    fn handle_info(&self, state: &mut SessionState, info: UciInfo) {
        let SessionState {
            outstanding,
            phase,
            buffer,
            ..
        } = state;
        let Some(search) = outstanding.front_mut() else {
            trace!("info line with no search outstanding");
            return;
        };
        if search.stale {
            trace!(session = search.session, "dropping stale info line");
            return;
        }
        let session = search.session;
        match &mut search.kind {
            SearchKind::Full => {
                if *phase == SessionPhase::Requested && info.score.is_some() {
                    debug!(session, "analysis streaming");
                    *phase = SessionPhase::Streaming;
                }
                let Some(record) = info.record() else {
                    return;
                };
                buffer.update(record);
                let depth = buffer.max_depth();
                if depth >= self.settings.display_min_depth {
                    let lines = buffer.current_lines();
                    if !lines.is_empty() {
                        self.publish(AnalysisEvent::Lines {
                            session,
                            depth,
                            lines,
                        });
                    }
                }
            }
            SearchKind::Quick { last_score, .. } => {
                if info.multipv_index() == 0 {
                    if let Some(score) = info.score {
                        *last_score = Some(score);
                    }
                }
            }
            SearchKind::Play { .. } => {}
        }
    }

    fn handle_bestmove(&self, state: &mut SessionState, best: BestMove) {
        let Some(search) = state.outstanding.pop_front() else {
            debug!("bestmove with no search outstanding");
            return;
        };
        let session = search.session;
        if search.stale {
            debug!(session, "dropping stale bestmove");
            return;
        }
        match search.kind {
            SearchKind::Full => {
                state.phase = SessionPhase::Settled;
                let best_uci = best
                    .mv
                    .as_ref()
                    .map(Move::to_uci)
                    .unwrap_or_else(|| "(none)".to_string());
                info!(session, best_move = %best_uci, "analysis settled");
                self.publish(AnalysisEvent::BestMove {
                    session,
                    best_move: best.mv,
                    ponder: best.ponder,
                });
                state.full_session = None;
            }
            SearchKind::Quick { reply, last_score } => {
                let cp = last_score.map(|s| s.as_centipawns()).unwrap_or(0);
                debug!(session, cp, "quick evaluation finished");
                let _ = reply.send(cp);
            }
            SearchKind::Play { reply } => {
                let _ = reply.send(best.mv);
            }
        }
    }

    async fn handle_unavailable(&self, reason: String) {
        warn!(%reason, "engine unavailable, analysis disabled");
        self.ready.store(false, Ordering::SeqCst);
        let mut state = self.state.lock().await;
        state.unavailable = Some(reason.clone());
        state.phase = SessionPhase::Idle;
        state.full_session = None;
        // dropping the reply senders wakes every waiter
        state.outstanding.clear();
        self.publish(AnalysisEvent::Unavailable { reason });
    }
}

/// Owns the engine channel and every piece of analysis state tied to it.
///
/// At most one full analysis runs at a time. Quick evaluations and engine
/// moves are queued and run one after another. Incoming lines are routed to
/// the search they belong to by a single background task.
pub struct AnalysisController {
    shared: Arc<Shared>,
    router: JoinHandle<()>,
}

impl AnalysisController {
    /// Must be called inside a tokio runtime. Sends `uci` straight away.
    pub fn new(channel: EngineChannel, events: EventReceiver, settings: AnalysisSettings) -> Self {
        let (events_tx, _) = broadcast::channel(256);
        let shared = Arc::new(Shared {
            channel,
            settings,
            ready: AtomicBool::new(false),
            state: Mutex::new(SessionState::new()),
            events: events_tx,
            request_queue: Mutex::new(()),
        });
        let router = tokio::spawn(route(Arc::clone(&shared), events));
        shared.channel.send("uci");
        Self { shared, router }
    }

    /// Spawns the engine binary and wires a controller to it.
    pub fn spawn(binary_path: &str, settings: AnalysisSettings) -> Self {
        let (channel, events) = EngineChannel::spawn(binary_path);
        Self::new(channel, events, settings)
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.shared.settings
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AnalysisEvent> {
        self.shared.events.subscribe()
    }

    pub fn is_ready(&self) -> bool {
        self.shared.ready.load(Ordering::SeqCst)
    }

    pub async fn is_unavailable(&self) -> bool {
        self.shared.state.lock().await.unavailable.is_some()
    }

    pub async fn phase(&self) -> SessionPhase {
        self.shared.state.lock().await.phase
    }

    /// Buffered records of the current (or last) full analysis at or above
    /// `min_depth`.
    pub async fn snapshot(&self, min_depth: u32) -> Vec<InfoRecord> {
        let state = self.shared.state.lock().await;
        state
            .buffer
            .snapshot(min_depth)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn current_lines(&self) -> Vec<AnalysisLine> {
        self.shared.state.lock().await.buffer.current_lines()
    }

    pub async fn wait_ready(&self, within: Duration) -> Result<()> {
        let mut events = self.subscribe();
        let check = |state: &SessionState| -> Option<Result<()>> {
            if let Some(reason) = &state.unavailable {
                return Some(Err(Error::EngineUnavailable(reason.clone())));
            }
            self.is_ready().then_some(Ok(()))
        };
        if let Some(result) = check(&*self.shared.state.lock().await) {
            return result;
        }
        timeout(within, async {
            loop {
                match events.recv().await {
                    Ok(AnalysisEvent::Ready) => return Ok(()),
                    Ok(AnalysisEvent::Unavailable { reason }) => {
                        return Err(Error::EngineUnavailable(reason))
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(_)) => {
                        if let Some(result) = check(&*self.shared.state.lock().await) {
                            return result;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        return Err(Error::Internal("event channel closed".into()))
                    }
                }
            }
        })
        .await
        .map_err(|_| Error::AnalysisTimeout)?
    }

    /// Starts a full multi-line analysis of `fen`, or stops the one already
    /// running. Waits behind any queued quick evaluation or engine move.
    #[instrument(skip(self))]
    pub async fn analyze(&self, fen: &str) -> Result<AnalyzeOutcome> {
        let shared = &self.shared;
        let _turn = shared.request_queue.lock().await;
        let mut state = shared.state.lock().await;
        shared.ensure_available(&state)?;
        if !ChessPosition::new(fen).validate() {
            return Err(Error::InvalidFen(fen.to_string()));
        }
        if !self.is_ready() {
            debug!("analysis requested before engine is ready");
            return Ok(AnalyzeOutcome::NotReady);
        }
        if let Some(session) = state.active_full_session() {
            shared.stop_full(&mut state, session);
            return Ok(AnalyzeOutcome::Stopped(session));
        }

        state.buffer.clear();
        let session = state.begin(SearchKind::Full);
        state.phase = SessionPhase::Requested;
        state.full_session = Some(session);

        let settings = &shared.settings;
        shared.channel.send("stop");
        shared.restore_strength(&mut state);
        shared
            .channel
            .send(&format!("setoption name MultiPV value {}", settings.multipv));
        shared.channel.send(&format!("position fen {}", fen));
        shared
            .channel
            .send(&format!("go depth {}", settings.analysis_depth));
        debug!(session, "analysis requested");
        Ok(AnalyzeOutcome::Started(session))
    }

    /// Stops the running full analysis, if any.
    pub async fn stop(&self) -> Option<SessionId> {
        let mut state = self.shared.state.lock().await;
        let session = state.active_full_session()?;
        self.shared.stop_full(&mut state, session);
        Some(session)
    }

    /// Starts a fresh full analysis and hands back its updates as a stream.
    /// A running analysis is stopped first.
    pub async fn request_analysis(&self, fen: &str) -> Result<AnalysisStream> {
        let events = self.subscribe();
        let session = match self.analyze(fen).await? {
            AnalyzeOutcome::Started(session) => session,
            AnalyzeOutcome::Stopped(_) => match self.analyze(fen).await? {
                AnalyzeOutcome::Started(session) => session,
                _ => return Err(Error::Internal("analysis could not be restarted".into())),
            },
            AnalyzeOutcome::NotReady => return Err(Error::EngineNotReady),
        };
        Ok(AnalysisStream {
            session,
            events,
            finished: false,
        })
    }

    /// Shallow single-value evaluation of `fen`, in centipawns relative to the
    /// side to move. Resolves with 0 if the engine does not answer in time.
    #[instrument(skip(self))]
    pub async fn quick_evaluate(&self, fen: &str) -> Result<i32> {
        let shared = &self.shared;
        let _turn = shared.request_queue.lock().await;
        let (reply_tx, reply_rx) = oneshot::channel();
        let session = {
            let mut state = shared.state.lock().await;
            shared.ensure_available(&state)?;
            if !ChessPosition::new(fen).validate() {
                return Err(Error::InvalidFen(fen.to_string()));
            }
            if !self.is_ready() {
                return Err(Error::EngineNotReady);
            }
            if let Some(running) = state.active_full_session() {
                shared.stop_full(&mut state, running);
            }
            let session = state.begin(SearchKind::Quick {
                reply: reply_tx,
                last_score: None,
            });
            shared.channel.send("stop");
            shared.restore_strength(&mut state);
            shared.channel.send(&format!("position fen {}", fen));
            shared
                .channel
                .send(&format!("go depth {}", shared.settings.quick_eval_depth));
            session
        };

        match timeout(shared.settings.quick_eval_timeout, reply_rx).await {
            Ok(Ok(cp)) => Ok(cp),
            Ok(Err(_)) => Err(self.unavailable_error().await),
            Err(_) => {
                warn!(session, "quick evaluation timed out, using 0");
                shared.state.lock().await.mark_stale(session);
                Ok(0)
            }
        }
    }

    /// Asks the engine for a move at the given strength. `Ok(None)` when the
    /// engine has no legal move.
    #[instrument(skip(self))]
    pub async fn engine_move(&self, fen: &str, difficulty: Difficulty) -> Result<Option<Move>> {
        let shared = &self.shared;
        let preset = difficulty.settings();
        let _turn = shared.request_queue.lock().await;
        let (reply_tx, reply_rx) = oneshot::channel();
        let session = {
            let mut state = shared.state.lock().await;
            shared.ensure_available(&state)?;
            if !ChessPosition::new(fen).validate() {
                return Err(Error::InvalidFen(fen.to_string()));
            }
            if !self.is_ready() {
                return Err(Error::EngineNotReady);
            }
            if let Some(running) = state.active_full_session() {
                shared.stop_full(&mut state, running);
            }
            let session = state.begin(SearchKind::Play { reply: reply_tx });
            shared.channel.send("stop");
            shared.channel.send(&format!(
                "setoption name Skill Level value {}",
                preset.skill_level
            ));
            state.reduced_skill = preset.skill_level < MAX_SKILL_LEVEL;
            shared.channel.send(&format!("position fen {}", fen));
            shared.channel.send(&format!(
                "go depth {} movetime {}",
                preset.depth, preset.movetime_ms
            ));
            session
        };

        let grace = Duration::from_millis(preset.movetime_ms + 5000);
        match timeout(grace, reply_rx).await {
            Ok(Ok(mv)) => Ok(mv),
            Ok(Err(_)) => Err(self.unavailable_error().await),
            Err(_) => {
                warn!(session, "engine move timed out");
                shared.state.lock().await.mark_stale(session);
                Err(Error::AnalysisTimeout)
            }
        }
    }

    /// Stops whatever is running and asks the engine to exit.
    pub async fn shutdown(&self) {
        info!("shutting down engine");
        if self.stop().await.is_none() {
            self.shared.channel.send("stop");
        }
        self.shared.channel.send("quit");
    }

    async fn unavailable_error(&self) -> Error {
        let state = self.shared.state.lock().await;
        Error::EngineUnavailable(
            state
                .unavailable
                .clone()
                .unwrap_or_else(|| "engine went away".to_string()),
        )
    }
}

impl Drop for AnalysisController {
    fn drop(&mut self) {
        self.router.abort();
    }
}

#[async_trait]
impl PositionEvaluator for AnalysisController {
    async fn quick_evaluate(&self, fen: &str) -> Result<i32> {
        AnalysisController::quick_evaluate(self, fen).await
    }

    fn is_ready(&self) -> bool {
        AnalysisController::is_ready(self)
    }
}

async fn route(shared: Arc<Shared>, mut events: EventReceiver) {
    while let Some(event) = events.recv().await {
        shared.handle_event(event).await;
    }
    debug!("engine event router exiting");
}

/// What a caller of [`AnalysisController::request_analysis`] sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisUpdate {
    Lines {
        depth: u32,
        lines: Vec<AnalysisLine>,
    },
    Finished {
        best_move: Option<Move>,
        ponder: Option<Move>,
    },
    Stopped,
}

pub struct AnalysisStream {
    session: SessionId,
    events: broadcast::Receiver<AnalysisEvent>,
    finished: bool,
}

impl AnalysisStream {
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Next update for this session; `None` once it has finished, been
    /// stopped, or the engine went away.
    pub async fn next(&mut self) -> Option<AnalysisUpdate> {
        while !self.finished {
            let event = match self.events.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "analysis stream lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    self.finished = true;
                    return None;
                }
            };
            if let AnalysisEvent::Unavailable { .. } = event {
                self.finished = true;
                return None;
            }
            if event.session() != Some(self.session) {
                continue;
            }
            return match event {
                AnalysisEvent::Lines { depth, lines, .. } => {
                    Some(AnalysisUpdate::Lines { depth, lines })
                }
                AnalysisEvent::BestMove {
                    best_move, ponder, ..
                } => {
                    self.finished = true;
                    Some(AnalysisUpdate::Finished { best_move, ponder })
                }
                AnalysisEvent::Stopped { .. } => {
                    self.finished = true;
                    Some(AnalysisUpdate::Stopped)
                }
                AnalysisEvent::Ready | AnalysisEvent::Unavailable { .. } => continue,
            };
        }
        None
    }
}
