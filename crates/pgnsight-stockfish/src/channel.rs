use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

/// What the engine side of a channel delivers, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Line(String),
    /// Delivered at most once; the channel is dead afterwards.
    Unavailable(String),
}

pub type EventReceiver = mpsc::UnboundedReceiver<ChannelEvent>;

#[derive(Clone)]
struct FailureFlag {
    failed: Arc<AtomicBool>,
    events: mpsc::UnboundedSender<ChannelEvent>,
}

impl FailureFlag {
    fn trip(&self, reason: impl Into<String>) {
        if !self.failed.swap(true, Ordering::SeqCst) {
            let reason = reason.into();
            warn!(%reason, "engine channel unavailable");
            let _ = self.events.send(ChannelEvent::Unavailable(reason));
        }
    }

    fn is_tripped(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }
}

/// Line-oriented command pipe to a UCI engine.
///
/// Commands are written in the order they are sent. Once the underlying
/// engine is gone every `send` is silently dropped.
pub struct EngineChannel {
    commands: mpsc::UnboundedSender<String>,
    failure: FailureFlag,
}

impl EngineChannel {
    /// Starts `binary_path` as a child process. Must be called inside a tokio
    /// runtime. A spawn failure does not error: the returned channel is
    /// already failed and its receiver holds the `Unavailable` event.
    pub fn spawn(binary_path: &str) -> (Self, EventReceiver) {
        let (commands_tx, mut commands_rx) = mpsc::unbounded_channel::<String>();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let failure = FailureFlag {
            failed: Arc::new(AtomicBool::new(false)),
            events: events_tx.clone(),
        };
        let channel = Self {
            commands: commands_tx,
            failure: failure.clone(),
        };

        let spawned = Command::new(binary_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn();
        let mut process = match spawned {
            Ok(process) => process,
            Err(e) => {
                failure.trip(format!("failed to spawn {}: {}", binary_path, e));
                return (channel, events_rx);
            }
        };
        let (Some(mut stdin), Some(stdout)) = (process.stdin.take(), process.stdout.take()) else {
            failure.trip("engine process has no stdio pipes");
            return (channel, events_rx);
        };
        info!(binary = binary_path, "engine process started");

        let writer_failure = failure.clone();
        tokio::spawn(async move {
            // keeps the child alive until the channel is dropped
            let _process = process;
            while let Some(cmd) = commands_rx.recv().await {
                trace!("UCI >> {}", cmd);
                let written = async {
                    stdin.write_all(format!("{}\n", cmd).as_bytes()).await?;
                    stdin.flush().await
                }
                .await;
                if let Err(e) = written {
                    writer_failure.trip(format!("write failed: {}", e));
                    break;
                }
            }
            debug!("engine writer task exiting");
        });

        let reader_failure = failure;
        tokio::spawn(async move {
            let mut reader = BufReader::new(stdout);
            let mut line = String::new();
            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        reader_failure.trip("engine closed its output");
                        break;
                    }
                    Ok(_) => {
                        let trimmed = line.trim();
                        if trimmed.is_empty() {
                            continue;
                        }
                        trace!("UCI << {}", trimmed);
                        if events_tx.send(ChannelEvent::Line(trimmed.to_string())).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        reader_failure.trip(format!("read failed: {}", e));
                        break;
                    }
                }
            }
            debug!("engine reader task exiting");
        });

        (channel, events_rx)
    }

    /// An in-memory channel whose engine end is driven by hand.
    pub fn loopback() -> (Self, EventReceiver, LoopbackEngine) {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let failure = FailureFlag {
            failed: Arc::new(AtomicBool::new(false)),
            events: events_tx.clone(),
        };
        let channel = Self {
            commands: commands_tx,
            failure: failure.clone(),
        };
        let engine = LoopbackEngine {
            commands: commands_rx,
            events: events_tx,
            failure,
        };
        (channel, events_rx, engine)
    }

    pub fn send(&self, command: &str) {
        if self.failure.is_tripped() {
            trace!(command, "dropping command for unavailable engine");
            return;
        }
        let _ = self.commands.send(command.to_string());
    }

    pub fn is_available(&self) -> bool {
        !self.failure.is_tripped()
    }
}

/// Engine end of [`EngineChannel::loopback`].
pub struct LoopbackEngine {
    commands: mpsc::UnboundedReceiver<String>,
    events: mpsc::UnboundedSender<ChannelEvent>,
    failure: FailureFlag,
}

impl LoopbackEngine {
    pub fn emit(&self, line: &str) {
        let _ = self.events.send(ChannelEvent::Line(line.to_string()));
    }

    pub fn emit_all<'a>(&self, lines: impl IntoIterator<Item = &'a str>) {
        for line in lines {
            self.emit(line);
        }
    }

    pub async fn next_command(&mut self) -> Option<String> {
        self.commands.recv().await
    }

    /// Waits until a command starting with `prefix` shows up, discarding the
    /// ones before it.
    pub async fn expect_command(&mut self, prefix: &str) -> Option<String> {
        while let Some(cmd) = self.commands.recv().await {
            if cmd.starts_with(prefix) {
                return Some(cmd);
            }
        }
        None
    }

    /// Commands sent so far that have not been read yet.
    pub fn drain_commands(&mut self) -> Vec<String> {
        let mut drained = Vec::new();
        while let Ok(cmd) = self.commands.try_recv() {
            drained.push(cmd);
        }
        drained
    }

    /// Simulates the engine process dying.
    pub fn fail(&self, reason: &str) {
        self.failure.trip(reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_loopback_round_trip() {
        let (channel, mut events, mut engine) = EngineChannel::loopback();
        channel.send("uci");
        channel.send("isready");
        assert_eq!(engine.next_command().await.as_deref(), Some("uci"));
        assert_eq!(engine.next_command().await.as_deref(), Some("isready"));

        engine.emit_all(["id name Loopback", "uciok"]);
        assert_eq!(
            events.recv().await,
            Some(ChannelEvent::Line("id name Loopback".into()))
        );
        assert_eq!(events.recv().await, Some(ChannelEvent::Line("uciok".into())));
    }

    #[tokio::test]
    async fn test_failure_fires_once_and_mutes_sends() {
        let (channel, mut events, mut engine) = EngineChannel::loopback();
        engine.fail("gone");
        engine.fail("gone again");
        assert!(!channel.is_available());

        channel.send("go depth 10");
        assert!(engine.drain_commands().is_empty());

        assert_eq!(events.recv().await, Some(ChannelEvent::Unavailable("gone".into())));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_spawn_missing_binary_is_unavailable() {
        let (channel, mut events) = EngineChannel::spawn("/nonexistent/path/to/stockfish");
        assert!(!channel.is_available());
        assert!(matches!(events.recv().await, Some(ChannelEvent::Unavailable(_))));
        channel.send("uci");
    }
}
