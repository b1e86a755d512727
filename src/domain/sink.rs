use super::entry::LogEntry;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("sink is closed")]
    Closed,
}

/// The emit capability every parser pushes `LogEntry` values through.
///
/// Deliberately minimal: only the per-source ordering guarantees need to
/// hold, not any specific transport. A parser must not assume the sink is
/// non-blocking; emitting may suspend (e.g. a bounded channel applying
/// backpressure).
pub trait Sink {
    fn emit(&mut self, entry: LogEntry) -> Result<(), SinkError>;
}

/// An in-memory sink, mainly for tests and small one-shot consumers.
#[derive(Debug, Default)]
pub struct VecSink {
    pub entries: Vec<LogEntry>,
}

impl Sink for VecSink {
    fn emit(&mut self, entry: LogEntry) -> Result<(), SinkError> {
        self.entries.push(entry);
        Ok(())
    }
}

/// Adapts a bounded `tokio::sync::mpsc::Sender` into a `Sink`, for callers
/// running the blocking parser on a `spawn_blocking` task and consuming the
/// result as an async stream.
pub struct ChannelSink {
    tx: tokio::sync::mpsc::Sender<LogEntry>,
}

impl ChannelSink {
    pub fn new(tx: tokio::sync::mpsc::Sender<LogEntry>) -> Self {
        Self { tx }
    }
}

impl Sink for ChannelSink {
    fn emit(&mut self, entry: LogEntry) -> Result<(), SinkError> {
        self.tx.blocking_send(entry).map_err(|_| SinkError::Closed)
    }
}
