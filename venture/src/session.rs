//! Client-side state of one simulation, owned by whoever consumes the stream.

use tracing::warn;

use crate::model::{StartupConfiguration, YearlyProgress};
use crate::stream::{DecodeEvent, ResultAccumulator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Streaming,
    Completed,
    Failed,
}

/// Incremental view of a run: what has arrived so far and how it ended.
#[derive(Debug, Clone)]
pub struct SimulationSession {
    configuration: StartupConfiguration,
    status: SessionStatus,
    current_year: u8,
    accumulator: ResultAccumulator,
    error: Option<String>,
    decode_warnings: Vec<String>,
}

impl SimulationSession {
    pub fn new(configuration: StartupConfiguration) -> Self {
        Self {
            configuration,
            status: SessionStatus::Idle,
            current_year: 0,
            accumulator: ResultAccumulator::new(),
            error: None,
            decode_warnings: Vec::new(),
        }
    }

    /// Reset to an empty streaming state.
    pub fn start(&mut self) {
        self.status = SessionStatus::Streaming;
        self.current_year = 0;
        self.accumulator = ResultAccumulator::new();
        self.error = None;
        self.decode_warnings.clear();
    }

    /// Apply one decoded event. Returns the year that was added, if any.
    pub fn apply(&mut self, event: DecodeEvent) -> Option<&YearlyProgress> {
        match event {
            DecodeEvent::Year(progress) => {
                let year = progress.year;
                if !self.accumulator.insert(progress) {
                    warn!(year, "Ignoring duplicate year");
                    return None;
                }
                self.current_year = year;
                self.accumulator.results().last()
            }
            DecodeEvent::Completed => {
                self.status = SessionStatus::Completed;
                None
            }
            DecodeEvent::ServerError(message) => {
                self.fail(message);
                None
            }
            DecodeEvent::Malformed { segment, reason } => {
                warn!(%reason, segment_len = segment.len(), "Failed to decode stream frame");
                self.decode_warnings.push(reason);
                None
            }
        }
    }

    /// The connection failed.
    pub fn fail_transport(&mut self, message: impl Into<String>) {
        self.fail(message.into());
    }

    /// The stream closed. Without a terminal marker or an error frame the
    /// run is considered failed.
    pub fn end_of_stream(&mut self) {
        if self.status == SessionStatus::Streaming {
            self.fail("stream ended before completion".to_string());
        }
    }

    fn fail(&mut self, message: String) {
        self.status = SessionStatus::Failed;
        self.error = Some(message);
    }

    pub fn configuration(&self) -> &StartupConfiguration {
        &self.configuration
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_streaming(&self) -> bool {
        self.status == SessionStatus::Streaming
    }

    pub fn current_year(&self) -> u8 {
        self.current_year
    }

    pub fn results(&self) -> &[YearlyProgress] {
        self.accumulator.results()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn decode_warnings(&self) -> &[String] {
        &self.decode_warnings
    }
}
