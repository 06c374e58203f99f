//! Server side of the stream: frames pushed onto a bounded channel whose
//! receiver becomes the HTTP response body.

use tokio::sync::mpsc;

use super::{ErrorFrame, FRAME_DELIMITER, TERMINAL_MARKER};
use crate::error::StreamError;
use crate::model::YearlyProgress;

/// Serialize one year followed by the frame delimiter.
pub fn encode_year_frame(progress: &YearlyProgress) -> Result<String, StreamError> {
    let mut frame = serde_json::to_string(progress)?;
    frame.push_str(FRAME_DELIMITER);
    Ok(frame)
}

/// Serialize the error frame. No delimiter follows it.
pub fn encode_error_frame(message: &str) -> String {
    let frame = ErrorFrame {
        error: message.to_string(),
    };
    let mut out = serde_json::to_string(&frame)
        .unwrap_or_else(|_| r#"{"error":"Simulation failed"}"#.to_string());
    out.push('\n');
    out
}

/// Write half of a simulation stream.
///
/// `finish` and `fail` consume the encoder; dropping it closes the sink, so
/// the receiver always observes end of stream once the run is over.
#[derive(Debug)]
pub struct StreamEncoder {
    tx: mpsc::Sender<String>,
    frames_written: usize,
}

impl StreamEncoder {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                tx,
                frames_written: 0,
            },
            rx,
        )
    }

    /// Number of year frames written so far.
    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    /// True once the receiving side has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub async fn write_year(&mut self, progress: &YearlyProgress) -> Result<(), StreamError> {
        let frame = encode_year_frame(progress)?;
        self.send(frame).await?;
        self.frames_written += 1;
        Ok(())
    }

    /// Write the terminal marker and close.
    pub async fn finish(self) -> Result<(), StreamError> {
        self.send(format!("{}\n", TERMINAL_MARKER)).await
    }

    /// Write the error frame and close.
    pub async fn fail(self, message: &str) -> Result<(), StreamError> {
        self.send(encode_error_frame(message)).await
    }

    async fn send(&self, chunk: String) -> Result<(), StreamError> {
        self.tx
            .send(chunk)
            .await
            .map_err(|_| StreamError::Disconnected)
    }
}
