//! Text-delimited streaming protocol between the gateway and its clients.
//!
//! ```text
//! <JSON YearlyProgress>\n---\n<JSON YearlyProgress>\n---\n...END\n
//! ```
//!
//! A failed run ends with a single `{"error": "<message>"}\n` frame and no
//! terminal marker.

pub mod accumulator;
pub mod decoder;
pub mod encoder;

pub use accumulator::ResultAccumulator;
pub use decoder::{DecodeEvent, StreamDecoder};
pub use encoder::{encode_error_frame, encode_year_frame, StreamEncoder};

use serde::{Deserialize, Serialize};

/// Separates two frames.
pub const FRAME_DELIMITER: &str = "\n---\n";

/// Signals normal end of stream.
pub const TERMINAL_MARKER: &str = "END";

/// Payload of the error frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorFrame {
    pub error: String,
}
