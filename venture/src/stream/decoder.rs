//! Client side of the stream.
//!
//! Chunk boundaries are arbitrary: a chunk may end in the middle of a JSON
//! document, of the delimiter, or of a multi-byte character. Raw bytes are
//! buffered and only complete segments are converted to text.

use super::{ErrorFrame, FRAME_DELIMITER, TERMINAL_MARKER};
use crate::model::YearlyProgress;

const ERROR_MARKER: &str = "\"error\"";

#[derive(Debug, Clone, PartialEq)]
pub enum DecodeEvent {
    /// A complete year arrived.
    Year(YearlyProgress),
    /// The terminal marker arrived; the run finished normally.
    Completed,
    /// The server reported a failure through an error frame.
    ServerError(String),
    /// A segment could not be decoded. Decoding continues.
    Malformed { segment: String, reason: String },
}

#[derive(Debug, Default)]
pub struct StreamDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// True after the terminal marker or an error frame; later input is ignored.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed one chunk and return the events it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<DecodeEvent> {
        let mut events = Vec::new();
        if self.done {
            return events;
        }
        self.buffer.extend_from_slice(chunk);

        let delimiter = FRAME_DELIMITER.as_bytes();
        while let Some(pos) = find_subslice(&self.buffer, delimiter) {
            let drained: Vec<u8> = self.buffer.drain(..pos + delimiter.len()).collect();
            self.process_segment(&drained[..pos], &mut events);
            if self.done {
                self.buffer.clear();
                return events;
            }
        }

        // The terminal marker and the error frame are never followed by a
        // delimiter; recognise them as soon as their line is complete.
        if self.buffer.ends_with(b"\n") {
            let tail = String::from_utf8_lossy(&self.buffer);
            let tail = tail.trim();
            if tail == TERMINAL_MARKER || serde_json::from_str::<ErrorFrame>(tail).is_ok() {
                let segment = std::mem::take(&mut self.buffer);
                self.process_segment(&segment, &mut events);
            }
        }
        events
    }

    /// Signal end of input and flush whatever remains buffered.
    pub fn finish(&mut self) -> Vec<DecodeEvent> {
        let mut events = Vec::new();
        if self.done {
            return events;
        }
        let segment = std::mem::take(&mut self.buffer);
        self.process_segment(&segment, &mut events);
        self.done = true;
        events
    }

    fn process_segment(&mut self, raw: &[u8], events: &mut Vec<DecodeEvent>) {
        let text = String::from_utf8_lossy(raw);
        let segment = text.trim();
        if segment.is_empty() {
            return;
        }
        if segment == TERMINAL_MARKER {
            self.done = true;
            events.push(DecodeEvent::Completed);
            return;
        }

        match serde_json::from_str::<YearlyProgress>(segment) {
            Ok(progress) => events.push(DecodeEvent::Year(progress)),
            Err(parse_err) => {
                if segment.contains(ERROR_MARKER) {
                    match serde_json::from_str::<ErrorFrame>(segment) {
                        Ok(frame) => {
                            self.done = true;
                            events.push(DecodeEvent::ServerError(frame.error));
                        }
                        Err(e) => events.push(DecodeEvent::Malformed {
                            segment: segment.to_string(),
                            reason: format!("unreadable error frame: {}", e),
                        }),
                    }
                } else {
                    events.push(DecodeEvent::Malformed {
                        segment: segment.to_string(),
                        reason: parse_err.to_string(),
                    });
                }
            }
        }
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    const YEAR_1: &str = r#"{"year":1,"metrics":{"feasibility":60,"desirability":70,"viability":55},"analysis":{"milestones":["Pilot"],"challenges":[],"recommendations":[],"revenue":1000.0,"marketShare":0.1,"customerBase":4}}"#;
    const YEAR_2: &str = r#"{"year":2,"metrics":{"feasibility":62,"desirability":71,"viability":58},"analysis":{"milestones":["Café partners"],"challenges":[],"recommendations":[],"revenue":5000.0,"marketShare":0.3,"customerBase":20}}"#;

    fn years(events: &[DecodeEvent]) -> Vec<u8> {
        events
            .iter()
            .filter_map(|e| match e {
                DecodeEvent::Year(p) => Some(p.year),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_whole_stream_in_one_chunk() {
        let body = format!("{}\n---\n{}\n---\nEND\n", YEAR_1, YEAR_2);
        let mut decoder = StreamDecoder::new();
        let events = decoder.push(body.as_bytes());
        assert_eq!(years(&events), vec![1, 2]);
        assert_eq!(events.last(), Some(&DecodeEvent::Completed));
        assert!(decoder.is_done());
        assert!(decoder.push(YEAR_1.as_bytes()).is_empty());
    }

    #[test]
    fn test_split_inside_delimiter_and_multibyte_char() {
        let body = format!("{}\n---\n{}\n---\nEND\n", YEAR_1, YEAR_2);
        let bytes = body.as_bytes();
        let cafe = body.find("Caf").unwrap() + 4; // inside the two-byte 'é'
        let delim = body.find("\n---\n").unwrap() + 2;

        let mut decoder = StreamDecoder::new();
        let mut events = decoder.push(&bytes[..delim]);
        assert!(events.is_empty());
        events.extend(decoder.push(&bytes[delim..cafe]));
        events.extend(decoder.push(&bytes[cafe..]));

        assert_eq!(years(&events), vec![1, 2]);
        match &events[1] {
            DecodeEvent::Year(p) => assert_eq!(p.analysis.milestones[0], "Café partners"),
            other => panic!("expected year 2, got {:?}", other),
        }
        assert_eq!(events.last(), Some(&DecodeEvent::Completed));
    }

    #[test]
    fn test_error_frame_without_delimiter() {
        let body = format!("{}\n---\n{{\"error\":\"No content received\"}}\n", YEAR_1);
        let mut decoder = StreamDecoder::new();
        let events = decoder.push(body.as_bytes());
        assert_eq!(
            events,
            vec![
                DecodeEvent::Year(serde_json::from_str(YEAR_1).unwrap()),
                DecodeEvent::ServerError("No content received".to_string()),
            ]
        );
        assert!(decoder.finish().is_empty());
    }

    #[test]
    fn test_error_frame_flushed_on_finish() {
        let mut decoder = StreamDecoder::new();
        assert!(decoder.push(br#"{"error":"boom"}"#).is_empty());
        assert_eq!(
            decoder.finish(),
            vec![DecodeEvent::ServerError("boom".to_string())]
        );
    }

    #[test]
    fn test_malformed_segment_does_not_stop_decoding() {
        let body = format!("{{\"year\":1,\"metr\n---\n{}\n---\nEND\n", YEAR_2);
        let mut decoder = StreamDecoder::new();
        let events = decoder.push(body.as_bytes());
        assert!(matches!(events[0], DecodeEvent::Malformed { .. }));
        assert_eq!(years(&events), vec![2]);
        assert_eq!(events.last(), Some(&DecodeEvent::Completed));
    }

    #[test]
    fn test_truncated_stream_reports_malformed_tail() {
        let mut decoder = StreamDecoder::new();
        assert!(decoder.push(&YEAR_1.as_bytes()[..40]).is_empty());
        let events = decoder.finish();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], DecodeEvent::Malformed { .. }));
    }
}
