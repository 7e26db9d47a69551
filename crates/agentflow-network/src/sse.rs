//! Incremental `text/event-stream` decoder.
//!
//! Bytes arrive in arbitrary chunks; lines may end in LF, CRLF or a bare CR
//! and a CRLF pair may straddle two chunks. A blank line dispatches the
//! frame built so far. Frames without any `data:` line are dropped.

use agentflow_protocol::DEFAULT_EVENT_TYPE;

use crate::error::StreamError;

/// Longest line accepted before the stream is failed.
pub const DEFAULT_MAX_LINE_BYTES: usize = 64 * 1024;

/// One dispatched server-sent event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseFrame {
    /// Value of the `event:` field, if the frame had one.
    pub event: Option<String>,
    /// `data:` lines joined with `\n`.
    pub data: String,
    /// Last event id seen on the stream (persists across frames).
    pub id: Option<String>,
    /// Reconnection hint in milliseconds. Reported, never acted on.
    pub retry: Option<u64>,
}

impl SseFrame {
    /// Event type used for dispatch; `message` when the frame names none.
    pub fn event_type(&self) -> &str {
        self.event.as_deref().unwrap_or(DEFAULT_EVENT_TYPE)
    }
}

#[derive(Debug)]
pub struct SseDecoder {
    max_line: usize,
    buffer: Vec<u8>,
    skip_lf: bool,
    seen_first_line: bool,
    event: Option<String>,
    data: String,
    has_data: bool,
    last_event_id: Option<String>,
    retry: Option<u64>,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::with_max_line_bytes(DEFAULT_MAX_LINE_BYTES)
    }
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line_bytes(max_line: usize) -> Self {
        Self {
            max_line,
            buffer: Vec::new(),
            skip_lf: false,
            seen_first_line: false,
            event: None,
            data: String::new(),
            has_data: false,
            last_event_id: None,
            retry: None,
        }
    }

    /// Feed a chunk of the response body and return every frame it completed.
    ///
    /// Fails once a single line grows past the configured limit, whether or
    /// not its terminator has arrived. Frames completed earlier in the same
    /// chunk are discarded with it.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<SseFrame>, StreamError> {
        self.buffer.extend_from_slice(chunk);
        let mut frames = Vec::new();
        let mut start = 0;

        loop {
            if self.skip_lf {
                match self.buffer.get(start) {
                    Some(b'\n') => {
                        start += 1;
                        self.skip_lf = false;
                    }
                    Some(_) => self.skip_lf = false,
                    None => break,
                }
            }

            let Some(offset) = self.buffer[start..]
                .iter()
                .position(|b| matches!(b, b'\n' | b'\r'))
            else {
                break;
            };
            let end = start + offset;
            if offset > self.max_line {
                return Err(self.line_too_long());
            }
            if self.buffer[end] == b'\r' {
                self.skip_lf = true;
            }

            let line = String::from_utf8_lossy(&self.buffer[start..end]).into_owned();
            start = end + 1;

            if let Some(frame) = self.process_line(&line) {
                frames.push(frame);
            }
        }

        self.buffer.drain(..start);
        if self.buffer.len() > self.max_line {
            return Err(self.line_too_long());
        }
        Ok(frames)
    }

    fn line_too_long(&mut self) -> StreamError {
        self.buffer.clear();
        StreamError::LineTooLong {
            limit: self.max_line,
        }
    }

    /// Bytes held back waiting for a line terminator.
    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }

    fn process_line(&mut self, line: &str) -> Option<SseFrame> {
        let line = if self.seen_first_line {
            line
        } else {
            self.seen_first_line = true;
            line.strip_prefix('\u{feff}').unwrap_or(line)
        };

        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => {
                if self.has_data {
                    self.data.push('\n');
                }
                self.data.push_str(value);
                self.has_data = true;
            }
            "id" => {
                if !value.contains('\0') {
                    self.last_event_id = Some(value.to_string());
                }
            }
            "retry" => {
                if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
                    self.retry = value.parse().ok();
                }
            }
            other => tracing::trace!(field = other, "ignoring unknown sse field"),
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = self.event.take();
        let retry = self.retry.take();
        if !self.has_data {
            return None;
        }
        self.has_data = false;
        Some(SseFrame {
            event,
            data: std::mem::take(&mut self.data),
            id: self.last_event_id.clone(),
            retry,
        })
    }
}
