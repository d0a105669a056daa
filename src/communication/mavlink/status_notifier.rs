//! MAVLink STATUSTEXT Notification Queue
//!
//! Operator-visible notices ("New HOME received", rejected mode changes) are
//! queued here and drained into STATUSTEXT messages by the router.
//!
//! # Architecture
//!
//! - **Owned queue**: One notifier per router, no global state
//! - **Heapless**: Fixed-capacity queue (16 messages), oldest dropped when full
//! - **Severity API**: One method per severity level
//! - **MAVLink v2 Chunking**: Messages up to 200 characters split into 50-byte chunks

use heapless::{Deque, String, Vec};
use mavlink::ardupilotmega::{MavSeverity, STATUSTEXT_DATA};

/// Maximum message length (200 characters)
const MAX_MESSAGE_LEN: usize = 200;

/// Queue capacity (16 messages)
const QUEUE_CAPACITY: usize = 16;

/// Chunk size for MAVLink STATUSTEXT messages (50 bytes)
const CHUNK_SIZE: usize = 50;

/// Maximum number of chunks per message (200 / 50 = 4)
const MAX_CHUNKS: usize = 4;

/// STATUSTEXT payload on the wire (severity, text, id, chunk_seq)
pub const STATUSTEXT_PAYLOAD_LEN: usize = 54;

/// Maximum STATUSTEXT messages returned by one drain
pub const MAX_PENDING_CHUNKS: usize = 8;

/// Queued STATUSTEXT message with severity and text
#[derive(Debug)]
struct QueuedMessage {
    severity: MavSeverity,
    text: String<MAX_MESSAGE_LEN>,
}

/// Queue of pending STATUSTEXT messages
#[derive(Debug)]
pub struct StatusNotifier {
    queue: Deque<QueuedMessage, QUEUE_CAPACITY>,
    next_chunk_id: u16,
    dropped_count: u32,
}

impl Default for StatusNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusNotifier {
    /// Create an empty notifier
    pub const fn new() -> Self {
        Self {
            queue: Deque::new(),
            next_chunk_id: 1, // 0 is reserved for non-chunked messages
            dropped_count: 0,
        }
    }

    /// Number of queued messages
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether no messages are queued
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Messages dropped because the queue was full
    pub fn dropped_count(&self) -> u32 {
        self.dropped_count
    }

    /// Enqueue a message with the given severity and text
    ///
    /// If the queue is full, the oldest message is dropped. Text longer than
    /// 200 bytes is truncated at a character boundary.
    pub fn enqueue(&mut self, severity: MavSeverity, text: &str) {
        let text = if text.len() > MAX_MESSAGE_LEN {
            crate::log_warn!(
                "STATUSTEXT truncated to {} chars (was {} chars)",
                MAX_MESSAGE_LEN,
                text.len()
            );
            let mut end = MAX_MESSAGE_LEN;
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            &text[..end]
        } else {
            text
        };

        if self.queue.is_full() {
            self.queue.pop_front();
            self.dropped_count += 1;
            crate::log_warn!(
                "STATUSTEXT queue full, dropped {} messages",
                self.dropped_count
            );
        }

        let message = QueuedMessage {
            severity,
            text: String::try_from(text).unwrap_or_default(),
        };
        // Space was made above
        let _ = self.queue.push_back(message);
    }

    /// Send an ERROR severity message
    pub fn send_error(&mut self, text: &str) {
        self.enqueue(MavSeverity::MAV_SEVERITY_ERROR, text);
    }

    /// Send a WARNING severity message
    pub fn send_warning(&mut self, text: &str) {
        self.enqueue(MavSeverity::MAV_SEVERITY_WARNING, text);
    }

    /// Send a NOTICE severity message
    pub fn send_notice(&mut self, text: &str) {
        self.enqueue(MavSeverity::MAV_SEVERITY_NOTICE, text);
    }

    /// Send an INFORMATIONAL severity message
    pub fn send_info(&mut self, text: &str) {
        self.enqueue(MavSeverity::MAV_SEVERITY_INFO, text);
    }

    /// Drain queued messages into STATUSTEXT chunks
    ///
    /// A message whose chunks no longer fit stays queued for the next call.
    pub fn take_pending(&mut self) -> Vec<STATUSTEXT_DATA, MAX_PENDING_CHUNKS> {
        self.take_up_to(MAX_PENDING_CHUNKS)
    }

    /// Drain at most `max_chunks` STATUSTEXT chunks
    ///
    /// Messages are never split across calls.
    pub fn take_up_to(&mut self, max_chunks: usize) -> Vec<STATUSTEXT_DATA, MAX_PENDING_CHUNKS> {
        let mut result = Vec::new();
        let limit = max_chunks.min(MAX_PENDING_CHUNKS);

        while let Some(front) = self.queue.front() {
            let needed = chunk_count(front.text.len());
            if result.len() + needed > limit {
                break;
            }
            let Some(msg) = self.queue.pop_front() else {
                break;
            };
            for chunk in self.chunk_message(msg.severity, msg.text.as_str()) {
                let _ = result.push(chunk);
            }
        }

        result
    }

    /// Chunk a message into STATUSTEXT_DATA messages
    ///
    /// Messages of 50 bytes or less produce a single message with id=0.
    /// Longer messages share a non-zero id with sequential chunk_seq.
    fn chunk_message(
        &mut self,
        severity: MavSeverity,
        text: &str,
    ) -> Vec<STATUSTEXT_DATA, MAX_CHUNKS> {
        let bytes = text.as_bytes();
        let len = bytes.len().min(MAX_MESSAGE_LEN);
        let mut chunks = Vec::new();

        if len <= CHUNK_SIZE {
            let mut text_bytes = [0u8; CHUNK_SIZE];
            text_bytes[..len].copy_from_slice(&bytes[..len]);
            let _ = chunks.push(STATUSTEXT_DATA {
                severity,
                text: text_bytes.into(),
                id: 0,
                chunk_seq: 0,
            });
            return chunks;
        }

        let chunk_id = self.next_chunk_id;
        self.next_chunk_id = match self.next_chunk_id.wrapping_add(1) {
            0 => 1,
            id => id,
        };

        for (seq, part) in bytes[..len].chunks(CHUNK_SIZE).enumerate() {
            let mut text_bytes = [0u8; CHUNK_SIZE];
            text_bytes[..part.len()].copy_from_slice(part);
            let _ = chunks.push(STATUSTEXT_DATA {
                severity,
                text: text_bytes.into(),
                id: chunk_id,
                chunk_seq: seq as u8,
            });
        }

        chunks
    }
}

fn chunk_count(len: usize) -> usize {
    if len <= CHUNK_SIZE {
        1
    } else {
        len.div_ceil(CHUNK_SIZE)
    }
}
