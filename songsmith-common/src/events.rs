//! Event types for the Songsmith event system
//!
//! Provides the shared [`SongEvent`] definitions and the broadcast [`EventBus`]
//! that feeds the SSE endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Song pipeline events
///
/// Events are broadcast via [`EventBus`] and serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SongEvent {
    /// A new song request entered the pipeline
    SongSessionStarted {
        session_id: Uuid,
        genre: String,
        instrumental: bool,
        timestamp: DateTime<Utc>,
    },

    /// Lyrics were generated and cleaned
    LyricsGenerated {
        session_id: Uuid,
        /// Cleaned lyrics (shown in the UI preview)
        lyrics: String,
        /// Style text used for both generation calls
        style_text: String,
        timestamp: DateTime<Utc>,
    },

    /// The remote service accepted the creation request
    JobSubmitted {
        session_id: Uuid,
        job_id: String,
        timestamp: DateTime<Utc>,
    },

    /// Polling progress (emitted once per status query)
    JobProgress {
        session_id: Uuid,
        job_id: String,
        /// Last status string reported by the provider (uppercased)
        api_status: Option<String>,
        /// Cosmetic progress estimate (0-100)
        percentage: u8,
        /// Localized phase label
        phase: String,
        elapsed_seconds: u64,
        timestamp: DateTime<Utc>,
    },

    /// The song finished and is ready for download
    SongCompleted {
        session_id: Uuid,
        job_id: String,
        title: Option<String>,
        audio_url: String,
        audio_filename: String,
        lyrics_filename: String,
        timestamp: DateTime<Utc>,
    },

    /// The pipeline aborted with a user-visible error
    SongFailed {
        session_id: Uuid,
        /// Stable error code (e.g., "TIMEOUT_EXCEEDED")
        error_code: String,
        /// Localized message
        message: String,
        /// Direct link to the audio asset when only the download failed
        direct_link: Option<String>,
        timestamp: DateTime<Utc>,
    },

    /// The user cancelled the in-flight request
    SongCancelled {
        session_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// Stored song data was cleared
    SessionCleared { timestamp: DateTime<Utc> },
}

impl SongEvent {
    /// Event type name used as the SSE `event:` field
    pub fn event_type(&self) -> &str {
        match self {
            SongEvent::SongSessionStarted { .. } => "SongSessionStarted",
            SongEvent::LyricsGenerated { .. } => "LyricsGenerated",
            SongEvent::JobSubmitted { .. } => "JobSubmitted",
            SongEvent::JobProgress { .. } => "JobProgress",
            SongEvent::SongCompleted { .. } => "SongCompleted",
            SongEvent::SongFailed { .. } => "SongFailed",
            SongEvent::SongCancelled { .. } => "SongCancelled",
            SongEvent::SessionCleared { .. } => "SessionCleared",
        }
    }
}

/// Broadcast bus for [`SongEvent`]s
///
/// Cloning is cheap; all clones share one channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SongEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// Slow subscribers lose the oldest events once `capacity` is exceeded.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<SongEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: SongEvent) -> Result<usize, broadcast::error::SendError<SongEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: SongEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = SongEvent::JobSubmitted {
            session_id: Uuid::new_v4(),
            job_id: "abc".to_string(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "JobSubmitted");
        assert_eq!(json["job_id"], "abc");
        assert_eq!(event.event_type(), "JobSubmitted");
    }

    #[tokio::test]
    async fn test_subscriber_receives_emitted_event() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        bus.emit(SongEvent::SessionCleared { timestamp: Utc::now() })
            .unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.event_type(), "SessionCleared");
    }

    #[test]
    fn test_emit_without_subscribers() {
        let bus = EventBus::new(10);
        assert!(bus
            .emit(SongEvent::SessionCleared { timestamp: Utc::now() })
            .is_err());
        // Lossy variant never fails
        bus.emit_lossy(SongEvent::SessionCleared { timestamp: Utc::now() });
        assert_eq!(bus.capacity(), 10);
    }
}
