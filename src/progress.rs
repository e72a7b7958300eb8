//! Progress events emitted while harvesting review units.
//!
//! The library never writes to the terminal itself. Drivers report what they
//! are doing through a [`ProgressSink`], which the CLI renders as colored
//! console lines and tests record for assertions.

use camino::Utf8PathBuf;

use crate::review::Provider;

/// A progress event emitted by the harvesting drivers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// A provider accepted the configured token.
    TokenValidated {
        /// Provider that accepted the token.
        provider: Provider,
        /// Account name reported by the provider, when available.
        identity: Option<String>,
    },
    /// Token verification was skipped because no host was configured.
    TokenCheckSkipped {
        /// Provider whose token was not verified.
        provider: Provider,
    },
    /// Processing of one review URL started.
    ReviewStarted {
        /// The URL as supplied by the user or found in Jira.
        url: String,
    },
    /// A file was written below the output root.
    FileWritten {
        /// Written path, including the output root.
        path: Utf8PathBuf,
    },
    /// A review URL could not be processed and was skipped.
    ReviewFailed {
        /// The URL that failed.
        url: String,
        /// Human-readable failure.
        message: String,
    },
    /// The issue search for a Jira epic is about to run.
    EpicSearchStarted {
        /// Epic key.
        epic: String,
    },
    /// The issues of a Jira epic were listed.
    EpicIssuesFound {
        /// Epic key.
        epic: String,
        /// Number of issues in the epic.
        count: usize,
    },
    /// A list of review URLs finished processing.
    BatchFinished {
        /// Review units harvested successfully.
        succeeded: usize,
        /// Review units skipped after a failure.
        failed: usize,
    },
}

/// A sink that can record progress events.
pub trait ProgressSink: Send + Sync {
    /// Records a progress event.
    fn record(&self, event: ProgressEvent);
}

/// Progress sink that drops all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgressSink;

impl ProgressSink for NoopProgressSink {
    fn record(&self, _event: ProgressEvent) {}
}

/// Progress sink that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingProgressSink {
    events: std::sync::Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgressSink {
    /// Removes and returns the recorded events.
    #[must_use]
    pub fn take(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .map(|mut events| events.drain(..).collect())
            .unwrap_or_default()
    }
}

impl ProgressSink for RecordingProgressSink {
    fn record(&self, event: ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
