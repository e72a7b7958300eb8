//! Console rendering of progress events and errors.

use std::io::{self, IsTerminal, Write};

use crossterm::style::{Stylize, style};
use diffharvest::progress::{ProgressEvent, ProgressSink};
use diffharvest::review::HarvestError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Plain,
    Highlight,
    Warning,
    Failure,
}

/// Progress sink that prints one line per event to stdout.
///
/// Lines are colored only when stdout is a terminal.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleProgressSink {
    colored: bool,
}

impl ConsoleProgressSink {
    /// Creates a sink writing to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self {
            colored: io::stdout().is_terminal(),
        }
    }
}

impl ProgressSink for ConsoleProgressSink {
    fn record(&self, event: ProgressEvent) {
        let line = render_event(&event, self.colored);
        if writeln!(io::stdout().lock(), "{line}").is_err() {
            tracing::debug!("stdout closed; progress line dropped");
        }
    }
}

/// Renders one progress event as a console line.
#[must_use]
pub fn render_event(event: &ProgressEvent, colored: bool) -> String {
    let (tone, text) = match event {
        ProgressEvent::TokenValidated {
            provider,
            identity: Some(identity),
        } => (
            Tone::Highlight,
            format!("[-] {provider} token successfully validated: {identity}"),
        ),
        ProgressEvent::TokenValidated {
            provider,
            identity: None,
        } => (
            Tone::Highlight,
            format!("[-] {provider} token successfully validated"),
        ),
        ProgressEvent::TokenCheckSkipped { provider } => (
            Tone::Warning,
            format!("[-] {provider} token verification skipped: no {provider} host given"),
        ),
        ProgressEvent::ReviewStarted { url } => (Tone::Highlight, format!("[-] {url}")),
        ProgressEvent::FileWritten { path } => (Tone::Plain, format!("  --> {path}")),
        ProgressEvent::ReviewFailed { url, message } => {
            (Tone::Failure, format!("[X] {url}: {message}"))
        }
        ProgressEvent::EpicSearchStarted { epic } => {
            (Tone::Warning, format!("[*] Fetching all Jira issues of {epic}..."))
        }
        ProgressEvent::EpicIssuesFound { epic, count } => {
            (Tone::Highlight, format!("[-] {epic} has {count} issues"))
        }
        ProgressEvent::BatchFinished { succeeded, failed } => (
            Tone::Plain,
            format!("[+] Completed: {succeeded} harvested, {failed} skipped"),
        ),
    };
    paint(text, tone, colored)
}

fn paint(text: String, tone: Tone, colored: bool) -> String {
    if !colored {
        return text;
    }
    match tone {
        Tone::Plain => text,
        Tone::Highlight => style(text).magenta().to_string(),
        Tone::Warning => style(text).yellow().to_string(),
        Tone::Failure => style(text).red().to_string(),
    }
}

/// Writes a fatal error to stderr.
///
/// # Errors
///
/// Returns the I/O error when stderr cannot be written.
pub fn write_error(error: &HarvestError) -> io::Result<()> {
    let mut stderr = io::stderr().lock();
    let colored = stderr.is_terminal();
    writeln!(
        stderr,
        "{}",
        paint(format!("[X] Error: {error}"), Tone::Failure, colored)
    )
}
