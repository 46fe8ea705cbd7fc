//! Rendering of the append-only chat transcript.
//!
//! The controller only ever talks to a [`Renderer`] so the same chat
//! flow can drive a terminal, or an in-memory sink in tests.
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use super::models::ChatLine;

pub trait Renderer: Send + Sync {
    /// Adds `"<sender>: <text>"` to the end of the log and scrolls to
    /// it. `text` is always treated as plain text.
    fn append(&self, sender: &str, text: &str);
}

pub type BoxedRenderer = Arc<dyn Renderer + 'static>;

#[derive(Default)]
struct Log {
    lines: Vec<ChatLine>,
    // Index of the line the viewport is scrolled to
    scrolled_to: Option<usize>,
}

/// Keeps the transcript in memory. Clones share the same log.
#[derive(Clone, Default)]
pub struct MemoryTranscript(Arc<Mutex<Log>>);

impl MemoryTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<ChatLine> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .lines
            .clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn last(&self) -> Option<ChatLine> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .lines
            .last()
            .cloned()
    }

    pub fn scrolled_to(&self) -> Option<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .scrolled_to
    }

    /// Lines formatted the way they are displayed.
    pub fn rendered(&self) -> Vec<String> {
        self.lines().iter().map(ChatLine::to_string).collect()
    }
}

impl Renderer for MemoryTranscript {
    fn append(&self, sender: &str, text: &str) {
        let mut log = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        log.lines.push(ChatLine::new(sender, text));
        log.scrolled_to = Some(log.lines.len() - 1);
    }
}

/// Writes each line to a terminal (stdout by default) and flushes so
/// the newest line is always on screen.
pub struct TerminalRenderer<W: Write + Send = io::Stdout> {
    out: Mutex<W>,
}

impl TerminalRenderer {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> Renderer for TerminalRenderer<W> {
    fn append(&self, sender: &str, text: &str) {
        let line = format!("{}: {}", plain_text(sender), plain_text(text));
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(out, "{}", line).and_then(|_| out.flush()) {
            tracing::warn!("Failed to write transcript line: {}", e);
        }
    }
}

/// Escapes control characters so message content can't drive the
/// terminal (colors, cursor movement, clearing the screen, ...).
pub fn plain_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_control() && c != '\n' && c != '\t' {
            out.extend(c.escape_unicode());
        } else {
            out.push(c);
        }
    }
    out
}
