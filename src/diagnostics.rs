//! Diagnostics sink (§4.1).
//!
//! Collects classified error events tagged with the file/line that was
//! being processed when the problem was found. Threaded explicitly
//! through the driver and passes rather than kept as global mutable
//! state (§9 re-architecture note).

use std::fmt::Write as _;

use tracing::error;

use crate::error::DiagnosticKind;

/// One reported problem, already formatted for the user-facing stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub message: String,
}

impl Diagnostic {
    /// Renders as `[Error - <Kind>] in file "<name>" at line <N>: <message>`,
    /// with the file/line clauses suppressed when absent (§4.1).
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = write!(out, "[Error - {}]", self.kind);
        if let Some(file) = &self.file {
            let _ = write!(out, " in file \"{file}\"");
        }
        if let Some(line) = self.line {
            if line > 0 {
                let _ = write!(out, " at line {line}");
            }
        }
        let _ = write!(out, ": {}", self.message);
        out
    }
}

/// Accumulates diagnostics for one source file's compilation.
#[derive(Debug, Default)]
pub struct Diagnostics {
    current_file: Option<String>,
    current_line: Option<u32>,
    events: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_current_file(&mut self, file: impl Into<String>) {
        self.current_file = Some(file.into());
    }

    pub fn set_current_line(&mut self, line: u32) {
        self.current_line = Some(line);
    }

    /// Classifies and records one diagnostic, also emitting a matching
    /// `tracing` event (§10.1) so the structured log carries the same
    /// fact as the user-facing line.
    pub fn report(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        let diag = Diagnostic {
            kind,
            file: self.current_file.clone(),
            line: self.current_line,
            message,
        };
        error!(
            kind = %diag.kind,
            file = diag.file.as_deref().unwrap_or(""),
            line = diag.line.unwrap_or(0),
            "{}",
            diag.message
        );
        self.events.push(diag);
    }

    pub fn count(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.events.iter()
    }
}
