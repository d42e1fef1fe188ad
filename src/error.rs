//! Error and diagnostic classification types.
//!
//! Plain enums with hand-written `Display`/`Error` impls rather than a
//! derive-macro crate, since every variant here carries its own
//! irregular formatting rule.

use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::io;
use std::path::PathBuf;

/// The classification a single reported diagnostic falls into (§4.1, §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    File,
    Memory,
    Syntax,
    Range,
    Symbol,
    Directive,
    Macro,
    Instruction,
    General,
}

impl Display for DiagnosticKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        let name = match self {
            DiagnosticKind::File => "File",
            DiagnosticKind::Memory => "Memory",
            DiagnosticKind::Syntax => "Syntax",
            DiagnosticKind::Range => "Range",
            DiagnosticKind::Symbol => "Symbol",
            DiagnosticKind::Directive => "Directive",
            DiagnosticKind::Macro => "Macro",
            DiagnosticKind::Instruction => "Instruction",
            DiagnosticKind::General => "General",
        };
        f.write_str(name)
    }
}

/// A failure that aborts assembly of the current file outright.
///
/// Recoverable per-line problems go through the diagnostics sink
/// instead (see [`crate::diagnostics::Diagnostics`]); this type is for
/// failures that leave no sensible way to keep going (I/O errors, an
/// unterminated macro, the source exceeding a hard machine limit).
#[derive(Debug)]
pub enum AssemblerFailure {
    IoErrorOnInput {
        filename: PathBuf,
        error: io::Error,
    },
    IoErrorOnOutput {
        filename: PathBuf,
        error: io::Error,
    },
    MissingSourceSuffix {
        filename: PathBuf,
    },
    MacroPreprocessingFailed {
        filename: PathBuf,
    },
    TooManyErrors {
        filename: PathBuf,
        count: usize,
    },
}

impl Display for AssemblerFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            AssemblerFailure::IoErrorOnInput { filename, error } => {
                write!(f, "I/O error reading input file {}: {}", filename.display(), error)
            }
            AssemblerFailure::IoErrorOnOutput { filename, error } => {
                write!(f, "I/O error writing output file {}: {}", filename.display(), error)
            }
            AssemblerFailure::MissingSourceSuffix { filename } => {
                write!(f, "input file {} does not have the required .as suffix", filename.display())
            }
            AssemblerFailure::MacroPreprocessingFailed { filename } => {
                write!(f, "macro preprocessing of {} failed, aborting this file", filename.display())
            }
            AssemblerFailure::TooManyErrors { filename, count } => {
                write!(f, "{} produced {} error(s), no output was written", filename.display(), count)
            }
        }
    }
}

impl Error for AssemblerFailure {}
