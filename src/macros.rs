//! Macro table and preprocessor (§4.5).
//!
//! The preprocessor is a small explicit state machine (defining vs.
//! not) rather than a boolean flag, so invalid states (e.g. "defining
//! and also not defining") aren't representable.

use tracing::{event, warn, Level};

use crate::diagnostics::Diagnostics;
use crate::error::DiagnosticKind;
use crate::lexer::{is_valid_label, normalize_string};

pub const MAX_MACROS: usize = 100;
pub const MAX_MACRO_LINES: usize = 100;

const RESERVED: &[&str] = &["mcro", "endmcro"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Macro {
    name: String,
    lines: Vec<String>,
}

impl Macro {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

/// Mapping from macro name to body, valid only during preprocessing
/// (§4.5, §9: not consulted by the passes afterward).
#[derive(Debug, Default)]
pub struct MacroTable {
    macros: Vec<Macro>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn find(&self, name: &str) -> Option<&Macro> {
        self.macros.iter().find(|m| m.name == name)
    }

    fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    fn len(&self) -> usize {
        self.macros.len()
    }
}

#[derive(Debug, PartialEq, Eq)]
enum PreprocessorState {
    Idle,
    Defining { name: String, lines: Vec<String> },
}

/// Runs the macro preprocessor over `source`, returning the expanded
/// text and the (now-exhausted) macro table. Aborts on the first
/// failure: macros must be fully defined to interpret the remainder
/// (§7, §4.5).
pub fn preprocess(source: &str, diagnostics: &mut Diagnostics) -> Option<(String, MacroTable)> {
    let mut table = MacroTable::new();
    let mut state = PreprocessorState::Idle;
    let mut output = String::new();

    for (line_no, raw_line) in source.lines().enumerate() {
        diagnostics.set_current_line((line_no + 1) as u32);
        let normalized = normalize_string(raw_line, true);

        if let Some(rest) = normalized.strip_prefix("mcro") {
            if matches!(state, PreprocessorState::Defining { .. }) {
                diagnostics.report(
                    DiagnosticKind::Syntax,
                    "nested macro definition is not supported",
                );
                return None;
            }
            let name = rest.trim();
            if name.is_empty() || !is_valid_label(name) {
                diagnostics.report(
                    DiagnosticKind::Macro,
                    format!("'{name}' is not a valid macro name"),
                );
                return None;
            }
            if RESERVED.contains(&name) || table.contains(name) {
                diagnostics.report(
                    DiagnosticKind::Macro,
                    format!("macro '{name}' is already defined or reserved"),
                );
                return None;
            }
            if table.len() >= MAX_MACROS {
                diagnostics.report(DiagnosticKind::Macro, "too many macro definitions");
                return None;
            }
            event!(Level::DEBUG, macro_name = %name, "entering macro definition");
            state = PreprocessorState::Defining {
                name: name.to_string(),
                lines: Vec::new(),
            };
            continue;
        }

        if normalized.starts_with("endmcro") {
            match state {
                PreprocessorState::Defining { name, lines } => {
                    table.macros.push(Macro { name, lines });
                    state = PreprocessorState::Idle;
                }
                PreprocessorState::Idle => {
                    diagnostics.report(
                        DiagnosticKind::Syntax,
                        "endmcro without a matching mcro",
                    );
                    return None;
                }
            }
            continue;
        }

        match &mut state {
            PreprocessorState::Defining { lines, .. } => {
                if lines.len() >= MAX_MACRO_LINES {
                    diagnostics.report(DiagnosticKind::Macro, "macro body is too long");
                    return None;
                }
                lines.push(normalized);
            }
            PreprocessorState::Idle => {
                if let Some(found) = table.find(&normalized) {
                    for body_line in found.lines() {
                        output.push_str(body_line);
                        output.push('\n');
                    }
                } else {
                    output.push_str(raw_line);
                    output.push('\n');
                }
            }
        }
    }

    if matches!(state, PreprocessorState::Defining { .. }) {
        diagnostics.report(DiagnosticKind::Syntax, "unterminated macro definition");
        return None;
    }

    if !table.macros.is_empty() {
        warn!(count = table.macros.len(), "macro table discarded after preprocessing");
    }

    Some((output, table))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_macro_invocation_twice() {
        let source = "mcro GREET\nmov r1, r2\nadd r3, r4\nendmcro\nGREET\nGREET\n";
        let mut diagnostics = Diagnostics::new();
        let (expanded, _) = preprocess(source, &mut diagnostics).unwrap();
        assert!(diagnostics.is_empty());
        assert_eq!(
            expanded,
            "mov r1, r2\nadd r3, r4\nmov r1, r2\nadd r3, r4\n"
        );
        assert!(!expanded.contains("mcro"));
        assert!(!expanded.contains("endmcro"));
    }

    #[test]
    fn passes_through_unrelated_lines_unchanged() {
        let source = "LEN: .data 1, 2\n";
        let mut diagnostics = Diagnostics::new();
        let (expanded, _) = preprocess(source, &mut diagnostics).unwrap();
        assert_eq!(expanded, source);
    }

    #[test]
    fn rejects_nested_macro_definition() {
        let source = "mcro A\nmcro B\nendmcro\nendmcro\n";
        let mut diagnostics = Diagnostics::new();
        assert!(preprocess(source, &mut diagnostics).is_none());
        assert_eq!(diagnostics.count(), 1);
    }

    #[test]
    fn rejects_unterminated_macro() {
        let source = "mcro A\nmov r1, r2\n";
        let mut diagnostics = Diagnostics::new();
        assert!(preprocess(source, &mut diagnostics).is_none());
        assert_eq!(diagnostics.count(), 1);
    }

    #[test]
    fn rejects_endmcro_without_mcro() {
        let source = "endmcro\n";
        let mut diagnostics = Diagnostics::new();
        assert!(preprocess(source, &mut diagnostics).is_none());
    }
}
