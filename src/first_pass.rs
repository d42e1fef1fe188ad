//! First pass (§4.6).
//!
//! Walks the macro-expanded text once, populating the symbol table and
//! the data image, and sizing (not yet encoding) every instruction.

use tracing::{event, warn, Level};

use crate::diagnostics::Diagnostics;
use crate::error::DiagnosticKind;
use crate::lexer::{
    extract_arguments, extract_directive, extract_label, is_valid_label, parse_data_values,
    parse_string_value, remove_comment, ParseValuesError, MAX_LINE_LEN,
};
use crate::operand::{instruction_word_count, parse_instruction};
use crate::state::AssemblerState;
use crate::symbol::{SymbolKind, SymbolTable};
use crate::word::{Are, MachineWord};

pub struct FirstPassOutput {
    pub symbols: SymbolTable,
    pub state: AssemblerState,
}

/// Runs the first pass over `expanded_source`, reporting recoverable
/// diagnostics and continuing so multiple errors can surface in one
/// invocation (§7).
pub fn first_pass(expanded_source: &str, diagnostics: &mut Diagnostics) -> FirstPassOutput {
    let mut symbols = SymbolTable::new();
    let mut state = AssemblerState::new();

    for (line_no, raw_line) in expanded_source.lines().enumerate() {
        diagnostics.set_current_line((line_no + 1) as u32);

        if raw_line.len() > MAX_LINE_LEN {
            diagnostics.report(
                DiagnosticKind::Syntax,
                format!("line exceeds the maximum length of {MAX_LINE_LEN} bytes"),
            );
            continue;
        }

        let stripped = remove_comment(raw_line);
        let normalized = stripped.trim();
        if normalized.is_empty() {
            continue;
        }

        let chars: Vec<char> = normalized.chars().collect();
        let mut pos = 0usize;
        let label = extract_label(&chars, &mut pos);
        if let Some(label) = &label {
            if !is_valid_label(label) {
                diagnostics.report(
                    DiagnosticKind::Symbol,
                    format!("'{label}' is not a valid label (must be 1-31 alphanumeric/underscore characters, starting with a letter)"),
                );
            }
        }

        crate::lexer::skip_whitespace(&chars, &mut pos);
        let directive = extract_directive(&chars, &mut pos);

        match directive.as_deref() {
            Some(".data") => {
                let args = extract_arguments(&chars, &mut pos);
                handle_data(&args, &label, &mut symbols, &mut state, diagnostics);
            }
            Some(".string") => {
                let args = extract_arguments(&chars, &mut pos);
                handle_string(&args, &label, &mut symbols, &mut state, diagnostics);
            }
            Some(".extern") => {
                let args = extract_arguments(&chars, &mut pos);
                handle_extern(&args, &label, &mut symbols, diagnostics);
            }
            Some(".entry") => {
                // No action in the first pass (§4.6 step 6).
            }
            Some(other) => {
                diagnostics.report(
                    DiagnosticKind::Syntax,
                    format!("unknown directive '{other}'"),
                );
            }
            None => {
                handle_instruction(&chars, pos, &label, &mut symbols, &mut state, diagnostics);
            }
        }
    }

    let ic_plus_base = state.ic() + crate::state::BASE_ADDRESS;
    symbols.adjust_data_addresses(ic_plus_base);
    if let Err(e) = symbols.validate() {
        diagnostics.report(e.kind, e.message);
    }

    event!(
        Level::INFO,
        ic = state.ic(),
        dc = state.dc(),
        "first pass complete"
    );

    FirstPassOutput { symbols, state }
}

fn handle_data(
    args: &str,
    label: &Option<String>,
    symbols: &mut SymbolTable,
    state: &mut AssemblerState,
    diagnostics: &mut Diagnostics,
) {
    let values = match parse_data_values(args) {
        Ok(values) => values,
        Err(ParseValuesError::Range { text }) => {
            diagnostics.report(
                DiagnosticKind::Range,
                format!("value '{text}' is outside the representable range"),
            );
            return;
        }
        Err(ParseValuesError::Syntax { text }) => {
            diagnostics.report(
                DiagnosticKind::Syntax,
                format!("'{text}' is not a valid integer"),
            );
            return;
        }
    };

    if let Some(label) = label {
        if let Err(e) = symbols.add(label, state.dc(), SymbolKind::Data) {
            diagnostics.report(e.kind, format!("{}: {}", label, e.message));
        }
    }

    for value in values {
        state.push_data_word(MachineWord::new(value, Are::Absolute));
    }
}

fn handle_string(
    args: &str,
    label: &Option<String>,
    symbols: &mut SymbolTable,
    state: &mut AssemblerState,
    diagnostics: &mut Diagnostics,
) {
    let codes = match parse_string_value(args) {
        Ok(codes) => codes,
        Err(_) => {
            diagnostics.report(
                DiagnosticKind::Syntax,
                "'.string' argument must be a double-quoted string",
            );
            return;
        }
    };

    if let Some(label) = label {
        if let Err(e) = symbols.add(label, state.dc(), SymbolKind::Data) {
            diagnostics.report(e.kind, format!("{}: {}", label, e.message));
        }
    }

    for code in codes {
        state.push_data_word(MachineWord::new(code, Are::Absolute));
    }
}

fn handle_extern(
    args: &str,
    label: &Option<String>,
    symbols: &mut SymbolTable,
    diagnostics: &mut Diagnostics,
) {
    if label.is_some() {
        // Preserved source behavior (§9 open question): a label prefix
        // on an `.extern` line is parsed but discarded.
        warn!(label = label.as_deref().unwrap_or(""), "label on .extern line is ignored");
    }

    let name = args.trim();
    if !is_valid_label(name) {
        diagnostics.report(
            DiagnosticKind::Symbol,
            format!("'{name}' is not a valid extern symbol name"),
        );
        return;
    }
    if let Err(e) = symbols.add(name, 0, SymbolKind::Extern) {
        diagnostics.report(e.kind, format!("{}: {}", name, e.message));
    }
}

fn handle_instruction(
    chars: &[char],
    pos: usize,
    label: &Option<String>,
    symbols: &mut SymbolTable,
    state: &mut AssemblerState,
    diagnostics: &mut Diagnostics,
) {
    let rest: String = chars[pos..].iter().collect::<String>();
    let rest = rest.trim();

    if let Some(label) = label {
        let address = state.ic() + crate::state::BASE_ADDRESS;
        if let Err(e) = symbols.add(label, address, SymbolKind::Code) {
            diagnostics.report(e.kind, format!("{}: {}", label, e.message));
        }
    }

    match parse_instruction(rest) {
        Ok(parsed) => {
            let words = instruction_word_count(&parsed) as i32;
            event!(Level::DEBUG, opcode = %parsed.opcode, words, "sized instruction");
            state.reserve_instruction_words(words);
        }
        Err(e) => {
            diagnostics.report(
                DiagnosticKind::Instruction,
                format!("'{}' is not a valid instruction", e.text),
            );
        }
    }
}
