//! Second pass (§4.7, §9 operand-sizing decision, §8 S7).
//!
//! Re-reads the macro-expanded text with the symbol table populated by
//! the first pass, finalizes the code image, and records each
//! reference to an external symbol at its use-site.

use tracing::{event, Level};

use crate::diagnostics::Diagnostics;
use crate::error::DiagnosticKind;
use crate::lexer::{extract_directive, extract_label, remove_comment, skip_whitespace};
use crate::operand::{parse_instruction, Operand};
use crate::state::{AssemblerState, BASE_ADDRESS};
use crate::symbol::{SymbolKind, SymbolTable};
use crate::word::{Are, MachineWord};

/// One use-site of an external symbol: its name and the absolute
/// address of the word that references it (§4.8 `.ext`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternReference {
    pub name: String,
    pub address: i32,
}

pub struct SecondPassOutput {
    pub externs: Vec<ExternReference>,
}

pub fn second_pass(
    expanded_source: &str,
    symbols: &mut SymbolTable,
    state: &mut AssemblerState,
    diagnostics: &mut Diagnostics,
) -> SecondPassOutput {
    let mut externs = Vec::new();

    for (line_no, raw_line) in expanded_source.lines().enumerate() {
        diagnostics.set_current_line((line_no + 1) as u32);

        let stripped = remove_comment(raw_line);
        let normalized = stripped.trim();
        if normalized.is_empty() {
            continue;
        }

        let chars: Vec<char> = normalized.chars().collect();
        let mut pos = 0usize;
        let _label = extract_label(&chars, &mut pos);
        skip_whitespace(&chars, &mut pos);
        let directive = extract_directive(&chars, &mut pos);

        match directive.as_deref() {
            Some(".entry") => {
                let arg: String = chars[pos..].iter().collect::<String>().trim().to_string();
                if let Err(e) = symbols.mark_entry(&arg) {
                    diagnostics.report(e.kind, format!("{}: {}", arg, e.message));
                }
            }
            Some(".data") | Some(".string") | Some(".extern") => {
                // Fully resolved during the first pass (§4.7).
            }
            Some(_other) => {
                // Already reported as an unknown directive in the first pass.
            }
            None => {
                let rest: String = chars[pos..].iter().collect::<String>().trim().to_string();
                encode_instruction(&rest, symbols, state, diagnostics, &mut externs);
            }
        }
    }

    event!(
        Level::INFO,
        code_words = state.code_image().len(),
        externs = externs.len(),
        "second pass complete"
    );

    SecondPassOutput { externs }
}

fn encode_instruction(
    rest: &str,
    symbols: &SymbolTable,
    state: &mut AssemblerState,
    diagnostics: &mut Diagnostics,
    externs: &mut Vec<ExternReference>,
) {
    let parsed = match parse_instruction(rest) {
        Ok(parsed) => parsed,
        Err(_) => {
            // Already reported as an instruction error in the first pass.
            return;
        }
    };

    // Opcode word: no opcode-to-number table is specified, so the
    // placeholder content carries no information beyond ARE.
    state.push_code_word(MachineWord::new(0, Are::Absolute));

    if parsed.operands.len() == 2
        && matches!(parsed.operands[0], Operand::Register(_))
        && matches!(parsed.operands[1], Operand::Register(_))
    {
        let (Operand::Register(r1), Operand::Register(r2)) =
            (&parsed.operands[0], &parsed.operands[1])
        else {
            unreachable!()
        };
        let content = ((*r1 as i32) << 3) | (*r2 as i32);
        state.push_code_word(MachineWord::new(content, Are::Absolute));
        return;
    }

    for operand in &parsed.operands {
        encode_operand(operand, symbols, state, diagnostics, externs);
    }
}

fn encode_operand(
    operand: &Operand,
    symbols: &SymbolTable,
    state: &mut AssemblerState,
    diagnostics: &mut Diagnostics,
    externs: &mut Vec<ExternReference>,
) {
    let address = BASE_ADDRESS + state.code_image().len() as i32;
    match operand {
        Operand::Register(r) => {
            state.push_code_word(MachineWord::new(*r as i32, Are::Absolute));
        }
        Operand::Immediate(v) => {
            state.push_code_word(MachineWord::new(*v, Are::Absolute));
        }
        Operand::Relative(name) | Operand::Direct(name) => match symbols.lookup(name) {
            Some(symbol) if symbol.kind() == SymbolKind::Extern => {
                state.push_code_word(MachineWord::new(0, Are::External));
                externs.push(ExternReference {
                    name: name.clone(),
                    address,
                });
            }
            Some(symbol) => {
                state.push_code_word(MachineWord::new(symbol.value(), Are::Relocatable));
            }
            None => {
                diagnostics.report(
                    DiagnosticKind::Symbol,
                    format!("'{name}' is not defined"),
                );
                state.push_code_word(MachineWord::new(0, Are::Absolute));
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::first_pass::first_pass;

    #[test]
    fn s3_entry_of_extern_rejected() {
        let mut diagnostics = Diagnostics::new();
        let source = ".extern X\n.entry X\n";
        let first = first_pass(source, &mut diagnostics);
        assert!(diagnostics.is_empty());
        let mut symbols = first.symbols;
        let mut state = first.state;
        second_pass(source, &mut symbols, &mut state, &mut diagnostics);
        assert_eq!(diagnostics.count(), 1);
        assert_eq!(diagnostics.iter().next().unwrap().kind, DiagnosticKind::Symbol);
    }

    #[test]
    fn entry_of_defined_code_symbol_succeeds() {
        let mut diagnostics = Diagnostics::new();
        let source = "START: stop\n.entry START\n";
        let first = first_pass(source, &mut diagnostics);
        let mut symbols = first.symbols;
        let mut state = first.state;
        second_pass(source, &mut symbols, &mut state, &mut diagnostics);
        assert!(diagnostics.is_empty());
        assert!(symbols.lookup("START").unwrap().is_entry());
    }

    #[test]
    fn extern_reference_recorded_at_use_site() {
        let mut diagnostics = Diagnostics::new();
        let source = ".extern X\njmp X\n";
        let first = first_pass(source, &mut diagnostics);
        let mut symbols = first.symbols;
        let mut state = first.state;
        let output = second_pass(source, &mut symbols, &mut state, &mut diagnostics);
        assert!(diagnostics.is_empty());
        assert_eq!(output.externs.len(), 1);
        assert_eq!(output.externs[0].name, "X");
        assert_eq!(output.externs[0].address, 101);
    }

    #[test]
    fn register_pair_shares_one_word() {
        let mut diagnostics = Diagnostics::new();
        let source = "mov @r1, @r2\n";
        let first = first_pass(source, &mut diagnostics);
        let mut symbols = first.symbols;
        let mut state = first.state;
        second_pass(source, &mut symbols, &mut state, &mut diagnostics);
        assert_eq!(state.code_image().len(), 2);
    }

    #[test]
    fn immediate_operand_encodes_value() {
        let mut diagnostics = Diagnostics::new();
        let source = "mov #5\n";
        let first = first_pass(source, &mut diagnostics);
        let mut symbols = first.symbols;
        let mut state = first.state;
        second_pass(source, &mut symbols, &mut state, &mut diagnostics);
        assert_eq!(state.code_image()[1].content(), 5);
        assert_eq!(state.code_image()[1].are(), Are::Absolute);
    }
}
