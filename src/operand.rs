//! Instruction operand parsing and sizing (§9 operand-sizing decision,
//! §8 S7).
//!
//! An instruction line is `opcode [operand1][, operand2]`. The opcode
//! itself always costs one word; operands cost additional words
//! according to [`extra_words`].

use crate::lexer::is_valid_label;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// `#n` — an immediate literal.
    Immediate(i32),
    /// `&label` — relative addressing via a label.
    Relative(String),
    /// `@rN` — a register-direct operand.
    Register(u8),
    /// A bare label — direct addressing.
    Direct(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperandSyntaxError {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedInstruction {
    pub opcode: String,
    pub operands: Vec<Operand>,
}

fn parse_operand(token: &str) -> Result<Operand, OperandSyntaxError> {
    let token = token.trim();
    if let Some(rest) = token.strip_prefix('#') {
        return rest
            .parse::<i32>()
            .map(Operand::Immediate)
            .map_err(|_| OperandSyntaxError {
                text: token.to_string(),
            });
    }
    if let Some(rest) = token.strip_prefix('&') {
        if is_valid_label(rest) {
            return Ok(Operand::Relative(rest.to_string()));
        }
        return Err(OperandSyntaxError {
            text: token.to_string(),
        });
    }
    if let Some(rest) = token.strip_prefix('@') {
        if let Some(digits) = rest.strip_prefix('r') {
            if let Ok(n) = digits.parse::<u8>() {
                return Ok(Operand::Register(n));
            }
        }
        return Err(OperandSyntaxError {
            text: token.to_string(),
        });
    }
    if is_valid_label(token) {
        return Ok(Operand::Direct(token.to_string()));
    }
    Err(OperandSyntaxError {
        text: token.to_string(),
    })
}

/// Splits `opcode [operand1][, operand2]` into its opcode token and
/// parsed operand list. An empty `args` string means an opcode with no
/// operands.
pub fn parse_instruction(line: &str) -> Result<ParsedInstruction, OperandSyntaxError> {
    let mut parts = line.splitn(2, char::is_whitespace);
    let opcode = parts
        .next()
        .ok_or_else(|| OperandSyntaxError {
            text: line.to_string(),
        })?
        .to_string();
    let rest = parts.next().unwrap_or("").trim();
    let operands = if rest.is_empty() {
        Vec::new()
    } else {
        rest.split(',')
            .map(parse_operand)
            .collect::<Result<Vec<_>, _>>()?
    };
    if operands.len() > 2 {
        return Err(OperandSyntaxError {
            text: line.to_string(),
        });
    }
    Ok(ParsedInstruction { opcode, operands })
}

/// Number of words beyond the opcode word: a shared word when both
/// operands are register-direct, otherwise one word per operand.
pub fn extra_words(operands: &[Operand]) -> usize {
    if operands.len() == 2
        && matches!(operands[0], Operand::Register(_))
        && matches!(operands[1], Operand::Register(_))
    {
        1
    } else {
        operands.len()
    }
}

/// Total word count for the instruction, opcode word included.
pub fn instruction_word_count(parsed: &ParsedInstruction) -> usize {
    1 + extra_words(&parsed.operands)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_registers_share_one_extra_word() {
        let parsed = parse_instruction("mov @r1, @r2").unwrap();
        assert_eq!(instruction_word_count(&parsed), 2);
    }

    #[test]
    fn immediate_costs_its_own_word() {
        let parsed = parse_instruction("mov #5").unwrap();
        assert_eq!(instruction_word_count(&parsed), 2);
    }

    #[test]
    fn no_operands_is_one_word() {
        let parsed = parse_instruction("stop").unwrap();
        assert_eq!(instruction_word_count(&parsed), 1);
    }

    #[test]
    fn register_and_immediate_costs_two_extra_words() {
        let parsed = parse_instruction("mov @r1, #5").unwrap();
        assert_eq!(instruction_word_count(&parsed), 3);
    }

    #[test]
    fn relative_operand_parses_label() {
        let parsed = parse_instruction("jmp &LOOP").unwrap();
        assert_eq!(parsed.operands, vec![Operand::Relative("LOOP".to_string())]);
    }

    #[test]
    fn direct_label_operand() {
        let parsed = parse_instruction("jmp X").unwrap();
        assert_eq!(parsed.operands, vec![Operand::Direct("X".to_string())]);
    }

    #[test]
    fn rejects_too_many_operands() {
        assert!(parse_instruction("mov @r1, @r2, @r3").is_err());
    }
}
