//! Lexical helpers (§4.2): whitespace skipping, label/directive/operand
//! extraction, numeric and label validation, comment stripping.
//!
//! These operate on byte/char positions directly rather than through a
//! parser-combinator grammar: the dialect is a flat, line-oriented
//! format with cursor-position contracts, so that's the shape
//! implemented here.

pub const MIN_CONTENT: i32 = -(1 << 20);
pub const MAX_CONTENT: i32 = (1 << 20) - 1;
pub const MAX_LABEL_LEN: usize = 31;
pub const MAX_LINE_LEN: usize = 80;

/// Advances `pos` past any run of spaces and tabs.
pub fn skip_whitespace(chars: &[char], pos: &mut usize) {
    while *pos < chars.len() && (chars[*pos] == ' ' || chars[*pos] == '\t') {
        *pos += 1;
    }
}

/// Extracts a leading `label:` if present, advancing `pos` past the
/// colon on success. Restores `pos` and returns `None` if the leading
/// identifier isn't followed by `:`, or if the line doesn't start with
/// an alphabetic character.
pub fn extract_label(chars: &[char], pos: &mut usize) -> Option<String> {
    let start = *pos;
    if start >= chars.len() || !chars[start].is_ascii_alphabetic() {
        return None;
    }
    let mut p = start;
    while p < chars.len() && (chars[p].is_ascii_alphanumeric() || chars[p] == '_') {
        p += 1;
    }
    if p < chars.len() && chars[p] == ':' {
        let label: String = chars[start..p].iter().collect();
        *pos = p + 1;
        Some(label)
    } else {
        *pos = start;
        None
    }
}

/// Extracts a leading `.directive` token (consumed up to whitespace or
/// end of line), if the next non-whitespace character is `.`.
pub fn extract_directive(chars: &[char], pos: &mut usize) -> Option<String> {
    if *pos >= chars.len() || chars[*pos] != '.' {
        return None;
    }
    let start = *pos;
    let mut p = start;
    while p < chars.len() && !chars[p].is_whitespace() {
        p += 1;
    }
    *pos = p;
    Some(chars[start..p].iter().collect())
}

/// Consumes the remainder of the line as the directive/instruction
/// argument text.
pub fn extract_arguments(chars: &[char], pos: &mut usize) -> String {
    let start = *pos;
    *pos = chars.len();
    chars[start..].iter().collect::<String>().trim().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseValuesError {
    Range { text: String },
    Syntax { text: String },
}

/// Parses a comma-separated list of optionally signed decimal integers,
/// each bounded to `[MIN_CONTENT, MAX_CONTENT]` (§4.2).
pub fn parse_data_values(args: &str) -> Result<Vec<i32>, ParseValuesError> {
    if args.trim().is_empty() {
        return Err(ParseValuesError::Syntax {
            text: args.to_string(),
        });
    }
    let mut values = Vec::new();
    for token in args.split(',') {
        let token = token.trim();
        if token.is_empty() {
            return Err(ParseValuesError::Syntax {
                text: token.to_string(),
            });
        }
        let value: i32 = token.parse().map_err(|_| ParseValuesError::Syntax {
            text: token.to_string(),
        })?;
        if !(MIN_CONTENT..=MAX_CONTENT).contains(&value) {
            return Err(ParseValuesError::Range {
                text: token.to_string(),
            });
        }
        values.push(value);
    }
    Ok(values)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringSyntaxError;

/// Parses a quoted string argument into byte codes, appending a
/// trailing null terminator. No escape processing (§4.2).
pub fn parse_string_value(args: &str) -> Result<Vec<i32>, StringSyntaxError> {
    let trimmed = args.trim();
    if trimmed.len() < 2 || !trimmed.starts_with('"') || !trimmed.ends_with('"') {
        return Err(StringSyntaxError);
    }
    let interior = &trimmed[1..trimmed.len() - 1];
    let mut codes: Vec<i32> = interior.bytes().map(|b| b as i32).collect();
    codes.push(0);
    Ok(codes)
}

/// First character alphabetic, remaining alphanumeric/underscore,
/// length in `1..=31` (§4.2).
pub fn is_valid_label(name: &str) -> bool {
    if name.is_empty() || name.len() > MAX_LABEL_LEN {
        return false;
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Truncates a line at its first `;`, dropping the comment (§4.2).
pub fn remove_comment(line: &str) -> &str {
    match line.find(';') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

/// Trims leading/trailing whitespace; when `collapse` is set, also
/// collapses any interior whitespace run to a single space (§4.2).
pub fn normalize_string(line: &str, collapse: bool) -> String {
    let trimmed = line.trim();
    if !collapse {
        return trimmed.to_string();
    }
    let mut out = String::with_capacity(trimmed.len());
    let mut in_space = false;
    for ch in trimmed.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push(' ');
                in_space = true;
            }
        } else {
            out.push(ch);
            in_space = false;
        }
    }
    out
}
