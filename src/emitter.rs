//! Emitter (§4.8): writes the object, entry, and external artifacts.

use std::io::{self, Write};

use crate::second_pass::ExternReference;
use crate::state::{AssemblerState, BASE_ADDRESS};
use crate::symbol::SymbolTable;

/// Writes the `.ob` object listing: a header line `<IC> <DC>`, then one
/// `%04d %06X` line per code word, followed by the data words at
/// addresses continuing after the code block.
pub fn write_object<W: Write>(state: &AssemblerState, out: &mut W) -> io::Result<()> {
    writeln!(out, "{} {}", state.ic(), state.dc())?;
    let mut address = BASE_ADDRESS;
    for word in state.code_image() {
        writeln!(out, "{:04} {:06X}", address, word.packed() & 0xFF_FFFF)?;
        address += 1;
    }
    for word in state.data_image() {
        writeln!(out, "{:04} {:06X}", address, word.packed() & 0xFF_FFFF)?;
        address += 1;
    }
    Ok(())
}

/// Writes the `.ent` entry listing: one `<name> %04d` line per symbol
/// whose entry-flag is set, in symbol-table iteration order.
pub fn write_entries<W: Write>(symbols: &SymbolTable, out: &mut W) -> io::Result<()> {
    for symbol in symbols.entries() {
        writeln!(out, "{} {:04}", symbol.name(), symbol.value())?;
    }
    Ok(())
}

/// Writes the `.ext` external-reference listing: one `<name> %04d`
/// line per recorded use-site, in reference order.
pub fn write_externs<W: Write>(externs: &[ExternReference], out: &mut W) -> io::Result<()> {
    for reference in externs {
        writeln!(out, "{} {:04}", reference.name, reference.address)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::word::{Are, MachineWord};

    #[test]
    fn object_header_and_s1_scenario_lines() {
        let mut state = AssemblerState::new();
        state.push_data_word(MachineWord::new(7, Are::Absolute));
        state.push_data_word(MachineWord::new(-3, Are::Absolute));
        state.push_data_word(MachineWord::new(42, Are::Absolute));

        let mut buf = Vec::new();
        write_object(&state, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("0 3"));
        assert_eq!(lines.next(), Some("0100 00003C"));
        assert_eq!(lines.next(), Some("0101 FFFFEC"));
        assert_eq!(lines.next(), Some("0102 000154"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn entries_only_include_entry_flagged_symbols() {
        let mut symbols = SymbolTable::new();
        symbols.add("A", 100, crate::symbol::SymbolKind::Code).unwrap();
        symbols.add("B", 101, crate::symbol::SymbolKind::Code).unwrap();
        symbols.mark_entry("A").unwrap();

        let mut buf = Vec::new();
        write_entries(&symbols, &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "A 0100\n");
    }

    #[test]
    fn externs_are_written_in_reference_order() {
        let externs = vec![
            ExternReference {
                name: "X".to_string(),
                address: 101,
            },
            ExternReference {
                name: "Y".to_string(),
                address: 103,
            },
        ];
        let mut buf = Vec::new();
        write_externs(&externs, &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "X 0101\nY 0103\n");
    }
}
