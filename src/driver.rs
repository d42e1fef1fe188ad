//! Orchestrates preprocessor → first pass → second pass → emitter for
//! one source file (§2, §5).
//!
//! Split into a pure in-memory function that does the work, and a thin
//! I/O wrapper around it that owns file handles for the duration of
//! one file's compilation.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{event, span, Level};

use crate::diagnostics::Diagnostics;
use crate::emitter;
use crate::error::AssemblerFailure;
use crate::first_pass::first_pass;
use crate::macros::preprocess;
use crate::second_pass::second_pass;
use crate::state::AssemblerConfig;

/// In-memory result of assembling one file's source text: the expanded
/// listing plus everything the emitter needs.
pub struct AssembledProgram {
    pub expanded_source: String,
    pub symbols: crate::symbol::SymbolTable,
    pub state: crate::state::AssemblerState,
    pub externs: Vec<crate::second_pass::ExternReference>,
}

/// Runs the full pipeline over `source` in memory, reporting
/// diagnostics as it goes. Returns `None` if any stage failed badly
/// enough that there is no usable program (empty macro-preprocessor
/// failure, or the error count is nonzero at the end).
pub fn assemble_source(
    source: &str,
    diagnostics: &mut Diagnostics,
) -> Option<AssembledProgram> {
    let span = span!(Level::INFO, "assemble");
    let _enter = span.enter();

    let (expanded_source, _macro_table) = preprocess(source, diagnostics)?;

    let first = first_pass(&expanded_source, diagnostics);
    let mut symbols = first.symbols;
    let mut state = first.state;

    let second = second_pass(&expanded_source, &mut symbols, &mut state, diagnostics);

    if !diagnostics.is_empty() {
        return None;
    }

    Some(AssembledProgram {
        expanded_source,
        symbols,
        state,
        externs: second.externs,
    })
}

fn sibling_with_suffix(input_path: &Path, suffix: &str, output_dir: Option<&Path>) -> PathBuf {
    let stem = input_path.file_stem().unwrap_or_default();
    let mut name = PathBuf::from(stem);
    name.set_extension(suffix);
    match output_dir {
        Some(dir) => dir.join(name),
        None => match input_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.join(name),
            _ => name,
        },
    }
}

/// Reads `input_path`, assembles it, and writes the four output
/// artifacts alongside it (or into `config.output_dir`). Returns the
/// final diagnostics so the caller can decide the process exit code.
pub fn assemble_file(
    input_path: &Path,
    config: &AssemblerConfig,
) -> Result<Diagnostics, AssemblerFailure> {
    if input_path.extension().and_then(|e| e.to_str()) != Some("as") {
        return Err(AssemblerFailure::MissingSourceSuffix {
            filename: input_path.to_path_buf(),
        });
    }

    let mut diagnostics = Diagnostics::new();
    diagnostics.set_current_file(input_path.display().to_string());

    let source = fs::read_to_string(input_path).map_err(|error| AssemblerFailure::IoErrorOnInput {
        filename: input_path.to_path_buf(),
        error,
    })?;

    event!(Level::INFO, file = %input_path.display(), "assembling file");

    match assemble_source(&source, &mut diagnostics) {
        Some(program) => {
            write_outputs(input_path, config, &program)?;
            event!(
                Level::INFO,
                file = %input_path.display(),
                "assembly succeeded"
            );
            Ok(diagnostics)
        }
        None => {
            event!(
                Level::WARN,
                file = %input_path.display(),
                errors = diagnostics.count(),
                "assembly failed, no output written"
            );
            Ok(diagnostics)
        }
    }
}

fn write_outputs(
    input_path: &Path,
    config: &AssemblerConfig,
    program: &AssembledProgram,
) -> Result<(), AssemblerFailure> {
    let output_dir = config.output_dir.as_deref();

    let am_path = sibling_with_suffix(input_path, "am", output_dir);
    fs::write(&am_path, &program.expanded_source).map_err(|error| {
        AssemblerFailure::IoErrorOnOutput {
            filename: am_path.clone(),
            error,
        }
    })?;

    let ob_path = sibling_with_suffix(input_path, "ob", output_dir);
    let mut ob_buf = Vec::new();
    emitter::write_object(&program.state, &mut ob_buf).expect("writing to a Vec cannot fail");
    fs::write(&ob_path, &ob_buf).map_err(|error| AssemblerFailure::IoErrorOnOutput {
        filename: ob_path.clone(),
        error,
    })?;

    let ent_path = sibling_with_suffix(input_path, "ent", output_dir);
    let mut ent_buf = Vec::new();
    emitter::write_entries(&program.symbols, &mut ent_buf).expect("writing to a Vec cannot fail");
    fs::write(&ent_path, &ent_buf).map_err(|error| AssemblerFailure::IoErrorOnOutput {
        filename: ent_path.clone(),
        error,
    })?;

    let ext_path = sibling_with_suffix(input_path, "ext", output_dir);
    let mut ext_buf = Vec::new();
    emitter::write_externs(&program.externs, &mut ext_buf).expect("writing to a Vec cannot fail");
    fs::write(&ext_path, &ext_buf).map_err(|error| AssemblerFailure::IoErrorOnOutput {
        filename: ext_path.clone(),
        error,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembles_valid_program_with_no_diagnostics() {
        let mut diagnostics = Diagnostics::new();
        let source = "LEN: .data 7, -3, 42\nSTR: .string \"ab\"\nSTART: mov @r1, @r2\n.entry START\n";
        let program = assemble_source(source, &mut diagnostics).expect("should assemble");
        assert!(diagnostics.is_empty());
        assert_eq!(program.state.dc(), 6);
        assert_eq!(program.state.ic(), 2);
    }

    #[test]
    fn returns_none_when_errors_present() {
        let mut diagnostics = Diagnostics::new();
        let source = ".data 1048576\n";
        let result = assemble_source(source, &mut diagnostics);
        assert!(result.is_none());
        assert!(!diagnostics.is_empty());
    }

    #[test]
    fn assemble_file_end_to_end_writes_four_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("prog.as");
        fs::write(&input_path, "LEN: .data 7, -3, 42\n.entry LEN\n").unwrap();

        let config = AssemblerConfig::default();
        let diagnostics = assemble_file(&input_path, &config).expect("should not fail");
        assert!(diagnostics.is_empty());

        for suffix in ["am", "ob", "ent", "ext"] {
            let path = dir.path().join(format!("prog.{suffix}"));
            assert!(path.exists(), "{suffix} artifact should exist");
        }

        let ent_contents = fs::read_to_string(dir.path().join("prog.ent")).unwrap();
        assert_eq!(ent_contents, "LEN 0100\n");
    }

    #[test]
    fn assemble_file_rejects_wrong_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let input_path = dir.path().join("prog.txt");
        fs::write(&input_path, "NOP\n").unwrap();
        let config = AssemblerConfig::default();
        let err = assemble_file(&input_path, &config).unwrap_err();
        assert!(matches!(err, AssemblerFailure::MissingSourceSuffix { .. }));
    }
}
