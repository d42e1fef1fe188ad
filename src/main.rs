//! Command-line entry point (§6 CLI surface, §10.4).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use wordasm::{assemble_file, AssemblerConfig};

/// Two-pass assembler for a 24-bit word-oriented instruction set.
#[derive(Debug, Parser)]
#[command(name = "wordasm", version, about)]
struct Cli {
    /// Source files to assemble, each bearing the `.as` suffix.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Directory to write the .am/.ob/.ent/.ext artifacts into
    /// (defaults to alongside each source file).
    #[arg(short = 'o', long = "out-dir")]
    out_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = AssemblerConfig {
        output_dir: cli.out_dir,
        ..AssemblerConfig::default()
    };

    let mut any_failed = false;
    for file in &cli.files {
        match assemble_file(file, &config) {
            Ok(diagnostics) => {
                for diagnostic in diagnostics.iter() {
                    eprintln!("{}", diagnostic.render());
                }
                if diagnostics.is_empty() {
                    println!("{}: assembled successfully", file.display());
                } else {
                    println!(
                        "{}: failed with {} error(s)",
                        file.display(),
                        diagnostics.count()
                    );
                    any_failed = true;
                }
            }
            Err(failure) => {
                error!(file = %file.display(), "{failure}");
                eprintln!("{}: {failure}", file.display());
                any_failed = true;
            }
        }
    }

    if any_failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
