use std::sync::LazyLock;

use clap::Parser;
use mojibake_bus::Encoding;

/// Encodings undone when none are given: Shift-JIS shown as code page 437.
const DEFAULT_ENCODINGS: [Encoding; 2] = [Encoding::Cp437, Encoding::Cp932];

/// Repair text that was decoded with the wrong character set.
#[derive(Parser, Debug)]
#[command(name = "mojibake", version)]
struct Cli {
    /// Encoding to undo, in the order it was misapplied. Repeat for a chain
    /// (cp437, cp932, cp936). Defaults to `-e cp437 -e cp932`.
    #[arg(short, long = "encoding", value_name = "NAME")]
    encodings: Vec<Encoding>,

    /// Flush after every input line instead of once at end of input.
    #[arg(long)]
    flush_lines: bool,

    /// Enable verbose (debug-level) logging.
    #[arg(short, long)]
    verbose: bool,

    /// Strings to decode. Standard input is decoded when none are given.
    texts: Vec<String>,
}

pub struct DecodeConfig {
    encodings: Vec<Encoding>,
    flush_lines: bool,
    verbose: bool,
    texts: Vec<String>,
}

impl DecodeConfig {
    fn from_cli(cli: Cli) -> Self {
        let encodings = if cli.encodings.is_empty() {
            DEFAULT_ENCODINGS.to_vec()
        } else {
            cli.encodings
        };
        Self {
            encodings,
            flush_lines: cli.flush_lines,
            verbose: cli.verbose,
            texts: cli.texts,
        }
    }

    pub fn encodings(&self) -> &[Encoding] {
        &self.encodings
    }

    pub fn flush_lines(&self) -> bool {
        self.flush_lines
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn texts(&self) -> &[String] {
        &self.texts
    }
}

pub fn config() -> &'static DecodeConfig {
    static CONFIG: LazyLock<DecodeConfig> = LazyLock::new(|| DecodeConfig::from_cli(Cli::parse()));
    &CONFIG
}
