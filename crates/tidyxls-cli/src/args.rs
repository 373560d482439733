//! Command-line arguments of the `tidyxls` binary.

use clap::{Parser, ValueEnum};

/// What to print for each formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Multi-line layout with structuring functions indented
    Tidy,
    /// Single line, whitespace removed
    Flat,
    /// One token per line with kind and subtype
    Dump,
    /// Postfix sequence
    Rpn,
    /// Syntax tree as an s-expression
    Tree,
    /// References read by each formula
    Deps,
    /// Layers in which the formulas of a book can be evaluated
    Order,
}

/// Command-line arguments for the tidyxls formula tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[arg(help = "Formula book to process, or a formula with --formula")]
    pub input: String,

    /// Path to the output file; standard output if omitted
    #[arg(short, long)]
    pub output: Option<String>,

    /// Output mode
    #[arg(short, long, value_enum, default_value_t = Mode::Tidy)]
    pub mode: Mode,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Argument separator used by the tidy layout (`,` or `;`)
    #[arg(long)]
    pub separator: Option<char>,

    /// Treat INPUT as a formula instead of a file path
    #[arg(long)]
    pub formula: bool,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
