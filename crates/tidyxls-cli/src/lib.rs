//! tidyxls CLI library
//!
//! Core logic of the `tidyxls` binary: read a formula book (or a single
//! formula), render it in the requested [`Mode`] and write the result.

pub mod error_adapter;

mod args;
mod config;

pub use args::{Args, Mode};

use std::{
    fs,
    io::{self, Write},
};

use log::{error, info};
use thiserror::Error;

use tidyxls::{Formula, FormulaBook, FormulaBuilder, TidyxlsError, graph::Layers};

/// Name given to a formula passed on the command line.
const LITERAL_NAME: &str = "formula";

/// Errors that end a CLI run.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Tidyxls(#[from] TidyxlsError),

    #[error("{failed} of {total} formula(s) failed to parse")]
    FormulasFailed { failed: usize, total: usize },
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        CliError::Tidyxls(err.into())
    }
}

/// Run the tidyxls CLI application
///
/// Every formula is parsed into a syntax tree first; formulas that fail are
/// reported and the run continues with the rest. The output is written
/// even when some formulas failed.
///
/// # Errors
///
/// Returns [`CliError::Tidyxls`] for I/O, configuration and dependency
/// cycle errors, and [`CliError::FormulasFailed`] if any formula failed.
pub fn run(args: &Args) -> Result<(), CliError> {
    info!(
        input = args.input,
        mode:? = args.mode,
        literal = args.formula;
        "Processing formulas"
    );

    let mut app_config = config::load_config(args.config.as_ref())?;
    config::apply_separator(&mut app_config, args.separator)?;
    let builder = FormulaBuilder::new(app_config);

    let book: FormulaBook = if args.formula {
        [builder.parse_named(LITERAL_NAME, &args.input)]
            .into_iter()
            .collect()
    } else {
        FormulaBook::from_path(&builder, &args.input)?
    };
    info!(formulas = book.len(); "Formulas loaded");

    let failed = report_failures(&book);
    let output = render(&book, args.mode, args.formula)?;

    match &args.output {
        Some(path) => {
            fs::write(path, &output)?;
            info!(output_file = path.as_str(); "Output written");
        }
        None => io::stdout().write_all(output.as_bytes())?,
    }

    if failed > 0 {
        return Err(CliError::FormulasFailed {
            failed,
            total: book.len(),
        });
    }
    Ok(())
}

/// Log a report for every formula of `book` that does not parse, returning
/// how many failed.
fn report_failures(book: &FormulaBook) -> usize {
    let mut failed = 0;
    for analysis in book.analyze() {
        if let Err(err) = &analysis.ast {
            failed += 1;
            let name = analysis.formula.name().unwrap_or_default();
            error!(name; "Formula failed\n{}", error_adapter::render_report(err));
        }
    }
    failed
}

fn render(book: &FormulaBook, mode: Mode, literal: bool) -> Result<String, CliError> {
    let output = match mode {
        Mode::Deps if literal => book
            .formulas()
            .iter()
            .flat_map(|formula| formula.dependencies())
            .map(|dep| format!("{dep}\n"))
            .collect(),
        Mode::Deps => book.dependency_report(),
        Mode::Order => render_layers(&book.evaluation_order()?),
        _ if literal => book
            .formulas()
            .iter()
            .map(|formula| format!("{}\n", render_formula(formula, mode)))
            .collect(),
        _ => book.report(|formula| render_formula(formula, mode)),
    };
    Ok(output)
}

/// Text of a single formula. Failed formulas render empty in the modes
/// that need a syntax tree.
fn render_formula(formula: &Formula, mode: Mode) -> String {
    match mode {
        Mode::Tidy => formula.render_tidy(),
        Mode::Flat => formula.render_flat(),
        Mode::Dump => formula.render_dump(),
        Mode::Rpn => formula.render_rpn().unwrap_or_default(),
        Mode::Tree => formula
            .ast()
            .map(|root| root.to_string())
            .unwrap_or_default(),
        Mode::Deps | Mode::Order => String::new(),
    }
}

/// One line per layer: the layer number, a tab and the names.
fn render_layers(layers: &Layers) -> String {
    layers
        .iter()
        .enumerate()
        .map(|(index, layer)| {
            let names: Vec<&str> = layer.iter().map(String::as_str).collect();
            format!("{}\t{}\n", index + 1, names.join(", "))
        })
        .collect()
}
