//! Formula books: collections of named formulas.
//!
//! A book is plain text made of blocks:
//!
//! ```text
//! >>>	OrderDateCheck
//! =IF(AND(OrderY=_CurY,
//!     OrderM=_CurM),1,0)
//! <<<
//! ```
//!
//! The header line is `>>>`, a tab and the formula name. Body lines are
//! trimmed and concatenated. Text outside a block is ignored.

use std::{fs, path::Path};

use indexmap::{IndexMap, IndexSet};
use log::{debug, warn};
use winnow::{
    Parser as _,
    combinator::{alt, preceded, terminated},
    error::ModalResult,
    token::{rest, take_till},
};

use tidyxls_parser::Node;

use crate::{
    Formula, FormulaBuilder, TidyxlsError,
    graph::{Layers, topological_layers},
};

/// A formula read from a book, before parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookEntry {
    pub name: String,
    pub formula: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line<'a> {
    Begin(&'a str),
    End,
    Body(&'a str),
}

fn begin<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    preceded((">>>", '\t'), terminated(take_till(0.., '\t'), rest)).parse_next(input)
}

fn line<'a>(input: &mut &'a str) -> ModalResult<Line<'a>> {
    alt((
        begin.map(Line::Begin),
        preceded("<<<", rest).value(Line::End),
        rest.map(Line::Body),
    ))
    .parse_next(input)
}

fn classify(text: &str) -> Line<'_> {
    let trimmed = text.trim_matches([' ', '\t', '\r', '\n']);
    line.parse(trimmed).unwrap_or(Line::Body(trimmed))
}

/// Read the entries of a formula book.
///
/// Blocks without a name and blocks that are never terminated are skipped
/// with a warning.
pub fn read_entries(text: &str) -> Vec<BookEntry> {
    let mut entries = Vec::new();
    let mut open: Option<(usize, BookEntry)> = None;

    for (index, raw) in text.lines().enumerate() {
        let line_number = index + 1;
        match classify(raw) {
            Line::Begin(name) => {
                if let Some((start, entry)) = open.take() {
                    warn!(line = start, name = entry.name; "Unterminated formula block skipped");
                }
                let entry = BookEntry {
                    name: name.to_string(),
                    formula: String::new(),
                };
                open = Some((line_number, entry));
            }
            Line::End => match open.take() {
                Some((_, entry)) if !entry.name.is_empty() => entries.push(entry),
                Some((start, _)) => warn!(line = start; "Formula block without a name skipped"),
                None => warn!(line = line_number; "Block terminator outside of a block ignored"),
            },
            Line::Body(body) => {
                if let Some((_, entry)) = open.as_mut() {
                    entry.formula.push_str(body);
                }
            }
        }
    }

    if let Some((start, entry)) = open {
        warn!(line = start, name = entry.name; "Unterminated formula block skipped");
    }

    debug!(formulas = entries.len(); "Read formula book");
    entries
}

/// The reference a dependency names in a book: structured references to a
/// column of the current row (`[@Name]`) refer to the formula `Name`.
fn reference_name(dependency: &str) -> &str {
    dependency
        .strip_prefix("[@")
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(dependency)
}

/// Result of fully parsing one formula of a book.
#[derive(Debug)]
pub struct Analysis<'a> {
    pub formula: &'a Formula,
    pub ast: Result<Node, TidyxlsError>,
}

/// An ordered collection of named, tokenized formulas.
#[derive(Debug, Clone)]
pub struct FormulaBook {
    formulas: Vec<Formula>,
}

impl FormulaBook {
    /// Tokenize every entry of `text` with `builder`.
    pub fn parse(builder: &FormulaBuilder, text: &str) -> Self {
        let formulas = read_entries(text)
            .into_iter()
            .map(|entry| builder.parse_named(&entry.name, &entry.formula))
            .collect();
        Self { formulas }
    }

    /// Read and tokenize the book at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`TidyxlsError::Io`] if the file cannot be read.
    pub fn from_path(builder: &FormulaBuilder, path: impl AsRef<Path>) -> Result<Self, TidyxlsError> {
        let text = fs::read_to_string(path)?;
        Ok(Self::parse(builder, &text))
    }

    pub fn formulas(&self) -> &[Formula] {
        &self.formulas
    }

    pub fn len(&self) -> usize {
        self.formulas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formulas.is_empty()
    }

    /// Build the syntax tree of every formula. A failing formula does not
    /// affect the others.
    pub fn analyze(&self) -> Vec<Analysis<'_>> {
        self.formulas
            .iter()
            .map(|formula| Analysis {
                formula,
                ast: formula.ast(),
            })
            .collect()
    }

    /// Formula name to the names it references.
    pub fn dependency_map(&self) -> IndexMap<String, IndexSet<String>> {
        self.formulas
            .iter()
            .map(|formula| {
                let deps = formula
                    .dependencies()
                    .iter()
                    .map(|dep| reference_name(dep).to_string())
                    .filter(|dep| !dep.is_empty())
                    .collect();
                (formula.name().unwrap_or_default().to_string(), deps)
            })
            .collect()
    }

    /// Layers in which the formulas can be evaluated.
    ///
    /// # Errors
    ///
    /// Returns [`TidyxlsError::Cycle`] if formulas depend on each other.
    pub fn evaluation_order(&self) -> Result<Layers, TidyxlsError> {
        Ok(topological_layers(&self.dependency_map())?)
    }

    /// Tidy text of every formula under a ruled header.
    pub fn tidy_report(&self) -> String {
        self.report(Formula::render_tidy)
    }

    /// `render` applied to every formula, each under a ruled header naming
    /// the formula.
    pub fn report<F>(&self, render: F) -> String
    where
        F: Fn(&Formula) -> String,
    {
        let rule = "-".repeat(100);
        let mut report = String::new();

        for formula in &self.formulas {
            for line in [
                rule.as_str(),
                &format!("----- {}", formula.name().unwrap_or_default()),
                &rule,
                &render(formula),
                &rule,
                "",
            ] {
                report.push_str(line);
                report.push('\n');
            }
        }
        report
    }

    /// The references of every formula, one per line.
    pub fn dependency_report(&self) -> String {
        let mut report = String::new();

        for formula in &self.formulas {
            report.push_str(&format!("'{}':\t{{\n", formula.name().unwrap_or_default()));
            for dep in formula.dependencies().iter().filter(|dep| !dep.is_empty()) {
                report.push_str(&format!("\t{dep}\n"));
            }
            report.push_str("}\n");
        }
        report
    }
}

impl FromIterator<Formula> for FormulaBook {
    fn from_iter<T: IntoIterator<Item = Formula>>(iter: T) -> Self {
        Self {
            formulas: iter.into_iter().collect(),
        }
    }
}
