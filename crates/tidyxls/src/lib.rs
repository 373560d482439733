//! tidyxls - Tokenize, pretty-print and analyze Excel-style formulas.
//!
//! Formulas are lexed and normalized by [`tidyxls_parser`]; this crate adds
//! the text renderings, dependency extraction, dependency ordering across a
//! [`FormulaBook`] and the configuration that drives them.

pub mod book;
pub mod config;
pub mod graph;
pub mod render;

mod error;

pub use tidyxls_parser::{self as parser, Diagnostic, Node, RpnItem, Token, TokenStream};

pub use book::FormulaBook;
pub use error::TidyxlsError;

use indexmap::IndexSet;
use log::{debug, trace};

use config::{AppConfig, FormatConfig};

/// Builder for tokenizing and analyzing formulas.
///
/// # Examples
///
/// ```rust
/// use tidyxls::{FormulaBuilder, config::AppConfig};
///
/// let builder = FormulaBuilder::new(AppConfig::default());
/// let formula = builder.parse("=IF(A1>0,\"Y\",\"N\")");
///
/// assert_eq!(formula.render_flat(), "IF(A1>0,\"Y\",\"N\")");
/// assert_eq!(formula.dependencies().len(), 1);
/// assert!(formula.ast().is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct FormulaBuilder {
    config: AppConfig,
}

impl FormulaBuilder {
    /// Create a new formula builder with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Tokenize a formula.
    ///
    /// Lexing never fails, so every input yields a [`Formula`]; structural
    /// errors surface from [`Formula::rpn`] and [`Formula::ast`].
    pub fn parse(&self, source: &str) -> Formula {
        self.build(None, source)
    }

    /// Tokenize a formula that has a name, such as a book entry. The name is
    /// attached to any error the formula reports.
    pub fn parse_named(&self, name: &str, source: &str) -> Formula {
        self.build(Some(name.to_string()), source)
    }

    /// Tokenize every entry of a formula book.
    pub fn parse_book(&self, text: &str) -> FormulaBook {
        FormulaBook::parse(self, text)
    }

    fn build(&self, name: Option<String>, source: &str) -> Formula {
        let tokens = tidyxls_parser::tokenize(source);
        debug!(name:?, tokens = tokens.len(); "Formula tokenized");
        trace!(tokens:?; "Normalized tokens");

        Formula {
            name,
            source: source.to_string(),
            tokens,
            format: self.config.format().clone(),
        }
    }
}

/// A tokenized formula.
#[derive(Debug, Clone)]
pub struct Formula {
    name: Option<String>,
    source: String,
    tokens: TokenStream,
    format: FormatConfig,
}

impl Formula {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The normalized token stream.
    pub fn tokens(&self) -> &TokenStream {
        &self.tokens
    }

    fn parse_error(&self, err: Diagnostic) -> TidyxlsError {
        TidyxlsError::new_parse_error(err, self.name(), self.source.as_str())
    }

    /// The postfix sequence.
    ///
    /// # Errors
    ///
    /// Returns [`TidyxlsError::Parse`] if parentheses are unbalanced or an
    /// operator is unknown.
    pub fn rpn(&self) -> Result<Vec<RpnItem>, TidyxlsError> {
        parser::rpn::to_rpn(&self.tokens).map_err(|err| self.parse_error(err))
    }

    /// The syntax tree.
    ///
    /// # Errors
    ///
    /// Returns [`TidyxlsError::Parse`] if the formula is structurally
    /// invalid.
    pub fn ast(&self) -> Result<Node, TidyxlsError> {
        let rpn = self.rpn()?;
        parser::ast::build_ast(rpn).map_err(|err| self.parse_error(err))
    }

    /// The postfix sequence as space separated symbols.
    ///
    /// # Errors
    ///
    /// See [`Formula::rpn`].
    pub fn render_rpn(&self) -> Result<String, TidyxlsError> {
        let symbols: Vec<String> = self
            .rpn()?
            .iter()
            .map(|item| item.symbol().to_string())
            .collect();
        Ok(symbols.join(" "))
    }

    pub fn render_flat(&self) -> String {
        render::render_flat(&self.tokens)
    }

    pub fn render_dump(&self) -> String {
        render::render_dump(&self.tokens)
    }

    pub fn render_tidy(&self) -> String {
        let items = render::rebuild(&self.tokens, self.format.separator());
        render::render_tidy(&items, &self.format)
    }

    /// Distinct references in order of first use.
    pub fn dependencies(&self) -> IndexSet<String> {
        graph::dependencies(&self.tokens)
    }
}
