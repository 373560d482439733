//! Lexer and precedence parser for Excel-style spreadsheet formulas.
//!
//! The pipeline runs in stages, each a pure function over owned data:
//!
//! 1. [`lexer::lex`] scans formula text into a flat [`TokenStream`]. It never
//!    fails; text it cannot classify becomes [`TokenKind::Unknown`].
//! 2. [`normalize::normalize`] resolves context-dependent tokens (intersection
//!    whitespace, unary minus, operand subtypes).
//! 3. [`rpn::to_rpn`] resolves operator precedence and function arity into a
//!    postfix sequence.
//! 4. [`ast::build_ast`] reduces the postfix sequence to a [`Node`] tree.
//!
//! [`tokenize`] runs stages 1-2 and [`parse`] runs them all.
//!
//! ```
//! let root = tidyxls_parser::parse("=SUM(A1,B1*2)").unwrap();
//! assert_eq!(root.to_string(), "(SUM A1 (* B1 2))");
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod normalize;
pub mod rpn;
mod span;
pub mod token;


pub use ast::{Fixity, Node, NodeKind};
pub use error::{Diagnostic, ErrorCode};
pub use rpn::RpnItem;
pub use span::Span;
pub use token::{Token, TokenKind, TokenStream, TokenSubtype};

/// Lex and normalize a formula.
pub fn tokenize(formula: &str) -> TokenStream {
    normalize::normalize(&lexer::lex(formula))
}

/// Parse a formula into its syntax tree.
///
/// # Errors
///
/// Returns a [`Diagnostic`] if the formula is structurally invalid.
pub fn parse(formula: &str) -> error::Result<Node> {
    let rpn = rpn::to_rpn(&tokenize(formula))?;
    ast::build_ast(rpn)
}
