//! Text renderings of a normalized token stream.
//!
//! - [`render_flat`] writes canonical single-line formula text.
//! - [`render_dump`] writes one indented line per token for debugging.
//! - [`render_tidy`] writes a multi-line layout over the [`rebuild`] output,
//!   breaking lines only inside structuring functions.
//!
//! Array literals are rendered with braces and `;` between rows in both the
//! flat and the tidy view.

use tidyxls_parser::{
    Token, TokenKind, TokenStream, TokenSubtype,
    lexer::{ARRAY, ARRAY_ROW},
};

use crate::config::FormatConfig;

/// Build the render-oriented token list.
///
/// Every function start is followed by a synthetic argument-start marker,
/// function stops carry the name of the function they close, subexpression
/// boundaries carry literal parentheses and argument separators carry
/// `separator`.
pub fn rebuild(tokens: &TokenStream, separator: char) -> Vec<Token> {
    let mut items = Vec::with_capacity(tokens.len() * 2);
    let mut names: Vec<&str> = Vec::new();

    for token in tokens {
        match (token.kind(), token.subtype()) {
            (TokenKind::Function, TokenSubtype::Start) => {
                names.push(token.value());
                items.push(token.clone());
                items.push(Token::new(
                    "",
                    TokenKind::Argument,
                    TokenSubtype::Start,
                    token.span(),
                ));
            }
            (TokenKind::Function, TokenSubtype::Stop) => {
                let name = names.pop().unwrap_or_default();
                items.push(token.with_value(name));
            }
            (TokenKind::Argument, _) => items.push(token.with_value(separator.to_string())),
            (TokenKind::Subexpression, TokenSubtype::Start) => items.push(token.with_value("(")),
            (TokenKind::Subexpression, TokenSubtype::Stop) => items.push(token.with_value(")")),
            _ => items.push(token.clone()),
        }
    }

    items
}

fn quote_text(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn open_delimiter(name: &str) -> String {
    match name {
        ARRAY => "{".to_string(),
        ARRAY_ROW => String::new(),
        _ => format!("{name}("),
    }
}

fn close_delimiter(name: Option<&str>) -> &'static str {
    match name {
        Some(ARRAY) => "}",
        Some(ARRAY_ROW) => "",
        _ => ")",
    }
}

/// Canonical single-line text of a normalized stream.
///
/// The output lexes back into an equivalent stream: text operands are
/// re-quoted with embedded quotes doubled and intersections are written as
/// a single space. The exception is a `;` outside an array literal, which
/// the lexer turns into row markers that have no flat spelling: `F(1;2)`
/// renders as `F(1),2`.
///
/// ```
/// # use tidyxls::render::render_flat;
/// let tokens = tidyxls_parser::tokenize("= SUM( A1 , \"a\"\"b\" )");
/// assert_eq!(render_flat(&tokens), "SUM(A1,\"a\"\"b\")");
/// ```
pub fn render_flat(tokens: &TokenStream) -> String {
    let mut output = String::new();
    let mut names: Vec<&str> = Vec::new();

    for token in tokens {
        match (token.kind(), token.subtype()) {
            (TokenKind::Function, TokenSubtype::Start) => {
                names.push(token.value());
                output.push_str(&open_delimiter(token.value()));
            }
            (TokenKind::Function | TokenKind::Unknown, TokenSubtype::Stop) => {
                output.push_str(close_delimiter(names.pop()));
            }
            (TokenKind::Subexpression, TokenSubtype::Start) => output.push('('),
            (TokenKind::Subexpression, TokenSubtype::Stop) => output.push(')'),
            (TokenKind::Argument, _) if names.last() == Some(&ARRAY) => output.push(';'),
            (TokenKind::Operand, TokenSubtype::Text) => output.push_str(&quote_text(token.value())),
            (TokenKind::OperatorInfix, TokenSubtype::Intersect) => output.push(' '),
            _ => output.push_str(token.value()),
        }
    }

    output
}

/// One line per token: `<indent><value> <kind> <subtype>`.
///
/// Indentation is four spaces per nesting level; the level increases after
/// a start token and decreases before a stop token.
pub fn render_dump(tokens: &TokenStream) -> String {
    let mut output = String::new();
    let mut depth = 0usize;

    for token in tokens {
        if token.is_stop() {
            depth = depth.saturating_sub(1);
        }
        output.push_str(&format!(
            "{}{} <{}> <{}>\n",
            "    ".repeat(depth),
            token.value(),
            token.kind(),
            token.subtype()
        ));
        if token.is_start() {
            depth += 1;
        }
    }

    output
}

/// Multi-line layout of a rebuilt token list.
///
/// Inside a structuring function a newline follows the opening parenthesis,
/// every argument starts on its own tab-indented line with the separator
/// leading, and the closing parenthesis is on its own line. Other functions
/// stay inline. The indentation level is the number of enclosing
/// structuring functions; inline functions do not add to it.
///
/// ```
/// # use tidyxls::{config::FormatConfig, render::{rebuild, render_tidy}};
/// let format = FormatConfig::default();
/// let items = rebuild(&tidyxls_parser::tokenize("IF(A1>0,\"Y\",\"N\")"), format.separator());
/// assert_eq!(render_tidy(&items, &format), "IF(\n\tA1>0\n\t,\"Y\"\n\t,\"N\"\n)");
/// ```
pub fn render_tidy(items: &[Token], format: &FormatConfig) -> String {
    TidyWriter::new(format).write(items)
}

struct TidyWriter<'a> {
    format: &'a FormatConfig,
    output: String,
    functions: Vec<&'a str>,
    level: usize,
    /// Indentation applied if the next token opens a function.
    pending_indent: usize,
}

impl<'a> TidyWriter<'a> {
    fn new(format: &'a FormatConfig) -> Self {
        Self {
            format,
            output: String::new(),
            functions: Vec::new(),
            level: 0,
            pending_indent: 0,
        }
    }

    fn breaks_lines(&self) -> bool {
        self.functions
            .last()
            .is_some_and(|name| self.format.is_structuring(name))
    }

    fn indent(&mut self, level: usize) {
        for _ in 0..level {
            self.output.push('\t');
        }
    }

    fn write(mut self, items: &'a [Token]) -> String {
        for token in items {
            let indent = std::mem::take(&mut self.pending_indent);

            match (token.kind(), token.subtype()) {
                (TokenKind::Function, TokenSubtype::Start) => {
                    self.functions.push(token.value());
                    self.indent(indent);
                    self.output.push_str(&open_delimiter(token.value()));
                    if self.breaks_lines() {
                        self.output.push('\n');
                        self.level += 1;
                    }
                    self.pending_indent = self.level;
                }
                (TokenKind::Function | TokenKind::Unknown, TokenSubtype::Stop) => {
                    if self.breaks_lines() {
                        self.level = self.level.saturating_sub(1);
                        self.output.push('\n');
                        self.indent(self.level);
                        self.pending_indent = self.level;
                    }
                    let name = self.functions.pop();
                    self.output.push_str(close_delimiter(name));
                }
                (TokenKind::Argument, TokenSubtype::Start) => {
                    if self.breaks_lines() {
                        self.indent(self.level);
                    }
                }
                (TokenKind::Argument, _) => {
                    if self.breaks_lines() {
                        self.output.push('\n');
                        self.indent(self.level);
                    }
                    if self.functions.last() == Some(&ARRAY) {
                        self.output.push(';');
                    } else {
                        self.output.push_str(token.value());
                    }
                }
                (TokenKind::Operand, TokenSubtype::Text) => {
                    self.output.push_str(&quote_text(token.value()));
                }
                (TokenKind::OperatorInfix, TokenSubtype::Intersect) => self.output.push(' '),
                _ => self.output.push_str(token.value()),
            }
        }
        self.output
    }
}
