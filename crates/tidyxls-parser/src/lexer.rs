//! Lexical analyzer for spreadsheet formulas.
//!
//! The lexer is a character-level state machine that converts formula text
//! into a flat [`TokenStream`]. It is deliberately permissive: text it cannot
//! classify becomes [`TokenKind::Unknown`] tokens and reference syntax is not
//! validated, so lexing never fails.
//!
//! The public entry point is [`lex`]. Its output still contains whitespace
//! tokens and unresolved operator/operand subtypes; see
//! [`normalize`](crate::normalize) for the second pass.

use log::trace;
use winnow::{Parser as _, ascii::digit1, combinator::opt, error::ModalResult, token::one_of};

use crate::{
    span::Span,
    token::{Token, TokenKind, TokenStream, TokenSubtype},
};

/// The closed set of error literals recognized inside formulas.
pub const ERROR_LITERALS: [&str; 7] = [
    "#NULL!", "#DIV/0!", "#VALUE!", "#REF!", "#NAME?", "#NUM!", "#N/A",
];

/// Function name given to the outer boundary of an array literal.
pub const ARRAY: &str = "ARRAY";

/// Function name given to each row of an array literal.
pub const ARRAY_ROW: &str = "ARRAYROW";

const INFIX_OPERATORS: &str = "+-*/^&=><";
const COMPARATORS: [&str; 3] = [">=", "<=", "<>"];

/// Lexer state. Checked before any state-independent rule, so that e.g. a
/// `[` inside a quoted string is plain text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    /// Inside `"..."`; a doubled quote is an escaped quote.
    QuotedString,
    /// Inside `'...'` (sheet or workbook names); the quoted text stays part
    /// of the pending operand.
    QuotedPath,
    /// Inside `[...]`; accumulates verbatim up to the closing bracket.
    BracketedRange,
    /// After `#`; accumulates until an entry of [`ERROR_LITERALS`] matches.
    ErrorLiteral,
}

/// A construct opened by the lexer and awaiting its stop token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpenConstruct {
    Function,
    Subexpression,
    Array,
    ArrayRow,
}

impl OpenConstruct {
    fn stop_kind(self) -> TokenKind {
        match self {
            OpenConstruct::Subexpression => TokenKind::Subexpression,
            OpenConstruct::Function | OpenConstruct::Array | OpenConstruct::ArrayRow => {
                TokenKind::Function
            }
        }
    }
}

/// Tokenize a formula without normalization.
///
/// A single leading `=` (after optional leading spaces) is skipped. The
/// returned stream covers the whole input.
///
/// # Example
///
/// ```
/// # use tidyxls_parser::{lexer::lex, TokenKind};
/// let tokens = lex("=SUM(A1, 2)");
/// assert_eq!(tokens.tokens()[0].value(), "SUM");
/// assert_eq!(tokens.tokens()[0].kind(), TokenKind::Function);
/// ```
pub fn lex(formula: &str) -> TokenStream {
    let tokens = Lexer::new(formula).run();
    trace!(count = tokens.len(); "Lexed formula");
    TokenStream::new(tokens)
}

struct Lexer<'src> {
    source: &'src str,
    chars: Vec<(usize, char)>,
    index: usize,
    state: State,
    pending: String,
    pending_start: usize,
    tokens: Vec<Token>,
    stack: Vec<OpenConstruct>,
}

impl<'src> Lexer<'src> {
    fn new(source: &'src str) -> Self {
        let chars: Vec<(usize, char)> = source.char_indices().collect();
        let mut index = chars.iter().take_while(|(_, c)| *c == ' ').count();
        if chars.get(index).is_some_and(|(_, c)| *c == '=') {
            index += 1;
        }

        Self {
            source,
            chars,
            index,
            state: State::Normal,
            pending: String::new(),
            pending_start: 0,
            tokens: Vec::new(),
            stack: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Token> {
        while let Some(&(at, c)) = self.chars.get(self.index) {
            match self.state {
                State::QuotedString => self.quoted_string(at, c),
                State::QuotedPath => self.quoted_path(c),
                State::BracketedRange => {
                    self.accumulate(at, c);
                    if c == ']' {
                        self.state = State::Normal;
                    }
                    self.index += 1;
                }
                State::ErrorLiteral => {
                    self.accumulate(at, c);
                    self.index += 1;
                    if ERROR_LITERALS.contains(&self.pending.as_str()) {
                        self.state = State::Normal;
                        self.flush(TokenKind::Operand, TokenSubtype::Error);
                    }
                }
                State::Normal => self.normal(at, c),
            }
        }

        match self.state {
            // An unterminated quote cannot be classified.
            State::QuotedString | State::QuotedPath => {
                self.flush(TokenKind::Unknown, TokenSubtype::None);
            }
            _ => self.flush(TokenKind::Operand, TokenSubtype::None),
        }

        self.tokens
    }

    fn quoted_string(&mut self, at: usize, c: char) {
        if c != '"' {
            self.pending.push(c);
            self.index += 1;
        } else if self.peek() == Some('"') {
            self.pending.push('"');
            self.index += 2;
        } else {
            self.index += 1;
            self.state = State::Normal;
            let value = std::mem::take(&mut self.pending);
            self.emit(
                value,
                TokenKind::Operand,
                TokenSubtype::Text,
                Span::new(self.pending_start..at + 1),
            );
        }
    }

    fn quoted_path(&mut self, c: char) {
        if c != '\'' {
            self.pending.push(c);
            self.index += 1;
        } else if self.peek() == Some('\'') {
            self.pending.push('\'');
            self.index += 2;
        } else {
            self.pending = format!("'{}'", self.pending);
            self.state = State::Normal;
            self.index += 1;
        }
    }

    fn normal(&mut self, at: usize, c: char) {
        if matches!(c, '+' | '-')
            && self.pending.chars().count() > 1
            && is_exponent_prefix(&self.pending)
        {
            self.accumulate(at, c);
            self.index += 1;
            return;
        }

        // None of the state entry points start with `<` or `>`, so
        // comparators can be matched ahead of the dispatch below.
        if let Some(op) = self.comparator() {
            self.flush(TokenKind::Operand, TokenSubtype::None);
            self.emit(
                op,
                TokenKind::OperatorInfix,
                TokenSubtype::Logical,
                Span::new(at..at + 2),
            );
            self.index += 2;
            return;
        }

        match c {
            '"' => {
                self.flush(TokenKind::Unknown, TokenSubtype::None);
                self.state = State::QuotedString;
                self.pending_start = at;
                self.index += 1;
            }
            '\'' => {
                self.flush(TokenKind::Unknown, TokenSubtype::None);
                self.state = State::QuotedPath;
                self.pending_start = at;
                self.index += 1;
            }
            '[' => {
                self.state = State::BracketedRange;
                self.accumulate(at, c);
                self.index += 1;
            }
            '#' => {
                self.flush(TokenKind::Unknown, TokenSubtype::None);
                self.state = State::ErrorLiteral;
                self.accumulate(at, c);
                self.index += 1;
            }
            '{' => {
                self.flush(TokenKind::Unknown, TokenSubtype::None);
                let span = Span::new(at..at + 1);
                self.open(ARRAY, TokenKind::Function, OpenConstruct::Array, span);
                self.open(ARRAY_ROW, TokenKind::Function, OpenConstruct::ArrayRow, span);
                self.index += 1;
            }
            ';' => {
                self.flush(TokenKind::Operand, TokenSubtype::None);
                let span = Span::new(at..at + 1);
                self.close(span);
                self.emit(",", TokenKind::Argument, TokenSubtype::None, span);
                self.open(ARRAY_ROW, TokenKind::Function, OpenConstruct::ArrayRow, span);
                self.index += 1;
            }
            '}' => {
                self.flush(TokenKind::Operand, TokenSubtype::None);
                let span = Span::new(at..at + 1);
                self.close(span);
                self.close(span);
                self.index += 1;
            }
            ' ' => {
                self.flush(TokenKind::Operand, TokenSubtype::None);
                let run = self.chars[self.index..]
                    .iter()
                    .take_while(|(_, c)| *c == ' ')
                    .count();
                self.index += run;
                let span = Span::new(at..self.offset());
                self.emit(" ", TokenKind::Whitespace, TokenSubtype::None, span);
            }
            _ if INFIX_OPERATORS.contains(c) => {
                self.flush(TokenKind::Operand, TokenSubtype::None);
                self.emit(
                    c.to_string(),
                    TokenKind::OperatorInfix,
                    TokenSubtype::None,
                    Span::new(at..at + 1),
                );
                self.index += 1;
            }
            '%' => {
                self.flush(TokenKind::Operand, TokenSubtype::None);
                self.emit(
                    "%",
                    TokenKind::OperatorPostfix,
                    TokenSubtype::None,
                    Span::new(at..at + 1),
                );
                self.index += 1;
            }
            '(' => {
                if self.pending.is_empty() {
                    self.open(
                        "",
                        TokenKind::Subexpression,
                        OpenConstruct::Subexpression,
                        Span::new(at..at + 1),
                    );
                } else {
                    let name = std::mem::take(&mut self.pending);
                    let span = Span::new(self.pending_start..at + 1);
                    self.open(name, TokenKind::Function, OpenConstruct::Function, span);
                }
                self.index += 1;
            }
            ',' => {
                self.flush(TokenKind::Operand, TokenSubtype::None);
                let span = Span::new(at..at + 1);
                match self.stack.last() {
                    Some(OpenConstruct::Subexpression) | None => {
                        self.emit(",", TokenKind::OperatorInfix, TokenSubtype::Union, span);
                    }
                    Some(_) => self.emit(",", TokenKind::Argument, TokenSubtype::None, span),
                }
                self.index += 1;
            }
            ')' => {
                self.flush(TokenKind::Operand, TokenSubtype::None);
                self.close(Span::new(at..at + 1));
                self.index += 1;
            }
            _ => {
                self.accumulate(at, c);
                self.index += 1;
            }
        }
    }

    /// The character after the current one.
    fn peek(&self) -> Option<char> {
        self.chars.get(self.index + 1).map(|(_, c)| *c)
    }

    /// Byte offset of the current character (or end of input).
    fn offset(&self) -> usize {
        self.chars
            .get(self.index)
            .map_or(self.source.len(), |(at, _)| *at)
    }

    /// A two-character comparison operator starting at the current character.
    fn comparator(&self) -> Option<&'static str> {
        let first = self.chars.get(self.index)?.1;
        let second = self.peek()?;
        COMPARATORS.into_iter().find(|op| {
            let mut chars = op.chars();
            chars.next() == Some(first) && chars.next() == Some(second)
        })
    }

    fn accumulate(&mut self, at: usize, c: char) {
        if self.pending.is_empty() {
            self.pending_start = at;
        }
        self.pending.push(c);
    }

    /// Emit pending text (if any) as a token ending at the current offset.
    fn flush(&mut self, kind: TokenKind, subtype: TokenSubtype) {
        if self.pending.is_empty() {
            return;
        }
        let value = std::mem::take(&mut self.pending);
        let span = Span::new(self.pending_start..self.offset());
        self.emit(value, kind, subtype, span);
    }

    fn emit(&mut self, value: impl Into<String>, kind: TokenKind, subtype: TokenSubtype, span: Span) {
        self.tokens.push(Token::new(value, kind, subtype, span));
    }

    fn open(
        &mut self,
        value: impl Into<String>,
        kind: TokenKind,
        construct: OpenConstruct,
        span: Span,
    ) {
        self.emit(value, kind, TokenSubtype::Start, span);
        self.stack.push(construct);
    }

    /// Close the innermost open construct. With nothing open the stop token
    /// is [`TokenKind::Unknown`] and left for the parser to reject.
    fn close(&mut self, span: Span) {
        let kind = self
            .stack
            .pop()
            .map_or(TokenKind::Unknown, OpenConstruct::stop_kind);
        self.tokens.push(Token::stop(kind, span));
    }
}

/// A single nonzero digit, optional `.digits`, then `e`/`E`.
fn exponent_prefix(input: &mut &str) -> ModalResult<()> {
    (one_of('1'..='9'), opt(('.', digit1)), one_of(['e', 'E']))
        .void()
        .parse_next(input)
}

/// Returns `true` if `pending` is the mantissa of a number in scientific
/// notation, so a following sign belongs to the exponent.
///
/// Digits after the sign are not checked: `1e+x` still absorbs the `+`.
fn is_exponent_prefix(pending: &str) -> bool {
    exponent_prefix.parse(pending).is_ok()
}
