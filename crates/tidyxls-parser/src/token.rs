//! Formula tokens and token streams.
//!
//! A [`Token`] is the minimal classified unit of formula text: a value, a
//! [`TokenKind`] and a [`TokenSubtype`]. Tokens are produced by the
//! [`lexer`](crate::lexer), reclassified once by
//! [`normalize`](crate::normalize), and treated as immutable afterwards.

use std::fmt;

use crate::span::Span;

/// The kind of a formula token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A token with no semantic effect, removed during normalization.
    Noop,
    /// A literal or reference operand.
    Operand,
    /// A function call boundary (`SUM(` ... `)`), including array literals.
    Function,
    /// A parenthesized subexpression boundary.
    Subexpression,
    /// An argument separator, or the synthetic start of an argument list.
    Argument,
    OperatorPrefix,
    OperatorInfix,
    OperatorPostfix,
    /// A run of spaces, resolved by the normalizer.
    Whitespace,
    /// Text the lexer could not classify.
    Unknown,
}

impl TokenKind {
    /// Returns the canonical lowercase name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Noop => "noop",
            TokenKind::Operand => "operand",
            TokenKind::Function => "function",
            TokenKind::Subexpression => "subexpression",
            TokenKind::Argument => "argument",
            TokenKind::OperatorPrefix => "operator-prefix",
            TokenKind::OperatorInfix => "operator-infix",
            TokenKind::OperatorPostfix => "operator-postfix",
            TokenKind::Whitespace => "white-space",
            TokenKind::Unknown => "unknown",
        }
    }

    /// Returns `true` for prefix, infix and postfix operators.
    pub fn is_operator(&self) -> bool {
        matches!(
            self,
            TokenKind::OperatorPrefix | TokenKind::OperatorInfix | TokenKind::OperatorPostfix
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The subtype of a formula token.
///
/// [`TokenSubtype::Start`] and [`TokenSubtype::Stop`] mark structural
/// boundaries. Every start has a matching stop at the same nesting depth in
/// a well-formed stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TokenSubtype {
    /// No subtype assigned (yet).
    #[default]
    None,
    Start,
    Stop,
    Text,
    Number,
    Logical,
    Error,
    Range,
    Math,
    Concatenate,
    Intersect,
    Union,
}

impl TokenSubtype {
    /// Returns the canonical lowercase name of this subtype.
    ///
    /// [`TokenSubtype::None`] is the empty string.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenSubtype::None => "",
            TokenSubtype::Start => "start",
            TokenSubtype::Stop => "stop",
            TokenSubtype::Text => "text",
            TokenSubtype::Number => "number",
            TokenSubtype::Logical => "logical",
            TokenSubtype::Error => "error",
            TokenSubtype::Range => "range",
            TokenSubtype::Math => "math",
            TokenSubtype::Concatenate => "concatenate",
            TokenSubtype::Intersect => "intersect",
            TokenSubtype::Union => "union",
        }
    }
}

impl fmt::Display for TokenSubtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified unit of formula text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    value: String,
    kind: TokenKind,
    subtype: TokenSubtype,
    span: Span,
}

impl Token {
    /// Create a new token.
    pub fn new(
        value: impl Into<String>,
        kind: TokenKind,
        subtype: TokenSubtype,
        span: Span,
    ) -> Self {
        Self {
            value: value.into(),
            kind,
            subtype,
            span,
        }
    }

    /// Create a stop token for `kind`. Stop tokens carry no text.
    pub fn stop(kind: TokenKind, span: Span) -> Self {
        Self::new("", kind, TokenSubtype::Stop, span)
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn subtype(&self) -> TokenSubtype {
        self.subtype
    }

    pub fn span(&self) -> Span {
        self.span
    }

    /// Returns a copy of this token with a different kind.
    pub fn with_kind(&self, kind: TokenKind) -> Self {
        Self { kind, ..self.clone() }
    }

    /// Returns a copy of this token with a different subtype.
    pub fn with_subtype(&self, subtype: TokenSubtype) -> Self {
        Self {
            subtype,
            ..self.clone()
        }
    }

    /// Returns a copy of this token with a different value.
    pub fn with_value(&self, value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..self.clone()
        }
    }

    pub fn is_start(&self) -> bool {
        self.subtype == TokenSubtype::Start
    }

    pub fn is_stop(&self) -> bool {
        self.subtype == TokenSubtype::Stop
    }

    pub fn is_function_start(&self) -> bool {
        self.kind == TokenKind::Function && self.is_start()
    }

    pub fn is_function_stop(&self) -> bool {
        self.kind == TokenKind::Function && self.is_stop()
    }

    pub fn is_subexpression_start(&self) -> bool {
        self.kind == TokenKind::Subexpression && self.is_start()
    }

    pub fn is_subexpression_stop(&self) -> bool {
        self.kind == TokenKind::Subexpression && self.is_stop()
    }

    /// Returns `true` for an operand subtyped [`TokenSubtype::Range`].
    pub fn is_range(&self) -> bool {
        self.kind == TokenKind::Operand && self.subtype == TokenSubtype::Range
    }

    /// Returns `true` for a text operand.
    pub fn is_text(&self) -> bool {
        self.kind == TokenKind::Operand && self.subtype == TokenSubtype::Text
    }

    /// Returns `true` if this token can end an operand: a function or
    /// subexpression stop, or an operand.
    pub(crate) fn closes_operand(&self) -> bool {
        self.is_function_stop() || self.is_subexpression_stop() || self.kind == TokenKind::Operand
    }

    /// Returns `true` if this token can begin an operand: a function or
    /// subexpression start, or an operand.
    pub(crate) fn opens_operand(&self) -> bool {
        self.is_function_start()
            || self.is_subexpression_start()
            || self.kind == TokenKind::Operand
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// An ordered sequence of tokens.
///
/// Lookaround is provided by [`Cursor`], obtained from
/// [`TokenStream::cursor`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    /// Returns a cursor positioned before the first token.
    pub fn cursor(&self) -> Cursor<'_> {
        Cursor {
            tokens: &self.tokens,
            index: None,
        }
    }
}

impl From<Vec<Token>> for TokenStream {
    fn from(tokens: Vec<Token>) -> Self {
        Self::new(tokens)
    }
}

impl FromIterator<Token> for TokenStream {
    fn from_iter<I: IntoIterator<Item = Token>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl IntoIterator for TokenStream {
    type Item = Token;
    type IntoIter = std::vec::IntoIter<Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.into_iter()
    }
}

impl<'a> IntoIterator for &'a TokenStream {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

/// A movable position within a [`TokenStream`] with one-token lookaround.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    tokens: &'a [Token],
    index: Option<usize>,
}

impl<'a> Cursor<'a> {
    /// Move to the next token, returning it, or `None` at the end.
    pub fn advance(&mut self) -> Option<&'a Token> {
        let next = self.index.map_or(0, |i| i + 1);
        if next >= self.tokens.len() {
            return None;
        }
        self.index = Some(next);
        self.tokens.get(next)
    }

    pub fn current(&self) -> Option<&'a Token> {
        self.index.and_then(|i| self.tokens.get(i))
    }

    pub fn previous(&self) -> Option<&'a Token> {
        self.index
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| self.tokens.get(i))
    }

    pub fn next(&self) -> Option<&'a Token> {
        self.tokens.get(self.index.map_or(0, |i| i + 1))
    }

    /// Returns `true` when positioned on (or before) the first token.
    pub fn is_first(&self) -> bool {
        self.index.is_none_or(|i| i == 0)
    }

    /// Returns `true` when positioned on the last token.
    pub fn is_last(&self) -> bool {
        self.index.map_or(self.tokens.is_empty(), |i| i + 1 >= self.tokens.len())
    }
}
