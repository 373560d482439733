//! Operator-precedence resolution (shunting-yard).
//!
//! [`to_rpn`] turns a normalized token stream into a postfix sequence of
//! [`RpnItem`]s. Function arity is tracked while converting, so the tree can
//! be rebuilt from the sequence alone (see [`build_ast`](crate::ast::build_ast)).

use std::fmt;

use log::{debug, warn};

use crate::{
    ast::{Fixity, NodeKind},
    error::{Diagnostic, ErrorCode, Result},
    token::{Token, TokenKind, TokenSubtype, TokenStream},
};

/// An entry of the operator precedence table. Every operator is
/// left-associative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operator {
    symbol: &'static str,
    precedence: u8,
}

/// Symbol used for prefix negation, distinct from binary `-`.
pub const UNARY_MINUS: &str = "u-";

const fn left(symbol: &'static str, precedence: u8) -> Operator {
    Operator { symbol, precedence }
}

const OPERATORS: [Operator; 17] = [
    left(":", 8),
    left(" ", 8),
    left(",", 8),
    left(UNARY_MINUS, 7),
    left("%", 6),
    left("^", 5),
    left("*", 4),
    left("/", 4),
    left("+", 3),
    left("-", 3),
    left("&", 2),
    left("=", 1),
    left("<", 1),
    left(">", 1),
    left("<=", 1),
    left(">=", 1),
    left("<>", 1),
];

impl Operator {
    /// Find the table entry for an operator token.
    ///
    /// Prefix `-` maps to [`UNARY_MINUS`]; intersection operators are found
    /// by subtype.
    pub fn lookup(token: &Token) -> Option<Operator> {
        let symbol = match (token.kind(), token.subtype()) {
            (TokenKind::OperatorPrefix, _) if token.value() == "-" => UNARY_MINUS,
            (TokenKind::OperatorInfix, TokenSubtype::Intersect) => " ",
            _ => token.value(),
        };

        OPERATORS.iter().find(|op| op.symbol == symbol).copied()
    }

    pub fn symbol(&self) -> &'static str {
        self.symbol
    }

    pub fn precedence(&self) -> u8 {
        self.precedence
    }

    /// Returns `true` if `stacked` must be emitted before `self` is pushed.
    fn yields_to(&self, stacked: &Operator) -> bool {
        self.precedence <= stacked.precedence
    }
}

/// One element of the postfix sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpnItem {
    token: Token,
    kind: NodeKind,
}

impl RpnItem {
    fn operand(token: Token) -> Self {
        let kind = if token.is_range() {
            NodeKind::Range
        } else {
            NodeKind::Operand
        };
        Self { token, kind }
    }

    fn operator(token: Token) -> Self {
        let fixity = match token.kind() {
            TokenKind::OperatorPrefix => Fixity::Prefix,
            TokenKind::OperatorPostfix => Fixity::Postfix,
            _ => Fixity::Infix,
        };
        Self {
            token,
            kind: NodeKind::Operator(fixity),
        }
    }

    fn function(token: Token, arg_count: usize) -> Self {
        Self {
            token,
            kind: NodeKind::Function { arg_count },
        }
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn into_token(self) -> Token {
        self.token
    }

    /// The display symbol: `u-` for prefix negation, the token value
    /// otherwise.
    pub fn symbol(&self) -> &str {
        match self.kind {
            NodeKind::Operator(Fixity::Prefix) if self.token.value() == "-" => UNARY_MINUS,
            _ => self.token.value(),
        }
    }
}

impl fmt::Display for RpnItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// What the precedence parser sees for each input token.
#[derive(Debug)]
enum Input {
    Operand(Token),
    Function(Token),
    Separator(Token),
    Operator(Token),
    Open(Token),
    Close(Token),
    Skip(Token),
}

/// Re-tag structural tokens: every function start becomes a plain function
/// name followed by a generated arglist start.
fn inputs(tokens: &TokenStream) -> impl Iterator<Item = Input> + '_ {
    tokens.iter().flat_map(|token| {
        let first = if token.is_function_start() {
            Input::Function(token.with_subtype(TokenSubtype::None))
        } else if token.is_start() {
            Input::Open(token.clone())
        } else if token.is_stop() {
            Input::Close(token.clone())
        } else {
            match token.kind() {
                TokenKind::Operand => Input::Operand(token.clone()),
                TokenKind::Argument => Input::Separator(token.clone()),
                kind if kind.is_operator() => Input::Operator(token.clone()),
                _ => Input::Skip(token.clone()),
            }
        };

        let arglist = token.is_function_start().then(|| {
            Input::Open(Token::new(
                "",
                TokenKind::Argument,
                TokenSubtype::Start,
                token.span(),
            ))
        });

        std::iter::once(first).chain(arglist)
    })
}

#[derive(Debug)]
enum StackEntry {
    Function(Token),
    Operator(Token, Operator),
    Open(Token),
}

#[derive(Debug, Default)]
struct ShuntingYard {
    output: Vec<RpnItem>,
    stack: Vec<StackEntry>,
    arg_counts: Vec<usize>,
    were_values: Vec<bool>,
}

/// Convert a normalized token stream to postfix order.
///
/// # Errors
///
/// Returns a [`Diagnostic`] when structure is unbalanced (`E100`-`E102`) or
/// an operator has no precedence entry (`E103`).
///
/// # Example
///
/// ```
/// # use tidyxls_parser::{rpn::to_rpn, tokenize};
/// let rpn = to_rpn(&tokenize("=1+2*3")).unwrap();
/// let symbols: Vec<_> = rpn.iter().map(|item| item.symbol()).collect();
/// assert_eq!(symbols, ["1", "2", "3", "*", "+"]);
/// ```
pub fn to_rpn(tokens: &TokenStream) -> Result<Vec<RpnItem>> {
    let mut parser = ShuntingYard::default();
    for input in inputs(tokens) {
        parser.feed(input)?;
    }
    let output = parser.finish()?;

    debug!(items = output.len(); "Resolved operator precedence");
    Ok(output)
}

impl ShuntingYard {
    fn feed(&mut self, input: Input) -> Result<()> {
        match input {
            Input::Operand(token) => {
                self.output.push(RpnItem::operand(token));
                self.mark_value();
            }
            Input::Function(token) => {
                self.mark_value();
                self.stack.push(StackEntry::Function(token));
                self.arg_counts.push(0);
                self.were_values.push(false);
            }
            Input::Separator(token) => self.separator(token)?,
            Input::Operator(token) => self.operator(token)?,
            Input::Open(token) => self.stack.push(StackEntry::Open(token)),
            Input::Close(token) => self.close(token)?,
            Input::Skip(token) => {
                warn!(value = token.value(), span = token.span().to_string(); "Skipping unclassified token");
            }
        }
        Ok(())
    }

    fn mark_value(&mut self) {
        if let Some(slot) = self.were_values.last_mut() {
            *slot = true;
        }
    }

    /// Emit stacked operators down to (not including) the nearest
    /// non-operator entry.
    fn pop_operators(&mut self) {
        while let Some(StackEntry::Operator(..)) = self.stack.last() {
            if let Some(StackEntry::Operator(token, _)) = self.stack.pop() {
                self.output.push(RpnItem::operator(token));
            }
        }
    }

    fn separator(&mut self, token: Token) -> Result<()> {
        self.pop_operators();

        let in_arglist = matches!(self.stack.last(), Some(StackEntry::Open(_)));
        let had_value = self.were_values.pop();
        let count = self.arg_counts.last_mut();

        match (in_arglist, had_value, count) {
            (true, Some(had_value), Some(count)) => {
                if had_value {
                    *count += 1;
                }
                self.were_values.push(false);
                Ok(())
            }
            _ => Err(Diagnostic::error("mismatched or misplaced parentheses")
                .with_code(ErrorCode::E100)
                .with_label(token.span(), "argument separator outside of a function call")),
        }
    }

    fn operator(&mut self, token: Token) -> Result<()> {
        let Some(op) = Operator::lookup(&token) else {
            return Err(Diagnostic::error(format!("unknown operator `{}`", token.value()))
                .with_code(ErrorCode::E103)
                .with_label(token.span(), "no precedence defined for this operator"));
        };

        while let Some(StackEntry::Operator(_, stacked)) = self.stack.last() {
            if !op.yields_to(stacked) {
                break;
            }
            if let Some(StackEntry::Operator(popped, _)) = self.stack.pop() {
                self.output.push(RpnItem::operator(popped));
            }
        }

        self.stack.push(StackEntry::Operator(token, op));
        Ok(())
    }

    fn close(&mut self, token: Token) -> Result<()> {
        self.pop_operators();

        if !matches!(self.stack.pop(), Some(StackEntry::Open(_))) {
            return Err(Diagnostic::error("mismatched or misplaced parentheses")
                .with_code(ErrorCode::E101)
                .with_label(token.span(), "no matching opening parenthesis"));
        }

        if matches!(self.stack.last(), Some(StackEntry::Function(_)))
            && let Some(StackEntry::Function(function)) = self.stack.pop()
        {
            let count = self.arg_counts.pop().unwrap_or_default();
            let last_had_value = self.were_values.pop().unwrap_or_default();
            let arg_count = count + usize::from(last_had_value);
            self.output.push(RpnItem::function(function, arg_count));
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<RpnItem>> {
        while let Some(entry) = self.stack.pop() {
            match entry {
                StackEntry::Operator(token, _) => self.output.push(RpnItem::operator(token)),
                StackEntry::Open(token) | StackEntry::Function(token) => {
                    return Err(Diagnostic::error("mismatched or misplaced parentheses")
                        .with_code(ErrorCode::E102)
                        .with_label(token.span(), "opened here but never closed")
                        .with_help("add the missing closing parenthesis"));
                }
            }
        }
        Ok(self.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenize;

    fn rpn(formula: &str) -> Vec<String> {
        to_rpn(&tokenize(formula))
            .unwrap()
            .iter()
            .map(|item| item.symbol().to_string())
            .collect()
    }

    fn rpn_error(formula: &str) -> Option<ErrorCode> {
        to_rpn(&tokenize(formula)).unwrap_err().code()
    }

    fn arity_of(formula: &str, name: &str) -> Option<usize> {
        to_rpn(&tokenize(formula))
            .unwrap()
            .into_iter()
            .find(|item| item.token().value() == name)
            .and_then(|item| match item.kind() {
                NodeKind::Function { arg_count } => Some(arg_count),
                _ => None,
            })
    }

    #[test]
    fn test_binary_addition() {
        assert_eq!(rpn("A1+B1"), ["A1", "B1", "+"]);
    }

    #[test]
    fn test_unary_minus_symbol() {
        assert_eq!(rpn("-A1"), ["A1", "u-"]);
    }

    #[test]
    fn test_precedence_and_left_associativity() {
        assert_eq!(rpn("1+2*3"), ["1", "2", "3", "*", "+"]);
        assert_eq!(rpn("1-2-3"), ["1", "2", "-", "3", "-"]);
        assert_eq!(rpn("2^3^2"), ["2", "3", "^", "2", "^"]);
        assert_eq!(rpn("A1&\"x\"=B1"), ["A1", "x", "&", "B1", "="]);
    }

    #[test]
    fn test_unary_minus_binds_tighter_than_power() {
        assert_eq!(rpn("-2^2"), ["2", "u-", "2", "^"]);
        assert_eq!(rpn("2*-3"), ["2", "3", "u-", "*"]);
    }

    #[test]
    fn test_percent_is_postfix() {
        assert_eq!(rpn("50%*2"), ["50", "%", "2", "*"]);
    }

    #[test]
    fn test_parentheses_group() {
        assert_eq!(rpn("(1+2)*3"), ["1", "2", "+", "3", "*"]);
    }

    #[test]
    fn test_function_arity() {
        assert_eq!(rpn("SUM(A1,B1)"), ["A1", "B1", "SUM"]);
        assert_eq!(arity_of("SUM(A1,B1)", "SUM"), Some(2));
        assert_eq!(arity_of("NOW()", "NOW"), Some(0));
        assert_eq!(arity_of("F(1+2)", "F"), Some(1));
    }

    #[test]
    fn test_nested_function_arity() {
        let formula = "IF(SUM(A1,B1)>0,MAX(C1,C2,C3),0)";
        assert_eq!(arity_of(formula, "IF"), Some(3));
        assert_eq!(arity_of(formula, "SUM"), Some(2));
        assert_eq!(arity_of(formula, "MAX"), Some(3));
    }

    #[test]
    fn test_empty_argument_slot_not_counted() {
        assert_eq!(arity_of("F(1,)", "F"), Some(1));
    }

    #[test]
    fn test_array_literal_arity() {
        assert_eq!(arity_of("{1,2;3}", "ARRAY"), Some(2));
        assert_eq!(rpn("{1,2;3}"), ["1", "2", "ARRAYROW", "3", "ARRAYROW", "ARRAY"]);
    }

    #[test]
    fn test_union_and_intersection() {
        assert_eq!(rpn("(A1,B1)"), ["A1", "B1", ","]);
        assert_eq!(rpn("A1:B2 B1:C3"), ["A1:B2", "B1:C3", " "]);
    }

    #[test]
    fn test_operands_tagged_by_kind() {
        let items = to_rpn(&tokenize("A1+1")).unwrap();
        assert_eq!(items[0].kind(), NodeKind::Range);
        assert_eq!(items[1].kind(), NodeKind::Operand);
        assert_eq!(items[2].kind(), NodeKind::Operator(Fixity::Infix));
    }

    #[test]
    fn test_unmatched_close_is_error() {
        assert_eq!(rpn_error("1)"), Some(ErrorCode::E101));
        assert_eq!(rpn_error("SUM(A1))"), Some(ErrorCode::E101));
    }

    #[test]
    fn test_unclosed_open_is_error() {
        assert_eq!(rpn_error("SUM(A1"), Some(ErrorCode::E102));
        assert_eq!(rpn_error("(1+2"), Some(ErrorCode::E102));
    }

    #[test]
    fn test_error_label_points_at_offending_token() {
        let err = to_rpn(&tokenize("=SUM(A1")).unwrap_err();
        assert_eq!(err.primary_span().map(|span| span.start()), Some(1));

        let err = to_rpn(&tokenize("=1)")).unwrap_err();
        assert_eq!(err.primary_span().map(|span| span.start()), Some(2));
    }

    #[test]
    fn test_operator_lookup() {
        let not_equal = Token::new("<>", TokenKind::OperatorInfix, TokenSubtype::Logical, Default::default());
        assert_eq!(Operator::lookup(&not_equal).map(|op| op.precedence()), Some(1));

        let negate = Token::new("-", TokenKind::OperatorPrefix, TokenSubtype::None, Default::default());
        assert_eq!(Operator::lookup(&negate).map(|op| op.symbol()), Some(UNARY_MINUS));

        let bogus = Token::new("~", TokenKind::OperatorInfix, TokenSubtype::Math, Default::default());
        assert!(Operator::lookup(&bogus).is_none());
    }

    #[test]
    fn test_unknown_operator_is_error() {
        let stream = TokenStream::new(vec![
            Token::new("1", TokenKind::Operand, TokenSubtype::Number, Default::default()),
            Token::new("~", TokenKind::OperatorInfix, TokenSubtype::Math, Default::default()),
            Token::new("2", TokenKind::Operand, TokenSubtype::Number, Default::default()),
        ]);
        assert_eq!(to_rpn(&stream).unwrap_err().code(), Some(ErrorCode::E103));
    }

    #[test]
    fn test_unknown_tokens_skipped() {
        // the pending `x` before the quote is flushed as unknown
        assert_eq!(rpn("x\"a\""), ["a"]);
    }
}
