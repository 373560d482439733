//! Context-sensitive token reclassification.
//!
//! The lexer cannot decide some classifications on its own: whether a space
//! is Excel's intersection operator, whether `-` negates or subtracts, and
//! what kind of value an operand holds. [`normalize`] resolves these using
//! neighboring tokens and returns a new stream; its input is left untouched.

use log::trace;

use crate::token::{Token, TokenKind, TokenStream, TokenSubtype};

/// Normalize a lexed token stream.
///
/// 1. Whitespace is dropped, except between an operand-ending token and an
///    operand-starting token, where it becomes an infix operator subtyped
///    [`TokenSubtype::Intersect`].
/// 2. Infix `-` with no operand to its left becomes a prefix operator;
///    infix `+` in the same position has no effect and is dropped.
/// 3. Remaining infix operators and operands receive their subtypes, and a
///    leading `@` is stripped from function names.
pub fn normalize(stream: &TokenStream) -> TokenStream {
    let resolved = resolve_whitespace(stream);
    let reclassified = reclassify(resolved);

    let normalized: TokenStream = reclassified
        .into_iter()
        .filter(|token| token.kind() != TokenKind::Noop)
        .collect();

    trace!(before = stream.len(), after = normalized.len(); "Normalized token stream");
    normalized
}

fn resolve_whitespace(stream: &TokenStream) -> Vec<Token> {
    let mut kept = Vec::with_capacity(stream.len());
    let mut cursor = stream.cursor();

    while let Some(token) = cursor.advance() {
        if token.kind() != TokenKind::Whitespace {
            kept.push(token.clone());
            continue;
        }

        if cursor.is_first() || cursor.is_last() {
            continue;
        }

        let intersects = match (cursor.previous(), cursor.next()) {
            (Some(prev), Some(next)) => prev.closes_operand() && next.opens_operand(),
            _ => false,
        };
        if intersects {
            kept.push(Token::new(
                " ",
                TokenKind::OperatorInfix,
                TokenSubtype::Intersect,
                token.span(),
            ));
        }
    }

    kept
}

fn reclassify(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());

    for token in tokens {
        let binary_context = out.last().is_some_and(|prev| {
            prev.closes_operand() || prev.kind() == TokenKind::OperatorPostfix
        });
        out.push(reclassify_token(token, binary_context));
    }

    out
}

/// Reclassify one token. `binary_context` is `true` when the token to the
/// left can end an operand.
fn reclassify_token(token: Token, binary_context: bool) -> Token {
    match token.kind() {
        TokenKind::OperatorInfix if token.value() == "-" => {
            if binary_context {
                token.with_subtype(TokenSubtype::Math)
            } else {
                token.with_kind(TokenKind::OperatorPrefix)
            }
        }
        TokenKind::OperatorInfix if token.value() == "+" => {
            if binary_context {
                token.with_subtype(TokenSubtype::Math)
            } else {
                token.with_kind(TokenKind::Noop)
            }
        }
        TokenKind::OperatorInfix if token.subtype() == TokenSubtype::None => {
            let subtype = infix_subtype(token.value());
            token.with_subtype(subtype)
        }
        TokenKind::Operand if token.subtype() == TokenSubtype::None => {
            let subtype = operand_subtype(token.value());
            token.with_subtype(subtype)
        }
        // only a single marker is stripped
        TokenKind::Function => match token.value().strip_prefix('@') {
            Some(name) => token.with_value(name),
            None => token,
        },
        _ => token,
    }
}

fn infix_subtype(value: &str) -> TokenSubtype {
    match value.chars().next() {
        Some('<' | '>' | '=') => TokenSubtype::Logical,
        _ if value == "&" => TokenSubtype::Concatenate,
        _ => TokenSubtype::Math,
    }
}

fn operand_subtype(value: &str) -> TokenSubtype {
    if value.parse::<f64>().is_ok() {
        TokenSubtype::Number
    } else if value == "TRUE" || value == "FALSE" {
        TokenSubtype::Logical
    } else {
        TokenSubtype::Range
    }
}
