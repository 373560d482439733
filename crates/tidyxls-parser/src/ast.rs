//! Formula syntax tree.
//!
//! [`build_ast`] reduces the postfix sequence produced by
//! [`to_rpn`](crate::rpn::to_rpn) into a tree of [`Node`]s. Each node owns its
//! children; the tree is never mutated after construction.

use std::fmt;

use log::trace;

use crate::{
    error::{Diagnostic, ErrorCode, Result},
    rpn::RpnItem,
    span::Span,
    token::Token,
};

/// Operator position relative to its operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fixity {
    Prefix,
    Infix,
    Postfix,
}

/// The role of a node in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A literal: number, text, logical or error value.
    Operand,
    /// A reference or name, not validated.
    Range,
    Operator(Fixity),
    Function { arg_count: usize },
}

impl NodeKind {
    /// Number of children a node of this kind takes.
    pub fn arity(&self) -> usize {
        match self {
            NodeKind::Operand | NodeKind::Range => 0,
            NodeKind::Operator(Fixity::Infix) => 2,
            NodeKind::Operator(Fixity::Prefix | Fixity::Postfix) => 1,
            NodeKind::Function { arg_count } => *arg_count,
        }
    }
}

/// A node of the formula tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    token: Token,
    kind: NodeKind,
    args: Vec<Node>,
}

impl Node {
    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Children in left-to-right order.
    pub fn args(&self) -> &[Node] {
        &self.args
    }

    /// The token value: function name, operator symbol or operand text.
    pub fn value(&self) -> &str {
        self.token.value()
    }

    pub fn span(&self) -> Span {
        self.token.span()
    }

    /// Span covering this node and all of its descendants.
    pub fn extent(&self) -> Span {
        self.iter()
            .map(Node::span)
            .fold(self.span(), |extent, span| extent.union(span))
    }

    /// Pre-order traversal of this node and its descendants.
    ///
    /// The iterator borrows the tree, so it can be created any number of
    /// times.
    pub fn iter(&self) -> Preorder<'_> {
        Preorder { stack: vec![self] }
    }
}

impl<'a> IntoIterator for &'a Node {
    type Item = &'a Node;
    type IntoIter = Preorder<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Writes the tree as an s-expression, e.g. `(SUM A1 (+ 1 2))`.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = if self.token.is_text() {
            format!("\"{}\"", self.token.value())
        } else {
            self.token.value().to_string()
        };

        if let NodeKind::Function { .. } | NodeKind::Operator(_) = self.kind {
            write!(f, "({value}")?;
            for arg in &self.args {
                write!(f, " {arg}")?;
            }
            write!(f, ")")
        } else {
            f.write_str(&value)
        }
    }
}

/// Pre-order iterator over a [`Node`] tree.
#[derive(Debug, Clone)]
pub struct Preorder<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.args.iter().rev());
        Some(node)
    }
}

/// Reduce a postfix sequence to a single tree.
///
/// # Errors
///
/// - `E200` when an item has fewer preceding values than its arity.
/// - `E201` when more than one value remains after reduction.
/// - `E202` when the sequence is empty.
pub fn build_ast(rpn: Vec<RpnItem>) -> Result<Node> {
    let mut values: Vec<Node> = Vec::new();

    for item in rpn {
        let kind = item.kind();
        let arity = kind.arity();

        if values.len() < arity {
            let token = item.token();
            return Err(Diagnostic::error(format!(
                "`{}` expects {arity} operand(s), found {}",
                item.symbol(),
                values.len()
            ))
            .with_code(ErrorCode::E200)
            .with_label(token.span(), "missing operand"));
        }

        let args = values.split_off(values.len() - arity);
        values.push(Node {
            token: item.into_token(),
            kind,
            args,
        });
    }

    let mut values = values.into_iter();
    match (values.next(), values.next()) {
        (Some(root), None) => {
            trace!(nodes = root.iter().count(); "Built syntax tree");
            Ok(root)
        }
        (Some(root), Some(extra)) => Err(Diagnostic::error("formula has more than one expression")
            .with_code(ErrorCode::E201)
            .with_label(extra.extent(), "dangling operand")
            .with_secondary_label(root.extent(), "first expression")
            .with_help("join the expressions with an operator")),
        (None, _) => Err(Diagnostic::error("formula is empty")
            .with_code(ErrorCode::E202)
            .with_label(Span::empty(0), "no expression")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{rpn::to_rpn, tokenize};

    fn ast(formula: &str) -> Result<Node> {
        build_ast(to_rpn(&tokenize(formula))?)
    }

    #[test]
    fn test_function_children_in_order() {
        let root = ast("SUM(A1,B1)").unwrap();
        assert_eq!(root.value(), "SUM");
        assert_eq!(root.kind(), NodeKind::Function { arg_count: 2 });

        let children: Vec<_> = root.args().iter().map(Node::value).collect();
        assert_eq!(children, ["A1", "B1"]);
        assert!(root.args().iter().all(|arg| arg.kind() == NodeKind::Range));
    }

    #[test]
    fn test_sexpr_display() {
        assert_eq!(ast("1+2*3").unwrap().to_string(), "(+ 1 (* 2 3))");
        assert_eq!(ast("-A1").unwrap().to_string(), "(- A1)");
        assert_eq!(
            ast("IF(A1>0,\"Y\",SUM(B1:B3))").unwrap().to_string(),
            "(IF (> A1 0) \"Y\" (SUM B1:B3))"
        );
        assert_eq!(ast("NOW()").unwrap().to_string(), "(NOW)");
    }

    #[test]
    fn test_preorder_is_restartable() {
        let root = ast("SUM(A1,MAX(B1,2))").unwrap();
        let first: Vec<_> = root.iter().map(Node::value).collect();
        let second: Vec<_> = (&root).into_iter().map(Node::value).collect();

        assert_eq!(first, ["SUM", "A1", "MAX", "B1", "2"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_arity() {
        assert_eq!(NodeKind::Operator(Fixity::Infix).arity(), 2);
        assert_eq!(NodeKind::Operator(Fixity::Postfix).arity(), 1);
        assert_eq!(NodeKind::Function { arg_count: 4 }.arity(), 4);
        assert_eq!(NodeKind::Range.arity(), 0);
    }

    #[test]
    fn test_missing_operand() {
        let err = ast("1+").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E200));
    }

    #[test]
    fn test_dangling_operand() {
        let err = ast("(1)(2)").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::E201));
    }

    #[test]
    fn test_extent_covers_descendants() {
        let root = ast("=SUM(A1,B1*2)").unwrap();
        assert_eq!(root.span(), Span::new(1..5));
        assert_eq!(root.extent(), Span::new(1..12));
        assert_eq!(root.args()[1].extent(), Span::new(8..12));
    }

    #[test]
    fn test_dangling_operand_labels_whole_expressions() {
        let err = ast("(A1+1)(B1*2)").unwrap_err();
        let spans: Vec<_> = err.labels().iter().map(|label| label.span()).collect();
        assert_eq!(err.code(), Some(ErrorCode::E201));
        assert_eq!(spans, [Span::new(7..11), Span::new(1..5)]);
    }

    #[test]
    fn test_empty_formula() {
        assert_eq!(ast("").unwrap_err().code(), Some(ErrorCode::E202));
        assert_eq!(ast("=").unwrap_err().code(), Some(ErrorCode::E202));
    }
}
