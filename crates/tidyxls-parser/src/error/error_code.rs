//! Error codes for the formula diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E1xx` - Precedence parsing errors
//! - `E2xx` - Tree building errors

use std::fmt;

/// Error codes for categorizing diagnostic errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Precedence Parsing Errors (E1xx)
    // =========================================================================
    /// Argument separator outside of any argument list.
    ///
    /// A separator was found with no open function call or array to belong to.
    E100,

    /// Closing parenthesis without a matching opening one.
    E101,

    /// Construct left open.
    ///
    /// A function call, subexpression or array was still open when the
    /// formula ended.
    E102,

    /// Unknown operator.
    ///
    /// An operator token has no entry in the precedence table.
    E103,

    // =========================================================================
    // Tree Building Errors (E2xx)
    // =========================================================================
    /// Missing operand.
    ///
    /// An operator or function needs more operands than precede it,
    /// e.g. `1+`.
    E200,

    /// Dangling operand.
    ///
    /// More than one expression remains once the formula is reduced,
    /// e.g. `(1)(2)`.
    E201,

    /// Empty formula.
    ///
    /// The formula contains no expression at all.
    E202,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E100").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E103 => "E103",
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E100 => "misplaced argument separator",
            ErrorCode::E101 => "unmatched closing parenthesis",
            ErrorCode::E102 => "unclosed parenthesis",
            ErrorCode::E103 => "unknown operator",
            ErrorCode::E200 => "missing operand",
            ErrorCode::E201 => "dangling operand",
            ErrorCode::E202 => "empty formula",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
