//! Error and diagnostic system for the formula parser.
//!
//! Lexing and normalization never fail. Structural problems found while
//! resolving operator precedence or building the tree are reported as a
//! [`Diagnostic`] carrying an [`ErrorCode`], labeled source spans and
//! optional help text.
//!
//! # Example
//!
//! ```
//! # use tidyxls_parser::error::{Diagnostic, ErrorCode};
//! # use tidyxls_parser::Span;
//!
//! let diag = Diagnostic::error("mismatched or misplaced parentheses")
//!     .with_code(ErrorCode::E101)
//!     .with_label(Span::new(6..7), "no matching opening parenthesis")
//!     .with_help("remove the extra `)`");
//!
//! assert_eq!(diag.to_string(), "error[E101]: mismatched or misplaced parentheses");
//! ```

mod diagnostic;
mod error_code;
mod label;

pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;

/// A type alias for `Result<T, Diagnostic>`.
pub type Result<T> = std::result::Result<T, Diagnostic>;
