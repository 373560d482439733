//! Error adapter for converting [`TidyxlsError`] to miette diagnostics.
//!
//! Parse errors are rendered against the formula they came from, with the
//! formula name as the source name. Other errors render as plain reports.

use std::fmt;

use miette::{
    Diagnostic as MietteDiagnostic, GraphicalReportHandler, LabeledSpan, NamedSource, SourceSpan,
};

use tidyxls::TidyxlsError;
use tidyxls_parser::{Diagnostic, Span};

/// Source name used for formulas without a name.
const UNNAMED: &str = "formula";

/// Adapter for a single parser diagnostic.
pub struct DiagnosticAdapter<'a> {
    diag: &'a Diagnostic,
    source: NamedSource<String>,
}

impl<'a> DiagnosticAdapter<'a> {
    /// Create a new diagnostic adapter for `diag` raised by formula `src`.
    pub fn new(diag: &'a Diagnostic, name: Option<&str>, src: &str) -> Self {
        Self {
            diag,
            source: NamedSource::new(name.unwrap_or(UNNAMED), src.to_string()),
        }
    }
}

impl fmt::Debug for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticAdapter")
            .field("diag", &self.diag)
            .finish()
    }
}

impl fmt::Display for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.diag.message())
    }
}

impl std::error::Error for DiagnosticAdapter<'_> {}

impl MietteDiagnostic for DiagnosticAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diag
            .code()
            .map(|c| Box::new(c) as Box<dyn fmt::Display>)
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diag
            .help()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.source as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let labels = self.diag.labels();
        if labels.is_empty() {
            return None;
        }

        Some(Box::new(labels.iter().map(|label| {
            let span = span_to_miette(label.span());
            let message = Some(label.message().to_string());
            if label.is_primary() {
                LabeledSpan::new_primary_with_span(message, span)
            } else {
                LabeledSpan::new_with_span(message, span)
            }
        })))
    }
}

/// Adapter for [`TidyxlsError`] variants without source locations.
pub struct ErrorAdapter<'a>(pub &'a TidyxlsError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            TidyxlsError::Io(_) => "tidyxls::io",
            TidyxlsError::Parse { .. } => return None,
            TidyxlsError::Cycle(_) => "tidyxls::cycle",
            TidyxlsError::Config(_) => "tidyxls::config",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match &self.0 {
            TidyxlsError::Cycle(_) => Some(Box::new(
                "remove one of the references so that no formula depends on itself",
            )),
            _ => None,
        }
    }
}

/// A reportable error that can be rendered by miette.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A diagnostic with source location information.
    Diagnostic(DiagnosticAdapter<'a>),
    /// A simple error without source location.
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Diagnostic(d) => fmt::Display::fmt(d, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Diagnostic(_) => None,
            Reportable::Error(e) => e.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.help(),
            Reportable::Error(e) => e.help(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Diagnostic(d) => d.source_code(),
            Reportable::Error(e) => e.source_code(),
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Reportable::Diagnostic(d) => d.labels(),
            Reportable::Error(e) => e.labels(),
        }
    }
}

fn span_to_miette(span: Span) -> SourceSpan {
    SourceSpan::new(span.start().into(), span.len())
}

/// Wrap a [`TidyxlsError`] for rendering.
pub fn to_reportable(err: &TidyxlsError) -> Reportable<'_> {
    match err {
        TidyxlsError::Parse { err: diag, name, src } => {
            Reportable::Diagnostic(DiagnosticAdapter::new(diag, name.as_deref(), src))
        }
        _ => Reportable::Error(ErrorAdapter(err)),
    }
}

/// Render `err` as a graphical miette report.
pub fn render_report(err: &TidyxlsError) -> String {
    let reportable = to_reportable(err);
    let mut writer = String::new();
    match GraphicalReportHandler::new().render_report(&mut writer, &reportable) {
        Ok(()) => writer,
        Err(_) => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use tidyxls::FormulaBuilder;
    use tidyxls_parser::ErrorCode;

    use super::*;

    fn parse_error(name: &str, formula: &str) -> TidyxlsError {
        FormulaBuilder::default()
            .parse_named(name, formula)
            .ast()
            .unwrap_err()
    }

    #[test]
    fn test_parse_error_is_diagnostic() {
        let err = parse_error("Broken", "=SUM(A1");
        let reportable = to_reportable(&err);

        match &reportable {
            Reportable::Diagnostic(d) => {
                assert_eq!(d.code().unwrap().to_string(), ErrorCode::E102.to_string());
                assert!(d.help().is_some());
            }
            Reportable::Error(_) => panic!("Expected Diagnostic"),
        }
    }

    #[test]
    fn test_source_named_after_formula() {
        let err = parse_error("Broken", "=A1)");
        let report = render_report(&err);
        assert!(report.contains("Broken"));
        assert!(report.contains("E101"));
    }

    #[test]
    fn test_unnamed_formula_source() {
        let err = FormulaBuilder::default().parse("=(A1").ast().unwrap_err();
        assert!(render_report(&err).contains(&format!("{UNNAMED}:1:")));
    }

    #[test]
    fn test_non_parse_error() {
        let err = TidyxlsError::Config("bad separator".to_string());
        let reportable = to_reportable(&err);

        match &reportable {
            Reportable::Error(e) => {
                assert_eq!(e.to_string(), "Configuration error: bad separator");
                assert_eq!(e.code().unwrap().to_string(), "tidyxls::config");
            }
            Reportable::Diagnostic(_) => panic!("Expected Error"),
        }
    }

    #[test]
    fn test_labels_keep_primary_flag() {
        let diag = Diagnostic::error("error with labels")
            .with_label(Span::new(0..2), "primary")
            .with_secondary_label(Span::new(3..5), "secondary");
        let adapter = DiagnosticAdapter::new(&diag, Some("F"), "A1+B1");

        let labels: Vec<_> = adapter.labels().unwrap().collect();
        assert_eq!(labels.len(), 2);
        assert!(labels[0].primary());
        assert_eq!(labels[0].label(), Some("primary"));
        assert!(!labels[1].primary());
        assert_eq!(labels[1].offset(), 3);
    }
}
