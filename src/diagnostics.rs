//! Render IR errors against their source with ariadne.

use std::io::IsTerminal;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use sprig_ir::{IrError, IrErrorKind};

/// Short code shown in the report header.
pub fn error_code(kind: &IrErrorKind) -> &'static str {
    match kind {
        IrErrorKind::Lex { .. } => "lex",
        IrErrorKind::UnexpectedToken { .. } => "unexpected-token",
        IrErrorKind::UnknownOperation { .. } => "unknown-operation",
        IrErrorKind::UnknownType { .. } => "unknown-type",
        IrErrorKind::UndefinedValue { .. } => "undefined-value",
        IrErrorKind::Redefinition { .. } => "redefinition",
        IrErrorKind::TypeMismatch { .. } => "type-mismatch",
        IrErrorKind::DuplicateRegistration { .. } => "duplicate-registration",
        IrErrorKind::Verification { .. } => "verification",
    }
}

/// Get the label color for an error kind.
pub fn error_color(kind: &IrErrorKind) -> Color {
    match kind {
        IrErrorKind::Lex { .. } | IrErrorKind::UnexpectedToken { .. } => Color::Red,
        IrErrorKind::UnknownOperation { .. } | IrErrorKind::UnknownType { .. } => Color::Yellow,
        IrErrorKind::UndefinedValue { .. } | IrErrorKind::Redefinition { .. } => Color::Magenta,
        IrErrorKind::TypeMismatch { .. } | IrErrorKind::Verification { .. } => Color::Cyan,
        IrErrorKind::DuplicateRegistration { .. } => Color::Blue,
    }
}

/// Clamp a span into the source and make it non-empty (required by ariadne).
pub fn normalize_span(start: usize, end: usize, len: usize) -> (usize, usize) {
    let start = start.min(len);
    (start, end.clamp(start + 1, len.max(start + 1)))
}

/// Render one error. Errors without a span get a header and no label.
pub fn render(error: &IrError, source: &str, file_path: &str, color: bool) -> String {
    let kind = error.kind();
    let (start, end) = match error.span() {
        Some(span) => normalize_span(span.start, span.end, source.len()),
        None => (0, 0),
    };
    let mut report = Report::build(ReportKind::Error, (file_path, start..end))
        .with_config(Config::default().with_color(color))
        .with_code(error_code(kind))
        .with_message(error.to_string());
    if error.span().is_some() {
        report = report.with_label(
            Label::new((file_path, start..end))
                .with_message(kind.to_string())
                .with_color(error_color(kind)),
        );
    }

    let mut out = Vec::new();
    // Writing into a Vec only fails if the report itself is malformed.
    if report
        .finish()
        .write((file_path, Source::from(source)), &mut out)
        .is_err()
    {
        return format!("error: {error}\n");
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Print every error to stderr, colored when stderr is a terminal.
pub fn eprint_errors(errors: &[IrError], source: &str, file_path: &str) {
    let color = std::io::stderr().is_terminal();
    for error in errors {
        eprint!("{}", render(error, source, file_path, color));
    }
}
