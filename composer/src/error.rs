use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label};
use docpage::ParseError;
use thiserror::Error;

/// A widget reference with no registered factory.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("unresolved widget `{name}`")]
pub struct UnresolvedWidgetError {
    pub name: String,
    pub span: Range<usize>,
    pub file_id: usize,
    /// Closest registered name, if any is similar.
    pub suggestion: Option<String>,
}

impl UnresolvedWidgetError {
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        let mut notes = vec![format!(
            "register a factory for `{}` in the site configuration",
            self.name
        )];
        if let Some(suggestion) = &self.suggestion {
            notes.insert(0, format!("did you mean `{}`?", suggestion));
        }
        Diagnostic::error()
            .with_message(self.to_string())
            .with_labels(vec![
                Label::primary(self.file_id, self.span.clone()).with_message("no such widget"),
            ])
            .with_notes(notes)
    }
}

/// Why a page failed to compose. Both kinds abort the page.
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("{} parse error(s)", .0.len())]
    Parse(Vec<ParseError>),

    #[error("unresolved widget(s): {}", widget_names(.0))]
    Unresolved(Vec<UnresolvedWidgetError>),
}

impl ComposeError {
    /// Diagnostics for the operator running the build.
    pub fn diagnostics(&self) -> Vec<Diagnostic<usize>> {
        match self {
            ComposeError::Parse(errors) => errors.iter().map(|e| e.to_diagnostic()).collect(),
            ComposeError::Unresolved(errors) => {
                errors.iter().map(|e| e.to_diagnostic()).collect()
            }
        }
    }

    /// Names of unresolved widgets, empty for parse failures.
    pub fn unresolved_names(&self) -> Vec<&str> {
        match self {
            ComposeError::Parse(_) => Vec::new(),
            ComposeError::Unresolved(errors) => errors.iter().map(|e| e.name.as_str()).collect(),
        }
    }
}

fn widget_names(errors: &[UnresolvedWidgetError]) -> String {
    errors
        .iter()
        .map(|e| e.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
