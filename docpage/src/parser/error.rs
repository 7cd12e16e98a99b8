use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label};

/// Parse errors with source location information.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub span: Range<usize>,
    pub file_id: usize,
    /// The kind of block being parsed when the error was found.
    pub block: Option<&'static str>,
    pub notes: Vec<String>,
}

impl ParseError {
    pub fn error(message: impl Into<String>, span: Range<usize>, file_id: usize) -> Self {
        ParseError {
            message: message.into(),
            span,
            file_id,
            block: None,
            notes: Vec::new(),
        }
    }

    pub fn in_block(mut self, block: &'static str) -> Self {
        self.block = Some(block);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Move the span from fragment coordinates into page coordinates.
    pub(crate) fn remapped(mut self, to_page: impl Fn(Range<usize>) -> Range<usize>) -> Self {
        self.span = to_page(self.span);
        self
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        let mut label = Label::primary(self.file_id, self.span.clone());
        if let Some(block) = self.block {
            label = label.with_message(format!("in this {}", block));
        }
        Diagnostic::error()
            .with_message(&self.message)
            .with_labels(vec![label])
            .with_notes(self.notes.clone())
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.block {
            Some(block) => write!(f, "{} ({})", self.message, block),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ParseError {}
