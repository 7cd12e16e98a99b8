use codespan_reporting::diagnostic::Diagnostic;
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};

/// Source database plus a stderr writer for codespan diagnostics.
pub struct Reporter {
    files: SimpleFiles<String, String>,
    writer: StandardStream,
    config: term::Config,
}

impl Reporter {
    pub fn new(no_color: bool) -> Self {
        let color_choice = if no_color {
            ColorChoice::Never
        } else {
            ColorChoice::Auto
        };
        Reporter {
            files: SimpleFiles::new(),
            writer: StandardStream::stderr(color_choice),
            config: term::Config::default(),
        }
    }

    /// Register a source file; the returned id goes into spans.
    pub fn add(&mut self, name: String, source: String) -> usize {
        self.files.add(name, source)
    }

    pub fn emit(&self, diagnostics: &[Diagnostic<usize>]) {
        for diagnostic in diagnostics {
            let _ = term::emit_to_write_style(
                &mut self.writer.lock(),
                &self.config,
                &self.files,
                diagnostic,
            );
        }
    }
}
