pub mod block;
pub mod document;
pub mod parser;

pub use block::{Block, BlockId, BlockKind, PropValue, Props, Tab, WidgetReference};
pub use document::Document;
pub use parser::{ParseError, Parser};

/// Parse page source in one call.
pub fn parse(source: &str, file_id: usize) -> Result<Document, Vec<ParseError>> {
    Parser::new(source.to_string(), file_id).parse()
}
