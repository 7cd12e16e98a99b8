pub mod props;

use std::fmt;
use std::ops::Range;

pub use props::{PropValue, Props, WidgetReference};

/// Identity of a block within one document.
/// Assigned in pre-order (parents before children), starting at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(pub usize);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b{}", self.0)
    }
}

/// One structural unit of a documentation page.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: BlockId,
    pub kind: BlockKind,
    /// Byte span in source for error reporting.
    pub span: Range<usize>,
}

impl Block {
    pub(crate) fn new(kind: BlockKind, span: Range<usize>) -> Self {
        Block {
            id: BlockId(0),
            kind,
            span,
        }
    }

    /// Blocks nested directly inside this one, in render order.
    pub fn children(&self) -> Vec<&Block> {
        match &self.kind {
            BlockKind::TabGroup { tabs, .. } => tabs.iter().flat_map(|t| t.body.iter()).collect(),
            BlockKind::Callout { body, .. } => body.iter().collect(),
            BlockKind::Quote(body) => body.iter().collect(),
            BlockKind::List { items, .. } => items.iter().flatten().collect(),
            _ => Vec::new(),
        }
    }

    fn children_mut(&mut self) -> Vec<&mut Block> {
        match &mut self.kind {
            BlockKind::TabGroup { tabs, .. } => {
                tabs.iter_mut().flat_map(|t| t.body.iter_mut()).collect()
            }
            BlockKind::Callout { body, .. } => body.iter_mut().collect(),
            BlockKind::Quote(body) => body.iter_mut().collect(),
            BlockKind::List { items, .. } => items.iter_mut().flatten().collect(),
            _ => Vec::new(),
        }
    }

    /// Visit this block and every nested block in pre-order.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Block)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }

    /// Short human label for diagnostics and outlines.
    pub fn describe(&self) -> &'static str {
        self.kind.describe()
    }
}

/// Assign pre-order ids to a block tree, continuing from `next`.
pub(crate) fn number_blocks(blocks: &mut [Block], next: &mut usize) {
    for block in blocks {
        block.id = BlockId(*next);
        *next += 1;
        for child in block.children_mut() {
            number_blocks(std::slice::from_mut(child), next);
        }
    }
}

/// Tagged variant over everything a page is made of.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    Heading {
        level: u8,
        content: Vec<InlineNode>,
        /// Explicit anchor from `{#id}` heading attributes.
        anchor: Option<String>,
    },
    Paragraph(Vec<InlineNode>),
    /// Opaque code payload, kept verbatim for a downstream highlighter.
    CodeSample {
        language: Option<String>,
        meta: Option<String>,
        source: String,
    },
    TabGroup {
        group_id: Option<String>,
        tabs: Vec<Tab>,
    },
    Callout {
        kind: CalloutKind,
        title: Option<String>,
        body: Vec<Block>,
    },
    Widget(WidgetReference),
    List {
        start: Option<u64>,
        items: Vec<Vec<Block>>,
    },
    Quote(Vec<Block>),
    Table {
        alignments: Vec<ColumnAlignment>,
        headers: Vec<Vec<InlineNode>>,
        rows: Vec<Vec<Vec<InlineNode>>>,
    },
    Rule,
    /// Raw lowercase HTML passed through untouched.
    Html(String),
}

impl BlockKind {
    pub fn describe(&self) -> &'static str {
        match self {
            BlockKind::Heading { .. } => "heading",
            BlockKind::Paragraph(_) => "paragraph",
            BlockKind::CodeSample { .. } => "code sample",
            BlockKind::TabGroup { .. } => "tab group",
            BlockKind::Callout { .. } => "callout",
            BlockKind::Widget(_) => "widget",
            BlockKind::List { .. } => "list",
            BlockKind::Quote(_) => "quote",
            BlockKind::Table { .. } => "table",
            BlockKind::Rule => "rule",
            BlockKind::Html(_) => "html",
        }
    }
}

/// One labelled panel of a tab group.
#[derive(Debug, Clone, PartialEq)]
pub struct Tab {
    pub label: String,
    /// Stable value used for tab syncing; defaults to the label.
    pub value: String,
    pub default: bool,
    pub body: Vec<Block>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalloutKind {
    Note,
    Tip,
    Info,
    Warning,
    Danger,
}

impl CalloutKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "note" => Some(CalloutKind::Note),
            "tip" => Some(CalloutKind::Tip),
            "info" => Some(CalloutKind::Info),
            "warning" | "caution" => Some(CalloutKind::Warning),
            "danger" => Some(CalloutKind::Danger),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CalloutKind::Note => "note",
            CalloutKind::Tip => "tip",
            CalloutKind::Info => "info",
            CalloutKind::Warning => "warning",
            CalloutKind::Danger => "danger",
        }
    }
}

/// Inline elements that appear within a line of text.
#[derive(Debug, Clone, PartialEq)]
pub enum InlineNode {
    Text(String),
    Strong(Vec<InlineNode>),
    Emphasis(Vec<InlineNode>),
    Strikethrough(Vec<InlineNode>),
    CodeSpan(String),
    Link {
        dest: String,
        title: String,
        content: Vec<InlineNode>,
    },
    Image {
        dest: String,
        title: String,
        alt: Vec<InlineNode>,
    },
    /// Inline lowercase HTML such as `<kbd>`, passed through.
    Html(String),
    SoftBreak,
    HardBreak,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnAlignment {
    None,
    Left,
    Center,
    Right,
}

/// Plain text of a run of inlines, markup stripped.
pub fn plain_text(inlines: &[InlineNode]) -> String {
    let mut out = String::new();
    for inline in inlines {
        push_plain(inline, &mut out);
    }
    out
}

fn push_plain(inline: &InlineNode, out: &mut String) {
    match inline {
        InlineNode::Text(s) | InlineNode::CodeSpan(s) => out.push_str(s),
        InlineNode::Strong(children)
        | InlineNode::Emphasis(children)
        | InlineNode::Strikethrough(children)
        | InlineNode::Link {
            content: children, ..
        }
        | InlineNode::Image { alt: children, .. } => {
            for child in children {
                push_plain(child, out);
            }
        }
        InlineNode::Html(_) => {}
        InlineNode::SoftBreak | InlineNode::HardBreak => out.push(' '),
    }
}

impl BlockKind {
    /// Heading text, if this is a heading.
    pub fn heading_text(&self) -> Option<String> {
        match self {
            BlockKind::Heading { content, .. } => Some(plain_text(content).trim().to_string()),
            _ => None,
        }
    }
}

impl fmt::Display for InlineNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InlineNode::Text(s) => write!(f, "{}", s),
            InlineNode::Strong(children) => {
                write!(f, "**")?;
                for child in children {
                    write!(f, "{}", child)?;
                }
                write!(f, "**")
            }
            InlineNode::Emphasis(children) => {
                write!(f, "*")?;
                for child in children {
                    write!(f, "{}", child)?;
                }
                write!(f, "*")
            }
            InlineNode::Strikethrough(children) => {
                write!(f, "~~")?;
                for child in children {
                    write!(f, "{}", child)?;
                }
                write!(f, "~~")
            }
            InlineNode::CodeSpan(code) => write!(f, "`{}`", code),
            InlineNode::Link { dest, content, .. } => {
                write!(f, "[")?;
                for child in content {
                    write!(f, "{}", child)?;
                }
                write!(f, "]({})", dest)
            }
            InlineNode::Image { dest, alt, .. } => {
                write!(f, "![")?;
                for child in alt {
                    write!(f, "{}", child)?;
                }
                write!(f, "]({})", dest)
            }
            InlineNode::Html(html) => write!(f, "{}", html),
            InlineNode::SoftBreak | InlineNode::HardBreak => writeln!(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn para(text: &str) -> Block {
        Block::new(BlockKind::Paragraph(vec![InlineNode::Text(text.into())]), 0..0)
    }

    #[test]
    fn numbering_is_preorder() {
        let mut blocks = vec![
            para("a"),
            Block::new(
                BlockKind::Callout {
                    kind: CalloutKind::Tip,
                    title: None,
                    body: vec![para("b"), para("c")],
                },
                0..0,
            ),
            para("d"),
        ];
        let mut next = 0;
        number_blocks(&mut blocks, &mut next);

        let mut ids = Vec::new();
        for block in &blocks {
            block.walk(&mut |b| ids.push(b.id.0));
        }
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
        assert_eq!(next, 5);
    }

    #[test]
    fn plain_text_strips_markup() {
        let inlines = vec![
            InlineNode::Text("Using ".into()),
            InlineNode::CodeSpan("useState".into()),
            InlineNode::Strong(vec![InlineNode::Text(" safely".into())]),
        ];
        assert_eq!(plain_text(&inlines), "Using useState safely");
    }

    #[test]
    fn callout_kind_aliases() {
        assert_eq!(CalloutKind::parse("CAUTION"), Some(CalloutKind::Warning));
        assert_eq!(CalloutKind::parse("tip"), Some(CalloutKind::Tip));
        assert_eq!(CalloutKind::parse("shout"), None);
    }
}
