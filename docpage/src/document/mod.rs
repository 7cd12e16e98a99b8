use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

use serde::Deserialize;

use crate::block::{Block, BlockId, BlockKind};

/// A parsed documentation page: metadata plus blocks in render order.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub frontmatter: Option<Frontmatter>,
    pub esm: Vec<EsmStatement>,
    pub blocks: Vec<Block>,
    /// The source file ID (for error reporting with codespan-reporting).
    pub source_id: usize,
}

impl Document {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Visit every block, nested ones included, in render order.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Block)) {
        for block in &self.blocks {
            block.walk(visit);
        }
    }

    /// Total number of blocks in the tree.
    pub fn block_count(&self) -> usize {
        let mut n = 0;
        self.walk(&mut |_| n += 1);
        n
    }

    pub fn find(&self, id: BlockId) -> Option<&Block> {
        let mut found = None;
        self.walk(&mut |b| {
            if b.id == id {
                found = Some(b);
            }
        });
        found
    }

    /// Page title: frontmatter `title`, else the first level-1 heading.
    pub fn title(&self) -> Option<String> {
        if let Some(title) = self.frontmatter.as_ref().and_then(|f| f.title.clone()) {
            return Some(title);
        }
        self.blocks.iter().find_map(|b| match &b.kind {
            BlockKind::Heading { level: 1, .. } => b.kind.heading_text(),
            _ => None,
        })
    }
}

/// YAML metadata block at the top of a page.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Frontmatter {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sidebar_label: Option<String>,
    #[serde(default)]
    pub sidebar_position: Option<f64>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EsmKind {
    Import,
    Export,
}

/// An MDX `import` or `export` statement. Kept for tooling, never rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct EsmStatement {
    pub kind: EsmKind,
    pub statement: String,
    /// Local names bound by an import.
    pub bindings: Vec<String>,
    /// Module specifier of an import.
    pub module: Option<String>,
    pub span: Range<usize>,
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for block in &self.blocks {
            write_tree(f, block, 0)?;
        }
        Ok(())
    }
}

fn write_tree(f: &mut fmt::Formatter<'_>, block: &Block, depth: usize) -> fmt::Result {
    let pad = "  ".repeat(depth);
    match &block.kind {
        BlockKind::Heading { level, .. } => writeln!(
            f,
            "{}{} {} {}",
            pad,
            block.id,
            "#".repeat(*level as usize),
            block.kind.heading_text().unwrap_or_default()
        )?,
        BlockKind::CodeSample { language, .. } => writeln!(
            f,
            "{}{} code sample ({})",
            pad,
            block.id,
            language.as_deref().unwrap_or("plain")
        )?,
        BlockKind::Widget(widget) => writeln!(f, "{}{} {}", pad, block.id, widget)?,
        BlockKind::TabGroup { tabs, .. } => {
            writeln!(f, "{}{} tab group", pad, block.id)?;
            for tab in tabs {
                writeln!(f, "{}  [{}]", pad, tab.label)?;
                for child in &tab.body {
                    write_tree(f, child, depth + 2)?;
                }
            }
            return Ok(());
        }
        BlockKind::Callout { kind, .. } => {
            writeln!(f, "{}{} callout ({})", pad, block.id, kind.as_str())?
        }
        other => writeln!(f, "{}{} {}", pad, block.id, other.describe())?,
    }
    for child in block.children() {
        write_tree(f, child, depth + 1)?;
    }
    Ok(())
}
