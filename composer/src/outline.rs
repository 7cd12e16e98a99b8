use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;

use docpage::{BlockId, BlockKind, Document};

/// One entry of the page's table of contents.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineEntry {
    pub level: u8,
    pub text: String,
    pub anchor: String,
    pub block: BlockId,
}

/// Navigation for a page: TOC entries plus an anchor for every heading.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outline {
    pub entries: Vec<OutlineEntry>,
    anchors: BTreeMap<BlockId, String>,
}

impl Outline {
    /// Anchors cover every heading; the TOC only lists top-level headings
    /// whose level falls in `levels`.
    pub fn build(document: &Document, levels: RangeInclusive<u8>) -> Self {
        let mut used = BTreeSet::new();
        let mut anchors = BTreeMap::new();

        // Explicit anchors are claimed first so generated slugs never collide with them.
        document.walk(&mut |block| {
            if let BlockKind::Heading {
                anchor: Some(anchor),
                ..
            } = &block.kind
            {
                used.insert(anchor.clone());
                anchors.insert(block.id, anchor.clone());
            }
        });

        document.walk(&mut |block| {
            if anchors.contains_key(&block.id) {
                return;
            }
            if let Some(text) = block.kind.heading_text() {
                let anchor = unique_slug(&slugify(&text), &mut used);
                anchors.insert(block.id, anchor);
            }
        });

        let entries = document
            .blocks
            .iter()
            .filter_map(|block| match &block.kind {
                BlockKind::Heading { level, .. } if levels.contains(level) => Some(OutlineEntry {
                    level: *level,
                    text: block.kind.heading_text().unwrap_or_default(),
                    anchor: anchors.get(&block.id).cloned().unwrap_or_default(),
                    block: block.id,
                }),
                _ => None,
            })
            .collect();

        Outline { entries, anchors }
    }

    pub fn anchor(&self, id: BlockId) -> Option<&str> {
        self.anchors.get(&id).map(|s| s.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// GitHub-style heading slug: lowercase, spaces to dashes, punctuation dropped.
pub fn slugify(text: &str) -> String {
    let slug: String = text
        .trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('-'),
            '-' | '_' => Some(c),
            c if c.is_alphanumeric() => Some(c),
            _ => None,
        })
        .collect();
    if slug.is_empty() {
        "section".to_string()
    } else {
        slug
    }
}

fn unique_slug(base: &str, used: &mut BTreeSet<String>) -> String {
    if used.insert(base.to_string()) {
        return base.to_string();
    }
    let mut n = 1;
    loop {
        let candidate = format!("{}-{}", base, n);
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outline(src: &str) -> Outline {
        let doc = docpage::parse(src, 0).unwrap();
        Outline::build(&doc, 2..=3)
    }

    #[test]
    fn slugs_follow_github_rules() {
        assert_eq!(slugify("Using `useEffect` Safely!"), "using-useeffect-safely");
        assert_eq!(slugify("  State & Refs  "), "state--refs");
        assert_eq!(slugify("???"), "section");
    }

    #[test]
    fn duplicates_get_suffixes() {
        let o = outline("## Example\n\n## Example\n\n## Example\n");
        let anchors: Vec<&str> = o.entries.iter().map(|e| e.anchor.as_str()).collect();
        assert_eq!(anchors, vec!["example", "example-1", "example-2"]);
    }

    #[test]
    fn explicit_anchor_wins_over_generated() {
        let o = outline("## Cleanup\n\n## Teardown {#cleanup}\n");
        let anchors: Vec<&str> = o.entries.iter().map(|e| e.anchor.as_str()).collect();
        assert_eq!(anchors, vec!["cleanup-1", "cleanup"]);
    }

    #[test]
    fn toc_respects_levels_but_anchors_cover_all() {
        let src = "# Title\n\n## Section\n\n#### Deep\n\n<Callout>\n\n## Inside\n\n</Callout>\n";
        let doc = docpage::parse(src, 0).unwrap();
        let o = Outline::build(&doc, 2..=3);
        let texts: Vec<&str> = o.entries.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["Section"]);

        let mut heading_ids = Vec::new();
        doc.walk(&mut |b| {
            if b.kind.heading_text().is_some() {
                heading_ids.push(b.id);
            }
        });
        assert_eq!(heading_ids.len(), 4);
        assert!(heading_ids.iter().all(|id| o.anchor(*id).is_some()));
    }
}
