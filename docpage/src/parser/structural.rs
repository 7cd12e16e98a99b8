use std::ops::Range;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser as CmarkParser, Tag, TagEnd};

use crate::block::{
    Block, BlockKind, CalloutKind, ColumnAlignment, InlineNode, PropValue, Props, Tab,
    WidgetReference, number_blocks,
};
use crate::document::{Document, EsmStatement, Frontmatter};
use crate::parser::component::{self, ComponentTag, Segment};
use crate::parser::error::ParseError;
use crate::parser::esm;

type Events<'e> = [(Event<'e>, Range<usize>)];

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse page source into a Document with pre-order block ids.
pub fn parse_document(source: &str, file_id: usize) -> Result<Document, Vec<ParseError>> {
    let events = markdown_events(source, true);

    let mut state = ParseState::new(source, file_id, LineMap::identity(), true);
    let mut i = 0;
    let mut blocks = state.collect_blocks(&events, &mut i, None);

    if !state.errors.is_empty() {
        return Err(state.errors);
    }

    let mut next = 0;
    number_blocks(&mut blocks, &mut next);
    tracing::debug!(file_id, blocks = next, esm = state.esm.len(), "parsed document");

    Ok(Document {
        frontmatter: state.frontmatter,
        esm: state.esm,
        blocks,
        source_id: file_id,
    })
}

fn markdown_events(source: &str, top_level: bool) -> Vec<(Event<'_>, Range<usize>)> {
    let mut options =
        Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES | Options::ENABLE_HEADING_ATTRIBUTES;
    if top_level {
        options |= Options::ENABLE_YAML_STYLE_METADATA_BLOCKS;
    }
    CmarkParser::new_ext(source, options)
        .into_offset_iter()
        .collect()
}

// ---------------------------------------------------------------------------
// Parse state
// ---------------------------------------------------------------------------

/// Maps byte positions in a parsed fragment back to the page. Fragments
/// may be dedented, so the mapping is linear only within a line.
#[derive(Debug, Clone)]
struct LineMap {
    /// (fragment position, page position) at the start of each line.
    anchors: Vec<(usize, usize)>,
}

impl LineMap {
    fn identity() -> Self {
        LineMap {
            anchors: vec![(0, 0)],
        }
    }

    fn at(&self, pos: usize) -> usize {
        let n = self.anchors.partition_point(|(local, _)| *local <= pos);
        let (local, page) = self.anchors[n.saturating_sub(1)];
        page + pos.saturating_sub(local)
    }
}

struct ParseState<'a> {
    /// Text being parsed: the page, or a fragment between component tags.
    source: &'a str,
    file_id: usize,
    /// Where `source` sits within the page.
    map: LineMap,
    top_level: bool,
    /// Depth of list items and quotes currently being collected.
    nesting: usize,
    frontmatter: Option<Frontmatter>,
    esm: Vec<EsmStatement>,
    errors: Vec<ParseError>,
}

impl<'a> ParseState<'a> {
    fn new(source: &'a str, file_id: usize, map: LineMap, top_level: bool) -> Self {
        ParseState {
            source,
            file_id,
            map,
            top_level,
            nesting: 0,
            frontmatter: None,
            esm: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn span(&self, range: &Range<usize>) -> Range<usize> {
        let start = self.map.at(range.start);
        if range.end > range.start {
            start..self.map.at(range.end - 1) + 1
        } else {
            start..start
        }
    }

    /// Classify events into blocks until `stop` matches an End tag (or input ends).
    fn collect_blocks(
        &mut self,
        events: &Events<'_>,
        i: &mut usize,
        stop: Option<&dyn Fn(&TagEnd) -> bool>,
    ) -> Vec<Block> {
        let mut scope = Scope::new(self.file_id);

        while *i < events.len() {
            let (ref ev, ref range) = events[*i];

            match ev {
                Event::End(end) if stop.is_some_and(|s| s(end)) => {
                    *i += 1;
                    break;
                }

                Event::Start(Tag::MetadataBlock(_)) => {
                    *i += 1;
                    let text = collect_text_until(events, i, |e| {
                        matches!(e, TagEnd::MetadataBlock(_))
                    });
                    self.frontmatter(&text, range);
                }

                Event::Start(Tag::Heading { level, id, .. }) => {
                    let level = heading_level_to_u8(level);
                    let anchor = id.as_ref().map(|id| id.to_string());
                    *i += 1;
                    let content = self.collect_inlines(events, i, &|e| {
                        matches!(e, TagEnd::Heading(_))
                    });
                    let block = Block::new(
                        BlockKind::Heading {
                            level,
                            content,
                            anchor,
                        },
                        self.span(range),
                    );
                    scope.push(block);
                }

                Event::Start(Tag::Paragraph) => {
                    self.paragraph(events, i, &mut scope);
                }

                // Indentation is layout in MDX, never a code block.
                Event::Start(Tag::CodeBlock(CodeBlockKind::Indented)) => {
                    *i += 1;
                    collect_text_until(events, i, |e| matches!(e, TagEnd::CodeBlock));
                    let source = self.source;
                    let start = source[..range.start]
                        .trim_end_matches([' ', '\t'])
                        .len();
                    for block in self.parse_fragment(&source[start..range.end], start) {
                        scope.push(block);
                    }
                }

                // Code block = opaque sample, kept verbatim
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                    let (language, meta) = split_info_string(info);
                    *i += 1;
                    let source = collect_text_until(events, i, |e| matches!(e, TagEnd::CodeBlock));
                    let block = Block::new(
                        BlockKind::CodeSample {
                            language,
                            meta,
                            source,
                        },
                        self.span(range),
                    );
                    scope.push(block);
                }

                Event::Start(Tag::List(start)) => {
                    let start = *start;
                    *i += 1;
                    self.nesting += 1;
                    let items = self.collect_list(events, i);
                    self.nesting -= 1;
                    scope.push(Block::new(BlockKind::List { start, items }, self.span(range)));
                }

                Event::Start(Tag::BlockQuote(_)) => {
                    *i += 1;
                    self.nesting += 1;
                    let stop: &dyn Fn(&TagEnd) -> bool = &|e| matches!(e, TagEnd::BlockQuote(_));
                    let body = self.collect_blocks(events, i, Some(stop));
                    self.nesting -= 1;
                    scope.push(Block::new(BlockKind::Quote(body), self.span(range)));
                }

                Event::Start(Tag::Table(alignments)) => {
                    let alignments: Vec<ColumnAlignment> = alignments
                        .iter()
                        .map(|a| match a {
                            pulldown_cmark::Alignment::None => ColumnAlignment::None,
                            pulldown_cmark::Alignment::Left => ColumnAlignment::Left,
                            pulldown_cmark::Alignment::Center => ColumnAlignment::Center,
                            pulldown_cmark::Alignment::Right => ColumnAlignment::Right,
                        })
                        .collect();
                    *i += 1;
                    let (headers, rows) = self.collect_table(events, i);
                    let block = Block::new(
                        BlockKind::Table {
                            alignments,
                            headers,
                            rows,
                        },
                        self.span(range),
                    );
                    scope.push(block);
                }

                Event::Start(Tag::HtmlBlock) => {
                    *i += 1;
                    let (text, start) = collect_html(events, i, range.start);
                    self.markup(&text, start, &mut scope);
                }

                Event::Rule => {
                    scope.push(Block::new(BlockKind::Rule, self.span(range)));
                    *i += 1;
                }

                // Tight list items carry inlines without a paragraph wrapper
                ev if is_inline_start(ev) => {
                    let start = range.start;
                    let mut end = range.end;
                    let mut inlines = Vec::new();
                    while *i < events.len() && is_inline_start(&events[*i].0) {
                        end = events[*i].1.end;
                        if let Some(node) = self.inline_at(events, i) {
                            inlines.push(node);
                        }
                    }
                    scope.push(Block::new(BlockKind::Paragraph(inlines), self.span(&(start..end))));
                }

                _ => {
                    *i += 1;
                }
            }
        }

        let (blocks, errors) = scope.finish();
        self.errors.extend(errors);
        blocks
    }

    fn frontmatter(&mut self, text: &str, range: &Range<usize>) {
        if text.trim().is_empty() {
            self.frontmatter = Some(Frontmatter::default());
            return;
        }
        match serde_yaml::from_str::<Frontmatter>(text) {
            Ok(fm) => self.frontmatter = Some(fm),
            Err(e) => self.errors.push(
                ParseError::error(format!("invalid frontmatter: {}", e), self.span(range), self.file_id)
                    .in_block("frontmatter"),
            ),
        }
    }

    /// A paragraph is prose, an MDX comment, ESM, or component markup.
    fn paragraph(&mut self, events: &Events<'_>, i: &mut usize, scope: &mut Scope) {
        let range = events[*i].1.clone();
        let first = *i;
        *i += 1;
        let inlines = self.collect_inlines(events, i, &|e| matches!(e, TagEnd::Paragraph));
        let source = self.source;
        let raw = &source[range.clone()];
        let trimmed = raw.trim();

        if trimmed.starts_with("{/*") && trimmed.ends_with("*/}") {
            return;
        }

        if self.top_level && self.nesting == 0 && scope.at_root() && esm::looks_like_esm(raw) {
            match esm::parse_esm(raw, self.map.at(range.start), self.file_id) {
                Ok(statements) => self.esm.extend(statements),
                Err(err) => self.errors.push(err),
            }
            return;
        }

        if component::starts_with_component_tag(trimmed) {
            if let Some(tag) = component::tag_beside_prose(raw) {
                let span = self.span(&(range.start + tag.start..range.start + tag.end));
                self.errors.push(prose_error(span, self.file_id));
                return;
            }
            self.markup(raw, range.start, scope);
            return;
        }

        let inline_tag = events[first..*i].iter().find(|(e, _)| {
            matches!(e, Event::InlineHtml(html) if component::has_component_tag(html))
        });
        if let Some((_, tag_range)) = inline_tag {
            let span = self.span(tag_range);
            self.errors.push(prose_error(span, self.file_id));
            return;
        }

        scope.push(Block::new(BlockKind::Paragraph(inlines), self.span(&range)));
    }

    /// Handle HTML or component markup found at `local_start` in `self.source`.
    fn markup(&mut self, text: &str, local_start: usize, scope: &mut Scope) {
        let to_page = |r: Range<usize>| self.span(&(local_start + r.start..local_start + r.end));

        if !component::has_component_tag(text) {
            if !is_only_comments(text) {
                let html = text.trim_end_matches('\n').to_string();
                scope.push(Block::new(BlockKind::Html(html), to_page(0..text.len())));
            }
            return;
        }

        let segments = match component::lex(text, self.file_id) {
            Ok(segments) => segments,
            Err(err) => {
                let err = err.remapped(to_page);
                self.errors.push(err);
                return;
            }
        };

        for segment in segments {
            match segment {
                Segment::Text { text, offset } => {
                    if text.trim().is_empty() {
                        continue;
                    }
                    for block in self.parse_fragment(text, local_start + offset) {
                        scope.push(block);
                    }
                }
                Segment::Open(mut tag) => {
                    tag.span = self.span(&(local_start + tag.span.start..local_start + tag.span.end));
                    scope.open(tag)
                }
                Segment::SelfClosing(mut tag) => {
                    tag.span = self.span(&(local_start + tag.span.start..local_start + tag.span.end));
                    scope.self_closing(tag)
                }
                Segment::Close { name, span } => {
                    scope.close(&name, self.span(&(local_start + span.start..local_start + span.end)))
                }
            }
        }
    }

    /// Parse text between component tags with the same classification rule.
    /// Indentation shared by the whole fragment is stripped first.
    fn parse_fragment(&mut self, fragment: &str, local_offset: usize) -> Vec<Block> {
        let (text, lines) = dedent(fragment);
        let map = LineMap {
            anchors: lines
                .into_iter()
                .map(|(out, input)| (out, self.map.at(local_offset + input)))
                .collect(),
        };
        let events = markdown_events(&text, false);
        let mut child = ParseState::new(&text, self.file_id, map, false);
        let mut i = 0;
        let blocks = child.collect_blocks(&events, &mut i, None);
        self.errors.extend(child.errors);
        blocks
    }

    fn collect_list(&mut self, events: &Events<'_>, i: &mut usize) -> Vec<Vec<Block>> {
        let mut items = Vec::new();

        while *i < events.len() {
            match &events[*i].0 {
                Event::End(TagEnd::List(_)) => {
                    *i += 1;
                    break;
                }
                Event::Start(Tag::Item) => {
                    *i += 1;
                    let stop: &dyn Fn(&TagEnd) -> bool = &|e| matches!(e, TagEnd::Item);
                    let body = self.collect_blocks(events, i, Some(stop));
                    items.push(body);
                }
                _ => {
                    *i += 1;
                }
            }
        }

        items
    }

    /// Collect inline nodes until a matching End tag.
    fn collect_inlines(
        &self,
        events: &Events<'_>,
        i: &mut usize,
        is_end: &dyn Fn(&TagEnd) -> bool,
    ) -> Vec<InlineNode> {
        let mut inlines = Vec::new();

        while *i < events.len() {
            match &events[*i].0 {
                Event::End(tag_end) if is_end(tag_end) => {
                    *i += 1;
                    break;
                }
                _ => match self.inline_at(events, i) {
                    Some(node) => inlines.push(node),
                    None => *i += 1,
                },
            }
        }

        inlines
    }

    /// Consume one inline element at `i`. Returns None (without advancing) for
    /// anything that is not inline.
    fn inline_at(&self, events: &Events<'_>, i: &mut usize) -> Option<InlineNode> {
        let node = match &events[*i].0 {
            Event::Text(s) => InlineNode::Text(s.to_string()),
            Event::Code(s) => InlineNode::CodeSpan(s.to_string()),
            Event::InlineHtml(s) | Event::Html(s) => InlineNode::Html(s.to_string()),
            Event::SoftBreak => InlineNode::SoftBreak,
            Event::HardBreak => InlineNode::HardBreak,
            Event::Start(Tag::Strong) => {
                *i += 1;
                let children = self.collect_inlines(events, i, &|e| matches!(e, TagEnd::Strong));
                return Some(InlineNode::Strong(children));
            }
            Event::Start(Tag::Emphasis) => {
                *i += 1;
                let children = self.collect_inlines(events, i, &|e| matches!(e, TagEnd::Emphasis));
                return Some(InlineNode::Emphasis(children));
            }
            Event::Start(Tag::Strikethrough) => {
                *i += 1;
                let children =
                    self.collect_inlines(events, i, &|e| matches!(e, TagEnd::Strikethrough));
                return Some(InlineNode::Strikethrough(children));
            }
            Event::Start(Tag::Link { dest_url, title, .. }) => {
                let dest = dest_url.to_string();
                let title = title.to_string();
                *i += 1;
                let content = self.collect_inlines(events, i, &|e| matches!(e, TagEnd::Link));
                return Some(InlineNode::Link { dest, title, content });
            }
            Event::Start(Tag::Image { dest_url, title, .. }) => {
                let dest = dest_url.to_string();
                let title = title.to_string();
                *i += 1;
                let alt = self.collect_inlines(events, i, &|e| matches!(e, TagEnd::Image));
                return Some(InlineNode::Image { dest, title, alt });
            }
            _ => return None,
        };
        *i += 1;
        Some(node)
    }

    /// Collect table headers and rows.
    fn collect_table(
        &self,
        events: &Events<'_>,
        i: &mut usize,
    ) -> (Vec<Vec<InlineNode>>, Vec<Vec<Vec<InlineNode>>>) {
        let mut headers: Vec<Vec<InlineNode>> = Vec::new();
        let mut rows: Vec<Vec<Vec<InlineNode>>> = Vec::new();
        let mut in_head = false;
        let mut current_row: Vec<Vec<InlineNode>> = Vec::new();

        while *i < events.len() {
            match &events[*i].0 {
                Event::End(TagEnd::Table) => {
                    *i += 1;
                    break;
                }
                Event::Start(Tag::TableHead) => {
                    in_head = true;
                    *i += 1;
                }
                Event::End(TagEnd::TableHead) => {
                    in_head = false;
                    headers = std::mem::take(&mut current_row);
                    *i += 1;
                }
                Event::Start(Tag::TableRow) => {
                    current_row = Vec::new();
                    *i += 1;
                }
                Event::End(TagEnd::TableRow) => {
                    if !in_head {
                        rows.push(std::mem::take(&mut current_row));
                    }
                    *i += 1;
                }
                Event::Start(Tag::TableCell) => {
                    *i += 1;
                    let cell = self.collect_inlines(events, i, &|e| matches!(e, TagEnd::TableCell));
                    current_row.push(cell);
                }
                _ => {
                    *i += 1;
                }
            }
        }

        (headers, rows)
    }
}

// ---------------------------------------------------------------------------
// Component containers
// ---------------------------------------------------------------------------

enum Container {
    Tabs {
        group_id: Option<String>,
        tabs: Vec<Tab>,
    },
    Tab {
        label: String,
        value: String,
        default: bool,
        blocks: Vec<Block>,
    },
    Callout {
        kind: CalloutKind,
        title: Option<String>,
        blocks: Vec<Block>,
    },
    /// A widget opened with children; its content is dropped after reporting.
    Rejected,
}

struct Frame {
    name: String,
    container: Container,
    /// Span of the opening tag.
    open: Range<usize>,
}

/// Open component containers within one run of blocks.
struct Scope {
    file_id: usize,
    root: Vec<Block>,
    frames: Vec<Frame>,
    errors: Vec<ParseError>,
}

impl Scope {
    fn new(file_id: usize) -> Self {
        Scope {
            file_id,
            root: Vec::new(),
            frames: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn at_root(&self) -> bool {
        self.frames.is_empty()
    }

    fn error(&mut self, message: impl Into<String>, span: Range<usize>, block: &'static str) {
        self.errors
            .push(ParseError::error(message, span, self.file_id).in_block(block));
    }

    /// Append a finished block to the innermost open container.
    fn push(&mut self, block: Block) {
        let Some(frame) = self.frames.last_mut() else {
            self.root.push(block);
            return;
        };
        match &mut frame.container {
            Container::Tab { blocks, .. } | Container::Callout { blocks, .. } => blocks.push(block),
            Container::Rejected => {}
            Container::Tabs { .. } => {
                let name = frame.name.clone();
                let err = ParseError::error(
                    format!("content inside `<{}>` must be wrapped in `<Tab>`", name),
                    block.span.clone(),
                    self.file_id,
                )
                .in_block(block.describe());
                self.errors.push(err);
            }
        }
    }

    fn open(&mut self, tag: ComponentTag) {
        let container = match tag.name.as_str() {
            "Tabs" => Container::Tabs {
                group_id: prop_text(&tag.props, "groupId"),
                tabs: Vec::new(),
            },
            "Tab" | "TabItem" => {
                if !matches!(
                    self.frames.last(),
                    Some(Frame { container: Container::Tabs { .. }, .. })
                ) {
                    self.error(
                        format!("`<{}>` must be a direct child of `<Tabs>`", tag.name),
                        tag.span.clone(),
                        "tab group",
                    );
                }
                let label = prop_text(&tag.props, "label");
                let value = prop_text(&tag.props, "value");
                let (label, value) = match (label, value) {
                    (Some(label), Some(value)) => (label, value),
                    (Some(label), None) => (label.clone(), label),
                    (None, Some(value)) => (value.clone(), value),
                    (None, None) => {
                        self.error(
                            format!("`<{}>` needs a `label` or `value`", tag.name),
                            tag.span.clone(),
                            "tab group",
                        );
                        (String::new(), String::new())
                    }
                };
                Container::Tab {
                    label,
                    value,
                    default: is_true(tag.props.get("default")),
                    blocks: Vec::new(),
                }
            }
            "Callout" | "Admonition" => {
                let kind = match prop_text(&tag.props, "type") {
                    None => CalloutKind::Note,
                    Some(ty) => CalloutKind::parse(&ty).unwrap_or_else(|| {
                        self.errors.push(
                            ParseError::error(
                                format!("unknown callout type `{}`", ty),
                                tag.span.clone(),
                                self.file_id,
                            )
                            .in_block("callout")
                            .with_note("expected one of: note, tip, info, warning, danger"),
                        );
                        CalloutKind::Note
                    }),
                };
                Container::Callout {
                    kind,
                    title: prop_text(&tag.props, "title"),
                    blocks: Vec::new(),
                }
            }
            _ => {
                self.errors.push(
                    ParseError::error(
                        format!("widget `<{}>` must be self-closing", tag.name),
                        tag.span.clone(),
                        self.file_id,
                    )
                    .in_block("widget")
                    .with_note(format!("write `<{} />`; pass content as props", tag.name)),
                );
                Container::Rejected
            }
        };

        self.frames.push(Frame {
            name: tag.name,
            container,
            open: tag.span,
        });
    }

    fn self_closing(&mut self, tag: ComponentTag) {
        match tag.name.as_str() {
            "Tabs" => self.error(
                "tab group has no tabs",
                tag.span.clone(),
                "tab group",
            ),
            "Tab" | "TabItem" | "Callout" | "Admonition" => {
                let name = tag.name.clone();
                let end = tag.span.clone();
                self.open(tag);
                self.close(&name, end);
            }
            _ => {
                let block = Block::new(
                    BlockKind::Widget(WidgetReference {
                        name: tag.name,
                        props: tag.props,
                    }),
                    tag.span,
                );
                self.push(block);
            }
        }
    }

    fn close(&mut self, name: &str, span: Range<usize>) {
        let Some(frame) = self.frames.last() else {
            self.error(format!("unexpected closing tag `</{}>`", name), span, "component tag");
            return;
        };
        if frame.name != name {
            let expected = frame.name.clone();
            self.errors.push(
                ParseError::error(
                    format!("mismatched closing tag `</{}>`, expected `</{}>`", name, expected),
                    span,
                    self.file_id,
                )
                .in_block("component tag"),
            );
            return;
        }

        let Some(frame) = self.frames.pop() else {
            return;
        };
        let full = frame.open.start..span.end;

        match frame.container {
            Container::Tabs { group_id, tabs } => {
                if tabs.is_empty() {
                    self.error("tab group has no tabs", full, "tab group");
                    return;
                }
                self.push(Block::new(BlockKind::TabGroup { group_id, tabs }, full));
            }
            Container::Tab {
                label,
                value,
                default,
                blocks,
            } => {
                let Some(Frame {
                    container: Container::Tabs { tabs, .. },
                    ..
                }) = self.frames.last_mut()
                else {
                    // Already reported when the tab was opened.
                    return;
                };
                if tabs.iter().any(|t| t.value == value) {
                    let err = ParseError::error(
                        format!("duplicate tab value `{}`", value),
                        full,
                        self.file_id,
                    )
                    .in_block("tab group")
                    .with_note("every tab in a group needs a distinct `value`");
                    self.errors.push(err);
                    return;
                }
                tabs.push(Tab {
                    label,
                    value,
                    default,
                    body: blocks,
                });
            }
            Container::Callout {
                kind,
                title,
                blocks,
            } => {
                self.push(Block::new(
                    BlockKind::Callout {
                        kind,
                        title,
                        body: blocks,
                    },
                    full,
                ));
            }
            Container::Rejected => {}
        }
    }

    fn finish(mut self) -> (Vec<Block>, Vec<ParseError>) {
        while let Some(frame) = self.frames.pop() {
            let err = ParseError::error(
                format!("unclosed `<{}>`", frame.name),
                frame.open,
                self.file_id,
            )
            .in_block("component tag")
            .with_note(format!("add `</{}>`", frame.name));
            self.errors.push(err);
        }
        (self.root, self.errors)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn heading_level_to_u8(level: &HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn is_inline_start(ev: &Event<'_>) -> bool {
    matches!(
        ev,
        Event::Text(_)
            | Event::Code(_)
            | Event::InlineHtml(_)
            | Event::SoftBreak
            | Event::HardBreak
            | Event::Start(
                Tag::Strong | Tag::Emphasis | Tag::Strikethrough | Tag::Link { .. } | Tag::Image { .. }
            )
    )
}

/// Split a fence info string into language tag and the rest, e.g. `jsx title="App.jsx"`.
fn split_info_string(info: &str) -> (Option<String>, Option<String>) {
    let info = info.trim();
    if info.is_empty() {
        return (None, None);
    }
    match info.split_once(char::is_whitespace) {
        Some((lang, meta)) => {
            let meta = meta.trim();
            (
                Some(lang.to_string()),
                (!meta.is_empty()).then(|| meta.to_string()),
            )
        }
        None => (Some(info.to_string()), None),
    }
}

/// Collect all text content until a matching End tag.
fn collect_text_until(
    events: &Events<'_>,
    i: &mut usize,
    is_end: impl Fn(&TagEnd) -> bool,
) -> String {
    let mut text = String::new();
    while *i < events.len() {
        match &events[*i].0 {
            Event::End(tag_end) if is_end(tag_end) => {
                *i += 1;
                break;
            }
            Event::Text(s) => {
                text.push_str(s);
                *i += 1;
            }
            _ => {
                *i += 1;
            }
        }
    }
    text
}

/// Concatenate an HTML block's lines. Returns the text and its start offset.
fn collect_html(events: &Events<'_>, i: &mut usize, fallback_start: usize) -> (String, usize) {
    let mut text = String::new();
    let mut start = None;
    while *i < events.len() {
        match &events[*i] {
            (Event::End(TagEnd::HtmlBlock), _) => {
                *i += 1;
                break;
            }
            (Event::Html(s) | Event::Text(s), range) => {
                start.get_or_insert(range.start);
                text.push_str(s);
                *i += 1;
            }
            _ => {
                *i += 1;
            }
        }
    }
    (text, start.unwrap_or(fallback_start))
}

fn is_only_comments(text: &str) -> bool {
    let mut rest = text.trim();
    while let Some(after) = rest.strip_prefix("<!--") {
        match after.find("-->") {
            Some(end) => rest = after[end + 3..].trim_start(),
            None => return false,
        }
    }
    rest.is_empty()
}

fn prose_error(span: Range<usize>, file_id: usize) -> ParseError {
    ParseError::error("component tags cannot appear inside prose", span, file_id)
        .in_block("paragraph")
        .with_note("put the tag on its own line, separated by a blank line")
}

/// Strip the indentation every non-blank line shares. Returns the text and,
/// per output line, its start alongside the matching input position.
fn dedent(text: &str) -> (String, Vec<(usize, usize)>) {
    let leading = |line: &str| line.len() - line.trim_start_matches([' ', '\t']).len();
    let indent = text
        .split_inclusive('\n')
        .filter(|line| !line.trim().is_empty())
        .map(leading)
        .min()
        .unwrap_or(0);

    let mut out = String::with_capacity(text.len());
    let mut lines = vec![(0, 0)];
    let mut input = 0;
    for line in text.split_inclusive('\n') {
        let strip = leading(line).min(indent);
        if input == 0 {
            lines[0] = (0, strip);
        } else {
            lines.push((out.len(), input + strip));
        }
        out.push_str(&line[strip..]);
        input += line.len();
    }
    (out, lines)
}

/// A prop as display text: strings as-is, other values in their source form.
fn prop_text(props: &Props, key: &str) -> Option<String> {
    match props.get(key)? {
        PropValue::Literal(serde_json::Value::String(s)) => Some(s.clone()),
        PropValue::Literal(other) => Some(other.to_string()),
        PropValue::Expression(expr) => Some(expr.clone()),
    }
}

fn is_true(value: Option<&PropValue>) -> bool {
    matches!(value, Some(PropValue::Literal(serde_json::Value::Bool(true))))
}
