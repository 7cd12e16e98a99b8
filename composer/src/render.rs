use docpage::block::{ColumnAlignment, InlineNode, plain_text};
use docpage::{Block, BlockKind, Tab};

use crate::Page;

/// Knobs for HTML output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderOptions {
    /// Appended to the page title in `<title>`.
    pub site_title: Option<String>,
    /// Wrap the page in a full HTML document.
    pub standalone: bool,
}

/// Render a composed page. Blocks appear exactly in authored order.
pub fn render_page(page: &Page, options: &RenderOptions) -> String {
    let mut renderer = Renderer {
        page,
        out: String::new(),
    };

    if options.standalone {
        renderer.head(options);
    }
    renderer.toc();
    renderer.out.push_str("<article>\n");
    for block in &page.resolved.document.blocks {
        renderer.block(block);
    }
    renderer.out.push_str("</article>\n");
    if options.standalone {
        renderer.out.push_str("</body>\n</html>\n");
    }

    renderer.out
}

struct Renderer<'p> {
    page: &'p Page,
    out: String,
}

impl Renderer<'_> {
    fn head(&mut self, options: &RenderOptions) {
        let title = match (self.page.title(), &options.site_title) {
            (Some(page), Some(site)) => format!("{} | {}", page, site),
            (Some(page), None) => page,
            (None, Some(site)) => site.clone(),
            (None, None) => String::new(),
        };
        self.out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        self.out
            .push_str(&format!("<title>{}</title>\n", escape(&title)));
        let description = self
            .page
            .resolved
            .document
            .frontmatter
            .as_ref()
            .and_then(|f| f.description.as_deref());
        if let Some(description) = description {
            self.out.push_str(&format!(
                "<meta name=\"description\" content=\"{}\">\n",
                escape(description)
            ));
        }
        self.out.push_str("</head>\n<body>\n");
    }

    fn toc(&mut self) {
        let outline = &self.page.outline;
        if outline.is_empty() {
            return;
        }
        self.out.push_str("<nav class=\"toc\">\n<ul>\n");
        for entry in &outline.entries {
            self.out.push_str(&format!(
                "<li class=\"toc-h{}\"><a href=\"#{}\">{}</a></li>\n",
                entry.level,
                escape(&entry.anchor),
                escape(&entry.text)
            ));
        }
        self.out.push_str("</ul>\n</nav>\n");
    }

    fn blocks(&mut self, blocks: &[Block]) {
        for block in blocks {
            self.block(block);
        }
    }

    fn block(&mut self, block: &Block) {
        match &block.kind {
            BlockKind::Heading { level, content, .. } => {
                let anchor = self.page.outline.anchor(block.id).unwrap_or_default();
                self.out
                    .push_str(&format!("<h{} id=\"{}\">", level, escape(anchor)));
                self.inlines(content);
                self.out.push_str(&format!("</h{}>\n", level));
            }
            BlockKind::Paragraph(inlines) => {
                self.out.push_str("<p>");
                self.inlines(inlines);
                self.out.push_str("</p>\n");
            }
            BlockKind::CodeSample {
                language,
                meta,
                source,
            } => {
                self.out.push_str("<pre");
                if let Some(title) = meta.as_deref().and_then(meta_title) {
                    self.out
                        .push_str(&format!(" data-title=\"{}\"", escape(title)));
                }
                self.out.push_str("><code");
                if let Some(language) = language {
                    self.out
                        .push_str(&format!(" class=\"language-{}\"", escape(language)));
                }
                self.out.push('>');
                self.out.push_str(&escape(source));
                self.out.push_str("</code></pre>\n");
            }
            BlockKind::TabGroup { group_id, tabs } => self.tab_group(block, group_id, tabs),
            BlockKind::Callout { kind, title, body } => {
                self.out
                    .push_str(&format!("<aside class=\"callout callout-{}\">\n", kind.as_str()));
                let title = title.clone().unwrap_or_else(|| capitalize(kind.as_str()));
                self.out.push_str(&format!(
                    "<p class=\"callout-title\">{}</p>\n",
                    escape(&title)
                ));
                self.blocks(body);
                self.out.push_str("</aside>\n");
            }
            BlockKind::Widget(_) => {
                let mounted = self.page.resolved.widget(block.id);
                debug_assert!(mounted.is_some(), "widget block {} was never mounted", block.id);
                if let Some(mounted) = mounted {
                    self.out.push_str(&mounted.html);
                    self.out.push('\n');
                }
            }
            BlockKind::List { start, items } => {
                let close = match start {
                    Some(1) => {
                        self.out.push_str("<ol>\n");
                        "</ol>\n"
                    }
                    Some(n) => {
                        self.out.push_str(&format!("<ol start=\"{}\">\n", n));
                        "</ol>\n"
                    }
                    None => {
                        self.out.push_str("<ul>\n");
                        "</ul>\n"
                    }
                };
                for item in items {
                    self.out.push_str("<li>");
                    self.blocks(item);
                    self.out.push_str("</li>\n");
                }
                self.out.push_str(close);
            }
            BlockKind::Quote(body) => {
                self.out.push_str("<blockquote>\n");
                self.blocks(body);
                self.out.push_str("</blockquote>\n");
            }
            BlockKind::Table {
                alignments,
                headers,
                rows,
            } => {
                self.out.push_str("<table>\n<thead>\n<tr>");
                for (i, cell) in headers.iter().enumerate() {
                    self.cell("th", alignments.get(i), cell);
                }
                self.out.push_str("</tr>\n</thead>\n<tbody>\n");
                for row in rows {
                    self.out.push_str("<tr>");
                    for (i, cell) in row.iter().enumerate() {
                        self.cell("td", alignments.get(i), cell);
                    }
                    self.out.push_str("</tr>\n");
                }
                self.out.push_str("</tbody>\n</table>\n");
            }
            BlockKind::Rule => self.out.push_str("<hr>\n"),
            BlockKind::Html(html) => {
                self.out.push_str(html);
                self.out.push('\n');
            }
        }
    }

    fn tab_group(&mut self, block: &Block, group_id: &Option<String>, tabs: &[Tab]) {
        let id = format!("tabs-{}", block.id.0);
        let selected = tabs.iter().position(|t| t.default).unwrap_or(0);

        self.out.push_str(&format!("<div class=\"tabs\" id=\"{}\"", id));
        if let Some(group) = group_id {
            self.out
                .push_str(&format!(" data-group=\"{}\"", escape(group)));
        }
        self.out.push_str(">\n<div class=\"tab-list\" role=\"tablist\">\n");
        for (i, tab) in tabs.iter().enumerate() {
            self.out.push_str(&format!(
                "<button role=\"tab\" id=\"{id}-{i}\" aria-controls=\"{id}-{i}-panel\" \
                 aria-selected=\"{}\" data-value=\"{}\">{}</button>\n",
                i == selected,
                escape(&tab.value),
                escape(&tab.label),
            ));
        }
        self.out.push_str("</div>\n");
        for (i, tab) in tabs.iter().enumerate() {
            self.out.push_str(&format!(
                "<div class=\"tab-panel\" role=\"tabpanel\" id=\"{id}-{i}-panel\" \
                 aria-labelledby=\"{id}-{i}\"{}>\n",
                if i == selected { "" } else { " hidden" },
            ));
            self.blocks(&tab.body);
            self.out.push_str("</div>\n");
        }
        self.out.push_str("</div>\n");
    }

    fn cell(&mut self, tag: &str, alignment: Option<&ColumnAlignment>, content: &[InlineNode]) {
        let style = match alignment {
            Some(ColumnAlignment::Left) => " style=\"text-align: left\"",
            Some(ColumnAlignment::Center) => " style=\"text-align: center\"",
            Some(ColumnAlignment::Right) => " style=\"text-align: right\"",
            _ => "",
        };
        self.out.push_str(&format!("<{}{}>", tag, style));
        self.inlines(content);
        self.out.push_str(&format!("</{}>", tag));
    }

    fn inlines(&mut self, inlines: &[InlineNode]) {
        for inline in inlines {
            self.inline(inline);
        }
    }

    fn inline(&mut self, inline: &InlineNode) {
        match inline {
            InlineNode::Text(text) => self.out.push_str(&escape(text)),
            InlineNode::CodeSpan(code) => {
                self.out.push_str(&format!("<code>{}</code>", escape(code)))
            }
            InlineNode::Strong(children) => self.wrap("strong", children),
            InlineNode::Emphasis(children) => self.wrap("em", children),
            InlineNode::Strikethrough(children) => self.wrap("del", children),
            InlineNode::Link {
                dest,
                title,
                content,
            } => {
                self.out.push_str(&format!("<a href=\"{}\"", escape(dest)));
                if !title.is_empty() {
                    self.out.push_str(&format!(" title=\"{}\"", escape(title)));
                }
                self.out.push('>');
                self.inlines(content);
                self.out.push_str("</a>");
            }
            InlineNode::Image { dest, title, alt } => {
                self.out.push_str(&format!(
                    "<img src=\"{}\" alt=\"{}\"",
                    escape(dest),
                    escape(&plain_text(alt))
                ));
                if !title.is_empty() {
                    self.out.push_str(&format!(" title=\"{}\"", escape(title)));
                }
                self.out.push('>');
            }
            InlineNode::Html(html) => self.out.push_str(html),
            InlineNode::SoftBreak => self.out.push('\n'),
            InlineNode::HardBreak => self.out.push_str("<br>\n"),
        }
    }

    fn wrap(&mut self, tag: &str, children: &[InlineNode]) {
        self.out.push_str(&format!("<{}>", tag));
        self.inlines(children);
        self.out.push_str(&format!("</{}>", tag));
    }
}

/// Escape text for HTML content and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// `title="..."` from a code fence's meta string.
fn meta_title(meta: &str) -> Option<&str> {
    let rest = &meta[meta.find("title=")? + 6..];
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let rest = &rest[1..];
    rest.find(quote).map(|end| &rest[..end])
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
