use codespan_reporting::diagnostic::Severity;
use docpage::block::{BlockKind, CalloutKind, InlineNode, PropValue};
use docpage::document::EsmKind;
use docpage::{Document, ParseError};

fn parse(source: &str) -> Document {
    docpage::parse(source, 0).expect("parse failed")
}

fn parse_err(source: &str) -> Vec<ParseError> {
    docpage::parse(source, 0).expect_err("expected parse error")
}

fn kinds(doc: &Document) -> Vec<&'static str> {
    doc.blocks.iter().map(|b| b.describe()).collect()
}

const HOOKS_PAGE: &str = "# Hooks\n\n```jsx\nconst [count, setCount] = useState(0);\n```\n\n<CounterHookExample />\n";

#[test]
fn heading_code_and_widget() {
    let doc = parse(HOOKS_PAGE);
    assert_eq!(kinds(&doc), vec!["heading", "code sample", "widget"]);
    assert_eq!(doc.blocks[0].kind.heading_text().as_deref(), Some("Hooks"));

    match &doc.blocks[1].kind {
        BlockKind::CodeSample {
            language, source, ..
        } => {
            assert_eq!(language.as_deref(), Some("jsx"));
            assert_eq!(source, "const [count, setCount] = useState(0);\n");
        }
        other => panic!("expected code sample, got {:?}", other),
    }

    match &doc.blocks[2].kind {
        BlockKind::Widget(widget) => {
            assert_eq!(widget.name, "CounterHookExample");
            assert!(widget.props.is_empty());
        }
        other => panic!("expected widget, got {:?}", other),
    }
}

#[test]
fn composing_twice_is_identical() {
    assert_eq!(parse(HOOKS_PAGE), parse(HOOKS_PAGE));
}

#[test]
fn code_samples_are_verbatim() {
    let src = "```tsx title=\"useToggle.ts\"\n  <Not a={tag} />\n\tconst x = `${y}`;\n```\n";
    let doc = parse(src);
    match &doc.blocks[0].kind {
        BlockKind::CodeSample {
            language,
            meta,
            source,
        } => {
            assert_eq!(language.as_deref(), Some("tsx"));
            assert_eq!(meta.as_deref(), Some("title=\"useToggle.ts\""));
            assert_eq!(source, "  <Not a={tag} />\n\tconst x = `${y}`;\n");
        }
        other => panic!("expected code sample, got {:?}", other),
    }
}

#[test]
fn tab_group_with_blank_lines() {
    let src = r#"<Tabs groupId="lang">
<TabItem value="js" label="JavaScript">

```js
const ref = useRef(null);
```

</TabItem>
<TabItem value="ts" label="TypeScript">

```ts
const ref = useRef<HTMLDivElement>(null);
```

</TabItem>
</Tabs>
"#;
    let doc = parse(src);
    assert_eq!(doc.blocks.len(), 1);
    let BlockKind::TabGroup { group_id, tabs } = &doc.blocks[0].kind else {
        panic!("expected tab group, got {:?}", doc.blocks[0].kind);
    };
    assert_eq!(group_id.as_deref(), Some("lang"));
    let labels: Vec<&str> = tabs.iter().map(|t| t.label.as_str()).collect();
    assert_eq!(labels, vec!["JavaScript", "TypeScript"]);
    assert_eq!(tabs[1].value, "ts");
    for tab in tabs {
        assert_eq!(tab.body.len(), 1);
        assert_eq!(tab.body[0].describe(), "code sample");
    }
}

#[test]
fn tab_group_without_blank_lines() {
    let src = "<Tabs>\n<Tab label=\"npm\">\nnpm install\n</Tab>\n<Tab label=\"yarn\">\nyarn add\n</Tab>\n<Tab label=\"pnpm\">\npnpm add\n</Tab>\n</Tabs>\n";
    let doc = parse(src);
    let BlockKind::TabGroup { tabs, .. } = &doc.blocks[0].kind else {
        panic!("expected tab group");
    };
    assert_eq!(tabs.len(), 3);
    assert_eq!(tabs[0].value, "npm");
    assert_eq!(
        tabs[2].body[0].kind,
        BlockKind::Paragraph(vec![InlineNode::Text("pnpm add".into())])
    );
}

#[test]
fn code_inside_tab_without_blank_lines_is_opaque() {
    let src = "<Tabs>\n<Tab label=\"Source\">\n```jsx\nfunction App() {\n  return <Counter />;\n}\n```\n</Tab>\n</Tabs>\n";
    let doc = parse(src);
    let BlockKind::TabGroup { tabs, .. } = &doc.blocks[0].kind else {
        panic!("expected tab group, got {:?}", doc.blocks[0].kind);
    };
    assert_eq!(tabs.len(), 1);
    assert_eq!(tabs[0].body.len(), 1);
    match &tabs[0].body[0].kind {
        BlockKind::CodeSample {
            language, source, ..
        } => {
            assert_eq!(language.as_deref(), Some("jsx"));
            assert_eq!(source, "function App() {\n  return <Counter />;\n}\n");
        }
        other => panic!("expected code sample, got {:?}", other),
    }
}

#[test]
fn code_span_inside_tab_is_not_a_tag() {
    let src = "<Tabs>\n<Tab label=\"Usage\">\nRender `<Counter />` once.\n</Tab>\n</Tabs>\n";
    let doc = parse(src);
    let BlockKind::TabGroup { tabs, .. } = &doc.blocks[0].kind else {
        panic!("expected tab group");
    };
    let BlockKind::Paragraph(inlines) = &tabs[0].body[0].kind else {
        panic!("expected paragraph, got {:?}", tabs[0].body[0].kind);
    };
    assert!(inlines.contains(&InlineNode::CodeSpan("<Counter />".into())));
}

#[test]
fn indented_tab_items_are_prose() {
    let src = r#"<Tabs>
  <TabItem value="apple" label="Apple" default>
    This is an apple
  </TabItem>
  <TabItem value="orange" label="Orange">
    This is an orange
  </TabItem>
</Tabs>
"#;
    let doc = parse(src);
    let BlockKind::TabGroup { tabs, .. } = &doc.blocks[0].kind else {
        panic!("expected tab group");
    };
    assert_eq!(tabs.len(), 2);
    assert!(tabs[0].default);
    assert_eq!(
        tabs[0].body[0].kind,
        BlockKind::Paragraph(vec![InlineNode::Text("This is an apple".into())])
    );
    assert_eq!(tabs[1].body[0].describe(), "paragraph");
    assert_eq!(tabs[0].body[0].span.start, src.find("This is an apple").unwrap());
}

#[test]
fn indented_tab_items_with_blank_lines_are_prose() {
    let src = "<Tabs>\n  <TabItem value=\"apple\" label=\"Apple\">\n\n    This is an apple\n\n    ```js\n    eat(apple);\n    ```\n\n  </TabItem>\n</Tabs>\n";
    let doc = parse(src);
    let BlockKind::TabGroup { tabs, .. } = &doc.blocks[0].kind else {
        panic!("expected tab group, got {:?}", doc.blocks[0].kind);
    };
    let kinds: Vec<&str> = tabs[0].body.iter().map(|b| b.describe()).collect();
    assert_eq!(kinds, vec!["paragraph", "code sample"]);
    assert_eq!(tabs[0].body[0].span.start, src.find("This is an apple").unwrap());
    let BlockKind::CodeSample { source, .. } = &tabs[0].body[1].kind else {
        panic!("expected code sample");
    };
    assert_eq!(source, "eat(apple);\n");
}

#[test]
fn nested_tab_groups_recurse() {
    let src = "<Tabs>\n<Tab label=\"outer\">\n<Tabs>\n<Tab label=\"inner\">\nhello\n</Tab>\n</Tabs>\n</Tab>\n</Tabs>\n";
    let doc = parse(src);
    let BlockKind::TabGroup { tabs, .. } = &doc.blocks[0].kind else {
        panic!("expected tab group");
    };
    assert_eq!(tabs[0].body.len(), 1);
    assert!(matches!(tabs[0].body[0].kind, BlockKind::TabGroup { .. }));
    assert_eq!(doc.block_count(), 3);
}

#[test]
fn callout_with_title() {
    let src = "<Callout type=\"warning\" title=\"Rules of Hooks\">\n\nOnly call hooks at the **top level**.\n\n</Callout>\n";
    let doc = parse(src);
    let BlockKind::Callout { kind, title, body } = &doc.blocks[0].kind else {
        panic!("expected callout, got {:?}", doc.blocks[0].kind);
    };
    assert_eq!(*kind, CalloutKind::Warning);
    assert_eq!(title.as_deref(), Some("Rules of Hooks"));
    assert_eq!(body.len(), 1);
}

#[test]
fn multi_line_widget_props() {
    let src = "Intro.\n\n<CounterHookExample\n  initial={5}\n  label=\"Count\"\n  onChange={(n) => console.log(n)}\n/>\n";
    let doc = parse(src);
    assert_eq!(kinds(&doc), vec!["paragraph", "widget"]);
    let BlockKind::Widget(widget) = &doc.blocks[1].kind else {
        panic!("expected widget");
    };
    assert_eq!(widget.props["initial"], PropValue::Literal(serde_json::json!(5)));
    assert_eq!(widget.props["label"].as_str(), Some("Count"));
    assert_eq!(
        widget.props["onChange"],
        PropValue::Expression("(n) => console.log(n)".into())
    );
}

#[test]
fn frontmatter_and_imports() {
    let src = "---\ntitle: Using refs\nsidebar_position: 3\nkeywords: [useRef]\n---\n\nimport Tabs from '@theme/Tabs';\nimport TabItem from '@theme/TabItem';\n\n# Refs\n";
    let doc = parse(src);
    let fm = doc.frontmatter.as_ref().expect("frontmatter");
    assert_eq!(fm.title.as_deref(), Some("Using refs"));
    assert_eq!(fm.sidebar_position, Some(3.0));
    assert!(fm.extra.contains_key("keywords"));

    assert_eq!(doc.esm.len(), 2);
    assert_eq!(doc.esm[0].kind, EsmKind::Import);
    assert_eq!(doc.esm[1].bindings, vec!["TabItem"]);
    assert_eq!(kinds(&doc), vec!["heading"]);
    assert_eq!(doc.title().as_deref(), Some("Using refs"));
}

#[test]
fn title_falls_back_to_first_h1() {
    let doc = parse("Lead.\n\n# Effects\n\n## Cleanup\n");
    assert_eq!(doc.title().as_deref(), Some("Effects"));
}

#[test]
fn heading_custom_anchor() {
    let doc = parse("## The `useState` hook {#state-hook}\n");
    let BlockKind::Heading { level, anchor, .. } = &doc.blocks[0].kind else {
        panic!("expected heading");
    };
    assert_eq!(*level, 2);
    assert_eq!(anchor.as_deref(), Some("state-hook"));
    assert_eq!(doc.blocks[0].kind.heading_text().as_deref(), Some("The useState hook"));
}

#[test]
fn block_ids_are_unique_and_preorder() {
    let src = "# A\n\n- one\n- two\n\n<Callout>\n\nInside\n\n</Callout>\n\n> quoted\n\n---\n";
    let doc = parse(src);
    let mut ids = Vec::new();
    doc.walk(&mut |b| ids.push(b.id.0));
    let expected: Vec<usize> = (0..ids.len()).collect();
    assert_eq!(ids, expected);
    assert_eq!(kinds(&doc), vec!["heading", "list", "callout", "quote", "rule"]);
}

#[test]
fn comments_are_dropped_and_html_kept() {
    let doc = parse("<!-- editor note -->\n\n{/* mdx note */}\n\n<div class=\"demo\">raw</div>\n");
    assert_eq!(kinds(&doc), vec!["html"]);
    assert_eq!(
        doc.blocks[0].kind,
        BlockKind::Html("<div class=\"demo\">raw</div>".into())
    );
}

#[test]
fn tables_are_parsed() {
    let doc = parse("| Hook | Purpose |\n|---|---|\n| `useRef` | refs |\n");
    let BlockKind::Table { headers, rows, .. } = &doc.blocks[0].kind else {
        panic!("expected table");
    };
    assert_eq!(headers.len(), 2);
    assert_eq!(rows.len(), 1);
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn unclosed_tab_group_reports_location() {
    let src = "# T\n\n<Tabs>\n<Tab label=\"a\">\nx\n</Tab>\n";
    let errors = parse_err(src);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("unclosed `<Tabs>`"), "{}", errors[0]);
    assert_eq!(errors[0].span.start, 5);
}

#[test]
fn tab_outside_tabs() {
    let errors = parse_err("<Tab label=\"a\">\nx\n</Tab>\n");
    assert!(errors.iter().any(|e| e.message.contains("direct child of `<Tabs>`")));
}

#[test]
fn duplicate_tab_values() {
    let errors = parse_err("<Tabs>\n<Tab label=\"a\">\nx\n</Tab>\n<Tab label=\"a\">\ny\n</Tab>\n</Tabs>\n");
    assert!(errors[0].message.contains("duplicate tab value"));
    assert_eq!(errors[0].block, Some("tab group"));
}

#[test]
fn stray_content_in_tabs() {
    let errors = parse_err("<Tabs>\n\nloose text\n\n<Tab label=\"a\">\nx\n</Tab>\n</Tabs>\n");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("must be wrapped in `<Tab>`"));
    assert_eq!(errors[0].block, Some("paragraph"));
}

#[test]
fn empty_tab_group() {
    let errors = parse_err("<Tabs>\n</Tabs>\n");
    assert!(errors[0].message.contains("no tabs"));
}

#[test]
fn widget_with_children() {
    let errors = parse_err("<CounterHookExample>\n\ninner\n\n</CounterHookExample>\n");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("must be self-closing"));
}

#[test]
fn widget_inside_prose() {
    let errors = parse_err("Try it: <CounterHookExample /> right here.\n");
    assert!(errors[0].message.contains("inside prose"));
}

#[test]
fn widget_followed_by_prose_on_its_line() {
    let errors = parse_err("<CounterHookExample /> shows the count.\n");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("inside prose"));
    assert_eq!(errors[0].span, 0..22);
}

#[test]
fn unknown_callout_type() {
    let errors = parse_err("<Callout type=\"shout\">\nx\n</Callout>\n");
    assert!(errors[0].message.contains("unknown callout type"));
}

#[test]
fn bad_frontmatter() {
    let errors = parse_err("---\ntitle: [unclosed\n---\n\n# A\n");
    assert!(errors[0].message.starts_with("invalid frontmatter"));
}

#[test]
fn all_errors_are_reported() {
    let src = "<Tab label=\"a\">\nx\n</Tab>\n\n<Callout type=\"shout\">\ny\n</Callout>\n";
    let errors = parse_err(src);
    assert!(errors.len() >= 2, "{:?}", errors);
}

#[test]
fn errors_render_as_diagnostics() {
    let errors = parse_err("<Tabs>\n</Tabs>\n");
    let diagnostic = errors[0].to_diagnostic();
    assert_eq!(diagnostic.severity, Severity::Error);
    assert_eq!(diagnostic.message, "tab group has no tabs");
    assert_eq!(diagnostic.labels.len(), 1);
}
