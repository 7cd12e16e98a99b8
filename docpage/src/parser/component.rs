//! Lexer for MDX-style component tags embedded in Markdown.
//!
//! Only capitalised tags are components; lowercase HTML stays in the
//! surrounding text. Spans are relative to the lexed fragment.

use std::ops::Range;

use crate::block::{PropValue, Props};
use crate::parser::error::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ComponentTag {
    pub name: String,
    pub props: Props,
    pub span: Range<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Segment<'s> {
    /// Markup between tags, to be parsed again as Markdown.
    Text { text: &'s str, offset: usize },
    Open(ComponentTag),
    SelfClosing(ComponentTag),
    Close { name: String, span: Range<usize> },
}

/// True if `text` contains at least one component tag opener outside code.
pub(crate) fn has_component_tag(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if let Some(end) = code_end(text, i) {
            i = end;
            continue;
        }
        if tag_starts_at(bytes, i) {
            return true;
        }
        i += 1;
    }
    false
}

/// True if `text` opens with a component tag.
pub(crate) fn starts_with_component_tag(text: &str) -> bool {
    !text.is_empty() && tag_starts_at(text.as_bytes(), 0)
}

/// Span of the first tag that shares a line with prose.
pub(crate) fn tag_beside_prose(text: &str) -> Option<Range<usize>> {
    let segments = lex(text, 0).ok()?;
    segments.iter().enumerate().find_map(|(n, segment)| {
        let Segment::Text { text, .. } = segment else {
            return None;
        };
        let before = n
            .checked_sub(1)
            .and_then(|p| segments.get(p))
            .and_then(Segment::tag_span);
        let after = segments.get(n + 1).and_then(Segment::tag_span);
        let first_line = text.split('\n').next().unwrap_or_default();
        let last_line = text.rsplit('\n').next().unwrap_or_default();
        match (before, after) {
            (Some(span), _) if !first_line.trim().is_empty() => Some(span),
            (_, Some(span)) if !last_line.trim().is_empty() => Some(span),
            _ => None,
        }
    })
}

impl Segment<'_> {
    fn tag_span(&self) -> Option<Range<usize>> {
        match self {
            Segment::Text { .. } => None,
            Segment::Open(tag) | Segment::SelfClosing(tag) => Some(tag.span.clone()),
            Segment::Close { span, .. } => Some(span.clone()),
        }
    }
}

/// End of the fenced block or code span starting at `i`. Nothing inside
/// code is lexed.
fn code_end(text: &str, i: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let c = bytes[i];
    if c != b'`' && c != b'~' {
        return None;
    }
    let run = bytes[i..].iter().take_while(|&&b| b == c).count();
    let line_start = text[..i].rfind('\n').map_or(0, |p| p + 1);
    let at_line_start = bytes[line_start..i].iter().all(|&b| b == b' ' || b == b'\t');

    if run >= 3 && at_line_start {
        return Some(fence_end(text, i, c, run));
    }
    if c == b'~' {
        return None;
    }

    // A code span closes at the next run of exactly as many backticks,
    // within the same paragraph.
    let mut j = i + run;
    while j < bytes.len() {
        match bytes[j] {
            b'`' => {
                let close = bytes[j..].iter().take_while(|&&b| b == b'`').count();
                if close == run {
                    return Some(j + close);
                }
                j += close;
            }
            b'\n' if text[j + 1..].lines().next().is_none_or(|l| l.trim().is_empty()) => break,
            _ => j += 1,
        }
    }
    Some(i + run)
}

/// End of a fence opened at `start`: after the closing fence line, or the
/// end of `text` when the fence is never closed.
fn fence_end(text: &str, start: usize, c: u8, run: usize) -> usize {
    let Some(newline) = text[start..].find('\n') else {
        return text.len();
    };
    let mut line = start + newline + 1;
    while line < text.len() {
        let end = text[line..].find('\n').map_or(text.len(), |p| line + p + 1);
        let fence = text[line..end].trim();
        if fence.len() >= run && fence.bytes().all(|b| b == c) {
            return end;
        }
        line = end;
    }
    text.len()
}

fn tag_starts_at(bytes: &[u8], i: usize) -> bool {
    if bytes[i] != b'<' {
        return false;
    }
    match bytes.get(i + 1) {
        Some(b'/') => bytes.get(i + 2).is_some_and(|c| c.is_ascii_uppercase()),
        Some(c) => c.is_ascii_uppercase(),
        None => false,
    }
}

/// Split a fragment into component tags and the text between them.
/// HTML and MDX comments are dropped.
pub(crate) fn lex(text: &str, file_id: usize) -> Result<Vec<Segment<'_>>, ParseError> {
    let bytes = text.as_bytes();
    let mut segments = Vec::new();
    let mut i = 0;
    let mut text_start = 0;

    while i < bytes.len() {
        if let Some(end) = code_end(text, i) {
            i = end;
            continue;
        }

        let comment_end = if bytes[i..].starts_with(b"<!--") {
            Some(find_from(text, i + 4, "-->").map(|p| p + 3))
        } else if bytes[i..].starts_with(b"{/*") {
            Some(find_from(text, i + 3, "*/}").map(|p| p + 3))
        } else {
            None
        };

        if let Some(end) = comment_end {
            let Some(end) = end else {
                return Err(ParseError::error("unterminated comment", i..bytes.len(), file_id));
            };
            flush_text(text, text_start, i, &mut segments);
            i = end;
            text_start = i;
            continue;
        }

        if tag_starts_at(bytes, i) {
            let (segment, end) = TagCursor::new(text, i, file_id).parse()?;
            flush_text(text, text_start, i, &mut segments);
            segments.push(segment);
            i = end;
            text_start = i;
            continue;
        }

        i += 1;
    }

    flush_text(text, text_start, bytes.len(), &mut segments);
    Ok(segments)
}

fn find_from(text: &str, from: usize, needle: &str) -> Option<usize> {
    text[from..].find(needle).map(|p| p + from)
}

fn flush_text<'s>(text: &'s str, start: usize, end: usize, out: &mut Vec<Segment<'s>>) {
    if start < end {
        out.push(Segment::Text {
            text: &text[start..end],
            offset: start,
        });
    }
}

struct TagCursor<'s> {
    text: &'s str,
    bytes: &'s [u8],
    start: usize,
    pos: usize,
    file_id: usize,
}

impl<'s> TagCursor<'s> {
    fn new(text: &'s str, start: usize, file_id: usize) -> Self {
        TagCursor {
            text,
            bytes: text.as_bytes(),
            start,
            pos: start + 1,
            file_id,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        let end = self.pos.min(self.bytes.len()).max(self.start + 1);
        ParseError::error(message, self.start..end, self.file_id).in_block("component tag")
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn read_ident(&mut self, extra: &[u8]) -> &'s str {
        let begin = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == b'_' || extra.contains(&c))
        {
            self.pos += 1;
        }
        &self.text[begin..self.pos]
    }

    fn parse(mut self) -> Result<(Segment<'s>, usize), ParseError> {
        let closing = self.peek() == Some(b'/');
        if closing {
            self.pos += 1;
        }
        let name = self.read_ident(b".-").to_string();

        if closing {
            self.skip_ws();
            if self.peek() != Some(b'>') {
                return Err(self.error(format!("expected `>` to close `</{}`", name)));
            }
            self.pos += 1;
            let span = self.start..self.pos;
            return Ok((Segment::Close { name, span }, self.pos));
        }

        let mut props = Props::new();
        loop {
            self.skip_ws();
            match self.peek() {
                None => return Err(self.error(format!("unterminated tag `<{}`", name))),
                Some(b'/') if self.bytes.get(self.pos + 1) == Some(&b'>') => {
                    self.pos += 2;
                    let tag = ComponentTag {
                        name,
                        props,
                        span: self.start..self.pos,
                    };
                    return Ok((Segment::SelfClosing(tag), self.pos));
                }
                Some(b'>') => {
                    self.pos += 1;
                    let tag = ComponentTag {
                        name,
                        props,
                        span: self.start..self.pos,
                    };
                    return Ok((Segment::Open(tag), self.pos));
                }
                Some(b'{') => {
                    let inner = self.read_braced()?;
                    if inner.trim_start().starts_with("...") {
                        return Err(self
                            .error(format!("spread attributes are not supported on `<{}>`", name))
                            .with_note("pass each prop explicitly"));
                    }
                    return Err(self.error(format!("unexpected expression in `<{}>`", name)));
                }
                Some(_) => {}
            }

            let attr = self.read_ident(b":.-").to_string();
            if attr.is_empty() {
                let found = self.text[self.pos..].chars().next().unwrap_or(' ');
                return Err(self.error(format!("unexpected `{}` in `<{}>`", found, name)));
            }

            self.skip_ws();
            let value = if self.peek() == Some(b'=') {
                self.pos += 1;
                self.skip_ws();
                self.read_value(&attr)?
            } else {
                PropValue::Literal(serde_json::Value::Bool(true))
            };

            if props.insert(attr.clone(), value).is_some() {
                return Err(self.error(format!("duplicate attribute `{}` on `<{}>`", attr, name)));
            }
        }
    }

    fn read_value(&mut self, attr: &str) -> Result<PropValue, ParseError> {
        match self.peek() {
            Some(quote @ (b'"' | b'\'')) => {
                let begin = self.pos + 1;
                let Some(len) = self.bytes[begin..].iter().position(|&c| c == quote) else {
                    self.pos = self.bytes.len();
                    return Err(self.error(format!("unterminated string for `{}`", attr)));
                };
                self.pos = begin + len + 1;
                let value = self.text[begin..begin + len].to_string();
                Ok(PropValue::Literal(serde_json::Value::String(value)))
            }
            Some(b'{') => {
                let inner = self.read_braced()?;
                if inner.trim().is_empty() {
                    return Err(self.error(format!("empty expression for `{}`", attr)));
                }
                Ok(PropValue::from_expression(inner))
            }
            _ => Err(self
                .error(format!("value of `{}` must be quoted or wrapped in braces", attr))),
        }
    }

    /// Read a balanced `{...}` and return its inside. String literals may contain braces.
    fn read_braced(&mut self) -> Result<&'s str, ParseError> {
        let begin = self.pos + 1;
        let mut depth = 0usize;
        let mut quote: Option<u8> = None;

        while let Some(c) = self.peek() {
            match quote {
                Some(q) => {
                    if c == b'\\' {
                        self.pos += 1;
                    } else if c == q {
                        quote = None;
                    }
                }
                None => match c {
                    b'"' | b'\'' | b'`' => quote = Some(c),
                    b'{' => depth += 1,
                    b'}' => {
                        depth -= 1;
                        if depth == 0 {
                            self.pos += 1;
                            return Ok(&self.text[begin..self.pos - 1]);
                        }
                    }
                    _ => {}
                },
            }
            self.pos += 1;
        }

        Err(self.error("unbalanced `{` in attribute expression"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(text: &str) -> Vec<Segment<'_>> {
        lex(text, 0).expect("lex failed")
    }

    #[test]
    fn self_closing_widget_with_props() {
        let segments = tags(r#"<CounterHookExample initial={3} label="Clicks" compact />"#);
        let [Segment::SelfClosing(tag)] = segments.as_slice() else {
            panic!("expected one self-closing tag, got {:?}", segments);
        };
        assert_eq!(tag.name, "CounterHookExample");
        assert_eq!(tag.props["initial"], PropValue::Literal(serde_json::json!(3)));
        assert_eq!(tag.props["label"].as_str(), Some("Clicks"));
        assert_eq!(tag.props["compact"], PropValue::Literal(serde_json::json!(true)));
    }

    #[test]
    fn text_between_tags_keeps_offsets() {
        let src = "<Tab value=\"a\">\nHello\n</Tab>";
        let segments = tags(src);
        assert_eq!(segments.len(), 3);
        match &segments[1] {
            Segment::Text { text, offset } => {
                assert_eq!(*text, "\nHello\n");
                assert_eq!(&src[*offset..*offset + text.len()], *text);
            }
            other => panic!("expected text, got {:?}", other),
        }
        assert!(matches!(&segments[2], Segment::Close { name, .. } if name == "Tab"));
    }

    #[test]
    fn lowercase_html_is_text() {
        let segments = tags("<div class=\"x\"><Note /></div>");
        assert_eq!(segments.len(), 3);
        assert!(matches!(segments[0], Segment::Text { text: "<div class=\"x\">", .. }));
    }

    #[test]
    fn braces_inside_strings_do_not_close_expressions() {
        let segments = tags(r#"<Demo style={{ content: "}" }} />"#);
        let [Segment::SelfClosing(tag)] = segments.as_slice() else {
            panic!("unexpected {:?}", segments);
        };
        assert_eq!(
            tag.props["style"],
            PropValue::Expression(r#"{ content: "}" }"#.into())
        );
    }

    #[test]
    fn comments_are_dropped() {
        let segments = tags("<!-- hidden --><Demo />{/* also hidden */}");
        assert_eq!(segments.len(), 1);
    }

    #[test]
    fn spread_is_rejected() {
        let err = lex("<Demo {...props} />", 0).unwrap_err();
        assert!(err.message.contains("spread"), "{}", err.message);
    }

    #[test]
    fn unquoted_value_is_rejected() {
        let err = lex("<Demo size=3 />", 0).unwrap_err();
        assert!(err.message.contains("quoted"), "{}", err.message);
    }

    #[test]
    fn unterminated_tag_is_rejected() {
        let err = lex("<Demo size=\"3\"", 0).unwrap_err();
        assert!(err.message.contains("unterminated"), "{}", err.message);
        assert_eq!(err.span.start, 0);
    }

    #[test]
    fn detects_component_openers() {
        assert!(has_component_tag("text <Demo />"));
        assert!(has_component_tag("</Tabs>"));
        assert!(!has_component_tag("<div> a < b </div>"));
        assert!(!has_component_tag("<div>\n```jsx\n<App />\n```\n</div>"));
        assert!(!has_component_tag("<p>use `<Counter />` here</p>"));
    }

    #[test]
    fn fenced_code_stays_in_text() {
        let src = "<Tab label=\"Source\">\n```jsx\nreturn <Counter />;\n```\n</Tab>";
        let segments = tags(src);
        assert_eq!(segments.len(), 3, "{:?}", segments);
        assert!(
            matches!(&segments[1], Segment::Text { text, .. } if text.contains("<Counter />"))
        );
    }

    #[test]
    fn tilde_fence_and_indented_fence_are_code() {
        let src = "<Tab label=\"a\">\n    ~~~~\n    <Inner />\n    ~~~~\n</Tab>";
        assert_eq!(tags(src).len(), 3);
    }

    #[test]
    fn unclosed_fence_runs_to_the_end() {
        let segments = tags("<Note>\n```\n</Note>");
        assert_eq!(segments.len(), 2);
    }

    #[test]
    fn code_spans_hide_tags() {
        let segments = tags("<Note>Use `<Counter />` or ``a ` <B />``</Note>");
        assert_eq!(segments.len(), 3, "{:?}", segments);
    }

    #[test]
    fn unmatched_backtick_is_literal() {
        let segments = tags("<Note>a ` b</Note> <Demo />");
        assert_eq!(segments.len(), 5, "{:?}", segments);
    }

    #[test]
    fn finds_tags_sharing_a_line_with_prose() {
        assert_eq!(tag_beside_prose("<Demo /> shows the count."), Some(0..8));
        assert_eq!(tag_beside_prose("<Note>\ntext\n</Note> trailing"), Some(12..19));
        assert_eq!(tag_beside_prose("<Demo\n  size={3}\n/>\n"), None);
        assert_eq!(tag_beside_prose("<Callout\n  type=\"tip\">\nText\n</Callout>"), None);
    }
}
