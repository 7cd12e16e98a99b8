use std::ops::Range;

use crate::document::{EsmKind, EsmStatement};
use crate::parser::error::ParseError;

/// True if a paragraph opens with an MDX `import`/`export` statement.
pub(crate) fn looks_like_esm(text: &str) -> bool {
    let t = text.trim_start();
    t.starts_with("import ") || t.starts_with("import{") || t.starts_with("export ")
}

/// Split a paragraph of ESM into statements and parse each one.
/// `offset` is the paragraph's byte position in the page source.
pub(crate) fn parse_esm(
    text: &str,
    offset: usize,
    file_id: usize,
) -> Result<Vec<EsmStatement>, ParseError> {
    let mut pieces: Vec<(usize, usize)> = Vec::new();
    let mut pos = 0;
    for line in text.split_inclusive('\n') {
        let starts_statement = looks_like_esm(line);
        match pieces.last_mut() {
            Some(last) if !starts_statement => last.1 = pos + line.len(),
            None if !starts_statement => {
                return Err(ParseError::error(
                    "expected `import` or `export`",
                    offset + pos..offset + pos + line.len(),
                    file_id,
                )
                .in_block("esm statement"));
            }
            _ => pieces.push((pos, pos + line.len())),
        }
        pos += line.len();
    }

    pieces
        .into_iter()
        .map(|(start, end)| {
            let statement = text[start..end].trim();
            let span = offset + start..offset + end;
            parse_statement(statement, span, file_id)
        })
        .collect()
}

fn parse_statement(
    statement: &str,
    span: Range<usize>,
    file_id: usize,
) -> Result<EsmStatement, ParseError> {
    if statement.starts_with("export") {
        return Ok(EsmStatement {
            kind: EsmKind::Export,
            statement: statement.to_string(),
            bindings: Vec::new(),
            module: None,
            span,
        });
    }

    let malformed = |why: &str| {
        ParseError::error(format!("malformed import: {}", why), span.clone(), file_id)
            .in_block("esm statement")
    };

    let body = statement
        .trim_start_matches("import")
        .trim()
        .trim_end_matches(';')
        .trim();

    // Side-effect import: `import './styles.css'`
    if let Some(module) = unquote(body) {
        return Ok(EsmStatement {
            kind: EsmKind::Import,
            statement: statement.to_string(),
            bindings: Vec::new(),
            module: Some(module.to_string()),
            span,
        });
    }

    let Some(from) = body.rfind(" from ") else {
        return Err(malformed("missing `from`"));
    };
    let clause = body[..from].trim();
    let Some(module) = unquote(body[from + 6..].trim()) else {
        return Err(malformed("module specifier must be a string"));
    };

    let mut bindings = Vec::new();
    let mut rest = clause.to_string();
    if let Some(open) = clause.find('{') {
        let Some(close) = clause.rfind('}') else {
            return Err(malformed("unclosed `{`"));
        };
        for named in clause[open + 1..close].split(',') {
            let named = named.trim();
            if named.is_empty() {
                continue;
            }
            let local = named.rsplit(" as ").next().unwrap_or(named).trim();
            bindings.push(local.to_string());
        }
        rest = format!("{}{}", &clause[..open], &clause[close + 1..]);
    }

    for part in rest.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let local = match part.strip_prefix('*') {
            Some(ns) => match ns.trim().strip_prefix("as ") {
                Some(name) => name.trim(),
                None => return Err(malformed("namespace import needs `as`")),
            },
            None => part,
        };
        bindings.insert(0, local.to_string());
    }

    if bindings.is_empty() {
        return Err(malformed("nothing imported"));
    }
    if let Some(bad) = bindings.iter().find(|b| !is_identifier(b)) {
        return Err(malformed(&format!("`{}` is not an identifier", bad)));
    }

    Ok(EsmStatement {
        kind: EsmKind::Import,
        statement: statement.to_string(),
        bindings,
        module: Some(module.to_string()),
        span,
    })
}

fn unquote(s: &str) -> Option<&str> {
    let quote = s.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    s.strip_prefix(quote)?.strip_suffix(quote)
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_and_named_imports() {
        let stmts = parse_esm(
            "import Tabs from '@theme/Tabs';\nimport { useState, useRef as ref } from \"react\";\n",
            10,
            0,
        )
        .unwrap();
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[0].bindings, vec!["Tabs"]);
        assert_eq!(stmts[0].module.as_deref(), Some("@theme/Tabs"));
        assert_eq!(stmts[0].span.start, 10);
        assert_eq!(stmts[1].bindings, vec!["useState", "ref"]);
    }

    #[test]
    fn default_comes_before_named() {
        let stmts = parse_esm("import React, { useEffect } from 'react'", 0, 0).unwrap();
        assert_eq!(stmts[0].bindings, vec!["React", "useEffect"]);
    }

    #[test]
    fn namespace_and_side_effect_imports() {
        let stmts = parse_esm("import * as Demos from './demos';\nimport './demo.css';", 0, 0)
            .unwrap();
        assert_eq!(stmts[0].bindings, vec!["Demos"]);
        assert!(stmts[1].bindings.is_empty());
        assert_eq!(stmts[1].module.as_deref(), Some("./demo.css"));
    }

    #[test]
    fn multi_line_import_is_one_statement() {
        let stmts = parse_esm("import {\n  A,\n  B,\n} from './x';", 0, 0).unwrap();
        assert_eq!(stmts.len(), 1);
        assert_eq!(stmts[0].bindings, vec!["A", "B"]);
    }

    #[test]
    fn exports_are_kept_verbatim() {
        let stmts = parse_esm("export const toc = [];", 0, 0).unwrap();
        assert_eq!(stmts[0].kind, EsmKind::Export);
        assert_eq!(stmts[0].statement, "export const toc = [];");
    }

    #[test]
    fn missing_from_is_an_error() {
        let err = parse_esm("import Tabs '@theme/Tabs'", 0, 0).unwrap_err();
        assert!(err.message.contains("from"), "{}", err.message);
    }
}
