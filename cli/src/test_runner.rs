use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use composer::{ComposeError, RenderOptions, WidgetRegistry};
use docpage::BlockKind;
use serde::Deserialize;

/// TOML frontmatter of a `.test.md` fixture.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureConfig {
    #[serde(default)]
    pub description: Option<String>,

    /// Widget names registered before composing the page body.
    #[serde(default)]
    pub widgets: Vec<String>,

    /// The page must fail to parse.
    #[serde(default)]
    pub expect_parse_error: bool,

    /// The page must fail resolution naming exactly these widgets, in order.
    #[serde(default)]
    pub expect_unresolved: Option<Vec<String>>,

    /// Kinds of the top-level blocks, e.g. `["heading", "code sample"]`.
    #[serde(default)]
    pub expect_blocks: Option<Vec<String>>,

    /// Tab labels of the first tab group in the page.
    #[serde(default)]
    pub expect_tabs: Option<Vec<String>>,

    /// Substrings that must appear in the rendered HTML.
    #[serde(default)]
    pub expect_html_contains: Vec<String>,
}

/// Split a fixture into its TOML config and the page body.
fn parse_fixture(content: &str) -> Result<(FixtureConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}');
    let after_open = content
        .strip_prefix("---")
        .ok_or("missing opening --- frontmatter delimiter")?;
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    // An empty config closes immediately.
    let (toml_str, rest) = if let Some(rest) = after_open.strip_prefix("---") {
        ("", rest)
    } else {
        let close = after_open
            .find("\n---")
            .ok_or("missing closing --- frontmatter delimiter")?;
        (&after_open[..close], &after_open[close + 4..])
    };
    let body = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let config: FixtureConfig = toml::from_str(toml_str.trim_end_matches('\r'))
        .map_err(|e| format!("TOML parse error: {}", e))?;
    Ok((config, body))
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

impl TestResult {
    fn label(&self) -> &str {
        self.description.as_deref().unwrap_or_else(|| {
            self.path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("?")
        })
    }
}

fn run_single_test(path: &Path) -> TestResult {
    let fail = |description: Option<String>, reason: String| TestResult {
        path: path.to_path_buf(),
        description,
        outcome: TestOutcome::Fail(reason),
    };

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return fail(None, format!("cannot read file: {}", e)),
    };
    let (config, body) = match parse_fixture(&content) {
        Ok(pair) => pair,
        Err(e) => return fail(None, format!("frontmatter error: {}", e)),
    };

    let description = config.description.clone();
    let outcome = match check_fixture(&config, body) {
        None => TestOutcome::Pass,
        Some(reason) => TestOutcome::Fail(reason),
    };
    TestResult {
        path: path.to_path_buf(),
        description,
        outcome,
    }
}

/// Compose `body` and compare against the fixture's expectations.
/// Returns `Some(reason)` on mismatch.
fn check_fixture(config: &FixtureConfig, body: &str) -> Option<String> {
    let mut registry = WidgetRegistry::new();
    for name in &config.widgets {
        registry.register_island(name.as_str());
    }

    let result = composer::compose(body, 0, &registry);

    if config.expect_parse_error {
        return match result {
            Err(ComposeError::Parse(_)) => None,
            Err(other) => Some(format!("expected parse error, got: {}", other)),
            Ok(_) => Some("expected parse error, but composition succeeded".into()),
        };
    }

    if let Some(expected) = &config.expect_unresolved {
        return match result {
            Err(err @ ComposeError::Unresolved(_)) => {
                let names = err.unresolved_names();
                if names == *expected {
                    None
                } else {
                    Some(format!(
                        "unresolved widgets mismatch\n  expected: {:?}\n  actual:   {:?}",
                        expected, names
                    ))
                }
            }
            Err(other) => Some(format!("expected unresolved widgets, got: {}", other)),
            Ok(_) => Some("expected unresolved widgets, but composition succeeded".into()),
        };
    }

    let page = match result {
        Ok(page) => page,
        Err(ComposeError::Parse(errors)) => {
            let msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            return Some(format!("unexpected parse error: {}", msgs.join("; ")));
        }
        Err(err) => return Some(format!("unexpected error: {}", err)),
    };

    if let Some(expected) = &config.expect_blocks {
        let actual: Vec<&str> = page.document().blocks.iter().map(|b| b.describe()).collect();
        if actual != *expected {
            return Some(format!(
                "block mismatch\n  expected: {:?}\n  actual:   {:?}",
                expected, actual
            ));
        }
    }

    if let Some(expected) = &config.expect_tabs {
        let mut labels: Option<Vec<String>> = None;
        page.document().walk(&mut |block| {
            if labels.is_some() {
                return;
            }
            if let BlockKind::TabGroup { tabs, .. } = &block.kind {
                labels = Some(tabs.iter().map(|t| t.label.clone()).collect());
            }
        });
        match labels {
            Some(actual) if actual == *expected => {}
            Some(actual) => {
                return Some(format!(
                    "tab mismatch\n  expected: {:?}\n  actual:   {:?}",
                    expected, actual
                ));
            }
            None => return Some("expected a tab group, but the page has none".into()),
        }
    }

    if !config.expect_html_contains.is_empty() {
        let html = page.render(&RenderOptions::default());
        for needle in &config.expect_html_contains {
            if !html.contains(needle.as_str()) {
                return Some(format!("rendered HTML does not contain {:?}", needle));
            }
        }
    }

    None
}

/// `.test.md` files grouped by the subfolder they live in. Files directly
/// under `root` get the empty category.
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_tests(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_tests(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_tests(&path, root, out);
        } else if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(".test.md"))
        {
            let category = path
                .parent()
                .and_then(|p| p.strip_prefix(root).ok())
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            out.entry(category).or_default().push(path);
        }
    }
}

fn category_label(category: &str) -> &str {
    if category.is_empty() { "(root)" } else { category }
}

pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }
    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no .test.md files found in {}", path.display());
        return;
    }
    eprintln!("available categories:");
    for (category, files) in &categories {
        eprintln!("  {} ({} tests)", category_label(category), files.len());
    }
}

struct Style {
    no_color: bool,
}

impl Style {
    fn paint(&self, text: &str, code: &str) -> String {
        if self.no_color {
            text.to_string()
        } else {
            format!("\x1b[{}m{}\x1b[0m", code, text)
        }
    }

    fn pass(&self) -> String {
        self.paint("PASS", "32")
    }

    fn fail(&self) -> String {
        self.paint("FAIL", "31")
    }

    fn bold(&self, text: &str) -> String {
        self.paint(text, "1")
    }
}

/// Select the categories to run. Unknown requests warn but do not abort.
fn select<'a>(
    all: &'a BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<&'a str, &'a Vec<PathBuf>> {
    if requested.is_empty() {
        return all.iter().map(|(k, v)| (k.as_str(), v)).collect();
    }
    let mut selected = BTreeMap::new();
    for request in requested {
        let request = request.trim_matches('/');
        let prefix = format!("{}/", request);
        let before = selected.len();
        for (category, files) in all {
            if category == request || category.starts_with(&prefix) {
                selected.insert(category.as_str(), files);
            }
        }
        if selected.len() == before {
            eprintln!(
                "warning: category '{}' not found (available: {})",
                request,
                all.keys()
                    .map(|k| category_label(k))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }
    selected
}

/// Run `.test.md` fixtures under `path` (or a single fixture file).
/// Returns the process exit code.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let style = Style { no_color };

    let all = if path.is_file() {
        BTreeMap::from([(String::new(), vec![path.to_path_buf()])])
    } else {
        discover_categorized(path)
    };
    if all.is_empty() {
        eprintln!("no .test.md files found in {}", path.display());
        return 1;
    }
    let run = select(&all, categories);
    if run.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    let mut passed = 0usize;
    let mut failures: Vec<TestResult> = Vec::new();

    for (category, files) in &run {
        eprintln!();
        eprintln!("{}", style.bold(category_label(category)));
        for file in *files {
            let result = run_single_test(file);
            tracing::debug!(fixture = %file.display(), "ran fixture");
            match &result.outcome {
                TestOutcome::Pass => {
                    passed += 1;
                    eprintln!("  {}  {}", style.pass(), result.label());
                }
                TestOutcome::Fail(_) => {
                    eprintln!("  {}  {}", style.fail(), result.label());
                    failures.push(result);
                }
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for failure in &failures {
            eprintln!();
            eprintln!("  --- {} ---", failure.path.display());
            if let TestOutcome::Fail(reason) = &failure.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    eprintln!();
    let failed = failures.len();
    if failed == 0 {
        eprintln!("test result: {}. {} passed, 0 failed", style.paint("ok", "32"), passed);
        0
    } else {
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            style.paint("FAILED", "31"),
            passed,
            failed,
            passed + failed
        );
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(content: &str) -> Option<String> {
        let (config, body) = parse_fixture(content).unwrap();
        check_fixture(&config, body)
    }

    #[test]
    fn fixture_splits_config_and_body() {
        let (config, body) =
            parse_fixture("---\ndescription = \"demo\"\nwidgets = [\"A\"]\n---\n# Page\n").unwrap();
        assert_eq!(config.description.as_deref(), Some("demo"));
        assert_eq!(config.widgets, vec!["A"]);
        assert_eq!(body, "# Page\n");
    }

    #[test]
    fn empty_config_is_allowed() {
        let (config, body) = parse_fixture("---\n---\nText\n").unwrap();
        assert!(config.widgets.is_empty());
        assert_eq!(body, "Text\n");
    }

    #[test]
    fn missing_delimiters_are_reported() {
        assert!(parse_fixture("# no frontmatter").is_err());
        assert!(parse_fixture("---\ndescription = \"x\"\n").is_err());
    }

    #[test]
    fn passing_fixture() {
        let content = "---\nwidgets = [\"CounterHookExample\"]\nexpect_blocks = [\"heading\", \"code sample\", \"widget\"]\nexpect_html_contains = [\"language-jsx\"]\n---\n# Hooks\n\n```jsx\nuseState(0)\n```\n\n<CounterHookExample />\n";
        assert_eq!(check(content), None);
    }

    #[test]
    fn unresolved_expectation() {
        let content = "---\nexpect_unresolved = [\"CounterHookExample\"]\n---\n<CounterHookExample />\n";
        assert_eq!(check(content), None);
    }

    #[test]
    fn mismatched_tabs_fail() {
        let content = "---\nexpect_tabs = [\"npm\"]\n---\n<Tabs>\n<Tab label=\"yarn\">\nx\n</Tab>\n</Tabs>\n";
        let reason = check(content).unwrap();
        assert!(reason.contains("tab mismatch"), "{}", reason);
    }

    #[test]
    fn unexpected_success_fails() {
        let content = "---\nexpect_parse_error = true\n---\n# Fine\n";
        assert!(check(content).is_some());
    }
}
