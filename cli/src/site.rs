use std::io;
use std::path::{Path, PathBuf};

use composer::{Composer, SiteConfig};

use crate::report::Reporter;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SiteReport {
    pub pages: usize,
    pub failed: usize,
}

impl SiteReport {
    pub fn ok(&self) -> bool {
        self.failed == 0
    }
}

/// Page sources under `input`, sorted. A file input is its own single page.
/// `.test.md` fixtures are skipped.
pub fn discover_pages(input: &Path) -> Vec<PathBuf> {
    if input.is_file() {
        return vec![input.to_path_buf()];
    }
    let mut pages = Vec::new();
    collect_pages(input, &mut pages);
    pages.sort();
    pages
}

fn collect_pages(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_pages(&path, out);
        } else if is_page(&path) {
            out.push(path);
        }
    }
}

fn is_page(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    !name.ends_with(".test.md") && (name.ends_with(".md") || name.ends_with(".mdx"))
}

/// Where the rendered page for `page` goes: same relative path under `out`,
/// extension replaced with `.html`.
pub fn output_path(input: &Path, page: &Path, out: &Path) -> PathBuf {
    let relative = if input.is_file() {
        page.file_name().map(PathBuf::from).unwrap_or_default()
    } else {
        page.strip_prefix(input)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| page.to_path_buf())
    };
    out.join(relative).with_extension("html")
}

/// `docsite.toml` next to the input, if present.
pub fn default_config_path(input: &Path) -> Option<PathBuf> {
    let dir = if input.is_file() { input.parent()? } else { input };
    let candidate = dir.join("docsite.toml");
    candidate.is_file().then_some(candidate)
}

/// Compose every page under `input`. With `out`, rendered pages are written
/// there; without it, pages are only checked. Every failing page is
/// reported before returning.
pub fn build(
    input: &Path,
    config: &SiteConfig,
    out: Option<&Path>,
    reporter: &mut Reporter,
) -> io::Result<SiteReport> {
    let registry = config.registry();
    let page_composer = Composer::from_config(&registry, config);
    let options = config.render_options();
    let mut report = SiteReport::default();

    for path in discover_pages(input) {
        report.pages += 1;
        let source = match std::fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: cannot read '{}': {}", path.display(), e);
                report.failed += 1;
                continue;
            }
        };
        let file_id = reporter.add(path.display().to_string(), source.clone());

        let page = match page_composer.compose(&source, file_id) {
            Ok(page) => page,
            Err(err) => {
                tracing::warn!(page = %path.display(), error = %err, "page failed to compose");
                reporter.emit(&err.diagnostics());
                report.failed += 1;
                continue;
            }
        };

        if let Some(out) = out {
            let target = output_path(input, &path, out);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&target, page.render(&options))?;
            tracing::info!(page = %path.display(), output = %target.display(), "built page");
        } else {
            tracing::info!(page = %path.display(), "checked page");
        }
    }

    Ok(report)
}
