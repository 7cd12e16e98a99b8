pub mod config;
pub mod error;
pub mod outline;
pub mod registry;
pub mod render;
pub mod resolve;

use std::ops::RangeInclusive;

pub use config::{ConfigError, SiteConfig};
pub use error::{ComposeError, UnresolvedWidgetError};
pub use outline::Outline;
pub use registry::{IslandFactory, MountedWidget, WidgetFactory, WidgetRegistry};
pub use render::{RenderOptions, render_page};
pub use resolve::{ResolvedDocument, resolve};

/// A fully composed page: parsed, resolved, with navigation.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub resolved: ResolvedDocument,
    pub outline: Outline,
}

impl Page {
    pub fn document(&self) -> &docpage::Document {
        &self.resolved.document
    }

    pub fn title(&self) -> Option<String> {
        self.resolved.document.title()
    }

    pub fn render(&self, options: &RenderOptions) -> String {
        render_page(self, options)
    }
}

/// Composes pages against one widget registry.
pub struct Composer<'r> {
    registry: &'r WidgetRegistry,
    toc_levels: RangeInclusive<u8>,
}

impl<'r> Composer<'r> {
    pub fn new(registry: &'r WidgetRegistry) -> Self {
        Composer {
            registry,
            toc_levels: 2..=3,
        }
    }

    pub fn with_toc_levels(mut self, min: u8, max: u8) -> Self {
        self.toc_levels = min..=max;
        self
    }

    /// A composer configured from `config`.
    pub fn from_config(registry: &'r WidgetRegistry, config: &SiteConfig) -> Self {
        Composer::new(registry).with_toc_levels(config.toc_min_level, config.toc_max_level)
    }

    /// Parse then resolve. The page either composes whole or fails.
    pub fn compose(&self, source: &str, file_id: usize) -> Result<Page, ComposeError> {
        let document = docpage::parse(source, file_id).map_err(ComposeError::Parse)?;
        let resolved = resolve(document, self.registry).map_err(ComposeError::Unresolved)?;
        let outline = Outline::build(&resolved.document, self.toc_levels.clone());
        tracing::debug!(
            file_id,
            blocks = resolved.document.block_count(),
            toc = outline.entries.len(),
            "composed page"
        );
        Ok(Page { resolved, outline })
    }
}

/// Compose one page with default settings.
pub fn compose(
    source: &str,
    file_id: usize,
    registry: &WidgetRegistry,
) -> Result<Page, ComposeError> {
    Composer::new(registry).compose(source, file_id)
}
