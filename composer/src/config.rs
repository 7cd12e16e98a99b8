use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::registry::{IslandFactory, WidgetRegistry};
use crate::render::RenderOptions;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("toc_min_level ({min}) is greater than toc_max_level ({max})")]
    TocLevels { min: u8, max: u8 },
}

/// Site configuration, usually `docsite.toml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Appended to every page title.
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default = "default_toc_min")]
    pub toc_min_level: u8,

    #[serde(default = "default_toc_max")]
    pub toc_max_level: u8,

    /// Widgets available to pages, by name.
    #[serde(default)]
    pub widgets: BTreeMap<String, WidgetConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WidgetConfig {
    /// Script module implementing the widget.
    #[serde(default)]
    pub module: Option<String>,
    /// Markup shown until the widget hydrates.
    #[serde(default)]
    pub fallback: Option<String>,
}

fn default_toc_min() -> u8 {
    2
}

fn default_toc_max() -> u8 {
    3
}

impl Default for SiteConfig {
    fn default() -> Self {
        SiteConfig {
            title: None,
            toc_min_level: default_toc_min(),
            toc_max_level: default_toc_max(),
            widgets: BTreeMap::new(),
        }
    }
}

impl SiteConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: SiteConfig = toml::from_str(&text).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        tracing::debug!(path = %path.display(), widgets = config.widgets.len(), "loaded site config");
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: SiteConfig = toml::from_str(text).map_err(|source| ConfigError::Toml {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.toc_min_level > self.toc_max_level {
            return Err(ConfigError::TocLevels {
                min: self.toc_min_level,
                max: self.toc_max_level,
            });
        }
        Ok(())
    }

    /// A registry with one island factory per configured widget.
    pub fn registry(&self) -> WidgetRegistry {
        let mut registry = WidgetRegistry::new();
        for (name, widget) in &self.widgets {
            registry.register(
                name.clone(),
                IslandFactory {
                    module: widget.module.clone(),
                    fallback: widget.fallback.clone(),
                },
            );
        }
        registry
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            site_title: self.title.clone(),
            standalone: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply() {
        let config = SiteConfig::from_toml_str("").unwrap();
        assert_eq!(config, SiteConfig::default());
        assert_eq!((config.toc_min_level, config.toc_max_level), (2, 3));
    }

    #[test]
    fn widgets_become_registry_entries() {
        let config = SiteConfig::from_toml_str(
            r#"
title = "Hooks"

[widgets.CounterHookExample]
module = "widgets/Counter.jsx"

[widgets.EffectHookExample]
"#,
        )
        .unwrap();
        let registry = config.registry();
        let names: Vec<&str> = registry.names().collect();
        assert_eq!(names, vec!["CounterHookExample", "EffectHookExample"]);
        assert_eq!(config.render_options().site_title.as_deref(), Some("Hooks"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = SiteConfig::from_toml_str("titel = \"typo\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml { .. }));
    }

    #[test]
    fn load_reports_path_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docsite.toml");
        std::fs::write(&path, "toc_max_level = \"deep\"").unwrap();
        let err = SiteConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("docsite.toml"), "{}", err);

        let missing = SiteConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }

    #[test]
    fn inverted_toc_levels_are_rejected() {
        let err = SiteConfig::from_toml_str("toc_min_level = 4\ntoc_max_level = 2").unwrap_err();
        assert!(matches!(err, ConfigError::TocLevels { min: 4, max: 2 }));
    }
}
