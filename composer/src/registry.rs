use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use docpage::{PropValue, Props};

use crate::render::escape;

/// Markup produced by a widget factory, ready to be placed in a page.
#[derive(Debug, Clone, PartialEq)]
pub struct MountedWidget {
    pub name: String,
    pub html: String,
}

/// Creates a mountable widget for a reference found in a page.
pub trait WidgetFactory: Send + Sync {
    fn mount(&self, name: &str, props: &Props) -> MountedWidget;
}

impl<F> WidgetFactory for F
where
    F: Fn(&str, &Props) -> String + Send + Sync,
{
    fn mount(&self, name: &str, props: &Props) -> MountedWidget {
        MountedWidget {
            name: name.to_string(),
            html: self(name, props),
        }
    }
}

/// Emits a hydration placeholder that a client-side bundle mounts into.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IslandFactory {
    /// Script module that implements the widget.
    pub module: Option<String>,
    /// Markup shown until the widget hydrates.
    pub fallback: Option<String>,
}

impl WidgetFactory for IslandFactory {
    fn mount(&self, name: &str, props: &Props) -> MountedWidget {
        let mut html = format!(
            "<div class=\"widget\" data-widget=\"{}\" data-props=\"{}\"",
            escape(name),
            escape(&props_json(props).to_string())
        );
        if let Some(module) = &self.module {
            html.push_str(&format!(" data-module=\"{}\"", escape(module)));
        }
        html.push('>');
        if let Some(fallback) = &self.fallback {
            html.push_str(fallback);
        }
        html.push_str("</div>");
        MountedWidget {
            name: name.to_string(),
            html,
        }
    }
}

/// Props as JSON for a client bundle. Unevaluated expressions are wrapped
/// as `{"$expr": "..."}` so they cannot be mistaken for strings.
pub fn props_json(props: &Props) -> serde_json::Value {
    let map = props
        .iter()
        .map(|(key, value)| {
            let value = match value {
                PropValue::Literal(v) => v.clone(),
                PropValue::Expression(expr) => serde_json::json!({ "$expr": expr }),
            };
            (key.clone(), value)
        })
        .collect();
    serde_json::Value::Object(map)
}

/// Widget factories registered before composition, keyed by name.
#[derive(Clone, Default)]
pub struct WidgetRegistry {
    factories: BTreeMap<String, Arc<dyn WidgetFactory>>,
}

impl WidgetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        factory: impl WidgetFactory + 'static,
    ) -> &mut Self {
        self.factories.insert(name.into(), Arc::new(factory));
        self
    }

    /// Register a name backed by a plain hydration placeholder.
    pub fn register_island(&mut self, name: impl Into<String>) -> &mut Self {
        self.register(name, IslandFactory::default())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Mount `name` with `props`. `None` means the name is not registered.
    pub fn lookup(&self, name: &str, props: &Props) -> Option<MountedWidget> {
        self.factories
            .get(name)
            .map(|factory| factory.mount(name, props))
    }

    /// Closest registered name, if one is within a Damerau-Levenshtein distance of 3.
    pub fn suggest(&self, name: &str) -> Option<&str> {
        self.names()
            .map(|candidate| (candidate, strsim::damerau_levenshtein(name, candidate)))
            .filter(|(_, dist)| *dist <= 3)
            .min_by_key(|(_, dist)| *dist)
            .map(|(candidate, _)| candidate)
    }
}

impl fmt::Debug for WidgetRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.factories.keys()).finish()
    }
}
