use std::collections::BTreeMap;

use docpage::{BlockId, BlockKind, Document};

use crate::error::UnresolvedWidgetError;
use crate::registry::{MountedWidget, WidgetRegistry};

/// A document whose every widget reference has been mounted.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDocument {
    pub document: Document,
    pub widgets: BTreeMap<BlockId, MountedWidget>,
}

impl ResolvedDocument {
    pub fn widget(&self, id: BlockId) -> Option<&MountedWidget> {
        self.widgets.get(&id)
    }
}

/// Look up every widget reference in `registry`, nested ones included.
/// Any miss fails the whole document; every miss is reported.
pub fn resolve(
    document: Document,
    registry: &WidgetRegistry,
) -> Result<ResolvedDocument, Vec<UnresolvedWidgetError>> {
    let mut widgets = BTreeMap::new();
    let mut missing = Vec::new();

    document.walk(&mut |block| {
        let BlockKind::Widget(widget) = &block.kind else {
            return;
        };
        match registry.lookup(&widget.name, &widget.props) {
            Some(mounted) => {
                widgets.insert(block.id, mounted);
            }
            None => missing.push(UnresolvedWidgetError {
                name: widget.name.clone(),
                span: block.span.clone(),
                file_id: document.source_id,
                suggestion: registry.suggest(&widget.name).map(str::to_string),
            }),
        }
    });

    if !missing.is_empty() {
        tracing::debug!(
            file_id = document.source_id,
            missing = missing.len(),
            "widget resolution failed"
        );
        return Err(missing);
    }

    tracing::debug!(
        file_id = document.source_id,
        widgets = widgets.len(),
        "resolved widgets"
    );
    Ok(ResolvedDocument { document, widgets })
}
