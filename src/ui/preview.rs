use crate::{
    editor::RichTextEngine,
    ui::toolbar::{Toolbar, ToolbarState},
};

/// What the page shows beside the editor: serialized HTML, the pretty
/// printed node tree, and the toolbar flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LivePreview {
    pub html: String,
    pub json: String,
    pub toolbar: ToolbarState,
    pub revision: u64,
}

impl LivePreview {
    pub fn capture(engine: &dyn RichTextEngine, toolbar: &Toolbar) -> Self {
        let mut preview = Self::default();
        preview.refresh(engine, toolbar);
        preview
    }

    pub fn refresh(&mut self, engine: &dyn RichTextEngine, toolbar: &Toolbar) {
        self.html = engine.serialized_text();
        self.json = serde_json::to_string_pretty(&engine.serialized_structure()).unwrap_or_default();
        self.toolbar = toolbar.snapshot(engine);
        self.revision += 1;
    }
}
