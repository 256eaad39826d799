use tracing::debug;

use crate::{
    editor::RichTextEngine,
    ui::{
        Color,
        toolbar::{Affordance, Toolbar},
    },
};

pub const PALETTE_SIZE: usize = 3;

pub type Palette = [Color; PALETTE_SIZE];

pub fn default_palette() -> Palette {
    [Color::black(), Color::red(), Color::blue()]
}

/// Transient swatch overlay for the apply-color affordance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorPicker {
    palette: Palette,
    open: bool,
}

impl Default for ColorPicker {
    fn default() -> Self {
        Self::new(default_palette())
    }
}

impl ColorPicker {
    pub fn new(palette: Palette) -> Self {
        Self {
            palette,
            open: false,
        }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn swatch(&self, index: usize) -> Option<&Color> {
        self.palette.get(index)
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    /// Click outside the overlay. Returns whether it was open.
    pub fn dismiss(&mut self) -> bool {
        std::mem::replace(&mut self.open, false)
    }

    /// Applies swatch `index` and closes the overlay. Ignored while closed or
    /// for an index outside the palette.
    pub fn select(
        &mut self,
        index: usize,
        toolbar: &Toolbar,
        engine: &mut dyn RichTextEngine,
    ) -> bool {
        if !self.open {
            return false;
        }
        let Some(color) = self.palette.get(index).cloned() else {
            debug!(index, "no such swatch");
            return false;
        };
        self.open = false;
        toolbar.dispatch(engine, Affordance::ApplyColor, Some(color))
    }
}
