use informant_core::{Rect, Size, Vec2};

use crate::drawable::MAX_LEVEL;

/// Horizontal placement of the max rail: scale about the widget centre, then
/// translate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RailPlacement {
    pub scale_x: f32,
    pub translate_x: f32,
}

/// Where the rail halves and the handle sit for the current level.
///
/// The fill forwards its bounds and level here; the max rail and the handle
/// follow. The fill itself is revealed by the drawable wipe.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ProgressLayout {
    pub bounds: Rect,
    pub level: u32,
    pub inverted: bool,
}

impl ProgressLayout {
    pub fn fraction(&self) -> f32 {
        self.level.min(MAX_LEVEL) as f32 / MAX_LEVEL as f32
    }

    /// Covers `[w * s, w)` of the widget.
    pub fn max_rail(&self) -> RailPlacement {
        let s = self.fraction();
        RailPlacement {
            scale_x: 1.0 - s,
            translate_x: self.bounds.w * s * 0.5,
        }
    }

    pub fn handle_center(&self) -> Vec2 {
        let t = if self.inverted {
            1.0 - self.fraction()
        } else {
            self.fraction()
        };
        Vec2 {
            x: self.bounds.x + self.bounds.w * t,
            y: self.bounds.y + self.bounds.h * 0.5,
        }
    }

    /// A handle of `size`, centred on [`ProgressLayout::handle_center`].
    pub fn handle_rect(&self, size: Size) -> Rect {
        let c = self.handle_center();
        Rect::new(
            c.x - size.width * 0.5,
            c.y - size.height * 0.5,
            size.width,
            size.height,
        )
    }
}
