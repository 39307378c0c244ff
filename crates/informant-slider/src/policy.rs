//! Per-slot sizing, clipping and fit rules for rendering a mirror.

use informant_core::{Canvas, Error, Raster, Rect, Result, Vec2};

use crate::mirror::MirrorTree;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SlotKind {
    Handle,
    MinTrack,
    MaxTrack,
    Background,
}

impl SlotKind {
    pub const ALL: [SlotKind; 4] = [
        SlotKind::Handle,
        SlotKind::MinTrack,
        SlotKind::MaxTrack,
        SlotKind::Background,
    ];

    /// Back to front.
    pub const PAINT_ORDER: [SlotKind; 4] = [
        SlotKind::Background,
        SlotKind::MaxTrack,
        SlotKind::MinTrack,
        SlotKind::Handle,
    ];

    pub fn index(self) -> usize {
        match self {
            SlotKind::Handle => 0,
            SlotKind::MinTrack => 1,
            SlotKind::MaxTrack => 2,
            SlotKind::Background => 3,
        }
    }

    /// The fill is revealed by level instead of being re-rendered.
    pub fn wipes(self) -> bool {
        self == SlotKind::MinTrack
    }
}

/// Widget-side inputs every policy reads.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PolicyContext {
    /// Content rect of the widget.
    pub widget: Rect,
    /// Current press-feedback scale of the handle.
    pub press_scale: f32,
    pub inverted: bool,
    /// Intrinsic thickness of the system track.
    pub bar_height: f32,
    pub max_side: u32,
}

/// Renders `mirror` for `kind`. `Ok(None)` means the slot has no area yet
/// (the widget has not been laid out) and nothing should change.
pub fn render(kind: SlotKind, mirror: &mut MirrorTree, ctx: &PolicyContext) -> Result<Option<Raster>> {
    match kind {
        SlotKind::Handle => render_handle(mirror, ctx).map(Some),
        SlotKind::MinTrack | SlotKind::MaxTrack | SlotKind::Background => render_rail(mirror, ctx),
    }
}

fn allocate(w: f32, h: f32, ctx: &PolicyContext) -> Result<Raster> {
    let raster = Raster::for_rect(Rect::from_size(w, h))?;
    if raster.width() > ctx.max_side || raster.height() > ctx.max_side {
        return Err(Error::Raster {
            width: raster.width(),
            height: raster.height(),
        });
    }
    Ok(raster)
}

/// Side of the square handle canvas for a source of `source` size.
pub fn handle_side(mirror: &MirrorTree, press_scale: f32) -> f32 {
    let src = mirror.reference();
    src.width.max(src.height) * press_scale
}

fn render_handle(mirror: &mut MirrorTree, ctx: &PolicyContext) -> Result<Raster> {
    let src = mirror.reference();
    if src.is_empty() {
        return Err(Error::Raster {
            width: src.width.max(0.0).ceil() as u32,
            height: src.height.max(0.0).ceil() as u32,
        });
    }
    let side = handle_side(mirror, ctx.press_scale);
    let mut raster = allocate(side, side, ctx)?;

    let fit = (side / src.width).min(side / src.height);
    let (w, h) = (src.width * fit, src.height * fit);
    mirror.layout(Rect::new((side - w) * 0.5, (side - h) * 0.5, w, h));

    let half = side * 0.5;
    let mut canvas = Canvas::new(&mut raster);
    canvas.clip_circle(Vec2 { x: half, y: half }, half);
    if ctx.inverted {
        canvas.scale_about(-1.0, 1.0, half, half);
    }
    mirror.draw(&mut canvas);
    Ok(raster)
}

/// Rails and background: stretched across the widget, bar thickness
/// `max(min(widget.h, source.h), intrinsic)`, vertically centred.
fn render_rail(mirror: &mut MirrorTree, ctx: &PolicyContext) -> Result<Option<Raster>> {
    let widget = ctx.widget;
    if widget.is_empty() {
        return Ok(None);
    }
    let mut raster = allocate(widget.w, widget.h, ctx)?;
    let bar = widget.h.min(mirror.reference().height).max(ctx.bar_height);
    mirror.layout(Rect::new(0.0, (widget.h - bar) * 0.5, widget.w, bar));

    let mut canvas = Canvas::new(&mut raster);
    mirror.draw(&mut canvas);
    Ok(Some(raster))
}
