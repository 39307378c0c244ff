use std::sync::Arc;

use bitflags::bitflags;
use informant_core::{Canvas, Color, Paint, Raster, Rect, TransformProps};
use parking_lot::Mutex;

/// Full-scale progress level.
pub const MAX_LEVEL: u32 = 10_000;

bitflags! {
    /// Discrete state a drawable keeps across swaps.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct DrawableState: u8 {
        const ENABLED = 1 << 0;
        const PRESSED = 1 << 1;
        const FOCUSED = 1 << 2;
    }
}

/// The widget's own look for a slot, shown while nothing is bound.
pub trait SystemPainter: Send + Sync {
    fn paint(&self, canvas: &mut Canvas<'_>, bounds: Rect, state: DrawableState, level: u32, paint: &Paint);
}

/// Thumb: a filled circle inscribed in the bounds, darkened while pressed.
pub struct ThumbPainter {
    pub color: Color,
}

impl SystemPainter for ThumbPainter {
    fn paint(&self, canvas: &mut Canvas<'_>, bounds: Rect, state: DrawableState, _level: u32, paint: &Paint) {
        let mut color = self.color;
        if state.contains(DrawableState::PRESSED) {
            color = Color(
                (color.0 as f32 * 0.8) as u8,
                (color.1 as f32 * 0.8) as u8,
                (color.2 as f32 * 0.8) as u8,
                color.3,
            );
        }
        let radius = bounds.w.min(bounds.h) * 0.5;
        canvas.fill_circle(bounds.center(), radius, paint.apply(color));
    }
}

/// Track bar of fixed thickness, vertically centred. With `follows_level`
/// only the leading `level / MAX_LEVEL` of the width is painted.
pub struct TrackPainter {
    pub color: Color,
    pub height: f32,
    pub follows_level: bool,
}

impl SystemPainter for TrackPainter {
    fn paint(&self, canvas: &mut Canvas<'_>, bounds: Rect, _state: DrawableState, level: u32, paint: &Paint) {
        let h = self.height.min(bounds.h);
        let mut bar = Rect::new(bounds.x, bounds.y + (bounds.h - h) * 0.5, bounds.w, h);
        if self.follows_level {
            bar.w *= level.min(MAX_LEVEL) as f32 / MAX_LEVEL as f32;
        }
        canvas.fill_round_rect(bar, h * 0.5, paint.apply(self.color));
    }
}

/// Flat fill of the whole bounds.
pub struct FillPainter {
    pub color: Color,
}

impl SystemPainter for FillPainter {
    fn paint(&self, canvas: &mut Canvas<'_>, bounds: Rect, _state: DrawableState, _level: u32, paint: &Paint) {
        if self.color.3 > 0 {
            canvas.fill_rect(bounds, paint.apply(self.color));
        }
    }
}

enum Content {
    System(Arc<dyn SystemPainter>),
    /// `wipe` scales the raster horizontally by the level at draw time.
    Rendered { raster: Raster, wipe: bool },
}

struct DrawableInner {
    content: Content,
    bounds: Rect,
    state: DrawableState,
    level: u32,
    alpha: u8,
    transform: TransformProps,
    tint: Option<Color>,
}

/// What a slot displays: either the widget's system look or a raster
/// rendered from a mirror. Cloning shares the same drawable; identity is
/// [`Drawable::ptr_eq`].
#[derive(Clone)]
pub struct Drawable(Arc<Mutex<DrawableInner>>);

impl Drawable {
    fn with_content(content: Content) -> Self {
        Drawable(Arc::new(Mutex::new(DrawableInner {
            content,
            bounds: Rect::default(),
            state: DrawableState::ENABLED,
            level: 0,
            alpha: 255,
            transform: TransformProps::default(),
            tint: None,
        })))
    }

    pub fn system(painter: Arc<dyn SystemPainter>) -> Self {
        Self::with_content(Content::System(painter))
    }

    pub fn rendered(raster: Raster, wipe: bool) -> Self {
        Self::with_content(Content::Rendered { raster, wipe })
    }

    pub fn ptr_eq(&self, other: &Drawable) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn is_rendered(&self) -> bool {
        matches!(self.0.lock().content, Content::Rendered { .. })
    }

    /// Copy of the rendered raster, if any.
    pub fn raster(&self) -> Option<Raster> {
        match &self.0.lock().content {
            Content::Rendered { raster, .. } => Some(raster.clone()),
            Content::System(_) => None,
        }
    }

    /// Size of the rendered raster in pixels.
    pub fn raster_size(&self) -> Option<(u32, u32)> {
        match &self.0.lock().content {
            Content::Rendered { raster, .. } => Some((raster.width(), raster.height())),
            Content::System(_) => None,
        }
    }

    /// Takes over `other`'s state flags and level.
    pub fn copy_discrete_from(&self, other: &Drawable) {
        if self.ptr_eq(other) {
            return;
        }
        let (state, level) = {
            let o = other.0.lock();
            (o.state, o.level)
        };
        let mut me = self.0.lock();
        me.state = state;
        me.level = level;
    }

    pub fn bounds(&self) -> Rect {
        self.0.lock().bounds
    }

    pub fn set_bounds(&self, bounds: Rect) {
        self.0.lock().bounds = bounds;
    }

    pub fn state(&self) -> DrawableState {
        self.0.lock().state
    }

    pub fn set_state(&self, state: DrawableState) {
        self.0.lock().state = state;
    }

    pub fn level(&self) -> u32 {
        self.0.lock().level
    }

    pub fn set_level(&self, level: u32) {
        self.0.lock().level = level.min(MAX_LEVEL);
    }

    pub fn alpha(&self) -> u8 {
        self.0.lock().alpha
    }

    pub fn set_alpha(&self, alpha: u8) {
        self.0.lock().alpha = alpha;
    }

    /// Opacity in `[0, 1]` mapped onto the 0..=255 alpha.
    pub fn set_opacity(&self, opacity: f32) {
        self.set_alpha((opacity.clamp(0.0, 1.0) * 255.0) as u8);
    }

    pub fn transform(&self) -> TransformProps {
        self.0.lock().transform
    }

    pub fn set_transform(&self, transform: TransformProps) {
        self.0.lock().transform = transform;
    }

    pub fn tint(&self) -> Option<Color> {
        self.0.lock().tint
    }

    pub fn set_tint(&self, tint: Option<Color>) {
        self.0.lock().tint = tint;
    }

    pub fn draw(&self, canvas: &mut Canvas<'_>) {
        let inner = self.0.lock();
        if inner.bounds.is_empty() {
            return;
        }
        let paint = Paint {
            alpha: inner.alpha as f32 / 255.0,
            tint: inner.tint,
        };
        canvas.save();
        if !inner.transform.is_identity() {
            canvas.concat(&inner.transform.to_transform(inner.bounds));
        }
        match &inner.content {
            Content::System(painter) => {
                painter.paint(canvas, inner.bounds, inner.state, inner.level, &paint)
            }
            Content::Rendered { raster, wipe } => {
                if *wipe {
                    let fraction = inner.level.min(MAX_LEVEL) as f32 / MAX_LEVEL as f32;
                    canvas.scale_about(fraction, 1.0, inner.bounds.x, inner.bounds.y);
                }
                canvas.draw_raster(raster, inner.bounds, &paint);
            }
        }
        canvas.restore();
    }
}

impl std::fmt::Debug for Drawable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.0.lock();
        let kind = match &inner.content {
            Content::System(_) => "system",
            Content::Rendered { .. } => "rendered",
        };
        f.debug_struct("Drawable")
            .field("kind", &kind)
            .field("bounds", &inner.bounds)
            .field("state", &inner.state)
            .field("level", &inner.level)
            .field("alpha", &inner.alpha)
            .finish()
    }
}

