//! Offscreen RGBA raster and an immediate-mode canvas over it.
//!
//! The canvas keeps a save/restore stack of transform, clip and alpha state,
//! the same shape the wgpu renderer uses for its clip stack. Every primitive is
//! inverse-mapped per device pixel, so the output only depends on the inputs:
//! drawing the same thing twice yields bit-identical pixels.

use smallvec::SmallVec;

use crate::{Color, Error, Rect, Result, Transform, Vec2};

/// Largest side (in px) a raster may be allocated with.
pub const MAX_RASTER_SIDE: u32 = 8192;

#[derive(Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

impl std::fmt::Debug for Raster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Raster")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl Raster {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 || width > MAX_RASTER_SIDE || height > MAX_RASTER_SIDE {
            return Err(Error::Raster { width, height });
        }
        Ok(Self {
            width,
            height,
            pixels: vec![Color::TRANSPARENT; width as usize * height as usize],
        })
    }

    /// Allocates a raster covering `rect`'s extent, rounded up to whole pixels.
    pub fn for_rect(rect: Rect) -> Result<Self> {
        let w = rect.w.max(0.0).ceil() as u32;
        let h = rect.h.max(0.0).ceil() as u32;
        Self::new(w, h)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.width as f32, self.height as f32)
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[self.index(x, y)])
    }

    pub fn fill(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    /// Number of pixels with non-zero alpha.
    pub fn coverage(&self) -> usize {
        self.pixels.iter().filter(|c| c.3 > 0).count()
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    #[inline]
    fn blend(&mut self, x: u32, y: u32, src: Color) {
        let i = self.index(x, y);
        self.pixels[i] = src.over(self.pixels[i]);
    }

    /// Nearest-neighbour lookup in normalized `[0, 1)` coordinates.
    fn sample(&self, u: f32, v: f32) -> Color {
        let x = ((u * self.width as f32).floor() as i64).clamp(0, self.width as i64 - 1) as u32;
        let y = ((v * self.height as f32).floor() as i64).clamp(0, self.height as i64 - 1) as u32;
        self.pixels[self.index(x, y)]
    }
}

/// How a primitive's colors are modulated before blending.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Paint {
    pub alpha: f32,
    /// SRC_IN color filter: keeps source coverage, replaces its color.
    pub tint: Option<Color>,
}

impl Default for Paint {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            tint: None,
        }
    }
}

impl Paint {
    pub fn with_alpha(alpha: f32) -> Self {
        Self {
            alpha,
            ..Self::default()
        }
    }

    pub fn apply(&self, c: Color) -> Color {
        let c = match self.tint {
            Some(t) => {
                let a = (t.3 as u32 * c.3 as u32 + 127) / 255;
                Color(t.0, t.1, t.2, a as u8)
            }
            None => c,
        };
        c.scale_alpha(self.alpha)
    }
}

/// Circular clip, kept in the local space it was set in.
#[derive(Clone, Copy, Debug)]
struct Clip {
    /// Device -> clip-local.
    inverse: Transform,
    center: Vec2,
    radius: f32,
}

impl Clip {
    fn admits(&self, device: Vec2) -> bool {
        let p = self.inverse.apply_to_point(device);
        let dx = p.x - self.center.x;
        let dy = p.y - self.center.y;
        dx * dx + dy * dy <= self.radius * self.radius
    }
}

#[derive(Clone, Debug)]
struct CanvasState {
    transform: Transform,
    clips: SmallVec<[Clip; 4]>,
    /// Set when a clip made the drawable area empty (or non-invertible).
    clipped_out: bool,
    alpha: f32,
}

pub struct Canvas<'a> {
    target: &'a mut Raster,
    state: CanvasState,
    stack: Vec<CanvasState>,
}

impl<'a> Canvas<'a> {
    pub fn new(target: &'a mut Raster) -> Self {
        Self {
            target,
            state: CanvasState {
                transform: Transform::identity(),
                clips: SmallVec::new(),
                clipped_out: false,
                alpha: 1.0,
            },
            stack: Vec::with_capacity(8),
        }
    }

    pub fn width(&self) -> u32 {
        self.target.width
    }

    pub fn height(&self) -> u32 {
        self.target.height
    }

    pub fn transform(&self) -> Transform {
        self.state.transform
    }

    pub fn save(&mut self) -> usize {
        self.stack.push(self.state.clone());
        self.stack.len()
    }

    pub fn restore(&mut self) {
        match self.stack.pop() {
            Some(s) => self.state = s,
            None => log::warn!("Canvas::restore with empty stack"),
        }
    }

    pub fn concat(&mut self, t: &Transform) {
        self.state.transform = self.state.transform.concat(t);
    }

    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.state.transform = self.state.transform.then_translate(dx, dy);
    }

    pub fn scale(&mut self, sx: f32, sy: f32) {
        self.state.transform = self.state.transform.then_scale(sx, sy);
    }

    pub fn scale_about(&mut self, sx: f32, sy: f32, px: f32, py: f32) {
        self.state.transform = self.state.transform.then_scale_about(sx, sy, px, py);
    }

    pub fn multiply_alpha(&mut self, alpha: f32) {
        self.state.alpha *= alpha.clamp(0.0, 1.0);
    }

    pub fn clip_circle(&mut self, center: Vec2, radius: f32) {
        match self.state.transform.invert() {
            Some(inverse) => self.state.clips.push(Clip {
                inverse,
                center,
                radius,
            }),
            None => self.state.clipped_out = true,
        }
    }

    pub fn clear(&mut self, color: Color) {
        self.target.fill(color);
    }

    /// Fills the whole clip region, ignoring the transform.
    pub fn draw_paint(&mut self, color: Color) {
        let full = self.target.bounds();
        self.shade(full, Transform::identity(), |_| Some(color));
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.shade(rect, self.state.transform, |p| rect.covers(p).then_some(color));
    }

    pub fn fill_round_rect(&mut self, rect: Rect, radius: f32, color: Color) {
        let radius = radius.min(rect.w * 0.5).min(rect.h * 0.5).max(0.0);
        self.shade(rect, self.state.transform, |p| {
            in_round_rect(rect, radius, p).then_some(color)
        });
    }

    pub fn stroke_round_rect(&mut self, rect: Rect, radius: f32, width: f32, color: Color) {
        let radius = radius.min(rect.w * 0.5).min(rect.h * 0.5).max(0.0);
        let inner = Rect::new(
            rect.x + width,
            rect.y + width,
            rect.w - 2.0 * width,
            rect.h - 2.0 * width,
        );
        let inner_radius = (radius - width).max(0.0);
        self.shade(rect, self.state.transform, |p| {
            let in_outer = in_round_rect(rect, radius, p);
            let in_inner = !inner.is_empty() && in_round_rect(inner, inner_radius, p);
            (in_outer && !in_inner).then_some(color)
        });
    }

    pub fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        let bounds = Rect::new(center.x - radius, center.y - radius, radius * 2.0, radius * 2.0);
        self.shade(bounds, self.state.transform, |p| {
            let dx = p.x - center.x;
            let dy = p.y - center.y;
            (dx * dx + dy * dy <= radius * radius).then_some(color)
        });
    }

    /// Draws `src` stretched into `dst` (local coordinates).
    pub fn draw_raster(&mut self, src: &Raster, dst: Rect, paint: &Paint) {
        if dst.is_empty() {
            return;
        }
        self.shade(dst, self.state.transform, |p| {
            if !dst.covers(p) {
                return None;
            }
            let u = (p.x - dst.x) / dst.w;
            let v = (p.y - dst.y) / dst.h;
            let c = paint.apply(src.sample(u, v));
            (c.3 > 0).then_some(c)
        });
    }

    /// Core scan: visits every device pixel whose center may fall inside
    /// `local` under `transform`, and blends what `f` returns for the
    /// pixel center mapped back to local space.
    fn shade(&mut self, local: Rect, transform: Transform, mut f: impl FnMut(Vec2) -> Option<Color>) {
        if self.state.clipped_out || self.state.alpha <= 0.0 || local.is_empty() {
            return;
        }
        let Some(inverse) = transform.invert() else {
            return;
        };
        let device = transform
            .apply_to_rect(local)
            .intersect(&self.target.bounds());
        if device.is_empty() {
            return;
        }
        let x0 = device.x.floor().max(0.0) as u32;
        let y0 = device.y.floor().max(0.0) as u32;
        let x1 = (device.right().ceil() as u32).min(self.target.width);
        let y1 = (device.bottom().ceil() as u32).min(self.target.height);
        let alpha = self.state.alpha;

        for py in y0..y1 {
            for px in x0..x1 {
                let center = Vec2 {
                    x: px as f32 + 0.5,
                    y: py as f32 + 0.5,
                };
                if !self.state.clips.iter().all(|c| c.admits(center)) {
                    continue;
                }
                if let Some(c) = f(inverse.apply_to_point(center)) {
                    self.target.blend(px, py, c.scale_alpha(alpha));
                }
            }
        }
    }
}

fn in_round_rect(rect: Rect, radius: f32, p: Vec2) -> bool {
    if !rect.covers(p) {
        return false;
    }
    if radius <= 0.0 {
        return true;
    }
    let cx = p.x.clamp(rect.x + radius, rect.right() - radius);
    let cy = p.y.clamp(rect.y + radius, rect.bottom() - radius);
    let dx = p.x - cx;
    let dy = p.y - cy;
    dx * dx + dy * dy <= radius * radius
}
