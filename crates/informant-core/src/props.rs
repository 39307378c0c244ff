use crate::{Color, Rect, Transform};

/// One entry of a host `transform` prop. Angles are in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransformOp {
    TranslateX(f32),
    TranslateY(f32),
    ScaleX(f32),
    ScaleY(f32),
    RotateX(f32),
    RotateY(f32),
    RotateZ(f32),
    SkewX(f32),
    SkewY(f32),
}

/// A partial prop update. `None` means "key absent from this delta";
/// `tint_color: Some(None)` clears a tint.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PropsDelta {
    pub opacity: Option<f32>,
    pub transform: Option<Vec<TransformOp>>,
    pub tint_color: Option<Option<Color>>,
}

impl PropsDelta {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn opacity(mut self, o: f32) -> Self {
        self.opacity = Some(o);
        self
    }
    pub fn transform(mut self, ops: Vec<TransformOp>) -> Self {
        self.transform = Some(ops);
        self
    }
    pub fn tint_color(mut self, c: Option<Color>) -> Self {
        self.tint_color = Some(c);
        self
    }
    pub fn is_empty(&self) -> bool {
        self.opacity.is_none() && self.transform.is_none() && self.tint_color.is_none()
    }
}

/// Decomposed transform applied to a drawable, about its bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformProps {
    pub translate_x: f32,
    pub translate_y: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub rotate_x: f32,
    pub rotate_y: f32,
    pub rotate_z: f32,
    pub skew_x: f32,
    pub skew_y: f32,
}

impl Default for TransformProps {
    fn default() -> Self {
        Self {
            translate_x: 0.0,
            translate_y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            rotate_x: 0.0,
            rotate_y: 0.0,
            rotate_z: 0.0,
            skew_x: 0.0,
            skew_y: 0.0,
        }
    }
}

impl TransformProps {
    /// Folds ops in order: translations and angles add, scales multiply.
    pub fn from_ops(ops: &[TransformOp]) -> Self {
        let mut t = Self::default();
        for op in ops {
            match *op {
                TransformOp::TranslateX(v) => t.translate_x += v,
                TransformOp::TranslateY(v) => t.translate_y += v,
                TransformOp::ScaleX(v) => t.scale_x *= v,
                TransformOp::ScaleY(v) => t.scale_y *= v,
                TransformOp::RotateX(v) => t.rotate_x += v,
                TransformOp::RotateY(v) => t.rotate_y += v,
                TransformOp::RotateZ(v) => t.rotate_z += v,
                TransformOp::SkewX(v) => t.skew_x += v,
                TransformOp::SkewY(v) => t.skew_y += v,
            }
        }
        t
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    /// Translate, then skew, then rotate about the center of `bounds`, then
    /// scale about the center. Rotations about X/Y are projected
    /// orthographically (the axis perpendicular to the rotation foreshortens
    /// by its cosine).
    pub fn to_transform(&self, bounds: Rect) -> Transform {
        if self.is_identity() {
            return Transform::identity();
        }
        let c = bounds.center();
        let rotation = Transform::rotate(self.rotate_z.to_radians()).concat(&Transform::scale(
            self.rotate_y.to_radians().cos(),
            self.rotate_x.to_radians().cos(),
        ));
        Transform::translate(self.translate_x, self.translate_y)
            .concat(&Transform::skew(
                self.skew_x.to_radians().tan(),
                self.skew_y.to_radians().tan(),
            ))
            .then_translate(c.x, c.y)
            .concat(&rotation)
            .then_translate(-c.x, -c.y)
            .then_scale_about(self.scale_x, self.scale_y, c.x, c.y)
    }
}
