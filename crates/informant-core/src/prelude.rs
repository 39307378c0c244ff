pub use crate::animation::{AnimatedValue, AnimationSpec, Clock, TestClock, set_clock};
pub use crate::color::Color;
pub use crate::error::{Error, Result};
pub use crate::geometry::{Rect, Size, Transform, Vec2};
pub use crate::props::{PropsDelta, TransformOp, TransformProps};
pub use crate::raster::{Canvas, Paint, Raster};
pub use crate::runtime::{UiContext, UiHandle, UiTask};
pub use crate::view::{HostTree, NodeId, View, ViewStyle, ViewTree};
