use informant_core::Color;
use informant_core::MAX_RASTER_SIDE;
use informant_core::animation::AnimationSpec;
use web_time::Duration;

/// Slider look and feedback settings.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SliderConfig {
    /// Handle scale while pressed.
    pub press_scale: f32,
    pub press_duration_ms: u64,
    pub press_delay_ms: u64,
    /// Intrinsic thickness of the system track; rendered rails are never
    /// thinner.
    pub track_height: f32,
    /// Side of the system thumb.
    pub thumb_size: f32,
    pub inverted: bool,
    pub max_raster_side: u32,
    pub thumb_color: Color,
    pub track_color: Color,
    pub progress_color: Color,
    pub background_color: Color,
}

impl Default for SliderConfig {
    fn default() -> Self {
        Self {
            press_scale: 1.2,
            press_duration_ms: 500,
            press_delay_ms: 200,
            track_height: 4.0,
            thumb_size: 20.0,
            inverted: false,
            max_raster_side: MAX_RASTER_SIDE,
            thumb_color: Color::from_hex("#6750A4"),
            track_color: Color::from_hex("#E7E0EC"),
            progress_color: Color::from_hex("#6750A4"),
            background_color: Color::TRANSPARENT,
        }
    }
}

impl SliderConfig {
    pub fn press_scale(mut self, scale: f32) -> Self {
        self.press_scale = scale;
        self
    }

    pub fn press_timing(mut self, duration_ms: u64, delay_ms: u64) -> Self {
        self.press_duration_ms = duration_ms;
        self.press_delay_ms = delay_ms;
        self
    }

    pub fn track_height(mut self, height: f32) -> Self {
        self.track_height = height;
        self
    }

    pub fn thumb_size(mut self, size: f32) -> Self {
        self.thumb_size = size;
        self
    }

    pub fn inverted(mut self, inverted: bool) -> Self {
        self.inverted = inverted;
        self
    }

    pub fn max_raster_side(mut self, side: u32) -> Self {
        self.max_raster_side = side.min(MAX_RASTER_SIDE);
        self
    }

    pub fn colors(mut self, thumb: Color, track: Color, progress: Color) -> Self {
        self.thumb_color = thumb;
        self.track_color = track;
        self.progress_color = progress;
        self
    }

    pub fn background_color(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    /// Linear scale animation for the press feedback.
    pub fn press_spec(&self) -> AnimationSpec {
        AnimationSpec::linear(Duration::from_millis(self.press_duration_ms))
            .with_delay(Duration::from_millis(self.press_delay_ms))
    }
}
