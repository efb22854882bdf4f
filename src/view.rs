use crate::types::Bounds;
use serde::Serialize;

/// Every zoom change (select or reset) animates over this many milliseconds.
pub const TRANSITION_MS: u64 = 750;

pub const MIN_SCALE: f64 = 1.0;
pub const MAX_SCALE: f64 = 7.0;

/// Fraction of the viewport the selected district's bounding box fills.
const FIT_FRACTION: f64 = 0.5;

/// Map stroke width at scale 1, in pixels.
const BASE_STROKE_WIDTH: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn center(&self) -> [f64; 2] {
        [self.width / 2.0, self.height / 2.0]
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self { width: 740.0, height: 700.0 }
    }
}

/// Pan and zoom applied to the map group: `screen = translate + scale * point`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZoomTransform {
    pub translate: [f64; 2],
    pub scale: f64,
}

impl ZoomTransform {
    pub const IDENTITY: ZoomTransform = ZoomTransform {
        translate: [0.0, 0.0],
        scale: 1.0,
    };

    /// Zoom so `bounds` fills half the viewport on its tighter axis, with its
    /// center mapped to the viewport center. The scale is clamped to
    /// [`MIN_SCALE`, `MAX_SCALE`]; translate is derived from the clamped scale.
    pub fn fit(bounds: &Bounds, viewport: &Viewport) -> Self {
        let scale = Self::fit_scale(bounds, viewport).clamp(MIN_SCALE, MAX_SCALE);
        let [x, y] = bounds.center();
        let [vx, vy] = viewport.center();
        Self {
            translate: [vx - scale * x, vy - scale * y],
            scale,
        }
    }

    /// Unclamped fit scale. A zero-sized box gives infinity.
    pub fn fit_scale(bounds: &Bounds, viewport: &Viewport) -> f64 {
        let extent = (bounds.width() / viewport.width).max(bounds.height() / viewport.height);
        FIT_FRACTION / extent
    }

    #[cfg(test)]
    pub(crate) fn apply(&self, point: [f64; 2]) -> [f64; 2] {
        [
            self.translate[0] + self.scale * point[0],
            self.translate[1] + self.scale * point[1],
        ]
    }

    /// Stroke width that keeps outlines visually constant at this zoom.
    pub fn stroke_width(&self) -> f64 {
        BASE_STROKE_WIDTH / self.scale
    }
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// What the map and chart currently show.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub transform: ZoomTransform,
    pub chart_key: Option<String>,
}
