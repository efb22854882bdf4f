use geo::MultiPolygon;
use serde::Serialize;

/// Axis-aligned rectangle in projected (viewport pixel) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Bounds {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Self { min, max }
    }

    pub fn width(&self) -> f64 {
        self.max[0] - self.min[0]
    }

    pub fn height(&self) -> f64 {
        self.max[1] - self.min[1]
    }

    pub fn center(&self) -> [f64; 2] {
        [
            (self.min[0] + self.max[0]) / 2.0,
            (self.min[1] + self.max[1]) / 2.0,
        ]
    }

    /// Grow the rectangle so it covers `point`.
    pub fn extend(&mut self, point: [f64; 2]) {
        self.min[0] = self.min[0].min(point[0]);
        self.min[1] = self.min[1].min(point[1]);
        self.max[0] = self.max[0].max(point[0]);
        self.max[1] = self.max[1].max(point[1]);
    }
}

/// A local authority district. Built once when the boundaries load and never
/// mutated afterwards; the active flag lives in the registry.
#[derive(Debug, Clone)]
pub struct Region {
    pub code: String,
    pub name: String,
    pub geometry: MultiPolygon<f64>,
    pub bounds: Bounds,
}
