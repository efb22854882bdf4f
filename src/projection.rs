//! Geographic → viewport projection used to size the zoom-to-region transform.

use crate::types::Bounds;
use geo::{CoordsIter, MultiPolygon};
use std::f64::consts::PI;

pub trait Projection {
    /// Project a (longitude, latitude) pair in degrees to viewport pixels.
    fn project(&self, lon: f64, lat: f64) -> [f64; 2];

    /// Bounds of the projected vertices, or `None` for an empty geometry.
    fn bounds(&self, geometry: &MultiPolygon<f64>) -> Option<Bounds> {
        let mut coords = geometry.coords_iter();
        let first = coords.next()?;
        let start = self.project(first.x, first.y);
        let mut bounds = Bounds::new(start, start);
        for c in coords {
            bounds.extend(self.project(c.x, c.y));
        }
        Some(bounds)
    }
}

/// Albers conic equal-area projection with a longitude rotation, a projected
/// center and a pixel translate. Y grows downwards as on screen.
#[derive(Debug, Clone, Copy)]
pub struct Albers {
    n: f64,
    c: f64,
    rho0: f64,
    rotate: f64,
    scale: f64,
    dx: f64,
    dy: f64,
}

impl Albers {
    pub fn new(
        center: [f64; 2],
        rotate: f64,
        parallels: [f64; 2],
        scale: f64,
        translate: [f64; 2],
    ) -> Self {
        let sin0 = parallels[0].to_radians().sin();
        let n = (sin0 + parallels[1].to_radians().sin()) / 2.0;
        let c = 1.0 + sin0 * (2.0 * n - sin0);
        let mut projection = Self {
            n,
            c,
            rho0: c.sqrt() / n,
            rotate: rotate.to_radians(),
            scale,
            dx: 0.0,
            dy: 0.0,
        };
        // The center is placed with the raw projection, not the rotated one.
        let [cx, cy] = projection.raw(center[0].to_radians(), center[1].to_radians());
        projection.dx = translate[0] - cx * scale;
        projection.dy = translate[1] + cy * scale;
        projection
    }

    /// The British Isles setup the map page uses, centred in a `width`×`height` view.
    pub fn united_kingdom(width: f64, height: f64) -> Self {
        Self::new([3.5, 52.8], 4.4, [50.0, 60.0], 6200.0, [width / 2.0, height / 2.0])
    }

    fn raw(&self, lambda: f64, phi: f64) -> [f64; 2] {
        let rho = (self.c - 2.0 * self.n * phi.sin()).sqrt() / self.n;
        let angle = lambda * self.n;
        [rho * angle.sin(), self.rho0 - rho * angle.cos()]
    }
}

impl Projection for Albers {
    fn project(&self, lon: f64, lat: f64) -> [f64; 2] {
        let mut lambda = lon.to_radians() + self.rotate;
        if lambda > PI {
            lambda -= 2.0 * PI;
        } else if lambda < -PI {
            lambda += 2.0 * PI;
        }
        let [x, y] = self.raw(lambda, lat.to_radians());
        [x * self.scale + self.dx, self.dy - y * self.scale]
    }
}
