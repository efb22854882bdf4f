//! Decoding of TopoJSON topologies into GeoJSON features.
//!
//! Only polygonal geometries are kept: the boundary file is a collection of
//! district outlines, so points and lines carry nothing we can select.

use anyhow::{anyhow, Result};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
pub struct Topology {
    #[serde(default)]
    transform: Option<Transform>,
    arcs: Vec<Vec<[f64; 2]>>,
    objects: HashMap<String, TopoGeometry>,
}

#[derive(Debug, Deserialize, Clone, Copy)]
struct Transform {
    scale: [f64; 2],
    translate: [f64; 2],
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum TopoGeometry {
    GeometryCollection {
        geometries: Vec<TopoGeometry>,
    },
    Polygon {
        arcs: Vec<Vec<i64>>,
        #[serde(default)]
        properties: Option<JsonObject>,
    },
    MultiPolygon {
        arcs: Vec<Vec<Vec<i64>>>,
        #[serde(default)]
        properties: Option<JsonObject>,
    },
    #[serde(other)]
    Unsupported,
}

impl Topology {
    /// Convert the named object into a feature collection, one feature per
    /// polygonal geometry.
    pub fn feature_collection(&self, object: &str) -> Result<FeatureCollection> {
        let root = self
            .objects
            .get(object)
            .ok_or_else(|| anyhow!("TopoJSON object '{}' not found", object))?;

        let mut features = Vec::new();
        self.collect_features(root, &mut features)?;

        Ok(FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        })
    }

    fn collect_features(&self, geometry: &TopoGeometry, out: &mut Vec<Feature>) -> Result<()> {
        let (value, properties) = match geometry {
            TopoGeometry::GeometryCollection { geometries } => {
                for child in geometries {
                    self.collect_features(child, out)?;
                }
                return Ok(());
            }
            TopoGeometry::Polygon { arcs, properties } => {
                (Value::Polygon(self.polygon(arcs)?), properties)
            }
            TopoGeometry::MultiPolygon { arcs, properties } => {
                let polygons = arcs
                    .iter()
                    .map(|polygon| self.polygon(polygon))
                    .collect::<Result<Vec<_>>>()?;
                (Value::MultiPolygon(polygons), properties)
            }
            TopoGeometry::Unsupported => return Ok(()),
        };

        out.push(Feature {
            bbox: None,
            geometry: Some(Geometry::new(value)),
            id: None,
            properties: properties.clone(),
            foreign_members: None,
        });
        Ok(())
    }

    fn polygon(&self, rings: &[Vec<i64>]) -> Result<Vec<Vec<Vec<f64>>>> {
        rings.iter().map(|ring| self.ring(ring)).collect()
    }

    /// Stitch a ring from arc references. A negative index `i` refers to arc
    /// `!i` walked backwards; consecutive arcs share their joining point.
    fn ring(&self, refs: &[i64]) -> Result<Vec<Vec<f64>>> {
        let mut points: Vec<Vec<f64>> = Vec::new();
        for &reference in refs {
            let index = (if reference < 0 { !reference } else { reference }) as usize;
            let arc = self
                .arcs
                .get(index)
                .ok_or_else(|| anyhow!("Arc index {} out of range", reference))?;

            points.pop();
            let start = points.len();
            points.extend(self.decode_arc(arc));
            if reference < 0 {
                points[start..].reverse();
            }
        }
        Ok(points)
    }

    fn decode_arc(&self, arc: &[[f64; 2]]) -> Vec<Vec<f64>> {
        match self.transform {
            Some(transform) => {
                let (mut x, mut y) = (0.0, 0.0);
                arc.iter()
                    .map(|delta| {
                        x += delta[0];
                        y += delta[1];
                        vec![
                            x * transform.scale[0] + transform.translate[0],
                            y * transform.scale[1] + transform.translate[1],
                        ]
                    })
                    .collect()
            }
            None => arc.iter().map(|p| vec![p[0], p[1]]).collect(),
        }
    }
}
