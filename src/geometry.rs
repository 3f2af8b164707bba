//! Converts bounding boxes and item lists into renderable polygon feature
//! collections. Geometry and attribute construction only — turning these
//! into styled map layers is the rendering collaborator's job.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::records::TileItem;

/// Default styling handed to the presentation layer alongside the
/// features. RGBA components plus a stroke width in layer units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerStyle {
    pub fill: [u8; 4],
    pub stroke: [u8; 4],
    pub stroke_width: f64,
}

/// Semi-transparent blue for per-tile footprints.
pub const TILE_STYLE: LayerStyle = LayerStyle {
    fill: [33, 150, 243, 50],
    stroke: [33, 150, 243, 200],
    stroke_width: 0.5,
};

/// Semi-transparent orange for the dataset extent.
pub const EXTENT_STYLE: LayerStyle = LayerStyle {
    fill: [255, 87, 34, 30],
    stroke: [255, 87, 34, 255],
    stroke_width: 1.0,
};

/// One closed polygon ring with its positional attribute record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Ring vertices as (x, y); first and last vertex coincide.
    pub ring: Vec<(f64, f64)>,
    /// Attribute values, positional against the collection's field list.
    pub attributes: Vec<Value>,
}

/// A flat polygon layer: field schema, features, and default styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    pub name: String,
    pub crs: String,
    pub fields: Vec<String>,
    pub features: Vec<Feature>,
    pub style: LayerStyle,
}

/// Closed rectangular ring in the fixed order
/// (w,s) → (e,s) → (e,n) → (w,n) → (w,s).
fn closed_ring(west: f64, south: f64, east: f64, north: f64) -> Vec<(f64, f64)> {
    vec![
        (west, south),
        (east, south),
        (east, north),
        (west, north),
        (west, south),
    ]
}

/// Builds a polygon layer showing tile extents from reconstructed items.
pub struct TileLayerBuilder<'a> {
    items: &'a [TileItem],
    crs: String,
    dataset_name: String,
}

impl<'a> TileLayerBuilder<'a> {
    pub fn new(items: &'a [TileItem], crs: impl Into<String>, dataset_name: impl Into<String>) -> Self {
        TileLayerBuilder {
            items,
            crs: crs.into(),
            dataset_name: dataset_name.into(),
        }
    }

    /// One feature per item with a usable bbox; items whose bbox has fewer
    /// than 4 values are skipped.
    pub fn build(&self) -> FeatureCollection {
        let mut features = Vec::with_capacity(self.items.len());

        for item in self.items {
            let Some(coords) = item.bbox_coords() else { continue };
            if coords.len() < 4 {
                continue;
            }
            let (west, south, east, north) = (coords[0], coords[1], coords[2], coords[3]);

            let assets = item
                .assets
                .clone()
                .unwrap_or_else(|| Value::Array(Vec::new()))
                .to_string();
            features.push(Feature {
                ring: closed_ring(west, south, east, north),
                attributes: vec![
                    Value::from(item.id.clone().unwrap_or_default()),
                    Value::from(item.datetime.clone().unwrap_or_default()),
                    Value::from(assets),
                    Value::from(west),
                    Value::from(south),
                    Value::from(east),
                    Value::from(north),
                ],
            });
        }

        FeatureCollection {
            name: format!("{}_tiles", self.dataset_name),
            crs: self.crs.clone(),
            fields: ["id", "datetime", "assets", "west", "south", "east", "north"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            features,
            style: TILE_STYLE,
        }
    }
}

/// Builds a single-polygon layer showing the overall dataset extent.
pub struct BboxLayerBuilder {
    bbox: Vec<f64>,
    crs: String,
    dataset_name: String,
}

impl BboxLayerBuilder {
    pub fn new(bbox: Vec<f64>, crs: impl Into<String>, dataset_name: impl Into<String>) -> Self {
        BboxLayerBuilder {
            bbox,
            crs: crs.into(),
            dataset_name: dataset_name.into(),
        }
    }

    /// None when the bbox has fewer than 4 values.
    pub fn build(&self) -> Option<FeatureCollection> {
        if self.bbox.len() < 4 {
            return None;
        }
        let (west, south, east, north) = (self.bbox[0], self.bbox[1], self.bbox[2], self.bbox[3]);

        Some(FeatureCollection {
            name: format!("{}_extent", self.dataset_name),
            crs: self.crs.clone(),
            fields: ["name", "west", "south", "east", "north"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            features: vec![Feature {
                ring: closed_ring(west, south, east, north),
                attributes: vec![
                    Value::from(self.dataset_name.clone()),
                    Value::from(west),
                    Value::from(south),
                    Value::from(east),
                    Value::from(north),
                ],
            }],
            style: EXTENT_STYLE,
        })
    }
}
