//! GeoCroissant (Croissant-based) dataset descriptions.

use serde_json::Value;

use super::{bbox_extent, str_of, Asset, Dialect, DownloadUrl, SpatialExtent, TemporalExtent, DEFAULT_CRS, DEFAULT_NAME};

pub(crate) const FILE_OBJECT_TYPE: &str = "cr:FileObject";

pub(crate) struct GeoCroissantDialect;

/// Distribution entries typed `cr:FileObject`.
fn file_objects(doc: &Value) -> Vec<&Value> {
    doc.get("distribution")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter(|e| e.get("@type").and_then(Value::as_str) == Some(FILE_OBJECT_TYPE))
                .collect()
        })
        .unwrap_or_default()
}

impl Dialect for GeoCroissantDialect {
    fn name(&self, doc: &Value) -> String {
        str_of(doc, "name").unwrap_or_else(|| DEFAULT_NAME.to_string())
    }

    fn spatial_extent(&self, doc: &Value) -> Option<SpatialExtent> {
        doc.get("geocr:BoundingBox").and_then(bbox_extent)
    }

    fn temporal_extent(&self, doc: &Value) -> Option<TemporalExtent> {
        let temporal = doc.get("geocr:temporalExtent")?;
        let field = |key: &str| {
            temporal
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let start = field("startDate");
        let end = field("endDate");
        if start.is_empty() && end.is_empty() {
            return None;
        }
        Some(TemporalExtent { start, end })
    }

    fn crs(&self, doc: &Value) -> String {
        str_of(doc, "geocr:coordinateReferenceSystem").unwrap_or_else(|| DEFAULT_CRS.to_string())
    }

    fn spatial_resolution(&self, doc: &Value) -> Option<String> {
        str_of(doc, "geocr:spatialResolution")
    }

    fn download_urls(&self, doc: &Value) -> Vec<DownloadUrl> {
        file_objects(doc)
            .into_iter()
            .map(|entry| {
                let field = |key: &str| {
                    entry
                        .get(key)
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string()
                };
                DownloadUrl {
                    url: field("contentUrl"),
                    name: field("name"),
                    kind: field("encodingFormat"),
                }
            })
            .collect()
    }

    fn assets(&self, doc: &Value) -> Vec<Asset> {
        file_objects(doc)
            .into_iter()
            .map(|entry| {
                let field = |key: &str| {
                    entry
                        .get(key)
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string()
                };
                Asset {
                    id: field("@id"),
                    url: field("contentUrl"),
                    title: field("name"),
                    description: field("description"),
                    media_type: field("encodingFormat"),
                }
            })
            .collect()
    }

    fn metadata_items(&self, doc: &Value) -> Vec<(String, String)> {
        let dash = |key: &str| str_of(doc, key).unwrap_or_else(|| "-".to_string());
        vec![
            ("Version".to_string(), dash("version")),
            ("License".to_string(), dash("license")),
            ("Conforms To".to_string(), dash("conformsTo")),
        ]
    }
}
