//! STAC (SpatioTemporal Asset Catalog) items and collections.

use serde_json::Value;

use super::{bbox_extent, str_of, Asset, Dialect, SpatialExtent, TemporalExtent, DEFAULT_NAME};

pub(crate) struct StacDialect;

impl Dialect for StacDialect {
    fn name(&self, doc: &Value) -> String {
        str_of(doc, "title")
            .or_else(|| str_of(doc, "id"))
            .unwrap_or_else(|| DEFAULT_NAME.to_string())
    }

    fn spatial_extent(&self, doc: &Value) -> Option<SpatialExtent> {
        doc.get("bbox").and_then(bbox_extent)
    }

    fn temporal_extent(&self, doc: &Value) -> Option<TemporalExtent> {
        let start = str_of(doc, "start_datetime").unwrap_or_default();
        let end = str_of(doc, "end_datetime").unwrap_or_default();
        if start.is_empty() && end.is_empty() {
            return None;
        }
        Some(TemporalExtent { start, end })
    }

    /// One asset per entry in the `assets` mapping; the map key is the id
    /// and doubles as the title when none is given.
    fn assets(&self, doc: &Value) -> Vec<Asset> {
        let Some(map) = doc.get("assets").and_then(Value::as_object) else {
            return Vec::new();
        };

        map.iter()
            .map(|(id, info)| {
                let field = |key: &str| {
                    info.get(key)
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string()
                };
                Asset {
                    id: id.clone(),
                    url: field("href"),
                    title: info
                        .get("title")
                        .and_then(Value::as_str)
                        .unwrap_or(id)
                        .to_string(),
                    description: field("description"),
                    media_type: field("type"),
                }
            })
            .collect()
    }
}
