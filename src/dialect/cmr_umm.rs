//! NASA CMR-UMM (Unified Metadata Model) granule/collection records.

use serde_json::Value;

use super::{dig, Dialect, DownloadUrl, SpatialExtent, TemporalExtent, Asset, DEFAULT_CRS, DEFAULT_NAME};

pub(crate) struct CmrUmmDialect;

/// Scan `umm.AdditionalAttributes` for the first value of a named attribute.
fn additional_attribute(doc: &Value, name: &str) -> Option<String> {
    let attrs = dig(doc, &["umm", "AdditionalAttributes"])?.as_array()?;
    attrs
        .iter()
        .find(|attr| attr.get("Name").and_then(Value::as_str) == Some(name))
        .and_then(|attr| attr.get("Values")?.as_array()?.first().cloned())
        .map(|v| match v {
            Value::String(s) => s,
            other => other.to_string(),
        })
}

impl Dialect for CmrUmmDialect {
    fn name(&self, doc: &Value) -> String {
        dig(doc, &["umm", "CollectionReference", "EntryTitle"])
            .and_then(Value::as_str)
            .or_else(|| dig(doc, &["umm", "GranuleUR"]).and_then(Value::as_str))
            .unwrap_or(DEFAULT_NAME)
            .to_string()
    }

    fn description(&self, doc: &Value) -> String {
        dig(doc, &["umm", "CollectionReference", "EntryTitle"])
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    /// Extent of the first polygon boundary: min/max over its point list.
    fn spatial_extent(&self, doc: &Value) -> Option<SpatialExtent> {
        let polygons = dig(
            doc,
            &["umm", "SpatialExtent", "HorizontalSpatialDomain", "Geometry", "GPolygons"],
        )?
        .as_array()?;
        let points = dig(polygons.first()?, &["Boundary", "Points"])?.as_array()?;
        if points.is_empty() {
            return None;
        }

        let coord = |p: &Value, key: &str| p.get(key).and_then(Value::as_f64).unwrap_or(0.0);
        let mut extent = SpatialExtent {
            west: f64::INFINITY,
            south: f64::INFINITY,
            east: f64::NEG_INFINITY,
            north: f64::NEG_INFINITY,
        };
        for point in points {
            let lon = coord(point, "Longitude");
            let lat = coord(point, "Latitude");
            extent.west = extent.west.min(lon);
            extent.east = extent.east.max(lon);
            extent.south = extent.south.min(lat);
            extent.north = extent.north.max(lat);
        }
        Some(extent)
    }

    fn temporal_extent(&self, doc: &Value) -> Option<TemporalExtent> {
        let range = dig(doc, &["umm", "TemporalExtent", "RangeDateTime"])?;
        let start = range
            .get("BeginningDateTime")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let end = range
            .get("EndingDateTime")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if start.is_empty() && end.is_empty() {
            return None;
        }
        Some(TemporalExtent {
            start: start.to_string(),
            end: end.to_string(),
        })
    }

    fn crs(&self, doc: &Value) -> String {
        additional_attribute(doc, "HORIZONTAL_CS_CODE").unwrap_or_else(|| DEFAULT_CRS.to_string())
    }

    fn spatial_resolution(&self, doc: &Value) -> Option<String> {
        additional_attribute(doc, "SPATIAL_RESOLUTION").map(|v| format!("{} m", v))
    }

    /// Every related URL whose Type marks it as a data download.
    fn download_urls(&self, doc: &Value) -> Vec<DownloadUrl> {
        let Some(related) = dig(doc, &["umm", "RelatedUrls"]).and_then(Value::as_array) else {
            return Vec::new();
        };

        related
            .iter()
            .filter_map(|entry| {
                let kind = entry.get("Type").and_then(Value::as_str).unwrap_or_default();
                if !kind.contains("GET DATA") && !kind.contains("DOWNLOAD") {
                    return None;
                }
                Some(DownloadUrl {
                    url: entry.get("URL").and_then(Value::as_str).unwrap_or_default().to_string(),
                    name: entry
                        .get("Description")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                    kind: kind.to_string(),
                })
            })
            .collect()
    }

    fn assets(&self, doc: &Value) -> Vec<Asset> {
        self.download_urls(doc)
            .into_iter()
            .enumerate()
            .map(|(i, u)| Asset {
                id: format!("asset_{}", i),
                url: u.url,
                title: u.name,
                description: u.kind,
                media_type: String::new(),
            })
            .collect()
    }

    fn metadata_items(&self, doc: &Value) -> Vec<(String, String)> {
        let meta_str = |key: &str| {
            dig(doc, &["meta", key])
                .and_then(Value::as_str)
                .unwrap_or("-")
                .to_string()
        };

        let mut items = vec![
            ("Provider".to_string(), meta_str("provider-id")),
            ("Concept ID".to_string(), meta_str("concept-id")),
            ("Format".to_string(), meta_str("format")),
        ];

        if let Some(temporal) = self.temporal_extent(doc) {
            let or_dash = |s: String| if s.is_empty() { "-".to_string() } else { s };
            items.push(("Start Date".to_string(), or_dash(temporal.start)));
            items.push(("End Date".to_string(), or_dash(temporal.end)));
        }

        for key in ["CLOUD_COVERAGE", "MGRS_TILE_ID", "SPATIAL_COVERAGE", "ACCODE"] {
            if let Some(value) = additional_attribute(doc, key) {
                items.push((key.replace('_', " "), value));
            }
        }

        items
    }
}
