//! Per-dialect field extraction behind a shared capability interface.
//!
//! One handler per [`MetadataFormat`](crate::MetadataFormat) value; the
//! facade selects a handler once at construction and never re-dispatches.
//! Every accessor degrades to a safe default rather than failing: missing
//! nested keys anywhere in a chain short-circuit to "no value".

pub mod cmr_umm;
pub mod croissant;
pub mod generic;
pub mod stac;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::format::MetadataFormat;

pub(crate) const DEFAULT_NAME: &str = "Unknown Dataset";
pub(crate) const DEFAULT_CRS: &str = "EPSG:4326";
pub(crate) const DEFAULT_VERSION: &str = "1.0.0";
pub(crate) const DEFAULT_LICENSE: &str = "Unknown";

/// Spatial extent in floating-point degrees.
///
/// The west ≤ east / south ≤ north invariant is not enforced here; callers
/// must tolerate malformed extents. Absence is modeled as `Option`, never
/// as zeros.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpatialExtent {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

/// Temporal extent as opaque date-time strings (ISO-8601 expected, not
/// validated). Serializes under the legacy `startDate`/`endDate` names for
/// compatibility with older GeoCroissant consumers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalExtent {
    #[serde(rename = "startDate", default)]
    pub start: String,
    #[serde(rename = "endDate", default)]
    pub end: String,
}

/// A normalized download/reference unit derived from dialect-specific list
/// structures (distribution entries, STAC asset maps, CMR related URLs).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub url: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub media_type: String,
}

/// A download URL with its display name and dialect-reported type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadUrl {
    pub url: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Shared capability set implemented by each dialect handler.
///
/// Defaults implement the `Generic` behavior; dialects override what their
/// schema actually carries.
pub(crate) trait Dialect {
    fn name(&self, doc: &Value) -> String {
        str_of(doc, "name")
            .or_else(|| str_of(doc, "title"))
            .or_else(|| str_of(doc, "id"))
            .unwrap_or_else(|| DEFAULT_NAME.to_string())
    }

    fn description(&self, doc: &Value) -> String {
        nonempty_str_of(doc, "description")
            .or_else(|| nonempty_str_of(doc, "abstract"))
            .unwrap_or_default()
    }

    fn spatial_extent(&self, _doc: &Value) -> Option<SpatialExtent> {
        None
    }

    fn temporal_extent(&self, _doc: &Value) -> Option<TemporalExtent> {
        None
    }

    fn crs(&self, _doc: &Value) -> String {
        DEFAULT_CRS.to_string()
    }

    fn spatial_resolution(&self, _doc: &Value) -> Option<String> {
        None
    }

    fn download_urls(&self, _doc: &Value) -> Vec<DownloadUrl> {
        Vec::new()
    }

    fn assets(&self, _doc: &Value) -> Vec<Asset> {
        Vec::new()
    }

    fn metadata_items(&self, _doc: &Value) -> Vec<(String, String)> {
        Vec::new()
    }
}

/// Select the handler for a detected format. Handlers are stateless unit
/// structs, so a `'static` borrow is enough.
pub(crate) fn adapter_for(format: MetadataFormat) -> &'static dyn Dialect {
    match format {
        MetadataFormat::GeoCroissant => &croissant::GeoCroissantDialect,
        MetadataFormat::CmrUmm => &cmr_umm::CmrUmmDialect,
        MetadataFormat::Stac => &stac::StacDialect,
        MetadataFormat::Generic => &generic::GenericDialect,
    }
}

// --- shared lookup helpers ---

/// String at a top-level key, owned. Present-but-empty strings are kept;
/// only a missing or non-string value is absence.
pub(crate) fn str_of(doc: &Value, key: &str) -> Option<String> {
    doc.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Like [`str_of`], but empty strings fall through as absence. Used by
/// chains that should keep looking past blank values.
pub(crate) fn nonempty_str_of(doc: &Value, key: &str) -> Option<String> {
    str_of(doc, key).filter(|s| !s.is_empty())
}

/// Walk a chain of object keys, short-circuiting on the first miss.
pub(crate) fn dig<'a>(doc: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut node = doc;
    for key in path {
        node = node.get(key)?;
    }
    Some(node)
}

/// Positional 4-element bbox (west, south, east, north). Arrays with more
/// than four entries keep their first four; fewer is absence.
pub(crate) fn bbox_extent(value: &Value) -> Option<SpatialExtent> {
    let coords = value.as_array()?;
    if coords.len() < 4 {
        return None;
    }
    let f = |v: &Value| v.as_f64().unwrap_or(0.0);
    Some(SpatialExtent {
        west: f(&coords[0]),
        south: f(&coords[1]),
        east: f(&coords[2]),
        north: f(&coords[3]),
    })
}
