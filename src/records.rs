//! Tile/record reconstruction from the columnar record-set encoding, plus
//! identifier-based matching across distribution files.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::dialect::croissant::FILE_OBJECT_TYPE;

/// Row keys recognized during record-set reconstruction.
const ITEM_KEYS: [&str; 4] = ["id", "datetime", "bbox", "assets"];

/// One reconstructed record-set row: a spatial/temporal unit of a dataset
/// (a raster tile, a granule). Ephemeral — rebuilt on every extraction
/// call, never cached or mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TileItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,
    /// Raw bbox value as it appeared in the row; interpreted at use sites.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Value>,
    /// Raw per-item asset listing, if the row carried one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assets: Option<Value>,
    /// Leftover row columns, keyed by their prefix-stripped names.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TileItem {
    fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.datetime.is_none()
            && self.bbox.is_none()
            && self.assets.is_none()
            && self.extra.is_empty()
    }

    fn set(&mut self, key: &str, value: &Value) {
        match key {
            "id" => self.id = Some(scalar_string(value)),
            "datetime" => self.datetime = Some(scalar_string(value)),
            "bbox" => self.bbox = Some(value.clone()),
            "assets" => self.assets = Some(value.clone()),
            other => {
                self.extra.insert(other.to_string(), value.clone());
            }
        }
    }

    /// Bbox coordinates as floats, in row order. Non-numeric entries
    /// degrade to 0.0; short or missing arrays are absence.
    pub fn bbox_coords(&self) -> Option<Vec<f64>> {
        let coords = self.bbox.as_ref()?.as_array()?;
        Some(coords.iter().map(|v| v.as_f64().unwrap_or(0.0)).collect())
    }
}

/// Whether a document's record sets carry per-tile rows or only
/// dataset-level files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatasetType {
    Tiles,
    Files,
}

impl std::fmt::Display for DatasetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            DatasetType::Tiles => "tiles",
            DatasetType::Files => "files",
        })
    }
}

/// Raw per-dialect file descriptor: the unit searched by file matching.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistributionFile {
    #[serde(rename = "@type", default)]
    pub kind: String,
    #[serde(rename = "@id", default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "contentUrl", default)]
    pub content_url: String,
    #[serde(rename = "encodingFormat", default)]
    pub encoding_format: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DistributionFile {
    /// Lenient construction from a raw distribution entry: mistyped fields
    /// degrade to empty strings instead of dropping the entry.
    pub(crate) fn from_entry(entry: &Value) -> Self {
        let text = |key: &str| {
            entry
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let known = ["@type", "@id", "name", "description", "contentUrl", "encodingFormat"];
        let extra = entry
            .as_object()
            .map(|obj| {
                obj.iter()
                    .filter(|(k, _)| !known.contains(&k.as_str()))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default();
        DistributionFile {
            kind: text("@type"),
            id: text("@id"),
            name: text("name"),
            description: text("description"),
            content_url: text("contentUrl"),
            encoding_format: text("encodingFormat"),
            extra,
        }
    }
}

/// Record-set entries, in document order.
pub(crate) fn record_sets(doc: &Value) -> &[Value] {
    doc.get("recordSet")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Distribution entries typed `cr:FileObject`, in document order.
pub(crate) fn distribution_files(doc: &Value) -> Vec<DistributionFile> {
    doc.get("distribution")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter(|e| e.get("@type").and_then(Value::as_str) == Some(FILE_OBJECT_TYPE))
                .map(DistributionFile::from_entry)
                .collect()
        })
        .unwrap_or_default()
}

/// Reconstruct items from every record set's columnar encoding.
///
/// Each record set declares `field` entries whose `@id` is
/// `"<prefix>/<name>"` and flat `data` rows keyed by those full ids. The
/// prefix is derived from the first field; rows are decoded by looking up
/// the four recognized keys under that prefix, falling back to a full copy
/// with per-key prefix stripping when the prefix matched nothing. Rows
/// contributing zero fields are skipped. Output preserves row order and
/// concatenates record sets in document order.
pub(crate) fn reconstruct_items(doc: &Value) -> Vec<TileItem> {
    let mut items = Vec::new();

    for record_set in record_sets(doc) {
        let rows = record_set
            .get("data")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let prefix = field_prefix(record_set);

        for row in rows {
            let Some(row) = row.as_object() else { continue };
            let mut item = TileItem::default();

            for key in ITEM_KEYS {
                let full_key = format!("{}{}", prefix, key);
                if let Some(value) = row.get(&full_key) {
                    item.set(key, value);
                }
            }

            // Prefix matched nothing: copy the whole row, stripping each
            // key down to its last path segment.
            if item.is_empty() {
                for (key, value) in row {
                    item.set(strip_prefix(key), value);
                }
            }

            if !item.is_empty() {
                items.push(item);
            }
        }
    }

    items
}

/// "tiles" when any record set carries data rows, else "files".
pub(crate) fn dataset_type(doc: &Value) -> DatasetType {
    let has_rows = record_sets(doc).iter().any(|rs| {
        rs.get("data")
            .and_then(Value::as_array)
            .map(|rows| !rows.is_empty())
            .unwrap_or(false)
    });
    if has_rows {
        DatasetType::Tiles
    } else {
        DatasetType::Files
    }
}

/// Find the distribution file backing an item, by identifier and wanted
/// file type.
///
/// A file is a candidate when the item id appears in its `@id`, `name`, or
/// `contentUrl`. Among candidates the type rules run in a fixed order —
/// substring of `@id`/`name`/`contentUrl` (case-insensitive), then the
/// "csv" encoding/extension rule, then the "cog"/".tif"/"tif" rule — and
/// the first candidate in scan order satisfying any rule wins. Absence is
/// a normal outcome.
pub(crate) fn find_distribution_file<'a>(
    files: &'a [DistributionFile],
    item_id: &str,
    file_type: &str,
) -> Option<&'a DistributionFile> {
    let wanted = file_type.to_lowercase();

    for file in files {
        let is_candidate = file.id.contains(item_id)
            || file.name.contains(item_id)
            || file.content_url.contains(item_id);
        if !is_candidate {
            continue;
        }

        let id = file.id.to_lowercase();
        let name = file.name.to_lowercase();
        let url = file.content_url.to_lowercase();
        let encoding = file.encoding_format.to_lowercase();

        if id.contains(&wanted) || name.contains(&wanted) || url.contains(&wanted) {
            return Some(file);
        }
        if wanted == "csv" && (encoding.contains("text/csv") || url.contains(".csv")) {
            return Some(file);
        }
        if matches!(wanted.as_str(), "cog" | ".tif" | "tif")
            && (id.contains("cog") || url.contains(".tif") || encoding.contains("geotiff"))
        {
            return Some(file);
        }
    }

    None
}

/// Prefix shared by a record set's field ids: everything before the last
/// `/` of the first field's `@id`, keeping the trailing slash. Empty when
/// the id has no `/` (or there are no fields).
fn field_prefix(record_set: &Value) -> String {
    record_set
        .get("field")
        .and_then(Value::as_array)
        .and_then(|fields| fields.first())
        .and_then(|field| field.get("@id"))
        .and_then(Value::as_str)
        .and_then(|id| id.rsplit_once('/').map(|(head, _)| format!("{}/", head)))
        .unwrap_or_default()
}

/// Segment after the last `/`, or the key itself.
fn strip_prefix(key: &str) -> &str {
    key.rsplit_once('/').map(|(_, tail)| tail).unwrap_or(key)
}

/// String view of a scalar row value; non-strings keep their JSON text.
fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record_set_doc() -> Value {
        json!({"recordSet": [{
            "@type": "cr:RecordSet",
            "@id": "items",
            "field": [
                {"@id": "items/id", "name": "id"},
                {"@id": "items/bbox", "name": "bbox"}
            ],
            "data": [
                {"items/id": "tile_001", "items/bbox": [-118.93, 68.74, -115.73, 69.86]},
                {"items/id": "tile_002", "items/bbox": [106.76, 69.95, 110.04, 71.04]}
            ]
        }]})
    }

    #[test]
    fn reconstructs_one_item_per_row_in_order() {
        let items = reconstruct_items(&record_set_doc());
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id.as_deref(), Some("tile_001"));
        assert_eq!(items[1].id.as_deref(), Some("tile_002"));
        assert_eq!(
            items[0].bbox_coords().unwrap(),
            vec![-118.93, 68.74, -115.73, 69.86]
        );
    }

    #[test]
    fn prefix_mismatch_falls_back_to_full_row_copy() {
        let doc = json!({"recordSet": [{
            "field": [{"@id": "granules/id"}],
            "data": [{"other/id": "g1", "other/cloud_cover": 12}]
        }]});
        let items = reconstruct_items(&doc);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id.as_deref(), Some("g1"));
        assert_eq!(items[0].extra.get("cloud_cover"), Some(&json!(12)));
    }

    #[test]
    fn unprefixed_fields_use_bare_keys() {
        let doc = json!({"recordSet": [{
            "field": [{"@id": "id"}],
            "data": [{"id": "t1", "bbox": [0, 0, 1, 1]}]
        }]});
        let items = reconstruct_items(&doc);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id.as_deref(), Some("t1"));
        assert_eq!(items[0].bbox_coords().unwrap(), vec![0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn empty_rows_are_skipped() {
        let doc = json!({"recordSet": [{
            "field": [{"@id": "items/id"}],
            "data": [{}, {"items/id": "t1"}]
        }]});
        let items = reconstruct_items(&doc);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id.as_deref(), Some("t1"));
    }

    #[test]
    fn record_sets_concatenate_in_document_order() {
        let doc = json!({"recordSet": [
            {"field": [{"@id": "a/id"}], "data": [{"a/id": "a1"}]},
            {"field": [{"@id": "b/id"}], "data": [{"b/id": "b1"}, {"b/id": "b2"}]}
        ]});
        let ids: Vec<_> = reconstruct_items(&doc)
            .into_iter()
            .filter_map(|i| i.id)
            .collect();
        assert_eq!(ids, ["a1", "b1", "b2"]);
    }

    #[test]
    fn dataset_type_tiles_needs_a_nonempty_data_list() {
        assert_eq!(dataset_type(&record_set_doc()), DatasetType::Tiles);
        let files_only = json!({"recordSet": [{"field": [], "data": []}]});
        assert_eq!(dataset_type(&files_only), DatasetType::Files);
        assert_eq!(dataset_type(&json!({})), DatasetType::Files);
    }

    #[test]
    fn distribution_files_keep_file_objects_only() {
        let doc = json!({"distribution": [
            {"@type": "cr:FileObject", "@id": "a", "contentUrl": "s3://b/a.tif"},
            {"@type": "cr:FileSet", "@id": "set"}
        ]});
        let files = distribution_files(&doc);
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].id, "a");
    }

    #[test]
    fn matches_by_type_substring_in_id() {
        let files = vec![
            DistributionFile {
                id: "tile_001/cog".into(),
                content_url: "s3://b/tile_001.tif".into(),
                ..Default::default()
            },
            DistributionFile {
                id: "tile_001/csv".into(),
                content_url: "s3://b/tile_001.csv".into(),
                ..Default::default()
            },
        ];
        let hit = find_distribution_file(&files, "tile_001", "csv").unwrap();
        assert_eq!(hit.id, "tile_001/csv");
        let hit = find_distribution_file(&files, "tile_001", "cog").unwrap();
        assert_eq!(hit.id, "tile_001/cog");
    }

    #[test]
    fn csv_rule_accepts_encoding_or_extension() {
        let files = vec![DistributionFile {
            id: "tile_001/data".into(),
            content_url: "s3://b/tile_001.csv".into(),
            encoding_format: "text/csv".into(),
            ..Default::default()
        }];
        assert!(find_distribution_file(&files, "tile_001", "csv").is_some());
    }

    #[test]
    fn cog_rule_accepts_tif_url_or_geotiff_encoding() {
        let files = vec![DistributionFile {
            id: "tile_001/raster".into(),
            content_url: "s3://b/tile_001.tif".into(),
            ..Default::default()
        }];
        assert!(find_distribution_file(&files, "tile_001", ".tif").is_some());
        assert!(find_distribution_file(&files, "tile_001", "cog").is_some());

        let by_encoding = vec![DistributionFile {
            id: "tile_001/raster".into(),
            content_url: "s3://b/tile_001.bin".into(),
            encoding_format: "image/geotiff".into(),
            ..Default::default()
        }];
        assert!(find_distribution_file(&by_encoding, "tile_001", "tif").is_some());
    }

    #[test]
    fn non_candidates_never_match() {
        let files = vec![DistributionFile {
            id: "tile_002/csv".into(),
            content_url: "s3://b/tile_002.csv".into(),
            ..Default::default()
        }];
        assert!(find_distribution_file(&files, "tile_001", "csv").is_none());
    }

    #[test]
    fn matching_is_deterministic_over_repeated_calls() {
        let files = vec![
            DistributionFile {
                id: "tile_001/csv".into(),
                content_url: "s3://b/one.csv".into(),
                ..Default::default()
            },
            DistributionFile {
                id: "tile_001/also-csv".into(),
                content_url: "s3://b/two.csv".into(),
                ..Default::default()
            },
        ];
        let first = find_distribution_file(&files, "tile_001", "csv").unwrap();
        for _ in 0..3 {
            assert_eq!(find_distribution_file(&files, "tile_001", "csv").unwrap(), first);
        }
        assert_eq!(first.content_url, "s3://b/one.csv");
    }

    #[test]
    fn lenient_file_parsing_tolerates_mistyped_fields() {
        let entry = json!({"@type": "cr:FileObject", "@id": "x", "name": 7, "md5": "abc"});
        let file = DistributionFile::from_entry(&entry);
        assert_eq!(file.id, "x");
        assert_eq!(file.name, "");
        assert_eq!(file.extra.get("md5"), Some(&json!("abc")));
    }
}
