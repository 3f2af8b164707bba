pub mod dialect;
pub mod error;
pub mod format;
pub mod geometry;
pub mod loader;
pub mod records;

// --- Library API for embedding ---

/// Convenience re-exports for embedders.
pub mod prelude {
    pub use crate::dialect::{Asset, DownloadUrl, SpatialExtent, TemporalExtent};
    pub use crate::error::LoadError;
    pub use crate::format::MetadataFormat;
    pub use crate::geometry::{BboxLayerBuilder, FeatureCollection, TileLayerBuilder};
    pub use crate::loader::{CogLoader, CsvLoader, GeoPackageLoader, RasterOpener, VectorOpener};
    pub use crate::records::{DatasetType, DistributionFile, TileItem};
    pub use crate::{DatasetManifest, Reference};
}

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::dialect::{adapter_for, Dialect, DEFAULT_CRS, DEFAULT_LICENSE, DEFAULT_NAME, DEFAULT_VERSION};

pub use crate::dialect::{Asset, DownloadUrl, SpatialExtent, TemporalExtent};
pub use crate::error::LoadError;
pub use crate::format::MetadataFormat;
pub use crate::records::{DatasetType, DistributionFile, TileItem};

/// A reference link carried by the dataset (papers, catalogs, docs).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub name: String,
    pub url: String,
}

/// Unified parser facade over a loaded metadata document.
///
/// Owns the document tree and the format computed once at construction,
/// and exposes the normalized accessors plus record-set reconstruction and
/// distribution-file matching that no single dialect owns. Every accessor
/// degrades to a safe default on missing or malformed fields; only loading
/// itself can fail.
pub struct DatasetManifest {
    document: Value,
    format: Option<MetadataFormat>,
    adapter: Option<&'static dyn Dialect>,
}

impl DatasetManifest {
    /// Adopt an already-parsed document tree.
    pub fn from_value(document: Value) -> Self {
        let format = MetadataFormat::detect(&document);
        DatasetManifest {
            document,
            format: Some(format),
            adapter: Some(adapter_for(format)),
        }
    }

    /// Load and parse a metadata file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let document = serde_json::from_str(&raw).map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_value(document))
    }

    /// Parse a metadata document from raw bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, LoadError> {
        let document =
            serde_json::from_slice(bytes).map_err(|source| LoadError::ParseBytes { source })?;
        Ok(Self::from_value(document))
    }

    /// Load a metadata file, degrading instead of failing.
    ///
    /// The load error is reported once here; the returned manifest answers
    /// every subsequent query with direct fixed-key lookups where possible
    /// and documented defaults otherwise, and never re-raises.
    pub fn from_path_lenient(path: impl AsRef<Path>) -> Self {
        match Self::from_path(path.as_ref()) {
            Ok(manifest) => manifest,
            Err(err) => {
                warn!(path = %path.as_ref().display(), "loading degraded manifest: {err}");
                Self::degraded()
            }
        }
    }

    /// The "no detector" state used after a failed load.
    pub fn degraded() -> Self {
        DatasetManifest {
            document: Value::Null,
            format: None,
            adapter: None,
        }
    }

    // --- document identity ---

    /// Format computed at construction; `None` only for degraded
    /// manifests.
    pub fn format(&self) -> Option<MetadataFormat> {
        self.format
    }

    /// The raw document tree.
    pub fn raw(&self) -> &Value {
        &self.document
    }

    fn is_croissant(&self) -> bool {
        self.format == Some(MetadataFormat::GeoCroissant)
    }

    // --- normalized accessors ---

    pub fn name(&self) -> String {
        match self.adapter {
            Some(adapter) => {
                let name = adapter.name(&self.document);
                if self.is_croissant() && name == DEFAULT_NAME {
                    return self.legacy_name();
                }
                name
            }
            None => self.legacy_name(),
        }
    }

    pub fn description(&self) -> String {
        match self.adapter {
            Some(adapter) => {
                let description = adapter.description(&self.document);
                if self.is_croissant() && description.is_empty() {
                    return self.legacy_description();
                }
                description
            }
            None => self.legacy_description(),
        }
    }

    pub fn spatial_extent(&self) -> Option<SpatialExtent> {
        let extent = self.adapter.and_then(|a| a.spatial_extent(&self.document));
        if extent.is_none() && (self.is_croissant() || self.adapter.is_none()) {
            return self
                .document
                .get("geocr:BoundingBox")
                .and_then(dialect::bbox_extent);
        }
        extent
    }

    pub fn temporal_extent(&self) -> Option<TemporalExtent> {
        let extent = self.adapter.and_then(|a| a.temporal_extent(&self.document));
        if extent.is_none() && (self.is_croissant() || self.adapter.is_none()) {
            return self.legacy_temporal_extent();
        }
        extent
    }

    /// Coordinate reference system; defaults to "EPSG:4326".
    ///
    /// GeoCroissant documents consult the legacy top-level field whenever
    /// the adapter result equals the default — an inequality check, not a
    /// value-presence check, kept for compatibility with older documents.
    pub fn crs(&self) -> String {
        match self.adapter {
            Some(adapter) => {
                let crs = adapter.crs(&self.document);
                if self.is_croissant() && crs == DEFAULT_CRS {
                    return self.legacy_crs();
                }
                crs
            }
            None => self.legacy_crs(),
        }
    }

    pub fn spatial_resolution(&self) -> Option<String> {
        let resolution = self.adapter.and_then(|a| a.spatial_resolution(&self.document));
        if resolution.is_none() && (self.is_croissant() || self.adapter.is_none()) {
            return dialect::str_of(&self.document, "geocr:spatialResolution");
        }
        resolution
    }

    /// Dataset version; meaningful for GeoCroissant documents only, fixed
    /// default elsewhere.
    pub fn version(&self) -> String {
        if self.is_croissant() || self.adapter.is_none() {
            dialect::str_of(&self.document, "version").unwrap_or_else(|| DEFAULT_VERSION.to_string())
        } else {
            DEFAULT_VERSION.to_string()
        }
    }

    /// Dataset license; meaningful for GeoCroissant documents only, fixed
    /// default elsewhere.
    pub fn license(&self) -> String {
        if self.is_croissant() || self.adapter.is_none() {
            dialect::str_of(&self.document, "license").unwrap_or_else(|| DEFAULT_LICENSE.to_string())
        } else {
            DEFAULT_LICENSE.to_string()
        }
    }

    pub fn download_urls(&self) -> Vec<DownloadUrl> {
        self.adapter
            .map(|a| a.download_urls(&self.document))
            .unwrap_or_default()
    }

    pub fn assets(&self) -> Vec<Asset> {
        self.adapter
            .map(|a| a.assets(&self.document))
            .unwrap_or_default()
    }

    pub fn metadata_items(&self) -> Vec<(String, String)> {
        self.adapter
            .map(|a| a.metadata_items(&self.document))
            .unwrap_or_default()
    }

    // --- record sets and items ---

    /// Raw record-set entries, in document order.
    pub fn record_sets(&self) -> &[Value] {
        records::record_sets(&self.document)
    }

    /// Items reconstructed from every record set's columnar encoding.
    /// Rebuilt on each call; never cached.
    pub fn items(&self) -> Vec<TileItem> {
        records::reconstruct_items(&self.document)
    }

    pub fn item_count(&self) -> usize {
        self.items().len()
    }

    /// "tiles" when any record set carries data rows, else "files".
    pub fn dataset_type(&self) -> DatasetType {
        records::dataset_type(&self.document)
    }

    // --- distribution ---

    /// Distribution entries typed `cr:FileObject`.
    pub fn distribution_files(&self) -> Vec<DistributionFile> {
        records::distribution_files(&self.document)
    }

    /// Distribution entries typed `cr:FileSet`, raw.
    pub fn file_sets(&self) -> Vec<Value> {
        self.document
            .get("distribution")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| e.get("@type").and_then(Value::as_str) == Some("cr:FileSet"))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Find the distribution file backing an item id and wanted file type.
    /// Absence is a normal outcome, not an error.
    pub fn find_distribution_file(&self, item_id: &str, file_type: &str) -> Option<DistributionFile> {
        let files = self.distribution_files();
        records::find_distribution_file(&files, item_id, file_type).cloned()
    }

    // --- supplemental dataset fields ---

    pub fn references(&self) -> Vec<Reference> {
        self.document
            .get("references")
            .and_then(Value::as_array)
            .map(|refs| {
                refs.iter()
                    .map(|r| Reference {
                        name: r.get("name").and_then(Value::as_str).unwrap_or_default().to_string(),
                        url: r.get("url").and_then(Value::as_str).unwrap_or_default().to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn keywords(&self) -> Vec<String> {
        self.document
            .get("keywords")
            .and_then(Value::as_array)
            .map(|words| {
                words
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_live_dataset(&self) -> bool {
        self.document
            .get("isLiveDataset")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Visualization configurations, raw.
    pub fn visualizations(&self) -> Map<String, Value> {
        self.object_field("geocr:visualizations")
    }

    /// Dataset summaries (platforms, instruments, ...), raw.
    pub fn summaries(&self) -> Map<String, Value> {
        self.object_field("geocr:summaries")
    }

    /// Dataset bounding box as stored: the first four values of
    /// `geocr:BoundingBox`.
    pub fn bounding_box(&self) -> Option<Vec<f64>> {
        let coords = self.document.get("geocr:BoundingBox")?.as_array()?;
        if coords.len() < 4 {
            return None;
        }
        Some(
            coords[..4]
                .iter()
                .map(|v| v.as_f64().unwrap_or(0.0))
                .collect(),
        )
    }

    // --- legacy direct lookups (degraded mode and GeoCroissant fallback) ---

    fn legacy_name(&self) -> String {
        dialect::str_of(&self.document, "name").unwrap_or_else(|| DEFAULT_NAME.to_string())
    }

    fn legacy_description(&self) -> String {
        dialect::str_of(&self.document, "description").unwrap_or_default()
    }

    fn legacy_crs(&self) -> String {
        dialect::str_of(&self.document, "geocr:coordinateReferenceSystem")
            .unwrap_or_else(|| DEFAULT_CRS.to_string())
    }

    fn legacy_temporal_extent(&self) -> Option<TemporalExtent> {
        let temporal = self.document.get("geocr:temporalExtent")?;
        let field = |key: &str| {
            temporal
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let extent = TemporalExtent {
            start: field("startDate"),
            end: field("endDate"),
        };
        if extent.start.is_empty() && extent.end.is_empty() {
            return None;
        }
        Some(extent)
    }

    fn object_field(&self, key: &str) -> Map<String, Value> {
        self.document
            .get(key)
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
    }
}
