//! Source URI normalization for raster (COG) and tabular (CSV) retrieval.
//!
//! Rewrites object-storage and protocol URLs into the access forms the
//! external geospatial engine expects: virtual-filesystem paths for
//! streaming raster access, public-HTTP equivalents for row-oriented
//! downloads. The engine itself sits behind the [`RasterOpener`] and
//! [`VectorOpener`] seams; this module never decodes file formats.

use std::io::Write;
use std::path::Path;

use anyhow::{bail, Result};
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use url::Url;

/// External raster engine seam: opens a normalized access URI as a layer.
pub trait RasterOpener {
    type Layer;

    fn open(&mut self, uri: &str, name: &str) -> Result<Self::Layer>;
}

/// External vector engine seam: opens a provider URI (delimited text,
/// GeoPackage) as a layer. Implementations should fail on layers that
/// come back invalid or empty so the fallback chain can continue.
pub trait VectorOpener {
    type Layer;

    fn open(&mut self, uri: &str, name: &str) -> Result<Self::Layer>;
}

/// Virtual filesystem path for streaming raster access.
///
/// Anything without a recognized remote scheme is treated as a local path
/// and returned unchanged.
pub fn raster_access_uri(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("s3://") {
        format!("/vsis3/{}", rest)
    } else if url.starts_with("http://") || url.starts_with("https://") {
        format!("/vsicurl/{}", url)
    } else if let Some(rest) = url.strip_prefix("gs://") {
        format!("/vsigs/{}", rest)
    } else if let Some(rest) = url.strip_prefix("az://") {
        format!("/vsiaz/{}", rest)
    } else if let Some(rest) = url.strip_prefix("abfs://") {
        format!("/vsiaz/{}", rest)
    } else {
        url.to_string()
    }
}

/// Public download form for row-oriented tabular retrieval.
///
/// S3 and GCS URLs become their public HTTP equivalents; everything else
/// is used as-is.
pub fn tabular_download_url(url: &str) -> String {
    if url.starts_with("s3://") {
        match s3_parts(url) {
            Some((bucket, key)) => format!("https://{}.s3.amazonaws.com/{}", bucket, key),
            None => url.replacen("s3://", "https://", 1),
        }
    } else if let Some(rest) = url.strip_prefix("gs://") {
        format!("https://storage.googleapis.com/{}", rest)
    } else {
        url.to_string()
    }
}

/// Bucket and key of an `s3://bucket/key` URL.
fn s3_parts(url: &str) -> Option<(String, String)> {
    let parsed = Url::parse(url).ok()?;
    let bucket = parsed.host_str()?.to_string();
    let key = parsed.path().trim_start_matches('/');
    if key.is_empty() {
        return None;
    }
    Some((bucket, key.to_string()))
}

/// Whether a URL points at a remote source rather than the local
/// filesystem.
fn is_remote(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "s3" | "gs" | "http" | "https" | "az" | "abfs"),
        Err(_) => false,
    }
}

/// Loads Cloud-Optimized GeoTIFFs from S3, GCS, Azure, HTTP, or local
/// paths through the virtual-filesystem access form.
pub struct CogLoader {
    original_url: String,
    uri: String,
    name: String,
}

impl CogLoader {
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        let original_url = url.into();
        let uri = raster_access_uri(&original_url);
        CogLoader {
            original_url,
            uri,
            name: name.into(),
        }
    }

    /// The virtual filesystem path handed to the engine.
    pub fn access_uri(&self) -> &str {
        &self.uri
    }

    /// Attempt the load; on failure for S3 sources, retry once with the
    /// public-HTTPS form. Exhaustion surfaces as absence.
    pub fn load<O: RasterOpener>(&self, opener: &mut O) -> Option<O::Layer> {
        match opener.open(&self.uri, &self.name) {
            Ok(layer) => return Some(layer),
            Err(err) => debug!(uri = %self.uri, "raster load failed: {err:#}"),
        }

        if self.original_url.starts_with("s3://") {
            if let Some((bucket, key)) = s3_parts(&self.original_url) {
                let public = format!("/vsicurl/https://{}.s3.amazonaws.com/{}", bucket, key);
                match opener.open(&public, &self.name) {
                    Ok(layer) => return Some(layer),
                    Err(err) => warn!(uri = %public, "raster retry failed: {err:#}"),
                }
            }
        }

        None
    }
}

/// Coordinate-field name guesses tried after the caller-supplied pair.
const X_FIELD_FALLBACKS: [&str; 5] = ["lon", "lng", "x", "long", "longitude"];
const Y_FIELD_FALLBACKS: [&str; 3] = ["lat", "y", "latitude"];

/// Loads delimited-text files as point layers, with remote sources
/// downloaded to a scoped temporary file first.
pub struct CsvLoader {
    url: String,
    name: String,
    x_field: String,
    y_field: String,
    crs: String,
}

impl CsvLoader {
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        CsvLoader {
            url: url.into(),
            name: name.into(),
            x_field: "longitude".to_string(),
            y_field: "latitude".to_string(),
            crs: "EPSG:4326".to_string(),
        }
    }

    pub fn with_fields(mut self, x_field: impl Into<String>, y_field: impl Into<String>) -> Self {
        self.x_field = x_field.into();
        self.y_field = y_field.into();
        self
    }

    pub fn with_crs(mut self, crs: impl Into<String>) -> Self {
        self.crs = crs.into();
        self
    }

    /// Attempt a point-layer load, walking the coordinate-field candidate
    /// grid until the engine accepts one; the final fallback loads the
    /// file with no geometry interpretation at all.
    ///
    /// Remote sources are fetched into a temp file whose deletion is tied
    /// to this call's scope — every exit path releases it.
    pub fn load<O: VectorOpener>(&self, opener: &mut O) -> Option<O::Layer> {
        // The downloaded copy lives exactly as long as the load attempts;
        // every return below drops (and deletes) it.
        let (base, _downloaded): (String, Option<NamedTempFile>) = if is_remote(&self.url) {
            let source = tabular_download_url(&self.url);
            match download_to_temp(&source) {
                Ok(tmp) => {
                    let path = tmp.path().display().to_string();
                    (path, Some(tmp))
                }
                Err(err) => {
                    warn!(url = %source, "tabular download failed: {err:#}");
                    return None;
                }
            }
        } else {
            (self.url.clone(), None)
        };
        for x_field in self.x_candidates() {
            for y_field in self.y_candidates() {
                let uri = delimited_text_uri(&base, &x_field, &y_field, &self.crs);
                match opener.open(&uri, &self.name) {
                    Ok(layer) => return Some(layer),
                    Err(err) => debug!(x = %x_field, y = %y_field, "delimited-text load failed: {err:#}"),
                }
            }
        }

        // Attributes only.
        match opener.open(&geometryless_uri(&base), &self.name) {
            Ok(layer) => Some(layer),
            Err(err) => {
                warn!(url = %self.url, "tabular load exhausted all fallbacks: {err:#}");
                None
            }
        }
    }

    fn x_candidates(&self) -> Vec<String> {
        candidate_fields(&self.x_field, &X_FIELD_FALLBACKS)
    }

    fn y_candidates(&self) -> Vec<String> {
        candidate_fields(&self.y_field, &Y_FIELD_FALLBACKS)
    }
}

/// Given field first, then the fixed guesses, without repeating the given.
fn candidate_fields(given: &str, fallbacks: &[&str]) -> Vec<String> {
    let mut fields = vec![given.to_string()];
    fields.extend(
        fallbacks
            .iter()
            .filter(|f| **f != given)
            .map(|f| f.to_string()),
    );
    fields
}

/// Delimited-text provider URI with point geometry from the named fields.
fn delimited_text_uri(base: &str, x_field: &str, y_field: &str, crs: &str) -> String {
    format!(
        "{}?type=csv&xField={}&yField={}&crs={}&spatialIndex=yes&subsetIndex=no&watchFile=no",
        base, x_field, y_field, crs
    )
}

/// Delimited-text provider URI with no geometry interpretation.
fn geometryless_uri(base: &str) -> String {
    format!("{}?type=csv&geomType=none", base)
}

/// Fetch a remote tabular source into a named temp file.
fn download_to_temp(url: &str) -> Result<NamedTempFile> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("geomanifest/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let response = client.get(url).send()?;
    if !response.status().is_success() {
        bail!("download of {} failed with status {}", url, response.status());
    }
    let bytes = response.bytes()?;

    let suffix = Path::new(url)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    let mut tmp = tempfile::Builder::new()
        .prefix("geomanifest-")
        .suffix(&suffix)
        .tempfile()?;
    tmp.write_all(&bytes)?;
    Ok(tmp)
}

/// Loads GeoPackage files, optionally addressing a single table.
pub struct GeoPackageLoader {
    url: String,
    name: String,
    table: Option<String>,
}

impl GeoPackageLoader {
    pub fn new(url: impl Into<String>, name: impl Into<String>) -> Self {
        GeoPackageLoader {
            url: url.into(),
            name: name.into(),
            table: None,
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn access_uri(&self) -> String {
        match &self.table {
            Some(table) => format!("{}|layername={}", self.url, table),
            None => self.url.clone(),
        }
    }

    pub fn load<O: VectorOpener>(&self, opener: &mut O) -> Option<O::Layer> {
        match opener.open(&self.access_uri(), &self.name) {
            Ok(layer) => Some(layer),
            Err(err) => {
                warn!(url = %self.url, "geopackage load failed: {err:#}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    /// Opener that records every URI and succeeds when one contains the
    /// configured marker.
    struct MarkerOpener {
        succeed_on: &'static str,
        attempts: Vec<String>,
    }

    impl MarkerOpener {
        fn new(succeed_on: &'static str) -> Self {
            MarkerOpener {
                succeed_on,
                attempts: Vec::new(),
            }
        }
    }

    impl RasterOpener for MarkerOpener {
        type Layer = String;

        fn open(&mut self, uri: &str, _name: &str) -> Result<String> {
            self.attempts.push(uri.to_string());
            if uri.contains(self.succeed_on) {
                Ok(uri.to_string())
            } else {
                Err(anyhow!("invalid layer"))
            }
        }
    }

    impl VectorOpener for MarkerOpener {
        type Layer = String;

        fn open(&mut self, uri: &str, _name: &str) -> Result<String> {
            self.attempts.push(uri.to_string());
            if uri.contains(self.succeed_on) {
                Ok(uri.to_string())
            } else {
                Err(anyhow!("invalid layer"))
            }
        }
    }

    #[test]
    fn raster_uri_rewrites_by_scheme() {
        assert_eq!(raster_access_uri("s3://b/k.tif"), "/vsis3/b/k.tif");
        assert_eq!(
            raster_access_uri("https://x/y.tif"),
            "/vsicurl/https://x/y.tif"
        );
        assert_eq!(raster_access_uri("gs://b/k.tif"), "/vsigs/b/k.tif");
        assert_eq!(raster_access_uri("az://b/k.tif"), "/vsiaz/b/k.tif");
        assert_eq!(raster_access_uri("abfs://b/k.tif"), "/vsiaz/b/k.tif");
        assert_eq!(raster_access_uri("/data/k.tif"), "/data/k.tif");
    }

    #[test]
    fn tabular_url_uses_public_http_forms() {
        assert_eq!(
            tabular_download_url("s3://bucket/a/b.csv"),
            "https://bucket.s3.amazonaws.com/a/b.csv"
        );
        assert_eq!(
            tabular_download_url("gs://bucket/a.csv"),
            "https://storage.googleapis.com/bucket/a.csv"
        );
        assert_eq!(
            tabular_download_url("https://x/a.csv"),
            "https://x/a.csv"
        );
        assert_eq!(tabular_download_url("/data/a.csv"), "/data/a.csv");
    }

    #[test]
    fn malformed_s3_url_falls_back_to_prefix_swap() {
        assert_eq!(tabular_download_url("s3://bucketonly"), "https://bucketonly");
    }

    #[test]
    fn cog_load_retries_s3_as_public_https() {
        let loader = CogLoader::new("s3://bucket/key.tif", "tile");
        let mut opener = MarkerOpener::new("/vsicurl/");
        let layer = loader.load(&mut opener).unwrap();

        assert_eq!(opener.attempts.len(), 2);
        assert_eq!(opener.attempts[0], "/vsis3/bucket/key.tif");
        assert_eq!(
            opener.attempts[1],
            "/vsicurl/https://bucket.s3.amazonaws.com/key.tif"
        );
        assert_eq!(layer, "/vsicurl/https://bucket.s3.amazonaws.com/key.tif");
    }

    #[test]
    fn cog_load_gives_up_for_non_s3_sources() {
        let loader = CogLoader::new("https://x/y.tif", "tile");
        let mut opener = MarkerOpener::new("never-matches");
        assert!(loader.load(&mut opener).is_none());
        assert_eq!(opener.attempts.len(), 1);
    }

    #[test]
    fn csv_load_walks_field_candidates_in_order() {
        let loader = CsvLoader::new("/data/points.csv", "pts");
        let mut opener = MarkerOpener::new("xField=lng&yField=y");
        let layer = loader.load(&mut opener).unwrap();
        assert!(layer.contains("/data/points.csv?type=csv"));

        // Given pair first, then the fallback grid row by row.
        assert!(opener.attempts[0].contains("xField=longitude&yField=latitude"));
        assert!(opener
            .attempts
            .last()
            .unwrap()
            .contains("xField=lng&yField=y"));
    }

    #[test]
    fn csv_load_falls_back_to_geometryless() {
        let loader = CsvLoader::new("/data/points.csv", "pts");
        let mut opener = MarkerOpener::new("geomType=none");
        let layer = loader.load(&mut opener).unwrap();
        assert_eq!(layer, "/data/points.csv?type=csv&geomType=none");

        // 5 deduped x-candidates x 3 y-candidates, then the
        // geometry-less try.
        assert_eq!(opener.attempts.len(), 16);
    }

    #[test]
    fn csv_given_fields_are_not_repeated() {
        let loader = CsvLoader::new("/d.csv", "d").with_fields("lon", "lat");
        let mut opener = MarkerOpener::new("never-matches");
        loader.load(&mut opener);

        let with_lon_lat = opener
            .attempts
            .iter()
            .filter(|u| u.contains("xField=lon&yField=lat&"))
            .count();
        assert_eq!(with_lon_lat, 1);
    }

    #[test]
    fn geopackage_uri_addresses_tables() {
        let plain = GeoPackageLoader::new("/data/x.gpkg", "x");
        assert_eq!(plain.access_uri(), "/data/x.gpkg");

        let table = GeoPackageLoader::new("/data/x.gpkg", "x").with_table("roads");
        assert_eq!(table.access_uri(), "/data/x.gpkg|layername=roads");
    }
}
