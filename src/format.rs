use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The closed set of metadata dialects a document can be classified into.
///
/// Exactly one value is derived per document, computed once when the
/// manifest is constructed and cached for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetadataFormat {
    GeoCroissant,
    CmrUmm,
    Stac,
    Generic,
}

impl MetadataFormat {
    /// Classify a parsed document by shape. Pure; never fails.
    ///
    /// First match wins. Documents may coincidentally satisfy several weak
    /// markers, so the precedence is deliberate: CMR-UMM's paired
    /// "umm"/"meta" keys outrank STAC's markers, which outrank
    /// GeoCroissant's "recordSet"/"distribution" keys. Anything else is
    /// `Generic`.
    pub fn detect(doc: &Value) -> Self {
        if doc.get("umm").is_some() && doc.get("meta").is_some() {
            return MetadataFormat::CmrUmm;
        }

        let feature_collection = doc.get("type").and_then(Value::as_str) == Some("FeatureCollection");
        if doc.get("stac_version").is_some() || (feature_collection && doc.get("links").is_some()) {
            return MetadataFormat::Stac;
        }

        if doc.get("recordSet").is_some() || doc.get("distribution").is_some() {
            return MetadataFormat::GeoCroissant;
        }

        MetadataFormat::Generic
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataFormat::GeoCroissant => "geocroissant",
            MetadataFormat::CmrUmm => "cmr_umm",
            MetadataFormat::Stac => "stac",
            MetadataFormat::Generic => "generic",
        }
    }
}

impl std::fmt::Display for MetadataFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn umm_and_meta_detect_as_cmr() {
        let doc = json!({"umm": {"GranuleUR": "G1"}, "meta": {}});
        assert_eq!(MetadataFormat::detect(&doc), MetadataFormat::CmrUmm);
    }

    #[test]
    fn cmr_outranks_other_markers() {
        // Coincidental STAC and GeoCroissant markers must not win.
        let doc = json!({
            "umm": {},
            "meta": {},
            "stac_version": "1.0.0",
            "recordSet": [],
            "distribution": []
        });
        assert_eq!(MetadataFormat::detect(&doc), MetadataFormat::CmrUmm);
    }

    #[test]
    fn stac_version_detects_as_stac() {
        let doc = json!({"stac_version": "1.0.0"});
        assert_eq!(MetadataFormat::detect(&doc), MetadataFormat::Stac);
    }

    #[test]
    fn feature_collection_with_links_detects_as_stac() {
        let doc = json!({"type": "FeatureCollection", "links": []});
        assert_eq!(MetadataFormat::detect(&doc), MetadataFormat::Stac);
    }

    #[test]
    fn feature_collection_without_links_is_not_stac() {
        let doc = json!({"type": "FeatureCollection"});
        assert_eq!(MetadataFormat::detect(&doc), MetadataFormat::Generic);
    }

    #[test]
    fn record_set_or_distribution_detects_as_geocroissant() {
        let doc = json!({"recordSet": []});
        assert_eq!(MetadataFormat::detect(&doc), MetadataFormat::GeoCroissant);

        let doc = json!({"distribution": []});
        assert_eq!(MetadataFormat::detect(&doc), MetadataFormat::GeoCroissant);
    }

    #[test]
    fn umm_without_meta_falls_through() {
        let doc = json!({"umm": {}, "distribution": []});
        assert_eq!(MetadataFormat::detect(&doc), MetadataFormat::GeoCroissant);
    }

    #[test]
    fn anything_else_is_generic() {
        assert_eq!(MetadataFormat::detect(&json!({})), MetadataFormat::Generic);
        assert_eq!(
            MetadataFormat::detect(&json!({"name": "x"})),
            MetadataFormat::Generic
        );
    }
}
