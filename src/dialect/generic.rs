//! Fallback for documents matching no known dialect.
//!
//! Only the name/description chains are attempted; everything else stays at
//! the trait defaults. No speculative parsing.

pub(crate) struct GenericDialect;

impl super::Dialect for GenericDialect {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use serde_json::json;

    #[test]
    fn name_chain_name_title_id() {
        let d = GenericDialect;
        assert_eq!(d.name(&json!({"name": "n", "title": "t"})), "n");
        assert_eq!(d.name(&json!({"title": "t", "id": "i"})), "t");
        assert_eq!(d.name(&json!({"id": "i"})), "i");
        assert_eq!(d.name(&json!({})), "Unknown Dataset");
    }

    #[test]
    fn description_falls_back_to_abstract() {
        let d = GenericDialect;
        assert_eq!(d.description(&json!({"abstract": "a"})), "a");
        assert_eq!(d.description(&json!({})), "");
    }

    #[test]
    fn everything_else_is_empty() {
        let d = GenericDialect;
        let doc = json!({"bbox": [0, 0, 1, 1], "assets": {"a": {"href": "u"}}});
        assert!(d.spatial_extent(&doc).is_none());
        assert!(d.temporal_extent(&doc).is_none());
        assert!(d.assets(&doc).is_empty());
        assert!(d.download_urls(&doc).is_empty());
        assert_eq!(d.crs(&doc), "EPSG:4326");
    }
}
