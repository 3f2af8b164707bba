use std::path::PathBuf;

use thiserror::Error;

/// Failure to turn a byte source into a metadata document tree.
///
/// This is the only error the crate surfaces: it is reported once at load
/// time, after which a degraded manifest keeps answering queries with
/// fallback defaults instead of re-raising.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read metadata file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not well-formed JSON")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("metadata stream is not well-formed JSON")]
    ParseBytes {
        #[source]
        source: serde_json::Error,
    },
}
