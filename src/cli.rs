use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Command-line inspector for geospatial dataset metadata
#[derive(Parser)]
#[command(name = "geomanifest")]
#[command(about = "Inspect GeoCroissant, CMR-UMM, and STAC dataset metadata", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the normalized dataset summary
    Info {
        /// Path to the metadata JSON file
        file: PathBuf,
    },
    /// List items reconstructed from the record sets
    Items {
        /// Path to the metadata JSON file
        file: PathBuf,
    },
    /// List distribution files and download URLs
    Files {
        /// Path to the metadata JSON file
        file: PathBuf,
    },
    /// Find the distribution file backing an item
    Match {
        /// Path to the metadata JSON file
        file: PathBuf,
        /// Item/tile id to search for
        item_id: String,
        /// File type to match (e.g. "cog", "csv", ".tif")
        file_type: String,
    },
}
