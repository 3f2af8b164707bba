mod cli;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use geomanifest::DatasetManifest;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Info { file } => {
            let manifest = DatasetManifest::from_path_lenient(&file);
            println!("Name: {}", manifest.name());
            if let Some(format) = manifest.format() {
                println!("Format: {}", format);
            }
            println!("Version: {}", manifest.version());
            println!("License: {}", manifest.license());
            println!("CRS: {}", manifest.crs());
            if let Some(resolution) = manifest.spatial_resolution() {
                println!("Resolution: {}", resolution);
            }
            if let Some(extent) = manifest.spatial_extent() {
                println!(
                    "Extent: [{:.2}, {:.2}, {:.2}, {:.2}]",
                    extent.west, extent.south, extent.east, extent.north
                );
            }
            if let Some(temporal) = manifest.temporal_extent() {
                println!("Temporal: {} -> {}", temporal.start, temporal.end);
            }
            println!("Items: {}", manifest.item_count());
            println!("Dataset type: {}", manifest.dataset_type());
            for (key, value) in manifest.metadata_items() {
                println!("{}: {}", key, value);
            }
        }
        Commands::Items { file } => {
            let manifest = DatasetManifest::from_path_lenient(&file);
            for item in manifest.items() {
                let id = item.id.clone().unwrap_or_else(|| "Unknown".to_string());
                match item.bbox_coords() {
                    Some(bbox) if bbox.len() >= 2 => {
                        println!("{} [{:.1}, {:.1}]", id, bbox[0], bbox[1])
                    }
                    _ => println!("{}", id),
                }
            }
        }
        Commands::Files { file } => {
            let manifest = DatasetManifest::from_path_lenient(&file);
            for f in manifest.distribution_files() {
                let name = if f.name.is_empty() { &f.id } else { &f.name };
                println!("{}\t{}\t{}", name, f.encoding_format, f.content_url);
            }
        }
        Commands::Match { file, item_id, file_type } => {
            let manifest = DatasetManifest::from_path_lenient(&file);
            match manifest.find_distribution_file(&item_id, &file_type) {
                Some(hit) => println!("{}", hit.content_url),
                None => eprintln!("No {} file found for item: {}", file_type, item_id),
            }
        }
    }
}
