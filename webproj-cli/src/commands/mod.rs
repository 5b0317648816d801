pub mod batch;
pub mod info;
pub mod list;
pub mod trans;

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use webproj::{TransformService, TransformServiceBuilder};

/// Options shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct ServiceOptions {
    /// CRS registry JSON file (bundled registry if not set)
    #[arg(long, env = "WEBPROJ_CRS_FILE", global = true)]
    pub crs_file: Option<PathBuf>,

    /// Directory with `<model>.gtx` geoid grids for compound CRSs
    #[arg(long, env = "WEBPROJ_GRID_DIR", global = true)]
    pub grid_dir: Option<PathBuf>,
}

/// Build the service, falling back to the bundled registry.
pub fn build_service(options: &ServiceOptions) -> Result<TransformService> {
    let mut builder = TransformServiceBuilder::new();
    if let Some(path) = &options.crs_file {
        builder = builder.crs_file(path);
    }
    if let Some(dir) = &options.grid_dir {
        builder = builder.grid_dir(dir);
    }
    builder
        .build()
        .context("Failed to create transformation service")
}

/// Format an optional component, `null` when absent.
pub fn format_component(value: Option<f64>) -> String {
    value.map_or_else(|| "null".to_string(), |v| v.to_string())
}
