use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::ServiceOptions;

/// Coordinate transformation CLI tool
#[derive(Parser)]
#[command(name = "webproj")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    service: ServiceOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Transform a single coordinate
    Trans {
        /// Source CRS identifier (e.g., EPSG:4258)
        src: String,

        /// Destination CRS identifier (e.g., EPSG:25832)
        dst: String,

        /// Comma separated coordinate (e.g., 56.0,12.0)
        #[arg(allow_hyphen_values = true)]
        coords: String,

        /// Output result as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Transform every row of a CSV file
    Batch {
        /// Input CSV file
        input: PathBuf,

        /// Source CRS identifier
        #[arg(long)]
        src: String,

        /// Destination CRS identifier
        #[arg(long)]
        dst: String,

        /// Output file (`<input>_<dst>.csv` if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Column name for the first coordinate component
        #[arg(long, default_value = "v1")]
        x_col: String,

        /// Column name for the second coordinate component
        #[arg(long, default_value = "v2")]
        y_col: String,

        /// Column name for the height component
        #[arg(long)]
        z_col: Option<String>,

        /// Column name for the time component (requires --z-col)
        #[arg(long, requires = "z_col")]
        t_col: Option<String>,
    },

    /// Describe a CRS
    Info {
        /// CRS identifier (e.g., EPSG:25832)
        srid: String,

        /// Output result as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// List available CRSs grouped by country
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Trans {
            src,
            dst,
            coords,
            json,
        } => commands::trans::run(&cli.service, &src, &dst, &coords, json),
        Commands::Batch {
            input,
            src,
            dst,
            output,
            x_col,
            y_col,
            z_col,
            t_col,
        } => commands::batch::run(
            &cli.service,
            input,
            output,
            &src,
            &dst,
            commands::batch::Columns {
                x: x_col,
                y: y_col,
                z: z_col,
                t: t_col,
            },
        ),
        Commands::Info { srid, json } => commands::info::run(&cli.service, &srid, json),
        Commands::List => commands::list::run(&cli.service),
    }
}
