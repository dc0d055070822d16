// crates/choropleth/src/main.rs

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
use commands::generate::{handle_generate, GenerateArgs};
use commands::join::{handle_join, JoinArgs};
use commands::regions::{handle_regions, RegionsArgs};
use commands::render::{handle_render, RenderArgs};

/// Join region values onto map geometry and render choropleths
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Directory holding `<granularity>.csv` / `.geojson` geometry files.
    /// Falls back to CHOROPLETH_GEOMETRY_DIR.
    #[arg(long, global = true)]
    geometry_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a seeded synthetic value table for every region of a granularity
    Generate(GenerateArgs),
    /// Join a value table onto geometry and print the coverage report
    Join(JoinArgs),
    /// Run the full pipeline and write a PNG
    Render(RenderArgs),
    /// List the distinct region keys of a granularity
    Regions(RegionsArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let geometry_dir = cli
        .geometry_dir
        .or_else(|| env::var_os("CHOROPLETH_GEOMETRY_DIR").map(PathBuf::from))
        .context("--geometry-dir (or CHOROPLETH_GEOMETRY_DIR) must be set")?;
    let provider = commands::provider(&geometry_dir)?;

    match cli.command {
        Command::Generate(args) => handle_generate(args, &provider),
        Command::Join(args) => handle_join(args, &provider),
        Command::Render(args) => handle_render(args, &provider),
        Command::Regions(args) => handle_regions(args, &provider),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn geometry_dir_is_accepted_after_the_subcommand() {
        let cli = Cli::try_parse_from([
            "choropleth",
            "regions",
            "--granularity",
            "country",
            "--geometry-dir",
            "maps",
        ])
        .unwrap();
        assert_eq!(cli.geometry_dir, Some(PathBuf::from("maps")));
        assert!(matches!(cli.command, Command::Regions(_)));
    }
}
