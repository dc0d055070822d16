use std::path::PathBuf;

use anyhow::{Context, Result};
use choropleth_core::config::DEFAULT_SEED;
use choropleth_core::geometry::GeometryProvider;
use choropleth_core::storage::write_value_table;
use choropleth_core::synthetic::generate_synthetic_values;
use choropleth_core::Granularity;

#[derive(clap::Args, Debug)]
pub struct GenerateArgs {
    /// state, world (country) or county
    #[arg(long)]
    granularity: Granularity,
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,
    /// Destination `region,value` CSV
    #[arg(long)]
    out: PathBuf,
}

pub fn handle_generate(args: GenerateArgs, provider: &dyn GeometryProvider) -> Result<()> {
    let geometry = provider
        .load(args.granularity)
        .with_context(|| format!("failed to load {} geometry", args.granularity))?;
    let records = generate_synthetic_values(geometry.region_keys()?, args.seed);
    let stored = write_value_table(&args.out, &records)
        .with_context(|| format!("failed to write {}", args.out.display()))?;

    println!(
        "Wrote {} synthetic {} values (seed {}) to {}",
        stored.rows,
        args.granularity,
        args.seed,
        stored.path.display()
    );
    println!("  blake3: {}", stored.digest);
    Ok(())
}
