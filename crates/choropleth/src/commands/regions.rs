use anyhow::{Context, Result};
use choropleth_core::geometry::GeometryProvider;
use choropleth_core::Granularity;

#[derive(clap::Args, Debug)]
pub struct RegionsArgs {
    #[arg(long)]
    granularity: Granularity,
}

pub fn handle_regions(args: RegionsArgs, provider: &dyn GeometryProvider) -> Result<()> {
    let geometry = provider
        .load(args.granularity)
        .with_context(|| format!("failed to load {} geometry", args.granularity))?;
    for key in geometry.region_keys()? {
        println!("{key}");
    }
    Ok(())
}
