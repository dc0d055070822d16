use std::path::PathBuf;

use anyhow::{Context, Result};
use choropleth_core::geometry::GeometryProvider;
use choropleth_core::join::join_to_geometry;
use choropleth_core::storage::{read_value_table, write_joined_table};
use choropleth_core::values::{deduplicate_regions, TieBreak};
use choropleth_core::Granularity;

use super::report_table;

#[derive(clap::Args, Debug)]
pub struct JoinArgs {
    #[arg(long)]
    granularity: Granularity,
    /// `region,value` CSV to join
    #[arg(long)]
    values: PathBuf,
    /// error, keep-first, keep-last or mean
    #[arg(long, default_value_t = TieBreak::Error)]
    tie_break: TieBreak,
    /// Write the joined vertex table here
    #[arg(long)]
    out: Option<PathBuf>,
    /// Print the report as JSON instead of a table
    #[arg(long)]
    json: bool,
}

pub fn handle_join(args: JoinArgs, provider: &dyn GeometryProvider) -> Result<()> {
    let geometry = provider
        .load(args.granularity)
        .with_context(|| format!("failed to load {} geometry", args.granularity))?;
    let (values, _) = read_value_table(&args.values)
        .with_context(|| format!("failed to read {}", args.values.display()))?;

    let values = deduplicate_regions(&values, args.granularity, args.tie_break)?;
    let joined = join_to_geometry(&values, &geometry, args.granularity)?;

    if let Some(out) = &args.out {
        write_joined_table(out, &joined.df)
            .with_context(|| format!("failed to write {}", out.display()))?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&joined.report)?);
    } else {
        println!("{}", report_table(&joined.report));
    }
    Ok(())
}
