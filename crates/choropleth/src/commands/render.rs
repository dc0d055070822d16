use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use choropleth_core::config::PipelineConfig;
use choropleth_core::geometry::GeometryProvider;
use choropleth_core::pipeline::run_pipeline;
use choropleth_core::values::TieBreak;
use choropleth_core::Granularity;

use super::report_table;

#[derive(clap::Args, Debug)]
pub struct RenderArgs {
    /// TOML pipeline config; flags below override its fields
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    granularity: Option<Granularity>,
    /// Value table to read, or to create from synthetic values when absent
    #[arg(long)]
    values: Option<PathBuf>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    tie_break: Option<TieBreak>,
    /// Destination PNG
    #[arg(long)]
    out: Option<PathBuf>,
    #[arg(long)]
    title: Option<String>,
}

pub fn handle_render(args: RenderArgs, provider: &dyn GeometryProvider) -> Result<()> {
    let config = build_config(args)?;
    let outcome = run_pipeline(&config, provider).context("pipeline run failed")?;

    println!("{}", report_table(&outcome.report));
    println!(
        "Rendered {}x{} px {} map to {}",
        outcome.width,
        outcome.height,
        outcome.granularity,
        outcome.output_path.display()
    );
    if !outcome.report.is_complete() {
        println!(
            "  {} regions had no value and were drawn in the missing color.",
            outcome.report.unmatched_geometry_regions.len()
        );
    }
    Ok(())
}

fn build_config(args: RenderArgs) -> Result<PipelineConfig> {
    let mut config = match (&args.config, args.granularity, &args.out) {
        (Some(path), _, _) => PipelineConfig::from_path(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        (None, Some(granularity), Some(out)) => PipelineConfig::new(granularity, out.clone()),
        (None, _, _) => bail!("either --config or both --granularity and --out are required"),
    };

    if let Some(granularity) = args.granularity {
        config.granularity = granularity;
    }
    if let Some(out) = args.out {
        config.output_path = out;
    }
    if let Some(values) = args.values {
        config.values_path = Some(values);
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(tie_break) = args.tie_break {
        config.tie_break = tie_break;
    }
    if let Some(title) = args.title {
        config.style.title = Some(title);
    }
    Ok(config)
}
