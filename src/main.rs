//! CaseTrend - case-count CSV analysis & trend chart export
//!
//! Loads a case-count time-series CSV, answers one filter selection and
//! emits the derived views as a dashboard image or JSON.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use casetrend::charts::ChartRenderer;
use casetrend::data::DataLoader;
use casetrend::query::{FilterQuery, QueryEngine};
use casetrend::stats::DeltaBuilder;

#[derive(Parser)]
#[command(name = "casetrend")]
#[command(about = "Case-count time series aggregation & ranking")]
struct Cli {
    /// Input CSV (entity, sub-region, coordinates, one column per date)
    csv: PathBuf,

    /// Entity to query (e.g. a country name)
    #[arg(short, long)]
    entity: Option<String>,

    /// Window start date, YYYY-MM-DD; full range when omitted
    #[arg(long)]
    start: Option<String>,

    /// Window end date, YYYY-MM-DD; full range when omitted
    #[arg(long)]
    end: Option<String>,

    /// Output image path
    #[arg(short, long, default_value = "dashboard.png")]
    output: PathBuf,

    /// Emit the query result as JSON instead of rendering charts
    #[arg(long)]
    json: bool,

    /// Print the entity names known to the loaded table and exit
    #[arg(long)]
    list_entities: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let path = cli.csv.to_string_lossy();
    let cumulative = DataLoader::new()
        .load_csv(&path)
        .with_context(|| format!("loading {}", cli.csv.display()))?;
    info!(
        entities = cumulative.entities().len(),
        dates = cumulative.dates().len(),
        "dataset loaded"
    );

    if cli.list_entities {
        for entity in cumulative.entities() {
            println!("{entity}");
        }
        return Ok(());
    }

    let entity = cli
        .entity
        .context("--entity is required unless --list-entities is given")?;
    let daily = DeltaBuilder::build(&cumulative);
    let query = FilterQuery::parse(&entity, cli.start.as_deref(), cli.end.as_deref())?;
    let result = QueryEngine::run(&cumulative, &daily, &query)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        ChartRenderer::new().render_png(&result, &cli.output)?;
        info!(output = %cli.output.display(), "dashboard rendered");
    }
    Ok(())
}
