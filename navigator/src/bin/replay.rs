use std::{
    io::{self, BufWriter, Write},
    path::PathBuf,
    sync::Arc,
};

use clap::Parser;
use navigator::{
    NavigatorConfig, Resolver,
    replay::{load_fixes_file, replay_route},
    route::load_route_file,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Replay recorded location fixes against a route and print the instruction shown at each fix"
)]
struct Args {
    /// Directions payload (JSON with a `steps` array)
    #[arg(long)]
    route: PathBuf,

    /// Recorded fixes: a .gpx track, or JSON lines of `[lon, lat]`
    #[arg(long)]
    track: PathBuf,

    /// Overrides NAV_SPATIAL_INDEX_THRESHOLD
    #[arg(long)]
    spatial_index_threshold: Option<usize>,

    /// Overrides NAV_ARRIVAL_INSTRUCTION
    #[arg(long)]
    arrival_instruction: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "navigator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();
    let mut config = NavigatorConfig::from_env()?;
    if let Some(threshold) = args.spatial_index_threshold {
        config.spatial_index_threshold = threshold;
    }
    if let Some(arrival) = args.arrival_instruction {
        config.arrival_instruction = arrival;
    }

    let route = load_route_file(&args.route)?;
    tracing::info!("loaded route from {:?}", args.route);
    let fixes = load_fixes_file(&args.track)?;
    tracing::info!("loaded {} fixes from {:?}", fixes.len(), args.track);

    let states = replay_route(Resolver::new(config), Arc::new(route), fixes);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for state in &states {
        serde_json::to_writer(&mut out, state)?;
        writeln!(out)?;
    }
    out.flush()?;

    Ok(())
}
