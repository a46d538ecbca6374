//! Headless erosion runner: reset from a seed, run a batch of ticks and
//! print the mass budget as it evolves.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rill_core::util::Timed;
use rill_core::{ErosionParams, RainSchedule, Simulator, TickReport};

#[derive(Parser, Debug)]
#[command(name = "rill", version, about = "Headless hydraulic and thermal erosion runner")]
struct Args {
    /// Seed for terrain, sources and raindrops.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Ticks to run.
    #[arg(short = 'n', long, default_value_t = 1000)]
    steps: u32,

    /// Parameter file (JSON, missing fields take their defaults).
    #[arg(short, long, value_name = "FILE")]
    params: Option<PathBuf>,

    /// Override grid width.
    #[arg(long)]
    width: Option<usize>,

    /// Override grid height.
    #[arg(long)]
    height: Option<usize>,

    /// Constant rain multiplier. Ignored with --pulsed.
    #[arg(long, default_value_t = 1.0)]
    rain: f64,

    /// Use the pulsed storm cycle instead of constant rain.
    #[arg(long)]
    pulsed: bool,

    /// Print a report line every N ticks (0 = only at the end).
    #[arg(long, default_value_t = 100)]
    report_every: u32,

    /// Write the final snapshot as JSON.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

fn load_params(args: &Args) -> Result<ErosionParams> {
    let mut params = match &args.params {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("reading parameter file {}", path.display()))?;
            ErosionParams::from_json(&json).with_context(|| format!("parsing {}", path.display()))?
        }
        None => ErosionParams::default(),
    };
    if let Some(w) = args.width {
        params.width = w;
    }
    if let Some(h) = args.height {
        params.height = h;
    }
    Ok(params)
}

fn print_report(r: &TickReport) {
    let norm = r.normalization.map_or_else(|| "-".to_string(), |f| format!("{f:.6}"));
    println!(
        "{:>8}  {:>12.6}  {:>12.4e}  {:>12.6}  {:>10.4}  {:>10}",
        r.step, r.bedrock, r.sediment, r.water, r.max_speed, norm
    );
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let params = load_params(&args)?;
    let schedule = if args.pulsed {
        RainSchedule::storms()
    } else {
        RainSchedule::Constant { multiplier: args.rain }
    };

    let mut sim = Simulator::new(params, args.seed).context("invalid simulation parameters")?;
    let (w, h) = (sim.params().width, sim.params().height);
    log::info!("{w}×{h} grid, seed {}, {} sources", args.seed, sim.state().sources.len());

    println!(
        "{:>8}  {:>12}  {:>12}  {:>12}  {:>10}  {:>10}",
        "step", "bedrock", "sediment", "water", "max |v|", "norm"
    );
    let chunk = if args.report_every == 0 { args.steps } else { args.report_every };
    {
        let _t = Timed::info(format!("{} ticks", args.steps));
        let mut remaining = args.steps;
        while remaining > 0 {
            let n = chunk.min(remaining);
            let report = sim.tick_scheduled(n, &schedule);
            print_report(&report);
            remaining -= n;
        }
    }

    if let Some(path) = &args.output {
        let json = serde_json::to_string(&sim.snapshot()).context("serializing snapshot")?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}
