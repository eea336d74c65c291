//! CLI host for the prediction cascade: load a cohort CSV, run every
//! applicable model, print the portfolio summary, optionally write the
//! enriched table back out.

use roas_forecast::{CascadeDispatcher, CohortLoader, ModelRegistry};
use std::env;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("usage: predict_roas <input.csv> <models-dir> [output.csv]");
        process::exit(2);
    }

    if let Err(e) = run(&args[1], &args[2], args.get(3).map(String::as_str)) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn run(input: &str, models_dir: &str, output: Option<&str>) -> roas_forecast::Result<()> {
    let registry = ModelRegistry::load_dir(models_dir)?;
    let data = CohortLoader::from_csv(input)?;

    let mut outcome = CascadeDispatcher::new(&registry).run(data)?;

    println!("Last observed ROAS day: {}", outcome.last_day);
    for warning in &outcome.warnings {
        println!("warning: {warning}");
    }
    print!("{}", outcome.summary);

    if let Some(path) = output {
        outcome.data.write_csv_path(path)?;
        println!("Predictions written to {path}");
    }

    Ok(())
}
