use std::{env, process::ExitCode};

use anyhow::ensure;
use bandit::{
    codec::{self, Format},
    latency,
};
use tracing::error;
use tracing_subscriber::EnvFilter;

// Usage: cargo run --example generate -- <latency.csv> [outpath] [format]
fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut args = env::args().skip(1);
    let Some(input) = args.next() else {
        eprintln!("usage: generate <latency.csv> [outpath] [format]");
        return ExitCode::FAILURE;
    };
    let outpath = args.next().unwrap_or_else(|| "topology.json".to_owned());
    let format = args.next().unwrap_or_else(|| Format::Json.to_string());

    match run(&input, &outpath, &format) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(input: &str, outpath: &str, format: &str) -> anyhow::Result<()> {
    // Reject the format before doing any work.
    let format: Format = format.parse()?;

    let graph = latency::from_path(input)?;
    println!("{graph}");

    codec::write_graph(&graph, outpath, format)?;
    println!("{format} written to {outpath}");

    // Read the file back to make sure it's usable by downstream tools.
    let reloaded = codec::read_graph(outpath, format)?;
    ensure!(
        reloaded == graph,
        "{outpath} does not read back as the written graph"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/testdata/latency.csv");

    #[test]
    fn run_writes_and_verifies_each_format() {
        let dir = tempfile::TempDir::new().unwrap();

        for format in Format::ALL {
            let outpath = dir.path().join(format!("topology.{format}"));
            let outpath = outpath.to_str().unwrap();

            run(FIXTURE, outpath, format.name()).unwrap();
            assert_eq!(
                codec::read_graph(outpath, format).unwrap(),
                latency::from_path(FIXTURE).unwrap()
            );
        }
    }

    #[test]
    fn run_reports_failures_as_errors() {
        let dir = tempfile::TempDir::new().unwrap();
        let outpath = dir.path().join("topology.json");
        let outpath = outpath.to_str().unwrap();

        assert!(run(FIXTURE, outpath, "yaml").is_err());
        assert!(run("/nonexistent/latency.csv", outpath, "json").is_err());
    }
}
