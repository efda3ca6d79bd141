//! memoproxy CLI binary: run inputs through a demo model behind a caching proxy.
//!
//! Prints one line per input (`<output>\t(<hit|miss>)`) and a stats line, or a JSON report
//! with `--json`.

mod log_format;
mod logging;

use clap::Parser;
use cli::{RunOptions, RunReport};
use memoproxy::ModelKind;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "memoproxy")]
#[command(about = "memoproxy — run inputs through a cached demo model")]
struct Args {
    /// Inputs, in request order. Repeat one to see a cache hit.
    #[arg(required = true, value_name = "INPUT")]
    inputs: Vec<String>,

    /// Demo model: echo or sentiment (default: MEMOPROXY_MODEL, else echo)
    #[arg(short, long, value_name = "MODEL")]
    model: Option<ModelKind>,

    /// Reject empty or whitespace-only inputs before they reach the cache
    #[arg(long)]
    validate: bool,

    /// Verbose: write debug logs (cache hit/miss) to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Print the whole report as JSON
    #[arg(long)]
    json: bool,

    /// When using --json, write output to this file instead of stdout
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// When using --json, pretty-print (multi-line). Default: one line
    #[arg(long)]
    pretty: bool,
}

/// Writes JSON to stdout or to the given file.
fn write_json_output(
    value: &serde_json::Value,
    file: Option<&std::path::Path>,
    pretty: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let s = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    match file {
        Some(path) => std::fs::write(path, format!("{}\n", s))?,
        None => {
            println!("{}", s);
            std::io::Write::flush(&mut std::io::stdout())?;
        }
    }
    Ok(())
}

fn print_text(report: &RunReport) {
    for record in &report.results {
        match (record.output_text(), record.status, &record.error) {
            (Some(output), Some(status), _) => println!("{}\t({})", output, status),
            (_, _, Some(err)) => eprintln!("error: {:?}: {}", record.input, err),
            _ => {}
        }
    }
    println!("{}", report.summary_line());
}

fn resolve_model(args: &Args, settings: &config::Settings) -> Result<ModelKind, String> {
    if let Some(kind) = args.model {
        return Ok(kind);
    }
    match settings.model.as_deref() {
        Some(name) => name.parse(),
        None => Ok(ModelKind::default()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    config::load_and_apply("memoproxy", None::<&std::path::Path>).ok();
    let settings = config::Settings::from_env();

    let args = Args::parse();
    logging::init(args.verbose, settings.log_file.as_deref())?;

    let model = match resolve_model(&args, &settings) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("memoproxy: {}", e);
            std::process::exit(2);
        }
    };
    let opts = RunOptions {
        model,
        validate: args.validate || settings.validate,
    };

    let report = cli::run(&args.inputs, &opts).await;

    if args.json {
        let value = serde_json::to_value(&report)?;
        write_json_output(&value, args.file.as_deref(), args.pretty)?;
    } else {
        print_text(&report);
    }

    if report.has_failures() {
        std::process::exit(1);
    }
    Ok(())
}
