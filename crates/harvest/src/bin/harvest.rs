// ABOUTME: CLI binary for Harvest: looks up records of a schema from a JSON definition file.
// ABOUTME: Fetches a path (or parses a local HTML file) and prints the records as JSON.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use digests_harvest::{Client, HarvestError, Record, SchemaCatalog};
use serde_json::{Map, Value};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "harvest")]
#[command(about = "Extract structured records from HTML pages")]
struct Args {
    /// JSON file with schema definitions
    #[arg(short = 's', long = "schemas")]
    schemas: PathBuf,

    /// Name of the schema to look up
    #[arg(short = 'i', long = "item")]
    item: String,

    /// Path resolved against the schema's base_url (default: the base_url itself)
    #[arg(default_value = "")]
    path: String,

    /// Parse a local HTML file instead of fetching
    #[arg(long = "html")]
    html: Option<PathBuf>,

    /// Print only the record at this index
    #[arg(long = "index")]
    index: Option<usize>,

    /// Related members to resolve and nest in the output
    #[arg(short = 'e', long = "expand")]
    expand: Vec<String>,

    /// Output file path (default: stdout)
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Print elapsed time in ms to stderr
    #[arg(long = "timing")]
    timing: bool,

    /// Log lookups and fetches to stderr
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let fallback = if verbose {
        "digests_harvest=debug,harvest=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// Serialize a record, nesting the requested related members.
fn record_json(record: &Record, expand: &[String]) -> Result<Value, HarvestError> {
    let mut object = Map::new();
    for (name, value) in record.fields() {
        object.insert(name.to_string(), value.clone());
    }
    for name in expand {
        let related = record.related(name)?;
        let nested = related
            .iter()
            .map(|r| record_json(r, &[]))
            .collect::<Result<Vec<_>, _>>()?;
        object.insert(name.clone(), Value::Array(nested));
    }
    Ok(Value::Object(object))
}

fn run(args: &Args) -> Result<String, HarvestError> {
    let catalog = SchemaCatalog::from_path(&args.schemas)?;
    let schema = catalog.get(&args.item).ok_or_else(|| {
        HarvestError::unknown_member(args.item.clone(), "Load")
    })?;
    let client = Client::builder().build();

    let records = match &args.html {
        Some(path) => {
            let html = fs::read(path).map_err(|e| {
                HarvestError::invalid_source(
                    path.display().to_string(),
                    "Read",
                    Some(anyhow::anyhow!(e)),
                )
            })?;
            schema.all_from(&client, html)?
        }
        None => match args.index {
            Some(index) => vec![schema.one(&client, &args.path, index)?],
            None => schema.all(&client, &args.path)?,
        },
    };

    let output = match args.index {
        Some(index) if args.html.is_some() => {
            let record = records
                .get(index)
                .ok_or_else(|| HarvestError::record_not_found(schema.name(), index))?;
            record_json(record, &args.expand)?
        }
        Some(_) => record_json(&records[0], &args.expand)?,
        None => Value::Array(
            records
                .iter()
                .map(|r| record_json(r, &args.expand))
                .collect::<Result<Vec<_>, _>>()?,
        ),
    };

    serde_json::to_string_pretty(&output).map_err(|e| {
        HarvestError::invalid_source(schema.name(), "Serialize", Some(anyhow::anyhow!(e)))
    })
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let start = Instant::now();
    let mut had_error = false;

    match run(&args) {
        Ok(output) => {
            if let Some(output_path) = &args.output {
                if let Err(e) = fs::write(output_path, &output) {
                    eprintln!("error writing to {:?}: {}", output_path, e);
                    had_error = true;
                }
            } else {
                println!("{}", output);
            }
        }
        Err(e) => {
            eprintln!("error: {}", e);
            had_error = true;
        }
    }

    if args.timing {
        let _ = writeln!(io::stderr(), "elapsed: {}ms", start.elapsed().as_millis());
    }

    if had_error {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
