use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use geotrace::config::Config;
use geotrace::lookup::{LocationRecord, LookupService};
use serde_json::json;
use std::io::Read;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "geotrace-cli")]
#[command(about = "Bulk IP geolocation from the command line", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve addresses and print results, top 5 and route URL as JSON
    Lookup {
        /// Addresses to resolve (duplicates count towards the top 5)
        addresses: Vec<String>,
        /// Also read whitespace separated addresses from stdin
        #[arg(long)]
        stdin: bool,
    },
    /// Print the directions URL through literal coordinates
    Route {
        /// Points as LAT,LON in travel order
        #[arg(required = true, num_args = 1..)]
        points: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays machine readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("geotrace=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let service = LookupService::from_config(&config)?;

    match cli.command {
        Commands::Lookup {
            mut addresses,
            stdin,
        } => {
            if stdin {
                let mut input = String::new();
                std::io::stdin()
                    .read_to_string(&mut input)
                    .context("failed to read addresses from stdin")?;
                addresses.extend(input.split_whitespace().map(str::to_string));
            }
            if addresses.is_empty() {
                bail!("no addresses given; pass them as arguments or use --stdin");
            }

            let report = service.lookup(&addresses).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Route { points } => {
            let locations = points
                .iter()
                .map(|point| parse_point(point))
                .collect::<Result<Vec<_>>>()?;

            let url = service.routes().build(&locations);
            println!("{}", serde_json::to_string_pretty(&json!({ "route_url": url }))?);
        }
    }

    Ok(())
}

fn parse_point(point: &str) -> Result<LocationRecord> {
    let (lat, lon) = point
        .split_once(',')
        .with_context(|| format!("point '{point}' must look like LAT,LON"))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .with_context(|| format!("invalid latitude in '{point}'"))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .with_context(|| format!("invalid longitude in '{point}'"))?;

    Ok(LocationRecord::from_payload(
        point,
        &json!({ "lat": lat, "lon": lon }),
    ))
}
