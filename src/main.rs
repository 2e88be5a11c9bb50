use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use job_finder::{JobFinder, ScrapeOptions, SearchQuery, browser};

/// Search USNLX and print the listings as JSON
#[derive(Debug, Parser)]
#[command(name = "job-finder", version)]
struct Args {
    /// Job role or title to search for
    #[arg(long, default_value = "")]
    role: String,

    /// City name or "City, State"
    #[arg(long, default_value = "")]
    city: String,

    /// Search radius in miles
    #[arg(long)]
    radius: Option<u32>,

    /// Only keep titles containing one of these keywords
    #[arg(long = "include")]
    include: Vec<String>,

    /// Drop titles containing any of these keywords
    #[arg(long = "exclude")]
    exclude: Vec<String>,

    /// Visit every listing for pay, benefits and description
    #[arg(long)]
    details: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut query = SearchQuery::new(args.role, args.city)
        .including(args.include)
        .excluding(args.exclude);
    query.radius_miles = args.radius;

    let options = ScrapeOptions::from_env()?;
    let finder = JobFinder::usnlx(options.clone())?;

    // Validate before paying for a browser launch
    query.validate()?;
    let session = browser::launch(&options).await?;

    let json = if args.details {
        let jobs = finder.scrape_detailed(session, &query).await?;
        info!("Retrieved {} jobs with details", jobs.len());
        to_json(&jobs, args.pretty)?
    } else {
        let jobs = finder.scrape(session, &query).await?;
        info!("Retrieved {} jobs", jobs.len());
        to_json(&jobs, args.pretty)?
    };

    println!("{json}");
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}
