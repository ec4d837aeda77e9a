use anyhow::{bail, Context, Result};
use chrono::NaiveTime;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use data_loader::{Roster, ALL_SENTINEL};
use ml_client::GrpcEngagementClient;
use pipeline::{parse_time_of_day, ResultRow, SelectionRequest, WindowPolicy, COLUMN_HEADERS};
use server::{AvailabilityService, QueryResult};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;

/// Roster availability - which doctors were active in a time window
#[derive(Parser)]
#[command(name = "roster-avail")]
#[command(about = "Find doctors available in a time window, labelled by an engagement model", long_about = None)]
struct Cli {
    /// Path to the roster CSV export
    #[arg(short, long, env = "ROSTER_DATA", default_value = "data/roster.csv")]
    data: PathBuf,

    /// Address of the engagement model service
    #[arg(long, env = "ENGAGEMENT_MODEL_ADDR", default_value = "http://localhost:50051")]
    model_addr: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List doctors available in a time window
    Available {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Write the result workbook into this directory
        #[arg(long)]
        export: Option<PathBuf>,

        /// Print rows as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show the choices accepted by --speciality, --region and --state
    Options,

    /// Show roster statistics
    Summary,

    /// Run a query repeatedly and report latencies
    Benchmark {
        /// Number of queries to run
        #[arg(long, default_value = "1000")]
        requests: usize,

        /// Number of concurrent workers
        #[arg(long, default_value = "4")]
        concurrent: usize,
    },
}

#[derive(Args)]
struct SelectionArgs {
    /// Start of the window (HH:MM or HH:MM:SS)
    #[arg(long, default_value = "06:00", value_parser = parse_time_arg)]
    start: NaiveTime,

    /// End of the window (HH:MM or HH:MM:SS)
    #[arg(long, default_value = "23:59", value_parser = parse_time_arg)]
    end: NaiveTime,

    #[arg(long, default_value = ALL_SENTINEL)]
    speciality: String,

    #[arg(long, default_value = ALL_SENTINEL)]
    region: String,

    #[arg(long, default_value = ALL_SENTINEL)]
    state: String,

    /// Only keep doctors the model labelled engaged
    #[arg(long)]
    engaged_only: bool,

    /// Treat a window whose end precedes its start as crossing midnight
    #[arg(long)]
    wrap_midnight: bool,
}

impl SelectionArgs {
    fn into_request(self) -> SelectionRequest {
        SelectionRequest {
            start: self.start,
            end: self.end,
            speciality: self.speciality,
            region: self.region,
            state: self.state,
            policy: if self.wrap_midnight {
                WindowPolicy::WrapMidnight
            } else {
                WindowPolicy::Strict
            },
            engaged_only: self.engaged_only,
        }
    }
}

fn parse_time_arg(s: &str) -> std::result::Result<NaiveTime, String> {
    parse_time_of_day(s).ok_or_else(|| format!("'{}' is not a time of day (expected HH:MM or HH:MM:SS)", s))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // The vocabulary needs no model; everything else needs labels
    if let Commands::Options = cli.command {
        let roster = Roster::load_from_file(&cli.data).context("Failed to load roster")?;
        return handle_options(AvailabilityService::from_roster(roster.into()));
    }

    println!("Loading roster from {}...", cli.data.display());
    let start = Instant::now();
    let client = GrpcEngagementClient::connect(cli.model_addr.as_str())
        .await
        .context("Failed to reach the engagement model")?;
    let service = AvailabilityService::load_from_file(&cli.data, &client).await?;
    println!(
        "{} Loaded and labelled {} records in {:?}",
        "✓".green(),
        service.roster().len(),
        start.elapsed()
    );

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Available {
            selection,
            export,
            json,
        } => handle_available(&service, selection.into_request(), export, json)?,
        Commands::Summary => handle_summary(&service),
        Commands::Benchmark {
            requests,
            concurrent,
        } => handle_benchmark(service, requests, concurrent).await?,
        Commands::Options => handle_options(service)?,
    }

    Ok(())
}

/// Handle the 'available' command
fn handle_available(
    service: &AvailabilityService,
    request: SelectionRequest,
    export: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let result = service.run(&request)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result.rows)?);
    } else {
        print_result(&result);
    }

    if let Some(dir) = export {
        match service.export(&result)? {
            Some(artifact) => {
                let path = artifact.write_to_dir(&dir)?;
                println!("{} Exported {} rows to {}", "✓".green(), result.len(), path.display());
            }
            None => println!("{}", "Nothing to export.".yellow()),
        }
    }
    Ok(())
}

/// Handle the 'options' command
fn handle_options(service: AvailabilityService) -> Result<()> {
    for (field, choices) in service.options() {
        println!("{}", format!("{}:", field).bold().blue());
        for choice in choices {
            println!("  {} {}", "•".green(), choice);
        }
    }
    Ok(())
}

/// Handle the 'summary' command
fn handle_summary(service: &AvailabilityService) {
    let stats = service.roster().stats();

    println!("{}", "Roster summary".bold().blue());
    println!("{}Records: {}", "• ".green(), stats.records);
    println!("{}Engaged: {}", "• ".green(), stats.engaged);
    println!("{}Specialities: {}", "• ".cyan(), stats.specialities);
    println!("{}Regions: {}", "• ".cyan(), stats.regions);
    println!("{}States: {}", "• ".cyan(), stats.states);

    if stats.negative_durations > 0 {
        println!("{}Negative session durations: {}", "• ".yellow(), stats.negative_durations);
    }
    if stats.duplicate_ids > 0 {
        println!("{}Repeated NPIs: {}", "• ".yellow(), stats.duplicate_ids);
    }
}

/// Handle the 'benchmark' command
async fn handle_benchmark(service: AvailabilityService, requests: usize, concurrent: usize) -> Result<()> {
    if requests == 0 || concurrent == 0 {
        bail!("--requests and --concurrent must be at least 1");
    }

    // Random speciality per query, drawn from the roster's own vocabulary
    let specialities: Vec<String> = service
        .options()
        .into_iter()
        .next()
        .map(|(_, choices)| choices.into_iter().map(str::to_string).collect())
        .unwrap_or_default();
    let requests: Vec<SelectionRequest> = (0..requests)
        .map(|_| SelectionRequest {
            speciality: specialities[rand::random::<u32>() as usize % specialities.len()].clone(),
            ..SelectionRequest::default()
        })
        .collect();
    let total = requests.len();
    info!("Running {} queries on {} workers", total, concurrent);

    // Queries are CPU-bound; run each worker's share on the blocking pool
    let started = Instant::now();
    let chunk = total.div_ceil(concurrent);
    let mut handles = vec![];
    for batch in requests.chunks(chunk).map(<[SelectionRequest]>::to_vec) {
        let service = service.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            batch
                .iter()
                .map(|request| -> Result<Duration> {
                    let start = Instant::now();
                    service.run(request)?;
                    Ok(start.elapsed())
                })
                .collect::<Result<Vec<Duration>>>()
        }));
    }

    let mut timings = Vec::with_capacity(total);
    for handle in handles {
        timings.extend(handle.await.context("Benchmark worker panicked")??);
    }
    let wall_time = started.elapsed();

    timings.sort();
    let percentile = |p: f64| timings[((timings.len() as f64 * p) as usize).min(timings.len() - 1)];
    let busy: Duration = timings.iter().sum();

    println!("{}", "Benchmark results:".bold().blue());
    println!("Total time: {:?}", wall_time);
    println!("Average latency: {:?}", busy / timings.len() as u32);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!("Throughput: {:.2} queries/second", total as f64 / wall_time.as_secs_f64());

    Ok(())
}

/// Print the result table, or the empty message
fn print_result(result: &QueryResult) {
    if result.is_empty() {
        println!("{}", QueryResult::EMPTY_MESSAGE.yellow());
        return;
    }

    println!(
        "{}",
        format!(
            "Available doctors between {} and {}:",
            result.window.start.format("%H:%M"),
            result.window.end.format("%H:%M")
        )
        .bold()
        .blue()
    );
    println!("{}", COLUMN_HEADERS.join(" | ").bold());
    for row in &result.rows {
        print_row(row);
    }
    println!("{} rows", result.len().to_string().green());
}

fn print_row(row: &ResultRow) {
    println!(
        "{} | {} | {} | {} | {:.1} | {} | {}",
        row.npi.to_string().green(),
        row.state,
        row.region,
        row.speciality,
        row.usage_time_mins,
        row.survey_attempts,
        row.time_slot.cyan()
    );
}
