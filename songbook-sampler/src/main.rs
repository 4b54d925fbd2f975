use clap::{Parser, ValueEnum};
use songbook_client::{Client, ClientConfig};
use songbook_common::{ApiConfig, Resource, DEFAULT_BASE_URL};
use songbook_sampler::logging::init_logging;
use songbook_sampler::{SampleRun, Sampler, StopReason};
use std::process;
use std::time::Duration;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ResourceArg {
    Users,
    Playlists,
    Songs,
}

#[derive(Parser, Debug)]
#[command(name = "songbook-sample", about = "Time repeated list calls against the Songbook API")]
struct Args {
    /// API root URL
    #[arg(long, env = "SONGBOOK_API_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Path to a JSON file with `{"base_url": ...}`; overrides --base-url
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Collection whose list endpoint is sampled
    #[arg(long, value_enum, default_value = "users")]
    resource: ResourceArg,

    /// Maximum number of calls
    #[arg(long, default_value_t = 100)]
    count: u32,

    /// Time budget for the whole run (milliseconds)
    #[arg(long, default_value_t = 120_000)]
    duration_ms: u64,

    /// Give up on a single call after this many milliseconds
    #[arg(long)]
    call_timeout_ms: Option<u64>,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let api = match &args.config {
        Some(path) => ApiConfig::load(path).unwrap_or_else(|e| {
            eprintln!("Could not load config: {e}");
            process::exit(3);
        }),
        None => ApiConfig { base_url: args.base_url.clone() },
    };

    let resource = match args.resource {
        ResourceArg::Users => Resource::Users,
        ResourceArg::Playlists => Resource::Playlists,
        ResourceArg::Songs => Resource::Songs,
    };

    let mut sampler = Sampler::new();
    if let Some(ms) = args.call_timeout_ms {
        sampler = sampler.with_call_timeout(Duration::from_millis(ms));
    }

    let client = Client::new(ClientConfig { base_url: api.base_url.clone() });
    let endpoint = client.resource(resource);

    println!("Sampling GET {}", client.build_collection_url(resource));

    let run = sampler
        .sample(args.count, || endpoint.list(), Duration::from_millis(args.duration_ms))
        .await
        .unwrap_or_else(|e| {
            eprintln!("Invalid sampler settings: {e}");
            process::exit(3);
        });

    print_report(&api, resource, &run);

    process::exit(if run.average_ms().is_some() { 0 } else { 1 });
}

fn print_report(api: &ApiConfig, resource: Resource, run: &SampleRun) {
    let stopped_by = match run.stop_reason() {
        StopReason::CountExhausted => "count exhausted",
        StopReason::TimeBoxExpired => "time budget expired",
    };

    println!();
    println!("Songbook Sampler Results");
    println!("========================");
    println!("Endpoint:              GET {}/{}", api.base_url.trim_end_matches('/'), resource);
    println!("Requested calls:       {}", run.requested_count());
    println!("Time budget:           {:.1} s", run.max_duration().as_secs_f64());
    println!("Pacing:                {} ms", run.pacing().as_millis());
    println!();
    println!("Attempted calls:       {}", run.iterations());
    println!("Successful samples:    {}", run.response_times_ms().len());
    println!("Failed calls:          {}", run.failures().len());
    println!("Elapsed:               {:.1} s", run.elapsed().as_secs_f64());
    println!("Stopped by:            {}", stopped_by);
    println!();
    match run.average_ms() {
        Some(avg) => println!("Average latency:       {:.2} ms", avg),
        None => println!("Average latency:       no data (no call succeeded)"),
    }
}
