//! Example of crawling a network and printing the discovered topology.

use clap::Parser;
use log::LevelFilter;
use peermap_crawler::{CrawlerBuilder, NodeOutcome};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Bootstrap addresses to start crawling from.
    #[arg(required = true)]
    seeds: Vec<String>,

    /// Maximum number of concurrent probes per layer.
    #[arg(short, long, default_value = "20")]
    concurrent_tasks: usize,

    /// Per-call timeout in seconds.
    #[arg(short, long, default_value = "10")]
    timeout: u64,

    /// Port assumed for addresses announced without one.
    #[arg(short, long, default_value = "8123")]
    port: u16,

    /// Log level.
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_level = match args.log_level.to_lowercase().as_str() {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    };

    // Configure fern logger
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}] {} - {}",
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log_level)
        .chain(std::io::stderr())
        .apply()
        .unwrap();

    log::info!("MAPPING THE PEER-TO-PEER NETWORK");

    let crawler = CrawlerBuilder::new()
        .with_max_concurrent_tasks(args.concurrent_tasks)
        .with_peer_timeout(Duration::from_secs(args.timeout))
        .with_default_port(args.port)
        .build();

    let topology = crawler.crawl(&args.seeds).await?;

    let mut nodes: Vec<_> = topology.iter().collect();
    nodes.sort_by_key(|(address, _)| address.to_string());

    for (address, outcome) in nodes {
        match outcome {
            NodeOutcome::Reachable(record) => {
                let country = record
                    .geo
                    .as_ref()
                    .map(|geo| geo.country_code.as_str())
                    .unwrap_or("??");
                println!(
                    "{address}\tversion={}\tcountry={country}\tpeers={}",
                    record.version,
                    record.peers.len()
                );
            }
            NodeOutcome::Unreachable => println!("{address}\tunreachable"),
        }
    }

    println!(
        "{} nodes discovered, {} unreachable",
        topology.len(),
        topology.unreachable_count()
    );

    Ok(())
}
