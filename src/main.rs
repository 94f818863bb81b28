mod crawler;
mod db;
mod fetch;
mod parser;
mod record;
mod urls;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ark_scraper", about = "Intel CPU specification scraper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl listing pages and store product specifications
    Crawl {
        /// Listing page to start from
        #[arg(long, default_value = crawler::DEFAULT_BASE_URL)]
        base_url: String,
        /// Delay between requests in seconds
        #[arg(short, long, default_value = "1.0")]
        delay: f64,
        /// Max product pages to process (0 = unlimited)
        #[arg(short = 'n', long, default_value = "10")]
        max_pages: usize,
    },
    /// Show store statistics
    Stats,
    /// Search stored products by name
    Search {
        /// Substring to match, case-insensitive
        pattern: String,
    },
    /// Export power-modeling data as JSON
    Export {
        /// Output path
        #[arg(short, long, default_value = "data/cpu_power_modeling_data.json")]
        output: PathBuf,
    },
    /// Repair missing code names from stored category blobs
    BackfillCodenames,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Crawl {
            base_url,
            delay,
            max_pages,
        } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;

            let stop = Arc::new(AtomicBool::new(false));
            let stop_signal = Arc::clone(&stop);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    println!("\nInterrupt received, finishing current page...");
                    stop_signal.store(true, Ordering::SeqCst);
                }
            });

            let config = crawler::CrawlConfig {
                base_urls: vec![base_url],
                delay: Duration::from_secs_f64(delay),
                max_pages,
                ..crawler::CrawlConfig::default()
            };
            let stats = crawler::crawl(&conn, &config, stop).await?;
            println!(
                "Done: {} discovered, {} inserted, {} duplicates, {} failed.",
                stats.discovered, stats.inserted, stats.duplicates, stats.failed
            );
            println!("Total CPUs in database: {}", db::count(&conn)?);
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let stats = db::power_statistics(&conn)?;

            println!("Total CPUs:       {}", db::count(&conn)?);
            println!("With power data:  {}", stats.cpus_with_power_data);
            println!(
                "Base power (W):   min {} | avg {} | max {}",
                fmt_opt(stats.min_base_power),
                fmt_opt(stats.avg_base_power),
                fmt_opt(stats.max_base_power)
            );
            println!(
                "Turbo power (W):  min {} | avg {} | max {}",
                fmt_opt(stats.min_turbo_power),
                fmt_opt(stats.avg_turbo_power),
                fmt_opt(stats.max_turbo_power)
            );

            if !stats.core_distribution.is_empty() {
                println!("\n--- Core counts ---");
                for (cores, n) in &stats.core_distribution {
                    println!("  {:>3} cores: {}", cores, n);
                }
            }
            if !stats.process_distribution.is_empty() {
                println!("\n--- Process technology ---");
                for (node, n) in &stats.process_distribution {
                    println!("  {:<16} {}", node, n);
                }
            }
            Ok(())
        }
        Commands::Search { pattern } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let rows = db::find_by_name(&conn, &pattern)?;
            if rows.is_empty() {
                println!("No CPUs matching '{}'.", pattern);
                return Ok(());
            }

            println!(
                "{:>3} | {:<40} | {:>5} | {:>5} | {:>5} | {:>8} | {:<10}",
                "#", "Name", "Cores", "P", "E", "Base W", "Process"
            );
            println!("{}", "-".repeat(95));
            for (i, r) in rows.iter().enumerate() {
                println!(
                    "{:>3} | {:<40} | {:>5} | {:>5} | {:>5} | {:>8} | {:<10}",
                    i + 1,
                    truncate(&r.name, 40),
                    fmt_opt(r.total_cores),
                    fmt_opt(r.performance_cores),
                    fmt_opt(r.efficiency_cores),
                    fmt_opt(r.processor_base_power),
                    r.lithography.as_deref().unwrap_or("-"),
                );
            }
            println!("\n{} CPUs matched.", rows.len());
            Ok(())
        }
        Commands::Export { output } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let export = db::export_for_modeling(&conn)?;
            if let Some(parent) = output.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&output, serde_json::to_string_pretty(&export)?)?;
            println!(
                "Exported {} CPUs for modeling to {}",
                export.metadata.total_records,
                output.display()
            );
            Ok(())
        }
        Commands::BackfillCodenames => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let updated = db::backfill_code_names(&conn)?;
            println!("Updated code names on {} records.", updated);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }

    result
}

fn fmt_opt<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".into())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}\u{2026}", cut)
    }
}
