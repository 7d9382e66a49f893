use anyhow::Context;
use commands::command_argument_builder;
use indicatif::{ProgressBar, ProgressStyle};
use murmur_core::pipeline;
use murmur_core::storage::StorageManager;
use murmur_core::{JobConfig, Lexicon};
use murmur_scanner::{Fetcher, Orchestrator};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod commands;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let matches = cmd.get_matches();

    let default_level = if matches.get_flag("verbose") {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config_path = matches
        .get_one::<PathBuf>("config")
        .expect("config has a default")
        .clone();
    let output_path = matches
        .get_one::<PathBuf>("output")
        .expect("output has a default")
        .clone();
    let base_dir = matches
        .get_one::<PathBuf>("base-dir")
        .expect("base-dir has a default")
        .clone();
    let depth_override = matches.get_one::<usize>("depth").copied();
    let force_scoring = matches.get_flag("score");

    if let Err(e) = execute_crawl(
        &config_path,
        &output_path,
        &base_dir,
        depth_override,
        force_scoring,
    )
    .await
    {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn execute_crawl(
    config_path: &std::path::Path,
    output_path: &std::path::Path,
    base_dir: &std::path::Path,
    depth_override: Option<usize>,
    force_scoring: bool,
) -> anyhow::Result<()> {
    let mut config = JobConfig::load(config_path).context("cannot start without a valid config")?;
    if let Some(depth) = depth_override {
        config.depth = depth;
    }
    if force_scoring {
        config.enable_anomaly_scoring = true;
    }

    let lexicon = Lexicon::detect();
    let storage = StorageManager::new(base_dir).context("cannot create run directory")?;

    let orchestrator = Orchestrator::new(Fetcher::with_timeout(30));

    // Ctrl-C stops new fetches; in-flight ones finish and partial results
    // still get processed and saved.
    let cancel = orchestrator.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing in-flight fetches");
            cancel.store(true, Ordering::Relaxed);
        }
    });

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .expect("static spinner template"),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(format!(
        "Crawling {} seed(s) at depth {} with {} workers...",
        config.urls.len(),
        config.depth,
        config.concurrency
    ));

    let progress = {
        let spinner = spinner.clone();
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_millis(250)).await;
                let visited = orchestrator.visited_count().await;
                spinner.set_message(format!("Crawling... {} URLs visited", visited));
            }
        })
    };

    let started = Instant::now();
    let records = orchestrator
        .batch_crawl(&config.urls, config.depth, config.concurrency)
        .await;
    let duration_secs = started.elapsed().as_secs_f64();

    progress.abort();
    spinner.set_message("Processing results...");
    let report = pipeline::process_results(&records, &config, &lexicon, &storage, duration_secs);

    // One copy inside the run directory, one wherever the caller asked.
    report
        .save(&storage.run_dir().join("crawler_results.json"))
        .context("cannot save run report")?;
    report
        .save(output_path)
        .context("cannot save run report copy")?;

    spinner.finish_and_clear();

    let stats = &report.statistics;
    println!("\nCrawl complete in {:.1}s", duration_secs);
    println!("  Pages visited:   {}", stats.total_urls);
    println!("  Pages processed: {}", report.content.len());
    println!("  Success rate:    {:.2}%", stats.success_rate);
    println!("  Categories:      {}", stats.categories_count);
    if let Some(tally) = &stats.anomaly {
        println!(
            "  Anomaly verdicts: {} confirmed, {} suspected, {} normal, {} failed",
            tally.confirmed_count, tally.suspect_count, tally.normal_count, tally.failed_count
        );
    }
    println!("  Run directory:   {}", storage.run_dir().display());
    println!("  Report:          {}", output_path.display());

    Ok(())
}
