use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use shared::{
    reset::reset, ArticleCache, Config, FingerprintStore, FixedDelay, JsonFingerprintStore, OpenAiVectorStore,
    SyncOptions, SyncPaths, SyncPipeline, ZendeskClient,
};

#[derive(Parser)]
#[command(name = "sync-articles")]
#[command(about = "Mirror help-center articles to Markdown and upload the changes to a vector store")]
struct Args {
    /// Remove cached articles and metadata before running
    #[arg(long)]
    reset: bool,

    /// Maximum number of articles to process
    #[arg(short, long, default_value = "50")]
    limit: usize,

    /// Directory holding one Markdown file per article
    #[arg(long, default_value = "articles")]
    articles_dir: PathBuf,

    /// Fingerprint store file
    #[arg(long, default_value = "articles_metadata.json")]
    metadata_file: PathBuf,

    /// Pause between requests, in milliseconds
    #[arg(long, default_value = "500")]
    delay_ms: u64,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    // Fail before touching the network if credentials are missing
    let config = Config::from_env()?;

    let paths = SyncPaths {
        articles_dir: args.articles_dir,
        metadata_file: args.metadata_file,
    };
    if args.reset {
        reset(&paths);
    }

    println!("{}", "=".repeat(70));
    println!("{:^70}", "Help Center Article Sync");
    println!("{}", "=".repeat(70));
    println!("Run time: {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
    println!("Vector Store ID: {}", config.vector_store_id);
    if let Some(assistant_id) = &config.assistant_id {
        println!("Assistant ID: {}", assistant_id);
    }
    println!();

    let options = SyncOptions {
        limit: args.limit,
        delay: std::time::Duration::from_millis(args.delay_ms),
        ..SyncOptions::default()
    };

    let help_center = ZendeskClient::new(&config.help_center_url, &config.locale)?;
    let vector_store = OpenAiVectorStore::new(
        &config.openai_api_key,
        &config.openai_base_url,
        &config.vector_store_id,
    )?;
    let pacer = FixedDelay(options.delay);
    let cache = ArticleCache::new(&paths.articles_dir);
    let mut store = JsonFingerprintStore::open(&paths.metadata_file).with_context(|| {
        format!(
            "Failed to load metadata from {}",
            paths.metadata_file.display()
        )
    })?;
    log::info!(
        "Loaded {} fingerprint records from {}",
        store.len(),
        paths.metadata_file.display()
    );

    println!("📚 Syncing up to {} articles...", options.limit);
    let pipeline = SyncPipeline {
        help_center: &help_center,
        vector_store: &vector_store,
        pacer: &pacer,
        cache: &cache,
        options: &options,
    };
    let summary = pipeline
        .run(&mut store)
        .await
        .context("Failed to save article metadata")?;

    println!();
    println!("SUMMARY");
    println!("{}", "=".repeat(70));
    println!("{}", summary);
    println!("{}", "=".repeat(70));

    if summary.has_failures() {
        println!("\n⚠ Completed with failures; rerun to retry them");
    } else {
        println!("\n✅ Job completed successfully");
    }
    println!("Completed at: {}", Local::now().format("%Y-%m-%d %H:%M:%S"));

    Ok(())
}
