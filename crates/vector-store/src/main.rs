use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shared::{ArticleCache, Config, DeltaUploader, FixedDelay, OpenAiVectorStore, VectorStoreApi};

#[derive(Parser)]
#[command(name = "vector-store")]
#[command(about = "Maintenance commands for the article vector store")]
struct Args {
    /// Directory holding cached Markdown articles
    #[arg(long, default_value = "articles", global = true)]
    articles_dir: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload every cached article, not just the changed ones
    UploadAll {
        /// Pause between uploads, in milliseconds
        #[arg(long, default_value = "500")]
        delay_ms: u64,
    },
    /// Show file counts for the vector store
    Info,
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

    let config = Config::from_env()?;
    let vector_store = OpenAiVectorStore::new(
        &config.openai_api_key,
        &config.openai_base_url,
        &config.vector_store_id,
    )?;
    log::debug!("Using vector store {}", config.vector_store_id);

    match args.command {
        Command::UploadAll { delay_ms } => {
            let cache = ArticleCache::new(&args.articles_dir);
            let pacer = FixedDelay::from_millis(delay_ms);

            println!("📤 Uploading all articles from {}...", args.articles_dir.display());
            let report = DeltaUploader::new(&vector_store, &pacer, &cache)
                .upload_all()
                .await
                .context("Failed to list cached articles")?;

            if report.total == 0 {
                anyhow::bail!(
                    "No markdown files found in {}. Run sync-articles first.",
                    args.articles_dir.display()
                );
            }

            println!("\n{}", "=".repeat(60));
            println!("Upload Summary");
            println!("{}", "=".repeat(60));
            println!("✓ Uploaded: {}", report.uploaded);
            println!("✗ Failed:   {}", report.failed);
            println!("━ Total:    {}", report.total);
            println!("{}", "=".repeat(60));

            if report.uploaded > 0 {
                print_info(&vector_store).await?;
            }
        }
        Command::Info => print_info(&vector_store).await?,
    }

    Ok(())
}

async fn print_info(vector_store: &OpenAiVectorStore) -> Result<()> {
    println!("\n📊 Fetching vector store statistics...");
    let info = vector_store
        .index_info()
        .await
        .context("Failed to fetch vector store info")?;

    println!("{}", "=".repeat(60));
    println!("Vector Store Statistics");
    println!("{}", "=".repeat(60));
    println!("{}", info);
    println!("{}", "=".repeat(60));
    Ok(())
}
