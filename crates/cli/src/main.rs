use clap::{Parser, Subcommand};
use tendra_storage::{format_size, Category, StorageConfig, StorageService};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tendra")]
#[command(about = "Tendra upload storage operations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the storage configuration and directories
    Check,
    /// Show storage usage per category
    Stats {
        /// Emit the snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// List stored files in a category
    List {
        /// Category id, e.g. "avatars" or "tender-documents"
        category: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = StorageConfig::from_env()?;
    let service = StorageService::new(config);

    match cli.command {
        Commands::Check => {
            let report = service.preflight();
            if report.valid {
                println!("Storage configuration OK.");
            } else {
                eprintln!("Storage configuration has issues:");
                for issue in &report.issues {
                    eprintln!("  - {issue}");
                }
                std::process::exit(1);
            }
        }
        Commands::Stats { json } => {
            let stats = service.stats();
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                for entry in &stats.categories {
                    println!(
                        "{:<18} {:>6} files  {:>12}",
                        entry.category.to_string(),
                        entry.files,
                        format_size(entry.bytes)
                    );
                }
                println!(
                    "{:<18} {:>6} files  {:>12}",
                    "total",
                    stats.total_files,
                    format_size(stats.total_bytes)
                );
            }
        }
        Commands::List { category } => {
            let category: Category = category.parse()?;
            let files = service.list(category)?;
            if files.is_empty() {
                println!("No files in {category}.");
            } else {
                for file in files {
                    println!("{file}");
                }
            }
        }
    }

    Ok(())
}
