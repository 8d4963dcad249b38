use anyhow::Context;
use clap::Parser;
use mise_core::{ArticleFilter, RecipeFilter, RecordKind, RecordStorage, Settings, DEFAULT_LIMIT, FILTER_WINDOW};
use mise_scrapers::{handle_acquire, init_logging, AcquireArgs, AcquisitionManager, PassQueue};
use mise_web::AppState;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[derive(Debug, Clone, Copy)]
struct HumanDuration(Duration);

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut total_seconds = 0u64;
        let mut digits = String::new();
        let mut seen_number = false;

        for c in s.chars() {
            if c.is_whitespace() {
                continue;
            }
            if c.is_ascii_digit() {
                digits.push(c);
                continue;
            }
            let value = digits
                .parse::<u64>()
                .map_err(|_| format!("Expected a number before '{}'", c))?;
            let unit = match c {
                's' => 1,
                'm' => 60,
                'h' => 3600,
                'd' => 86400,
                _ => return Err(format!("Invalid duration unit: {}", c)),
            };
            total_seconds = value
                .checked_mul(unit)
                .and_then(|secs| total_seconds.checked_add(secs))
                .ok_or_else(|| format!("Duration too large: {}", s))?;
            digits.clear();
            seen_number = true;
        }

        // A trailing bare number counts as seconds.
        if !digits.is_empty() {
            let secs = digits.parse::<u64>().map_err(|e| e.to_string())?;
            total_seconds = total_seconds
                .checked_add(secs)
                .ok_or_else(|| format!("Duration too large: {}", s))?;
            seen_number = true;
        }

        if !seen_number || total_seconds == 0 {
            return Err("Duration must be positive, e.g. 30m or 1h15m".to_string());
        }
        Ok(HumanDuration(Duration::from_secs(total_seconds)))
    }
}

#[derive(Parser, Debug)]
#[command(name = "mise", author, version, about = "Cooking content acquisition", long_about = None)]
struct Cli {
    /// Settings file (defaults to ./mise.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Storage backend: sqlite or memory
    #[arg(long, global = true)]
    storage: Option<String>,

    /// SQLite database file
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Serve the JSON API
    Serve {
        #[arg(long)]
        bind: Option<String>,
    },
    /// Run an acquisition pass in the foreground
    Acquire {
        #[command(flatten)]
        args: AcquireArgs,

        /// Repeat the pass on this interval (e.g. 30m, 1h, 1d)
        #[arg(long)]
        every: Option<HumanDuration>,
    },
    /// Print stored records as JSON
    List {
        /// recipes or news
        kind: RecordKind,

        #[command(flatten)]
        filter: ListArgs,
    },
    /// Print record counts and latest acquisition times
    Stats,
}

#[derive(clap::Args, Debug, Default)]
struct ListArgs {
    #[arg(long, default_value_t = DEFAULT_LIMIT)]
    limit: usize,
    /// Substring of the title, description or summary
    #[arg(long)]
    search: Option<String>,
    /// Recipes only
    #[arg(long)]
    cuisine: Option<String>,
    /// Recipes only
    #[arg(long)]
    difficulty: Option<String>,
    /// News only
    #[arg(long)]
    category: Option<String>,
}

async fn list_records(storage: &dyn RecordStorage, kind: RecordKind, args: ListArgs) -> anyhow::Result<serde_json::Value> {
    let listed = match kind {
        RecordKind::Recipe => {
            let filter = RecipeFilter {
                search: args.search,
                cuisine: args.cuisine,
                difficulty: args.difficulty,
            };
            serde_json::to_value(filter.apply(storage.list_recipes(FILTER_WINDOW).await?, args.limit))?
        }
        RecordKind::Article => {
            let filter = ArticleFilter {
                search: args.search,
                category: args.category,
            };
            serde_json::to_value(filter.apply(storage.list_articles(FILTER_WINDOW).await?, args.limit))?
        }
    };
    Ok(listed)
}

fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let mut settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;
    if let Some(storage) = &cli.storage {
        settings.storage = storage.clone();
    }
    if let Some(database) = &cli.database {
        settings.database_path = database.clone();
    }
    Ok(settings)
}

async fn open_storage(settings: &Settings) -> anyhow::Result<Arc<dyn RecordStorage>> {
    let storage = mise_storage::create_storage(&settings.storage, &settings.database_path)
        .await
        .with_context(|| format!("Failed to open {} storage", settings.storage))?;
    info!(backend = %settings.storage, path = %settings.database_path.display(), "🏦 Storage ready");
    Ok(storage)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let settings = load_settings(&cli)?;
    let storage = open_storage(&settings).await?;

    match cli.command {
        Commands::Serve { bind } => {
            let manager = AcquisitionManager::from_settings(&settings, storage.clone())?;
            let (queue, _worker) = PassQueue::start(Arc::new(manager));
            let addr = bind.unwrap_or_else(|| settings.bind_addr.clone());
            mise_web::serve(AppState::new(storage, queue), &addr).await?;
        }
        Commands::Acquire { args, every } => {
            let manager = AcquisitionManager::from_settings(&settings, storage)?;
            match every {
                Some(interval) => {
                    info!(interval_secs = interval.0.as_secs(), "Running in periodic mode");
                    loop {
                        if let Err(e) = handle_acquire(args.clone(), &manager).await {
                            error!(error = %e, "Acquisition pass failed");
                        }
                        info!("Waiting {}s before next pass", interval.0.as_secs());
                        tokio::time::sleep(interval.0).await;
                    }
                }
                None => {
                    handle_acquire(args, &manager).await?;
                }
            }
        }
        Commands::List { kind, filter } => {
            let listed = list_records(storage.as_ref(), kind, filter).await?;
            println!("{}", serde_json::to_string_pretty(&listed)?);
        }
        Commands::Stats => {
            let stats = storage.stats().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}
