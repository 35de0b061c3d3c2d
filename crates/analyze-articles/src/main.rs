use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use newslens::analyzer::{days_window, window_start};
use newslens::{
    AnalysisConfig, AnalysisStatistics, ArticleAnalyzer, ArticleStore, NewArticle, SqliteStore,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Parser)]
#[command(name = "analyze-articles")]
#[command(about = "Score stored news articles for sentiment, bias and sensationalism, and summarize them")]
struct Args {
    /// SQLite database to use (overrides NEWSLENS_DATABASE)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load articles from a JSON array of {title, url, description?, content?, source_name?, created_at?}
    Import {
        file: PathBuf,

        /// Attach every imported article to this topic (created if missing)
        #[arg(short, long)]
        topic: Option<String>,
    },

    /// Analyze a single article and print the analysis
    Article { id: i64 },

    /// Analyze the stale articles of a topic
    Topic {
        topic_id: i64,

        /// Maximum number of articles to analyze
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Analyze stale articles created in the last few days
    Recent {
        /// Number of days to look back
        #[arg(short, long, default_value = "7")]
        days: i64,

        /// Maximum number of articles to analyze
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Print aggregate statistics for a topic or a recent window
    Stats {
        #[arg(short, long)]
        topic: Option<i64>,

        /// Number of days to look back when no topic is given
        #[arg(short, long, default_value = "7")]
        days: i64,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = AnalysisConfig::from_env()?;
    if let Some(path) = args.database {
        config.database_path = path;
    }
    debug!("Using database {}", config.database_path.display());

    let mut store = SqliteStore::open(&config.database_path)?;

    match args.command {
        Command::Import { file, topic } => import(&mut store, &file, topic.as_deref()),
        Command::Article { id } => {
            let analyzer = build_analyzer(&config)?;
            let mut article = store
                .get_article(id)?
                .with_context(|| format!("Article {} not found", id))?;

            eprintln!("🔍 Analyzing \"{}\"...", article.title);
            let analysis = analyzer.analyze_article(&mut store, &mut article)?;
            print_json(&analysis)
        }
        Command::Topic { topic_id, limit } => {
            let analyzer = build_analyzer(&config)?;
            eprintln!("📚 Analyzing topic {}...", topic_id);
            let result = analyzer.analyze_articles_by_topic(
                &mut store,
                topic_id,
                limit.unwrap_or(config.batch_limit),
            );
            eprintln!(
                "✓ Updated {}/{} articles",
                result.articles_updated, result.articles_found
            );
            print_json(&result)
        }
        Command::Recent { days, limit } => {
            let analyzer = build_analyzer(&config)?;
            eprintln!("📚 Analyzing articles from the past {} days...", days);
            let result =
                analyzer.analyze_recent_articles(&mut store, days, limit.unwrap_or(config.batch_limit));
            eprintln!(
                "✓ Updated {}/{} articles",
                result.articles_updated, result.articles_found
            );
            print_json(&result)
        }
        Command::Stats { topic, days } => {
            let articles = match topic {
                Some(topic_id) => store.articles_for_topic(topic_id)?,
                None => store.articles_created_since(window_start(Utc::now(), days_window(days)))?,
            };
            print_json(&AnalysisStatistics::from_articles(&articles))
        }
    }
}

fn build_analyzer(config: &AnalysisConfig) -> Result<ArticleAnalyzer> {
    Ok(ArticleAnalyzer::new()?
        .with_reanalysis_window(days_window(config.reanalysis_window_days)))
}

fn import(store: &mut SqliteStore, file: &Path, topic: Option<&str>) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let articles: Vec<NewArticle> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse articles from {}", file.display()))?;

    let topic_id = topic.map(|name| store.create_topic(name)).transpose()?;

    for article in &articles {
        let id = store.insert_article(article)?;
        if let Some(topic_id) = topic_id {
            store.add_article_to_topic(topic_id, id)?;
        }
    }

    eprintln!("✓ Imported {} articles", articles.len());
    if let (Some(name), Some(topic_id)) = (topic, topic_id) {
        eprintln!("  Topic \"{}\" has id {}", name, topic_id);
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
