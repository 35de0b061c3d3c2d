use anyhow::{ensure, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

use crate::models::ArticleRecord;

/// Where articles come from and where analysis results go.
pub trait ArticleStore {
    fn topic_exists(&self, topic_id: i64) -> Result<bool>;

    /// Articles linked to a topic, oldest id first.
    fn articles_for_topic(&self, topic_id: i64) -> Result<Vec<ArticleRecord>>;

    /// Articles created at or after `since`, oldest id first.
    fn articles_created_since(&self, since: DateTime<Utc>) -> Result<Vec<ArticleRecord>>;

    fn get_article(&self, id: i64) -> Result<Option<ArticleRecord>>;

    /// Write every analysis column of `article` atomically. Saving an id the
    /// store does not hold is an error and changes nothing.
    fn save_analysis(&mut self, article: &ArticleRecord) -> Result<()>;
}

/// An article as it arrives from a feed or an import file.
#[derive(Debug, Clone, Deserialize)]
pub struct NewArticle {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub source_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS articles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        url TEXT NOT NULL UNIQUE,
        description TEXT,
        content TEXT,
        source_name TEXT,
        created_at TEXT NOT NULL,
        sentiment_score REAL,
        sentiment_label TEXT,
        sentiment_confidence REAL,
        political_bias_score REAL,
        political_bias_label TEXT,
        bias_scores TEXT,
        sensationalism_score REAL,
        sensationalism_label TEXT,
        extractive_summary TEXT,
        beginner_summary TEXT,
        technical_summary TEXT,
        summary_generated_at TEXT,
        last_analyzed_at TEXT
    );
    CREATE TABLE IF NOT EXISTS topics (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE
    );
    CREATE TABLE IF NOT EXISTS topic_articles (
        topic_id INTEGER NOT NULL REFERENCES topics(id),
        article_id INTEGER NOT NULL REFERENCES articles(id),
        PRIMARY KEY (topic_id, article_id)
    );
    CREATE INDEX IF NOT EXISTS idx_articles_created_at ON articles(created_at);
";

const ARTICLE_COLUMNS: &str = "a.id, a.title, a.url, a.description, a.content, a.source_name, \
    a.created_at, a.sentiment_score, a.sentiment_label, a.sentiment_confidence, \
    a.political_bias_score, a.political_bias_label, a.bias_scores, \
    a.sensationalism_score, a.sensationalism_label, a.extractive_summary, \
    a.beginner_summary, a.technical_summary, a.summary_generated_at, a.last_analyzed_at";

/// SQLite-backed article store.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database at `path`, creating parent directories.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory {}", parent.display())
                })?;
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {}", path.display()))?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .context("Failed to create database schema")?;
        Ok(Self { conn })
    }

    /// Insert an article and return its id. An article whose URL is already
    /// stored is left as is and its existing id returned.
    pub fn insert_article(&mut self, article: &NewArticle) -> Result<i64> {
        let created_at = article.created_at.unwrap_or_else(Utc::now);
        self.conn
            .execute(
                "INSERT OR IGNORE INTO articles (title, url, description, content, source_name, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    article.title,
                    article.url,
                    article.description,
                    article.content,
                    article.source_name,
                    created_at,
                ],
            )
            .with_context(|| format!("Failed to insert article {}", article.url))?;

        self.conn
            .query_row(
                "SELECT id FROM articles WHERE url = ?1",
                [&article.url],
                |row| row.get(0),
            )
            .with_context(|| format!("Failed to look up article {}", article.url))
    }

    /// Id of the topic called `name`, creating it when missing.
    pub fn create_topic(&mut self, name: &str) -> Result<i64> {
        self.conn
            .execute("INSERT OR IGNORE INTO topics (name) VALUES (?1)", [name])
            .with_context(|| format!("Failed to create topic '{}'", name))?;

        self.conn
            .query_row("SELECT id FROM topics WHERE name = ?1", [name], |row| row.get(0))
            .with_context(|| format!("Failed to look up topic '{}'", name))
    }

    pub fn add_article_to_topic(&mut self, topic_id: i64, article_id: i64) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR IGNORE INTO topic_articles (topic_id, article_id) VALUES (?1, ?2)",
                params![topic_id, article_id],
            )
            .with_context(|| {
                format!("Failed to add article {} to topic {}", article_id, topic_id)
            })?;
        Ok(())
    }

    fn query_articles<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<ArticleRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, record_from_row)?;

        let mut articles = Vec::new();
        for row in rows {
            articles.push(row.context("Failed to read article row")?);
        }
        Ok(articles)
    }
}

impl ArticleStore for SqliteStore {
    fn topic_exists(&self, topic_id: i64) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row("SELECT id FROM topics WHERE id = ?1", [topic_id], |row| row.get(0))
            .optional()
            .with_context(|| format!("Failed to look up topic {}", topic_id))?;
        Ok(found.is_some())
    }

    fn articles_for_topic(&self, topic_id: i64) -> Result<Vec<ArticleRecord>> {
        let sql = format!(
            "SELECT {} FROM articles a
             JOIN topic_articles t ON t.article_id = a.id
             WHERE t.topic_id = ?1
             ORDER BY a.id",
            ARTICLE_COLUMNS
        );
        self.query_articles(&sql, [topic_id])
            .with_context(|| format!("Failed to load articles for topic {}", topic_id))
    }

    fn articles_created_since(&self, since: DateTime<Utc>) -> Result<Vec<ArticleRecord>> {
        let sql = format!(
            "SELECT {} FROM articles a WHERE a.created_at >= ?1 ORDER BY a.id",
            ARTICLE_COLUMNS
        );
        self.query_articles(&sql, [since])
            .with_context(|| format!("Failed to load articles created since {}", since))
    }

    fn get_article(&self, id: i64) -> Result<Option<ArticleRecord>> {
        let sql = format!("SELECT {} FROM articles a WHERE a.id = ?1", ARTICLE_COLUMNS);
        self.conn
            .query_row(&sql, [id], record_from_row)
            .optional()
            .with_context(|| format!("Failed to load article {}", id))
    }

    fn save_analysis(&mut self, article: &ArticleRecord) -> Result<()> {
        let tx = self
            .conn
            .transaction()
            .context("Failed to begin transaction")?;

        let updated = tx
            .execute(
                "UPDATE articles SET
                    sentiment_score = ?1,
                    sentiment_label = ?2,
                    sentiment_confidence = ?3,
                    political_bias_score = ?4,
                    political_bias_label = ?5,
                    bias_scores = ?6,
                    sensationalism_score = ?7,
                    sensationalism_label = ?8,
                    extractive_summary = ?9,
                    beginner_summary = ?10,
                    technical_summary = ?11,
                    summary_generated_at = ?12,
                    last_analyzed_at = ?13
                 WHERE id = ?14",
                params![
                    article.sentiment_score,
                    article.sentiment_label,
                    article.sentiment_confidence,
                    article.political_bias_score,
                    article.political_bias_label,
                    article.bias_scores,
                    article.sensationalism_score,
                    article.sensationalism_label,
                    article.extractive_summary,
                    article.beginner_summary,
                    article.technical_summary,
                    article.summary_generated_at,
                    article.last_analyzed_at,
                    article.id,
                ],
            )
            .with_context(|| format!("Failed to update article {}", article.id))?;

        // Dropping the transaction without commit rolls it back.
        ensure!(updated == 1, "Article {} not found", article.id);

        tx.commit()
            .with_context(|| format!("Failed to commit analysis for article {}", article.id))?;
        debug!("Saved analysis for article {}", article.id);
        Ok(())
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<ArticleRecord> {
    Ok(ArticleRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        url: row.get(2)?,
        description: row.get(3)?,
        content: row.get(4)?,
        source_name: row.get(5)?,
        created_at: row.get(6)?,
        sentiment_score: row.get(7)?,
        sentiment_label: row.get(8)?,
        sentiment_confidence: row.get(9)?,
        political_bias_score: row.get(10)?,
        political_bias_label: row.get(11)?,
        bias_scores: row.get(12)?,
        sensationalism_score: row.get(13)?,
        sensationalism_label: row.get(14)?,
        extractive_summary: row.get(15)?,
        beginner_summary: row.get(16)?,
        technical_summary: row.get(17)?,
        summary_generated_at: row.get(18)?,
        last_analyzed_at: row.get(19)?,
    })
}
