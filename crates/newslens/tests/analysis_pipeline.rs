//! End-to-end runs of the analyzer against an in-memory SQLite store.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use newslens::{
    AnalysisStatistics, ArticleAnalyzer, ArticleRecord, ArticleStore, NewArticle, PoliticalLabel,
    SentimentResult, SentimentScorer, SqliteStore,
};

struct FixedScorer;

impl SentimentScorer for FixedScorer {
    fn analyze_text(&self, text: &str) -> Result<SentimentResult> {
        if text.contains("tragedy") {
            Ok(SentimentResult::from_compound(-0.6))
        } else {
            Ok(SentimentResult::from_compound(0.3))
        }
    }
}

/// Fails on any text mentioning a flood.
struct FloodShyScorer;

impl SentimentScorer for FloodShyScorer {
    fn analyze_text(&self, text: &str) -> Result<SentimentResult> {
        if text.contains("flood") || text.contains("Flood") {
            bail!("sentiment engine crashed");
        }
        Ok(SentimentResult::from_compound(0.3))
    }
}

/// Delegates to SQLite but refuses to save one article.
struct FlakyStore {
    inner: SqliteStore,
    reject_id: i64,
    saved: Vec<i64>,
}

impl ArticleStore for FlakyStore {
    fn topic_exists(&self, topic_id: i64) -> Result<bool> {
        self.inner.topic_exists(topic_id)
    }

    fn articles_for_topic(&self, topic_id: i64) -> Result<Vec<ArticleRecord>> {
        self.inner.articles_for_topic(topic_id)
    }

    fn articles_created_since(&self, since: DateTime<Utc>) -> Result<Vec<ArticleRecord>> {
        self.inner.articles_created_since(since)
    }

    fn get_article(&self, id: i64) -> Result<Option<ArticleRecord>> {
        self.inner.get_article(id)
    }

    fn save_analysis(&mut self, article: &ArticleRecord) -> Result<()> {
        if article.id == self.reject_id {
            bail!("disk full");
        }
        self.inner.save_analysis(article)?;
        self.saved.push(article.id);
        Ok(())
    }
}

const STORIES: &[(&str, &str)] = &[
    (
        "Senate debates tax cuts",
        "Supporters of tax cuts and deregulation say the free market will respond. \
         The senate vote is expected next week. Lawmakers spent hours on the legislation. \
         Opponents warned about the deficit. Analysts expect a narrow result.",
    ),
    (
        "Flood tragedy hits valley",
        "A flood tragedy struck the valley overnight. Rescue crews worked through the night. \
         Residents were moved to shelters in nearby towns. Officials promised more aid. \
         Roads remain closed across the region.",
    ),
    (
        "Library opens new wing",
        "The city library opened a new wing on Saturday. Visitors toured the reading rooms. \
         Staff said the wing doubles the children's collection. The project took two years. \
         A celebration is planned for next month.",
    ),
];

fn seed(store: &mut SqliteStore) -> (i64, Vec<i64>) {
    let topic = store.create_topic("weekly").unwrap();
    let ids = STORIES
        .iter()
        .enumerate()
        .map(|(i, (title, body))| {
            let id = store
                .insert_article(&NewArticle {
                    title: title.to_string(),
                    url: format!("https://news.example.com/{}", i),
                    description: None,
                    content: Some(body.to_string()),
                    source_name: Some("Example News".to_string()),
                    created_at: None,
                })
                .unwrap();
            store.add_article_to_topic(topic, id).unwrap();
            id
        })
        .collect();
    (topic, ids)
}

#[test]
fn test_topic_batch_analyzes_and_persists_everything() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let (topic, ids) = seed(&mut store);
    let analyzer = ArticleAnalyzer::with_scorer(FixedScorer).unwrap();

    let result = analyzer.analyze_articles_by_topic(&mut store, topic, 100);

    assert_eq!(result.articles_found, 3);
    assert_eq!(result.articles_analyzed, 3);
    assert_eq!(result.articles_updated, 3);
    assert!(result.errors.is_empty());

    let tax = store.get_article(ids[0]).unwrap().unwrap();
    assert_eq!(
        tax.political_bias_label.as_deref(),
        Some(PoliticalLabel::RightLeaning.as_str())
    );
    assert!(tax.political_bias_score.unwrap() > 0.0);

    let flood = store.get_article(ids[1]).unwrap().unwrap();
    assert_eq!(flood.sentiment_label.as_deref(), Some("negative"));

    for id in &ids {
        let article = store.get_article(*id).unwrap().unwrap();
        assert!(article.last_analyzed_at.is_some());
        assert!(article.summary_generated_at.is_some());
        assert!(!article.extractive_summary.unwrap_or_default().is_empty());
        assert!(!article.beginner_summary.unwrap_or_default().is_empty());
    }
}

#[test]
fn test_batch_continues_past_failed_write() {
    let mut inner = SqliteStore::open_in_memory().unwrap();
    let (topic, ids) = seed(&mut inner);
    let mut store = FlakyStore {
        inner,
        reject_id: ids[1],
        saved: Vec::new(),
    };
    let analyzer = ArticleAnalyzer::with_scorer(FixedScorer).unwrap();

    let result = analyzer.analyze_articles_by_topic(&mut store, topic, 100);

    assert_eq!(result.articles_analyzed, 3);
    assert_eq!(result.articles_updated, 2);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].starts_with(&format!("Error analyzing article {}:", ids[1])));
    assert!(result.errors[0].contains("disk full"));

    // Writes happen in selection order.
    assert_eq!(store.saved, vec![ids[0], ids[2]]);

    let rejected = store.get_article(ids[1]).unwrap().unwrap();
    assert!(rejected.last_analyzed_at.is_none());
    assert!(rejected.sentiment_score.is_none());
}

#[test]
fn test_batch_reports_engine_failure_and_keeps_going() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let (topic, ids) = seed(&mut store);
    let analyzer = ArticleAnalyzer::with_scorer(FloodShyScorer).unwrap();

    let result = analyzer.analyze_articles_by_topic(&mut store, topic, 100);

    assert_eq!(result.articles_analyzed, 3);
    assert_eq!(result.articles_updated, 3);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(
        result.errors[0],
        format!(
            "Error analyzing article {}: sentiment degraded: sentiment engine crashed",
            ids[1]
        )
    );

    let flood = store.get_article(ids[1]).unwrap().unwrap();
    assert_eq!(flood.sentiment_label.as_deref(), Some("neutral"));
    assert_eq!(flood.sentiment_score, Some(0.0));
    let library = store.get_article(ids[2]).unwrap().unwrap();
    assert_eq!(library.sentiment_label.as_deref(), Some("positive"));
}

#[test]
fn test_recent_batch_then_statistics() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    seed(&mut store);
    let analyzer = ArticleAnalyzer::with_scorer(FixedScorer).unwrap();

    let result = analyzer.analyze_recent_articles(&mut store, 7, 2);
    assert_eq!(result.articles_updated, 2);

    let rest = analyzer.analyze_recent_articles(&mut store, 7, 10);
    assert_eq!(rest.articles_found, 1);

    let articles = store
        .articles_created_since(Utc::now() - chrono::Duration::days(7))
        .unwrap();
    let stats = AnalysisStatistics::from_articles(&articles);
    assert_eq!(stats.article_count, 3);
    assert_eq!(stats.analyzed_count, 3);
    assert_eq!(stats.sentiment_distribution.negative, 1);
    assert_eq!(stats.sentiment_distribution.positive, 2);
    assert_eq!(stats.sources.len(), 1);
    assert_eq!(stats.sources[0].source_name, "Example News");
    assert_eq!(stats.sources[0].article_count, 3);
}

#[test]
fn test_single_article_analysis_serializes() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let (_, ids) = seed(&mut store);
    let analyzer = ArticleAnalyzer::with_scorer(FixedScorer).unwrap();
    let mut article = store.get_article(ids[2]).unwrap().unwrap();

    let analysis = analyzer.analyze_article(&mut store, &mut article).unwrap();
    let json = serde_json::to_value(&analysis).unwrap();

    assert_eq!(json["article_id"], ids[2]);
    assert_eq!(json["sentiment"]["status"], "computed");
    assert_eq!(json["political_bias"]["result"]["label"], "neutral");
}
