use anyhow::{ensure, Context, Result};
use chrono::{DateTime, Duration, Utc};
use rayon::prelude::*;
use serde_json::json;
use tracing::{debug, error, info};

use crate::bias::BiasDetector;
use crate::models::{ArticleAnalysis, ArticleFields, ArticleRecord, BatchResult, BatchScope, SummaryBundle};
use crate::outcome::{guarded, Outcome};
use crate::sentiment::{SentimentResult, SentimentScorer, VaderSentimentScorer};
use crate::store::ArticleStore;
use crate::summarizer::Summarizer;

pub const DEFAULT_REANALYSIS_DAYS: i64 = 7;

/// Beginner summaries shorter than this are replaced by the fallback.
const MIN_BEGINNER_CHARS: usize = 40;

/// A span of `days` days. Negative counts are treated as zero and spans
/// beyond what `Duration` holds saturate.
pub fn days_window(days: i64) -> Duration {
    Duration::try_days(days.max(0)).unwrap_or(Duration::MAX)
}

/// `now - window`, clamped to the earliest representable instant.
pub fn window_start(now: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    now.checked_sub_signed(window)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Which missing fields make an article due for (re)analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StalenessChecklist {
    /// Never analyzed, analyzed before the window, or missing sentiment or
    /// political bias.
    ByTopic,
    /// `ByTopic`, or missing the extractive summary.
    Recent,
}

impl StalenessChecklist {
    pub fn is_stale(&self, article: &ArticleRecord, now: DateTime<Utc>, window: Duration) -> bool {
        let expired = match article.last_analyzed_at {
            Some(at) => at < window_start(now, window),
            None => true,
        };
        let incomplete =
            article.sentiment_score.is_none() || article.political_bias_score.is_none();

        match self {
            StalenessChecklist::ByTopic => expired || incomplete,
            StalenessChecklist::Recent => {
                expired || incomplete || article.extractive_summary.is_none()
            }
        }
    }
}

/// Runs sentiment, bias and summarization over articles and writes the
/// results back through an `ArticleStore`.
pub struct ArticleAnalyzer<S = VaderSentimentScorer> {
    bias: BiasDetector,
    summarizer: Summarizer,
    sentiment: S,
    reanalysis_window: Duration,
}

impl ArticleAnalyzer<VaderSentimentScorer> {
    pub fn new() -> Result<Self> {
        Self::with_scorer(VaderSentimentScorer::new())
    }
}

impl<S: SentimentScorer> ArticleAnalyzer<S> {
    pub fn with_scorer(sentiment: S) -> Result<Self> {
        Ok(Self {
            bias: BiasDetector::new(),
            summarizer: Summarizer::new().context("Failed to build summarizer")?,
            sentiment,
            reanalysis_window: days_window(DEFAULT_REANALYSIS_DAYS),
        })
    }

    pub fn with_bias_detector(mut self, bias: BiasDetector) -> Self {
        self.bias = bias;
        self
    }

    pub fn with_reanalysis_window(mut self, window: Duration) -> Self {
        self.reanalysis_window = window;
        self
    }

    pub fn reanalysis_window(&self) -> Duration {
        self.reanalysis_window
    }

    /// Compute a full analysis without touching any store.
    pub fn analyze_fields(&self, fields: &ArticleFields) -> ArticleAnalysis {
        let (sentiment, (bias, summaries)) = rayon::join(
            || self.score_sentiment(fields),
            || {
                rayon::join(
                    || self.bias.analyze_article(fields),
                    || self.summarizer.summarize_article(fields),
                )
            },
        );

        let used_fallback_summary = needs_fallback(&summaries.value().beginner);
        let summaries = summaries.map(|bundle| {
            if used_fallback_summary {
                debug!("Article {:?}: beginner summary unusable, using fallback", fields.id);
                SummaryBundle::uniform(self.summarizer.fallback_summary(fields))
            } else {
                bundle
            }
        });

        ArticleAnalysis {
            article_id: fields.id,
            sentiment,
            political_bias: bias.political_bias,
            sensationalism: bias.sensationalism,
            summaries,
            used_fallback_summary,
            analyzed_at: Utc::now(),
        }
    }

    /// Analyze one article and persist the result. `article` is only
    /// updated once the store has committed.
    pub fn analyze_article<St>(&self, store: &mut St, article: &mut ArticleRecord) -> Result<ArticleAnalysis>
    where
        St: ArticleStore + ?Sized,
    {
        let analysis = self.analyze_fields(&article.fields());
        let updated = apply_analysis(article, &analysis);

        store
            .save_analysis(&updated)
            .with_context(|| format!("Failed to save analysis for article {}", article.id))?;

        *article = updated;
        Ok(analysis)
    }

    /// Analyze up to `limit` stale articles of a topic.
    pub fn analyze_articles_by_topic<St>(&self, store: &mut St, topic_id: i64, limit: usize) -> BatchResult
    where
        St: ArticleStore + ?Sized,
    {
        let mut result = BatchResult::new(BatchScope::Topic { topic_id });

        match store.topic_exists(topic_id) {
            Ok(true) => {}
            Ok(false) => {
                error!("Topic {} not found", topic_id);
                result.errors.push(format!("Topic {} not found", topic_id));
                return result;
            }
            Err(e) => {
                error!("Failed to look up topic {}: {:#}", topic_id, e);
                result.errors.push(format!("{:#}", e));
                return result;
            }
        }

        match store.articles_for_topic(topic_id) {
            Ok(articles) => self.run_batch(store, articles, StalenessChecklist::ByTopic, limit, result),
            Err(e) => {
                error!("{:#}", e);
                result.errors.push(format!("{:#}", e));
                result
            }
        }
    }

    /// Analyze up to `limit` stale articles created in the last `days` days.
    pub fn analyze_recent_articles<St>(&self, store: &mut St, days: i64, limit: usize) -> BatchResult
    where
        St: ArticleStore + ?Sized,
    {
        let result = BatchResult::new(BatchScope::Recent { days });
        let since = window_start(Utc::now(), days_window(days));

        match store.articles_created_since(since) {
            Ok(articles) => self.run_batch(store, articles, StalenessChecklist::Recent, limit, result),
            Err(e) => {
                error!("{:#}", e);
                let mut result = result;
                result.errors.push(format!("{:#}", e));
                result
            }
        }
    }

    fn run_batch<St>(
        &self,
        store: &mut St,
        articles: Vec<ArticleRecord>,
        checklist: StalenessChecklist,
        limit: usize,
        mut result: BatchResult,
    ) -> BatchResult
    where
        St: ArticleStore + ?Sized,
    {
        let now = Utc::now();
        let stale: Vec<ArticleRecord> = articles
            .into_iter()
            .filter(|a| checklist.is_stale(a, now, self.reanalysis_window))
            .take(limit)
            .collect();
        result.articles_found = stale.len();

        info!("Analyzing {} articles ({:?})", stale.len(), result.scope);

        // Compute in parallel, then write one article at a time in selection order.
        let analyses: Vec<ArticleAnalysis> = stale
            .par_iter()
            .map(|article| self.analyze_fields(&article.fields()))
            .collect();

        for (article, analysis) in stale.iter().zip(analyses.iter()) {
            result.articles_analyzed += 1;

            // Neutral defaults are still written; the failure is reported.
            for (step, reason) in analysis.degradations() {
                result.errors.push(format!(
                    "Error analyzing article {}: {} degraded: {}",
                    article.id, step, reason
                ));
            }

            let updated = apply_analysis(article, analysis);
            match store.save_analysis(&updated) {
                Ok(()) => result.articles_updated += 1,
                Err(e) => {
                    error!("Error analyzing article {}: {:#}", article.id, e);
                    result
                        .errors
                        .push(format!("Error analyzing article {}: {:#}", article.id, e));
                }
            }
        }

        result.analyzed_at = Utc::now();
        info!(
            "Batch complete: {} analyzed, {} updated, {} errors",
            result.articles_analyzed,
            result.articles_updated,
            result.errors.len()
        );
        result
    }

    fn score_sentiment(&self, fields: &ArticleFields) -> Outcome<SentimentResult> {
        guarded("Sentiment analysis", SentimentResult::neutral, || {
            let result = self.sentiment.analyze_article(fields)?;
            ensure!(
                result.score.is_finite() && result.confidence.is_finite(),
                "sentiment score is not finite"
            );
            Ok(result)
        })
    }
}

fn needs_fallback(beginner: &str) -> bool {
    let beginner = beginner.trim();
    beginner.chars().count() < MIN_BEGINNER_CHARS || beginner.contains("[+") || beginner.contains("...")
}

/// Copy of `article` carrying every field of `analysis`.
fn apply_analysis(article: &ArticleRecord, analysis: &ArticleAnalysis) -> ArticleRecord {
    let sentiment = analysis.sentiment.value();
    let political = analysis.political_bias.value();
    let sensationalism = analysis.sensationalism.value();

    let mut updated = article.clone();
    updated.sentiment_score = Some(sentiment.score);
    updated.sentiment_label = Some(sentiment.label.to_string());
    updated.sentiment_confidence = Some(sentiment.confidence);
    updated.political_bias_score = Some(political.score);
    updated.political_bias_label = Some(political.label.to_string());
    updated.bias_scores = Some(json!({
        "political": {
            "score": political.score,
            "label": political.label,
            "confidence": political.confidence,
        },
        "sensationalism": {
            "score": sensationalism.score,
            "label": sensationalism.label,
            "confidence": sensationalism.confidence,
        },
    }));
    updated.sensationalism_score = Some(sensationalism.score);
    updated.sensationalism_label = Some(sensationalism.label.to_string());
    updated.extractive_summary = Some(analysis.summaries.value().extractive.clone());
    updated.beginner_summary = Some(analysis.summaries.value().beginner.clone());
    updated.technical_summary = Some(analysis.summaries.value().technical.clone());
    updated.summary_generated_at = Some(analysis.summaries.value().generated_at);
    updated.last_analyzed_at = Some(analysis.analyzed_at);
    updated
}
