use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::ArticleRecord;
use crate::text::round2;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SentimentDistribution {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BiasDistribution {
    pub left_leaning: usize,
    pub centrist: usize,
    pub right_leaning: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensationalismDistribution {
    pub factual: usize,
    pub somewhat_sensational: usize,
    pub highly_sensational: usize,
}

/// Per-source averages. Missing scores are skipped; a source with no
/// scores at all averages to 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceStatistics {
    pub source_name: String,
    pub article_count: usize,
    pub average_sentiment: f64,
    pub average_bias: f64,
    pub average_sensationalism: f64,
}

impl SourceStatistics {
    /// One entry per named source, busiest first (ties by name).
    pub fn from_articles(articles: &[ArticleRecord]) -> Vec<Self> {
        let mut by_source: BTreeMap<&str, Vec<&ArticleRecord>> = BTreeMap::new();
        for article in articles {
            if let Some(name) = article.source_name.as_deref().map(str::trim) {
                if !name.is_empty() {
                    by_source.entry(name).or_default().push(article);
                }
            }
        }

        let mut sources: Vec<Self> = by_source
            .into_iter()
            .map(|(name, group)| Self {
                source_name: name.to_string(),
                article_count: group.len(),
                average_sentiment: average(group.iter().filter_map(|a| a.sentiment_score)),
                average_bias: average(group.iter().filter_map(|a| a.political_bias_score)),
                average_sensationalism: average(
                    group.iter().filter_map(|a| a.sensationalism_score),
                ),
            })
            .collect();

        // Stable sort keeps the name order from the BTreeMap for equal counts.
        sources.sort_by(|a, b| b.article_count.cmp(&a.article_count));
        sources
    }
}

fn average(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        round2(sum / count as f64)
    }
}

/// Aggregate view over a set of stored articles.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisStatistics {
    pub article_count: usize,
    pub analyzed_count: usize,
    pub average_sentiment: Option<f64>,
    pub sentiment_distribution: SentimentDistribution,
    pub bias_distribution: BiasDistribution,
    pub sensationalism_distribution: SensationalismDistribution,
    pub sources: Vec<SourceStatistics>,
}

impl AnalysisStatistics {
    pub fn from_articles(articles: &[ArticleRecord]) -> Self {
        let mut sentiment_distribution = SentimentDistribution::default();
        let mut bias_distribution = BiasDistribution::default();
        let mut sensationalism_distribution = SensationalismDistribution::default();

        for article in articles {
            match article.sentiment_label.as_deref() {
                Some("positive") => sentiment_distribution.positive += 1,
                Some("negative") => sentiment_distribution.negative += 1,
                Some("neutral") => sentiment_distribution.neutral += 1,
                _ => {}
            }

            // Neutral articles count as centrist.
            match article.political_bias_label.as_deref() {
                Some("left-leaning") => bias_distribution.left_leaning += 1,
                Some("right-leaning") => bias_distribution.right_leaning += 1,
                Some("centrist") | Some("neutral") => bias_distribution.centrist += 1,
                _ => {}
            }

            match article.sensationalism_label.as_deref() {
                Some("factual") => sensationalism_distribution.factual += 1,
                Some("somewhat-sensational") => sensationalism_distribution.somewhat_sensational += 1,
                Some("highly-sensational") => sensationalism_distribution.highly_sensational += 1,
                _ => {}
            }
        }

        let scores: Vec<f64> = articles.iter().filter_map(|a| a.sentiment_score).collect();
        let average_sentiment = if scores.is_empty() {
            None
        } else {
            Some(round2(scores.iter().sum::<f64>() / scores.len() as f64))
        };

        Self {
            article_count: articles.len(),
            analyzed_count: articles
                .iter()
                .filter(|a| a.last_analyzed_at.is_some())
                .count(),
            average_sentiment,
            sentiment_distribution,
            bias_distribution,
            sensationalism_distribution,
            sources: SourceStatistics::from_articles(articles),
        }
    }
}
