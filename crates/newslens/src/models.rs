use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bias::{BiasResult, SensationalismResult};
use crate::outcome::Outcome;
use crate::sentiment::SentimentResult;

/// The text an analysis run works from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleFields {
    pub id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub source_name: Option<String>,
}

impl ArticleFields {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn title(&self) -> Option<&str> {
        non_blank(Some(&self.title))
    }

    pub fn description(&self) -> Option<&str> {
        non_blank(self.description.as_deref())
    }

    pub fn content(&self) -> Option<&str> {
        non_blank(self.content.as_deref())
    }

    /// Title twice, description, then content, joined by single spaces.
    /// `None` when every field is blank.
    pub fn weighted_text(&self, content_chars: Option<usize>) -> Option<String> {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(title) = self.title() {
            parts.push(title);
            parts.push(title);
        }
        if let Some(description) = self.description() {
            parts.push(description);
        }
        if let Some(content) = self.content() {
            match content_chars {
                Some(limit) => parts.push(crate::text::char_prefix(content, limit)),
                None => parts.push(content),
            }
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryBundle {
    pub extractive: String,
    pub beginner: String,
    pub technical: String,
    pub generated_at: DateTime<Utc>,
}

impl SummaryBundle {
    pub fn empty() -> Self {
        Self::uniform(String::new())
    }

    /// All three variants set to the same text.
    pub fn uniform(text: String) -> Self {
        Self {
            extractive: text.clone(),
            beginner: text.clone(),
            technical: text,
            generated_at: Utc::now(),
        }
    }
}

/// An article row as held by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub source_name: Option<String>,
    pub created_at: DateTime<Utc>,

    pub sentiment_score: Option<f64>,
    pub sentiment_label: Option<String>,
    pub sentiment_confidence: Option<f64>,
    pub political_bias_score: Option<f64>,
    pub political_bias_label: Option<String>,
    pub bias_scores: Option<serde_json::Value>,
    pub sensationalism_score: Option<f64>,
    pub sensationalism_label: Option<String>,

    pub extractive_summary: Option<String>,
    pub beginner_summary: Option<String>,
    pub technical_summary: Option<String>,
    pub summary_generated_at: Option<DateTime<Utc>>,
    pub last_analyzed_at: Option<DateTime<Utc>>,
}

impl ArticleRecord {
    /// A fresh, never-analyzed article.
    pub fn new(id: i64, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            url: url.into(),
            description: None,
            content: None,
            source_name: None,
            created_at: Utc::now(),
            sentiment_score: None,
            sentiment_label: None,
            sentiment_confidence: None,
            political_bias_score: None,
            political_bias_label: None,
            bias_scores: None,
            sensationalism_score: None,
            sensationalism_label: None,
            extractive_summary: None,
            beginner_summary: None,
            technical_summary: None,
            summary_generated_at: None,
            last_analyzed_at: None,
        }
    }

    pub fn fields(&self) -> ArticleFields {
        ArticleFields {
            id: Some(self.id),
            title: self.title.clone(),
            description: self.description.clone(),
            content: self.content.clone(),
            source_name: self.source_name.clone(),
        }
    }
}

/// Everything one analysis run produced for an article.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleAnalysis {
    pub article_id: Option<i64>,
    pub sentiment: Outcome<SentimentResult>,
    pub political_bias: Outcome<BiasResult>,
    pub sensationalism: Outcome<SensationalismResult>,
    pub summaries: Outcome<SummaryBundle>,
    pub used_fallback_summary: bool,
    pub analyzed_at: DateTime<Utc>,
}

impl ArticleAnalysis {
    /// `(step, reason)` for every step that fell back to its neutral default.
    pub fn degradations(&self) -> Vec<(&'static str, &str)> {
        [
            ("sentiment", self.sentiment.reason()),
            ("political bias", self.political_bias.reason()),
            ("sensationalism", self.sensationalism.reason()),
            ("summarization", self.summaries.reason()),
        ]
        .into_iter()
        .filter_map(|(step, reason)| reason.map(|reason| (step, reason)))
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchScope {
    Topic { topic_id: i64 },
    Recent { days: i64 },
}

/// Tally of a batch analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub scope: BatchScope,
    pub articles_found: usize,
    pub articles_analyzed: usize,
    pub articles_updated: usize,
    pub errors: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
}

impl BatchResult {
    pub fn new(scope: BatchScope) -> Self {
        Self {
            scope,
            articles_found: 0,
            articles_analyzed: 0,
            articles_updated: 0,
            errors: Vec::new(),
            analyzed_at: Utc::now(),
        }
    }
}
