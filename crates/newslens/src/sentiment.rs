use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::ArticleFields;
use crate::text::{clamp_unit, round2};

/// Content beyond this many characters is ignored so long bodies do not
/// drown out the headline.
pub const CONTENT_EXCERPT_CHARS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub score: f64,
    pub label: SentimentLabel,
    pub confidence: f64,
}

impl SentimentResult {
    pub fn neutral() -> Self {
        Self {
            score: 0.0,
            label: SentimentLabel::Neutral,
            confidence: 0.0,
        }
    }

    /// Map a compound polarity in [-1, 1] to a labelled result.
    pub fn from_compound(compound: f64) -> Self {
        let compound = compound.clamp(-1.0, 1.0);
        let label = if compound >= 0.05 {
            SentimentLabel::Positive
        } else if compound <= -0.05 {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        };

        Self {
            score: round2(compound),
            label,
            confidence: round2(clamp_unit(compound.abs() * 1.5)),
        }
    }
}

/// Polarity engine plugged into the analyzer.
///
/// Implementors only need `analyze_text`; the article weighting (title
/// twice, description, first 1000 characters of content) is shared so any
/// engine is a drop-in replacement.
pub trait SentimentScorer: Send + Sync {
    fn analyze_text(&self, text: &str) -> Result<SentimentResult>;

    fn analyze_article(&self, fields: &ArticleFields) -> Result<SentimentResult> {
        match fields.weighted_text(Some(CONTENT_EXCERPT_CHARS)) {
            Some(text) => self.analyze_text(&text),
            None => Ok(SentimentResult::neutral()),
        }
    }
}

/// VADER lexicon and rule based scorer.
#[derive(Debug, Clone, Copy, Default)]
pub struct VaderSentimentScorer;

impl VaderSentimentScorer {
    pub fn new() -> Self {
        Self
    }
}

impl SentimentScorer for VaderSentimentScorer {
    fn analyze_text(&self, text: &str) -> Result<SentimentResult> {
        if text.trim().is_empty() {
            return Ok(SentimentResult::neutral());
        }

        let analyzer = vader_sentiment::SentimentIntensityAnalyzer::new();
        let scores = analyzer.polarity_scores(text);
        let compound = scores
            .get("compound")
            .copied()
            .context("VADER returned no compound score")?;
        ensure!(compound.is_finite(), "VADER compound score is not finite");

        Ok(SentimentResult::from_compound(compound))
    }
}
