use anyhow::{ensure, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::lexicons::{Lexicon, LexiconSet};
use crate::models::ArticleFields;
use crate::outcome::{guarded, Outcome};
use crate::text::{clamp_unit, normalize, round2};

/// Scores within (-0.3, 0.3) read as centrist.
const LEAN_THRESHOLD: f64 = 0.3;
/// Below this confidence the political label is forced to neutral.
const MIN_POLITICAL_CONFIDENCE: f64 = 0.2;
/// Distinct political terms needed for full term-count confidence.
const POLITICAL_TERMS_FOR_CONFIDENCE: f64 = 10.0;
/// Weighted sensationalist hits that saturate the score.
const SENSATIONAL_SATURATION: f64 = 10.0;
/// Distinct sensationalist terms needed for full confidence.
const SENSATIONAL_TERMS_FOR_CONFIDENCE: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PoliticalLabel {
    LeftLeaning,
    RightLeaning,
    Centrist,
    Neutral,
}

impl PoliticalLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PoliticalLabel::LeftLeaning => "left-leaning",
            PoliticalLabel::RightLeaning => "right-leaning",
            PoliticalLabel::Centrist => "centrist",
            PoliticalLabel::Neutral => "neutral",
        }
    }
}

impl fmt::Display for PoliticalLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SensationalismLabel {
    Factual,
    SomewhatSensational,
    HighlySensational,
}

impl SensationalismLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensationalismLabel::Factual => "factual",
            SensationalismLabel::SomewhatSensational => "somewhat-sensational",
            SensationalismLabel::HighlySensational => "highly-sensational",
        }
    }

    fn from_score(score: f64) -> Self {
        if score < 0.3 {
            SensationalismLabel::Factual
        } else if score < 0.6 {
            SensationalismLabel::SomewhatSensational
        } else {
            SensationalismLabel::HighlySensational
        }
    }
}

impl fmt::Display for SensationalismLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TermMatch {
    pub count: usize,
    pub weight: f64,
}

pub type TermMatches = BTreeMap<String, TermMatch>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoliticalMatches {
    pub left: TermMatches,
    pub right: TermMatches,
    pub neutral: TermMatches,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiasResult {
    pub score: f64,
    pub label: PoliticalLabel,
    pub confidence: f64,
    pub matches: PoliticalMatches,
}

impl BiasResult {
    pub fn neutral() -> Self {
        Self {
            score: 0.0,
            label: PoliticalLabel::Neutral,
            confidence: 0.0,
            matches: PoliticalMatches::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensationalismResult {
    pub score: f64,
    pub label: SensationalismLabel,
    pub confidence: f64,
    pub matches: TermMatches,
}

impl SensationalismResult {
    pub fn factual() -> Self {
        Self {
            score: 0.0,
            label: SensationalismLabel::Factual,
            confidence: 0.0,
            matches: TermMatches::new(),
        }
    }
}

/// Both bias axes for one piece of text.
#[derive(Debug, Clone, Serialize)]
pub struct BiasAnalysis {
    pub political_bias: Outcome<BiasResult>,
    pub sensationalism: Outcome<SensationalismResult>,
    pub analyzed_at: DateTime<Utc>,
}

/// Lexicon-weighted political lean and sensationalism scoring.
///
/// Terms are counted as non-overlapping substrings of the normalized text,
/// so a term also matches inside longer words ("equity" inside "inequity").
#[derive(Debug, Clone)]
pub struct BiasDetector {
    lexicons: Arc<LexiconSet>,
}

impl Default for BiasDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl BiasDetector {
    pub fn new() -> Self {
        Self {
            lexicons: LexiconSet::builtin(),
        }
    }

    pub fn with_lexicons(lexicons: LexiconSet) -> Self {
        Self {
            lexicons: Arc::new(lexicons),
        }
    }

    pub fn detect_political_bias(&self, text: &str) -> Outcome<BiasResult> {
        if text.trim().is_empty() {
            return Outcome::Computed(BiasResult::neutral());
        }
        guarded("Political bias detection", BiasResult::neutral, || {
            self.score_political(&normalize(text))
        })
    }

    pub fn detect_sensationalism(&self, text: &str) -> Outcome<SensationalismResult> {
        if text.trim().is_empty() {
            return Outcome::Computed(SensationalismResult::factual());
        }
        guarded("Sensationalism detection", SensationalismResult::factual, || {
            self.score_sensationalism(&normalize(text))
        })
    }

    pub fn analyze_text(&self, text: &str) -> BiasAnalysis {
        BiasAnalysis {
            political_bias: self.detect_political_bias(text),
            sensationalism: self.detect_sensationalism(text),
            analyzed_at: Utc::now(),
        }
    }

    /// Score an article with its title counted twice.
    pub fn analyze_article(&self, fields: &ArticleFields) -> BiasAnalysis {
        match fields.weighted_text(None) {
            Some(text) => self.analyze_text(&text),
            None => BiasAnalysis {
                political_bias: Outcome::Computed(BiasResult::neutral()),
                sensationalism: Outcome::Computed(SensationalismResult::factual()),
                analyzed_at: Utc::now(),
            },
        }
    }

    fn score_political(&self, normalized: &str) -> Result<BiasResult> {
        let left = count_terms(&self.lexicons.left, normalized);
        let right = count_terms(&self.lexicons.right, normalized);
        let neutral = count_terms(&self.lexicons.neutral, normalized);

        let left_score = weighted_sum(&left);
        let right_score = weighted_sum(&right);
        let neutral_score = weighted_sum(&neutral);
        let political_weight = left_score + right_score;

        let matches = PoliticalMatches {
            left,
            right,
            neutral,
        };

        if political_weight == 0.0 {
            return Ok(BiasResult {
                matches,
                ..BiasResult::neutral()
            });
        }

        let raw_score = (right_score - left_score) / political_weight;
        ensure!(raw_score.is_finite(), "political score is not finite");

        let matched_terms = (matches.left.len() + matches.right.len()) as f64;
        let raw_confidence = (matched_terms / POLITICAL_TERMS_FOR_CONFIDENCE)
            * (political_weight / (political_weight + neutral_score + 0.1));

        let mut score = round2(raw_score.clamp(-1.0, 1.0));
        let confidence = round2(clamp_unit(raw_confidence.min(1.0)));

        let mut label = if score < -LEAN_THRESHOLD {
            PoliticalLabel::LeftLeaning
        } else if score > LEAN_THRESHOLD {
            PoliticalLabel::RightLeaning
        } else {
            PoliticalLabel::Centrist
        };

        if confidence < MIN_POLITICAL_CONFIDENCE {
            label = PoliticalLabel::Neutral;
            score = 0.0;
        }

        debug!(
            "Political bias - left={:.2}, right={:.2}, neutral={:.2}, score={}, confidence={}",
            left_score, right_score, neutral_score, score, confidence
        );

        Ok(BiasResult {
            score,
            label,
            confidence,
            matches,
        })
    }

    fn score_sensationalism(&self, normalized: &str) -> Result<SensationalismResult> {
        let matches = count_terms(&self.lexicons.sensationalist, normalized);
        if matches.is_empty() {
            return Ok(SensationalismResult::factual());
        }

        let weighted = weighted_sum(&matches);
        ensure!(weighted.is_finite(), "sensationalism score is not finite");

        let score = round2(clamp_unit(weighted / SENSATIONAL_SATURATION));
        let confidence = round2(clamp_unit(
            matches.len() as f64 / SENSATIONAL_TERMS_FOR_CONFIDENCE,
        ));

        debug!(
            "Sensationalism - weighted={:.2}, score={}, confidence={}",
            weighted, score, confidence
        );

        Ok(SensationalismResult {
            score,
            label: SensationalismLabel::from_score(score),
            confidence,
            matches,
        })
    }
}

fn count_terms(lexicon: &Lexicon, normalized: &str) -> TermMatches {
    lexicon
        .iter()
        .filter_map(|(term, weight)| {
            let count = normalized.matches(term).count();
            (count > 0).then(|| (term.to_string(), TermMatch { count, weight }))
        })
        .collect()
}

fn weighted_sum(matches: &TermMatches) -> f64 {
    matches
        .values()
        .map(|m| m.count as f64 * m.weight)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> BiasDetector {
        BiasDetector::new()
    }

    // ==================== Political Bias Tests ====================

    #[test]
    fn test_empty_text_is_neutral() {
        let outcome = detector().detect_political_bias("");
        assert!(!outcome.is_degraded());
        let result = outcome.value();
        assert_eq!(result.score, 0.0);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.label, PoliticalLabel::Neutral);
    }

    #[test]
    fn test_right_leaning_text() {
        let result = detector()
            .detect_political_bias("Conservative tax cuts and free market reforms")
            .into_value();
        assert_eq!(result.label, PoliticalLabel::RightLeaning);
        assert!(result.score > 0.3);
        assert_eq!(result.score, 1.0);
        assert_eq!(result.confidence, 0.28);
        assert_eq!(result.matches.right.len(), 3);
        assert!(result.matches.left.is_empty());
    }

    #[test]
    fn test_left_leaning_text() {
        let result = detector()
            .detect_political_bias("Progressive universal healthcare and social justice")
            .into_value();
        assert_eq!(result.label, PoliticalLabel::LeftLeaning);
        assert!(result.score < -0.3);
        assert_eq!(result.matches.left["universal healthcare"].weight, 0.7);
    }

    #[test]
    fn test_low_confidence_forces_neutral() {
        // One term: confidence = 0.1 * 0.5 / 0.6 ≈ 0.08
        let result = detector()
            .detect_political_bias("The conservative candidate spoke today")
            .into_value();
        assert_eq!(result.label, PoliticalLabel::Neutral);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.confidence, 0.08);
        assert_eq!(result.matches.right["conservative"].count, 1);
    }

    #[test]
    fn test_mixed_terms_are_centrist() {
        let text = "Progressive groups and conservative think tanks debated \
                    universal healthcare, private healthcare, gun control and gun rights.";
        let result = detector().detect_political_bias(text).into_value();
        // left 0.5+0.7+0.7 = 1.9, right 0.5+0.6+0.7 = 1.8
        assert_eq!(result.label, PoliticalLabel::Centrist);
        assert_eq!(result.score, -0.03);
        assert!(result.confidence >= 0.2);
    }

    #[test]
    fn test_neutral_terms_dilute_confidence() {
        let base = "Conservative tax cuts and free market reforms";
        let diluted = "Conservative tax cuts and free market reforms: policy, legislation, \
                       government, congress, senate, election";
        let plain = detector().detect_political_bias(base).into_value();
        let with_neutral = detector().detect_political_bias(diluted).into_value();
        // Neutral terms weigh 0.0, so only the +0.1 smoothing applies.
        assert_eq!(plain.confidence, with_neutral.confidence);
        assert_eq!(with_neutral.matches.neutral.len(), 6);
    }

    #[test]
    fn test_counts_repeated_terms() {
        let result = detector()
            .detect_political_bias("tax cuts, tax cuts, TAX CUTS")
            .into_value();
        assert_eq!(result.matches.right["tax cuts"].count, 3);
    }

    #[test]
    fn test_substring_matching_inside_words() {
        let result = detector()
            .detect_political_bias("Inequity persists")
            .into_value();
        assert_eq!(result.matches.left["equity"].count, 1);
    }

    #[test]
    fn test_unrelated_text_is_exactly_neutral_and_stable() {
        let text = "The museum opened a new wing dedicated to maritime history.";
        let first = detector().detect_political_bias(text).into_value();
        let second = detector().detect_political_bias(text).into_value();
        assert_eq!(first, second);
        assert_eq!(first.score, 0.0);
        assert_eq!(first.confidence, 0.0);
        assert_eq!(first.label, PoliticalLabel::Neutral);
    }

    #[test]
    fn test_scores_stay_in_range() {
        let samples = [
            "defund the police green new deal systemic racism",
            "border security second amendment pro-life deregulation ted cruz",
            "policy policy policy",
            "!!!",
            "liberal conservative liberal conservative",
        ];
        for text in samples {
            let result = detector().detect_political_bias(text).into_value();
            assert!((-1.0..=1.0).contains(&result.score), "{}", text);
            assert!((0.0..=1.0).contains(&result.confidence), "{}", text);
        }
    }

    // ==================== Sensationalism Tests ====================

    #[test]
    fn test_sensational_text_is_highly_sensational() {
        let text = "SHOCKING BOMBSHELL: Devastating chaos erupts as outrageous scandal explodes. \
                    You won't believe the horrific, catastrophic meltdown. Absolutely the worst \
                    ever nightmare, utterly terrifying mayhem!";
        let result = detector().detect_sensationalism(text).into_value();
        assert_eq!(result.label, SensationalismLabel::HighlySensational);
        assert!(result.score >= 0.6);
        assert_eq!(result.score, 1.0);
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_few_sensational_terms_are_factual() {
        let result = detector()
            .detect_sensationalism("SHOCKING BOMBSHELL... DEVASTATING... CHAOS")
            .into_value();
        // 0.7 + 0.8 + 0.7 + 0.6 = 2.8 weighted hits
        assert_eq!(result.score, 0.28);
        assert_eq!(result.label, SensationalismLabel::Factual);
        assert_eq!(result.confidence, 0.5);
    }

    #[test]
    fn test_somewhat_sensational_band() {
        let text = "Shocking bombshell: devastating chaos and a scandal, a total meltdown";
        let result = detector().detect_sensationalism(text).into_value();
        // 0.7 + 0.8 + 0.7 + 0.6 + 0.7 + 0.7 = 4.2
        assert_eq!(result.score, 0.42);
        assert_eq!(result.label, SensationalismLabel::SomewhatSensational);
    }

    #[test]
    fn test_no_sensational_terms() {
        let result = detector()
            .detect_sensationalism("The committee met on Tuesday.")
            .into_value();
        assert_eq!(result, SensationalismResult::factual());
    }

    #[test]
    fn test_empty_text_is_factual() {
        let result = detector().detect_sensationalism("   ").into_value();
        assert_eq!(result.label, SensationalismLabel::Factual);
        assert_eq!(result.confidence, 0.0);
    }

    // ==================== Article Tests ====================

    #[test]
    fn test_analyze_article_weights_title() {
        let fields = ArticleFields::new("Tax cuts").with_content("Lawmakers met.");
        let analysis = detector().analyze_article(&fields);
        let bias = analysis.political_bias.value();
        assert_eq!(bias.matches.right["tax cuts"].count, 2);
    }

    #[test]
    fn test_analyze_article_without_text() {
        let analysis = detector().analyze_article(&ArticleFields::default());
        assert_eq!(*analysis.political_bias.value(), BiasResult::neutral());
        assert_eq!(
            *analysis.sensationalism.value(),
            SensationalismResult::factual()
        );
        assert!(!analysis.political_bias.is_degraded());
    }

    #[test]
    fn test_custom_lexicons() {
        let lexicons = LexiconSet {
            left: Lexicon::new([("solidarity", 1.0)]).unwrap(),
            right: Lexicon::new([("enterprise", 1.0)]).unwrap(),
            sensationalist: Lexicon::new([("wow", 1.0)]).unwrap(),
            neutral: Lexicon::default(),
        };
        let detector = BiasDetector::with_lexicons(lexicons);
        let result = detector
            .detect_political_bias("solidarity solidarity solidarity")
            .into_value();
        // one distinct term: confidence = 0.1 * 3 / 3.1 ≈ 0.1 → neutral
        assert_eq!(result.label, PoliticalLabel::Neutral);
        assert_eq!(result.matches.left["solidarity"].count, 3);
    }

    #[test]
    fn test_labels_serialize_kebab_case() {
        assert_eq!(
            serde_json::to_value(PoliticalLabel::LeftLeaning).unwrap(),
            "left-leaning"
        );
        assert_eq!(
            serde_json::to_value(SensationalismLabel::SomewhatSensational).unwrap(),
            "somewhat-sensational"
        );
    }
}
