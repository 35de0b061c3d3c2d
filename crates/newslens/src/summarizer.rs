use anyhow::{Context, Result};
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::models::{ArticleFields, SummaryBundle};
use crate::outcome::{guarded, Outcome};
use crate::text::{char_prefix, normalize, truncate_words, word_jaccard};

const MIN_SENTENCE_CHARS: usize = 10;
const MAX_SIMPLE_SENTENCE_WORDS: usize = 20;
const SHORTENED_SENTENCE_WORDS: usize = 15;
const MAX_TECHNICAL_SENTENCES: usize = 8;
const FALLBACK_MIN_PARAGRAPH_CHARS: usize = 40;
const FALLBACK_MAX_CHARS: usize = 250;
const NEAR_DUPLICATE_JACCARD: f64 = 0.8;

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "an", "the", "and", "but", "or", "for", "nor", "on", "at", "to", "by", "in", "of",
        "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "having", "do",
        "does", "did", "doing", "it", "its", "it's", "that", "they", "them", "their", "this",
        "these", "those", "with", "as", "from", "about", "into",
    ]
    .into_iter()
    .collect()
});

const BREAKING_WORDS: &[&str] = &[
    "and", "but", "or", "so", "because", "as", "since", "although", "though", "while", "whereas",
    "if", "unless", "until", "when", "where", "which", "who", "that", "whose",
];

// Order matters: later glosses are not rewritten by earlier terms.
const TECHNICAL_GLOSSARY: &[(&str, &str)] = &[
    ("algorithm", "step-by-step process"),
    (
        "artificial intelligence",
        "computer systems that can perform tasks that normally need human intelligence",
    ),
    ("machine learning", "computers learning from data"),
    ("neural network", "computer system inspired by the human brain"),
    ("deep learning", "advanced machine learning technique"),
    ("natural language processing", "computers understanding human language"),
    ("computer vision", "computers understanding images and videos"),
    ("data mining", "finding patterns in large datasets"),
    ("blockchain", "secure digital record-keeping system"),
    ("cryptocurrency", "digital currency"),
    ("encryption", "secure coding of information"),
    ("quantum computing", "advanced computing using quantum physics"),
    (
        "augmented reality",
        "technology that adds digital elements to the real world",
    ),
    ("virtual reality", "computer-generated simulation of a 3D environment"),
    ("cloud computing", "using remote servers over the internet"),
    ("internet of things", "everyday devices connected to the internet"),
    ("big data", "extremely large data sets"),
    ("cybersecurity", "protecting computer systems from attacks"),
    ("bandwidth", "data transfer capacity"),
    ("biometrics", "body measurements used for identification"),
    ("api", "way for different software to communicate"),
    ("protocol", "set of rules for data exchange"),
    ("serverless", "cloud computing without managing servers"),
    (
        "microservices",
        "small, independent services that make up an application",
    ),
    (
        "containerization",
        "packaging software code with everything it needs to run",
    ),
    ("devops", "combining software development and IT operations"),
    ("firmware", "software programmed into a device"),
    ("middleware", "software that connects different applications"),
    ("sdk", "set of tools for creating software"),
    ("saas", "software provided as a service over the internet"),
];

/// Knobs for `generate_extractive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractiveOptions {
    pub max_sentences: usize,
    pub min_sentences: usize,
    /// Boost the opening sentence (used for beginner summaries).
    pub prefer_start: bool,
}

impl Default for ExtractiveOptions {
    fn default() -> Self {
        Self {
            max_sentences: 5,
            min_sentences: 2,
            prefer_start: false,
        }
    }
}

#[derive(Debug, Clone)]
struct TechnicalTerm {
    term: String,
    gloss: String,
    pattern: Regex,
}

/// Frequency-ranked extractive summaries plus simplified and
/// term-preserving variants.
#[derive(Debug, Clone)]
pub struct Summarizer {
    glossary: Vec<TechnicalTerm>,
    url_pattern: Regex,
    truncation_marker: Regex,
}

impl Summarizer {
    pub fn new() -> Result<Self> {
        Self::with_glossary(TECHNICAL_GLOSSARY.iter().copied())
    }

    /// Use a custom term → plain-language gloss table. Terms are matched as
    /// whole words, case-insensitively, in the given order.
    pub fn with_glossary<I, T, G>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (T, G)>,
        T: AsRef<str>,
        G: AsRef<str>,
    {
        let glossary = entries
            .into_iter()
            .map(|(term, gloss)| {
                let term = term.as_ref().to_lowercase();
                let pattern = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(&term)))
                    .with_context(|| format!("Invalid technical term pattern: {}", term))?;
                Ok(TechnicalTerm {
                    term,
                    gloss: gloss.as_ref().to_string(),
                    pattern,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            glossary,
            url_pattern: Regex::new(r"https?://\S+").context("Invalid URL pattern")?,
            truncation_marker: Regex::new(r"\s*\[\+\d+ chars\]\s*$")
                .context("Invalid truncation marker pattern")?,
        })
    }

    /// Pick the highest-scoring sentences and return them in document order.
    ///
    /// Texts with no more than `min_sentences` sentences come back unchanged.
    pub fn generate_extractive(&self, text: &str, options: ExtractiveOptions) -> String {
        if text.trim().is_empty() {
            return String::new();
        }

        let preprocessed = self.preprocess(text);
        let sentences = split_sentences(&preprocessed);
        if sentences.len() <= options.min_sentences {
            return text.to_string();
        }

        let frequencies = word_frequencies(&preprocessed);
        let mut scores = score_sentences(&sentences, &frequencies);
        if options.prefer_start {
            scores[0] *= 1.5;
        }

        let take = (sentences.len() / 3)
            .max(options.min_sentences)
            .min(options.max_sentences)
            .min(sentences.len());

        let mut ranked: Vec<usize> = (0..sentences.len()).collect();
        ranked.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
        let mut chosen = ranked[..take].to_vec();
        chosen.sort_unstable();

        debug!(
            "Extractive summary - sentences={}, selected={:?}",
            sentences.len(),
            chosen
        );

        chosen
            .iter()
            .map(|&i| sentences[i].as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Short, plain-language summary aimed at newcomers.
    pub fn generate_beginner(&self, text: &str, max_words: usize) -> String {
        let extractive = self.generate_extractive(
            text,
            ExtractiveOptions {
                max_sentences: 3,
                prefer_start: true,
                ..ExtractiveOptions::default()
            },
        );

        let simplified: Vec<String> = split_sentences(&self.preprocess(&extractive))
            .iter()
            .map(|s| self.simplify_sentence(s))
            .collect();

        truncate_words(&simplified.join(" "), max_words)
    }

    /// Longer summary that keeps every technical term of the source in view.
    pub fn generate_technical(&self, text: &str, max_words: usize) -> String {
        if text.trim().is_empty() {
            return String::new();
        }

        let extractive = self.generate_extractive(
            text,
            ExtractiveOptions {
                max_sentences: 6,
                ..ExtractiveOptions::default()
            },
        );

        let sentences = split_sentences(&self.preprocess(text));
        let mut selected = split_sentences(&self.preprocess(&extractive));

        for term in self.glossary.iter().filter(|t| t.pattern.is_match(text)) {
            if selected.len() >= MAX_TECHNICAL_SENTENCES {
                break;
            }
            if selected.iter().any(|s| term.pattern.is_match(s)) {
                continue;
            }
            if let Some(sentence) = sentences
                .iter()
                .find(|s| term.pattern.is_match(s) && !selected.contains(*s))
            {
                selected.push(sentence.clone());
            }
        }
        selected.truncate(MAX_TECHNICAL_SENTENCES);

        selected.sort_by_key(|s| {
            sentences
                .iter()
                .position(|candidate| candidate == s)
                .unwrap_or(sentences.len())
        });

        truncate_words(&selected.join(" "), max_words)
    }

    /// Swap technical terms for their glosses, shorten long sentences at a
    /// natural break and capitalise the result.
    pub fn simplify_sentence(&self, sentence: &str) -> String {
        let mut simplified = sentence.trim().to_string();
        for term in &self.glossary {
            simplified = term
                .pattern
                .replace_all(&simplified, NoExpand(&term.gloss))
                .into_owned();
        }

        let words: Vec<&str> = simplified.split_whitespace().collect();
        if words.len() > MAX_SIMPLE_SENTENCE_WORDS {
            simplified = shorten(&words);
        }

        capitalize_first(&simplified)
    }

    /// Glossary terms that occur in `text`, in glossary order.
    pub fn identify_technical_terms(&self, text: &str) -> Vec<&str> {
        self.glossary
            .iter()
            .filter(|t| t.pattern.is_match(text))
            .map(|t| t.term.as_str())
            .collect()
    }

    /// Run all three summary variants over an article.
    pub fn summarize_article(&self, fields: &ArticleFields) -> Outcome<SummaryBundle> {
        let Some(text) = article_text(fields) else {
            return Outcome::Computed(SummaryBundle::empty());
        };

        guarded("Article summarization", SummaryBundle::empty, || {
            Ok(SummaryBundle {
                extractive: self.generate_extractive(&text, ExtractiveOptions::default()),
                beginner: self.generate_beginner(&text, 150),
                technical: self.generate_technical(&text, 300),
                generated_at: Utc::now(),
            })
        })
    }

    /// Deterministic summary from title, description and the first
    /// substantial paragraph, capped at 250 characters.
    pub fn fallback_summary(&self, fields: &ArticleFields) -> String {
        let title = fields.title().map(str::trim);
        let description = fields
            .description()
            .map(str::trim)
            .filter(|d| !title.is_some_and(|t| near_duplicate(d, t)));

        let mut parts: Vec<String> = Vec::new();
        if let Some(title) = title {
            parts.push(title.to_string());
        }
        if let Some(description) = description {
            parts.push(description.to_string());
        }

        if let Some(content) = fields.content() {
            let paragraph = content
                .lines()
                .map(|line| self.truncation_marker.replace(line.trim(), "").into_owned())
                .find(|p| {
                    p.chars().count() >= FALLBACK_MIN_PARAGRAPH_CHARS
                        && !title.is_some_and(|t| near_duplicate(p, t))
                        && !description.is_some_and(|d| near_duplicate(p, d))
                });
            if let Some(paragraph) = paragraph {
                parts.push(paragraph);
            }
        }

        let joined = parts.join(" ");
        if joined.chars().count() > FALLBACK_MAX_CHARS {
            format!("{}...", char_prefix(&joined, FALLBACK_MAX_CHARS - 3).trim_end())
        } else {
            joined
        }
    }

    fn preprocess(&self, text: &str) -> String {
        let without_urls = self.url_pattern.replace_all(text, "");
        without_urls.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

/// "Title. Description Content" over whichever fields are present.
fn article_text(fields: &ArticleFields) -> Option<String> {
    let mut text = String::new();
    if let Some(title) = fields.title() {
        text.push_str(title);
        text.push_str(". ");
    }
    if let Some(description) = fields.description() {
        text.push_str(description);
        text.push(' ');
    }
    if let Some(content) = fields.content() {
        text.push_str(content);
    }

    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Split at whitespace following `.`, `?` or `!`, skipping abbreviation
/// periods. Fragments under 10 characters are dropped.
pub fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut sentences = Vec::new();
    let mut start = 0;

    let mut push = |fragment: &[char]| {
        let sentence: String = fragment.iter().collect::<String>().trim().to_string();
        if sentence.chars().count() >= MIN_SENTENCE_CHARS {
            sentences.push(sentence);
        }
    };

    for i in 1..chars.len() {
        if chars[i].is_whitespace()
            && matches!(chars[i - 1], '.' | '?' | '!')
            && !ends_with_abbreviation(&chars[..i])
        {
            push(&chars[start..i]);
            start = i + 1;
        }
    }
    if start < chars.len() {
        push(&chars[start..]);
    }

    sentences
}

fn ends_with_abbreviation(before: &[char]) -> bool {
    let n = before.len();
    if n < 2 || before[n - 1] != '.' {
        return false;
    }

    // Dotted acronyms: "U.S.", "e.g."
    if n >= 4 && before[n - 4].is_alphanumeric() && before[n - 3] == '.' && before[n - 2].is_alphanumeric() {
        return true;
    }

    let token_start = before[..n - 1]
        .iter()
        .rposition(|c| c.is_whitespace())
        .map_or(0, |p| p + 1);
    let token = &before[token_start..n - 1];

    match token {
        // Initials: "J. Smith"
        [c] => c.is_uppercase(),
        // Short titles: "Mr.", "Dr.", "St."
        [a, b] => a.is_uppercase() && b.is_lowercase(),
        _ => false,
    }
}

fn word_frequencies(text: &str) -> HashMap<String, f64> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for word in normalize(text)
        .split_whitespace()
        .filter(|w| !STOP_WORDS.contains(w))
    {
        *counts.entry(word.to_string()).or_insert(0) += 1;
    }

    let max = counts.values().copied().max().unwrap_or(1) as f64;
    counts
        .into_iter()
        .map(|(word, count)| (word, count as f64 / max))
        .collect()
}

fn score_sentences(sentences: &[String], frequencies: &HashMap<String, f64>) -> Vec<f64> {
    let n = sentences.len();
    let quarter = (n / 4).max(1);

    sentences
        .iter()
        .enumerate()
        .map(|(i, sentence)| {
            let normalized = normalize(sentence);
            let words: Vec<&str> = normalized.split_whitespace().collect();
            let mut score = if words.is_empty() {
                0.0
            } else {
                words.iter().filter_map(|w| frequencies.get(*w)).sum::<f64>() / words.len() as f64
            };

            if i < quarter {
                score *= 1.25;
            } else if i >= n - quarter {
                score *= 1.15;
            }
            if sentence.contains('?') {
                score *= 1.2;
            }
            score
        })
        .collect()
}

/// Cut at the breaking word nearest the midpoint (within three words either
/// side), else keep the first 15 words.
fn shorten(words: &[&str]) -> String {
    let mid = words.len() / 2;
    let cut = (mid.saturating_sub(3)..=mid + 3)
        .filter(|&i| i < words.len() && is_breaking_word(words[i]))
        .min_by_key(|&i| i.abs_diff(mid));

    let kept = match cut {
        Some(i) => &words[..=i],
        None => &words[..SHORTENED_SENTENCE_WORDS.min(words.len())],
    };

    let mut shortened = kept.join(" ");
    let trimmed_len = shortened.trim_end_matches(|c: char| c.is_ascii_punctuation()).len();
    shortened.truncate(trimmed_len);
    shortened.push('.');
    shortened
}

fn is_breaking_word(word: &str) -> bool {
    let bare = word
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();
    BREAKING_WORDS.contains(&bare.as_str())
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Same text for summary purposes: identical once normalized, or sharing
/// most of their words.
fn near_duplicate(a: &str, b: &str) -> bool {
    let (na, nb) = (normalize(a), normalize(b));
    if na.is_empty() || nb.is_empty() {
        return false;
    }
    na == nb || word_jaccard(a, b) >= NEAR_DUPLICATE_JACCARD
}
