use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::sync::Arc;

// Weights express how strongly a term signals its category, in [0, 1].

const LEFT_LEANING_TERMS: &[(&str, f64)] = &[
    // Progressive/liberal terminology
    ("progressive", 0.5),
    ("liberal", 0.5),
    ("social justice", 0.6),
    ("universal healthcare", 0.7),
    ("wealth inequality", 0.6),
    ("income inequality", 0.6),
    ("climate crisis", 0.6),
    ("reproductive rights", 0.7),
    ("pro-choice", 0.7),
    ("gun control", 0.7),
    ("systemic racism", 0.8),
    ("defund the police", 0.9),
    ("green new deal", 0.8),
    ("transgender rights", 0.7),
    ("democratic socialism", 0.8),
    ("living wage", 0.6),
    ("workers' rights", 0.6),
    ("union rights", 0.6),
    ("marginalized communities", 0.7),
    ("equity", 0.6),
    // Figures
    ("alexandria ocasio-cortez", 0.7),
    ("bernie sanders", 0.7),
    ("elizabeth warren", 0.6),
    ("ilhan omar", 0.7),
];

const RIGHT_LEANING_TERMS: &[(&str, f64)] = &[
    // Conservative terminology
    ("conservative", 0.5),
    ("traditional values", 0.6),
    ("free market", 0.6),
    ("small government", 0.7),
    ("lower taxes", 0.6),
    ("tax cuts", 0.6),
    ("deregulation", 0.7),
    ("pro-life", 0.7),
    ("second amendment", 0.7),
    ("gun rights", 0.7),
    ("individual liberty", 0.6),
    ("religious freedom", 0.6),
    ("family values", 0.6),
    ("border security", 0.7),
    ("law and order", 0.6),
    ("tough on crime", 0.6),
    ("national security", 0.5),
    ("private healthcare", 0.6),
    ("patriotism", 0.5),
    ("illegal immigration", 0.7),
    // Figures
    ("donald trump", 0.6),
    ("ron desantis", 0.7),
    ("ted cruz", 0.7),
];

const SENSATIONALIST_TERMS: &[(&str, f64)] = &[
    // Extreme descriptors
    ("outrageous", 0.7),
    ("shocking", 0.7),
    ("bombshell", 0.8),
    ("explosive", 0.8),
    ("horrific", 0.7),
    ("devastating", 0.7),
    ("destruction", 0.6),
    ("catastrophic", 0.7),
    ("crisis", 0.5),
    ("scandal", 0.7),
    ("slams", 0.6),
    ("blasts", 0.6),
    ("destroys", 0.8),
    ("erupts", 0.6),
    ("meltdown", 0.7),
    ("chaos", 0.6),
    ("mayhem", 0.7),
    ("nightmare", 0.7),
    ("disaster", 0.6),
    ("emergency", 0.5),
    // Absolutist language
    ("absolutely", 0.5),
    ("completely", 0.5),
    ("totally", 0.5),
    ("utterly", 0.6),
    ("never", 0.4),
    ("always", 0.4),
    ("every", 0.4),
    ("all", 0.3),
    // Hyperbole
    ("worst ever", 0.8),
    ("best ever", 0.7),
    ("greatest", 0.5),
    ("perfect", 0.5),
    ("incredible", 0.5),
    ("unbelievable", 0.6),
    ("massive", 0.5),
    ("huge", 0.4),
    ("enormous", 0.5),
    ("terrifying", 0.7),
    ("jaw-dropping", 0.8),
    ("mind-blowing", 0.7),
    // Clickbait
    ("you won't believe", 0.9),
    ("what happens next", 0.8),
    ("will shock you", 0.9),
    ("breaking news", 0.5),
    ("this changes everything", 0.8),
];

const NEUTRAL_POLITICAL_TERMS: &[(&str, f64)] = &[
    ("policy", 0.0),
    ("legislation", 0.0),
    ("government", 0.0),
    ("congress", 0.0),
    ("senate", 0.0),
    ("representative", 0.0),
    ("politician", 0.0),
    ("election", 0.0),
    ("vote", 0.0),
    ("ballot", 0.0),
    ("democracy", 0.0),
    ("republic", 0.0),
    ("constitution", 0.0),
    ("law", 0.0),
    ("regulation", 0.0),
];

static BUILTIN: Lazy<Arc<LexiconSet>> = Lazy::new(|| {
    Arc::new(LexiconSet {
        left: Lexicon::from_static(LEFT_LEANING_TERMS),
        right: Lexicon::from_static(RIGHT_LEANING_TERMS),
        sensationalist: Lexicon::from_static(SENSATIONALIST_TERMS),
        neutral: Lexicon::from_static(NEUTRAL_POLITICAL_TERMS),
    })
});

/// A case-folded term → weight table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lexicon {
    terms: BTreeMap<String, f64>,
}

impl Lexicon {
    /// Build a lexicon from user-supplied entries, rejecting empty terms,
    /// duplicates after case folding, and weights outside [0, 1].
    pub fn new<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut terms = BTreeMap::new();
        for (term, weight) in entries {
            let folded = term.as_ref().trim().to_lowercase();
            if folded.is_empty() {
                bail!("Lexicon terms must not be empty");
            }
            if !weight.is_finite() || !(0.0..=1.0).contains(&weight) {
                bail!("Weight {} for term '{}' is outside [0, 1]", weight, folded);
            }
            if terms.insert(folded.clone(), weight).is_some() {
                bail!("Duplicate lexicon term '{}'", folded);
            }
        }
        Ok(Self { terms })
    }

    fn from_static(entries: &[(&str, f64)]) -> Self {
        Self {
            terms: entries
                .iter()
                .map(|(term, weight)| (term.to_lowercase(), *weight))
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.terms.iter().map(|(term, weight)| (term.as_str(), *weight))
    }

    pub fn weight(&self, term: &str) -> Option<f64> {
        self.terms.get(&term.to_lowercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// The four tables the bias detector scores against.
#[derive(Debug, Clone, PartialEq)]
pub struct LexiconSet {
    pub left: Lexicon,
    pub right: Lexicon,
    pub sensationalist: Lexicon,
    pub neutral: Lexicon,
}

impl LexiconSet {
    /// Shared handle to the built-in tables, built once per process.
    pub fn builtin() -> Arc<LexiconSet> {
        Arc::clone(&BUILTIN)
    }
}
