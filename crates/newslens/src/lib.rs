// Public modules
pub mod analyzer;
pub mod bias;
pub mod config;
pub mod lexicons;
pub mod models;
pub mod outcome;
pub mod sentiment;
pub mod stats;
pub mod store;
pub mod summarizer;
pub mod text;

// Re-export commonly used types
pub use analyzer::{ArticleAnalyzer, StalenessChecklist};
pub use bias::{BiasDetector, BiasResult, PoliticalLabel, SensationalismLabel, SensationalismResult};
pub use config::AnalysisConfig;
pub use lexicons::{Lexicon, LexiconSet};
pub use models::{ArticleAnalysis, ArticleFields, ArticleRecord, BatchResult, BatchScope, SummaryBundle};
pub use outcome::Outcome;
pub use sentiment::{SentimentLabel, SentimentResult, SentimentScorer, VaderSentimentScorer};
pub use stats::{AnalysisStatistics, SourceStatistics};
pub use store::{ArticleStore, NewArticle, SqliteStore};
pub use summarizer::{ExtractiveOptions, Summarizer};
