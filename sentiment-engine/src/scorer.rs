//! Lexicon-based polarity scoring.
//!
//! Scoring uses VADER (Valence Aware Dictionary and sEntiment Reasoner), which
//! is tuned for short social media text such as Reddit comments.

use sentiment_core::{CoreError, SentimentError};
use tracing::{debug, error};
use vader_sentiment::SentimentIntensityAnalyzer;

const POSITIVE_PROBE: &str = "This is a great and wonderful day";
const NEGATIVE_PROBE: &str = "This is a horrible and awful day";

/// Polarity of one piece of text. `compound` is normalized to [-1, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolarityScores {
    pub negative: f64,
    pub neutral: f64,
    pub positive: f64,
    pub compound: f64,
}

impl PolarityScores {
    pub fn neutral() -> Self {
        Self {
            negative: 0.0,
            neutral: 1.0,
            positive: 0.0,
            compound: 0.0,
        }
    }
}

/// Pure mapping from text to polarity scores.
pub trait SentimentScorer {
    fn score(&self, text: &str) -> PolarityScores;

    /// Fails with `LexiconUnavailable` unless a clearly positive and a clearly
    /// negative phrase score with opposite polarity.
    fn check_lexicon(&self) -> Result<(), CoreError> {
        let positive = self.score(POSITIVE_PROBE).compound;
        let negative = self.score(NEGATIVE_PROBE).compound;
        if positive > 0.0 && negative < 0.0 {
            return Ok(());
        }

        error!(
            "Sentiment lexicon probe failed: positive={}, negative={}",
            positive, negative
        );
        Err(SentimentError::LexiconUnavailable {
            reason: format!(
                "probe phrases scored {} and {}, expected opposite polarity",
                positive, negative
            ),
        }
        .into())
    }
}

pub struct VaderScorer {
    analyzer: SentimentIntensityAnalyzer<'static>,
}

impl VaderScorer {
    /// Builds the analyzer and checks that its lexicon actually scores text.
    /// Must succeed before any collection starts.
    pub fn load() -> Result<Self, CoreError> {
        let scorer = Self {
            analyzer: SentimentIntensityAnalyzer::new(),
        };
        scorer.check_lexicon()?;

        debug!("VADER lexicon loaded");
        Ok(scorer)
    }
}

impl SentimentScorer for VaderScorer {
    fn score(&self, text: &str) -> PolarityScores {
        if text.trim().is_empty() {
            return PolarityScores::neutral();
        }

        let scores = self.analyzer.polarity_scores(text);
        let value = |key: &str| scores.get(key).copied().unwrap_or(0.0);

        PolarityScores {
            negative: value("neg"),
            neutral: value("neu"),
            positive: value("pos"),
            compound: value("compound"),
        }
    }
}
