use crate::scorer::{PolarityScores, SentimentScorer};
use sentiment_core::{CoreError, SentimentError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SentimentLabel {
    Negative = -1,
    Neutral = 0,
    Positive = 1,
}

impl SentimentLabel {
    pub fn value(self) -> i8 {
        self as i8
    }
}

/// Scores and label of a single comment, kept only while its post is aggregated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommentPolarity {
    pub scores: PolarityScores,
    pub label: SentimentLabel,
}

/// Maps compound scores to discrete labels using strict thresholds: a score
/// equal to a threshold is neutral.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelClassifier {
    positive_threshold: f64,
    negative_threshold: f64,
}

impl LabelClassifier {
    pub const DEFAULT_POSITIVE_THRESHOLD: f64 = 0.1;
    pub const DEFAULT_NEGATIVE_THRESHOLD: f64 = -0.1;

    pub fn new(positive_threshold: f64, negative_threshold: f64) -> Result<Self, CoreError> {
        if negative_threshold.is_nan()
            || positive_threshold.is_nan()
            || negative_threshold > positive_threshold
        {
            return Err(SentimentError::InvalidThresholds {
                negative: negative_threshold,
                positive: positive_threshold,
            }
            .into());
        }

        Ok(Self {
            positive_threshold,
            negative_threshold,
        })
    }

    pub fn classify(&self, compound: f64) -> SentimentLabel {
        if compound > self.positive_threshold {
            SentimentLabel::Positive
        } else if compound < self.negative_threshold {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }

    pub fn polarity(&self, scores: PolarityScores) -> CommentPolarity {
        CommentPolarity {
            scores,
            label: self.classify(scores.compound),
        }
    }

    /// Arithmetic mean of the labels; 0.0 when there are none.
    pub fn average(labels: &[SentimentLabel]) -> f64 {
        if labels.is_empty() {
            return 0.0;
        }
        let total: i64 = labels.iter().map(|label| i64::from(label.value())).sum();
        total as f64 / labels.len() as f64
    }

    /// Scores, labels and averages a batch of comment bodies.
    pub fn average_sentiment<S, T>(&self, scorer: &S, texts: &[T]) -> f64
    where
        S: SentimentScorer + ?Sized,
        T: AsRef<str>,
    {
        let labels: Vec<SentimentLabel> = texts
            .iter()
            .map(|text| self.polarity(scorer.score(text.as_ref())).label)
            .collect();
        Self::average(&labels)
    }
}

impl Default for LabelClassifier {
    fn default() -> Self {
        Self {
            positive_threshold: Self::DEFAULT_POSITIVE_THRESHOLD,
            negative_threshold: Self::DEFAULT_NEGATIVE_THRESHOLD,
        }
    }
}
