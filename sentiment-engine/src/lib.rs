pub mod classifier;
pub mod scorer;

pub use classifier::{CommentPolarity, LabelClassifier, SentimentLabel};
pub use scorer::{PolarityScores, SentimentScorer, VaderScorer};
