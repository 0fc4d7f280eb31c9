use crate::dataset::Dataset;
use std::collections::HashMap;
use std::fmt;

/// How many rows each author contributed, most frequent first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthorStats {
    counts: Vec<(String, usize)>,
}

impl AuthorStats {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let mut tally: HashMap<&str, usize> = HashMap::new();
        for record in dataset.records() {
            *tally.entry(record.author.as_str()).or_insert(0) += 1;
        }

        let mut counts: Vec<(String, usize)> = tally
            .into_iter()
            .map(|(author, count)| (author.to_string(), count))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        Self { counts }
    }

    pub fn counts(&self) -> &[(String, usize)] {
        &self.counts
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl fmt::Display for AuthorStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return writeln!(f, "(no posts collected)");
        }

        let width = self
            .counts
            .iter()
            .map(|(author, _)| author.len())
            .max()
            .unwrap_or(0);
        for (author, count) in &self.counts {
            writeln!(f, "{:<width$}    {}", author, count, width = width)?;
        }
        Ok(())
    }
}
