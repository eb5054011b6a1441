use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Counts of (actual, predicted) label pairs. Rows are actual labels, columns predicted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    labels: Vec<String>,
    counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    /// Builds the matrix over the union of both label sets, sorted.
    pub fn from_predictions(actual: &[String], predicted: &[String]) -> Self {
        let labels: Vec<String> = actual
            .iter()
            .chain(predicted)
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut counts = vec![vec![0; labels.len()]; labels.len()];
        for (a, p) in actual.iter().zip(predicted) {
            if let (Ok(row), Ok(col)) = (labels.binary_search(a), labels.binary_search(p)) {
                counts[row][col] += 1;
            }
        }

        Self { labels, counts }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn count(&self, actual: &str, predicted: &str) -> usize {
        let row = self.labels.iter().position(|l| l == actual);
        let col = self.labels.iter().position(|l| l == predicted);
        match (row, col) {
            (Some(r), Some(c)) => self.counts[r][c],
            _ => 0,
        }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn correct(&self) -> usize {
        (0..self.labels.len()).map(|i| self.counts[i][i]).sum()
    }

    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.correct() as f64 / total as f64
        }
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actual\\predicted")?;
        for label in &self.labels {
            write!(f, "\t{}", label)?;
        }
        writeln!(f)?;
        for (label, row) in self.labels.iter().zip(&self.counts) {
            write!(f, "{}", label)?;
            for count in row {
                write!(f, "\t{}", count)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Held-out performance of a trained classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub accuracy: f64,
    pub n_samples: usize,
    pub confusion: ConfusionMatrix,
}

impl Evaluation {
    pub fn from_predictions(actual: &[String], predicted: &[String]) -> Self {
        let confusion = ConfusionMatrix::from_predictions(actual, predicted);
        Self {
            accuracy: confusion.accuracy(),
            n_samples: actual.len(),
            confusion,
        }
    }
}

/// Outcome of training on an 80/20 style split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub n_train: usize,
    pub n_test: usize,
    pub train_accuracy: f64,
    /// Absent when the configured test fraction left no rows to hold out.
    pub test: Option<Evaluation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_counts_and_accuracy() {
        let actual = labels(&["blue", "blue", "brown", "green"]);
        let predicted = labels(&["blue", "brown", "brown", "brown"]);
        let cm = ConfusionMatrix::from_predictions(&actual, &predicted);

        assert_eq!(cm.labels(), &["blue", "brown", "green"]);
        assert_eq!(cm.count("blue", "blue"), 1);
        assert_eq!(cm.count("blue", "brown"), 1);
        assert_eq!(cm.count("green", "brown"), 1);
        assert_eq!(cm.count("hazel", "brown"), 0);
        assert_eq!(cm.total(), 4);
        assert_eq!(cm.correct(), 2);
        assert!((cm.accuracy() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_empty_matrix() {
        let cm = ConfusionMatrix::from_predictions(&[], &[]);
        assert_eq!(cm.total(), 0);
        assert_eq!(cm.accuracy(), 0.0);
    }

    #[test]
    fn test_display_is_tab_separated() {
        let cm = ConfusionMatrix::from_predictions(&labels(&["a", "b"]), &labels(&["a", "a"]));
        let text = cm.to_string();
        assert_eq!(text, "actual\\predicted\ta\tb\na\t1\t0\nb\t1\t0\n");
    }
}
