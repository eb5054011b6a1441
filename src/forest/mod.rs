//! Random forest classifier over small ordinal feature vectors.
//!
//! This is the statistical learner behind every trait model. The engine only
//! relies on its contract: `fit` on a labelled matrix, then `predict_proba`
//! gives one probability per class (classes in sorted order, summing to 1),
//! and the same seed and data always produce the same forest.
//!
//! # Determinism
//!
//! Tree `i` draws its bootstrap sample and feature orders from a generator
//! seeded with `seed + i`. Trees are grown in parallel but collected in index
//! order, so thread scheduling never changes the result.

mod sampling;
mod tree;

pub use sampling::train_test_split;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;
use tree::{DecisionTree, TreeLimits};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForestError {
    #[error("training set is empty")]
    EmptyTrainingSet,

    #[error("{rows} feature rows but {labels} labels")]
    LabelCountMismatch { rows: usize, labels: usize },

    #[error("row {row} has {actual} features, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("forest needs at least one tree")]
    NoTrees,

    #[error("got {actual} features, forest was trained on {expected}")]
    FeatureCount { expected: usize, actual: usize },

    #[error("malformed forest: {0}")]
    Malformed(String),
}

/// Hyper-parameters for [`RandomForest::fit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub seed: u64,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Features examined per split; `None` means `sqrt(n_features)`.
    pub max_features: Option<usize>,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            seed: 42,
            max_depth: None,
            min_samples_split: 2,
            max_features: None,
        }
    }
}

impl ForestParams {
    fn features_per_split(&self, n_features: usize) -> usize {
        let wanted = self
            .max_features
            .unwrap_or_else(|| (n_features as f64).sqrt() as usize);
        wanted.clamp(1, n_features.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    classes: Vec<String>,
    n_features: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn fit(
        params: &ForestParams,
        rows: &[Vec<u8>],
        labels: &[String],
    ) -> Result<Self, ForestError> {
        Self::fit_with_progress(params, rows, labels, || {})
    }

    /// Like [`fit`](Self::fit), calling `on_tree` once per finished tree.
    pub fn fit_with_progress<F>(
        params: &ForestParams,
        rows: &[Vec<u8>],
        labels: &[String],
        on_tree: F,
    ) -> Result<Self, ForestError>
    where
        F: Fn() + Sync,
    {
        if rows.is_empty() {
            return Err(ForestError::EmptyTrainingSet);
        }
        if rows.len() != labels.len() {
            return Err(ForestError::LabelCountMismatch {
                rows: rows.len(),
                labels: labels.len(),
            });
        }
        if params.n_estimators == 0 {
            return Err(ForestError::NoTrees);
        }

        let n_features = rows[0].len();
        if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != n_features) {
            return Err(ForestError::RaggedRow {
                row,
                expected: n_features,
                actual: r.len(),
            });
        }

        let classes: Vec<String> = labels
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let encoded: Vec<usize> = labels
            .iter()
            .map(|l| classes.binary_search(l).unwrap_or_default())
            .collect();

        let limits = TreeLimits {
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split.max(2),
            max_features: params.features_per_split(n_features),
        };

        let trees: Vec<DecisionTree> = (0..params.n_estimators)
            .into_par_iter()
            .map(|i| {
                let mut rng = sampling::tree_rng(params.seed, i);
                let samples = sampling::bootstrap_rows(rows.len(), &mut rng);
                let tree =
                    DecisionTree::fit(rows, &encoded, classes.len(), samples, limits, &mut rng);
                on_tree();
                tree
            })
            .collect();

        tracing::debug!(
            trees = trees.len(),
            classes = classes.len(),
            n_features,
            nodes = trees.iter().map(DecisionTree::n_nodes).sum::<usize>(),
            "random forest fitted"
        );

        Ok(Self {
            params: params.clone(),
            classes,
            n_features,
            trees,
        })
    }

    /// Class labels in the order used by [`predict_proba`](Self::predict_proba).
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    /// Structural checks for a forest that did not come from [`fit`](Self::fit).
    ///
    /// Prediction indexes into classes, features and node arrays without
    /// bounds checks of its own, so a restored forest must pass this first.
    pub fn validate(&self) -> Result<(), ForestError> {
        if self.trees.is_empty() {
            return Err(ForestError::Malformed("no trees".to_string()));
        }
        if self.classes.is_empty() {
            return Err(ForestError::Malformed("no classes".to_string()));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features, self.classes.len())
                .map_err(|e| ForestError::Malformed(format!("tree {}: {}", i, e)))?;
        }
        Ok(())
    }

    /// Mean of the per-tree leaf distributions.
    pub fn predict_proba(&self, features: &[u8]) -> Result<Vec<f64>, ForestError> {
        if features.len() != self.n_features {
            return Err(ForestError::FeatureCount {
                expected: self.n_features,
                actual: features.len(),
            });
        }

        let mut proba = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            for (p, d) in proba.iter_mut().zip(tree.predict_distribution(features)) {
                *p += d;
            }
        }
        let n_trees = self.trees.len() as f64;
        proba.iter_mut().for_each(|p| *p /= n_trees);
        Ok(proba)
    }

    /// Most probable class and its probability. Ties go to the first class.
    pub fn predict_with_confidence(&self, features: &[u8]) -> Result<(&str, f64), ForestError> {
        let proba = self.predict_proba(features)?;
        let mut best = 0;
        for (i, p) in proba.iter().enumerate() {
            if *p > proba[best] {
                best = i;
            }
        }
        Ok((self.classes[best].as_str(), proba[best]))
    }

    pub fn predict(&self, features: &[u8]) -> Result<&str, ForestError> {
        self.predict_with_confidence(features).map(|(label, _)| label)
    }
}
