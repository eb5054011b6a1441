//! CART classification tree grown on Gini impurity.
//!
//! Nodes live in a flat vector; child links are indices into it and node 0 is
//! the root. Leaves store the normalized class distribution of the training
//! rows that reached them.

use super::sampling::shuffled_features;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) enum Node {
    Split {
        feature: usize,
        threshold: f32,
        left: usize,
        right: usize,
    },
    Leaf {
        distribution: Vec<f64>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct DecisionTree {
    nodes: Vec<Node>,
}

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TreeLimits {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub max_features: usize,
}

struct Candidate {
    feature: usize,
    threshold: f32,
    impurity: f64,
}

/// Borrowed training data shared by every node of one tree.
struct GrowContext<'a, R: Rng> {
    rows: &'a [Vec<u8>],
    labels: &'a [usize],
    n_classes: usize,
    n_features: usize,
    limits: TreeLimits,
    rng: &'a mut R,
}

fn class_counts(samples: &[usize], labels: &[usize], n_classes: usize) -> Vec<f64> {
    let mut counts = vec![0.0; n_classes];
    for &s in samples {
        counts[labels[s]] += 1.0;
    }
    counts
}

fn gini(counts: &[f64], total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    1.0 - counts.iter().map(|c| (c / total) * (c / total)).sum::<f64>()
}

fn normalized(counts: &[f64]) -> Vec<f64> {
    let total: f64 = counts.iter().sum();
    if total <= 0.0 {
        let uniform = 1.0 / counts.len().max(1) as f64;
        return vec![uniform; counts.len()];
    }
    counts.iter().map(|c| c / total).collect()
}

impl DecisionTree {
    /// Grows a tree over the rows listed in `samples` (repeats allowed).
    pub(crate) fn fit<R: Rng>(
        rows: &[Vec<u8>],
        labels: &[usize],
        n_classes: usize,
        samples: Vec<usize>,
        limits: TreeLimits,
        rng: &mut R,
    ) -> Self {
        let n_features = rows.first().map(Vec::len).unwrap_or(0);
        let mut ctx = GrowContext {
            rows,
            labels,
            n_classes,
            n_features,
            limits,
            rng,
        };
        let mut tree = DecisionTree { nodes: Vec::new() };
        tree.grow(&mut ctx, samples, 0);
        tree
    }

    fn grow<R: Rng>(
        &mut self,
        ctx: &mut GrowContext<'_, R>,
        samples: Vec<usize>,
        depth: usize,
    ) -> usize {
        let counts = class_counts(&samples, ctx.labels, ctx.n_classes);
        let node_id = self.nodes.len();
        self.nodes.push(Node::Leaf {
            distribution: normalized(&counts),
        });

        let pure = counts.iter().filter(|&&c| c > 0.0).count() <= 1;
        let depth_reached = ctx.limits.max_depth.is_some_and(|max| depth >= max);
        if pure || depth_reached || samples.len() < ctx.limits.min_samples_split {
            return node_id;
        }

        let Some(split) = best_split(ctx, &samples, &counts) else {
            return node_id;
        };

        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&s| (ctx.rows[s][split.feature] as f32) <= split.threshold);

        let left_id = self.grow(ctx, left, depth + 1);
        let right_id = self.grow(ctx, right, depth + 1);
        self.nodes[node_id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: left_id,
            right: right_id,
        };
        node_id
    }

    /// Class distribution of the leaf `features` falls into.
    pub(crate) fn predict_distribution(&self, features: &[u8]) -> &[f64] {
        let mut node = 0;
        loop {
            match &self.nodes[node] {
                Node::Leaf { distribution } => return distribution,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if (features[*feature] as f32) <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub(crate) fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Checks that every index prediction follows stays in bounds.
    ///
    /// Children must come after their parent in the node vector, which also
    /// rules out cycles.
    pub(crate) fn validate(&self, n_features: usize, n_classes: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("no nodes".to_string());
        }
        for (id, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Leaf { distribution } => {
                    if distribution.len() != n_classes {
                        return Err(format!(
                            "leaf {} has {} probabilities for {} classes",
                            id,
                            distribution.len(),
                            n_classes
                        ));
                    }
                }
                Node::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    if *feature >= n_features {
                        return Err(format!(
                            "node {} splits on feature {} of {}",
                            id, feature, n_features
                        ));
                    }
                    for child in [*left, *right] {
                        if child <= id || child >= self.nodes.len() {
                            return Err(format!("node {} links to node {}", id, child));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn depth(&self) -> usize {
        fn walk(nodes: &[Node], node: usize) -> usize {
            match &nodes[node] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }
}

/// Best Gini split over a random subset of `max_features` non-constant features.
///
/// Constant features are skipped without counting towards the subset, so a
/// split is found whenever any feature still varies within the node. A split
/// is kept even when it does not lower impurity; growth stops only at pure
/// nodes, the depth limit or indistinguishable rows.
fn best_split<R: Rng>(
    ctx: &mut GrowContext<'_, R>,
    samples: &[usize],
    parent_counts: &[f64],
) -> Option<Candidate> {
    let total = samples.len() as f64;
    let order = shuffled_features(ctx.n_features, ctx.rng);

    let mut best: Option<Candidate> = None;
    let mut visited = 0;

    for feature in order {
        if visited >= ctx.limits.max_features {
            break;
        }

        let mut by_value: BTreeMap<u8, Vec<f64>> = BTreeMap::new();
        for &s in samples {
            let counts = by_value
                .entry(ctx.rows[s][feature])
                .or_insert_with(|| vec![0.0; ctx.n_classes]);
            counts[ctx.labels[s]] += 1.0;
        }
        if by_value.len() < 2 {
            continue;
        }
        visited += 1;

        let values: Vec<(u8, Vec<f64>)> = by_value.into_iter().collect();
        let mut left = vec![0.0; ctx.n_classes];
        let mut n_left = 0.0;

        for window in values.windows(2) {
            let (value, counts) = &window[0];
            let (next_value, _) = &window[1];
            for (acc, c) in left.iter_mut().zip(counts) {
                *acc += c;
            }
            n_left += counts.iter().sum::<f64>();

            let right: Vec<f64> = parent_counts.iter().zip(&left).map(|(p, l)| p - l).collect();
            let n_right = total - n_left;
            let impurity = (n_left * gini(&left, n_left) + n_right * gini(&right, n_right)) / total;

            if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                best = Some(Candidate {
                    feature,
                    threshold: (*value as f32 + *next_value as f32) / 2.0,
                    impurity,
                });
            }
        }
    }

    best
}
