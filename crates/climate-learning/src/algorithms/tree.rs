//! CART regression tree.
//!
//! Nodes split on the feature threshold that minimises the summed squared
//! error of the two children. A node becomes a leaf when its targets are all
//! equal, it has fewer than `min_samples_split` rows, the depth limit is
//! reached, or no feature separates its rows.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::{Regressor, check_sample};
use crate::error::Result;

/// One node of a fitted tree. Children are indices into [`DecisionTree::nodes`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum TreeNode {
    Leaf {
        value: f64,
        samples: usize,
    },
    Split {
        feature: usize,
        /// Rows with `x[feature] <= threshold` go left.
        threshold: f64,
        left: usize,
        right: usize,
        samples: usize,
    },
}

/// Regression tree stored as a flat node list rooted at index 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub nodes: Vec<TreeNode>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new(None, 2)
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    feature: usize,
    threshold: f64,
    /// Rows going left once sorted by `feature`.
    left_len: usize,
    error: f64,
}

impl DecisionTree {
    pub fn new(max_depth: Option<usize>, min_samples_split: usize) -> Self {
        Self {
            max_depth,
            min_samples_split: min_samples_split.max(2),
            nodes: Vec::new(),
        }
    }

    /// Depth of the fitted tree; a single leaf has depth 0.
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[TreeNode], index: usize) -> usize {
            match nodes.get(index) {
                Some(TreeNode::Split { left, right, .. }) => {
                    1 + walk(nodes, *left).max(walk(nodes, *right))
                }
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, TreeNode::Leaf { .. }))
            .count()
    }

    fn grow(&mut self, rows: &[Vec<f64>], target: &[f64], indices: Vec<usize>, depth: usize) -> usize {
        let samples = indices.len();
        let mean = indices.iter().map(|&i| target[i]).sum::<f64>() / samples as f64;
        let index = self.nodes.len();
        self.nodes.push(TreeNode::Leaf {
            value: mean,
            samples,
        });

        let pure = indices.iter().all(|&i| target[i] == target[indices[0]]);
        let depth_reached = self.max_depth.is_some_and(|max| depth >= max);
        if pure || depth_reached || samples < self.min_samples_split {
            return index;
        }

        let Some(best) = best_split(rows, target, &indices) else {
            return index;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| rows[i][best.feature] <= best.threshold);
        debug_assert_eq!(left_rows.len(), best.left_len);

        let left = self.grow(rows, target, left_rows, depth + 1);
        let right = self.grow(rows, target, right_rows, depth + 1);
        self.nodes[index] = TreeNode::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
            samples,
        };
        index
    }
}

/// Find the split with the lowest summed squared error over all features.
///
/// Ties keep the earliest feature and the lowest threshold.
fn best_split(rows: &[Vec<f64>], target: &[f64], indices: &[usize]) -> Option<Candidate> {
    let width = rows[indices[0]].len();
    let n = indices.len();
    let mut best: Option<Candidate> = None;

    let mut order = indices.to_vec();
    for feature in 0..width {
        order.sort_by(|&a, &b| {
            rows[a][feature]
                .partial_cmp(&rows[b][feature])
                .unwrap_or(Ordering::Equal)
        });

        let total_sum: f64 = order.iter().map(|&i| target[i]).sum();
        let total_sq: f64 = order.iter().map(|&i| target[i] * target[i]).sum();

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        for k in 1..n {
            let y = target[order[k - 1]];
            left_sum += y;
            left_sq += y * y;

            let lower = rows[order[k - 1]][feature];
            let upper = rows[order[k]][feature];
            if lower >= upper {
                continue;
            }

            let left_n = k as f64;
            let right_n = (n - k) as f64;
            let right_sum = total_sum - left_sum;
            let right_sq = total_sq - left_sq;
            let error = (left_sq - left_sum * left_sum / left_n)
                + (right_sq - right_sum * right_sum / right_n);

            if best.is_none_or(|b| error < b.error) {
                let mut threshold = (lower + upper) / 2.0;
                if threshold >= upper {
                    threshold = lower;
                }
                best = Some(Candidate {
                    feature,
                    threshold,
                    left_len: k,
                    error,
                });
            }
        }
    }
    best
}

impl Regressor for DecisionTree {
    fn fit(&mut self, rows: &[Vec<f64>], target: &[f64]) -> Result<()> {
        check_sample(rows, target)?;
        self.nodes.clear();
        self.grow(rows, target, (0..rows.len()).collect(), 0);
        Ok(())
    }

    fn predict_row(&self, row: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match self.nodes.get(index) {
                Some(TreeNode::Leaf { value, .. }) => return *value,
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                }) => {
                    let value = row.get(*feature).copied().unwrap_or(0.0);
                    index = if value <= *threshold { *left } else { *right };
                }
                None => return f64::NAN,
            }
        }
    }
}
