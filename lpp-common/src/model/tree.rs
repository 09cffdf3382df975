//! CART regression tree on the fixed feature layout
//!
//! Splits minimise the summed squared error of the two children. For each
//! feature the node's samples are sorted once and every boundary between two
//! distinct values is scored from running sums, so a node costs
//! O(features · n log n).

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::vector::FEATURE_COUNT;

/// Samples go left when `row[feature] <= threshold`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            TreeNode::Leaf { value } if !value.is_finite() => {
                Err(Error::Model(format!("leaf value {value} is not finite")))
            }
            TreeNode::Leaf { .. } => Ok(()),
            TreeNode::Split {
                feature,
                left,
                right,
                ..
            } => {
                if *feature >= FEATURE_COUNT {
                    return Err(Error::Model(format!(
                        "split on feature {feature}, only {FEATURE_COUNT} features exist"
                    )));
                }
                left.validate()?;
                right.validate()
            }
        }
    }
}

/// Growth limits of one tree
#[derive(Debug, Clone, Copy)]
pub struct TreeLimits {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

/// A fitted regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    root: TreeNode,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl RegressionTree {
    /// Fit on `rows` / `targets`, adding each split's error reduction to
    /// `importances[feature]`
    ///
    /// Callers check that both slices are non-empty, equally long and finite.
    pub fn fit(
        rows: &[[f64; FEATURE_COUNT]],
        targets: &[f64],
        limits: TreeLimits,
        importances: &mut [f64; FEATURE_COUNT],
    ) -> Self {
        let indices: Vec<usize> = (0..rows.len()).collect();
        let root = grow(rows, targets, indices, 0, limits, importances);
        Self { root }
    }

    pub fn predict(&self, row: &[f64; FEATURE_COUNT]) -> f64 {
        let mut node = &self.root;
        loop {
            match node {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold { left } else { right };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    /// Reject a decoded tree that would index out of the feature vector
    pub fn validate(&self) -> Result<()> {
        self.root.validate()
    }
}

fn mean(targets: &[f64], indices: &[usize]) -> f64 {
    indices.iter().map(|&i| targets[i]).sum::<f64>() / indices.len() as f64
}

fn grow(
    rows: &[[f64; FEATURE_COUNT]],
    targets: &[f64],
    indices: Vec<usize>,
    depth: usize,
    limits: TreeLimits,
    importances: &mut [f64; FEATURE_COUNT],
) -> TreeNode {
    let value = mean(targets, &indices);
    if indices.len() < limits.min_samples_split || depth >= limits.max_depth {
        return TreeNode::Leaf { value };
    }

    let Some(split) = best_split(rows, targets, &indices, limits.min_samples_leaf) else {
        return TreeNode::Leaf { value };
    };
    importances[split.feature] += split.gain;

    let (left, right): (Vec<usize>, Vec<usize>) = indices
        .into_iter()
        .partition(|&i| rows[i][split.feature] <= split.threshold);

    TreeNode::Split {
        feature: split.feature,
        threshold: split.threshold,
        left: Box::new(grow(rows, targets, left, depth + 1, limits, importances)),
        right: Box::new(grow(rows, targets, right, depth + 1, limits, importances)),
    }
}

/// Highest squared-error reduction over all features; ties keep the lower
/// feature index and the lower threshold
fn best_split(
    rows: &[[f64; FEATURE_COUNT]],
    targets: &[f64],
    indices: &[usize],
    min_samples_leaf: usize,
) -> Option<BestSplit> {
    let n = indices.len();
    let total: f64 = indices.iter().map(|&i| targets[i]).sum();
    let parent_score = total * total / n as f64;

    let mut best: Option<BestSplit> = None;
    let mut sorted = indices.to_vec();

    for feature in 0..FEATURE_COUNT {
        sorted.sort_by(|&a, &b| rows[a][feature].total_cmp(&rows[b][feature]));

        let mut left_sum = 0.0;
        for position in 0..n.saturating_sub(1) {
            left_sum += targets[sorted[position]];
            let left_count = position + 1;
            let right_count = n - left_count;
            if left_count < min_samples_leaf || right_count < min_samples_leaf {
                continue;
            }

            let current = rows[sorted[position]][feature];
            let next = rows[sorted[position + 1]][feature];
            if current >= next {
                continue;
            }

            let right_sum = total - left_sum;
            let gain = left_sum * left_sum / left_count as f64
                + right_sum * right_sum / right_count as f64
                - parent_score;
            if gain <= 0.0 || best.as_ref().is_some_and(|b| gain <= b.gain) {
                continue;
            }

            let midpoint = current + (next - current) / 2.0;
            let threshold = if midpoint < next { midpoint } else { current };
            best = Some(BestSplit {
                feature,
                threshold,
                gain,
            });
        }
    }
    best
}
