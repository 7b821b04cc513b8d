use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

pub const FEATURE_COUNT: usize = 3;

const MIN_SPLIT_GAIN: f64 = 1e-12;

#[derive(Debug, Clone, Copy)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 16,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Single CART-style regression tree grown with weighted variance reduction.
#[derive(Debug, Clone)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    fn fit(
        rows: &[[f64; FEATURE_COUNT]],
        targets: &[f64],
        weights: &[f64],
        indices: Vec<usize>,
        config: &ForestConfig,
    ) -> Self {
        let mut nodes = Vec::new();
        build_node(&mut nodes, rows, targets, weights, indices, 0, config);
        Self { nodes }
    }

    pub fn predict(&self, row: &[f64; FEATURE_COUNT]) -> f64 {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

/// Bagged ensemble of regression trees with per-sample importance weights.
///
/// Each tree draws its own bootstrap sample from a seed derived from the
/// configured base seed, so a fit is reproducible regardless of how rayon
/// schedules the per-tree work.
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
    config: ForestConfig,
}

impl RandomForest {
    pub fn fit(
        rows: &[[f64; FEATURE_COUNT]],
        targets: &[f64],
        weights: &[f64],
        config: ForestConfig,
    ) -> Self {
        let n = rows.len();
        let trees: Vec<RegressionTree> = (0..config.n_trees)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(tree_idx as u64));
                let indices: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                RegressionTree::fit(rows, targets, weights, indices, &config)
            })
            .collect();
        Self { trees, config }
    }

    pub fn predict(&self, row: &[f64; FEATURE_COUNT]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.trees.iter().map(|tree| tree.predict(row)).sum();
        sum / self.trees.len() as f64
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn config(&self) -> ForestConfig {
        self.config
    }
}

fn build_node(
    nodes: &mut Vec<Node>,
    rows: &[[f64; FEATURE_COUNT]],
    targets: &[f64],
    weights: &[f64],
    indices: Vec<usize>,
    depth: usize,
    config: &ForestConfig,
) -> usize {
    let value = weighted_mean(&indices, targets, weights);

    if depth >= config.max_depth || indices.len() < 2 {
        let idx = nodes.len();
        nodes.push(Node::Leaf { value });
        return idx;
    }

    let Some((feature, threshold)) = best_split(rows, targets, weights, &indices) else {
        let idx = nodes.len();
        nodes.push(Node::Leaf { value });
        return idx;
    };

    let mut left_indices = Vec::new();
    let mut right_indices = Vec::new();
    for &i in &indices {
        if rows[i][feature] <= threshold {
            left_indices.push(i);
        } else {
            right_indices.push(i);
        }
    }
    if left_indices.is_empty() || right_indices.is_empty() {
        let idx = nodes.len();
        nodes.push(Node::Leaf { value });
        return idx;
    }

    // Reserve the split slot before recursing so child indices are known.
    let node_idx = nodes.len();
    nodes.push(Node::Leaf { value });
    let left = build_node(nodes, rows, targets, weights, left_indices, depth + 1, config);
    let right = build_node(
        nodes,
        rows,
        targets,
        weights,
        right_indices,
        depth + 1,
        config,
    );
    nodes[node_idx] = Node::Split {
        feature,
        threshold,
        left,
        right,
    };
    node_idx
}

fn weighted_mean(indices: &[usize], targets: &[f64], weights: &[f64]) -> f64 {
    let mut w_sum = 0.0;
    let mut wy_sum = 0.0;
    for &i in indices {
        w_sum += weights[i];
        wy_sum += weights[i] * targets[i];
    }
    if w_sum > 0.0 { wy_sum / w_sum } else { 0.0 }
}

/// Picks the (feature, threshold) pair with the largest weighted
/// sum-of-squares reduction, or `None` when no split improves on the parent.
fn best_split(
    rows: &[[f64; FEATURE_COUNT]],
    targets: &[f64],
    weights: &[f64],
    indices: &[usize],
) -> Option<(usize, f64)> {
    let mut total_w = 0.0;
    let mut total_wy = 0.0;
    let mut total_wy2 = 0.0;
    for &i in indices {
        total_w += weights[i];
        total_wy += weights[i] * targets[i];
        total_wy2 += weights[i] * targets[i] * targets[i];
    }
    if total_w <= 0.0 {
        return None;
    }
    let parent_sse = total_wy2 - total_wy * total_wy / total_w;

    let mut best: Option<(usize, f64)> = None;
    let mut best_gain = MIN_SPLIT_GAIN;

    for feature in 0..FEATURE_COUNT {
        let mut order: Vec<usize> = indices.to_vec();
        order.sort_by(|&a, &b| rows[a][feature].total_cmp(&rows[b][feature]));

        let mut left_w = 0.0;
        let mut left_wy = 0.0;
        let mut left_wy2 = 0.0;
        for k in 0..order.len() - 1 {
            let i = order[k];
            left_w += weights[i];
            left_wy += weights[i] * targets[i];
            left_wy2 += weights[i] * targets[i] * targets[i];

            let value = rows[i][feature];
            let next = rows[order[k + 1]][feature];
            if next <= value {
                continue;
            }
            let right_w = total_w - left_w;
            if left_w <= 0.0 || right_w <= 0.0 {
                continue;
            }
            let right_wy = total_wy - left_wy;
            let right_wy2 = total_wy2 - left_wy2;
            let sse = (left_wy2 - left_wy * left_wy / left_w)
                + (right_wy2 - right_wy * right_wy / right_w);
            let gain = parent_sse - sse;
            if gain > best_gain {
                best_gain = gain;
                best = Some((feature, (value + next) / 2.0));
            }
        }
    }

    best
}
