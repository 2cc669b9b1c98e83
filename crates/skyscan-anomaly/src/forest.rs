// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use skyscan_core::{AnomalyFlag, FeatureMatrix, ScanError};

const DEFAULT_NUM_TREES: usize = 200;
const DEFAULT_CONTAMINATION: f64 = 0.05;
const DEFAULT_SEED: u64 = 42;
const DEFAULT_MAX_SAMPLES: usize = 256;

// Euler-Mascheroni constant, used in the average unsuccessful-search length.
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Configuration for [`IsolationForest`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IsolationForestConfig {
    pub num_trees: usize,
    /// Expected anomaly fraction; sets the score threshold.
    pub contamination: f64,
    pub seed: u64,
    /// Per-tree subsample ceiling; the effective sample is `min(n, max_samples)`.
    pub max_samples: usize,
}

impl Default for IsolationForestConfig {
    fn default() -> Self {
        Self {
            num_trees: DEFAULT_NUM_TREES,
            contamination: DEFAULT_CONTAMINATION,
            seed: DEFAULT_SEED,
            max_samples: DEFAULT_MAX_SAMPLES,
        }
    }
}

impl IsolationForestConfig {
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.num_trees == 0 {
            return Err(ScanError::invalid_input(
                "IsolationForestConfig.num_trees must be >= 1; got 0",
            ));
        }
        if !self.contamination.is_finite()
            || !(0.0..=0.5).contains(&self.contamination)
        {
            return Err(ScanError::invalid_input(format!(
                "IsolationForestConfig.contamination must be in [0, 0.5]; got {}",
                self.contamination
            )));
        }
        if self.max_samples < 2 {
            return Err(ScanError::invalid_input(format!(
                "IsolationForestConfig.max_samples must be >= 2; got {}",
                self.max_samples
            )));
        }
        Ok(())
    }
}

/// Scores and flags for one fitted population.
#[derive(Clone, Debug, PartialEq)]
pub struct ForestScores {
    /// Anomaly score per row, in (0, 1]; higher means more isolable.
    pub scores: Vec<f64>,
    /// Contamination quantile of the scores.
    pub threshold: f64,
    /// Set where the score strictly exceeds the threshold.
    pub flags: Vec<AnomalyFlag>,
}

impl ForestScores {
    pub fn flagged_count(&self) -> usize {
        self.flags.iter().filter(|f| f.is_anomaly()).count()
    }
}

/// Deterministic isolation forest.
///
/// Each tree recursively splits a subsample on a random column at a random
/// value until points are isolated or the height limit is reached. Anomalies
/// isolate early, so shorter average path lengths mean higher scores. All
/// randomness flows from the configured seed.
#[derive(Clone, Debug)]
pub struct IsolationForest {
    config: IsolationForestConfig,
}

impl IsolationForest {
    pub fn new(config: IsolationForestConfig) -> Result<Self, ScanError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &IsolationForestConfig {
        &self.config
    }

    /// Fits trees on `matrix` and scores every row of it.
    pub fn score(&self, matrix: &FeatureMatrix) -> Result<ForestScores, ScanError> {
        let n = matrix.n();
        if n == 0 {
            return Err(ScanError::empty_dataset(
                "cannot fit an isolation forest on an empty matrix",
            ));
        }

        let sample_size = n.min(self.config.max_samples);
        let normalizer = average_path_length(sample_size);
        let scores = if normalizer <= 0.0 {
            // A single row cannot be compared to anything; score it neutral.
            vec![0.5; n]
        } else {
            let height_limit = height_limit(sample_size);
            let mut path_totals = vec![0.0f64; n];
            for tree_index in 0..self.config.num_trees {
                let mut rng = StableRng::new(
                    self.config
                        .seed
                        .wrapping_add((tree_index as u64).wrapping_mul(0x9e3779b97f4a7c15)),
                );
                let sample = subsample(n, sample_size, &mut rng);
                let tree = build_tree(matrix, &sample, 0, height_limit, &mut rng);
                for (row, total) in path_totals.iter_mut().enumerate() {
                    *total += path_length(&tree, matrix.row(row), 0);
                }
            }

            path_totals
                .iter()
                .map(|total| {
                    let mean_path = total / self.config.num_trees as f64;
                    2.0f64.powf(-mean_path / normalizer)
                })
                .collect::<Vec<f64>>()
        };

        for (row, score) in scores.iter().enumerate() {
            if !score.is_finite() {
                return Err(ScanError::numerical_issue(format!(
                    "anomaly score for row {row} is not finite"
                )));
            }
        }

        let threshold = score_quantile(&scores, 1.0 - self.config.contamination);
        let flags = scores
            .iter()
            .map(|&score| {
                if score > threshold {
                    AnomalyFlag::Anomaly
                } else {
                    AnomalyFlag::Normal
                }
            })
            .collect();

        Ok(ForestScores {
            scores,
            threshold,
            flags,
        })
    }
}

enum Node {
    Leaf { size: usize },
    Split {
        column: usize,
        value: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

fn build_tree(
    matrix: &FeatureMatrix,
    indices: &[usize],
    depth: usize,
    height_limit: usize,
    rng: &mut StableRng,
) -> Node {
    if indices.len() <= 1 || depth >= height_limit {
        return Node::Leaf {
            size: indices.len(),
        };
    }

    let spreads: Vec<(usize, f64, f64)> = (0..matrix.d())
        .filter_map(|column| {
            let mut lo = f64::INFINITY;
            let mut hi = f64::NEG_INFINITY;
            for &i in indices {
                let value = matrix.row(i)[column];
                lo = lo.min(value);
                hi = hi.max(value);
            }
            (hi > lo).then_some((column, lo, hi))
        })
        .collect();
    if spreads.is_empty() {
        // All remaining points coincide in every column.
        return Node::Leaf {
            size: indices.len(),
        };
    }

    let (column, lo, hi) = spreads[rng.gen_range(spreads.len())];
    let value = lo + rng.next_f64() * (hi - lo);

    let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .copied()
        .partition(|&i| matrix.row(i)[column] < value);

    Node::Split {
        column,
        value,
        left: Box::new(build_tree(matrix, &left_idx, depth + 1, height_limit, rng)),
        right: Box::new(build_tree(matrix, &right_idx, depth + 1, height_limit, rng)),
    }
}

fn path_length(node: &Node, row: &[f64], depth: usize) -> f64 {
    match node {
        Node::Leaf { size } => depth as f64 + average_path_length(*size),
        Node::Split {
            column,
            value,
            left,
            right,
        } => {
            if row[*column] < *value {
                path_length(left, row, depth + 1)
            } else {
                path_length(right, row, depth + 1)
            }
        }
    }
}

/// Average unsuccessful-search path length in a binary search tree of `n`
/// nodes; normalizes raw path lengths into scores.
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

fn height_limit(sample_size: usize) -> usize {
    (sample_size as f64).log2().ceil().max(1.0) as usize
}

/// First `sample_size` entries of a seeded Fisher-Yates shuffle of `0..n`.
fn subsample(n: usize, sample_size: usize, rng: &mut StableRng) -> Vec<usize> {
    let mut pool: Vec<usize> = (0..n).collect();
    for slot in 0..sample_size.min(n) {
        let pick = slot + rng.gen_range(n - slot);
        pool.swap(slot, pick);
    }
    pool.truncate(sample_size);
    pool
}

/// Linear-interpolation quantile, `q` in [0, 1].
fn score_quantile(scores: &[f64], q: f64) -> f64 {
    let mut sorted = scores.to_vec();
    sorted.sort_by(f64::total_cmp);
    if sorted.len() == 1 {
        return sorted[0];
    }
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

#[derive(Clone, Copy, Debug)]
struct StableRng {
    state: u64,
}

impl StableRng {
    fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(0x9e3779b97f4a7c15),
        }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e3779b97f4a7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
        z ^ (z >> 31)
    }

    /// Uniform in `[0, upper_exclusive)`. Callers guarantee a non-zero bound.
    fn gen_range(&mut self, upper_exclusive: usize) -> usize {
        (self.next_u64() % upper_exclusive.max(1) as u64) as usize
    }

    /// Uniform in `[0, 1)` with 53-bit precision.
    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}
