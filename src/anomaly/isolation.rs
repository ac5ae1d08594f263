use crate::error::{LedgerError, Result};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Isolation forest parameters. Fitting is fully determined by the seed.
#[derive(Debug, Clone, PartialEq)]
pub struct IsolationForest {
    pub n_estimators: usize,
    pub max_samples: usize,
    pub seed: u64,
}

impl Default for IsolationForest {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_samples: 256,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// A fitted forest.
#[derive(Debug, Clone)]
pub struct IsolationForestModel {
    trees: Vec<Node>,
    sample_size: usize,
}

impl IsolationForest {
    pub fn new(n_estimators: usize, max_samples: usize, seed: u64) -> Self {
        Self {
            n_estimators,
            max_samples,
            seed,
        }
    }

    pub fn fit(&self, data: &[Vec<f64>]) -> Result<IsolationForestModel> {
        let width = data.first().map(Vec::len).unwrap_or(0);
        if data.is_empty() || width == 0 {
            return Err(LedgerError::InternalError(
                "isolation forest needs at least one row with one feature".to_string(),
            ));
        }
        if data.iter().any(|row| row.len() != width) {
            return Err(LedgerError::InternalError(
                "feature rows have inconsistent widths".to_string(),
            ));
        }
        if data.iter().flatten().any(|v| !v.is_finite()) {
            return Err(LedgerError::InternalError(
                "feature matrix contains non-finite values".to_string(),
            ));
        }
        if self.n_estimators == 0 {
            return Err(LedgerError::InternalError(
                "isolation forest needs at least one tree".to_string(),
            ));
        }

        let sample_size = self.max_samples.clamp(1, data.len());
        let height_limit = (sample_size as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(self.seed);

        let trees = (0..self.n_estimators)
            .map(|_| {
                let sample = index::sample(&mut rng, data.len(), sample_size).into_vec();
                grow(data, sample, 0, height_limit, &mut rng)
            })
            .collect();

        Ok(IsolationForestModel { trees, sample_size })
    }
}

fn grow(
    data: &[Vec<f64>],
    indices: Vec<usize>,
    depth: usize,
    height_limit: usize,
    rng: &mut StdRng,
) -> Node {
    if depth >= height_limit || indices.len() <= 1 {
        return Node::Leaf {
            size: indices.len(),
        };
    }

    let width = data[indices[0]].len();
    let splittable: Vec<(usize, f64, f64)> = (0..width)
        .filter_map(|feature| {
            let (min, max) = indices.iter().fold(
                (f64::INFINITY, f64::NEG_INFINITY),
                |(lo, hi), &idx| (lo.min(data[idx][feature]), hi.max(data[idx][feature])),
            );
            (max > min).then_some((feature, min, max))
        })
        .collect();

    if splittable.is_empty() {
        return Node::Leaf {
            size: indices.len(),
        };
    }

    let (feature, min, max) = splittable[rng.gen_range(0..splittable.len())];
    let threshold = rng.gen_range(min..max);
    let (left, right): (Vec<usize>, Vec<usize>) = indices
        .into_iter()
        .partition(|&idx| data[idx][feature] <= threshold);

    Node::Split {
        feature,
        threshold,
        left: Box::new(grow(data, left, depth + 1, height_limit, rng)),
        right: Box::new(grow(data, right, depth + 1, height_limit, rng)),
    }
}

/// Average path length of an unsuccessful search in a binary search tree of `n` nodes.
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

impl IsolationForestModel {
    fn path_length(&self, tree: &Node, row: &[f64]) -> f64 {
        let mut node = tree;
        let mut depth = 0.0;
        loop {
            match node {
                Node::Leaf { size } => return depth + average_path_length(*size),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold { left } else { right };
                    depth += 1.0;
                }
            }
        }
    }

    /// Scores in [-1, 0); the more negative, the easier the row was to isolate.
    pub fn score_samples(&self, data: &[Vec<f64>]) -> Vec<f64> {
        let normalizer = average_path_length(self.sample_size);
        let normalizer = if normalizer > 0.0 { normalizer } else { 1.0 };

        data.iter()
            .map(|row| {
                let total: f64 = self.trees.iter().map(|t| self.path_length(t, row)).sum();
                let expected = total / self.trees.len() as f64;
                -(2f64.powf(-expected / normalizer))
            })
            .collect()
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster_with_outlier() -> Vec<Vec<f64>> {
        let mut data: Vec<Vec<f64>> = (0..50)
            .map(|i| vec![(i % 7) as f64 * 0.1, (i % 5) as f64 * 0.1])
            .collect();
        data.push(vec![25.0, -30.0]);
        data
    }

    #[test]
    fn test_average_path_length() {
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        assert!((average_path_length(256) - 10.244_770_920_12).abs() < 1e-6);
    }

    #[test]
    fn test_outlier_scores_lowest() {
        let data = cluster_with_outlier();
        let model = IsolationForest::default().fit(&data).unwrap();
        let scores = model.score_samples(&data);
        let (lowest, _) = scores
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .unwrap();
        assert_eq!(lowest, 50);
        assert!(scores.iter().all(|s| (-1.0..0.0).contains(s)));
    }

    #[test]
    fn test_same_seed_same_scores() {
        let data = cluster_with_outlier();
        let forest = IsolationForest::new(20, 32, 7);
        let a = forest.fit(&data).unwrap().score_samples(&data);
        let b = forest.fit(&data).unwrap().score_samples(&data);
        assert_eq!(a, b);
    }

    #[test]
    fn test_constant_data_is_all_leaves() {
        let data = vec![vec![0.0, 0.0]; 10];
        let model = IsolationForest::new(5, 256, 1).fit(&data).unwrap();
        assert_eq!(model.n_trees(), 5);
        let scores = model.score_samples(&data);
        assert!(scores.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_rejects_empty_and_non_finite() {
        assert!(IsolationForest::default().fit(&[]).is_err());
        assert!(IsolationForest::default()
            .fit(&[vec![f64::NAN, 1.0], vec![0.0, 1.0]])
            .is_err());
    }
}
