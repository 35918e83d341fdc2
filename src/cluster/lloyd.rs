use super::seeding::squared_distance;
use crate::error::{KMeansError, Result};
use crate::{ArrayView1, Matrix};
use std::fmt;
use tracing::{debug, info, warn};

/// Why a refinement run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// The largest centroid movement fell below the tolerance.
    Converged,
    /// `max_iter` iterations completed without converging.
    IterationCap,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Converged => write!(f, "converged"),
            StopReason::IterationCap => write!(f, "iteration cap"),
        }
    }
}

/// Outcome of a complete Lloyd run.
#[derive(Clone, Debug)]
pub struct Refinement {
    pub centroids: Matrix,
    /// Nearest-centroid index for every observation, from the last iteration.
    pub labels: Vec<usize>,
    pub n_iter: usize,
    pub stop: StopReason,
    /// Within-cluster sum of squared distances for `labels` and `centroids`.
    pub inertia: f64,
}

impl Refinement {
    pub fn converged(&self) -> bool {
        self.stop == StopReason::Converged
    }
}

/// Lloyd's alternating assign/update iteration.
///
/// Owns the centroids for the length of the run; the observations are only
/// borrowed. Each [`step`](Lloyd::step) assigns every observation to its
/// nearest centroid and moves each centroid to the mean of its members.
/// A centroid that ends up with no members stays where it was.
#[derive(Clone, Debug)]
pub struct Lloyd<'a> {
    x: &'a Matrix,
    centroids: Matrix,
    epsilon: f64,
    max_iter: usize,
    n_iter: usize,
}

impl<'a> Lloyd<'a> {
    pub fn new(x: &'a Matrix, initial_centroids: Matrix, epsilon: f64, max_iter: usize) -> Result<Self> {
        if x.nrows() == 0 || x.ncols() == 0 {
            return Err(KMeansError::invalid_input(
                "Input matrix must have at least one sample and one feature",
            ));
        }

        if initial_centroids.nrows() == 0 {
            return Err(KMeansError::invalid_input("at least one initial centroid is required"));
        }

        if initial_centroids.ncols() != x.ncols() {
            return Err(KMeansError::invalid_input(format!(
                "centroid dimensionality ({}) doesn't match data ({})",
                initial_centroids.ncols(),
                x.ncols()
            )));
        }

        if x.iter().any(|v| !v.is_finite()) {
            return Err(KMeansError::invalid_input("observations must be finite"));
        }

        if initial_centroids.iter().any(|v| !v.is_finite()) {
            return Err(KMeansError::invalid_input("initial centroids must be finite"));
        }

        if epsilon.is_nan() || epsilon < 0.0 {
            return Err(KMeansError::invalid_input(format!(
                "epsilon must be >= 0, got {}",
                epsilon
            )));
        }

        if max_iter == 0 {
            return Err(KMeansError::invalid_input("max_iter must be >= 1"));
        }

        Ok(Self {
            x,
            centroids: initial_centroids,
            epsilon,
            max_iter,
            n_iter: 0,
        })
    }

    pub fn centroids(&self) -> &Matrix {
        &self.centroids
    }

    pub fn n_iter(&self) -> usize {
        self.n_iter
    }

    pub fn n_clusters(&self) -> usize {
        self.centroids.nrows()
    }

    /// Nearest centroid for every observation. Ties go to the lower index.
    pub fn assign(&self) -> Vec<usize> {
        self.x
            .rows()
            .into_iter()
            .map(|row| nearest_centroid(&row, &self.centroids).0)
            .collect()
    }

    /// Moves each centroid to the mean of its members and returns the largest
    /// Euclidean distance any centroid moved.
    ///
    /// `labels` must hold one in-range centroid index per observation.
    pub fn update(&mut self, labels: &[usize]) -> Result<f64> {
        self.check_labels(labels)?;
        Ok(self.move_centroids(labels))
    }

    fn move_centroids(&mut self, labels: &[usize]) -> f64 {
        let n_clusters = self.n_clusters();
        let mut sums = Matrix::zeros(self.centroids.raw_dim());
        let mut counts = vec![0usize; n_clusters];

        for (row, &label) in self.x.rows().into_iter().zip(labels) {
            let mut sum = sums.row_mut(label);
            sum += &row;
            counts[label] += 1;
        }

        let mut max_shift: f64 = 0.0;
        for k in 0..n_clusters {
            if counts[k] == 0 {
                warn!(cluster = k, "cluster has no members, keeping previous centroid");
                continue;
            }

            let mean = sums.row(k).mapv(|v| v / counts[k] as f64);
            let shift = squared_distance(&self.centroids.row(k), &mean.view()).sqrt();
            // f64::max drops NaN, so a non-finite mean would otherwise read as no movement.
            max_shift = if shift.is_nan() { f64::INFINITY } else { max_shift.max(shift) };
            self.centroids.row_mut(k).assign(&mean);
        }

        max_shift
    }

    /// One full iteration. Returns the assignment used and the largest shift.
    pub fn step(&mut self) -> (Vec<usize>, f64) {
        let labels = self.assign();
        let shift = self.move_centroids(&labels);
        self.n_iter += 1;
        (labels, shift)
    }

    /// Within-cluster sum of squared distances for `labels` against the
    /// current centroids.
    pub fn objective(&self, labels: &[usize]) -> Result<f64> {
        self.check_labels(labels)?;
        Ok(self.sum_of_squares(labels))
    }

    fn sum_of_squares(&self, labels: &[usize]) -> f64 {
        self.x
            .rows()
            .into_iter()
            .zip(labels)
            .map(|(row, &label)| squared_distance(&row, &self.centroids.row(label)))
            .sum()
    }

    fn check_labels(&self, labels: &[usize]) -> Result<()> {
        if labels.len() != self.x.nrows() {
            return Err(KMeansError::invalid_input(format!(
                "expected {} labels, got {}",
                self.x.nrows(),
                labels.len()
            )));
        }

        if let Some(&label) = labels.iter().find(|&&l| l >= self.n_clusters()) {
            return Err(KMeansError::invalid_input(format!(
                "label {} out of range for {} centroids",
                label,
                self.n_clusters()
            )));
        }

        Ok(())
    }

    /// Iterates until converged or `max_iter` iterations are done.
    pub fn run(mut self) -> Refinement {
        loop {
            let (labels, shift) = self.step();
            debug!(iteration = self.n_iter, max_shift = shift, "lloyd iteration");

            let stop = if shift < self.epsilon {
                Some(StopReason::Converged)
            } else if self.n_iter >= self.max_iter {
                warn!(max_iter = self.max_iter, max_shift = shift, "stopped at iteration cap");
                Some(StopReason::IterationCap)
            } else {
                None
            };

            if let Some(stop) = stop {
                let inertia = self.sum_of_squares(&labels);
                info!(%stop, n_iter = self.n_iter, inertia, "refinement finished");

                return Refinement {
                    centroids: self.centroids,
                    labels,
                    n_iter: self.n_iter,
                    stop,
                    inertia,
                };
            }
        }
    }
}

/// Refines `initial_centroids` over `x` with Lloyd's algorithm.
pub fn refine(x: &Matrix, initial_centroids: Matrix, epsilon: f64, max_iter: usize) -> Result<Refinement> {
    Ok(Lloyd::new(x, initial_centroids, epsilon, max_iter)?.run())
}

/// Index of and squared distance to the closest centroid; first index wins ties.
pub(crate) fn nearest_centroid(point: &ArrayView1<f64>, centroids: &Matrix) -> (usize, f64) {
    let mut min_distance = f64::INFINITY;
    let mut closest_cluster = 0;

    for (k, centroid) in centroids.rows().into_iter().enumerate() {
        let distance = squared_distance(point, &centroid);
        if distance < min_distance {
            min_distance = distance;
            closest_cluster = k;
        }
    }

    (closest_cluster, min_distance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::seeding::seed;
    use crate::dataset::make_blobs;
    use ndarray::array;
    use proptest::prelude::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_two_pairs_converge() {
        let x = array![[0.0, 0.0], [0.0, 1.0], [10.0, 0.0], [10.0, 1.0]];
        let initial = array![[0.0, 1.0], [10.0, 0.0]];

        let result = refine(&x, initial, 0.001, 300).unwrap();
        assert!(result.converged());
        assert!(result.n_iter <= 300);

        assert_eq!(result.labels[0], result.labels[1]);
        assert_eq!(result.labels[2], result.labels[3]);
        assert_ne!(result.labels[0], result.labels[2]);

        let left = result.centroids.row(result.labels[0]);
        let right = result.centroids.row(result.labels[2]);
        assert!(close(left[0], 0.0) && close(left[1], 0.5));
        assert!(close(right[0], 10.0) && close(right[1], 0.5));
        assert!(close(result.inertia, 1.0));
    }

    #[test]
    fn test_tie_goes_to_lower_index() {
        let x = array![[0.0, 0.0]];
        let centroids = array![[-1.0, 0.0], [1.0, 0.0]];
        let lloyd = Lloyd::new(&x, centroids, 0.001, 10).unwrap();
        assert_eq!(lloyd.assign(), vec![0]);

        let mirrored = array![[1.0, 0.0], [-1.0, 0.0]];
        let lloyd = Lloyd::new(&x, mirrored, 0.001, 10).unwrap();
        assert_eq!(lloyd.assign(), vec![0]);
    }

    #[test]
    fn test_empty_cluster_keeps_position() {
        // Both centroids start on the same spot; all points go to index 0 and
        // index 1 is left without members.
        let x = array![[0.0, 0.0], [2.0, 0.0], [4.0, 0.0]];
        let centroids = array![[1.0, 1.0], [1.0, 1.0]];

        let mut lloyd = Lloyd::new(&x, centroids, 0.001, 10).unwrap();
        let (labels, _) = lloyd.step();

        assert_eq!(labels, vec![0, 0, 0]);
        assert_eq!(lloyd.centroids().row(0).to_vec(), vec![2.0, 0.0]);
        assert_eq!(lloyd.centroids().row(1).to_vec(), vec![1.0, 1.0]);
        assert!(lloyd.centroids().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_far_centroid_never_gets_members() {
        let x = array![[0.0], [1.0]];
        let centroids = array![[0.5], [1000.0]];

        let result = refine(&x, centroids, 0.0001, 50).unwrap();
        assert_eq!(result.labels, vec![0, 0]);
        assert_eq!(result.centroids[[1, 0]], 1000.0);
        assert!(result.converged());
    }

    #[test]
    fn test_iteration_cap() {
        let x = array![[0.0], [1.0], [2.0], [10.0], [11.0], [30.0]];
        let centroids = array![[0.0], [1.0]];

        // epsilon of zero can never be beaten by a strict comparison.
        let result = refine(&x, centroids, 0.0, 3).unwrap();
        assert_eq!(result.stop, StopReason::IterationCap);
        assert_eq!(result.n_iter, 3);
        assert_eq!(result.labels.len(), 6);
    }

    #[test]
    fn test_single_iteration_when_already_converged() {
        let x = array![[0.0], [2.0]];
        let centroids = array![[1.0]];

        let result = refine(&x, centroids, 0.001, 300).unwrap();
        assert_eq!(result.n_iter, 1);
        assert!(result.converged());
        assert_eq!(result.centroids[[0, 0]], 1.0);
    }

    #[test]
    fn test_invalid_parameters() {
        let x = array![[0.0, 0.0], [1.0, 1.0]];

        assert!(refine(&x, array![[0.0, 0.0]], -0.1, 10).unwrap_err().is_invalid_input());
        assert!(refine(&x, array![[0.0, 0.0]], f64::NAN, 10).unwrap_err().is_invalid_input());
        assert!(refine(&x, array![[0.0, 0.0]], 0.1, 0).unwrap_err().is_invalid_input());
        assert!(refine(&x, array![[0.0, 0.0, 0.0]], 0.1, 10).unwrap_err().is_invalid_input());
        assert!(refine(&x, Matrix::zeros((0, 2)), 0.1, 10).unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_non_finite_values_rejected() {
        let x = array![[f64::NAN], [1.0], [2.0]];
        assert!(refine(&x, array![[1.0]], 0.001, 10).unwrap_err().is_invalid_input());

        let x = array![[0.0], [f64::INFINITY]];
        assert!(refine(&x, array![[0.0]], 0.001, 10).unwrap_err().is_invalid_input());

        let x = array![[0.0], [1.0]];
        assert!(refine(&x, array![[f64::NAN]], 0.001, 10).unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_overflowing_mean_is_not_convergence() {
        // Both values are finite but their sum overflows to infinity.
        let x = array![[f64::MAX], [f64::MAX]];
        let mut lloyd = Lloyd::new(&x, array![[f64::MAX]], 0.001, 10).unwrap();

        let (_, shift) = lloyd.step();
        assert_eq!(shift, f64::INFINITY);
        assert!(lloyd.centroids()[[0, 0]].is_infinite());

        // inf - inf is NaN; the shift must still count as movement.
        let (_, shift) = lloyd.step();
        assert_eq!(shift, f64::INFINITY);
    }

    #[test]
    fn test_update_and_objective_check_labels() {
        let x = array![[0.0], [1.0]];
        let mut lloyd = Lloyd::new(&x, array![[0.5]], 0.001, 10).unwrap();

        assert!(lloyd.update(&[0, 3]).unwrap_err().is_invalid_input());
        assert!(lloyd.update(&[0]).unwrap_err().is_invalid_input());
        assert!(lloyd.objective(&[1, 0]).unwrap_err().is_invalid_input());
        assert!(lloyd.objective(&[0, 0, 0]).unwrap_err().is_invalid_input());

        assert_eq!(lloyd.centroids()[[0, 0]], 0.5);
        assert!(close(lloyd.objective(&[0, 0]).unwrap(), 0.5));
    }

    #[test]
    fn test_well_separated_blobs_recovered() {
        let centers = array![[0.0, 0.0], [100.0, 0.0], [0.0, 100.0], [100.0, 100.0]];
        let (dataset, membership) = make_blobs(&centers, 25, 0.5, 17).unwrap();
        let x = dataset.features();

        let initial = seed(x, 4, 3).unwrap().centroids;
        let result = refine(x, initial, 1e-6, 300).unwrap();
        assert!(result.converged());

        // Each true blob maps to exactly one cluster, and the mapping is a bijection.
        let mut mapping = vec![None; 4];
        for (&truth, &label) in membership.iter().zip(&result.labels) {
            match mapping[truth] {
                None => mapping[truth] = Some(label),
                Some(existing) => assert_eq!(existing, label),
            }
        }
        let mut labels: Vec<usize> = mapping.into_iter().map(Option::unwrap).collect();
        labels.sort_unstable();
        assert_eq!(labels, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_objective_matches_inertia() {
        let x = array![[1.0, 1.0], [1.5, 2.0], [3.0, 4.0], [5.0, 7.0], [3.5, 5.0], [4.5, 5.0]];
        let initial = seed(&x, 2, 8).unwrap().centroids;

        let result = refine(&x, initial, 1e-4, 100).unwrap();
        let expected = crate::metrics::inertia(&x, &result.centroids, &result.labels).unwrap();
        assert!(close(result.inertia, expected));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_objective_never_increases(
            n in 2..=40usize,
            k_frac in 0.0..1.0f64,
            state in 0..500u64,
        ) {
            let x = Matrix::from_shape_fn((n, 2), |(i, j)| {
                ((i as f64 + state as f64) * (0.61 + j as f64)).sin() * 25.0
            });
            let k = 1 + ((n - 1) as f64 * k_frac) as usize;
            let initial = seed(&x, k, state).unwrap().centroids;

            let mut lloyd = Lloyd::new(&x, initial, 1e-9, 100).unwrap();
            let mut previous = f64::INFINITY;
            for _ in 0..30 {
                let labels = lloyd.assign();
                let objective = lloyd.objective(&labels).unwrap();
                prop_assert!(
                    objective <= previous + 1e-9 * (1.0 + previous.abs()),
                    "objective rose from {} to {}", previous, objective
                );
                previous = objective;
                lloyd.update(&labels).unwrap();
            }
        }

        #[test]
        fn prop_terminates_within_cap(
            n in 1..=25usize,
            max_iter in 1..=20usize,
            state in 0..500u64,
        ) {
            let x = Matrix::from_shape_fn((n, 3), |(i, j)| ((i * 5 + j) as f64 * 1.3).cos() * 4.0);
            let k = 1 + (state as usize % n);
            let initial = seed(&x, k, state).unwrap().centroids;

            let result = refine(&x, initial, 1e-3, max_iter).unwrap();
            prop_assert!(result.n_iter >= 1 && result.n_iter <= max_iter);
            prop_assert_eq!(result.labels.len(), n);
            prop_assert!(result.labels.iter().all(|&l| l < k));
            if result.stop == StopReason::IterationCap {
                prop_assert_eq!(result.n_iter, max_iter);
            }
        }
    }
}
