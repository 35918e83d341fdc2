use super::lloyd::{Lloyd, StopReason, nearest_centroid};
use super::seeding::KMeansPlusPlus;
use crate::error::{KMeansError, Result};
use crate::Matrix;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// k-means estimator: k-means++ seeding followed by Lloyd refinement.
///
/// Parameters are set builder-style; results are filled in by
/// [`fit`](KMeans::fit) and stay `None` until a fit succeeds.
#[derive(Clone, Debug)]
pub struct KMeans {
    pub cluster_centers: Option<Matrix>,
    pub labels: Option<Vec<usize>>,
    pub inertia: Option<f64>,
    pub n_iter: Option<usize>,
    /// Rows picked by k-means++, in pick order.
    pub initial_indices: Option<Vec<usize>>,
    pub stop_reason: Option<StopReason>,
    n_clusters: usize,
    max_iter: usize,
    tolerance: f64,
    random_state: u64,
}

impl KMeans {
    /// Defaults: `max_iter = 300`, `tolerance = 0.001`, `random_state = 0`.
    pub fn new(n_clusters: usize) -> Self {
        Self {
            cluster_centers: None,
            labels: None,
            inertia: None,
            n_iter: None,
            initial_indices: None,
            stop_reason: None,
            n_clusters,
            max_iter: 300,
            tolerance: 1e-3,
            random_state: 0,
        }
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Largest centroid movement still counted as converged.
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn random_state(mut self, random_state: u64) -> Self {
        self.random_state = random_state;
        self
    }

    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    /// Seeds and refines on `x`.
    ///
    /// Previous results are cleared first, so a failed fit leaves none behind.
    pub fn fit(&mut self, x: &Matrix) -> Result<()> {
        self.clear();

        let mut rng = StdRng::seed_from_u64(self.random_state);
        let seeding = KMeansPlusPlus::seed(x, self.n_clusters, &mut rng)?;
        let refinement = Lloyd::new(x, seeding.centroids, self.tolerance, self.max_iter)?.run();

        self.cluster_centers = Some(refinement.centroids);
        self.labels = Some(refinement.labels);
        self.inertia = Some(refinement.inertia);
        self.n_iter = Some(refinement.n_iter);
        self.initial_indices = Some(seeding.indices);
        self.stop_reason = Some(refinement.stop);

        Ok(())
    }

    /// Nearest fitted centroid for each row of `x`.
    pub fn predict(&self, x: &Matrix) -> Result<Vec<usize>> {
        let centroids = self.fitted_centers(x)?;

        Ok(x.rows()
            .into_iter()
            .map(|row| nearest_centroid(&row, centroids).0)
            .collect())
    }

    pub fn fit_predict(&mut self, x: &Matrix) -> Result<Vec<usize>> {
        self.fit(x)?;
        self.labels
            .clone()
            .ok_or_else(|| KMeansError::generic("labels missing after fit"))
    }

    /// Euclidean distance from every sample to every centroid.
    pub fn transform(&self, x: &Matrix) -> Result<Matrix> {
        let centroids = self.fitted_centers(x)?;
        let mut distances = Matrix::zeros((x.nrows(), centroids.nrows()));

        for (i, row) in x.rows().into_iter().enumerate() {
            for (k, centroid) in centroids.rows().into_iter().enumerate() {
                distances[[i, k]] = super::seeding::squared_distance(&row, &centroid).sqrt();
            }
        }

        Ok(distances)
    }

    pub fn converged(&self) -> Option<bool> {
        self.stop_reason.map(|stop| stop == StopReason::Converged)
    }

    fn clear(&mut self) {
        self.cluster_centers = None;
        self.labels = None;
        self.inertia = None;
        self.n_iter = None;
        self.initial_indices = None;
        self.stop_reason = None;
    }

    fn fitted_centers(&self, x: &Matrix) -> Result<&Matrix> {
        let centroids = self.cluster_centers.as_ref()
            .ok_or_else(|| KMeansError::invalid_input("KMeans not fitted. Call fit() first."))?;

        if x.ncols() != centroids.ncols() {
            return Err(KMeansError::invalid_input(format!(
                "Number of features in X ({}) doesn't match training data ({})",
                x.ncols(), centroids.ncols()
            )));
        }

        Ok(centroids)
    }
}
