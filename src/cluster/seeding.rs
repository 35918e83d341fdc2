use crate::error::{KMeansError, Result};
use crate::{ArrayView1, Matrix};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Starting centroids picked by k-means++.
#[derive(Clone, Debug, PartialEq)]
pub struct Seeding {
    /// Dataset row chosen at each step, in pick order.
    pub indices: Vec<usize>,
    /// Copies of the chosen rows, one per centroid.
    pub centroids: Matrix,
}

/// k-means++ initialization.
///
/// The first centroid is drawn uniformly. Every following one is drawn with
/// probability proportional to the squared distance from each observation to
/// its nearest already-chosen centroid.
#[derive(Clone, Copy, Debug, Default)]
pub struct KMeansPlusPlus;

impl KMeansPlusPlus {
    pub fn seed<R: Rng + ?Sized>(x: &Matrix, n_clusters: usize, rng: &mut R) -> Result<Seeding> {
        validate(x, n_clusters)?;

        let n_samples = x.nrows();
        let mut indices = Vec::with_capacity(n_clusters);
        let mut centroids = Matrix::zeros((n_clusters, x.ncols()));

        let first = rng.gen_range(0..n_samples);
        indices.push(first);
        centroids.row_mut(0).assign(&x.row(first));
        debug!(step = 0, index = first, "picked first centroid");

        // Squared distance from each observation to its nearest chosen centroid.
        let mut min_distances: Vec<f64> = x
            .rows()
            .into_iter()
            .map(|row| squared_distance(&row, &x.row(first)))
            .collect();

        for k in 1..n_clusters {
            let next = match weighted_index(&min_distances, rng) {
                Some(idx) => idx,
                None => {
                    debug!(step = k, "all weights are zero, falling back to uniform draw");
                    rng.gen_range(0..n_samples)
                }
            };

            indices.push(next);
            centroids.row_mut(k).assign(&x.row(next));
            debug!(step = k, index = next, weight = min_distances[next], "picked centroid");

            let chosen = x.row(next);
            for (dist, row) in min_distances.iter_mut().zip(x.rows()) {
                *dist = dist.min(squared_distance(&row, &chosen));
            }
        }

        Ok(Seeding { indices, centroids })
    }
}

/// Runs k-means++ with a generator seeded from `random_state`.
pub fn seed(x: &Matrix, n_clusters: usize, random_state: u64) -> Result<Seeding> {
    let mut rng = StdRng::seed_from_u64(random_state);
    KMeansPlusPlus::seed(x, n_clusters, &mut rng)
}

fn validate(x: &Matrix, n_clusters: usize) -> Result<()> {
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(KMeansError::invalid_input(
            "Input matrix must have at least one sample and one feature",
        ));
    }

    if x.iter().any(|v| !v.is_finite()) {
        return Err(KMeansError::invalid_input("observations must be finite"));
    }

    if n_clusters == 0 {
        return Err(KMeansError::invalid_input("n_clusters must be > 0"));
    }

    if x.nrows() < n_clusters {
        return Err(KMeansError::invalid_input(format!(
            "n_samples={} should be >= n_clusters={}",
            x.nrows(),
            n_clusters
        )));
    }

    Ok(())
}

/// Draws an index with probability proportional to `weights`.
///
/// Builds the cumulative sums and binary-searches a single uniform draw in
/// `[0, total)`. Zero-weight entries occupy empty intervals and can never be
/// returned. Returns `None` when the total weight is zero or not finite.
pub(crate) fn weighted_index<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> Option<usize> {
    let mut cumulative = Vec::with_capacity(weights.len());
    let mut total = 0.0;
    for &w in weights {
        total += w;
        cumulative.push(total);
    }

    if !total.is_finite() || total <= 0.0 {
        return None;
    }

    let target = rng.gen_range(0.0..total);
    let idx = cumulative.partition_point(|&c| c <= target);

    // Rounding can leave target at or past the last sum; take the last
    // index that actually carries weight.
    if idx >= weights.len() {
        return weights.iter().rposition(|&w| w > 0.0);
    }

    Some(idx)
}

pub(crate) fn squared_distance(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
}
