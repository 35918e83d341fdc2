use crate::error::{KMeansError, Result};
use crate::{ArrayView1, Matrix};
use ndarray::Axis;
use ndarray_rand::RandomExt;
use ndarray_rand::rand_distr::Normal;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// An immutable, rectangular set of observations.
///
/// Each row is one observation; the dimensionality is fixed by the first row.
/// Optional row keys carry the identifiers the rows were loaded with.
#[derive(Clone, Debug)]
pub struct Dataset {
    features: Matrix,
    keys: Option<Vec<String>>,
}

impl Dataset {
    pub fn new(features: Matrix) -> Result<Self> {
        if features.nrows() == 0 || features.ncols() == 0 {
            return Err(KMeansError::invalid_input(
                "dataset must have at least one observation and one feature",
            ));
        }

        Ok(Self { features, keys: None })
    }

    pub fn with_keys(features: Matrix, keys: Vec<String>) -> Result<Self> {
        if features.nrows() != keys.len() {
            return Err(KMeansError::invalid_input(format!(
                "number of keys ({}) doesn't match number of observations ({})",
                keys.len(),
                features.nrows()
            )));
        }

        let mut dataset = Self::new(features)?;
        dataset.keys = Some(keys);
        Ok(dataset)
    }

    /// Builds a dataset from row vectors, rejecting ragged input.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n_features = rows.first().map(Vec::len).unwrap_or(0);

        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != n_features) {
            return Err(KMeansError::invalid_input(format!(
                "observation {} has {} values, expected {}",
                i,
                row.len(),
                n_features
            )));
        }

        let n_samples = rows.len();
        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        let features = Matrix::from_shape_vec((n_samples, n_features), flat)
            .map_err(|e| KMeansError::invalid_input(e.to_string()))?;

        Self::new(features)
    }

    pub fn n_samples(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    pub fn features(&self) -> &Matrix {
        &self.features
    }

    pub fn keys(&self) -> Option<&[String]> {
        self.keys.as_deref()
    }

    pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.features.row(i)
    }

    pub fn into_features(self) -> Matrix {
        self.features
    }
}

/// Generates isotropic Gaussian blobs around `centers`.
///
/// Rows are grouped by center: the first `n_per_center` rows belong to
/// center 0, the next to center 1 and so on. The second value is the true
/// membership of every row.
pub fn make_blobs(
    centers: &Matrix,
    n_per_center: usize,
    std_dev: f64,
    random_state: u64,
) -> Result<(Dataset, Vec<usize>)> {
    if centers.nrows() == 0 || n_per_center == 0 {
        return Err(KMeansError::invalid_input(
            "make_blobs needs at least one center and one sample per center",
        ));
    }

    let noise = Normal::new(0.0, std_dev)
        .map_err(|e| KMeansError::invalid_input(format!("invalid std_dev {}: {}", std_dev, e)))?;
    let mut rng = StdRng::seed_from_u64(random_state);

    let n_samples = centers.nrows() * n_per_center;
    let mut features = Matrix::random_using((n_samples, centers.ncols()), noise, &mut rng);
    let mut membership = Vec::with_capacity(n_samples);

    for (i, mut row) in features.axis_iter_mut(Axis(0)).enumerate() {
        let center = i / n_per_center;
        row += &centers.row(center);
        membership.push(center);
    }

    Ok((Dataset::new(features)?, membership))
}
