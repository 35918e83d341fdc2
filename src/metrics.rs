use crate::error::{KMeansError, Result};
use crate::Matrix;

/// Within-cluster sum of squared distances.
pub fn inertia(x: &Matrix, centroids: &Matrix, labels: &[usize]) -> Result<f64> {
    if x.nrows() != labels.len() {
        return Err(KMeansError::invalid_input("x and labels must have the same length"));
    }

    if x.ncols() != centroids.ncols() {
        return Err(KMeansError::invalid_input("x and centroids must have the same number of features"));
    }

    let mut total = 0.0;
    for (row, &label) in x.rows().into_iter().zip(labels) {
        if label >= centroids.nrows() {
            return Err(KMeansError::invalid_input(format!(
                "label {} out of range for {} centroids",
                label,
                centroids.nrows()
            )));
        }

        let diff = &row - &centroids.row(label);
        total += diff.mapv(|v| v * v).sum();
    }

    Ok(total)
}

/// Inertia divided by the number of observations.
pub fn average_dispersion(x: &Matrix, centroids: &Matrix, labels: &[usize]) -> Result<f64> {
    if x.nrows() == 0 {
        return Err(KMeansError::invalid_input("x must have at least one sample"));
    }

    Ok(inertia(x, centroids, labels)? / x.nrows() as f64)
}
