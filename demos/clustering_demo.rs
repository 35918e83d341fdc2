use kmeanspp::cluster::{refine, seed};
use kmeanspp::dataset::make_blobs;
use kmeanspp::format::format_result;
use kmeanspp::metrics::average_dispersion;
use kmeanspp::{KMeans, Matrix};
use ndarray::array;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== k-means++ Clustering ===\n");

    // Three natural clusters
    let centers = array![[2.0, 2.0], [8.0, 8.0], [2.0, 8.0]];
    let (dataset, membership) = make_blobs(&centers, 15, 0.4, 11)?;
    let x = dataset.features();

    println!("Dataset: {} samples, {} features", dataset.n_samples(), dataset.n_features());
    println!("Expected: 3 natural clusters\n");

    println!("=== Seeding and refinement ===");
    let seeding = seed(x, 3, 0)?;
    let result = refine(x, seeding.centroids.clone(), 0.001, 300)?;

    println!("Stopped after {} iterations ({})", result.n_iter, result.stop);
    print!("{}", format_result(&seeding.indices, &result.centroids));

    let agreement = pair_agreement(&membership, &result.labels);
    println!("Pairwise agreement with true membership: {:.2}%\n", agreement * 100.0);

    println!("=== Average dispersion by K ===");
    for k in 1..=6 {
        match dispersion_for(x, k) {
            Ok(value) => println!("K={}: {:.4}", k, value),
            Err(e) => println!("K={} failed: {}", k, e),
        }
    }

    Ok(())
}

fn dispersion_for(x: &Matrix, k: usize) -> Result<f64, kmeanspp::KMeansError> {
    let mut kmeans = KMeans::new(k).random_state(0);
    let labels = kmeans.fit_predict(x)?;
    let centers = kmeans
        .cluster_centers
        .as_ref()
        .ok_or_else(|| kmeanspp::KMeansError::generic("not fitted"))?;
    average_dispersion(x, centers, &labels)
}

/// Fraction of sample pairs on which two labelings agree about "same cluster".
fn pair_agreement(a: &[usize], b: &[usize]) -> f64 {
    let n = a.len();
    let mut agree = 0usize;
    let mut total = 0usize;

    for i in 0..n {
        for j in (i + 1)..n {
            if (a[i] == a[j]) == (b[i] == b[j]) {
                agree += 1;
            }
            total += 1;
        }
    }

    if total == 0 { 1.0 } else { agree as f64 / total as f64 }
}
