//! Text rendering of a clustering result.

use crate::Matrix;

/// Renders the chosen initial indices on the first line, then one line per
/// centroid with four decimals per coordinate.
pub fn format_result(initial_indices: &[usize], centroids: &Matrix) -> String {
    let mut out = join(initial_indices.iter().map(|i| i.to_string()));
    out.push('\n');

    for centroid in centroids.rows() {
        out.push_str(&join(centroid.iter().map(|v| format!("{:.4}", v))));
        out.push('\n');
    }

    out
}

fn join(items: impl Iterator<Item = String>) -> String {
    items.collect::<Vec<_>>().join(",")
}
