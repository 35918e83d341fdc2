//! k-means clustering.
//!
//! This module provides:
//! - `KMeansPlusPlus`: distance-weighted selection of the starting centroids
//! - `Lloyd`: the assign/update refinement loop
//! - `KMeans`: an estimator that runs both with builder-style parameters
//!
//! # Examples
//!
//! ## Seeding and refining by hand
//! ```rust
//! use kmeanspp::cluster::{refine, seed};
//! use ndarray::array;
//!
//! let x = array![[0.0, 0.0], [0.0, 1.0], [10.0, 0.0], [10.0, 1.0]];
//!
//! let seeding = seed(&x, 2, 0).unwrap();
//! let result = refine(&x, seeding.centroids, 0.001, 300).unwrap();
//!
//! println!("Initial indices: {:?}", seeding.indices);
//! println!("Centroids: {:?}", result.centroids);
//! println!("Stopped after {} iterations ({})", result.n_iter, result.stop);
//! ```
//!
//! ## K-Means estimator
//! ```rust
//! use kmeanspp::KMeans;
//! use ndarray::array;
//!
//! let x = array![
//!     [1.0, 1.0],
//!     [1.5, 2.0],
//!     [3.0, 4.0],
//!     [5.0, 7.0],
//!     [3.5, 5.0],
//!     [4.5, 5.0]
//! ];
//!
//! let mut kmeans = KMeans::new(2).max_iter(100).random_state(7);
//! let labels = kmeans.fit_predict(&x).unwrap();
//! assert_eq!(labels.len(), 6);
//!
//! let inertia = kmeans.inertia.unwrap();
//! println!("Inertia: {:.4}", inertia);
//! ```

mod kmeans;
mod lloyd;
mod seeding;

pub use kmeans::KMeans;
pub use lloyd::{Lloyd, Refinement, StopReason, refine};
pub use seeding::{KMeansPlusPlus, Seeding, seed};
