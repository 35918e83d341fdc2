//! k-means clustering with k-means++ seeding.
//!
//! The crate is split the same way the computation flows:
//! - [`cluster::KMeansPlusPlus`] picks `k` starting centroids by
//!   distance-weighted sampling.
//! - [`cluster::Lloyd`] refines them until the centroids stop moving or the
//!   iteration cap is reached.
//! - [`cluster::KMeans`] wraps both behind a builder-style estimator.
//!
//! [`loader`] and [`format`] are the thin text collaborators used by the
//! `kmeanspp` binary.

pub use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

pub mod cli;
pub mod cluster;
pub mod dataset;
pub mod error;
pub mod format;
pub mod loader;
pub mod metrics;

pub use cluster::{KMeans, KMeansPlusPlus, Lloyd, Refinement, Seeding, StopReason};
pub use dataset::Dataset;
pub use error::{KMeansError, Result};

pub type Vector = Array1<f64>;
pub type Matrix = Array2<f64>;
