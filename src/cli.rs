//! Command-line surface of the `kmeanspp` binary.
//!
//! Positional arguments are `K [MAX_ITER] EPSILON INPUT_FILE1 INPUT_FILE2`.
//! The optional middle argument makes the layout awkward to express purely in
//! clap, so clap collects the raw values and [`Invocation::parse_positional`]
//! resolves them.

use crate::cluster::KMeans;
use crate::error::{KMeansError, Result};
use crate::format::format_result;
use crate::loader::load_dataset;
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use tracing::info;

pub const DEFAULT_MAX_ITER: usize = 300;

#[derive(Debug, Parser)]
#[command(name = "kmeanspp")]
#[command(version)]
#[command(about = "k-means clustering with k-means++ initialization")]
pub struct Cli {
    /// K [MAX_ITER] EPSILON INPUT_FILE1 INPUT_FILE2
    #[arg(value_name = "ARGS", num_args = 4..=5, required = true)]
    pub args: Vec<String>,

    /// Seed for the k-means++ random draws
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Fully validated run parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct Invocation {
    pub k: usize,
    pub max_iter: usize,
    pub epsilon: f64,
    pub input1: PathBuf,
    pub input2: PathBuf,
    pub seed: u64,
}

impl Invocation {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        Self::parse_positional(&cli.args, cli.seed)
    }

    pub fn parse_positional(args: &[String], seed: u64) -> Result<Self> {
        let (k, max_iter, rest) = match args {
            [k, rest @ ..] if rest.len() == 3 => (k, None, rest),
            [k, max_iter, rest @ ..] if rest.len() == 3 => (k, Some(max_iter), rest),
            _ => {
                return Err(KMeansError::invalid_input(format!(
                    "expected 4 or 5 positional arguments, got {}",
                    args.len()
                )));
            }
        };

        let k = parse_positive(k, "K")?;
        let max_iter = match max_iter {
            Some(value) => parse_positive(value, "max_iter")?,
            None => DEFAULT_MAX_ITER,
        };

        let epsilon: f64 = rest[0]
            .parse()
            .map_err(|_| KMeansError::invalid_input(format!("epsilon '{}' is not a number", rest[0])))?;
        if !epsilon.is_finite() || epsilon < 0.0 {
            return Err(KMeansError::invalid_input(format!(
                "epsilon must be a finite non-negative number, got {}",
                epsilon
            )));
        }

        Ok(Self {
            k,
            max_iter,
            epsilon,
            input1: PathBuf::from(&rest[1]),
            input2: PathBuf::from(&rest[2]),
            seed,
        })
    }
}

/// Decimal digits only, strictly positive.
fn parse_positive(value: &str, name: &str) -> Result<usize> {
    let invalid = || KMeansError::invalid_input(format!("{} must be a positive integer, got '{}'", name, value));

    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    match value.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(invalid()),
    }
}

/// Loads, clusters and formats. Returns the text to print on success.
pub fn run(invocation: &Invocation) -> Result<String> {
    let dataset = load_dataset(&invocation.input1, &invocation.input2)?;
    info!(
        n_samples = dataset.n_samples(),
        n_features = dataset.n_features(),
        k = invocation.k,
        "dataset loaded"
    );

    if invocation.k > dataset.n_samples() {
        return Err(KMeansError::invalid_input(format!(
            "K={} exceeds the number of observations ({})",
            invocation.k,
            dataset.n_samples()
        )));
    }

    let mut kmeans = KMeans::new(invocation.k)
        .max_iter(invocation.max_iter)
        .tolerance(invocation.epsilon)
        .random_state(invocation.seed);
    kmeans.fit(dataset.features())?;

    match (&kmeans.initial_indices, &kmeans.cluster_centers) {
        (Some(indices), Some(centers)) => Ok(format_result(indices, centers)),
        _ => Err(KMeansError::generic("KMeans produced no result")),
    }
}
