//! Reading observation tables from comma-separated text files.
//!
//! Every non-empty line is `key,v1,v2,...`. The leading field identifies the
//! row and is used to match rows between two files; the remaining fields are
//! the numeric values.

use crate::dataset::Dataset;
use crate::error::{KMeansError, Result};
use crate::Matrix;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

const ACCEPTED_EXTENSIONS: [&str; 2] = ["txt", "csv"];

/// Rows of one input file: keys in file order plus their values.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    pub keys: Vec<String>,
    pub values: Matrix,
}

impl Table {
    pub fn n_rows(&self) -> usize {
        self.keys.len()
    }

    pub fn into_dataset(self) -> Result<Dataset> {
        Dataset::with_keys(self.values, self.keys)
    }
}

/// Parses table text. Every line must have as many fields as the first.
pub fn parse_table(content: &str) -> Result<Table> {
    let mut keys = Vec::new();
    let mut values = Vec::new();
    let mut n_fields = None;

    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let expected = *n_fields.get_or_insert(fields.len());
        if fields.len() != expected {
            return Err(KMeansError::invalid_input(format!(
                "line {} has {} fields, expected {}",
                line_no + 1,
                fields.len(),
                expected
            )));
        }

        for field in &fields[1..] {
            let value = field.parse::<f64>().ok().filter(|v| v.is_finite()).ok_or_else(|| {
                KMeansError::invalid_input(format!("line {}: '{}' is not a finite number", line_no + 1, field))
            })?;
            values.push(value);
        }
        keys.push(fields[0].to_string());
    }

    let n_values = n_fields.map_or(0, |n| n - 1);
    let values = Matrix::from_shape_vec((keys.len(), n_values), values)
        .map_err(|e| KMeansError::invalid_input(e.to_string()))?;

    Ok(Table { keys, values })
}

pub fn load_table(path: impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let content = String::from_utf8(bytes).map_err(|e| {
        KMeansError::invalid_input(format!("{} is not valid UTF-8 text: {}", path.display(), e))
    })?;
    let table = parse_table(&content)?;
    debug!(path = %path.display(), rows = table.n_rows(), columns = table.values.ncols(), "loaded table");
    Ok(table)
}

/// Inner join on the leading key, in the left table's row order.
///
/// Joined rows hold the left values followed by the right values. Keys that
/// both parse as numbers compare numerically, so `1` matches `1.0`. When the
/// right table repeats a key, its first row is used.
pub fn join_tables(left: &Table, right: &Table) -> Result<Dataset> {
    let mut right_rows: HashMap<String, usize> = HashMap::with_capacity(right.n_rows());
    for (i, key) in right.keys.iter().enumerate() {
        right_rows.entry(normalize_key(key)).or_insert(i);
    }

    let n_features = left.values.ncols() + right.values.ncols();
    let mut keys = Vec::new();
    let mut flat = Vec::new();

    for (i, key) in left.keys.iter().enumerate() {
        let Some(&j) = right_rows.get(&normalize_key(key)) else {
            continue;
        };

        keys.push(key.clone());
        flat.extend(left.values.row(i).iter().copied());
        flat.extend(right.values.row(j).iter().copied());
    }

    let dropped = left.n_rows() - keys.len();
    debug!(matched = keys.len(), dropped, "joined tables");

    if keys.is_empty() {
        return Err(KMeansError::invalid_input("the input tables share no keys"));
    }

    let features = Matrix::from_shape_vec((keys.len(), n_features), flat)
        .map_err(|e| KMeansError::invalid_input(e.to_string()))?;

    Dataset::with_keys(features, keys)
}

/// Loads both files and joins them into one dataset.
pub fn load_dataset(path1: impl AsRef<Path>, path2: impl AsRef<Path>) -> Result<Dataset> {
    let (path1, path2) = (path1.as_ref(), path2.as_ref());
    check_extension(path1)?;
    check_extension(path2)?;

    let left = load_table(path1)?;
    let right = load_table(path2)?;
    join_tables(&left, &right)
}

fn check_extension(path: &Path) -> Result<()> {
    let accepted = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ACCEPTED_EXTENSIONS.contains(&ext));

    if !accepted {
        return Err(KMeansError::invalid_input(format!(
            "{} must end with .txt or .csv",
            path.display()
        )));
    }

    Ok(())
}

fn normalize_key(key: &str) -> String {
    match key.parse::<f64>() {
        Ok(value) if value.is_finite() => value.to_string(),
        _ => key.to_string(),
    }
}
