//! Reader for the palmerpenguins CSV layout.
use std::io::Read;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::data_handling::{Dataset, Sample};

const REQUIRED_COLUMNS: [&str; 7] = [
    "species",
    "island",
    "bill_length_mm",
    "bill_depth_mm",
    "flipper_length_mm",
    "body_mass_g",
    "sex",
];

/// How many rows were read and how many were dropped as incomplete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub rows_read: usize,
    pub rows_dropped: usize,
}

impl LoadSummary {
    pub fn rows_kept(&self) -> usize {
        self.rows_read - self.rows_dropped
    }
}

/// One raw row; unparsable numbers (e.g. `NA`) become `None`.
#[derive(Debug, Deserialize)]
struct PenguinRecord {
    species: Option<String>,
    island: Option<String>,
    #[serde(deserialize_with = "csv::invalid_option")]
    bill_length_mm: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    bill_depth_mm: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    flipper_length_mm: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    body_mass_g: Option<f64>,
    sex: Option<String>,
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != "NA")
}

impl PenguinRecord {
    /// A sample when every field is present, `None` otherwise.
    fn into_sample(self) -> Option<Sample> {
        Some(Sample {
            species: present(self.species)?,
            island: Some(present(self.island)?),
            sex: Some(present(self.sex)?),
            bill_length_mm: self.bill_length_mm.filter(|v| v.is_finite())?,
            bill_depth_mm: self.bill_depth_mm.filter(|v| v.is_finite())?,
            flipper_length_mm: self.flipper_length_mm.filter(|v| v.is_finite())?,
            body_mass_g: self.body_mass_g.filter(|v| v.is_finite())?,
        })
    }
}

/// Read a palmerpenguins CSV file, dropping rows with any missing value.
pub fn read_penguins_csv<P: AsRef<Path>>(path: P) -> Result<(Dataset, LoadSummary)> {
    let file = std::fs::File::open(&path)
        .with_context(|| format!("Failed to open data file: {}", path.as_ref().display()))?;
    read_penguins_from_reader(file)
        .with_context(|| format!("Failed to load data file: {}", path.as_ref().display()))
}

/// Read palmerpenguins CSV content from any reader.
pub fn read_penguins_from_reader<R: Read>(reader: R) -> Result<(Dataset, LoadSummary)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .context("Failed to read CSV header row")?
        .clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(anyhow!("Missing required column '{}'", column));
        }
    }

    let mut samples = Vec::new();
    let mut rows_read = 0;
    for (row_idx, result) in reader.deserialize::<PenguinRecord>().enumerate() {
        let record = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;
        rows_read += 1;
        if let Some(sample) = record.into_sample() {
            samples.push(sample);
        }
    }

    let summary = LoadSummary {
        rows_read,
        rows_dropped: rows_read - samples.len(),
    };
    if samples.is_empty() {
        return Err(anyhow!(
            "No complete rows found ({} rows read, all had missing values)",
            rows_read
        ));
    }
    log::info!(
        "Loaded {} rows, dropped {} with missing values",
        summary.rows_read,
        summary.rows_dropped
    );

    let dataset = Dataset::new(samples)?;
    Ok((dataset, summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
species,island,bill_length_mm,bill_depth_mm,flipper_length_mm,body_mass_g,sex,year
Adelie,Torgersen,39.1,18.7,181,3750,male,2007
Adelie,Torgersen,NA,NA,NA,NA,NA,2007
Adelie,Torgersen,36.7,19.3,193,3450,female,2007
Gentoo,Biscoe,46.1,13.2,211,4500,NA,2007
Gentoo,Biscoe,50.0,16.3,230,5700,male,2007
";

    #[test]
    fn test_drops_incomplete_rows() {
        let (dataset, summary) = read_penguins_from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(summary.rows_read, 5);
        assert_eq!(summary.rows_dropped, 2);
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.samples()[2].flipper_length_mm, 230.0);
        assert_eq!(dataset.samples()[0].sex.as_deref(), Some("male"));
    }

    #[test]
    fn test_missing_column_errors() {
        let csv = "species,island,bill_length_mm\nAdelie,Dream,39.0\n";
        let err = read_penguins_from_reader(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("bill_depth_mm"));
    }

    #[test]
    fn test_all_rows_incomplete_errors() {
        let csv = "species,island,bill_length_mm,bill_depth_mm,flipper_length_mm,body_mass_g,sex\n\
                   Adelie,Dream,NA,18.0,190,3700,male\n";
        assert!(read_penguins_from_reader(csv.as_bytes()).is_err());
    }
}
