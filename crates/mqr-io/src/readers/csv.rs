//! CSV reader with per-column type inference.
//!
//! Each column takes the narrowest type every non-empty cell fits:
//! `I64`, then `F64`, then `Bool` (`true`/`false`, any case), else `Str`.
//! Empty cells become `Null` whatever the column type.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::error::Result;
use mqr_core::dataset::{Column, Dataset, Scalar};

pub struct CsvReader<R: Read> {
    rdr: csv::Reader<R>,
}

impl CsvReader<File> {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let f = File::open(path)?;
        Ok(Self::from_reader(f))
    }
}

impl<R: Read> CsvReader<R> {
    pub fn from_reader(reader: R) -> Self {
        let rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        Self { rdr }
    }

    /// Read every record and infer column types.
    pub fn read_dataset(mut self) -> Result<Dataset> {
        let names: Vec<String> = self.rdr.headers()?.iter().map(str::to_string).collect();
        let mut raw: Vec<Vec<String>> = vec![Vec::new(); names.len()];

        for record in self.rdr.records() {
            let record = record?;
            for (i, cells) in raw.iter_mut().enumerate() {
                cells.push(record.get(i).unwrap_or("").to_string());
            }
        }

        let columns: Vec<Column> = names
            .into_iter()
            .zip(raw)
            .map(|(name, cells)| Column::new(name, infer(&cells)))
            .collect();
        let dataset = Dataset::new(columns)?;
        debug!(
            rows = dataset.num_rows(),
            columns = dataset.columns().len(),
            "csv dataset loaded"
        );
        Ok(dataset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Inferred {
    I64,
    F64,
    Bool,
    Str,
}

fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn infer_type(cells: &[String]) -> Inferred {
    let present = || cells.iter().map(String::as_str).filter(|s| !s.is_empty());
    if present().all(|s| s.parse::<i64>().is_ok()) {
        Inferred::I64
    } else if present().all(|s| s.parse::<f64>().is_ok()) {
        Inferred::F64
    } else if present().all(|s| parse_bool(s).is_some()) {
        Inferred::Bool
    } else {
        Inferred::Str
    }
}

fn infer(cells: &[String]) -> Vec<Scalar> {
    let ty = infer_type(cells);
    cells
        .iter()
        .map(|s| {
            if s.is_empty() {
                return Scalar::Null;
            }
            match ty {
                Inferred::I64 => s.parse().map(Scalar::I64).unwrap_or(Scalar::Null),
                Inferred::F64 => s.parse().map(Scalar::F64).unwrap_or(Scalar::Null),
                Inferred::Bool => parse_bool(s).map(Scalar::Bool).unwrap_or(Scalar::Null),
                Inferred::Str => Scalar::Str(s.clone()),
            }
        })
        .collect()
}
