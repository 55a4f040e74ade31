//! Drought signal table loading and per-evaluation record selection.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::models::{Cdi, DroughtSignals};

pub const REQUIRED_COLUMNS: [&str; 5] = ["date", "region", "spi12", "spi24", "cdi"];

#[derive(Debug, Error)]
pub enum SignalError {
    #[error("missing columns in drought table: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("no rows found for region={0}")]
    NoRegionRows(String),
    #[error("cannot derive month from date `{0}`")]
    InvalidDate(String),
    #[error("unknown CDI level `{value}` in row dated {date}")]
    UnknownCdi { value: String, date: String },
    #[error("failed to read drought table: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DroughtRecord {
    pub date: String,
    pub region: String,
    pub spi12: f64,
    pub spi24: f64,
    pub cdi: String,
}

impl DroughtRecord {
    /// Calendar month from a `YYYY-MM-...` date.
    pub fn month(&self) -> Result<u32, SignalError> {
        self.date
            .trim()
            .split('-')
            .nth(1)
            .and_then(|m| m.trim().parse::<u32>().ok())
            .filter(|m| (1..=12).contains(m))
            .ok_or_else(|| SignalError::InvalidDate(self.date.clone()))
    }

    pub fn to_signals(&self) -> Result<DroughtSignals, SignalError> {
        let cdi = self
            .cdi
            .trim()
            .to_lowercase()
            .parse::<Cdi>()
            .map_err(|_| SignalError::UnknownCdi {
                value: self.cdi.clone(),
                date: self.date.clone(),
            })?;

        Ok(DroughtSignals {
            spi12: self.spi12,
            spi24: self.spi24,
            cdi,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct DroughtTable {
    pub records: Vec<DroughtRecord>,
}

impl DroughtTable {
    pub fn new(records: Vec<DroughtRecord>) -> Self {
        DroughtTable { records }
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, SignalError> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let headers = reader.headers()?;
        let mut missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|column| !headers.iter().any(|h| h == **column))
            .map(|column| column.to_string())
            .collect();
        if !missing.is_empty() {
            missing.sort();
            return Err(SignalError::MissingColumns(missing));
        }

        let mut records = Vec::new();
        for result in reader.deserialize::<DroughtRecord>() {
            records.push(result?);
        }

        tracing::info!(rows = records.len(), "loaded drought table");
        Ok(DroughtTable { records })
    }

    pub fn regions(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for record in &self.records {
            if !seen.contains(&record.region.as_str()) {
                seen.push(record.region.as_str());
            }
        }
        seen
    }
}

pub fn load_drought_table(path: &Path) -> Result<DroughtTable, SignalError> {
    let file = std::fs::File::open(path).map_err(csv::Error::from)?;
    DroughtTable::from_reader(file)
}

/// Select the record for `region` whose month matches `month`, or the most
/// recent record for the region when no month matches.
pub fn pick_signals(
    table: &DroughtTable,
    month: u32,
    region: &str,
) -> Result<DroughtSignals, SignalError> {
    let rows: Vec<&DroughtRecord> = table
        .records
        .iter()
        .filter(|r| r.region == region)
        .collect();

    if rows.is_empty() {
        return Err(SignalError::NoRegionRows(region.to_string()));
    }

    let months = rows
        .iter()
        .map(|r| r.month())
        .collect::<Result<Vec<u32>, SignalError>>()?;
    let hit = rows
        .iter()
        .zip(&months)
        .find(|(_, m)| **m == month)
        .map(|(row, _)| *row);

    let chosen = match hit {
        Some(row) => row,
        None => {
            // `max_by` keeps the last of equal dates.
            let latest = rows
                .iter()
                .copied()
                .max_by(|a, b| a.date.cmp(&b.date))
                .ok_or_else(|| SignalError::NoRegionRows(region.to_string()))?;
            tracing::warn!(
                region,
                month,
                date = latest.date.as_str(),
                "no record for requested month, using most recent"
            );
            latest
        }
    };

    chosen.to_signals()
}
