//! Data
//!
//! Ingestion of trip records from CSV into a column store keyed by feature
//! name, plus the row filters applied before the window split.
use crate::config::ClipRule;
use crate::drift::FeatureSource;
use crate::errors::DriftError;
use chrono::{NaiveDate, NaiveDateTime};
use hashbrown::HashMap;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Time-stamped trip records with one numeric column per feature.
///
/// All columns have the same length as `timestamps`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripTable {
    pub timestamps: Vec<NaiveDateTime>,
    pub columns: HashMap<String, Vec<f64>>,
}

impl FeatureSource for TripTable {
    fn feature(&self, name: &str) -> Option<&[f64]> {
        self.column(name)
    }
}

impl TripTable {
    /// Build a table from parts, checking that every column matches the timestamps.
    pub fn new(timestamps: Vec<NaiveDateTime>, columns: HashMap<String, Vec<f64>>) -> Result<Self, DriftError> {
        if let Some((name, col)) = columns.iter().find(|(_, c)| c.len() != timestamps.len()) {
            return Err(DriftError::InvalidInput(format!(
                "column {} has {} values for {} timestamps",
                name,
                col.len(),
                timestamps.len()
            )));
        }
        Ok(TripTable { timestamps, columns })
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Values of a column, or `None` if it was not loaded.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(|c| c.as_slice())
    }

    /// Read trip records from a CSV file.
    ///
    /// * `path` - CSV file with a header row.
    /// * `date_column` - Name of the timestamp column.
    /// * `date_format` - `chrono` format of the timestamps.
    /// * `columns` - Numeric columns to load.
    /// * `max_rows` - Read at most this many records.
    pub fn from_csv<P: AsRef<Path>>(
        path: P,
        date_column: &str,
        date_format: &str,
        columns: &[String],
        max_rows: Option<usize>,
    ) -> Result<Self, DriftError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| DriftError::UnableToRead(format!("{}: {}", path.display(), e)))?;
        Self::from_reader(BufReader::new(file), date_column, date_format, columns, max_rows)
    }

    /// Same as [`TripTable::from_csv`] for any reader.
    ///
    /// Records with an unparseable timestamp or a missing, non-numeric or
    /// non-finite value in one of the requested columns are dropped.
    pub fn from_reader<R: Read>(
        reader: R,
        date_column: &str,
        date_format: &str,
        columns: &[String],
        max_rows: Option<usize>,
    ) -> Result<Self, DriftError> {
        let mut csv_reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers = csv_reader
            .headers()
            .map_err(|e| DriftError::UnableToRead(e.to_string()))?
            .clone();
        let header_index: HashMap<&str, usize> = headers.iter().enumerate().map(|(i, h)| (h.trim(), i)).collect();

        let find = |name: &str| -> Result<usize, DriftError> {
            header_index
                .get(name)
                .copied()
                .ok_or_else(|| DriftError::MissingColumn(name.to_string()))
        };
        let date_index = find(date_column)?;
        let column_indices: Vec<(String, usize)> = columns
            .iter()
            .map(|c| find(c).map(|i| (c.clone(), i)))
            .collect::<Result<_, _>>()?;

        let mut timestamps = Vec::new();
        let mut values: Vec<Vec<f64>> = vec![Vec::new(); column_indices.len()];
        let mut row = Vec::with_capacity(column_indices.len());
        let (mut read, mut dropped) = (0, 0);

        for result in csv_reader.records() {
            if max_rows.is_some_and(|m| read >= m) {
                break;
            }
            let record = result.map_err(|e| DriftError::UnableToRead(e.to_string()))?;
            read += 1;

            let ts = match record.get(date_index).map(|s| NaiveDateTime::parse_from_str(s.trim(), date_format)) {
                Some(Ok(ts)) => ts,
                _ => {
                    dropped += 1;
                    continue;
                }
            };
            row.clear();
            for (_, idx) in &column_indices {
                match record.get(*idx).and_then(|s| s.trim().parse::<f64>().ok()) {
                    Some(v) if v.is_finite() => row.push(v),
                    _ => break,
                }
            }
            if row.len() != column_indices.len() {
                dropped += 1;
                continue;
            }
            timestamps.push(ts);
            for (col, &v) in values.iter_mut().zip(row.iter()) {
                col.push(v);
            }
        }

        if dropped > 0 {
            warn!("Dropped {} of {} records with missing or invalid values.", dropped, read);
        }
        debug!("Read {} records, kept {}.", read, timestamps.len());

        let columns = column_indices.into_iter().map(|(name, _)| name).zip(values).collect();
        Ok(TripTable { timestamps, columns })
    }

    /// New table holding the rows at `indices`, in that order.
    pub fn select(&self, indices: &[usize]) -> TripTable {
        let timestamps = indices.iter().map(|&i| self.timestamps[i]).collect();
        let columns = self
            .columns
            .iter()
            .map(|(name, col)| (name.clone(), indices.iter().map(|&i| col[i]).collect()))
            .collect();
        TripTable { timestamps, columns }
    }

    /// New table holding the rows for which `keep` returns true.
    pub fn filter_rows<F: Fn(usize) -> bool>(&self, keep: F) -> TripTable {
        let indices: Vec<usize> = (0..self.len()).filter(|&i| keep(i)).collect();
        self.select(&indices)
    }

    /// Sort rows by timestamp, keeping the file order of equal timestamps.
    pub fn sort_by_time(&self) -> TripTable {
        let mut indices: Vec<usize> = (0..self.len()).collect();
        indices.sort_by_key(|&i| self.timestamps[i]);
        self.select(&indices)
    }

    /// Drop rows whose value is not strictly below the rule's bound, for every rule.
    pub fn apply_clip_rules(&self, rules: &[ClipRule]) -> Result<TripTable, DriftError> {
        let mut bounded: Vec<(&[f64], f64)> = Vec::with_capacity(rules.len());
        for rule in rules {
            let col = self
                .column(&rule.column)
                .ok_or_else(|| DriftError::MissingColumn(rule.column.clone()))?;
            bounded.push((col, rule.upper_bound));
        }
        let table = self.filter_rows(|i| bounded.iter().all(|(col, bound)| col[i] < *bound));
        if table.len() < self.len() {
            info!("Clipping removed {} of {} rows.", self.len() - table.len(), self.len());
        }
        Ok(table)
    }

    /// Mean of a column per calendar day, in date order.
    pub fn daily_means(&self, name: &str) -> Option<Vec<(NaiveDate, f64)>> {
        let col = self.column(name)?;
        let mut days: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
        for (ts, &v) in self.timestamps.iter().zip(col.iter()) {
            let entry = days.entry(ts.date()).or_insert((0.0, 0));
            entry.0 += v;
            entry.1 += 1;
        }
        Some(days.into_iter().map(|(d, (s, n))| (d, s / n as f64)).collect())
    }
}

/// First existing path among `primary` and `fallbacks`.
pub fn resolve_data_path(primary: &Path, fallbacks: &[PathBuf]) -> Result<PathBuf, DriftError> {
    if primary.exists() {
        return Ok(primary.to_path_buf());
    }
    warn!("Data file not found at {}.", primary.display());
    for fallback in fallbacks {
        if fallback.exists() {
            info!("Found data at fallback path {}.", fallback.display());
            return Ok(fallback.clone());
        }
    }
    Err(DriftError::DataNotFound(primary.display().to_string()))
}

/// Kind of values found in a CSV column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Float,
    DateTime,
    Text,
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDiagnostic {
    pub name: String,
    pub kind: ColumnKind,
    pub non_empty: usize,
}

/// What a quick look at the head of a data file revealed.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnosis {
    pub rows_read: usize,
    pub columns: Vec<ColumnDiagnostic>,
    /// Number of parsed timestamps, or why the date column is unusable.
    pub date_column: Result<usize, String>,
    /// First few parsed dates of the date column.
    pub sample_dates: Vec<NaiveDate>,
}

fn infer_kind(values: &[String], date_format: &str) -> ColumnKind {
    let present: Vec<&str> = values.iter().map(|s| s.trim()).filter(|s| !s.is_empty()).collect();
    if present.is_empty() {
        ColumnKind::Empty
    } else if present.iter().all(|s| s.parse::<i64>().is_ok()) {
        ColumnKind::Integer
    } else if present.iter().all(|s| s.parse::<f64>().is_ok()) {
        ColumnKind::Float
    } else if present
        .iter()
        .all(|s| NaiveDateTime::parse_from_str(s, date_format).is_ok())
    {
        ColumnKind::DateTime
    } else {
        ColumnKind::Text
    }
}

/// Inspect the first `rows` records of a CSV: header, column kinds, and
/// whether the date column parses with `date_format`.
pub fn diagnose<R: Read>(reader: R, date_column: &str, date_format: &str, rows: usize) -> Result<Diagnosis, DriftError> {
    let mut csv_reader = csv::ReaderBuilder::new().has_headers(true).flexible(true).from_reader(reader);
    let headers = csv_reader
        .headers()
        .map_err(|e| DriftError::UnableToRead(e.to_string()))?
        .clone();
    let mut raw: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    let mut rows_read = 0;
    for result in csv_reader.records().take(rows) {
        let record = result.map_err(|e| DriftError::UnableToRead(e.to_string()))?;
        for (i, col) in raw.iter_mut().enumerate() {
            col.push(record.get(i).unwrap_or("").to_string());
        }
        rows_read += 1;
    }

    let columns = headers
        .iter()
        .zip(raw.iter())
        .map(|(name, values)| ColumnDiagnostic {
            name: name.trim().to_string(),
            kind: infer_kind(values, date_format),
            non_empty: values.iter().filter(|v| !v.trim().is_empty()).count(),
        })
        .collect();

    let mut sample_dates = Vec::new();
    let date_column_state = match headers.iter().position(|h| h.trim() == date_column) {
        None => Err(format!("column {} not in header", date_column)),
        Some(idx) => {
            let mut parsed = 0;
            let mut first_error = None;
            for v in &raw[idx] {
                match NaiveDateTime::parse_from_str(v.trim(), date_format) {
                    Ok(ts) => {
                        parsed += 1;
                        if sample_dates.len() < 5 {
                            sample_dates.push(ts.date());
                        }
                    }
                    Err(e) => {
                        if first_error.is_none() {
                            first_error = Some(format!("{:?}: {}", v, e));
                        }
                    }
                }
            }
            match first_error {
                Some(e) if parsed == 0 => Err(e),
                _ => Ok(parsed),
            }
        }
    };

    Ok(Diagnosis {
        rows_read,
        columns,
        date_column: date_column_state,
        sample_dates,
    })
}
