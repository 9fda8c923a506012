//! Window split
//!
//! Partition a time-stamped table into a reference window and a current window.
use crate::config::SplitStrategy;
use crate::data::TripTable;
use chrono::{NaiveDate, NaiveDateTime};

/// Reference and current windows of one table.
#[derive(Debug, Clone)]
pub struct Windows {
    pub reference: TripTable,
    pub current: TripTable,
    /// Where the windows meet: midnight of the split date, or the first
    /// timestamp of the current window for an even split.
    pub boundary: Option<NaiveDateTime>,
}

/// Split on a date: rows strictly before midnight of `split_date` form the reference.
pub fn split_by_date(table: &TripTable, split_date: NaiveDate) -> Windows {
    let boundary = split_date.and_time(chrono::NaiveTime::MIN);
    let reference = table.filter_rows(|i| table.timestamps[i] < boundary);
    let current = table.filter_rows(|i| table.timestamps[i] >= boundary);
    Windows {
        reference,
        current,
        boundary: Some(boundary),
    }
}

/// Split the time-ordered rows into two halves; the current window gets the extra row.
pub fn split_half(table: &TripTable) -> Windows {
    let sorted = table.sort_by_time();
    let mid = sorted.len() / 2;
    let boundary = sorted.timestamps.get(mid).copied();
    let reference = sorted.select(&(0..mid).collect::<Vec<_>>());
    let current = sorted.select(&(mid..sorted.len()).collect::<Vec<_>>());
    Windows {
        reference,
        current,
        boundary,
    }
}

/// Split with the configured strategy.
pub fn split(table: &TripTable, strategy: &SplitStrategy) -> Windows {
    match strategy {
        SplitStrategy::Date(date) => split_by_date(table, *date),
        SplitStrategy::Half => split_half(table),
    }
}
