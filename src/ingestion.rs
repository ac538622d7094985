//! Daily ingestion estimate from date-stamped index names.
//!
//! Time-based indices embed their day as `YYYY.MM.DD` (`logs-2024.01.31`). Store sizes
//! are bucketed by that day; indices without a valid date token are left out of the
//! estimate but not out of any other report.

use crate::models::{IndexStore, IngestionEstimate};
use crate::units::{is_system_index, parse_size};
use chrono::NaiveDate;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::debug;

pub const DEFAULT_WINDOW_DAYS: usize = 30;

fn date_token() -> &'static Regex {
    static DATE_TOKEN: OnceLock<Regex> = OnceLock::new();
    DATE_TOKEN.get_or_init(|| Regex::new(r"\d{4}\.\d{2}\.\d{2}").expect("valid date token pattern"))
}

/// First `YYYY.MM.DD` token in the name that is a real calendar date.
pub fn extract_index_date(index: &str) -> Option<NaiveDate> {
    date_token()
        .find_iter(index)
        .find_map(|m| NaiveDate::parse_from_str(m.as_str(), "%Y.%m.%d").ok())
}

/// Total store bytes per day.
pub fn bucket_by_day(indices: &[IndexStore]) -> BTreeMap<NaiveDate, u64> {
    let mut buckets = BTreeMap::new();
    for store in indices {
        if is_system_index(&store.index) {
            continue;
        }
        if let Some(day) = extract_index_date(&store.index) {
            let bucket = buckets.entry(day).or_insert(0u64);
            *bucket = bucket.saturating_add(parse_size(&store.store_size));
        }
    }
    buckets
}

/// Average daily ingestion over all days and over the `window_days` most recent days.
pub fn estimate_daily_ingestion(indices: &[IndexStore], window_days: usize) -> IngestionEstimate {
    let buckets = bucket_by_day(indices);
    if buckets.is_empty() {
        return IngestionEstimate::Inestimable {
            reason: "no date-based indices found".to_string(),
        };
    }

    let total_bytes = buckets.values().fold(0u64, |acc, &b| acc.saturating_add(b));
    let num_days = buckets.len();

    let recent: Vec<u64> = buckets
        .values()
        .rev()
        .take(window_days.max(1))
        .copied()
        .collect();
    let recent_total = recent.iter().fold(0u64, |acc, &b| acc.saturating_add(b));

    debug!(num_days, recent_days = recent.len(), total_bytes, "Estimated daily ingestion");

    IngestionEstimate::Estimated {
        avg_daily_bytes: total_bytes as f64 / num_days as f64,
        avg_recent_bytes: recent_total as f64 / recent.len() as f64,
        total_bytes,
        num_days,
        recent_days: recent.len(),
    }
}
