//! Price list handling.
//!
//! The price list is produced outside this crate (a scraper of the Elastic Cloud
//! pricing table) as CSV with the columns
//! `cloud_provider,region,region_code,product,standard,gold,platinum,enterprise,unit`.
//! Prices carry a currency prefix (`$0.0120`) that is stripped before conversion.
//! The table is read-only once loaded.

use crate::models::{PricingEntry, Tier, TierAmounts};
use crate::snapshot::{read_text, SnapshotError};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

const INPUT: &str = "price list";

const REQUIRED_COLUMNS: [&str; 4] = ["region_code", "product", "standard", "unit"];

/// Converts a price cell to a number. An empty cell is a blank price (`None`); a
/// non-empty cell that does not parse is logged and counted as zero.
pub fn parse_price(text: &str) -> Option<f64> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => {
            warn!(input = text, "Unparseable price, counting it as zero");
            Some(0.0)
        }
    }
}

/// Splits CSV content into records of fields, honouring double quotes and `""`
/// escapes. A quoted field may span lines. Blank lines are dropped.
fn split_csv_records(content: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    let mut finish = |fields: &mut Vec<String>, current: &mut String| {
        fields.push(std::mem::take(current));
        let record = std::mem::take(fields);
        if !record.iter().all(|field| field.trim().is_empty()) {
            records.push(record);
        }
    };

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            '\r' if !in_quotes && chars.peek() == Some(&'\n') => {}
            '\n' if !in_quotes => finish(&mut fields, &mut current),
            _ => current.push(c),
        }
    }
    finish(&mut fields, &mut current);
    records
}

#[derive(Debug, Clone, Default)]
pub struct PricingTable {
    entries: Vec<PricingEntry>,
    by_key: HashMap<(String, String), usize>,
}

impl PricingTable {
    pub fn new(entries: Vec<PricingEntry>) -> Self {
        let mut by_key = HashMap::new();
        for (position, entry) in entries.iter().enumerate() {
            let key = (entry.region_code.clone(), entry.product_sku.clone());
            if by_key.contains_key(&key) {
                warn!(
                    region_code = %entry.region_code,
                    product = %entry.product_sku,
                    "Duplicate price list entry, keeping the first"
                );
                continue;
            }
            by_key.insert(key, position);
        }
        Self { entries, by_key }
    }

    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let content = read_text(path, INPUT)?;
        let table = Self::from_csv_str(&content)?;
        info!(path = %path.display(), entries = table.len(), "Loaded price list");
        Ok(table)
    }

    pub fn from_csv_str(content: &str) -> Result<Self, SnapshotError> {
        let mut records = split_csv_records(content).into_iter();

        let header = records.next().ok_or_else(|| SnapshotError::Structure {
            input: INPUT,
            field: "header".to_string(),
        })?;
        let columns: HashMap<String, usize> = header
            .into_iter()
            .enumerate()
            .map(|(position, name)| (name.trim().to_string(), position))
            .collect();
        for required in REQUIRED_COLUMNS {
            if !columns.contains_key(required) {
                return Err(SnapshotError::Structure {
                    input: INPUT,
                    field: required.to_string(),
                });
            }
        }

        let mut entries = Vec::new();
        for fields in records {
            let cell = |name: &str| -> String {
                columns
                    .get(name)
                    .and_then(|&position| fields.get(position))
                    .map(|value| value.trim().to_string())
                    .unwrap_or_default()
            };

            let mut tier_price = TierAmounts::default();
            for tier in Tier::ALL {
                tier_price.set(tier, parse_price(&cell(tier.as_str())));
            }

            entries.push(PricingEntry {
                cloud_provider: cell("cloud_provider"),
                region: cell("region"),
                region_code: cell("region_code"),
                product_sku: cell("product"),
                unit: cell("unit"),
                tier_price,
            });
        }

        debug!(entries = entries.len(), "Parsed price list");
        Ok(Self::new(entries))
    }

    /// Looks up the price entry for a node location and instance configuration.
    pub fn lookup(&self, region_code: &str, product_sku: &str) -> Option<&PricingEntry> {
        self.by_key
            .get(&(region_code.to_string(), product_sku.to_string()))
            .map(|&position| &self.entries[position])
    }

    pub fn entries(&self) -> &[PricingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
