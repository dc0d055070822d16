use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use choropleth_geometry::Granularity;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ChoroplethError, Result};
use crate::keys::normalize_key;

/// One observation for one region. Serialized as a `region,value` CSV row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueRecord {
    #[serde(rename = "region")]
    pub region_name: String,
    pub value: f64,
}

impl ValueRecord {
    pub fn new(region_name: impl Into<String>, value: f64) -> Self {
        Self {
            region_name: region_name.into(),
            value,
        }
    }
}

/// What to do when one normalized region key carries several different values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TieBreak {
    #[default]
    Error,
    KeepFirst,
    KeepLast,
    Mean,
}

impl TieBreak {
    pub fn as_str(&self) -> &'static str {
        match self {
            TieBreak::Error => "error",
            TieBreak::KeepFirst => "keep-first",
            TieBreak::KeepLast => "keep-last",
            TieBreak::Mean => "mean",
        }
    }
}

impl fmt::Display for TieBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TieBreak {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(TieBreak::Error),
            "keep-first" | "first" => Ok(TieBreak::KeepFirst),
            "keep-last" | "last" => Ok(TieBreak::KeepLast),
            "mean" | "aggregate" => Ok(TieBreak::Mean),
            other => Err(format!(
                "unknown tie-break '{other}'; expected error, keep-first, keep-last or mean"
            )),
        }
    }
}

struct Slot {
    first: f64,
    last: f64,
    sum: f64,
    count: usize,
}

/// Collapses the records to one value per normalized region key.
///
/// Keys come out normalized and in first-seen order. Rows repeating an identical value never
/// conflict; differing values are resolved by `tie_break`, and [`TieBreak::Error`] rejects them
/// with [`ChoroplethError::DuplicateRegion`].
pub fn deduplicate_regions(
    records: &[ValueRecord],
    granularity: Granularity,
    tie_break: TieBreak,
) -> Result<Vec<ValueRecord>> {
    let mut order: Vec<String> = Vec::with_capacity(records.len());
    let mut slots: HashMap<String, Slot> = HashMap::with_capacity(records.len());
    let mut conflicts = 0usize;

    for record in records {
        let key = normalize_key(&record.region_name, granularity);
        if key.is_empty() {
            return Err(ChoroplethError::Validation(
                "value table contains an empty region name".to_string(),
            ));
        }
        if !record.value.is_finite() {
            return Err(ChoroplethError::Validation(format!(
                "region '{key}' has non-finite value {}",
                record.value
            )));
        }

        match slots.entry(key) {
            Entry::Vacant(entry) => {
                order.push(entry.key().clone());
                entry.insert(Slot {
                    first: record.value,
                    last: record.value,
                    sum: record.value,
                    count: 1,
                });
            }
            Entry::Occupied(mut entry) => {
                let first = entry.get().first;
                if record.value != first {
                    if tie_break == TieBreak::Error {
                        return Err(ChoroplethError::DuplicateRegion {
                            key: entry.key().clone(),
                            first,
                            second: record.value,
                        });
                    }
                    conflicts += 1;
                }
                let slot = entry.get_mut();
                slot.last = record.value;
                slot.sum += record.value;
                slot.count += 1;
            }
        }
    }

    let deduplicated: Vec<ValueRecord> = order
        .into_iter()
        .map(|key| {
            let slot = &slots[&key];
            let value = match tie_break {
                TieBreak::Error | TieBreak::KeepFirst => slot.first,
                TieBreak::KeepLast => slot.last,
                TieBreak::Mean => slot.sum / slot.count as f64,
            };
            ValueRecord::new(key, value)
        })
        .collect();

    if deduplicated.len() != records.len() {
        info!(
            input_rows = records.len(),
            output_rows = deduplicated.len(),
            conflicts,
            policy = %tie_break,
            "collapsed duplicate region rows"
        );
    } else {
        debug!(rows = records.len(), "value records already unique");
    }

    Ok(deduplicated)
}
