//! Lap alignment on the shared progress key
//!
//! Both the wide aligned table and key-paired ghost frames are built on the
//! same primitive, a [`RowPairing`]: an ordered list of `(row_in_a, row_in_b)`
//! index pairs. [`pair_by_key`] produces the inner-join pairing and
//! [`pair_by_position`] the plain row-for-row pairing.

use crate::config::{AnalysisConfig, DuplicatePolicy, KeyMatch};
use crate::table::Table;
use crate::types::{Result, TelemetryError};
use std::collections::{HashMap, HashSet};

/// Ordered row index pairs between two tables
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowPairing {
    pairs: Vec<(usize, usize)>,
}

impl RowPairing {
    /// Number of paired rows
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True if no rows were paired
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// The `(row_in_a, row_in_b)` pairs in output order
    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }
}

/// Pair row `i` of A with row `i` of B for every `i < min(len_a, len_b)`
pub fn pair_by_position(len_a: usize, len_b: usize) -> RowPairing {
    RowPairing {
        pairs: (0..len_a.min(len_b)).map(|i| (i, i)).collect(),
    }
}

/// Pair rows of A and B whose key values match
///
/// Pairs follow A's row order; within a duplicate group under
/// `CrossProduct`, B's matches follow B's row order. Rows with a null or
/// non-finite key never match.
pub fn pair_by_key(
    a: &Table,
    label_a: &str,
    b: &Table,
    label_b: &str,
    config: &AnalysisConfig,
) -> Result<RowPairing> {
    let key_column = config.key_column.as_str();
    let keys_a = a.require_column(key_column, label_a)?;
    let keys_b = b.require_column(key_column, label_b)?;

    let groups_a = KeyGroups::build(keys_a, config.key_match);
    let groups_b = KeyGroups::build(keys_b, config.key_match);

    if config.duplicate_policy == DuplicatePolicy::Reject {
        groups_a.reject_duplicates(keys_a, label_a, key_column)?;
        groups_b.reject_duplicates(keys_b, label_b, key_column)?;
    }

    let mut pairs = Vec::new();
    for (row_a, key) in groups_a.ordered_rows() {
        if !groups_a.is_retained(key, row_a, config.duplicate_policy) {
            continue;
        }
        let Some(matches) = groups_b.rows_for(key) else {
            continue;
        };
        match config.duplicate_policy {
            DuplicatePolicy::CrossProduct => {
                pairs.extend(matches.iter().map(|&row_b| (row_a, row_b)));
            }
            DuplicatePolicy::KeepLast => pairs.push((row_a, matches[matches.len() - 1])),
            DuplicatePolicy::Reject | DuplicatePolicy::KeepFirst => {
                pairs.push((row_a, matches[0]))
            }
        }
    }

    log::debug!(
        "Key pairing {} ({} rows) x {} ({} rows): {} pairs",
        label_a,
        a.len(),
        label_b,
        b.len(),
        pairs.len()
    );
    Ok(RowPairing { pairs })
}

/// Row indices grouped by join key, remembering first-seen order
struct KeyGroups {
    groups: HashMap<i64, Vec<usize>>,
    order: Vec<(usize, i64)>,
}

impl KeyGroups {
    fn build(keys: &[Option<f64>], key_match: KeyMatch) -> Self {
        let mut groups: HashMap<i64, Vec<usize>> = HashMap::new();
        let mut order = Vec::with_capacity(keys.len());

        for (row, key) in keys.iter().enumerate() {
            let Some(join_key) = key.and_then(|k| key_match.join_key(k)) else {
                log::trace!("Row {} has no usable key, skipped", row);
                continue;
            };
            groups.entry(join_key).or_default().push(row);
            order.push((row, join_key));
        }

        Self { groups, order }
    }

    /// Every keyed row with its join key, in table order
    fn ordered_rows(&self) -> impl Iterator<Item = (usize, i64)> + '_ {
        self.order.iter().copied()
    }

    fn rows_for(&self, key: i64) -> Option<&[usize]> {
        self.groups.get(&key).map(Vec::as_slice)
    }

    /// Whether `row` is the representative of its key group under `policy`
    fn is_retained(&self, key: i64, row: usize, policy: DuplicatePolicy) -> bool {
        let Some(rows) = self.groups.get(&key) else {
            return false;
        };
        match policy {
            DuplicatePolicy::KeepLast => rows.last() == Some(&row),
            DuplicatePolicy::CrossProduct => true,
            DuplicatePolicy::Reject | DuplicatePolicy::KeepFirst => rows.first() == Some(&row),
        }
    }

    /// Fail on the first repeated key in table order
    fn reject_duplicates(&self, keys: &[Option<f64>], table: &str, column: &str) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.groups.len());
        for &(row, key) in &self.order {
            if !seen.insert(key) {
                return Err(TelemetryError::DuplicateKey {
                    table: table.to_string(),
                    column: column.to_string(),
                    key: keys[row].unwrap_or(f64::NAN),
                });
            }
        }
        Ok(())
    }
}

/// Name of a non-key column after the join: `<column>_<label>`
pub fn suffixed(column: &str, label: &str) -> String {
    format!("{}_{}", column, label)
}

/// Two laps joined on their progress key
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedTable {
    table: Table,
    key_column: String,
    label_a: String,
    label_b: String,
    pairing: RowPairing,
}

impl AlignedTable {
    /// Number of joined rows
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// True if no key value matched
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// The joined rows as a plain table
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Key column name (appears once, unsuffixed)
    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    /// Key values of the joined rows, taken from lap A
    pub fn keys(&self) -> &[Option<f64>] {
        self.table.column(&self.key_column).unwrap_or(&[])
    }

    /// Labels of lap A and lap B
    pub fn labels(&self) -> (&str, &str) {
        (&self.label_a, &self.label_b)
    }

    /// The row pairing the join was built from
    pub fn pairing(&self) -> &RowPairing {
        &self.pairing
    }

    /// Joined values of `column` from the lap labelled `label`
    pub fn series(&self, column: &str, label: &str) -> Option<&[Option<f64>]> {
        self.table.column(&suffixed(column, label))
    }
}

/// Join two laps on the configured key column
///
/// Every non-key column of A is renamed `<column>_<label_a>`, likewise for B.
/// The key column appears once, carrying A's values; under
/// `KeyMatch::Rounded` the paired B key is only equal after rounding.
/// Fails with `MissingKey` when either lap lacks the key, `DuplicateKey`
/// under the `Reject` policy, and `LabelConflict` when the labels would
/// produce clashing column names.
pub fn align(
    a: &Table,
    label_a: &str,
    b: &Table,
    label_b: &str,
    config: &AnalysisConfig,
) -> Result<AlignedTable> {
    if label_a == label_b {
        return Err(TelemetryError::LabelConflict(format!(
            "both laps are labelled '{}'",
            label_a
        )));
    }

    let pairing = pair_by_key(a, label_a, b, label_b, config)?;
    let key_column = config.key_column.as_str();

    let mut columns: Vec<(String, Vec<Option<f64>>)> = Vec::new();
    let keys_a = a.require_column(key_column, label_a)?;
    columns.push((
        key_column.to_string(),
        pairing.pairs().iter().map(|&(row_a, _)| keys_a[row_a]).collect(),
    ));

    for (table, label, from_b) in [(a, label_a, false), (b, label_b, true)] {
        for (name, values) in table.iter_columns() {
            if name == key_column {
                continue;
            }
            let joined = pairing
                .pairs()
                .iter()
                .map(|&(row_a, row_b)| values[if from_b { row_b } else { row_a }])
                .collect();
            columns.push((suffixed(name, label), joined));
        }
    }

    let table = Table::from_columns(columns).map_err(|_| {
        TelemetryError::LabelConflict(format!(
            "labels '{}' and '{}' produce clashing column names",
            label_a, label_b
        ))
    })?;

    if table.is_empty() {
        log::warn!("No overlapping {} values between {} and {}", key_column, label_a, label_b);
    } else {
        log::info!(
            "Aligned {} and {}: {} rows, {} columns",
            label_a,
            label_b,
            table.len(),
            table.column_names().len()
        );
    }

    Ok(AlignedTable {
        table,
        key_column: key_column.to_string(),
        label_a: label_a.to_string(),
        label_b: label_b.to_string(),
        pairing,
    })
}
