use crate::filter::{Conjunction, FilterCondition, FilterSet, FilterValue};
use crate::record::{AdCreative, CellValue};
use crate::taxonomy::Operator;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterOutcome {
    /// indices into the evaluated slice, in source order
    pub rows: Vec<usize>,
    pub matched_rows: u64,
    pub scanned_rows: u64,
}

/// Whether `record` satisfies `set`. The empty set matches every record.
pub fn matches(record: &AdCreative, set: &FilterSet) -> bool {
    if set.is_empty() {
        return true;
    }
    match set.conjunction() {
        Conjunction::And => set.iter().all(|c| condition_matches(record, c)),
        Conjunction::Or => set.iter().any(|c| condition_matches(record, c)),
    }
}

pub fn condition_matches(record: &AdCreative, condition: &FilterCondition) -> bool {
    let v = condition.field.value(record);
    let f = &condition.value;
    match condition.operator {
        Operator::Equals => match (v, f.as_number()) {
            (CellValue::Number(n), Some(x)) => n == x,
            _ => false,
        },
        Operator::GreaterThan => cmp_numeric(v, f, |a, b| a > b),
        Operator::LessThan => cmp_numeric(v, f, |a, b| a < b),
        Operator::Between => match (v.as_number(), f) {
            (Some(n), FilterValue::Range(lo, hi)) => {
                let (lo, hi) = if lo <= hi { (*lo, *hi) } else { (*hi, *lo) };
                lo <= n && n <= hi
            }
            _ => false,
        },
        Operator::Is => is_equal(v, f),
        Operator::IsNot => !is_equal(v, f),
        Operator::Contains => contains_ci(v, f),
        Operator::DoesNotContain => !contains_ci(v, f),
        Operator::In => match f {
            FilterValue::List(items) => {
                let s = v.to_string();
                items.iter().any(|i| *i == s)
            }
            _ => false,
        },
    }
}

fn cmp_numeric(v: CellValue<'_>, f: &FilterValue, cmp: impl Fn(f64, f64) -> bool) -> bool {
    match (v.as_number(), f.as_number()) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    }
}

// exact and type-sensitive: text never equals a number
fn is_equal(v: CellValue<'_>, f: &FilterValue) -> bool {
    match (v, f) {
        (CellValue::Text(a), FilterValue::Text(b)) => a == b,
        (CellValue::Number(a), FilterValue::Number(b)) => a == *b,
        _ => false,
    }
}

fn contains_ci(v: CellValue<'_>, f: &FilterValue) -> bool {
    v.to_string()
        .to_lowercase()
        .contains(&f.as_text().to_lowercase())
}

/// Full re-scan of `records` against `set`.
pub fn apply(records: &[AdCreative], set: &FilterSet) -> FilterOutcome {
    let rows: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| matches(r, set))
        .map(|(i, _)| i)
        .collect();
    FilterOutcome {
        matched_rows: rows.len() as u64,
        scanned_rows: records.len() as u64,
        rows,
    }
}

pub fn filter_records<'a>(records: &'a [AdCreative], set: &FilterSet) -> Vec<&'a AdCreative> {
    records.iter().filter(|r| matches(r, set)).collect()
}
