use crate::record::Field;
use crate::taxonomy::{self, Category, Operator, METRICS};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

// --- model ---

/// Session-unique condition id. Time based (ms since epoch), bumped so that ids
/// handed out by one process are strictly increasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConditionId(pub u64);

static LAST_ID: AtomicU64 = AtomicU64::new(0);

impl ConditionId {
    pub fn fresh() -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let mut prev = LAST_ID.load(Ordering::Relaxed);
        loop {
            let next = now.max(prev + 1);
            match LAST_ID.compare_exchange_weak(prev, next, Ordering::Relaxed, Ordering::Relaxed) {
                Ok(_) => return ConditionId(next),
                Err(actual) => prev = actual,
            }
        }
    }
}

impl fmt::Display for ConditionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FilterValue {
    Text(String),
    Number(f64),
    Range(f64, f64),
    List(Vec<String>),
}

impl FilterValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FilterValue::Number(n) => Some(*n),
            FilterValue::Text(s) => s.trim().parse::<f64>().ok(),
            FilterValue::Range(..) | FilterValue::List(_) => None,
        }
    }

    /// Plain string form used by the substring operators.
    pub fn as_text(&self) -> String {
        match self {
            FilterValue::Text(s) => s.clone(),
            FilterValue::Number(n) => n.to_string(),
            FilterValue::Range(lo, hi) => format!("{lo},{hi}"),
            FilterValue::List(items) => items.join(","),
        }
    }

    fn fits(&self, op: Operator) -> bool {
        match op {
            Operator::Between => matches!(self, FilterValue::Range(..)),
            Operator::In => matches!(self, FilterValue::List(_)),
            _ => matches!(self, FilterValue::Text(_) | FilterValue::Number(_)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    pub id: ConditionId,
    pub category: String,
    pub option: String,
    pub field: Field,
    pub operator: Operator,
    pub value: FilterValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Conjunction {
    #[default]
    And,
    Or,
}

impl Conjunction {
    pub fn toggled(self) -> Self {
        match self {
            Conjunction::And => Conjunction::Or,
            Conjunction::Or => Conjunction::And,
        }
    }
}

impl fmt::Display for Conjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Conjunction::And => "AND",
            Conjunction::Or => "OR",
        })
    }
}

/// Ordered committed conditions plus the conjunction joining all of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSet {
    conditions: Vec<FilterCondition>,
    #[serde(default)]
    conjunction: Conjunction,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_conjunction(conjunction: Conjunction) -> Self {
        Self { conditions: Vec::new(), conjunction }
    }

    pub fn conditions(&self) -> &[FilterCondition] {
        &self.conditions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FilterCondition> {
        self.conditions.iter()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn conjunction(&self) -> Conjunction {
        self.conjunction
    }

    pub fn set_conjunction(&mut self, conjunction: Conjunction) {
        self.conjunction = conjunction;
    }

    pub fn toggle_conjunction(&mut self) {
        self.conjunction = self.conjunction.toggled();
    }

    pub fn push(&mut self, condition: FilterCondition) {
        self.conditions.push(condition);
    }

    pub fn contains(&self, id: ConditionId) -> bool {
        self.conditions.iter().any(|c| c.id == id)
    }

    /// Copy of the set without `id`; identical to `self` when `id` is absent.
    pub fn without(&self, id: ConditionId) -> FilterSet {
        FilterSet {
            conditions: self.conditions.iter().filter(|c| c.id != id).cloned().collect(),
            conjunction: self.conjunction,
        }
    }

    /// In-place variant of [`FilterSet::without`]; returns whether anything was removed.
    pub fn remove(&mut self, id: ConditionId) -> bool {
        let before = self.conditions.len();
        self.conditions.retain(|c| c.id != id);
        self.conditions.len() != before
    }
}

impl<'a> IntoIterator for &'a FilterSet {
    type Item = &'a FilterCondition;
    type IntoIter = std::slice::Iter<'a, FilterCondition>;
    fn into_iter(self) -> Self::IntoIter {
        self.conditions.iter()
    }
}

// --- construction ---

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConditionError {
    #[error("unknown category '{0}'")]
    UnknownCategory(String),
    #[error("'{option}' is not an option of {category}")]
    UnknownOption { category: String, option: String },
    #[error("operator '{operator}' is not allowed for {category}")]
    IllegalOperator { category: String, operator: &'static str },
    #[error("value is empty")]
    EmptyValue,
    #[error("between needs an upper bound")]
    EmptyRangeEnd,
    #[error("'{0}' is not a number")]
    InvalidNumber(String),
}

fn parse_number(raw: &str) -> Result<f64, ConditionError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| ConditionError::InvalidNumber(raw.to_string()))
}

/// Check raw builder input without allocating an id; same rules as [`create_condition`].
pub fn validate_condition(
    category: &str,
    option: &str,
    operator: Operator,
    raw_value: &str,
    raw_value_end: Option<&str>,
) -> Result<(), ConditionError> {
    coerce(category, option, operator, raw_value, raw_value_end).map(|_| ())
}

/// Build a condition from raw builder input, coercing values per the category's field type.
pub fn create_condition(
    category: &str,
    option: &str,
    operator: Operator,
    raw_value: &str,
    raw_value_end: Option<&str>,
) -> Result<FilterCondition, ConditionError> {
    let (cat, value) = coerce(category, option, operator, raw_value, raw_value_end)?;
    Ok(FilterCondition {
        id: ConditionId::fresh(),
        category: cat.name.to_string(),
        option: option.to_string(),
        field: taxonomy::resolve_field(option),
        operator,
        value,
    })
}

fn coerce(
    category: &str,
    option: &str,
    operator: Operator,
    raw_value: &str,
    raw_value_end: Option<&str>,
) -> Result<(&'static Category, FilterValue), ConditionError> {
    let cat = taxonomy::category(category)
        .ok_or_else(|| ConditionError::UnknownCategory(category.to_string()))?;
    if !cat.has_option(option) {
        return Err(ConditionError::UnknownOption {
            category: cat.name.to_string(),
            option: option.to_string(),
        });
    }
    // `in` is accepted for text categories even though no category lists it
    let text_in = operator == Operator::In && !cat.is_numeric();
    if !cat.allows(operator) && !text_in {
        return Err(ConditionError::IllegalOperator {
            category: cat.name.to_string(),
            operator: operator.id(),
        });
    }
    if raw_value.trim().is_empty() {
        return Err(ConditionError::EmptyValue);
    }
    let value = match operator {
        Operator::Between => {
            let end = raw_value_end.unwrap_or("");
            if end.trim().is_empty() {
                return Err(ConditionError::EmptyRangeEnd);
            }
            FilterValue::Range(parse_number(raw_value)?, parse_number(end)?)
        }
        Operator::In => {
            let items: Vec<String> = raw_value
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if items.is_empty() {
                return Err(ConditionError::EmptyValue);
            }
            FilterValue::List(items)
        }
        _ if cat.is_numeric() => FilterValue::Number(parse_number(raw_value)?),
        _ => FilterValue::Text(raw_value.to_string()),
    };
    debug_assert!(value.fits(operator));
    Ok((cat, value))
}

// --- display ---

/// Value text shown in the active-filters list.
pub fn format_for_display(condition: &FilterCondition) -> String {
    match &condition.value {
        FilterValue::Range(lo, hi) => format!("{lo} - {hi}"),
        FilterValue::List(items) => items.join(", "),
        FilterValue::Number(n) if condition.category == METRICS => format!("{n:.2}"),
        FilterValue::Number(n) => n.to_string(),
        FilterValue::Text(s) => s.clone(),
    }
}

/// One-line summary, e.g. `Metrics Spend > 100.00`.
pub fn describe(condition: &FilterCondition) -> String {
    let option = if condition.option == condition.category {
        String::new()
    } else {
        format!(" {}", condition.option)
    };
    format!(
        "{}{} {} {}",
        condition.category,
        option,
        condition.operator.label(),
        format_for_display(condition)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cond(cat: &str, opt: &str, op: Operator, v: &str, end: Option<&str>) -> FilterCondition {
        create_condition(cat, opt, op, v, end).unwrap()
    }

    #[test]
    fn metrics_value_is_numeric() {
        let c = cond("Metrics", "Spend", Operator::GreaterThan, "100", None);
        assert_eq!(c.field, Field::Spend);
        assert_eq!(c.value, FilterValue::Number(100.0));
    }

    #[test]
    fn tags_value_stays_text() {
        let c = cond("Tags", "Country", Operator::Is, "US", None);
        assert_eq!(c.field, Field::Country);
        assert_eq!(c.value, FilterValue::Text("US".into()));
    }

    #[test]
    fn between_builds_pair() {
        let c = cond("Metrics", "Installs", Operator::Between, "10", Some("20"));
        assert_eq!(c.value, FilterValue::Range(10.0, 20.0));
    }

    #[test]
    fn in_builds_list() {
        let c = cond("Tags", "Country", Operator::In, "US, IN,,", None);
        assert_eq!(c.value, FilterValue::List(vec!["US".into(), "IN".into()]));
    }

    #[test]
    fn dimensions_resolves_to_tags() {
        let c = cond("Dimensions", "Dimensions", Operator::Contains, "promo", None);
        assert_eq!(c.field, Field::Tags);
    }

    #[test] fn validate_matches_create() { assert_eq!(validate_condition("Tags", "OS", Operator::Is, "", None), Err(ConditionError::EmptyValue)); assert!(validate_condition("Tags", "OS", Operator::Is, "ios", None).is_ok()); }
    #[test] fn whitespace_value_rejected() { assert_eq!(create_condition("Tags", "Country", Operator::Is, "   ", None), Err(ConditionError::EmptyValue)); }
    #[test] fn whitespace_range_end_rejected() { assert_eq!(create_condition("Metrics", "Installs", Operator::Between, "10", Some(" ")), Err(ConditionError::EmptyRangeEnd)); }
    #[test] fn empty_value_rejected() { assert_eq!(create_condition("Tags", "OS", Operator::Is, "", None), Err(ConditionError::EmptyValue)); }
    #[test] fn missing_range_end_rejected() { assert_eq!(create_condition("Metrics", "CTR", Operator::Between, "1", Some("")), Err(ConditionError::EmptyRangeEnd)); }
    #[test] fn absent_range_end_rejected() { assert_eq!(create_condition("Metrics", "CTR", Operator::Between, "1", None), Err(ConditionError::EmptyRangeEnd)); }

    #[test]
    fn illegal_operator_rejected() {
        let err = create_condition("Tags", "OS", Operator::GreaterThan, "1", None).unwrap_err();
        assert!(matches!(err, ConditionError::IllegalOperator { .. }));
    }

    #[test]
    fn in_on_metrics_rejected() {
        let err = create_condition("Metrics", "Spend", Operator::In, "1,2", None).unwrap_err();
        assert!(matches!(err, ConditionError::IllegalOperator { .. }));
    }

    #[test]
    fn foreign_option_rejected() {
        let err = create_condition("Metrics", "Country", Operator::Equals, "1", None).unwrap_err();
        assert!(matches!(err, ConditionError::UnknownOption { .. }));
    }

    #[test]
    fn unknown_category_rejected() {
        let err = create_condition("Nope", "Spend", Operator::Equals, "1", None).unwrap_err();
        assert_eq!(err, ConditionError::UnknownCategory("Nope".into()));
    }

    #[test]
    fn non_numeric_metric_rejected() {
        let err = create_condition("Metrics", "Spend", Operator::Equals, "lots", None).unwrap_err();
        assert_eq!(err, ConditionError::InvalidNumber("lots".into()));
    }

    #[test]
    fn ids_are_unique_in_quick_succession() {
        let a = ConditionId::fresh();
        let b = ConditionId::fresh();
        assert!(b > a);
    }

    #[test]
    fn without_removes_matching_id() {
        let mut set = FilterSet::new();
        let a = cond("Tags", "OS", Operator::Is, "ios", None);
        let b = cond("Tags", "OS", Operator::Is, "android", None);
        let a_id = a.id;
        set.push(a);
        set.push(b.clone());
        let after = set.without(a_id);
        assert_eq!(after.conditions(), &[b]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn without_unknown_id_is_identity() {
        let mut set = FilterSet::with_conjunction(Conjunction::Or);
        set.push(cond("Tags", "OS", Operator::Is, "ios", None));
        assert_eq!(set.without(ConditionId(0)), set);
        assert_eq!(set.without(ConditionId(0)).without(ConditionId(0)), set);
    }

    #[test]
    fn remove_reports_change() {
        let mut set = FilterSet::new();
        let c = cond("Tags", "OS", Operator::Is, "ios", None);
        let id = c.id;
        set.push(c);
        assert!(set.remove(id));
        assert!(!set.remove(id));
        assert!(set.is_empty());
    }

    #[test]
    fn conjunction_toggles() {
        let mut set = FilterSet::new();
        assert_eq!(set.conjunction(), Conjunction::And);
        set.toggle_conjunction();
        assert_eq!(set.conjunction(), Conjunction::Or);
    }

    #[test] fn display_metric_two_decimals() { assert_eq!(format_for_display(&cond("Metrics", "Spend", Operator::Equals, "120.5", None)), "120.50"); }
    #[test] fn display_range() { assert_eq!(format_for_display(&cond("Metrics", "Installs", Operator::Between, "10", Some("20.5"))), "10 - 20.5"); }
    #[test] fn display_list() { assert_eq!(format_for_display(&cond("Tags", "OS", Operator::In, "ios,android", None)), "ios, android"); }
    #[test] fn display_text_raw() { assert_eq!(format_for_display(&cond("Tags", "Country", Operator::Contains, "U s", None)), "U s"); }

    #[test]
    fn describe_skips_self_option() {
        assert_eq!(describe(&cond("Dimensions", "Dimensions", Operator::Contains, "x", None)), "Dimensions contains x");
        assert_eq!(describe(&cond("Metrics", "Spend", Operator::GreaterThan, "5", None)), "Metrics Spend > 5.00");
    }
}
