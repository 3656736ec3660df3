use crate::filter::{create_condition, ConditionError, FilterCondition, FilterSet, Conjunction};
use crate::taxonomy::Operator;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClauseError {
    #[error("expected CATEGORY:OPTION:OPERATOR:VALUE, got '{0}'")]
    Shape(String),
    #[error("unknown operator '{0}'")]
    UnknownOperator(String),
    #[error("between expects LOW..HIGH, got '{0}'")]
    Range(String),
    #[error(transparent)]
    Condition(#[from] ConditionError),
}

/// Parse `Category:Option:operator:value` into a condition.
///
/// `between` takes `LOW..HIGH`, `in` takes a comma list. The value part may
/// itself contain `:`. Option-less categories accept the category name or an
/// empty option (`Dimensions::contains:promo`).
pub fn parse_clause(input: &str) -> Result<FilterCondition, ClauseError> {
    let mut parts = input.splitn(4, ':');
    let (Some(category), Some(option), Some(op), Some(value)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(ClauseError::Shape(input.to_string()));
    };
    let category = category.trim();
    let option = match option.trim() {
        "" => category,
        o => o,
    };
    let operator = Operator::parse(op).ok_or_else(|| ClauseError::UnknownOperator(op.trim().to_string()))?;
    if operator == Operator::Between {
        let (lo, hi) = value
            .split_once("..")
            .ok_or_else(|| ClauseError::Range(value.to_string()))?;
        return Ok(create_condition(category, option, operator, lo.trim(), Some(hi.trim()))?);
    }
    Ok(create_condition(category, option, operator, value, None)?)
}

/// Build a set from several clauses, joined by `conjunction`.
pub fn parse_clauses<S: AsRef<str>>(clauses: &[S], conjunction: Conjunction) -> Result<FilterSet, ClauseError> {
    let mut set = FilterSet::with_conjunction(conjunction);
    for c in clauses {
        set.push(parse_clause(c.as_ref())?);
    }
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterValue;
    use crate::record::Field;

    #[test]
    fn parses_metric_clause() {
        let c = parse_clause("Metrics:Spend:greater_than:100").unwrap();
        assert_eq!(c.field, Field::Spend);
        assert_eq!(c.operator, Operator::GreaterThan);
        assert_eq!(c.value, FilterValue::Number(100.0));
    }

    #[test]
    fn spaced_operator_names_work() {
        let c = parse_clause("Tags:Ad Network:is not:Meta").unwrap();
        assert_eq!(c.field, Field::AdNetwork);
        assert_eq!(c.operator, Operator::IsNot);
    }

    #[test]
    fn value_may_contain_colons() {
        let c = parse_clause("Tags:Campaign:contains:Q3: launch").unwrap();
        assert_eq!(c.value, FilterValue::Text("Q3: launch".into()));
    }

    #[test]
    fn between_range() {
        let c = parse_clause("Metrics:Installs:between:10..20").unwrap();
        assert_eq!(c.value, FilterValue::Range(10.0, 20.0));
    }

    #[test] fn between_without_dots() { assert_eq!(parse_clause("Metrics:Installs:between:10"), Err(ClauseError::Range("10".into()))); }
    #[test] fn empty_option_means_category() { assert_eq!(parse_clause("Dimensions::contains:promo").unwrap().field, Field::Tags); }
    #[test] fn too_few_parts() { assert!(matches!(parse_clause("Metrics:Spend:equals"), Err(ClauseError::Shape(_)))); }
    #[test] fn unknown_operator_rejected() { assert_eq!(parse_clause("Tags:OS:like:ios"), Err(ClauseError::UnknownOperator("like".into()))); }

    #[test]
    fn condition_errors_propagate() {
        assert_eq!(
            parse_clause("Tags:OS:is:"),
            Err(ClauseError::Condition(ConditionError::EmptyValue))
        );
    }

    #[test]
    fn clause_list_keeps_order_and_conjunction() {
        let set = parse_clauses(&["Tags:Country:is:US", "Metrics:Spend:less_than:5"], Conjunction::Or).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.conditions()[0].field, Field::Country);
        assert_eq!(set.conjunction(), Conjunction::Or);
    }
}
