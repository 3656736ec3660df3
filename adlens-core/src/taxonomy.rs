use crate::record::Field;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    /// categorical text with a discrete set of known values
    Select,
    Number,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    GreaterThan,
    LessThan,
    Between,
    Is,
    IsNot,
    Contains,
    DoesNotContain,
    In,
}

impl Operator {
    pub const ALL: [Operator; 9] = [
        Operator::Equals,
        Operator::GreaterThan,
        Operator::LessThan,
        Operator::Between,
        Operator::Is,
        Operator::IsNot,
        Operator::Contains,
        Operator::DoesNotContain,
        Operator::In,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Operator::Equals => "equals",
            Operator::GreaterThan => "greater_than",
            Operator::LessThan => "less_than",
            Operator::Between => "between",
            Operator::Is => "is",
            Operator::IsNot => "is_not",
            Operator::Contains => "contains",
            Operator::DoesNotContain => "does_not_contain",
            Operator::In => "in",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Operator::Equals => "=",
            Operator::GreaterThan => ">",
            Operator::LessThan => "<",
            Operator::Between => "between",
            Operator::Is => "is",
            Operator::IsNot => "is not",
            Operator::Contains => "contains",
            Operator::DoesNotContain => "does not contain",
            Operator::In => "in",
        }
    }

    /// Accepts ids ("greater_than") and spaced names ("greater than"), case-insensitive.
    pub fn parse(s: &str) -> Option<Operator> {
        let norm = s.trim().to_lowercase().replace([' ', '-'], "_");
        Operator::ALL.iter().copied().find(|op| op.id() == norm)
    }

    /// Number of value inputs the operator needs.
    pub fn arity(self) -> usize {
        if self == Operator::Between { 2 } else { 1 }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug)]
pub struct Category {
    pub name: &'static str,
    pub field_type: FieldType,
    pub default_field: Field,
    pub options: Option<&'static [&'static str]>,
    /// first entry is preselected when an option is picked
    pub operators: &'static [Operator],
}

impl Category {
    /// Selectable labels; a category without options is its own single option.
    pub fn option_labels(&self) -> Vec<&'static str> {
        match self.options {
            Some(opts) => opts.to_vec(),
            None => vec![self.name],
        }
    }

    pub fn has_option(&self, label: &str) -> bool {
        self.option_labels().iter().any(|o| *o == label)
    }

    pub fn default_operator(&self) -> Operator {
        self.operators[0]
    }

    pub fn allows(&self, op: Operator) -> bool {
        self.operators.contains(&op)
    }

    pub fn is_numeric(&self) -> bool {
        self.field_type == FieldType::Number
    }
}

pub const METRICS: &str = "Metrics";
pub const TAGS: &str = "Tags";
pub const DIMENSIONS: &str = "Dimensions";

pub static CATEGORIES: [Category; 3] = [
    Category {
        name: METRICS,
        field_type: FieldType::Number,
        default_field: Field::Spend,
        options: Some(&[
            "Spend",
            "IPM",
            "CTR",
            "CPC",
            "CPI",
            "CPM",
            "Impressions",
            "Clicks",
            "Installs",
        ]),
        operators: &[
            Operator::Equals,
            Operator::GreaterThan,
            Operator::LessThan,
            Operator::Between,
        ],
    },
    Category {
        name: TAGS,
        field_type: FieldType::Select,
        default_field: Field::Country,
        options: Some(&["Country", "Ad Network", "Campaign", "Ad Group", "OS"]),
        operators: &[
            Operator::Is,
            Operator::IsNot,
            Operator::Contains,
            Operator::DoesNotContain,
        ],
    },
    Category {
        name: DIMENSIONS,
        field_type: FieldType::Text,
        default_field: Field::Tags,
        options: None,
        operators: &[
            Operator::Contains,
            Operator::DoesNotContain,
            Operator::Is,
            Operator::IsNot,
        ],
    },
];

pub fn category(name: &str) -> Option<&'static Category> {
    CATEGORIES.iter().find(|c| c.name == name)
}

pub fn category_names() -> Vec<&'static str> {
    CATEGORIES.iter().map(|c| c.name).collect()
}

static FALLBACK_RESOLUTIONS: AtomicU64 = AtomicU64::new(0);

/// Number of labels that fell back to the free-text `tags` field since startup.
pub fn fallback_resolutions() -> u64 {
    FALLBACK_RESOLUTIONS.load(Ordering::Relaxed)
}

/// Map an option label to its record field. Unknown labels resolve to `tags`.
pub fn resolve_field(option_label: &str) -> Field {
    match option_label {
        "Spend" => Field::Spend,
        "IPM" => Field::Ipm,
        "CTR" => Field::Ctr,
        "CPC" => Field::CostPerClick,
        "CPI" => Field::CostPerInstall,
        "CPM" => Field::Cpm,
        "Impressions" => Field::Impressions,
        "Clicks" => Field::Clicks,
        "Installs" => Field::Installs,
        "Country" => Field::Country,
        "Ad Network" => Field::AdNetwork,
        "Campaign" => Field::Campaign,
        "Ad Group" => Field::AdGroup,
        "OS" => Field::Os,
        DIMENSIONS => Field::Tags,
        other => {
            FALLBACK_RESOLUTIONS.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(label = other, "unmapped option label, falling back to tags");
            Field::Tags
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test] fn spend_resolves() { assert_eq!(resolve_field("Spend"), Field::Spend); }
    #[test] fn cpc_resolves() { assert_eq!(resolve_field("CPC"), Field::CostPerClick); }
    #[test] fn ad_group_resolves() { assert_eq!(resolve_field("Ad Group"), Field::AdGroup); }

    #[test]
    fn unknown_label_falls_back_and_counts() {
        let before = fallback_resolutions();
        assert_eq!(resolve_field("Spnd"), Field::Tags);
        assert!(fallback_resolutions() > before);
    }

    #[test]
    fn every_listed_option_resolves_without_fallback() {
        for cat in CATEGORIES.iter().filter(|c| c.options.is_some()) {
            for opt in cat.option_labels() {
                assert_ne!(resolve_field(opt), Field::Tags, "{opt}");
            }
        }
    }

    #[test]
    fn metric_options_are_numeric_fields() {
        let metrics = category(METRICS).unwrap();
        assert!(metrics.option_labels().iter().all(|o| resolve_field(o).is_numeric()));
    }

    #[test]
    fn default_operators() {
        assert_eq!(category(METRICS).unwrap().default_operator(), Operator::Equals);
        assert_eq!(category(TAGS).unwrap().default_operator(), Operator::Is);
        assert_eq!(category(DIMENSIONS).unwrap().default_operator(), Operator::Contains);
    }

    #[test]
    fn optionless_category_is_its_own_option() {
        assert_eq!(category(DIMENSIONS).unwrap().option_labels(), vec!["Dimensions"]);
    }

    #[test]
    fn in_is_not_offered_by_any_category() {
        assert!(CATEGORIES.iter().all(|c| !c.allows(Operator::In)));
    }

    #[test] fn parse_id() { assert_eq!(Operator::parse("does_not_contain"), Some(Operator::DoesNotContain)); }
    #[test] fn parse_spaced() { assert_eq!(Operator::parse("Greater Than"), Some(Operator::GreaterThan)); }
    #[test] fn parse_unknown() { assert_eq!(Operator::parse("approx"), None); }
    #[test] fn unknown_category() { assert!(category("Nope").is_none()); }
}
