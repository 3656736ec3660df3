use serde::{Deserialize, Serialize};
use std::fmt;

/// One row of the creative performance report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdCreative {
    pub creative_id: String,
    pub creative_name: String,
    pub tags: String,
    pub country: String,
    pub ad_network: String,
    pub os: String,
    pub campaign: String,
    pub ad_group: String,
    pub ipm: f64,
    pub ctr: f64,
    pub spend: f64,
    pub impressions: i64,
    pub clicks: i64,
    pub cpm: f64,
    pub cost_per_click: f64,
    pub cost_per_install: f64,
    pub installs: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    CreativeId,
    CreativeName,
    Tags,
    Country,
    AdNetwork,
    Os,
    Campaign,
    AdGroup,
    Ipm,
    Ctr,
    Spend,
    Impressions,
    Clicks,
    Cpm,
    CostPerClick,
    CostPerInstall,
    Installs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Float,
    Integer,
}

/// Typed view of a single cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellValue<'a> {
    Text(&'a str),
    Number(f64),
}

impl CellValue<'_> {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }
}

impl fmt::Display for CellValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) => write!(f, "{n}"),
        }
    }
}

impl Field {
    pub const ALL: [Field; 17] = [
        Field::CreativeId,
        Field::CreativeName,
        Field::Tags,
        Field::Country,
        Field::AdNetwork,
        Field::Os,
        Field::Campaign,
        Field::AdGroup,
        Field::Ipm,
        Field::Ctr,
        Field::Spend,
        Field::Impressions,
        Field::Clicks,
        Field::Cpm,
        Field::CostPerClick,
        Field::CostPerInstall,
        Field::Installs,
    ];

    /// Column name as it appears in the CSV header.
    pub fn name(self) -> &'static str {
        match self {
            Field::CreativeId => "creative_id",
            Field::CreativeName => "creative_name",
            Field::Tags => "tags",
            Field::Country => "country",
            Field::AdNetwork => "ad_network",
            Field::Os => "os",
            Field::Campaign => "campaign",
            Field::AdGroup => "ad_group",
            Field::Ipm => "ipm",
            Field::Ctr => "ctr",
            Field::Spend => "spend",
            Field::Impressions => "impressions",
            Field::Clicks => "clicks",
            Field::Cpm => "cpm",
            Field::CostPerClick => "cost_per_click",
            Field::CostPerInstall => "cost_per_install",
            Field::Installs => "installs",
        }
    }

    pub fn from_name(name: &str) -> Option<Field> {
        Field::ALL.iter().copied().find(|f| f.name() == name)
    }

    pub fn kind(self) -> FieldKind {
        match self {
            Field::Impressions | Field::Clicks | Field::Installs => FieldKind::Integer,
            Field::Ipm
            | Field::Ctr
            | Field::Spend
            | Field::Cpm
            | Field::CostPerClick
            | Field::CostPerInstall => FieldKind::Float,
            _ => FieldKind::Text,
        }
    }

    pub fn is_numeric(self) -> bool {
        self.kind() != FieldKind::Text
    }

    pub fn value(self, r: &AdCreative) -> CellValue<'_> {
        match self {
            Field::CreativeId => CellValue::Text(&r.creative_id),
            Field::CreativeName => CellValue::Text(&r.creative_name),
            Field::Tags => CellValue::Text(&r.tags),
            Field::Country => CellValue::Text(&r.country),
            Field::AdNetwork => CellValue::Text(&r.ad_network),
            Field::Os => CellValue::Text(&r.os),
            Field::Campaign => CellValue::Text(&r.campaign),
            Field::AdGroup => CellValue::Text(&r.ad_group),
            Field::Ipm => CellValue::Number(r.ipm),
            Field::Ctr => CellValue::Number(r.ctr),
            Field::Spend => CellValue::Number(r.spend),
            Field::Impressions => CellValue::Number(r.impressions as f64),
            Field::Clicks => CellValue::Number(r.clicks as f64),
            Field::Cpm => CellValue::Number(r.cpm),
            Field::CostPerClick => CellValue::Number(r.cost_per_click),
            Field::CostPerInstall => CellValue::Number(r.cost_per_install),
            Field::Installs => CellValue::Number(r.installs as f64),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for f in Field::ALL {
            assert_eq!(Field::from_name(f.name()), Some(f));
        }
        assert_eq!(Field::from_name("nope"), None);
    }

    #[test]
    fn integer_fields_read_as_numbers() {
        let r = AdCreative { installs: 7, ..Default::default() };
        assert_eq!(Field::Installs.value(&r), CellValue::Number(7.0));
        assert_eq!(Field::Installs.kind(), FieldKind::Integer);
    }

    #[test] fn text_cell_parses_as_number() { assert_eq!(CellValue::Text(" 12.5 ").as_number(), Some(12.5)); }
    #[test] fn text_cell_without_number() { assert_eq!(CellValue::Text("US").as_number(), None); }
    #[test] fn number_display_is_shortest() { assert_eq!(CellValue::Number(100.0).to_string(), "100"); }
}
