use crate::record::{AdCreative, CellValue, Field};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellFormat {
    Text,
    Fixed2,
    /// ratio rendered as a percentage with two decimals
    Percent,
    /// `$` prefix with the given number of decimals
    Currency(usize),
    Thousands,
    Integer,
}

#[derive(Debug)]
pub struct Column {
    pub title: &'static str,
    pub field: Field,
    pub width: u16,
    pub format: CellFormat,
}

pub static COLUMNS: [Column; 15] = [
    Column { title: "Creative ID", field: Field::CreativeId, width: 16, format: CellFormat::Text },
    Column { title: "Creative Name", field: Field::CreativeName, width: 16, format: CellFormat::Text },
    Column { title: "Country", field: Field::Country, width: 8, format: CellFormat::Text },
    Column { title: "Ad Network", field: Field::AdNetwork, width: 12, format: CellFormat::Text },
    Column { title: "Campaign", field: Field::Campaign, width: 24, format: CellFormat::Text },
    Column { title: "Ad Group", field: Field::AdGroup, width: 20, format: CellFormat::Text },
    Column { title: "IPM", field: Field::Ipm, width: 8, format: CellFormat::Fixed2 },
    Column { title: "CTR", field: Field::Ctr, width: 8, format: CellFormat::Percent },
    Column { title: "Spend", field: Field::Spend, width: 11, format: CellFormat::Currency(2) },
    Column { title: "Impressions", field: Field::Impressions, width: 12, format: CellFormat::Thousands },
    Column { title: "Clicks", field: Field::Clicks, width: 8, format: CellFormat::Integer },
    Column { title: "CPM", field: Field::Cpm, width: 9, format: CellFormat::Currency(2) },
    Column { title: "CPC", field: Field::CostPerClick, width: 9, format: CellFormat::Currency(3) },
    Column { title: "CPI", field: Field::CostPerInstall, width: 9, format: CellFormat::Currency(2) },
    Column { title: "Installs", field: Field::Installs, width: 9, format: CellFormat::Integer },
];

/// Look a column up by title ("Ad Network") or field name ("ad_network"), ignoring case.
pub fn column_by_name(name: &str) -> Option<&'static Column> {
    COLUMNS
        .iter()
        .find(|c| c.title.eq_ignore_ascii_case(name) || c.field.name().eq_ignore_ascii_case(name))
}

impl Column {
    pub fn render(&self, r: &AdCreative) -> String {
        match (self.format, self.field.value(r)) {
            (_, CellValue::Text(s)) => s.to_string(),
            (CellFormat::Fixed2, CellValue::Number(n)) => format!("{n:.2}"),
            (CellFormat::Percent, CellValue::Number(n)) => format!("{:.2}%", n * 100.0),
            (CellFormat::Currency(dp), CellValue::Number(n)) => format!("${n:.dp$}"),
            (CellFormat::Thousands, CellValue::Number(n)) => fmt_thousands(n as i64),
            (CellFormat::Integer | CellFormat::Text, CellValue::Number(n)) => n.to_string(),
        }
    }

    pub fn compare(&self, a: &AdCreative, b: &AdCreative) -> Ordering {
        match (self.field.value(a), self.field.value(b)) {
            (CellValue::Number(x), CellValue::Number(y)) => x.total_cmp(&y),
            (CellValue::Text(x), CellValue::Text(y)) => x
                .to_lowercase()
                .cmp(&y.to_lowercase())
                .then_with(|| x.cmp(y)),
            (CellValue::Number(_), CellValue::Text(_)) => Ordering::Less,
            (CellValue::Text(_), CellValue::Number(_)) => Ordering::Greater,
        }
    }
}

/// Stable sort of row indices by `column`.
pub fn sort_rows(records: &[AdCreative], rows: &mut [usize], column: &Column, ascending: bool) {
    rows.sort_by(|&a, &b| {
        let ord = column.compare(&records[a], &records[b]);
        if ascending { ord } else { ord.reverse() }
    });
}

pub fn fmt_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec() -> AdCreative {
        AdCreative {
            creative_id: "c1".into(),
            ipm: 3.14159,
            ctr: 0.0123,
            spend: 1234.5,
            impressions: 1234567,
            clicks: 42,
            cost_per_click: 0.12345,
            ..Default::default()
        }
    }

    fn render(name: &str) -> String {
        column_by_name(name).unwrap().render(&rec())
    }

    #[test] fn ipm_two_decimals() { assert_eq!(render("IPM"), "3.14"); }
    #[test] fn ctr_as_percent() { assert_eq!(render("ctr"), "1.23%"); }
    #[test] fn spend_currency() { assert_eq!(render("Spend"), "$1234.50"); }
    #[test] fn cpc_three_decimals() { assert_eq!(render("cost_per_click"), "$0.123"); }
    #[test] fn impressions_grouped() { assert_eq!(render("Impressions"), "1,234,567"); }
    #[test] fn clicks_plain() { assert_eq!(render("Clicks"), "42"); }
    #[test] fn text_passthrough() { assert_eq!(render("Creative ID"), "c1"); }
    #[test] fn thousands_small() { assert_eq!(fmt_thousands(999), "999"); }
    #[test] fn thousands_negative() { assert_eq!(fmt_thousands(-1000), "-1,000"); }
    #[test] fn unknown_column() { assert!(column_by_name("bogus").is_none()); }

    #[test]
    fn sort_numeric_descending() {
        let recs: Vec<AdCreative> = [5.0, 50.0, 0.5]
            .iter()
            .map(|s| AdCreative { spend: *s, ..Default::default() })
            .collect();
        let mut rows = vec![0, 1, 2];
        sort_rows(&recs, &mut rows, column_by_name("spend").unwrap(), false);
        assert_eq!(rows, vec![1, 0, 2]);
    }

    #[test]
    fn sort_text_ignores_case_and_is_stable() {
        let recs: Vec<AdCreative> = ["beta", "Alpha", "alpha", "Beta"]
            .iter()
            .map(|c| AdCreative { campaign: c.to_string(), ..Default::default() })
            .collect();
        let mut rows = vec![0, 1, 2, 3];
        sort_rows(&recs, &mut rows, column_by_name("Campaign").unwrap(), true);
        assert_eq!(rows, vec![1, 2, 3, 0]);
    }
}
