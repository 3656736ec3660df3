use crate::columns::COLUMNS;
use crate::eval::FilterOutcome;
use crate::filter::{describe, FilterSet};
use crate::record::AdCreative;
use adlens_common::Result;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

// --- headless summary output ---

pub fn print_summary(source: &str, set: &FilterSet, outcome: &FilterOutcome) {
    println!("{:<16} {}", "Source:", source);
    println!("{:<16} {}", "Rows:", outcome.scanned_rows);
    println!("{:<16} {}", "Matched:", outcome.matched_rows);
    if !set.is_empty() {
        let joined: Vec<String> = set.iter().map(describe).collect();
        println!("{:<16} {}", "Filters:", joined.join(&format!(" {} ", set.conjunction())));
    }
}

/// Fixed-width table of `rows`, formatted the same way as the interactive view.
pub fn write_table<W: Write>(out: &mut W, records: &[AdCreative], rows: &[usize]) -> Result<()> {
    let header: Vec<String> = COLUMNS
        .iter()
        .map(|c| pad(c.title, c.width as usize))
        .collect();
    writeln!(out, "{}", header.join(" ").trim_end())?;
    for &i in rows {
        let Some(r) = records.get(i) else { continue };
        let cells: Vec<String> = COLUMNS
            .iter()
            .map(|c| pad(&c.render(r), c.width as usize))
            .collect();
        writeln!(out, "{}", cells.join(" ").trim_end())?;
    }
    Ok(())
}

fn pad(s: &str, width: usize) -> String {
    let clipped: String = s.chars().take(width).collect();
    format!("{clipped:<width$}")
}

// --- JSON export ---

#[derive(Serialize)]
struct JsonReport<'a> {
    filters: &'a FilterSet,
    matched_rows: u64,
    scanned_rows: u64,
    rows: Vec<&'a AdCreative>,
}

pub fn write_json<W: Write>(
    out: W,
    records: &[AdCreative],
    set: &FilterSet,
    outcome: &FilterOutcome,
) -> Result<()> {
    let doc = JsonReport {
        filters: set,
        matched_rows: outcome.matched_rows,
        scanned_rows: outcome.scanned_rows,
        rows: outcome.rows.iter().filter_map(|&i| records.get(i)).collect(),
    };
    serde_json::to_writer_pretty(out, &doc)?;
    Ok(())
}

pub fn export_json(
    output_path: &Path,
    records: &[AdCreative],
    set: &FilterSet,
    outcome: &FilterOutcome,
) -> Result<()> {
    let file = std::fs::File::create(output_path)?;
    write_json(std::io::BufWriter::new(file), records, set, outcome)
}

// --- CSV export ---

/// Writes the selected rows with the report's own header names, so the output loads back as a source.
pub fn write_csv<W: Write>(out: W, records: &[AdCreative], rows: &[usize]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    for &i in rows {
        if let Some(r) = records.get(i) {
            wtr.serialize(r)?;
        }
    }
    wtr.flush()?;
    Ok(())
}

pub fn export_csv(output_path: &Path, records: &[AdCreative], rows: &[usize]) -> Result<()> {
    let file = std::fs::File::create(output_path)?;
    write_csv(file, records, rows)
}
