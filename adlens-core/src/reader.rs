use crate::record::{AdCreative, Field};
use adlens_common::{AdLensError, Result};
use csv::StringRecord;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

pub fn is_http_uri(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Parse a whole CSV document. Any CSV error aborts the load; no partial rows are returned.
pub fn parse_csv<R: Read>(input: R) -> Result<Vec<AdCreative>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(input);
    let headers = rdr.headers()?.clone();
    let columns: HashMap<Field, usize> = headers
        .iter()
        .enumerate()
        .filter_map(|(i, h)| Field::from_name(h).map(|f| (f, i)))
        .collect();
    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        if record.iter().all(|c| c.trim().is_empty()) {
            continue; // trailing blank line
        }
        rows.push(coerce_row(&record, &columns));
    }
    Ok(rows)
}

pub fn parse_csv_str(text: &str) -> Result<Vec<AdCreative>> {
    parse_csv(text.as_bytes())
}

pub fn read_csv_file(path: &Path) -> Result<Vec<AdCreative>> {
    let file = std::fs::File::open(path)?;
    parse_csv(std::io::BufReader::new(file))
}

/// unified async loader: fetches over HTTP for http(s) URLs, reads from disk otherwise
pub async fn load_source(source: &str) -> Result<Vec<AdCreative>> {
    if is_http_uri(source) {
        let text = fetch_http(source).await?;
        parse_csv_str(&text)
    } else {
        let text = tokio::fs::read_to_string(source).await?;
        parse_csv_str(&text)
    }
}

async fn fetch_http(url: &str) -> Result<String> {
    let resp = reqwest::get(url).await?;
    if !resp.status().is_success() {
        return Err(AdLensError::Other(format!("GET {url} returned {}", resp.status())));
    }
    Ok(resp.text().await?)
}

fn coerce_row(record: &StringRecord, columns: &HashMap<Field, usize>) -> AdCreative {
    let cell = |f: Field| columns.get(&f).and_then(|&i| record.get(i)).unwrap_or("");
    let text = |f: Field| cell(f).to_string();
    let float = |f: Field| parse_leading_float(cell(f)).unwrap_or(0.0);
    let int = |f: Field| parse_leading_int(cell(f)).unwrap_or(0);
    AdCreative {
        creative_id: text(Field::CreativeId),
        creative_name: text(Field::CreativeName),
        tags: text(Field::Tags),
        country: text(Field::Country),
        ad_network: text(Field::AdNetwork),
        os: text(Field::Os),
        campaign: text(Field::Campaign),
        ad_group: text(Field::AdGroup),
        ipm: float(Field::Ipm),
        ctr: float(Field::Ctr),
        spend: float(Field::Spend),
        impressions: int(Field::Impressions),
        clicks: int(Field::Clicks),
        cpm: float(Field::Cpm),
        cost_per_click: float(Field::CostPerClick),
        cost_per_install: float(Field::CostPerInstall),
        installs: int(Field::Installs),
    }
}

/// Longest numeric prefix, e.g. "12.5%" -> 12.5. Non-finite results count as absent.
pub fn parse_leading_float(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    if end == digits_start || &s[digits_start..end] == "." {
        return None;
    }
    // optional exponent, only taken when followed by digits
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp = end + 1;
        if exp < bytes.len() && (bytes[exp] == b'+' || bytes[exp] == b'-') {
            exp += 1;
        }
        let exp_digits = exp;
        while exp < bytes.len() && bytes[exp].is_ascii_digit() {
            exp += 1;
        }
        if exp > exp_digits {
            end = exp;
        }
    }
    s[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Integer prefix; a fractional part is dropped ("12.9" -> 12).
pub fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return None;
    }
    s[..end].parse::<i64>().ok()
}
