use adlens_core::export::{export_csv, export_json};
use adlens_core::{
    apply, create_condition, load_source, parse_clauses, read_csv_file, Conjunction, FilterBuilder,
    FilterSet, Operator,
};
use std::io::Write;
use tempfile::NamedTempFile;

const REPORT: &str = "\
creative_id,creative_name,tags,country,ad_network,os,campaign,ad_group,ipm,ctr,spend,impressions,clicks,cpm,cost_per_click,cost_per_install,installs
A,Hero 15s,Summer Promo,US,Meta,iOS,Q3 Launch,Broad,4.2,0.012,100,25000,300,4.0,0.333,2.5,40
B,UGC Reel,UGC,IN,TikTok,Android,Q3 Launch,Lookalike,6.1,0.02,50,8000,160,6.25,0.3125,1.25,40
C,Hero 30s,Summer Promo; Hero,US,Google,Android,Evergreen,Broad,3.0,0.008,200,60000,480,3.33,0.417,5.0,40
";

fn write_fixture() -> NamedTempFile {
    let mut tmp = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    tmp.write_all(REPORT.as_bytes()).unwrap();
    tmp.flush().unwrap();
    tmp
}

fn ids(records: &[adlens_core::AdCreative], rows: &[usize]) -> Vec<String> {
    rows.iter().map(|&i| records[i].creative_id.clone()).collect()
}

#[test]
fn read_csv_file_coerces_numbers() {
    let tmp = write_fixture();
    let records = read_csv_file(tmp.path()).unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[2].spend, 200.0);
    assert_eq!(records[0].impressions, 25000);
    assert_eq!(records[1].os, "Android");
}

#[test]
fn country_filter_keeps_source_order() {
    let tmp = write_fixture();
    let records = read_csv_file(tmp.path()).unwrap();
    let mut set = FilterSet::new();
    set.push(create_condition("Tags", "Country", Operator::Is, "US", None).unwrap());
    assert_eq!(ids(&records, &apply(&records, &set).rows), ["A", "C"]);
}

#[test]
fn async_load_matches_sync_read() {
    let tmp = write_fixture();
    let rt = tokio::runtime::Runtime::new().unwrap();
    let loaded = rt
        .block_on(load_source(tmp.path().to_str().unwrap()))
        .unwrap();
    assert_eq!(loaded, read_csv_file(tmp.path()).unwrap());
}

#[test]
fn missing_file_is_an_error() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    assert!(rt.block_on(load_source("/no/such/report.csv")).is_err());
}

#[test]
fn builder_commit_then_remove_round_trip() {
    let tmp = write_fixture();
    let records = read_csv_file(tmp.path()).unwrap();
    let mut set = FilterSet::new();
    let mut visible = apply(&records, &set).rows;
    let mut b = FilterBuilder::new();
    b.open();
    assert!(b.select_tab("Metrics"));
    assert!(b.select_option("Spend"));
    assert!(b.set_operator(Operator::GreaterThan));
    b.set_value("75");
    let id = b
        .apply(&mut set, |s| visible = apply(&records, s).rows)
        .unwrap();
    assert_eq!(ids(&records, &visible), ["A", "C"]);
    assert!(FilterBuilder::remove(&mut set, id, |s| visible = apply(&records, s).rows));
    assert_eq!(visible.len(), 3);
}

#[test]
fn clauses_with_or_and_exports() {
    let tmp = write_fixture();
    let records = read_csv_file(tmp.path()).unwrap();
    let set = parse_clauses(
        &["Tags:Ad Network:is:TikTok", "Metrics:Spend:between:150..250"],
        Conjunction::Or,
    )
    .unwrap();
    let outcome = apply(&records, &set);
    assert_eq!(ids(&records, &outcome.rows), ["B", "C"]);

    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("out.csv");
    export_csv(&csv_path, &records, &outcome.rows).unwrap();
    let back = read_csv_file(&csv_path).unwrap();
    assert_eq!(back, vec![records[1].clone(), records[2].clone()]);

    let json_path = dir.path().join("out.json");
    export_json(&json_path, &records, &set, &outcome).unwrap();
    let v: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(v["matched_rows"], 2);
    assert_eq!(v["filters"]["conditions"].as_array().unwrap().len(), 2);
}
