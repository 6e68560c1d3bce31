//! Tests for table loading and output writing

mod common;

use std::fs;
use std::path::Path;

use entclust::cluster::Strategy;
use entclust::storage::{
    load_table, load_tables, read_report, OutputWriter, CLUSTERED_TABLE_FILE, CLUSTER_TRACE_FILE,
    RUN_REPORT_FILE,
};
use serde_json::Value;
use tempfile::TempDir;

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

#[test]
fn test_load_json_array_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("en.entity.json");
    write_file(
        &path,
        r#"[
            {"e": "A", "type": "ldcOnt:PER", "name": ["Ann"], "source": "doc-1"},
            {"id": "B", "type": "ldcOnt:ORG", "names": null}
        ]"#,
    );

    let table = load_table(&path).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.rows[0].id, "A");
    assert_eq!(table.rows[0].extra["source"], "doc-1");
    assert!(table.rows[1].names.is_none());
}

#[test]
fn test_load_directory_concatenates_sources_in_path_order() {
    let dir = TempDir::new().unwrap();
    write_file(
        &dir.path().join("es/es.entity.jsonl"),
        "{\"id\": \"ES1\", \"type\": \"ldcOnt:PER\", \"names\": [\"Ana\"]}\n",
    );
    write_file(
        &dir.path().join("en/en.entity.json"),
        r#"[{"id": "EN1", "type": "ldcOnt:PER", "names": ["Ann"]}]"#,
    );
    write_file(&dir.path().join("en/readme.md"), "not a table");

    let table = load_table(dir.path()).unwrap();
    let ids: Vec<_> = table.rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["EN1", "ES1"]);
}

#[test]
fn test_load_tables_keeps_argument_order() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("z.jsonl");
    let second = dir.path().join("a.jsonl");
    write_file(&first, "{\"id\": \"Z\", \"type\": \"ldcOnt:PER\"}\n");
    write_file(&second, "{\"id\": \"A\", \"type\": \"ldcOnt:PER\"}\n");

    let table = load_tables(&[first, second]).unwrap();
    let ids: Vec<_> = table.rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["Z", "A"]);
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let err = load_table(&dir.path().join("missing.entity.json")).unwrap_err();
    assert!(err.to_string().contains("Failed to open entity table"));
}

#[test]
fn test_malformed_rows_do_not_abort_the_batch() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mixed.entity.jsonl");
    write_file(
        &path,
        concat!(
            "{\"id\": \"A\", \"type\": \"ldcOnt:GPE\", \"names\": [\"Paris\"], \"kb_candidates\": [{\"id\": \"KB1\", \"score\": 0.9, \"labels\": [\"Paris\"]}]}\n",
            "{\"id\": \"B\", \"type\": \"ldcOnt:GPE\", \"names\": [\"Paris\"], \"kb_candidates\": [{\"id\": \"KB1\", \"score\": null, \"labels\": [\"Paris\"]}]}\n",
            "{\"id\": \"C\", \"type\": null, \"names\": [\"Lyon\"]}\n",
            "[1, 2]\n",
        ),
    );

    let table = load_table(&path).unwrap();
    assert_eq!(table.len(), 3);

    let run = common::run(&table, Strategy::Layered);
    assert_eq!(common::members_of(&run, "A"), vec!["A", "B"]);
    assert_eq!(run.stats.excluded, 1);
    assert!(run.cluster_of("C").unwrap().is_synthetic());
    assert_eq!(run.integrity_violations(), 0);
}

#[test]
fn test_write_run_outputs() {
    let dir = TempDir::new().unwrap();
    let run = common::run(&common::scenario_table(), Strategy::Layered);

    let writer = OutputWriter::new(&dir.path().join("out")).unwrap();
    let written = writer.write_run(&run, Strategy::Layered).unwrap();

    assert!(written.table.ends_with(CLUSTERED_TABLE_FILE));
    assert!(written.trace.ends_with(CLUSTER_TRACE_FILE));
    assert!(written.report.ends_with(RUN_REPORT_FILE));
    assert!(written.bytes > 0);

    let rows: Vec<Value> = fs::read_to_string(&written.table)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(rows.len(), run.export.rows.len());
    assert_eq!(rows[0]["id"], "A");
    assert_eq!(rows[0]["synthetic"], false);
    assert!(rows[0]["cluster"][0].as_str().unwrap().contains("-cluster-"));

    let traces: Vec<Value> = fs::read_to_string(&written.trace)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(traces.len(), run.clusters.len());
    assert_eq!(traces[0]["kb_id"], "KB1");
    assert_eq!(traces[0]["wd_id"], "Q90");
    assert_eq!(traces[0]["all_records"].as_array().unwrap().len(), 3);

    let report = read_report(&written.report).unwrap();
    assert_eq!(report.strategy, Strategy::Layered);
    assert_eq!(report.stats.clusters, run.stats.clusters);
    assert_eq!(report.stats.records, 5);
    assert_eq!(report.stats.build, run.stats.build);
    assert_eq!(report.profile.stages.len(), run.profile.stages.len());
}

#[test]
fn test_rewrite_replaces_previous_output() {
    let dir = TempDir::new().unwrap();
    let writer = OutputWriter::new(dir.path()).unwrap();

    let big = common::run(&common::scenario_table(), Strategy::Layered);
    writer.write_run(&big, Strategy::Layered).unwrap();

    let empty = common::run(&entclust::EntityTable::default(), Strategy::Layered);
    let written = writer.write_run(&empty, Strategy::Layered).unwrap();

    let text = fs::read_to_string(&written.table).unwrap();
    assert!(text.is_empty());
    assert!(!dir.path().join(format!("{CLUSTERED_TABLE_FILE}.tmp")).exists());
}
