//! Layered pipeline integration tests
//!
//! Covers the full flow:
//! 1. Ingestion and candidate selection
//! 2. KB seeding and Wikidata reconciliation
//! 3. Type split and residual assignment
//! 4. Confidence, prototypes and export

use entclust::cluster::{ClusterOrigin, Strategy};
use entclust::models::{EntityRow, EntityTable};

use crate::common::{members_of, run, scenario_table};

// ============================================================================
// Scenario Tests
// ============================================================================

#[test]
fn test_shared_kb_link_forms_one_cluster() {
    let run = run(&scenario_table(), Strategy::Layered);

    let cluster = run.cluster_of("A").unwrap();
    assert_eq!(cluster.kb_id(), Some("KB1"));
    assert!(cluster.members().iter().any(|m| m == "B"));
    assert_eq!(cluster.origin(), ClusterOrigin::KnowledgeBase);
}

#[test]
fn test_wikidata_only_record_absorbed_by_elected_cluster() {
    let run = run(&scenario_table(), Strategy::Layered);

    let cluster = run.cluster_of("C").unwrap();
    assert_eq!(cluster.wd_id(), Some("Q90"));
    assert_eq!(cluster.kb_id(), Some("KB1"));
    assert_eq!(members_of(&run, "C"), vec!["A", "B", "C"]);
    assert_eq!(run.stats.build.absorbed_buckets, 1);
    assert_eq!(run.stats.build.wikidata_only_clusters, 0);
}

#[test]
fn test_kb_labels_come_from_first_labelled_member() {
    let table = EntityTable::new(vec![
        EntityRow::new("A", "ldcOnt:GPE", &["Paris"])
            .with_kb("KB1", 0.9, &[])
            .with_wikidata("Q90", 0.9, &["Paris"]),
        EntityRow::new("B", "ldcOnt:GPE", &["Paris"]).with_kb("KB1", 0.9, &["Paris"]),
        EntityRow::new("C", "ldcOnt:GPE", &["City of Light"]).with_wikidata("Q90", 1.0, &["Paris"]),
    ]);
    let run = run(&table, Strategy::Layered);

    assert_eq!(run.clusters.len(), 1);
    let cluster = run.cluster_of("A").unwrap();
    assert_eq!(cluster.kb_id(), Some("KB1"));
    assert!(cluster.kb_labels().unwrap().contains("Paris"));
    assert_eq!(cluster.wd_id(), Some("Q90"));
    assert_eq!(members_of(&run, "C"), vec!["A", "B", "C"]);
}

#[test]
fn test_unlabelled_kb_cluster_still_elects_wikidata_id() {
    let table = EntityTable::new(vec![
        EntityRow::new("A", "ldcOnt:ORG", &["Acme"])
            .with_kb("KB5", 0.9, &[])
            .with_wikidata("Q77", 0.9, &["Acme"]),
        EntityRow::new("C", "ldcOnt:ORG", &["Acme Inc"]).with_wikidata("Q77", 0.8, &["Acme"]),
    ]);
    let run = run(&table, Strategy::Layered);

    assert_eq!(run.clusters.len(), 1);
    assert_eq!(run.cluster_of("C").unwrap().wd_id(), Some("Q77"));
    assert_eq!(run.stats.build.absorbed_buckets, 1);
}

#[test]
fn test_tied_kb_candidates_broken_by_names() {
    let run = run(&scenario_table(), Strategy::Layered);

    let cluster = run.cluster_of("D").unwrap();
    assert_eq!(cluster.kb_id(), Some("KB_DC"));
    assert_eq!(cluster.members(), ["D".to_string()]);
}

#[test]
fn test_unlinked_record_is_singleton_with_full_confidence() {
    let run = run(&scenario_table(), Strategy::Layered);

    let cluster = run.cluster_of("E").unwrap();
    assert_eq!(cluster.members(), ["E".to_string()]);
    assert_eq!(cluster.confidence_of("E"), Some(1.0));
    assert_eq!(cluster.prototype_id(), "E");
    assert_eq!(cluster.origin(), ClusterOrigin::Residual);
    assert_eq!(cluster.entity_type(), Some("PER"));
}

#[test]
fn test_scenario_cluster_count_and_integrity() {
    let run = run(&scenario_table(), Strategy::Layered);

    assert_eq!(run.clusters.len(), 3);
    assert_eq!(run.integrity_violations(), 0);
    assert_eq!(run.stats.records, 5);
    assert_eq!(run.stats.kb_linked, 3);
}

// ============================================================================
// Confidence & Prototype Tests
// ============================================================================

#[test]
fn test_unattractive_shared_name_lowers_confidence() {
    let table = EntityTable::new(vec![
        EntityRow::new("A", "ldcOnt:GPE", &["Paris"]).with_kb("KB1", 0.9, &["Paris"]),
        EntityRow::new("B", "ldcOnt:GPE", &["Paree"]).with_kb("KB1", 0.9, &["Paris"]),
        EntityRow::new("G", "ldcOnt:GPE", &["Paree"]).with_kb("KB1", 0.9, &["Paris"]),
    ]);
    let run = run(&table, Strategy::Layered);

    assert_eq!(run.clusters.len(), 1);
    let cluster = &run.clusters[0];
    assert_eq!(cluster.confidence_of("A"), Some(1.0));
    assert_eq!(cluster.confidence_of("B"), Some(0.67));
    assert_eq!(cluster.confidence_of("G"), Some(0.67));
    assert_eq!(cluster.prototype_id(), "A");
}

#[test]
fn test_full_id_is_prototype_plus_suffix() {
    let run = run(&scenario_table(), Strategy::Layered);

    for cluster in &run.clusters {
        let prefix = format!("{}-cluster-", cluster.prototype_id());
        assert!(cluster.full_id().starts_with(&prefix));
        let suffix = &cluster.full_id()[prefix.len()..];
        assert_eq!(suffix.len(), 10);
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}

#[test]
fn test_seeded_runs_issue_same_ids() {
    let first = run(&scenario_table(), Strategy::Layered);
    let second = run(&scenario_table(), Strategy::Layered);

    let ids = |r: &entclust::cluster::ClusterRun| {
        r.clusters
            .iter()
            .map(|c| c.full_id().to_string())
            .collect::<Vec<_>>()
    };
    assert_eq!(ids(&first), ids(&second));
}

// ============================================================================
// Type Split & Residual Tests
// ============================================================================

#[test]
fn test_mixed_type_kb_block_is_split() {
    let table = EntityTable::new(vec![
        EntityRow::new("P1", "ldcOnt:PER", &["Jordan"]).with_kb("KB9", 0.9, &["Jordan"]),
        EntityRow::new("G1", "ldcOnt:GPE", &["Jordan"]).with_kb("KB9", 0.9, &["Jordan"]),
        EntityRow::new("L1", "ldcOnt:LOC", &["Jordan"]).with_kb("KB9", 0.9, &["Jordan"]),
    ]);
    let run = run(&table, Strategy::Layered);

    assert_eq!(run.clusters.len(), 2);
    assert_eq!(members_of(&run, "G1"), vec!["G1", "L1"]);
    assert_eq!(members_of(&run, "P1"), vec!["P1"]);
    assert_eq!(run.cluster_of("G1").unwrap().entity_type(), Some("GeoLoc"));
    assert_eq!(run.cluster_of("P1").unwrap().kb_id(), Some("KB9"));
    assert_eq!(run.stats.build.type_splits, 1);
}

#[test]
fn test_residual_joins_cluster_sharing_a_label() {
    let table = EntityTable::new(vec![
        EntityRow::new("A", "ldcOnt:ORG", &["Acme"]).with_kb("KB1", 0.9, &["Acme", "Acme Corp"]),
        EntityRow::new("R", "ldcOnt:ORG", &["Acme Corp"]),
        EntityRow::new("S", "ldcOnt:PER", &["Acme Corp"]),
    ]);
    let run = run(&table, Strategy::Layered);

    assert_eq!(members_of(&run, "R"), vec!["A", "R"]);
    assert_eq!(members_of(&run, "S"), vec!["S"]);
    assert_eq!(run.stats.build.residual_merged, 1);
    assert_eq!(run.stats.build.residual_singletons, 1);
}

#[test]
fn test_residual_singletons_attract_later_records() {
    let table = EntityTable::new(vec![
        EntityRow::new("X1", "ldcOnt:PER", &["Jane Roe"]),
        EntityRow::new("X2", "ldcOnt:PER", &["Jane Roe", "J. Roe"]),
    ]);
    let run = run(&table, Strategy::Layered);

    assert_eq!(run.clusters.len(), 1);
    assert_eq!(members_of(&run, "X1"), vec!["X1", "X2"]);
}

// ============================================================================
// Export Tests
// ============================================================================

#[test]
fn test_export_rows_and_prototypes() {
    let table = scenario_table();
    let run = run(&table, Strategy::Layered);

    let members: Vec<_> = run.export.member_rows().collect();
    assert_eq!(members.len(), table.len());
    for (row, input) in members.iter().zip(&table.rows) {
        assert_eq!(row.row.id, input.id);
        assert_eq!(row.cluster.len(), 1);
        assert_eq!(row.cluster_member_confidence.len(), 1);
        assert!(!row.synthetic);
    }

    let prototypes: Vec<_> = run.export.prototype_rows().collect();
    assert_eq!(prototypes.len(), run.clusters.len());
    for (row, cluster) in prototypes.iter().zip(&run.clusters) {
        assert!(row.synthetic);
        assert_eq!(row.row.id, cluster.prototype_id());
        assert_eq!(row.cluster, vec![cluster.full_id().to_string()]);
    }

    assert_eq!(run.export.trace.len(), run.clusters.len());
}

#[test]
fn test_excluded_rows_get_placeholder_clusters() {
    let table = EntityTable::new(vec![
        EntityRow::new("A", "ldcOnt:PER", &["Ann"]),
        EntityRow::new("W", "ldcOnt:Weapon", &["Rifle"]),
        EntityRow::new("N", "ldcOnt:ORG", &[]).without_names(),
    ]);
    let run = run(&table, Strategy::Layered);

    assert_eq!(run.stats.excluded, 2);
    for id in ["W", "N"] {
        let cluster = run.cluster_of(id).unwrap();
        assert!(cluster.is_synthetic());
        assert_eq!(cluster.origin(), ClusterOrigin::Placeholder);
        assert_eq!(cluster.confidence_of(id), Some(1.0));
    }

    let row = run
        .export
        .member_rows()
        .find(|r| r.row.id == "W")
        .unwrap();
    assert!(!row.synthetic);
    assert_eq!(row.cluster_member_confidence, vec![1.0]);
}

#[test]
fn test_unknown_columns_pass_through() {
    let mut row = EntityRow::new("A", "ldcOnt:PER", &["Ann"]);
    row.extra
        .insert("source".to_string(), serde_json::json!("doc-17"));
    let run = run(&EntityTable::new(vec![row]), Strategy::Layered);

    let exported = run.export.member_rows().next().unwrap();
    assert_eq!(exported.row.extra["source"], "doc-17");

    let json = serde_json::to_value(exported).unwrap();
    assert_eq!(json["source"], "doc-17");
    assert_eq!(json["synthetic"], false);
    assert_eq!(json["type"], "ldcOnt:PER");
}
