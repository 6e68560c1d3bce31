//! Degraded input scenarios
//!
//! None of these abort a run:
//! 1. Duplicate entity ids
//! 2. Empty or missing candidate lists
//! 3. Non-finite linker scores
//! 4. Membership conflicts in the arena

use entclust::cluster::{Cluster, ClusterArena, ClusterError, ClusterOrigin, Strategy};
use entclust::error::{EntclustErrorTrait, ErrorCategory};
use entclust::models::{EntityRow, EntityTable};

use crate::common::run;

#[test]
fn test_duplicate_ids_share_first_rows_cluster() {
    let table = EntityTable::new(vec![
        EntityRow::new("A", "ldcOnt:PER", &["Ann"]).with_kb("K1", 1.0, &["Ann"]),
        EntityRow::new("A", "ldcOnt:ORG", &["Ann Corp"]),
    ]);
    let run = run(&table, Strategy::Layered);

    assert_eq!(run.stats.duplicate_rows, 1);
    assert_eq!(run.clusters.len(), 1);

    let rows: Vec<_> = run.export.member_rows().collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].cluster, rows[1].cluster);

    let prototype = run.export.prototype_rows().next().unwrap();
    assert_eq!(prototype.row.entity_type, "ldcOnt:PER");
}

#[test]
fn test_records_without_candidates_fall_back_to_names() {
    let rows: Vec<EntityRow> = serde_json::from_str(
        r#"[
            {"id": "A", "type": "ldcOnt:ORG", "names": ["Acme"],
             "kb_candidates": [{"id": "K1", "score": 0.4, "labels": ["Acme"]}]},
            {"id": "B", "type": "ldcOnt:ORG", "names": ["Acme"],
             "kb_candidates": null, "wikidata_candidates": []}
        ]"#,
    )
    .unwrap();
    let run = run(&EntityTable::new(rows), Strategy::Layered);

    assert_eq!(run.clusters.len(), 1);
    assert_eq!(run.stats.kb_linked, 1);
    assert_eq!(run.stats.build.residual_merged, 1);
}

#[test]
fn test_nan_score_never_selected() {
    let table = EntityTable::new(vec![
        EntityRow::new("A", "ldcOnt:PER", &["Ann"])
            .with_kb("K_NAN", f64::NAN, &["Ann"])
            .with_kb("K_OK", 0.1, &[]),
    ]);
    let run = run(&table, Strategy::Layered);

    assert_eq!(run.cluster_of("A").unwrap().kb_id(), Some("K_OK"));
}

#[test]
fn test_arena_refuses_second_owner() {
    let mut arena = ClusterArena::new();
    let first = arena.insert(Cluster::new(ClusterOrigin::Residual));
    let second = arena.insert(Cluster::new(ClusterOrigin::Residual));

    arena.assign(first, "A").unwrap();
    assert!(arena.assign(first, "A").is_ok());

    let err = arena.assign(second, "A").unwrap_err();
    assert!(matches!(err, ClusterError::DuplicateMembership { .. }));
    assert!(err.is_integrity_violation());
    assert_eq!(err.category(), ErrorCategory::Integrity);
    assert_eq!(arena.owner_of("A"), Some(first));
    assert_eq!(arena.get(second).unwrap().len(), 0);
}

#[test]
fn test_partition_check_reports_missing_records() {
    let mut arena = ClusterArena::new();
    let handle = arena.insert(Cluster::new(ClusterOrigin::Residual));
    arena.assign(handle, "A").unwrap();

    let errors = arena.verify_partition(["A", "B"]);
    assert_eq!(errors.len(), 1);
    assert!(matches!(&errors[0], ClusterError::UnassignedRecord { record } if record == "B"));
}
