//! Baseline strategy integration tests

use entclust::cluster::{ClusterOrigin, Strategy};
use entclust::models::{EntityRow, EntityTable};

use crate::common::{members_of, run, scenario_table};

#[test]
fn test_baseline_matches_layered_on_scenario() {
    let baseline = run(&scenario_table(), Strategy::Baseline);

    assert_eq!(baseline.clusters.len(), 3);
    assert_eq!(members_of(&baseline, "A"), vec!["A", "B", "C"]);
    assert_eq!(baseline.cluster_of("A").unwrap().kb_id(), Some("KB1"));
    assert_eq!(baseline.cluster_of("D").unwrap().kb_id(), Some("KB_DC"));
    assert_eq!(members_of(&baseline, "E"), vec!["E"]);
    assert_eq!(baseline.integrity_violations(), 0);
}

#[test]
fn test_baseline_merges_kb_blocks_through_candidates() {
    // K1 and K2 never meet in the layered strategy: the shared id Q5 is only
    // a lower-ranked candidate of Y.
    let table = EntityTable::new(vec![
        EntityRow::new("X", "ldcOnt:ORG", &["Acme"])
            .with_kb("K1", 0.9, &["Acme"])
            .with_wikidata("Q5", 0.9, &["Acme"]),
        EntityRow::new("Y", "ldcOnt:ORG", &["Acme Inc"])
            .with_kb("K2", 0.9, &["Acme Inc"])
            .with_wikidata("Q6", 0.9, &["Acme Inc"])
            .with_wikidata("Q5", 0.1, &["Acme"]),
    ]);

    let layered = run(&table, Strategy::Layered);
    assert_eq!(layered.clusters.len(), 2);

    let baseline = run(&table, Strategy::Baseline);
    assert_eq!(baseline.clusters.len(), 1);
    assert_eq!(members_of(&baseline, "X"), vec!["X", "Y"]);
    assert_eq!(baseline.stats.build.baseline_merges, 1);
    assert_eq!(baseline.clusters[0].origin(), ClusterOrigin::Baseline);
}

#[test]
fn test_baseline_unlinked_records_group_by_candidate() {
    let table = EntityTable::new(vec![
        EntityRow::new("U1", "ldcOnt:PER", &["Ann Lee"]).with_wikidata("Q7", 0.5, &["Ann Lee"]),
        EntityRow::new("U2", "ldcOnt:PER", &["A. Lee"])
            .with_wikidata("Q8", 0.9, &["A. Lee"])
            .with_wikidata("Q7", 0.2, &["Ann Lee"]),
        EntityRow::new("U3", "ldcOnt:PER", &["Bob"]),
    ]);
    let baseline = run(&table, Strategy::Baseline);

    assert_eq!(members_of(&baseline, "U1"), vec!["U1", "U2"]);
    assert_eq!(baseline.cluster_of("U1").unwrap().wd_id(), Some("Q7"));
    assert_eq!(members_of(&baseline, "U3"), vec!["U3"]);
    assert_eq!(baseline.stats.build.residual_singletons, 1);
}
