//! Common test utilities

use entclust::cluster::{ClusterConfig, ClusterPipeline, ClusterRun, Strategy};
use entclust::models::{EntityRow, EntityTable};

/// Paris, City of Light, Washington and an unlinked person
///
/// - A and B share KB1
/// - C has only a Wikidata link (Q90) and should be absorbed by KB1's cluster
/// - D has two KB candidates tied on score; names pick Washington, D.C.
/// - E has nothing and stays alone
pub fn scenario_table() -> EntityTable {
    EntityTable::new(vec![
        EntityRow::new("A", "ldcOnt:GPE", &["Paris"])
            .with_kb("KB1", 0.9, &["Paris"])
            .with_wikidata("Q90", 0.9, &["Paris", "City of Light"]),
        EntityRow::new("B", "ldcOnt:GPE", &["Paris"]).with_kb("KB1", 0.7, &["Paris"]),
        EntityRow::new("C", "ldcOnt:GPE", &["City of Light"])
            .with_wikidata("Q90", 0.8, &["Paris", "City of Light"]),
        EntityRow::new("D", "ldcOnt:GPE.UrbanArea.City", &["Washington"])
            .with_kb("KB_STATE", 0.8, &["Washington State"])
            .with_kb("KB_DC", 0.8, &["Washington", "Washington, D.C."]),
        EntityRow::new("E", "ldcOnt:PER", &["Zed"]),
    ])
}

/// Config with a fixed seed so cluster ids are reproducible
pub fn seeded_config(strategy: Strategy) -> ClusterConfig {
    ClusterConfig::builder()
        .strategy(strategy)
        .seed(7)
        .build()
        .unwrap()
}

/// Run the pipeline over `table`
pub fn run(table: &EntityTable, strategy: Strategy) -> ClusterRun {
    ClusterPipeline::new(seeded_config(strategy))
        .unwrap()
        .run(table)
}

/// Sorted member ids of the cluster containing `entity`
#[allow(dead_code)]
pub fn members_of(run: &ClusterRun, entity: &str) -> Vec<String> {
    let mut members = run
        .cluster_of(entity)
        .map(|c| c.members().to_vec())
        .unwrap_or_default();
    members.sort();
    members
}
