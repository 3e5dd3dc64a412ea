use std::path::PathBuf;

use monokit_core::change::ChangeDetector;
use monokit_core::graph::DependencyGraph;
use monokit_core::package::Package;

fn chain_graph() -> DependencyGraph {
    // a <- b <- c
    let packages = vec![
        Package::new(
            "a".to_string(),
            "1.0.0".to_string(),
            "packages/a".into(),
            vec![],
            vec![],
        ),
        Package::new(
            "b".to_string(),
            "1.0.0".to_string(),
            "packages/b".into(),
            vec!["a".to_string()],
            vec![],
        ),
        Package::new(
            "c".to_string(),
            "1.0.0".to_string(),
            "packages/c".into(),
            vec!["b".to_string()],
            vec![],
        ),
    ];
    DependencyGraph::new(packages).unwrap()
}

#[test]
fn dependents_closure() {
    let graph = chain_graph();
    let changed = vec![PathBuf::from("packages/a/src/lib.rs")];

    let with_dependents = ChangeDetector::detect(&graph, &changed, true).unwrap();
    assert_eq!(
        with_dependents.directly_changed.iter().collect::<Vec<_>>(),
        vec!["a"]
    );
    assert_eq!(
        with_dependents.dependents.iter().collect::<Vec<_>>(),
        vec!["b", "c"]
    );
    assert_eq!(with_dependents.all().len(), 3);

    let without = ChangeDetector::detect(&graph, &changed, false).unwrap();
    assert_eq!(without.directly_changed.len(), 1);
    assert!(without.dependents.is_empty());
}

#[test]
fn files_outside_packages_are_ignored() {
    let graph = chain_graph();
    let changed = vec![PathBuf::from("README.md"), PathBuf::from("docs/guide.md")];

    let change_set = ChangeDetector::detect(&graph, &changed, true).unwrap();
    assert!(change_set.is_empty());
}

#[test]
fn longest_prefix_wins_for_nested_paths() {
    let packages = vec![
        Package::new(
            "outer".to_string(),
            "1.0.0".to_string(),
            "packages".into(),
            vec![],
            vec![],
        ),
        Package::new(
            "inner".to_string(),
            "1.0.0".to_string(),
            "packages/inner".into(),
            vec![],
            vec![],
        ),
    ];
    let graph = DependencyGraph::new(packages).unwrap();

    let change_set = ChangeDetector::detect(
        &graph,
        &[PathBuf::from("packages/inner/src/main.rs")],
        false,
    )
    .unwrap();
    assert_eq!(
        change_set.directly_changed.iter().collect::<Vec<_>>(),
        vec!["inner"]
    );
}

#[test]
fn detection_is_idempotent() {
    let graph = chain_graph();
    let changed = vec![
        PathBuf::from("packages/a/src/lib.rs"),
        PathBuf::from("packages/b/monokit.toml"),
    ];

    let first = ChangeDetector::detect(&graph, &changed, true).unwrap();
    let second = ChangeDetector::detect(&graph, &changed, true).unwrap();
    assert_eq!(first, second);

    // Directly changed and dependents stay disjoint.
    assert!(first.directly_changed.is_disjoint(&first.dependents));
}

#[test]
fn dependent_already_changed_directly_stays_direct() {
    let graph = chain_graph();
    let changed = vec![
        PathBuf::from("packages/a/src/lib.rs"),
        PathBuf::from("packages/b/src/lib.rs"),
    ];

    let change_set = ChangeDetector::detect(&graph, &changed, true).unwrap();
    assert!(change_set.directly_changed.contains("b"));
    assert!(!change_set.dependents.contains("b"));
    assert_eq!(
        change_set.dependents.iter().collect::<Vec<_>>(),
        vec!["c"]
    );
}
