use monokit_core::graph::DependencyGraph;
use monokit_core::package::Package;

fn create_test_packages() -> Vec<Package> {
    vec![
        Package::new(
            "pkg-a".to_string(),
            "1.0.0".to_string(),
            "pkg-a".into(),
            vec![],
            vec![],
        ),
        Package::new(
            "pkg-b".to_string(),
            "1.0.0".to_string(),
            "pkg-b".into(),
            vec!["pkg-a".to_string()],
            vec![],
        ),
        Package::new(
            "pkg-c".to_string(),
            "1.0.0".to_string(),
            "pkg-c".into(),
            vec!["pkg-b".to_string()],
            vec![],
        ),
    ]
}

#[test]
fn test_topological_order() {
    let graph = DependencyGraph::new(create_test_packages()).unwrap();
    let order = graph.topological_order();

    assert_eq!(order.len(), 3);
    assert_eq!(order[0], "pkg-a");
    assert_eq!(order[1], "pkg-b");
    assert_eq!(order[2], "pkg-c");
}

#[test]
fn test_dependencies() {
    let graph = DependencyGraph::new(create_test_packages()).unwrap();

    let deps = graph.dependencies("pkg-b").unwrap();
    assert_eq!(deps, vec!["pkg-a".to_string()]);

    let deps = graph.dependencies("pkg-a").unwrap();
    assert!(deps.is_empty());
}

#[test]
fn test_dependents() {
    let graph = DependencyGraph::new(create_test_packages()).unwrap();

    let dependents = graph.dependents("pkg-a").unwrap();
    assert_eq!(dependents, vec!["pkg-b".to_string()]);

    let dependents = graph.dependents("pkg-c").unwrap();
    assert!(dependents.is_empty());
}

#[test]
fn test_all_dependents() {
    let graph = DependencyGraph::new(create_test_packages()).unwrap();

    let all_deps = graph.all_dependents("pkg-a").unwrap();
    assert_eq!(all_deps.len(), 2);
    assert!(all_deps.contains("pkg-b"));
    assert!(all_deps.contains("pkg-c"));
}

#[test]
fn test_external_dependencies_ignored() {
    let packages = vec![Package::new(
        "pkg-a".to_string(),
        "1.0.0".to_string(),
        "pkg-a".into(),
        vec!["serde".to_string()],
        vec![],
    )];

    let graph = DependencyGraph::new(packages).unwrap();
    assert!(graph.dependencies("pkg-a").unwrap().is_empty());
}

#[test]
fn test_circular_dependency_reports_cycle() {
    let packages = vec![
        Package::new(
            "pkg-a".to_string(),
            "1.0.0".to_string(),
            "pkg-a".into(),
            vec!["pkg-b".to_string()],
            vec![],
        ),
        Package::new(
            "pkg-b".to_string(),
            "1.0.0".to_string(),
            "pkg-b".into(),
            vec!["pkg-a".to_string()],
            vec![],
        ),
    ];

    let err = DependencyGraph::new(packages).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Circular dependency"));
    assert!(message.contains(" -> "));
    assert!(message.contains("pkg-a"));
    assert!(message.contains("pkg-b"));
}

#[test]
fn test_dependency_levels() {
    let mut packages = create_test_packages();
    packages.push(Package::new(
        "pkg-d".to_string(),
        "1.0.0".to_string(),
        "pkg-d".into(),
        vec!["pkg-a".to_string()],
        vec![],
    ));

    let graph = DependencyGraph::new(packages).unwrap();
    let levels = graph.dependency_levels();

    assert_eq!(levels[0], vec!["pkg-a".to_string()]);
    assert!(levels[1].contains(&"pkg-b".to_string()));
    assert!(levels[1].contains(&"pkg-d".to_string()));
    assert_eq!(levels[2], vec!["pkg-c".to_string()]);
}

#[test]
fn test_unknown_package_lookup() {
    let graph = DependencyGraph::new(create_test_packages()).unwrap();
    let err = graph.dependencies("nope").unwrap_err();
    assert!(err.to_string().contains("Package not found"));
}
