use monokit_core::graph::DependencyGraph;
use monokit_core::package::Package;
use proptest::prelude::*;

const NAMES: [&str; 6] = ["a", "b", "c", "d", "e", "f"];

/// Generates packages whose dependencies only point at earlier names, so the
/// resulting graph is acyclic by construction.
fn gen_acyclic_packages() -> impl Strategy<Value = Vec<Package>> {
    let deps_per_package: Vec<_> = (0..NAMES.len())
        .map(|i| proptest::collection::vec(0..NAMES.len().max(1), 0..=i.min(3)))
        .collect();

    deps_per_package.prop_map(|dep_indices| {
        dep_indices
            .into_iter()
            .enumerate()
            .map(|(i, indices)| {
                let mut deps: Vec<String> = indices
                    .into_iter()
                    .filter(|j| *j < i)
                    .map(|j| NAMES[j].to_string())
                    .collect();
                deps.sort();
                deps.dedup();
                Package::new(
                    NAMES[i].to_string(),
                    "1.0.0".to_string(),
                    format!("pkg-{}", NAMES[i]).into(),
                    deps,
                    vec![],
                )
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn acyclic_graphs_always_build(packages in gen_acyclic_packages()) {
        let graph = DependencyGraph::new(packages.clone());
        prop_assert!(graph.is_ok());

        let graph = graph.unwrap();
        let order = graph.topological_order();
        prop_assert_eq!(order.len(), packages.len());
    }

    #[test]
    fn topological_order_respects_edges(packages in gen_acyclic_packages()) {
        let graph = DependencyGraph::new(packages.clone()).unwrap();
        let order = graph.topological_order();

        let position: std::collections::HashMap<&str, usize> = order
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();

        for package in &packages {
            for dep in &package.deps {
                prop_assert!(
                    position[dep.as_str()] < position[package.name.as_str()],
                    "dependency {} must precede {}",
                    dep,
                    package.name
                );
            }
        }
    }

    #[test]
    fn order_has_no_duplicates(packages in gen_acyclic_packages()) {
        let graph = DependencyGraph::new(packages).unwrap();
        let mut seen = std::collections::HashSet::new();
        for name in graph.topological_order() {
            prop_assert!(seen.insert(name.clone()), "duplicate in order: {}", name);
        }
    }

    #[test]
    fn dependents_closure_never_contains_self(packages in gen_acyclic_packages()) {
        let graph = DependencyGraph::new(packages).unwrap();
        for name in NAMES {
            let dependents = graph.all_dependents(name).unwrap();
            prop_assert!(!dependents.contains(name));
        }
    }
}
