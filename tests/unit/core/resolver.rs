use super::*;

fn node(resolver: &mut DependencyResolver, id: &str, deps: &[&str]) {
    resolver.add_node(id.to_string(), deps.iter().map(|d| d.to_string()).collect());
}

fn index_of(order: &[String], id: &str) -> usize {
    order
        .iter()
        .position(|n| n == id)
        .unwrap_or_else(|| panic!("'{}' missing from load order {:?}", id, order))
}

#[test]
fn dependencies_precede_dependents() {
    let mut resolver = DependencyResolver::new();
    node(&mut resolver, "viewer", &["loader", "interaction"]);
    node(&mut resolver, "loader", &[]);
    node(&mut resolver, "interaction", &[]);
    node(&mut resolver, "annotate", &["interaction", "loader"]);

    let order = resolver.resolve_load_order().unwrap();
    assert_eq!(order.len(), 4);
    for (id, deps) in [
        ("viewer", vec!["loader", "interaction"]),
        ("annotate", vec!["interaction", "loader"]),
    ] {
        for dep in deps {
            assert!(
                index_of(&order, dep) < index_of(&order, id),
                "{} must precede {} in {:?}",
                dep,
                id,
                order
            );
        }
    }
}

#[test]
fn diamond_resolves_each_node_once() {
    let mut resolver = DependencyResolver::new();
    node(&mut resolver, "a", &[]);
    node(&mut resolver, "b", &["a"]);
    node(&mut resolver, "c", &["a"]);
    node(&mut resolver, "d", &["b", "c"]);

    let order = resolver.resolve_load_order().unwrap();
    assert_eq!(order.len(), 4);
    assert_eq!(index_of(&order, "a"), 0);
    assert_eq!(index_of(&order, "d"), 3);
}

#[test]
fn independent_nodes_keep_insertion_order() {
    let mut resolver = DependencyResolver::new();
    node(&mut resolver, "z", &[]);
    node(&mut resolver, "m", &[]);
    node(&mut resolver, "a", &[]);

    let order = resolver.resolve_load_order().unwrap();
    assert_eq!(order, vec!["z".to_string(), "m".to_string(), "a".to_string()]);
}

#[test]
fn re_adding_a_node_overwrites_dependencies() {
    let mut resolver = DependencyResolver::new();
    node(&mut resolver, "a", &[]);
    node(&mut resolver, "b", &[]);
    node(&mut resolver, "a", &["b"]);

    let order = resolver.resolve_load_order().unwrap();
    assert_eq!(order.len(), 2);
    assert!(index_of(&order, "b") < index_of(&order, "a"));
}

#[test]
fn detects_two_node_cycle() {
    let mut resolver = DependencyResolver::new();
    node(&mut resolver, "a", &["b"]);
    node(&mut resolver, "b", &["a"]);

    assert!(resolver.has_circular_dependencies());
    assert!(matches!(
        resolver.resolve_load_order(),
        Err(ResolveError::CircularDependency { .. })
    ));
}

#[test]
fn detects_self_loop() {
    let mut resolver = DependencyResolver::new();
    node(&mut resolver, "a", &["a"]);

    assert!(resolver.has_circular_dependencies());
    assert!(matches!(
        resolver.resolve_load_order(),
        Err(ResolveError::CircularDependency { .. })
    ));
}

#[test]
fn detects_longer_cycle_behind_acyclic_prefix() {
    let mut resolver = DependencyResolver::new();
    node(&mut resolver, "root", &["x"]);
    node(&mut resolver, "x", &["y"]);
    node(&mut resolver, "y", &["z"]);
    node(&mut resolver, "z", &["x"]);

    assert!(resolver.has_circular_dependencies());
    assert!(resolver.resolve_load_order().is_err());
}

#[test]
fn acyclic_graph_reports_no_cycle() {
    let mut resolver = DependencyResolver::new();
    node(&mut resolver, "a", &[]);
    node(&mut resolver, "b", &["a"]);

    assert!(!resolver.has_circular_dependencies());
}

#[test]
fn unknown_dependency_is_an_error() {
    let mut resolver = DependencyResolver::new();
    node(&mut resolver, "a", &["ghost"]);

    let err = resolver.resolve_load_order().unwrap_err();
    assert_eq!(
        err,
        ResolveError::UnknownDependency {
            id: "a".to_string(),
            dependency: "ghost".to_string(),
        }
    );
}
