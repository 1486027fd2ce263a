use super::*;
use crate::engine::bom_graph::BomGraph;
use crate::engine::error::EngineError;
use crate::engine::test_catalog::InMemoryCatalog;

// ==========================================
// 测试辅助函数
// ==========================================

/// F <- C×2, C <- M×3
fn frame_catalog(c_on_hand: f64, m_on_hand: f64) -> InMemoryCatalog {
    InMemoryCatalog::new()
        .with_product("F", 0.0)
        .with_product("C", c_on_hand)
        .with_product("M", m_on_hand)
        .with_recipe("R-F", Some("F"), &[("C", 2.0)])
        .with_recipe("R-C", Some("C"), &[("M", 3.0)])
}

// ==========================================
// 基本展开
// ==========================================

#[test]
fn test_single_level_sufficient() {
    let catalog = InMemoryCatalog::new()
        .with_product("P", 0.0)
        .with_product("A", 10.0)
        .with_product("B", 5.0)
        .with_recipe("R", Some("P"), &[("A", 2.0), ("B", 1.0)]);
    let graph = BomGraph::new(&catalog);

    let resolution = RequirementResolver::new().resolve(&graph, "R", 3.0).unwrap();

    assert!(resolution.is_feasible());
    assert_eq!(resolution.leaf_requirements.len(), 2);
    assert_eq!(resolution.leaf_requirements[0].product_id, "A");
    assert_eq!(resolution.leaf_requirements[0].required_quantity, 6.0);
    assert_eq!(resolution.leaf_requirements[1].required_quantity, 3.0);
}

#[test]
fn test_intermediate_expanded_when_out_of_stock() {
    let catalog = frame_catalog(0.0, 4.0);
    let graph = BomGraph::new(&catalog);

    let resolution = RequirementResolver::new().resolve(&graph, "R-F", 1.0).unwrap();

    assert_eq!(resolution.shortages.len(), 1);
    let m = &resolution.shortages[0];
    assert_eq!(m.product_id, "M");
    assert_eq!(m.required_quantity, 6.0);
    assert_eq!(m.available_quantity, 4.0);
    assert_eq!(m.shortage_quantity, 2.0);
}

#[test]
fn test_intermediate_stock_preferred_over_recursion() {
    // C 在库 40: 需求 25 时不展开,需求 60 时仅展开缺口 20
    let catalog = InMemoryCatalog::new()
        .with_product("F", 0.0)
        .with_product("C", 40.0)
        .with_product("M", 100.0)
        .with_recipe("R-F", Some("F"), &[("C", 1.0)])
        .with_recipe("R-C", Some("C"), &[("M", 3.0)]);
    let graph = BomGraph::new(&catalog);
    let resolver = RequirementResolver::new();

    let covered = resolver.resolve(&graph, "R-F", 25.0).unwrap();
    assert!(covered.leaf_requirements.is_empty());
    assert!(covered.is_feasible());

    let expanded = resolver.resolve(&graph, "R-F", 60.0).unwrap();
    assert_eq!(expanded.leaf_requirements.len(), 1);
    assert_eq!(expanded.leaf_requirements[0].product_id, "M");
    assert_eq!(expanded.leaf_requirements[0].required_quantity, 60.0);
}

#[test]
fn test_partial_intermediate_stock() {
    let catalog = frame_catalog(1.0, 0.0);
    let graph = BomGraph::new(&catalog);

    let resolution = RequirementResolver::new().resolve(&graph, "R-F", 1.0).unwrap();

    // 需要 C×2, 在库 1, 缺口 1 -> M×3
    assert_eq!(resolution.shortages[0].required_quantity, 3.0);
    assert_eq!(resolution.shortages[0].shortage_quantity, 3.0);
}

#[test]
fn test_shared_leaf_accumulated_in_first_seen_order() {
    let catalog = InMemoryCatalog::new()
        .with_product("P", 0.0)
        .with_product("X", 0.0)
        .with_product("B", 100.0)
        .with_product("A", 100.0)
        .with_recipe("R-P", Some("P"), &[("B", 1.0), ("X", 2.0), ("A", 1.0)])
        .with_recipe("R-X", Some("X"), &[("A", 5.0), ("B", 1.0)]);
    let graph = BomGraph::new(&catalog);

    let resolution = RequirementResolver::new().resolve(&graph, "R-P", 2.0).unwrap();

    let ids: Vec<&str> = resolution
        .leaf_requirements
        .iter()
        .map(|r| r.product_id.as_str())
        .collect();
    assert_eq!(ids, vec!["B", "A"]);
    // B: 2 + 4×1, A: 4×5 + 2
    assert_eq!(resolution.leaf_requirements[0].required_quantity, 6.0);
    assert_eq!(resolution.leaf_requirements[1].required_quantity, 22.0);
}

#[test]
fn test_sibling_reuse_of_sub_recipe_is_not_a_cycle() {
    // 两个分支都用到 X, 同一配方多次出现但不在同一路径上
    let catalog = InMemoryCatalog::new()
        .with_product("P", 0.0)
        .with_product("Y", 0.0)
        .with_product("X", 0.0)
        .with_product("M", 100.0)
        .with_recipe("R-P", Some("P"), &[("X", 1.0), ("Y", 1.0)])
        .with_recipe("R-Y", Some("Y"), &[("X", 1.0)])
        .with_recipe("R-X", Some("X"), &[("M", 1.0)]);
    let graph = BomGraph::new(&catalog);

    let resolution = RequirementResolver::new().resolve(&graph, "R-P", 1.0).unwrap();

    assert!(resolution.cycles.is_empty());
    assert_eq!(resolution.leaf_requirements[0].required_quantity, 2.0);
}

#[test]
fn test_preferred_mapping_decides_expansion() {
    let catalog = InMemoryCatalog::new()
        .with_product("F", 0.0)
        .with_product("C", 0.0)
        .with_product("M", 0.0)
        .with_product("N", 10.0)
        .with_recipe("R-F", Some("F"), &[("C", 1.0)])
        .with_recipe("R-C1", Some("C"), &[("M", 1.0)])
        .with_recipe("R-C2", Some("C"), &[("N", 2.0)]);
    let resolver = RequirementResolver::new();

    let first = resolver.resolve(&BomGraph::new(&catalog), "R-F", 1.0).unwrap();
    assert_eq!(first.leaf_requirements[0].product_id, "M");

    let catalog = catalog.with_preferred("C", "R-C2");
    let second = resolver.resolve(&BomGraph::new(&catalog), "R-F", 1.0).unwrap();
    assert_eq!(second.leaf_requirements[0].product_id, "N");
    assert_eq!(second.leaf_requirements[0].required_quantity, 2.0);
    assert!(second.is_feasible());
}

// ==========================================
// 循环引用
// ==========================================

#[test]
fn test_self_cycle_reported() {
    let catalog = InMemoryCatalog::new()
        .with_product("A", 0.0)
        .with_recipe("R-A", Some("A"), &[("A", 1.0)]);
    let graph = BomGraph::new(&catalog);

    let resolution = RequirementResolver::new().resolve(&graph, "R-A", 1.0).unwrap();

    assert_eq!(resolution.cycles.len(), 1);
    assert_eq!(resolution.cycles[0].path, vec!["R-A", "R-A"]);
    assert_eq!(resolution.cycles[0].component_product_id, "A");
    assert!(!resolution.is_feasible());
    assert_eq!(resolution.shortages[0].product_id, "A");
    assert_eq!(resolution.shortages[0].shortage_quantity, 1.0);
}

#[test]
fn test_indirect_cycle_reported() {
    let catalog = InMemoryCatalog::new()
        .with_product("A", 0.0)
        .with_product("B", 0.0)
        .with_recipe("R-A", Some("A"), &[("B", 1.0)])
        .with_recipe("R-B", Some("B"), &[("A", 2.0)]);
    let graph = BomGraph::new(&catalog);

    let resolution = RequirementResolver::new().resolve(&graph, "R-A", 1.0).unwrap();

    assert_eq!(resolution.cycles.len(), 1);
    assert_eq!(resolution.cycles[0].path, vec!["R-A", "R-B", "R-A"]);
    assert_eq!(resolution.cycles[0].unresolved_quantity, 2.0);
}

#[test]
fn test_cycle_covered_by_stock_is_not_followed() {
    let catalog = InMemoryCatalog::new()
        .with_product("A", 5.0)
        .with_recipe("R-A", Some("A"), &[("A", 1.0)]);
    let graph = BomGraph::new(&catalog);

    let resolution = RequirementResolver::new().resolve(&graph, "R-A", 2.0).unwrap();

    assert!(resolution.cycles.is_empty());
    assert!(resolution.is_feasible());
}

// ==========================================
// 错误路径
// ==========================================

#[test]
fn test_invalid_quantity_rejected() {
    let catalog = frame_catalog(0.0, 0.0);
    let graph = BomGraph::new(&catalog);
    let resolver = RequirementResolver::new();

    for qty in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        let result = resolver.resolve(&graph, "R-F", qty);
        assert!(matches!(result, Err(EngineError::InvalidQuantity(_))));
    }
}

#[test]
fn test_missing_recipe_and_component() {
    let catalog = InMemoryCatalog::new()
        .with_product("F", 0.0)
        .with_recipe("R-F", Some("F"), &[("GHOST", 1.0)]);
    let graph = BomGraph::new(&catalog);
    let resolver = RequirementResolver::new();

    assert!(matches!(
        resolver.resolve(&graph, "NOPE", 1.0),
        Err(EngineError::NotFound { .. })
    ));
    assert!(matches!(
        resolver.resolve(&graph, "R-F", 1.0),
        Err(EngineError::NotFound { ref id, .. }) if id == "GHOST"
    ));
}

// ==========================================
// 性质
// ==========================================

#[test]
fn test_resolve_is_idempotent() {
    let catalog = frame_catalog(1.0, 4.0);
    let graph = BomGraph::new(&catalog);
    let resolver = RequirementResolver::new();

    let first = resolver.resolve(&graph, "R-F", 3.0).unwrap();
    let second = resolver.resolve(&graph, "R-F", 3.0).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_shortage_monotonic_in_quantity() {
    let catalog = frame_catalog(3.0, 10.0);
    let graph = BomGraph::new(&catalog);
    let resolver = RequirementResolver::new();

    let mut previous = 0.0;
    for qty in [1.0, 2.0, 4.0, 8.0, 16.0] {
        let total: f64 = resolver
            .resolve(&graph, "R-F", qty)
            .unwrap()
            .shortages
            .iter()
            .map(|r| r.shortage_quantity)
            .sum();
        assert!(total >= previous, "qty={} total={} previous={}", qty, total, previous);
        previous = total;
    }
}
