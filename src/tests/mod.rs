use crate::compile::Planner;
use crate::dataset::{Association, Domain, FieldDecl, MeshDataset, StateValue};
use crate::error::{EngineError, EvalError, GraphError};
use crate::plan::GraphSpec;
use crate::runtime::Engine;
use crate::types::{EngineConfig, FailurePolicy, Value};
use crate::{ExpressionEngine, GraphPlanner};
use serde_json::{json, Value as JsonValue};


/// Four vertices; `braid` peaks at 3.0 on (0, 2, 0) and bottoms out at -1.0 on (1, 0, 0).
fn braid_dataset() -> MeshDataset {
    let mut dataset = MeshDataset::new()
        .with_field_decl("braid", FieldDecl::scalar(Association::Vertex))
        .with_field_decl("radial", FieldDecl::scalar(Association::Element))
        .with_field_decl("vel", FieldDecl::vector(Association::Vertex, 3));
    dataset
        .add_domain(
            Domain::new()
                .with_vertices(vec![
                    [0.0, 0.0, 0.0],
                    [1.0, 0.0, 0.0],
                    [0.0, 2.0, 0.0],
                    [1.0, 2.0, 3.0],
                ])
                .with_elements(vec![[0.5, 1.0, 1.5]])
                .with_field("braid", vec![0.5, -1.0, 3.0, 2.0])
                .with_field("radial", vec![7.0])
                .with_field("vel", vec![0.0; 12]),
        )
        .expect("braid domain should match schema");
    dataset.set_cycle(100);
    dataset
}

/// `magnitude(position(max("braid")) - vector(0, 0, 0)) > 0`
fn trigger_graph(name: &str) -> GraphSpec {
    GraphSpec::new(name, "gt")
        .node("f", "expr_meshvar", json!({"value": "braid"}))
        .node("mx", "field_max", JsonValue::Null)
        .node("pos", "expr_position", JsonValue::Null)
        .node("z0", "expr_integer", json!({"value": 0}))
        .node("z1", "expr_integer", json!({"value": 0}))
        .node("z2", "expr_integer", json!({"value": 0}))
        .node("v", "vector", JsonValue::Null)
        .node("sub", "expr_binary_op", json!({"op_string": "-"}))
        .node("mag", "magnitude", JsonValue::Null)
        .node("zero", "expr_integer", json!({"value": 0}))
        .node("gt", "expr_binary_op", json!({"op_string": ">"}))
        .edge("f", "mx", "arg1")
        .edge("mx", "pos", "arg1")
        .edge("z0", "v", "arg1")
        .edge("z1", "v", "arg2")
        .edge("z2", "v", "arg3")
        .edge("pos", "sub", "lhs")
        .edge("v", "sub", "rhs")
        .edge("sub", "mag", "arg1")
        .edge("mag", "gt", "lhs")
        .edge("zero", "gt", "rhs")
}

/// Single-node graph `name := <filter>(params)`.
fn leaf_graph(name: &str, filter: &str, params: JsonValue) -> GraphSpec {
    GraphSpec::new(name, "out").node("out", filter, params)
}

/// `<reduction>("<field>")`
fn field_reduction_graph(name: &str, filter: &str, field: &str) -> GraphSpec {
    GraphSpec::new(name, "out")
        .node("f", "expr_meshvar", json!({"value": field}))
        .node("out", filter, JsonValue::Null)
        .edge("f", "out", "arg1")
}

fn engine_with(config: EngineConfig, graphs: &[GraphSpec]) -> ExpressionEngine {
    let mut engine = ExpressionEngine::new(config);
    for graph in graphs {
        let (plan, _) = GraphPlanner.plan(graph).expect("graph should plan");
        engine.load(plan).expect("load should succeed");
    }
    engine
}

fn forward_config() -> EngineConfig {
    EngineConfig {
        failure_policy: FailurePolicy::Forward,
        ..EngineConfig::default()
    }
}
