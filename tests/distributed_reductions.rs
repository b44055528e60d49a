mod common;

use common::{braid_rank, on_ranks, TRIGGER_DOCUMENT};
use insitu_expr::dataset::Communicator;
use insitu_expr::{
    Engine, EngineConfig, EngineError, EvalError, ExpressionEngine, FailurePolicy, GraphSpec,
    Value,
};
use serde_json::{json, Value as JsonValue};

fn rank_values(rank: usize) -> Vec<f64> {
    match rank {
        0 => vec![1.0, 5.0],
        1 => vec![-3.0, 5.0],
        _ => Vec::new(),
    }
}

fn reduction(name: &str, filter: &str, field: &str) -> GraphSpec {
    GraphSpec::new(name, "out")
        .node("f", "expr_meshvar", json!({"value": field}))
        .node("out", filter, JsonValue::Null)
        .edge("f", "out", "arg1")
}

fn histogram(name: &str, bins: i32) -> GraphSpec {
    GraphSpec::new(name, "h")
        .node("f", "expr_meshvar", json!({"value": "braid"}))
        .node("bins", "expr_integer", json!({"value": bins}))
        .node("n", "null_arg", JsonValue::Null)
        .node("h", "histogram", JsonValue::Null)
        .edge("f", "h", "field")
        .edge("bins", "h", "num_bins")
        .edge("n", "h", "min_val")
        .edge("n", "h", "max_val")
}

#[test]
fn every_rank_sees_the_same_reductions() {
    let results = on_ranks(3, |comm| {
        let rank = comm.rank();
        let dataset = braid_rank(comm, rank_values(rank));
        let mut engine = ExpressionEngine::new(EngineConfig::default());
        for graph in [
            reduction("max", "field_max", "braid"),
            reduction("min", "field_min", "braid"),
            reduction("avg", "field_avg", "braid"),
            histogram("hist", 4),
            GraphSpec::from_json_str(TRIGGER_DOCUMENT).expect("parse"),
        ] {
            engine.load_graph(&graph).expect("load");
        }
        engine.execute_cycle(Some(&dataset)).expect("cycle")
    });

    let first = &results[0];
    for report in &results[1..] {
        assert_eq!(report, first);
    }

    // ties go to the lowest rank
    let max = first.get("max").expect("max");
    assert_eq!(max.as_number().map(|n| n.to_f64()), Some(5.0));
    assert_eq!(max.position(), Some([1.0, 0.0, 0.0]));
    let min = first.get("min").expect("min");
    assert_eq!(min.position(), Some([0.0, 1.0, 0.0]));
    assert_eq!(first.get("avg"), Some(&Value::float(2.0)));
    let hist = first
        .get("hist")
        .and_then(Value::as_histogram)
        .expect("histogram");
    assert_eq!(hist.counts, vec![1, 0, 1, 2]);
    assert_eq!((hist.min_val, hist.max_val), (-3.0, 5.0));
    assert_eq!(first.get("trigger"), Some(&Value::boolean(true)));
}

#[test]
fn failures_are_identical_on_every_rank() {
    let config = EngineConfig {
        failure_policy: FailurePolicy::Forward,
        ..EngineConfig::default()
    };
    let results = on_ranks(2, |comm| {
        // constant field: default bounds collapse to a single point
        let dataset = braid_rank(comm, vec![2.0, 2.0]);
        let mut engine = ExpressionEngine::new(config.clone());
        engine.load_graph(&histogram("hist", 8)).expect("load");
        let range = engine.execute_cycle(Some(&dataset)).expect_err("empty range");

        let mut engine = ExpressionEngine::new(config.clone());
        engine
            .load_graph(&reduction("avg", "field_avg", "pressure"))
            .expect("load");
        let unknown = engine.execute_cycle(Some(&dataset)).expect_err("unknown field");

        // the dataset must still be usable collectively after both failures
        let mut engine = ExpressionEngine::new(config.clone());
        engine
            .load_graph(&reduction("avg", "field_avg", "braid"))
            .expect("load");
        let avg = engine.execute_cycle(Some(&dataset)).expect("avg");
        (range, unknown, avg)
    });

    for (range, unknown, avg) in results {
        assert!(matches!(
            range,
            EngineError::Eval {
                source: EvalError::Range { min_val, max_val, .. },
                ..
            } if min_val == 2.0 && max_val == 2.0
        ));
        assert!(matches!(
            unknown,
            EngineError::Eval {
                source: EvalError::UnknownField { .. },
                ..
            }
        ));
        assert_eq!(avg.get("avg"), Some(&Value::float(2.0)));
    }
}
