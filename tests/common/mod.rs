#![allow(dead_code)]

use insitu_expr::dataset::{Association, Communicator, Domain, FieldDecl, SharedMemoryComm};
use insitu_expr::MeshDataset;
use std::thread;

pub const TRIGGER_DOCUMENT: &str = r#"{
    "name": "trigger",
    "output": "gt",
    "nodes": [
        {"name": "f", "filter": "expr_meshvar", "params": {"value": "braid"}},
        {"name": "mx", "filter": "field_max"},
        {"name": "pos", "filter": "expr_position"},
        {"name": "z", "filter": "expr_integer", "params": {"value": 0}},
        {"name": "v", "filter": "vector"},
        {"name": "sub", "filter": "expr_binary_op", "params": {"op_string": "-"}},
        {"name": "mag", "filter": "magnitude"},
        {"name": "gt", "filter": "expr_binary_op", "params": {"op_string": ">"}}
    ],
    "edges": [
        {"from": "f", "to": "mx", "port": "arg1"},
        {"from": "mx", "to": "pos", "port": "arg1"},
        {"from": "z", "to": "v", "port": "arg1"},
        {"from": "z", "to": "v", "port": "arg2"},
        {"from": "z", "to": "v", "port": "arg3"},
        {"from": "pos", "to": "sub", "port": "lhs"},
        {"from": "v", "to": "sub", "port": "rhs"},
        {"from": "sub", "to": "mag", "port": "arg1"},
        {"from": "mag", "to": "gt", "port": "lhs"},
        {"from": "z", "to": "gt", "port": "rhs"}
    ]
}"#;

/// Dataset with a vertex scalar `braid` and a vertex vector `vel`; one domain
/// with vertices at `(i, rank, 0)` when `values` is non-empty.
pub fn braid_rank<C: Communicator>(comm: C, values: Vec<f64>) -> MeshDataset<C> {
    let rank = comm.rank() as f64;
    let mut dataset = MeshDataset::with_comm(comm)
        .with_field_decl("braid", FieldDecl::scalar(Association::Vertex))
        .with_field_decl("vel", FieldDecl::vector(Association::Vertex, 3));
    if !values.is_empty() {
        let positions = (0..values.len()).map(|i| [i as f64, rank, 0.0]).collect();
        let vel = vec![0.0; values.len() * 3];
        dataset
            .add_domain(
                Domain::new()
                    .with_vertices(positions)
                    .with_field("braid", values)
                    .with_field("vel", vel),
            )
            .expect("domain should match schema");
    }
    dataset.set_cycle(42);
    dataset
}

/// Runs `body` once per rank of an in-process group and returns the per-rank results.
pub fn on_ranks<T, F>(size: usize, body: F) -> Vec<T>
where
    T: Send,
    F: Fn(SharedMemoryComm) -> T + Sync,
{
    let group = SharedMemoryComm::group(size);
    thread::scope(|scope| {
        let handles = group
            .into_iter()
            .map(|comm| {
                let body = &body;
                scope.spawn(move || body(comm))
            })
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .map(|h| h.join().expect("rank thread"))
            .collect()
    })
}
