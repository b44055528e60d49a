use crate::error::{GraphError, ValidationReport};
use crate::ops::{FilterMeta, FilterParam, FilterRegistry, MAX_FILTER_INPUTS};
use crate::plan::{ExecutionPlan, GraphSpec, PlanManifest, PlannedNode};
use std::collections::{BTreeSet, HashMap};
use std::time::Instant;
use tracing::debug;

pub trait Planner {
    fn plan(&self, spec: &GraphSpec) -> Result<(ExecutionPlan, PlanManifest), GraphError>;
}

#[derive(Debug, Default)]
pub struct GraphPlanner;

impl Planner for GraphPlanner {
    fn plan(&self, spec: &GraphSpec) -> Result<(ExecutionPlan, PlanManifest), GraphError> {
        if spec.nodes.is_empty() {
            return Err(GraphError::EmptyGraph {
                name: spec.name.clone(),
            });
        }
        let started_at = Instant::now();

        let (metas, node_by_name) = resolve_filters(spec)?;
        let params = validate_params(spec, &metas)?;
        let output = lookup_node(&node_by_name, &spec.output)?;
        let wiring = wire_ports(spec, &metas, &node_by_name)?;

        let nodes = spec
            .nodes
            .iter()
            .zip(metas.iter())
            .zip(params)
            .zip(wiring)
            .enumerate()
            .map(|(node_id, (((node, meta), param), wired))| PlannedNode {
                node_id,
                name: node.name.clone(),
                kind: meta.kind,
                param,
                input_nodes: wired,
                input_count: meta.input_count() as u8,
            })
            .collect::<Vec<_>>();
        let order = topological_order(&nodes)?;
        let depth = plan_depth(&nodes, &order, output);

        let plan = ExecutionPlan {
            name: spec.name.clone(),
            nodes,
            order,
            output,
        };
        let manifest = PlanManifest {
            node_count: plan.nodes.len(),
            edge_count: spec.edges.len(),
            collective_count: metas.iter().filter(|meta| meta.collective).count(),
            depth,
            plan_time_us: started_at.elapsed().as_micros() as u64,
        };
        debug!(expr = %plan.name, manifest = %manifest.summary_line(), "planned filter graph");
        Ok((plan, manifest))
    }
}

type NodeIndex<'a> = HashMap<&'a str, usize>;

fn resolve_filters(
    spec: &GraphSpec,
) -> Result<(Vec<&'static FilterMeta>, NodeIndex<'_>), GraphError> {
    let mut metas = Vec::with_capacity(spec.nodes.len());
    let mut node_by_name = HashMap::with_capacity(spec.nodes.len());
    for (node_id, node) in spec.nodes.iter().enumerate() {
        if node_by_name.insert(node.name.as_str(), node_id).is_some() {
            return Err(GraphError::DuplicateNode {
                name: node.name.clone(),
            });
        }
        let meta = FilterRegistry::get(&node.filter).ok_or_else(|| GraphError::UnknownFilter {
            node: node.name.clone(),
            filter: node.filter.clone(),
        })?;
        metas.push(meta);
    }
    Ok((metas, node_by_name))
}

/// Visits every node before failing so the report carries all violations.
fn validate_params(
    spec: &GraphSpec,
    metas: &[&'static FilterMeta],
) -> Result<Vec<FilterParam>, GraphError> {
    let mut report = ValidationReport::default();
    let mut params = Vec::with_capacity(metas.len());
    let mut messages = Vec::new();
    for (node, meta) in spec.nodes.iter().zip(metas) {
        messages.clear();
        match meta.param_spec.validate(&node.params, &mut messages) {
            Some(param) if messages.is_empty() => params.push(param),
            _ if messages.is_empty() => {
                report.push(&node.name, meta.name, "parameters rejected".to_string());
            }
            _ => {
                for message in messages.drain(..) {
                    report.push(&node.name, meta.name, message);
                }
            }
        }
    }
    if report.is_empty() {
        Ok(params)
    } else {
        Err(GraphError::InvalidParams(report))
    }
}

fn lookup_node(node_by_name: &NodeIndex<'_>, name: &str) -> Result<usize, GraphError> {
    node_by_name
        .get(name)
        .copied()
        .ok_or_else(|| GraphError::UnknownNode {
            name: name.to_string(),
        })
}

fn wire_ports(
    spec: &GraphSpec,
    metas: &[&'static FilterMeta],
    node_by_name: &NodeIndex<'_>,
) -> Result<Vec<[usize; MAX_FILTER_INPUTS]>, GraphError> {
    let mut wired: Vec<[Option<usize>; MAX_FILTER_INPUTS]> =
        vec![[None; MAX_FILTER_INPUTS]; spec.nodes.len()];
    for edge in &spec.edges {
        let from = lookup_node(node_by_name, &edge.from)?;
        let to = lookup_node(node_by_name, &edge.to)?;
        let meta = metas[to];
        let slot = meta
            .port_index(&edge.port)
            .ok_or_else(|| GraphError::UnknownPort {
                node: edge.to.clone(),
                filter: meta.name,
                port: edge.port.clone(),
                known: meta.port_names(),
            })?;
        if wired[to][slot].replace(from).is_some() {
            return Err(GraphError::DuplicatePortWiring {
                node: edge.to.clone(),
                port: edge.port.clone(),
            });
        }
    }

    let mut resolved = Vec::with_capacity(wired.len());
    for ((node, meta), slots) in spec.nodes.iter().zip(metas).zip(wired) {
        let mut inputs = [0usize; MAX_FILTER_INPUTS];
        for (slot, port) in meta.ports.iter().enumerate() {
            inputs[slot] = slots[slot].ok_or_else(|| GraphError::UnwiredPort {
                node: node.name.clone(),
                filter: meta.name,
                port: port.name,
            })?;
        }
        resolved.push(inputs);
    }
    Ok(resolved)
}

/// Kahn's algorithm; among ready nodes the earliest declared runs first.
fn topological_order(nodes: &[PlannedNode]) -> Result<Vec<usize>, GraphError> {
    let mut pending = vec![0usize; nodes.len()];
    let mut consumers = vec![Vec::new(); nodes.len()];
    for node in nodes {
        for &producer in node.inputs() {
            pending[node.node_id] += 1;
            consumers[producer].push(node.node_id);
        }
    }

    let mut ready = nodes
        .iter()
        .filter(|node| pending[node.node_id] == 0)
        .map(|node| node.node_id)
        .collect::<BTreeSet<_>>();
    let mut order = Vec::with_capacity(nodes.len());
    while let Some(node_id) = ready.pop_first() {
        order.push(node_id);
        for &consumer in &consumers[node_id] {
            pending[consumer] -= 1;
            if pending[consumer] == 0 {
                ready.insert(consumer);
            }
        }
    }

    if order.len() != nodes.len() {
        let stuck = nodes
            .iter()
            .filter(|node| pending[node.node_id] > 0)
            .map(|node| node.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        return Err(GraphError::CyclicGraph { nodes: stuck });
    }
    Ok(order)
}

fn plan_depth(nodes: &[PlannedNode], order: &[usize], output: usize) -> usize {
    let mut depth = vec![0usize; nodes.len()];
    for &node_id in order {
        depth[node_id] = 1 + nodes[node_id]
            .inputs()
            .iter()
            .map(|&producer| depth[producer])
            .max()
            .unwrap_or(0);
    }
    depth[output]
}
