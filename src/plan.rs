use crate::error::GraphError;
use crate::ops::{FilterKind, FilterParam, RawParams, MAX_FILTER_INPUTS};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Filter graph as handed over by an expression front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSpec {
    /// Identifier under which results are recorded in the history.
    pub name: String,
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub edges: Vec<EdgeSpec>,
    /// Node whose value is the expression result.
    pub output: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub name: String,
    /// Registered filter type name, e.g. `expr_binary_op`.
    pub filter: String,
    #[serde(default)]
    pub params: RawParams,
}

/// Connects the output of `from` to input port `port` of `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeSpec {
    pub from: String,
    pub to: String,
    pub port: String,
}

impl GraphSpec {
    pub fn new(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
            output: output.into(),
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, GraphError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Adds a node; `params` must be a JSON object or `null`.
    pub fn node(mut self, name: &str, filter: &str, params: JsonValue) -> Self {
        let params = match params {
            JsonValue::Object(map) => map,
            _ => RawParams::new(),
        };
        self.nodes.push(NodeSpec {
            name: name.to_string(),
            filter: filter.to_string(),
            params,
        });
        self
    }

    pub fn edge(mut self, from: &str, to: &str, port: &str) -> Self {
        self.edges.push(EdgeSpec {
            from: from.to_string(),
            to: to.to_string(),
            port: port.to_string(),
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedNode {
    pub node_id: usize,
    pub name: String,
    pub kind: FilterKind,
    pub param: FilterParam,
    /// Producer node id per input port, in port declaration order.
    pub input_nodes: [usize; MAX_FILTER_INPUTS],
    pub input_count: u8,
}

impl PlannedNode {
    #[inline]
    pub fn inputs(&self) -> &[usize] {
        &self.input_nodes[..self.input_count as usize]
    }
}

/// Validated, topologically ordered graph ready for execution.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPlan {
    pub name: String,
    pub nodes: Vec<PlannedNode>,
    /// Execution order (node ids); every node appears exactly once.
    pub order: Vec<usize>,
    pub output: usize,
}

impl ExecutionPlan {
    #[inline]
    pub fn node(&self, node_id: usize) -> Option<&PlannedNode> {
        self.nodes.get(node_id)
    }

    pub fn node_by_name(&self, name: &str) -> Option<&PlannedNode> {
        self.nodes.iter().find(|node| node.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanManifest {
    pub node_count: usize,
    pub edge_count: usize,
    /// Nodes that run a dataset-wide collective reduction.
    pub collective_count: usize,
    /// Longest path (in nodes) from a source to the output.
    pub depth: usize,
    pub plan_time_us: u64,
}

impl PlanManifest {
    #[inline]
    pub fn summary_line(&self) -> String {
        format!(
            "nodes={} edges={} collectives={} depth={} plan_us={}",
            self.node_count, self.edge_count, self.collective_count, self.depth, self.plan_time_us
        )
    }
}
