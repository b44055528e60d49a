use std::fmt;
use thiserror::Error;

/// One parameter problem found by the validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamViolation {
    pub node: String,
    pub filter: &'static str,
    pub message: String,
}

impl fmt::Display for ParamViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node `{}` ({}): {}", self.node, self.filter, self.message)
    }
}

/// All parameter violations of a graph, collected before any execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub violations: Vec<ParamViolation>,
}

impl ValidationReport {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn push(&mut self, node: &str, filter: &'static str, message: String) {
        self.violations.push(ParamViolation {
            node: node.to_string(),
            filter,
            message,
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParamViolation> {
        self.violations.iter()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} parameter violation(s)", self.violations.len())?;
        for violation in &self.violations {
            write!(f, "\n  - {violation}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("empty filter graph `{name}`")]
    EmptyGraph { name: String },
    #[error("duplicate node name `{name}`")]
    DuplicateNode { name: String },
    #[error("node `{node}` uses unknown filter type `{filter}`")]
    UnknownFilter { node: String, filter: String },
    #[error("unknown node `{name}`")]
    UnknownNode { name: String },
    #[error("filter `{filter}` (node `{node}`) has no input port `{port}`; ports: [{known}]")]
    UnknownPort {
        node: String,
        filter: &'static str,
        port: String,
        known: String,
    },
    #[error("input port `{port}` of node `{node}` is wired more than once")]
    DuplicatePortWiring { node: String, port: String },
    #[error("input port `{port}` of node `{node}` ({filter}) is not wired")]
    UnwiredPort {
        node: String,
        filter: &'static str,
        port: &'static str,
    },
    #[error("filter graph contains a cycle through: {nodes}")]
    CyclicGraph { nodes: String },
    #[error("invalid graph parameters: {0}")]
    InvalidParams(ValidationReport),
    #[error("invalid graph document: {0}")]
    Document(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("field `{field}` is not declared")]
    FieldNotFound { field: String },
    #[error("field `{field}` has no samples on any rank")]
    EmptyField { field: String },
    #[error("field `{field}` does not match its declaration: {reason}")]
    SchemaMismatch { field: String, reason: String },
    #[error("collective exchange failed: {reason}")]
    Communication { reason: String },
}

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("{filter}: {reason}")]
    TypeMismatch {
        filter: &'static str,
        reason: String,
    },
    #[error("unsupported operator `{op}`: {reason}")]
    UnsupportedOperator { op: String, reason: &'static str },
    #[error("{filter}: missing dataset")]
    MissingDataset { filter: &'static str },
    #[error(
        "{filter}: dataset does not contain field `{field}` (known fields: [{}])",
        .known.join(" ")
    )]
    UnknownField {
        filter: &'static str,
        field: String,
        known: Vec<String>,
    },
    #[error("{filter}: field `{field}` is not a scalar")]
    NonScalarField { filter: &'static str, field: String },
    #[error("{filter}: min value ({min_val}) must be smaller than max ({max_val})")]
    Range {
        filter: &'static str,
        min_val: f64,
        max_val: f64,
    },
    #[error(
        "{filter}: bin count must be in 1..={max}, got {num_bins}",
        max = crate::types::MAX_NUM_BINS
    )]
    InvalidBinCount { filter: &'static str, num_bins: i32 },
    #[error("unknown expression identifier `{name}`")]
    UnknownIdentifier { name: String },
    #[error("expression identifier `{name}` has no recorded entries")]
    EmptyHistory { name: String },
    #[error("{filter}: input does not have a `{attribute}` attribute")]
    MissingAttribute {
        filter: &'static str,
        attribute: &'static str,
    },
    #[error("{filter}: dataset has no state variable `{name}`")]
    MissingStateVar { filter: &'static str, name: String },
    #[error("{filter}: state variable `{name}` is not a number")]
    NonNumericStateVar { filter: &'static str, name: String },
    #[error("integer division by zero")]
    DivisionByZero,
    #[error("integer overflow in `{lhs} {op} {rhs}`")]
    IntegerOverflow { lhs: i32, op: &'static str, rhs: i32 },
    #[error("parameter kind mismatch for filter `{filter}`: expected {expected}")]
    ParamKindMismatch {
        filter: &'static str,
        expected: &'static str,
    },
    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine has no loaded expressions")]
    NotLoaded,
    #[error("expression `{name}` is already loaded")]
    DuplicateExpression { name: String },
    #[error("engine halted after a fatal evaluation failure: {reason}")]
    Poisoned { reason: String },
    #[error("expression `{expr}`, node `{node}` ({filter}) failed: {source}")]
    Eval {
        expr: String,
        node: String,
        filter: &'static str,
        #[source]
        source: EvalError,
    },
    #[error(transparent)]
    Graph(#[from] GraphError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid engine config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid engine config: {reason}")]
    Invalid { reason: String },
}
