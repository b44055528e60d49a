pub mod compile;
pub mod dataset;
pub mod error;
pub mod ops;
pub mod plan;
pub mod runtime;
pub mod state;
pub mod types;

pub use compile::{GraphPlanner, Planner};
pub use dataset::{Dataset, MeshDataset};
pub use error::{DatasetError, EngineError, EvalError, GraphError};
pub use plan::{ExecutionPlan, GraphSpec, PlanManifest};
pub use runtime::{CycleReport, Engine, ExpressionEngine};
pub use state::{ExecContext, HistoryCache, HistoryLookup};
pub use types::{EngineConfig, FailurePolicy, Histogram, Number, Payload, Value, ValueKind};

#[cfg(test)]
mod tests;
