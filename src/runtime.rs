use crate::compile::{GraphPlanner, Planner};
use crate::dataset::Dataset;
use crate::error::EngineError;
use crate::ops::{FilterRegistry, MAX_FILTER_INPUTS};
use crate::plan::{ExecutionPlan, GraphSpec, PlanManifest};
use crate::state::{ExecContext, HistoryCache};
use crate::types::{EngineConfig, FailurePolicy, Value};
use tracing::{debug, error, info};

pub trait Engine {
    fn load(&mut self, plan: ExecutionPlan) -> Result<(), EngineError>;
    fn execute_cycle(&mut self, dataset: Option<&dyn Dataset>) -> Result<CycleReport, EngineError>;
}

/// Results of one cycle, in load order.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub cycle: u64,
    pub results: Vec<(String, Value)>,
}

impl CycleReport {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.results
            .iter()
            .find(|(expr, _)| expr == name)
            .map(|(_, value)| value)
    }
}

#[derive(Debug, Default)]
pub struct ExpressionEngine {
    config: EngineConfig,
    plans: Vec<ExecutionPlan>,
    history: HistoryCache,
    poisoned: Option<String>,
    cycles_run: u64,
}

impl ExpressionEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Plans `spec` with the default planner and loads the result.
    pub fn load_graph(&mut self, spec: &GraphSpec) -> Result<PlanManifest, EngineError> {
        let (plan, manifest) = GraphPlanner.plan(spec)?;
        self.load(plan)?;
        Ok(manifest)
    }

    /// Appends a host-supplied value to the history of `name`.
    pub fn record(&mut self, name: &str, value: Value) -> Result<(), EngineError> {
        self.ensure_usable()?;
        self.history.append(name, value);
        Ok(())
    }

    #[inline]
    pub fn history(&self) -> &HistoryCache {
        &self.history
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline]
    pub fn cycles_run(&self) -> u64 {
        self.cycles_run
    }

    #[inline]
    pub fn is_poisoned(&self) -> bool {
        self.poisoned.is_some()
    }

    pub fn expression_names(&self) -> impl Iterator<Item = &str> {
        self.plans.iter().map(|plan| plan.name.as_str())
    }

    fn ensure_usable(&self) -> Result<(), EngineError> {
        match &self.poisoned {
            Some(reason) => Err(EngineError::Poisoned {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    fn fail(&mut self, err: EngineError) -> EngineError {
        error!(error = %err, policy = ?self.config.failure_policy, "expression evaluation failed");
        if self.config.failure_policy == FailurePolicy::Fatal {
            self.poisoned = Some(err.to_string());
        }
        err
    }
}

impl Engine for ExpressionEngine {
    fn load(&mut self, plan: ExecutionPlan) -> Result<(), EngineError> {
        self.ensure_usable()?;
        if self.plans.iter().any(|loaded| loaded.name == plan.name) {
            return Err(EngineError::DuplicateExpression { name: plan.name });
        }
        info!(expr = %plan.name, nodes = plan.nodes.len(), "loaded expression");
        self.plans.push(plan);
        Ok(())
    }

    #[tracing::instrument(skip(self, dataset), level = "debug", fields(cycle = self.cycles_run))]
    fn execute_cycle(&mut self, dataset: Option<&dyn Dataset>) -> Result<CycleReport, EngineError> {
        self.ensure_usable()?;
        if self.plans.is_empty() {
            return Err(EngineError::NotLoaded);
        }

        let ctx = ExecContext::new(&self.history)
            .with_dataset(dataset)
            .with_cycle_state_var(&self.config.cycle_state_var);
        let evaluated = self
            .plans
            .iter()
            .map(|plan| evaluate_plan(plan, &ctx).map(|value| (plan.name.clone(), value)))
            .collect::<Result<Vec<_>, _>>();
        let results = match evaluated {
            Ok(results) => results,
            Err(err) => return Err(self.fail(err)),
        };

        if self.config.record_history {
            for (name, value) in &results {
                self.history.append(name.as_str(), value.clone());
            }
        }
        let report = CycleReport {
            cycle: self.cycles_run,
            results,
        };
        self.cycles_run += 1;
        Ok(report)
    }
}

/// Runs every node of `plan` in topological order and returns the output value.
pub fn evaluate_plan(plan: &ExecutionPlan, ctx: &ExecContext<'_>) -> Result<Value, EngineError> {
    let placeholder = Value::empty();
    let mut values = vec![Value::empty(); plan.nodes.len()];
    for &node_id in &plan.order {
        let node = &plan.nodes[node_id];
        let meta = FilterRegistry::get_by_kind(node.kind);
        let out = {
            let mut args = [&placeholder; MAX_FILTER_INPUTS];
            for (slot, &producer) in node.inputs().iter().enumerate() {
                args[slot] = &values[producer];
            }
            (meta.kernel)(ctx, &args[..node.inputs().len()], &node.param)
        };
        let value = out.map_err(|source| EngineError::Eval {
            expr: plan.name.clone(),
            node: node.name.clone(),
            filter: meta.name,
            source,
        })?;
        debug!(
            expr = %plan.name,
            node = %node.name,
            filter = meta.name,
            kind = value.kind().as_str(),
            "node evaluated"
        );
        values[node_id] = value;
    }
    Ok(std::mem::replace(&mut values[plan.output], Value::empty()))
}
