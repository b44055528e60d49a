//! Filter layer entry.
//!
//! Extension path (minimal touch points):
//! 1) implement kernel in `leaf.rs` / `binary.rs` / `reduce.rs` / `derived.rs`,
//! 2) add a tag in `spec.rs` and register meta in `catalog.rs` (`FILTER_METAS`),
//! 3) add kernel and planner/runtime tests.

use crate::error::EvalError;
use crate::state::ExecContext;
use crate::types::Value;

pub const MAX_FILTER_INPUTS: usize = 4;

/// Inputs arrive in port declaration order.
pub type Kernel =
    fn(ctx: &ExecContext<'_>, inputs: &[&Value], p: &FilterParam) -> Result<Value, EvalError>;

pub mod arg_spec;
pub mod catalog;
pub mod spec;

mod binary;
mod derived;
mod leaf;
mod reduce;

pub use arg_spec::{FilterParam, ParamSpec, RawParams};
pub use catalog::{FilterMeta, FilterRegistry, PortSpec};
pub use spec::{FilterFamily, FilterKind, NumericDomain, Operator, OperatorClass};

pub use binary::binary_op;
pub use derived::{cycle, magnitude, position, vector};
pub use leaf::{double, field_ref, identifier, integer, null_arg};
pub use reduce::{field_avg, field_max, field_min, histogram, scalar_max, scalar_min};

/// Required input; the empty sentinel counts as not supplied.
#[inline]
fn arg<'v>(
    inputs: &[&'v Value],
    idx: usize,
    filter: &'static str,
    port: &'static str,
) -> Result<&'v Value, EvalError> {
    match inputs.get(idx).copied() {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(EvalError::TypeMismatch {
            filter,
            reason: format!("input `{port}` was not supplied"),
        }),
    }
}

/// Optional input; `None` for the empty sentinel.
#[inline]
fn optional_arg<'v>(inputs: &[&'v Value], idx: usize) -> Option<&'v Value> {
    inputs.get(idx).copied().filter(|value| !value.is_empty())
}

#[inline]
fn scalar_arg(
    inputs: &[&Value],
    idx: usize,
    filter: &'static str,
    port: &'static str,
) -> Result<crate::types::Number, EvalError> {
    let value = arg(inputs, idx, filter, port)?;
    value.as_number().ok_or_else(|| EvalError::TypeMismatch {
        filter,
        reason: format!("input `{port}` must be a scalar, got {}", value.kind()),
    })
}
