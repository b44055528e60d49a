use crate::dataset::{Dataset, Extremum};
use crate::error::EvalError;
use crate::ops::{arg, optional_arg, FilterParam, NumericDomain};
use crate::state::ExecContext;
use crate::types::{
    Attribute, Histogram, Number, Value, DEFAULT_NUM_BINS, MAX_NUM_BINS, MAX_VAL_ATTR,
    MIN_VAL_ATTR, NUM_BINS_ATTR, POSITION_ATTR,
};
use tracing::debug;

const ARG1: usize = 0;
const ARG2: usize = 1;

const HIST_FIELD: usize = 0;
const HIST_NUM_BINS: usize = 1;
const HIST_MIN_VAL: usize = 2;
const HIST_MAX_VAL: usize = 3;

pub fn scalar_min(
    _ctx: &ExecContext<'_>,
    inputs: &[&Value],
    _p: &FilterParam,
) -> Result<Value, EvalError> {
    let (a, b) = scalar_pair(inputs, "scalar_min")?;
    Ok(match NumericDomain::of(a, b) {
        NumericDomain::Int => Value::int(a.to_i32().min(b.to_i32())),
        NumericDomain::Float => Value::float(a.to_f64().min(b.to_f64())),
    })
}

pub fn scalar_max(
    _ctx: &ExecContext<'_>,
    inputs: &[&Value],
    _p: &FilterParam,
) -> Result<Value, EvalError> {
    let (a, b) = scalar_pair(inputs, "scalar_max")?;
    Ok(match NumericDomain::of(a, b) {
        NumericDomain::Int => Value::int(a.to_i32().max(b.to_i32())),
        NumericDomain::Float => Value::float(a.to_f64().max(b.to_f64())),
    })
}

fn scalar_pair(inputs: &[&Value], filter: &'static str) -> Result<(Number, Number), EvalError> {
    let a = numeric_arg(inputs, ARG1, filter, "arg1")?;
    let b = numeric_arg(inputs, ARG2, filter, "arg2")?;
    Ok((a, b))
}

/// Scalar or boolean (as 0/1) input.
fn numeric_arg(
    inputs: &[&Value],
    idx: usize,
    filter: &'static str,
    port: &'static str,
) -> Result<Number, EvalError> {
    let value = arg(inputs, idx, filter, port)?;
    value.as_numeric().ok_or_else(|| EvalError::TypeMismatch {
        filter,
        reason: format!("input `{port}` must be a scalar, got {}", value.kind()),
    })
}

pub fn field_min(
    ctx: &ExecContext<'_>,
    inputs: &[&Value],
    _p: &FilterParam,
) -> Result<Value, EvalError> {
    let (dataset, field) = resolve_scalar_field(ctx, inputs, ARG1, "field_min", "arg1")?;
    debug!(field, "collective field min");
    Ok(located(dataset.field_min(field)?))
}

pub fn field_max(
    ctx: &ExecContext<'_>,
    inputs: &[&Value],
    _p: &FilterParam,
) -> Result<Value, EvalError> {
    let (dataset, field) = resolve_scalar_field(ctx, inputs, ARG1, "field_max", "arg1")?;
    debug!(field, "collective field max");
    Ok(located(dataset.field_max(field)?))
}

pub fn field_avg(
    ctx: &ExecContext<'_>,
    inputs: &[&Value],
    _p: &FilterParam,
) -> Result<Value, EvalError> {
    let (dataset, field) = resolve_scalar_field(ctx, inputs, ARG1, "field_avg", "arg1")?;
    debug!(field, "collective field average");
    Ok(Value::float(dataset.field_avg(field)?))
}

/// Histogram over `[min_val, max_val)`; omitted bounds come from the field's global extrema.
pub fn histogram(
    ctx: &ExecContext<'_>,
    inputs: &[&Value],
    _p: &FilterParam,
) -> Result<Value, EvalError> {
    const FILTER: &str = "histogram";
    let (dataset, field) = resolve_scalar_field(ctx, inputs, HIST_FIELD, FILTER, "field")?;

    let num_bins = match optional_scalar(inputs, HIST_NUM_BINS, FILTER, "num_bins")? {
        Some(n) => n.to_i32(),
        None => DEFAULT_NUM_BINS,
    };
    // Defaults are resolved max first, then min, on every rank alike.
    let max_val = match optional_scalar(inputs, HIST_MAX_VAL, FILTER, "max_val")? {
        Some(n) => n.to_f64(),
        None => dataset.field_max(field)?.value,
    };
    let min_val = match optional_scalar(inputs, HIST_MIN_VAL, FILTER, "min_val")? {
        Some(n) => n.to_f64(),
        None => dataset.field_min(field)?.value,
    };
    if !(min_val < max_val) {
        return Err(EvalError::Range {
            filter: FILTER,
            min_val,
            max_val,
        });
    }
    let bins = usize::try_from(num_bins)
        .ok()
        .filter(|_| (1..=MAX_NUM_BINS).contains(&num_bins))
        .ok_or(EvalError::InvalidBinCount {
            filter: FILTER,
            num_bins,
        })?;

    debug!(field, num_bins, min_val, max_val, "collective field histogram");
    let counts = dataset.field_histogram(field, min_val, max_val, bins)?;
    Ok(Value::histogram(Histogram {
        counts,
        min_val,
        max_val,
        num_bins,
    })
    .with_attr(MIN_VAL_ATTR, Attribute::Number(Number::Float(min_val)))
    .with_attr(MAX_VAL_ATTR, Attribute::Number(Number::Float(max_val)))
    .with_attr(NUM_BINS_ATTR, Attribute::Number(Number::Int(num_bins))))
}

fn located(extremum: Extremum) -> Value {
    Value::float(extremum.value).with_attr(POSITION_ATTR, Attribute::Vector(extremum.position))
}

fn optional_scalar(
    inputs: &[&Value],
    idx: usize,
    filter: &'static str,
    port: &'static str,
) -> Result<Option<Number>, EvalError> {
    match optional_arg(inputs, idx) {
        None => Ok(None),
        Some(value) => value.as_number().map(Some).ok_or_else(|| EvalError::TypeMismatch {
            filter,
            reason: format!("input `{port}` must be a scalar, got {}", value.kind()),
        }),
    }
}

/// Checks the dataset, field existence and field arity before any collective call.
fn resolve_scalar_field<'a, 'v>(
    ctx: &ExecContext<'a>,
    inputs: &[&'v Value],
    idx: usize,
    filter: &'static str,
    port: &'static str,
) -> Result<(&'a dyn Dataset, &'v str), EvalError> {
    let input = arg(inputs, idx, filter, port)?;
    let field = input.as_field_ref().ok_or_else(|| EvalError::TypeMismatch {
        filter,
        reason: format!("input `{port}` must name a field, got {}", input.kind()),
    })?;
    let dataset = ctx.dataset(filter)?;
    if !dataset.has_field(field) {
        return Err(EvalError::UnknownField {
            filter,
            field: field.to_string(),
            known: dataset.field_names(),
        });
    }
    if !dataset.is_scalar_field(field) {
        return Err(EvalError::NonScalarField {
            filter,
            field: field.to_string(),
        });
    }
    Ok((dataset, field))
}
