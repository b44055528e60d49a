use crate::error::EvalError;
use crate::ops::FilterParam;
use crate::state::ExecContext;
use crate::types::Value;

pub fn null_arg(
    _ctx: &ExecContext<'_>,
    _inputs: &[&Value],
    _p: &FilterParam,
) -> Result<Value, EvalError> {
    Ok(Value::empty())
}

/// Most recent history entry recorded under the identifier, verbatim.
pub fn identifier(
    ctx: &ExecContext<'_>,
    _inputs: &[&Value],
    p: &FilterParam,
) -> Result<Value, EvalError> {
    let name = p.name().ok_or(EvalError::ParamKindMismatch {
        filter: "expr_identifier",
        expected: "name",
    })?;
    let entries = ctx
        .history()
        .history(name)
        .ok_or_else(|| EvalError::UnknownIdentifier {
            name: name.to_string(),
        })?;
    entries
        .last()
        .cloned()
        .ok_or_else(|| EvalError::EmptyHistory {
            name: name.to_string(),
        })
}

pub fn integer(
    _ctx: &ExecContext<'_>,
    _inputs: &[&Value],
    p: &FilterParam,
) -> Result<Value, EvalError> {
    let value = p.int().ok_or(EvalError::ParamKindMismatch {
        filter: "expr_integer",
        expected: "int",
    })?;
    Ok(Value::int(value))
}

pub fn double(
    _ctx: &ExecContext<'_>,
    _inputs: &[&Value],
    p: &FilterParam,
) -> Result<Value, EvalError> {
    let value = p.float().ok_or(EvalError::ParamKindMismatch {
        filter: "expr_double",
        expected: "float",
    })?;
    Ok(Value::float(value))
}

pub fn field_ref(
    _ctx: &ExecContext<'_>,
    _inputs: &[&Value],
    p: &FilterParam,
) -> Result<Value, EvalError> {
    let name = p.name().ok_or(EvalError::ParamKindMismatch {
        filter: "expr_meshvar",
        expected: "name",
    })?;
    Ok(Value::field_ref(name))
}
