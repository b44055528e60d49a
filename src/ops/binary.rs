use crate::error::EvalError;
use crate::ops::{arg, FilterParam, NumericDomain, Operator, OperatorClass};
use crate::state::ExecContext;
use crate::types::{Number, Payload, Value};

const FILTER: &str = "expr_binary_op";
const LHS: usize = 0;
const RHS: usize = 1;

type ScalarKernel = fn(Number, Number) -> Result<Value, EvalError>;
type VectorKernel = fn([f64; 3], [f64; 3]) -> [f64; 3];

/// Scalar dispatch keyed by `(operator, numeric domain)`.
const SCALAR_TABLE: [[ScalarKernel; NumericDomain::COUNT]; Operator::COUNT] = [
    [int_add, float_add],
    [int_sub, float_sub],
    [int_mul, float_mul],
    [int_div, float_div],
    [int_lt, float_lt],
    [int_le, float_le],
    [int_gt, float_gt],
    [int_ge, float_ge],
    [int_eq, float_eq],
];

pub fn binary_op(
    _ctx: &ExecContext<'_>,
    inputs: &[&Value],
    p: &FilterParam,
) -> Result<Value, EvalError> {
    let op = p.op().ok_or(EvalError::ParamKindMismatch {
        filter: FILTER,
        expected: "operator",
    })?;
    let lhs = arg(inputs, LHS, FILTER, "lhs")?;
    let rhs = arg(inputs, RHS, FILTER, "rhs")?;
    apply(op, lhs, rhs)
}

/// Applies `op`; booleans take part as integer 0/1, then int/float promotion applies.
fn apply(op: Operator, lhs: &Value, rhs: &Value) -> Result<Value, EvalError> {
    match (&lhs.payload, &rhs.payload) {
        (Payload::Vector(a), Payload::Vector(b)) => {
            let kernel = vector_kernel(op)?;
            Ok(Value::vector(kernel(*a, *b)))
        }
        (Payload::Vector(_), _) | (_, Payload::Vector(_)) => Err(EvalError::TypeMismatch {
            filter: FILTER,
            reason: format!(
                "mixed vector and scalar operands ({} {op} {})",
                lhs.kind(),
                rhs.kind()
            ),
        }),
        _ => match (lhs.as_numeric(), rhs.as_numeric()) {
            (Some(a), Some(b)) => {
                let domain = NumericDomain::of(a, b);
                SCALAR_TABLE[op.as_usize()][domain.as_usize()](a, b)
            }
            _ => Err(EvalError::TypeMismatch {
                filter: FILTER,
                reason: format!(
                    "operator `{op}` needs scalar or vector operands, got {} and {}",
                    lhs.kind(),
                    rhs.kind()
                ),
            }),
        },
    }
}

fn vector_kernel(op: Operator) -> Result<VectorKernel, EvalError> {
    match op {
        Operator::Add => Ok(vector_add),
        Operator::Sub => Ok(vector_sub),
        Operator::Mul | Operator::Div => Err(unsupported_on_vectors(op)),
        Operator::Lt | Operator::Le | Operator::Gt | Operator::Ge | Operator::Eq => {
            Err(unsupported_on_vectors(op))
        }
    }
}

fn unsupported_on_vectors(op: Operator) -> EvalError {
    let reason = match op.class() {
        OperatorClass::Arithmetic => "only `+` and `-` are defined between vectors",
        OperatorClass::Comparison => "comparison operators are not defined on vectors",
    };
    EvalError::UnsupportedOperator {
        op: op.token().to_string(),
        reason,
    }
}

fn vector_add(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

fn vector_sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
fn checked_int(
    result: Option<i32>,
    lhs: i32,
    op: &'static str,
    rhs: i32,
) -> Result<Value, EvalError> {
    result
        .map(Value::int)
        .ok_or(EvalError::IntegerOverflow { lhs, op, rhs })
}

fn int_add(a: Number, b: Number) -> Result<Value, EvalError> {
    let (a, b) = (a.to_i32(), b.to_i32());
    checked_int(a.checked_add(b), a, "+", b)
}

fn int_sub(a: Number, b: Number) -> Result<Value, EvalError> {
    let (a, b) = (a.to_i32(), b.to_i32());
    checked_int(a.checked_sub(b), a, "-", b)
}

fn int_mul(a: Number, b: Number) -> Result<Value, EvalError> {
    let (a, b) = (a.to_i32(), b.to_i32());
    checked_int(a.checked_mul(b), a, "*", b)
}

/// Truncates toward zero.
fn int_div(a: Number, b: Number) -> Result<Value, EvalError> {
    let (a, b) = (a.to_i32(), b.to_i32());
    if b == 0 {
        return Err(EvalError::DivisionByZero);
    }
    checked_int(a.checked_div(b), a, "/", b)
}

fn float_add(a: Number, b: Number) -> Result<Value, EvalError> {
    Ok(Value::float(a.to_f64() + b.to_f64()))
}

fn float_sub(a: Number, b: Number) -> Result<Value, EvalError> {
    Ok(Value::float(a.to_f64() - b.to_f64()))
}

fn float_mul(a: Number, b: Number) -> Result<Value, EvalError> {
    Ok(Value::float(a.to_f64() * b.to_f64()))
}

fn float_div(a: Number, b: Number) -> Result<Value, EvalError> {
    Ok(Value::float(a.to_f64() / b.to_f64()))
}

fn int_lt(a: Number, b: Number) -> Result<Value, EvalError> {
    Ok(Value::boolean(a.to_i32() < b.to_i32()))
}

fn int_le(a: Number, b: Number) -> Result<Value, EvalError> {
    Ok(Value::boolean(a.to_i32() <= b.to_i32()))
}

fn int_gt(a: Number, b: Number) -> Result<Value, EvalError> {
    Ok(Value::boolean(a.to_i32() > b.to_i32()))
}

fn int_ge(a: Number, b: Number) -> Result<Value, EvalError> {
    Ok(Value::boolean(a.to_i32() >= b.to_i32()))
}

fn int_eq(a: Number, b: Number) -> Result<Value, EvalError> {
    Ok(Value::boolean(a.to_i32() == b.to_i32()))
}

fn float_lt(a: Number, b: Number) -> Result<Value, EvalError> {
    Ok(Value::boolean(a.to_f64() < b.to_f64()))
}

fn float_le(a: Number, b: Number) -> Result<Value, EvalError> {
    Ok(Value::boolean(a.to_f64() <= b.to_f64()))
}

fn float_gt(a: Number, b: Number) -> Result<Value, EvalError> {
    Ok(Value::boolean(a.to_f64() > b.to_f64()))
}

fn float_ge(a: Number, b: Number) -> Result<Value, EvalError> {
    Ok(Value::boolean(a.to_f64() >= b.to_f64()))
}

fn float_eq(a: Number, b: Number) -> Result<Value, EvalError> {
    Ok(Value::boolean(a.to_f64() == b.to_f64()))
}
