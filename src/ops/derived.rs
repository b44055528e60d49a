use crate::dataset::StateValue;
use crate::error::EvalError;
use crate::ops::{arg, scalar_arg, FilterParam};
use crate::state::ExecContext;
use crate::types::Value;

const ARG1: usize = 0;
const ARG2: usize = 1;
const ARG3: usize = 2;

pub fn position(
    _ctx: &ExecContext<'_>,
    inputs: &[&Value],
    _p: &FilterParam,
) -> Result<Value, EvalError> {
    const FILTER: &str = "expr_position";
    let input = arg(inputs, ARG1, FILTER, "arg1")?;
    let position = input.position().ok_or(EvalError::MissingAttribute {
        filter: FILTER,
        attribute: "position",
    })?;
    Ok(Value::vector(position))
}

pub fn cycle(
    ctx: &ExecContext<'_>,
    _inputs: &[&Value],
    _p: &FilterParam,
) -> Result<Value, EvalError> {
    const FILTER: &str = "cycle";
    let dataset = ctx.dataset(FILTER)?;
    let name = ctx.cycle_state_var();
    match dataset.state_var(name) {
        Some(StateValue::Number(n)) => Ok(Value::scalar(n)),
        Some(StateValue::Text(_)) => Err(EvalError::NonNumericStateVar {
            filter: FILTER,
            name: name.to_string(),
        }),
        None => Err(EvalError::MissingStateVar {
            filter: FILTER,
            name: name.to_string(),
        }),
    }
}

pub fn vector(
    _ctx: &ExecContext<'_>,
    inputs: &[&Value],
    _p: &FilterParam,
) -> Result<Value, EvalError> {
    const FILTER: &str = "vector";
    let x = scalar_arg(inputs, ARG1, FILTER, "arg1")?;
    let y = scalar_arg(inputs, ARG2, FILTER, "arg2")?;
    let z = scalar_arg(inputs, ARG3, FILTER, "arg3")?;
    Ok(Value::vector([x.to_f64(), y.to_f64(), z.to_f64()]))
}

pub fn magnitude(
    _ctx: &ExecContext<'_>,
    inputs: &[&Value],
    _p: &FilterParam,
) -> Result<Value, EvalError> {
    const FILTER: &str = "magnitude";
    let input = arg(inputs, ARG1, FILTER, "arg1")?;
    let [x, y, z] = input.as_vector().ok_or_else(|| EvalError::TypeMismatch {
        filter: FILTER,
        reason: format!("input must be a vector, got {}", input.kind()),
    })?;
    Ok(Value::float((x * x + y * y + z * z).sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Dataset, MeshDataset};
    use crate::state::HistoryCache;
    use crate::types::{Attribute, Number, POSITION_ATTR};

    fn run(
        kernel: crate::ops::Kernel,
        dataset: Option<&dyn Dataset>,
        inputs: &[Value],
    ) -> Result<Value, EvalError> {
        let cache = HistoryCache::new();
        let ctx = ExecContext::new(&cache).with_dataset(dataset);
        let refs = inputs.iter().collect::<Vec<_>>();
        kernel(&ctx, &refs, &FilterParam::None)
    }

    #[test]
    fn magnitude_of_three_four_zero_is_exactly_five() {
        let out = run(magnitude, None, &[Value::vector([3.0, 4.0, 0.0])]).expect("magnitude");
        assert_eq!(out.as_number(), Some(Number::Float(5.0)));
    }

    #[test]
    fn magnitude_rejects_scalars() {
        let err = run(magnitude, None, &[Value::float(5.0)]).expect_err("scalar");
        assert!(matches!(err, EvalError::TypeMismatch { .. }));
    }

    #[test]
    fn vector_converts_components_to_float() {
        let out = run(
            vector,
            None,
            &[Value::int(1), Value::float(-2.5), Value::int(3)],
        )
        .expect("vector");
        assert_eq!(out.as_vector(), Some([1.0, -2.5, 3.0]));
    }

    #[test]
    fn vector_rejects_non_scalar_components() {
        let err = run(
            vector,
            None,
            &[Value::int(1), Value::boolean(true), Value::int(3)],
        )
        .expect_err("boolean component");
        assert!(matches!(err, EvalError::TypeMismatch { .. }));
    }

    #[test]
    fn position_reads_stored_attribute() {
        let located =
            Value::float(9.0).with_attr(POSITION_ATTR, Attribute::Vector([1.0, 2.0, 3.0]));
        let out = run(position, None, &[located]).expect("position");
        assert_eq!(out.as_vector(), Some([1.0, 2.0, 3.0]));

        let err = run(position, None, &[Value::float(9.0)]).expect_err("no attribute");
        assert!(matches!(err, EvalError::MissingAttribute { .. }));
    }

    #[test]
    fn cycle_reads_numeric_state_variable() {
        let mut ds = MeshDataset::new();
        let err = run(cycle, Some(&ds), &[]).expect_err("no cycle yet");
        assert!(matches!(err, EvalError::MissingStateVar { .. }));

        ds.set_cycle(100);
        let out = run(cycle, Some(&ds), &[]).expect("cycle");
        assert_eq!(out.as_number(), Some(Number::Int(100)));

        ds.set_state("cycle", StateValue::Text("one hundred".to_string()));
        let err = run(cycle, Some(&ds), &[]).expect_err("text cycle");
        assert!(matches!(err, EvalError::NonNumericStateVar { .. }));

        let err = run(cycle, None, &[]).expect_err("no dataset");
        assert!(matches!(err, EvalError::MissingDataset { filter: "cycle" }));
    }
}
