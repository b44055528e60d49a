use crate::ops::spec::Operator;
use serde_json::{Map, Value as JsonValue};

pub type RawParams = Map<String, JsonValue>;

const VALUE_KEY: &str = "value";
const OP_KEY: &str = "op_string";

/// Validated filter parameter, carried into the plan.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterParam {
    None,
    Name(String),
    Int(i32),
    Float(f64),
    Op(Operator),
}

impl FilterParam {
    #[inline]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            _ => None,
        }
    }

    #[inline]
    pub const fn int(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    #[inline]
    pub const fn float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    #[inline]
    pub const fn op(&self) -> Option<Operator> {
        match self {
            Self::Op(op) => Some(*op),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamSpec {
    /// Filter takes no parameters.
    None,
    /// Required non-empty string `value`.
    Name,
    /// Required numeric `value`, stored as i32.
    Int,
    /// Required numeric `value`, stored as f64.
    Float,
    /// Required `op_string` token.
    Op,
}

impl ParamSpec {
    pub const fn keys(self) -> &'static [&'static str] {
        match self {
            Self::None => &[],
            Self::Name | Self::Int | Self::Float => &[VALUE_KEY],
            Self::Op => &[OP_KEY],
        }
    }

    /// Checks `params`, pushing every problem into `violations`.
    ///
    /// Returns `None` when at least one violation was found.
    pub fn validate(self, params: &RawParams, violations: &mut Vec<String>) -> Option<FilterParam> {
        let before = violations.len();
        for key in params.keys() {
            if !self.keys().contains(&key.as_str()) {
                violations.push(format!("unexpected parameter '{key}'"));
            }
        }
        let param = match self {
            Self::None => Some(FilterParam::None),
            Self::Name => parse_name(params, violations),
            Self::Int => parse_int(params, violations),
            Self::Float => parse_float(params, violations),
            Self::Op => parse_op(params, violations),
        };
        if violations.len() == before {
            param
        } else {
            None
        }
    }
}

fn parse_name(params: &RawParams, violations: &mut Vec<String>) -> Option<FilterParam> {
    match params.get(VALUE_KEY) {
        None => {
            violations.push(format!("missing required string parameter '{VALUE_KEY}'"));
            None
        }
        Some(JsonValue::String(name)) if !name.trim().is_empty() => {
            Some(FilterParam::Name(name.clone()))
        }
        Some(JsonValue::String(_)) => {
            violations.push(format!("string parameter '{VALUE_KEY}' must not be empty"));
            None
        }
        Some(other) => {
            violations.push(format!(
                "parameter '{VALUE_KEY}' must be a string, got `{other}`"
            ));
            None
        }
    }
}

fn parse_int(params: &RawParams, violations: &mut Vec<String>) -> Option<FilterParam> {
    let raw = required_number(params, violations)?;
    if let Some(v) = raw.as_i64() {
        return match i32::try_from(v) {
            Ok(v) => Some(FilterParam::Int(v)),
            Err(_) => {
                violations.push(format!("integer parameter '{VALUE_KEY}' out of range: {v}"));
                None
            }
        };
    }
    match raw.as_f64() {
        Some(v) if v.is_finite() && v >= f64::from(i32::MIN) && v <= f64::from(i32::MAX) => {
            Some(FilterParam::Int(v.trunc() as i32))
        }
        _ => {
            violations.push(format!("integer parameter '{VALUE_KEY}' out of range: {raw}"));
            None
        }
    }
}

fn parse_float(params: &RawParams, violations: &mut Vec<String>) -> Option<FilterParam> {
    let raw = required_number(params, violations)?;
    match raw.as_f64() {
        Some(v) => Some(FilterParam::Float(v)),
        None => {
            violations.push(format!("numeric parameter '{VALUE_KEY}' is not representable: {raw}"));
            None
        }
    }
}

fn required_number<'p>(
    params: &'p RawParams,
    violations: &mut Vec<String>,
) -> Option<&'p serde_json::Number> {
    match params.get(VALUE_KEY) {
        None => {
            violations.push(format!("missing required numeric parameter '{VALUE_KEY}'"));
            None
        }
        Some(JsonValue::Number(n)) => Some(n),
        Some(other) => {
            violations.push(format!(
                "parameter '{VALUE_KEY}' must be numeric, got `{other}`"
            ));
            None
        }
    }
}

fn parse_op(params: &RawParams, violations: &mut Vec<String>) -> Option<FilterParam> {
    match params.get(OP_KEY) {
        None => {
            violations.push(format!("missing required string parameter '{OP_KEY}'"));
            None
        }
        Some(JsonValue::String(token)) => match Operator::from_token(token) {
            Some(op) => Some(FilterParam::Op(op)),
            None => {
                violations.push(format!("unsupported operator `{token}`"));
                None
            }
        },
        Some(other) => {
            violations.push(format!("parameter '{OP_KEY}' must be a string, got `{other}`"));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn to_params(raw: JsonValue) -> RawParams {
        match raw {
            JsonValue::Object(map) => map,
            _ => panic!("params must be an object"),
        }
    }

    #[test]
    fn int_truncates_floats_and_rejects_out_of_range() {
        let mut violations = Vec::new();
        let param = ParamSpec::Int.validate(&to_params(json!({"value": 7.9})), &mut violations);
        assert_eq!(param, Some(FilterParam::Int(7)));

        let param = ParamSpec::Int.validate(
            &to_params(json!({"value": 5_000_000_000_i64})),
            &mut violations,
        );
        assert_eq!(param, None);
        assert_eq!(violations.len(), 1);
    }

    #[test]
    fn op_token_is_resolved_once() {
        let mut violations = Vec::new();
        let param =
            ParamSpec::Op.validate(&to_params(json!({"op_string": "<="})), &mut violations);
        assert_eq!(param, Some(FilterParam::Op(Operator::Le)));

        let param = ParamSpec::Op.validate(&to_params(json!({"op_string": "%"})), &mut violations);
        assert_eq!(param, None);
        assert!(violations[0].contains("unsupported operator"));
    }

    #[test]
    fn all_problems_are_collected() {
        let mut violations = Vec::new();
        let param = ParamSpec::Name.validate(
            &to_params(json!({"name": "x", "extra": 1})),
            &mut violations,
        );
        assert_eq!(param, None);
        // two unexpected keys plus the missing `value`
        assert_eq!(violations.len(), 3);
    }

    #[test]
    fn name_rejects_non_strings() {
        let mut violations = Vec::new();
        assert_eq!(
            ParamSpec::Name.validate(&to_params(json!({"value": 3})), &mut violations),
            None
        );
        assert_eq!(
            ParamSpec::Name.validate(&to_params(json!({"value": ""})), &mut violations),
            None
        );
        assert_eq!(violations.len(), 2);
    }

    #[test]
    fn none_spec_accepts_empty_params_only() {
        let mut violations = Vec::new();
        assert_eq!(
            ParamSpec::None.validate(&RawParams::new(), &mut violations),
            Some(FilterParam::None)
        );
        assert_eq!(
            ParamSpec::None.validate(&to_params(json!({"value": 1})), &mut violations),
            None
        );
    }
}
