use crate::types::Number;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterFamily {
    Leaf,
    Operator,
    Reduction,
    Derived,
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKind {
    NullArg,
    Identifier,
    Integer,
    Double,
    FieldRef,
    BinaryOp,
    ScalarMin,
    ScalarMax,
    FieldMin,
    FieldMax,
    FieldAvg,
    Histogram,
    Position,
    Cycle,
    Vector,
    Magnitude,
}

impl FilterKind {
    pub const COUNT: usize = Self::Magnitude as usize + 1;

    #[inline]
    pub const fn as_usize(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorClass {
    Arithmetic,
    Comparison,
}

/// Closed set of binary operator tokens, resolved once during validation.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
}

impl Operator {
    pub const COUNT: usize = Self::Eq as usize + 1;

    pub const ALL: [Self; Self::COUNT] = [
        Self::Add,
        Self::Sub,
        Self::Mul,
        Self::Div,
        Self::Lt,
        Self::Le,
        Self::Gt,
        Self::Ge,
        Self::Eq,
    ];

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.token() == token)
    }

    pub const fn token(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Eq => "==",
        }
    }

    pub const fn class(self) -> OperatorClass {
        match self {
            Self::Add | Self::Sub | Self::Mul | Self::Div => OperatorClass::Arithmetic,
            Self::Lt | Self::Le | Self::Gt | Self::Ge | Self::Eq => OperatorClass::Comparison,
        }
    }

    #[inline]
    pub const fn as_usize(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Numeric type a scalar operation is carried out in.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericDomain {
    Int,
    Float,
}

impl NumericDomain {
    pub const COUNT: usize = 2;

    /// Float as soon as either operand is floating point.
    #[inline]
    pub const fn of(lhs: Number, rhs: Number) -> Self {
        if lhs.is_float() || rhs.is_float() {
            Self::Float
        } else {
            Self::Int
        }
    }

    #[inline]
    pub const fn as_usize(self) -> usize {
        self as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_operator_token_round_trips() {
        for op in Operator::ALL {
            assert_eq!(Operator::from_token(op.token()), Some(op));
        }
        assert_eq!(Operator::from_token("!="), None);
        assert_eq!(Operator::from_token("=="), Some(Operator::Eq));
    }

    #[test]
    fn promotion_is_float_when_either_side_is_float() {
        assert_eq!(
            NumericDomain::of(Number::Int(1), Number::Int(2)),
            NumericDomain::Int
        );
        assert_eq!(
            NumericDomain::of(Number::Int(1), Number::Float(2.0)),
            NumericDomain::Float
        );
        assert_eq!(
            NumericDomain::of(Number::Float(1.0), Number::Int(2)),
            NumericDomain::Float
        );
    }
}
