use crate::Variant;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CompareOp {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl CompareOp {
    pub fn apply(self, a: f32, b: f32) -> bool {
        match self {
            CompareOp::Equal => a == b,
            CompareOp::NotEqual => a != b,
            CompareOp::Less => a < b,
            CompareOp::LessEqual => a <= b,
            CompareOp::Greater => a > b,
            CompareOp::GreaterEqual => a >= b,
        }
    }
}

/// Compare two knowledge values.
///
/// Operands are coerced to floats (booleans to 0/1, integers to their value). When only one side
/// has a numeric view the other becomes NaN, so every ordered predicate and `Equal` are false and
/// `NotEqual` is true. When neither side is numeric, `Equal`/`NotEqual` fall back to structural
/// equality and ordered predicates are false.
pub fn compare(a: &Variant, b: &Variant, op: CompareOp) -> bool {
    match (a.as_f32(), b.as_f32()) {
        (None, None) => match op {
            CompareOp::Equal => a == b,
            CompareOp::NotEqual => a != b,
            _ => false,
        },
        (x, y) => op.apply(x.unwrap_or(f32::NAN), y.unwrap_or(f32::NAN)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Vec3;

    #[test]
    fn numeric_coercion() {
        assert!(compare(&Variant::Bool(true), &Variant::Int(1), CompareOp::Equal));
        assert!(compare(&Variant::Int(2), &Variant::Float(2.5), CompareOp::Less));
        assert!(compare(&Variant::Float(3.0), &Variant::Float(3.0), CompareOp::GreaterEqual));
    }

    #[test]
    fn mixed_shapes_behave_like_nan() {
        let s = Variant::from("a");
        let n = Variant::Float(1.0);
        for op in [
            CompareOp::Equal,
            CompareOp::Less,
            CompareOp::LessEqual,
            CompareOp::Greater,
            CompareOp::GreaterEqual,
        ] {
            assert!(!compare(&s, &n, op));
        }
        assert!(compare(&s, &n, CompareOp::NotEqual));
    }

    #[test]
    fn non_numeric_pairs_use_structural_equality() {
        let a = Variant::Vector(Vec3::new(1.0, 2.0, 3.0));
        assert!(compare(&a, &a.clone(), CompareOp::Equal));
        assert!(!compare(&a, &a.clone(), CompareOp::Less));
        assert!(compare(&a, &Variant::from("x"), CompareOp::NotEqual));
    }
}
