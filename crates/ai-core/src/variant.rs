//! Dynamically typed values stored in behavior knowledge (blackboards, goals, sensors).

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Vec3;

/// A named record: the shape of blackboards and goals.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Structure {
    pub type_name: String,
    pub fields: BTreeMap<String, Variant>,
}

impl Structure {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Variant>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&Variant> {
        self.fields.get(name)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Variant {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f32),
    Vector(Vec3),
    String(String),
    /// Reference to an actor by its stable id.
    Actor(u64),
    Structure(Structure),
}

impl Variant {
    /// Type name used for blackboard/goal assignability checks.
    pub fn type_name(&self) -> &str {
        match self {
            Variant::Null => "null",
            Variant::Bool(_) => "bool",
            Variant::Int(_) => "int",
            Variant::Float(_) => "float",
            Variant::Vector(_) => "vector3",
            Variant::String(_) => "string",
            Variant::Actor(_) => "actor",
            Variant::Structure(s) => &s.type_name,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Variant::Null)
    }

    /// Numeric view: booleans map to 0/1, integers to their value. Other shapes have none.
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Variant::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Variant::Int(i) => Some(*i as f32),
            Variant::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_vec3(&self) -> Option<Vec3> {
        match self {
            Variant::Vector(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_actor(&self) -> Option<u64> {
        match self {
            Variant::Actor(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_structure(&self) -> Option<&Structure> {
        match self {
            Variant::Structure(s) => Some(s),
            _ => None,
        }
    }

    /// Truthiness used by boolean predicates.
    pub fn is_truthy(&self) -> bool {
        match self {
            Variant::Null => false,
            Variant::Bool(b) => *b,
            Variant::Int(i) => *i != 0,
            Variant::Float(f) => *f != 0.0,
            Variant::Vector(v) => *v != Vec3::ZERO,
            Variant::String(s) => !s.is_empty(),
            Variant::Actor(_) | Variant::Structure(_) => true,
        }
    }

    /// Resolve a chain of field names below this value.
    ///
    /// Structures are addressed by field name, vectors by `x`/`y`/`z`.
    pub fn get_path(&self, path: &[&str]) -> Option<Variant> {
        let Some((segment, rest)) = path.split_first() else {
            return Some(self.clone());
        };
        match self {
            Variant::Structure(s) => s.fields.get(*segment)?.get_path(rest),
            Variant::Vector(v) if rest.is_empty() => {
                vector_component(*v, segment).map(Variant::Float)
            }
            _ => None,
        }
    }

    /// Write `value` at a chain of field names below this value.
    ///
    /// The target must already exist and accept the value's shape; otherwise nothing changes and
    /// `false` is returned.
    pub fn set_path(&mut self, path: &[&str], value: Variant) -> bool {
        let Some((segment, rest)) = path.split_first() else {
            return self.assign(value);
        };
        match self {
            Variant::Structure(s) => match s.fields.get_mut(*segment) {
                Some(field) => field.set_path(rest, value),
                None => false,
            },
            Variant::Vector(v) if rest.is_empty() => {
                let Some(component) = value.as_f32() else {
                    return false;
                };
                match *segment {
                    "x" | "X" => v.x = component,
                    "y" | "Y" => v.y = component,
                    "z" | "Z" => v.z = component,
                    _ => return false,
                }
                true
            }
            _ => false,
        }
    }

    /// Replace this value if `value` has a compatible shape.
    ///
    /// `Null` slots accept anything; floats accept any numeric value; structures require the same
    /// type name.
    pub fn assign(&mut self, value: Variant) -> bool {
        let value = match (&*self, value) {
            (Variant::Null, value) => value,
            (Variant::Float(_), value) => match value.as_f32() {
                Some(f) => Variant::Float(f),
                None => return false,
            },
            (Variant::Structure(a), Variant::Structure(b)) => {
                if a.type_name != b.type_name {
                    return false;
                }
                Variant::Structure(b)
            }
            (current, value) => {
                if core::mem::discriminant(current) != core::mem::discriminant(&value) {
                    return false;
                }
                value
            }
        };
        *self = value;
        true
    }
}

fn vector_component(v: Vec3, name: &str) -> Option<f32> {
    match name {
        "x" | "X" => Some(v.x),
        "y" | "Y" => Some(v.y),
        "z" | "Z" => Some(v.z),
        _ => None,
    }
}

impl From<bool> for Variant {
    fn from(value: bool) -> Self {
        Variant::Bool(value)
    }
}

impl From<i64> for Variant {
    fn from(value: i64) -> Self {
        Variant::Int(value)
    }
}

impl From<i32> for Variant {
    fn from(value: i32) -> Self {
        Variant::Int(value as i64)
    }
}

impl From<f32> for Variant {
    fn from(value: f32) -> Self {
        Variant::Float(value)
    }
}

impl From<Vec3> for Variant {
    fn from(value: Vec3) -> Self {
        Variant::Vector(value)
    }
}

impl From<&str> for Variant {
    fn from(value: &str) -> Self {
        Variant::String(value.to_string())
    }
}

impl From<String> for Variant {
    fn from(value: String) -> Self {
        Variant::String(value)
    }
}

impl From<Structure> for Variant {
    fn from(value: Structure) -> Self {
        Variant::Structure(value)
    }
}
