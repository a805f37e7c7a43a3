// Copyright (c) 2026 The opkit Authors
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The parameter store: an order-preserving mapping from parameter name
//! to typed value, populated by the model loader before operator
//! construction.
//!
//! Tensor-valued entries hold `Arc` references — binding never copies
//! weight data.

use crate::OpError;
use std::sync::Arc;
use tensor_core::Tensor;

/// The type tag of a parameter value, used by argument schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    /// 64-bit signed integer.
    Int,
    /// 64-bit floating point.
    Float,
    /// Boolean flag.
    Bool,
    /// UTF-8 string.
    Str,
    /// Tensor reference (weights, biases).
    Tensor,
}

impl ParamKind {
    /// Returns a human-readable label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Str => "str",
            Self::Tensor => "tensor",
        }
    }
}

impl std::fmt::Display for ParamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed parameter value.
#[derive(Debug, Clone)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Tensor(Arc<Tensor>),
}

impl ParamValue {
    /// Returns the type tag of this value.
    pub fn kind(&self) -> ParamKind {
        match self {
            Self::Int(_) => ParamKind::Int,
            Self::Float(_) => ParamKind::Float,
            Self::Bool(_) => ParamKind::Bool,
            Self::Str(_) => ParamKind::Str,
            Self::Tensor(_) => ParamKind::Tensor,
        }
    }
}

/// An order-preserving mapping from parameter name to typed value.
///
/// Read-only from an operator's perspective: binding reads entries, it
/// never mutates them. Lookups are linear, which is fine for the small
/// per-operator stores this is built for.
#[derive(Debug, Clone, Default)]
pub struct ParamStore {
    entries: Vec<(String, ParamValue)>,
}

impl ParamStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, replacing any existing entry with the same name
    /// in place (insertion order of first appearance is preserved).
    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Returns the value under `name`, if present.
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Returns `true` if an entry with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // ── Typed getters ──────────────────────────────────────────
    //
    // Each fails with MissingParameter if the name is absent and
    // TypeMismatch if present with the wrong type. `op` is the operator
    // name carried into the error for diagnosis.

    /// Reads a required integer parameter.
    pub fn get_int(&self, op: &str, name: &str) -> Result<i64, OpError> {
        match self.require(op, name)? {
            ParamValue::Int(v) => Ok(*v),
            other => Err(self.mismatch(op, name, ParamKind::Int, other)),
        }
    }

    /// Reads a required float parameter.
    pub fn get_float(&self, op: &str, name: &str) -> Result<f64, OpError> {
        match self.require(op, name)? {
            ParamValue::Float(v) => Ok(*v),
            other => Err(self.mismatch(op, name, ParamKind::Float, other)),
        }
    }

    /// Reads a required boolean parameter.
    pub fn get_bool(&self, op: &str, name: &str) -> Result<bool, OpError> {
        match self.require(op, name)? {
            ParamValue::Bool(v) => Ok(*v),
            other => Err(self.mismatch(op, name, ParamKind::Bool, other)),
        }
    }

    /// Reads a required string parameter.
    pub fn get_str(&self, op: &str, name: &str) -> Result<&str, OpError> {
        match self.require(op, name)? {
            ParamValue::Str(v) => Ok(v.as_str()),
            other => Err(self.mismatch(op, name, ParamKind::Str, other)),
        }
    }

    /// Reads a required tensor parameter. Clones the reference, not the
    /// data.
    pub fn get_tensor(&self, op: &str, name: &str) -> Result<Arc<Tensor>, OpError> {
        match self.require(op, name)? {
            ParamValue::Tensor(t) => Ok(Arc::clone(t)),
            other => Err(self.mismatch(op, name, ParamKind::Tensor, other)),
        }
    }

    /// Reads an optional tensor parameter: absent is `Ok(None)`, present
    /// with the wrong type is still a `TypeMismatch`.
    pub fn opt_tensor(&self, op: &str, name: &str) -> Result<Option<Arc<Tensor>>, OpError> {
        match self.get(name) {
            None => Ok(None),
            Some(ParamValue::Tensor(t)) => Ok(Some(Arc::clone(t))),
            Some(other) => Err(self.mismatch(op, name, ParamKind::Tensor, other)),
        }
    }

    fn require(&self, op: &str, name: &str) -> Result<&ParamValue, OpError> {
        self.get(name).ok_or_else(|| OpError::MissingParameter {
            op: op.to_string(),
            name: name.to_string(),
        })
    }

    fn mismatch(&self, op: &str, name: &str, expected: ParamKind, actual: &ParamValue) -> OpError {
        OpError::TypeMismatch {
            op: op.to_string(),
            name: name.to_string(),
            expected,
            actual: actual.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tensor_core::Shape;

    fn store() -> ParamStore {
        let mut s = ParamStore::new();
        s.insert("axis", ParamValue::Int(1));
        s.insert("scale", ParamValue::Float(0.5));
        s.insert("bias_term", ParamValue::Bool(false));
        s.insert("mode", ParamValue::Str("same".into()));
        s.insert(
            "weight_1",
            ParamValue::Tensor(Arc::new(Tensor::zeros(
                Shape::matrix(4, 4),
                tensor_core::DType::F32,
            ))),
        );
        s
    }

    #[test]
    fn test_typed_getters() {
        let s = store();
        assert_eq!(s.get_int("t", "axis").unwrap(), 1);
        assert_eq!(s.get_float("t", "scale").unwrap(), 0.5);
        assert!(!s.get_bool("t", "bias_term").unwrap());
        assert_eq!(s.get_str("t", "mode").unwrap(), "same");
        assert_eq!(
            s.get_tensor("t", "weight_1").unwrap().shape(),
            &Shape::matrix(4, 4)
        );
    }

    #[test]
    fn test_missing_parameter() {
        let s = store();
        let err = s.get_int("dense", "out_dim").unwrap_err();
        assert!(matches!(err, OpError::MissingParameter { .. }));
        assert!(err.to_string().contains("out_dim"));
    }

    #[test]
    fn test_type_mismatch() {
        let s = store();
        let err = s.get_bool("dense", "axis").unwrap_err();
        match err {
            OpError::TypeMismatch {
                expected, actual, ..
            } => {
                assert_eq!(expected, ParamKind::Bool);
                assert_eq!(actual, ParamKind::Int);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_opt_tensor() {
        let s = store();
        assert!(s.opt_tensor("t", "weight_2").unwrap().is_none());
        assert!(s.opt_tensor("t", "weight_1").unwrap().is_some());
        // Present with wrong type is still an error.
        assert!(s.opt_tensor("t", "axis").is_err());
    }

    #[test]
    fn test_insert_preserves_order() {
        let mut s = ParamStore::new();
        s.insert("b", ParamValue::Int(1));
        s.insert("a", ParamValue::Int(2));
        s.insert("b", ParamValue::Int(3)); // overwrite keeps position
        let names: Vec<&str> = s.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(s.get_int("t", "b").unwrap(), 3);
        assert_eq!(s.len(), 2);
    }
}
