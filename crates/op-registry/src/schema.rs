// Copyright (c) 2026 The opkit Authors
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Declarative operator schemas.
//!
//! A [`Declaration`] is the full declarative surface of an operator
//! kind: canonical name, documentation, input/output arity bounds, and
//! the ordered list of named, typed, documented configuration
//! arguments. It is plain data — serializable, so external tooling can
//! validate a serialized model graph against it before execution.
//!
//! Schemas are *not* enforced at registration time; they are checked
//! against a [`ParamStore`] at bind time via [`Declaration::validate`].

use op_core::{Arity, OpError, ParamKind, ParamStore};

/// One declared configuration argument of an operator kind.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ArgSpec {
    /// Parameter name as it appears in the store.
    pub name: String,
    /// Expected value type.
    pub kind: ParamKind,
    /// Human-readable documentation.
    pub doc: String,
    /// Whether binding fails when the argument is absent.
    pub required: bool,
}

/// The declarative schema of an operator kind.
///
/// Built fluently at registration time:
///
/// ```
/// use op_core::{Arity, ParamKind};
/// use op_registry::Declaration;
///
/// let decl = Declaration::new("dense")
///     .doc("fully-connected layer")
///     .arity(Arity::exact(1, 1))
///     .arg("out_dim", ParamKind::Int, "output feature count")
///     .opt_arg("weight_2", ParamKind::Tensor, "bias vector");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Declaration {
    name: String,
    doc: String,
    arity: Arity,
    args: Vec<ArgSpec>,
}

impl Declaration {
    /// Starts a declaration for the named operator kind with default
    /// arity (one input, one output) and no arguments.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc: String::new(),
            arity: Arity::default(),
            args: Vec::new(),
        }
    }

    /// Sets the documentation string.
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }

    /// Sets the input/output arity bounds.
    pub fn arity(mut self, arity: Arity) -> Self {
        self.arity = arity;
        self
    }

    /// Appends a required argument.
    pub fn arg(mut self, name: impl Into<String>, kind: ParamKind, doc: impl Into<String>) -> Self {
        self.args.push(ArgSpec {
            name: name.into(),
            kind,
            doc: doc.into(),
            required: true,
        });
        self
    }

    /// Appends an optional argument (absent is fine, wrong type is not).
    pub fn opt_arg(
        mut self,
        name: impl Into<String>,
        kind: ParamKind,
        doc: impl Into<String>,
    ) -> Self {
        self.args.push(ArgSpec {
            name: name.into(),
            kind,
            doc: doc.into(),
            required: false,
        });
        self
    }

    /// Canonical operator-kind name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Documentation string.
    pub fn doc_str(&self) -> &str {
        &self.doc
    }

    /// Declared arity bounds.
    pub fn arity_bounds(&self) -> Arity {
        self.arity
    }

    /// Ordered argument specs.
    pub fn args(&self) -> &[ArgSpec] {
        &self.args
    }

    /// Validates a parameter store against this schema.
    ///
    /// Every required argument must be present with the declared type;
    /// optional arguments must match the declared type when present.
    /// Entries in the store that the schema does not mention are
    /// ignored (weights delivered under conventional names are checked
    /// by the operator's own bind phase).
    pub fn validate(&self, store: &ParamStore) -> Result<(), OpError> {
        for spec in &self.args {
            match store.get(&spec.name) {
                None if spec.required => {
                    return Err(OpError::MissingParameter {
                        op: self.name.clone(),
                        name: spec.name.clone(),
                    })
                }
                None => {}
                Some(value) if value.kind() != spec.kind => {
                    return Err(OpError::TypeMismatch {
                        op: self.name.clone(),
                        name: spec.name.clone(),
                        expected: spec.kind,
                        actual: value.kind(),
                    })
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use op_core::ParamValue;

    fn decl() -> Declaration {
        Declaration::new("dense")
            .doc("fully-connected layer")
            .arity(Arity::exact(1, 1))
            .arg("axis", ParamKind::Int, "axis to flatten the input from")
            .arg("out_dim", ParamKind::Int, "output feature count")
            .arg("bias_term", ParamKind::Bool, "whether a bias is added")
            .arg("weight_1", ParamKind::Tensor, "weight matrix")
            .opt_arg("weight_2", ParamKind::Tensor, "bias vector")
    }

    fn valid_store() -> ParamStore {
        let mut s = ParamStore::new();
        s.insert("axis", ParamValue::Int(1));
        s.insert("out_dim", ParamValue::Int(4));
        s.insert("bias_term", ParamValue::Bool(false));
        s.insert(
            "weight_1",
            ParamValue::Tensor(std::sync::Arc::new(tensor_core::Tensor::zeros(
                tensor_core::Shape::matrix(8, 4),
                tensor_core::DType::F32,
            ))),
        );
        s
    }

    #[test]
    fn test_validate_ok_without_optional() {
        decl().validate(&valid_store()).unwrap();
    }

    #[test]
    fn test_validate_missing_required() {
        let mut store = valid_store();
        store = {
            // Rebuild without out_dim.
            let mut s = ParamStore::new();
            for (name, value) in store.iter() {
                if name != "out_dim" {
                    s.insert(name, value.clone());
                }
            }
            s
        };
        let err = decl().validate(&store).unwrap_err();
        assert!(matches!(err, OpError::MissingParameter { .. }));
    }

    #[test]
    fn test_validate_type_mismatch() {
        let mut store = valid_store();
        store.insert("axis", ParamValue::Bool(true));
        let err = decl().validate(&store).unwrap_err();
        assert!(matches!(err, OpError::TypeMismatch { .. }));
    }

    #[test]
    fn test_validate_optional_wrong_type() {
        let mut store = valid_store();
        store.insert("weight_2", ParamValue::Int(0));
        let err = decl().validate(&store).unwrap_err();
        assert!(matches!(err, OpError::TypeMismatch { .. }));
    }

    #[test]
    fn test_ordered_args() {
        let d = decl();
        let names: Vec<&str> = d.args().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["axis", "out_dim", "bias_term", "weight_1", "weight_2"]
        );
    }

    #[test]
    fn test_serde_roundtrip() {
        let d = decl();
        let json = serde_json::to_string(&d).unwrap();
        let back: Declaration = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }
}
