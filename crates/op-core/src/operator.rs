// Copyright (c) 2026 The opkit Authors
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The operator helper lifecycle and the public operator functor.
//!
//! A helper owns an operator instance's bound parameters, its
//! implementation variants, and the selection outcome. The [`Operator`]
//! is the externally visible functor: it delegates exclusively to its
//! helper and enforces phase ordering and declared arity — composition,
//! not privileged cross-type access.

use crate::{Device, ImplKind, OpContext, OpError, ParamStore, Precision, SelectPolicy};
use tensor_core::{Tensor, TensorDesc};

/// Declared input/output tensor-count bounds for an operator kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Arity {
    pub min_in: usize,
    pub max_in: usize,
    pub min_out: usize,
    pub max_out: usize,
}

impl Arity {
    /// Exact counts on both sides.
    pub fn exact(inputs: usize, outputs: usize) -> Self {
        Self {
            min_in: inputs,
            max_in: inputs,
            min_out: outputs,
            max_out: outputs,
        }
    }

    /// Ranged counts.
    pub fn ranged(min_in: usize, max_in: usize, min_out: usize, max_out: usize) -> Self {
        Self {
            min_in,
            max_in,
            min_out,
            max_out,
        }
    }

    /// Checks an input tensor count against the bounds.
    pub fn accepts_inputs(&self, n: usize) -> bool {
        (self.min_in..=self.max_in).contains(&n)
    }

    /// Checks an output tensor count against the bounds.
    pub fn accepts_outputs(&self, n: usize) -> bool {
        (self.min_out..=self.max_out).contains(&n)
    }
}

impl Default for Arity {
    fn default() -> Self {
        Self::exact(1, 1)
    }
}

/// The per-instance lifecycle every operator kind implements.
///
/// Phases are strictly ordered: `init_param`, then `init`, then forward
/// passes. `infer_shape` is pure and callable any time after
/// `init_param`. None of the phases are re-entrant; the caller
/// serializes them (graph construction is sequential).
pub trait OperatorHelper: Send {
    /// Canonical operator-kind name (for diagnostics).
    fn name(&self) -> &str;

    /// Reads named entries from the parameter store and constructs the
    /// operator parameter. Reads tensor references only — never copies
    /// data.
    ///
    /// Fails with [`OpError::MissingParameter`] or
    /// [`OpError::TypeMismatch`].
    fn init_param(&mut self, store: &ParamStore) -> Result<(), OpError>;

    /// Instantiates every implementation variant applicable to this
    /// operator's device/precision, runs the selector, and performs the
    /// chosen variant's one-time setup bound to the current shapes.
    ///
    /// Fails with [`OpError::InitError`] if no variant can be
    /// instantiated or setup fails; a failed init leaves the helper
    /// unusable (reconstruct, don't retry).
    fn init(
        &mut self,
        ctx: &OpContext,
        policy: SelectPolicy,
        inputs: &[TensorDesc],
        outputs: &[TensorDesc],
    ) -> Result<(), OpError>;

    /// Pure function from input descriptors (and the bound parameter) to
    /// fully determined output descriptors.
    ///
    /// Fails with [`OpError::ShapeError`]; partial output shapes never
    /// propagate.
    fn infer_shape(&self, inputs: &[TensorDesc]) -> Result<Vec<TensorDesc>, OpError>;

    /// Executes the forward pass through the selected variant.
    fn forward(
        &mut self,
        ctx: &OpContext,
        inputs: &[Tensor],
        outputs: &mut [Tensor],
    ) -> Result<(), OpError>;

    /// The kind of the selected implementation variant, if `init` has
    /// succeeded.
    fn selected(&self) -> Option<ImplKind>;
}

/// The externally visible operator functor bound to one helper.
///
/// Stateless-looking from the caller's perspective: no shape or
/// parameter work happens here beyond phase-order and arity guards —
/// any mismatch between input shapes and what `infer_shape` predicted
/// is the caller's responsibility to have avoided.
pub struct Operator {
    name: String,
    device: Device,
    precision: Precision,
    arity: Arity,
    helper: Box<dyn OperatorHelper>,
    bound: bool,
    initialized: bool,
}

impl Operator {
    /// Pairs a helper with its identity and declared arity.
    pub fn new(
        name: impl Into<String>,
        device: Device,
        precision: Precision,
        arity: Arity,
        helper: Box<dyn OperatorHelper>,
    ) -> Self {
        Self {
            name: name.into(),
            device,
            precision,
            arity,
            helper,
            bound: false,
            initialized: false,
        }
    }

    /// Canonical operator name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Device tag this instance was built for.
    pub fn device(&self) -> Device {
        self.device
    }

    /// Precision tag this instance was built for.
    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// Declared input/output arity bounds.
    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// The selected implementation kind, if init has succeeded.
    pub fn selected(&self) -> Option<ImplKind> {
        self.helper.selected()
    }

    /// Phase 1: binds parameters from the store.
    pub fn init_param(&mut self, store: &ParamStore) -> Result<(), OpError> {
        self.helper.init_param(store)?;
        self.bound = true;
        Ok(())
    }

    /// Phase 2: variant instantiation, selection, and one-time setup.
    ///
    /// May be called again to re-select (e.g. after shapes change); the
    /// selection outcome is recomputed each time.
    pub fn init(
        &mut self,
        ctx: &OpContext,
        policy: SelectPolicy,
        inputs: &[TensorDesc],
        outputs: &[TensorDesc],
    ) -> Result<(), OpError> {
        if !self.bound {
            return Err(OpError::InitError {
                op: self.name.clone(),
                detail: "init called before init_param".into(),
            });
        }
        self.initialized = false;
        self.helper.init(ctx, policy, inputs, outputs)?;
        self.initialized = true;
        Ok(())
    }

    /// Infers fully determined output descriptors from input
    /// descriptors. Pure; callable independently of [`init`](Self::init).
    pub fn infer_shape(&self, inputs: &[TensorDesc]) -> Result<Vec<TensorDesc>, OpError> {
        if !self.bound {
            return Err(OpError::InitError {
                op: self.name.clone(),
                detail: "infer_shape called before init_param".into(),
            });
        }
        if !self.arity.accepts_inputs(inputs.len()) {
            return Err(OpError::ShapeError {
                op: self.name.clone(),
                detail: format!(
                    "got {} inputs, declared arity is {}..={}",
                    inputs.len(),
                    self.arity.min_in,
                    self.arity.max_in
                ),
            });
        }
        let outputs = self.helper.infer_shape(inputs)?;
        debug_assert!(self.arity.accepts_outputs(outputs.len()));
        Ok(outputs)
    }

    /// Forwards one invocation to the selected implementation variant.
    ///
    /// An unimplemented forward path is reported loudly: the error is
    /// logged at error level with this operator's device/precision tag
    /// before propagating, so a model/backend mismatch never manifests
    /// as silently wrong output.
    pub fn forward(
        &mut self,
        ctx: &OpContext,
        inputs: &[Tensor],
        outputs: &mut [Tensor],
    ) -> Result<(), OpError> {
        if !self.initialized {
            return Err(OpError::InitError {
                op: self.name.clone(),
                detail: "forward called before init".into(),
            });
        }
        match self.helper.forward(ctx, inputs, outputs) {
            Err(e @ OpError::UnImplemented { .. }) => {
                tracing::error!(
                    op = %self.name,
                    device = %self.device,
                    precision = %self.precision,
                    "forward pass hit an unimplemented operator path"
                );
                Err(e)
            }
            other => other,
        }
    }
}

impl std::fmt::Debug for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operator")
            .field("name", &self.name)
            .field("device", &self.device)
            .field("precision", &self.precision)
            .field("bound", &self.bound)
            .field("initialized", &self.initialized)
            .field("selected", &self.selected())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tensor_core::{DType, Shape};

    /// Minimal helper that copies input to output.
    struct CopyHelper {
        selected: Option<ImplKind>,
    }

    impl OperatorHelper for CopyHelper {
        fn name(&self) -> &str {
            "copy"
        }

        fn init_param(&mut self, _store: &ParamStore) -> Result<(), OpError> {
            Ok(())
        }

        fn init(
            &mut self,
            _ctx: &OpContext,
            _policy: SelectPolicy,
            _inputs: &[TensorDesc],
            _outputs: &[TensorDesc],
        ) -> Result<(), OpError> {
            self.selected = Some(ImplKind::Generic);
            Ok(())
        }

        fn infer_shape(&self, inputs: &[TensorDesc]) -> Result<Vec<TensorDesc>, OpError> {
            Ok(vec![inputs[0].clone()])
        }

        fn forward(
            &mut self,
            _ctx: &OpContext,
            inputs: &[Tensor],
            outputs: &mut [Tensor],
        ) -> Result<(), OpError> {
            let src = inputs[0].as_bytes().to_vec();
            outputs[0].as_bytes_mut().copy_from_slice(&src);
            Ok(())
        }

        fn selected(&self) -> Option<ImplKind> {
            self.selected
        }
    }

    fn operator() -> Operator {
        Operator::new(
            "copy",
            Device::Cpu,
            Precision::Fp32,
            Arity::exact(1, 1),
            Box::new(CopyHelper { selected: None }),
        )
    }

    fn ctx() -> OpContext {
        OpContext::new(Device::Cpu, Precision::Fp32)
    }

    #[test]
    fn test_phase_order_enforced() {
        let mut op = operator();
        let desc = TensorDesc::plain(Shape::vector(4), DType::F32);

        // init before init_param fails.
        let err = op
            .init(&ctx(), SelectPolicy::Static, &[desc.clone()], &[desc.clone()])
            .unwrap_err();
        assert!(matches!(err, OpError::InitError { .. }));

        // infer_shape before init_param fails.
        assert!(op.infer_shape(&[desc.clone()]).is_err());

        // forward before init fails.
        op.init_param(&ParamStore::new()).unwrap();
        let mut outs = vec![Tensor::zeros(Shape::vector(4), DType::F32)];
        let ins = vec![Tensor::zeros(Shape::vector(4), DType::F32)];
        assert!(op.forward(&ctx(), &ins, &mut outs).is_err());
    }

    #[test]
    fn test_full_lifecycle() {
        let mut op = operator();
        let desc = TensorDesc::plain(Shape::vector(4), DType::F32);

        op.init_param(&ParamStore::new()).unwrap();
        let out_descs = op.infer_shape(&[desc.clone()]).unwrap();
        assert_eq!(out_descs, vec![desc.clone()]);

        op.init(&ctx(), SelectPolicy::Static, &[desc.clone()], &out_descs)
            .unwrap();
        assert_eq!(op.selected(), Some(ImplKind::Generic));

        let ins = vec![Tensor::from_f32(Shape::vector(4), &[1.0, 2.0, 3.0, 4.0]).unwrap()];
        let mut outs = vec![Tensor::zeros(Shape::vector(4), DType::F32)];
        op.forward(&ctx(), &ins, &mut outs).unwrap();
        assert_eq!(outs[0].as_f32_slice(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_arity_violation_is_shape_error() {
        let mut op = operator();
        op.init_param(&ParamStore::new()).unwrap();
        let desc = TensorDesc::plain(Shape::vector(4), DType::F32);
        let err = op.infer_shape(&[desc.clone(), desc]).unwrap_err();
        assert!(matches!(err, OpError::ShapeError { .. }));
    }

    #[test]
    fn test_arity_bounds() {
        let a = Arity::ranged(1, 3, 1, 1);
        assert!(a.accepts_inputs(1));
        assert!(a.accepts_inputs(3));
        assert!(!a.accepts_inputs(0));
        assert!(!a.accepts_inputs(4));
        assert!(a.accepts_outputs(1));
        assert!(!a.accepts_outputs(2));
    }
}
